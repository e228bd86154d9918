//! Architecture detection.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// CPU architecture types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86,
    X86_64,
    ARM,
    ARM64,
    Unknown,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::ARM => "arm",
            Arch::ARM64 => "aarch64",
            Arch::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Arch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x86" | "i386" | "i686" => Ok(Arch::X86),
            "x86_64" | "amd64" | "x64" => Ok(Arch::X86_64),
            "arm" | "armv7l" => Ok(Arch::ARM),
            "aarch64" | "arm64" => Ok(Arch::ARM64),
            _ => Err(Error::UnknownArch(s.to_string())),
        }
    }
}

/// Detect current architecture.
pub fn detect() -> Arch {
    sysinfo::System::cpu_arch().parse().unwrap_or(Arch::Unknown)
}
