//! Operating system detection.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Operating system families an artifact can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OS {
    Windows,
    Macos,
    Linux,
    Unknown,
}

impl OS {
    pub fn as_str(&self) -> &'static str {
        match self {
            OS::Windows => "win",
            OS::Macos => "mac",
            OS::Linux => "linux",
            OS::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OS {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "win" | "windows" => Ok(OS::Windows),
            "mac" | "macos" | "osx" | "darwin" => Ok(OS::Macos),
            "linux" => Ok(OS::Linux),
            _ => Err(Error::UnknownOS(s.to_string())),
        }
    }
}

/// Detect current operating system.
pub fn detect() -> OS {
    if cfg!(target_os = "windows") {
        OS::Windows
    } else if cfg!(target_os = "macos") {
        OS::Macos
    } else if cfg!(target_os = "linux") {
        OS::Linux
    } else {
        match sysinfo::System::name().as_deref() {
            Some(name) if name.contains("Linux") => OS::Linux,
            _ => OS::Unknown,
        }
    }
}
