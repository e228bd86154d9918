use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::arch::{self, Arch};
use crate::os::{self, OS};
use crate::Error;

static CURRENT: Lazy<Platform> = Lazy::new(|| Platform {
    os:   os::detect(),
    arch: arch::detect(),
});

/// An operating system and architecture pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os:   OS,
    pub arch: Arch,
}

impl Platform {
    pub fn new(os: OS, arch: Arch) -> Self { Self { os, arch } }

    /// The platform this process runs on, detected once.
    pub fn current() -> Platform { *CURRENT }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Platform filter carried by an artifact.
///
/// Written as `<os>` or `<os>-<arch>`, e.g. `linux` or `win-x86_64`. An
/// absent architecture matches every architecture of that OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlatformTag {
    pub os:   OS,
    pub arch: Option<Arch>,
}

impl PlatformTag {
    pub fn new(os: OS, arch: Option<Arch>) -> Self { Self { os, arch } }

    pub fn matches(&self, platform: &Platform) -> bool {
        self.os == platform.os && self.arch.is_none_or(|a| a == platform.arch)
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arch {
            Some(arch) => write!(f, "{}-{}", self.os, arch),
            None => write!(f, "{}", self.os),
        }
    }
}

impl FromStr for PlatformTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |_| Error::InvalidTag(s.to_string());
        match s.split_once('-') {
            Some((os, arch)) => Ok(Self {
                os:   os.parse().map_err(invalid)?,
                arch: Some(arch.parse().map_err(invalid)?),
            }),
            None => Ok(Self {
                os:   s.parse().map_err(invalid)?,
                arch: None,
            }),
        }
    }
}

impl TryFrom<String> for PlatformTag {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<PlatformTag> for String {
    fn from(tag: PlatformTag) -> Self { tag.to_string() }
}
