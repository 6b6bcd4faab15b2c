//! Target platform description.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Os {
    MacOs,
    Ios,
    TvOs,
    WatchOs,
}

impl Os {
    /// The SDK root name the IDE expects for this operating system.
    pub fn sdk_root(&self) -> &'static str {
        match self {
            Os::MacOs => "macosx",
            Os::Ios => "iphoneos",
            Os::TvOs => "appletvos",
            Os::WatchOs => "watchos",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub os: Os,
    pub arch: String,
    pub minimum_os_version: String,
    /// Environment variant, e.g. `Simulator`.
    #[serde(default)]
    pub environment: Option<String>,
}

impl Platform {
    pub fn new(os: Os, arch: impl Into<String>, minimum_os_version: impl Into<String>) -> Self {
        Self {
            os,
            arch: arch.into(),
            minimum_os_version: minimum_os_version.into(),
            environment: None,
        }
    }

    pub fn sdk_root(&self) -> &'static str {
        self.os.sdk_root()
    }
}
