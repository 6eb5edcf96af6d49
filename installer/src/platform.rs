//! Host operating system identity.

use std::fmt;

/// The operating system the installer is running on.
///
/// Only the three variants with an Android SDK distribution are supported;
/// anything else is carried through as [`HostOs::Other`] so that callers can
/// report the identifier in error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOs {
    /// Linux distributions.
    Linux,
    /// macOS.
    MacOs,
    /// Windows.
    Windows,
    /// Any operating system without an SDK distribution.
    Other(String),
}

impl HostOs {
    /// Detects the operating system the binary was compiled for.
    #[must_use]
    pub fn current() -> Self {
        Self::from_identifier(std::env::consts::OS)
    }

    /// Maps a `std::env::consts::OS` style identifier to a [`HostOs`].
    ///
    /// # Examples
    ///
    /// ```
    /// use sdk_installer::platform::HostOs;
    ///
    /// assert_eq!(HostOs::from_identifier("macos"), HostOs::MacOs);
    /// assert_eq!(HostOs::from_identifier("haiku"), HostOs::Other("haiku".to_owned()));
    /// ```
    #[must_use]
    pub fn from_identifier(os: &str) -> Self {
        match os {
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            "windows" => Self::Windows,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the identifier used in the command-line tools archive name.
    ///
    /// Returns `None` for unsupported operating systems.
    #[must_use]
    pub const fn archive_tag(&self) -> Option<&'static str> {
        match self {
            Self::Linux => Some("linux"),
            Self::MacOs => Some("mac"),
            Self::Windows => Some("win"),
            Self::Other(_) => None,
        }
    }

    /// Returns `true` when the operating system uses Windows conventions.
    #[must_use]
    pub const fn is_windows(&self) -> bool {
        matches!(self, Self::Windows)
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => f.write_str("linux"),
            Self::MacOs => f.write_str("macos"),
            Self::Windows => f.write_str("windows"),
            Self::Other(name) => f.write_str(name),
        }
    }
}
