//! Directory resolution abstraction for platform-specific paths.
//!
//! Wraps `directories-next` behind a trait so the root resolver can be
//! exercised against temporary directories in tests.

use std::path::PathBuf;

/// Provides the per-user base directories the installer derives paths from.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Returns the user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// Returns the per-user local data directory (`%LOCALAPPDATA%` on Windows).
    fn data_local_dir(&self) -> Option<PathBuf>;
}

/// Base directories of the current user, as reported by the host.
#[derive(Debug, Clone)]
pub struct SystemBaseDirs {
    inner: directories_next::BaseDirs,
}

impl SystemBaseDirs {
    /// Queries the host for the current user's base directories.
    ///
    /// Returns `None` when no valid home directory can be found.
    #[must_use]
    pub fn new() -> Option<Self> {
        directories_next::BaseDirs::new().map(|inner| Self { inner })
    }
}

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        Some(self.inner.home_dir().to_path_buf())
    }

    fn data_local_dir(&self) -> Option<PathBuf> {
        Some(self.inner.data_local_dir().to_path_buf())
    }
}

/// Base directories used when the host reports none.
///
/// Every lookup returns `None`, which the root resolver turns into
/// [`InstallerError::HomeDirectoryUnavailable`](crate::error::InstallerError::HomeDirectoryUnavailable).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBaseDirs;

impl BaseDirs for NoBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        None
    }

    fn data_local_dir(&self) -> Option<PathBuf> {
        None
    }
}
