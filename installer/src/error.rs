//! Error types for the SDK installer.
//!
//! Every variant is fatal to the current run. Each one carries enough context
//! to explain the failure without consulting the logs, and maps to a distinct
//! process exit code so scripted callers can tell failure causes apart.

use crate::archive::download::DownloadError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Exit code reported when the host operating system is not supported.
pub const EXIT_UNSUPPORTED_PLATFORM: i32 = -1;
/// Exit code reported when the tool archive could not be extracted.
pub const EXIT_EXTRACT_FAILED: i32 = -2;
/// Exit code reported when the unpacked layout could not be reconciled.
pub const EXIT_PREPARE_FAILED: i32 = -3;
/// Exit code reported when `sdkmanager` failed to install platform-tools.
pub const EXIT_PLATFORM_TOOLS_FAILED: i32 = -4;
/// Exit code reported when the tool archive could not be downloaded.
pub const EXIT_DOWNLOAD_FAILED: i32 = -5;
/// Exit code reported when the tool archive is missing or unreadable.
pub const EXIT_ARCHIVE_NOT_FOUND: i32 = -6;
/// Exit code reported for any other failure.
pub const EXIT_OTHER: i32 = 1;

/// Errors that can occur during the installation process.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The host operating system has no default installation root.
    #[error("unsupported platform {os}; pass an installation directory explicitly")]
    UnsupportedPlatform {
        /// Operating system identifier reported by the host.
        os: String,
    },

    /// Neither the native nor the portable decompressor could unpack the archive.
    #[error("failed to extract the command-line tools archive (exit code {code}): {reason}")]
    ExtractFailed {
        /// Exit code reported by the last decompressor attempted.
        code: i32,
        /// Description of the failure.
        reason: String,
    },

    /// The unpacked directory could not be moved into the expected layout.
    #[error("failed to prepare the command-line tools directory")]
    PrepareFailed {
        /// The underlying filesystem failure.
        #[source]
        source: std::io::Error,
    },

    /// `sdkmanager` exited unsuccessfully while installing platform-tools.
    #[error("failed to install platform-tools (sdkmanager exit code {code}); rerun with --verbose")]
    PlatformToolsInstallFailed {
        /// Exit code of the `sdkmanager` process.
        code: i32,
    },

    /// The tool archive could not be downloaded.
    #[error("failed to download the command-line tools archive")]
    DownloadFailed {
        /// The underlying download failure.
        #[source]
        source: DownloadError,
    },

    /// The archive supplied or downloaded does not exist or is not a file.
    #[error("archive {path} not found or not a readable file")]
    ArchiveNotFound {
        /// Path to the missing archive.
        path: Utf8PathBuf,
    },

    /// The user's home or local data directory could not be determined.
    #[error("could not determine the home directory; pass an installation directory explicitly")]
    HomeDirectoryUnavailable,

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InstallerError {
    /// Returns the process exit code documented for this failure kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use sdk_installer::error::InstallerError;
    ///
    /// let err = InstallerError::PlatformToolsInstallFailed { code: 1 };
    /// assert_eq!(err.exit_code(), -4);
    /// ```
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::UnsupportedPlatform { .. } => EXIT_UNSUPPORTED_PLATFORM,
            Self::ExtractFailed { .. } => EXIT_EXTRACT_FAILED,
            Self::PrepareFailed { .. } => EXIT_PREPARE_FAILED,
            Self::PlatformToolsInstallFailed { .. } => EXIT_PLATFORM_TOOLS_FAILED,
            Self::DownloadFailed { .. } => EXIT_DOWNLOAD_FAILED,
            Self::ArchiveNotFound { .. } => EXIT_ARCHIVE_NOT_FOUND,
            Self::HomeDirectoryUnavailable | Self::Io(_) => EXIT_OTHER,
        }
    }
}

impl From<DownloadError> for InstallerError {
    fn from(source: DownloadError) -> Self {
        Self::DownloadFailed { source }
    }
}

pub(crate) fn clone_io_error(source: &std::io::Error) -> std::io::Error {
    std::io::Error::new(source.kind(), source.to_string())
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
