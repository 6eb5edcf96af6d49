//! Ownership of the archive fed to the pipeline.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};

/// A local zip file holding the command-line tools distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveHandle {
    /// Supplied by the caller; never deleted by the installer.
    Supplied(Utf8PathBuf),
    /// Downloaded by the installer; may be deleted once unpacked.
    Downloaded(Utf8PathBuf),
}

impl ArchiveHandle {
    /// Returns the archive path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Supplied(path) | Self::Downloaded(path) => path,
        }
    }

    /// Returns `true` when the installer owns the file.
    #[must_use]
    pub const fn is_owned(&self) -> bool {
        matches!(self, Self::Downloaded(_))
    }

    /// Checks that the archive exists and can be opened for reading.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ArchiveNotFound`] otherwise.
    pub fn ensure_readable(&self) -> Result<()> {
        let path = self.path();
        let readable = path.is_file() && std::fs::File::open(path).is_ok();
        if readable {
            Ok(())
        } else {
            Err(InstallerError::ArchiveNotFound {
                path: path.to_owned(),
            })
        }
    }
}
