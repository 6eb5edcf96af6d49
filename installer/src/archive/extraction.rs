//! Archive extraction for the command-line tools distribution.
//!
//! Two interchangeable decompressors are provided: [`NativeUnzip`] shells out
//! to the platform's own tool, and [`PortableZip`] unpacks in-process with the
//! `zip` crate. The pipeline prefers the native one and falls back to the
//! portable one.

use camino::Utf8Path;
use log::debug;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

/// Exit code reported for failures that did not come from a child process.
pub const GENERIC_FAILURE_CODE: i32 = 1;

/// A capability that unpacks a zip archive into a directory.
#[cfg_attr(test, mockall::automock)]
pub trait Decompressor {
    /// Short name used in log messages and events.
    fn name(&self) -> &'static str;

    /// Returns `true` when the decompressor can be used on this host.
    fn is_available(&self) -> bool;

    /// Extract the archive at `archive` into `dest`, overwriting existing files.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractionError`] describing the failure; its
    /// [`exit_code`](ExtractionError::exit_code) is what the caller reports.
    fn extract(&self, archive: &Utf8Path, dest: &Utf8Path) -> Result<(), ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The external decompressor exited unsuccessfully.
    #[error("{program} exited with code {code}: {stderr}")]
    Exited {
        /// The program that was run.
        program: &'static str,
        /// Its exit code.
        code: i32,
        /// Trimmed standard error output.
        stderr: String,
    },

    /// The archive could not be read as a zip file.
    #[error("invalid zip archive: {0}")]
    InvalidArchive(String),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no entries.
    #[error("archive contains no files")]
    EmptyArchive,

    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    /// Returns the exit code that represents this failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exited { code, .. } => *code,
            Self::Io(source) => source.raw_os_error().unwrap_or(GENERIC_FAILURE_CODE),
            Self::InvalidArchive(_) | Self::PathTraversal { .. } | Self::EmptyArchive => {
                GENERIC_FAILURE_CODE
            }
        }
    }
}

/// Extracts with the platform tool: `unzip` on Unix, `tar` on Windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeUnzip {
    program: &'static str,
}

impl NativeUnzip {
    /// Uses the platform's default extraction program.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            program: if cfg!(windows) { "tar" } else { "unzip" },
        }
    }

    /// Uses a specific program, which must accept the same arguments as the
    /// platform default.
    #[must_use]
    pub const fn with_program(program: &'static str) -> Self {
        Self { program }
    }

    fn extract_args<'a>(&self, archive: &'a Path, dest: &'a Path) -> Vec<&'a OsStr> {
        if self.program == "tar" {
            vec![OsStr::new("-xf"), archive.as_os_str(), OsStr::new("-C"), dest.as_os_str()]
        } else {
            vec![
                OsStr::new("-o"),
                OsStr::new("-q"),
                archive.as_os_str(),
                OsStr::new("-d"),
                dest.as_os_str(),
            ]
        }
    }
}

impl Default for NativeUnzip {
    fn default() -> Self {
        Self::new()
    }
}

impl Decompressor for NativeUnzip {
    fn name(&self) -> &'static str {
        self.program
    }

    fn is_available(&self) -> bool {
        let probe = if self.program == "tar" { "--version" } else { "-v" };
        Command::new(self.program)
            .arg(probe)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }

    fn extract(&self, archive: &Utf8Path, dest: &Utf8Path) -> Result<(), ExtractionError> {
        debug!("running {} on {archive}", self.program);
        let output = Command::new(self.program)
            .args(self.extract_args(archive.as_std_path(), dest.as_std_path()))
            .stdin(Stdio::null())
            .output()?;

        if output.status.success() {
            return Ok(());
        }
        Err(ExtractionError::Exited {
            program: self.program,
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}

/// In-process extractor using the `zip` crate.
///
/// Validates each entry path before extraction to guard against path
/// traversal (zip-slip), and restores Unix permission bits so the unpacked
/// launchers stay executable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortableZip;

impl Decompressor for PortableZip {
    fn name(&self) -> &'static str {
        "zip"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn extract(&self, archive: &Utf8Path, dest: &Utf8Path) -> Result<(), ExtractionError> {
        let file = fs::File::open(archive)?;
        let mut zip = zip::ZipArchive::new(file)
            .map_err(|e| ExtractionError::InvalidArchive(e.to_string()))?;
        if zip.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }

        for index in 0..zip.len() {
            let mut entry = zip
                .by_index(index)
                .map_err(|e| ExtractionError::InvalidArchive(e.to_string()))?;
            let relative = entry
                .enclosed_name()
                .ok_or_else(|| ExtractionError::PathTraversal {
                    path: entry.name().to_owned(),
                })?;
            let out_path = dest.as_std_path().join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&out_path)?;
                continue;
            }
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out_file = fs::File::create(&out_path)?;
            std::io::copy(&mut entry, &mut out_file)?;
            restore_permissions(&out_path, entry.unix_mode())?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn restore_permissions(path: &Path, mode: Option<u32>) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match mode {
        Some(bits) => fs::set_permissions(path, fs::Permissions::from_mode(bits & 0o7777)),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn restore_permissions(_path: &Path, _mode: Option<u32>) -> std::io::Result<()> {
    Ok(())
}
