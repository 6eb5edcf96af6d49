//! Shared test utilities for the installer crate.
//!
//! Stubs for the pipeline's external capabilities, usable from unit tests and,
//! with the `test-support` feature, from integration tests.

use crate::archive::download::{ArchiveProvider, DownloadError, ProgressFn};
use crate::archive::extraction::{Decompressor, ExtractionError};
use crate::layout::{EXPECTED_SUBDIR, PLATFORM_TOOLS_PACKAGE, UNPACKED_DIR};
use crate::path_settings::PathSettingsLauncher;
use crate::sdkmanager::{ComponentInstaller, ComponentRequest};
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::{Cell, RefCell};
use std::fs;
use std::io::Write;

/// Files placed under `cmdline-tools/` by [`write_cmdline_tools`].
pub const CMDLINE_TOOLS_FILES: &[&str] = &[
    "bin/sdkmanager",
    "bin/avdmanager",
    "lib/sdkmanager-classpath.jar",
    "NOTICE.txt",
    "source.properties",
];

/// Writes an unpacked command-line tools tree into `dest`, as the real
/// archive would produce it.
///
/// # Errors
///
/// Returns an I/O error if a file cannot be written.
pub fn write_cmdline_tools(dest: &Utf8Path) -> std::io::Result<()> {
    let unpacked = dest.join(UNPACKED_DIR);
    for file in CMDLINE_TOOLS_FILES {
        let path = unpacked.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, format!("stub {file}\n"))?;
    }
    Ok(())
}

/// Writes a real zip archive holding the command-line tools tree to `path`.
///
/// # Errors
///
/// Returns an I/O error if the archive cannot be written.
pub fn write_cmdline_tools_zip(path: &Utf8Path) -> std::io::Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = zip::ZipWriter::new(file);
    for entry in CMDLINE_TOOLS_FILES {
        let mode = if entry.starts_with("bin/") { 0o755 } else { 0o644 };
        let options = zip::write::SimpleFileOptions::default().unix_permissions(mode);
        writer
            .start_file(format!("{UNPACKED_DIR}/{entry}"), options)
            .map_err(std::io::Error::other)?;
        writer.write_all(format!("stub {entry}\n").as_bytes())?;
    }
    writer.finish().map_err(std::io::Error::other)?;
    Ok(())
}

/// Returns `true` when `root` holds the reconciled command-line tools.
#[must_use]
pub fn has_reconciled_tools(root: &Utf8Path) -> bool {
    let tools = root.join(UNPACKED_DIR).join(EXPECTED_SUBDIR);
    CMDLINE_TOOLS_FILES
        .iter()
        .all(|file| tools.join(file).is_file())
}

/// What a [`StubDecompressor`] does when asked to extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubExtraction {
    /// Writes the command-line tools tree.
    Unpacks,
    /// Fails with the given exit code.
    Fails(i32),
}

/// A decompressor that never reads the archive.
#[derive(Debug)]
pub struct StubDecompressor {
    name: &'static str,
    available: bool,
    outcome: StubExtraction,
    calls: Cell<usize>,
}

impl StubDecompressor {
    /// A decompressor that writes the tools tree.
    #[must_use]
    pub const fn unpacking(name: &'static str) -> Self {
        Self::new(name, true, StubExtraction::Unpacks)
    }

    /// A decompressor that fails with `code`.
    #[must_use]
    pub const fn failing(name: &'static str, code: i32) -> Self {
        Self::new(name, true, StubExtraction::Fails(code))
    }

    /// A decompressor that reports itself unavailable.
    #[must_use]
    pub const fn unavailable(name: &'static str) -> Self {
        Self::new(name, false, StubExtraction::Unpacks)
    }

    const fn new(name: &'static str, available: bool, outcome: StubExtraction) -> Self {
        Self {
            name,
            available,
            outcome,
            calls: Cell::new(0),
        }
    }

    /// Number of `extract` calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Decompressor for StubDecompressor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn extract(&self, _archive: &Utf8Path, dest: &Utf8Path) -> Result<(), ExtractionError> {
        self.calls.set(self.calls.get().saturating_add(1));
        match self.outcome {
            StubExtraction::Unpacks => Ok(write_cmdline_tools(dest)?),
            StubExtraction::Fails(code) => Err(ExtractionError::Exited {
                program: self.name,
                code,
                stderr: "stub failure".to_owned(),
            }),
        }
    }
}

/// An installer that replays canned output and exits with a fixed code.
///
/// On success it creates the package directory under the SDK root.
#[derive(Debug, Default)]
pub struct StubComponentInstaller {
    lines: Vec<String>,
    exit_code: i32,
    requests: RefCell<Vec<RecordedRequest>>,
}

/// The parts of a [`ComponentRequest`] a stub records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// The launcher that would have been run.
    pub sdkmanager: Utf8PathBuf,
    /// The SDK root.
    pub sdk_root: Utf8PathBuf,
    /// The requested package.
    pub package: String,
    /// Whether verbose output was requested.
    pub verbose: bool,
}

impl StubComponentInstaller {
    /// An installer that prints `lines` and succeeds.
    #[must_use]
    pub fn succeeding(lines: &[&str]) -> Self {
        Self::exiting_with(lines, 0)
    }

    /// An installer that prints `lines` and exits with `exit_code`.
    #[must_use]
    pub fn exiting_with(lines: &[&str], exit_code: i32) -> Self {
        Self {
            lines: lines.iter().map(|line| (*line).to_owned()).collect(),
            exit_code,
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }
}

impl ComponentInstaller for StubComponentInstaller {
    fn install(
        &self,
        request: &ComponentRequest<'_>,
        on_line: &mut dyn FnMut(String),
    ) -> std::io::Result<i32> {
        self.requests.borrow_mut().push(RecordedRequest {
            sdkmanager: request.sdkmanager.to_owned(),
            sdk_root: request.sdk_root.to_owned(),
            package: request.package.to_owned(),
            verbose: request.verbose,
        });
        for line in &self.lines {
            on_line(line.clone());
        }
        if self.exit_code == 0 {
            fs::create_dir_all(request.sdk_root.join(PLATFORM_TOOLS_PACKAGE))?;
        }
        Ok(self.exit_code)
    }
}

/// A path-settings launcher that counts how often it was opened.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    fail: bool,
    opened: Cell<usize>,
}

impl RecordingLauncher {
    /// A launcher whose `open` always fails.
    #[must_use]
    pub const fn failing() -> Self {
        Self {
            fail: true,
            opened: Cell::new(0),
        }
    }

    /// Number of `open` calls made so far.
    #[must_use]
    pub fn opened(&self) -> usize {
        self.opened.get()
    }
}

impl PathSettingsLauncher for RecordingLauncher {
    fn open(&self) -> std::io::Result<()> {
        self.opened.set(self.opened.get().saturating_add(1));
        if self.fail {
            Err(std::io::Error::other("no settings UI"))
        } else {
            Ok(())
        }
    }
}

/// An archive provider that writes a real tools zip and reports fixed progress.
#[derive(Debug, Default)]
pub struct StubArchiveProvider {
    chunks: Vec<(u64, u64)>,
    fail: Option<DownloadError>,
}

impl StubArchiveProvider {
    /// A provider that reports `chunks` as `(received, total)` progress.
    #[must_use]
    pub const fn with_progress(chunks: Vec<(u64, u64)>) -> Self {
        Self { chunks, fail: None }
    }

    /// A provider whose download always fails with `err`.
    #[must_use]
    pub const fn failing(err: DownloadError) -> Self {
        Self {
            chunks: Vec::new(),
            fail: Some(err),
        }
    }
}

/// Filename used by [`StubArchiveProvider`].
pub const STUB_ARCHIVE_NAME: &str = "commandlinetools-stub_latest.zip";

impl ArchiveProvider for StubArchiveProvider {
    fn download(
        &self,
        target_root: &Utf8Path,
        on_progress: ProgressFn<'_>,
    ) -> Result<Utf8PathBuf, DownloadError> {
        if let Some(err) = &self.fail {
            return Err(err.clone());
        }
        for (received, total) in &self.chunks {
            on_progress(*received, *total);
        }
        let dest = target_root.join(STUB_ARCHIVE_NAME);
        write_cmdline_tools_zip(&dest)?;
        Ok(dest)
    }
}
