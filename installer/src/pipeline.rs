//! Installation pipeline.
//!
//! A run moves strictly forward through the [`Stage`]s: extract the archive,
//! reconcile the unpacked directory with the layout `sdkmanager` expects,
//! optionally install platform-tools, then finalize. Every failure aborts the
//! run at the stage it occurred in; nothing is retried. Progress is reported
//! as a stream of [`InstallEvent`]s ending in [`InstallEvent::Completed`].

use crate::archive::extraction::Decompressor;
use crate::archive::handle::ArchiveHandle;
use crate::error::{InstallerError, Result};
use crate::event::{InstallEvent, Stage};
use crate::layout::{EXPECTED_SUBDIR, PLATFORM_TOOLS_PACKAGE, PathEntries, SdkLayout};
use crate::path_settings::PathSettingsLauncher;
use crate::platform::HostOs;
use crate::sdkmanager::{ComponentInstaller, ComponentRequest, StreamMode};
use camino::Utf8PathBuf;
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Installation root; created if absent.
    pub root: Utf8PathBuf,
    /// The archive to unpack.
    pub archive: ArchiveHandle,
    /// Delete a downloaded archive once it has been unpacked.
    pub delete_archive: bool,
    /// Run `sdkmanager` to install platform-tools.
    pub install_platform_tools: bool,
    /// Open the OS path settings when finished.
    pub open_path_settings: bool,
    /// Run `sdkmanager` verbosely.
    pub verbose: bool,
    /// How `sdkmanager` output is handled.
    pub stream: StreamMode,
    /// Host operating system, used to pick the `sdkmanager` launcher.
    pub os: HostOs,
}

/// External capabilities the pipeline drives.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Preferred, platform-provided decompressor.
    pub native: &'a dyn Decompressor,
    /// Fallback decompressor used when the native one is unavailable or fails.
    pub portable: &'a dyn Decompressor,
    /// Package installer used for platform-tools.
    pub installer: &'a dyn ComponentInstaller,
    /// Launcher for the OS path settings.
    pub launcher: &'a dyn PathSettingsLauncher,
}

/// The installation state machine.
pub struct Pipeline<'a> {
    tools: Collaborators<'a>,
}

/// Mutable state threaded through the stages of one run.
struct Run<'o, 'e> {
    options: &'o PipelineOptions,
    layout: SdkLayout,
    emit: &'e mut dyn FnMut(InstallEvent),
    platform_tools_installed: bool,
}

impl Run<'_, '_> {
    fn emit(&mut self, event: InstallEvent) {
        (self.emit)(event);
    }
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline over the given collaborators.
    #[must_use]
    pub const fn new(tools: Collaborators<'a>) -> Self {
        Self { tools }
    }

    /// Runs every stage to completion and returns the path entries.
    ///
    /// `emit` receives each event in order; the last one on success is
    /// [`InstallEvent::Completed`].
    ///
    /// # Errors
    ///
    /// - [`InstallerError::ArchiveNotFound`] if the archive is not a readable file.
    /// - [`InstallerError::ExtractFailed`] if both decompressors fail.
    /// - [`InstallerError::PrepareFailed`] if the layout cannot be reconciled.
    /// - [`InstallerError::PlatformToolsInstallFailed`] if `sdkmanager` fails.
    /// - [`InstallerError::Io`] if the root cannot be created or `sdkmanager`
    ///   cannot be spawned.
    pub fn run(
        &self,
        options: &PipelineOptions,
        emit: &mut dyn FnMut(InstallEvent),
    ) -> Result<PathEntries> {
        options.archive.ensure_readable()?;
        fs::create_dir_all(&options.root)?;

        let mut run = Run {
            options,
            layout: SdkLayout::new(options.root.clone()),
            emit,
            platform_tools_installed: false,
        };

        let mut stage = Stage::Extracting;
        loop {
            debug!("pipeline stage: {}", stage.label());
            stage = match stage {
                Stage::Extracting => {
                    self.extract(&mut run)?;
                    Stage::ReconcilingLayout
                }
                Stage::ReconcilingLayout => {
                    Self::reconcile(&mut run)?;
                    if options.install_platform_tools {
                        Stage::InstallingPlatformTools
                    } else {
                        Stage::Finalizing
                    }
                }
                Stage::InstallingPlatformTools => {
                    self.install_platform_tools(&mut run)?;
                    Stage::Finalizing
                }
                Stage::Finalizing => return Ok(self.finalize(&mut run)),
            };
        }
    }

    fn extract(&self, run: &mut Run<'_, '_>) -> Result<()> {
        let options = run.options;
        let archive = options.archive.path();
        let root = run.layout.root().to_owned();
        run.emit(InstallEvent::ExtractStarted {
            archive: archive.to_owned(),
        });

        let native = self.tools.native;
        let native_failure = if native.is_available() {
            native.extract(archive, &root).err().map(|e| e.to_string())
        } else {
            Some(format!("{} not found", native.name()))
        };

        let used_native = match native_failure {
            None => true,
            Some(reason) => {
                warn!("native extraction unavailable: {reason}");
                run.emit(InstallEvent::NativeExtractUnavailable { reason });
                self.tools
                    .portable
                    .extract(archive, &root)
                    .map_err(|e| InstallerError::ExtractFailed {
                        code: e.exit_code(),
                        reason: e.to_string(),
                    })?;
                false
            }
        };

        run.emit(InstallEvent::Extracted {
            native: used_native,
        });
        Ok(())
    }

    fn reconcile(run: &mut Run<'_, '_>) -> Result<()> {
        let tools_dir = run.layout.tools_dir();
        move_into_expected_dir(run.layout.unpacked_dir().as_std_path(), tools_dir.as_std_path())
            .map_err(|source| InstallerError::PrepareFailed { source })?;
        info!("command-line tools reconciled into {tools_dir}");
        run.emit(InstallEvent::LayoutReconciled { tools_dir });

        let options = run.options;
        let archive = &options.archive;
        if options.delete_archive && archive.is_owned() {
            let path = archive.path().to_owned();
            match fs::remove_file(&path) {
                Ok(()) => run.emit(InstallEvent::ArchiveDeleted { archive: path }),
                Err(e) => {
                    warn!("could not delete {path}: {e}");
                    run.emit(InstallEvent::ArchiveDeleteFailed {
                        archive: path,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn install_platform_tools(&self, run: &mut Run<'_, '_>) -> Result<()> {
        run.emit(InstallEvent::PlatformToolsStarted);

        let sdkmanager = run.layout.sdkmanager(run.options.os.is_windows());
        let request = ComponentRequest {
            sdkmanager: &sdkmanager,
            sdk_root: run.layout.root(),
            package: PLATFORM_TOOLS_PACKAGE,
            verbose: run.options.verbose,
            stream: run.options.stream,
        };
        let emit = &mut *run.emit;
        let code = self.tools.installer.install(&request, &mut |line| {
            emit(InstallEvent::PlatformToolsOutput { line });
        })?;
        if code != 0 {
            return Err(InstallerError::PlatformToolsInstallFailed { code });
        }

        run.platform_tools_installed = true;
        run.emit(InstallEvent::PlatformToolsInstalled {
            dir: run.layout.platform_tools_dir(),
        });
        Ok(())
    }

    fn finalize(&self, run: &mut Run<'_, '_>) -> PathEntries {
        let path_entries = run.layout.path_entries(run.platform_tools_installed);

        if run.options.open_path_settings {
            if let Err(e) = self.tools.launcher.open() {
                warn!("could not open path settings: {e}");
                run.emit(InstallEvent::PathSettingsOpenFailed {
                    reason: e.to_string(),
                });
            }
        }

        run.emit(InstallEvent::Completed {
            path_entries: path_entries.clone(),
        });
        path_entries
    }
}

/// Moves every entry of `unpacked` except `latest` into `tools_dir`.
///
/// Entries already present in `tools_dir` are replaced, so re-running over a
/// previous installation overwrites it.
fn move_into_expected_dir(unpacked: &Path, tools_dir: &Path) -> std::io::Result<()> {
    let entries = fs::read_dir(unpacked)?.collect::<std::io::Result<Vec<_>>>()?;
    fs::create_dir_all(tools_dir)?;

    for entry in entries {
        let name = entry.file_name();
        if name == EXPECTED_SUBDIR {
            continue;
        }
        let target = tools_dir.join(&name);
        remove_existing(&target)?;
        fs::rename(entry.path(), &target)?;
    }
    Ok(())
}

fn remove_existing(path: &Path) -> std::io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
