//! Installation orchestrator.
//!
//! Resolves the installation root, obtains the archive (supplied or
//! downloaded), runs the [`Pipeline`] and renders its events to an
//! [`OutputSink`].

use crate::archive::download::ArchiveProvider;
use crate::archive::extraction::Decompressor;
use crate::archive::handle::ArchiveHandle;
use crate::dirs::BaseDirs;
use crate::error::{InstallerError, Result};
use crate::layout::PathEntries;
use crate::output::OutputSink;
use crate::path_settings::PathSettingsLauncher;
use crate::pipeline::{Collaborators, Pipeline, PipelineOptions};
use crate::platform::HostOs;
use crate::root::{ensure_root, resolve_default_root};
use crate::sdkmanager::ComponentInstaller;
use camino::{Utf8Path, Utf8PathBuf};
use log::info;

/// User-facing installation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    /// Installation root; the platform default when `None`.
    pub root: Option<Utf8PathBuf>,
    /// Local archive to install from instead of downloading.
    pub archive: Option<Utf8PathBuf>,
    /// Keep the downloaded archive after extraction.
    pub keep_archive: bool,
    /// Install platform-tools with `sdkmanager`.
    pub install_platform_tools: bool,
    /// Open the OS path settings when finished.
    pub open_path_settings: bool,
    /// Show `sdkmanager` output and pass it `--verbose`.
    pub verbose: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            root: None,
            archive: None,
            keep_archive: false,
            install_platform_tools: true,
            open_path_settings: true,
            verbose: false,
        }
    }
}

/// The host capabilities an installation uses.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    /// The host operating system.
    pub os: &'a HostOs,
    /// Well-known user directories.
    pub dirs: &'a dyn BaseDirs,
    /// Archive source; `None` when no archive is published for the host.
    pub provider: Option<&'a dyn ArchiveProvider>,
    /// Preferred decompressor.
    pub native: &'a dyn Decompressor,
    /// Fallback decompressor.
    pub portable: &'a dyn Decompressor,
    /// Installer for platform-tools.
    pub installer: &'a dyn ComponentInstaller,
    /// Launcher for the OS path settings.
    pub launcher: &'a dyn PathSettingsLauncher,
}

/// Runs a complete installation and returns the directories to add to `PATH`.
///
/// # Errors
///
/// Returns the first [`InstallerError`] raised while resolving the root,
/// obtaining the archive or running the pipeline.
pub fn install(
    options: &InstallOptions,
    services: &Services<'_>,
    sink: &mut OutputSink<'_>,
) -> Result<PathEntries> {
    let root = match &options.root {
        Some(path) => ensure_root(path)?,
        None => resolve_default_root(services.os, services.dirs)?,
    };
    info!("installing into {root}");
    sink.line(format!("Installing Android SDK command-line tools to {root}"));

    let archive = obtain_archive(options, services, &root, sink)?;
    let pipeline_options = PipelineOptions {
        root,
        archive,
        delete_archive: !options.keep_archive,
        install_platform_tools: options.install_platform_tools,
        open_path_settings: options.open_path_settings,
        verbose: options.verbose,
        stream: sink.stream_mode(),
        os: services.os.clone(),
    };
    let pipeline = Pipeline::new(Collaborators {
        native: services.native,
        portable: services.portable,
        installer: services.installer,
        launcher: services.launcher,
    });
    pipeline.run(&pipeline_options, &mut |event| {
        sink.event(&event, options.verbose);
    })
}

fn obtain_archive(
    options: &InstallOptions,
    services: &Services<'_>,
    root: &Utf8Path,
    sink: &mut OutputSink<'_>,
) -> Result<ArchiveHandle> {
    if let Some(path) = &options.archive {
        let handle = ArchiveHandle::Supplied(path.clone());
        handle.ensure_readable()?;
        return Ok(handle);
    }

    let provider = services
        .provider
        .ok_or_else(|| InstallerError::UnsupportedPlatform {
            os: services.os.to_string(),
        })?;
    sink.line("Downloading command-line tools...");
    let mut progress = sink.progress();
    let downloaded = provider.download(root, &mut |received, total| {
        progress.update(received, total);
    });
    progress.finish();
    Ok(ArchiveHandle::Downloaded(downloaded?))
}
