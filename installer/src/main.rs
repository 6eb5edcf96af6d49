//! Android SDK installer CLI entrypoint.
//!
//! This binary downloads and unpacks the command-line tools, installs
//! platform-tools, and prints the directories to add to `PATH`. Each failure
//! kind exits with its own code; argument errors exit with 2.

use clap::Parser;
use sdk_installer::archive::download::{ArchiveProvider, HttpArchiveProvider};
use sdk_installer::archive::extraction::{NativeUnzip, PortableZip};
use sdk_installer::cli::Cli;
use sdk_installer::dirs::{BaseDirs, NoBaseDirs, SystemBaseDirs};
use sdk_installer::error::{InstallerError, Result};
use sdk_installer::install::{Services, install};
use sdk_installer::output::{OutputSink, write_stderr_line};
use sdk_installer::path_settings::SystemPathSettings;
use sdk_installer::platform::HostOs;
use sdk_installer::sdkmanager::SdkManager;
use std::io::{IsTerminal, Write};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut stderr = std::io::stderr();
    let interactive = stderr.is_terminal();
    let run_result = {
        let mut sink = OutputSink::process(&mut stderr, interactive);
        run(&cli, &mut sink)
    };
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Returns the log filter used when `RUST_LOG` is unset.
const fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,sdk_installer=debug"
    } else {
        "warn"
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if installed.is_err() {
        // A subscriber is already installed; keep it.
    }
}

fn run(cli: &Cli, sink: &mut OutputSink<'_>) -> Result<()> {
    let os = HostOs::current();
    let system_dirs = SystemBaseDirs::new();
    let dirs = system_dirs
        .as_ref()
        .map_or(&NoBaseDirs as &dyn BaseDirs, |dirs| dirs as &dyn BaseDirs);
    let provider = HttpArchiveProvider::for_host(&os).ok();
    let native = NativeUnzip::new();
    let launcher = SystemPathSettings::new(os.clone());

    let services = Services {
        os: &os,
        dirs,
        provider: provider.as_ref().map(|p| p as &dyn ArchiveProvider),
        native: &native,
        portable: &PortableZip,
        installer: &SdkManager,
        launcher: &launcher,
    };
    install(&cli.install_options(), &services, sink).map(drop)
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_error(&err, stderr);
            err.exit_code()
        }
    }
}

/// Writes `err` and its source chain.
fn write_error(err: &InstallerError, stderr: &mut dyn Write) {
    write_stderr_line(stderr, "");
    write_stderr_line(stderr, format!("Error: {err}"));
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        write_stderr_line(stderr, format!("  caused by: {cause}"));
        source = std::error::Error::source(cause);
    }
}
