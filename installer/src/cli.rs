//! CLI argument definitions for the SDK installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::install::InstallOptions;
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser};

/// Install the Android SDK command-line tools.
#[derive(Parser, Debug, Clone)]
#[command(name = "sdk-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install the Android SDK command-line tools.\n\n",
    "Downloads the command-line tools archive for this platform, unpacks it into ",
    "the SDK root as cmdline-tools/latest, and uses the bundled sdkmanager to ",
    "install platform-tools. Finally prints the directories to add to PATH.\n\n",
    "Without DIR the SDK root is the location Android Studio uses: ",
    "~/Library/Android/sdk on macOS, ~/Android/Sdk on Linux and ",
    "%LOCALAPPDATA%\\Android\\Sdk on Windows.",
))]
#[command(after_help = concat!(
    "EXIT CODES:\n",
    "  0    Installation completed\n",
    "  2    Invalid arguments\n",
    "  -1   Unsupported platform\n",
    "  -2   Archive extraction failed\n",
    "  -3   Preparing cmdline-tools/latest failed\n",
    "  -4   sdkmanager could not install platform-tools\n",
    "  -5   Archive download failed\n",
    "  -6   Archive not found\n\n",
    "EXAMPLES:\n",
    "  Install into the default SDK root:\n",
    "    $ sdk-installer\n\n",
    "  Install into a custom directory from an already downloaded archive:\n",
    "    $ sdk-installer ~/sdk --archive commandlinetools-linux-13114758_latest.zip\n\n",
    "  Install only the command-line tools, showing sdkmanager output:\n",
    "    $ sdk-installer --no-platform-tools --verbose",
))]
pub struct Cli {
    /// SDK root to install into [default: platform-specific].
    #[arg(value_name = "DIR")]
    pub dir: Option<Utf8PathBuf>,

    /// Install from a local archive instead of downloading.
    #[arg(long, value_name = "FILE")]
    pub archive: Option<Utf8PathBuf>,

    /// Keep the downloaded archive after extraction.
    #[arg(long)]
    pub keep_archive: bool,

    /// Do not install platform-tools.
    #[arg(long = "no-platform-tools", action = ArgAction::SetFalse)]
    pub platform_tools: bool,

    /// Do not open the system PATH settings when finished.
    #[arg(long = "no-path-settings", action = ArgAction::SetFalse)]
    pub path_settings: bool,

    /// Show sdkmanager output and debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Converts the parsed arguments into installation settings.
    #[must_use]
    pub fn install_options(&self) -> InstallOptions {
        InstallOptions {
            root: self.dir.clone(),
            archive: self.archive.clone(),
            keep_archive: self.keep_archive,
            install_platform_tools: self.platform_tools,
            open_path_settings: self.path_settings,
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
