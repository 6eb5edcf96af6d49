//! Opening the operating system's environment-variable settings.
//!
//! Only Windows has a settings dialog for `PATH`; on other platforms the
//! launcher does nothing and the printed shell snippet is the only guidance.

use crate::platform::HostOs;
use log::debug;
use std::process::{Command, Stdio};

/// Opens the OS-level `PATH` settings UI.
#[cfg_attr(test, mockall::automock)]
pub trait PathSettingsLauncher {
    /// Opens the settings UI without waiting for it to close.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the settings UI cannot be launched.
    fn open(&self) -> std::io::Result<()>;
}

/// Launches the settings UI of the host operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPathSettings {
    os: HostOs,
}

impl SystemPathSettings {
    /// Creates a launcher for `os`.
    #[must_use]
    pub const fn new(os: HostOs) -> Self {
        Self { os }
    }
}

impl PathSettingsLauncher for SystemPathSettings {
    fn open(&self) -> std::io::Result<()> {
        if !self.os.is_windows() {
            debug!("no path settings UI on {}", self.os);
            return Ok(());
        }
        Command::new("rundll32")
            .arg("sysdm.cpl,EditEnvironmentVariables")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
    }
}
