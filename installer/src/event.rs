//! Progress events emitted by the installation pipeline.
//!
//! Events form a closed set: consumers match on [`InstallEvent`] exhaustively
//! and use [`InstallEvent::stage`] and [`InstallEvent::message`] for generic
//! rendering.

use crate::layout::PathEntries;
use camino::Utf8PathBuf;
use std::fmt;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Unpacking the archive into the installation root.
    Extracting,
    /// Moving the unpacked directory to the name `sdkmanager` expects.
    ReconcilingLayout,
    /// Running `sdkmanager` to install platform-tools.
    InstallingPlatformTools,
    /// Computing path entries and finishing the run.
    Finalizing,
}

impl Stage {
    /// Returns `true` when raw output produced inside this stage is only
    /// shown in verbose mode.
    #[must_use]
    pub fn output_is_verbose(self) -> bool {
        STAGE_OUTPUT
            .iter()
            .find(|(stage, _)| *stage == self)
            .is_some_and(|(_, verbose)| *verbose)
    }

    /// Returns a short human-readable label for the stage.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Extracting => "extracting",
            Self::ReconcilingLayout => "preparing",
            Self::InstallingPlatformTools => "installing platform tools",
            Self::Finalizing => "finalizing",
        }
    }
}

/// Whether each stage's internal output is verbose-only.
const STAGE_OUTPUT: &[(Stage, bool)] = &[
    (Stage::Extracting, false),
    (Stage::ReconcilingLayout, false),
    (Stage::InstallingPlatformTools, true),
    (Stage::Finalizing, false),
];

/// Severity attached to an event message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Routine progress information.
    Info,
    /// A non-fatal problem the run recovered from.
    Warning,
}

/// Human-readable text attached to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage {
    /// The message text.
    pub text: String,
    /// How the message should be presented.
    pub severity: Severity,
}

impl EventMessage {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Info,
        }
    }

    fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Warning,
        }
    }
}

impl fmt::Display for EventMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Info => f.write_str(&self.text),
            Severity::Warning => write!(f, "Warning: {}", self.text),
        }
    }
}

/// One observable step of an installation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallEvent {
    /// Extraction of the archive has begun.
    ExtractStarted {
        /// The archive being extracted.
        archive: Utf8PathBuf,
    },
    /// The native decompressor could not be used; the portable one takes over.
    NativeExtractUnavailable {
        /// Why the native decompressor was skipped.
        reason: String,
    },
    /// The archive has been unpacked.
    Extracted {
        /// Whether the native decompressor did the work.
        native: bool,
    },
    /// The unpacked tools now live where `sdkmanager` expects them.
    LayoutReconciled {
        /// The reconciled tools directory.
        tools_dir: Utf8PathBuf,
    },
    /// The downloaded archive was removed.
    ArchiveDeleted {
        /// The removed archive.
        archive: Utf8PathBuf,
    },
    /// The downloaded archive could not be removed.
    ArchiveDeleteFailed {
        /// The archive left behind.
        archive: Utf8PathBuf,
        /// Why removal failed.
        reason: String,
    },
    /// `sdkmanager` has been launched.
    PlatformToolsStarted,
    /// One line of `sdkmanager` output.
    PlatformToolsOutput {
        /// The output line, without its terminator.
        line: String,
    },
    /// `sdkmanager` finished successfully.
    PlatformToolsInstalled {
        /// The platform-tools directory.
        dir: Utf8PathBuf,
    },
    /// The OS path-settings UI could not be opened.
    PathSettingsOpenFailed {
        /// Why the launcher failed.
        reason: String,
    },
    /// The run finished successfully.
    Completed {
        /// Directories to add to `PATH`.
        path_entries: PathEntries,
    },
}

impl InstallEvent {
    /// Returns the stage that emitted this event.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::ExtractStarted { .. }
            | Self::NativeExtractUnavailable { .. }
            | Self::Extracted { .. } => Stage::Extracting,
            Self::LayoutReconciled { .. }
            | Self::ArchiveDeleted { .. }
            | Self::ArchiveDeleteFailed { .. } => Stage::ReconcilingLayout,
            Self::PlatformToolsStarted
            | Self::PlatformToolsOutput { .. }
            | Self::PlatformToolsInstalled { .. } => Stage::InstallingPlatformTools,
            Self::PathSettingsOpenFailed { .. } | Self::Completed { .. } => Stage::Finalizing,
        }
    }

    /// Returns `true` for raw output produced by a stage's external process.
    #[must_use]
    pub const fn is_stage_output(&self) -> bool {
        matches!(self, Self::PlatformToolsOutput { .. })
    }

    /// Returns `true` when the event should only be shown in verbose mode.
    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.is_stage_output() && self.stage().output_is_verbose()
    }

    /// Returns the message to show for this event, if any.
    #[must_use]
    pub fn message(&self) -> Option<EventMessage> {
        match self {
            Self::ExtractStarted { archive } => {
                Some(EventMessage::info(format!("Extracting {archive}...")))
            }
            Self::NativeExtractUnavailable { reason } => Some(EventMessage::warning(format!(
                "native unzip unavailable ({reason}); using the built-in extractor"
            ))),
            Self::Extracted { .. } => Some(EventMessage::info("Extraction complete.")),
            Self::LayoutReconciled { tools_dir } => Some(EventMessage::info(format!(
                "Command-line tools installed to {tools_dir}"
            ))),
            Self::ArchiveDeleted { .. } => None,
            Self::ArchiveDeleteFailed { archive, reason } => Some(EventMessage::warning(
                format!("could not delete {archive}: {reason}"),
            )),
            Self::PlatformToolsStarted => Some(EventMessage::info("Installing platform-tools...")),
            Self::PlatformToolsOutput { line } => Some(EventMessage::info(line.clone())),
            Self::PlatformToolsInstalled { dir } => Some(EventMessage::info(format!(
                "Platform-tools installed to {dir}"
            ))),
            Self::PathSettingsOpenFailed { reason } => Some(EventMessage::warning(format!(
                "could not open the path settings: {reason}"
            ))),
            Self::Completed { .. } => None,
        }
    }
}
