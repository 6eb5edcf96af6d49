//! Output formatting for the installer CLI.
//!
//! All user-facing text goes through an [`OutputSink`]. Besides progress and
//! event messages it renders the completion summary and the shell snippets
//! that put the installed tools on `PATH`.

use crate::event::{InstallEvent, Severity};
use crate::layout::PathEntries;
use crate::progress::{BarProgress, DownloadProgress, TextProgress};
use crate::sdkmanager::StreamMode;
use camino::Utf8Path;
use log::debug;
use std::fmt::Display;
use std::io::Write;

/// Writes one line, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Where installer output is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// The process's own standard error.
    Process {
        /// Whether standard error is an interactive terminal.
        interactive: bool,
    },
    /// A caller-supplied writer.
    Custom,
}

/// Destination for all user-facing installer output.
pub struct OutputSink<'a> {
    writer: &'a mut dyn Write,
    kind: SinkKind,
}

impl<'a> OutputSink<'a> {
    /// Wraps the process's standard error.
    #[must_use]
    pub const fn process(writer: &'a mut dyn Write, interactive: bool) -> Self {
        Self {
            writer,
            kind: SinkKind::Process { interactive },
        }
    }

    /// Wraps a caller-supplied writer.
    #[must_use]
    pub const fn custom(writer: &'a mut dyn Write) -> Self {
        Self {
            writer,
            kind: SinkKind::Custom,
        }
    }

    /// Writes one line.
    pub fn line(&mut self, message: impl Display) {
        write_stderr_line(self.writer, message);
    }

    /// Child processes inherit the terminal only when output goes to the
    /// process's own streams; otherwise their output is captured and
    /// forwarded here.
    #[must_use]
    pub const fn stream_mode(&self) -> StreamMode {
        match self.kind {
            SinkKind::Process { .. } => StreamMode::Inherit,
            SinkKind::Custom => StreamMode::Capture,
        }
    }

    /// Returns a progress reporter suited to this sink.
    pub fn progress(&mut self) -> Box<dyn DownloadProgress + '_> {
        match self.kind {
            SinkKind::Process { interactive: true } => Box::new(BarProgress::new()),
            SinkKind::Process { interactive: false } | SinkKind::Custom => {
                Box::new(TextProgress::new(&mut *self.writer))
            }
        }
    }

    /// Renders one pipeline event.
    ///
    /// Verbose-only events are dropped unless `verbose` is set; the terminal
    /// [`InstallEvent::Completed`] renders the summary and shell snippet.
    pub fn event(&mut self, event: &InstallEvent, verbose: bool) {
        if event.is_verbose() && !verbose {
            return;
        }
        match event {
            InstallEvent::Completed { path_entries } => self.summary(path_entries),
            InstallEvent::ArchiveDeleted { archive } => debug!("deleted {archive}"),
            InstallEvent::PlatformToolsOutput { line } => self.line(format!("  {line}")),
            InstallEvent::ExtractStarted { .. }
            | InstallEvent::NativeExtractUnavailable { .. }
            | InstallEvent::Extracted { .. }
            | InstallEvent::LayoutReconciled { .. }
            | InstallEvent::ArchiveDeleteFailed { .. }
            | InstallEvent::PlatformToolsStarted
            | InstallEvent::PlatformToolsInstalled { .. }
            | InstallEvent::PathSettingsOpenFailed { .. } => {
                if let Some(message) = event.message() {
                    if message.severity == Severity::Warning {
                        self.line("");
                    }
                    self.line(message);
                }
            }
        }
    }

    fn summary(&mut self, path_entries: &PathEntries) {
        self.line("");
        self.line(success_message(path_entries));
        if let Some(root) = sdk_root(path_entries) {
            self.line("");
            self.line(ShellSnippet::new(root, path_entries).display_text());
        }
    }
}

/// The SDK root, three levels above the first entry (`cmdline-tools/latest/bin`).
fn sdk_root(path_entries: &PathEntries) -> Option<&Utf8Path> {
    path_entries
        .iter()
        .next()
        .and_then(Utf8Path::parent)
        .and_then(Utf8Path::parent)
        .and_then(Utf8Path::parent)
}

/// Shell configuration snippets for different shells.
#[derive(Debug, Clone)]
pub struct ShellSnippet {
    /// Export lines for bash/zsh.
    pub bash: String,
    /// Set lines for fish shell.
    pub fish: String,
    /// Set lines for PowerShell.
    pub powershell: String,
}

impl ShellSnippet {
    /// Creates snippets that set `ANDROID_HOME` to `root` and prepend
    /// `path_entries` to `PATH`.
    ///
    /// # Example
    ///
    /// ```
    /// use sdk_installer::layout::SdkLayout;
    /// use sdk_installer::output::ShellSnippet;
    ///
    /// let layout = SdkLayout::new("/home/user/Android/Sdk");
    /// let snippet = ShellSnippet::new(layout.root(), &layout.path_entries(true));
    ///
    /// assert!(snippet.bash.contains("export ANDROID_HOME=\"/home/user/Android/Sdk\""));
    /// assert!(snippet.bash.contains("/home/user/Android/Sdk/platform-tools"));
    /// ```
    #[must_use]
    pub fn new(root: &Utf8Path, path_entries: &PathEntries) -> Self {
        let unix_path = join_entries(path_entries, ":");
        let windows_path = join_entries(path_entries, ";");
        let fish_paths = path_entries
            .iter()
            .map(|entry| format!("\"{entry}\""))
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            bash: format!("export ANDROID_HOME=\"{root}\"\n  export PATH=\"{unix_path}:$PATH\""),
            fish: format!("set -gx ANDROID_HOME \"{root}\"\n  fish_add_path {fish_paths}"),
            powershell: format!(
                "$env:ANDROID_HOME = \"{root}\"\n  $env:Path = \"{windows_path};\" + $env:Path"
            ),
        }
    }

    /// Format the snippet for display to the user.
    #[must_use]
    pub fn display_text(&self) -> String {
        format!(
            concat!(
                "Add the following to your shell configuration:\n\n",
                "  # bash/zsh (~/.bashrc, ~/.zshrc)\n",
                "  {}\n\n",
                "  # fish (~/.config/fish/config.fish)\n",
                "  {}\n\n",
                "  # PowerShell ($PROFILE)\n",
                "  {}"
            ),
            self.bash, self.fish, self.powershell
        )
    }
}

fn join_entries(path_entries: &PathEntries, separator: &str) -> String {
    path_entries
        .iter()
        .map(Utf8Path::as_str)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Format a success message listing the directories to add to `PATH`.
#[must_use]
pub fn success_message(path_entries: &PathEntries) -> String {
    let mut lines = vec!["Installation complete. Add these directories to your PATH:".to_owned()];
    lines.extend(path_entries.iter().map(|entry| format!("  {entry}")));
    lines.join("\n")
}
