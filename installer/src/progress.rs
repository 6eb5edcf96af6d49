//! Download progress reporting.
//!
//! Interactive terminals get an `indicatif` bar; everything else gets plain
//! text lines at coarse intervals so redirected logs stay readable.

use crate::output::write_stderr_line;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::OnceLock;

/// Percentage step between text progress lines.
pub const PERCENT_STEP: u64 = 10;

/// Byte step between text progress lines when the total size is unknown.
pub const UNKNOWN_TOTAL_STEP: u64 = 10 * 1024 * 1024;

const BAR_TEMPLATE: &str =
    "{spinner:.blue} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const TICK_CHARS: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";
const PROGRESS_CHARS: &str = "█▓▒░  ";

/// Receives `(received, total)` updates for one download.
pub trait DownloadProgress {
    /// Records progress; `total` is `0` while unknown.
    fn update(&mut self, received: u64, total: u64);

    /// Marks the download as finished.
    fn finish(&mut self);
}

fn bar_style() -> Option<&'static ProgressStyle> {
    static STYLE: OnceLock<Option<ProgressStyle>> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::with_template(BAR_TEMPLATE)
                .ok()
                .map(|style| style.tick_chars(TICK_CHARS).progress_chars(PROGRESS_CHARS))
        })
        .as_ref()
}

/// A terminal progress bar drawn on standard error.
#[derive(Debug)]
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// Creates a bar with no length; the length is set on the first update
    /// that knows it.
    #[must_use]
    pub fn new() -> Self {
        let bar = ProgressBar::no_length();
        if let Some(style) = bar_style() {
            bar.set_style(style.clone());
        }
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadProgress for BarProgress {
    fn update(&mut self, received: u64, total: u64) {
        if total > 0 && self.bar.length() != Some(total) {
            self.bar.set_length(total);
        }
        self.bar.set_position(received);
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Plain-text progress: one line per [`PERCENT_STEP`] percent, or per
/// [`UNKNOWN_TOTAL_STEP`] bytes when the size is unknown.
pub struct TextProgress<'w> {
    writer: &'w mut dyn Write,
    next_percent: u64,
    next_bytes: u64,
    received: u64,
}

impl<'w> TextProgress<'w> {
    /// Creates a reporter writing to `writer`.
    #[must_use]
    pub const fn new(writer: &'w mut dyn Write) -> Self {
        Self {
            writer,
            next_percent: PERCENT_STEP,
            next_bytes: UNKNOWN_TOTAL_STEP,
            received: 0,
        }
    }
}

impl DownloadProgress for TextProgress<'_> {
    fn update(&mut self, received: u64, total: u64) {
        self.received = received;
        if total == 0 {
            if received >= self.next_bytes {
                write_stderr_line(self.writer, format!("Downloaded {}", HumanBytes(received)));
                while self.next_bytes <= received {
                    self.next_bytes = self.next_bytes.saturating_add(UNKNOWN_TOTAL_STEP);
                }
            }
            return;
        }

        let percent = received
            .saturating_mul(100)
            .checked_div(total)
            .unwrap_or(0)
            .min(100);
        if percent >= self.next_percent {
            write_stderr_line(
                self.writer,
                format!(
                    "Downloaded {percent}% ({} of {})",
                    HumanBytes(received),
                    HumanBytes(total)
                ),
            );
            let reached = percent.checked_div(PERCENT_STEP).unwrap_or(0);
            self.next_percent = reached.saturating_add(1).saturating_mul(PERCENT_STEP);
        }
    }

    fn finish(&mut self) {
        write_stderr_line(
            self.writer,
            format!("Download complete ({}).", HumanBytes(self.received)),
        );
    }
}
