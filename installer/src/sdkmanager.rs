//! Invocation of the unpacked `sdkmanager` to install dependent packages.
//!
//! `sdkmanager` prompts for license acceptance on standard input; the
//! installer answers every prompt with `y` so the run never blocks.

use camino::Utf8Path;
use log::{debug, warn};
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

/// Answers written to `sdkmanager`'s standard input before it starts prompting.
const LICENSE_ANSWERS: usize = 64;

/// Exit code reported when the child was terminated without one (e.g. by a signal).
pub const NO_EXIT_CODE: i32 = -1;

/// How a child process's standard output and error are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// The child writes straight to the parent's streams.
    Inherit,
    /// The child's output is captured and forwarded line by line.
    Capture,
}

/// One package installation request.
#[derive(Debug, Clone, Copy)]
pub struct ComponentRequest<'a> {
    /// Path to the `sdkmanager` launcher.
    pub sdkmanager: &'a Utf8Path,
    /// SDK root passed as `--sdk_root`.
    pub sdk_root: &'a Utf8Path,
    /// Package to install, e.g. `platform-tools`.
    pub package: &'a str,
    /// Run `sdkmanager` with `--verbose`.
    pub verbose: bool,
    /// Output handling for the child.
    pub stream: StreamMode,
}

/// Installs a package with the SDK's own package manager.
pub trait ComponentInstaller {
    /// Runs the installation and returns the process exit code.
    ///
    /// In [`StreamMode::Capture`] every output line is passed to `on_line`
    /// in arrival order before this method returns.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the process cannot be spawned or awaited.
    fn install(
        &self,
        request: &ComponentRequest<'_>,
        on_line: &mut dyn FnMut(String),
    ) -> std::io::Result<i32>;
}

/// Runs the real `sdkmanager` launcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkManager;

impl SdkManager {
    fn command(request: &ComponentRequest<'_>) -> Command {
        let mut command = Command::new(request.sdkmanager.as_std_path());
        command
            .arg(format!("--sdk_root={}", request.sdk_root))
            .arg("--install")
            .arg(request.package)
            .stdin(Stdio::piped());
        if request.verbose {
            command.arg("--verbose");
        }
        command
    }
}

impl ComponentInstaller for SdkManager {
    fn install(
        &self,
        request: &ComponentRequest<'_>,
        on_line: &mut dyn FnMut(String),
    ) -> std::io::Result<i32> {
        let mut command = Self::command(request);
        match request.stream {
            StreamMode::Inherit if !request.verbose => {
                command.stdout(Stdio::null()).stderr(Stdio::null());
            }
            StreamMode::Inherit => {}
            StreamMode::Capture => {
                command.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }

        debug!("spawning {:?}", command);
        let mut child = command.spawn()?;
        answer_license_prompts(&mut child);

        if request.stream == StreamMode::Capture {
            forward_output(&mut child, on_line);
        }

        let status = child.wait()?;
        Ok(status.code().unwrap_or(NO_EXIT_CODE))
    }
}

fn answer_license_prompts(child: &mut Child) {
    let Some(mut stdin) = child.stdin.take() else {
        return;
    };
    if let Err(e) = stdin.write_all("y\n".repeat(LICENSE_ANSWERS).as_bytes()) {
        // The child may exit before reading its input.
        debug!("could not answer license prompts: {e}");
    }
}

/// Drains stdout and stderr on reader threads, forwarding lines as they arrive.
fn forward_output(child: &mut Child, on_line: &mut dyn FnMut(String)) {
    let (tx, rx) = mpsc::channel();
    let readers = [
        child.stdout.take().map(|out| spawn_line_reader(out, tx.clone())),
        child.stderr.take().map(|err| spawn_line_reader(err, tx.clone())),
    ];
    drop(tx);

    for line in rx {
        on_line(line);
    }
    for reader in readers.into_iter().flatten() {
        if reader.join().is_err() {
            warn!("sdkmanager output reader panicked");
        }
    }
}

fn spawn_line_reader<R>(stream: R, tx: Sender<String>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            for line in split_progress_line(&buffer) {
                if tx.send(line).is_err() {
                    return;
                }
            }
        }
    })
}

/// Splits a raw chunk on `\n` and the `\r` used for in-place progress bars.
fn split_progress_line(raw: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(raw)
        .split(['\r', '\n'])
        .map(str::trim_end)
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect()
}
