//! Download of the command-line tools archive.
//!
//! Provides a trait-based abstraction over fetching the archive so the
//! orchestrator can be exercised without network access.

use crate::error::InstallerError;
use crate::platform::HostOs;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::io::{Read, Write};
use std::sync::OnceLock;

/// Base URL of the Android repository the archive is fetched from.
pub const DEFAULT_REPOSITORY_URL: &str = "https://dl.google.com/android/repository";

/// Build number of the command-line tools release fetched by default.
pub const DEFAULT_CMDLINE_TOOLS_BUILD: &str = "13114758";

/// Environment variable overriding [`DEFAULT_CMDLINE_TOOLS_BUILD`].
pub const BUILD_ENV: &str = "SDK_INSTALLER_CMDLINE_TOOLS_BUILD";

/// Environment variable overriding [`DEFAULT_REPOSITORY_URL`].
pub const REPOSITORY_ENV: &str = "SDK_INSTALLER_REPOSITORY_URL";

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Callback receiving `(bytes_received, bytes_total)`.
///
/// `bytes_received` never decreases; `bytes_total` is `0` while unknown.
pub type ProgressFn<'a> = &'a mut dyn FnMut(u64, u64);

/// Fetches the current command-line tools archive.
pub trait ArchiveProvider {
    /// Downloads the archive into `target_root` and returns its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the file cannot be written.
    fn download(
        &self,
        target_root: &Utf8Path,
        on_progress: ProgressFn<'_>,
    ) -> Result<Utf8PathBuf, DownloadError>;
}

/// Errors arising from archive download.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested archive was not found (HTTP 404).
    #[error("archive not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

impl Clone for DownloadError {
    fn clone(&self) -> Self {
        match self {
            Self::HttpError { url, reason } => Self::HttpError {
                url: url.clone(),
                reason: reason.clone(),
            },
            Self::NotFound { url } => Self::NotFound { url: url.clone() },
            Self::Io(source) => Self::Io(crate::error::clone_io_error(source)),
        }
    }
}

/// HTTP-based provider using `ureq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpArchiveProvider {
    repository_url: String,
    build: String,
    os_tag: &'static str,
}

impl HttpArchiveProvider {
    /// Creates a provider for `os`, honouring [`REPOSITORY_ENV`] and
    /// [`BUILD_ENV`] overrides.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::UnsupportedPlatform`] when no archive is
    /// published for `os`.
    pub fn for_host(os: &HostOs) -> Result<Self, InstallerError> {
        let os_tag = os
            .archive_tag()
            .ok_or_else(|| InstallerError::UnsupportedPlatform { os: os.to_string() })?;
        let repository_url = std::env::var(REPOSITORY_ENV)
            .unwrap_or_else(|_| DEFAULT_REPOSITORY_URL.to_owned());
        let build =
            std::env::var(BUILD_ENV).unwrap_or_else(|_| DEFAULT_CMDLINE_TOOLS_BUILD.to_owned());
        Ok(Self {
            repository_url: repository_url.trim_end_matches('/').to_owned(),
            build,
            os_tag,
        })
    }

    /// Returns the archive filename, e.g. `commandlinetools-linux-13114758_latest.zip`.
    #[must_use]
    pub fn archive_filename(&self) -> String {
        format!("commandlinetools-{}-{}_latest.zip", self.os_tag, self.build)
    }

    /// Returns the full download URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}/{}", self.repository_url, self.archive_filename())
    }
}

impl ArchiveProvider for HttpArchiveProvider {
    fn download(
        &self,
        target_root: &Utf8Path,
        on_progress: ProgressFn<'_>,
    ) -> Result<Utf8PathBuf, DownloadError> {
        let url = self.url();
        info!("downloading {url}");
        let response = http_agent()
            .get(&url)
            .call()
            .map_err(|e| map_ureq_error(&url, &e))?;
        let total = content_length(response.headers()).unwrap_or(0);
        on_progress(0, total);

        let dest = target_root.join(self.archive_filename());
        let mut partial = tempfile::NamedTempFile::new_in(target_root)?;
        let mut body = response.into_body();
        copy_with_progress(&mut body.as_reader(), partial.as_file_mut(), total, on_progress)?;
        partial
            .persist(&dest)
            .map_err(|e| DownloadError::Io(e.error))?;
        debug!("archive written to {dest}");
        Ok(dest)
    }
}

/// Copies `reader` into `writer`, reporting cumulative progress after each chunk.
fn copy_with_progress(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    total: u64,
    on_progress: ProgressFn<'_>,
) -> std::io::Result<u64> {
    let mut buffer = vec![0_u8; COPY_BUFFER_SIZE];
    let mut received: u64 = 0;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(buffer.get(..read).unwrap_or_default())?;
        received = received.saturating_add(read as u64);
        let reported_total = if total == 0 { 0 } else { total.max(received) };
        on_progress(received, reported_total);
    }
    writer.flush()?;
    Ok(received)
}

fn content_length(headers: &ureq::http::HeaderMap) -> Option<u64> {
    headers
        .get(ureq::http::header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

/// Shared `ureq` agent. No timeout is configured: downloads run to completion.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| ureq::Agent::new_with_config(ureq::Agent::config_builder().build()))
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn provider(os: &HostOs) -> HttpArchiveProvider {
        temp_env::with_vars_unset([BUILD_ENV, REPOSITORY_ENV], || {
            HttpArchiveProvider::for_host(os).expect("supported host")
        })
    }

    #[test]
    fn url_uses_repository_and_os_tag() {
        let url = provider(&HostOs::MacOs).url();
        assert_eq!(
            url,
            format!(
                "{DEFAULT_REPOSITORY_URL}/commandlinetools-mac-{DEFAULT_CMDLINE_TOOLS_BUILD}_latest.zip"
            )
        );
    }

    #[test]
    fn environment_overrides_build_and_repository() {
        let provider = temp_env::with_vars(
            [
                (BUILD_ENV, Some("42")),
                (REPOSITORY_ENV, Some("http://mirror.test/android/")),
            ],
            || HttpArchiveProvider::for_host(&HostOs::Linux).expect("supported host"),
        );
        assert_eq!(
            provider.url(),
            "http://mirror.test/android/commandlinetools-linux-42_latest.zip"
        );
    }

    #[test]
    fn unsupported_host_has_no_provider() {
        let err = HttpArchiveProvider::for_host(&HostOs::Other("aix".to_owned()))
            .expect_err("aix has no archive");
        assert!(matches!(err, InstallerError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn copy_reports_monotonic_progress() {
        let data = vec![7_u8; COPY_BUFFER_SIZE * 2 + 10];
        let mut reader = Cursor::new(data.clone());
        let mut written = Vec::new();
        let mut seen = Vec::new();

        let copied = copy_with_progress(&mut reader, &mut written, data.len() as u64, &mut |r, t| {
            seen.push((r, t));
        })
        .expect("copy succeeds");

        assert_eq!(copied, data.len() as u64);
        assert_eq!(written, data);
        assert!(seen.windows(2).all(|pair| pair[0].0 <= pair[1].0));
        assert_eq!(seen.last(), Some(&(data.len() as u64, data.len() as u64)));
    }

    #[test]
    fn copy_reports_zero_total_when_unknown() {
        let mut reader = Cursor::new(vec![1_u8; 16]);
        let mut seen = Vec::new();

        copy_with_progress(&mut reader, &mut Vec::new(), 0, &mut |r, t| seen.push((r, t)))
            .expect("copy succeeds");

        assert_eq!(seen, vec![(16, 0)]);
    }

    #[test]
    fn map_ureq_error_maps_404_to_not_found() {
        let err = ureq::Error::StatusCode(404);
        let mapped = map_ureq_error("https://example.test/archive.zip", &err);
        assert!(matches!(mapped, DownloadError::NotFound { .. }));
    }

    #[test]
    fn map_ureq_error_maps_other_status_to_http_error() {
        let err = ureq::Error::StatusCode(500);
        let mapped = map_ureq_error("https://example.test/archive.zip", &err);
        assert!(matches!(mapped, DownloadError::HttpError { .. }));
    }
}
