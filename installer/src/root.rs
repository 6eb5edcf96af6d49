//! Installation root resolution.
//!
//! The default root follows the location Android Studio uses on each
//! platform, so an SDK installed here is picked up by existing tooling.

use crate::dirs::BaseDirs;
use crate::error::{InstallerError, Result};
use crate::platform::HostOs;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::path::PathBuf;

/// The per-user directory a default root is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Home,
    LocalData,
}

#[derive(Debug)]
struct DefaultRoot {
    /// Archive tag of the operating system (see [`HostOs::archive_tag`]).
    os: &'static str,
    anchor: Anchor,
    segments: &'static [&'static str],
}

const DEFAULT_ROOTS: &[DefaultRoot] = &[
    DefaultRoot {
        os: "mac",
        anchor: Anchor::Home,
        segments: &["Library", "Android", "sdk"],
    },
    DefaultRoot {
        os: "linux",
        anchor: Anchor::Home,
        segments: &["Android", "Sdk"],
    },
    DefaultRoot {
        os: "win",
        anchor: Anchor::LocalData,
        segments: &["Android", "Sdk"],
    },
];

/// Computes and creates the default installation root for `os`.
///
/// | OS | Default root |
/// |---|---|
/// | macOS | `~/Library/Android/sdk` |
/// | Linux | `~/Android/Sdk` |
/// | Windows | `%LOCALAPPDATA%\Android\Sdk` |
///
/// # Errors
///
/// Returns [`InstallerError::UnsupportedPlatform`] for any other operating
/// system (no directory is created), [`InstallerError::HomeDirectoryUnavailable`]
/// when the anchor directory is unknown, and [`InstallerError::Io`] when the
/// directory cannot be created.
pub fn resolve_default_root(os: &HostOs, dirs: &dyn BaseDirs) -> Result<Utf8PathBuf> {
    let rule = os
        .archive_tag()
        .and_then(|tag| DEFAULT_ROOTS.iter().find(|rule| rule.os == tag))
        .ok_or_else(|| InstallerError::UnsupportedPlatform { os: os.to_string() })?;

    let anchor = match rule.anchor {
        Anchor::Home => dirs.home_dir(),
        Anchor::LocalData => dirs.data_local_dir(),
    }
    .ok_or(InstallerError::HomeDirectoryUnavailable)?;

    let root = rule
        .segments
        .iter()
        .fold(anchor, |path, segment| path.join(segment));
    create_root(to_utf8(root)?)
}

/// Makes a caller-supplied root absolute and creates it.
///
/// Relative paths are resolved against the current working directory.
///
/// # Errors
///
/// Returns [`InstallerError::Io`] if the path cannot be made absolute, is not
/// valid UTF-8, or cannot be created.
pub fn ensure_root(path: &Utf8Path) -> Result<Utf8PathBuf> {
    let absolute = std::path::absolute(path.as_std_path())?;
    create_root(to_utf8(absolute)?)
}

fn create_root(root: Utf8PathBuf) -> Result<Utf8PathBuf> {
    debug!("creating installation root {root}");
    std::fs::create_dir_all(&root)?;
    Ok(root)
}

fn to_utf8(path: PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::try_from(path).map_err(|err| {
        InstallerError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("installation root is not valid UTF-8: {err}"),
        ))
    })
}
