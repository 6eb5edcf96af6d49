//! On-disk layout of an installed SDK and the path entries derived from it.
//!
//! The command-line tools archive unpacks into `cmdline-tools/`, but
//! `sdkmanager` refuses to run unless it lives in `cmdline-tools/latest/`.

use camino::{Utf8Path, Utf8PathBuf};

/// Directory the archive unpacks into, relative to the installation root.
pub const UNPACKED_DIR: &str = "cmdline-tools";

/// Directory inside [`UNPACKED_DIR`] that `sdkmanager` expects to run from.
pub const EXPECTED_SUBDIR: &str = "latest";

/// Package name passed to `sdkmanager --install`.
pub const PLATFORM_TOOLS_PACKAGE: &str = "platform-tools";

/// Paths of interest inside one installation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkLayout {
    root: Utf8PathBuf,
}

impl SdkLayout {
    /// Creates the layout for the given installation root.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the installation root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the directory the archive unpacks into.
    #[must_use]
    pub fn unpacked_dir(&self) -> Utf8PathBuf {
        self.root.join(UNPACKED_DIR)
    }

    /// Returns the directory the command-line tools are reconciled into.
    #[must_use]
    pub fn tools_dir(&self) -> Utf8PathBuf {
        self.unpacked_dir().join(EXPECTED_SUBDIR)
    }

    /// Returns the command-line tools executable directory.
    #[must_use]
    pub fn tools_bin_dir(&self) -> Utf8PathBuf {
        self.tools_dir().join("bin")
    }

    /// Returns the path of the `sdkmanager` launcher for the host.
    #[must_use]
    pub fn sdkmanager(&self, windows: bool) -> Utf8PathBuf {
        let name = if windows {
            "sdkmanager.bat"
        } else {
            "sdkmanager"
        };
        self.tools_bin_dir().join(name)
    }

    /// Returns the platform-tools directory.
    #[must_use]
    pub fn platform_tools_dir(&self) -> Utf8PathBuf {
        self.root.join(PLATFORM_TOOLS_PACKAGE)
    }

    /// Computes the directories to expose on `PATH`.
    ///
    /// The command-line tools' `bin` directory always comes first;
    /// platform-tools follows only when it was installed in this run.
    #[must_use]
    pub fn path_entries(&self, platform_tools_installed: bool) -> PathEntries {
        let mut entries = PathEntries::default();
        entries.push(self.tools_bin_dir());
        if platform_tools_installed {
            entries.push(self.platform_tools_dir());
        }
        entries
    }
}

/// Ordered, duplicate-free directories to add to the executable search path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathEntries(Vec<Utf8PathBuf>);

impl PathEntries {
    /// Appends `dir` unless it is already present.
    pub fn push(&mut self, dir: Utf8PathBuf) {
        if !self.0.contains(&dir) {
            self.0.push(dir);
        }
    }

    /// Iterates over the entries in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Utf8Path> {
        self.0.iter().map(Utf8PathBuf::as_path)
    }

    /// Returns the number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when there are no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the entries as a slice.
    #[must_use]
    pub const fn as_slice(&self) -> &[Utf8PathBuf] {
        self.0.as_slice()
    }
}
