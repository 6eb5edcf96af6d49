//! Android SDK command-line tools installer library.
//!
//! This crate provides the core functionality for unpacking the Android SDK
//! command-line tools, arranging them in the layout `sdkmanager` expects, and
//! installing platform-tools. It is used by the `sdk-installer` CLI binary and
//! can be consumed programmatically for testing or custom installation workflows.
//!
//! # Modules
//!
//! - [`archive`] - Archive download, extraction and ownership
//! - [`cli`] - Command-line argument definitions
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Error taxonomy and process exit codes
//! - [`event`] - Typed progress events emitted by the pipeline
//! - [`install`] - Orchestration of a complete installation
//! - [`layout`] - SDK directory layout and `PATH` entries
//! - [`output`] - Event rendering and shell snippet generation
//! - [`path_settings`] - Opening the OS environment-variable settings
//! - [`pipeline`] - The staged installation state machine
//! - [`platform`] - Host operating system detection
//! - [`progress`] - Download progress bars and text reporting
//! - [`root`] - Default installation root resolution
//! - [`sdkmanager`] - Running `sdkmanager` to install packages

pub mod archive;
pub mod cli;
pub mod dirs;
pub mod error;
pub mod event;
pub mod install;
pub mod layout;
pub mod output;
pub mod path_settings;
pub mod pipeline;
pub mod platform;
pub mod progress;
pub mod root;
pub mod sdkmanager;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
