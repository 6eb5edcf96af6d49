//! Acquisition and unpacking of the command-line tools archive.
//!
//! # Sub-modules
//!
//! - [`download`] - Archive provider trait and HTTP implementation.
//! - [`extraction`] - Native and portable decompressors.
//! - [`handle`] - Caller-supplied versus downloaded archive ownership.

pub mod download;
pub mod extraction;
pub mod handle;
