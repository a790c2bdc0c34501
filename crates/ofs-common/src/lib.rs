//! # ofs-common
//!
//! Shared types for the ObjectiveFS volume driver.
//!
//! This crate provides the pieces every other crate in the workspace needs:
//! - Validated volume names and caller IDs
//! - Standard filesystem paths (driver root, mountpoints)
//! - The common error type

#![warn(missing_docs)]

pub mod error;
pub mod id;
pub mod paths;

pub use error::{OfsError, OfsResult};
pub use id::{CallerId, VolumeName};
pub use paths::OfsPaths;
