//! # ofs-plugin
//!
//! Volume plugin daemon for the ObjectiveFS volume driver.
//!
//! Translates the container runtime's volume plugin requests into
//! [`ofs_volume::VolumeDriver`] calls.

#![warn(missing_docs)]

pub mod api;
pub mod cli;

pub use cli::Args;
