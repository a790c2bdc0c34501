//! # ofs-volume
//!
//! Volume lifecycle management for the ObjectiveFS volume driver.
//!
//! Many containers may attach to the same named volume at once. This crate
//! makes sure the backing filesystem is mounted at most once per volume,
//! stays mounted while any caller holds a reference, and is unmounted
//! according to the volume's retention policy.
//!
//! ## Usage
//!
//! ```no_run
//! use std::collections::BTreeMap;
//!
//! use ofs_volume::{DriverConfig, VolumeDriver};
//!
//! # async fn example() -> ofs_common::OfsResult<()> {
//! let driver = VolumeDriver::from_config(DriverConfig::default());
//!
//! let mut opts = BTreeMap::new();
//! opts.insert("fs".to_string(), "s3://bucket/data".to_string());
//! driver.create("data", &opts).await?;
//!
//! // First attach runs the mount helper, later ones only take a reference.
//! let mountpoint = driver.mount("data", "container-a").await?;
//! driver.unmount("data", "container-a").await?;
//! driver.remove("data").await?;
//! # let _ = mountpoint;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod coordinator;
pub mod driver;
pub mod executor;
pub mod registry;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod volume;

pub use config::DriverConfig;
pub use coordinator::{Capabilities, MountCoordinator, Scope};
pub use driver::VolumeDriver;
pub use executor::{CommandExecutor, ExecError, MountExecutor, MountRequest};
pub use registry::VolumeRegistry;
pub use volume::{Volume, VolumeInfo, VolumeOptions, VolumeStatus};
