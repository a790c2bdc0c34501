//! Request-level entry point.
//!
//! [`VolumeDriver`] is what a transport talks to: one method per request
//! the container runtime can make. Every method takes the single registry
//! lock for its whole duration, mount and unmount commands included, so
//! requests are fully serialized.

use std::collections::BTreeMap;
use std::path::PathBuf;

use ofs_common::{CallerId, OfsPaths, OfsResult};
use tokio::sync::Mutex;

use crate::config::DriverConfig;
use crate::coordinator::{Capabilities, MountCoordinator};
use crate::executor::{CommandExecutor, MountExecutor};
use crate::registry::VolumeRegistry;
use crate::volume::VolumeInfo;

/// Volume driver serving create/list/get/path/mount/unmount/remove.
#[derive(Debug)]
pub struct VolumeDriver<E = CommandExecutor> {
    registry: Mutex<VolumeRegistry>,
    coordinator: MountCoordinator<E>,
}

impl VolumeDriver<CommandExecutor> {
    /// Create a driver that runs the configured mount programs.
    #[must_use]
    pub fn from_config(config: DriverConfig) -> Self {
        let executor = CommandExecutor::from_config(&config);
        Self::new(config.paths, executor)
    }
}

impl<E: MountExecutor> VolumeDriver<E> {
    /// Create a driver with an empty registry.
    pub fn new(paths: OfsPaths, executor: E) -> Self {
        Self {
            registry: Mutex::new(VolumeRegistry::new(paths)),
            coordinator: MountCoordinator::new(executor),
        }
    }

    /// The executor performing side effects.
    pub const fn executor(&self) -> &E {
        self.coordinator.executor()
    }

    /// Register a volume.
    ///
    /// # Errors
    ///
    /// See [`VolumeRegistry::create`].
    pub async fn create(&self, name: &str, opts: &BTreeMap<String, String>) -> OfsResult<()> {
        let mut registry = self.registry.lock().await;
        registry.create(name, opts)?;
        Ok(())
    }

    /// Descriptors of every registered volume.
    pub async fn list(&self) -> Vec<VolumeInfo> {
        self.registry.lock().await.list()
    }

    /// Descriptor of one volume, including its mount state.
    ///
    /// # Errors
    ///
    /// Returns [`ofs_common::OfsError::NotFound`] for unknown volumes.
    pub async fn get(&self, name: &str) -> OfsResult<VolumeInfo> {
        let registry = self.registry.lock().await;
        registry.get(name).map(crate::Volume::detailed_info)
    }

    /// Mountpoint of a volume.
    ///
    /// # Errors
    ///
    /// Returns [`ofs_common::OfsError::NotFound`] for unknown volumes.
    pub async fn path(&self, name: &str) -> OfsResult<PathBuf> {
        let registry = self.registry.lock().await;
        registry.path(name).map(std::path::Path::to_path_buf)
    }

    /// Attach `caller` to a volume, mounting it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ofs_common::OfsError::NotFound`] for unknown volumes,
    /// [`ofs_common::OfsError::InvalidCallerId`] for an empty caller, and
    /// whatever [`MountCoordinator::attach`] returns.
    pub async fn mount(&self, name: &str, caller: &str) -> OfsResult<PathBuf> {
        let mut registry = self.registry.lock().await;
        let volume = registry.get_mut(name)?;
        let caller = CallerId::new(caller)?;
        self.coordinator.attach(volume, caller).await
    }

    /// Detach `caller` from a volume.
    ///
    /// # Errors
    ///
    /// Returns [`ofs_common::OfsError::NotFound`] for unknown volumes,
    /// [`ofs_common::OfsError::InvalidCallerId`] for an empty caller, and
    /// whatever [`MountCoordinator::detach`] returns.
    pub async fn unmount(&self, name: &str, caller: &str) -> OfsResult<()> {
        let mut registry = self.registry.lock().await;
        let volume = registry.get_mut(name)?;
        let caller = CallerId::new(caller)?;
        self.coordinator.detach(volume, &caller).await
    }

    /// Unregister a volume, unmounting it if needed.
    ///
    /// # Errors
    ///
    /// See [`VolumeRegistry::remove`].
    pub async fn remove(&self, name: &str) -> OfsResult<()> {
        let mut registry = self.registry.lock().await;
        registry.remove(name, &self.coordinator).await?;
        tracing::info!(volume = %name, "Volume removed");
        Ok(())
    }

    /// Report what this driver supports.
    pub async fn capabilities(&self) -> Capabilities {
        let _registry = self.registry.lock().await;
        self.coordinator.capabilities()
    }
}
