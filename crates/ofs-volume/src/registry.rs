//! The set of registered volumes.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use ofs_common::{OfsError, OfsPaths, OfsResult, VolumeName};

use crate::coordinator::MountCoordinator;
use crate::executor::MountExecutor;
use crate::volume::{Volume, VolumeInfo, VolumeOptions};

/// Registered volumes, keyed by name.
///
/// The registry does no locking of its own; [`crate::VolumeDriver`] wraps
/// it in a single mutex shared with the coordinator.
#[derive(Debug)]
pub struct VolumeRegistry {
    paths: OfsPaths,
    volumes: HashMap<VolumeName, Volume>,
}

impl VolumeRegistry {
    /// Create an empty registry placing mountpoints under `paths`.
    #[must_use]
    pub fn new(paths: OfsPaths) -> Self {
        Self {
            paths,
            volumes: HashMap::new(),
        }
    }

    /// Register a new volume. Nothing is mounted yet.
    ///
    /// # Errors
    ///
    /// Returns [`OfsError::InvalidName`] if `name` cannot be used as a path
    /// component and [`OfsError::AlreadyExists`] if it is taken.
    pub fn create(&mut self, name: &str, opts: &BTreeMap<String, String>) -> OfsResult<&Volume> {
        let name = VolumeName::new(name)?;
        if self.volumes.contains_key(&name) {
            return Err(OfsError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let options = VolumeOptions::parse(opts);
        if options.filesystem.is_empty() {
            tracing::warn!(volume = %name, "Volume created without an 'fs' option");
        }
        let mountpoint = self.paths.mountpoint(&name);
        tracing::info!(
            volume = %name,
            mountpoint = %mountpoint.display(),
            asap = options.eager_unmount,
            "Creating volume"
        );

        let volume = Volume::new(name.clone(), mountpoint, options);
        Ok(self.volumes.entry(name).or_insert(volume))
    }

    /// Descriptors of every registered volume, in no particular order.
    #[must_use]
    pub fn list(&self) -> Vec<VolumeInfo> {
        self.volumes.values().map(Volume::info).collect()
    }

    /// Look up a volume.
    ///
    /// # Errors
    ///
    /// Returns [`OfsError::NotFound`] if no volume is registered as `name`.
    pub fn get(&self, name: &str) -> OfsResult<&Volume> {
        self.volumes.get(name).ok_or_else(|| OfsError::not_found(name))
    }

    /// Look up a volume for mutation.
    ///
    /// # Errors
    ///
    /// Returns [`OfsError::NotFound`] if no volume is registered as `name`.
    pub fn get_mut(&mut self, name: &str) -> OfsResult<&mut Volume> {
        self.volumes
            .get_mut(name)
            .ok_or_else(|| OfsError::not_found(name))
    }

    /// Mountpoint of a volume, whether or not it is mounted.
    ///
    /// # Errors
    ///
    /// Returns [`OfsError::NotFound`] if no volume is registered as `name`.
    pub fn path(&self, name: &str) -> OfsResult<&Path> {
        self.get(name).map(Volume::mountpoint)
    }

    /// Unregister a volume, unmounting it first if it is still mounted.
    ///
    /// # Errors
    ///
    /// Returns [`OfsError::NotFound`] for unknown volumes,
    /// [`OfsError::InUse`] while callers are attached, and the unmount error
    /// if forcing the unmount fails. On error the volume stays registered.
    pub async fn remove<E: MountExecutor>(
        &mut self,
        name: &str,
        coordinator: &MountCoordinator<E>,
    ) -> OfsResult<Volume> {
        let volume = self.get_mut(name)?;
        if volume.ref_count() != 0 {
            return Err(OfsError::InUse {
                name: name.to_string(),
                count: volume.ref_count(),
            });
        }

        tracing::info!(volume = %name, "Removing volume");
        coordinator.unmount(volume).await?;

        self.volumes
            .remove(name)
            .ok_or_else(|| OfsError::not_found(name))
    }

    /// Number of registered volumes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// Whether no volumes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }
}
