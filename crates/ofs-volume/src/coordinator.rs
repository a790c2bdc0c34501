//! Attach/detach protocol.
//!
//! A volume moves between two mount states:
//!
//! ```text
//! Unmounted --attach (first ref)--> Mounted --detach (last ref, eager)--> Unmounted
//! ```
//!
//! `Mounted` with no references is a valid resting state for volumes that
//! are not eager; only an explicit remove unmounts them.
//!
//! The coordinator works on a `&mut Volume`, so callers must hold the
//! registry lock for the whole operation, side effects included. That is
//! what keeps a volume from being mounted twice or unmounted while a mount
//! is in flight.

use std::path::PathBuf;

use ofs_common::{CallerId, OfsError, OfsResult};
use serde::{Deserialize, Serialize};

use crate::executor::{MountExecutor, MountRequest};
use crate::volume::Volume;

/// Scope a driver's volumes are visible in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Single host.
    Local,
    /// Cluster-wide.
    Global,
}

/// Driver capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Visibility of created volumes.
    pub scope: Scope,
}

/// Runs mounts and unmounts for registry entries.
#[derive(Debug)]
pub struct MountCoordinator<E> {
    executor: E,
}

impl<E: MountExecutor> MountCoordinator<E> {
    /// Create a coordinator backed by `executor`.
    pub const fn new(executor: E) -> Self {
        Self { executor }
    }

    /// The executor performing side effects.
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Attach `caller` to `volume`, mounting it first if needed.
    ///
    /// Returns the mountpoint. A caller that is already attached is not
    /// counted twice.
    ///
    /// # Errors
    ///
    /// Returns [`OfsError::Directory`] if the mountpoint cannot be created
    /// and [`OfsError::MountFailed`] if the mount helper fails. In both cases
    /// the volume stays unmounted and `caller` is not attached.
    pub async fn attach(&self, volume: &mut Volume, caller: CallerId) -> OfsResult<PathBuf> {
        tracing::info!(volume = %volume.name(), caller = %caller.short(), "Attaching volume");

        if !volume.mounted {
            self.mount(volume).await?;
        }
        volume.use_refs.insert(caller);

        Ok(volume.mountpoint().to_path_buf())
    }

    /// Detach `caller` from `volume`.
    ///
    /// Unknown callers are ignored. When the last caller leaves an eager
    /// volume, it is unmounted.
    ///
    /// # Errors
    ///
    /// Returns [`OfsError::UnmountFailed`] if the eager unmount fails; the
    /// volume is then still recorded as mounted.
    pub async fn detach(&self, volume: &mut Volume, caller: &CallerId) -> OfsResult<()> {
        tracing::info!(volume = %volume.name(), caller = %caller.short(), "Detaching volume");

        volume.use_refs.remove(caller);
        if volume.use_refs.is_empty() && volume.options().eager_unmount {
            self.unmount(volume).await?;
        }
        Ok(())
    }

    /// Unmount `volume` if it is mounted.
    ///
    /// The unmount command's result is authoritative: once it succeeds the
    /// volume is recorded as unmounted, even if the now-empty mountpoint
    /// directory cannot be removed.
    ///
    /// # Errors
    ///
    /// Returns [`OfsError::UnmountFailed`] if the unmount command fails.
    pub async fn unmount(&self, volume: &mut Volume) -> OfsResult<()> {
        if !volume.mounted {
            return Ok(());
        }
        tracing::info!(
            volume = %volume.name(),
            mountpoint = %volume.mountpoint().display(),
            "Unmounting volume"
        );

        self.executor
            .unmount(volume.mountpoint())
            .await
            .map_err(|e| OfsError::UnmountFailed {
                name: volume.name().to_string(),
                reason: e.to_string(),
            })?;
        volume.mounted = false;

        if let Err(err) = tokio::fs::remove_dir(volume.mountpoint()).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    volume = %volume.name(),
                    mountpoint = %volume.mountpoint().display(),
                    error = %err,
                    "Failed to remove mountpoint after unmount"
                );
            }
        }
        Ok(())
    }

    /// Report what this driver supports.
    pub const fn capabilities(&self) -> Capabilities {
        Capabilities {
            scope: Scope::Local,
        }
    }

    async fn mount(&self, volume: &mut Volume) -> OfsResult<()> {
        create_mountpoint(volume).await?;

        let options = volume.options();
        let request = MountRequest {
            options: &options.mount_options,
            source: &options.filesystem,
            target: volume.mountpoint(),
            env: &options.env,
        };
        tracing::info!(
            volume = %volume.name(),
            filesystem = %request.source,
            options = %request.options,
            "Mounting volume"
        );

        self.executor
            .mount(&request)
            .await
            .map_err(|e| OfsError::MountFailed {
                name: volume.name().to_string(),
                reason: e.to_string(),
            })?;

        volume.mounted = true;
        tracing::debug!(volume = %volume.name(), "Volume mounted");
        Ok(())
    }
}

async fn create_mountpoint(volume: &Volume) -> OfsResult<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o755);

    builder
        .create(volume.mountpoint())
        .await
        .map_err(|source| OfsError::Directory {
            path: volume.mountpoint().to_path_buf(),
            source,
        })
}
