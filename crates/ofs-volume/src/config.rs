//! Driver configuration.

use std::path::PathBuf;

use ofs_common::OfsPaths;

/// Default mount helper.
pub const DEFAULT_MOUNT_PROGRAM: &str = "/sbin/mount.objectivefs";

/// Default unmount program.
pub const DEFAULT_UNMOUNT_PROGRAM: &str = "umount";

/// Volume driver configuration options.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Paths for mountpoints and the plugin socket.
    pub paths: OfsPaths,
    /// Program invoked to mount a volume.
    pub mount_program: PathBuf,
    /// Program invoked to unmount a volume.
    pub unmount_program: PathBuf,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            paths: OfsPaths::new(),
            mount_program: PathBuf::from(DEFAULT_MOUNT_PROGRAM),
            unmount_program: PathBuf::from(DEFAULT_UNMOUNT_PROGRAM),
        }
    }
}

impl DriverConfig {
    /// Set the root directory mountpoints are created under.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.paths.root = root.into();
        self
    }

    /// Set the directory holding the plugin socket.
    #[must_use]
    pub fn with_plugin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.plugins = dir.into();
        self
    }

    /// Set the mount helper.
    #[must_use]
    pub fn with_mount_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.mount_program = program.into();
        self
    }

    /// Set the unmount program.
    #[must_use]
    pub fn with_unmount_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.unmount_program = program.into();
        self
    }
}
