//! Standard filesystem paths for the volume driver.

use std::path::PathBuf;

use once_cell::sync::Lazy;

use crate::id::VolumeName;

/// Default root directory under which mountpoints are created.
pub static OFS_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("OFS_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/lib/docker-volumes"))
});

/// Default directory where the runtime looks for plugin sockets.
pub static OFS_PLUGIN_DIR: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("OFS_PLUGIN_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/run/docker/plugins"))
});

/// Driver name, used for the mountpoint subdirectory and the socket name.
pub const DRIVER_NAME: &str = "objectivefs";

/// Standard paths used by the volume driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfsPaths {
    /// Root directory (default: /var/lib/docker-volumes).
    pub root: PathBuf,
    /// Plugin socket directory (default: /run/docker/plugins).
    pub plugins: PathBuf,
}

impl OfsPaths {
    /// Create paths with default locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            plugins: OFS_PLUGIN_DIR.clone(),
        }
    }

    /// Directory holding every mountpoint managed by this driver.
    #[must_use]
    pub fn volumes(&self) -> PathBuf {
        self.root.join(DRIVER_NAME)
    }

    /// Mountpoint for a volume. Stable for the lifetime of the volume.
    #[must_use]
    pub fn mountpoint(&self, name: &VolumeName) -> PathBuf {
        self.volumes().join(name.as_str())
    }

    /// Unix socket the plugin listens on.
    #[must_use]
    pub fn socket(&self) -> PathBuf {
        self.plugins.join(format!("{DRIVER_NAME}.sock"))
    }
}

impl Default for OfsPaths {
    fn default() -> Self {
        Self {
            root: OFS_ROOT.clone(),
            plugins: OFS_PLUGIN_DIR.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> VolumeName {
        VolumeName::new(s).unwrap()
    }

    #[test]
    fn custom_root() {
        let paths = OfsPaths::with_root("/tmp/ofs-test");
        assert_eq!(paths.volumes(), PathBuf::from("/tmp/ofs-test/objectivefs"));
        assert_eq!(
            paths.mountpoint(&name("data")),
            PathBuf::from("/tmp/ofs-test/objectivefs/data")
        );
    }

    #[test]
    fn mountpoint_is_deterministic() {
        let paths = OfsPaths::with_root("/srv");
        assert_eq!(paths.mountpoint(&name("a")), paths.mountpoint(&name("a")));
        assert_ne!(paths.mountpoint(&name("a")), paths.mountpoint(&name("b")));
    }

    #[test]
    fn socket_path() {
        let paths = OfsPaths {
            root: PathBuf::from("/srv"),
            plugins: PathBuf::from("/run/docker/plugins"),
        };
        assert_eq!(
            paths.socket(),
            PathBuf::from("/run/docker/plugins/objectivefs.sock")
        );
    }
}
