//! Volume definitions and creation-option parsing.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ofs_common::{CallerId, VolumeName};

/// Options for a volume, parsed from the key/value map given at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeOptions {
    /// Backing filesystem passed to the mount helper (`fs`).
    pub filesystem: String,
    /// Comma-joined mount options, starting with [`Self::DEFAULT_MOUNT_OPTIONS`].
    pub mount_options: String,
    /// `KEY=VALUE` entries handed to the mount helper as its environment.
    pub env: Vec<String>,
    /// Unmount as soon as the last caller detaches (`asap`).
    pub eager_unmount: bool,
}

impl VolumeOptions {
    /// Mount options every volume starts with.
    pub const DEFAULT_MOUNT_OPTIONS: &'static str = "auto";

    /// Parse a creation option map.
    ///
    /// `fs`, `options` (also accepted as `ptions`) and `asap` are reserved;
    /// every other key becomes an environment entry. Keys are visited in
    /// sorted order so the result does not depend on how the map was built.
    #[must_use]
    pub fn parse(opts: &BTreeMap<String, String>) -> Self {
        let mut parsed = Self::default();
        for (key, value) in opts {
            match key.as_str() {
                "fs" => parsed.filesystem.clone_from(value),
                "options" | "ptions" => {
                    parsed.mount_options.push(',');
                    parsed.mount_options.push_str(value);
                }
                "asap" => parsed.eager_unmount = !is_falsy(value),
                _ => parsed.env.push(format!("{key}={value}")),
            }
        }
        parsed
    }
}

impl Default for VolumeOptions {
    fn default() -> Self {
        Self {
            filesystem: String::new(),
            mount_options: Self::DEFAULT_MOUNT_OPTIONS.to_string(),
            env: Vec::new(),
            eager_unmount: false,
        }
    }
}

fn is_falsy(value: &str) -> bool {
    ["false", "0", "no", "off"]
        .iter()
        .any(|f| value.trim().eq_ignore_ascii_case(f))
}

/// A registered volume and its mount state.
#[derive(Debug)]
pub struct Volume {
    name: VolumeName,
    mountpoint: PathBuf,
    options: VolumeOptions,
    created_at: DateTime<Utc>,
    pub(crate) mounted: bool,
    pub(crate) use_refs: HashSet<CallerId>,
}

impl Volume {
    /// Create an unmounted volume with no callers.
    #[must_use]
    pub fn new(name: VolumeName, mountpoint: PathBuf, options: VolumeOptions) -> Self {
        Self {
            name,
            mountpoint,
            options,
            created_at: Utc::now(),
            mounted: false,
            use_refs: HashSet::new(),
        }
    }

    /// Volume name.
    #[must_use]
    pub const fn name(&self) -> &VolumeName {
        &self.name
    }

    /// Where the backing filesystem is mounted.
    #[must_use]
    pub fn mountpoint(&self) -> &Path {
        &self.mountpoint
    }

    /// Options given at creation.
    #[must_use]
    pub const fn options(&self) -> &VolumeOptions {
        &self.options
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the backing filesystem is currently mounted.
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Number of distinct callers attached.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        self.use_refs.len()
    }

    /// Whether `caller` holds a reference.
    #[must_use]
    pub fn is_used_by(&self, caller: &CallerId) -> bool {
        self.use_refs.contains(caller)
    }

    /// Public descriptor without mount state.
    #[must_use]
    pub fn info(&self) -> VolumeInfo {
        VolumeInfo {
            name: self.name.clone(),
            mountpoint: self.mountpoint.clone(),
            created_at: self.created_at,
            status: None,
        }
    }

    /// Public descriptor including mount state.
    #[must_use]
    pub fn detailed_info(&self) -> VolumeInfo {
        VolumeInfo {
            status: Some(VolumeStatus {
                mounted: self.mounted,
                refs: self.use_refs.len(),
                eager_unmount: self.options.eager_unmount,
            }),
            ..self.info()
        }
    }
}

/// Public description of a volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeInfo {
    /// Volume name.
    pub name: VolumeName,
    /// Mountpoint path.
    pub mountpoint: PathBuf,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Mount state, only filled in for single-volume lookups.
    pub status: Option<VolumeStatus>,
}

/// Mount state reported alongside a volume descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeStatus {
    /// Whether the backing filesystem is mounted.
    pub mounted: bool,
    /// Number of distinct callers attached.
    pub refs: usize,
    /// Whether the volume unmounts when the last caller detaches.
    pub eager_unmount: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn defaults() {
        let parsed = VolumeOptions::parse(&BTreeMap::new());
        assert_eq!(parsed.mount_options, "auto");
        assert!(parsed.filesystem.is_empty());
        assert!(parsed.env.is_empty());
        assert!(!parsed.eager_unmount);
    }

    #[test]
    fn reserved_keys() {
        let parsed = VolumeOptions::parse(&opts(&[
            ("fs", "s3://bucket/data"),
            ("options", "listcache"),
            ("asap", "true"),
        ]));
        assert_eq!(parsed.filesystem, "s3://bucket/data");
        assert_eq!(parsed.mount_options, "auto,listcache");
        assert!(parsed.eager_unmount);
        assert!(parsed.env.is_empty());
    }

    #[test]
    fn options_alias_accumulates() {
        let parsed = VolumeOptions::parse(&opts(&[("options", "noatime"), ("ptions", "mt")]));
        assert_eq!(parsed.mount_options, "auto,noatime,mt");
    }

    #[test]
    fn unknown_keys_become_env() {
        let parsed = VolumeOptions::parse(&opts(&[
            ("fs", "x"),
            ("OBJECTIVEFS_PASSPHRASE", "secret"),
            ("AWS_DEFAULT_REGION", "eu-west-1"),
        ]));
        assert_eq!(
            parsed.env,
            vec![
                "AWS_DEFAULT_REGION=eu-west-1".to_string(),
                "OBJECTIVEFS_PASSPHRASE=secret".to_string(),
            ]
        );
    }

    #[test]
    fn asap_values() {
        for value in ["true", "1", "yes", ""] {
            assert!(VolumeOptions::parse(&opts(&[("asap", value)])).eager_unmount);
        }
        for value in ["false", "0", "No", "OFF"] {
            assert!(!VolumeOptions::parse(&opts(&[("asap", value)])).eager_unmount);
        }
    }

    #[test]
    fn new_volume_is_idle() {
        let name = VolumeName::new("data").unwrap();
        let volume = Volume::new(name, PathBuf::from("/m/data"), VolumeOptions::default());
        assert!(!volume.is_mounted());
        assert_eq!(volume.ref_count(), 0);
        assert!(volume.info().status.is_none());
        let status = volume.detailed_info().status.unwrap();
        assert!(!status.mounted);
        assert_eq!(status.refs, 0);
    }
}
