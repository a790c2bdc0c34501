//! Volume plugin wire types.
//!
//! Field names follow the container runtime's plugin protocol, which uses
//! `PascalCase` keys.

use std::collections::{BTreeMap, HashMap};

use chrono::SecondsFormat;
use ofs_volume::{Capabilities, VolumeInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content type the runtime expects on plugin responses.
pub const PLUGIN_CONTENT_TYPE: &str = "application/vnd.docker.plugins.v1.2+json";

/// `/Plugin.Activate` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivateResponse {
    /// Plugin subsystems implemented.
    pub implements: Vec<&'static str>,
}

/// Request naming a single volume.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NameRequest {
    /// Volume name.
    pub name: String,
}

/// `/VolumeDriver.Create` request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRequest {
    /// Volume name.
    pub name: String,
    /// Creation options; the runtime sends `null` when there are none.
    #[serde(default)]
    pub opts: Option<BTreeMap<String, String>>,
}

/// `/VolumeDriver.Mount` and `/VolumeDriver.Unmount` request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttachRequest {
    /// Volume name.
    pub name: String,
    /// Caller (container) ID.
    #[serde(rename = "ID")]
    pub id: String,
}

/// A volume as reported to the runtime.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireVolume {
    /// Volume name.
    pub name: String,
    /// Mountpoint path.
    pub mountpoint: String,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// Driver-specific status, only on `Get`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<HashMap<String, Value>>,
}

impl From<VolumeInfo> for WireVolume {
    fn from(info: VolumeInfo) -> Self {
        let status = info.status.map(|s| {
            HashMap::from([
                ("mounted".to_string(), Value::from(s.mounted)),
                ("refs".to_string(), Value::from(s.refs)),
                ("asap".to_string(), Value::from(s.eager_unmount)),
            ])
        });
        Self {
            name: info.name.to_string(),
            mountpoint: info.mountpoint.display().to_string(),
            created_at: info.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            status,
        }
    }
}

/// `/VolumeDriver.List` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListResponse {
    /// Every registered volume.
    pub volumes: Vec<WireVolume>,
}

/// `/VolumeDriver.Get` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetResponse {
    /// The requested volume.
    pub volume: WireVolume,
}

/// `/VolumeDriver.Path` and `/VolumeDriver.Mount` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountpointResponse {
    /// Mountpoint path.
    pub mountpoint: String,
}

/// `/VolumeDriver.Capabilities` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapabilitiesResponse {
    /// Driver capabilities.
    pub capabilities: WireCapabilities,
}

/// Capabilities as reported to the runtime.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireCapabilities {
    /// `local` or `global`.
    pub scope: ofs_volume::Scope,
}

impl From<Capabilities> for CapabilitiesResponse {
    fn from(caps: Capabilities) -> Self {
        Self {
            capabilities: WireCapabilities { scope: caps.scope },
        }
    }
}

/// Empty success body.
#[derive(Debug, Default, Serialize)]
pub struct Empty {}

/// Error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    /// Error message.
    pub err: String,
}
