//! Capability prober.
//!
//! Three independent read-only checks against a device: identity,
//! access-control capability endpoints, and door-status endpoints. A
//! failure in one check never stops the others.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::client::IsapiClient;
use crate::types::ConnectionTarget;
use crate::xml::{XmlDocument, XmlError};

pub const DEVICE_INFO_PATH: &str = "/ISAPI/System/deviceInfo";

pub const CAPABILITY_PATHS: [&str; 3] = [
    "/ISAPI/AccessControl/capabilities",
    "/ISAPI/AccessControl/door/capabilities",
    "/ISAPI/AccessControl/remoteControl/capabilities",
];

/// Tag holding the door count in capability documents.
pub const DOOR_COUNT_FIELD: &str = "doorNum";
/// Tag holding the door state in status documents.
pub const DOOR_STATUS_FIELD: &str = "status";

/// Placeholder for identity fields the device did not report.
pub const UNKNOWN: &str = "Unknown";

/// Longest raw-body excerpt shown when a reply is not valid XML.
pub const RAW_PREVIEW_CHARS: usize = 200;

/// Door-status paths for `door`: numbered, generic, remote-control.
pub fn door_status_paths(door: u32) -> [String; 3] {
    [
        format!("/ISAPI/AccessControl/door/{door}/status"),
        "/ISAPI/AccessControl/door/status".to_string(),
        format!("/ISAPI/AccessControl/remoteControl/doorStatus/{door}"),
    ]
}

/// Identity fields from `/ISAPI/System/deviceInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub device_name: String,
    pub model: String,
    pub firmware_version: String,
}

impl DeviceIdentity {
    pub fn from_xml(body: &str) -> Result<Self, XmlError> {
        let doc = XmlDocument::parse(body)?;
        let field = |tag: &str| doc.find_text(tag).unwrap_or(UNKNOWN).to_string();
        Ok(Self {
            device_name: field("deviceName"),
            model: field("model"),
            firmware_version: field("firmwareVersion"),
        })
    }
}

/// Outcome of the identity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeviceInfoReport {
    Identified(DeviceIdentity),
    /// 200, but the body was not XML.
    Unparsed { raw_preview: String },
    /// Any status other than 200.
    Failed { status: u16 },
    /// No response at all.
    Error { message: String },
}

/// Result of probing one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub endpoint: String,
    /// `None` when the request never got a response.
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    /// 200 and 204 both count as the endpoint being present.
    pub fn is_available(&self) -> bool {
        matches!(self.status, Some(200) | Some(204))
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Everything the prober found for one device.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub target: ConnectionTarget,
    pub device_info: DeviceInfoReport,
    pub capabilities: Vec<ProbeResult>,
    pub door: u32,
    pub door_status: Vec<ProbeResult>,
}

/// First `max` characters of `body`, with `...` appended when cut.
pub fn raw_preview(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Fetch and parse the device identity.
pub async fn check_device_info(client: &IsapiClient) -> DeviceInfoReport {
    let resp = match client.get(DEVICE_INFO_PATH).await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(error = %e, "device info request failed");
            return DeviceInfoReport::Error {
                message: e.to_string(),
            };
        }
    };

    if !resp.is_ok() {
        info!(status = resp.status, "device info not available");
        return DeviceInfoReport::Failed {
            status: resp.status,
        };
    }

    match DeviceIdentity::from_xml(&resp.body) {
        Ok(identity) => DeviceInfoReport::Identified(identity),
        Err(e) => {
            warn!(error = %e, "device info is not valid XML");
            DeviceInfoReport::Unparsed {
                raw_preview: raw_preview(&resp.body, RAW_PREVIEW_CHARS),
            }
        }
    }
}

/// Probe the fixed access-control capability endpoints.
pub async fn check_capabilities(client: &IsapiClient) -> Vec<ProbeResult> {
    let mut results = Vec::with_capacity(CAPABILITY_PATHS.len());
    for path in CAPABILITY_PATHS {
        results.push(probe_endpoint(client, path, DOOR_COUNT_FIELD).await);
    }
    results
}

/// Probe the door-status endpoints for one door.
pub async fn check_door_status(client: &IsapiClient, door: u32) -> Vec<ProbeResult> {
    let mut results = Vec::with_capacity(3);
    for path in door_status_paths(door) {
        results.push(probe_endpoint(client, &path, DOOR_STATUS_FIELD).await);
    }
    results
}

/// Run all three checks in order.
pub async fn run_all(client: &IsapiClient, door: u32) -> ProbeReport {
    let device_info = check_device_info(client).await;
    let capabilities = check_capabilities(client).await;
    let door_status = check_door_status(client, door).await;
    ProbeReport {
        target: client.target().clone(),
        device_info,
        capabilities,
        door,
        door_status,
    }
}

async fn probe_endpoint(client: &IsapiClient, path: &str, field: &str) -> ProbeResult {
    let mut result = ProbeResult {
        endpoint: path.to_string(),
        status: None,
        fields: BTreeMap::new(),
        error: None,
    };

    let resp = match client.get(path).await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(endpoint = path, error = %e, "probe request failed");
            result.error = Some(e.to_string());
            return result;
        }
    };

    result.status = Some(resp.status);
    info!(endpoint = path, status = resp.status, "probed");

    // 204 has no body worth reading; other statuses are not available.
    if resp.status == 200 {
        if let Ok(doc) = XmlDocument::parse(&resp.body) {
            if let Some(value) = doc.find_text(field) {
                result.fields.insert(field.to_string(), value.to_string());
            }
        }
    }

    result
}
