//! Door actuator.
//!
//! Devices differ in which endpoint and payload schema they accept for a
//! remote open, so the actuator walks a fixed list of candidates and stops
//! at the first one the device answers with 200.

use serde::Serialize;
use tracing::{info, warn};

use crate::client::IsapiClient;
use crate::types::{ConnectionTarget, Method};

/// Alternative open endpoints, tried in this order.
pub const ALTERNATIVE_OPEN_PATHS: [&str; 2] = [
    "/ISAPI/AccessControl/door/open",
    "/ISAPI/AccessControl/RemoteControl/door",
];

/// Seconds the lock stays released.
pub const OPEN_DELAY_SECS: u32 = 5;

pub fn primary_open_path(door: u32) -> String {
    format!("/ISAPI/AccessControl/door/{door}/open")
}

/// Namespaced `AccessControlDoorOpen` document.
pub fn primary_payload(door: u32) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<AccessControlDoorOpen xmlns="urn:psialliance:params:xml:ns:ptz-1">
    <doorID>{door}</doorID>
    <delayTime>{OPEN_DELAY_SECS}</delayTime>
</AccessControlDoorOpen>"#
    )
}

/// Un-namespaced `RemoteControlDoor` command document.
pub fn alternative_payload(door: u32) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<RemoteControlDoor>
    <cmd>open</cmd>
    <doorNo>{door}</doorNo>
    <delayTime>{OPEN_DELAY_SECS}</delayTime>
</RemoteControlDoor>"#
    )
}

/// Which part of the fallback sequence an attempt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Numbered endpoint, primary payload.
    Primary,
    /// Alternative endpoint, primary payload.
    AlternativeEndpoint,
    /// Numbered endpoint, alternative payload.
    AlternativePayload,
    /// Alternative endpoint, alternative payload.
    AlternativeEndpointAndPayload,
}

/// One candidate request in the fallback sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointAttempt {
    pub stage: Stage,
    pub path: String,
    pub method: Method,
    #[serde(skip)]
    pub body: Option<String>,
}

impl EndpointAttempt {
    fn post(stage: Stage, path: impl Into<String>, body: String) -> Self {
        Self {
            stage,
            path: path.into(),
            method: Method::Post,
            body: Some(body),
        }
    }
}

/// Printable URL for an attempt; keeps the port exactly as configured.
pub fn attempt_url(target: &ConnectionTarget, path: &str) -> String {
    format!("{}{path}", target.base_url())
}

/// The full ordered candidate list for `door`.
pub fn fallback_sequence(door: u32) -> Vec<EndpointAttempt> {
    let primary_path = primary_open_path(door);
    let primary = primary_payload(door);
    let alternative = alternative_payload(door);

    let mut seq = vec![EndpointAttempt::post(
        Stage::Primary,
        primary_path.clone(),
        primary.clone(),
    )];
    for path in ALTERNATIVE_OPEN_PATHS {
        seq.push(EndpointAttempt::post(
            Stage::AlternativeEndpoint,
            path,
            primary.clone(),
        ));
    }
    seq.push(EndpointAttempt::post(
        Stage::AlternativePayload,
        primary_path,
        alternative.clone(),
    ));
    for path in ALTERNATIVE_OPEN_PATHS {
        seq.push(EndpointAttempt::post(
            Stage::AlternativeEndpointAndPayload,
            path,
            alternative.clone(),
        ));
    }
    seq
}

/// What happened to a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Response { status: u16, body: String },
    TransportError { message: String },
}

/// An attempt together with its outcome.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    #[serde(flatten)]
    pub attempt: EndpointAttempt,
    pub url: String,
    pub outcome: AttemptOutcome,
}

impl AttemptRecord {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Response { status: 200, .. })
    }
}

/// Result of an open-door run.
#[derive(Debug, Clone, Serialize)]
pub struct OpenDoorOutcome {
    pub door: u32,
    /// Attempts in the order they were made; a success is always last.
    pub attempts: Vec<AttemptRecord>,
}

impl OpenDoorOutcome {
    /// The attempt that opened the door, if any.
    pub fn success(&self) -> Option<&AttemptRecord> {
        self.attempts.last().filter(|a| a.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.success().is_some()
    }

    /// Body of the final attempt, or `None` if it got no response.
    pub fn last_response_body(&self) -> Option<&str> {
        match &self.attempts.last()?.outcome {
            AttemptOutcome::Response { body, .. } => Some(body),
            AttemptOutcome::TransportError { .. } => None,
        }
    }

    /// One-line human-readable result.
    pub fn summary(&self) -> String {
        let door = self.door;
        match self.success() {
            Some(a) => match a.attempt.stage {
                Stage::Primary => {
                    format!("Door {door} opened successfully using primary endpoint!")
                }
                Stage::AlternativeEndpoint => format!(
                    "Door {door} opened successfully using alternative endpoint: {}",
                    a.url
                ),
                Stage::AlternativePayload => {
                    format!("Door {door} opened successfully using alternative XML format!")
                }
                Stage::AlternativeEndpointAndPayload => format!(
                    "Door {door} opened successfully using {} with alternative XML!",
                    a.url
                ),
            },
            None => format!("All attempts to open door {door} failed."),
        }
    }
}

/// Try every candidate in order until one returns 200.
pub async fn open_door(client: &IsapiClient, door: u32) -> OpenDoorOutcome {
    open_door_with(client, door, |_| {}).await
}

/// Like [`open_door`], calling `on_attempt` as soon as each attempt finishes.
pub async fn open_door_with(
    client: &IsapiClient,
    door: u32,
    mut on_attempt: impl FnMut(&AttemptRecord),
) -> OpenDoorOutcome {
    let mut attempts = Vec::new();

    for attempt in fallback_sequence(door) {
        let url = attempt_url(client.target(), &attempt.path);

        info!(stage = ?attempt.stage, %url, "trying door open");
        let outcome = match client
            .send(attempt.method, &attempt.path, attempt.body.as_deref())
            .await
        {
            Ok(resp) => {
                if resp.status != 200 {
                    info!(stage = ?attempt.stage, %url, status = resp.status, "door open rejected");
                }
                AttemptOutcome::Response {
                    status: resp.status,
                    body: resp.body,
                }
            }
            Err(e) => {
                warn!(stage = ?attempt.stage, %url, error = %e, "door open request failed");
                AttemptOutcome::TransportError {
                    message: e.to_string(),
                }
            }
        };

        let record = AttemptRecord {
            attempt,
            url,
            outcome,
        };
        on_attempt(&record);
        let done = record.is_success();
        attempts.push(record);
        if done {
            break;
        }
    }

    let outcome = OpenDoorOutcome { door, attempts };
    if outcome.is_success() {
        info!(door, "door opened");
    } else {
        warn!(door, "all door open attempts failed");
    }
    outcome
}
