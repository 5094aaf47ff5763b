//! `isapi-open-door` — trigger a remote door open.

use std::io::Write;

use anyhow::Result;
use isapi_door::door::{self, AttemptOutcome, AttemptRecord, OpenDoorOutcome, Stage};
use isapi_door::IsapiClient;

use crate::args::OpenDoorCli;

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Primary => "primary endpoint",
        Stage::AlternativeEndpoint => "alternative endpoint",
        Stage::AlternativePayload => "alternative XML format with primary endpoint",
        Stage::AlternativeEndpointAndPayload => "alternative endpoint with alternative XML",
    }
}

/// Run the fallback sequence and write the outcome. Returns whether the
/// door opened.
pub async fn run(cli: &OpenDoorCli, out: &mut dyn Write) -> Result<bool> {
    let client = IsapiClient::new(
        cli.device.target(cli.flags.scheme()),
        cli.device.credentials(),
        &cli.flags.client_config(),
    )?;

    if cli.flags.json {
        let outcome = door::open_door(&client, cli.door_number).await;
        let json = serde_json::json!({
            "success": outcome.is_success(),
            "summary": outcome.summary(),
            "outcome": outcome,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
        return Ok(outcome.is_success());
    }

    // Each attempt line goes out as soon as the attempt finishes.
    let mut write_err = None;
    let outcome = door::open_door_with(&client, cli.door_number, |record| {
        if write_err.is_none() {
            if let Err(e) = write_attempt(out, record).and_then(|()| out.flush()) {
                write_err = Some(e);
            }
        }
    })
    .await;
    if let Some(e) = write_err {
        return Err(e.into());
    }
    write_summary(out, &outcome)?;

    Ok(outcome.is_success())
}

fn write_attempt(out: &mut dyn Write, record: &AttemptRecord) -> std::io::Result<()> {
    let label = stage_label(record.attempt.stage);
    match &record.outcome {
        AttemptOutcome::Response { status: 200, .. } => {
            writeln!(out, "[OK] {} {} ({label})", record.attempt.method.as_str(), record.url)
        }
        AttemptOutcome::Response { status, .. } => writeln!(
            out,
            "[!!] {} {} ({label}) failed with status code: {status}",
            record.attempt.method.as_str(),
            record.url
        ),
        AttemptOutcome::TransportError { message } => writeln!(
            out,
            "[!!] {} {} ({label}) error: {message}",
            record.attempt.method.as_str(),
            record.url
        ),
    }
}

fn write_summary(out: &mut dyn Write, outcome: &OpenDoorOutcome) -> std::io::Result<()> {
    writeln!(out, "{}", outcome.summary())?;

    if outcome.is_success() {
        writeln!(out, "Door opened successfully!")
    } else {
        match (outcome.last_response_body(), outcome.attempts.last()) {
            (Some(body), _) => writeln!(out, "Last response: {body}")?,
            (None, Some(AttemptRecord {
                outcome: AttemptOutcome::TransportError { message },
                ..
            })) => writeln!(
                out,
                "Last response: no response available (last attempt failed: {message})"
            )?,
            (None, _) => writeln!(out, "Last response: no response available")?,
        }
        writeln!(out, "Failed to open door!")
    }
}
