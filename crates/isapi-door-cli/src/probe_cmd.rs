//! `isapi-probe` — report identity, capability and door-status endpoints.

use std::io::Write;

use anyhow::Result;
use isapi_door::probe::{self, DeviceInfoReport, ProbeReport, ProbeResult};
use isapi_door::IsapiClient;

use crate::args::ProbeCli;

/// Run every check and write the report to `out`.
///
/// In text mode each block is written as soon as its check finishes.
pub async fn run(cli: &ProbeCli, out: &mut dyn Write) -> Result<()> {
    let target = cli.device.target(cli.flags.scheme());
    let client = IsapiClient::new(
        target.clone(),
        cli.device.credentials(),
        &cli.flags.client_config(),
    )?;
    let text = !cli.flags.json;

    if text {
        writeln!(out, "ISAPI Device Capability Check")?;
        writeln!(out, "Target: {target}")?;
        writeln!(out, "{}", "-".repeat(40))?;
    }

    let device_info = probe::check_device_info(&client).await;
    if text {
        write_device_info(out, &device_info)?;
        writeln!(out)?;
        writeln!(out, "Checking Access Control Capabilities:")?;
    }

    let capabilities = probe::check_capabilities(&client).await;
    if text {
        for result in &capabilities {
            write_probe_result(out, result, probe::DOOR_COUNT_FIELD, "Number of doors")?;
        }
        writeln!(out)?;
        writeln!(out, "Checking Door Status Endpoints (door {}):", cli.door)?;
    }

    let door_status = probe::check_door_status(&client, cli.door).await;
    if text {
        for result in &door_status {
            write_probe_result(out, result, probe::DOOR_STATUS_FIELD, "Current status")?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "Check complete. Use this information to determine the correct endpoint for door control."
        )?;
        return Ok(());
    }

    let report = ProbeReport {
        target,
        device_info,
        capabilities,
        door: cli.door,
        door_status,
    };
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

fn write_device_info(out: &mut dyn Write, report: &DeviceInfoReport) -> std::io::Result<()> {
    match report {
        DeviceInfoReport::Identified(id) => {
            writeln!(out, "[OK] Device info retrieved successfully")?;
            writeln!(out, "  Device Name: {}", id.device_name)?;
            writeln!(out, "  Model: {}", id.model)?;
            writeln!(out, "  Firmware: {}", id.firmware_version)
        }
        DeviceInfoReport::Unparsed { raw_preview } => {
            writeln!(out, "[OK] Device info retrieved successfully")?;
            writeln!(out, "  Raw response: {raw_preview}")
        }
        DeviceInfoReport::Failed { status } => {
            writeln!(out, "[!!] Failed to get device info. Status: {status}")
        }
        DeviceInfoReport::Error { message } => {
            writeln!(out, "[!!] Error getting device info: {message}")
        }
    }
}

fn write_probe_result(
    out: &mut dyn Write,
    result: &ProbeResult,
    field: &str,
    label: &str,
) -> std::io::Result<()> {
    match (result.status, &result.error) {
        (Some(status), _) if result.is_available() => {
            writeln!(out, "[OK] {} - Available (Status: {status})", result.endpoint)?;
            if let Some(value) = result.field(field) {
                writeln!(out, "  - {label}: {value}")?;
            }
            Ok(())
        }
        (Some(status), _) => writeln!(
            out,
            "[!!] {} - Not available (Status: {status})",
            result.endpoint
        ),
        (None, Some(err)) => writeln!(out, "[!!] {} - Error: {err}", result.endpoint),
        (None, None) => writeln!(out, "[??] {} - No response", result.endpoint),
    }
}
