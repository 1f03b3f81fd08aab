//! `sunpvs ess`: energy storage status.

use serde_json::Value;

use sunpvs_core::{EssStatus, PvsClient};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

fn serial(unit: &Value) -> String {
    unit.get("serial_number")
        .map_or_else(|| "-".into(), output::value_text)
}

fn detail(status: &EssStatus) -> String {
    let Some(ref report) = status.ess_report else {
        return "No storage report".into();
    };
    if status.is_empty() {
        return "No storage hardware reported".into();
    }

    let mut lines = vec![output::detail_lines([
        ("Batteries", report.battery_status.len().to_string()),
        ("ESS units", report.ess_status.len().to_string()),
        (
            "Hub",
            report
                .hub_plus_status
                .get("serial_number")
                .map_or_else(|| "-".into(), output::value_text),
        ),
    ])];
    for unit in &report.ess_status {
        let power = unit
            .pointer("/ess_meter_reading/agg_power/value")
            .map_or_else(|| "-".into(), output::value_text);
        lines.push(format!("  {}  {power} kW", serial(unit)));
    }
    lines.join("\n")
}

pub async fn handle(
    client: &mut PvsClient,
    format: OutputFormat,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let status = client.ess_status().await?;
    let out = output::render_single(format, &status, detail, |s| {
        s.ess_report
            .as_ref()
            .map(|r| r.ess_status.iter().map(serial).collect::<Vec<_>>().join("\n"))
            .unwrap_or_default()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
