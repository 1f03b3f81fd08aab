//! `sunpvs network`: communication status, as the supervisor reports it.

use serde_json::Value;

use sunpvs_core::PvsClient;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Top-level keys as `key: value`; nested objects stay compact JSON.
fn detail(status: &Value) -> String {
    match status.as_object() {
        Some(map) if !map.is_empty() => {
            output::detail_lines(map.iter().map(|(k, v)| (k.as_str(), output::value_text(v))))
        }
        _ => output::value_text(status),
    }
}

pub async fn handle(
    client: &mut PvsClient,
    format: OutputFormat,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let status = client.network_status().await?;
    let out = output::render_single(format, &status, detail, |s| {
        s.as_object()
            .map(|m| m.keys().cloned().collect::<Vec<_>>().join("\n"))
            .unwrap_or_default()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
