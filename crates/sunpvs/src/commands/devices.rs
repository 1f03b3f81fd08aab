//! Device command handler.

use tabled::Tabled;

use sunpvs_core::model::keys;
use sunpvs_core::{DeviceRecord, PvsClient};

use crate::cli::{DevicesArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Type")]
    dtype: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Power (kW)")]
    power: String,
    #[tabled(rename = "Description")]
    descr: String,
}

fn row(d: &DeviceRecord) -> DeviceRow {
    let field = |key: &str| d.text(key).unwrap_or_else(|| "-".into());
    DeviceRow {
        dtype: field(keys::DEVICE_TYPE),
        serial: field(keys::SERIAL),
        model: field(keys::MODEL),
        state: field(keys::STATE),
        power: field("p_3phsum_kw"),
        descr: field(keys::DESCR),
    }
}

pub async fn handle(
    client: &mut PvsClient,
    args: &DevicesArgs,
    format: OutputFormat,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut devices: Vec<DeviceRecord> = if args.virtual_meter {
        client.device_index(true).await?.to_list().devices
    } else {
        client.device_list().await?.devices
    };

    if let Some(kind) = args.kind {
        devices.retain(|d| d.kind() == Some(kind));
    }
    tracing::debug!(count = devices.len(), "devices loaded");

    let out = output::render_list(format, &devices, row, |d| {
        d.serial().unwrap_or_default()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
