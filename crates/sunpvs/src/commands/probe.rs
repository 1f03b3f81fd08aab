//! `sunpvs probe`: firmware capability check.

use std::time::Duration;

use sunpvs_core::{Capability, PvsClient};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

fn detail(c: &Capability) -> String {
    let or_dash = |v: Option<&str>| v.unwrap_or("-").to_owned();
    let mut pairs = vec![
        (
            "API",
            if c.supported { "LocalAPI" } else { "Legacy CGI" }.to_owned(),
        ),
        ("Build", c.build.map_or_else(|| "-".into(), |b| b.to_string())),
        ("Version", or_dash(c.version.as_deref())),
        ("Serial", or_dash(c.serial.as_deref())),
    ];
    if let Some(reachable) = c.auth_endpoint {
        pairs.push(("Login", if reachable { "present" } else { "missing" }.to_owned()));
    }
    if let Some(ref error) = c.error {
        pairs.push(("Note", error.clone()));
    }
    output::detail_lines(pairs)
}

pub async fn handle(
    host: &str,
    timeout: Duration,
    format: OutputFormat,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let capability = PvsClient::check_capability(host, timeout).await;
    tracing::info!(host, supported = capability.supported, "probe finished");

    let out = output::render_single(format, &capability, detail, |c| {
        if c.supported { "localapi" } else { "legacy" }.to_owned()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
