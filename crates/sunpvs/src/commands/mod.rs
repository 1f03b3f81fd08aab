//! Command dispatch: bridges CLI args -> `PvsClient` calls -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod ess;
pub mod network;
pub mod probe;

use sunpvs_core::PvsClient;

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Dispatch a supervisor-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &mut PvsClient,
    format: OutputFormat,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(client, &args, format, global).await,
        Command::Ess => ess::handle(client, format, global).await,
        Command::Network => network::handle(client, format, global).await,
        // Handled before a client is built
        Command::Probe | Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
