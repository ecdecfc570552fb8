//! Command dispatch: bridges CLI args -> license controller -> output formatting.

pub mod apply;
pub mod config_cmd;
pub mod endpoint;
pub mod status;
pub mod util;

use bigip_core::SessionController;

use crate::cli::{Command, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &SessionController,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Apply(args) => apply::handle(controller, args, cfg, global).await,
        Command::Status => status::handle(controller, global).await,
        // Offline commands are handled before a session is opened
        Command::Endpoint(_) | Command::Config(_) | Command::Completions(_) => {
            Err(CliError::Validation {
                field: "command".into(),
                reason: "command does not need a device session".into(),
            })
        }
    }
}
