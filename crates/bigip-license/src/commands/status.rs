//! Status command handler.

use serde::Serialize;

use bigip_core::{ActivationStatus, SessionController};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct StatusView {
    status: ActivationStatus,
    licensed: bool,
}

pub async fn handle(controller: &SessionController, global: &GlobalOpts) -> Result<(), CliError> {
    let status = controller.status().await?;
    let view = StatusView {
        status,
        licensed: status.is_enabled(),
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &view,
        |v| format!("Status:  {}", output::paint_status(v.status, color)),
        |v| v.status.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
