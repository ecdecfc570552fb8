//! Endpoint command handler. Offline: no device session is opened.

use bigip_core::select_endpoint;

use crate::cli::{EndpointArgs, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &EndpointArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let endpoints = config::resolve_endpoints(global, cfg);
    let endpoint = select_endpoint(args.key.trim(), &endpoints)?;

    let out = output::render_single(
        &global.output,
        &endpoint,
        |e| format!("Endpoint:  {}\nKind:      {}", e.url(), e.kind()),
        |e| e.url().to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
