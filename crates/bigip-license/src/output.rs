//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`
//! or a detail view, structured formats use serde, plain emits one value
//! per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use bigip_core::{ActivationStatus, LicenseOutcome, PollOutcome};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Activation status, green when enabled and red otherwise.
pub fn paint_status(status: ActivationStatus, color: bool) -> String {
    match (color, status.is_enabled()) {
        (false, _) => status.to_string(),
        (true, true) => status.to_string().green().to_string(),
        (true, false) => status.to_string().red().to_string(),
    }
}

fn paint_warning(text: &str, color: bool) -> String {
    if color {
        text.yellow().to_string()
    } else {
        text.to_owned()
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted string,
/// since single-item detail views don't use `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── License outcome ──────────────────────────────────────────────────

/// Detail view of one `apply` run.
pub fn outcome_detail(outcome: &LicenseOutcome, color: bool) -> String {
    let mut lines = vec![
        format!("Changed:   {}", if outcome.changed { "yes" } else { "no" }),
        format!("State:     {}", outcome.state),
        format!("Status:    {}", paint_status(outcome.status, color)),
    ];
    if let Some(ref endpoint) = outcome.endpoint {
        lines.push(format!("Endpoint:  {endpoint}"));
    }
    if let Some(ref removal) = outcome.removal {
        lines.push(format!("Disable:   {}", poll_summary(&removal.disable)));
        if let Some(ref restore) = removal.shell_restore {
            lines.push(format!("Shell:     {}", poll_summary(restore)));
        }
    }
    for warning in &outcome.warnings {
        lines.push(paint_warning(&format!("Warning:   {warning}"), color));
    }
    lines.join("\n")
}

/// Plain view: `changed` or `unchanged`, for scripts.
pub fn outcome_plain(outcome: &LicenseOutcome) -> String {
    if outcome.changed {
        "changed".into()
    } else {
        "unchanged".into()
    }
}

fn poll_summary(outcome: &PollOutcome) -> String {
    outcome.describe()
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let text = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(text)
}

/// YAML output.
fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Validation {
        field: "output".into(),
        reason: format!("YAML serialization failed: {e}"),
    })
}
