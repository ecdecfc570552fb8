//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use bigip_core::LicenseMetadata;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to prompt on, the operation is refused.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read registrant details from a JSON file for `--metadata-file`.
pub fn read_metadata_file(path: &Path) -> Result<LicenseMetadata, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CliError::FileNotFound {
                what: "Metadata file".into(),
                path: path.display().to_string(),
            }
        } else {
            CliError::Io(e)
        }
    })?;
    LicenseMetadata::from_json(&contents).map_err(|e| CliError::Validation {
        field: "metadata-file".into(),
        reason: e.to_string(),
    })
}

/// A stderr spinner for long remote sequences; hidden when quiet or piped.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn metadata_file_accepts_legacy_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"email": "ops@example.com", "firstname": "Ada"}}"#).unwrap();

        let metadata = read_metadata_file(file.path()).unwrap();
        assert_eq!(metadata.email, "ops@example.com");
        assert_eq!(metadata.first_name, "Ada");
        assert_eq!(metadata.country, "");
    }

    #[test]
    fn missing_metadata_file_is_not_found() {
        let err = read_metadata_file(Path::new("/nonexistent/metadata.json")).unwrap_err();
        assert!(matches!(err, CliError::FileNotFound { .. }));
    }

    #[test]
    fn yes_flag_skips_prompt() {
        assert!(confirm("Remove license?", true).unwrap());
    }
}
