//! Apply command handler: builds a `LicenseRequest` and runs the controller.

use bigip_core::{DesiredState, LicenseMetadata, LicenseRequest, ServiceDescriptor, SessionController};

use crate::cli::{ApplyArgs, ContactArgs, GlobalOpts, LicenseState};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    controller: &SessionController,
    args: ApplyArgs,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let request = build_request(args, config::profile_contact(global, cfg))?;

    if request.state == DesiredState::Absent
        && !util::confirm("Remove the license from this device?", global.yes)?
    {
        return Ok(());
    }

    let spinner = util::spinner(&format!("Converging license to '{}'", request.state), global.quiet);
    let result = controller.apply(&request).await;
    spinner.finish_and_clear();
    let outcome = result?;

    tracing::debug!(changed = outcome.changed, status = %outcome.status, "apply finished");

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &outcome,
        |o| output::outcome_detail(o, color),
        output::outcome_plain,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Translate CLI arguments into a controller request.
///
/// Contact details layer as profile, then `--metadata-file`, then flags.
fn build_request(args: ApplyArgs, profile_contact: LicenseMetadata) -> Result<LicenseRequest, CliError> {
    let key = args.key.trim();
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "key".into(),
            reason: "registration key cannot be empty".into(),
        });
    }

    let mut metadata = match args.metadata_file {
        Some(ref path) => util::read_metadata_file(path)?,
        None => profile_contact,
    };
    apply_contact_flags(&mut metadata, args.contact);

    let mut request = LicenseRequest::new(desired_state(args.state), key);
    request.license_file = args.license_file;
    request.dossier_file = args.dossier_file;
    request.metadata = metadata;
    request.service_descriptor = args.service_descriptor.as_deref().map(parse_descriptor);
    request.strict_removal = args.strict;
    Ok(request)
}

fn desired_state(state: LicenseState) -> DesiredState {
    match state {
        LicenseState::Present => DesiredState::Present,
        LicenseState::Absent => DesiredState::Absent,
        LicenseState::Latest => DesiredState::Latest,
    }
}

fn parse_descriptor(location: &str) -> ServiceDescriptor {
    let Ok(descriptor) = location.parse::<ServiceDescriptor>();
    descriptor
}

fn apply_contact_flags(metadata: &mut LicenseMetadata, flags: ContactArgs) {
    let overrides = [
        (&mut metadata.email, flags.email),
        (&mut metadata.first_name, flags.first_name),
        (&mut metadata.last_name, flags.last_name),
        (&mut metadata.company_name, flags.company),
        (&mut metadata.phone, flags.phone),
        (&mut metadata.job_title, flags.job_title),
        (&mut metadata.address, flags.address),
        (&mut metadata.city, flags.city),
        (&mut metadata.state_province, flags.state_province),
        (&mut metadata.postal_code, flags.postal_code),
        (&mut metadata.country, flags.country),
    ];
    for (field, value) in overrides {
        if let Some(value) = value {
            *field = value;
        }
    }
}
