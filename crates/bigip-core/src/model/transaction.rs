// ── License transaction ──

use bigip_api::{ActivationResponse, TransactionState};

/// Result of one license request to the activation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseTransaction {
    LicenseReturned { license: String, eula: String },
    /// The EULA must be accepted by resubmitting with its text.
    EulaRequired { eula: String },
    EmailRequired,
    ContactInfoRequired,
    FaultReturned { number: Option<String>, text: String },
    /// A state tag this client does not know.
    Unrecognized { state: String },
}

impl LicenseTransaction {
    /// The wire name of the transaction state.
    pub fn state_name(&self) -> &str {
        match self {
            Self::LicenseReturned { .. } => "LICENSE_RETURNED",
            Self::EulaRequired { .. } => "EULA_REQUIRED",
            Self::EmailRequired => "EMAIL_REQUIRED",
            Self::ContactInfoRequired => "CONTACT_INFO_REQUIRED",
            Self::FaultReturned { .. } => "FAULT_RETURNED",
            Self::Unrecognized { state } => state,
        }
    }

    /// Why no license came back, for error reporting.
    pub fn describe(&self) -> String {
        match self {
            Self::LicenseReturned { .. } => "license returned".into(),
            Self::EulaRequired { .. } => "the EULA was not accepted".into(),
            Self::EmailRequired => "an email address is required".into(),
            Self::ContactInfoRequired => "contact information is required".into(),
            Self::FaultReturned {
                number: Some(number),
                text,
            } => format!("fault {number}: {text}"),
            Self::FaultReturned { number: None, text } => text.clone(),
            Self::Unrecognized { state } => format!("unrecognized transaction state '{state}'"),
        }
    }
}

impl From<ActivationResponse> for LicenseTransaction {
    fn from(resp: ActivationResponse) -> Self {
        let eula = resp.eula.unwrap_or_default();
        match resp.state {
            TransactionState::LicenseReturned => match resp.license {
                Some(license) => Self::LicenseReturned { license, eula },
                None => Self::FaultReturned {
                    number: None,
                    text: "LICENSE_RETURNED without license text".into(),
                },
            },
            TransactionState::EulaRequired => Self::EulaRequired { eula },
            TransactionState::EmailRequired => Self::EmailRequired,
            TransactionState::ContactInfoRequired => Self::ContactInfoRequired,
            TransactionState::FaultReturned => {
                let fault = resp.fault;
                Self::FaultReturned {
                    number: fault.as_ref().and_then(|f| f.number.clone()),
                    text: fault.map_or_else(|| "no fault text".into(), |f| f.text),
                }
            }
            TransactionState::Unknown(state) => Self::Unrecognized { state },
        }
    }
}
