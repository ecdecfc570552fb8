use crate::error::Error;
use crate::soap::{SoapCall, SoapValue, XmlNode};

/// Method namespace of the v5b activation service.
pub const NAMESPACE: &str = "urn:com.f5.license.v5b.ActivationService";

/// Parameters of one `getLicense` call.
///
/// Contact fields are sent as empty strings when unknown; the service asks
/// for them explicitly (`EMAIL_REQUIRED`, `CONTACT_INFO_REQUIRED`) if it
/// needs them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseApplication {
    pub dossier: String,
    pub eula: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub phone: String,
    pub job_title: String,
    pub address: String,
    pub city: String,
    pub state_province: String,
    pub postal_code: String,
    pub country: String,
}

impl LicenseApplication {
    pub(crate) fn to_call(&self) -> SoapCall {
        let text = |s: &String| SoapValue::Text(s.clone());
        SoapCall::new(NAMESPACE, "getLicense")
            .param("dossier", text(&self.dossier))
            .param("eula", text(&self.eula))
            .param("email", text(&self.email))
            .param("firstName", text(&self.first_name))
            .param("lastName", text(&self.last_name))
            .param("companyName", text(&self.company_name))
            .param("phone", text(&self.phone))
            .param("jobTitle", text(&self.job_title))
            .param("address", text(&self.address))
            .param("city", text(&self.city))
            .param("stateProvince", text(&self.state_province))
            .param("postalCode", text(&self.postal_code))
            .param("country", text(&self.country))
    }
}

/// The `state` tag of a license transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionState {
    LicenseReturned,
    EulaRequired,
    EmailRequired,
    ContactInfoRequired,
    FaultReturned,
    Unknown(String),
}

impl TransactionState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "LICENSE_RETURNED" => Self::LicenseReturned,
            "EULA_REQUIRED" => Self::EulaRequired,
            "EMAIL_REQUIRED" => Self::EmailRequired,
            "CONTACT_INFO_REQUIRED" => Self::ContactInfoRequired,
            "FAULT_RETURNED" => Self::FaultReturned,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

/// Fault details carried by a `FAULT_RETURNED` transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationFault {
    pub number: Option<String>,
    pub text: String,
}

/// Decoded `getLicense` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationResponse {
    pub state: TransactionState,
    pub license: Option<String>,
    pub eula: Option<String>,
    pub fault: Option<ActivationFault>,
}

impl ActivationResponse {
    /// Decode from a SOAP body. Fields are looked up by local name so both
    /// nested and flattened encodings of the return struct are accepted.
    pub(crate) fn from_body(body: &XmlNode) -> Result<Self, Error> {
        let state = body
            .find("state")
            .map(|n| TransactionState::parse(n.text()))
            .ok_or_else(|| Error::Deserialization {
                message: "license transaction has no state".into(),
                body: String::new(),
            })?;

        let non_empty = |name: &str| {
            body.find(name)
                .map(|n| n.text().to_owned())
                .filter(|s| !s.trim().is_empty())
        };

        let fault = body.find("fault").and_then(|f| {
            let text = f.find("faultText").map(|n| n.text().to_owned())?;
            Some(ActivationFault {
                number: f
                    .find("faultNumber")
                    .map(|n| n.text().to_owned())
                    .filter(|s| !s.is_empty()),
                text,
            })
        });

        Ok(Self {
            state,
            license: non_empty("license"),
            eula: non_empty("eula"),
            fault,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::soap::parse_body;

    #[test]
    fn application_renders_every_contact_field() {
        let app = LicenseApplication {
            dossier: "abc".into(),
            first_name: "Ada".into(),
            ..LicenseApplication::default()
        };
        let xml = app.to_call().to_envelope();
        for field in [
            "dossier", "eula", "email", "firstName", "lastName", "companyName", "phone",
            "jobTitle", "address", "city", "stateProvince", "postalCode", "country",
        ] {
            assert!(xml.contains(&format!("<{field} ")), "missing {field}");
        }
        assert!(xml.contains(">Ada</firstName>"));
    }

    #[test]
    fn decodes_eula_required() {
        let body = parse_body(
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
              <soapenv:Body><ns1:getLicenseResponse xmlns:ns1="urn:com.f5.license.v5b.ActivationService">
                <getLicenseReturn>
                  <state>EULA_REQUIRED</state>
                  <eula>You agree.</eula>
                  <license></license>
                </getLicenseReturn>
              </ns1:getLicenseResponse></soapenv:Body></soapenv:Envelope>"#,
        )
        .unwrap();
        let resp = ActivationResponse::from_body(&body).unwrap();
        assert_eq!(resp.state, TransactionState::EulaRequired);
        assert_eq!(resp.eula.as_deref(), Some("You agree."));
        assert_eq!(resp.license, None);
    }

    #[test]
    fn decodes_fault() {
        let body = parse_body(
            r#"<E:Envelope xmlns:E="http://schemas.xmlsoap.org/soap/envelope/"><E:Body>
                <r><state>FAULT_RETURNED</state>
                <fault><faultNumber>51092</faultNumber><faultText>Registration key already in use</faultText></fault></r>
              </E:Body></E:Envelope>"#,
        )
        .unwrap();
        let resp = ActivationResponse::from_body(&body).unwrap();
        assert_eq!(resp.state, TransactionState::FaultReturned);
        let fault = resp.fault.unwrap();
        assert_eq!(fault.number.as_deref(), Some("51092"));
        assert_eq!(fault.text, "Registration key already in use");
    }

    #[test]
    fn unknown_state_is_preserved() {
        assert_eq!(
            TransactionState::parse("SOMETHING_NEW"),
            TransactionState::Unknown("SOMETHING_NEW".into())
        );
    }
}
