// ── Activation endpoint selection ──

use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use url::Url;

use crate::config::ActivationEndpoints;
use crate::error::CoreError;

/// The activation service a request goes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "url", rename_all = "lowercase")]
pub enum ActivationEndpoint {
    /// Production service, for customer registration keys.
    External(Url),
    /// Vendor-internal service, for keys with digits in their body.
    Internal(Url),
    /// Named by a caller-supplied service descriptor.
    Custom(Url),
}

impl ActivationEndpoint {
    pub fn url(&self) -> &Url {
        match self {
            Self::External(url) | Self::Internal(url) | Self::Custom(url) => url,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::External(_) => "external",
            Self::Internal(_) => "internal",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for ActivationEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url(), self.kind())
    }
}

/// Pick the endpoint for a registration key.
///
/// A key with no digit strictly between its first and last characters goes
/// to the external service; any interior digit selects the internal one.
pub fn select_endpoint(
    registration_key: &str,
    endpoints: &ActivationEndpoints,
) -> Result<ActivationEndpoint, CoreError> {
    let chars: Vec<char> = registration_key.chars().collect();
    let interior = chars.get(1..chars.len().saturating_sub(1)).unwrap_or_default();
    let internal = interior.iter().any(char::is_ascii_digit);

    let (raw, wrap): (&str, fn(Url) -> ActivationEndpoint) = if internal {
        (endpoints.internal.as_str(), ActivationEndpoint::Internal)
    } else {
        (endpoints.external.as_str(), ActivationEndpoint::External)
    };
    let url = Url::parse(raw).map_err(|e| CoreError::Config {
        message: format!("invalid activation endpoint '{raw}': {e}"),
    })?;
    Ok(wrap(url))
}

/// Where to read an alternate service descriptor (WSDL) from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceDescriptor {
    Path(PathBuf),
    Url(Url),
}

impl FromStr for ServiceDescriptor {
    type Err = Infallible;

    /// `http(s)://` locations are fetched; anything else is a local path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Url::parse(s) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self::Url(url)),
            _ => Ok(Self::Path(PathBuf::from(s))),
        }
    }
}

impl fmt::Display for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pick(key: &str) -> &'static str {
        select_endpoint(key, &ActivationEndpoints::default())
            .unwrap()
            .kind()
    }

    #[test]
    fn letters_only_body_is_external() {
        assert_eq!(pick("ABCDE-FGHIJ-KLMNO-PQRST-UVWXYZZ"), "external");
    }

    #[test]
    fn interior_digit_is_internal() {
        assert_eq!(pick("ABCDE-FGHIJ-KLM1O-PQRST-UVWXYZZ"), "internal");
    }

    #[test]
    fn edge_digits_are_ignored() {
        assert_eq!(pick("1BCDE-FGHIJ-KLMNO-PQRST-UVWXYZ9"), "external");
        assert_eq!(pick("12"), "external");
        assert_eq!(pick(""), "external");
        assert_eq!(pick("A1B"), "internal");
    }

    #[test]
    fn invalid_override_is_a_config_error() {
        let endpoints = ActivationEndpoints {
            external: "not a url".into(),
            ..ActivationEndpoints::default()
        };
        assert!(matches!(
            select_endpoint("ABC", &endpoints),
            Err(CoreError::Config { .. })
        ));
    }

    #[test]
    fn descriptor_location_kinds() {
        assert!(matches!(
            "https://example.net/svc.wsdl".parse::<ServiceDescriptor>().unwrap(),
            ServiceDescriptor::Url(_)
        ));
        assert!(matches!(
            "/tmp/svc.wsdl".parse::<ServiceDescriptor>().unwrap(),
            ServiceDescriptor::Path(_)
        ));
        assert!(matches!(
            "C:\\svc.wsdl".parse::<ServiceDescriptor>().unwrap(),
            ServiceDescriptor::Path(_)
        ));
    }
}
