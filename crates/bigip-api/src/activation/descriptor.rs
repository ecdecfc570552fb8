// Service descriptor (WSDL) handling
//
// A caller may point the tool at an alternate WSDL. Only the service port
// address is used; operations are fixed in `models`.

use url::Url;

use crate::error::Error;
use crate::soap::XmlNode;

/// Extract the endpoint URL from a WSDL's `<soap:address location="…"/>`.
pub fn endpoint_from_descriptor(wsdl: &str) -> Result<Url, Error> {
    let document = XmlNode::parse(wsdl)?;
    let location = document
        .find("address")
        .and_then(|node| node.attribute("location"))
        .ok_or_else(|| Error::Deserialization {
            message: "service descriptor has no soap:address location".into(),
            body: wsdl.chars().take(200).collect(),
        })?;
    Url::parse(location.trim()).map_err(Error::InvalidUrl)
}
