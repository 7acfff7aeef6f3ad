use super::{Error, Result};

/// Parses `raw` and checks that it is an absolute `http` or `https` URL.
pub fn parse_target_url(raw: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(raw).map_err(|_| Error::InvalidUrl(raw.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::UnsupportedScheme(raw.to_string()));
    }
    Ok(parsed)
}

pub(super) fn host_header_value(parsed: &url::Url) -> Option<String> {
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) if port != 80 && port != 443 => Some(format!("{host}:{port}")),
        _ => Some(host.to_string()),
    }
}
