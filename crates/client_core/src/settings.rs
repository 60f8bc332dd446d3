use anyhow::{anyhow, Context, Result};
use shared::protocol::remove_route;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/remove";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub endpoint_url: Url,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint_url: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid url"),
        }
    }
}

impl ClientSettings {
    pub fn with_endpoint(raw: &str) -> Result<Self> {
        Ok(Self {
            endpoint_url: parse_endpoint(raw)?,
        })
    }
}

pub fn load_client_settings() -> Result<ClientSettings> {
    settings_from_lookup(|key| std::env::var(key).ok())
}

/// Later keys win: `UPLOADER_ENDPOINT`, then `APP__ENDPOINT_URL`.
pub fn settings_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<ClientSettings> {
    let mut settings = ClientSettings::default();
    for key in ["UPLOADER_ENDPOINT", "APP__ENDPOINT_URL"] {
        if let Some(raw) = lookup(key) {
            settings.endpoint_url =
                parse_endpoint(&raw).with_context(|| format!("invalid {key}"))?;
        }
    }
    Ok(settings)
}

/// Accepts a full endpoint or a bare server origin; the latter gets the `/remove` route.
pub fn parse_endpoint(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let mut url = Url::parse(raw).with_context(|| format!("endpoint '{raw}' is not a url"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!(
            "endpoint '{raw}' must use http or https, got '{}'",
            url.scheme()
        ));
    }
    if url.path().is_empty() || url.path() == "/" {
        url.set_path(remove_route());
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn bare_origin_gets_remove_route() {
        let url = parse_endpoint("http://localhost:5000").expect("url");
        assert_eq!(url.as_str(), "http://localhost:5000/remove");
    }

    #[test]
    fn explicit_path_is_kept() {
        let url = parse_endpoint(" https://api.example.com/v2/remove ").expect("url");
        assert_eq!(url.as_str(), "https://api.example.com/v2/remove");
    }

    #[test]
    fn rejects_non_http_schemes_and_garbage() {
        assert!(parse_endpoint("ftp://example.com/remove").is_err());
        assert!(parse_endpoint("not a url").is_err());
    }

    #[test]
    fn env_lookup_overrides_default_in_order() {
        let env = HashMap::from([
            ("UPLOADER_ENDPOINT", "http://first:1"),
            ("APP__ENDPOINT_URL", "http://second:2/custom"),
        ]);
        let settings =
            settings_from_lookup(|key| env.get(key).map(|v| v.to_string())).expect("settings");
        assert_eq!(settings.endpoint_url.as_str(), "http://second:2/custom");

        let defaults = settings_from_lookup(|_| None).expect("settings");
        assert_eq!(defaults, ClientSettings::default());
    }

    #[test]
    fn invalid_env_value_is_reported_with_key() {
        let err = settings_from_lookup(|key| {
            (key == "UPLOADER_ENDPOINT").then(|| "mailto:x@y".to_string())
        })
        .expect_err("should fail");
        assert!(err.to_string().contains("UPLOADER_ENDPOINT"));
    }
}
