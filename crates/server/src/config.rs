use std::fs;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub max_upload_bytes: usize,
    pub rate_limit_per_minute: u32,
    pub rate_limit_per_hour: u32,
    pub allowed_extensions: Vec<String>,
    pub static_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            max_upload_bytes: 10 * 1024 * 1024,
            rate_limit_per_minute: 10,
            rate_limit_per_hour: 100,
            allowed_extensions: ["png", "jpg", "jpeg", "webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            static_dir: "crates/web/www".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    max_upload_bytes: Option<usize>,
    rate_limit_per_minute: Option<u32>,
    rate_limit_per_hour: Option<u32>,
    allowed_extensions: Option<Vec<String>>,
    static_dir: Option<String>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let raw = fs::read_to_string("server.toml").ok();
    settings_from_sources(raw.as_deref(), |key| std::env::var(key).ok())
}

/// `server.toml` first, then the environment; later sources win.
pub(crate) fn settings_from_sources(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        let file_cfg: FileSettings = toml::from_str(raw).context("invalid server.toml")?;
        if let Some(v) = file_cfg.bind_addr {
            settings.server_bind = v;
        }
        if let Some(v) = file_cfg.max_upload_bytes {
            settings.max_upload_bytes = v;
        }
        if let Some(v) = file_cfg.rate_limit_per_minute {
            settings.rate_limit_per_minute = v;
        }
        if let Some(v) = file_cfg.rate_limit_per_hour {
            settings.rate_limit_per_hour = v;
        }
        if let Some(v) = file_cfg.allowed_extensions {
            settings.allowed_extensions = normalize_extensions(v);
        }
        if let Some(v) = file_cfg.static_dir {
            settings.static_dir = v;
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(port) = env("PORT") {
        settings.server_bind = format!("0.0.0.0:{}", port.trim());
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("APP__MAX_UPLOAD_BYTES") {
        settings.max_upload_bytes = v
            .trim()
            .parse()
            .with_context(|| format!("APP__MAX_UPLOAD_BYTES must be a byte count, got '{v}'"))?;
    }
    if let Some(v) = env("APP__RATE_LIMIT_PER_MINUTE") {
        settings.rate_limit_per_minute = v.trim().parse().with_context(|| {
            format!("APP__RATE_LIMIT_PER_MINUTE must be an integer, got '{v}'")
        })?;
    }
    if let Some(v) = env("APP__RATE_LIMIT_PER_HOUR") {
        settings.rate_limit_per_hour = v.trim().parse().with_context(|| {
            format!("APP__RATE_LIMIT_PER_HOUR must be an integer, got '{v}'")
        })?;
    }
    if let Some(v) = env("APP__ALLOWED_EXTENSIONS") {
        settings.allowed_extensions = normalize_extensions(v.split(',').map(String::from));
    }
    if let Some(v) = env("APP__STATIC_DIR") {
        settings.static_dir = v;
    }

    Ok(settings)
}

fn normalize_extensions(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    raw.into_iter()
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
