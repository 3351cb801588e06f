use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::{anyhow, Result};
use shared::domain::Role;

use crate::{
    api::{ApiClient, DEFAULT_REQUEST_TIMEOUT},
    pagination::DEFAULT_CLIENT_PAGE_SIZE,
};

pub const SETTINGS_FILE: &str = "moderator.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub token: Option<String>,
    pub role: Role,
    pub request_timeout_secs: u64,
    pub client_page_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/".into(),
            token: None,
            role: Role::Moderator,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            client_page_size: DEFAULT_CLIENT_PAGE_SIZE,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn api_client(&self) -> Result<ApiClient> {
        let token = self
            .token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| anyhow!("missing bearer token; set MODERATOR_TOKEN or --token"))?;
        ApiClient::new(&self.base_url, token, self.request_timeout())
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then `path` if readable, then the environment.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, &file_cfg),
            Err(err) => tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable settings file"),
        }
    }

    for key in ["MODERATOR_BASE_URL", "APP__BASE_URL"] {
        if let Some(v) = env(key) {
            settings.base_url = v;
        }
    }
    for key in ["MODERATOR_TOKEN", "APP__TOKEN"] {
        if let Some(v) = env(key) {
            settings.token = Some(v);
        }
    }
    if let Some(v) = env("APP__ROLE") {
        if let Ok(role) = parse_role(&v) {
            settings.role = role;
        }
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
    if let Some(v) = env("APP__CLIENT_PAGE_SIZE") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.client_page_size = parsed.max(1);
        }
    }

    settings
}

pub fn parse_role(raw: &str) -> Result<Role> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "mod" | "moderator" => Ok(Role::Moderator),
        "admin" => Ok(Role::Admin),
        other => Err(anyhow!(
            "unknown role '{other}', expected 'moderator' or 'admin'"
        )),
    }
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    if let Some(v) = file_cfg.get("base_url").and_then(toml::Value::as_str) {
        settings.base_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("token").and_then(toml::Value::as_str) {
        settings.token = Some(v.to_string());
    }
    if let Some(role) = file_cfg
        .get("role")
        .and_then(toml::Value::as_str)
        .and_then(|v| parse_role(v).ok())
    {
        settings.role = role;
    }
    if let Some(v) = file_cfg
        .get("request_timeout_secs")
        .and_then(toml::Value::as_integer)
    {
        settings.request_timeout_secs = v.max(1) as u64;
    }
    if let Some(v) = file_cfg
        .get("client_page_size")
        .and_then(toml::Value::as_integer)
    {
        settings.client_page_size = v.clamp(1, u32::MAX as i64) as u32;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
