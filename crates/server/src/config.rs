use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

use crate::telegram::DEFAULT_API_BASE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub state_url: String,
    pub server_public_url: Option<String>,
    pub telegram_token: Option<String>,
    pub telegram_api_base: String,
    pub storage_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "0.0.0.0:8080".into(),
            state_url: "./data/user_modes.json".into(),
            server_public_url: None,
            telegram_token: None,
            telegram_api_base: DEFAULT_API_BASE.into(),
            storage_timeout_ms: 5_000,
        }
    }
}

/// Keys accepted in `server.toml`.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    state_url: Option<String>,
    server_public_url: Option<String>,
    telegram_token: Option<String>,
    telegram_api_base: Option<String>,
    storage_timeout_ms: Option<u64>,
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string("server.toml").ok();
    resolve_settings(file.as_deref(), |key| std::env::var(key).ok())
}

/// Layers defaults, then `server.toml`, then environment variables. For each
/// setting the last variable listed wins.
pub fn resolve_settings(
    file: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.bind_addr {
                    settings.server_bind = v;
                }
                if let Some(v) = file_cfg.state_url {
                    settings.state_url = v;
                }
                if let Some(v) = file_cfg.server_public_url {
                    settings.server_public_url = Some(v);
                }
                if let Some(v) = file_cfg.telegram_token {
                    settings.telegram_token = Some(v);
                }
                if let Some(v) = file_cfg.telegram_api_base {
                    settings.telegram_api_base = v;
                }
                if let Some(v) = file_cfg.storage_timeout_ms {
                    settings.storage_timeout_ms = v;
                }
            }
            Err(error) => warn!(%error, "ignoring unreadable server.toml"),
        }
    }

    let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(port) = env("PORT") {
        settings.server_bind = format!("0.0.0.0:{}", port.trim());
    }
    for key in ["SERVER_BIND", "APP__BIND_ADDR"] {
        if let Some(v) = env(key) {
            settings.server_bind = v;
        }
    }

    for key in ["STATE_URL", "APP__STATE_URL"] {
        if let Some(v) = env(key) {
            settings.state_url = v;
        }
    }

    for key in ["TOKEN", "TELEGRAM_TOKEN", "APP__TELEGRAM_TOKEN"] {
        if let Some(v) = env(key) {
            settings.telegram_token = Some(v);
        }
    }

    for key in ["RAILWAY_URL", "SERVER_PUBLIC_URL", "APP__SERVER_PUBLIC_URL"] {
        if let Some(v) = env(key) {
            settings.server_public_url = Some(v);
        }
    }

    if let Some(v) = env("APP__TELEGRAM_API_BASE") {
        settings.telegram_api_base = v;
    }

    if let Some(v) = env("APP__STORAGE_TIMEOUT_MS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) if parsed > 0 => settings.storage_timeout_ms = parsed,
            _ => warn!(value = %v, "ignoring invalid APP__STORAGE_TIMEOUT_MS"),
        }
    }

    settings
}

pub fn prepare_state_url(raw_state_url: &str) -> anyhow::Result<String> {
    let state_url = normalize_state_url(raw_state_url);
    ensure_parent_dir_exists(&state_url)?;
    Ok(state_url)
}

fn normalize_state_url(raw_state_url: &str) -> String {
    let raw_state_url = raw_state_url.trim();

    if raw_state_url.is_empty() {
        return Settings::default().state_url;
    }

    if raw_state_url.starts_with("sqlite::memory:") || raw_state_url.starts_with("sqlite://") {
        return raw_state_url.to_string();
    }

    if let Some(path) = raw_state_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    raw_state_url.to_string()
}

fn ensure_parent_dir_exists(state_url: &str) -> anyhow::Result<()> {
    let Some(path) = local_path(state_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for state url '{state_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn local_path(state_url: &str) -> Option<PathBuf> {
    if state_url.starts_with("sqlite::memory:") {
        return None;
    }

    let path = if state_url.starts_with("sqlite:") {
        state_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:")
            .split('?')
            .next()
            .unwrap_or_default()
    } else {
        state_url.strip_prefix("file://").unwrap_or(state_url)
    };

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
