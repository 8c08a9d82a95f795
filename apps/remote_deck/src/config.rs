use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "remote_deck.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    /// Overrides the stored device address for this run only.
    pub device_ip: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            device_ip: None,
        }
    }
}

pub fn load_settings(config_path: Option<&Path>) -> Settings {
    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let raw = fs::read_to_string(path).ok();
    apply_sources(raw.as_deref(), |key| std::env::var(key).ok())
}

fn apply_sources(raw_file: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = raw_file {
        match toml::from_str::<HashMap<String, String>>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("database_url") {
                    settings.database_url = v.clone();
                }
                if let Some(v) = file_cfg.get("device_ip") {
                    settings.device_ip = Some(v.clone());
                }
            }
            Err(error) => warn!(%error, "ignoring unreadable config file"),
        }
    }

    if let Some(v) = env("REMOTE_DECK__DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("REMOTE_DECK__DEVICE_IP") {
        settings.device_ip = Some(v);
    }

    settings.database_url = normalize_database_url(&settings.database_url);
    settings.device_ip = settings
        .device_ip
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty());
    settings
}

fn default_database_url() -> String {
    let path = dirs::data_local_dir()
        .map(|dir| dir.join("remote_deck").join("remote_deck.db"))
        .unwrap_or_else(|| PathBuf::from("./data/remote_deck.db"));
    format!("sqlite://{}", path.display().to_string().replace('\\', "/"))
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return default_database_url();
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}
