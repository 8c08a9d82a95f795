//! Connection target and gesture sensitivities, persisted in the settings store.

use std::sync::Arc;

use anyhow::Result;
use storage::SettingsStore;
use tracing::warn;

pub const KEY_DEVICE_IP: &str = "device_ip";
pub const KEY_POINTER_SENSITIVITY: &str = "pointer_sensitivity";
pub const KEY_VERTICAL_SCROLL_SENSITIVITY: &str = "vertical_scroll_sensitivity";
pub const KEY_HORIZONTAL_SCROLL_SENSITIVITY: &str = "horizontal_scroll_sensitivity";

pub const DEFAULT_DEVICE_IP: &str = "192.168.1.100";
pub const SERVER_PORT: u16 = 8000;

/// Multipliers applied to raw gesture deltas before they are sent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensitivity {
    pub pointer: f32,
    pub vertical_scroll: f32,
    pub horizontal_scroll: f32,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self {
            pointer: 0.5,
            vertical_scroll: 5.0,
            horizontal_scroll: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensitivityKind {
    Pointer,
    VerticalScroll,
    HorizontalScroll,
}

impl SensitivityKind {
    fn key(self) -> &'static str {
        match self {
            Self::Pointer => KEY_POINTER_SENSITIVITY,
            Self::VerticalScroll => KEY_VERTICAL_SCROLL_SENSITIVITY,
            Self::HorizontalScroll => KEY_HORIZONTAL_SCROLL_SENSITIVITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub device_ip: String,
    pub sensitivity: Sensitivity,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            device_ip: DEFAULT_DEVICE_IP.to_string(),
            sensitivity: Sensitivity::default(),
        }
    }
}

impl ClientSettings {
    /// Reads every setting, falling back to defaults for missing or
    /// unparsable values.
    pub async fn load(store: &Arc<dyn SettingsStore>) -> Result<Self> {
        let defaults = Self::default();
        let device_ip = store
            .get(KEY_DEVICE_IP)
            .await?
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty())
            .unwrap_or(defaults.device_ip);

        Ok(Self {
            device_ip,
            sensitivity: Sensitivity {
                pointer: load_f32(store, KEY_POINTER_SENSITIVITY, defaults.sensitivity.pointer)
                    .await?,
                vertical_scroll: load_f32(
                    store,
                    KEY_VERTICAL_SCROLL_SENSITIVITY,
                    defaults.sensitivity.vertical_scroll,
                )
                .await?,
                horizontal_scroll: load_f32(
                    store,
                    KEY_HORIZONTAL_SCROLL_SENSITIVITY,
                    defaults.sensitivity.horizontal_scroll,
                )
                .await?,
            },
        })
    }

    pub fn base_url(&self) -> String {
        base_url_for(&self.device_ip)
    }

    pub async fn set_device_ip(&mut self, store: &Arc<dyn SettingsStore>, ip: &str) -> Result<()> {
        let ip = ip.trim();
        store.put(KEY_DEVICE_IP, ip).await?;
        self.device_ip = ip.to_string();
        Ok(())
    }

    pub async fn set_sensitivity(
        &mut self,
        store: &Arc<dyn SettingsStore>,
        kind: SensitivityKind,
        value: f32,
    ) -> Result<()> {
        store.put(kind.key(), &value.to_string()).await?;
        match kind {
            SensitivityKind::Pointer => self.sensitivity.pointer = value,
            SensitivityKind::VerticalScroll => self.sensitivity.vertical_scroll = value,
            SensitivityKind::HorizontalScroll => self.sensitivity.horizontal_scroll = value,
        }
        Ok(())
    }
}

pub fn base_url_for(host: &str) -> String {
    format!("http://{}:{SERVER_PORT}/", host.trim())
}

async fn load_f32(store: &Arc<dyn SettingsStore>, key: &str, default: f32) -> Result<f32> {
    let Some(raw) = store.get(key).await? else {
        return Ok(default);
    };
    match raw.trim().parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => {
            warn!(key, value = %raw, "ignoring unparsable sensitivity");
            Ok(default)
        }
    }
}
