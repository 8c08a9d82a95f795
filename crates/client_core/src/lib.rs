use std::sync::Arc;

use anyhow::Result;
use shared::{domain::WidgetId, error::Rejection};
use storage::SettingsStore;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub mod catalog;
pub mod discovery;
pub mod dispatch;
pub mod grid;
pub mod profiles;
pub mod settings;
pub mod upload;

pub use catalog::WidgetCatalog;
pub use discovery::{local_subnet_prefix, DeviceScanner, DiscoveredDevice};
pub use dispatch::{Delivery, DispatchClient, WidgetAction, WidgetTrigger};
pub use profiles::ProfileStore;
pub use settings::{ClientSettings, Sensitivity, SensitivityKind};
pub use upload::{UploadObserver, UploadSummary};

/// What happened when a widget was triggered.
#[derive(Debug)]
pub enum TriggerOutcome {
    Sent(JoinHandle<Delivery>),
    /// The widget wants files; the caller picks them and calls
    /// [`DispatchClient::upload_files`].
    PickFiles,
    Ignored,
}

/// Profiles, settings, and the dispatch client for one device, kept in step
/// with each other.
pub struct RemoteDeck {
    store: Arc<dyn SettingsStore>,
    settings: ClientSettings,
    profiles: ProfileStore,
    dispatch: DispatchClient,
}

impl RemoteDeck {
    pub async fn open(store: Arc<dyn SettingsStore>) -> Result<Self> {
        let settings = ClientSettings::load(&store).await?;
        let profiles = ProfileStore::load(store.clone(), WidgetCatalog::builtin()).await;
        let dispatch = DispatchClient::new(&settings)?;
        info!(
            device_ip = %settings.device_ip,
            active_profile = %profiles.active_name(),
            "remote deck ready"
        );
        Ok(Self {
            store,
            settings,
            profiles,
            dispatch,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    pub fn profiles_mut(&mut self) -> &mut ProfileStore {
        &mut self.profiles
    }

    pub fn dispatch(&self) -> &DispatchClient {
        &self.dispatch
    }

    pub async fn set_device_ip(&mut self, ip: &str) -> Result<()> {
        self.settings.set_device_ip(&self.store, ip).await?;
        self.dispatch.set_host(&self.settings.device_ip);
        info!(device_ip = %self.settings.device_ip, "device address updated");
        Ok(())
    }

    /// Points this session at `ip` without persisting it.
    pub fn retarget(&mut self, ip: &str) {
        self.settings.device_ip = ip.trim().to_string();
        self.dispatch.set_host(&self.settings.device_ip);
        debug!(device_ip = %self.settings.device_ip, "device address overridden");
    }

    pub async fn set_sensitivity(&mut self, kind: SensitivityKind, value: f32) -> Result<()> {
        self.settings
            .set_sensitivity(&self.store, kind, value)
            .await?;
        self.dispatch.set_sensitivity(self.settings.sensitivity);
        Ok(())
    }

    /// Runs a widget of the active profile. Widgets do nothing while the
    /// layout is being edited.
    pub fn trigger(
        &self,
        widget_id: WidgetId,
        trigger: WidgetTrigger,
    ) -> Result<TriggerOutcome, Rejection> {
        let widget = self
            .profiles
            .active_profile()
            .widget(widget_id)
            .ok_or(Rejection::UnknownWidget(widget_id))?;
        if self.profiles.edit_mode() {
            debug!(widget_id = %widget_id, "ignoring trigger in edit mode");
            return Ok(TriggerOutcome::Ignored);
        }

        let action = WidgetAction::resolve(&widget.script, trigger);
        debug!(label = %widget.script.label, ?action, "widget triggered");
        Ok(match action {
            WidgetAction::PickFiles => TriggerOutcome::PickFiles,
            action => match self.dispatch.perform(action) {
                Some(handle) => TriggerOutcome::Sent(handle),
                None => TriggerOutcome::Ignored,
            },
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
