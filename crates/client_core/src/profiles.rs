//! Named widget layouts and the active-profile selection.
//!
//! Every accepted mutation is written through to the settings store before the
//! call returns. Rejected operations leave both memory and storage untouched
//! and are reported as a [`Rejection`] so the caller may show feedback or
//! ignore it.

use std::sync::Arc;

use shared::{
    domain::{GridPosition, GridSize, Profile, Widget, WidgetId, WidgetScript},
    error::Rejection,
};
use storage::SettingsStore;
use tracing::{debug, error, info, warn};

use crate::{catalog::WidgetCatalog, grid};

pub const KEY_PROFILES: &str = "remote_profiles";
pub const KEY_ACTIVE_PROFILE_NAME: &str = "active_profile_name";
pub const KEY_PROFILES_BACKUP: &str = "remote_profiles_unreadable";

pub struct ProfileStore {
    store: Arc<dyn SettingsStore>,
    catalog: &'static WidgetCatalog,
    profiles: Vec<Profile>,
    active: String,
    edit_mode: bool,
}

impl ProfileStore {
    /// Restores profiles from `store`, seeding the default layouts when none
    /// are stored.
    ///
    /// Stored entries that break the layout rules are dropped with a warning.
    /// A record that cannot be decoded at all is copied to
    /// [`KEY_PROFILES_BACKUP`] before the defaults replace it; if that copy
    /// fails, the defaults are used in memory only.
    pub async fn load(store: Arc<dyn SettingsStore>, catalog: &'static WidgetCatalog) -> Self {
        let (profiles, persist_defaults) = match store.get(KEY_PROFILES).await {
            Ok(None) => (default_profiles(catalog), true),
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Profile>>(&raw) {
                Ok(decoded) => {
                    let profiles = sanitize(decoded);
                    if profiles.is_empty() {
                        (default_profiles(catalog), true)
                    } else {
                        (profiles, false)
                    }
                }
                Err(error) => {
                    warn!(%error, "stored profiles are unreadable; starting from defaults");
                    let backed_up = match store.put(KEY_PROFILES_BACKUP, &raw).await {
                        Ok(()) => {
                            info!(key = KEY_PROFILES_BACKUP, "kept a copy of the unreadable profiles");
                            true
                        }
                        Err(error) => {
                            error!(%error, "failed to back up unreadable profiles; not overwriting them");
                            false
                        }
                    };
                    (default_profiles(catalog), backed_up)
                }
            },
            Err(error) => {
                error!(%error, "failed to read stored profiles");
                (default_profiles(catalog), false)
            }
        };

        let stored_active = match store.get(KEY_ACTIVE_PROFILE_NAME).await {
            Ok(name) => name,
            Err(error) => {
                error!(%error, "failed to read active profile name");
                None
            }
        };
        let active = stored_active
            .filter(|name| profiles.iter().any(|profile| profile.name == *name))
            .or_else(|| profiles.first().map(|profile| profile.name.clone()))
            .unwrap_or_default();

        let this = Self {
            store,
            catalog,
            profiles,
            active,
            edit_mode: false,
        };
        if persist_defaults {
            info!(count = this.profiles.len(), "seeded default profiles");
            this.save_profiles().await;
        }
        this.save_active().await;
        this
    }

    pub fn catalog(&self) -> &'static WidgetCatalog {
        self.catalog
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn active_name(&self) -> &str {
        &self.active
    }

    pub fn active_profile(&self) -> &Profile {
        let index = self
            .profiles
            .iter()
            .position(|profile| profile.name == self.active)
            .unwrap_or(0);
        &self.profiles[index]
    }

    /// Exact match first, then case-insensitive.
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.index_of(name).map(|index| &self.profiles[index])
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn toggle_edit_mode(&mut self) -> bool {
        self.edit_mode = !self.edit_mode;
        self.edit_mode
    }

    pub async fn create_profile(&mut self, name: &str) -> Result<(), Rejection> {
        let name = name.trim();
        if name.is_empty() {
            debug!("ignoring blank profile name");
            return Err(Rejection::BlankProfileName);
        }
        if let Some(existing) = self.profiles.iter().find(|profile| profile.has_name(name)) {
            debug!(name, existing = %existing.name, "ignoring duplicate profile name");
            return Err(Rejection::DuplicateProfile(existing.name.clone()));
        }

        self.profiles.push(Profile::new(name));
        self.activate(name.to_string()).await;
        self.save_profiles().await;
        info!(name, "profile created");
        Ok(())
    }

    pub async fn delete_profile(&mut self, name: &str) -> Result<Profile, Rejection> {
        if self.profiles.len() <= 1 {
            debug!(name, "refusing to delete the last profile");
            return Err(Rejection::LastProfile);
        }
        let index = self
            .index_of(name)
            .ok_or_else(|| Rejection::UnknownProfile(name.to_string()))?;

        let removed = self.profiles.remove(index);
        if removed.name == self.active {
            let fallback = self.profiles[0].name.clone();
            self.activate(fallback).await;
        }
        self.save_profiles().await;
        info!(name = %removed.name, active = %self.active, "profile deleted");
        Ok(removed)
    }

    /// Switches the active profile. Leaves edit mode as a side effect.
    pub async fn set_active(&mut self, name: &str) -> Result<(), Rejection> {
        let index = self
            .index_of(name)
            .ok_or_else(|| Rejection::UnknownProfile(name.to_string()))?;
        let name = self.profiles[index].name.clone();
        self.activate(name).await;
        Ok(())
    }

    pub async fn add_widget(
        &mut self,
        profile: &str,
        script: &WidgetScript,
        position: GridPosition,
        size: GridSize,
    ) -> Result<WidgetId, Rejection> {
        let index = self
            .index_of(profile)
            .ok_or_else(|| Rejection::UnknownProfile(profile.to_string()))?;
        let id = grid::place(&mut self.profiles[index], script, position, size)?;
        self.save_profiles().await;
        Ok(id)
    }

    /// Places the catalog script `label`, using its default size when `size`
    /// is not given.
    pub async fn add_catalog_widget(
        &mut self,
        profile: &str,
        label: &str,
        position: GridPosition,
        size: Option<GridSize>,
    ) -> Result<WidgetId, Rejection> {
        let script = self
            .catalog
            .script(label)
            .ok_or_else(|| Rejection::UnknownScript(label.to_string()))?;
        let size = size
            .or_else(|| grid::default_size(script.interaction_mode))
            .unwrap_or(GridSize::UNIT);
        self.add_widget(profile, script, position, size).await
    }

    pub async fn delete_widget(
        &mut self,
        profile: &str,
        widget_id: WidgetId,
    ) -> Result<Widget, Rejection> {
        let index = self
            .index_of(profile)
            .ok_or_else(|| Rejection::UnknownProfile(profile.to_string()))?;
        let widgets = &mut self.profiles[index].widgets;
        let position = widgets
            .iter()
            .position(|widget| widget.id == widget_id)
            .ok_or(Rejection::UnknownWidget(widget_id))?;

        let removed = widgets.remove(position);
        self.save_profiles().await;
        debug!(profile, widget_id = %widget_id, label = %removed.script.label, "widget deleted");
        Ok(removed)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.profiles
            .iter()
            .position(|profile| profile.name == name)
            .or_else(|| self.profiles.iter().position(|profile| profile.has_name(name)))
    }

    async fn activate(&mut self, name: String) {
        self.edit_mode = false;
        self.active = name;
        self.save_active().await;
    }

    async fn save_profiles(&self) {
        let encoded = match serde_json::to_string(&self.profiles) {
            Ok(encoded) => encoded,
            Err(error) => {
                error!(%error, "failed to encode profiles");
                return;
            }
        };
        if let Err(error) = self.store.put(KEY_PROFILES, &encoded).await {
            error!(%error, "failed to persist profiles");
        }
    }

    async fn save_active(&self) {
        if let Err(error) = self.store.put(KEY_ACTIVE_PROFILE_NAME, &self.active).await {
            error!(%error, active = %self.active, "failed to persist active profile name");
        }
    }
}

/// The "Editing" and "Navigation" layouts a fresh install starts with.
pub fn default_profiles(catalog: &WidgetCatalog) -> Vec<Profile> {
    let layouts: [(&str, &[(&str, u32, u32, u32, u32)]); 2] = [
        (
            "Editing",
            &[
                ("Copy", 0, 0, 1, 1),
                ("Paste", 0, 1, 1, 1),
                ("Select All", 0, 2, 1, 1),
            ],
        ),
        (
            "Navigation",
            &[
                ("Up", 0, 1, 1, 1),
                ("Left", 1, 0, 1, 1),
                ("Down", 1, 1, 1, 1),
                ("Touchpad", 2, 0, 4, 2),
            ],
        ),
    ];

    layouts
        .iter()
        .map(|(name, widgets)| {
            let mut profile = Profile::new(*name);
            for &(label, row, col, width, height) in widgets.iter() {
                let Some(script) = catalog.script(label) else {
                    warn!(label, "default layout references a missing script");
                    continue;
                };
                let size = GridSize { width, height };
                if let Err(rejection) =
                    grid::place(&mut profile, script, GridPosition::new(row, col), size)
                {
                    warn!(profile = %name, label, %rejection, "default layout widget not placed");
                }
            }
            profile
        })
        .collect()
}

/// Drops stored entries that break the layout rules: blank or repeated
/// profile names, out-of-range sizes, and widgets overlapping an earlier one.
fn sanitize(stored: Vec<Profile>) -> Vec<Profile> {
    let mut kept: Vec<Profile> = Vec::with_capacity(stored.len());
    for profile in stored {
        if profile.name.trim().is_empty() {
            warn!("dropping stored profile with a blank name");
            continue;
        }
        if kept.iter().any(|existing| existing.has_name(&profile.name)) {
            warn!(name = %profile.name, "dropping stored profile with a duplicate name");
            continue;
        }

        let mut clean = Profile::new(profile.name);
        for widget in profile.widgets {
            if !widget.size.is_valid() {
                warn!(
                    profile = %clean.name,
                    label = %widget.script.label,
                    size = %widget.size,
                    "dropping stored widget with an out-of-range size"
                );
                continue;
            }
            if let Some(existing) = grid::find_collision(&clean.widgets, widget.position, widget.size) {
                warn!(
                    profile = %clean.name,
                    label = %widget.script.label,
                    position = %widget.position,
                    existing = %existing.id,
                    "dropping stored widget that overlaps another"
                );
                continue;
            }
            clean.widgets.push(widget);
        }
        kept.push(clean);
    }
    kept
}

#[cfg(test)]
#[path = "tests/profiles_tests.rs"]
mod tests;
