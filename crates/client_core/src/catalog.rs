//! Built-in widget scripts, keyed by label.

use std::{collections::BTreeMap, sync::OnceLock};

use shared::{
    domain::{InteractionMode, WidgetKind, WidgetScript},
    protocol::{Command, LocalAction, MouseButton, ScrollGestureState},
};

/// Read-only registry of widget scripts. Fixed at process start.
#[derive(Debug)]
pub struct WidgetCatalog {
    scripts: BTreeMap<String, WidgetScript>,
}

impl WidgetCatalog {
    pub fn builtin() -> &'static WidgetCatalog {
        static CATALOG: OnceLock<WidgetCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| WidgetCatalog::from_scripts(builtin_scripts()))
    }

    pub fn from_scripts(scripts: impl IntoIterator<Item = WidgetScript>) -> Self {
        Self {
            scripts: scripts
                .into_iter()
                .map(|script| (script.label.clone(), script))
                .collect(),
        }
    }

    /// All scripts, sorted by label ascending.
    pub fn all_scripts(&self) -> impl Iterator<Item = &WidgetScript> {
        self.scripts.values()
    }

    /// Exact, case-sensitive lookup.
    pub fn script(&self, label: &str) -> Option<&WidgetScript> {
        self.scripts.get(label)
    }

    /// Case-insensitive label filter, in label order.
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a WidgetScript> + 'a {
        let query = query.trim().to_lowercase();
        self.scripts
            .values()
            .filter(move |script| script.label.to_lowercase().contains(&query))
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

fn script(
    kind: WidgetKind,
    label: &str,
    icon_ref: &str,
    interaction_mode: InteractionMode,
    command: Command,
) -> WidgetScript {
    WidgetScript {
        kind,
        label: label.to_string(),
        icon_ref: icon_ref.to_string(),
        interaction_mode,
        command_bindings: BTreeMap::from([(
            interaction_mode.trigger_event().to_string(),
            command,
        )]),
    }
}

fn button(label: &str, icon_ref: &str, command: Command) -> WidgetScript {
    script(
        WidgetKind::Button,
        label,
        icon_ref,
        InteractionMode::ButtonTap,
        command,
    )
}

fn key(label: &str, icon_ref: &str, key: &str) -> WidgetScript {
    button(label, icon_ref, Command::key_press(key))
}

fn hotkey(label: &str, icon_ref: &str, keys: [&str; 2]) -> WidgetScript {
    button(label, icon_ref, Command::hotkey(keys))
}

fn click(label: &str, button_kind: MouseButton) -> WidgetScript {
    button(
        label,
        "Mouse",
        Command::MouseClick {
            button: button_kind,
        },
    )
}

fn builtin_scripts() -> Vec<WidgetScript> {
    vec![
        // gesture surfaces
        script(
            WidgetKind::Surface,
            "Touchpad",
            "Mouse",
            InteractionMode::DragArea,
            Command::MouseMove { dx: 0.0, dy: 0.0 },
        ),
        script(
            WidgetKind::Surface,
            "Vertical Scroll",
            "SwapVert",
            InteractionMode::VScroll,
            Command::VScroll { dy: 0.0 },
        ),
        script(
            WidgetKind::Surface,
            "Horizontal Scroll",
            "SwapHoriz",
            InteractionMode::HScroll,
            Command::HScroll {
                state: ScrollGestureState::Drag,
                dx: 0.0,
            },
        ),
        script(
            WidgetKind::Input,
            "Text Input",
            "TextFields",
            InteractionMode::TextInput,
            Command::SendChar {
                text: String::new(),
            },
        ),
        button(
            "Brightness Down",
            "BrightnessLow",
            Command::BrightnessControl { change: -10 },
        ),
        button(
            "Brightness Up",
            "BrightnessHigh",
            Command::BrightnessControl { change: 10 },
        ),
        key("Caps Lock", "KeyboardCapslock", "capslock"),
        hotkey("Copy", "ContentCopy", ["ctrl", "c"]),
        key("Delete", "Delete", "delete"),
        hotkey("Find", "Search", ["ctrl", "f"]),
        key("Insert", "Input", "insert"),
        hotkey("Paste", "ContentPaste", ["ctrl", "v"]),
        hotkey("Select All", "SelectAll", ["ctrl", "a"]),
        button("Open Downloads", "FolderOpen", Command::OpenFolder {}),
        button(
            "Upload File",
            "UploadFile",
            Command::LocalAction {
                action: LocalAction::UploadFile,
            },
        ),
        click("Left Click", MouseButton::Left),
        click("Middle Click", MouseButton::Middle),
        click("Right Click", MouseButton::Right),
        key("Down", "ArrowDownward", "down"),
        key("End", "LastPage", "end"),
        key("Left", "ArrowBack", "left"),
        key("Page Down", "KeyboardArrowDown", "pagedown"),
        key("Page Up", "KeyboardArrowUp", "pageup"),
        key("Right", "ArrowForward", "right"),
        key("Up", "ArrowUpward", "up"),
        key("Enter", "KeyboardReturn", "enter"),
        key("Esc", "Close", "esc"),
        key("Full Screen", "FullscreenExit", "f11"),
        key("Num Lock", "Pin", "numlock"),
        key("Screenshot", "CameraAlt", "printscreen"),
        key("Scroll Lock", "SyncLock", "scrolllock"),
        hotkey("Show Desktop", "DesktopWindows", ["win", "d"]),
        key("Spacebar", "SpaceBar", "space"),
        key("Windows Key", "Window", "win"),
        hotkey("Shutdown Menu", "Power", ["alt", "f4"]),
        key("Mute", "VolumeMute", "volumemute"),
        key("Volume Down", "VolumeDown", "volumedown"),
        key("Volume Up", "VolumeUp", "volumeup"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_sorted_by_label() {
        let labels: Vec<&str> = WidgetCatalog::builtin()
            .all_scripts()
            .map(|script| script.label.as_str())
            .collect();
        let mut sorted = labels.clone();
        sorted.sort();
        assert_eq!(labels, sorted);
        assert_eq!(labels.len(), 38);
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        let catalog = WidgetCatalog::builtin();
        let copy = catalog.script("Copy").expect("copy script");
        assert_eq!(copy.binding("on_tap"), Some(&Command::hotkey(["ctrl", "c"])));
        assert!(catalog.script("copy").is_none());
        assert!(catalog.script("Cop").is_none());
    }

    #[test]
    fn search_matches_label_fragments() {
        let labels: Vec<&str> = WidgetCatalog::builtin()
            .search("volume")
            .map(|script| script.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Volume Down", "Volume Up"]);
    }

    #[test]
    fn every_script_binds_its_trigger_event() {
        for script in WidgetCatalog::builtin().all_scripts() {
            assert!(
                script
                    .binding(script.interaction_mode.trigger_event())
                    .is_some(),
                "{} has no binding for its trigger",
                script.label
            );
        }
    }
}
