use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::Rejection, protocol::Command};

/// Columns of the widget grid; also the upper bound of `GridSize::width`.
pub const GRID_COLUMNS: u32 = 4;
/// Rows offered as empty slots. Placement itself has no row bound.
pub const GRID_ROWS: u32 = 8;
pub const MAX_WIDGET_HEIGHT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(pub Uuid);

impl WidgetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WidgetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    Surface,
    Input,
    Button,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    ButtonTap,
    DragArea,
    VScroll,
    HScroll,
    TextInput,
}

impl InteractionMode {
    /// Event name whose binding this mode triggers.
    pub fn trigger_event(self) -> &'static str {
        match self {
            Self::ButtonTap => "on_tap",
            Self::DragArea | Self::VScroll | Self::HScroll => "on_drag",
            Self::TextInput => "on_send",
        }
    }
}

/// Immutable behavior descriptor a widget is created from.
///
/// Field names on the wire match the profile JSON the mobile client has
/// always written, so previously saved profiles still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetScript {
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub label: String,
    #[serde(rename = "iconName")]
    pub icon_ref: String,
    #[serde(rename = "interactionType")]
    pub interaction_mode: InteractionMode,
    #[serde(rename = "commands")]
    pub command_bindings: BTreeMap<String, Command>,
}

impl WidgetScript {
    pub fn binding(&self, event: &str) -> Option<&Command> {
        self.command_bindings.get(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub row: u32,
    pub col: u32,
}

impl GridPosition {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub const UNIT: GridSize = GridSize {
        width: 1,
        height: 1,
    };

    pub fn new(width: u32, height: u32) -> Result<Self, Rejection> {
        let size = Self { width, height };
        if size.is_valid() {
            Ok(size)
        } else {
            Err(Rejection::InvalidSize { width, height })
        }
    }

    pub fn is_valid(&self) -> bool {
        (1..=GRID_COLUMNS).contains(&self.width) && (1..=MAX_WIDGET_HEIGHT).contains(&self.height)
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    #[serde(default)]
    pub id: WidgetId,
    pub position: GridPosition,
    pub size: GridSize,
    pub script: WidgetScript,
}

impl Widget {
    pub fn new(script: WidgetScript, position: GridPosition, size: GridSize) -> Self {
        Self {
            id: WidgetId::new(),
            position,
            size,
            script,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            widgets: Vec::new(),
        }
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.iter().find(|widget| widget.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_size_bounds() {
        assert!(GridSize::new(1, 1).is_ok());
        assert!(GridSize::new(4, 50).is_ok());
        assert_eq!(
            GridSize::new(0, 1),
            Err(Rejection::InvalidSize {
                width: 0,
                height: 1
            })
        );
        assert!(GridSize::new(5, 1).is_err());
        assert!(GridSize::new(1, 0).is_err());
        assert!(GridSize::new(1, 51).is_err());
    }

    #[test]
    fn profile_names_match_case_insensitively() {
        let profile = Profile::new("Editing");
        assert!(profile.has_name("editing"));
        assert!(profile.has_name("EDITING"));
        assert!(!profile.has_name("Edit"));
    }

    #[test]
    fn widget_id_serializes_as_plain_string() {
        let id = WidgetId::new();
        let value = serde_json::to_value(id).expect("serialize");
        assert_eq!(value, serde_json::Value::String(id.0.to_string()));
    }

    #[test]
    fn trigger_event_per_mode() {
        assert_eq!(InteractionMode::ButtonTap.trigger_event(), "on_tap");
        assert_eq!(InteractionMode::HScroll.trigger_event(), "on_drag");
        assert_eq!(InteractionMode::TextInput.trigger_event(), "on_send");
    }
}
