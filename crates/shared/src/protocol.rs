use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

/// Value of `IdentifyResponse::app` reported by a compatible server.
pub const SERVER_APP_NAME: &str = "RemoteControlServer";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Middle => "middle",
            Self::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScrollGestureState {
    Start,
    #[default]
    Drag,
    End,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LocalAction {
    UploadFile,
}

/// A remote action. Serializes to `{"type": <kind>, "payload": {...}}`, the
/// body the server's `execute-command` endpoint expects.
///
/// Gesture variants default their numeric fields so that widget scripts can
/// carry them as templates with an empty payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Command {
    KeyPress {
        key: String,
    },
    Hotkey {
        keys: Vec<String>,
    },
    MouseClick {
        button: MouseButton,
    },
    MouseMove {
        #[serde(default)]
        dx: f32,
        #[serde(default)]
        dy: f32,
    },
    VScroll {
        #[serde(default)]
        dy: f32,
    },
    HScroll {
        #[serde(default)]
        state: ScrollGestureState,
        #[serde(default)]
        dx: f32,
    },
    BrightnessControl {
        #[serde(deserialize_with = "whole_number")]
        change: i32,
    },
    OpenFolder {},
    SendChar {
        #[serde(default, rename = "char")]
        text: String,
    },
    LocalAction {
        action: LocalAction,
    },
}

impl Command {
    pub fn key_press(key: impl Into<String>) -> Self {
        Self::KeyPress { key: key.into() }
    }

    pub fn hotkey<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Hotkey {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Wire tag of this command.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::KeyPress { .. } => "key_press",
            Self::Hotkey { .. } => "hotkey",
            Self::MouseClick { .. } => "mouse_click",
            Self::MouseMove { .. } => "mouse_move",
            Self::VScroll { .. } => "v_scroll",
            Self::HScroll { .. } => "h_scroll",
            Self::BrightnessControl { .. } => "brightness_control",
            Self::OpenFolder {} => "open_folder",
            Self::SendChar { .. } => "send_char",
            Self::LocalAction { .. } => "local_action",
        }
    }

    /// Local actions are handled on the client and never sent to the server.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::LocalAction { .. })
    }
}

/// Accepts `10` as well as `10.0`; clients that round-trip payloads through a
/// generic map store every number as a double.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return Err(D::Error::custom(format!("expected a whole number, got {value}")));
    }
    Ok(value as i32)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharacterRequest {
    #[serde(rename = "char")]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClickRequest {
    pub button: MouseButton,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyPressRequest {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaKeyRequest {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentifyResponse {
    pub app: String,
    pub hostname: String,
}

impl IdentifyResponse {
    pub fn is_remote_control_server(&self) -> bool {
        self.app == SERVER_APP_NAME
    }
}
