//! Fire-and-forget delivery of commands to the remote server.
//!
//! Each call is spawned as its own task and returns immediately. Failures are
//! logged and reported through the task's [`Delivery`]; nothing is retried.

use std::time::Duration;

use anyhow::Result;
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder};
use serde::Serialize;
use shared::{
    domain::{InteractionMode, WidgetScript},
    protocol::{
        CharacterRequest, ClickRequest, Command, KeyPressRequest, LocalAction, MediaKeyRequest,
        MouseButton, ScrollGestureState,
    },
};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::settings::{base_url_for, ClientSettings, Sensitivity};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub const ENDPOINT_SEND_CHAR: &str = "send-char";
pub const ENDPOINT_CLICK_MOUSE: &str = "click-mouse";
pub const ENDPOINT_PRESS_KEY: &str = "press-key";
pub const ENDPOINT_PRESS_MEDIA_KEY: &str = "press-media-key";
pub const ENDPOINT_PRESS_HOTKEY: &str = "press-hotkey";
pub const ENDPOINT_OPEN_FOLDER: &str = "open-folder";
pub const ENDPOINT_EXECUTE_COMMAND: &str = "execute-command";
pub const ENDPOINT_UPLOAD_FILE: &str = "upload-file";

/// Result of one dispatched request, for callers that choose to await it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered { status: u16 },
    Failed { reason: String },
    /// Local-only command; nothing was sent.
    Skipped,
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// What the user did to a widget.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetTrigger {
    Tap,
    Drag { dx: f32, dy: f32 },
    HorizontalGesture { state: ScrollGestureState, dx: f32 },
    Submit(String),
}

/// What should happen in response to a [`WidgetTrigger`].
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetAction {
    /// Send this command, with gesture deltas not yet scaled.
    Dispatch(Command),
    SendText(String),
    /// Ask the user for files and upload them.
    PickFiles,
    Unbound,
}

impl WidgetAction {
    pub fn resolve(script: &WidgetScript, trigger: WidgetTrigger) -> Self {
        match (script.interaction_mode, trigger) {
            (InteractionMode::ButtonTap, WidgetTrigger::Tap) => {
                match script.binding(script.interaction_mode.trigger_event()) {
                    Some(Command::LocalAction {
                        action: LocalAction::UploadFile,
                    }) => Self::PickFiles,
                    Some(command) => Self::Dispatch(command.clone()),
                    None => Self::Unbound,
                }
            }
            (InteractionMode::DragArea, WidgetTrigger::Drag { dx, dy }) => {
                Self::Dispatch(Command::MouseMove { dx, dy })
            }
            (InteractionMode::VScroll, WidgetTrigger::Drag { dy, .. }) => {
                Self::Dispatch(Command::VScroll { dy })
            }
            (InteractionMode::HScroll, WidgetTrigger::HorizontalGesture { state, dx }) => {
                Self::Dispatch(Command::HScroll { state, dx })
            }
            (InteractionMode::HScroll, WidgetTrigger::Drag { dx, .. }) => {
                Self::Dispatch(Command::HScroll {
                    state: ScrollGestureState::Drag,
                    dx,
                })
            }
            (InteractionMode::TextInput, WidgetTrigger::Submit(text)) if !text.is_empty() => {
                Self::SendText(text)
            }
            _ => Self::Unbound,
        }
    }
}

#[derive(Clone)]
pub struct DispatchClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
    sensitivity: Sensitivity,
}

impl DispatchClient {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        Self::with_base_url(settings.base_url(), settings.sensitivity)
    }

    /// `base_url` must end with `/`.
    pub fn with_base_url(base_url: impl Into<String>, sensitivity: Sensitivity) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            sensitivity,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_host(&mut self, host: &str) {
        self.base_url = base_url_for(host);
    }

    pub fn sensitivity(&self) -> Sensitivity {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: Sensitivity) {
        self.sensitivity = sensitivity;
    }

    pub fn send_text(&self, text: &str) -> JoinHandle<Delivery> {
        self.post_json(
            ENDPOINT_SEND_CHAR,
            &CharacterRequest {
                text: text.to_string(),
            },
        )
    }

    pub fn click_mouse(&self, button: MouseButton) -> JoinHandle<Delivery> {
        self.post_json(ENDPOINT_CLICK_MOUSE, &ClickRequest { button })
    }

    pub fn press_key(&self, key: &str) -> JoinHandle<Delivery> {
        self.post_json(
            ENDPOINT_PRESS_KEY,
            &KeyPressRequest {
                key: key.to_string(),
            },
        )
    }

    pub fn press_media_key(&self, key: &str) -> JoinHandle<Delivery> {
        self.post_json(
            ENDPOINT_PRESS_MEDIA_KEY,
            &MediaKeyRequest {
                key: key.to_string(),
            },
        )
    }

    /// `combo` is `+`-separated, e.g. `ctrl+shift+t`.
    pub fn press_hotkey(&self, combo: &str) -> JoinHandle<Delivery> {
        self.post_json(
            ENDPOINT_PRESS_HOTKEY,
            &KeyPressRequest {
                key: combo.to_string(),
            },
        )
    }

    pub fn open_folder(&self) -> JoinHandle<Delivery> {
        self.spawn_post(ENDPOINT_OPEN_FOLDER, None)
    }

    /// Sends `command` as-is to `execute-command`. Local commands are skipped.
    pub fn execute(&self, command: &Command) -> JoinHandle<Delivery> {
        if command.is_local() {
            debug!(kind = command.kind(), "not dispatching local command");
            return tokio::spawn(async { Delivery::Skipped });
        }
        self.post_json(ENDPOINT_EXECUTE_COMMAND, command)
    }

    pub fn move_pointer(&self, dx: f32, dy: f32) -> JoinHandle<Delivery> {
        self.execute(&self.scale(Command::MouseMove { dx, dy }))
    }

    pub fn scroll_vertical(&self, amount: f32) -> JoinHandle<Delivery> {
        self.execute(&self.scale(Command::VScroll { dy: amount }))
    }

    pub fn scroll_horizontal(&self, state: ScrollGestureState, dx: f32) -> JoinHandle<Delivery> {
        self.execute(&self.scale(Command::HScroll { state, dx }))
    }

    /// Carries out a resolved widget action. Returns `None` when there is
    /// nothing to send.
    pub fn perform(&self, action: WidgetAction) -> Option<JoinHandle<Delivery>> {
        match action {
            WidgetAction::Dispatch(command) => Some(self.execute(&self.scale(command))),
            WidgetAction::SendText(text) => Some(self.send_text(&text)),
            WidgetAction::PickFiles | WidgetAction::Unbound => None,
        }
    }

    /// Applies the configured sensitivity to gesture deltas.
    pub fn scale(&self, command: Command) -> Command {
        match command {
            Command::MouseMove { dx, dy } => Command::MouseMove {
                dx: dx * self.sensitivity.pointer,
                dy: dy * self.sensitivity.pointer,
            },
            Command::VScroll { dy } => Command::VScroll {
                dy: dy * self.sensitivity.vertical_scroll,
            },
            Command::HScroll { state, dx } => Command::HScroll {
                state,
                dx: dx * self.sensitivity.horizontal_scroll,
            },
            other => other,
        }
    }

    fn post_json<T: Serialize + ?Sized>(&self, endpoint: &'static str, body: &T) -> JoinHandle<Delivery> {
        match serde_json::to_vec(body) {
            Ok(body) => self.spawn_post(endpoint, Some(body)),
            Err(error) => {
                error!(endpoint, %error, "failed to encode request body");
                let reason = error.to_string();
                tokio::spawn(async move { Delivery::Failed { reason } })
            }
        }
    }

    fn spawn_post(&self, endpoint: &'static str, body: Option<Vec<u8>>) -> JoinHandle<Delivery> {
        let mut request = self.http.post(format!("{}{endpoint}", self.base_url));
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }
        tokio::spawn(deliver(endpoint, request))
    }
}

async fn deliver(endpoint: &'static str, request: RequestBuilder) -> Delivery {
    match request.send().await {
        Ok(response) if response.status().is_success() => {
            let status = response.status().as_u16();
            debug!(endpoint, status, "request delivered");
            Delivery::Delivered { status }
        }
        Ok(response) => {
            let status = response.status();
            error!(endpoint, %status, "request rejected by server");
            Delivery::Failed {
                reason: format!("server responded with {status}"),
            }
        }
        Err(error) => {
            error!(endpoint, %error, "request failed");
            Delivery::Failed {
                reason: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;
