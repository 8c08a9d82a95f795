use std::sync::Arc;

use super::*;
use crate::catalog::WidgetCatalog;
use anyhow::Result;
use axum::{body::Bytes, extract::State, http::StatusCode, http::Uri, Router};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(String, Option<Value>)>>>,
}

async fn record(State(state): State<Recorded>, uri: Uri, body: Bytes) -> StatusCode {
    let body = (!body.is_empty())
        .then(|| serde_json::from_slice(&body).ok())
        .flatten();
    state
        .requests
        .lock()
        .await
        .push((uri.path().to_string(), body));
    StatusCode::OK
}

async fn spawn_recording_server() -> Result<(String, Recorded)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = Recorded::default();
    let app = Router::new().fallback(record).with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/"), state))
}

fn client(base_url: &str) -> DispatchClient {
    DispatchClient::with_base_url(base_url, Sensitivity::default()).expect("client")
}

fn script(label: &str) -> &'static WidgetScript {
    WidgetCatalog::builtin().script(label).expect("builtin script")
}

#[tokio::test]
async fn simple_endpoints_send_expected_bodies() {
    let (base_url, server) = spawn_recording_server().await.expect("spawn server");
    let client = client(&base_url);

    let handles = vec![
        client.send_text("hi"),
        client.click_mouse(MouseButton::Right),
        client.press_key("enter"),
        client.press_media_key("volumeup"),
        client.press_hotkey("ctrl+shift+t"),
        client.open_folder(),
    ];
    for handle in handles {
        assert!(handle.await.expect("join").is_delivered());
    }

    let mut requests = server.requests.lock().await.clone();
    requests.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        requests,
        vec![
            ("/click-mouse".to_string(), Some(json!({"button": "right"}))),
            ("/open-folder".to_string(), None),
            ("/press-hotkey".to_string(), Some(json!({"key": "ctrl+shift+t"}))),
            ("/press-key".to_string(), Some(json!({"key": "enter"}))),
            ("/press-media-key".to_string(), Some(json!({"key": "volumeup"}))),
            ("/send-char".to_string(), Some(json!({"char": "hi"}))),
        ]
    );
}

#[tokio::test]
async fn gestures_are_scaled_by_sensitivity() {
    let (base_url, server) = spawn_recording_server().await.expect("spawn server");
    let client = client(&base_url);

    client.move_pointer(10.0, -4.0).await.expect("join");
    client.scroll_vertical(2.0).await.expect("join");
    client
        .scroll_horizontal(ScrollGestureState::Start, 3.0)
        .await
        .expect("join");

    let requests = server.requests.lock().await.clone();
    let bodies: Vec<Value> = requests
        .into_iter()
        .map(|(path, body)| {
            assert_eq!(path, "/execute-command");
            body.expect("json body")
        })
        .collect();
    assert_eq!(
        bodies,
        vec![
            json!({"type": "mouse_move", "payload": {"dx": 5.0, "dy": -2.0}}),
            json!({"type": "v_scroll", "payload": {"dy": 10.0}}),
            json!({"type": "h_scroll", "payload": {"state": "start", "dx": 15.0}}),
        ]
    );
}

#[tokio::test]
async fn updated_sensitivity_applies_to_later_gestures() {
    let (base_url, server) = spawn_recording_server().await.expect("spawn server");
    let mut client = client(&base_url);
    client.set_sensitivity(Sensitivity {
        pointer: 2.0,
        ..Sensitivity::default()
    });

    client.move_pointer(1.5, 1.0).await.expect("join");

    let requests = server.requests.lock().await.clone();
    assert_eq!(
        requests[0].1,
        Some(json!({"type": "mouse_move", "payload": {"dx": 3.0, "dy": 2.0}}))
    );
}

#[tokio::test]
async fn local_commands_never_reach_the_server() {
    let (base_url, server) = spawn_recording_server().await.expect("spawn server");
    let client = client(&base_url);

    let delivery = client
        .execute(&Command::LocalAction {
            action: LocalAction::UploadFile,
        })
        .await
        .expect("join");

    assert_eq!(delivery, Delivery::Skipped);
    assert!(server.requests.lock().await.is_empty());
}

#[tokio::test]
async fn server_errors_are_reported_as_failed() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().fallback(|| async { StatusCode::INTERNAL_SERVER_ERROR });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let delivery = client(&format!("http://{addr}/"))
        .press_key("a")
        .await
        .expect("join");
    assert!(matches!(delivery, Delivery::Failed { .. }));
}

#[tokio::test]
async fn unreachable_server_is_reported_as_failed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let delivery = client(&format!("http://{addr}/"))
        .send_text("x")
        .await
        .expect("join");
    assert!(matches!(delivery, Delivery::Failed { .. }));
}

#[test]
fn set_host_rewrites_base_url() {
    let mut client = client("http://127.0.0.1:1/");
    client.set_host(" 10.0.0.7 ");
    assert_eq!(client.base_url(), "http://10.0.0.7:8000/");
}

#[test]
fn tap_resolves_bound_command() {
    let action = WidgetAction::resolve(script("Copy"), WidgetTrigger::Tap);
    assert_eq!(
        action,
        WidgetAction::Dispatch(Command::Hotkey {
            keys: vec!["ctrl".to_string(), "c".to_string()],
        })
    );
}

#[test]
fn upload_widget_asks_for_files() {
    let action = WidgetAction::resolve(script("Upload File"), WidgetTrigger::Tap);
    assert_eq!(action, WidgetAction::PickFiles);
}

#[test]
fn gesture_widgets_use_trigger_values() {
    assert_eq!(
        WidgetAction::resolve(script("Touchpad"), WidgetTrigger::Drag { dx: 3.0, dy: 4.0 }),
        WidgetAction::Dispatch(Command::MouseMove { dx: 3.0, dy: 4.0 })
    );
    assert_eq!(
        WidgetAction::resolve(
            script("Vertical Scroll"),
            WidgetTrigger::Drag { dx: 9.0, dy: -1.0 }
        ),
        WidgetAction::Dispatch(Command::VScroll { dy: -1.0 })
    );
    assert_eq!(
        WidgetAction::resolve(
            script("Horizontal Scroll"),
            WidgetTrigger::HorizontalGesture {
                state: ScrollGestureState::End,
                dx: 0.0,
            }
        ),
        WidgetAction::Dispatch(Command::HScroll {
            state: ScrollGestureState::End,
            dx: 0.0,
        })
    );
}

#[test]
fn text_input_sends_submitted_text_only() {
    let keyboard = script("Text Input");
    assert_eq!(
        WidgetAction::resolve(keyboard, WidgetTrigger::Submit("hello".to_string())),
        WidgetAction::SendText("hello".to_string())
    );
    assert_eq!(
        WidgetAction::resolve(keyboard, WidgetTrigger::Submit(String::new())),
        WidgetAction::Unbound
    );
    assert_eq!(
        WidgetAction::resolve(keyboard, WidgetTrigger::Tap),
        WidgetAction::Unbound
    );
}

#[tokio::test]
async fn perform_scales_resolved_gestures() {
    let (base_url, server) = spawn_recording_server().await.expect("spawn server");
    let client = client(&base_url);

    let action = WidgetAction::resolve(script("Touchpad"), WidgetTrigger::Drag { dx: 2.0, dy: 2.0 });
    client
        .perform(action)
        .expect("dispatched")
        .await
        .expect("join");
    assert!(client.perform(WidgetAction::PickFiles).is_none());

    let requests = server.requests.lock().await.clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].1,
        Some(json!({"type": "mouse_move", "payload": {"dx": 1.0, "dy": 1.0}}))
    );
}
