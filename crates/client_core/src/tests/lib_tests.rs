use super::*;
use std::{path::Path, time::Duration};

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use shared::{codec::encode_image_payload, protocol::GENERATE_IMAGE_ROUTE};
use tokio::net::TcpListener;

async fn spawn_server(status: StatusCode, body: Value) -> String {
    let app = Router::new().route(
        GENERATE_IMAGE_ROUTE,
        post(move |Json(_): Json<Value>| {
            let body = body.clone();
            async move { (status, Json(body)) }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn configs(server_url: String, save_folder: &Path) -> (GatewayConfig, SessionConfig) {
    (
        GatewayConfig {
            server_url,
            request_timeout: Duration::from_secs(5),
        },
        SessionConfig {
            save_folder: save_folder.to_path_buf(),
            ..SessionConfig::default()
        },
    )
}

#[tokio::test]
async fn generated_image_lands_in_transcript_and_save_folder() {
    let png = vec![0x89u8, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    let server_url = spawn_server(
        StatusCode::OK,
        json!({ "image": encode_image_payload(&png) }),
    )
    .await;
    let dir = tempfile::tempdir().expect("tempdir");
    let save_folder = dir.path().join("SaveImages");
    let (gateway, session) = configs(server_url, &save_folder);

    let controller = connect_session(gateway, session).expect("session");
    let mut events = controller.subscribe_events();
    controller
        .submit("a red circle")
        .await
        .expect("accepted")
        .await
        .expect("join");

    let transcript = controller.transcript().await;
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].image_bytes(), Some(png.as_slice()));

    let mut saved_path = None;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::ImageSaved(path) = event {
            saved_path = Some(path);
        }
    }
    let saved_path = saved_path.expect("image saved");
    assert!(saved_path.starts_with(&save_folder));
    assert_eq!(std::fs::read(&saved_path).expect("read saved"), png);
}

#[tokio::test]
async fn server_validation_error_reaches_session_events() {
    let server_url = spawn_server(
        StatusCode::BAD_REQUEST,
        json!({ "error": "Prompt is empty", "suggestion": "Type something first." }),
    )
    .await;
    let dir = tempfile::tempdir().expect("tempdir");
    let (gateway, session) = configs(server_url, dir.path());

    let controller = connect_session(gateway, session).expect("session");
    let mut events = controller.subscribe_events();
    controller
        .submit("a red circle")
        .await
        .expect("accepted")
        .await
        .expect("join");

    let mut failure = None;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::GenerationFailed(err) = event {
            failure = Some(err);
        }
    }
    assert_eq!(
        failure,
        Some(GenerationError::Validation(
            "Prompt is empty\nType something first.".into()
        ))
    );
    assert_eq!(controller.transcript().await.len(), 1);
    assert_eq!(controller.state().await, SessionState::Idle);
}

#[test]
fn connect_session_rejects_invalid_server_url() {
    let (gateway, session) = configs("not a url".into(), Path::new("."));
    assert!(connect_session(gateway, session).is_err());
}
