#![cfg(feature = "pmoserver")]

mod common;

use axum::body::{to_bytes, Body, HttpBody};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::{jukebox_with, library, queued};
use pmojukebox::api::jukebox_api_router;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test(start_paused = true)]
async fn test_state_endpoint() {
    let (jukebox, _store) = queued(&["t1", "t2"], 5000).await;
    let router = jukebox_api_router(jukebox);

    let (status, body) = call(&router, Method::GET, "/state", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentTrackId"], "t1");
    assert_eq!(body["playlist"].as_array().unwrap().len(), 2);
    assert_eq!(body["playMode"], "REPEAT_ALL");
}

#[tokio::test(start_paused = true)]
async fn test_commands_answer_accepted() {
    let (jukebox, _store) = jukebox_with(library(3, 5000)).await;
    let router = jukebox_api_router(jukebox.clone());

    let (status, _) = call(&router, Method::POST, "/playlist", Some(json!({"trackId": "t1"}))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let (status, _) = call(&router, Method::POST, "/playlist", Some(json!({"trackId": "t2"}))).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, _) = call(&router, Method::POST, "/next", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(
        jukebox.snapshot().await.current_track_id.as_deref(),
        Some("t2")
    );

    let (status, _) = call(&router, Method::POST, "/seek", Some(json!({"positionMs": 999999}))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(jukebox.snapshot().await.progress_ms, 5000);

    let (status, _) = call(&router, Method::POST, "/pause", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(!jukebox.snapshot().await.is_playing);

    let (status, _) = call(&router, Method::POST, "/mode", Some(json!({"playMode": "SHUFFLE"}))).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, _) = call(
        &router,
        Method::POST,
        "/playlist/reorder",
        Some(json!({"trackId": "t2", "newIndex": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let state = jukebox.snapshot().await;
    assert_eq!(state.current_index, 0);
    assert_eq!(state.play_mode, pmojukebox::PlayMode::Shuffle);

    let (status, _) = call(&router, Method::DELETE, "/playlist/t1", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(jukebox.snapshot().await.playlist.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_errors_are_mapped() {
    let (jukebox, _store) = jukebox_with(library(2, 5000)).await;
    let router = jukebox_api_router(jukebox);

    let (status, body) = call(&router, Method::POST, "/seek", Some(json!({"positionMs": 10}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "INVALID_STATE");

    let (status, body) = call(&router, Method::POST, "/playlist", Some(json!({"trackId": "nope"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "TRACK_NOT_FOUND");

    let (status, body) = call(&router, Method::POST, "/play-track", Some(json!({"trackId": "t1"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_IN_PLAYLIST");

    let (status, body) = call(
        &router,
        Method::POST,
        "/playlist/reorder",
        Some(json!({"trackId": "t1", "newIndex": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "OUT_OF_RANGE");
    assert!(body["message"].as_str().unwrap().contains('5'));
}

#[tokio::test(start_paused = true)]
async fn test_library_endpoints() {
    let (jukebox, _store) = jukebox_with(Vec::new()).await;
    let router = jukebox_api_router(jukebox);

    let (status, _) = call(
        &router,
        Method::POST,
        "/library",
        Some(json!({"id": "k1", "title": "Kind of Blue", "durationMs": 1000})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, body) = call(&router, Method::GET, "/library", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "k1");
    assert_eq!(body[0]["artist"], "");

    let (status, _) = call(&router, Method::POST, "/library", Some(json!({"id": " ", "title": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&router, Method::DELETE, "/library/k1", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let (status, _) = call(&router, Method::DELETE, "/library/k1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn test_events_stream_starts_with_current_state() {
    let (jukebox, _store) = queued(&["t1", "t2"], 5000).await;
    let router = jukebox_api_router(jukebox);

    let response = router
        .oneshot(Request::builder().uri("/events").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body();
    let frame = std::future::poll_fn(|cx| std::pin::Pin::new(&mut body).poll_frame(cx))
        .await
        .unwrap()
        .unwrap();
    let chunk = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();

    assert!(chunk.contains("event: state\n"), "chunk = {chunk}");
    assert!(chunk.contains("\"currentTrackId\":\"t1\""));
}
