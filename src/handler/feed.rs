use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::{
    handler::{ApiJsonResult, ApiResult, AppState},
    media::{
        stream::{MjpegStream, MULTIPART_CONTENT_TYPE},
        types::DeviceId,
    },
};

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Camera Stream</title>
    <style>
        body {
            margin: 0;
            padding: 20px;
            background: #1a1a1a;
            color: white;
            font-family: Arial, sans-serif;
            display: flex;
            flex-direction: column;
            align-items: center;
        }
        h1 {
            margin-bottom: 20px;
        }
        img {
            max-width: 100%;
            border: 2px solid #333;
            border-radius: 8px;
        }
        .info {
            margin-top: 10px;
            color: #888;
        }
    </style>
</head>
<body>
    <h1>Camera Feed</h1>
    <img src="/video_feed" />
    <div class="info">Streaming from device: {device}</div>
</body>
</html>
"#;

pub fn feed_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/video_feed", get(video_feed))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    device: DeviceId,
}

async fn index(State(state): State<AppState>) -> Html<String> {
    log::info!("Index page requested");
    let device = escape_html(&state.config.device.to_string());
    Html(INDEX_HTML.replace("{device}", &device))
}

async fn video_feed(State(state): State<AppState>) -> ApiResult<Response> {
    log::info!("Video feed requested");

    let source = Arc::clone(&state.source);
    tokio::task::spawn_blocking(move || source.acquire()).await??;

    let stream = MjpegStream::spawn(
        Arc::clone(&state.source),
        Arc::clone(&state.config),
        &state.cancel,
    );
    Ok((
        [
            (header::CONTENT_TYPE, MULTIPART_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

async fn health(State(state): State<AppState>) -> ApiJsonResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok",
        device: state.config.device.clone(),
    }))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
