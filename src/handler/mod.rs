use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tokio_util::sync::CancellationToken;

use crate::media::{source::FrameSource, types::StreamConfig};

pub mod feed;

pub type ApiResult<T> = Result<T, ApiError>;
pub type ApiJsonResult<T> = ApiResult<Json<T>>;

pub struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::error!("ApiError: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Camera stream unavailable: {}", self.0),
        )
            .into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Shared by every request: the immutable config, the camera, and the shutdown token.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<StreamConfig>,
    pub source: Arc<FrameSource>,
    pub cancel: CancellationToken,
}

impl AppState {
    pub fn new(config: Arc<StreamConfig>, source: Arc<FrameSource>, cancel: CancellationToken) -> Self {
        Self {
            config,
            source,
            cancel,
        }
    }
}
