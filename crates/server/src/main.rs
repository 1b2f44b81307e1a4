use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use server_api::{
    generate_image, openai::OpenAiImageBackend, ApiContext, ImageBackend, MissingImageBackend,
    ServiceError,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{GenerateImageRequest, GenerateImageResponse, GENERATE_IMAGE_ROUTE},
};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

mod app_state;
mod config;

use app_state::AppState;
use config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let backend: Arc<dyn ImageBackend> = match settings.openai_config() {
        Some(openai) => {
            info!(model = %openai.model, api_base = %openai.api_base, "using OpenAI image backend");
            Arc::new(OpenAiImageBackend::new(openai))
        }
        None => {
            warn!("OPENAI_API_KEY is not set; every generation request will fail");
            Arc::new(MissingImageBackend)
        }
    };

    let state = AppState {
        api: ApiContext { backend },
        max_prompt_body_bytes: settings.max_prompt_body_bytes,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_prompt_body_bytes;
    Router::new()
        .route("/healthz", get(healthz))
        .route(GENERATE_IMAGE_ROUTE, post(http_generate_image))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_generate_image(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateImageRequest>, JsonRejection>,
) -> Result<Json<GenerateImageResponse>, (StatusCode, Json<ApiError>)> {
    let request_id = Uuid::new_v4();
    let Json(req) = payload.map_err(|rejection| {
        warn!(
            %request_id,
            status = %rejection.status(),
            reason = %rejection.body_text(),
            "image generation request body rejected"
        );
        rejected_body(&rejection)
    })?;
    info!(%request_id, prompt_len = req.prompt.len(), "image generation requested");

    let response = generate_image(&state.api, &req.prompt)
        .await
        .map_err(|err| {
            match &err {
                ServiceError::Backend(source) => {
                    error!(%request_id, error = ?source, "image backend failed");
                }
                other => warn!(%request_id, error = %other, "image generation rejected"),
            }
            (status_for(err.code()), Json(ApiError::from(&err)))
        })?;

    info!(%request_id, "image generation completed");
    Ok(Json(response))
}

fn rejected_body(rejection: &JsonRejection) -> (StatusCode, Json<ApiError>) {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let err = ApiError::new(ErrorCode::Validation, "prompt is too large")
            .with_suggestion("Shorten the prompt and try again.");
        return (StatusCode::PAYLOAD_TOO_LARGE, Json(err));
    }
    let err = ApiError::new(ErrorCode::Validation, "request body is not a valid prompt")
        .with_suggestion(r#"Send {"prompt": "<text>"} as application/json."#);
    (StatusCode::BAD_REQUEST, Json(err))
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation | ErrorCode::QuotaExhausted => StatusCode::BAD_REQUEST,
        ErrorCode::EmptyResult => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
