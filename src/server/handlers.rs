use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::AppState;
use crate::classify::{ArtStyleResponse, Group, MoodTheme};

/// Body shared by every model endpoint. Missing lists are treated as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassifyRequest {
    pub texts: Vec<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub models: LoadedModels,
}

#[derive(Debug, Serialize)]
pub struct LoadedModels {
    pub clip: bool,
    pub sentence: bool,
}

/// Run a classification on the blocking pool. Errors and panics both become
/// an `ApiError` for `operation`.
async fn run_blocking<T, F>(operation: &'static str, f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ApiError::failed(operation, format!("{:#}", e))),
        Err(e) => Err(ApiError::failed(operation, e)),
    }
}

pub async fn group_threshold(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<Vec<Group>>, ApiError> {
    tracing::debug!(
        texts = request.texts.len(),
        images = request.images.len(),
        "group-threshold"
    );

    let classifier = state.classifier.clone();
    let groups = run_blocking("Grouping", move || {
        classifier.group_by_threshold(&request.texts, &request.images)
    })
    .await?;

    Ok(Json(groups))
}

pub async fn classify_art_style(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ArtStyleResponse>, ApiError> {
    tracing::debug!(images = request.images.len(), "classify-art-style");

    let classifier = state.classifier.clone();
    let response = run_blocking("Art style classification", move || {
        Ok(classifier.classify_art_style(&request.images))
    })
    .await?;

    Ok(Json(response))
}

pub async fn classify_mood_theme(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<Vec<MoodTheme>>, ApiError> {
    tracing::debug!(
        texts = request.texts.len(),
        images = request.images.len(),
        "classify-mood-theme"
    );

    let classifier = state.classifier.clone();
    let results = run_blocking("Mood/theme classification", move || {
        Ok(classifier.classify_mood_theme(&request.texts, &request.images))
    })
    .await?;

    Ok(Json(results))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        models: LoadedModels {
            clip: true,
            sentence: state.sentence.is_some(),
        },
    })
}
