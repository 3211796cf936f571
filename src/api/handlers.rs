//! HTTP handlers for `/embed`, `/compare` and `/health`.
//!
//! Each handler checks model availability first, then validates the body,
//! then runs inference on a blocking thread.
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use tracing::debug;

use super::errors::ApiError;
use super::server::ApiContext;
use super::types::{
    CompareRequest, CompareResponse, EmbedRequest, EmbedResponse, HealthResponse,
};
use crate::embedder::{Embedder, EmbedderError};
use crate::similarity;

// ── Helpers ──────────────────────────────────────────────────────────

fn loaded_model(ctx: &ApiContext) -> Result<Arc<dyn Embedder>, ApiError> {
    ctx.model.embedder().ok_or(ApiError::ModelNotLoaded)
}

/// Run CPU-bound inference off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, EmbedderError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Computation(format!("embedding task failed: {e}")))?
        .map_err(ApiError::from)
}

// ── Handlers ─────────────────────────────────────────────────────────

/// `POST /embed`: embedding of a single text.
pub async fn embed(
    State(ctx): State<ApiContext>,
    payload: Result<Json<EmbedRequest>, JsonRejection>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let embedder = loaded_model(&ctx)?;
    let Json(request) = payload?;
    let text = request.validate()?;

    debug!("embedding text of {} chars", text.len());

    let (text, embedding) = run_blocking(move || {
        let embedding = embedder.embed(&text)?;
        Ok((text, embedding))
    })
    .await?;

    Ok(Json(EmbedResponse { text, embedding }))
}

/// `POST /compare`: similarity of a new text against historical texts.
pub async fn compare(
    State(ctx): State<ApiContext>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<CompareResponse>, ApiError> {
    let embedder = loaded_model(&ctx)?;
    let Json(request) = payload?;
    let valid = request.validate()?;
    let threshold = ctx.config.similarity_threshold;

    debug!("comparing against {} texts", valid.old_texts.len());

    let (new_text, comparison) = run_blocking(move || {
        let comparison =
            similarity::compare(&*embedder, &valid.new_text, &valid.old_texts, threshold)?;
        Ok((valid.new_text, comparison))
    })
    .await?;

    debug!(
        "best match #{} score {:.3} (threshold met: {})",
        comparison.best_match_index, comparison.best_score, comparison.threshold_met
    );

    Ok(Json(CompareResponse::new(new_text, comparison)))
}

/// `GET /health`: whether the model is loaded.
pub async fn health(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let model_loaded = ctx.model.is_ready();
    Json(HealthResponse {
        status: if model_loaded { "ok" } else { "degraded" }.to_string(),
        model: ctx.model.name().to_string(),
        model_loaded,
        dimensions: ctx.model.dimensions(),
    })
}
