//! API route handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use kisan_core::{
    AdviceSegment, AdvisoryRequest, AdvisoryResponse, FarmerContext, Language, RenderedAdvice,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

// ========== Advisory Routes ==========

/// Advice with its HTML and segment renderings
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceBody {
    pub success: bool,
    #[serde(flatten)]
    pub response: AdvisoryResponse,
    pub html: String,
    pub segments: Vec<AdviceSegment>,
}

/// Answer a farmer question
pub async fn advise(
    State(state): State<AppState>,
    Json(req): Json<AdvisoryRequest>,
) -> Result<Json<AdviceBody>, ApiError> {
    let language = req
        .language
        .unwrap_or(state.service.config().advisory.default_language);

    match state.service.advise(req).await {
        Ok(response) => {
            let rendered = RenderedAdvice::from_markdown(&response.advice_text);
            Ok(Json(AdviceBody {
                success: true,
                response,
                html: rendered.html,
                segments: rendered.segments,
            }))
        }
        Err(e) => Err(ApiError::advisory(language, e)),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialistRequest {
    user_id: String,
    #[serde(default)]
    language: Option<Language>,
    #[serde(default)]
    arguments: Value,
}

/// Run one specialist directly
pub async fn run_specialist(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<SpecialistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let language = req
        .language
        .unwrap_or(state.service.config().advisory.default_language);
    let farmer = FarmerContext::new(req.user_id, language);
    let report = state
        .service
        .run_specialist(&name, farmer, req.arguments)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "specialist": name,
        "report": report
    })))
}

// ========== Data Routes ==========

#[derive(Deserialize)]
pub struct MarketQuery {
    crop: String,
    #[serde(default)]
    region: String,
}

/// Latest market quote for a crop, falling back to another region
pub async fn market_quote(
    State(state): State<AppState>,
    Query(query): Query<MarketQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = state
        .service
        .market_quote(&query.crop, &query.region)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "quote": quote
    })))
}

/// Recent soil reports and scans of a farmer
pub async fn farmer_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let history = state.service.farmer_history(&user_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "userId": user_id,
        "history": history
    })))
}

// ========== LLM Routes ==========

/// Registered providers and the active one
pub async fn list_providers(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "active": state.service.active_provider_id(),
            "providers": state.service.provider_info()
        })),
    )
}
