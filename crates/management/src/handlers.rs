//! Axum REST handlers for the campaign survey API.

use crate::models::*;
use crate::store::ManagementStore;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use campaign_core::config::AppConfig;
use campaign_core::CampaignError;
use campaign_raffle::{
    CampaignReward, DedupSummary, RaffleEngine, ResultLookup, RewardRedemption, WinnerFlag,
};
use campaign_survey::{ResponseRecord, SurveySchema, SurveyStats};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

/// Shared management state.
#[derive(Clone)]
pub struct ManagementState {
    pub store: Arc<ManagementStore>,
    pub raffle: Arc<RaffleEngine<ManagementStore>>,
}

impl ManagementState {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_store(Arc::new(ManagementStore::with_config(&config.survey)), config)
    }

    pub fn with_store(store: Arc<ManagementStore>, config: &AppConfig) -> Self {
        let raffle = Arc::new(RaffleEngine::new(store.clone(), &config.raffle));
        Self { store, raffle }
    }
}

// ─── Errors ────────────────────────────────────────────────────────────────

/// `CampaignError` rendered as a JSON error body.
#[derive(Debug)]
pub struct ApiError(pub CampaignError);

impl<E: Into<CampaignError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CampaignError::Validation { .. } | CampaignError::EmptyPool { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CampaignError::ConcurrentWinnerConflict { .. }
            | CampaignError::InvalidTransition { .. } => StatusCode::CONFLICT,
            CampaignError::EditLocked { .. } => StatusCode::LOCKED,
            CampaignError::NotFound(_) => StatusCode::NOT_FOUND,
            CampaignError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            CampaignError::Serialization(_) => StatusCode::BAD_REQUEST,
            CampaignError::Config(_) | CampaignError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        } else {
            debug!(error = %self.0, "Request rejected");
        }
        let body = ErrorResponse {
            error: self.0.code().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ─── Campaigns ─────────────────────────────────────────────────────────────

pub async fn list_campaigns(State(state): State<ManagementState>) -> Json<Vec<Campaign>> {
    Json(state.store.list_campaigns())
}

pub async fn get_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(state.store.get_campaign(id)?))
}

pub async fn create_campaign(
    State(state): State<ManagementState>,
    Json(req): Json<CreateCampaignRequest>,
) -> ApiResult<(StatusCode, Json<Campaign>)> {
    let campaign = state.store.create_campaign(req)?;
    metrics::counter!("management.campaigns.created").increment(1);
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn activate_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(state.store.activate_campaign(id)?))
}

pub async fn end_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(state.store.end_campaign(id)?))
}

// ─── Schema & window ───────────────────────────────────────────────────────

pub async fn get_schema(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SurveySchema>> {
    Ok(Json(state.store.get_campaign(id)?.schema))
}

/// Bulk import of the whole survey document.
pub async fn put_schema(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UnlockQuery>,
    Json(document): Json<serde_json::Value>,
) -> ApiResult<Json<Campaign>> {
    let mut session = state.store.open_session(id)?;
    if query.unlock {
        session.unlock();
    }
    session.import(document)?;
    let campaign = state.store.save_session(&session)?;
    metrics::counter!("survey.schemas.imported").increment(1);
    Ok(Json(campaign))
}

pub async fn put_window(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UnlockQuery>,
    Json(req): Json<UpdateWindowRequest>,
) -> ApiResult<Json<Campaign>> {
    let mut session = state.store.open_session(id)?;
    if query.unlock {
        session.unlock();
    }
    session.set_window(req.starts_at, req.ends_at)?;
    Ok(Json(state.store.save_session(&session)?))
}

// ─── Responses ─────────────────────────────────────────────────────────────

pub async fn submit_response(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitResponseRequest>,
) -> ApiResult<(StatusCode, Json<ResponseRecord>)> {
    let record = state.store.submit_response(id, req)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn campaign_stats(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SurveyStats>> {
    Ok(Json(state.store.stats(id)?))
}

// ─── Rewards & raffle ──────────────────────────────────────────────────────

pub async fn list_rewards(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<CampaignReward>>> {
    state.store.get_campaign(id)?;
    Ok(Json(state.store.rewards(id)))
}

pub async fn create_reward(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateRewardRequest>,
) -> ApiResult<(StatusCode, Json<CampaignReward>)> {
    let reward = state.store.create_reward(id, req)?;
    Ok((StatusCode::CREATED, Json(reward)))
}

pub async fn create_redemption(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateRedemptionRequest>,
) -> ApiResult<(StatusCode, Json<RewardRedemption>)> {
    let redemption = state.store.redeem(id, req)?;
    Ok((StatusCode::CREATED, Json(redemption)))
}

#[derive(Debug, Default, Deserialize)]
pub struct DedupQuery {
    #[serde(default)]
    pub reward_id: Option<Uuid>,
}

pub async fn dedup_summary(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DedupQuery>,
) -> ApiResult<Json<DedupSummary>> {
    state.store.get_campaign(id)?;
    Ok(Json(state.raffle.dedup_summary(id, query.reward_id)?))
}

/// Draw one winner; the body maps the winning redemption id to its flag.
pub async fn draw_winner(
    State(state): State<ManagementState>,
    Path((id, reward_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<HashMap<Uuid, WinnerFlag>>> {
    state.store.get_campaign(id)?;
    let mut session = state.raffle.open_session(id)?;
    let outcome = state.raffle.draw(&mut session, reward_id)?;
    Ok(Json(outcome.winner_flags()))
}

pub async fn lookup_result(
    State(state): State<ManagementState>,
    Path(code): Path<String>,
) -> ApiResult<Json<ResultLookup>> {
    Ok(Json(state.raffle.lookup_result(&code)?))
}
