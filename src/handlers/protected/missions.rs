use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::mission_actor;
use crate::app::AppState;
use crate::authz::AuthzError;
use crate::database::models::{Mission, MissionChanges, MissionDetail, MissionStatus, NewMission};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthenticatedActor};
use crate::services::{authorize_mutation, creation_owner, CascadeOutcome};
use crate::types::{ClientId, MissionId};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMissionRequest {
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub status: MissionStatus,
    pub daily_rate: Decimal,
    pub timeframe: i32,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedMission {
    pub id: MissionId,
    pub deleted: bool,
}

/// GET /api/missions
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Mission>> {
    let missions = state.missions.list_missions().await?;
    Ok(ApiResponse::success(missions))
}

/// GET /api/missions/:id - mission with its contract and payments
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<MissionDetail> {
    let id = MissionId::new(id);
    let detail = state
        .missions
        .mission_detail(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("mission {} not found", id)))?;
    Ok(ApiResponse::success(detail))
}

/// POST /api/missions
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    body: Result<Json<CreateMissionRequest>, JsonRejection>,
) -> ApiResult<Mission> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    validate_create(&request)?;

    let acting = mission_actor(&state, &actor).await?;
    let client_id = creation_owner(&acting, request.client_id)?;

    let mission = state
        .missions
        .create_mission(NewMission {
            client_id,
            status: request.status,
            daily_rate: request.daily_rate,
            timeframe: request.timeframe,
            description: request.description,
        })
        .await?;

    tracing::info!("{} created mission {} for client {}", actor.identity, mission.id, mission.client_id);
    Ok(ApiResponse::created(mission))
}

/// PUT /api/missions/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Path(id): Path<String>,
    body: Result<Json<MissionChanges>, JsonRejection>,
) -> ApiResult<Mission> {
    let Json(changes) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    if changes.is_empty() {
        return Err(ApiError::bad_request("no fields to update"));
    }
    validate_changes(&changes)?;

    let id = MissionId::new(id);
    let acting = mission_actor(&state, &actor).await?;
    authorize_mutation(state.missions.as_ref(), &acting, &id).await?;

    let mission = state
        .missions
        .update_mission(&id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("mission {} not found", id)))?;
    Ok(ApiResponse::success(mission))
}

/// DELETE /api/missions/:id - ownership check, then cascade delete
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Path(id): Path<String>,
) -> ApiResult<DeletedMission> {
    let id = MissionId::new(id);
    let acting = mission_actor(&state, &actor).await?;
    authorize_mutation(state.missions.as_ref(), &acting, &id).await?;

    match state.cascade.delete_mission_cascade(&id).await {
        CascadeOutcome::Deleted => Ok(ApiResponse::success(DeletedMission { id, deleted: true })),
        // Gone between the guard and the cascade
        CascadeOutcome::NotFound => Err(AuthzError::NotFound(format!("mission {}", id)).into()),
        CascadeOutcome::PartialFailure { step, cause } => {
            Err(AuthzError::CascadeStepFailure { step, cause }.into())
        }
    }
}

fn validate_create(request: &CreateMissionRequest) -> Result<(), ApiError> {
    let mut field_errors = HashMap::new();
    if request.daily_rate <= Decimal::ZERO {
        field_errors.insert("dailyRate".to_string(), "must be greater than zero".to_string());
    }
    if request.timeframe <= 0 {
        field_errors.insert("timeframe".to_string(), "must be at least one day".to_string());
    }
    if request.description.trim().is_empty() {
        field_errors.insert("description".to_string(), "must not be empty".to_string());
    }
    into_validation_result(field_errors)
}

fn validate_changes(changes: &MissionChanges) -> Result<(), ApiError> {
    let mut field_errors = HashMap::new();
    if matches!(changes.daily_rate, Some(rate) if rate <= Decimal::ZERO) {
        field_errors.insert("dailyRate".to_string(), "must be greater than zero".to_string());
    }
    if matches!(changes.timeframe, Some(days) if days <= 0) {
        field_errors.insert("timeframe".to_string(), "must be at least one day".to_string());
    }
    if matches!(&changes.description, Some(d) if d.trim().is_empty()) {
        field_errors.insert("description".to_string(), "must not be empty".to_string());
    }
    into_validation_result(field_errors)
}

fn into_validation_result(field_errors: HashMap<String, String>) -> Result<(), ApiError> {
    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error("invalid mission", Some(field_errors)))
    }
}
