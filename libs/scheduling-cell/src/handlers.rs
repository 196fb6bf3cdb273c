use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AvailableSlotsQuery, BulkDeleteRequest, GenerateSlotsRequest};
use crate::services::inventory::SlotInventoryService;

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<AvailableSlotsQuery>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let inventory = SlotInventoryService::from_config(&state);

    let slots = inventory
        .find_available(params.doctor_id, params.date)
        .await
        .map_err(AppError::from)?;

    let total = slots.len();
    Ok(Json(json!({
        "doctor_id": params.doctor_id,
        "date": params.date,
        "slots": slots,
        "total": total
    })))
}

/// Doctors generate their own slots; the identity header is the doctor id.
#[axum::debug_handler]
pub async fn generate_slots(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<GenerateSlotsRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_doctor() && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only doctors can generate time slots".to_string(),
        ));
    }

    if request.days == 0 || request.days > 90 {
        return Err(AppError::BadRequest(
            "days must be between 1 and 90".to_string(),
        ));
    }

    let inventory = SlotInventoryService::from_config(&state);

    let report = inventory
        .generate_for_range(
            user.id,
            request.start_date,
            request.days,
            request.regenerate.unwrap_or(false),
        )
        .await
        .map_err(AppError::from)?;

    Ok(Json(json!({
        "success": true,
        "report": report,
        "message": "Time slots generated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_slot(
    State(state): State<Arc<AppConfig>>,
    Path(slot_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_doctor() {
        return Err(AppError::Forbidden(
            "Only doctors can delete time slots".to_string(),
        ));
    }

    let inventory = SlotInventoryService::from_config(&state);

    inventory
        .delete_slot(slot_id, user.id)
        .await
        .map_err(AppError::from)?;

    Ok(Json(json!({
        "success": true,
        "message": "Time slot deleted"
    })))
}

#[axum::debug_handler]
pub async fn bulk_delete_slots(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_doctor() {
        return Err(AppError::Forbidden(
            "Only doctors can delete time slots".to_string(),
        ));
    }

    if request.slot_ids.is_empty() {
        return Err(AppError::BadRequest("slot_ids must not be empty".to_string()));
    }

    let inventory = SlotInventoryService::from_config(&state);

    let deleted = inventory
        .bulk_delete(&request.slot_ids, user.id)
        .await
        .map_err(AppError::from)?;

    Ok(Json(json!({
        "success": true,
        "deleted": deleted,
        "message": "Time slots deleted"
    })))
}
