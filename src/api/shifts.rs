use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::auth::ActingStaff;
use crate::api::AppState;
use crate::domain::{Money, Permission, Shift, ShiftId};
use crate::engine::ShiftSummary;
use crate::error::AppError;
use crate::orchestration::ShiftReport;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftRequest {
    #[serde(default)]
    pub opening_amount: Money,
}

pub async fn open_shift(
    State(state): State<AppState>,
    acting: ActingStaff,
    Json(req): Json<OpenShiftRequest>,
) -> Result<(StatusCode, Json<Shift>), AppError> {
    acting.require(Permission::OpenShift)?;
    let shift = state.shifts.open_shift(req.opening_amount).await?;
    Ok((StatusCode::CREATED, Json(shift)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveShiftResponse {
    pub shift: Option<Shift>,
}

pub async fn active_shift(
    State(state): State<AppState>,
) -> Result<Json<ActiveShiftResponse>, AppError> {
    let shift = state.shifts.active_shift().await?;
    Ok(Json(ActiveShiftResponse { shift }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseShiftRequest {
    pub closing_amount: Money,
}

pub async fn close_shift(
    Path(shift_id): Path<i64>,
    State(state): State<AppState>,
    acting: ActingStaff,
    Json(req): Json<CloseShiftRequest>,
) -> Result<Json<ShiftReport>, AppError> {
    acting.require(Permission::CloseShift)?;
    let report = state
        .shifts
        .close_shift(ShiftId::new(shift_id), req.closing_amount)
        .await?;
    Ok(Json(report))
}

pub async fn get_summary(
    Path(shift_id): Path<i64>,
    State(state): State<AppState>,
    acting: ActingStaff,
) -> Result<Json<ShiftSummary>, AppError> {
    acting.require(Permission::ViewShiftReports)?;
    let shift_id = ShiftId::new(shift_id);
    state
        .shifts
        .summarize_shift(shift_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("shift {} not found", shift_id)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillResponse {
    pub shift_id: ShiftId,
    pub attached: u64,
}

pub async fn backfill(
    Path(shift_id): Path<i64>,
    State(state): State<AppState>,
    acting: ActingStaff,
) -> Result<Json<BackfillResponse>, AppError> {
    acting.require(Permission::RepairLedger)?;
    let shift_id = ShiftId::new(shift_id);
    let attached = state.shifts.backfill_shift_sales(shift_id).await?;
    Ok(Json(BackfillResponse { shift_id, attached }))
}
