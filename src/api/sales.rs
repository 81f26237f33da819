use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::auth::ActingStaff;
use crate::api::AppState;
use crate::domain::{Permission, Sale, TimeMs};
use crate::error::AppError;
use crate::orchestration::NewSale;

pub async fn record_sale(
    State(state): State<AppState>,
    acting: ActingStaff,
    Json(req): Json<NewSale>,
) -> Result<(StatusCode, Json<Sale>), AppError> {
    acting.require(Permission::RecordSales)?;
    if req.method.is_on_account() {
        acting.require(Permission::ChargeToAccount)?;
    }

    let sale = state.sales.record_sale(req).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSaleRequest {
    #[serde(flatten)]
    pub sale: NewSale,
    /// Original sale time, milliseconds since epoch.
    pub created_at_ms: i64,
}

pub async fn import_historical_sale(
    State(state): State<AppState>,
    acting: ActingStaff,
    Json(req): Json<HistoricalSaleRequest>,
) -> Result<(StatusCode, Json<Sale>), AppError> {
    acting.require(Permission::RepairLedger)?;
    if req.created_at_ms > TimeMs::now().as_ms() {
        return Err(AppError::BadRequest("createdAtMs must not be in the future".into()));
    }

    let sale = state
        .sales
        .import_historical_sale(req.sale, TimeMs::new(req.created_at_ms))
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}
