use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::api::auth::ActingStaff;
use crate::api::AppState;
use crate::db::repo::is_unique_violation;
use crate::domain::{Money, Permission, Table};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableRequest {
    pub name: String,
    #[serde(default)]
    pub hourly_rate: Option<Money>,
}

pub async fn create_table(
    State(state): State<AppState>,
    acting: ActingStaff,
    Json(req): Json<CreateTableRequest>,
) -> Result<(StatusCode, Json<Table>), AppError> {
    acting.require(Permission::ManageTables)?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    let hourly_rate = req.hourly_rate;
    if hourly_rate.is_some_and(|rate| rate.is_negative()) {
        return Err(AppError::BadRequest("hourlyRate must not be negative".into()));
    }

    let table = state
        .repo
        .insert_table(name, hourly_rate)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("table {} already exists", name))
            } else {
                e.into()
            }
        })?;

    info!(table_id = %table.id, name = %table.name, "table created");
    Ok((StatusCode::CREATED, Json(table)))
}

pub async fn list_tables(State(state): State<AppState>) -> Result<Json<Vec<Table>>, AppError> {
    Ok(Json(state.repo.list_tables().await?))
}
