use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::auth::ActingStaff;
use crate::api::AppState;
use crate::domain::{Member, MemberId, Money, PaymentMethod, Permission};
use crate::error::AppError;
use crate::orchestration::{MemberAccount, PaymentReceipt};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    pub name: String,
    #[serde(default)]
    pub debt_limit: Money,
}

pub async fn create_member(
    State(state): State<AppState>,
    acting: ActingStaff,
    Json(req): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<Member>), AppError> {
    acting.require(Permission::ManageMembers)?;
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }

    let member = state.sales.create_member(name, req.debt_limit).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn get_member(
    Path(member_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<MemberAccount>, AppError> {
    Ok(Json(state.sales.get_member(MemberId::new(member_id)).await?))
}

pub async fn list_debtors(State(state): State<AppState>) -> Result<Json<Vec<Member>>, AppError> {
    Ok(Json(state.sales.list_debtors().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Money,
    pub payment_method: PaymentMethod,
}

pub async fn record_payment(
    Path(member_id): Path<i64>,
    State(state): State<AppState>,
    acting: ActingStaff,
    Json(req): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<PaymentReceipt>), AppError> {
    acting.require(Permission::ReceivePayments)?;

    let receipt = state
        .sales
        .record_debt_payment(MemberId::new(member_id), req.amount, req.payment_method)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
