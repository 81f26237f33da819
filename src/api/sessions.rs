use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::auth::ActingStaff;
use crate::api::AppState;
use crate::domain::{
    MemberId, Money, PaymentMethod, Permission, Sale, Session, SessionId, TableId, TimeMs,
};
use crate::engine::{GameEvent, GameType, TimeCharge};
use crate::error::AppError;
use crate::orchestration::sessions::consumption_total;
use crate::orchestration::{GameProgress, Settlement};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub game_type: Option<GameType>,
}

pub async fn start_session(
    Path(table_id): Path<i64>,
    State(state): State<AppState>,
    acting: ActingStaff,
    req: Option<Json<StartSessionRequest>>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    acting.require(Permission::OperateTables)?;
    let req = req.map(|Json(r)| r).unwrap_or_default();

    let session = state
        .sessions
        .start_session(TableId::new(table_id), req.game_type)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    #[serde(flatten)]
    pub session: Session,
    /// Charge accrued so far; only for active sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<TimeCharge>,
    pub consumption_total: Money,
    pub sales: Vec<Sale>,
}

pub async fn get_session(
    Path(session_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<SessionView>, AppError> {
    let session_id = SessionId::new(session_id);
    let session = state
        .repo
        .get_session(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("session {} not found", session_id)))?;

    let quote = if session.is_active() {
        Some(state.sessions.quote(session_id, TimeMs::now()).await?)
    } else {
        None
    };
    let sales = state.repo.query_sales_for_session(session_id).await?;
    let consumption_total = consumption_total(&sales);

    Ok(Json(SessionView {
        session,
        quote,
        consumption_total,
        sales,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub member_id: Option<MemberId>,
}

pub async fn settle_session(
    Path(session_id): Path<i64>,
    State(state): State<AppState>,
    acting: ActingStaff,
    Json(req): Json<SettleRequest>,
) -> Result<Json<Settlement>, AppError> {
    acting.require(Permission::Checkout)?;
    if req.payment_method.is_on_account() {
        acting.require(Permission::ChargeToAccount)?;
    }

    let settlement = state
        .sessions
        .settle_session(SessionId::new(session_id), req.payment_method, req.member_id)
        .await?;
    Ok(Json(settlement))
}

pub async fn record_game_event(
    Path(session_id): Path<i64>,
    State(state): State<AppState>,
    acting: ActingStaff,
    Json(event): Json<GameEvent>,
) -> Result<Json<GameProgress>, AppError> {
    acting.require(Permission::UpdateScores)?;

    let progress = state
        .sessions
        .record_game_event(SessionId::new(session_id), &event)
        .await?;
    Ok(Json(progress))
}
