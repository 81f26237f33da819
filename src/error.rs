use crate::config::ConfigError;
use crate::domain::Money;
use crate::engine::score::ScoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// A business precondition that did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("no shift is open, open a shift first")]
    NoOpenShift,
    #[error("a shift is already open")]
    ShiftAlreadyOpen,
    #[error("shift is already closed")]
    ShiftClosed,
    #[error("session is already closed")]
    SessionClosed,
    #[error("table is not available")]
    TableNotAvailable,
    #[error("a member is required to charge to account")]
    MemberRequired,
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("amount cannot be negative")]
    NegativeAmount,
    #[error("record changed concurrently, reload and retry")]
    StaleState,
}

/// A business rule that rejected an otherwise valid request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Policy {
    #[error("credit limit of {limit} exceeded (current debt {current_debt}, charge {charge})")]
    CreditLimitExceeded {
        limit: Money,
        current_debt: Money,
        charge: Money,
    },
    #[error("payment of {amount} exceeds outstanding debt of {current_debt}")]
    OverPayment { amount: Money, current_debt: Money },
    #[error("debt cannot be paid with ACCOUNT")]
    AccountNotAllowed,
    #[error("sale amount is out of range")]
    AmountOutOfRange,
    #[error("unsupported payment method")]
    UnsupportedMethod,
    #[error("debt payments must be recorded through the member's payment endpoint")]
    UnsupportedSaleType,
    #[error("invalid game event: {0}")]
    IllegalGameEvent(#[from] ScoreError),
}

/// Outcome of a core operation that did not succeed.
///
/// Everything except `TransactionFailure` is an expected business result.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    PreconditionFailed(Precondition),
    #[error("{0}")]
    PolicyViolation(Policy),
    #[error("persistence failure: {0}")]
    TransactionFailure(#[from] sqlx::Error),
}

impl From<Precondition> for CoreError {
    fn from(p: Precondition) -> Self {
        CoreError::PreconditionFailed(p)
    }
}

impl From<Policy> for CoreError {
    fn from(p: Policy) -> Self {
        CoreError::PolicyViolation(p)
    }
}

impl From<ScoreError> for CoreError {
    fn from(err: ScoreError) -> Self {
        CoreError::PolicyViolation(Policy::IllegalGameEvent(err))
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unprocessable: {0}")]
    Unprocessable(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            CoreError::PreconditionFailed(p) => AppError::Conflict(p.to_string()),
            CoreError::PolicyViolation(p) => AppError::Unprocessable(p.to_string()),
            CoreError::TransactionFailure(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Config(msg) | AppError::Internal(msg) => {
                error!(error = %msg, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
