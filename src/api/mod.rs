pub mod auth;
pub mod health;
pub mod members;
pub mod sales;
pub mod sessions;
pub mod shifts;
pub mod tables;

use crate::config::Config;
use crate::db::Repository;
use crate::orchestration::{Notifier, SalesService, SessionService, ShiftService};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub sessions: SessionService,
    pub sales: SalesService,
    pub shifts: ShiftService,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: Config, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            sessions: SessionService::new(repo.clone(), notifier.clone(), config.clone()),
            sales: SalesService::new(repo.clone(), notifier, config.clone()),
            shifts: ShiftService::new(repo.clone()),
            repo,
            config,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/staff", post(auth::create_staff))
        .route(
            "/v1/tables",
            get(tables::list_tables).post(tables::create_table),
        )
        .route("/v1/tables/:id/sessions", post(sessions::start_session))
        .route("/v1/sessions/:id", get(sessions::get_session))
        .route("/v1/sessions/:id/settle", post(sessions::settle_session))
        .route(
            "/v1/sessions/:id/game/events",
            post(sessions::record_game_event),
        )
        .route("/v1/sales", post(sales::record_sale))
        .route("/v1/sales/historical", post(sales::import_historical_sale))
        .route("/v1/members", post(members::create_member))
        .route("/v1/members/debtors", get(members::list_debtors))
        .route("/v1/members/:id", get(members::get_member))
        .route("/v1/members/:id/payments", post(members::record_payment))
        .route("/v1/shifts", post(shifts::open_shift))
        .route("/v1/shifts/active", get(shifts::active_shift))
        .route("/v1/shifts/:id/close", post(shifts::close_shift))
        .route("/v1/shifts/:id/summary", get(shifts::get_summary))
        .route("/v1/shifts/:id/backfill", post(shifts::backfill))
        .layer(cors)
        .with_state(state)
}
