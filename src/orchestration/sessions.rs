//! Table sessions: opening, live quotes, scoring and checkout.

use super::notify::{DomainEvent, Notifier};
use super::{charge_to_account, load_member, resolve_open_shift};
use crate::config::Config;
use crate::db::{repo::is_unique_violation, Repository};
use crate::domain::{
    Member, MemberId, Money, PaymentMethod, Sale, SaleDraft, SaleType, Session, SessionId,
    TableId, TimeMs,
};
use crate::engine::score::Standing;
use crate::engine::{apply_event, GameEvent, GameState, GameType, Tariff, TimeCharge};
use crate::error::{CoreError, Policy, Precondition};
use serde::Serialize;
use sqlx::sqlite::SqliteConnection;
use std::sync::Arc;
use tracing::info;

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub session: Session,
    pub sale: Sale,
    pub elapsed_minutes: i64,
    pub time_charge: Money,
    /// Consumption already sold against this session. Informational only,
    /// those sales were settled when they were recorded.
    pub consumption_total: Money,
    pub member: Option<Member>,
}

/// Game state after an event, with the derived standing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameProgress {
    pub session_id: SessionId,
    pub state: GameState,
    pub standing: Standing,
}

#[derive(Clone)]
pub struct SessionService {
    repo: Arc<Repository>,
    notifier: Arc<dyn Notifier>,
    config: Config,
}

impl SessionService {
    pub fn new(repo: Arc<Repository>, notifier: Arc<dyn Notifier>, config: Config) -> Self {
        Self {
            repo,
            notifier,
            config,
        }
    }

    pub async fn start_session(
        &self,
        table_id: TableId,
        game_type: Option<GameType>,
    ) -> Result<Session, CoreError> {
        self.start_session_at(table_id, game_type, TimeMs::now())
            .await
    }

    /// Occupy an available table and open a session on it.
    pub async fn start_session_at(
        &self,
        table_id: TableId,
        game_type: Option<GameType>,
        now: TimeMs,
    ) -> Result<Session, CoreError> {
        let mut tx = self.repo.begin().await?;

        if Repository::fetch_table(&mut *tx, table_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("table {}", table_id)));
        }
        if !Repository::occupy_table(&mut *tx, table_id).await? {
            return Err(Precondition::TableNotAvailable.into());
        }

        let game_state = game_type.map(GameState::new);
        let session = match Repository::insert_session(&mut *tx, table_id, now, game_state.as_ref())
            .await
        {
            Ok(session) => session,
            Err(e) if is_unique_violation(&e) => {
                return Err(Precondition::TableNotAvailable.into())
            }
            Err(e) => return Err(e.into()),
        };
        Repository::set_active_session(&mut *tx, table_id, session.id).await?;
        tx.commit().await?;

        info!(session_id = %session.id, %table_id, "session started");
        Ok(session)
    }

    /// Time charge accrued so far on an active session.
    pub async fn quote(&self, session_id: SessionId, now: TimeMs) -> Result<TimeCharge, CoreError> {
        let mut conn = self.repo.pool().acquire().await?;
        let session = load_active_session(&mut conn, session_id).await?;
        let tariff = self.tariff_for(&mut conn, session.table_id).await?;
        Ok(tariff.charge(session.start_time, now))
    }

    pub async fn settle_session(
        &self,
        session_id: SessionId,
        method: PaymentMethod,
        member_id: Option<MemberId>,
    ) -> Result<Settlement, CoreError> {
        self.settle_session_at(session_id, method, member_id, TimeMs::now())
            .await
    }

    /// Check out a session at `now`.
    ///
    /// One transaction writes the sale, charges the member on ACCOUNT, closes
    /// the session and releases the table. Notifications go out only after
    /// the commit.
    pub async fn settle_session_at(
        &self,
        session_id: SessionId,
        method: PaymentMethod,
        member_id: Option<MemberId>,
        now: TimeMs,
    ) -> Result<Settlement, CoreError> {
        if method == PaymentMethod::Unrecognized {
            return Err(Policy::UnsupportedMethod.into());
        }

        let mut tx = self.repo.begin().await?;

        let session = load_active_session(&mut *tx, session_id).await?;
        let tariff = self.tariff_for(&mut *tx, session.table_id).await?;
        let charge = tariff.charge(session.start_time, now);

        let member = match (method.is_on_account(), member_id) {
            (true, None) => return Err(Precondition::MemberRequired.into()),
            (_, Some(id)) => Some(load_member(&mut *tx, id).await?),
            (false, None) => None,
        };

        let consumption_total =
            consumption_total(&Repository::fetch_sales_for_session(&mut *tx, session_id).await?);

        let shift_id = resolve_open_shift(&mut *tx, self.config.shift_policy).await?;

        let charged_member = match member {
            Some(m) if method.is_on_account() => {
                Some(charge_to_account(&mut *tx, &m, charge.time_charge).await?)
            }
            other => other,
        };

        let sale = Repository::insert_sale(
            &mut *tx,
            &SaleDraft {
                amount: charge.time_charge,
                method,
                sale_type: SaleType::Consumption,
                session_id: Some(session_id),
                shift_id,
                member_id,
                items: Vec::new(),
                created_at: now,
                is_historical: false,
            },
        )
        .await?;

        if !Repository::close_session(
            &mut *tx,
            session_id,
            now,
            charge.elapsed_minutes,
            charge.time_charge,
        )
        .await?
        {
            return Err(Precondition::SessionClosed.into());
        }
        if !Repository::release_table(&mut *tx, session.table_id, session_id).await? {
            return Err(Precondition::StaleState.into());
        }

        let closed = Repository::fetch_session(&mut *tx, session_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("session {}", session_id)))?;

        tx.commit().await?;

        info!(
            %session_id,
            table_id = %session.table_id,
            minutes = charge.elapsed_minutes,
            amount = %charge.time_charge,
            method = %method,
            "session settled"
        );

        self.notifier
            .notify(DomainEvent::TableReleased {
                table_id: session.table_id,
                session_id,
            })
            .await;
        if method.is_on_account() {
            if let Some(m) = &charged_member {
                self.notifier
                    .notify(DomainEvent::MemberDebtChanged {
                        member_id: m.id,
                        current_debt: m.current_debt,
                    })
                    .await;
            }
        }

        Ok(Settlement {
            session: closed,
            sale,
            elapsed_minutes: charge.elapsed_minutes,
            time_charge: charge.time_charge,
            consumption_total,
            member: charged_member,
        })
    }

    /// Apply a scoring event to the session's game and store the new state.
    ///
    /// A session without a game starts one of the event's type.
    pub async fn record_game_event(
        &self,
        session_id: SessionId,
        event: &GameEvent,
    ) -> Result<GameProgress, CoreError> {
        let session = self
            .repo
            .get_session(session_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("session {}", session_id)))?;
        if !session.is_active() {
            return Err(Precondition::SessionClosed.into());
        }

        let current = session
            .game_state
            .clone()
            .unwrap_or_else(|| GameState::new(event.game_type()));
        let next = apply_event(&current, event)?;

        if !self
            .repo
            .replace_game_state(session_id, session.game_state.as_ref(), &next)
            .await?
        {
            return Err(Precondition::StaleState.into());
        }

        let standing = next.standing(&self.config.score_rules);
        Ok(GameProgress {
            session_id,
            state: next,
            standing,
        })
    }

    async fn tariff_for(
        &self,
        conn: &mut SqliteConnection,
        table_id: TableId,
    ) -> Result<Tariff, CoreError> {
        let table = Repository::fetch_table(conn, table_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("table {}", table_id)))?;
        Ok(Tariff::resolve(
            table.hourly_rate,
            self.config.default_rate_per_minute,
        ))
    }
}

/// Counter sales made against a session. The checkout sale carries no item
/// lines, so it never counts here.
pub fn consumption_total(sales: &[Sale]) -> Money {
    sales
        .iter()
        .filter(|s| !s.is_historical && s.sale_type == SaleType::Consumption)
        .filter(|s| !s.items.is_empty())
        .map(|s| s.amount)
        .sum()
}

async fn load_active_session(
    conn: &mut SqliteConnection,
    session_id: SessionId,
) -> Result<Session, CoreError> {
    let session = Repository::fetch_session(conn, session_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("session {}", session_id)))?;
    if !session.is_active() {
        return Err(Precondition::SessionClosed.into());
    }
    Ok(session)
}
