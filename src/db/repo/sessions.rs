//! Table session operations for the repository.

use crate::domain::{Money, Session, SessionId, SessionStatus, TableId, TimeMs};
use crate::engine::GameState;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use tracing::warn;

use super::{encode_json, parse_money_opt, returned_row, Repository};

const SESSION_COLUMNS: &str =
    "id, table_id, start_time_ms, end_time_ms, status, duration_min, total_amount, game_state";

fn session_from_row(row: &SqliteRow) -> Session {
    let id: i64 = row.get("id");
    let status_str: String = row.get("status");
    let end_time: Option<i64> = row.get("end_time_ms");
    let status = SessionStatus::parse(&status_str).unwrap_or_else(|| {
        warn!(session_id = id, status = %status_str, "unknown session status");
        if end_time.is_some() {
            SessionStatus::Closed
        } else {
            SessionStatus::Active
        }
    });

    let game_state = row
        .get::<Option<String>, _>("game_state")
        .and_then(|raw| match serde_json::from_str::<GameState>(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(session_id = id, error = %e, "discarding unreadable game state");
                None
            }
        });

    Session {
        id: SessionId::new(id),
        table_id: TableId::new(row.get("table_id")),
        start_time: TimeMs::new(row.get("start_time_ms")),
        end_time: end_time.map(TimeMs::new),
        status,
        duration_min: row.get("duration_min"),
        total_amount: parse_money_opt(row.get("total_amount"), "sessions.total_amount"),
        game_state,
    }
}

fn encode_game_state(state: Option<&GameState>) -> Result<Option<String>, sqlx::Error> {
    state.map(encode_json).transpose()
}

impl Repository {
    pub async fn get_session(&self, id: SessionId) -> Result<Option<Session>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_session(&mut conn, id).await
    }

    /// Active sessions, oldest first.
    pub async fn list_active_sessions(&self) -> Result<Vec<Session>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE status = 'ACTIVE' ORDER BY start_time_ms ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(session_from_row).collect())
    }

    pub async fn fetch_session(
        conn: &mut SqliteConnection,
        id: SessionId,
    ) -> Result<Option<Session>, sqlx::Error> {
        let row = sqlx::query(&format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?"))
            .bind(id.as_i64())
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.as_ref().map(session_from_row))
    }

    /// Insert an active session. Fails with a unique violation if the table
    /// already has one.
    pub async fn insert_session(
        conn: &mut SqliteConnection,
        table_id: TableId,
        start_time: TimeMs,
        game_state: Option<&GameState>,
    ) -> Result<Session, sqlx::Error> {
        let rows = sqlx::query(&format!(
            r#"
            INSERT INTO sessions (table_id, start_time_ms, status, game_state)
            VALUES (?, ?, 'ACTIVE', ?)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(table_id.as_i64())
        .bind(start_time.as_ms())
        .bind(encode_game_state(game_state)?)
        .fetch_all(&mut *conn)
        .await?;

        Ok(session_from_row(&returned_row(rows)?))
    }

    /// Close an active session. Returns false if it was not active.
    pub async fn close_session(
        conn: &mut SqliteConnection,
        id: SessionId,
        end_time: TimeMs,
        duration_min: i64,
        total_amount: Money,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET status = 'CLOSED', end_time_ms = ?, duration_min = ?, total_amount = ?
            WHERE id = ? AND status = 'ACTIVE'
            "#,
        )
        .bind(end_time.as_ms())
        .bind(duration_min)
        .bind(total_amount.to_canonical_string())
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Replace the game state of an active session, provided it still holds
    /// `previous`. Returns false when the session is closed or the state moved on.
    pub async fn replace_game_state(
        &self,
        id: SessionId,
        previous: Option<&GameState>,
        next: &GameState,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET game_state = ?
            WHERE id = ? AND status = 'ACTIVE' AND game_state IS ?
            "#,
        )
        .bind(encode_game_state(Some(next))?)
        .bind(id.as_i64())
        .bind(encode_game_state(previous)?)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup_test_db;
    use super::*;
    use crate::engine::{GameEvent, GameType};
    use crate::engine::score::{Player, RackEvent};

    #[tokio::test]
    async fn test_one_active_session_per_table() {
        let (repo, _temp) = setup_test_db().await;
        let table = repo.insert_table("Mesa 1", None).await.unwrap();

        let mut conn = repo.pool().acquire().await.unwrap();
        Repository::insert_session(&mut conn, table.id, TimeMs::new(1), None)
            .await
            .unwrap();
        let err = Repository::insert_session(&mut conn, table.id, TimeMs::new(2), None)
            .await
            .unwrap_err();
        assert!(super::super::is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_close_session_only_once() {
        let (repo, _temp) = setup_test_db().await;
        let table = repo.insert_table("Mesa 1", None).await.unwrap();

        let mut conn = repo.pool().acquire().await.unwrap();
        let session = Repository::insert_session(&mut conn, table.id, TimeMs::new(0), None)
            .await
            .unwrap();
        assert!(session.is_active());
        assert_eq!(session.end_time, None);

        let end = TimeMs::new(0).plus_minutes(10);
        assert!(
            Repository::close_session(&mut conn, session.id, end, 10, Money::from_units(1000))
                .await
                .unwrap()
        );
        assert!(
            !Repository::close_session(&mut conn, session.id, end, 10, Money::from_units(1000))
                .await
                .unwrap()
        );

        let closed = repo.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(closed.status, SessionStatus::Closed);
        assert_eq!(closed.end_time, Some(end));
        assert_eq!(closed.duration_min, Some(10));
        assert_eq!(closed.total_amount, Some(Money::from_units(1000)));
    }

    #[tokio::test]
    async fn test_replace_game_state_compare_and_set() {
        let (repo, _temp) = setup_test_db().await;
        let table = repo.insert_table("Mesa 1", None).await.unwrap();
        let initial = GameState::new(GameType::Pool);

        let mut conn = repo.pool().acquire().await.unwrap();
        let session =
            Repository::insert_session(&mut conn, table.id, TimeMs::new(0), Some(&initial))
                .await
                .unwrap();
        drop(conn);

        let next = crate::engine::apply_event(
            &initial,
            &GameEvent::Pool(RackEvent::RackWon {
                player: Player::One,
            }),
        )
        .unwrap();

        assert!(repo
            .replace_game_state(session.id, Some(&initial), &next)
            .await
            .unwrap());
        // stale expectation
        assert!(!repo
            .replace_game_state(session.id, Some(&initial), &next)
            .await
            .unwrap());

        let stored = repo.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(stored.game_state, Some(next));
    }
}
