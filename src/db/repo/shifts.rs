//! Cash-drawer shift operations for the repository.

use crate::domain::{Money, Shift, ShiftId, ShiftStatus, TimeMs};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use tracing::warn;

use super::{parse_money, parse_money_opt, returned_row, Repository};

const SHIFT_COLUMNS: &str = "id, status, opening_amount, opened_at_ms, closing_amount, expected_cash, cash_variance, closed_at_ms";

fn shift_from_row(row: &SqliteRow) -> Shift {
    let id: i64 = row.get("id");
    let status_str: String = row.get("status");
    let closed_at: Option<i64> = row.get("closed_at_ms");
    let status = ShiftStatus::parse(&status_str).unwrap_or_else(|| {
        warn!(shift_id = id, status = %status_str, "unknown shift status");
        if closed_at.is_some() {
            ShiftStatus::Closed
        } else {
            ShiftStatus::Open
        }
    });
    let opening: String = row.get("opening_amount");

    Shift {
        id: ShiftId::new(id),
        status,
        opening_amount: parse_money(&opening, "shifts.opening_amount"),
        opened_at: TimeMs::new(row.get("opened_at_ms")),
        closing_amount: parse_money_opt(row.get("closing_amount"), "shifts.closing_amount"),
        expected_cash: parse_money_opt(row.get("expected_cash"), "shifts.expected_cash"),
        cash_variance: parse_money_opt(row.get("cash_variance"), "shifts.cash_variance"),
        closed_at: closed_at.map(TimeMs::new),
    }
}

impl Repository {
    /// Insert an OPEN shift. The partial unique index turns a second open
    /// shift into a unique violation.
    pub async fn insert_open_shift(
        conn: &mut SqliteConnection,
        opening_amount: Money,
        opened_at: TimeMs,
    ) -> Result<Shift, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "INSERT INTO shifts (status, opening_amount, opened_at_ms) VALUES ('OPEN', ?, ?) RETURNING {SHIFT_COLUMNS}"
        ))
        .bind(opening_amount.to_canonical_string())
        .bind(opened_at.as_ms())
        .fetch_all(&mut *conn)
        .await?;

        Ok(shift_from_row(&returned_row(rows)?))
    }

    pub async fn get_shift(&self, id: ShiftId) -> Result<Option<Shift>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_shift(&mut conn, id).await
    }

    pub async fn fetch_shift(
        conn: &mut SqliteConnection,
        id: ShiftId,
    ) -> Result<Option<Shift>, sqlx::Error> {
        let row = sqlx::query(&format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?"))
            .bind(id.as_i64())
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.as_ref().map(shift_from_row))
    }

    pub async fn get_open_shift(&self) -> Result<Option<Shift>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_open_shift(&mut conn).await
    }

    pub async fn fetch_open_shift(
        conn: &mut SqliteConnection,
    ) -> Result<Option<Shift>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE status = 'OPEN' LIMIT 1"
        ))
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.as_ref().map(shift_from_row))
    }

    /// Close an open shift with its cash count. Returns false if it was not open.
    pub async fn close_shift(
        conn: &mut SqliteConnection,
        id: ShiftId,
        closing_amount: Money,
        expected_cash: Money,
        closed_at: TimeMs,
    ) -> Result<bool, sqlx::Error> {
        let variance = closing_amount - expected_cash;
        let result = sqlx::query(
            r#"
            UPDATE shifts
            SET status = 'CLOSED', closing_amount = ?, expected_cash = ?,
                cash_variance = ?, closed_at_ms = ?
            WHERE id = ? AND status = 'OPEN'
            "#,
        )
        .bind(closing_amount.to_canonical_string())
        .bind(expected_cash.to_canonical_string())
        .bind(variance.to_canonical_string())
        .bind(closed_at.as_ms())
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
