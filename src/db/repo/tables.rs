//! Billiard table operations for the repository.

use crate::domain::{Money, SessionId, Table, TableId, TableStatus};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use tracing::warn;

use super::{parse_money_opt, returned_row, Repository};

const TABLE_COLUMNS: &str = "id, name, hourly_rate, status, active_session_id";

fn table_from_row(row: &SqliteRow) -> Table {
    let id: i64 = row.get("id");
    let status_str: String = row.get("status");
    let status = TableStatus::parse(&status_str).unwrap_or_else(|| {
        warn!(table_id = id, status = %status_str, "unknown table status, treating as occupied");
        TableStatus::Occupied
    });

    Table {
        id: TableId::new(id),
        name: row.get("name"),
        hourly_rate: parse_money_opt(row.get("hourly_rate"), "billiard_tables.hourly_rate"),
        status,
        active_session_id: row
            .get::<Option<i64>, _>("active_session_id")
            .map(SessionId::new),
    }
}

impl Repository {
    /// Register a new table, initially available.
    pub async fn insert_table(
        &self,
        name: &str,
        hourly_rate: Option<Money>,
    ) -> Result<Table, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "INSERT INTO billiard_tables (name, hourly_rate, status) VALUES (?, ?, 'AVAILABLE') RETURNING {TABLE_COLUMNS}"
        ))
        .bind(name)
        .bind(hourly_rate.map(|r| r.to_canonical_string()))
        .fetch_all(&self.pool)
        .await?;

        Ok(table_from_row(&returned_row(rows)?))
    }

    pub async fn get_table(&self, id: TableId) -> Result<Option<Table>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_table(&mut conn, id).await
    }

    pub async fn list_tables(&self) -> Result<Vec<Table>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {TABLE_COLUMNS} FROM billiard_tables ORDER BY name ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(table_from_row).collect())
    }

    pub async fn fetch_table(
        conn: &mut SqliteConnection,
        id: TableId,
    ) -> Result<Option<Table>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {TABLE_COLUMNS} FROM billiard_tables WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.as_ref().map(table_from_row))
    }

    /// Flip a table from AVAILABLE to OCCUPIED. Returns false if it was not available.
    pub async fn occupy_table(
        conn: &mut SqliteConnection,
        id: TableId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE billiard_tables SET status = 'OCCUPIED' WHERE id = ? AND status = 'AVAILABLE'",
        )
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn set_active_session(
        conn: &mut SqliteConnection,
        id: TableId,
        session_id: SessionId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE billiard_tables SET active_session_id = ? WHERE id = ?")
            .bind(session_id.as_i64())
            .bind(id.as_i64())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Release a table held by `session_id`. Returns false if the table is not
    /// occupied by that session.
    pub async fn release_table(
        conn: &mut SqliteConnection,
        id: TableId,
        session_id: SessionId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE billiard_tables
            SET status = 'AVAILABLE', active_session_id = NULL
            WHERE id = ? AND status = 'OCCUPIED' AND active_session_id = ?
            "#,
        )
        .bind(id.as_i64())
        .bind(session_id.as_i64())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
