//! Sale record operations for the repository.
//!
//! Sales are append-only: there is no statement here that changes an amount,
//! method or item list once written. The only update attaches an orphaned
//! sale to its shift.

use crate::domain::{
    MemberId, PaymentMethod, Sale, SaleDraft, SaleId, SaleItem, SaleType, SessionId, ShiftId,
    TimeMs,
};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use tracing::warn;
use uuid::Uuid;

use super::{encode_json, parse_money, returned_row, Repository};

const SALE_COLUMNS: &str = "id, reference, amount, method, sale_type, session_id, shift_id, member_id, items, created_at_ms, is_historical";

fn sale_from_row(row: &SqliteRow) -> Sale {
    let id: i64 = row.get("id");
    let method_str: String = row.get("method");
    let method = PaymentMethod::parse(&method_str);
    if method == PaymentMethod::Unrecognized {
        warn!(sale_id = id, method = %method_str, "sale has an unrecognized payment method");
    }

    let items_raw: String = row.get("items");
    let items: Vec<SaleItem> = serde_json::from_str(&items_raw).unwrap_or_else(|e| {
        warn!(sale_id = id, error = %e, "failed to parse sale items, using empty list");
        Vec::new()
    });

    let amount_raw: String = row.get("amount");
    let sale_type: Option<String> = row.get("sale_type");

    Sale {
        id: SaleId::new(id),
        reference: row.get("reference"),
        amount: parse_money(&amount_raw, "sales.amount"),
        method,
        sale_type: SaleType::parse_or_default(sale_type.as_deref()),
        session_id: row.get::<Option<i64>, _>("session_id").map(SessionId::new),
        shift_id: row.get::<Option<i64>, _>("shift_id").map(ShiftId::new),
        member_id: row.get::<Option<i64>, _>("member_id").map(MemberId::new),
        items,
        created_at: TimeMs::new(row.get("created_at_ms")),
        is_historical: row.get::<i64, _>("is_historical") != 0,
    }
}

impl Repository {
    /// Write a sale and return the stored record.
    pub async fn insert_sale(
        conn: &mut SqliteConnection,
        draft: &SaleDraft,
    ) -> Result<Sale, sqlx::Error> {
        let items = encode_json(&draft.items)?;

        let rows = sqlx::query(&format!(
            r#"
            INSERT INTO sales (
                reference, amount, method, sale_type, session_id, shift_id,
                member_id, items, created_at_ms, is_historical
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(draft.amount.to_canonical_string())
        .bind(draft.method.as_str())
        .bind(draft.sale_type.as_str())
        .bind(draft.session_id.map(|id| id.as_i64()))
        .bind(draft.shift_id.map(|id| id.as_i64()))
        .bind(draft.member_id.map(|id| id.as_i64()))
        .bind(items)
        .bind(draft.created_at.as_ms())
        .bind(draft.is_historical as i64)
        .fetch_all(&mut *conn)
        .await?;

        Ok(sale_from_row(&returned_row(rows)?))
    }

    /// All sales attached to a shift, in creation order.
    pub async fn query_sales_for_shift(&self, shift_id: ShiftId) -> Result<Vec<Sale>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_sales_for_shift(&mut conn, shift_id).await
    }

    pub async fn fetch_sales_for_shift(
        conn: &mut SqliteConnection,
        shift_id: ShiftId,
    ) -> Result<Vec<Sale>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE shift_id = ? ORDER BY created_at_ms ASC, id ASC"
        ))
        .bind(shift_id.as_i64())
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.iter().map(sale_from_row).collect())
    }

    pub async fn query_sales_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<Sale>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_sales_for_session(&mut conn, session_id).await
    }

    pub async fn fetch_sales_for_session(
        conn: &mut SqliteConnection,
        session_id: SessionId,
    ) -> Result<Vec<Sale>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE session_id = ? ORDER BY created_at_ms ASC, id ASC"
        ))
        .bind(session_id.as_i64())
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.iter().map(sale_from_row).collect())
    }

    pub async fn query_sales_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<Sale>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE member_id = ? ORDER BY created_at_ms ASC, id ASC"
        ))
        .bind(member_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(sale_from_row).collect())
    }

    /// Attach live sales with no shift, created within `[from, to]`, to `shift_id`.
    ///
    /// Returns the number of sales attached.
    pub async fn attach_orphan_sales(
        conn: &mut SqliteConnection,
        shift_id: ShiftId,
        from: TimeMs,
        to: TimeMs,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE sales
            SET shift_id = ?
            WHERE shift_id IS NULL
              AND is_historical = 0
              AND created_at_ms >= ?
              AND created_at_ms <= ?
            "#,
        )
        .bind(shift_id.as_i64())
        .bind(from.as_ms())
        .bind(to.as_ms())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }
}
