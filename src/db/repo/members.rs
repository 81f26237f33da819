//! Member account operations for the repository.

use crate::domain::{Member, MemberId, Money};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::{parse_money, returned_row, Repository};

fn member_from_row(row: &SqliteRow) -> Member {
    let debt: String = row.get("current_debt");
    let limit: String = row.get("debt_limit");
    Member {
        id: MemberId::new(row.get("id")),
        name: row.get("name"),
        current_debt: parse_money(&debt, "members.current_debt"),
        debt_limit: parse_money(&limit, "members.debt_limit"),
    }
}

impl Repository {
    pub async fn insert_member(
        &self,
        name: &str,
        debt_limit: Money,
    ) -> Result<Member, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            INSERT INTO members (name, current_debt, debt_limit)
            VALUES (?, '0', ?)
            RETURNING id, name, current_debt, debt_limit
            "#,
        )
        .bind(name)
        .bind(debt_limit.to_canonical_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(member_from_row(&returned_row(rows)?))
    }

    pub async fn get_member(&self, id: MemberId) -> Result<Option<Member>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_member(&mut conn, id).await
    }

    pub async fn fetch_member(
        conn: &mut SqliteConnection,
        id: MemberId,
    ) -> Result<Option<Member>, sqlx::Error> {
        let row = sqlx::query("SELECT id, name, current_debt, debt_limit FROM members WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.as_ref().map(member_from_row))
    }

    /// Members owing money, largest debt first.
    ///
    /// Sorted in Rust: the amounts are stored as text.
    pub async fn list_debtors(&self) -> Result<Vec<Member>, sqlx::Error> {
        let rows = sqlx::query("SELECT id, name, current_debt, debt_limit FROM members")
            .fetch_all(&self.pool)
            .await?;

        let mut debtors: Vec<Member> = rows
            .iter()
            .map(member_from_row)
            .filter(|m| m.current_debt.is_positive())
            .collect();
        debtors.sort_by(|a, b| b.current_debt.cmp(&a.current_debt).then(a.id.cmp(&b.id)));
        Ok(debtors)
    }

    /// Compare-and-set the member's debt. Returns false if the stored balance
    /// is no longer `expected`, i.e. a concurrent charge or payment got there first.
    pub async fn swap_member_debt(
        conn: &mut SqliteConnection,
        id: MemberId,
        expected: Money,
        new_debt: Money,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE members SET current_debt = ? WHERE id = ? AND current_debt = ?")
                .bind(new_debt.to_canonical_string())
                .bind(id.as_i64())
                .bind(expected.to_canonical_string())
                .execute(&mut *conn)
                .await?;

        Ok(result.rows_affected() == 1)
    }
}
