//! Staff operations for the repository.

use crate::domain::{PermissionOverrides, Role, Staff, StaffId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::warn;

use super::{encode_json, returned_row, Repository};

fn staff_from_row(row: &SqliteRow) -> Option<Staff> {
    let id: i64 = row.get("id");
    let role_str: String = row.get("role");
    let Some(role) = Role::parse(&role_str) else {
        warn!(staff_id = id, role = %role_str, "unknown staff role, ignoring staff member");
        return None;
    };

    let overrides_raw: String = row.get("custom_permissions");
    let custom_permissions: PermissionOverrides = serde_json::from_str(&overrides_raw)
        .unwrap_or_else(|e| {
            warn!(staff_id = id, error = %e, "invalid permission overrides, using role defaults");
            PermissionOverrides::new()
        });

    Some(Staff {
        id: StaffId::new(id),
        name: row.get("name"),
        role,
        custom_permissions,
    })
}

impl Repository {
    pub async fn insert_staff(
        &self,
        name: &str,
        role: Role,
        overrides: &PermissionOverrides,
    ) -> Result<Staff, sqlx::Error> {
        let overrides_json = encode_json(overrides)?;

        let rows = sqlx::query(
            r#"
            INSERT INTO staff (name, role, custom_permissions)
            VALUES (?, ?, ?)
            RETURNING id, name, role, custom_permissions
            "#,
        )
        .bind(name)
        .bind(role.as_str())
        .bind(overrides_json)
        .fetch_all(&self.pool)
        .await?;

        staff_from_row(&returned_row(rows)?).ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_staff(&self, id: StaffId) -> Result<Option<Staff>, sqlx::Error> {
        let row = sqlx::query("SELECT id, name, role, custom_permissions FROM staff WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().and_then(staff_from_row))
    }

    pub async fn count_staff(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM staff")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup_test_db;
    use super::*;
    use crate::domain::Permission;

    #[tokio::test]
    async fn test_staff_overrides_persist() {
        let (repo, _temp) = setup_test_db().await;
        let overrides: PermissionOverrides =
            [(Permission::ChargeToAccount, false)].into_iter().collect();

        let staff = repo.insert_staff("Luis", Role::Cashier, &overrides).await.unwrap();
        let loaded = repo.get_staff(staff.id).await.unwrap().unwrap();

        assert_eq!(loaded, staff);
        assert!(!loaded.can(Permission::ChargeToAccount));
        assert!(loaded.can(Permission::Checkout));
        assert_eq!(repo.count_staff().await.unwrap(), 1);
    }
}
