//! Staff roles and permissions.
//!
//! A staff member's effective permissions come from a static role table, with
//! per-staff overrides consulted first. Both the permission keys and the roles
//! are closed enums, so an override bag can never carry an unknown key.

use crate::domain::StaffId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Cashier,
    /// Scoreboard terminal: may only update game state.
    Kiosk,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Cashier => "CASHIER",
            Role::Kiosk => "KIOSK",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Role::Admin),
            "MANAGER" => Some(Role::Manager),
            "CASHIER" => Some(Role::Cashier),
            "KIOSK" => Some(Role::Kiosk),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    ManageTables,
    OperateTables,
    Checkout,
    ChargeToAccount,
    RecordSales,
    ManageMembers,
    ReceivePayments,
    OpenShift,
    CloseShift,
    ViewShiftReports,
    RepairLedger,
    UpdateScores,
}

impl Permission {
    pub const ALL: [Permission; 12] = [
        Permission::ManageTables,
        Permission::OperateTables,
        Permission::Checkout,
        Permission::ChargeToAccount,
        Permission::RecordSales,
        Permission::ManageMembers,
        Permission::ReceivePayments,
        Permission::OpenShift,
        Permission::CloseShift,
        Permission::ViewShiftReports,
        Permission::RepairLedger,
        Permission::UpdateScores,
    ];
}

/// Static role table.
pub fn role_grants(role: Role, permission: Permission) -> bool {
    use Permission::*;
    match role {
        Role::Admin => true,
        Role::Manager => !matches!(permission, RepairLedger),
        Role::Cashier => matches!(
            permission,
            OperateTables
                | Checkout
                | ChargeToAccount
                | RecordSales
                | ReceivePayments
                | OpenShift
                | CloseShift
                | UpdateScores
        ),
        Role::Kiosk => matches!(permission, UpdateScores),
    }
}

/// Per-staff grants (`true`) and revocations (`false`) over the role table.
pub type PermissionOverrides = BTreeMap<Permission, bool>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: StaffId,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub custom_permissions: PermissionOverrides,
}

impl Staff {
    pub fn can(&self, permission: Permission) -> bool {
        self.custom_permissions
            .get(&permission)
            .copied()
            .unwrap_or_else(|| role_grants(self.role, permission))
    }

    pub fn effective_permissions(&self) -> Vec<Permission> {
        Permission::ALL
            .iter()
            .copied()
            .filter(|p| self.can(*p))
            .collect()
    }
}
