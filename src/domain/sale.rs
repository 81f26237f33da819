//! Immutable sale records.

use crate::domain::{MemberId, Money, SaleId, SessionId, ShiftId, TimeMs};
use serde::{Deserialize, Serialize};

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    /// Charged to a member's debt balance.
    Account,
    /// A stored method this build does not know about. Never accepted as input.
    #[serde(other)]
    Unrecognized,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Transfer => "TRANSFER",
            PaymentMethod::Account => "ACCOUNT",
            PaymentMethod::Unrecognized => "UNRECOGNIZED",
        }
    }

    pub fn parse(s: &str) -> PaymentMethod {
        match s {
            "CASH" => PaymentMethod::Cash,
            "CARD" => PaymentMethod::Card,
            "TRANSFER" => PaymentMethod::Transfer,
            "ACCOUNT" => PaymentMethod::Account,
            _ => PaymentMethod::Unrecognized,
        }
    }

    pub fn is_on_account(&self) -> bool {
        matches!(self, PaymentMethod::Account)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleType {
    #[default]
    Consumption,
    DebtPayment,
    Membership,
}

impl SaleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleType::Consumption => "CONSUMPTION",
            SaleType::DebtPayment => "DEBT_PAYMENT",
            SaleType::Membership => "MEMBERSHIP",
        }
    }

    /// Missing or unknown types count as consumption.
    pub fn parse_or_default(s: Option<&str>) -> SaleType {
        match s {
            Some("DEBT_PAYMENT") => SaleType::DebtPayment,
            Some("MEMBERSHIP") => SaleType::Membership,
            _ => SaleType::Consumption,
        }
    }
}

/// One line of the item snapshot taken when the sale was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl SaleItem {
    /// `quantity × unit_price`, or `None` when it does not fit in an amount.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_times(self.quantity)
    }
}

/// A committed sale. There is no update path: corrections are new sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: SaleId,
    /// Public receipt reference.
    pub reference: String,
    pub amount: Money,
    pub method: PaymentMethod,
    pub sale_type: SaleType,
    pub session_id: Option<SessionId>,
    pub shift_id: Option<ShiftId>,
    pub member_id: Option<MemberId>,
    pub items: Vec<SaleItem>,
    pub created_at: TimeMs,
    /// Backdated import; excluded from live cash-flow totals.
    pub is_historical: bool,
}

/// A sale about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleDraft {
    pub amount: Money,
    pub method: PaymentMethod,
    pub sale_type: SaleType,
    pub session_id: Option<SessionId>,
    pub shift_id: Option<ShiftId>,
    pub member_id: Option<MemberId>,
    pub items: Vec<SaleItem>,
    pub created_at: TimeMs,
    pub is_historical: bool,
}
