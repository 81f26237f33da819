//! Cash-drawer shifts.

use crate::domain::{Money, ShiftId, TimeMs};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    Open,
    Closed,
}

impl ShiftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Open => "OPEN",
            ShiftStatus::Closed => "CLOSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(ShiftStatus::Open),
            "CLOSED" => Some(ShiftStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: ShiftId,
    pub status: ShiftStatus,
    pub opening_amount: Money,
    pub opened_at: TimeMs,
    pub closing_amount: Option<Money>,
    /// Opening amount plus cash taken during the shift, computed at close.
    pub expected_cash: Option<Money>,
    /// `closing_amount - expected_cash`.
    pub cash_variance: Option<Money>,
    pub closed_at: Option<TimeMs>,
}

impl Shift {
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }

    /// Whether `at` falls within this shift's open window.
    pub fn covers(&self, at: TimeMs) -> bool {
        at >= self.opened_at && self.closed_at.map_or(true, |closed| at <= closed)
    }
}
