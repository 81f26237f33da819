//! Member accounts eligible for on-account charges.

use crate::domain::{MemberId, Money};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub current_debt: Money,
    pub debt_limit: Money,
}

impl Member {
    /// Remaining on-account credit, never negative.
    pub fn available_credit(&self) -> Money {
        (self.debt_limit - self.current_debt).non_negative()
    }

    /// Whether charging `amount` on account keeps the debt within the limit.
    pub fn can_charge(&self, amount: Money) -> bool {
        self.current_debt
            .checked_add(amount)
            .map_or(false, |debt| debt <= self.debt_limit)
    }
}
