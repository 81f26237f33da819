//! Shift ledger aggregation.

use crate::domain::{Money, PaymentMethod, Sale, SaleType};
use serde::Serialize;

/// Totals by sale type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TypeTotals {
    pub consumption: Money,
    pub debt_payment: Money,
    pub membership: Money,
}

/// Settlement summary of the sales attached to one shift.
///
/// `other` collects on-account charges and any payment method this build does
/// not recognise, so `cash + card + transfer + other == total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSummary {
    pub total: Money,
    pub cash: Money,
    pub card: Money,
    pub transfer: Money,
    pub other: Money,
    pub by_type: TypeTotals,
    pub sales_count: u64,
}

impl ShiftSummary {
    pub fn add(&mut self, sale: &Sale) {
        self.total += sale.amount;
        self.sales_count += 1;

        match sale.method {
            PaymentMethod::Cash => self.cash += sale.amount,
            PaymentMethod::Card => self.card += sale.amount,
            PaymentMethod::Transfer => self.transfer += sale.amount,
            PaymentMethod::Account | PaymentMethod::Unrecognized => self.other += sale.amount,
        }

        match sale.sale_type {
            SaleType::Consumption => self.by_type.consumption += sale.amount,
            SaleType::DebtPayment => self.by_type.debt_payment += sale.amount,
            SaleType::Membership => self.by_type.membership += sale.amount,
        }
    }
}

/// Summarize sales in a single pass. Historical (backdated) sales are skipped.
pub fn summarize<'a, I>(sales: I) -> ShiftSummary
where
    I: IntoIterator<Item = &'a Sale>,
{
    let mut summary = ShiftSummary::default();
    for sale in sales.into_iter().filter(|s| !s.is_historical) {
        summary.add(sale);
    }
    summary
}
