//! Cash-drawer shifts: opening, reporting, closing and sale backfill.

use crate::db::{repo::is_unique_violation, Repository};
use crate::domain::{Money, Shift, ShiftId, TimeMs};
use crate::engine::{summarize, ShiftSummary};
use crate::error::{CoreError, Precondition};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// A closed shift with the totals it was reconciled against.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftReport {
    pub shift: Shift,
    pub summary: ShiftSummary,
}

#[derive(Clone)]
pub struct ShiftService {
    repo: Arc<Repository>,
}

impl ShiftService {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    pub async fn open_shift(&self, opening_amount: Money) -> Result<Shift, CoreError> {
        self.open_shift_at(opening_amount, TimeMs::now()).await
    }

    /// Open a shift. At most one can be open; the database enforces it.
    pub async fn open_shift_at(
        &self,
        opening_amount: Money,
        now: TimeMs,
    ) -> Result<Shift, CoreError> {
        if opening_amount.is_negative() {
            return Err(Precondition::NegativeAmount.into());
        }

        let mut conn = self.repo.pool().acquire().await?;
        let shift = match Repository::insert_open_shift(&mut conn, opening_amount, now).await {
            Ok(shift) => shift,
            Err(e) if is_unique_violation(&e) => {
                return Err(Precondition::ShiftAlreadyOpen.into())
            }
            Err(e) => return Err(e.into()),
        };

        info!(shift_id = %shift.id, opening = %opening_amount, "shift opened");
        Ok(shift)
    }

    pub async fn active_shift(&self) -> Result<Option<Shift>, CoreError> {
        Ok(self.repo.get_open_shift().await?)
    }

    /// Totals of the live sales attached to a shift, or `None` if it does not exist.
    pub async fn summarize_shift(
        &self,
        shift_id: ShiftId,
    ) -> Result<Option<ShiftSummary>, CoreError> {
        if self.repo.get_shift(shift_id).await?.is_none() {
            return Ok(None);
        }
        let sales = self.repo.query_sales_for_shift(shift_id).await?;
        Ok(Some(summarize(&sales)))
    }

    pub async fn close_shift(
        &self,
        shift_id: ShiftId,
        closing_amount: Money,
    ) -> Result<ShiftReport, CoreError> {
        self.close_shift_at(shift_id, closing_amount, TimeMs::now())
            .await
    }

    /// Close an open shift against the counted cash.
    ///
    /// Expected cash is the opening float plus cash sales; the variance is
    /// what was counted minus what was expected.
    pub async fn close_shift_at(
        &self,
        shift_id: ShiftId,
        closing_amount: Money,
        now: TimeMs,
    ) -> Result<ShiftReport, CoreError> {
        if closing_amount.is_negative() {
            return Err(Precondition::NegativeAmount.into());
        }

        let mut tx = self.repo.begin().await?;

        let shift = load_shift(&mut tx, shift_id).await?;
        if !shift.is_open() {
            return Err(Precondition::ShiftClosed.into());
        }

        let sales = Repository::fetch_sales_for_shift(&mut *tx, shift_id).await?;
        let summary = summarize(&sales);
        let expected_cash = shift.opening_amount + summary.cash;

        if !Repository::close_shift(&mut *tx, shift_id, closing_amount, expected_cash, now).await? {
            return Err(Precondition::ShiftClosed.into());
        }
        let shift = load_shift(&mut tx, shift_id).await?;
        tx.commit().await?;

        let variance = closing_amount - expected_cash;
        if variance.is_zero() {
            info!(%shift_id, expected = %expected_cash, "shift closed");
        } else {
            warn!(
                %shift_id,
                expected = %expected_cash,
                counted = %closing_amount,
                %variance,
                "shift closed with cash variance"
            );
        }

        Ok(ShiftReport { shift, summary })
    }

    /// Attach unshifted live sales created during the shift's window.
    ///
    /// Returns the number of sales attached. An open shift's window runs up to now.
    pub async fn backfill_shift_sales(&self, shift_id: ShiftId) -> Result<u64, CoreError> {
        let mut tx = self.repo.begin().await?;

        let shift = load_shift(&mut tx, shift_id).await?;
        let until = shift.closed_at.unwrap_or_else(TimeMs::now);
        let attached =
            Repository::attach_orphan_sales(&mut *tx, shift_id, shift.opened_at, until).await?;
        tx.commit().await?;

        if attached > 0 && !shift.is_open() {
            warn!(
                %shift_id,
                attached,
                "sales attached to a closed shift, its cash count predates them"
            );
        } else {
            info!(%shift_id, attached, "shift backfill done");
        }
        Ok(attached)
    }
}

async fn load_shift(
    tx: &mut sqlx::Transaction<'static, sqlx::Sqlite>,
    shift_id: ShiftId,
) -> Result<Shift, CoreError> {
    Repository::fetch_shift(&mut **tx, shift_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("shift {}", shift_id)))
}
