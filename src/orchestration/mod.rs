//! Core operations composed from repository steps and the pure engines.
//!
//! Each service owns the transaction boundary of its operations: a failure at
//! any step drops the transaction, which rolls back everything written so far.

pub mod notify;
pub mod sales;
pub mod sessions;
pub mod shifts;

pub use notify::{BroadcastNotifier, DomainEvent, Notifier, RecordingNotifier};
pub use sales::{MemberAccount, NewSale, PaymentReceipt, SalesService};
pub use sessions::{GameProgress, SessionService, Settlement};
pub use shifts::{ShiftReport, ShiftService};

use crate::config::ShiftPolicy;
use crate::db::Repository;
use crate::domain::{Member, MemberId, Money, ShiftId};
use crate::error::{CoreError, Policy, Precondition};
use sqlx::sqlite::SqliteConnection;
use tracing::warn;

/// Find the shift a new sale belongs to.
///
/// With [`ShiftPolicy::Required`] a sale without an open shift is refused; with
/// [`ShiftPolicy::Optional`] it is recorded unattached for a later backfill.
pub(crate) async fn resolve_open_shift(
    conn: &mut SqliteConnection,
    policy: ShiftPolicy,
) -> Result<Option<ShiftId>, CoreError> {
    match Repository::fetch_open_shift(conn).await? {
        Some(shift) => Ok(Some(shift.id)),
        None => match policy {
            ShiftPolicy::Required => Err(Precondition::NoOpenShift.into()),
            ShiftPolicy::Optional => {
                warn!("no open shift, recording sale without a shift");
                Ok(None)
            }
        },
    }
}

pub(crate) async fn load_member(
    conn: &mut SqliteConnection,
    member_id: MemberId,
) -> Result<Member, CoreError> {
    Repository::fetch_member(conn, member_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("member {}", member_id)))
}

/// Check the credit limit and add `amount` to the member's debt.
///
/// Nothing is written when the limit would be exceeded.
pub(crate) async fn charge_to_account(
    conn: &mut SqliteConnection,
    member: &Member,
    amount: Money,
) -> Result<Member, CoreError> {
    if !member.can_charge(amount) {
        return Err(Policy::CreditLimitExceeded {
            limit: member.debt_limit,
            current_debt: member.current_debt,
            charge: amount,
        }
        .into());
    }
    adjust_debt(conn, member, member.current_debt + amount).await
}

pub(crate) async fn adjust_debt(
    conn: &mut SqliteConnection,
    member: &Member,
    new_debt: Money,
) -> Result<Member, CoreError> {
    if !Repository::swap_member_debt(conn, member.id, member.current_debt, new_debt).await? {
        return Err(Precondition::StaleState.into());
    }
    Ok(Member {
        current_debt: new_debt,
        ..member.clone()
    })
}
