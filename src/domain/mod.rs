//! Domain types for the cue club service.
//!
//! This module provides:
//! - Lossless money amounts (`Money`) and millisecond timestamps
//! - Typed record identifiers
//! - Tables, sessions, sales, members, shifts
//! - Staff roles with overridable permissions

pub mod member;
pub mod money;
pub mod permissions;
pub mod primitives;
pub mod sale;
pub mod session;
pub mod shift;
pub mod table;

pub use member::Member;
pub use money::Money;
pub use permissions::{Permission, PermissionOverrides, Role, Staff};
pub use primitives::{MemberId, SaleId, SessionId, ShiftId, StaffId, TableId, TimeMs};
pub use sale::{PaymentMethod, Sale, SaleDraft, SaleItem, SaleType};
pub use session::{Session, SessionStatus};
pub use shift::{Shift, ShiftStatus};
pub use table::{Table, TableStatus};
