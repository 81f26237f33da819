pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::{Config, ShiftPolicy};
pub use db::{init_db, Repository};
pub use domain::{
    Member, MemberId, Money, PaymentMethod, Permission, Role, Sale, SaleType, Session, SessionId,
    Shift, ShiftId, Staff, StaffId, Table, TableId, TimeMs,
};
pub use error::{AppError, CoreError};
pub use orchestration::{BroadcastNotifier, Notifier, SalesService, SessionService, ShiftService};
