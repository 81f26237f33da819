//! Pure computation engines: tariff, shift ledger, and game scoring.
//!
//! Nothing in here touches the database; the orchestration layer feeds these
//! functions with loaded records and persists what they return.

pub mod ledger;
pub mod score;
pub mod tariff;

pub use ledger::{summarize, ShiftSummary, TypeTotals};
pub use score::{apply_event, GameEvent, GameState, GameType, Outcome, Player, ScoreRules};
pub use tariff::{compute_charge, Tariff, TimeCharge};
