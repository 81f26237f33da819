//! Table sessions: one continuous paid occupancy of a table.

use crate::domain::{Money, SessionId, TableId, TimeMs};
use crate::engine::score::GameState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Closed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "ACTIVE",
            SessionStatus::Closed => "CLOSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(SessionStatus::Active),
            "CLOSED" => Some(SessionStatus::Closed),
            _ => None,
        }
    }
}

/// A table session.
///
/// `end_time`, `duration_min` and `total_amount` are set together when the
/// session is settled; `end_time` is `None` exactly while the session is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub table_id: TableId,
    pub start_time: TimeMs,
    pub end_time: Option<TimeMs>,
    pub status: SessionStatus,
    pub duration_min: Option<i64>,
    pub total_amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_state: Option<GameState>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}
