//! Billiard tables.

use crate::domain::{Money, SessionId, TableId};
use serde::{Deserialize, Serialize};

/// Occupancy status of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    Available,
    Occupied,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Available => "AVAILABLE",
            TableStatus::Occupied => "OCCUPIED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AVAILABLE" => Some(TableStatus::Available),
            "OCCUPIED" => Some(TableStatus::Occupied),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: TableId,
    pub name: String,
    /// Table-specific tariff. Falls back to the configured default rate when absent.
    pub hourly_rate: Option<Money>,
    pub status: TableStatus,
    pub active_session_id: Option<SessionId>,
}

impl Table {
    pub fn is_available(&self) -> bool {
        self.status == TableStatus::Available
    }
}
