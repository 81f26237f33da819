//! Rack-count games (straight pool, 8-ball, 9-ball): a log of rack winners.

use super::{Outcome, Player, WinReason};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RackState {
    /// Racks needed to win the match, if playing a race.
    pub race_to: Option<u32>,
    /// Winner of each rack, in order.
    pub racks: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RackEvent {
    RackWon { player: Player },
    /// Remove the most recent rack result.
    UndoRack,
}

impl RackState {
    pub fn race_to(race_to: u32) -> Self {
        RackState {
            race_to: Some(race_to),
            racks: Vec::new(),
        }
    }

    pub fn apply(&self, event: &RackEvent) -> RackState {
        let mut next = self.clone();
        match *event {
            RackEvent::RackWon { player } => next.racks.push(player),
            RackEvent::UndoRack => {
                next.racks.pop();
            }
        }
        next
    }

    pub fn wins(&self) -> [u32; 2] {
        self.racks.iter().fold([0, 0], |mut tally, p| {
            tally[p.index()] += 1;
            tally
        })
    }

    pub fn outcome(&self) -> Outcome {
        let Some(race_to) = self.race_to else {
            return Outcome::InProgress;
        };
        let wins = self.wins();
        [Player::One, Player::Two]
            .into_iter()
            .find(|p| wins[p.index()] >= race_to)
            .map_or(Outcome::InProgress, |player| Outcome::Winner {
                player,
                reason: WinReason::RaceWon,
            })
    }
}
