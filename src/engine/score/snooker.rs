//! Snooker: frame scores and frames won. Frame results come from the referee.

use super::{Outcome, Player, WinReason};
use serde::{Deserialize, Serialize};

/// Minimum points awarded to the opponent for a foul.
pub const MIN_FOUL_POINTS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameResult {
    pub winner: Player,
    pub scores: [u32; 2],
    pub conceded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnookerState {
    /// Scores in the current frame.
    pub scores: [u32; 2],
    pub frames: [u32; 2],
    pub best_of: Option<u32>,
    pub frame_history: Vec<FrameResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SnookerEvent {
    Points { player: Player, points: u32 },
    /// Foul by `player`; the opponent receives the penalty (at least 4).
    Foul { player: Player, points: u32 },
    FrameWon { player: Player },
    FrameConceded { player: Player },
}

impl SnookerState {
    pub fn best_of(frames: u32) -> Self {
        SnookerState {
            best_of: Some(frames),
            ..SnookerState::default()
        }
    }

    pub fn apply(&self, event: &SnookerEvent) -> SnookerState {
        let mut next = self.clone();
        match *event {
            SnookerEvent::Points { player, points } => {
                let score = &mut next.scores[player.index()];
                *score = score.saturating_add(points);
            }
            SnookerEvent::Foul { player, points } => {
                let score = &mut next.scores[player.opponent().index()];
                *score = score.saturating_add(points.max(MIN_FOUL_POINTS));
            }
            SnookerEvent::FrameWon { player } => next.close_frame(player, false),
            SnookerEvent::FrameConceded { player } => next.close_frame(player.opponent(), true),
        }
        next
    }

    fn close_frame(&mut self, winner: Player, conceded: bool) {
        self.frame_history.push(FrameResult {
            winner,
            scores: self.scores,
            conceded,
        });
        self.frames[winner.index()] += 1;
        self.scores = [0, 0];
    }

    pub fn outcome(&self) -> Outcome {
        let Some(best_of) = self.best_of else {
            return Outcome::InProgress;
        };
        let needed = best_of / 2 + 1;
        [Player::One, Player::Two]
            .into_iter()
            .find(|p| self.frames[p.index()] >= needed)
            .map_or(Outcome::InProgress, |player| Outcome::Winner {
                player,
                reason: WinReason::FramesWon,
            })
    }
}
