//! Carom billiards: innings-based scoring with run tracking.

use super::{higher_of, Outcome, Player, ScoreError, WinReason};
use serde::{Deserialize, Serialize};

/// Per-turn timer with a limited number of extensions per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotClock {
    pub seconds_per_shot: u32,
    pub extensions_remaining: [u32; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaromState {
    pub scores: [u32; 2],
    pub fouls: [u32; 2],
    /// Completed innings (both players have had their turn).
    pub innings: u32,
    pub turn: Player,
    pub current_run: u32,
    pub high_run: [u32; 2],
    pub target: Option<u32>,
    pub innings_limit: Option<u32>,
    pub shot_clock: Option<ShotClock>,
    pub walkover: Option<Player>,
}

impl Default for CaromState {
    fn default() -> Self {
        CaromState {
            scores: [0, 0],
            fouls: [0, 0],
            innings: 0,
            turn: Player::One,
            current_run: 0,
            high_run: [0, 0],
            target: None,
            innings_limit: None,
            shot_clock: None,
            walkover: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CaromEvent {
    /// The player at the table scores one point.
    Point,
    /// Penalty points deducted from `player`; a foul by the shooter ends the turn.
    Foul { player: Player, points: u32 },
    EndTurn,
    UseExtension { player: Player },
    /// Referee-declared win.
    Walkover { winner: Player },
}

impl CaromState {
    pub fn with_limits(target: Option<u32>, innings_limit: Option<u32>) -> Self {
        CaromState {
            target,
            innings_limit,
            ..CaromState::default()
        }
    }

    pub fn apply(&self, event: &CaromEvent) -> Result<CaromState, ScoreError> {
        let mut next = self.clone();
        match *event {
            CaromEvent::Point => {
                let i = next.turn.index();
                next.scores[i] += 1;
                next.current_run += 1;
                next.high_run[i] = next.high_run[i].max(next.current_run);
            }
            CaromEvent::Foul { player, points } => {
                next.fouls[player.index()] = next.fouls[player.index()].saturating_add(points);
                if player == next.turn {
                    next.end_turn();
                }
            }
            CaromEvent::EndTurn => next.end_turn(),
            CaromEvent::UseExtension { player } => {
                let clock = next.shot_clock.as_mut().ok_or(ScoreError::ShotClockDisabled)?;
                let left = &mut clock.extensions_remaining[player.index()];
                if *left == 0 {
                    return Err(ScoreError::NoExtensionsLeft);
                }
                *left -= 1;
            }
            CaromEvent::Walkover { winner } => next.walkover = Some(winner),
        }
        Ok(next)
    }

    fn end_turn(&mut self) {
        if self.turn == Player::Two {
            self.innings += 1;
        }
        self.turn = self.turn.opponent();
        self.current_run = 0;
    }

    /// Score minus foul deductions.
    pub fn net_scores(&self) -> [i64; 2] {
        [0, 1].map(|i| i64::from(self.scores[i]) - i64::from(self.fouls[i]))
    }

    pub fn outcome(&self) -> Outcome {
        if let Some(player) = self.walkover {
            return Outcome::Winner {
                player,
                reason: WinReason::Walkover,
            };
        }

        let net = self.net_scores();
        if let Some(target) = self.target {
            let target = i64::from(target);
            match net.map(|n| n >= target) {
                [true, true] => return higher_of(net, WinReason::TargetReached),
                [true, false] => {
                    return Outcome::Winner {
                        player: Player::One,
                        reason: WinReason::TargetReached,
                    }
                }
                [false, true] => {
                    return Outcome::Winner {
                        player: Player::Two,
                        reason: WinReason::TargetReached,
                    }
                }
                [false, false] => {}
            }
        }

        match self.innings_limit {
            Some(limit) if self.innings >= limit => {
                match higher_of(net, WinReason::InningsLimit) {
                    Outcome::Inconsistent => Outcome::Draw,
                    decided => decided,
                }
            }
            _ => Outcome::InProgress,
        }
    }
}
