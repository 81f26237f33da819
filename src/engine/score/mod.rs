//! Score engine for the supported cue-sport variants.
//!
//! Every variant is a pure reducer: `apply_event` takes the current state by
//! reference and returns a new one. Persisting the returned state is the
//! caller's job; the engine knows nothing about sessions or storage.

pub mod carom;
pub mod chilean;
pub mod rack;
pub mod snooker;

pub use carom::{CaromEvent, CaromState, ShotClock};
pub use chilean::{ChileanEvent, ChileanRules, ChileanScore, ChileanState, PlayerScore};
pub use rack::{RackEvent, RackState};
pub use snooker::{FrameResult, SnookerEvent, SnookerState};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the two players at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WinReason {
    /// Chilean pool: net score passed the majority threshold.
    EarlyMajority,
    /// Chilean pool: all balls pocketed, higher net score.
    EndOfRack,
    TargetReached,
    InningsLimit,
    Walkover,
    RaceWon,
    FramesWon,
}

/// Derived result of a game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    InProgress,
    Winner { player: Player, reason: WinReason },
    Draw,
    /// Both players satisfy a win condition with identical scores. Only
    /// reachable from inconsistent input; surfaced instead of picking a side.
    Inconsistent,
}

impl Outcome {
    pub fn winner(&self) -> Option<Player> {
        match self {
            Outcome::Winner { player, .. } => Some(*player),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// Pick a winner between two scores that both satisfy a win condition.
pub(crate) fn higher_of<T: PartialOrd>(scores: [T; 2], reason: WinReason) -> Outcome {
    if scores[0] > scores[1] {
        Outcome::Winner {
            player: Player::One,
            reason,
        }
    } else if scores[1] > scores[0] {
        Outcome::Winner {
            player: Player::Two,
            reason,
        }
    } else {
        Outcome::Inconsistent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameType {
    Pool,
    Carom,
    Chilean,
    Snooker,
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GameType::Pool => "POOL",
            GameType::Carom => "CAROM",
            GameType::Chilean => "CHILEAN",
            GameType::Snooker => "SNOOKER",
        };
        f.write_str(s)
    }
}

/// Per-session game state, keyed by game type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "gameType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    Pool(RackState),
    Carom(CaromState),
    Chilean(ChileanState),
    Snooker(SnookerState),
}

/// A scoring event, keyed by the game type it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "gameType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    Pool(RackEvent),
    Carom(CaromEvent),
    Chilean(ChileanEvent),
    Snooker(SnookerEvent),
}

impl GameEvent {
    pub fn game_type(&self) -> GameType {
        match self {
            GameEvent::Pool(_) => GameType::Pool,
            GameEvent::Carom(_) => GameType::Carom,
            GameEvent::Chilean(_) => GameType::Chilean,
            GameEvent::Snooker(_) => GameType::Snooker,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("event for {event} cannot be applied to a {state} game")]
    VariantMismatch { state: GameType, event: GameType },
    #[error("invalid ball {ball}: {reason}")]
    InvalidBall { ball: u8, reason: &'static str },
    #[error("shot clock is not enabled for this game")]
    ShotClockDisabled,
    #[error("no shot clock extensions left")]
    NoExtensionsLeft,
}

/// House rules consulted when deriving results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreRules {
    pub chilean: ChileanRules,
}

/// Derived metrics for display next to the raw state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "gameType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Standing {
    #[serde(rename_all = "camelCase")]
    Pool { wins: [u32; 2], outcome: Outcome },
    #[serde(rename_all = "camelCase")]
    Carom {
        net_scores: [i64; 2],
        innings: u32,
        outcome: Outcome,
    },
    Chilean(ChileanScore),
    #[serde(rename_all = "camelCase")]
    Snooker {
        scores: [u32; 2],
        frames: [u32; 2],
        outcome: Outcome,
    },
}

impl GameState {
    /// A fresh game with no targets or limits.
    pub fn new(game_type: GameType) -> Self {
        match game_type {
            GameType::Pool => GameState::Pool(RackState::default()),
            GameType::Carom => GameState::Carom(CaromState::default()),
            GameType::Chilean => GameState::Chilean(ChileanState::default()),
            GameType::Snooker => GameState::Snooker(SnookerState::default()),
        }
    }

    pub fn game_type(&self) -> GameType {
        match self {
            GameState::Pool(_) => GameType::Pool,
            GameState::Carom(_) => GameType::Carom,
            GameState::Chilean(_) => GameType::Chilean,
            GameState::Snooker(_) => GameType::Snooker,
        }
    }

    pub fn outcome(&self, rules: &ScoreRules) -> Outcome {
        match self {
            GameState::Pool(s) => s.outcome(),
            GameState::Carom(s) => s.outcome(),
            GameState::Chilean(s) => s.score(&rules.chilean).outcome,
            GameState::Snooker(s) => s.outcome(),
        }
    }

    pub fn standing(&self, rules: &ScoreRules) -> Standing {
        match self {
            GameState::Pool(s) => Standing::Pool {
                wins: s.wins(),
                outcome: s.outcome(),
            },
            GameState::Carom(s) => Standing::Carom {
                net_scores: s.net_scores(),
                innings: s.innings,
                outcome: s.outcome(),
            },
            GameState::Chilean(s) => Standing::Chilean(s.score(&rules.chilean)),
            GameState::Snooker(s) => Standing::Snooker {
                scores: s.scores,
                frames: s.frames,
                outcome: s.outcome(),
            },
        }
    }
}

/// Apply one scoring event, returning the next state.
///
/// # Errors
/// `VariantMismatch` when the event belongs to a different game type, plus the
/// variant-specific validation errors.
pub fn apply_event(state: &GameState, event: &GameEvent) -> Result<GameState, ScoreError> {
    match (state, event) {
        (GameState::Pool(s), GameEvent::Pool(e)) => Ok(GameState::Pool(s.apply(e))),
        (GameState::Carom(s), GameEvent::Carom(e)) => s.apply(e).map(GameState::Carom),
        (GameState::Chilean(s), GameEvent::Chilean(e)) => s.apply(e).map(GameState::Chilean),
        (GameState::Snooker(s), GameEvent::Snooker(e)) => Ok(GameState::Snooker(s.apply(e))),
        _ => Err(ScoreError::VariantMismatch {
            state: state.game_type(),
            event: event.game_type(),
        }),
    }
}

pub(crate) fn half(points: u32) -> Decimal {
    Decimal::from(points) / Decimal::TWO
}
