//! Chilean pool: ball-value scoring with foul transfer.
//!
//! Each ball is worth its number (1..=15, 120 points in total). A foul moves
//! half of its point value from the offender to the opponent, so fouls never
//! change the sum of both net scores.

use super::{half, higher_of, Outcome, Player, ScoreError, WinReason};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const HIGHEST_BALL: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChileanRules {
    /// Sum of all ball values on the table.
    pub total_points: u32,
    pub early_win_threshold: u32,
    /// When set, any net score above the threshold wins (60.5 beats 60).
    /// Otherwise a whole point more is needed (61 or better).
    pub strict: bool,
}

impl ChileanRules {
    pub fn wins_early(&self, net: Decimal) -> bool {
        let threshold = Decimal::from(self.early_win_threshold);
        if self.strict {
            net > threshold
        } else {
            net >= threshold + Decimal::ONE
        }
    }
}

impl Default for ChileanRules {
    fn default() -> Self {
        ChileanRules {
            total_points: 120,
            early_win_threshold: 60,
            strict: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChileanState {
    /// Ball numbers pocketed by each player.
    pub balls: [Vec<u8>; 2],
    /// Cumulative foul points committed by each player.
    pub fouls: [u32; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChileanEvent {
    BallPocketed { player: Player, ball: u8 },
    /// Referee correction: a ball credited to `player` goes back on the table.
    BallReturned { player: Player, ball: u8 },
    Foul { player: Player, points: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerScore {
    pub raw: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub net: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChileanScore {
    pub players: [PlayerScore; 2],
    /// Points still on the table.
    pub remaining: i64,
    pub outcome: Outcome,
}

impl ChileanState {
    pub fn apply(&self, event: &ChileanEvent) -> Result<ChileanState, ScoreError> {
        let mut next = self.clone();
        match *event {
            ChileanEvent::BallPocketed { player, ball } => {
                if !(1..=HIGHEST_BALL).contains(&ball) {
                    return Err(ScoreError::InvalidBall {
                        ball,
                        reason: "ball numbers run from 1 to 15",
                    });
                }
                if self.balls.iter().any(|owned| owned.contains(&ball)) {
                    return Err(ScoreError::InvalidBall {
                        ball,
                        reason: "already pocketed",
                    });
                }
                next.balls[player.index()].push(ball);
            }
            ChileanEvent::BallReturned { player, ball } => {
                let owned = &mut next.balls[player.index()];
                match owned.iter().position(|b| *b == ball) {
                    Some(pos) => {
                        owned.remove(pos);
                    }
                    None => {
                        return Err(ScoreError::InvalidBall {
                            ball,
                            reason: "not pocketed by this player",
                        })
                    }
                }
            }
            ChileanEvent::Foul { player, points } => {
                let fouls = &mut next.fouls[player.index()];
                *fouls = fouls.saturating_add(points);
            }
        }
        Ok(next)
    }

    pub fn raw_score(&self, player: Player) -> u32 {
        self.balls[player.index()].iter().map(|b| u32::from(*b)).sum()
    }

    /// Raw points minus half of own fouls plus half of the opponent's fouls.
    pub fn net_score(&self, player: Player) -> Decimal {
        let own = self.fouls[player.index()];
        let theirs = self.fouls[player.opponent().index()];
        Decimal::from(self.raw_score(player)) - half(own) + half(theirs)
    }

    pub fn score(&self, rules: &ChileanRules) -> ChileanScore {
        let players = [Player::One, Player::Two].map(|p| PlayerScore {
            raw: self.raw_score(p),
            net: self.net_score(p),
        });
        let pocketed: i64 = players.iter().map(|s| i64::from(s.raw)).sum();
        let remaining = i64::from(rules.total_points) - pocketed;

        ChileanScore {
            players,
            remaining,
            outcome: decide(players.map(|s| s.net), remaining, rules),
        }
    }
}

fn decide(net: [Decimal; 2], remaining: i64, rules: &ChileanRules) -> Outcome {
    let over = net.map(|n| rules.wins_early(n));

    match over {
        [true, true] => higher_of(net, WinReason::EarlyMajority),
        [true, false] => Outcome::Winner {
            player: Player::One,
            reason: WinReason::EarlyMajority,
        },
        [false, true] => Outcome::Winner {
            player: Player::Two,
            reason: WinReason::EarlyMajority,
        },
        [false, false] if remaining <= 0 => match higher_of(net, WinReason::EndOfRack) {
            Outcome::Inconsistent => Outcome::Draw,
            decided => decided,
        },
        [false, false] => Outcome::InProgress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pocket(state: ChileanState, player: Player, balls: &[u8]) -> ChileanState {
        balls.iter().fold(state, |s, &ball| {
            s.apply(&ChileanEvent::BallPocketed { player, ball }).unwrap()
        })
    }

    fn foul(state: ChileanState, player: Player, points: u32) -> ChileanState {
        state.apply(&ChileanEvent::Foul { player, points }).unwrap()
    }

    fn d(n: &str) -> Decimal {
        n.parse().unwrap()
    }

    #[test]
    fn test_net_score_transfers_half_of_fouls() {
        let s = pocket(ChileanState::default(), Player::One, &[15, 14]);
        let s = pocket(s, Player::Two, &[1, 2]);
        let s = foul(s, Player::One, 7);

        assert_eq!(s.raw_score(Player::One), 29);
        assert_eq!(s.net_score(Player::One), d("25.5"));
        assert_eq!(s.net_score(Player::Two), d("6.5"));
    }

    #[test]
    fn test_fouls_are_zero_sum() {
        let mut s = pocket(ChileanState::default(), Player::One, &[3, 9, 11]);
        s = pocket(s, Player::Two, &[4, 5, 13]);
        for (player, points) in [(Player::One, 3), (Player::Two, 7), (Player::One, 10)] {
            s = foul(s, player, points);
            let net_sum = s.net_score(Player::One) + s.net_score(Player::Two);
            let raw_sum = s.raw_score(Player::One) + s.raw_score(Player::Two);
            assert_eq!(net_sum, Decimal::from(raw_sum));
        }
    }

    #[test]
    fn test_remaining_points() {
        let s = pocket(ChileanState::default(), Player::One, &[1, 2, 3]);
        let s = pocket(s, Player::Two, &[10]);
        assert_eq!(s.score(&ChileanRules::default()).remaining, 104);
    }

    #[test]
    fn test_early_win_above_sixty_with_balls_remaining() {
        let s = pocket(ChileanState::default(), Player::Two, &[15, 14, 13, 12, 7]);
        let score = s.score(&ChileanRules::default());
        assert_eq!(s.raw_score(Player::Two), 61);
        assert!(score.remaining > 0);
        assert_eq!(
            score.outcome,
            Outcome::Winner {
                player: Player::Two,
                reason: WinReason::EarlyMajority
            }
        );
    }

    #[test]
    fn test_exactly_sixty_is_not_a_win() {
        let s = pocket(ChileanState::default(), Player::One, &[15, 14, 13, 12, 6]);
        assert_eq!(s.net_score(Player::One), d("60"));
        assert_eq!(s.score(&ChileanRules::default()).outcome, Outcome::InProgress);
    }

    #[test]
    fn test_foul_transfer_can_trigger_early_win() {
        let s = pocket(ChileanState::default(), Player::One, &[15, 14, 13, 12, 5]);
        assert_eq!(s.score(&ChileanRules::default()).outcome, Outcome::InProgress);
        let s = foul(s, Player::Two, 4);
        assert_eq!(s.net_score(Player::One), d("61"));
        assert_eq!(
            s.score(&ChileanRules::default()).outcome.winner(),
            Some(Player::One)
        );
    }

    #[test]
    fn test_half_point_over_threshold_depends_on_strictness() {
        let s = pocket(ChileanState::default(), Player::One, &[15, 14, 13, 12, 5]);
        let s = foul(s, Player::Two, 3);
        assert_eq!(s.net_score(Player::One), d("60.5"));

        let strict = ChileanRules::default();
        assert_eq!(s.score(&strict).outcome.winner(), Some(Player::One));

        let whole_point = ChileanRules {
            strict: false,
            ..ChileanRules::default()
        };
        assert_eq!(s.score(&whole_point).outcome, Outcome::InProgress);

        let s = foul(s, Player::Two, 1);
        assert_eq!(s.net_score(Player::One), d("61"));
        assert_eq!(s.score(&whole_point).outcome.winner(), Some(Player::One));
    }

    #[test]
    fn test_early_win_fires_before_rack_ends_for_any_order() {
        let rules = ChileanRules::default();
        let order: Vec<u8> = (1..=15).rev().collect();
        let mut s = ChileanState::default();
        let mut decided_with_remaining = None;
        for (i, ball) in order.into_iter().enumerate() {
            let player = if i % 3 == 0 { Player::Two } else { Player::One };
            s = s.apply(&ChileanEvent::BallPocketed { player, ball }).unwrap();
            let score = s.score(&rules);
            if score.players.iter().any(|p| p.net > Decimal::from(60)) {
                assert!(score.outcome.winner().is_some());
                decided_with_remaining.get_or_insert(score.remaining);
            }
        }
        assert!(decided_with_remaining.is_some());
    }

    #[test]
    fn test_end_of_rack_winner_and_draw() {
        let rules = ChileanRules {
            total_points: 10,
            ..ChileanRules::default()
        };
        let s = pocket(ChileanState::default(), Player::One, &[1, 2, 3]);
        let s = pocket(s, Player::Two, &[4]);
        assert_eq!(
            s.score(&rules).outcome,
            Outcome::Winner {
                player: Player::One,
                reason: WinReason::EndOfRack
            }
        );

        let s = foul(s, Player::One, 2);
        assert_eq!(s.net_score(Player::One), d("5"));
        assert_eq!(s.net_score(Player::Two), d("5"));
        assert_eq!(s.score(&rules).outcome, Outcome::Draw);
    }

    #[test]
    fn test_both_over_threshold_prefers_higher_or_flags_tie() {
        assert_eq!(
            decide([d("70"), d("65")], 0, &ChileanRules::default()).winner(),
            Some(Player::One)
        );
        assert_eq!(
            decide([d("61"), d("61")], 0, &ChileanRules::default()),
            Outcome::Inconsistent
        );
    }

    #[test]
    fn test_invalid_balls_rejected() {
        let s = pocket(ChileanState::default(), Player::One, &[8]);
        assert!(matches!(
            s.apply(&ChileanEvent::BallPocketed {
                player: Player::Two,
                ball: 8
            }),
            Err(ScoreError::InvalidBall { ball: 8, .. })
        ));
        assert!(matches!(
            s.apply(&ChileanEvent::BallPocketed {
                player: Player::Two,
                ball: 16
            }),
            Err(ScoreError::InvalidBall { ball: 16, .. })
        ));
        assert!(matches!(
            s.apply(&ChileanEvent::BallPocketed {
                player: Player::Two,
                ball: 0
            }),
            Err(ScoreError::InvalidBall { ball: 0, .. })
        ));
    }

    #[test]
    fn test_ball_returned() {
        let s = pocket(ChileanState::default(), Player::One, &[8, 9]);
        let s = s
            .apply(&ChileanEvent::BallReturned {
                player: Player::One,
                ball: 8,
            })
            .unwrap();
        assert_eq!(s.balls[0], vec![9]);
        assert!(s
            .apply(&ChileanEvent::BallReturned {
                player: Player::Two,
                ball: 9
            })
            .is_err());
    }
}
