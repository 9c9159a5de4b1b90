//! Elo helper with an adaptive K-factor.
//!
//! Newcomers (fewer than 30 ranked games) move fast with K = 40, established
//! players use K = 20 and players at 2400+ settle with K = 10.

use serde::{Deserialize, Serialize};

use crate::db::models::MatchType;

pub const DEFAULT_RATING: i32 = 1000;
pub const RATING_FLOOR: i32 = 100;
pub const PROVISIONAL_GAMES: i32 = 30;
pub const MASTER_RATING: i32 = 2400;

/// Probability that `player` beats `opponent`.
pub fn expected_score(player: i32, opponent: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - player) as f64 / 400.0))
}

pub fn k_factor(rating: i32, games_played: i32) -> i32 {
    if games_played < PROVISIONAL_GAMES {
        40
    } else if rating < MASTER_RATING {
        20
    } else {
        10
    }
}

/// New rating after applying `delta`, never below [`RATING_FLOOR`].
pub fn apply_delta(current: i32, delta: i32) -> i32 {
    (current + delta).max(RATING_FLOOR)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingUpdate {
    pub winner_delta: i32,
    pub loser_delta: i32,
    pub winner_new: i32,
    pub loser_new: i32,
}

/// Rating changes for a finished ranked match.
///
/// Both sides are measured against the winner's expectation: the winner
/// gains `K_w * (1 - E_w)` and the loser gives up `K_l * E_w`, so beating a
/// much weaker opponent earns little while the weaker side still pays most of
/// its K-factor.
pub fn calculate(
    winner_rating: i32,
    loser_rating: i32,
    winner_games: i32,
    loser_games: i32,
) -> RatingUpdate {
    let expected_winner = expected_score(winner_rating, loser_rating);
    let k_winner = k_factor(winner_rating, winner_games) as f64;
    let k_loser = k_factor(loser_rating, loser_games) as f64;

    let winner_delta = (k_winner * (1.0 - expected_winner)).round() as i32;
    let loser_delta = (k_loser * (0.0 - expected_winner)).round() as i32;

    RatingUpdate {
        winner_delta,
        loser_delta,
        winner_new: winner_rating + winner_delta,
        loser_new: apply_delta(loser_rating, loser_delta),
    }
}

/// Deltas for one possible result of a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeDeltas {
    pub winner_delta: i32,
    pub loser_delta: i32,
}

/// Both possible results, fixed when the match is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecomputedDeltas {
    pub if_player1_wins: OutcomeDeltas,
    pub if_player2_wins: OutcomeDeltas,
}

impl PrecomputedDeltas {
    /// Compute both outcomes from the ratings at pairing time.
    /// Only ranked matches move ratings; every other category is all zeros.
    pub fn precompute(
        match_type: MatchType,
        player1_rating: i32,
        player1_games: i32,
        player2_rating: i32,
        player2_games: i32,
    ) -> Self {
        if match_type != MatchType::Ranked {
            return Self::default();
        }

        let p1 = calculate(player1_rating, player2_rating, player1_games, player2_games);
        let p2 = calculate(player2_rating, player1_rating, player2_games, player1_games);
        PrecomputedDeltas {
            if_player1_wins: OutcomeDeltas {
                winner_delta: p1.winner_delta,
                loser_delta: p1.loser_delta,
            },
            if_player2_wins: OutcomeDeltas {
                winner_delta: p2.winner_delta,
                loser_delta: p2.loser_delta,
            },
        }
    }

    /// `(player1_delta, player2_delta)` for the given winner.
    pub fn resolve(&self, player1_won: bool) -> (i32, i32) {
        if player1_won {
            (self.if_player1_wins.winner_delta, self.if_player1_wins.loser_delta)
        } else {
            (self.if_player2_wins.loser_delta, self.if_player2_wins.winner_delta)
        }
    }
}
