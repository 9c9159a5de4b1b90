//! Pure scoring rules for one Pong match.

use serde::Serialize;
use thiserror::Error;

use crate::db::models::{Match, MatchStatus, MatchType, Side};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoreError {
    #[error("match already finished")]
    Finished,
    #[error("{0} is not playing in this match")]
    NotAParticipant(String),
    #[error("stale or out-of-order point (expected rally {expected}, got {got})")]
    OutOfOrder { expected: u32, got: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOutcome {
    Continue,
    Finished { winner: Side },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scoreboard {
    pub player1_score: i32,
    pub player2_score: i32,
    pub winning_score: i32,
    pub winner: Option<Side>,
}

impl Scoreboard {
    pub fn new(winning_score: i32) -> Self {
        Scoreboard {
            player1_score: 0,
            player2_score: 0,
            winning_score,
            winner: None,
        }
    }

    /// Mirror a stored match row.
    pub fn from_match(m: &Match, winning_score: i32) -> Self {
        let winner = if m.status == MatchStatus::Completed {
            m.winner.as_deref().and_then(|w| m.side_of(w))
        } else {
            None
        };
        Scoreboard {
            player1_score: m.player1_score,
            player2_score: m.player2_score,
            winning_score,
            winner,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    /// Points played so far.
    pub fn rallies(&self) -> u32 {
        (self.player1_score + self.player2_score) as u32
    }

    /// Both clients report every point; only the report for the next rally
    /// counts, duplicates and stale reports are rejected.
    pub fn check_rally(&self, rally: u32) -> Result<(), ScoreError> {
        let expected = self.rallies() + 1;
        if rally == expected {
            Ok(())
        } else {
            Err(ScoreError::OutOfOrder { expected, got: rally })
        }
    }

    pub fn score(&self, side: Side) -> i32 {
        match side {
            Side::Player1 => self.player1_score,
            Side::Player2 => self.player2_score,
        }
    }

    pub fn score_point(&mut self, side: Side) -> Result<ScoreOutcome, ScoreError> {
        if self.is_finished() {
            return Err(ScoreError::Finished);
        }
        match side {
            Side::Player1 => self.player1_score += 1,
            Side::Player2 => self.player2_score += 1,
        }
        if self.score(side) >= self.winning_score {
            self.winner = Some(side);
            Ok(ScoreOutcome::Finished { winner: side })
        } else {
            Ok(ScoreOutcome::Continue)
        }
    }

    /// `loser` gives up; returns the winning side.
    pub fn forfeit(&mut self, loser: Side) -> Result<Side, ScoreError> {
        if self.is_finished() {
            return Err(ScoreError::Finished);
        }
        let winner = loser.other();
        self.winner = Some(winner);
        Ok(winner)
    }
}

/// How a finished match changes the players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResolution {
    pub winner: String,
    pub loser: String,
    /// Only ranked matches move ratings.
    pub rated: bool,
    pub player1_delta: i32,
    pub player2_delta: i32,
}

/// Resolve the stored outcome deltas for `winner`; nothing is recomputed.
pub fn resolution(m: &Match, winner: Side) -> MatchResolution {
    let rated = m.match_type == MatchType::Ranked;
    let (player1_delta, player2_delta) = if rated {
        m.precomputed().resolve(winner == Side::Player1)
    } else {
        (0, 0)
    };
    MatchResolution {
        winner: m.player(winner).to_owned(),
        loser: m.player(winner.other()).to_owned(),
        rated,
        player1_delta,
        player2_delta,
    }
}
