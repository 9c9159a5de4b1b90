use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::rating::{OutcomeDeltas, PrecomputedDeltas};

/// A text column held a value none of the enum variants map to.
#[derive(Debug, Error)]
#[error("unknown {kind} value {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Text-backed enums stored as lower snake_case in Postgres.
macro_rules! text_enum {
    ($name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant { kind: $kind, value: other.to_owned() }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownVariant;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Unranked,
    Ranked,
    Friendly,
}
text_enum!(MatchType, "match type" {
    Unranked => "unranked",
    Ranked => "ranked",
    Friendly => "friendly",
});

impl MatchType {
    /// Friendly matches only come from accepted challenges.
    pub fn is_queueable(&self) -> bool {
        !matches!(self, MatchType::Friendly)
    }
}

/// Match life-cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}
text_enum!(MatchStatus, "match status" {
    Pending => "pending",
    InProgress => "in_progress",
    Completed => "completed",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Waiting,
    Matched,
    Cancelled,
}
text_enum!(QueueStatus, "queue status" {
    Waiting => "waiting",
    Matched => "matched",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
}
text_enum!(InvitationStatus, "invitation status" {
    Pending => "pending",
    Accepted => "accepted",
    Declined => "declined",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    MatchFound,
    MatchResult,
    ChallengeReceived,
    ChallengeAccepted,
    ChallengeDeclined,
    FriendAdded,
}
text_enum!(NotificationKind, "notification kind" {
    MatchFound => "match_found",
    MatchResult => "match_result",
    ChallengeReceived => "challenge_received",
    ChallengeAccepted => "challenge_accepted",
    ChallengeDeclined => "challenge_declined",
    FriendAdded => "friend_added",
});

/// Which seat of a match a player occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player1,
    Player2,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Player1 => Side::Player2,
            Side::Player2 => Side::Player1,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Player {
    /// Login handle from the identity provider; the player's key.
    pub login: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub rating: i32,
    pub games_played: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Match {
    pub id: Uuid,
    pub player1: String,
    pub player2: String,
    #[sqlx(try_from = "String")]
    pub match_type: MatchType,
    #[sqlx(try_from = "String")]
    pub status: MatchStatus,
    pub player1_score: i32,
    pub player2_score: i32,
    pub winner: Option<String>,
    pub player1_rating_before: i32,
    pub player2_rating_before: i32,
    pub player1_win_delta: i32,
    pub player1_loss_delta: i32,
    pub player2_win_delta: i32,
    pub player2_loss_delta: i32,
    /// Rating change actually applied on completion (ranked only).
    pub player1_rating_change: Option<i32>,
    pub player2_rating_change: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn side_of(&self, login: &str) -> Option<Side> {
        if self.player1 == login {
            Some(Side::Player1)
        } else if self.player2 == login {
            Some(Side::Player2)
        } else {
            None
        }
    }

    pub fn player(&self, side: Side) -> &str {
        match side {
            Side::Player1 => &self.player1,
            Side::Player2 => &self.player2,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, MatchStatus::Completed | MatchStatus::Cancelled)
    }

    pub fn precomputed(&self) -> PrecomputedDeltas {
        PrecomputedDeltas {
            if_player1_wins: OutcomeDeltas {
                winner_delta: self.player1_win_delta,
                loser_delta: self.player2_loss_delta,
            },
            if_player2_wins: OutcomeDeltas {
                winner_delta: self.player2_win_delta,
                loser_delta: self.player1_loss_delta,
            },
        }
    }
}

/// Everything needed to insert a freshly paired match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub player1: String,
    pub player2: String,
    pub match_type: MatchType,
    pub player1_rating_before: i32,
    pub player2_rating_before: i32,
    pub deltas: PrecomputedDeltas,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QueueEntry {
    pub id: Uuid,
    pub player: String,
    #[sqlx(try_from = "String")]
    pub match_type: MatchType,
    #[sqlx(try_from = "String")]
    pub status: QueueStatus,
    pub match_id: Option<Uuid>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub sender: String,
    pub recipient: String,
    #[sqlx(try_from = "String")]
    pub status: InvitationStatus,
    pub match_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Whether this challenge links `a` and `b`, whoever sent it.
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.sender == a && self.recipient == b) || (self.sender == b && self.recipient == a)
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: String,
    #[sqlx(try_from = "String")]
    pub kind: NotificationKind,
    pub payload: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
