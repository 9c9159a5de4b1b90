//! Wire-protocol shared by client, WS handler and match sessions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{Invitation, MatchType, Notification};
use crate::events::QueuePhase;

// ---------- client → server ----------
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ClientMsg {
    Ready {
        match_id: Uuid,
    },
    /// Sent by a client that lost its socket and re-opened a new one.
    Resume {
        match_id: Uuid,
    },
    /// `rally` is the 1-based index of the point in the match; both clients
    /// may report the same point and only the first report counts.
    Point {
        match_id: Uuid,
        scorer: String,
        rally: u32,
    },
    Forfeit {
        match_id: Uuid,
    },
    /// Emitted internally by the WS layer when a socket closes.
    Disconnected {
        match_id: Uuid,
    },
}

impl ClientMsg {
    pub fn match_id(&self) -> Uuid {
        match self {
            ClientMsg::Ready { match_id }
            | ClientMsg::Resume { match_id }
            | ClientMsg::Point { match_id, .. }
            | ClientMsg::Forfeit { match_id }
            | ClientMsg::Disconnected { match_id } => *match_id,
        }
    }
}

// ---------- server → client ----------
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMsg {
    QueueJoined {
        mode: MatchType,
        position: i64,
    },
    QueueLeft,
    /// The player's matchmaking phase changed.
    Phase {
        phase: QueuePhase,
    },
    MatchFound {
        match_id: Uuid,
        opponent: String,
        match_type: MatchType,
        /// Rating change if this player wins / loses (0 when unranked).
        rating_if_win: i32,
        rating_if_loss: i32,
    },
    MatchStart {
        match_id: Uuid,
        player1: String,
        player2: String,
        player1_score: i32,
        player2_score: i32,
        winning_score: i32,
    },
    ScoreUpdate {
        match_id: Uuid,
        player1_score: i32,
        player2_score: i32,
    },
    OpponentDisconnected {
        match_id: Uuid,
        grace_secs: u64,
    },
    MatchOver {
        match_id: Uuid,
        winner: String,
        player1_score: i32,
        player2_score: i32,
        player1_rating_change: Option<i32>,
        player2_rating_change: Option<i32>,
    },
    InvitationUpdate {
        invitation: Invitation,
    },
    Notification {
        notification: Notification,
    },
}
