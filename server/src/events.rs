//! Player-facing change feed.
//
//  Redis channels
//  --------------
//  player:<login>:events – PUB/SUB channel, one JSON `ServerMsg` per message
//
//  Each player's matchmaking progress is an explicit state machine
//  (`QueuePhase`). Callers state the phase they know the player is in and
//  `transition` publishes the next one as `ServerMsg::Phase`; an impossible
//  transition is logged and nothing is published.

use redis::{AsyncCommands, Client as RedisClient};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use crate::db::{
    models::{MatchStatus, NotificationKind},
    notification_repo,
};
use crate::protocol::ServerMsg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuePhase {
    Idle,
    Queued,
    Paired,
    InMatch,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueEvent {
    Joined,
    Left,
    Paired,
    /// A friend challenge was accepted; skips the queue.
    Challenged,
    MatchStarted,
    MatchFinished,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot apply {event:?} while {phase:?}")]
pub struct TransitionError {
    pub phase: QueuePhase,
    pub event: QueueEvent,
}

impl QueuePhase {
    /// Next phase after `event`, or an error for an impossible transition.
    pub fn apply(self, event: QueueEvent) -> Result<QueuePhase, TransitionError> {
        use QueueEvent as E;
        use QueuePhase as P;

        match (self, event) {
            (P::Idle | P::Completed, E::Joined) => Ok(P::Queued),
            (P::Queued, E::Left) => Ok(P::Idle),
            (P::Queued, E::Paired) => Ok(P::Paired),
            (P::Idle | P::Queued | P::Completed, E::Challenged) => Ok(P::Paired),
            (P::Paired, E::MatchStarted) => Ok(P::InMatch),
            (P::Paired | P::InMatch, E::MatchFinished) => Ok(P::Completed),
            (phase, event) => Err(TransitionError { phase, event }),
        }
    }

    /// Phase both players of a match with `status` are in.
    pub fn of_match(status: MatchStatus) -> QueuePhase {
        match status {
            MatchStatus::Pending => QueuePhase::Paired,
            MatchStatus::InProgress => QueuePhase::InMatch,
            MatchStatus::Completed | MatchStatus::Cancelled => QueuePhase::Completed,
        }
    }
}

pub fn channel(login: &str) -> String {
    format!("player:{login}:events")
}

/// Publish one message on a player's channel.
pub async fn publish(redis: &RedisClient, login: &str, msg: &ServerMsg) -> anyhow::Result<()> {
    let payload = serde_json::to_string(msg)?;
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let _: () = conn.publish(channel(login), payload).await?;
    Ok(())
}

/// Publish, logging instead of failing; the feed is best effort.
pub async fn push(redis: &RedisClient, login: &str, msg: &ServerMsg) {
    if let Err(e) = publish(redis, login, msg).await {
        log::warn!("publish to {login} failed: {e:?}");
    }
}

/// Move `login` from `from` by `event` and announce the new phase.
pub async fn transition(
    redis: &RedisClient,
    login: &str,
    from: QueuePhase,
    event: QueueEvent,
) -> Option<QueuePhase> {
    match from.apply(event) {
        Ok(phase) => {
            push(redis, login, &ServerMsg::Phase { phase }).await;
            Some(phase)
        }
        Err(e) => {
            log::warn!("{login}: {e}");
            None
        }
    }
}

/// Store a notification and push it live.
pub async fn notify(
    db: &PgPool,
    redis: &RedisClient,
    login: &str,
    kind: NotificationKind,
    payload: serde_json::Value,
) {
    match notification_repo::create(db, login, kind, payload).await {
        Ok(notification) => push(redis, login, &ServerMsg::Notification { notification }).await,
        Err(e) => log::warn!("could not store {kind} notification for {login}: {e:?}"),
    }
}
