//! Background worker that pairs waiting players and notifies them.
//
//  Postgres tables
//  ---------------
//  matchmaking_queue – one row per join; `waiting` rows are the live queue,
//                      ordered by (joined_at, id)
//  matches           – created here with both possible rating outcomes
//
//  Pairing is strictly first-in first-out inside each mode: entry 2i plays
//  entry 2i+1 and an odd last entry keeps waiting for the next pass.

use std::collections::HashMap;
use std::time::Duration;

use redis::Client as RedisClient;
use serde_json::json;
use sqlx::PgPool;
use thiserror::Error;
use tokio::time::sleep;

use crate::{
    config::settings,
    db::{
        match_repo,
        models::{Match, MatchType, NewMatch, NotificationKind, Player, QueueEntry},
        player_repo, queue_repo,
    },
    events::{self, QueueEvent, QueuePhase},
    metrics,
    protocol::ServerMsg,
    rating::PrecomputedDeltas,
};

/// Result of one FIFO pass over a waiting list.
#[derive(Debug, Clone)]
pub struct Pairing {
    pub pairs: Vec<(QueueEntry, QueueEntry)>,
    pub leftover: Option<QueueEntry>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PairingError {
    #[error("player {0} not found")]
    PlayerNotFound(String),
    #[error("player {0} queued twice")]
    SamePlayer(String),
}

/// Pair entry `2i` with `2i + 1` in arrival order.
pub fn pair_waiting(waiting: &[QueueEntry]) -> Pairing {
    let mut chunks = waiting.chunks_exact(2);
    let pairs = chunks
        .by_ref()
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect();
    let leftover = chunks.remainder().first().cloned();
    Pairing { pairs, leftover }
}

/// Split the waiting list per requested mode, keeping arrival order.
pub fn group_by_mode(waiting: &[QueueEntry]) -> Vec<(MatchType, Vec<QueueEntry>)> {
    let mut groups: Vec<(MatchType, Vec<QueueEntry>)> = Vec::new();
    for entry in waiting {
        match groups.iter_mut().find(|(mode, _)| *mode == entry.match_type) {
            Some((_, list)) => list.push(entry.clone()),
            None => groups.push((entry.match_type, vec![entry.clone()])),
        }
    }
    groups
}

/// Build the match for one pair, fixing both possible rating outcomes to the
/// ratings the players have right now.
pub fn plan_match(
    first: &QueueEntry,
    second: &QueueEntry,
    players: &HashMap<String, Player>,
) -> Result<NewMatch, PairingError> {
    if first.player == second.player {
        return Err(PairingError::SamePlayer(first.player.clone()));
    }
    let p1 = players
        .get(&first.player)
        .ok_or_else(|| PairingError::PlayerNotFound(first.player.clone()))?;
    let p2 = players
        .get(&second.player)
        .ok_or_else(|| PairingError::PlayerNotFound(second.player.clone()))?;

    let match_type = first.match_type;
    Ok(NewMatch {
        player1: p1.login.clone(),
        player2: p2.login.clone(),
        match_type,
        player1_rating_before: p1.rating,
        player2_rating_before: p2.rating,
        deltas: PrecomputedDeltas::precompute(
            match_type,
            p1.rating,
            p1.games_played,
            p2.rating,
            p2.games_played,
        ),
    })
}

/// Spawn the infinite matchmaking loop as a Tokio task.
pub fn start(db: PgPool, redis: RedisClient) {
    let period = Duration::from_millis(settings().matchmaking_interval_ms);
    tokio::spawn(async move {
        loop {
            if let Err(e) = tick(&db, &redis).await {
                log::error!("matchmaking tick failed: {e:?}");
            }
            sleep(period).await;
        }
    });
}

/// One pass: pair every waiting player we can and announce the matches.
/// Returns the matches created.
pub async fn tick(db: &PgPool, redis: &RedisClient) -> anyhow::Result<Vec<Match>> {
    let waiting = queue_repo::waiting(db).await?;
    if waiting.len() < 2 {
        return Ok(Vec::new());
    }

    let logins: Vec<String> = waiting.iter().map(|e| e.player.clone()).collect();
    let players: HashMap<String, Player> = player_repo::get_many(db, &logins)
        .await?
        .into_iter()
        .map(|p| (p.login.clone(), p))
        .collect();

    let mut created = Vec::new();
    for (mode, entries) in group_by_mode(&waiting) {
        let Pairing { pairs, leftover } = pair_waiting(&entries);
        if let Some(rest) = leftover {
            log::debug!("{} stays queued for {mode}", rest.player);
        }

        for (a, b) in pairs {
            let new = match plan_match(&a, &b, &players) {
                Ok(new) => new,
                Err(e) => {
                    log::warn!("skipping pairing {} vs {}: {e}", a.player, b.player);
                    metrics::PAIRINGS_ABANDONED.inc();
                    continue;
                }
            };
            match persist_pairing(db, &a, &b, &new).await {
                Ok(Some(m)) => {
                    metrics::MATCHES_CREATED.inc();
                    announce(db, redis, &m).await;
                    created.push(m);
                }
                Ok(None) => {
                    log::info!("pairing {} vs {} raced with a queue change", a.player, b.player);
                    metrics::PAIRINGS_ABANDONED.inc();
                }
                Err(e) => {
                    log::warn!("could not create match for {} vs {}: {e:?}", a.player, b.player);
                    metrics::PAIRINGS_ABANDONED.inc();
                }
            }
        }
    }
    Ok(created)
}

/// Insert the match and flip both queue rows in one transaction.
/// `None` if either player left the queue meanwhile; nothing is written then.
async fn persist_pairing(
    db: &PgPool,
    a: &QueueEntry,
    b: &QueueEntry,
    new: &NewMatch,
) -> anyhow::Result<Option<Match>> {
    let mut tx = db.begin().await?;
    let created = match_repo::insert(&mut *tx, new).await?;
    let flipped = queue_repo::mark_matched(&mut *tx, &[a.id, b.id], created.id).await?;
    if flipped != 2 {
        tx.rollback().await?;
        return Ok(None);
    }
    tx.commit().await?;
    Ok(Some(created))
}

/// Tell both players about their new match.
async fn announce(db: &PgPool, redis: &RedisClient, m: &Match) {
    let deltas = m.precomputed();
    let seats = [
        (&m.player1, &m.player2, deltas.if_player1_wins.winner_delta, deltas.if_player2_wins.loser_delta),
        (&m.player2, &m.player1, deltas.if_player2_wins.winner_delta, deltas.if_player1_wins.loser_delta),
    ];
    for (me, opponent, if_win, if_loss) in seats {
        events::push(
            redis,
            me,
            &ServerMsg::MatchFound {
                match_id: m.id,
                opponent: opponent.clone(),
                match_type: m.match_type,
                rating_if_win: if_win,
                rating_if_loss: if_loss,
            },
        )
        .await;
        events::transition(redis, me, QueuePhase::Queued, QueueEvent::Paired).await;
        events::notify(
            db,
            redis,
            me,
            NotificationKind::MatchFound,
            json!({ "match_id": m.id, "opponent": opponent, "match_type": m.match_type }),
        )
        .await;
    }
}
