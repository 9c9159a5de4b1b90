//! Match persistence: points, completion, forfeits.
//!
//! Completion is the only place ratings change. It runs in one transaction
//! that locks the match row, so a match can never be rated twice.

use anyhow::{anyhow, Result};
use redis::Client as RedisClient;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::{
        match_repo,
        models::{Match, MatchType, NewMatch, NotificationKind, Player, Side},
        player_repo,
    },
    events::{self, QueueEvent, QueuePhase},
    game::scoreboard::{resolution, ScoreError},
    http::leaderboard,
    metrics,
    protocol::ServerMsg,
    rating::PrecomputedDeltas,
};

/// A challenge-created match; friendly matches never move ratings.
pub fn friendly_match(challenger: &Player, opponent: &Player) -> NewMatch {
    NewMatch {
        player1: challenger.login.clone(),
        player2: opponent.login.clone(),
        match_type: MatchType::Friendly,
        player1_rating_before: challenger.rating,
        player2_rating_before: opponent.rating,
        deltas: PrecomputedDeltas::default(),
    }
}

#[derive(Debug)]
pub struct PointRecorded {
    pub state: Match,
    pub finished: bool,
}

/// Add a point for `scorer` and complete the match at the winning score.
pub async fn record_point(
    db: &PgPool,
    match_id: Uuid,
    scorer: &str,
    winning_score: i32,
) -> Result<PointRecorded> {
    let current = match_repo::get(db, match_id)
        .await?
        .ok_or_else(|| anyhow!("match {match_id} not found"))?;
    let side = current
        .side_of(scorer)
        .ok_or_else(|| ScoreError::NotAParticipant(scorer.to_owned()))?;

    let updated = match_repo::increment_score(db, match_id, side)
        .await?
        .ok_or(ScoreError::Finished)?;

    let score = match side {
        Side::Player1 => updated.player1_score,
        Side::Player2 => updated.player2_score,
    };
    if score >= winning_score {
        let state = complete_match(db, match_id, scorer).await?;
        return Ok(PointRecorded {
            state,
            finished: true,
        });
    }
    Ok(PointRecorded {
        state: updated,
        finished: false,
    })
}

/// Mark the match completed for `winner` and apply the precomputed deltas
/// when it is ranked. Completing an already finished match is a no-op.
pub async fn complete_match(db: &PgPool, match_id: Uuid, winner: &str) -> Result<Match> {
    let mut tx = db.begin().await?;
    let current = match_repo::get_for_update(&mut *tx, match_id)
        .await?
        .ok_or_else(|| anyhow!("match {match_id} not found"))?;
    if current.is_finished() {
        tx.rollback().await?;
        return Ok(current);
    }
    let side = current
        .side_of(winner)
        .ok_or_else(|| ScoreError::NotAParticipant(winner.to_owned()))?;

    let outcome = resolution(&current, side);
    let (p1_change, p2_change) = if outcome.rated {
        let (p1_before, p1_after) =
            player_repo::apply_rating_change(&mut *tx, &current.player1, outcome.player1_delta).await?;
        let (p2_before, p2_after) =
            player_repo::apply_rating_change(&mut *tx, &current.player2, outcome.player2_delta).await?;
        (Some(p1_after - p1_before), Some(p2_after - p2_before))
    } else {
        (None, None)
    };

    let done = match_repo::mark_completed(&mut *tx, match_id, &outcome.winner, p1_change, p2_change).await?;
    tx.commit().await?;

    metrics::MATCHES_COMPLETED.inc();
    log::info!(
        "match {match_id} won by {} ({}-{}, {})",
        outcome.winner,
        done.player1_score,
        done.player2_score,
        done.match_type
    );
    Ok(done)
}

/// `login` gives up; the opponent wins.
pub async fn forfeit_match(db: &PgPool, match_id: Uuid, login: &str) -> Result<Match> {
    let current = match_repo::get(db, match_id)
        .await?
        .ok_or_else(|| anyhow!("match {match_id} not found"))?;
    if current.is_finished() {
        return Err(ScoreError::Finished.into());
    }
    let side = current
        .side_of(login)
        .ok_or_else(|| ScoreError::NotAParticipant(login.to_owned()))?;
    let winner = current.player(side.other()).to_owned();
    complete_match(db, match_id, &winner).await
}

/// Push `MatchOver` to both players and store their result notifications.
/// `from` is the phase the players were in before the match finished.
pub async fn announce_result(db: &PgPool, redis: &RedisClient, m: &Match, from: QueuePhase) {
    let Some(winner) = m.winner.clone() else {
        return;
    };
    if m.match_type == MatchType::Ranked {
        leaderboard::invalidate(redis).await;
    }
    let over = ServerMsg::MatchOver {
        match_id: m.id,
        winner: winner.clone(),
        player1_score: m.player1_score,
        player2_score: m.player2_score,
        player1_rating_change: m.player1_rating_change,
        player2_rating_change: m.player2_rating_change,
    };
    for (me, change) in [
        (&m.player1, m.player1_rating_change),
        (&m.player2, m.player2_rating_change),
    ] {
        events::push(redis, me, &over).await;
        events::transition(redis, me, from, QueueEvent::MatchFinished).await;
        events::notify(
            db,
            redis,
            me,
            NotificationKind::MatchResult,
            json!({
                "match_id": m.id,
                "won": *me == winner,
                "score": [m.player1_score, m.player2_score],
                "rating_change": change,
            }),
        )
        .await;
    }
}
