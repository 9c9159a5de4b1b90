//! One async task per live match.
//! ✔ resume after disconnect (state is reloaded from the match row)
//! ✔ duplicate point reports from both clients are collapsed
//! ✔ grace-period auto-forfeit, also for a player who never shows up

use crate::{
    config::settings,
    db::{
        match_repo,
        models::{Match, Side},
    },
    events::{self, QueueEvent, QueuePhase},
    game::{
        scoreboard::{ScoreError, Scoreboard},
        service,
    },
    protocol::{ClientMsg, ServerMsg},
};
use dashmap::{mapref::entry::Entry, DashMap};
use std::time::Instant;
use once_cell::sync::Lazy;
use redis::Client as RedisClient;
use sqlx::PgPool;
use tokio::{
    sync::mpsc,
    time::{interval, Duration},
};
use uuid::Uuid;

/// A client message tagged with the authenticated sender.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub player: String,
    pub msg: ClientMsg,
}

/// Live sessions: match_id → sender
pub type Registry = DashMap<Uuid, mpsc::Sender<Inbound>>;

static SESSIONS: Lazy<Registry> = Lazy::new(DashMap::new);

#[derive(Debug)]
pub enum DispatchErr {
    ChannelClosed,
}

pub fn is_live(match_id: Uuid) -> bool {
    SESSIONS.contains_key(&match_id)
}

/// Sender of the session for `match_id`, registering a new one if needed.
/// The receiver is returned only to the caller that registered, which must
/// run the session. Get-or-insert happens under one shard lock, so racing
/// first messages from both players always end up in the same session.
pub fn register(sessions: &Registry, match_id: Uuid) -> (mpsc::Sender<Inbound>, Option<mpsc::Receiver<Inbound>>) {
    match sessions.entry(match_id) {
        Entry::Occupied(e) => (e.get().clone(), None),
        Entry::Vacant(e) => {
            let (tx, rx) = mpsc::channel::<Inbound>(64);
            e.insert(tx.clone());
            (tx, Some(rx))
        }
    }
}

/// Remove `own` from the registry unless a newer session replaced it.
pub fn unregister(sessions: &Registry, match_id: Uuid, own: &mpsc::Sender<Inbound>) {
    sessions.remove_if(&match_id, |_, tx| tx.same_channel(own));
}

pub async fn dispatch(db: PgPool, redis: RedisClient, inbound: Inbound) -> Result<(), DispatchErr> {
    let match_id = inbound.msg.match_id();
    let (tx, fresh) = register(&SESSIONS, match_id);

    if let Some(rx) = fresh {
        let own = tx.clone();
        tokio::spawn(async move {
            match match_repo::get(&db, match_id).await {
                Ok(Some(m)) if !m.is_finished() => run(&db, &redis, m, rx).await,
                Ok(Some(_)) => log::debug!("session for finished match {match_id} not started"),
                Ok(None) => log::warn!("session for unknown match {match_id}"),
                Err(e) => log::warn!("could not load match {match_id}: {e:?}"),
            }
            unregister(&SESSIONS, match_id, &own);
        });
    }

    tx.send(inbound).await.map_err(|_| DispatchErr::ChannelClosed)
}

/// Connection bookkeeping for both seats.
///
/// Every seat starts on the grace clock and leaves it with `connect`, so a
/// paired player who never opens a socket forfeits like one who dropped.
#[derive(Debug, Clone)]
pub struct Seats {
    ready: [bool; 2],
    absent_since: [Option<Instant>; 2],
}

impl Seats {
    pub fn new(now: Instant) -> Self {
        Seats {
            ready: [false; 2],
            absent_since: [Some(now); 2],
        }
    }

    pub fn connect(&mut self, side: Side) {
        self.ready[idx(side)] = true;
        self.absent_since[idx(side)] = None;
    }

    pub fn disconnect(&mut self, side: Side, now: Instant) {
        self.ready[idx(side)] = false;
        self.absent_since[idx(side)] = Some(now);
    }

    pub fn both_ready(&self) -> bool {
        self.ready == [true, true]
    }

    /// First seat absent for at least `grace` at `now`.
    pub fn expired(&self, now: Instant, grace: Duration) -> Option<Side> {
        [Side::Player1, Side::Player2].into_iter().find(|s| {
            self.absent_since[idx(*s)].is_some_and(|t| now.saturating_duration_since(t) >= grace)
        })
    }
}

fn idx(side: Side) -> usize {
    match side {
        Side::Player1 => 0,
        Side::Player2 => 1,
    }
}

async fn broadcast(redis: &RedisClient, m: &Match, msg: &ServerMsg) {
    events::push(redis, &m.player1, msg).await;
    events::push(redis, &m.player2, msg).await;
}

fn start_msg(m: &Match, board: &Scoreboard) -> ServerMsg {
    ServerMsg::MatchStart {
        match_id: m.id,
        player1: m.player1.clone(),
        player2: m.player2.clone(),
        player1_score: board.player1_score,
        player2_score: board.player2_score,
        winning_score: board.winning_score,
    }
}

async fn run(db: &PgPool, redis: &RedisClient, m: Match, mut rx: mpsc::Receiver<Inbound>) {
    let match_id = m.id;
    let winning_score = settings().winning_score;
    let grace = Duration::from_secs(settings().disconnect_grace);
    let mut board = Scoreboard::from_match(&m, winning_score);
    let mut seats = Seats::new(Instant::now());
    let mut phase = QueuePhase::of_match(m.status);
    let mut watch = interval(Duration::from_secs(5));

    loop {
        tokio::select! {
            maybe = rx.recv() => {
                let Some(Inbound { player, msg }) = maybe else { break };
                let Some(side) = m.side_of(&player) else {
                    log::warn!("{player} sent {msg:?} for match {match_id} they are not in");
                    continue;
                };

                match msg {
                    // ------- Connect / Reconnect -----------------------
                    ClientMsg::Ready { .. } | ClientMsg::Resume { .. } => {
                        seats.connect(side);

                        if matches!(msg, ClientMsg::Resume { .. }) {
                            events::push(redis, &player, &start_msg(&m, &board)).await;
                        }
                        if seats.both_ready() {
                            if phase == QueuePhase::Paired {
                                if let Err(e) = match_repo::mark_started(db, match_id).await {
                                    log::warn!("could not start match {match_id}: {e:?}");
                                }
                                for login in [&m.player1, &m.player2] {
                                    events::transition(redis, login, phase, QueueEvent::MatchStarted).await;
                                }
                                phase = QueuePhase::InMatch;
                            }
                            broadcast(redis, &m, &start_msg(&m, &board)).await;
                        }
                    }

                    // ------- Disconnect notice -------------------------
                    ClientMsg::Disconnected { .. } => {
                        seats.disconnect(side, Instant::now());
                        events::push(
                            redis,
                            m.player(side.other()),
                            &ServerMsg::OpponentDisconnected { match_id, grace_secs: grace.as_secs() },
                        )
                        .await;
                    }

                    // ------- Point scored ------------------------------
                    ClientMsg::Point { scorer, rally, .. } => {
                        if m.side_of(&scorer).is_none() {
                            log::warn!("point for outsider {scorer} in match {match_id}");
                            continue;
                        }
                        if let Err(e) = board.check_rally(rally) {
                            log::debug!("match {match_id}: {e}");
                            continue;
                        }
                        match service::record_point(db, match_id, &scorer, winning_score).await {
                            Ok(rec) => {
                                board = Scoreboard::from_match(&rec.state, winning_score);
                                broadcast(redis, &m, &ServerMsg::ScoreUpdate {
                                    match_id,
                                    player1_score: rec.state.player1_score,
                                    player2_score: rec.state.player2_score,
                                }).await;
                                if rec.finished {
                                    service::announce_result(db, redis, &rec.state, phase).await;
                                    break;
                                }
                            }
                            Err(e) if matches!(e.downcast_ref::<ScoreError>(), Some(ScoreError::Finished)) => break,
                            Err(e) => log::warn!("could not record point in {match_id}: {e:?}"),
                        }
                    }

                    // ------- Give up -----------------------------------
                    ClientMsg::Forfeit { .. } => {
                        finish_forfeit(db, redis, match_id, &player, phase).await;
                        break;
                    }
                }
            }

            // ------- Grace-period watch -------------------------------
            _ = watch.tick() => {
                if let Some(side) = seats.expired(Instant::now(), grace) {
                    log::info!("{} forfeits {match_id} after being absent", m.player(side));
                    finish_forfeit(db, redis, match_id, m.player(side), phase).await;
                    break;
                }
            }
        }
    }
}

async fn finish_forfeit(db: &PgPool, redis: &RedisClient, match_id: Uuid, loser: &str, phase: QueuePhase) {
    match service::forfeit_match(db, match_id, loser).await {
        Ok(done) => service::announce_result(db, redis, &done, phase).await,
        Err(e) => log::warn!("forfeit of {match_id} by {loser} failed: {e:?}"),
    }
}
