//! FIFO pairing and match planning.

use std::collections::HashMap;

use chrono::{Duration, TimeZone, Utc};
use pong_server::db::models::{MatchType, Player, QueueEntry, QueueStatus};
use pong_server::matchmaking::{group_by_mode, pair_waiting, plan_match, PairingError};
use pong_server::rating::PrecomputedDeltas;
use uuid::Uuid;

fn entry(login: &str, mode: MatchType, order: i64) -> QueueEntry {
    QueueEntry {
        id: Uuid::new_v4(),
        player: login.to_owned(),
        match_type: mode,
        status: QueueStatus::Waiting,
        match_id: None,
        joined_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::seconds(order),
    }
}

fn player(login: &str, rating: i32, games: i32) -> Player {
    Player {
        login: login.to_owned(),
        display_name: login.to_uppercase(),
        avatar_url: None,
        rating,
        games_played: games,
        created_at: Utc::now(),
    }
}

fn logins(pairs: &[(QueueEntry, QueueEntry)]) -> Vec<(&str, &str)> {
    pairs
        .iter()
        .map(|(a, b)| (a.player.as_str(), b.player.as_str()))
        .collect()
}

#[test]
fn five_waiting_players_make_two_matches() {
    let waiting: Vec<_> = ["a", "b", "c", "d", "e"]
        .iter()
        .enumerate()
        .map(|(i, l)| entry(l, MatchType::Unranked, i as i64))
        .collect();

    let pairing = pair_waiting(&waiting);
    assert_eq!(logins(&pairing.pairs), vec![("a", "b"), ("c", "d")]);
    assert_eq!(pairing.leftover.map(|e| e.player), Some("e".to_owned()));
}

#[test]
fn even_queue_leaves_nobody_behind() {
    let waiting: Vec<_> = (0..4)
        .map(|i| entry(&format!("p{i}"), MatchType::Ranked, i))
        .collect();
    let pairing = pair_waiting(&waiting);
    assert_eq!(pairing.pairs.len(), 2);
    assert!(pairing.leftover.is_none());
}

#[test]
fn empty_and_single_queues() {
    let none = pair_waiting(&[]);
    assert!(none.pairs.is_empty() && none.leftover.is_none());

    let one = pair_waiting(&[entry("solo", MatchType::Unranked, 0)]);
    assert!(one.pairs.is_empty());
    assert_eq!(one.leftover.map(|e| e.player), Some("solo".to_owned()));
}

#[test]
fn modes_are_paired_separately_in_arrival_order() {
    let waiting = vec![
        entry("r1", MatchType::Ranked, 0),
        entry("u1", MatchType::Unranked, 1),
        entry("r2", MatchType::Ranked, 2),
        entry("u2", MatchType::Unranked, 3),
        entry("r3", MatchType::Ranked, 4),
    ];
    let groups = group_by_mode(&waiting);
    assert_eq!(groups.len(), 2);

    let (mode, ranked) = &groups[0];
    assert_eq!(*mode, MatchType::Ranked);
    let ranked_pairs = pair_waiting(ranked);
    assert_eq!(logins(&ranked_pairs.pairs), vec![("r1", "r2")]);
    assert_eq!(ranked_pairs.leftover.map(|e| e.player), Some("r3".to_owned()));

    let (mode, unranked) = &groups[1];
    assert_eq!(*mode, MatchType::Unranked);
    assert_eq!(logins(&pair_waiting(unranked).pairs), vec![("u1", "u2")]);
}

#[test]
fn ranked_plan_fixes_deltas_at_pairing_time() {
    let a = entry("alice", MatchType::Ranked, 0);
    let b = entry("bob", MatchType::Ranked, 1);
    let players = HashMap::from([
        ("alice".to_owned(), player("alice", 1200, 40)),
        ("bob".to_owned(), player("bob", 800, 40)),
    ]);

    let planned = plan_match(&a, &b, &players).unwrap();
    assert_eq!(planned.player1, "alice");
    assert_eq!(planned.player2, "bob");
    assert_eq!(planned.match_type, MatchType::Ranked);
    assert_eq!((planned.player1_rating_before, planned.player2_rating_before), (1200, 800));
    assert_eq!(planned.deltas.resolve(true), (2, -18));
    assert_eq!(
        planned.deltas,
        PrecomputedDeltas::precompute(MatchType::Ranked, 1200, 40, 800, 40)
    );
}

#[test]
fn unranked_plan_has_zero_deltas() {
    let a = entry("alice", MatchType::Unranked, 0);
    let b = entry("bob", MatchType::Unranked, 1);
    let players = HashMap::from([
        ("alice".to_owned(), player("alice", 1500, 10)),
        ("bob".to_owned(), player("bob", 900, 10)),
    ]);
    let planned = plan_match(&a, &b, &players).unwrap();
    assert_eq!(planned.deltas, PrecomputedDeltas::default());
}

#[test]
fn missing_player_record_abandons_pairing() {
    let a = entry("alice", MatchType::Ranked, 0);
    let b = entry("ghost", MatchType::Ranked, 1);
    let players = HashMap::from([("alice".to_owned(), player("alice", 1000, 0))]);

    assert_eq!(
        plan_match(&a, &b, &players),
        Err(PairingError::PlayerNotFound("ghost".to_owned()))
    );
}

#[test]
fn same_player_twice_is_rejected() {
    let a = entry("alice", MatchType::Unranked, 0);
    let b = entry("alice", MatchType::Unranked, 1);
    let players = HashMap::from([("alice".to_owned(), player("alice", 1000, 0))]);
    assert_eq!(
        plan_match(&a, &b, &players),
        Err(PairingError::SamePlayer("alice".to_owned()))
    );
}
