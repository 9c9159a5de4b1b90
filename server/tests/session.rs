//! Match session bookkeeping: seat presence and the session registry.

use std::sync::Barrier;
use std::time::{Duration, Instant};

use pong_server::db::models::Side;
use pong_server::game::session::{register, unregister, Registry, Seats};
use uuid::Uuid;

const GRACE: Duration = Duration::from_secs(120);

#[test]
fn player_who_never_connects_forfeits_after_grace() {
    let start = Instant::now();
    let mut seats = Seats::new(start);
    seats.connect(Side::Player1);

    assert!(!seats.both_ready());
    assert_eq!(seats.expired(start + GRACE - Duration::from_secs(1), GRACE), None);
    assert_eq!(seats.expired(start + GRACE, GRACE), Some(Side::Player2));
}

#[test]
fn nobody_is_expired_once_both_are_in() {
    let start = Instant::now();
    let mut seats = Seats::new(start);
    seats.connect(Side::Player2);
    seats.connect(Side::Player1);

    assert!(seats.both_ready());
    assert_eq!(seats.expired(start + GRACE * 10, GRACE), None);
}

#[test]
fn disconnect_restarts_the_clock_and_resume_stops_it() {
    let start = Instant::now();
    let mut seats = Seats::new(start);
    seats.connect(Side::Player1);
    seats.connect(Side::Player2);

    let dropped = start + Duration::from_secs(300);
    seats.disconnect(Side::Player1, dropped);
    assert!(!seats.both_ready());
    assert_eq!(seats.expired(dropped + GRACE / 2, GRACE), None);
    assert_eq!(seats.expired(dropped + GRACE, GRACE), Some(Side::Player1));

    seats.connect(Side::Player1);
    assert_eq!(seats.expired(dropped + GRACE * 2, GRACE), None);
}

#[test]
fn concurrent_first_messages_share_one_session() {
    let sessions = Registry::new();
    let match_id = Uuid::new_v4();
    let barrier = Barrier::new(8);

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    register(&sessions, match_id)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let owners = results.iter().filter(|(_, rx)| rx.is_some()).count();
    assert_eq!(owners, 1);
    let (first, _) = &results[0];
    assert!(results.iter().all(|(tx, _)| tx.same_channel(first)));
    assert_eq!(sessions.len(), 1);
}

#[test]
fn finished_session_does_not_evict_its_successor() {
    let sessions = Registry::new();
    let match_id = Uuid::new_v4();

    let (old, _old_rx) = register(&sessions, match_id);
    sessions.remove(&match_id);
    let (new, _new_rx) = register(&sessions, match_id);

    unregister(&sessions, match_id, &old);
    assert!(sessions.contains_key(&match_id));

    unregister(&sessions, match_id, &new);
    assert!(!sessions.contains_key(&match_id));
}
