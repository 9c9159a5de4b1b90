//! Matchmaking phase transitions announced on the event feed.

use pong_server::db::models::MatchStatus;
use pong_server::events::{channel, QueueEvent, QueuePhase, TransitionError};
use pong_server::protocol::ServerMsg;
use serde_json::json;

#[test]
fn full_lifecycle() {
    let phase = QueuePhase::Idle
        .apply(QueueEvent::Joined)
        .and_then(|p| p.apply(QueueEvent::Paired))
        .and_then(|p| p.apply(QueueEvent::MatchStarted))
        .and_then(|p| p.apply(QueueEvent::MatchFinished));
    assert_eq!(phase, Ok(QueuePhase::Completed));

    // and straight back into the queue
    assert_eq!(
        QueuePhase::Completed.apply(QueueEvent::Joined),
        Ok(QueuePhase::Queued)
    );
}

#[test]
fn leaving_returns_to_idle() {
    assert_eq!(QueuePhase::Queued.apply(QueueEvent::Left), Ok(QueuePhase::Idle));
}

#[test]
fn paired_match_can_end_before_starting() {
    assert_eq!(
        QueuePhase::Paired.apply(QueueEvent::MatchFinished),
        Ok(QueuePhase::Completed)
    );
}

#[test]
fn impossible_transitions_are_errors() {
    assert_eq!(
        QueuePhase::Idle.apply(QueueEvent::Paired),
        Err(TransitionError {
            phase: QueuePhase::Idle,
            event: QueueEvent::Paired,
        })
    );
    assert!(QueuePhase::Queued.apply(QueueEvent::Joined).is_err());
    assert!(QueuePhase::InMatch.apply(QueueEvent::Left).is_err());
    assert!(QueuePhase::Completed.apply(QueueEvent::MatchStarted).is_err());
}

#[test]
fn channel_names() {
    assert_eq!(channel("jdoe"), "player:jdoe:events");
}

#[test]
fn accepted_challenge_pairs_without_queueing() {
    for from in [QueuePhase::Idle, QueuePhase::Queued, QueuePhase::Completed] {
        assert_eq!(from.apply(QueueEvent::Challenged), Ok(QueuePhase::Paired), "{from:?}");
    }
    assert!(QueuePhase::InMatch.apply(QueueEvent::Challenged).is_err());
    assert!(QueuePhase::Paired.apply(QueueEvent::Challenged).is_err());
}

#[test]
fn phase_follows_match_status() {
    assert_eq!(QueuePhase::of_match(MatchStatus::Pending), QueuePhase::Paired);
    assert_eq!(QueuePhase::of_match(MatchStatus::InProgress), QueuePhase::InMatch);
    assert_eq!(QueuePhase::of_match(MatchStatus::Completed), QueuePhase::Completed);

    // both pre-finish phases can be finished from
    for status in [MatchStatus::Pending, MatchStatus::InProgress] {
        assert_eq!(
            QueuePhase::of_match(status).apply(QueueEvent::MatchFinished),
            Ok(QueuePhase::Completed)
        );
    }
}

#[test]
fn phase_change_message_shape() {
    let msg = ServerMsg::Phase { phase: QueuePhase::InMatch };
    assert_eq!(
        serde_json::to_value(&msg).unwrap(),
        json!({ "type": "Phase", "phase": "in_match" })
    );
}
