//! Match scoring rules and outcome resolution.

use chrono::Utc;
use pong_server::db::models::{Match, MatchStatus, MatchType, Side};
use pong_server::game::scoreboard::{resolution, ScoreError, ScoreOutcome, Scoreboard};
use pong_server::rating::PrecomputedDeltas;
use uuid::Uuid;

fn stored_match(kind: MatchType, p1: i32, p2: i32) -> Match {
    let d = PrecomputedDeltas::precompute(kind, p1, 50, p2, 50);
    Match {
        id: Uuid::new_v4(),
        player1: "alice".into(),
        player2: "bob".into(),
        match_type: kind,
        status: MatchStatus::InProgress,
        player1_score: 0,
        player2_score: 0,
        winner: None,
        player1_rating_before: p1,
        player2_rating_before: p2,
        player1_win_delta: d.if_player1_wins.winner_delta,
        player1_loss_delta: d.if_player2_wins.loser_delta,
        player2_win_delta: d.if_player2_wins.winner_delta,
        player2_loss_delta: d.if_player1_wins.loser_delta,
        player1_rating_change: None,
        player2_rating_change: None,
        created_at: Utc::now(),
        completed_at: None,
    }
}

#[test]
fn first_to_winning_score_wins() {
    let mut board = Scoreboard::new(3);
    assert_eq!(board.score_point(Side::Player1), Ok(ScoreOutcome::Continue));
    assert_eq!(board.score_point(Side::Player2), Ok(ScoreOutcome::Continue));
    assert_eq!(board.score_point(Side::Player1), Ok(ScoreOutcome::Continue));
    assert_eq!(
        board.score_point(Side::Player1),
        Ok(ScoreOutcome::Finished { winner: Side::Player1 })
    );
    assert_eq!((board.player1_score, board.player2_score), (3, 1));
    assert_eq!(board.score_point(Side::Player2), Err(ScoreError::Finished));
}

#[test]
fn forfeit_hands_the_win_to_the_opponent() {
    let mut board = Scoreboard::new(11);
    board.score_point(Side::Player2).unwrap();
    assert_eq!(board.forfeit(Side::Player2), Ok(Side::Player1));
    assert!(board.is_finished());
    assert_eq!(board.forfeit(Side::Player1), Err(ScoreError::Finished));
}

#[test]
fn duplicate_point_reports_are_rejected() {
    let mut board = Scoreboard::new(11);
    assert!(board.check_rally(1).is_ok());
    board.score_point(Side::Player1).unwrap();

    // the second client reports the same rally
    assert_eq!(
        board.check_rally(1),
        Err(ScoreError::OutOfOrder { expected: 2, got: 1 })
    );
    assert!(board.check_rally(3).is_err());
    assert!(board.check_rally(2).is_ok());
}

#[test]
fn scoreboard_mirrors_stored_rows() {
    let mut m = stored_match(MatchType::Unranked, 1000, 1000);
    m.player1_score = 4;
    m.player2_score = 2;
    let board = Scoreboard::from_match(&m, 11);
    assert_eq!(board.rallies(), 6);
    assert!(!board.is_finished());

    m.status = MatchStatus::Completed;
    m.winner = Some("bob".into());
    assert_eq!(Scoreboard::from_match(&m, 11).winner, Some(Side::Player2));
}

#[test]
fn ranked_resolution_uses_stored_deltas() {
    let m = stored_match(MatchType::Ranked, 1200, 800);

    let fav = resolution(&m, Side::Player1);
    assert!(fav.rated);
    assert_eq!((fav.winner.as_str(), fav.loser.as_str()), ("alice", "bob"));
    assert_eq!((fav.player1_delta, fav.player2_delta), (2, -18));

    let upset = resolution(&m, Side::Player2);
    assert_eq!((upset.player1_delta, upset.player2_delta), (-2, 18));
}

#[test]
fn resolution_ignores_ratings_changed_after_pairing() {
    let mut m = stored_match(MatchType::Ranked, 1000, 1000);
    // ratings drifted after the match was created; stored deltas still rule
    m.player1_rating_before = 1500;
    let r = resolution(&m, Side::Player1);
    assert_eq!((r.player1_delta, r.player2_delta), (10, -10));
}

#[test]
fn non_ranked_resolution_is_zero() {
    for kind in [MatchType::Unranked, MatchType::Friendly] {
        let mut m = stored_match(kind, 1200, 800);
        // even if deltas were somehow stored, they are ignored
        m.player1_win_delta = 7;
        let r = resolution(&m, Side::Player1);
        assert!(!r.rated);
        assert_eq!((r.player1_delta, r.player2_delta), (0, 0));
    }
}
