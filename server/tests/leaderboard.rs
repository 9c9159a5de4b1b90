//! Leaderboard paging and cache keys.

use pong_server::http::leaderboard::{cache_key, LeaderboardParams};

fn params(limit: i64, offset: i64) -> LeaderboardParams {
    LeaderboardParams { limit, offset }
}

#[test]
fn paging_is_clamped() {
    assert_eq!(params(50, 0).normalized(), (50, 0));
    assert_eq!(params(0, -3).normalized(), (1, 0));
    assert_eq!(params(10_000, 20).normalized(), (100, 20));
}

#[test]
fn defaults_apply_to_missing_params() {
    let p: LeaderboardParams = serde_json::from_str("{}").unwrap();
    assert_eq!(p.normalized(), (50, 0));
}

#[test]
fn a_new_generation_misses_every_old_page() {
    assert_eq!(cache_key(0, 50, 0), "leaderboard:0:50:0");
    // after a ranked result the generation moves on and the old key is stale
    assert_ne!(cache_key(1, 50, 0), cache_key(0, 50, 0));
    assert_ne!(cache_key(1, 50, 0), cache_key(1, 50, 50));
}
