//! Settings parsing from an arbitrary key lookup.

use std::collections::HashMap;

use pong_server::config::Settings;

fn settings_from(pairs: &[(&str, &str)]) -> Settings {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Settings::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn defaults_when_nothing_is_set() {
    let s = settings_from(&[]);
    assert_eq!(s.redis_url, "redis://127.0.0.1/");
    assert_eq!(s.server_addr, "127.0.0.1:8080");
    assert_eq!(s.winning_score, 11);
    assert_eq!(s.presence_ttl, 600);
    assert_eq!(s.disconnect_grace, 120);
    assert_eq!(s.matchmaking_interval_ms, 1_000);
    assert_eq!(s.access_token_ttl, 900);
    assert!(s.run_migrations);
    assert!(s.jwt_secret.is_none());
    assert_eq!(s.oauth.token_url, "https://api.intra.42.fr/oauth/token");
}

#[test]
fn overrides_are_parsed() {
    let s = settings_from(&[
        ("WINNING_SCORE", "5"),
        ("DISCONNECT_GRACE", "30"),
        ("JWT_SECRET", "s3cret"),
        ("RUN_MIGRATIONS", "false"),
        ("OAUTH_CLIENT_ID", "client"),
    ]);
    assert_eq!(s.winning_score, 5);
    assert_eq!(s.disconnect_grace, 30);
    assert_eq!(s.jwt_secret.as_deref(), Some("s3cret"));
    assert!(!s.run_migrations);
    assert_eq!(s.oauth.client_id, "client");
}

#[test]
fn garbage_falls_back_to_defaults() {
    let s = settings_from(&[
        ("WINNING_SCORE", "eleven"),
        ("PRESENCE_TTL", "-5"),
        ("REDIS_URL", "   "),
        ("JWT_SECRET", ""),
    ]);
    assert_eq!(s.winning_score, 11);
    assert_eq!(s.presence_ttl, 600);
    assert_eq!(s.redis_url, "redis://127.0.0.1/");
    assert!(s.jwt_secret.is_none());
}

#[test]
fn winning_score_is_at_least_one() {
    assert_eq!(settings_from(&[("WINNING_SCORE", "0")]).winning_score, 1);
}
