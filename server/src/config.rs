//! Runtime configuration for the 42Pong server.

use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Postgres connection string (`DATABASE_URL`).
    pub database_url: String,
    pub redis_url: String,
    pub server_addr: String,
    pub db_max_connections: u32,
    /// Apply the embedded migrations on startup.
    pub run_migrations: bool,

    /// Points a player needs to win a match.
    pub winning_score: i32,
    /// Redis presence-key TTL (seconds).
    pub presence_ttl: u64,
    /// Seconds a player may stay disconnected before forfeit.
    pub disconnect_grace: u64,
    /// Period of the matchmaking pass (milliseconds).
    pub matchmaking_interval_ms: u64,
    /// Seconds a cached leaderboard page stays in Redis.
    pub leaderboard_cache_ttl: u64,

    pub access_token_ttl: i64,
    pub refresh_token_ttl: u64,
    pub jwt_secret: Option<String>,

    pub oauth: OAuthSettings,
}

/// OAuth2 client registration with the identity provider.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
}

fn parsed_or<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    get(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn string_or(get: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_owned())
}

impl Settings {
    /// Build settings from any key lookup; unparsable values fall back to defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let winning_score = parsed_or(&get, "WINNING_SCORE", 11).max(1);

        Settings {
            database_url: string_or(&get, "DATABASE_URL", ""),
            redis_url: string_or(&get, "REDIS_URL", "redis://127.0.0.1/"),
            server_addr: string_or(&get, "SERVER_ADDR", "127.0.0.1:8080"),
            db_max_connections: parsed_or(&get, "DB_MAX_CONNECTIONS", 5),
            run_migrations: parsed_or(&get, "RUN_MIGRATIONS", true),

            winning_score,
            presence_ttl: parsed_or(&get, "PRESENCE_TTL", 600),
            disconnect_grace: parsed_or(&get, "DISCONNECT_GRACE", 120), // 2 min default
            matchmaking_interval_ms: parsed_or(&get, "MATCHMAKING_INTERVAL_MS", 1_000),
            leaderboard_cache_ttl: parsed_or(&get, "LEADERBOARD_CACHE_TTL", 30),

            access_token_ttl: parsed_or(&get, "ACCESS_TOKEN_TTL", 15 * 60),
            refresh_token_ttl: parsed_or(&get, "REFRESH_TOKEN_TTL", 30 * 24 * 3_600),
            jwt_secret: get("JWT_SECRET").filter(|s| !s.is_empty()),

            oauth: OAuthSettings {
                client_id: string_or(&get, "OAUTH_CLIENT_ID", ""),
                client_secret: string_or(&get, "OAUTH_CLIENT_SECRET", ""),
                redirect_uri: string_or(&get, "OAUTH_REDIRECT_URI", ""),
                authorize_url: string_or(
                    &get,
                    "OAUTH_AUTHORIZE_URL",
                    "https://api.intra.42.fr/oauth/authorize",
                ),
                token_url: string_or(&get, "OAUTH_TOKEN_URL", "https://api.intra.42.fr/oauth/token"),
                profile_url: string_or(&get, "OAUTH_PROFILE_URL", "https://api.intra.42.fr/v2/me"),
            },
        }
    }

    fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }
}

static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);

pub fn settings() -> &'static Settings {
    &SETTINGS
}
