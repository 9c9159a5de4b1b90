// src/http/leaderboard.rs

use actix_web::{get, web, HttpResponse};
use redis::{AsyncCommands, Client as RedisClient};
use serde::Deserialize;
use sqlx::PgPool;

use crate::{config::settings, db::player_repo, error::ApiResult};

#[derive(Deserialize)]
pub struct LeaderboardParams {
    /// Maximum number of entries to return (1–100).
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    50
}

impl LeaderboardParams {
    pub fn normalized(&self) -> (i64, i64) {
        (self.limit.clamp(1, 100), self.offset.max(0))
    }
}

/// Bumped after every ranked result; cached pages of older generations are
/// never read again and expire on their own.
const GENERATION_KEY: &str = "leaderboard:generation";

pub fn cache_key(generation: u64, limit: i64, offset: i64) -> String {
    format!("leaderboard:{generation}:{limit}:{offset}")
}

/// Drop every cached page; called once ratings have moved.
pub async fn invalidate(redis: &RedisClient) {
    let res = match redis.get_multiplexed_async_connection().await {
        Ok(mut conn) => conn.incr::<_, _, u64>(GENERATION_KEY, 1).await.map(|_| ()),
        Err(e) => Err(e),
    };
    if let Err(e) = res {
        log::warn!("could not invalidate leaderboard cache: {e}");
    }
}

#[get("/leaderboard")]
pub async fn leaderboard(
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
    web::Query(params): web::Query<LeaderboardParams>,
) -> ApiResult<HttpResponse> {
    let (limit, offset) = params.normalized();

    // 1) Try to read from Redis cache
    let mut conn = redis.get_multiplexed_async_connection().await.ok();
    let mut key = None;
    if let Some(c) = conn.as_mut() {
        if let Ok(generation) = c.get::<_, Option<u64>>(GENERATION_KEY).await {
            let k = cache_key(generation.unwrap_or(0), limit, offset);
            if let Ok(Some(cached)) = c.get::<_, Option<String>>(&k).await {
                return Ok(HttpResponse::Ok()
                    .content_type("application/json")
                    .body(cached));
            }
            key = Some(k);
        }
    }

    // 2) Query the database
    let rows = player_repo::leaderboard(&db, limit, offset).await?;

    // 3) Serialize and cache the result
    let body = serde_json::to_string(&rows).map_err(anyhow::Error::from)?;
    if let (Some(c), Some(k)) = (conn.as_mut(), key) {
        let _: () = c
            .set_ex(&k, &body, settings().leaderboard_cache_ttl)
            .await
            .unwrap_or(());
    }

    // 4) Return JSON response
    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}

/// Mounts the leaderboard route under `/api`
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(leaderboard);
}
