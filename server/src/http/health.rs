//! Liveness / readiness of the pong server and its two backing stores.

use actix_web::{get, web, HttpResponse};
use redis::{AsyncCommands, Client as RedisClient};
use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Health {
    pub service: &'static str,
    pub postgres: bool,
    pub redis: bool,
}

impl Health {
    pub fn new(postgres: bool, redis: bool) -> Self {
        Health {
            service: env!("CARGO_PKG_NAME"),
            postgres,
            redis,
        }
    }

    /// Matches and queues live in Postgres, the event feed in Redis;
    /// the server is only useful with both.
    pub fn is_ready(&self) -> bool {
        self.postgres && self.redis
    }
}

async fn redis_ok(redis: &RedisClient) -> bool {
    match redis.get_multiplexed_async_connection().await {
        Ok(mut conn) => conn.ping::<String>().await.is_ok(),
        Err(_) => false,
    }
}

#[get("/healthz")]
pub async fn healthz(db: web::Data<PgPool>, redis: web::Data<RedisClient>) -> HttpResponse {
    let postgres = sqlx::query("SELECT 1").execute(db.get_ref()).await.is_ok();
    let health = Health::new(postgres, redis_ok(&redis).await);

    if health.is_ready() {
        HttpResponse::Ok().json(health)
    } else {
        log::warn!("health check failed: {health:?}");
        HttpResponse::ServiceUnavailable().json(health)
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz);
}
