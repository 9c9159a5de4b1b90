use actix_web::{get, post, web, HttpResponse};
use chrono::{DateTime, Utc};
use redis::Client as RedisClient;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::{
    db::{match_repo, models::MatchType, queue_repo},
    error::{ApiError, ApiResult},
    events::{self, QueueEvent, QueuePhase},
    http::auth::JwtAuth,
    protocol::ServerMsg,
};

/// Body for join.
#[derive(Deserialize)]
pub struct JoinRequest {
    #[serde(default = "default_mode")]
    pub mode: MatchType,
}

fn default_mode() -> MatchType {
    MatchType::Unranked
}

#[derive(Serialize)]
pub struct QueueStatusResponse {
    pub waiting: bool,
    pub mode: Option<MatchType>,
    pub position: Option<i64>,
    pub joined_at: Option<DateTime<Utc>>,
}

/// POST /api/matchmaking/join
#[post("/matchmaking/join")]
async fn join_queue(
    auth: JwtAuth,
    info: web::Json<JoinRequest>,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> ApiResult<HttpResponse> {
    if !info.mode.is_queueable() {
        return Err(ApiError::BadRequest(format!("cannot queue for {} matches", info.mode)));
    }
    if let Some(active) = match_repo::active_for(&db, &auth.login).await? {
        return Err(ApiError::Conflict(format!("already playing match {}", active.id)));
    }

    let entry = queue_repo::enqueue(&db, &auth.login, info.mode)
        .await?
        .ok_or_else(|| ApiError::Conflict("already queued".into()))?;
    let position = queue_repo::position(&db, &entry).await?;
    log::info!("{} joined the {} queue at #{position}", auth.login, entry.match_type);

    events::push(
        &redis,
        &auth.login,
        &ServerMsg::QueueJoined {
            mode: entry.match_type,
            position,
        },
    )
    .await;
    // no waiting entry and no active match before the insert
    events::transition(&redis, &auth.login, QueuePhase::Idle, QueueEvent::Joined).await;

    Ok(HttpResponse::Ok().json(QueueStatusResponse {
        waiting: true,
        mode: Some(entry.match_type),
        position: Some(position),
        joined_at: Some(entry.joined_at),
    }))
}

/// POST /api/matchmaking/leave
#[post("/matchmaking/leave")]
async fn leave_queue(
    auth: JwtAuth,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> ApiResult<HttpResponse> {
    if !queue_repo::cancel(db.get_ref(), &auth.login).await? {
        return Err(ApiError::NotFound("queue entry".into()));
    }
    events::push(&redis, &auth.login, &ServerMsg::QueueLeft).await;
    events::transition(&redis, &auth.login, QueuePhase::Queued, QueueEvent::Left).await;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "left" })))
}

/// GET /api/matchmaking/status
#[get("/matchmaking/status")]
async fn queue_status(auth: JwtAuth, db: web::Data<PgPool>) -> ApiResult<HttpResponse> {
    let body = match queue_repo::waiting_entry(&db, &auth.login).await? {
        Some(entry) => QueueStatusResponse {
            waiting: true,
            mode: Some(entry.match_type),
            position: Some(queue_repo::position(&db, &entry).await?),
            joined_at: Some(entry.joined_at),
        },
        None => QueueStatusResponse {
            waiting: false,
            mode: None,
            position: None,
            joined_at: None,
        },
    };
    Ok(HttpResponse::Ok().json(body))
}

/// Mount
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(join_queue).service(leave_queue).service(queue_status);
}
