//! Match lookups, history and forfeits.

use actix_web::{get, post, web, HttpResponse};
use redis::Client as RedisClient;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::{match_repo, models::Match},
    error::{ApiError, ApiResult},
    events::QueuePhase,
    game::{service, session},
    http::auth::JwtAuth,
};

#[derive(Serialize)]
pub struct MatchView {
    #[serde(flatten)]
    pub state: Match,
    /// A session task is currently running for this match.
    pub live: bool,
}

#[derive(Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
}
fn default_limit() -> i64 {
    20
}

/// GET /api/matches/{id}
#[get("/matches/{id}")]
pub async fn get_match(path: web::Path<Uuid>, db: web::Data<PgPool>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let state = match_repo::get(&db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("match {id}")))?;
    Ok(HttpResponse::Ok().json(MatchView {
        live: session::is_live(id),
        state,
    }))
}

/// GET /api/matches/history/{login}
#[get("/matches/history/{login}")]
pub async fn history(
    path: web::Path<String>,
    web::Query(params): web::Query<HistoryParams>,
    db: web::Data<PgPool>,
) -> ApiResult<HttpResponse> {
    let login = path.into_inner();
    let rows = match_repo::history(&db, &login, params.limit.clamp(1, 100)).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// POST /api/matches/{id}/forfeit
#[post("/matches/{id}/forfeit")]
pub async fn forfeit(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let before = match_repo::get(&db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("match {id}")))?;
    let done = service::forfeit_match(&db, id, &auth.login)
        .await
        .map_err(ApiError::from_domain)?;
    service::announce_result(&db, &redis, &done, QueuePhase::of_match(before.status)).await;
    Ok(HttpResponse::Ok().json(done))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(history).service(get_match).service(forfeit);
}
