//! Player profiles.

use actix_web::{get, web, HttpResponse};
use serde::Serialize;
use sqlx::PgPool;

use crate::{
    db::{
        models::Player,
        player_repo::{self, PlayerStats},
    },
    error::{ApiError, ApiResult},
    http::auth::JwtAuth,
};

#[derive(Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub player: Player,
    #[serde(flatten)]
    pub stats: PlayerStats,
}

async fn profile(db: &PgPool, login: &str) -> ApiResult<Profile> {
    let player = player_repo::get(db, login)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("player {login}")))?;
    let stats = player_repo::stats(db, login).await?;
    Ok(Profile { player, stats })
}

/// GET /api/players/me
#[get("/players/me")]
pub async fn me(auth: JwtAuth, db: web::Data<PgPool>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(profile(&db, &auth.login).await?))
}

/// GET /api/players/{login}
#[get("/players/{login}")]
pub async fn by_login(path: web::Path<String>, db: web::Data<PgPool>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(profile(&db, &path.into_inner()).await?))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // `me` must be registered before the `{login}` catch-all
    cfg.service(me).service(by_login);
}
