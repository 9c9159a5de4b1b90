//! Friend list (mirrored both ways) with presence.

use actix_web::{delete, get, post, web, HttpResponse};
use redis::Client as RedisClient;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    db::{friend_repo, models::NotificationKind, player_repo},
    error::{ApiError, ApiResult},
    events,
    http::{auth::JwtAuth, presence},
};

#[derive(Deserialize)]
pub struct AddFriendReq {
    pub login: String,
}

#[derive(Serialize)]
pub struct FriendRow {
    pub login: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub rating: i32,
    pub online: bool,
}

/// GET /api/friends
#[get("/friends")]
pub async fn list(
    auth: JwtAuth,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> ApiResult<HttpResponse> {
    let friends = friend_repo::list(&db, &auth.login).await?;
    let mut rows = Vec::with_capacity(friends.len());
    for f in friends {
        // presence is advisory; a Redis hiccup shows everyone offline
        let online = presence::is_online(&redis, &f.login).await.unwrap_or(false);
        rows.push(FriendRow {
            login: f.login,
            display_name: f.display_name,
            avatar_url: f.avatar_url,
            rating: f.rating,
            online,
        });
    }
    Ok(HttpResponse::Ok().json(rows))
}

/// POST /api/friends
#[post("/friends")]
pub async fn add(
    auth: JwtAuth,
    info: web::Json<AddFriendReq>,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> ApiResult<HttpResponse> {
    if info.login == auth.login {
        return Err(ApiError::BadRequest("cannot befriend yourself".into()));
    }
    if player_repo::get(&db, &info.login).await?.is_none() {
        return Err(ApiError::NotFound(format!("player {}", info.login)));
    }
    if !friend_repo::add(&db, &auth.login, &info.login).await? {
        return Err(ApiError::Conflict("already friends".into()));
    }

    events::notify(
        &db,
        &redis,
        &info.login,
        NotificationKind::FriendAdded,
        json!({ "from": auth.login }),
    )
    .await;
    Ok(HttpResponse::Created().json(json!({ "friend": info.login })))
}

/// DELETE /api/friends/{login}
#[delete("/friends/{login}")]
pub async fn remove(
    auth: JwtAuth,
    path: web::Path<String>,
    db: web::Data<PgPool>,
) -> ApiResult<HttpResponse> {
    let other = path.into_inner();
    if !friend_repo::remove(&db, &auth.login, &other).await? {
        return Err(ApiError::NotFound(format!("friendship with {other}")));
    }
    Ok(HttpResponse::NoContent().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list).service(add).service(remove);
}
