// src/http/presence.rs
//! Very thin presence API backed by Redis session keys.

use actix_web::{get, web, HttpResponse};
use redis::{AsyncCommands, Client as RedisClient};

use crate::error::ApiResult;

pub fn session_key(login: &str) -> String {
    format!("session:{login}")
}

pub async fn is_online(redis: &RedisClient, login: &str) -> ApiResult<bool> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let is_present: bool = conn.exists(session_key(login)).await?;
    Ok(is_present)
}

#[get("/presence/online/{login}")]
pub async fn online(path: web::Path<String>, redis: web::Data<RedisClient>) -> ApiResult<HttpResponse> {
    let is_present = is_online(&redis, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "online": is_present })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(online);
}
