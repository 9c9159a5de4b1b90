use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::notification_repo,
    error::{ApiError, ApiResult},
    http::auth::JwtAuth,
};

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default = "default_limit")]
    pub limit: i64,
}
fn default_limit() -> i64 {
    50
}

/// GET /api/notifications?unread_only=true
#[get("/notifications")]
pub async fn list(
    auth: JwtAuth,
    web::Query(params): web::Query<ListParams>,
    db: web::Data<PgPool>,
) -> ApiResult<HttpResponse> {
    let rows =
        notification_repo::list(&db, &auth.login, params.unread_only, params.limit.clamp(1, 200)).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// POST /api/notifications/read_all
#[post("/notifications/read_all")]
pub async fn read_all(auth: JwtAuth, db: web::Data<PgPool>) -> ApiResult<HttpResponse> {
    let updated = notification_repo::mark_all_read(&db, &auth.login).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": updated })))
}

/// POST /api/notifications/{id}/read
#[post("/notifications/{id}/read")]
pub async fn read_one(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    db: web::Data<PgPool>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    if !notification_repo::mark_read(&db, &auth.login, id).await? {
        return Err(ApiError::NotFound(format!("notification {id}")));
    }
    Ok(HttpResponse::NoContent().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list).service(read_all).service(read_one);
}
