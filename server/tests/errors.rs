//! Error → HTTP status mapping.

use actix_web::{body::to_bytes, http::StatusCode, ResponseError};
use pong_server::error::ApiError;
use pong_server::game::scoreboard::ScoreError;

#[test]
fn statuses() {
    assert_eq!(ApiError::NotFound("match".into()).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(ApiError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
    assert_eq!(ApiError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
    assert_eq!(ApiError::Unavailable("redis").status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        ApiError::Internal(anyhow::anyhow!("boom")).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn domain_errors_keep_their_meaning() {
    let finished = ApiError::from_domain(ScoreError::Finished.into());
    assert_eq!(finished.status_code(), StatusCode::CONFLICT);

    let outsider = ApiError::from_domain(ScoreError::NotAParticipant("eve".into()).into());
    assert_eq!(outsider.status_code(), StatusCode::FORBIDDEN);

    let other = ApiError::from_domain(anyhow::anyhow!("db down"));
    assert_eq!(other.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn missing_row_is_not_found() {
    let e: ApiError = sqlx::Error::RowNotFound.into();
    assert_eq!(e.status_code(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn body_is_json_without_internal_details() {
    let resp = ApiError::Internal(anyhow::anyhow!("password=hunter2")).error_response();
    let body = to_bytes(resp.into_body()).await.unwrap();
    let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v, serde_json::json!({ "error": "internal error" }));
}
