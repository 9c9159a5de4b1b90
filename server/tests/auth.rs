//! JWT helpers, provider profile parsing and the `JwtAuth` extractor.

use actix_web::{test, FromRequest, ResponseError};
use pong_server::config::settings;
use pong_server::http::auth::{
    authorize_url, decode_access, encode_access, JwtAuth, ProviderProfile,
};

const SECRET: &str = "test-secret";

/// Every test in this file uses the same secret, so the lazily read settings
/// see it no matter which test runs first.
fn init_env() {
    std::env::set_var("JWT_SECRET", SECRET);
}

#[::core::prelude::v1::test]
fn access_token_round_trips_login() {
    let token = encode_access("jdoe", SECRET, 60).unwrap();
    assert_eq!(decode_access(&token, SECRET).unwrap(), "jdoe");
    assert!(decode_access(&token, "other-secret").is_err());
}

#[::core::prelude::v1::test]
fn expired_token_is_rejected() {
    let token = encode_access("jdoe", SECRET, -3_600).unwrap();
    assert!(decode_access(&token, SECRET).is_err());
}

#[::core::prelude::v1::test]
fn authorize_url_carries_client_and_state() {
    init_env();
    let mut oauth = settings().oauth.clone();
    oauth.client_id = "abc".into();
    oauth.redirect_uri = "http://localhost:3000/callback".into();

    let url = authorize_url(&oauth, "xyz").unwrap();
    let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert!(params.contains(&("client_id".into(), "abc".into())));
    assert!(params.contains(&("response_type".into(), "code".into())));
    assert!(params.contains(&("state".into(), "xyz".into())));
    assert!(params.contains(&("redirect_uri".into(), "http://localhost:3000/callback".into())));
}

#[::core::prelude::v1::test]
fn provider_profile_fields() {
    let p: ProviderProfile = serde_json::from_str(
        r#"{"login":"jdoe","displayname":"Jane Doe","image":{"link":"https://cdn/x.jpg"},"id":42}"#,
    )
    .unwrap();
    assert_eq!(p.login, "jdoe");
    assert_eq!(p.display_name(), "Jane Doe");
    assert_eq!(p.avatar_url(), Some("https://cdn/x.jpg"));

    let bare: ProviderProfile = serde_json::from_str(r#"{"login":"anon","displayname":""}"#).unwrap();
    assert_eq!(bare.display_name(), "anon");
    assert_eq!(bare.avatar_url(), None);
}

#[actix_web::test]
async fn extractor_accepts_bearer_token() {
    init_env();
    let token = encode_access("jdoe", SECRET, 60).unwrap();
    let req = test::TestRequest::default()
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_http_request();

    let auth = JwtAuth::extract(&req).await.unwrap();
    assert_eq!(auth.login, "jdoe");
}

#[actix_web::test]
async fn extractor_rejects_missing_or_bad_header() {
    init_env();
    let missing = test::TestRequest::default().to_http_request();
    let err = JwtAuth::extract(&missing).await.unwrap_err();
    assert_eq!(err.status_code(), actix_web::http::StatusCode::UNAUTHORIZED);

    let bad = test::TestRequest::default()
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_http_request();
    assert!(JwtAuth::extract(&bad).await.is_err());

    let basic = test::TestRequest::default()
        .insert_header(("Authorization", "Basic amRvZTpwdw=="))
        .to_http_request();
    assert!(JwtAuth::extract(&basic).await.is_err());
}
