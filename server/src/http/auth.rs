//! OAuth2 login against the identity provider (JWT + refresh)

use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use redis::{AsyncCommands, Client as RedisClient};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use url::Url;
use uuid::Uuid;

use crate::{
    config::{settings, OAuthSettings},
    db::player_repo,
    error::{ApiError, ApiResult},
};

//////////////////////////////////////////////////
// Data structs
//////////////////////////////////////////////////

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    pub state: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // player login
    pub exp: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Deserialize)]
struct ProviderToken {
    access_token: String,
}

/// The subset of the provider's `/me` document we use.
#[derive(Debug, Deserialize)]
pub struct ProviderProfile {
    pub login: String,
    #[serde(default, alias = "displayname")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub image: Option<ProviderImage>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderImage {
    pub link: Option<String>,
}

impl ProviderProfile {
    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.login)
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.image.as_ref().and_then(|i| i.link.as_deref())
    }
}

static HTTP: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

//////////////////////////////////////////////////
// Token helpers
//////////////////////////////////////////////////

pub fn encode_access(player: &str, secret: &str, ttl_secs: i64) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: player.to_owned(),
        exp: (Utc::now().timestamp() + ttl_secs) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate a JWT and return the player login it was issued for.
pub fn decode_access(token: &str, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims.sub)
}

/// Provider authorize URL for a fresh login attempt.
pub fn authorize_url(oauth: &OAuthSettings, state: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        &oauth.authorize_url,
        &[
            ("client_id", oauth.client_id.as_str()),
            ("redirect_uri", oauth.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", "public"),
            ("state", state),
        ],
    )
}

fn jwt_secret() -> ApiResult<&'static str> {
    settings()
        .jwt_secret
        .as_deref()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))
}

async fn mark_present(redis: &RedisClient, player: &str) {
    if let Ok(mut conn) = redis.get_multiplexed_async_connection().await {
        let _: () = conn
            .set_ex(format!("session:{player}"), "1", settings().presence_ttl)
            .await
            .unwrap_or(());
    }
}

/// Mint an access token plus a stored, single-use refresh token.
async fn issue_tokens(redis: &RedisClient, player: &str) -> ApiResult<TokenResponse> {
    let ttl = settings().access_token_ttl;
    let access_token =
        encode_access(player, jwt_secret()?, ttl).map_err(|e| ApiError::Internal(e.into()))?;

    let refresh_token = Uuid::new_v4().to_string();
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let _: () = conn
        .set_ex(
            format!("refresh:{refresh_token}"),
            player,
            settings().refresh_token_ttl,
        )
        .await?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        expires_in: ttl,
    })
}

//////////////////////////////////////////////////
// ─────────────  JwtAuth extractor  ─────────────
//////////////////////////////////////////////////

pub mod extractor {
    use actix_web::{dev::Payload, FromRequest, HttpRequest};
    use futures_util::future::{ready, Ready};

    use crate::config::settings;
    use crate::error::ApiError;

    /// Extracts and validates a Bearer-JWT, exposing the player login.
    #[derive(Debug, Clone)]
    pub struct JwtAuth {
        pub login: String,
    }

    impl FromRequest for JwtAuth {
        type Error = ApiError;
        type Future = Ready<Result<Self, Self::Error>>;

        fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
            let res = (|| {
                // Expect:  Authorization: Bearer <JWT>
                let hdr = req
                    .headers()
                    .get("Authorization")
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;

                let token = hdr
                    .strip_prefix("Bearer ")
                    .ok_or_else(|| ApiError::Unauthorized("malformed Authorization header".into()))?;

                let secret = settings()
                    .jwt_secret
                    .as_deref()
                    .ok_or_else(|| ApiError::Unauthorized("server mis-config".into()))?;

                let login = super::decode_access(token, secret)
                    .map_err(|_| ApiError::Unauthorized("invalid / expired token".into()))?;

                Ok(JwtAuth { login })
            })();

            ready(res)
        }
    }
}
pub use extractor::JwtAuth;

//////////////////////////////////////////////////
// GET /api/auth/login
//////////////////////////////////////////////////
#[get("/auth/login")]
pub async fn login(redis: web::Data<RedisClient>) -> ApiResult<HttpResponse> {
    let state = Uuid::new_v4().to_string();
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let _: () = conn.set_ex(format!("oauth_state:{state}"), "1", 10 * 60).await?;

    let url = authorize_url(&settings().oauth, &state)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("bad OAUTH_AUTHORIZE_URL: {e}")))?;
    Ok(HttpResponse::Found()
        .insert_header(("Location", url.as_str()))
        .finish())
}

//////////////////////////////////////////////////
// GET /api/auth/callback
//////////////////////////////////////////////////
#[get("/auth/callback")]
pub async fn callback(
    query: web::Query<CallbackQuery>,
    redis: web::Data<RedisClient>,
    db: web::Data<PgPool>,
) -> ApiResult<HttpResponse> {
    // 1) consume state
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let key = format!("oauth_state:{}", query.state);
    let known: Option<String> = conn.get(&key).await?;
    if known.is_none() {
        return Err(ApiError::BadRequest("invalid or expired state".into()));
    }
    let _: () = conn.del(&key).await?;

    // 2) code → provider token
    let oauth = &settings().oauth;
    let token: ProviderToken = HTTP
        .post(&oauth.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", oauth.client_id.as_str()),
            ("client_secret", oauth.client_secret.as_str()),
            ("code", query.code.as_str()),
            ("redirect_uri", oauth.redirect_uri.as_str()),
        ])
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| {
            log::warn!("oauth token exchange failed: {e}");
            ApiError::Unauthorized("authorization code rejected".into())
        })?
        .json()
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;

    // 3) profile
    let profile: ProviderProfile = HTTP
        .get(&oauth.profile_url)
        .bearer_auth(&token.access_token)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| {
            log::warn!("oauth profile fetch failed: {e}");
            ApiError::Unavailable("identity provider")
        })?
        .json()
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;

    // 4) upsert player keyed by login
    let player = player_repo::upsert_profile(
        &db,
        &profile.login,
        profile.display_name(),
        profile.avatar_url(),
    )
    .await?;
    log::info!("{} signed in", player.login);

    // 5) presence + tokens
    mark_present(&redis, &player.login).await;
    Ok(HttpResponse::Ok().json(issue_tokens(&redis, &player.login).await?))
}

//////////////////////////////////////////////////
// POST /api/auth/refresh
//////////////////////////////////////////////////
#[post("/auth/refresh")]
pub async fn refresh(
    info: web::Json<RefreshRequest>,
    redis: web::Data<RedisClient>,
) -> ApiResult<HttpResponse> {
    // consume old refresh → login
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let key = format!("refresh:{}", info.refresh_token);
    let player: Option<String> = conn.get(&key).await?;
    let Some(player) = player else {
        return Err(ApiError::Unauthorized("invalid refresh".into()));
    };
    let _: () = conn.del(&key).await?;

    mark_present(&redis, &player).await;
    Ok(HttpResponse::Ok().json(issue_tokens(&redis, &player).await?))
}

//////////////////////////////////////////////////
// POST /api/auth/logout
//////////////////////////////////////////////////
#[post("/auth/logout")]
pub async fn logout(
    auth: JwtAuth,
    info: web::Json<RefreshRequest>,
    redis: web::Data<RedisClient>,
) -> ApiResult<HttpResponse> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let _: () = conn.del(format!("refresh:{}", info.refresh_token)).await?;
    let _: () = conn.del(format!("session:{}", auth.login)).await?;
    Ok(HttpResponse::NoContent().finish())
}

//////////////////////////////////////////////////
// Mount
//////////////////////////////////////////////////
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(login)
        .service(callback)
        .service(refresh)
        .service(logout);
}
