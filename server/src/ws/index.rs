//! WebSocket endpoint with Redis event subscription.

use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_ws::{handle, Message};
use futures::StreamExt;
use redis::{AsyncCommands, Client as RedisClient};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::settings;
use crate::events;
use crate::game::session::{dispatch, Inbound};
use crate::http::{auth::decode_access, presence::session_key};
use crate::protocol::ClientMsg;

#[derive(Deserialize)]
pub struct WsParams {
    /// Browsers cannot set headers on a WS upgrade, so the JWT rides in the query.
    pub token: String,
}

pub async fn ws_index(
    req: HttpRequest,
    body: web::Payload,
    web::Query(params): web::Query<WsParams>,
    db_pool: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> Result<HttpResponse, Error> {
    // 1 · authenticate
    let secret = settings()
        .jwt_secret
        .as_deref()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("server mis-config"))?;
    let login = decode_access(&params.token, secret)
        .map_err(|_| actix_web::error::ErrorUnauthorized("invalid / expired token"))?;

    // 2 · Redis subscribe (before the handshake so failures are still HTTP errors)
    let mut pubsub = redis
        .get_async_pubsub()
        .await
        .map_err(|_| actix_web::error::ErrorInternalServerError("redis subscribe"))?;
    pubsub
        .subscribe(events::channel(&login))
        .await
        .map_err(|_| actix_web::error::ErrorInternalServerError("redis subscribe"))?;

    // 3 · handshake
    let (response, mut session, mut ws_stream) = handle(&req, body)?;

    // 4 · presence key
    if let Ok(mut conn) = redis.get_multiplexed_async_connection().await {
        let _: () = conn
            .set_ex(session_key(&login), "1", settings().presence_ttl)
            .await
            .unwrap_or(());
    }

    let db = db_pool.get_ref().clone();
    let redis_client = redis.get_ref().clone();

    actix::spawn(async move {
        let mut redis_stream = pubsub.on_message();
        let mut current_match: Option<Uuid> = None;

        loop {
            tokio::select! {
                // client → server
                frame = ws_stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            let cmsg = match serde_json::from_str::<ClientMsg>(&text) {
                                Ok(m) => m,
                                Err(e) => {
                                    log::debug!("bad frame from {login}: {e}");
                                    continue;
                                }
                            };
                            match &cmsg {
                                ClientMsg::Ready { match_id }
                                | ClientMsg::Resume { match_id }
                                | ClientMsg::Point { match_id, .. } => current_match = Some(*match_id),
                                ClientMsg::Forfeit { .. } | ClientMsg::Disconnected { .. } => current_match = None,
                            }
                            let inbound = Inbound { player: login.clone(), msg: cmsg };
                            if let Err(e) = dispatch(db.clone(), redis_client.clone(), inbound).await {
                                log::warn!("dispatch error: {e:?}");
                            }
                        }
                        Some(Ok(Message::Ping(bytes))) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
                // redis → client
                Some(msg) = redis_stream.next() => {
                    if let Ok(json) = msg.get_payload::<String>() {
                        if let Err(e) = session.text(json).await {
                            log::warn!("WS send failed for {login}: {e:?}");
                            break;
                        }
                    }
                }
                else => break,
            }
        }

        // On disconnect …
        if let Ok(mut conn) = redis_client.get_multiplexed_async_connection().await {
            let _: () = conn.del(session_key(&login)).await.unwrap_or(());
        }
        if let Some(match_id) = current_match {
            let _ = dispatch(
                db.clone(),
                redis_client.clone(),
                Inbound {
                    player: login.clone(),
                    msg: ClientMsg::Disconnected { match_id },
                },
            )
            .await;
        }
        log::info!("WS closed for player {login}");
    });

    Ok(response)
}
