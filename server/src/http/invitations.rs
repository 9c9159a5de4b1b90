//! Friend challenges: send / list / accept / decline / cancel

use actix_web::{get, post, web, HttpResponse};
use redis::Client as RedisClient;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::{
        friend_repo, invitation_repo, match_repo,
        models::{Invitation, InvitationStatus, NotificationKind},
        player_repo, queue_repo,
    },
    error::{ApiError, ApiResult},
    events::{self, QueueEvent, QueuePhase},
    game::service,
    http::auth::JwtAuth,
    metrics,
    protocol::ServerMsg,
};

//////////////////////////////////////////////////
// Requests
//////////////////////////////////////////////////

#[derive(Deserialize)]
pub struct ChallengeReq {
    pub recipient: String,
}

async fn load(db: &PgPool, id: Uuid) -> ApiResult<Invitation> {
    invitation_repo::get(db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("invitation {id}")))
}

/// Tell both sides an invitation changed.
async fn broadcast(redis: &RedisClient, inv: &Invitation) {
    let msg = ServerMsg::InvitationUpdate {
        invitation: inv.clone(),
    };
    events::push(redis, &inv.sender, &msg).await;
    events::push(redis, &inv.recipient, &msg).await;
}

//////////////////////////////////////////////////
// Handlers
//////////////////////////////////////////////////

/// POST /api/invitations
#[post("/invitations")]
pub async fn send(
    auth: JwtAuth,
    info: web::Json<ChallengeReq>,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> ApiResult<HttpResponse> {
    if info.recipient == auth.login {
        return Err(ApiError::BadRequest("cannot challenge yourself".into()));
    }
    if !friend_repo::are_friends(&db, &auth.login, &info.recipient).await? {
        return Err(ApiError::Forbidden("you can only challenge friends".into()));
    }

    let open = invitation_repo::pending_for(&db, &auth.login).await?;
    if let Some(existing) = open.iter().find(|i| i.is_between(&auth.login, &info.recipient)) {
        return Err(ApiError::Conflict(if existing.sender == auth.login {
            "challenge already pending".into()
        } else {
            format!("{} already challenged you (invitation {})", existing.sender, existing.id)
        }));
    }

    let inv = invitation_repo::create(&db, &auth.login, &info.recipient)
        .await?
        .ok_or_else(|| ApiError::Conflict("challenge already pending".into()))?;

    broadcast(&redis, &inv).await;
    events::notify(
        &db,
        &redis,
        &inv.recipient,
        NotificationKind::ChallengeReceived,
        json!({ "invitation_id": inv.id, "from": inv.sender }),
    )
    .await;
    Ok(HttpResponse::Created().json(inv))
}

/// GET /api/invitations
#[get("/invitations")]
pub async fn pending(auth: JwtAuth, db: web::Data<PgPool>) -> ApiResult<HttpResponse> {
    let all = invitation_repo::pending_for(&db, &auth.login).await?;
    let (received, sent): (Vec<_>, Vec<_>) = all.into_iter().partition(|i| i.recipient == auth.login);
    Ok(HttpResponse::Ok().json(json!({ "received": received, "sent": sent })))
}

/// POST /api/invitations/{id}/accept – starts a friendly match
#[post("/invitations/{id}/accept")]
pub async fn accept(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> ApiResult<HttpResponse> {
    let inv = load(&db, path.into_inner()).await?;
    if inv.recipient != auth.login {
        return Err(ApiError::Forbidden("only the recipient may accept".into()));
    }
    if inv.status != InvitationStatus::Pending {
        return Err(ApiError::Conflict(format!("invitation is {}", inv.status)));
    }
    for login in [&inv.sender, &inv.recipient] {
        if match_repo::active_for(&db, login).await?.is_some() {
            return Err(ApiError::Conflict(format!("{login} is already in a match")));
        }
    }

    let players = player_repo::get_many(&db, &[inv.sender.clone(), inv.recipient.clone()]).await?;
    let find = |login: &str| {
        players
            .iter()
            .find(|p| p.login == login)
            .ok_or_else(|| ApiError::NotFound(format!("player {login}")))
    };
    let new = service::friendly_match(find(&inv.sender)?, find(&inv.recipient)?);

    // match + invitation + queue exits commit together
    let mut tx = db.begin().await?;
    let created = match_repo::insert(&mut *tx, &new).await?;
    let Some(accepted) =
        invitation_repo::resolve(&mut *tx, inv.id, InvitationStatus::Accepted, Some(created.id)).await?
    else {
        tx.rollback().await?;
        return Err(ApiError::Conflict("invitation is no longer pending".into()));
    };
    let sender_was_queued = queue_repo::cancel(&mut *tx, &inv.sender).await?;
    let recipient_was_queued = queue_repo::cancel(&mut *tx, &inv.recipient).await?;
    tx.commit().await?;
    metrics::MATCHES_CREATED.inc();

    broadcast(&redis, &accepted).await;
    for (login, queued) in [(&inv.sender, sender_was_queued), (&inv.recipient, recipient_was_queued)] {
        let from = if queued { QueuePhase::Queued } else { QueuePhase::Idle };
        events::transition(&redis, login, from, QueueEvent::Challenged).await;
    }
    events::notify(
        &db,
        &redis,
        &accepted.sender,
        NotificationKind::ChallengeAccepted,
        json!({ "invitation_id": accepted.id, "match_id": created.id, "by": accepted.recipient }),
    )
    .await;
    for (me, opponent) in [(&created.player1, &created.player2), (&created.player2, &created.player1)] {
        events::push(
            &redis,
            me,
            &ServerMsg::MatchFound {
                match_id: created.id,
                opponent: opponent.clone(),
                match_type: created.match_type,
                rating_if_win: 0,
                rating_if_loss: 0,
            },
        )
        .await;
    }

    Ok(HttpResponse::Ok().json(created))
}

/// POST /api/invitations/{id}/decline
#[post("/invitations/{id}/decline")]
pub async fn decline(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> ApiResult<HttpResponse> {
    let inv = load(&db, path.into_inner()).await?;
    if inv.recipient != auth.login {
        return Err(ApiError::Forbidden("only the recipient may decline".into()));
    }
    let declined = invitation_repo::resolve(db.get_ref(), inv.id, InvitationStatus::Declined, None)
        .await?
        .ok_or_else(|| ApiError::Conflict("invitation is no longer pending".into()))?;

    broadcast(&redis, &declined).await;
    events::notify(
        &db,
        &redis,
        &declined.sender,
        NotificationKind::ChallengeDeclined,
        json!({ "invitation_id": declined.id, "by": declined.recipient }),
    )
    .await;
    Ok(HttpResponse::Ok().json(declined))
}

/// POST /api/invitations/{id}/cancel
#[post("/invitations/{id}/cancel")]
pub async fn cancel(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> ApiResult<HttpResponse> {
    let inv = load(&db, path.into_inner()).await?;
    if inv.sender != auth.login {
        return Err(ApiError::Forbidden("only the sender may cancel".into()));
    }
    let cancelled = invitation_repo::resolve(db.get_ref(), inv.id, InvitationStatus::Cancelled, None)
        .await?
        .ok_or_else(|| ApiError::Conflict("invitation is no longer pending".into()))?;

    broadcast(&redis, &cancelled).await;
    Ok(HttpResponse::Ok().json(cancelled))
}

//////////////////////////////////////////////////
// Mount
//////////////////////////////////////////////////
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(send)
        .service(pending)
        .service(accept)
        .service(decline)
        .service(cancel);
}
