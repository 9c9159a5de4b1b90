use anyhow::{Context, Result};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::db::models::{Invitation, InvitationStatus};

/// Create a pending challenge. `None` if one is already pending between the
/// two players, in either direction.
pub async fn create(db: &PgPool, sender: &str, recipient: &str) -> Result<Option<Invitation>> {
    sqlx::query_as::<_, Invitation>(
        r#"INSERT INTO invitations (id, sender, recipient)
           VALUES ($1, $2, $3)
           ON CONFLICT ((LEAST(sender, recipient)), (GREATEST(sender, recipient)))
              WHERE status = 'pending' DO NOTHING
           RETURNING *"#,
    )
    .bind(Uuid::new_v4())
    .bind(sender)
    .bind(recipient)
    .fetch_optional(db)
    .await
    .context("creating invitation")
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<Invitation>> {
    sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("fetching invitation")
}

/// Pending challenges the player sent or received, newest first.
pub async fn pending_for(db: &PgPool, login: &str) -> Result<Vec<Invitation>> {
    sqlx::query_as::<_, Invitation>(
        "SELECT * FROM invitations
          WHERE (sender = $1 OR recipient = $1) AND status = 'pending'
          ORDER BY created_at DESC",
    )
    .bind(login)
    .fetch_all(db)
    .await
    .context("listing invitations")
}

/// Move a pending invitation to `status`. `None` if it was no longer pending.
pub async fn resolve<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    status: InvitationStatus,
    match_id: Option<Uuid>,
) -> Result<Option<Invitation>> {
    sqlx::query_as::<_, Invitation>(
        "UPDATE invitations
            SET status = $2, match_id = $3
          WHERE id = $1 AND status = 'pending'
      RETURNING *",
    )
    .bind(id)
    .bind(status.as_str())
    .bind(match_id)
    .fetch_optional(db)
    .await
    .context("resolving invitation")
}
