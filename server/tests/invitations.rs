//! Friend challenges between two players.

use chrono::Utc;
use pong_server::db::models::{Invitation, InvitationStatus};
use uuid::Uuid;

fn challenge(sender: &str, recipient: &str) -> Invitation {
    Invitation {
        id: Uuid::new_v4(),
        sender: sender.into(),
        recipient: recipient.into(),
        status: InvitationStatus::Pending,
        match_id: None,
        created_at: Utc::now(),
    }
}

#[test]
fn a_challenge_links_the_pair_in_both_directions() {
    let inv = challenge("alice", "bob");
    assert!(inv.is_between("alice", "bob"));
    // bob challenging alice back collides with the same pending challenge
    assert!(inv.is_between("bob", "alice"));
}

#[test]
fn other_pairs_are_unrelated() {
    let inv = challenge("alice", "bob");
    assert!(!inv.is_between("alice", "carol"));
    assert!(!inv.is_between("carol", "bob"));
    assert!(!inv.is_between("alice", "alice"));
}

#[test]
fn pending_index_ignores_direction() {
    let schema = include_str!("../migrations/0001_init.sql");
    let index = schema
        .split(';')
        .find(|stmt| stmt.contains("invitations_pending_uq"))
        .expect("pending invitation index");
    assert!(index.contains("LEAST(sender, recipient)"));
    assert!(index.contains("GREATEST(sender, recipient)"));
    assert!(index.contains("WHERE status = 'pending'"));
}
