//! JSON shape of the WebSocket protocol.

use pong_server::db::models::MatchType;
use pong_server::protocol::{ClientMsg, ServerMsg};
use serde_json::json;
use uuid::Uuid;

#[test]
fn client_messages_are_tagged_by_type() {
    let id = Uuid::new_v4();
    let msg: ClientMsg = serde_json::from_value(json!({
        "type": "Point",
        "match_id": id,
        "scorer": "alice",
        "rally": 3,
    }))
    .unwrap();
    assert_eq!(
        msg,
        ClientMsg::Point {
            match_id: id,
            scorer: "alice".into(),
            rally: 3,
        }
    );
    assert_eq!(msg.match_id(), id);
}

#[test]
fn unknown_client_message_is_rejected() {
    let res = serde_json::from_value::<ClientMsg>(json!({ "type": "Cheat", "match_id": Uuid::nil() }));
    assert!(res.is_err());
}

#[test]
fn match_found_serializes_mode_in_snake_case() {
    let msg = ServerMsg::MatchFound {
        match_id: Uuid::nil(),
        opponent: "bob".into(),
        match_type: MatchType::Ranked,
        rating_if_win: 12,
        rating_if_loss: -8,
    };
    let v = serde_json::to_value(&msg).unwrap();
    assert_eq!(v["type"], "MatchFound");
    assert_eq!(v["match_type"], "ranked");
    assert_eq!(v["rating_if_loss"], -8);

    let back: ServerMsg = serde_json::from_value(v).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn unit_variant_has_only_a_tag() {
    assert_eq!(serde_json::to_value(&ServerMsg::QueueLeft).unwrap(), json!({ "type": "QueueLeft" }));
}
