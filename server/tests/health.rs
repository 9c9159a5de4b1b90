//! Health report body.

use pong_server::http::health::Health;
use serde_json::json;

#[test]
fn ready_only_with_both_stores() {
    assert!(Health::new(true, true).is_ready());
    assert!(!Health::new(false, true).is_ready());
    assert!(!Health::new(true, false).is_ready());
}

#[test]
fn report_names_the_service_and_each_store() {
    assert_eq!(
        serde_json::to_value(Health::new(true, false)).unwrap(),
        json!({ "service": "pong-server", "postgres": true, "redis": false })
    );
}
