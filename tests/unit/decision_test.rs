//! Tests for the decision notification model

use policy_enforcement_point::core::{AckStatus, DecisionError, DecisionNotification, TagValue};

#[test]
fn test_ack_status_wire_values() {
    assert_eq!(AckStatus::Ack.as_u32(), 1);
    assert_eq!(AckStatus::Nack.as_u32(), 0);
}

#[test]
fn test_requires_ack() {
    assert!(!DecisionNotification::new(0).requires_ack());
    assert!(DecisionNotification::new(1).requires_ack());
    assert!(DecisionNotification::new(u32::MAX).requires_ack());
}

#[test]
fn test_facts_keep_pair_order() {
    let n = DecisionNotification::new(4)
        .with_fact("com.nokia.policy.volume_limit", [("group", "player"), ("limit", "90")])
        .with_fact("com.nokia.policy.volume_limit", [("group", "ringtone"), ("limit", "100")]);

    let facts = &n.decisions["com.nokia.policy.volume_limit"];
    assert_eq!(n.fact_count(), 2);
    assert_eq!(facts[1][0], TagValue::new("group", "ringtone"));
    assert_eq!(facts[0][1].value, "90");
}

#[test]
fn test_empty_tag_is_malformed() {
    let n = DecisionNotification::new(9).with_fact("cmd", [("ok", "1")]).with_fact("cmd", [("", "x")]);
    assert_eq!(
        n.validate(),
        Err(DecisionError::EmptyTag {
            command: "cmd".to_string(),
            fact: 1
        })
    );
}

#[test]
fn test_json_without_decisions() {
    let n = DecisionNotification::from_json_str(r#"{"transaction_id": 12}"#).unwrap();
    assert_eq!(n.transaction_id, 12);
    assert!(n.decisions.is_empty());
    assert!(n.validate().is_ok());
}
