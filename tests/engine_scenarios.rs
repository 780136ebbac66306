//! End-to-end scenarios driving the crate through its public API, one event
//! record at a time, the way a caller wiring this engine into an event
//! stream would.

use sequence_rule_engine::config::EngineConfig;
use sequence_rule_engine::engine::SequenceEngine;
use sequence_rule_engine::event::Event;
use sequence_rule_engine::rule::{RuleDoc, StepDoc};
use serde_json::json;

fn login_then_access_rule(within_seconds: i64) -> RuleDoc {
    RuleDoc {
        id: "login-then-access".to_string(),
        name: "Login followed by file access".to_string(),
        by: vec!["agent.id".to_string()],
        within_seconds: Some(within_seconds),
        sequence: vec![
            StepDoc {
                as_alias: "login".to_string(),
                where_expr: r#"event.type == "login""#.to_string(),
            },
            StepDoc {
                as_alias: "access".to_string(),
                where_expr: r#"event.type == "file_access""#.to_string(),
            },
        ],
        output: None,
    }
}

fn event(record: serde_json::Value) -> Event {
    Event::from_json_record(&record, None).expect("record is a JSON object")
}

#[test]
fn basic_sequence_within_window_matches() {
    let mut engine = SequenceEngine::new(EngineConfig::default());
    engine.load_rule(&login_then_access_rule(60)).unwrap();

    let e1 = event(json!({
        "timestamp": "2024-01-01T10:00:00Z",
        "agent": {"id": "a1"},
        "event": {"type": "login"}
    }));
    let e2 = event(json!({
        "timestamp": "2024-01-01T10:00:30Z",
        "agent": {"id": "a1"},
        "event": {"type": "file_access"}
    }));

    assert!(engine.process_event(&e1).is_empty());
    let matches = engine.process_event(&e2);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].correlation_key, "a1");
    assert_eq!(matches[0].matched_event_ids, vec![e1.event_id.clone(), e2.event_id.clone()]);
}

#[test]
fn window_exceeded_resets_and_does_not_match() {
    let mut engine = SequenceEngine::new(EngineConfig::default());
    engine.load_rule(&login_then_access_rule(10)).unwrap();

    let e1 = event(json!({
        "timestamp": "2024-01-01T10:00:00Z",
        "agent": {"id": "a1"},
        "event": {"type": "login"}
    }));
    let e2 = event(json!({
        "timestamp": "2024-01-01T10:05:00Z",
        "agent": {"id": "a1"},
        "event": {"type": "file_access"}
    }));

    assert!(engine.process_event(&e1).is_empty());
    assert!(engine.process_event(&e2).is_empty());
}

#[test]
fn per_key_isolation_between_correlation_keys() {
    let mut engine = SequenceEngine::new(EngineConfig::default());
    engine.load_rule(&login_then_access_rule(60)).unwrap();

    let login_a = event(json!({
        "timestamp": "2024-01-01T10:00:00Z",
        "agent": {"id": "a"},
        "event": {"type": "login"}
    }));
    let access_b = event(json!({
        "timestamp": "2024-01-01T10:00:05Z",
        "agent": {"id": "b"},
        "event": {"type": "file_access"}
    }));

    assert!(engine.process_event(&login_a).is_empty());
    assert!(engine.process_event(&access_b).is_empty());

    let summaries = engine.state_summary();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].correlation_key, "a");
}

#[test]
fn out_of_order_steps_do_not_match() {
    let mut engine = SequenceEngine::new(EngineConfig::default());
    engine.load_rule(&login_then_access_rule(60)).unwrap();

    let access = event(json!({
        "timestamp": "2024-01-01T10:00:00Z",
        "agent": {"id": "a1"},
        "event": {"type": "file_access"}
    }));
    let login = event(json!({
        "timestamp": "2024-01-01T10:00:05Z",
        "agent": {"id": "a1"},
        "event": {"type": "login"}
    }));

    assert!(engine.process_event(&access).is_empty());
    assert!(engine.process_event(&login).is_empty());
    let summaries = engine.state_summary();
    assert_eq!(summaries[0].current_step, 1);
}

#[test]
fn multiple_matches_per_key_restart_after_each_completion() {
    let mut engine = SequenceEngine::new(EngineConfig::default());
    engine.load_rule(&login_then_access_rule(60)).unwrap();

    for i in 0..2 {
        let base = 10 * i;
        let login = event(json!({
            "timestamp": format!("2024-01-01T10:{:02}:00Z", base),
            "agent": {"id": "a1"},
            "event": {"type": "login"}
        }));
        let access = event(json!({
            "timestamp": format!("2024-01-01T10:{:02}:05Z", base),
            "agent": {"id": "a1"},
            "event": {"type": "file_access"}
        }));
        assert!(engine.process_event(&login).is_empty());
        assert_eq!(engine.process_event(&access).len(), 1);
    }
}

#[test]
fn missing_correlation_field_is_ignored() {
    let mut engine = SequenceEngine::new(EngineConfig::default());
    engine.load_rule(&login_then_access_rule(60)).unwrap();

    let login_no_agent = event(json!({
        "timestamp": "2024-01-01T10:00:00Z",
        "event": {"type": "login"}
    }));

    assert!(engine.process_event(&login_no_agent).is_empty());
    assert!(engine.state_summary().is_empty());
}

#[test]
fn empty_by_fields_uses_a_single_shared_key() {
    let mut engine = SequenceEngine::new(EngineConfig::default());
    let mut rule = login_then_access_rule(60);
    rule.by = vec![];
    engine.load_rule(&rule).unwrap();

    let login = event(json!({
        "timestamp": "2024-01-01T10:00:00Z",
        "event": {"type": "login"}
    }));
    let access = event(json!({
        "timestamp": "2024-01-01T10:00:05Z",
        "event": {"type": "file_access"}
    }));

    assert!(engine.process_event(&login).is_empty());
    assert_eq!(engine.process_event(&access).len(), 1);
}

#[test]
fn removing_a_rule_drops_its_in_flight_state() {
    let mut engine = SequenceEngine::new(EngineConfig::default());
    engine.load_rule(&login_then_access_rule(60)).unwrap();

    let login = event(json!({
        "timestamp": "2024-01-01T10:00:00Z",
        "agent": {"id": "a1"},
        "event": {"type": "login"}
    }));
    engine.process_event(&login);
    assert_eq!(engine.state_summary().len(), 1);

    assert!(engine.remove_rule("login-then-access"));
    assert!(engine.state_summary().is_empty());
}
