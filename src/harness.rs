//! Test Harness Interface (spec §4.8): batch-mode "rule + event list ->
//! matches" evaluator for validate/test tooling built on top of this crate.

use crate::config::EngineConfig;
use crate::engine::{Match, SequenceEngine};
use crate::error::EngineError;
use crate::event::Event;
use crate::rule::RuleDoc;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Compiled-rule metadata returned alongside batch results, for display in
/// a validate/test response.
#[derive(Debug, Clone, Serialize)]
pub struct RuleSummary {
    pub rule_id: String,
    pub rule_name: String,
    pub step_count: usize,
    pub by_fields: Vec<String>,
    pub within_seconds: i64,
    pub output_template: String,
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub rule: RuleSummary,
    pub events_processed: usize,
    pub matches: Vec<Match>,
}

/// Why a batch run could not complete.
#[derive(Debug)]
pub enum HarnessError {
    /// The rule failed to compile (spec §7 compile-time kinds).
    RuleCompile(EngineError),
    /// Event record at `index` could not be parsed into an event; the batch
    /// is aborted at this point (spec §4.8: "Event records that fail to
    /// parse abort the batch with the error").
    EventParse { index: usize, message: String },
}

impl std::fmt::Display for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarnessError::RuleCompile(e) => write!(f, "rule compile error: {e}"),
            HarnessError::EventParse { index, message } => {
                write!(f, "event record {index}: {message}")
            }
        }
    }
}

impl std::error::Error for HarnessError {}

/// Run one rule against an ordered batch of event records.
///
/// Timestamps are read from each record's `timestamp` field (ISO-8601) when
/// present; absent or unparseable timestamps default to ingestion time
/// (spec §4.8, §9 Open Questions: this crate preserves the original
/// leniency of substituting ingestion time rather than rejecting the
/// record, since the record itself is still well-formed JSON).
pub fn run_batch(rule: &RuleDoc, events: &[JsonValue]) -> Result<BatchResult, HarnessError> {
    let mut engine = SequenceEngine::new(EngineConfig::default());
    let compiled = engine
        .load_rule(rule)
        .map_err(HarnessError::RuleCompile)?;

    let summary = RuleSummary {
        rule_id: compiled.rule_id.clone(),
        rule_name: compiled.rule_name.clone(),
        step_count: compiled.step_count(),
        by_fields: compiled.by_fields.clone(),
        within_seconds: compiled.within_seconds,
        output_template: compiled.output_template.clone(),
    };

    let mut parsed_events = Vec::with_capacity(events.len());
    for (index, record) in events.iter().enumerate() {
        match Event::from_json_record(record, None) {
            Some(event) => parsed_events.push(event),
            None => {
                return Err(HarnessError::EventParse {
                    index,
                    message: "event record must be a JSON object".to_string(),
                })
            }
        }
    }

    let matches = engine.process_events(&parsed_events);

    Ok(BatchResult {
        rule: summary,
        events_processed: parsed_events.len(),
        matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::StepDoc;
    use serde_json::json;

    fn two_step_rule() -> RuleDoc {
        RuleDoc {
            id: "r1".to_string(),
            name: "Login then file access".to_string(),
            by: vec!["agent.id".to_string()],
            within_seconds: Some(60),
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

    #[test]
    fn runs_batch_and_reports_summary_and_matches() {
        let events = vec![
            json!({"timestamp": "2024-01-01T10:00:00Z", "agent": {"id": "a"}, "event": {"type": "login"}}),
            json!({"timestamp": "2024-01-01T10:00:10Z", "agent": {"id": "a"}, "event": {"type": "file_access"}}),
        ];

        let result = run_batch(&two_step_rule(), &events).unwrap();
        assert_eq!(result.rule.step_count, 2);
        assert_eq!(result.rule.within_seconds, 60);
        assert_eq!(result.rule.output_template, crate::rule::DEFAULT_OUTPUT_TEMPLATE);
        assert_eq!(result.events_processed, 2);
        assert_eq!(result.matches.len(), 1);
    }

    #[test]
    fn missing_within_seconds_uses_the_engine_default() {
        let mut rule = two_step_rule();
        rule.within_seconds = None;
        let result = run_batch(&rule, &[]).unwrap();
        assert_eq!(result.rule.within_seconds, EngineConfig::default().default_within_seconds);
    }

    #[test]
    fn surfaces_rule_compile_errors() {
        let mut rule = two_step_rule();
        rule.sequence.clear();
        let err = run_batch(&rule, &[]).unwrap_err();
        assert!(matches!(err, HarnessError::RuleCompile(_)));
    }

    #[test]
    fn aborts_batch_on_unparseable_event_record() {
        let events = vec![
            json!({"agent": {"id": "a"}, "event": {"type": "login"}}),
            json!([1, 2, 3]),
        ];
        let err = run_batch(&two_step_rule(), &events).unwrap_err();
        assert!(matches!(err, HarnessError::EventParse { index: 1, .. }));
    }
}
