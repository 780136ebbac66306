//! Sequence Engine (spec §4.6): ingest events, dispatch to per-key states,
//! emit matches, and garbage-collect expired state.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::event::Event;
use crate::path;
use crate::rule::{self, CompiledRule, RuleDoc};
use crate::state::CorrelationState;
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// A completed sequence for one correlation key (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub rule_id: String,
    pub rule_name: String,
    pub correlation_key: String,
    pub matched_event_ids: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StateSummary {
    pub rule_id: String,
    pub correlation_key: String,
    pub current_step: usize,
    pub matched_events: usize,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
    /// True if this state's matched timestamps are out of order (`last_ts`
    /// earlier than `first_ts`), which can only arise from inspecting state
    /// assembled outside the engine's own advance/reset lifecycle.
    pub has_invalid_timestamp_order: bool,
}

type StateKey = (String, String);

/// Core sequence matching engine. One instance maintains its own rule list
/// and per-`(rule, correlation key)` state map; see spec §5 for the
/// single-threaded-per-instance scheduling model this assumes.
pub struct SequenceEngine {
    rules: Vec<CompiledRule>,
    state_map: HashMap<StateKey, CorrelationState>,
    config: EngineConfig,
    events_since_sweep: u32,
}

impl SequenceEngine {
    pub fn new(config: EngineConfig) -> SequenceEngine {
        SequenceEngine {
            rules: Vec::new(),
            state_map: HashMap::new(),
            config,
            events_since_sweep: 0,
        }
    }

    pub fn load_rule(&mut self, doc: &RuleDoc) -> Result<CompiledRule> {
        if self.rules.iter().any(|r| r.rule_id == doc.id) {
            return Err(EngineError::DuplicateRule(doc.id.clone()));
        }
        let compiled = rule::compile(doc, &self.config)?;
        info!(rule_id = %compiled.rule_id, steps = compiled.step_count(), "loaded rule");
        self.rules.push(compiled.clone());
        Ok(compiled)
    }

    pub fn load_rules(&mut self, docs: &[RuleDoc]) -> Result<Vec<CompiledRule>> {
        docs.iter().map(|doc| self.load_rule(doc)).collect()
    }

    /// Drop a rule and all state entries belonging to it.
    pub fn remove_rule(&mut self, rule_id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.rule_id != rule_id);
        let removed = self.rules.len() != before;
        if removed {
            self.state_map.retain(|(rid, _), _| rid != rule_id);
            info!(rule_id, "removed rule");
        }
        removed
    }

    /// Drop all correlation state. Rules remain loaded.
    pub fn reset(&mut self) {
        self.state_map.clear();
        self.events_since_sweep = 0;
    }

    pub fn loaded_rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn process_event(&mut self, event: &Event) -> Vec<Match> {
        let mut matches = Vec::new();

        for rule in &self.rules {
            if let Some(m) = advance_for_rule(rule, &mut self.state_map, event) {
                matches.push(m);
            }
        }

        self.maybe_sweep(event.timestamp);
        matches
    }

    /// Convenience: process a batch, preserving input order, concatenating
    /// per-event results.
    pub fn process_events(&mut self, events: &[Event]) -> Vec<Match> {
        let mut all = Vec::new();
        for event in events {
            all.extend(self.process_event(event));
        }
        all
    }

    fn maybe_sweep(&mut self, now: DateTime<Utc>) {
        self.events_since_sweep += 1;
        if self.events_since_sweep >= self.config.gc_batch_events.max(1) {
            self.sweep(now);
            self.events_since_sweep = 0;
        }
    }

    /// Remove states idle longer than their rule's window, relative to
    /// `now` (spec §4.6). Each `(rule, key)` state is visited once.
    fn sweep(&mut self, now: DateTime<Utc>) {
        let windows: HashMap<&str, i64> = self
            .rules
            .iter()
            .map(|r| (r.rule_id.as_str(), r.within_seconds))
            .collect();

        let before = self.state_map.len();
        self.state_map.retain(|(rule_id, _key), state| {
            match windows.get(rule_id.as_str()) {
                Some(window) => !state.is_idle_expired(now, *window),
                // Rule no longer loaded; remove_rule already swept its
                // states, but keep this defensive for future callers.
                None => false,
            }
        });
        let reaped = before - self.state_map.len();
        if reaped > 0 {
            debug!(reaped, "garbage collected expired correlation states");
        }
    }

    pub fn state_summary(&self) -> Vec<StateSummary> {
        self.state_map
            .iter()
            .map(|((rule_id, key), state)| StateSummary {
                rule_id: rule_id.clone(),
                correlation_key: key.clone(),
                current_step: state.current_step_idx,
                matched_events: state.matched_ids.len(),
                first_timestamp: state.first_ts,
                last_timestamp: state.last_ts,
                duration_seconds: state.duration_seconds(),
                // Checked against i64::MAX so only the negative-elapsed
                // branch of is_expired can trip this, not the window.
                has_invalid_timestamp_order: state.is_expired(i64::MAX),
            })
            .collect()
    }
}

/// Step match algorithm for one rule against one event (spec §4.6).
fn advance_for_rule(
    rule: &CompiledRule,
    state_map: &mut HashMap<StateKey, CorrelationState>,
    event: &Event,
) -> Option<Match> {
    let key = correlation_key(rule, event)?;
    let n = rule.step_count();
    let state_key = (rule.rule_id.clone(), key.clone());

    if let Some(state) = state_map.get_mut(&state_key) {
        if state.is_complete(n) {
            state.reset();
        }
    }

    let current_idx = state_map
        .get(&state_key)
        .map(|s| s.current_step_idx)
        .unwrap_or(0);

    let step = &rule.steps[current_idx];
    if !step.matches(&event.fields) {
        return None;
    }

    let state = state_map
        .entry(state_key)
        .or_insert_with(|| CorrelationState::new(key.clone()));

    if current_idx > 0 {
        if let Some(first) = state.first_ts {
            let elapsed = (event.timestamp - first).num_seconds();
            if elapsed > rule.within_seconds {
                state.reset();
                if !rule.steps[0].matches(&event.fields) {
                    debug!(
                        rule_id = %rule.rule_id,
                        correlation_key = %key,
                        "window exceeded, restart candidate did not match step 0"
                    );
                    return None;
                }
            }
        }
    }

    state.advance(event.event_id.clone(), event.timestamp);
    debug!(
        rule_id = %rule.rule_id,
        correlation_key = %key,
        step = state.current_step_idx,
        "advanced correlation state"
    );

    if state.is_complete(n) {
        let m = Match {
            rule_id: rule.rule_id.clone(),
            rule_name: rule.rule_name.clone(),
            correlation_key: key.clone(),
            matched_event_ids: state.matched_ids.clone(),
            timestamp: event.timestamp,
        };
        state.reset();
        info!(rule_id = %rule.rule_id, correlation_key = %key, "sequence matched");
        return Some(m);
    }

    None
}

/// Derive the correlation key for a rule/event pair (spec §4.6).
///
/// Empty `by` correlates everything onto a single constant key. Otherwise,
/// if any configured field is absent from the event, the event is ignored
/// for this rule (`None`).
fn correlation_key(rule: &CompiledRule, event: &Event) -> Option<String> {
    if rule.by_fields.is_empty() {
        return Some("default".to_string());
    }

    let extracted = path::extract_multiple(&event.fields, &rule.by_fields, Value::Absent);

    let mut parts = Vec::with_capacity(rule.by_fields.len());
    for field in &rule.by_fields {
        let value = extracted.get(field).unwrap_or(&Value::Absent);
        if value.is_absent() {
            warn!(
                rule_id = %rule.rule_id,
                field,
                "correlation field absent, ignoring event for this rule"
            );
            return None;
        }
        parts.push(value.coerce_text());
    }

    Some(parts.join("|"))
}
