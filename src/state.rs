//! Correlation State (spec §4.5).

use chrono::{DateTime, Utc};

/// Per-`(rule, correlation key)` progress through a sequence.
#[derive(Debug, Clone)]
pub struct CorrelationState {
    pub key: String,
    pub current_step_idx: usize,
    pub matched_ids: Vec<String>,
    pub timestamps: Vec<DateTime<Utc>>,
    pub first_ts: Option<DateTime<Utc>>,
    pub last_ts: Option<DateTime<Utc>>,
}

impl CorrelationState {
    pub fn new(key: String) -> CorrelationState {
        CorrelationState {
            key,
            current_step_idx: 0,
            matched_ids: Vec::new(),
            timestamps: Vec::new(),
            first_ts: None,
            last_ts: None,
        }
    }

    /// Append a matched event and advance to the next step.
    pub fn advance(&mut self, event_id: String, ts: DateTime<Utc>) {
        self.matched_ids.push(event_id);
        self.timestamps.push(ts);
        if self.first_ts.is_none() {
            self.first_ts = Some(ts);
        }
        self.last_ts = Some(ts);
        self.current_step_idx += 1;
    }

    pub fn reset(&mut self) {
        self.current_step_idx = 0;
        self.matched_ids.clear();
        self.timestamps.clear();
        self.first_ts = None;
        self.last_ts = None;
    }

    pub fn is_complete(&self, total_steps: usize) -> bool {
        self.current_step_idx >= total_steps
    }

    /// True when progress exists and has been idle longer than `window`
    /// relative to `now`, measured from `last_ts` (spec §4.6: GC sweeps on
    /// elapsed-since-last-match; the original's `_cleanup_expired_states`
    /// keys off `last_ts` the same way).
    pub fn is_idle_expired(&self, now: DateTime<Utc>, window_seconds: i64) -> bool {
        match self.last_ts {
            None => false,
            Some(last) => (now - last).num_seconds() > window_seconds,
        }
    }

    /// Whether the matched-so-far span already exceeds a given window.
    /// Also treats a negative span (possible only via out-of-band state
    /// inspection, never via the engine's own advance/reset lifecycle) as
    /// expired, mirroring the original engine's `is_expired`.
    pub fn is_expired(&self, window_seconds: i64) -> bool {
        match (self.first_ts, self.last_ts) {
            (Some(first), Some(last)) => {
                let elapsed = (last - first).num_seconds();
                elapsed < 0 || elapsed > window_seconds
            }
            _ => false,
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        match (self.first_ts, self.last_ts) {
            (Some(first), Some(last)) => (last - first).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        }
    }
}
