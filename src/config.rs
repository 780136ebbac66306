//! Engine-tunable defaults.
//!
//! Mirrors the teacher's `serde`-derived configuration-struct style
//! (`PipelineConfig` in the source workspace's unified pipeline crate):
//! operational knobs the spec leaves as implementation choices, not
//! detection semantics.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Sweep cadence for garbage collection, in events processed (spec
    /// §4.6: "implementations may batch sweeps ... every K events").
    pub gc_batch_events: u32,
    /// Fallback window in seconds when a rule document omits
    /// `within_seconds` (`rule::compile` consults this).
    pub default_within_seconds: i64,
    /// Fallback output template when a rule document omits `output.format`
    /// (spec §4.7; `rule::compile` consults this).
    pub default_output_template: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            gc_batch_events: 64,
            default_within_seconds: 300,
            default_output_template: crate::rule::DEFAULT_OUTPUT_TEMPLATE.to_string(),
        }
    }
}
