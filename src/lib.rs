//! Sequence Rule Engine
//!
//! Detects ordered event sequences in a stream of security alerts.
//! Operators author sequence rules declaring an ordered list of step
//! predicates, a correlation key, and a time window; the engine consumes a
//! timestamped event stream and emits a match every time a complete
//! sequence is observed for a single correlation key within the window.
//!
//! # Scope
//!
//! This crate is the sequence matching engine only: a predicate expression
//! language for step conditions, a rule compiler, a per-correlation-key
//! state machine, and the time-window/reset semantics that govern matching.
//! Persistent rule storage, an HTTP control surface, ingestion transports,
//! and downstream alert sinks are external collaborators this crate does
//! not implement — see `SPEC_FULL.md` for the full boundary.
//!
//! # Quick start
//!
//! ```
//! use sequence_rule_engine::config::EngineConfig;
//! use sequence_rule_engine::engine::SequenceEngine;
//! use sequence_rule_engine::rule::{RuleDoc, StepDoc};
//! use sequence_rule_engine::event::Event;
//! use sequence_rule_engine::value::Value;
//! use std::collections::BTreeMap;
//!
//! let rule = RuleDoc {
//!     id: "login-then-access".to_string(),
//!     name: "Login followed by file access".to_string(),
//!     by: vec!["agent.id".to_string()],
//!     within_seconds: Some(60),
//!     sequence: vec![
//!         StepDoc { as_alias: "login".to_string(), where_expr: r#"event.type == "login""#.to_string() },
//!         StepDoc { as_alias: "access".to_string(), where_expr: r#"event.type == "file_access""#.to_string() },
//!     ],
//!     output: None,
//! };
//!
//! let mut engine = SequenceEngine::new(EngineConfig::default());
//! engine.load_rule(&rule).unwrap();
//!
//! let mut fields = BTreeMap::new();
//! fields.insert("agent".to_string(), Value::Map(BTreeMap::from([("id".to_string(), Value::String("a".to_string()))])));
//! fields.insert("event".to_string(), Value::Map(BTreeMap::from([("type".to_string(), Value::String("login".to_string()))])));
//! let event = Event::new(fields, None, Some("e1".to_string()));
//!
//! let matches = engine.process_event(&event);
//! assert!(matches.is_empty()); // only step 0 matched so far
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod format;
pub mod harness;
pub mod path;
pub mod predicate;
pub mod rule;
pub mod state;
pub mod value;

pub use engine::{Match, SequenceEngine, StateSummary};
pub use error::{EngineError, Result};
pub use event::Event;
pub use rule::{CompiledRule, CompiledStep, RuleDoc};
pub use value::Value;
