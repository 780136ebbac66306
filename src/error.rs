//! Crate error types.
//!
//! Compile-time failures (spec §7: `RuleShape`, `PredicateSyntax`,
//! `PredicatePattern`, `DuplicateRule`) are surfaced as [`EngineError`].
//! Runtime failures (`EventShape`, `PredicateRuntime`) are never returned as
//! errors — they are contained at the point of occurrence (a predicate
//! evaluation error becomes `false`; a malformed ingest record is skipped
//! and logged) per spec §7's resolution column.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A rule document is missing a required field or has the wrong shape
    /// for one. Names the offending field.
    #[error("rule '{rule_id}': invalid shape: {message}")]
    RuleShape { rule_id: String, message: String },

    /// A step's `where` expression could not be parsed.
    #[error("rule '{rule_id}' step '{alias}': predicate syntax error: {message}")]
    PredicateSyntax {
        rule_id: String,
        alias: String,
        message: String,
    },

    /// A step's `regex(...)` pattern failed to compile.
    #[error("rule '{rule_id}' step '{alias}': invalid regex pattern")]
    PredicatePattern {
        rule_id: String,
        alias: String,
        #[source]
        source: regex::Error,
    },

    /// A rule with this id is already loaded.
    #[error("rule '{0}' is already loaded")]
    DuplicateRule(String),
}
