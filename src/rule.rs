//! Rule document parsing and the Rule Compiler (spec §4.3, §6).

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::predicate::{self, ParseError, Predicate};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// Declarative rule document as accepted from a caller (spec §6).
///
/// This crate does not own a persistence format; callers hand in an
/// already-parsed document (typically deserialized from the rule store's
/// on-disk representation upstream of this crate).
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDoc {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub by: Vec<String>,
    /// Omitted documents fall back to the compiling engine's
    /// `EngineConfig::default_within_seconds` (original `compiler.py`:
    /// `rule.get("within_seconds", 300)`).
    #[serde(default)]
    pub within_seconds: Option<i64>,
    pub sequence: Vec<StepDoc>,
    #[serde(default)]
    pub output: Option<OutputDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepDoc {
    #[serde(rename = "as")]
    pub as_alias: String,
    #[serde(rename = "where")]
    pub where_expr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputDoc {
    #[serde(default)]
    pub timestamp_ref: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

pub const DEFAULT_OUTPUT_TEMPLATE: &str = "[{timestamp}] [{name}] [{events}]";

/// A single named predicate within a sequence, with its compiled condition.
#[derive(Debug, Clone)]
pub struct CompiledStep {
    pub alias: String,
    pub where_expr: String,
    pub predicate: Predicate,
    pub step_index: usize,
}

impl CompiledStep {
    pub fn matches(&self, record: &std::collections::BTreeMap<String, crate::value::Value>) -> bool {
        self.predicate.eval(record)
    }
}

impl fmt::Display for CompiledStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompiledStep(as='{}', where='{}')", self.alias, self.where_expr)
    }
}

/// A validated, compiled rule ready for the engine to process events against.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule_id: String,
    pub rule_name: String,
    pub by_fields: Vec<String>,
    pub within_seconds: i64,
    pub output_template: String,
    pub steps: Vec<CompiledStep>,
}

impl CompiledRule {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

impl fmt::Display for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CompiledRule(id='{}', name='{}', steps={}, by={:?})",
            self.rule_id,
            self.rule_name,
            self.steps.len(),
            self.by_fields
        )
    }
}

/// Validate a rule document and pre-compile each step's predicate.
///
/// Required: `id`, `name`, non-empty `sequence` with unique, non-empty `as`
/// aliases and parseable `where` expressions. `within_seconds` (positive)
/// falls back to `config.default_within_seconds` when the document omits
/// it. `by` may be empty (spec §4.6: empty `by` correlates on a single
/// constant key).
pub fn compile(rule: &RuleDoc, config: &EngineConfig) -> Result<CompiledRule> {
    if rule.id.trim().is_empty() {
        return Err(EngineError::RuleShape {
            rule_id: rule.id.clone(),
            message: "id must be non-empty".to_string(),
        });
    }
    if rule.name.trim().is_empty() {
        return Err(EngineError::RuleShape {
            rule_id: rule.id.clone(),
            message: "name must be non-empty".to_string(),
        });
    }
    let within_seconds = rule.within_seconds.unwrap_or(config.default_within_seconds);
    if within_seconds <= 0 {
        return Err(EngineError::RuleShape {
            rule_id: rule.id.clone(),
            message: format!("within_seconds must be positive, got {within_seconds}"),
        });
    }
    if rule.sequence.is_empty() {
        return Err(EngineError::RuleShape {
            rule_id: rule.id.clone(),
            message: "sequence must be non-empty".to_string(),
        });
    }

    let mut seen_aliases = HashSet::new();
    let mut steps = Vec::with_capacity(rule.sequence.len());

    for (index, step) in rule.sequence.iter().enumerate() {
        if step.as_alias.trim().is_empty() {
            return Err(EngineError::RuleShape {
                rule_id: rule.id.clone(),
                message: format!("step {index} is missing a non-empty 'as' alias"),
            });
        }
        if !seen_aliases.insert(step.as_alias.clone()) {
            return Err(EngineError::RuleShape {
                rule_id: rule.id.clone(),
                message: format!("duplicate step alias '{}'", step.as_alias),
            });
        }

        let predicate = parse_step_predicate(&rule.id, &step.as_alias, &step.where_expr)?;

        steps.push(CompiledStep {
            alias: step.as_alias.clone(),
            where_expr: step.where_expr.clone(),
            predicate,
            step_index: index,
        });
    }

    let output_template = rule
        .output
        .as_ref()
        .and_then(|o| o.format.clone())
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| config.default_output_template.clone());

    Ok(CompiledRule {
        rule_id: rule.id.clone(),
        rule_name: rule.name.clone(),
        by_fields: rule.by.clone(),
        within_seconds,
        output_template,
        steps,
    })
}

fn parse_step_predicate(rule_id: &str, alias: &str, where_expr: &str) -> Result<Predicate> {
    predicate::parse(where_expr).map_err(|err| match err {
        ParseError::Pattern(source) => EngineError::PredicatePattern {
            rule_id: rule_id.to_string(),
            alias: alias.to_string(),
            source,
        },
        ParseError::Syntax(message) => EngineError::PredicateSyntax {
            rule_id: rule_id.to_string(),
            alias: alias.to_string(),
            message,
        },
    })
}
