//! Predicate DSL: parser and compiled evaluation (spec §4.2).
//!
//! Surface syntax (exhaustive): `PATH == LITERAL`, `PATH != LITERAL`,
//! `PATH in [LITERAL, ...]`, `contains(PATH, STRING)`, `regex(PATH, STRING)`.
//!
//! The parser recognizes the operator by lexical check, in priority order:
//! `contains(` prefix, `regex(` prefix, ` in [`, `!=`, `==`. Anything else is
//! a compile error.

use crate::path;
use crate::value::Value;
use regex::Regex;
use std::collections::BTreeMap;

/// A compiled predicate, ready for repeated evaluation.
///
/// Evaluation is total and infallible: [`Predicate::eval`] never panics and
/// any internal error is mapped to `false` (spec §7 `PredicateRuntime`).
#[derive(Debug, Clone)]
pub enum Predicate {
    Eq { path: String, value: Value },
    Neq { path: String, value: Value },
    In { path: String, values: Vec<Value> },
    Contains { path: String, text: String },
    Regex {
        path: String,
        pattern: String,
        compiled: Regex,
    },
}

impl Predicate {
    /// Evaluate against a record. Infallible by construction: every branch
    /// is a pure lookup/comparison, so there is nothing to trap (spec §7's
    /// `PredicateRuntime` has no way to arise here).
    pub fn eval(&self, record: &BTreeMap<String, Value>) -> bool {
        match self {
            Predicate::Eq { path, value } => path::extract(record, path, Value::Absent) == *value,
            Predicate::Neq { path, value } => {
                path::extract(record, path, Value::Absent) != *value
            }
            Predicate::In { path, values } => {
                let actual = path::extract(record, path, Value::Absent);
                values.iter().any(|v| *v == actual)
            }
            Predicate::Contains { path, text } => {
                let actual = path::extract(record, path, Value::Absent);
                if actual.is_absent() {
                    return false;
                }
                actual.coerce_text().contains(text.as_str())
            }
            Predicate::Regex {
                path, compiled, ..
            } => {
                let actual = path::extract(record, path, Value::Absent);
                if actual.is_absent() {
                    return false;
                }
                compiled.is_match(&actual.coerce_text())
            }
        }
    }
}

/// Why a `where` expression failed to compile.
///
/// Kept distinct from a plain `String` so callers (the Rule Compiler) can
/// tell a syntax mistake (`PredicateSyntax`) apart from a pattern a regex
/// engine itself rejected (`PredicatePattern`) without re-parsing the
/// expression to find out which.
#[derive(Debug)]
pub enum ParseError {
    Syntax(String),
    Pattern(regex::Error),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Syntax(msg) => write!(f, "{msg}"),
            ParseError::Pattern(e) => write!(f, "{e}"),
        }
    }
}

/// Parse a `where` expression into a [`Predicate`].
pub fn parse(expression: &str) -> Result<Predicate, ParseError> {
    let expr = expression.trim();
    if expr.is_empty() {
        return Err(ParseError::Syntax("empty where expression".to_string()));
    }

    if expr.contains("contains(") {
        parse_contains(expr)
    } else if expr.contains("regex(") {
        parse_regex(expr)
    } else if looks_like_in(expr) {
        parse_in(expr)
    } else if expr.contains("!=") {
        parse_comparison(expr, "!=")
    } else if expr.contains("==") {
        parse_comparison(expr, "==")
    } else {
        Err(ParseError::Syntax(format!(
            "unsupported expression syntax: {expr}"
        )))
    }
}

fn looks_like_in(expr: &str) -> bool {
    static PATTERN: &str = r"\s+in\s*\[";
    Regex::new(PATTERN)
        .expect("static in-operator pattern is valid")
        .is_match(expr)
}

fn parse_comparison(expr: &str, op: &str) -> Result<Predicate, ParseError> {
    let mut parts = expr.splitn(2, op);
    let path = parts
        .next()
        .ok_or_else(|| ParseError::Syntax(format!("invalid {op} expression: {expr}")))?
        .trim()
        .to_string();
    let value_str = parts
        .next()
        .ok_or_else(|| ParseError::Syntax(format!("invalid {op} expression: {expr}")))?
        .trim();

    if path.is_empty() || value_str.is_empty() {
        return Err(ParseError::Syntax(format!(
            "invalid {op} expression: {expr}"
        )));
    }

    let value = parse_literal(value_str);
    Ok(if op == "==" {
        Predicate::Eq { path, value }
    } else {
        Predicate::Neq { path, value }
    })
}

fn parse_in(expr: &str) -> Result<Predicate, ParseError> {
    let re = Regex::new(r"(?s)^(.+?)\s+in\s*\[(.+?)\]").expect("static in-expression pattern");
    let caps = re
        .captures(expr)
        .ok_or_else(|| ParseError::Syntax(format!("invalid 'in' expression: {expr}")))?;
    let path = caps[1].trim().to_string();
    let values_str = caps[2].trim();

    let values = values_str
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_literal)
        .collect();

    Ok(Predicate::In { path, values })
}

fn parse_contains(expr: &str) -> Result<Predicate, ParseError> {
    let re = Regex::new(r"(?s)contains\s*\(\s*(.+?)\s*,\s*(.+?)\s*\)")
        .expect("static contains-expression pattern");
    let caps = re
        .captures(expr)
        .ok_or_else(|| ParseError::Syntax(format!("invalid contains expression: {expr}")))?;
    let path = caps[1].trim().to_string();
    let value = parse_literal(caps[2].trim());

    match value {
        Value::String(text) => Ok(Predicate::Contains { path, text }),
        other => Err(ParseError::Syntax(format!(
            "contains search value must be a string, got {other:?}"
        ))),
    }
}

fn parse_regex(expr: &str) -> Result<Predicate, ParseError> {
    let re = Regex::new(r"(?s)regex\s*\(\s*(.+?)\s*,\s*(.+?)\s*\)")
        .expect("static regex-expression pattern");
    let caps = re
        .captures(expr)
        .ok_or_else(|| ParseError::Syntax(format!("invalid regex expression: {expr}")))?;
    let path = caps[1].trim().to_string();
    let value = parse_literal(caps[2].trim());

    let pattern = match value {
        Value::String(s) => s,
        other => {
            return Err(ParseError::Syntax(format!(
                "regex pattern must be a string, got {other:?}"
            )))
        }
    };

    let compiled = Regex::new(&pattern).map_err(ParseError::Pattern)?;

    Ok(Predicate::Regex {
        path,
        pattern,
        compiled,
    })
}

/// Parse a literal token: quoted string, int, decimal, `true`/`false`,
/// `null`/`none`. Anything else falls through to a bare string literal.
fn parse_literal(raw: &str) -> Value {
    let s = raw.trim();

    if s.len() >= 2 {
        let bytes = s.as_bytes();
        if (bytes[0] == b'"' && bytes[s.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[s.len() - 1] == b'\'')
        {
            return Value::String(s[1..s.len() - 1].to_string());
        }
    }

    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }

    if s == "null" || s == "none" {
        return Value::Null;
    }

    if s.contains('.') {
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
    } else if let Ok(i) = s.parse::<i64>() {
        return Value::Int(i);
    }

    Value::String(s.to_string())
}
