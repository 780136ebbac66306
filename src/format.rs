//! Match Formatter (spec §4.7).

use crate::engine::Match;

/// Render a match through a template string. Unknown placeholders are left
/// literal; `{timestamp}` renders as `YYYY-MM-DD HH:MM:SS` UTC.
pub fn render(template: &str, m: &Match) -> String {
    let timestamp = m.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
    let events = m.matched_event_ids.join(",");

    template
        .replace("{timestamp}", &timestamp)
        .replace("{name}", &m.rule_name)
        .replace("{events}", &events)
        .replace("{correlation_key}", &m.correlation_key)
        .replace("{rule_id}", &m.rule_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_match() -> Match {
        Match {
            rule_id: "r1".to_string(),
            rule_name: "Login then access".to_string(),
            correlation_key: "a".to_string(),
            matched_event_ids: vec!["e1".to_string(), "e2".to_string()],
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 10).unwrap(),
        }
    }

    #[test]
    fn default_template_renders_all_fields() {
        let m = sample_match();
        let out = render("[{timestamp}] [{name}] [{events}]", &m);
        assert_eq!(out, "[2024-01-01 10:00:10] [Login then access] [e1,e2]");
    }

    #[test]
    fn unknown_placeholder_left_literal() {
        let m = sample_match();
        let out = render("{unknown} {rule_id}", &m);
        assert_eq!(out, "{unknown} r1");
    }

    #[test]
    fn correlation_key_placeholder() {
        let m = sample_match();
        let out = render("key={correlation_key}", &m);
        assert_eq!(out, "key=a");
    }
}
