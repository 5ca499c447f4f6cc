//! Parsing model text into facts

use serde_json::Value;
use tracing::{debug, warn};

use super::GenerationError;
use crate::domain::Fact;

/// Strip a surrounding Markdown code fence, if any
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a list of facts
///
/// Accepts a JSON array, an object wrapping the array under `facts`, or a
/// single fact object. Incomplete entries are dropped; an answer with no
/// usable fact is an error.
pub fn parse_facts(raw: &str) -> Result<Vec<Fact>, GenerationError> {
    debug!(len = raw.len(), "parse_facts: called");
    let value = parse_json(raw)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("facts") {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(GenerationError::MalformedResponse("\"facts\" is not an array".to_string())),
            None => vec![Value::Object(map)],
        },
        other => {
            return Err(GenerationError::MalformedResponse(format!(
                "expected an array of facts, got {}",
                kind(&other)
            )));
        }
    };

    let total = items.len();
    let facts: Vec<Fact> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<Fact>(item).ok())
        .filter(Fact::is_complete)
        .collect();

    if facts.len() < total {
        warn!(dropped = total - facts.len(), "parse_facts: dropped incomplete facts");
    }
    if facts.is_empty() {
        return Err(GenerationError::MalformedResponse("no complete facts in response".to_string()));
    }
    Ok(facts)
}

/// Parse exactly one fact
///
/// An array answer yields its first complete element.
pub fn parse_fact(raw: &str) -> Result<Fact, GenerationError> {
    debug!(len = raw.len(), "parse_fact: called");
    match parse_json(raw)? {
        Value::Object(map) => {
            let fact: Fact = serde_json::from_value(Value::Object(map))
                .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
            if fact.is_complete() {
                Ok(fact)
            } else {
                Err(GenerationError::MalformedResponse("fact has empty fields".to_string()))
            }
        }
        Value::Array(_) => parse_facts(raw)?
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::MalformedResponse("empty fact list".to_string())),
        other => Err(GenerationError::MalformedResponse(format!(
            "expected a fact object, got {}",
            kind(&other)
        ))),
    }
}

fn parse_json(raw: &str) -> Result<Value, GenerationError> {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse(e.to_string()))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE: &str = r#"[
        {"title": "Hot spots", "domain": "Geology", "text": "Hawaii sits over a plume."},
        {"title": "Pillow lava", "domain": "Geology", "text": "Underwater lava forms pillows."},
        {"title": "Io", "domain": "Astronomy", "text": "Io is the most volcanic body."}
    ]"#;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  [1] "), "[1]");
    }

    #[test]
    fn test_parse_facts_keeps_order() {
        let facts = parse_facts(THREE).unwrap();
        let titles: Vec<_> = facts.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Hot spots", "Pillow lava", "Io"]);
    }

    #[test]
    fn test_parse_facts_fenced_and_wrapped() {
        let raw = format!("```json\n{{\"facts\": {}}}\n```", THREE);
        assert_eq!(parse_facts(&raw).unwrap().len(), 3);
    }

    #[test]
    fn test_parse_facts_drops_incomplete() {
        let raw = r#"[{"title": "A", "domain": "B", "text": "C"}, {"title": "", "domain": "B", "text": "C"}, {"title": "X"}]"#;
        let facts = parse_facts(raw).unwrap();
        assert_eq!(facts, vec![Fact::new("A", "B", "C")]);
    }

    #[test]
    fn test_parse_facts_errors() {
        assert!(matches!(parse_facts(""), Err(GenerationError::EmptyResponse)));
        assert!(matches!(parse_facts("not json"), Err(GenerationError::MalformedResponse(_))));
        assert!(matches!(parse_facts("[]"), Err(GenerationError::MalformedResponse(_))));
        assert!(matches!(parse_facts("42"), Err(GenerationError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_fact() {
        let fact = parse_fact(r#"{"title": "Entropy", "domain": "Physics", "text": "Disorder grows."}"#).unwrap();
        assert_eq!(fact.domain, "Physics");

        let fact = parse_fact(THREE).unwrap();
        assert_eq!(fact.title, "Hot spots");

        assert!(parse_fact(r#"{"title": "Entropy", "domain": "", "text": "x"}"#).is_err());
        assert!(parse_fact(r#""just a string""#).is_err());
    }
}
