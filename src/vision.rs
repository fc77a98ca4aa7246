//! Lenient reader for the vision collaborator's item description.
//!
//! Model output drifts: code fences around the JSON, snake_case keys, a single string where
//! a list belongs, numbers quoted as strings, a bare rating in place of the condition object. Anything that still cannot be read becomes the
//! degraded description rather than an error.

use crate::models::{ItemDescription, UNKNOWN};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::warn;

const LIST_FIELDS: &[&str] = &[
    "logosSeen",
    "distinctiveFeatures",
    "keyFeatures",
    "materials",
    "issues",
    "salvageableComponents",
];
const RATING_FIELDS: &[&str] = &["confidence", "numericRating"];

#[derive(Debug, Error)]
pub enum VisionParseError {
    #[error("response does not contain a JSON object")]
    NotAnObject,
    #[error("invalid json: {0}")]
    Json(String),
}

/// Never fails; falls back to [`ItemDescription::degraded`].
pub fn parse_description(raw: &str) -> ItemDescription {
    match try_parse_description(raw) {
        Ok(item) => item,
        Err(err) => {
            warn!(
                target = "hermes.pipeline",
                error = %err,
                "vision_response_unparseable_using_degraded"
            );
            ItemDescription::degraded()
        }
    }
}

pub fn try_parse_description(raw: &str) -> Result<ItemDescription, VisionParseError> {
    let body = strip_markdown_fence(raw);
    let body = json_object_slice(&body).ok_or(VisionParseError::NotAnObject)?;
    let value: Value =
        serde_json::from_str(body).map_err(|err| VisionParseError::Json(err.to_string()))?;
    let Value::Object(map) = value else {
        return Err(VisionParseError::NotAnObject);
    };
    let mut value = Value::Object(normalize_object(map));
    if let Some(obj) = value.as_object_mut() {
        let category_missing = obj
            .get("category")
            .and_then(Value::as_str)
            .is_none_or(|c| c.trim().is_empty());
        if category_missing {
            obj.insert("category".into(), Value::String(UNKNOWN.into()));
        }
    }
    serde_json::from_value::<ItemDescription>(value)
        .map(ItemDescription::sanitized)
        .map_err(|err| VisionParseError::Json(err.to_string()))
}

fn strip_markdown_fence(input: &str) -> String {
    let trimmed = input.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut body = Vec::new();
    for line in trimmed.lines().skip(1) {
        if line.trim_start().starts_with("```") {
            break;
        }
        body.push(line);
    }
    body.join("\n")
}

/// Outermost `{ ... }` span, tolerating prose around it.
fn json_object_slice(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let end = input.rfind('}')?;
    (end > start).then(|| &input[start..=end])
}

fn normalize_object(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let key = camel_case(&key);
            let value = normalize_field(&key, value);
            (key, value)
        })
        .collect()
}

fn normalize_field(key: &str, value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(normalize_object(map)),
        Value::String(text) if key == "condition" => json!({ "rating": text }),
        _ if key == "condition" => json!({}),
        Value::String(text) if LIST_FIELDS.contains(&key) => Value::Array(
            text.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| Value::String(part.to_string()))
                .collect(),
        ),
        value if RATING_FIELDS.contains(&key) => rating_value(&value),
        Value::String(text) if key == "usableAsIs" => Value::Bool(matches!(
            text.trim().to_lowercase().as_str(),
            "true" | "yes" | "1"
        )),
        Value::Number(number) if matches!(key, "visibleText" | "sizeInfo" | "model" | "era") => {
            Value::String(number.to_string())
        }
        Value::Array(items) if key == "visibleText" => Value::String(
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" "),
        ),
        other => other,
    }
}

/// Integer in `1..=10`; unreadable values fall back to the midpoint.
fn rating_value(value: &Value) -> Value {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let rating = parsed
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(1.0, 10.0) as u64)
        .unwrap_or(5);
    Value::from(rating)
}

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' || ch == '-' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConditionRating;

    #[test]
    fn parses_fenced_snake_case_response() {
        let raw = r#"```json
{
  "category": "Dresser",
  "brand": "unknown",
  "condition": {"rating": "good", "numeric_rating": "7", "usable_as_is": "yes"},
  "identifiers": {"visible_text": "BROYHILL", "logos_seen": "Broyhill, Brasilia"},
  "key_features": ["tapered legs"],
  "confidence": 8.4
}
```"#;
        let item = parse_description(raw);
        assert_eq!(item.category, "Dresser");
        assert_eq!(item.condition.numeric_rating, 7);
        assert!(item.condition.usable_as_is);
        assert_eq!(item.identifiers.logos_seen, vec!["Broyhill", "Brasilia"]);
        assert_eq!(item.key_features, vec!["tapered legs"]);
        assert_eq!(item.confidence, 8);
    }

    #[test]
    fn camel_case_response_with_surrounding_prose() {
        let raw = r#"Here is the analysis: {"category":"Sneakers","brand":"Nike","condition":{"rating":"Fair","usableAsIs":false},"salvageableComponents":"laces"} Hope this helps."#;
        let item = parse_description(raw);
        assert_eq!(item.brand, "Nike");
        assert_eq!(item.condition.rating, ConditionRating::Fair);
        assert!(!item.condition.usable_as_is);
        assert_eq!(item.salvageable_components, vec!["laces"]);
    }

    #[test]
    fn garbage_degrades() {
        let item = parse_description("I could not see the item clearly.");
        assert_eq!(item, ItemDescription::degraded());
        assert_eq!(item.confidence, 1);
        assert_eq!(item.brand, UNKNOWN);

        assert!(try_parse_description("[1, 2, 3]").is_err());
        assert_eq!(
            parse_description(r#"{"category": "Lamp", "identifiers": "none"}"#),
            ItemDescription::degraded()
        );
    }

    #[test]
    fn bare_condition_string_keeps_the_rest_of_the_item() {
        let item =
            parse_description(r#"{"category":"Walnut Dresser","brand":"Broyhill","condition":"good"}"#);
        assert_eq!(item.category, "Walnut Dresser");
        assert_eq!(item.brand, "Broyhill");
        assert_eq!(item.condition.rating, ConditionRating::Good);

        let item = parse_description(r#"{"category": "Lamp", "condition": "broken"}"#);
        assert_eq!(item.category, "Lamp");
        assert_eq!(item.condition.rating, ConditionRating::Unknown);

        let item = parse_description(r#"{"category": "Lamp", "condition": 3}"#);
        assert_eq!(item.category, "Lamp");
        assert!(item.condition.usable_as_is);
    }

    #[test]
    fn missing_category_and_out_of_range_ratings() {
        let item = parse_description(r#"{"confidence": 42, "brand": null}"#);
        assert_eq!(item.category, UNKNOWN);
        assert_eq!(item.brand, UNKNOWN);
        assert_eq!(item.confidence, 10);
    }

    #[test]
    fn camel_case_conversion() {
        assert_eq!(camel_case("logos_seen"), "logosSeen");
        assert_eq!(camel_case("usableAsIs"), "usableAsIs");
        assert_eq!(camel_case("_private"), "private");
    }
}
