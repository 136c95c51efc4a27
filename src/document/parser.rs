use super::Format;
use crate::error::Error;
use serde_json::{Map, Number, Value};

/// Parses document text into a JSON tree.
///
/// Text that looks like JSON is parsed as JSON first and falls back to YAML, which
/// accepts most JSON as well. Everything else is parsed as YAML.
///
/// # Errors
///
/// Returns the JSON error for JSON-looking input that neither parser accepts, and the
/// YAML error otherwise.
pub fn parse_value(content: &str) -> Result<(Value, Format), Error> {
    let looks_like_json = content.trim_start().starts_with('{');

    if looks_like_json {
        return match serde_json::from_str::<Value>(content) {
            Ok(value) => Ok((value, Format::Json)),
            Err(json_error) => {
                tracing::debug!(
                    target: "refscope::document",
                    error = %json_error,
                    "JSON parse failed, retrying as YAML"
                );
                parse_yaml(content)
                    .map(|value| (value, Format::Yaml))
                    .map_err(|_| Error::Json(json_error))
            }
        };
    }

    parse_yaml(content).map(|value| (value, Format::Yaml))
}

fn parse_yaml(content: &str) -> Result<Value, Error> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
    yaml_to_json(yaml)
}

/// Converts a YAML tree to JSON. Non-string mapping keys such as unquoted status codes
/// (`200:`) become their string form.
fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, Error> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => yaml_number(&n)?,
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<_, _>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Result<Value, Error> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Value::from(u));
    }
    n.as_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| Error::invalid_specification(format!("unsupported number '{n}'")))
}

fn yaml_key(key: serde_yaml::Value) -> Result<String, Error> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => Err(
            Error::invalid_specification("mapping keys must be scalars"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_detection() {
        let (value, format) = parse_value(r#"{"openapi": "3.0.0"}"#).unwrap();
        assert_eq!(format, Format::Json);
        assert_eq!(value, json!({"openapi": "3.0.0"}));
    }

    #[test]
    fn test_yaml_numeric_keys_become_strings() {
        let (value, format) = parse_value("responses:\n  200:\n    description: ok\n").unwrap();
        assert_eq!(format, Format::Yaml);
        assert_eq!(value["responses"]["200"]["description"], json!("ok"));
    }

    #[test]
    fn test_json_looking_yaml_falls_back() {
        // unquoted keys are not JSON but are a valid YAML flow mapping
        let (value, format) = parse_value("{a: 1, b: [x, y]}").unwrap();
        assert_eq!(format, Format::Yaml);
        assert_eq!(value, json!({"a": 1, "b": ["x", "y"]}));
    }

    #[test]
    fn test_invalid_input_reports_error() {
        let err = parse_value("{\"a\": [1, 2").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        let yaml_err = parse_value("a: [1, 2\nb: c").unwrap_err();
        assert!(matches!(yaml_err, Error::Yaml(_)));
    }
}
