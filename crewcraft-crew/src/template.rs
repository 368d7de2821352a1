//! `{placeholder}` templates for agent and task text

use crewcraft_error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid"));

/// Run inputs, keyed by placeholder name
pub type Inputs = serde_json::Map<String, Value>;

/// Replace every `{name}` in `template` with the matching input.
///
/// Only identifier-shaped placeholders are recognised, so JSON examples
/// embedded in a prompt pass through untouched. Strings are inserted
/// verbatim, any other value as its JSON text.
pub fn interpolate(template: &str, inputs: &Inputs) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = inputs.get(name.as_str()).ok_or_else(|| {
            Error::template_variable_missing(name.as_str()).with_operation("template::interpolate")
        })?;

        out.push_str(&template[last..whole.start()]);
        match value {
            Value::String(s) => out.push_str(s),
            other => out.push_str(&other.to_string()),
        }
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewcraft_error::ErrorKind;
    use serde_json::json;

    fn inputs(value: Value) -> Inputs {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_substitutes_strings_and_numbers() {
        let inputs = inputs(json!({ "vacation_city": "Honolulu", "budget": 10000, "group_size": 7 }));
        let text = interpolate("Find a rental in {vacation_city} for {group_size} under {budget}.", &inputs).unwrap();
        assert_eq!(text, "Find a rental in Honolulu for 7 under 10000.");
    }

    #[test]
    fn test_repeated_placeholder() {
        let inputs = inputs(json!({ "topic": "sorting" }));
        assert_eq!(interpolate("{topic}/{topic}", &inputs).unwrap(), "sorting/sorting");
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let err = interpolate("Plan {topic}", &Inputs::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TemplateVariableMissing);
        assert!(err.message().contains("topic"));
    }

    #[test]
    fn test_json_braces_pass_through() {
        let template = r#"Respond with {"coworker": "<role>"} for {topic} {} { x }"#;
        let inputs = inputs(json!({ "topic": "travel" }));
        assert_eq!(
            interpolate(template, &inputs).unwrap(),
            r#"Respond with {"coworker": "<role>"} for travel {} { x }"#
        );
    }

    #[test]
    fn test_nested_and_adjacent_braces() {
        let inputs = inputs(json!({ "city": "Honolulu", "days": 7 }));
        assert_eq!(
            interpolate("{{city}} {days}{city}", &inputs).unwrap(),
            "{Honolulu} 7Honolulu"
        );
    }

    #[test]
    fn test_unterminated_brace() {
        let inputs = inputs(json!({ "a": 1 }));
        assert_eq!(interpolate("{a} {b", &inputs).unwrap(), "1 {b");
    }
}
