//! Task and crew results, and the schemas structured results must satisfy

use crewcraft_error::{Error, Result};
use crewcraft_llm::UsageTracker;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

type Normalizer = fn(&Value) -> std::result::Result<Value, serde_json::Error>;

/// A structured output contract, derived from a Rust type.
///
/// The JSON Schema is shown to the model; the type itself is the validator.
#[derive(Clone)]
pub struct OutputSchema {
    name: String,
    schema: Value,
    normalize: Normalizer,
}

impl OutputSchema {
    pub fn of<T>() -> Self
    where
        T: JsonSchema + DeserializeOwned + Serialize,
    {
        let schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or(Value::Null);
        Self {
            name: T::schema_name(),
            schema,
            normalize: normalize::<T>,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn json_schema(&self) -> &Value {
        &self.schema
    }

    /// Validate an already-parsed value, returning its normalized form
    pub fn validate(&self, value: &Value) -> Result<Value> {
        (self.normalize)(value).map_err(|e| {
            Error::schema_mismatch(&self.name, e.to_string())
                .with_operation("schema::validate")
                .set_source(e)
        })
    }

    /// Pull the JSON out of a model answer and validate it
    pub fn parse(&self, raw: &str) -> Result<Value> {
        let json = extract_json(raw);
        let value: Value = serde_json::from_str(json).map_err(|e| {
            Error::schema_mismatch(&self.name, format!("answer is not JSON: {}", e))
                .with_operation("schema::parse")
                .set_source(e)
        })?;
        self.validate(&value)
    }
}

impl std::fmt::Debug for OutputSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSchema").field("name", &self.name).finish()
    }
}

fn normalize<T>(value: &Value) -> std::result::Result<Value, serde_json::Error>
where
    T: DeserializeOwned + Serialize,
{
    let typed: T = serde_json::from_value(value.clone())?;
    serde_json::to_value(typed)
}

/// Strip markdown fences and chatter around a JSON answer.
///
/// A bare JSON answer is returned as is, even when its strings contain fences.
pub fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    if is_json(trimmed) {
        return trimmed;
    }
    if let Some(body) = fenced_block(trimmed).filter(|body| is_json(body)) {
        return body;
    }
    match (trimmed.find(['{', '[']), trimmed.rfind(['}', ']'])) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

fn is_json(text: &str) -> bool {
    serde_json::from_str::<serde::de::IgnoredAny>(text).is_ok()
}

fn fenced_block(text: &str) -> Option<&str> {
    let (_, after) = text.split_once("```")?;
    let after = after.strip_prefix("json").unwrap_or(after);
    let (body, _) = after.split_once("```")?;
    Some(body.trim())
}

/// Result of one task
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutput {
    pub description: String,
    pub agent: String,
    pub raw: String,
    /// Normalized JSON for schema-tagged tasks
    pub json: Option<Value>,
}

impl TaskOutput {
    /// What gets persisted: pretty JSON when structured, else the raw text
    pub fn to_file_contents(&self) -> Result<String> {
        match &self.json {
            Some(json) => serde_json::to_string_pretty(json)
                .map_err(|e| Error::serialization_failed(e.to_string()).set_source(e)),
            None => Ok(self.raw.clone()),
        }
    }
}

/// Result of a whole crew run
#[derive(Debug, Clone, Serialize)]
pub struct CrewOutput {
    pub raw: String,
    pub json: Option<Value>,
    pub tasks_output: Vec<TaskOutput>,
    pub token_usage: UsageTracker,
}

impl CrewOutput {
    pub(crate) fn from_tasks(tasks_output: Vec<TaskOutput>, token_usage: UsageTracker) -> Self {
        let (raw, json) = tasks_output
            .last()
            .map(|t| (t.raw.clone(), t.json.clone()))
            .unwrap_or_default();
        Self {
            raw,
            json,
            tasks_output,
            token_usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewcraft_error::ErrorKind;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, JsonSchema)]
    struct Venue {
        name: String,
        capacity: u32,
    }

    #[test]
    fn test_extract_json_fenced() {
        let content = "Here you go:\n```json\n{\"name\": \"x\"}\n```\nEnjoy";
        assert_eq!(extract_json(content), "{\"name\": \"x\"}");
    }

    #[test]
    fn test_extract_json_with_chatter() {
        let content = "Final Answer: {\"name\": \"x\", \"capacity\": 8} hope this helps";
        assert_eq!(extract_json(content), "{\"name\": \"x\", \"capacity\": 8}");
    }

    #[test]
    fn test_bare_json_with_fences_in_strings() {
        #[derive(Debug, Serialize, Deserialize, JsonSchema)]
        struct Note {
            text: String,
        }

        let answer = r#"{"text": "use ```sorted``` builtin"}"#;
        assert_eq!(extract_json(answer), answer);
        let value = OutputSchema::of::<Note>().parse(answer).unwrap();
        assert_eq!(value["text"], "use ```sorted``` builtin");
    }

    #[test]
    fn test_extract_json_plain_text() {
        assert_eq!(extract_json("  no json here "), "no json here");
    }

    #[test]
    fn test_schema_accepts_matching_answer() {
        let schema = OutputSchema::of::<Venue>();
        assert_eq!(schema.name(), "Venue");
        assert!(schema.json_schema()["properties"]["capacity"].is_object());

        let value = schema.parse("```json\n{\"name\": \"Aloha House\", \"capacity\": 8}\n```").unwrap();
        assert_eq!(value["capacity"], 8);
    }

    #[test]
    fn test_schema_rejects_wrong_types() {
        let schema = OutputSchema::of::<Venue>();
        let err = schema.parse(r#"{"name": "Aloha House", "capacity": "eight"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        assert_eq!(err.context()[0], ("schema", "Venue".to_string()));
    }

    #[test]
    fn test_schema_rejects_non_json() {
        let err = OutputSchema::of::<Venue>().parse("I could not find a venue").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        assert!(err.message().contains("not JSON"));
    }

    #[test]
    fn test_crew_output_takes_last_task() {
        let tasks = vec![
            TaskOutput { description: "a".into(), agent: "A".into(), raw: "first".into(), json: None },
            TaskOutput {
                description: "b".into(),
                agent: "B".into(),
                raw: "{}".into(),
                json: Some(serde_json::json!({})),
            },
        ];
        let out = CrewOutput::from_tasks(tasks, UsageTracker::new());
        assert_eq!(out.raw, "{}");
        assert!(out.json.is_some());
        assert_eq!(out.tasks_output.len(), 2);
    }
}
