//! Task declarations

use crate::output::OutputSchema;
use crate::template::{interpolate, Inputs};
use crewcraft_error::Result;
use std::path::PathBuf;

/// A unit of work assigned to one agent, referenced by role
#[derive(Debug, Clone)]
pub struct Task {
    pub description: String,
    pub expected_output: String,
    /// Role of the agent that executes the task
    pub agent: String,
    pub output_schema: Option<OutputSchema>,
    /// Written relative to the crew's output directory
    pub output_file: Option<PathBuf>,
    /// Show the result to a human reviewer before accepting it
    pub human_input: bool,
    /// Indices of earlier tasks whose output this task sees; `None` means all of them
    pub context: Option<Vec<usize>>,
}

impl Task {
    pub fn new(
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            agent: agent.into(),
            output_schema: None,
            output_file: None,
            human_input: false,
            context: None,
        }
    }

    pub fn with_output_schema(mut self, schema: OutputSchema) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    pub fn with_human_input(mut self, human_input: bool) -> Self {
        self.human_input = human_input;
        self
    }

    pub fn with_context(mut self, tasks: Vec<usize>) -> Self {
        self.context = Some(tasks);
        self
    }

    pub(crate) fn interpolated(&self, inputs: &Inputs) -> Result<Self> {
        Ok(Self {
            description: interpolate(&self.description, inputs)?,
            expected_output: interpolate(&self.expected_output, inputs)?,
            ..self.clone()
        })
    }

    /// The user turn an agent receives for this task
    pub(crate) fn prompt(&self, context: &str, extra: Option<&str>) -> String {
        let mut prompt = format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
             You MUST return the actual complete content as the final answer, not a summary.",
            self.description, self.expected_output
        );

        if let Some(schema) = &self.output_schema {
            let schema_text =
                serde_json::to_string_pretty(schema.json_schema()).unwrap_or_default();
            prompt.push_str(&format!(
                "\n\nYour final answer MUST be a single JSON object matching this JSON schema \
                 (no prose, no markdown):\n{}",
                schema_text
            ));
        }

        if let Some(extra) = extra {
            prompt.push_str("\n\n");
            prompt.push_str(extra);
        }

        if !context.is_empty() {
            prompt.push_str("\n\nThis is the context you're working with:\n");
            prompt.push_str(context);
        }

        prompt
    }
}
