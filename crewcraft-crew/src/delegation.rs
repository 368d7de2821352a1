//! Coworker tools for agents that may delegate

use crate::agent::Agent;
use crewcraft_llm::ToolDefinition;
use serde::Deserialize;
use serde_json::json;

pub(crate) const DELEGATE_WORK: &str = "delegate_work_to_coworker";
pub(crate) const ASK_QUESTION: &str = "ask_question_to_coworker";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CoworkerAction {
    Delegate,
    Ask,
}

impl CoworkerAction {
    pub(crate) fn from_tool(name: &str) -> Option<Self> {
        match name {
            DELEGATE_WORK => Some(Self::Delegate),
            ASK_QUESTION => Some(Self::Ask),
            _ => None,
        }
    }
}

/// Arguments of either coworker tool
#[derive(Debug, Deserialize)]
pub(crate) struct CoworkerRequest {
    pub coworker: String,
    /// The work to do, or the question to answer
    #[serde(alias = "question")]
    pub task: String,
    #[serde(default)]
    pub context: String,
}

impl CoworkerRequest {
    /// The prompt the coworker receives; it knows nothing beyond this
    pub(crate) fn prompt(&self, action: CoworkerAction) -> String {
        let mut prompt = match action {
            CoworkerAction::Delegate => format!("A coworker delegated this task to you:\n{}", self.task),
            CoworkerAction::Ask => format!("A coworker asks you this question:\n{}", self.task),
        };
        if !self.context.trim().is_empty() {
            prompt.push_str("\n\nThis is the context you're working with:\n");
            prompt.push_str(&self.context);
        }
        prompt
    }
}

pub(crate) fn definitions(coworkers: &[&Agent]) -> Vec<ToolDefinition> {
    let roles: Vec<&str> = coworkers.iter().map(|a| a.role.as_str()).collect();
    let parameters = |what: &str| {
        json!({
            "type": "object",
            "properties": {
                "coworker": { "type": "string", "enum": roles },
                "task": { "type": "string", "description": what },
                "context": {
                    "type": "string",
                    "description": "Everything the coworker needs to know; they see nothing else"
                }
            },
            "required": ["coworker", "task", "context"]
        })
    };

    vec![
        ToolDefinition::new(
            DELEGATE_WORK,
            format!("Delegate a specific task to one of these coworkers: {}", roles.join(", ")),
        )
        .with_parameters(parameters("The task to delegate")),
        ToolDefinition::new(
            ASK_QUESTION,
            format!("Ask a specific question to one of these coworkers: {}", roles.join(", ")),
        )
        .with_parameters(parameters("The question to ask")),
    ]
}
