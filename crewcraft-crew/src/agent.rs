//! Agent implementation - one role played against the model

use crate::delegation::{self, CoworkerAction, CoworkerRequest};
use crate::template::{interpolate, Inputs};
use crate::tools::ToolRef;
use crewcraft_error::{Error, Result};
use crewcraft_llm::{ChatMessage, CompletionRequest, LlmProvider, ProviderError, UsageTracker};

/// Tool-call rounds an agent gets before it must give a final answer
pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// A named role with a goal and backstory.
///
/// Goal and backstory may contain `{placeholders}`, filled at kickoff.
#[derive(Clone)]
pub struct Agent {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub tools: Vec<ToolRef>,
    /// May hand work to, or question, the other agents of its crew
    pub allow_delegation: bool,
    pub verbose: bool,
    pub max_iterations: usize,
    /// Sampling temperature; the provider's default when unset
    pub temperature: Option<f32>,
}

impl Agent {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            tools: Vec::new(),
            allow_delegation: false,
            verbose: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            temperature: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolRef>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub(crate) fn interpolated(&self, inputs: &Inputs) -> Result<Self> {
        Ok(Self {
            goal: interpolate(&self.goal, inputs)?,
            backstory: interpolate(&self.backstory, inputs)?,
            ..self.clone()
        })
    }

    pub(crate) fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        )
    }

    /// Run one task prompt to a final answer.
    ///
    /// Tool calls are executed and fed back until the model answers in text.
    /// A failing tool is reported to the model as its result rather than
    /// aborting the task. When delegation is allowed, the other agents of
    /// `crew` are reachable through the coworker tools; a coworker answers
    /// without delegating further.
    pub(crate) async fn execute<P: LlmProvider>(
        &self,
        provider: &P,
        prompt: String,
        json_mode: bool,
        crew: &[Agent],
        usage: &mut UsageTracker,
    ) -> Result<String> {
        if self.verbose {
            tracing::info!(role = %self.role, "agent working on task");
        }
        tracing::debug!(role = %self.role, %prompt, "agent prompt");

        let mut messages = vec![ChatMessage::system(self.system_prompt()), ChatMessage::user(prompt)];
        let coworkers: Vec<&Agent> = match self.allow_delegation {
            true => crew.iter().filter(|a| a.role != self.role).collect(),
            false => Vec::new(),
        };
        let mut definitions: Vec<_> = self.tools.iter().map(|t| t.definition()).collect();
        if !coworkers.is_empty() {
            definitions.extend(delegation::definitions(&coworkers));
        }

        for iteration in 0..self.max_iterations {
            let mut request = CompletionRequest::new(messages.clone()).with_json_mode(json_mode);
            if let Some(temperature) = self.temperature {
                request = request.with_temperature(temperature);
            }
            if !definitions.is_empty() {
                request = request.with_tools(definitions.clone());
            }

            let response = provider.complete(request).await.map_err(|e| {
                Error::from(e)
                    .with_operation("agent::execute")
                    .with_context("role", self.role.clone())
            })?;
            usage.track(&response.model, &response.usage);

            if !response.wants_tools() {
                let answer = response.content.filter(|c| !c.trim().is_empty()).ok_or_else(|| {
                    Error::from(ProviderError::EmptyResponse)
                        .with_operation("agent::execute")
                        .with_context("role", self.role.clone())
                })?;
                if self.verbose {
                    tracing::info!(role = %self.role, chars = answer.len(), "agent final answer");
                }
                return Ok(answer);
            }

            tracing::debug!(role = %self.role, iteration, calls = response.tool_calls.len(), "tool calls requested");
            messages.push(ChatMessage::assistant_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                let action = CoworkerAction::from_tool(&call.name).filter(|_| !coworkers.is_empty());
                let result = match action {
                    Some(action) => {
                        self.ask_coworker(provider, action, &call.arguments, &coworkers, usage)
                            .await?
                    }
                    None => self.run_tool(&call.name, &call.arguments).await,
                };
                messages.push(ChatMessage::tool_result(&call.id, result));
            }
        }

        Err(Error::iteration_limit(&self.role, self.max_iterations).with_operation("agent::execute"))
    }

    /// Run a coworker on the delegated task or question; its answer is the tool result
    async fn ask_coworker<P: LlmProvider>(
        &self,
        provider: &P,
        action: CoworkerAction,
        arguments: &str,
        coworkers: &[&Agent],
        usage: &mut UsageTracker,
    ) -> Result<String> {
        let request: CoworkerRequest = match serde_json::from_str(arguments) {
            Ok(request) => request,
            Err(e) => return Ok(format!("Error: arguments are not valid JSON: {}", e)),
        };

        let wanted = request.coworker.trim();
        let Some(coworker) = coworkers.iter().find(|a| a.role.eq_ignore_ascii_case(wanted)) else {
            tracing::warn!(role = %self.role, coworker = wanted, "asked for an unknown coworker");
            let roles: Vec<&str> = coworkers.iter().map(|a| a.role.as_str()).collect();
            return Ok(format!(
                "Error: there is no coworker called '{}'. Coworkers: {}",
                wanted,
                roles.join(", ")
            ));
        };

        tracing::info!(from = %self.role, to = %coworker.role, ?action, "asking coworker");
        Box::pin(coworker.execute(provider, request.prompt(action), false, &[], usage))
            .await
            .map_err(|e| e.with_context("coworker", coworker.role.clone()))
    }

    async fn run_tool(&self, name: &str, arguments: &str) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            tracing::warn!(role = %self.role, tool = name, "model called an unknown tool");
            return format!(
                "Error: tool '{}' does not exist. Available tools: {}",
                name,
                self.tool_names().join(", ")
            );
        };

        let args = match serde_json::from_str(arguments) {
            Ok(args) => args,
            Err(e) => return format!("Error: arguments are not valid JSON: {}", e),
        };

        match tool.call(args).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(role = %self.role, tool = name, error = %e, "tool failed");
                format!("Error: {}", e.message())
            }
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("role", &self.role)
            .field("goal", &self.goal)
            .field("tools", &self.tool_names())
            .field("allow_delegation", &self.allow_delegation)
            .finish()
    }
}
