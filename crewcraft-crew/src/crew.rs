//! Crew assembly and execution

use crate::agent::Agent;
use crate::output::{extract_json, CrewOutput, TaskOutput};
use crate::review::HumanReview;
use crate::sink;
use crate::task::Task;
use crate::template::Inputs;
use crewcraft_error::{Error, ErrorKind, Result};
use crewcraft_llm::{ChatMessage, CompletionRequest, LlmProvider, UsageTracker};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Separator between earlier task outputs in a task's context
const CONTEXT_SEPARATOR: &str = "\n\n----------\n\n";

/// Model settings for the hierarchical manager
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    pub model: String,
    pub temperature: f32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            model: crewcraft_llm::provider::DEFAULT_MODEL.to_string(),
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Process {
    /// Each task goes to its own agent, in order
    Sequential,
    /// A manager model picks the coworker for each task
    Hierarchical { manager: ManagerConfig },
}

/// The manager's answer for one task
#[derive(Debug, Deserialize)]
struct Delegation {
    coworker: String,
    #[serde(default)]
    instructions: String,
}

/// A validated set of agents and tasks, executed once per kickoff
pub struct Crew {
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    process: Process,
    output_dir: PathBuf,
    reviewer: Option<Arc<dyn HumanReview>>,
    verbose: bool,
}

#[derive(Default)]
pub struct CrewBuilder {
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    process: Option<Process>,
    output_dir: Option<PathBuf>,
    reviewer: Option<Arc<dyn HumanReview>>,
    verbose: bool,
    temperature: Option<f32>,
}

impl CrewBuilder {
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn agents(mut self, agents: impl IntoIterator<Item = Agent>) -> Self {
        self.agents.extend(agents);
        self
    }

    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn tasks(mut self, tasks: impl IntoIterator<Item = Task>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    pub fn process(mut self, process: Process) -> Self {
        self.process = Some(process);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn reviewer(mut self, reviewer: Arc<dyn HumanReview>) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Sampling temperature for every agent that does not set its own
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Check the declarations and freeze them into a crew
    pub fn build(self) -> Result<Crew> {
        if self.agents.is_empty() {
            return Err(Error::config_invalid("a crew needs at least one agent").with_operation("crew::build"));
        }
        if self.tasks.is_empty() {
            return Err(Error::config_invalid("a crew needs at least one task").with_operation("crew::build"));
        }

        for (i, agent) in self.agents.iter().enumerate() {
            if self.agents[..i].iter().any(|a| a.role == agent.role) {
                return Err(Error::config_invalid(format!("duplicate agent role '{}'", agent.role))
                    .with_operation("crew::build")
                    .with_context("role", agent.role.clone()));
            }
        }

        for (i, task) in self.tasks.iter().enumerate() {
            if !self.agents.iter().any(|a| a.role == task.agent) {
                return Err(Error::agent_not_found(&task.agent)
                    .with_operation("crew::build")
                    .with_context("task", i.to_string()));
            }
            if let Some(context) = &task.context {
                if let Some(bad) = context.iter().find(|&&c| c >= i) {
                    return Err(Error::config_invalid(format!(
                        "task {} can only use earlier tasks as context, not task {}",
                        i, bad
                    ))
                    .with_operation("crew::build")
                    .with_context("task", i.to_string()));
                }
            }
        }

        let mut agents = self.agents;
        if let Some(temperature) = self.temperature {
            for agent in agents.iter_mut().filter(|a| a.temperature.is_none()) {
                agent.temperature = Some(temperature);
            }
        }

        Ok(Crew {
            agents,
            tasks: self.tasks,
            process: self.process.unwrap_or(Process::Sequential),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from(".")),
            reviewer: self.reviewer,
            verbose: self.verbose,
        })
    }
}

impl Crew {
    pub fn builder() -> CrewBuilder {
        CrewBuilder::default()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn process(&self) -> &Process {
        &self.process
    }

    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    /// Run every task once, in declaration order
    pub async fn kickoff<P: LlmProvider>(&self, provider: &P, inputs: &Inputs) -> Result<CrewOutput> {
        let agents = self
            .agents
            .iter()
            .map(|a| {
                let verbose = a.verbose || self.verbose;
                a.interpolated(inputs).map(|a| a.with_verbose(verbose))
            })
            .collect::<Result<Vec<_>>>()?;
        let tasks = self
            .tasks
            .iter()
            .map(|t| t.interpolated(inputs))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            agents = agents.len(),
            tasks = tasks.len(),
            process = ?self.process,
            "crew kickoff"
        );

        let mut usage = UsageTracker::new();
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(tasks.len());

        for (index, task) in tasks.iter().enumerate() {
            tracing::info!(task = index, agent = %task.agent, "task started");
            let context = task_context(task, &outputs);

            let (agent, instructions) = match &self.process {
                Process::Sequential => (self.agent_for(&agents, &task.agent)?, None),
                Process::Hierarchical { manager } => {
                    let delegation = self
                        .delegate(provider, manager, &agents, task, &context, &mut usage)
                        .await?;
                    let agent = match self.find_agent(&agents, &delegation.coworker) {
                        Some(agent) => agent,
                        None => {
                            tracing::warn!(
                                coworker = %delegation.coworker,
                                fallback = %task.agent,
                                "manager picked an unknown coworker"
                            );
                            self.agent_for(&agents, &task.agent)?
                        }
                    };
                    let instructions = (!delegation.instructions.trim().is_empty())
                        .then(|| format!("Instructions from your manager: {}", delegation.instructions));
                    (agent, instructions)
                }
            };

            let output = self
                .run_task(provider, agent, &agents, task, &context, instructions.as_deref(), &mut usage)
                .await
                .map_err(|e| e.with_context("task", index.to_string()))?;

            if let Some(file) = &task.output_file {
                let path = self.output_dir.join(file);
                sink::write_output(&path, &output.to_file_contents()?)?;
                tracing::info!(task = index, path = %path.display(), "task output written");
            }

            tracing::info!(task = index, agent = %output.agent, "task completed");
            outputs.push(output);
        }

        tracing::info!(
            calls = usage.total_calls,
            tokens = usage.total_tokens(),
            "crew finished"
        );
        Ok(CrewOutput::from_tasks(outputs, usage))
    }

    /// One agent turn plus any human-review rounds
    async fn run_task<P: LlmProvider>(
        &self,
        provider: &P,
        agent: &Agent,
        crew: &[Agent],
        task: &Task,
        context: &str,
        instructions: Option<&str>,
        usage: &mut UsageTracker,
    ) -> Result<TaskOutput> {
        let json_mode = task.output_schema.is_some();
        let prompt = task.prompt(context, instructions);
        let mut raw = agent.execute(provider, prompt.clone(), json_mode, crew, usage).await?;
        let mut json = self.validate(task, &raw)?;

        if let (true, Some(reviewer)) = (task.human_input, &self.reviewer) {
            while let Some(feedback) = reviewer
                .review(&task.description, &raw)?
                .filter(|f| !f.trim().is_empty())
            {
                tracing::info!(agent = %agent.role, "revising after human feedback");
                let revision = format!(
                    "{}\n\nYour previous answer was:\n{}\n\nA human reviewed it and gave this feedback:\n{}\n\
                     Give your revised final answer.",
                    prompt, raw, feedback
                );
                raw = agent.execute(provider, revision, json_mode, crew, usage).await?;
                json = self.validate(task, &raw)?;
            }
        }

        Ok(TaskOutput {
            description: task.description.clone(),
            agent: agent.role.clone(),
            raw,
            json,
        })
    }

    fn validate(&self, task: &Task, raw: &str) -> Result<Option<serde_json::Value>> {
        task.output_schema
            .as_ref()
            .map(|schema| schema.parse(raw))
            .transpose()
    }

    /// Ask the manager which coworker should take the task
    async fn delegate<P: LlmProvider>(
        &self,
        provider: &P,
        manager: &ManagerConfig,
        agents: &[Agent],
        task: &Task,
        context: &str,
        usage: &mut UsageTracker,
    ) -> Result<Delegation> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(manager_system_prompt()),
            ChatMessage::user(delegation_prompt(agents, task, context)),
        ])
        .with_model(&manager.model)
        .with_temperature(manager.temperature)
        .with_json_mode(true);

        let response = provider
            .complete(request)
            .await
            .map_err(|e| Error::from(e).with_operation("crew::delegate"))?;
        usage.track(&response.model, &response.usage);

        let content = response.content.unwrap_or_default();
        let delegation: Delegation = serde_json::from_str(extract_json(&content)).map_err(|e| {
            Error::new(ErrorKind::DelegationFailed, format!("manager answer is not a delegation: {}", e))
                .with_operation("crew::delegate")
                .with_context("answer", content.clone())
                .set_source(e)
        })?;

        tracing::debug!(coworker = %delegation.coworker, "manager delegated task");
        Ok(delegation)
    }

    fn find_agent<'a>(&self, agents: &'a [Agent], role: &str) -> Option<&'a Agent> {
        let role = role.trim();
        agents.iter().find(|a| a.role.eq_ignore_ascii_case(role))
    }

    fn agent_for<'a>(&self, agents: &'a [Agent], role: &str) -> Result<&'a Agent> {
        self.find_agent(agents, role)
            .ok_or_else(|| Error::agent_not_found(role).with_operation("crew::kickoff"))
    }
}

fn task_context(task: &Task, outputs: &[TaskOutput]) -> String {
    let selected: Vec<&str> = match &task.context {
        None => outputs.iter().map(|o| o.raw.as_str()).collect(),
        Some(indices) => indices
            .iter()
            .filter_map(|&i| outputs.get(i))
            .map(|o| o.raw.as_str())
            .collect(),
    };
    selected.join(CONTEXT_SEPARATOR)
}

fn manager_system_prompt() -> &'static str {
    "You are Crew Manager. You are a seasoned manager with a knack for getting the best out of \
     your team. You are also known for your ability to delegate work to the right people, and to \
     ask the right questions to get the best out of your team.\n\
     Your personal goal is: Manage the team to complete the task in the best way possible."
}

fn delegation_prompt(agents: &[Agent], task: &Task, context: &str) -> String {
    let coworkers: Vec<String> = agents
        .iter()
        .map(|a| format!("- {}: {}", a.role, a.goal))
        .collect();

    let mut prompt = format!(
        "Current Task: {}\n\nExpected output: {}\n\nYour coworkers are:\n{}\n\n\
         Pick the single coworker best suited to this task and tell them exactly what to do, \
         including every piece of context they need; they know nothing about the task otherwise.\n\
         Respond with a JSON object: {{\"coworker\": \"<exact role>\", \"instructions\": \"<what to do>\"}}",
        task.description,
        task.expected_output,
        coworkers.join("\n")
    );
    if !context.is_empty() {
        prompt.push_str("\n\nThis is the context you're working with:\n");
        prompt.push_str(context);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputSchema;
    use crate::testing::{ScriptedProvider, ScriptedReview};
    use schemars::JsonSchema;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Serialize, Deserialize, JsonSchema)]
    struct Estimate {
        total: i64,
    }

    fn agents() -> Vec<Agent> {
        vec![
            Agent::new("Planner", "Plan {topic}", "You plan."),
            Agent::new("Writer", "Write {topic}", "You write."),
        ]
    }

    fn inputs() -> Inputs {
        json!({ "topic": "a sorter" }).as_object().cloned().unwrap()
    }

    #[test]
    fn test_build_rejects_unknown_agent() {
        let err = Crew::builder()
            .agents(agents())
            .task(Task::new("Review", "A review", "Reviewer"))
            .build()
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::AgentNotFound);
        assert!(err.context().iter().any(|(k, v)| *k == "task" && v == "0"));
    }

    #[test]
    fn test_build_rejects_duplicate_roles() {
        let err = Crew::builder()
            .agents(agents())
            .agent(Agent::new("Planner", "again", "dup"))
            .task(Task::new("Plan", "A plan", "Planner"))
            .build()
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_build_rejects_empty_and_forward_context() {
        assert!(Crew::builder().agents(agents()).build().is_err());
        assert!(Crew::builder().task(Task::new("a", "b", "Planner")).build().is_err());

        let err = Crew::builder()
            .agents(agents())
            .task(Task::new("Plan", "A plan", "Planner").with_context(vec![0]))
            .build()
            .err()
            .unwrap();
        assert!(err.message().contains("earlier tasks"));
    }

    #[test]
    fn test_build_defaults() {
        let crew = Crew::builder()
            .agents(agents())
            .task(Task::new("Plan", "A plan", "Planner"))
            .build()
            .unwrap();
        assert_eq!(crew.process(), &Process::Sequential);
        assert_eq!(crew.output_dir(), std::path::Path::new("."));
    }

    #[tokio::test]
    async fn test_sequential_order_and_context() {
        let crew = Crew::builder()
            .agents(agents())
            .task(Task::new("Plan {topic}", "A plan", "Planner"))
            .task(Task::new("Write {topic}", "Code", "Writer"))
            .build()
            .unwrap();
        let provider = ScriptedProvider::texts(&["the plan", "the code"]);

        let output = crew.kickoff(&provider, &inputs()).await.unwrap();

        assert_eq!(output.raw, "the code");
        assert_eq!(output.tasks_output.len(), 2);
        assert_eq!(output.tasks_output[0].agent, "Planner");
        assert_eq!(output.tasks_output[1].agent, "Writer");
        assert_eq!(output.tasks_output[0].description, "Plan a sorter");
        assert_eq!(output.token_usage.total_calls, 2);

        assert!(!provider.user_prompt(0).contains("context you're working with"));
        assert!(provider.user_prompt(1).ends_with("context you're working with:\nthe plan"));
        let system = provider.requests()[1].messages[0].content.clone().unwrap();
        assert!(system.contains("Your personal goal is: Write a sorter"));
    }

    #[tokio::test]
    async fn test_explicit_context_selection() {
        let crew = Crew::builder()
            .agents(agents())
            .task(Task::new("Plan", "A plan", "Planner"))
            .task(Task::new("Draft", "Draft", "Writer"))
            .task(Task::new("Final", "Final", "Writer").with_context(vec![0]))
            .build()
            .unwrap();
        let provider = ScriptedProvider::texts(&["plan", "draft", "final"]);

        crew.kickoff(&provider, &inputs()).await.unwrap();
        assert!(provider.user_prompt(2).ends_with("working with:\nplan"));
        assert!(provider.user_prompt(1).ends_with("working with:\nplan"));
    }

    #[tokio::test]
    async fn test_missing_input_fails_before_any_call() {
        let crew = Crew::builder()
            .agents(agents())
            .task(Task::new("Plan", "A plan", "Planner"))
            .build()
            .unwrap();
        let provider = ScriptedProvider::texts(&["unused"]);

        let err = crew.kickoff(&provider, &Inputs::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TemplateVariableMissing);
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_schema_task_writes_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let crew = Crew::builder()
            .agents(agents())
            .task(
                Task::new("Estimate", "A total", "Planner")
                    .with_output_schema(OutputSchema::of::<Estimate>())
                    .with_output_file("estimate.json"),
            )
            .output_dir(dir.path())
            .build()
            .unwrap();
        let provider = ScriptedProvider::texts(&["```json\n{\"total\": 9800}\n```"]);

        let output = crew.kickoff(&provider, &inputs()).await.unwrap();
        assert_eq!(output.json, Some(json!({ "total": 9800 })));
        assert!(provider.requests()[0].json_mode);

        let written = std::fs::read_to_string(dir.path().join("estimate.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["total"], 9800);
    }

    #[tokio::test]
    async fn test_schema_mismatch_aborts_run() {
        let crew = Crew::builder()
            .agents(agents())
            .task(Task::new("Estimate", "A total", "Planner").with_output_schema(OutputSchema::of::<Estimate>()))
            .task(Task::new("Write", "Code", "Writer"))
            .build()
            .unwrap();
        let provider = ScriptedProvider::texts(&["{\"total\": \"lots\"}", "never"]);

        let err = crew.kickoff(&provider, &inputs()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_hierarchical_delegation() {
        let crew = Crew::builder()
            .agents(agents())
            .task(Task::new("Write {topic}", "Code", "Planner"))
            .process(Process::Hierarchical { manager: ManagerConfig::default() })
            .build()
            .unwrap();
        let provider = ScriptedProvider::texts(&[
            r#"{"coworker": "writer", "instructions": "Use quicksort"}"#,
            "fn sort() {}",
        ]);

        let output = crew.kickoff(&provider, &inputs()).await.unwrap();
        assert_eq!(output.tasks_output[0].agent, "Writer");

        let sent = provider.requests();
        assert_eq!(sent[0].model.as_deref(), Some("gpt-3.5-turbo"));
        assert_eq!(sent[0].temperature, Some(0.7));
        assert!(provider.user_prompt(0).contains("- Planner: Plan a sorter"));
        assert!(provider.user_prompt(1).contains("Instructions from your manager: Use quicksort"));
        assert_eq!(output.token_usage.total_calls, 2);
    }

    #[tokio::test]
    async fn test_hierarchical_unknown_coworker_falls_back() {
        let crew = Crew::builder()
            .agents(agents())
            .task(Task::new("Plan", "A plan", "Planner"))
            .process(Process::Hierarchical { manager: ManagerConfig::default() })
            .build()
            .unwrap();
        let provider = ScriptedProvider::texts(&[r#"{"coworker": "Intern"}"#, "plan"]);

        let output = crew.kickoff(&provider, &inputs()).await.unwrap();
        assert_eq!(output.tasks_output[0].agent, "Planner");
        assert!(!provider.user_prompt(1).contains("Instructions from your manager"));
    }

    #[tokio::test]
    async fn test_hierarchical_bad_delegation() {
        let crew = Crew::builder()
            .agents(agents())
            .task(Task::new("Plan", "A plan", "Planner"))
            .process(Process::Hierarchical { manager: ManagerConfig::default() })
            .build()
            .unwrap();
        let provider = ScriptedProvider::texts(&["I'll handle it myself"]);

        let err = crew.kickoff(&provider, &inputs()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DelegationFailed);
    }

    #[tokio::test]
    async fn test_human_feedback_triggers_revision() {
        let reviewer = Arc::new(ScriptedReview::new(&["make it faster"]));
        let crew = Crew::builder()
            .agents(agents())
            .task(Task::new("Write", "Code", "Writer").with_human_input(true))
            .reviewer(reviewer.clone())
            .build()
            .unwrap();
        let provider = ScriptedProvider::texts(&["slow code", "fast code"]);

        let output = crew.kickoff(&provider, &inputs()).await.unwrap();
        assert_eq!(output.raw, "fast code");
        assert_eq!(*reviewer.seen.lock().unwrap(), vec!["slow code", "fast code"]);
        let revision = provider.user_prompt(1);
        assert!(revision.contains("Your previous answer was:\nslow code"));
        assert!(revision.contains("make it faster"));
    }

    #[tokio::test]
    async fn test_human_input_without_reviewer_is_skipped() {
        let crew = Crew::builder()
            .agents(agents())
            .task(Task::new("Write", "Code", "Writer").with_human_input(true))
            .build()
            .unwrap();
        let provider = ScriptedProvider::texts(&["code"]);
        assert_eq!(crew.kickoff(&provider, &inputs()).await.unwrap().raw, "code");
    }

    #[tokio::test]
    async fn test_crew_temperature_fills_unset_agents() {
        let mut writer = Agent::new("Writer", "Write {topic}", "You write.");
        writer.temperature = Some(0.1);
        let crew = Crew::builder()
            .agent(Agent::new("Planner", "Plan {topic}", "You plan."))
            .agent(writer)
            .task(Task::new("Plan", "A plan", "Planner"))
            .task(Task::new("Write", "Code", "Writer"))
            .temperature(0.4)
            .build()
            .unwrap();
        let provider = ScriptedProvider::texts(&["plan", "code"]);

        crew.kickoff(&provider, &inputs()).await.unwrap();
        let sent = provider.requests();
        assert_eq!(sent[0].temperature, Some(0.4));
        assert_eq!(sent[1].temperature, Some(0.1));
    }

    #[tokio::test]
    async fn test_delegating_agent_reaches_crew_members() {
        use crewcraft_llm::{CompletionResponse, ToolCall};

        let mut delegate = CompletionResponse::text("gpt-3.5-turbo", "");
        delegate.content = None;
        delegate.tool_calls = vec![ToolCall {
            id: "call_1".into(),
            name: "ask_question_to_coworker".into(),
            arguments: r#"{"coworker": "Writer", "task": "Which language?", "context": "a sorter"}"#.into(),
        }];
        let crew = Crew::builder()
            .agent(Agent::new("Planner", "Plan {topic}", "You plan.").with_delegation(true))
            .agent(Agent::new("Writer", "Write {topic}", "You write."))
            .task(Task::new("Plan", "A plan", "Planner"))
            .build()
            .unwrap();
        let provider = ScriptedProvider::new(vec![
            delegate,
            CompletionResponse::text("gpt-3.5-turbo", "Python"),
            CompletionResponse::text("gpt-3.5-turbo", "Plan in Python"),
        ]);

        let output = crew.kickoff(&provider, &inputs()).await.unwrap();
        assert_eq!(output.raw, "Plan in Python");
        assert_eq!(output.token_usage.total_calls, 3);
        let coworker_system = provider.requests()[1].messages[0].content.clone().unwrap();
        assert!(coworker_system.contains("Your personal goal is: Write a sorter"));
    }
}
