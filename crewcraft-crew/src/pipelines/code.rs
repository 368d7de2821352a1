//! Requirements, plan, code, review: a sequential code-writing crew

use crate::{Agent, Crew, CrewBuilder, Inputs, Process, Result, Task};
use serde_json::Value;

pub const DEFAULT_TOPIC: &str = "Implement the fastest sort algorithm in Python for large data sets";

pub const COLLECTOR: &str = "Requirements Collector";
pub const PLANNER: &str = "Code Planner";
pub const WRITER: &str = "Code Writer";
pub const REVIEWER: &str = "Code Reviewer";

pub fn agents() -> Vec<Agent> {
    vec![
        Agent::new(
            COLLECTOR,
            "Gather all necessary details for the coding task on {topic}",
            "You are responsible for collecting detailed requirements from the user, \
             including functionality, input/output format, and any specific considerations.",
        ),
        Agent::new(
            PLANNER,
            "Plan the structure and components of the code for {topic}",
            "You use the requirements collected to plan the architecture of the solution, \
             including selecting algorithms, data structures, and design patterns.",
        ),
        Agent::new(
            WRITER,
            "Write clean and efficient code for {topic} in the specified language",
            "You write the code based on the plan provided by the Code Planner. \
             You ensure the code is readable and meets the requirements.",
        ),
        Agent::new(
            REVIEWER,
            "Review the code to ensure it meets best practices and optimize it",
            "You review the code written by the Code Writer. You check for best practices, \
             potential bugs, and optimize the code for performance.",
        ),
    ]
    .into_iter()
    .map(|a| a.with_delegation(false).with_verbose(true))
    .collect()
}

pub fn tasks() -> Vec<Task> {
    vec![
        Task::new(
            "Gather detailed information about what the program needs to do and any specific requirements.",
            "A detailed set of requirements including functional and non-functional aspects.",
            COLLECTOR,
        ),
        Task::new(
            "Create a detailed plan for the code structure, including which algorithms and data structures to use.",
            "A structured code plan, including pseudo-code or flowcharts.",
            PLANNER,
        ),
        Task::new(
            "Write the actual code in the specified programming language based on the provided plan.",
            "Well-documented and functioning code that fulfills the outlined requirements.",
            WRITER,
        ),
        Task::new(
            "Review the code for adherence to coding standards and optimize it for performance and readability.",
            "Reviewed and optimized code, possibly with comments on improvements.",
            REVIEWER,
        ),
    ]
}

pub fn builder() -> CrewBuilder {
    Crew::builder()
        .agents(agents())
        .tasks(tasks())
        .process(Process::Sequential)
        .verbose(true)
}

pub fn crew() -> Result<Crew> {
    builder().build()
}

pub fn inputs(topic: &str) -> Inputs {
    let mut inputs = Inputs::new();
    inputs.insert("topic".into(), Value::String(topic.to_string()));
    inputs
}
