//! # crewcraft crew
//!
//! Role-playing agents, the tasks they are given, and the crew that runs
//! them against a chat-completion model:
//! 1. Agents and tasks are declared as plain records with `{placeholder}` templates
//! 2. A crew validates that every task names a registered agent
//! 3. `kickoff` fills the templates from the run inputs
//! 4. Tasks run in order (sequential) or through a manager model (hierarchical)
//! 5. Schema-tagged outputs are validated and written to their output files
//!
//! The model does the thinking; the crew only carries records to it.

mod agent;
mod crew;
mod delegation;
mod markdown;
mod output;
mod review;
mod task;
mod template;

pub mod config;
pub mod pipelines;
pub mod sink;
pub mod tools;

#[cfg(test)]
mod testing;

pub use agent::Agent;
pub use crew::{Crew, CrewBuilder, ManagerConfig, Process};
pub use output::{extract_json, CrewOutput, OutputSchema, TaskOutput};
pub use review::{HumanReview, StdinReview};
pub use task::Task;
pub use template::{interpolate, Inputs};

pub use crewcraft_error::{Error, ErrorKind, Result};
