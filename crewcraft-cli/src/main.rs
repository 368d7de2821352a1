//! # crewcraft CLI
//!
//! Command-line interface for the ready-made crews.
//!
//! Usage:
//!   crewcraft code [TOPIC]...
//!   crewcraft travel [--city <CITY>] [--budget <USD>] ...
//!   crewcraft check <FILE> --schema <rental|itinerary>
//!   crewcraft agents <code|travel>
//!
//! Examples:
//!   crewcraft code "Implement a trie in Rust"
//!   crewcraft travel --city Lisbon --group-size 2 --budget 3000 --no-human-input
//!   crewcraft check final_itinerary.json --schema itinerary

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use crewcraft_crew::config::Settings;
use crewcraft_crew::pipelines::{code, travel};
use crewcraft_crew::{sink, Crew, CrewBuilder, OutputSchema, StdinReview};
use crewcraft_error::{Error, ErrorKind, Result};
use crewcraft_llm::OpenAIProvider;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crewcraft")]
#[command(author, version, about = "crewcraft - role-playing agent crews")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Model for the agents (the manager stays on gpt-3.5-turbo)
    #[arg(long, global = true, env = "OPENAI_MODEL_NAME")]
    model: Option<String>,

    /// Sampling temperature for the agents, 0 to 2 (the manager stays at 0.7)
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Directory task output files are written to
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - warnings and the final result only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Requirements, plan, code and review for a programming topic
    Code {
        /// The coding topic
        #[arg(trailing_var_arg = true)]
        topic: Vec<String>,
    },
    /// Plan a trip: rental, daily itinerary, budget check
    Travel {
        #[arg(long, default_value = "Honolulu")]
        city: String,

        /// Who is travelling and what they want out of it
        #[arg(long)]
        details: Option<String>,

        #[arg(long, default_value = "2024-06-15")]
        start_date: NaiveDate,

        #[arg(long, default_value = "2024-06-22")]
        end_date: NaiveDate,

        #[arg(long, default_value_t = 7)]
        group_size: u32,

        /// Total budget in USD
        #[arg(long, default_value_t = 10_000)]
        budget: u64,

        /// Accept every task result without asking
        #[arg(long)]
        no_human_input: bool,
    },
    /// Validate a result file against one of the travel schemas
    Check {
        file: PathBuf,

        #[arg(long, value_enum)]
        schema: SchemaKind,
    },
    /// List a crew's agents and tasks
    Agents {
        #[arg(value_enum)]
        crew: CrewKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaKind {
    Rental,
    Itinerary,
}

impl SchemaKind {
    fn schema(self) -> OutputSchema {
        match self {
            SchemaKind::Rental => OutputSchema::of::<travel::RentalDetails>(),
            SchemaKind::Itinerary => OutputSchema::of::<travel::FullItinerary>(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CrewKind {
    Code,
    Travel,
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "crewcraft=debug"
    } else if quiet {
        "crewcraft=warn"
    } else {
        "crewcraft=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn provider(settings: &Settings) -> Result<OpenAIProvider> {
    OpenAIProvider::new(settings.provider_config()?)
}

/// Flags shared by the commands that run a crew
struct RunOptions {
    output_dir: PathBuf,
    quiet: bool,
    temperature: Option<f32>,
}

impl RunOptions {
    fn from_cli(cli: &Cli) -> Result<Self> {
        if let Some(t) = cli.temperature.filter(|t| !(0.0..=2.0).contains(t)) {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("temperature must be between 0 and 2, got {}", t),
            )
            .with_operation("cli::options"));
        }
        Ok(Self {
            output_dir: cli.output_dir.clone(),
            quiet: cli.quiet,
            temperature: cli.temperature,
        })
    }

    fn apply(&self, builder: CrewBuilder) -> CrewBuilder {
        let builder = builder.output_dir(&self.output_dir).verbose(!self.quiet);
        match self.temperature {
            Some(temperature) => builder.temperature(temperature),
            None => builder,
        }
    }
}

async fn run_code(settings: &Settings, options: &RunOptions, topic: &str) -> Result<()> {
    let provider = provider(settings)?;
    let crew = options.apply(code::builder()).build()?;

    let output = crew.kickoff(&provider, &code::inputs(topic)).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    sink::render_markdown(&mut out, &output.raw)?;
    tracing::info!(
        calls = output.token_usage.total_calls,
        tokens = output.token_usage.total_tokens(),
        "token usage"
    );
    Ok(())
}

async fn run_travel(
    settings: &Settings,
    options: &RunOptions,
    trip: travel::TripRequest,
    human_input: bool,
) -> Result<()> {
    trip.validate()?;
    let provider = provider(settings)?;

    let mut builder = options.apply(travel::builder(settings.serper_api_key.clone())?);
    if human_input {
        builder = builder.reviewer(Arc::new(StdinReview));
    }
    let crew = builder.build()?;

    crew.kickoff(&provider, &trip.to_inputs()).await?;

    let final_itinerary = sink::load_json(&options.output_dir.join(travel::FINAL_ITINERARY_FILE))?;
    let stdout = std::io::stdout();
    sink::print_json(&mut stdout.lock(), &final_itinerary)
}

fn check(file: &Path, schema: SchemaKind) -> Result<()> {
    let schema = schema.schema();
    sink::check_file(file, &schema)?;
    println!("{}: valid {}", file.display(), schema.name());
    Ok(())
}

fn list_agents(crew: &Crew) {
    println!("Process: {:?}\n", crew.process());
    println!("Agents:");
    for agent in crew.agents() {
        println!("  {}", agent.role);
        println!("    goal: {}", agent.goal);
        let tools = agent.tool_names();
        if !tools.is_empty() {
            println!("    tools: {}", tools.join(", "));
        }
    }
    println!("\nTasks:");
    for (i, task) in crew.tasks().iter().enumerate() {
        println!("  {}. [{}] {}", i + 1, task.agent, task.description);
        if let Some(file) = &task.output_file {
            println!("     -> {}", file.display());
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let options = RunOptions::from_cli(&cli)?;
    let mut settings = Settings::from_env();
    if let Some(model) = cli.model {
        settings = settings.with_model(model);
    }

    match cli.command {
        Commands::Code { topic } => {
            let topic = if topic.is_empty() {
                code::DEFAULT_TOPIC.to_string()
            } else {
                topic.join(" ")
            };
            run_code(&settings, &options, &topic).await
        }
        Commands::Travel {
            city,
            details,
            start_date,
            end_date,
            group_size,
            budget,
            no_human_input,
        } => {
            let defaults = travel::TripRequest::default();
            let trip = travel::TripRequest {
                vacation_city: city,
                vacation_details: details.unwrap_or(defaults.vacation_details),
                start_date,
                end_date,
                group_size,
                budget,
            };
            run_travel(&settings, &options, trip, !no_human_input).await
        }
        Commands::Check { file, schema } => check(&file, schema),
        Commands::Agents { crew } => {
            let crew = match crew {
                CrewKind::Code => code::crew()?,
                CrewKind::Travel => travel::crew(settings.serper_api_key)?,
            };
            list_agents(&crew);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_travel_defaults() {
        let cli = Cli::try_parse_from(["crewcraft", "travel", "--no-human-input"]).unwrap();
        match cli.command {
            Commands::Travel {
                city,
                start_date,
                group_size,
                budget,
                no_human_input,
                ..
            } => {
                assert_eq!(city, "Honolulu");
                assert_eq!(start_date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
                assert_eq!(group_size, 7);
                assert_eq!(budget, 10_000);
                assert!(no_human_input);
            }
            _ => panic!("expected travel"),
        }
    }

    #[test]
    fn test_code_topic_words() {
        let cli = Cli::try_parse_from(["crewcraft", "-q", "code", "Implement", "a", "trie"]).unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Code { topic } => assert_eq!(topic.join(" "), "Implement a trie"),
            _ => panic!("expected code"),
        }
    }

    #[test]
    fn test_rejects_bad_date() {
        assert!(Cli::try_parse_from(["crewcraft", "travel", "--start-date", "June"]).is_err());
    }

    #[test]
    fn test_check_command() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("venue.json");
        std::fs::write(&file, r#"{"name": "x"}"#).unwrap();
        assert!(check(&file, SchemaKind::Rental).is_err());
        assert!(check(&dir.path().join("missing.json"), SchemaKind::Itinerary).is_err());
    }

    #[test]
    fn test_temperature_option() {
        let cli = Cli::try_parse_from(["crewcraft", "code", "--temperature", "0.3"]).unwrap();
        assert_eq!(RunOptions::from_cli(&cli).unwrap().temperature, Some(0.3));

        let cli = Cli::try_parse_from(["crewcraft", "--temperature", "3.5", "code"]).unwrap();
        let err = RunOptions::from_cli(&cli).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
