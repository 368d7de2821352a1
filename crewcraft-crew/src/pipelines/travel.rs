//! Rental, itinerary and budget: a hierarchical trip-planning crew

use crate::tools::{ScrapeWebsiteTool, SerperSearchTool, ToolRef};
use crate::{
    Agent, Crew, CrewBuilder, Error, ErrorKind, Inputs, ManagerConfig, OutputSchema, Process, Result, Task,
};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const RENTAL_COORDINATOR: &str = "Hotel/Rental Coordinator";
pub const ITINERARY_PLANNER: &str = "Itinerary Planner";
pub const BUDGETING_AGENT: &str = "Budgeting Agent";

pub const VENUE_FILE: &str = "venue_details.json";
pub const ITINERARY_FILE: &str = "itinerary_details.json";
pub const FINAL_ITINERARY_FILE: &str = "final_itinerary.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RentalDetails {
    pub name: String,
    pub address: String,
    pub capacity: i64,
    pub price_per_night: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: String,
    pub amenities: Vec<String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DayItinerary {
    pub day: i64,
    pub date: NaiveDate,
    pub activities: Vec<String>,
    pub location: String,
    pub estimated_cost: i64,
    pub need_rental_car: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FullItinerary {
    pub rental_details: RentalDetails,
    pub daily_itineraries: Vec<DayItinerary>,
    pub total_estimated_cost: i64,
}

/// What the travellers asked for; fills the task templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub vacation_city: String,
    pub vacation_details: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub group_size: u32,
    pub budget: u64,
}

impl Default for TripRequest {
    fn default() -> Self {
        Self {
            vacation_city: "Honolulu".into(),
            vacation_details: "A vacation for an adventurous family of 7 who want to explore the island, \
                               see the nature, and experience some good Hawaiian food and culture"
                .into(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 22).unwrap_or_default(),
            group_size: 7,
            budget: 10_000,
        }
    }
}

impl TripRequest {
    /// Dates become `YYYY-MM-DD` strings, sizes stay numbers
    pub fn to_inputs(&self) -> Inputs {
        let mut inputs = Inputs::new();
        inputs.insert("vacation_city".into(), Value::String(self.vacation_city.clone()));
        inputs.insert("vacation_details".into(), Value::String(self.vacation_details.clone()));
        inputs.insert("start_date".into(), Value::String(self.start_date.to_string()));
        inputs.insert("end_date".into(), Value::String(self.end_date.to_string()));
        inputs.insert("group_size".into(), Value::from(self.group_size));
        inputs.insert("budget".into(), Value::from(self.budget));
        inputs
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| {
            Error::new(ErrorKind::InvalidArgument, msg).with_operation("travel::validate")
        };
        if self.vacation_city.trim().is_empty() {
            return Err(invalid("vacation city is empty".into()));
        }
        if self.end_date < self.start_date {
            return Err(invalid(format!(
                "trip ends ({}) before it starts ({})",
                self.end_date, self.start_date
            )));
        }
        if self.group_size == 0 {
            return Err(invalid("group size must be at least 1".into()));
        }
        Ok(())
    }
}

/// Agents sharing one search and one scrape tool; each may consult the others
pub fn agents(serper_api_key: Option<String>) -> Result<Vec<Agent>> {
    let search: ToolRef = Arc::new(SerperSearchTool::new(serper_api_key)?);
    let scrape: ToolRef = Arc::new(ScrapeWebsiteTool::new()?);

    let agents = vec![
        Agent::new(
            RENTAL_COORDINATOR,
            "Identify an appropriate hotel, rental home, or vacation rental.",
            "With a keen sense of space and understanding of vacation logistics, \
             you excel at finding and securing the perfect vacation rental that fits \
             the vacation's location, start and end dates, group size, and budget constraints.",
        )
        .with_tools(vec![search.clone(), scrape.clone()]),
        Agent::new(
            ITINERARY_PLANNER,
            "Create a proposed itinerary including daily excursions and activities.",
            "With a passion for adventure and local culture, you specialize in planning engaging \
             and budget-friendly itineraries, taking into account the traveler's interests, budget, \
             and logistics like transportation needs.",
        )
        .with_tools(vec![search.clone(), scrape]),
        Agent::new(
            BUDGETING_AGENT,
            "Manage the overall budget for the trip, considering the cost of accommodation and daily activities.",
            "With a knack for financial planning, you ensure the vacation remains within budget \
             while maximizing value and enjoyment.",
        )
        .with_tools(vec![search]),
    ];
    Ok(agents
        .into_iter()
        .map(|a| a.with_delegation(true).with_verbose(true))
        .collect())
}

pub fn tasks() -> Vec<Task> {
    vec![
        Task::new(
            "Find a hotel or rental in {vacation_city} that meets criteria for {vacation_details}, \
             {budget}, {group_size}, {start_date} and {end_date}.",
            "Details of suitable rental options, including name, address, capacity, price per night, \
             available dates, description, and amenities.",
            RENTAL_COORDINATOR,
        )
        .with_output_schema(OutputSchema::of::<RentalDetails>())
        .with_output_file(VENUE_FILE),
        Task::new(
            "Plan a full itinerary for the trip in {vacation_city}, considering {vacation_details}, \
             {budget}, and {group_size}. Include daily excursions and local activities, specifying \
             if a rental car is needed.",
            "A detailed itinerary for each day of the trip, including activities, locations, \
             estimated costs, and rental car needs.",
            ITINERARY_PLANNER,
        )
        .with_output_schema(OutputSchema::of::<FullItinerary>())
        .with_output_file(ITINERARY_FILE),
        Task::new(
            "Ensure the total cost of the trip, including accommodation and daily activities, \
             stays within the allocated budget of {budget}.",
            "Adjusted itinerary with budget considerations, including the cost of accommodation \
             and daily activities.",
            BUDGETING_AGENT,
        )
        .with_output_schema(OutputSchema::of::<FullItinerary>())
        .with_output_file(FINAL_ITINERARY_FILE),
    ]
    .into_iter()
    .map(|t| t.with_human_input(true))
    .collect()
}

pub fn builder(serper_api_key: Option<String>) -> Result<CrewBuilder> {
    Ok(Crew::builder()
        .agents(agents(serper_api_key)?)
        .tasks(tasks())
        .process(Process::Hierarchical {
            manager: ManagerConfig::default(),
        })
        .verbose(true))
}

pub fn crew(serper_api_key: Option<String>) -> Result<Crew> {
    builder(serper_api_key)?.build()
}
