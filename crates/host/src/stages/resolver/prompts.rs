// crates/host/src/stages/resolver/prompts.rs

//! Prompts for the clarification resolver.

use chrono::NaiveDate;
use serde_json::json;

use calendar_agent_core::types::{ClarificationAnswer, EventRecord};

pub fn build_resolver_prompt(today: NaiveDate) -> String {
    format!(
        "You are a calendar event detail refiner. Take the initial extracted details and the \
         user's answers to create a complete event specification.\n\n\
         Return ONLY a JSON object with these exact fields:\n\
         - \"title\": string\n\
         - \"date\": string in YYYY-MM-DD format\n\
         - \"time\": string in HH:MM format (24-hour)\n\
         - \"duration\": string like \"1 hour\", \"30 minutes\", \"2 hours\"\n\
         - \"location\": string (can be empty if not provided)\n\n\
         Current date is {}. Convert relative dates like \"tomorrow\" or \"next Friday\" to \
         actual dates. Convert times like \"8am\" or \"2:30 PM\" to 24-hour format.\n\
         Answers tagged with a field belong to that field. Untagged notes may fill any field.",
        today.format("%Y-%m-%d")
    )
}

pub fn build_resolver_input(partial: &EventRecord, answers: &[ClarificationAnswer]) -> String {
    let tagged: Vec<_> = answers
        .iter()
        .filter(|a| a.field.is_some())
        .map(|a| json!({ "field": a.field, "question": a.question, "answer": a.answer }))
        .collect();
    let notes: Vec<_> = answers
        .iter()
        .filter(|a| a.field.is_none())
        .map(|a| json!({ "question": a.question, "answer": a.answer }))
        .collect();

    format!(
        "Initial extracted details: {}\n\
         User answers to clarification questions: {}\n\
         Additional notes from the user: {}\n\n\
         Please create a complete event specification.",
        json!(partial),
        json!(tagged),
        json!(notes)
    )
}
