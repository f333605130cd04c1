// crates/host/src/stages/generator/prompts.rs

//! Prompts for the instruction generator.

use calendar_agent_core::schedule;
use calendar_agent_core::types::{EventField, EventRecord};

pub const DEFAULT_TITLE: &str = "New Event";
pub const DEFAULT_DATE: &str = "today";
pub const DEFAULT_TIME: &str = "12:00";
pub const DEFAULT_DURATION: &str = "1 hour";

pub fn build_generator_prompt() -> String {
    "You are an expert at creating precise instructions for GUI automation agents.\n\
     Create a detailed, step-by-step instruction for an automation agent to create a calendar \
     event in Google Calendar via Firefox.\n\n\
     CRITICAL: Pay special attention to date and time formatting:\n\
     - Date format: If date is \"2025-08-22\", enter it as \"August 22, 2025\" or \"08/22/2025\"\n\
     - Time format: If time is \"08:00\", enter it as \"8:00 AM\" or \"08:00\"\n\
     - Duration: If duration is \"2 hours\", set end time accordingly (e.g., 8:00 AM to 10:00 AM)\n\n\
     The instruction should be:\n\
     1. Specific and actionable\n\
     2. Include all necessary details with correct date/time formatting\n\
     3. Handle potential UI variations\n\
     4. Include confirmation steps\n\n\
     Always state the start time and the end time in both 24-hour (HH:MM) and 12-hour form.\n\
     Format: Clear, sequential steps that a GUI automation agent can follow."
        .to_string()
}

pub fn build_generator_input(event: &EventRecord) -> String {
    let title = event.get(EventField::Title).unwrap_or(DEFAULT_TITLE);
    let date = event.get(EventField::Date).unwrap_or(DEFAULT_DATE);
    let time = event.get(EventField::Time).unwrap_or(DEFAULT_TIME);
    let duration = event.get(EventField::Duration).unwrap_or(DEFAULT_DURATION);
    let location = event.get(EventField::Location).unwrap_or("");

    let details = serde_json::to_string_pretty(event).unwrap_or_default();

    let end_line = match event.end_time() {
        Some(end) => format!(
            "   End time: {} ({})\n",
            end,
            schedule::to_12_hour(&end)
        ),
        None => String::new(),
    };

    format!(
        "Create an automation instruction to create this calendar event:\n\
         {details}\n\n\
         IMPORTANT: Make sure to format the date and time correctly for Google Calendar:\n\
         - Convert date from YYYY-MM-DD to a human-readable format ({human_date})\n\
         - Convert time from 24-hour to 12-hour format if needed ({start_12h})\n\
         - Calculate end time based on duration\n\n\
         The agent should:\n\
         1. Navigate to Google Calendar (assume already open)\n\
         2. Click \"Create\" or \"+\" button\n\
         3. Enter the title: \"{title}\"\n\
         4. Set the date correctly: {date}\n\
         5. Set the time correctly: {time}\n\
         {end_line}\
         6. Set duration: {duration}\n\
         7. Add location if provided: {location}\n\
         8. Save the event\n\
         9. Confirm the event was created successfully",
        human_date = schedule::human_date(date),
        start_12h = schedule::to_12_hour(time),
    )
}
