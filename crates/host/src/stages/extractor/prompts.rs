// crates/host/src/stages/extractor/prompts.rs

//! Prompts for the intent extractor.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Build the system prompt, anchored on `today` for relative dates.
pub fn build_extractor_prompt(today: NaiveDate) -> String {
    let tomorrow = today + Duration::days(1);
    let next_friday = next_weekday(today, Weekday::Fri);

    format!(
        "You are a calendar event analyzer. Your job is to:\n\
         1. Extract any event details from user input\n\
         2. Identify what information is missing for a complete calendar event\n\
         3. Return a structured response\n\n\
         IMPORTANT DATE/TIME PARSING RULES:\n\
         - Current date is {today_long} ({today}); use it as the reference for relative dates\n\
         - A month and day without a year means the next occurrence on or after the current date\n\
         - \"8am\" = \"08:00\", \"2pm\" = \"14:00\", \"8:30am\" = \"08:30\"\n\
         - \"tomorrow\" = \"{tomorrow}\"\n\
         - \"next Friday\" = \"{next_friday}\"\n\n\
         Required fields for a calendar event:\n\
         - title: Event name/description\n\
         - date: Specific date (YYYY-MM-DD format)\n\
         - time: Start time (HH:MM format, 24-hour)\n\
         - duration: How long the event lasts (e.g., \"1 hour\", \"2 hours\", \"30 minutes\")\n\
         - location: Where the event takes place (optional)\n\n\
         Return ONLY a JSON object with:\n\
         - \"extracted_details\": {{object of found fields, using the field names above and the formats above}}\n\
         - \"missing_details\": [list of missing required field names]\n\
         - \"confidence\": number between 0 and 1 for how complete the information is\n\
         - \"clarification_questions\": [list of {{\"field\": <one of title|date|time|duration|location>, \"question\": <question for the user>}}]\n\n\
         Ask exactly one question per missing field, and tag it with that field.\n\n\
         EXAMPLES:\n\
         - \"diving event August 22nd 8am\" -> date: \"{aug22}\", time: \"08:00\"\n\
         - \"meeting tomorrow at 2pm\" -> date: \"{tomorrow}\", time: \"14:00\"\n\
         - \"gym session at 8:30am\" -> time: \"08:30\"",
        today_long = today.format("%B %-d, %Y"),
        today = today.format("%Y-%m-%d"),
        tomorrow = tomorrow.format("%Y-%m-%d"),
        next_friday = next_friday.format("%Y-%m-%d"),
        aug22 = next_occurrence(today, 8, 22).format("%Y-%m-%d"),
    )
}

/// Build the user message for one request.
pub fn build_extractor_input(user_input: &str) -> String {
    format!("Analyze this calendar request: {}", user_input)
}

/// The first `weekday` strictly after `from`.
pub fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (7 + weekday.num_days_from_monday() as i64
        - from.weekday().num_days_from_monday() as i64)
        % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    from + Duration::days(ahead)
}

/// The next `month`/`day` on or after `from`.
pub fn next_occurrence(from: NaiveDate, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(from.year(), month, day) {
        Some(date) if date >= from => date,
        _ => NaiveDate::from_ymd_opt(from.year() + 1, month, day).unwrap_or(from),
    }
}
