// crates/host/src/stages/generator/mod.rs

//! Instruction generator: turns an event record into a free-text script for
//! the remote desktop.

mod prompts;

use calendar_agent_core::ai_client::{ChatRequest, CompletionClient};
use calendar_agent_core::types::{EventField, EventRecord};

use crate::log::{self, Stage};

use prompts::{DEFAULT_DATE, DEFAULT_TIME, DEFAULT_TITLE};

const TEMPERATURE: f32 = 0.1;

pub struct Generator<'a, C: CompletionClient + ?Sized> {
    client: &'a C,
    model: &'a str,
}

impl<'a, C: CompletionClient + ?Sized> Generator<'a, C> {
    pub fn new(client: &'a C, model: &'a str) -> Self {
        Self { client, model }
    }

    /// Always produces an instruction; a failed or empty completion falls back
    /// to [`fallback_instruction`].
    pub fn generate(&self, event: &EventRecord) -> String {
        let request = ChatRequest::new(self.model)
            .system(prompts::build_generator_prompt())
            .user(prompts::build_generator_input(event))
            .with_temperature(TEMPERATURE);

        match self.client.complete(request) {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                log::stage_error(Stage::Generator, "Model returned an empty instruction");
                fallback_instruction(event)
            }
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "instruction generation degraded");
                log::stage_error(
                    Stage::Generator,
                    &format!("Error generating instruction: {:#}", e),
                );
                fallback_instruction(event)
            }
        }
    }
}

/// Single-paragraph instruction built from the record alone.
///
/// Always names the title, date and start time verbatim.
pub fn fallback_instruction(event: &EventRecord) -> String {
    let title = event.get(EventField::Title).unwrap_or(DEFAULT_TITLE);
    let date = event.get(EventField::Date).unwrap_or(DEFAULT_DATE);
    let time = event.get(EventField::Time).unwrap_or(DEFAULT_TIME);

    let mut instruction = format!(
        "Open Google Calendar and create an event titled '{}' on {} at {}.",
        title, date, time
    );

    if let Some(duration) = event.get(EventField::Duration) {
        match event.end_time() {
            Some(end) => instruction.push_str(&format!(
                " The event lasts {}, ending at {}.",
                duration, end
            )),
            None => instruction.push_str(&format!(" The event lasts {}.", duration)),
        }
    }
    if let Some(location) = event.get(EventField::Location) {
        instruction.push_str(&format!(" The location is {}.", location));
    }
    instruction.push_str(" Save the event and confirm it was created.");
    instruction
}
