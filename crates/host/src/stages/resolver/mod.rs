// crates/host/src/stages/resolver/mod.rs

//! Clarification resolver: merges a partial record with the user's answers.

mod prompts;

use chrono::NaiveDate;

use calendar_agent_core::ai_client::{ChatRequest, CompletionClient};
use calendar_agent_core::json_text;
use calendar_agent_core::types::{ClarificationAnswer, EventRecord};

use crate::log::{self, Stage};

const TEMPERATURE: f32 = 0.2;

pub struct Resolver<'a, C: CompletionClient + ?Sized> {
    client: &'a C,
    model: &'a str,
}

impl<'a, C: CompletionClient + ?Sized> Resolver<'a, C> {
    pub fn new(client: &'a C, model: &'a str) -> Self {
        Self { client, model }
    }

    /// Ask the model for a complete record. On any failure the partial record
    /// is returned unchanged.
    pub fn refine(
        &self,
        partial: &EventRecord,
        answers: &[ClarificationAnswer],
        today: NaiveDate,
    ) -> EventRecord {
        let request = ChatRequest::new(self.model)
            .system(prompts::build_resolver_prompt(today))
            .user(prompts::build_resolver_input(partial, answers))
            .with_temperature(TEMPERATURE);

        let refined = self
            .client
            .complete(request)
            .and_then(|text| json_text::parse_object::<EventRecord>(&text));

        match refined {
            Ok(mut record) => {
                record.fill_missing_from(partial);
                record
            }
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "refinement dropped");
                log::stage_error(
                    Stage::Resolver,
                    &format!("Error refining event details: {:#}", e),
                );
                partial.clone()
            }
        }
    }
}
