// crates/host/src/stages/extractor/mod.rs

//! Intent extractor: free text in, [`AnalysisResult`] out.

mod prompts;

use chrono::NaiveDate;

use calendar_agent_core::ai_client::{ChatRequest, CompletionClient};
use calendar_agent_core::json_text;
use calendar_agent_core::types::AnalysisResult;

use crate::log::{self, Stage};

const TEMPERATURE: f32 = 0.3;

pub struct Extractor<'a, C: CompletionClient + ?Sized> {
    client: &'a C,
    model: &'a str,
}

impl<'a, C: CompletionClient + ?Sized> Extractor<'a, C> {
    pub fn new(client: &'a C, model: &'a str) -> Self {
        Self { client, model }
    }

    /// Analyze a request. Any failure yields [`AnalysisResult::fallback`].
    pub fn analyze(&self, user_input: &str, today: NaiveDate) -> AnalysisResult {
        let request = ChatRequest::new(self.model)
            .system(prompts::build_extractor_prompt(today))
            .user(prompts::build_extractor_input(user_input))
            .with_temperature(TEMPERATURE);

        let parsed = self
            .client
            .complete(request)
            .and_then(|text| json_text::parse_object::<AnalysisResult>(&text));

        match parsed {
            Ok(analysis) => analysis.normalized(),
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "extraction degraded to fallback");
                log::stage_error(Stage::Extractor, &format!("Error analyzing user input: {:#}", e));
                AnalysisResult::fallback()
            }
        }
    }
}
