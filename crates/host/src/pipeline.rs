// crates/host/src/pipeline.rs

//! Linear pipeline: extract -> (clarify) -> generate -> execute -> (verify).

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use calendar_agent_core::ai_client::CompletionClient;
use calendar_agent_core::desktop_client::RemoteDesktop;
use calendar_agent_core::types::{AnalysisResult, EventField, EventRecord};

use crate::clarify::Clarifier;
use crate::log::{self, Stage};
use crate::stages::{Extractor, Generator, Resolver};

static LEADING_YES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\W*(yes|confirmed)\b").expect("leading yes pattern is valid")
});
static LEADING_NO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\W*no\b").expect("leading no pattern is valid"));
static NOT_FOUND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)not found|does not exist|doesn't exist|could not find|couldn't find|no such event",
    )
    .expect("not found pattern is valid")
});
static ANY_YES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\byes\b").expect("yes pattern is valid"));
static ANY_NO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bno\b").expect("no pattern is valid"));

/// Per-run knobs.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub confidence_threshold: f64,
    /// Reference date for relative expressions like "tomorrow".
    pub today: NaiveDate,
    /// Stop after generating the instruction.
    pub dry_run: bool,
    /// Ask the desktop whether the event exists after execution.
    pub verify: bool,
}

/// Outcome of the post-execution check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Confirmed,
    Missing,
    Inconclusive,
}

impl Verification {
    /// The leading YES/NO decides. Without one, "not found" wording means
    /// missing, then a lone standalone yes or no anywhere in the reply.
    pub fn classify(reply: &str) -> Self {
        if LEADING_YES.is_match(reply) {
            return Verification::Confirmed;
        }
        if LEADING_NO.is_match(reply) || NOT_FOUND.is_match(reply) {
            return Verification::Missing;
        }
        match (ANY_YES.is_match(reply), ANY_NO.is_match(reply)) {
            (true, false) => Verification::Confirmed,
            (false, true) => Verification::Missing,
            _ => Verification::Inconclusive,
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub analysis: AnalysisResult,
    /// Whether the clarification resolver ran.
    pub clarified: bool,
    pub event: EventRecord,
    pub instruction: String,
    /// The desktop's reply; `None` on a dry run.
    pub result: Option<String>,
    pub verification: Option<Verification>,
}

pub struct Pipeline<C: CompletionClient, D: RemoteDesktop> {
    client: Arc<C>,
    desktop: Arc<D>,
    model: String,
    options: PipelineOptions,
}

impl<C: CompletionClient, D: RemoteDesktop> Pipeline<C, D> {
    pub fn new(
        client: Arc<C>,
        desktop: Arc<D>,
        model: impl Into<String>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            client,
            desktop,
            model: model.into(),
            options,
        }
    }

    /// Run one request end to end.
    ///
    /// The LLM stages never fail; only clarification input and remote
    /// execution can return an error.
    pub fn run(&self, user_input: &str, clarifier: &mut dyn Clarifier) -> Result<RunReport> {
        let client = self.client.as_ref();
        let today = self.options.today;

        log::stage_start(Stage::Extractor, user_input);
        let analysis = Extractor::new(client, &self.model).analyze(user_input, today);
        log::stage_detail(
            Stage::Extractor,
            format!("Confidence level: {:.1}%", analysis.confidence * 100.0),
        );
        log::stage_detail(
            Stage::Extractor,
            format!("Extracted details: {}", describe(&analysis.extracted_details)),
        );

        let mut event = analysis.extracted_details.clone();
        let clarified = analysis.needs_clarification(self.options.confidence_threshold);

        if clarified {
            log::stage_start(Stage::Resolver, "Gathering missing details");
            if !analysis.missing_details.is_empty() {
                log::stage_detail(
                    Stage::Resolver,
                    format!("Missing information: {}", analysis.missing_details.join(", ")),
                );
            }

            let answers = clarifier
                .ask(&analysis.clarification_questions)
                .context("failed to collect clarification answers")?;

            for answer in &answers {
                if let Some(field) = answer.field {
                    event.set(field, answer.answer.clone());
                }
            }

            event = Resolver::new(client, &self.model).refine(&event, &answers, today);
            log::stage_success(Stage::Resolver, &describe(&event));
        }

        for issue in event.format_issues() {
            log::warn(issue);
        }

        log::stage_start(Stage::Generator, "Writing automation instruction");
        let instruction = Generator::new(client, &self.model).generate(&event);
        log::block(Stage::Generator, "Instruction", &instruction);

        let mut report = RunReport {
            analysis,
            clarified,
            event,
            instruction,
            result: None,
            verification: None,
        };

        if self.options.dry_run {
            log::info("Dry run: instruction not sent");
            return Ok(report);
        }

        log::stage_start(Stage::Executor, "Sending instruction to the remote desktop");
        let result = self
            .desktop
            .prompt(&report.instruction)
            .context("remote execution failed")?;
        log::stage_success(Stage::Executor, &result);
        report.result = Some(result);

        if self.options.verify {
            report.verification = Some(self.verify(&report.event));
        }

        Ok(report)
    }

    /// Ask the desktop whether the event now exists. Errors count as inconclusive.
    pub fn verify(&self, event: &EventRecord) -> Verification {
        let question = verification_query(event);
        log::stage_detail(Stage::Executor, "Checking that the event exists");

        let verdict = match self.desktop.query(&question) {
            Ok(reply) => Verification::classify(&reply),
            Err(e) => {
                log::stage_error(Stage::Executor, &format!("Verification failed: {:#}", e));
                Verification::Inconclusive
            }
        };

        match verdict {
            Verification::Confirmed => {
                log::stage_success(Stage::Executor, "Event confirmed in calendar")
            }
            Verification::Missing => log::warn("The desktop could not find the event"),
            Verification::Inconclusive => log::warn("Could not confirm the event"),
        }
        verdict
    }
}

pub fn verification_query(event: &EventRecord) -> String {
    format!(
        "Look at Google Calendar and check whether an event titled '{}' exists on {} at {}. \
         Answer YES or NO first, then explain in one sentence. Do not change anything.",
        event.get(EventField::Title).unwrap_or("New Event"),
        event.get(EventField::Date).unwrap_or("today"),
        event.get(EventField::Time).unwrap_or("12:00"),
    )
}

/// Compact one-line rendering of a record for the console.
pub fn describe(event: &EventRecord) -> String {
    let parts: Vec<String> = EventField::ALL
        .iter()
        .filter_map(|f| event.get(*f).map(|v| format!("{}={}", f, v)))
        .collect();
    if parts.is_empty() {
        "(none)".to_string()
    } else {
        parts.join(", ")
    }
}
