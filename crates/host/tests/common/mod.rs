// crates/host/tests/common/mod.rs

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::sync::Mutex;

use anyhow::Result;
use chrono::NaiveDate;

use calendar_agent_core::ai_client::{ChatRequest, CompletionClient};
use calendar_agent_core::desktop_client::RemoteDesktop;
use calendar_agent_host::pipeline::PipelineOptions;

/// Which stage a completion request came from, judged by its system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Extract,
    Refine,
    Generate,
}

impl StageKind {
    fn of(request: &ChatRequest) -> Self {
        let system = request.content_of("system").unwrap_or_default();
        if system.contains("calendar event analyzer") {
            StageKind::Extract
        } else if system.contains("detail refiner") {
            StageKind::Refine
        } else {
            StageKind::Generate
        }
    }
}

/// Completion client with one canned reply per stage. Stages without a reply fail.
#[derive(Default)]
pub struct ScriptedClient {
    replies: HashMap<StageKind, String>,
    calls: Mutex<Vec<(StageKind, ChatRequest)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, stage: StageKind, text: impl Into<String>) -> Self {
        self.replies.insert(stage, text.into());
        self
    }

    pub fn stages(&self) -> Vec<StageKind> {
        self.calls.lock().unwrap().iter().map(|(s, _)| *s).collect()
    }

    pub fn request_for(&self, stage: StageKind) -> Option<ChatRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, r)| r.clone())
    }
}

impl CompletionClient for ScriptedClient {
    fn complete(&self, request: ChatRequest) -> Result<String> {
        let stage = StageKind::of(&request);
        self.calls.lock().unwrap().push((stage, request));
        match self.replies.get(&stage) {
            Some(text) => Ok(text.clone()),
            None => anyhow::bail!("connection refused"),
        }
    }
}

/// Remote desktop that records what it was asked.
pub struct RecordingDesktop {
    reply: Option<String>,
    query_reply: String,
    gate: Option<Mutex<Receiver<()>>>,
    pub prompts: Mutex<Vec<String>>,
    pub queries: Mutex<Vec<String>>,
}

impl RecordingDesktop {
    pub fn ok(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            query_reply: "YES, the event is there.".to_string(),
            gate: None,
            prompts: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            ..Self::ok("")
        }
    }

    /// Block each prompt until a unit is sent on the paired channel.
    pub fn gated(reply: &str, gate: Receiver<()>) -> Self {
        Self {
            gate: Some(Mutex::new(gate)),
            ..Self::ok(reply)
        }
    }

    pub fn with_query_reply(mut self, reply: &str) -> Self {
        self.query_reply = reply.to_string();
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl RemoteDesktop for RecordingDesktop {
    fn prompt(&self, instruction: &str) -> Result<String> {
        if let Some(gate) = &self.gate {
            gate.lock().unwrap().recv()?;
        }
        self.prompts.lock().unwrap().push(instruction.to_string());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => anyhow::bail!("desktop session not running"),
        }
    }

    fn query(&self, question: &str) -> Result<String> {
        self.queries.lock().unwrap().push(question.to_string());
        Ok(self.query_reply.clone())
    }
}

pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 28).unwrap()
}

pub fn options() -> PipelineOptions {
    PipelineOptions {
        confidence_threshold: 0.8,
        today: reference_date(),
        dry_run: false,
        verify: false,
    }
}

pub const DIVING_ANALYSIS: &str = r#"```json
{
  "extracted_details": {"title": "Diving", "date": "2025-08-22", "time": "08:00", "duration": "2 hours"},
  "missing_details": [],
  "confidence": 0.95,
  "clarification_questions": []
}
```"#;

pub const PARTIAL_ANALYSIS: &str = r#"{
  "extracted_details": {"title": "Dentist", "date": "2025-01-31", "time": "09:30"},
  "missing_details": ["duration", "location"],
  "confidence": 0.6,
  "clarification_questions": [
    {"field": "duration", "question": "How long will the appointment last?"},
    {"field": "location", "question": "Where is it?"}
  ]
}"#;
