// crates/core/src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::schedule;

/// One of the fields that make up a calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventField {
    Title,
    Date,
    Time,
    Duration,
    Location,
}

impl EventField {
    pub const ALL: [EventField; 5] = [
        EventField::Title,
        EventField::Date,
        EventField::Time,
        EventField::Duration,
        EventField::Location,
    ];

    /// Fields that must be present before an event is worth executing.
    pub const REQUIRED: [EventField; 4] = [
        EventField::Title,
        EventField::Date,
        EventField::Time,
        EventField::Duration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventField::Title => "title",
            EventField::Date => "date",
            EventField::Time => "time",
            EventField::Duration => "duration",
            EventField::Location => "location",
        }
    }
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" | "name" => Ok(EventField::Title),
            "date" => Ok(EventField::Date),
            "time" | "start_time" => Ok(EventField::Time),
            "duration" => Ok(EventField::Duration),
            "location" | "place" => Ok(EventField::Location),
            other => Err(format!("unknown event field '{}'", other)),
        }
    }
}

/// The calendar event under construction.
///
/// Values are kept as text: `date` is meant to be YYYY-MM-DD, `time` HH:MM
/// (24-hour), and `duration` a phrase like "2 hours". Nothing here rejects a
/// malformed value; see [`EventRecord::format_issues`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "lenient_location")]
    pub location: String,
}

impl EventRecord {
    pub fn get(&self, field: EventField) -> Option<&str> {
        let value = match field {
            EventField::Title => self.title.as_deref(),
            EventField::Date => self.date.as_deref(),
            EventField::Time => self.time.as_deref(),
            EventField::Duration => self.duration.as_deref(),
            EventField::Location => Some(self.location.as_str()),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    pub fn set(&mut self, field: EventField, value: impl Into<String>) {
        let value = value.into();
        match field {
            EventField::Title => self.title = Some(value),
            EventField::Date => self.date = Some(value),
            EventField::Time => self.time = Some(value),
            EventField::Duration => self.duration = Some(value),
            EventField::Location => self.location = value,
        }
    }

    /// Copy over any field that is blank here but present in `other`.
    pub fn fill_missing_from(&mut self, other: &EventRecord) {
        for field in EventField::ALL {
            if self.get(field).is_none() {
                if let Some(value) = other.get(field) {
                    self.set(field, value);
                }
            }
        }
    }

    /// Required fields that are absent or blank.
    pub fn missing_fields(&self) -> Vec<EventField> {
        EventField::REQUIRED
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    /// Human-readable warnings for values that downstream stages are likely
    /// to misread. Never used to block execution.
    pub fn format_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if let Some(date) = self.get(EventField::Date) {
            if schedule::parse_date(date).is_none() {
                issues.push(format!("date '{}' is not in YYYY-MM-DD form", date));
            }
        }
        if let Some(time) = self.get(EventField::Time) {
            if schedule::parse_time(time).is_none() {
                issues.push(format!("time '{}' is not in 24-hour HH:MM form", time));
            }
        }
        if let Some(duration) = self.get(EventField::Duration) {
            if schedule::parse_duration(duration).is_none() {
                issues.push(format!("duration '{}' could not be understood", duration));
            }
        }

        issues
    }

    /// End clock time (HH:MM) derived from `time` plus `duration`, if both parse.
    pub fn end_time(&self) -> Option<String> {
        let start = schedule::parse_time(self.get(EventField::Time)?)?;
        let duration = schedule::parse_duration(self.get(EventField::Duration)?)?;
        Some(schedule::format_time(schedule::add_duration(start, duration)))
    }
}

/// A question for the user, tied to the field it would fill.
///
/// `field` is `None` when the model produced a bare question string; answers
/// to such questions cannot be routed and travel as free-text notes instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawQuestion")]
pub struct ClarificationQuestion {
    pub field: Option<EventField>,
    pub question: String,
}

impl ClarificationQuestion {
    pub fn new(field: EventField, question: impl Into<String>) -> Self {
        Self {
            field: Some(field),
            question: question.into(),
        }
    }

    pub fn unrouted(question: impl Into<String>) -> Self {
        Self {
            field: None,
            question: question.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuestion {
    Structured {
        #[serde(default)]
        field: Option<String>,
        question: String,
    },
    Bare(String),
}

impl From<RawQuestion> for ClarificationQuestion {
    fn from(raw: RawQuestion) -> Self {
        match raw {
            RawQuestion::Structured { field, question } => Self {
                field: field.and_then(|f| f.parse().ok()),
                question,
            },
            RawQuestion::Bare(question) => Self::unrouted(question),
        }
    }
}

/// A user's answer to one clarification question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClarificationAnswer {
    pub field: Option<EventField>,
    pub question: String,
    pub answer: String,
}

/// What the extractor made of a request. Lives for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub extracted_details: EventRecord,
    #[serde(default, deserialize_with = "null_as_default")]
    pub missing_details: Vec<String>,
    #[serde(default, deserialize_with = "lenient_confidence")]
    pub confidence: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clarification_questions: Vec<ClarificationQuestion>,
}

impl AnalysisResult {
    /// Result used when the completion call fails or returns garbage.
    pub fn fallback() -> Self {
        Self {
            extracted_details: EventRecord::default(),
            missing_details: EventField::REQUIRED
                .iter()
                .map(|f| f.as_str().to_string())
                .collect(),
            confidence: 0.0,
            clarification_questions: vec![ClarificationQuestion::unrouted(
                "Could you provide more details about your calendar event?",
            )],
        }
    }

    /// Clamp the self-reported confidence into [0, 1]; NaN becomes 0.
    pub fn normalized(mut self) -> Self {
        self.confidence = if self.confidence.is_nan() {
            0.0
        } else {
            self.confidence.clamp(0.0, 1.0)
        };
        self
    }

    pub fn needs_clarification(&self, threshold: f64) -> bool {
        self.confidence < threshold && !self.clarification_questions.is_empty()
    }
}

/// Accept strings, numbers and null for a text field.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Treat an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Numbers, numeric strings ("0.95") and percentages ("95%"). Anything else is 0.
fn lenient_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            match s.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f64>().map(|p| p / 100.0).unwrap_or(0.0),
                None => s.parse().unwrap_or(0.0),
            }
        }
        _ => 0.0,
    })
}

fn lenient_location<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}
