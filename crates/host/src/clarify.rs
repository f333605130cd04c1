// crates/host/src/clarify.rs

//! Sources of answers for clarification questions.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use calendar_agent_core::types::{ClarificationAnswer, ClarificationQuestion, EventField};

/// Answers clarification questions. Unanswered questions are simply left out.
pub trait Clarifier {
    fn ask(&mut self, questions: &[ClarificationQuestion]) -> Result<Vec<ClarificationAnswer>>;
}

impl<F> Clarifier for F
where
    F: FnMut(&[ClarificationQuestion]) -> Result<Vec<ClarificationAnswer>>,
{
    fn ask(&mut self, questions: &[ClarificationQuestion]) -> Result<Vec<ClarificationAnswer>> {
        self(questions)
    }
}

/// Pair a question with a raw answer, dropping blank answers.
pub fn answer(question: &ClarificationQuestion, text: &str) -> Option<ClarificationAnswer> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(ClarificationAnswer {
        field: question.field,
        question: question.question.clone(),
        answer: text.to_string(),
    })
}

/// Prompts a human on a terminal, one line per question.
pub struct Interactive<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Interactive<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Clarifier for Interactive<R, W> {
    fn ask(&mut self, questions: &[ClarificationQuestion]) -> Result<Vec<ClarificationAnswer>> {
        writeln!(
            self.output,
            "\nI need some additional details to create your calendar event:"
        )?;

        let mut answers = Vec::new();
        for question in questions {
            write!(self.output, "❓ {} ", question.question)?;
            self.output.flush()?;

            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .context("failed to read answer")?;
            if read == 0 {
                break;
            }
            answers.extend(answer(question, &line));
        }
        Ok(answers)
    }
}

/// Fills known fields with fixed values, for unattended demo runs.
pub struct AutoComplete {
    defaults: Vec<(EventField, String)>,
}

impl AutoComplete {
    pub fn new(defaults: Vec<(EventField, String)>) -> Self {
        Self { defaults }
    }
}

impl Default for AutoComplete {
    fn default() -> Self {
        Self::new(vec![(EventField::Duration, "1 hour".to_string())])
    }
}

impl Clarifier for AutoComplete {
    fn ask(&mut self, questions: &[ClarificationQuestion]) -> Result<Vec<ClarificationAnswer>> {
        Ok(questions
            .iter()
            .filter_map(|q| {
                let field = q.field?;
                let (_, value) = self.defaults.iter().find(|(f, _)| *f == field)?;
                answer(q, value)
            })
            .collect())
    }
}
