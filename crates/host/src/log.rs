// crates/host/src/log.rs

//! Colored console narration for pipeline stages.

#![allow(dead_code)]

use std::fmt::Display;

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

// Stage colors
const EXTRACTOR_COLOR: &str = "\x1b[38;5;141m"; // Purple
const RESOLVER_COLOR: &str = "\x1b[38;5;208m"; // Orange
const GENERATOR_COLOR: &str = "\x1b[38;5;39m"; // Blue
const EXECUTOR_COLOR: &str = "\x1b[38;5;45m"; // Cyan
const WORKER_COLOR: &str = "\x1b[38;5;250m"; // Gray

// Status colors
const SUCCESS_COLOR: &str = "\x1b[38;5;82m"; // Green
const ERROR_COLOR: &str = "\x1b[38;5;196m"; // Red
const WARN_COLOR: &str = "\x1b[38;5;226m"; // Yellow
const INFO_COLOR: &str = "\x1b[38;5;252m"; // Light gray

/// Pipeline stage for logging context
#[derive(Debug, Clone, Copy)]
pub enum Stage {
    Extractor,
    Resolver,
    Generator,
    Executor,
    Worker,
}

impl Stage {
    fn color(&self) -> &'static str {
        match self {
            Stage::Extractor => EXTRACTOR_COLOR,
            Stage::Resolver => RESOLVER_COLOR,
            Stage::Generator => GENERATOR_COLOR,
            Stage::Executor => EXECUTOR_COLOR,
            Stage::Worker => WORKER_COLOR,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Stage::Extractor => "EXTRACT",
            Stage::Resolver => "CLARIFY",
            Stage::Generator => "GENERATE",
            Stage::Executor => "EXECUTE",
            Stage::Worker => "WORKER",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            Stage::Extractor => "🧠",
            Stage::Resolver => "❓",
            Stage::Generator => "🎨",
            Stage::Executor => "🌐",
            Stage::Worker => "⚙",
        }
    }
}

/// Log the start of a stage
pub fn stage_start(stage: Stage, what: &str) {
    println!(
        "\n{}{}{} {} {}{}",
        stage.color(),
        BOLD,
        stage.icon(),
        stage.name(),
        RESET,
        what
    );
}

/// Log a detail line inside a stage
pub fn stage_detail(stage: Stage, message: impl Display) {
    println!("{}  {}{}{}", stage.color(), DIM, message, RESET);
}

/// Log a stage result (success)
pub fn stage_success(stage: Stage, message: &str) {
    println!(
        "{}  {}✓ {}{}",
        stage.color(),
        SUCCESS_COLOR,
        truncate_message(message, 200),
        RESET
    );
}

/// Log a stage result (degraded or failed) - shows more detail than success
pub fn stage_error(stage: Stage, error: &str) {
    println!("{}  {}✗ ERROR:{}", stage.color(), ERROR_COLOR, RESET);
    for line in error.lines().take(10) {
        println!(
            "{}    {}{}{}",
            stage.color(),
            ERROR_COLOR,
            truncate_message(line, 120),
            RESET
        );
    }
}

/// Log a success message (stage-independent)
pub fn success(message: impl Display) {
    println!("{}{}✨ {}{}", SUCCESS_COLOR, BOLD, message, RESET);
}

/// Log an error message (stage-independent)
pub fn error(message: impl Display) {
    println!("{}{}❌ {}{}", ERROR_COLOR, BOLD, message, RESET);
}

/// Log a warning
pub fn warn(message: impl Display) {
    println!("{}⚠ {}{}", WARN_COLOR, message, RESET);
}

/// Log info message
pub fn info(message: impl Display) {
    println!("{}ℹ {}{}", INFO_COLOR, message, RESET);
}

/// Print a block of text indented under a heading, e.g. a generated instruction
pub fn block(stage: Stage, heading: &str, text: &str) {
    println!("{}  {}{}:{}", stage.color(), BOLD, heading, RESET);
    for line in text.lines() {
        println!("{}    {}{}", DIM, line, RESET);
    }
}

/// Truncate a message if too long
pub fn truncate_message(msg: &str, max_len: usize) -> String {
    let msg = msg.trim();
    let first_line = msg.lines().next().unwrap_or(msg);
    if first_line.chars().count() > max_len {
        let cut: String = first_line.chars().take(max_len).collect();
        format!("{}...", cut)
    } else if msg.lines().count() > 1 {
        format!("{} [+{} lines]", first_line, msg.lines().count() - 1)
    } else {
        first_line.to_string()
    }
}

/// Print a separator line
pub fn separator() {
    println!(
        "{}───────────────────────────────────────────────────────────────{}",
        DIM, RESET
    );
}
