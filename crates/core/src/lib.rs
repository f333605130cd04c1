// crates/core/src/lib.rs

//! Core building blocks for the calendar agent: the completion and
//! remote-desktop boundaries, the event data model, and the reliability
//! wrapper that sits in front of remote execution.

pub mod ai_client;
pub mod desktop_client;
pub mod json_text;
pub mod openai_client;
pub mod reliability;
pub mod schedule;
pub mod types;
