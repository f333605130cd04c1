// crates/host/src/stages/mod.rs

//! The three LLM-backed pipeline stages.
//!
//! Each stage is self-contained with its own:
//! - mod.rs (the call and its fallback)
//! - prompts.rs (system and user prompts)
//!
//! None of them return errors: a failed completion call degrades to a
//! fallback value and is reported on the console.

pub mod extractor;
pub mod generator;
pub mod resolver;

pub use extractor::Extractor;
pub use generator::Generator;
pub use resolver::Resolver;
