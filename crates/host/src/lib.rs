// crates/host/src/lib.rs

//! Natural-language calendar requests turned into remote desktop automation.
//!
//! The flow per request is strictly linear: the extractor reads the request,
//! the resolver fills gaps when confidence is low, the generator writes an
//! instruction, and the remote desktop carries it out.

pub mod clarify;
pub mod config;
pub mod log;
pub mod pipeline;
pub mod stages;
pub mod worker;
