//! ocrsweep - adaptive multi-pass OCR for scanned documents and drawings.
//!
//! Core library exposing the domain model, conversion settings, the job
//! store and low-level PDF page operations to the workspace crates.

// Model types use `from_str` methods that return Option<Self>,
// not Result<Self, Error> as std::str::FromStr requires.
#![allow(clippy::should_implement_trait)]

pub mod config;
pub mod geometry;
pub mod models;
pub mod pdf;
pub mod store;
pub mod utils;
