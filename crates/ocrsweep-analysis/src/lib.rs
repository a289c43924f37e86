//! OCR profile ensemble, coverage verification and overlay injection for ocrsweep.
//!
//! - `tools`: adapters for ocrmypdf, tesseract and poppler
//! - `scoring`: text-layer quality metrics
//! - `coverage`: independent word-box scan (full page, tiles, rotations, design table)
//! - `rescue`: escalation and manual-review rule tables
//! - `overlay`: invisible text injection and review images
//! - `pipeline`: page pipeline and job orchestration

pub mod coverage;
pub mod overlay;
pub mod pipeline;
pub mod rescue;
pub mod scoring;
pub mod tools;

pub use pipeline::{preflight, ConversionService, PipelineError, PipelineEvent, Toolchain};
