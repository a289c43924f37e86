//! Data model for conversion jobs, pages and OCR attempts.

mod analysis;
mod coverage;
mod job;
mod page;
mod profile;
mod word_box;

pub use analysis::{Analysis, Attempt};
pub use coverage::Coverage;
pub use job::{Job, JobId, JobSnapshot, JobStatus};
pub use page::{PageDetail, PageStatus};
pub use profile::{OcrMode, Profile, Thresholding};
pub use word_box::WordBox;
