//! Utility functions.

pub mod format;
pub mod text;

pub use format::format_duration;
pub use text::{compact_upper, dedup_text_key, normalize_overlay_token, normalize_rescue_line};
