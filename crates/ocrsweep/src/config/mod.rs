//! Configuration: conversion settings, tool locations and vocabulary.
//!
//! Settings are assembled from built-in defaults, an optional TOML config
//! file and command-line overrides, then validated once before a job is
//! created. After validation they are treated as immutable.

mod loader;
mod pages;
mod settings;
mod tools;
mod vocabulary;

use std::path::PathBuf;

use thiserror::Error;

pub use loader::{load_config, Config, ConversionOverrides, LoadOptions, CONFIG_FILENAME};
pub use pages::PageSelection;
pub use settings::{default_output_path, is_mixed_english, validate_input, ConversionSettings};
pub use tools::ToolPaths;
pub use vocabulary::{Vocabulary, DESIGN_TABLE_STEMS, ENGINEERING_TOKEN_SPLITS, RESCUE_MISREADS};

/// Errors in job settings or inputs, detected before any external call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {message}")]
    InvalidOption { name: &'static str, message: String },

    #[error("Invalid language code '{0}': {1}")]
    InvalidLanguage(String, String),

    #[error("Invalid page range '{0}': {1}")]
    InvalidPageRange(String, String),

    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Input file is not a PDF: {0}")]
    NotAPdf(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
