//! Error types for mutant generation
//!
//! Rules never fail: an unsupported node shape or an unresolved scope just means
//! "no mutation here". Errors only come from the edges of the engine, i.e. loading
//! input and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur around a mutation pass
#[derive(Debug, Error)]
pub enum MutationError {
    /// Failed to read a source file or AST dump
    #[error("Failed to read file '{}': {error}", file.display())]
    FileReadError { file: PathBuf, error: String },

    /// The AST dump could not be decoded
    #[error("Failed to decode AST for '{}': {error}", file.display())]
    AstDecodeError { file: PathBuf, error: String },

    /// The AST root does not fit the source text it was paired with
    #[error("AST span {start}..{end} is outside '{}' ({len} bytes)", file.display())]
    InvalidSpan {
        file: PathBuf,
        start: usize,
        end: usize,
        len: usize,
    },

    /// Configuration refers to an operator the catalog does not have
    #[error("Unknown operator '{id}'\n  Available operators: {}", available.join(", "))]
    UnknownOperator { id: String, available: Vec<String> },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Failed to write generated output
    #[error("Failed to write '{}': {error}", file.display())]
    WriteError { file: PathBuf, error: String },
}

/// Result type for mutation operations
pub type Result<T> = std::result::Result<T, MutationError>;
