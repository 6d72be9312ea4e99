//! Error types for the vulnera-fixgen crate.
//!
//! This module provides a comprehensive error type [`FixgenError`] that covers
//! all failure modes in the library, enabling proper error handling.
//!
//! Two outcomes that look like failures are deliberately NOT errors:
//! a finding with no source file behind it resolves to
//! [`crate::context::ResolutionOutcome::NoSource`], and a candidate set in
//! which no fix passes validation filters down to an empty vector. Callers
//! branch on those values; `FixgenError` is reserved for malformed input,
//! I/O faults, and external-tool failures.

use std::io;

/// The main error type for all operations in this crate.
#[derive(Debug, thiserror::Error)]
pub enum FixgenError {
    /// An upstream record is missing fields the pipeline requires.
    #[error("Malformed record '{record_id}': {message}")]
    MalformedRecord {
        /// Identifier of the offending record.
        record_id: String,
        /// Which requirement the record violated.
        message: String,
    },

    /// Configuration error (missing or invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error (file operations, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A file was found but its contents could not be decoded as UTF-8 text.
    #[error("Decode error for '{path}': {message}")]
    Decode {
        /// Path of the file that failed to decode.
        path: String,
        /// Description of the decoding failure.
        message: String,
    },

    /// An external validation tool is missing, failed to run, or timed out.
    #[error("External tool '{tool}' failed: {message}")]
    ExternalTool {
        /// Name or path of the tool (e.g., "python3").
        tool: String,
        /// What went wrong.
        message: String,
    },
}

/// A specialized Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, FixgenError>;

impl FixgenError {
    /// Create a new malformed-record error.
    pub fn malformed(record_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record_id: record_id.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new decode error.
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new external-tool error.
    pub fn external_tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Check if this error was caused by bad upstream input rather than the
    /// environment. Batch callers drop such records instead of retrying them.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }
}
