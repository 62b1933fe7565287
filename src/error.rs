//! # Error Types
//!
//! This module defines error types used throughout the memoria library.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Main error type for memoria operations
#[derive(Debug, Error)]
pub enum MemoriaError {
    /// Malformed import payload (not JSON, not an array, invalid block)
    #[error("Parse error: {0}")]
    Parse(String),

    /// One or more page fields failed validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Backend load/save failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Page id unknown to the backend
    #[error("Page not found: {0}")]
    NotFound(String),

    /// Image could not be fetched or decoded
    #[error("Asset error: {0}")]
    Asset(String),

    /// Rasterization or encoding failure
    #[error("Render error: {0}")]
    Render(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-field validation messages, keyed by field name.
///
/// Ordered so that responses and error strings are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), MemoriaError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(MemoriaError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}
