//! # Page Persistence
//!
//! A memorial page is stored as one [`PageContent`] record: meta fields,
//! the block list, and optionally the canvas scene.
//!
//! Storage backends implement [`PersistenceAdapter`]:
//!
//! | Adapter | Backing store |
//! |---------|---------------|
//! | [`MemoryStore`] | In-process map, for tests and local use |
//! | [`RestStore`] | Hosted PostgREST-style table |
//!
//! [`AutoSaver`] debounces saves on top of any adapter.

pub mod autosave;
pub mod memory;
pub mod rest;

pub use autosave::{AutoSaver, Notice};
pub use memory::MemoryStore;
pub use rest::RestStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::blocks::Block;
use crate::canvas::Scene;
use crate::error::{MemoriaError, ValidationErrors};

/// Backend-assigned page identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    #[default]
    Draft,
    Published,
}

/// Who the page remembers, and whether it is public.
///
/// Dates are kept as entered (`YYYY-MM-DD`) and checked by [`PageMeta::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    pub title: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
    pub status: PageStatus,
}

fn parse_date(
    field: &str,
    value: Option<&str>,
    errors: &mut ValidationErrors,
) -> Option<NaiveDate> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "must be a date in YYYY-MM-DD format");
            None
        }
    }
}

impl PageMeta {
    /// Collect per-field problems into `errors`.
    pub fn validate_into(&self, errors: &mut ValidationErrors) {
        if self.title.trim().is_empty() {
            errors.add("title", "is required");
        }
        if self.full_name.trim().is_empty() {
            errors.add("full_name", "is required");
        }
        let birth = parse_date("birth_date", self.birth_date.as_deref(), errors);
        let death = parse_date("death_date", self.death_date.as_deref(), errors);
        if let (Some(birth), Some(death)) = (birth, death) {
            if death < birth {
                errors.add("death_date", "cannot be before the date of birth");
            }
        }
    }

    pub fn validate(&self) -> Result<(), MemoriaError> {
        let mut errors = ValidationErrors::new();
        self.validate_into(&mut errors);
        errors.into_result()
    }
}

/// The persisted page record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    #[serde(default)]
    pub meta: PageMeta,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<Scene>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PageContent {
    /// Check the page before a save or publish.
    pub fn validate(&self) -> Result<(), MemoriaError> {
        let mut errors = ValidationErrors::new();
        self.meta.validate_into(&mut errors);
        if self.meta.status == PageStatus::Published && self.blocks.is_empty() {
            errors.add("blocks", "a published page needs at least one block");
        }
        if let Some(Err(message)) = self.scene.as_ref().map(Scene::check) {
            errors.add("scene", message);
        }
        errors.into_result()
    }

    pub fn is_published(&self) -> bool {
        self.meta.status == PageStatus::Published
    }
}

/// Load/save contract for page storage.
///
/// Adapters do no retries and no conflict resolution; the last save wins.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Short adapter name for logs.
    fn name(&self) -> &'static str;

    /// Fetch a page. `Ok(None)` when the id is unknown.
    async fn load(&self, id: &PageId) -> Result<Option<PageContent>, MemoriaError>;

    /// Create (`id` = `None`) or overwrite a page; returns its id.
    async fn save(&self, id: Option<&PageId>, content: &PageContent)
    -> Result<PageId, MemoriaError>;
}
