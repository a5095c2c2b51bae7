use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use super::Chapter;

const BUNDLED_CATALOG: &str = include_str!("../../assets/chapters.json");

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no chapter titled {0:?} in the catalog")]
    UnknownTitle(String),
}

/// Fixed list of curriculum chapters, looked up by title.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    chapters: Vec<Chapter>,
}

impl Catalog {
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_CATALOG).context("bundled chapter catalog is malformed")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read chapter catalog {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("failed to parse chapter catalog {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let chapters: Vec<Chapter> =
            serde_json::from_str(raw).context("invalid chapter catalog JSON")?;
        Ok(Self { chapters })
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.chapters.iter().map(|chapter| chapter.title.as_str())
    }

    pub fn find(&self, title: &str) -> Result<&Chapter, CatalogError> {
        self.chapters
            .iter()
            .find(|chapter| chapter.title == title)
            .ok_or_else(|| CatalogError::UnknownTitle(title.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}
