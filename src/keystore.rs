use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::{info, warn};

const KEY_FILE_NAME: &str = "api_key";
const KEY_ENV_VAR: &str = "API_KEY";

/// Persists the content producer credential. The value is opaque: it is
/// stored and returned byte for byte and never inspected.
#[derive(Clone, Debug)]
pub struct KeyStore {
    path: Option<PathBuf>,
}

impl KeyStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Store under the platform config directory, or memory-only when the
    /// platform has none.
    pub fn default_location() -> Self {
        let path = ProjectDirs::from("org", "sticky-graph", "sticky-graph")
            .map(|dirs| dirs.config_dir().join(KEY_FILE_NAME));
        if path.is_none() {
            warn!("no config directory available; API key will not be persisted");
        }
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn load(&self) -> Result<Option<String>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };

        match fs::read_to_string(path) {
            Ok(key) => Ok(Some(key)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error)
                .with_context(|| format!("failed to read API key from {}", path.display())),
        }
    }

    pub fn save(&self, key: &str) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, key)
            .with_context(|| format!("failed to write API key to {}", path.display()))?;
        info!(path = %path.display(), "saved API key");
        Ok(())
    }

    /// Stored key, else the `API_KEY` environment variable, else empty.
    pub fn initial_key(&self) -> String {
        match self.load() {
            Ok(Some(key)) => return key,
            Ok(None) => {}
            Err(error) => warn!("{error:#}"),
        }
        env::var(KEY_ENV_VAR).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::at(dir.path().join("absent"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn saved_key_round_trips_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::at(dir.path().join("nested").join(KEY_FILE_NAME));

        store.save("  sk-opaque value\n").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("  sk-opaque value\n"));
        assert_eq!(store.initial_key(), "  sk-opaque value\n");
    }

    #[test]
    fn memory_only_store_accepts_saves() {
        let store = KeyStore { path: None };
        store.save("anything").unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert!(store.path().is_none());
    }
}
