//! Source of generated topic graphs and per-node explanations.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::graph::GraphSnapshot;

pub trait ContentProducer: Send + Sync {
    /// Builds a graph for a free-text topic.
    fn generate(&self, topic: &str, api_key: &str) -> Result<GraphSnapshot>;

    /// Short explanation of one node in the context of `topic`.
    fn explain(&self, node_id: &str, topic: &str, api_key: &str) -> Result<String>;
}

const EXPLANATIONS_FILE: &str = "explanations.json";

/// Producer backed by a directory of pre-built snapshots, one
/// `<topic-slug>.json` file per topic, plus an optional `explanations.json`
/// table mapping node ids to explanation text.
#[derive(Clone, Debug)]
pub struct SnapshotLibrary {
    root: PathBuf,
}

pub(crate) fn topic_slug(topic: &str) -> String {
    let mut slug = String::with_capacity(topic.len());
    for ch in topic.trim().chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_owned()
}

impl SnapshotLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn load_topic(&self, topic: &str) -> Result<GraphSnapshot> {
        let slug = topic_slug(topic);
        if slug.is_empty() {
            bail!("topic {topic:?} is empty");
        }

        let path = self.root.join(format!("{slug}.json"));
        debug!(path = %path.display(), "loading topic snapshot");
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("no snapshot for topic {topic:?} at {}", path.display()))?;
        GraphSnapshot::from_json(&raw)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))
    }

    fn explanation_table(&self) -> Result<HashMap<String, String>> {
        let path = self.root.join(EXPLANATIONS_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read {}", path.display()));
            }
        };
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// First description of `node_id` found in any snapshot of the library,
    /// scanning files in name order. Unreadable snapshots are skipped.
    fn described_anywhere(&self, node_id: &str) -> Result<Option<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to list {}", self.root.display()));
            }
        };

        let mut paths = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter(|path| path.file_name().is_some_and(|name| name != EXPLANATIONS_FILE))
            .collect::<Vec<_>>();
        paths.sort();

        for path in paths {
            let snapshot = match fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|raw| GraphSnapshot::from_json(&raw))
            {
                Ok(snapshot) => snapshot,
                Err(error) => {
                    debug!(path = %path.display(), "skipping unreadable snapshot: {error:#}");
                    continue;
                }
            };
            if let Some(description) = snapshot.node(node_id).and_then(|node| node.description.clone()) {
                return Ok(Some(description));
            }
        }
        Ok(None)
    }
}

impl ContentProducer for SnapshotLibrary {
    fn generate(&self, topic: &str, _api_key: &str) -> Result<GraphSnapshot> {
        let snapshot = self.load_topic(topic)?;
        if snapshot.is_empty() {
            bail!("snapshot for topic {topic:?} has no nodes");
        }
        Ok(snapshot)
    }

    /// Looks in the explanations table first, then in every snapshot of the
    /// library, so nodes of the sample graph and of curriculum chapters can be
    /// explained too.
    fn explain(&self, node_id: &str, topic: &str, _api_key: &str) -> Result<String> {
        if let Some(text) = self.explanation_table()?.remove(node_id) {
            return Ok(text);
        }
        match self.described_anywhere(node_id)? {
            Some(text) => Ok(text),
            None => bail!("no explanation available for {node_id:?} in {topic:?}"),
        }
    }
}
