mod sample;

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use eframe::egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};

pub use sample::sample_snapshot;

/// Radius used when a producer leaves it out or hands us a non-positive value.
pub const DEFAULT_NODE_RADIUS: f32 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl From<Point> for Vec2 {
    fn from(point: Point) -> Self {
        vec2(point.x, point.y)
    }
}

impl From<Vec2> for Point {
    fn from(value: Vec2) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub group: String,
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_radius() -> f32 {
    DEFAULT_NODE_RADIUS
}

impl Node {
    pub fn new(id: impl Into<String>, group: impl Into<String>, radius: f32) -> Self {
        Self {
            id: id.into(),
            group: group.into(),
            radius,
            position: None,
            pin: None,
            description: None,
        }
    }

    /// Radius safe to draw and to offset labels with.
    pub fn display_radius(&self) -> f32 {
        if self.radius.is_finite() && self.radius > 0.0 {
            self.radius
        } else {
            DEFAULT_NODE_RADIUS
        }
    }
}

/// An edge between two node ids. Endpoints are resolved against the node set
/// only when the simulation ingests the snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>, label: Option<&str>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: label.map(str::to_owned),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl GraphSnapshot {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid graph snapshot JSON")
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sorted unique group tags, used for the legend.
    pub fn groups(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|node| node.group.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
