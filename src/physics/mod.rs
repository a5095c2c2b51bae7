//! Force-directed layout engine with per-node pin overrides.
//!
//! The engine owns a private copy of the ingested snapshot laid out as
//! parallel arrays indexed by node slot; links refer to slots, never to node
//! records. Outside code reads positions through [`TickFrame`] copies and
//! writes only through [`Simulation::pin`] / [`Simulation::unpin`].

mod forces;
mod quadtree;

use std::collections::HashMap;
use std::f32::consts::PI;

use eframe::egui::{Vec2, vec2};
use tracing::{debug, info, warn};

use crate::graph::{GraphSnapshot, Node};
use forces::{LinkSpring, apply_centering, apply_charge, apply_springs};

const SEED_RADIUS: f32 = 10.0;

#[derive(Clone, Copy, Debug)]
pub struct SimulationConfig {
    /// Many-body strength; negative repels.
    pub charge_strength: f32,
    pub link_distance: f32,
    pub center_strength: f32,
    /// Fraction of velocity lost per tick.
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub alpha_target: f32,
    pub theta: f32,
    /// Pins are clamped to `[-pin_bound, pin_bound]` on both axes.
    pub pin_bound: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            charge_strength: -2000.0,
            link_distance: 250.0,
            center_strength: 0.015,
            velocity_decay: 0.4,
            alpha_min,
            // Reaches alpha_min from 1.0 in roughly 300 ticks.
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            alpha_target: 0.0,
            theta: 0.9,
            pin_bound: 10_000.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeFrame {
    pub id: String,
    pub group: String,
    pub radius: f32,
    pub position: Vec2,
    pub pinned: bool,
}

/// A link with both endpoints resolved. `source` and `target` index into
/// [`TickFrame::nodes`].
#[derive(Clone, Debug, PartialEq)]
pub struct LinkFrame {
    pub source: usize,
    pub target: usize,
    pub from: Vec2,
    pub to: Vec2,
    pub label: Option<String>,
}

/// Read-only copy of the layout handed to tick listeners.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickFrame {
    pub nodes: Vec<NodeFrame>,
    pub links: Vec<LinkFrame>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub nodes: usize,
    pub links: usize,
    pub dropped_links: usize,
    pub duplicate_nodes: usize,
    pub carried_pins: usize,
}

type TickListener = Box<dyn FnMut(&TickFrame)>;

pub struct Simulation {
    config: SimulationConfig,
    records: Vec<Node>,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    pins: Vec<Option<Vec2>>,
    labels: Vec<Option<String>>,
    springs: Vec<LinkSpring>,
    index_by_id: HashMap<String, usize>,
    alpha: f32,
    stopped: bool,
    listeners: Vec<TickListener>,
}

/// Sunflower spiral used for nodes that arrive without a position.
fn seed_position(index: usize) -> Vec2 {
    let radius = SEED_RADIUS * (0.5 + index as f32).sqrt();
    let angle = index as f32 * PI * (3.0 - 5.0_f32.sqrt());
    vec2(radius * angle.cos(), radius * angle.sin())
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
            positions: Vec::new(),
            velocities: Vec::new(),
            pins: Vec::new(),
            labels: Vec::new(),
            springs: Vec::new(),
            index_by_id: HashMap::new(),
            alpha: 1.0,
            stopped: false,
            listeners: Vec::new(),
        }
    }

    /// Replaces the working node/link set with a private copy of `snapshot`.
    ///
    /// Live pins survive for ids still present and are dropped otherwise. A
    /// snapshot node's own `pin` applies only when no live pin exists. Links
    /// naming an unknown id are dropped; duplicate links are kept.
    pub fn ingest(&mut self, snapshot: &GraphSnapshot) -> IngestSummary {
        let live_pins = self
            .index_by_id
            .iter()
            .filter_map(|(id, &index)| self.pins[index].map(|pin| (id.clone(), pin)))
            .collect::<HashMap<_, _>>();

        let node_count = snapshot.nodes.len();
        let mut summary = IngestSummary::default();
        let mut records = Vec::with_capacity(node_count);
        let mut positions = Vec::with_capacity(node_count);
        let mut pins = Vec::with_capacity(node_count);
        let mut index_by_id = HashMap::with_capacity(node_count);

        for node in &snapshot.nodes {
            if index_by_id.contains_key(&node.id) {
                summary.duplicate_nodes += 1;
                warn!(id = %node.id, "ignoring duplicate node id in snapshot");
                continue;
            }

            let index = records.len();
            let live_pin = live_pins.get(&node.id).copied();
            if live_pin.is_some() {
                summary.carried_pins += 1;
            }
            let pin = live_pin.or_else(|| node.pin.map(|pin| self.clamp(pin.into())));
            let position = pin
                .or_else(|| node.position.map(Vec2::from))
                .unwrap_or_else(|| seed_position(index));

            index_by_id.insert(node.id.clone(), index);
            records.push(node.clone());
            positions.push(position);
            pins.push(pin);
        }

        let mut degree = vec![0usize; records.len()];
        let mut springs = Vec::with_capacity(snapshot.links.len());
        let mut labels = Vec::with_capacity(snapshot.links.len());
        for link in &snapshot.links {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&link.source), index_by_id.get(&link.target))
            else {
                summary.dropped_links += 1;
                debug!(
                    source = %link.source,
                    target = %link.target,
                    "dropping link with unknown endpoint"
                );
                continue;
            };

            degree[source] += 1;
            degree[target] += 1;
            springs.push(LinkSpring {
                source,
                target,
                strength: 0.0,
                bias: 0.0,
            });
            labels.push(link.label.clone());
        }

        for spring in &mut springs {
            let source_degree = degree[spring.source] as f32;
            let target_degree = degree[spring.target] as f32;
            spring.strength = 1.0 / source_degree.min(target_degree);
            spring.bias = source_degree / (source_degree + target_degree);
        }

        summary.nodes = records.len();
        summary.links = springs.len();

        self.velocities = vec![Vec2::ZERO; records.len()];
        self.records = records;
        self.positions = positions;
        self.pins = pins;
        self.labels = labels;
        self.springs = springs;
        self.index_by_id = index_by_id;
        self.alpha = 1.0;

        info!(
            nodes = summary.nodes,
            links = summary.links,
            dropped_links = summary.dropped_links,
            duplicate_nodes = summary.duplicate_nodes,
            carried_pins = summary.carried_pins,
            discarded_pins = live_pins.len() - summary.carried_pins,
            "ingested graph snapshot"
        );
        summary
    }

    /// Registers a callback run after every integration step.
    pub fn on_tick(&mut self, listener: impl FnMut(&TickFrame) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Puts the settling energy back to its maximum without touching topology.
    pub fn restart(&mut self) {
        self.alpha = 1.0;
    }

    /// Tears the loop down: no further ticks run and listeners are released.
    pub fn stop(&mut self) {
        if !self.stopped {
            debug!("stopping simulation");
        }
        self.stopped = true;
        self.listeners.clear();
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < self.config.alpha_min
    }

    /// Advances one tick if there is energy left. Returns whether it ticked.
    pub fn step(&mut self) -> bool {
        if self.stopped || self.is_settled() {
            return false;
        }

        self.tick();

        if !self.listeners.is_empty() {
            let frame = self.frame();
            for listener in &mut self.listeners {
                listener(&frame);
            }
        }
        true
    }

    fn tick(&mut self) {
        let config = self.config;
        self.alpha += (config.alpha_target - self.alpha) * config.alpha_decay;
        let alpha = self.alpha;

        apply_charge(
            &self.positions,
            &mut self.velocities,
            config.charge_strength * alpha,
            config.theta,
        );
        apply_springs(
            &self.springs,
            &self.positions,
            &mut self.velocities,
            config.link_distance,
            alpha,
        );
        apply_centering(
            &self.positions,
            &mut self.velocities,
            config.center_strength * alpha,
        );

        let retain = 1.0 - config.velocity_decay;
        for ((position, velocity), pin) in self
            .positions
            .iter_mut()
            .zip(self.velocities.iter_mut())
            .zip(&self.pins)
        {
            if let Some(pin) = pin {
                *position = *pin;
                *velocity = Vec2::ZERO;
            } else {
                *velocity *= retain;
                *position += *velocity;
            }
        }
    }

    pub fn frame(&self) -> TickFrame {
        let nodes = self
            .records
            .iter()
            .zip(&self.positions)
            .zip(&self.pins)
            .map(|((record, position), pin)| NodeFrame {
                id: record.id.clone(),
                group: record.group.clone(),
                radius: record.display_radius(),
                position: *position,
                pinned: pin.is_some(),
            })
            .collect();

        let links = self
            .springs
            .iter()
            .zip(&self.labels)
            .map(|(spring, label)| LinkFrame {
                source: spring.source,
                target: spring.target,
                from: self.positions[spring.source],
                to: self.positions[spring.target],
                label: label.clone(),
            })
            .collect();

        TickFrame {
            nodes,
            links,
        }
    }

    fn clamp(&self, point: Vec2) -> Vec2 {
        let bound = self.config.pin_bound;
        vec2(point.x.clamp(-bound, bound), point.y.clamp(-bound, bound))
    }

    /// Holds `id` at `point` (clamped). Returns false for unknown ids.
    pub fn pin(&mut self, id: &str, point: Vec2) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        let point = self.clamp(point);
        self.pins[index] = Some(point);
        self.positions[index] = point;
        self.velocities[index] = Vec2::ZERO;
        true
    }

    /// Returns the node to free motion. Returns whether a pin was removed.
    pub fn unpin(&mut self, id: &str) -> bool {
        self.index_by_id
            .get(id)
            .and_then(|&index| self.pins[index].take())
            .is_some()
    }

    pub fn pin_of(&self, id: &str) -> Option<Vec2> {
        self.index_by_id.get(id).and_then(|&index| self.pins[index])
    }

    pub fn position_of(&self, id: &str) -> Option<Vec2> {
        self.index_by_id.get(id).map(|&index| self.positions[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    /// Full node record with its live position and pin.
    pub fn node_record(&self, id: &str) -> Option<Node> {
        let &index = self.index_by_id.get(id)?;
        let mut node = self.records[index].clone();
        node.position = Some(self.positions[index].into());
        node.pin = self.pins[index].map(Into::into);
        Some(node)
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn node_count(&self) -> usize {
        self.records.len()
    }
}
