use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use super::quadtree::Cell;

/// Squared distances below this are treated as this, which caps the
/// repulsion two nearly overlapping nodes can exchange in one tick.
const MIN_DISTANCE_SQ: f32 = 1.0;
const COINCIDENT_EPSILON_SQ: f32 = 1e-12;
const COINCIDENT_NUDGE: f32 = 1e-3;

pub(super) struct LinkSpring {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) strength: f32,
    pub(super) bias: f32,
}

/// Tiny deterministic separation for two points sitting on top of each other.
/// The pair gets opposite directions so they split apart.
fn coincident_offset(index: usize, other: usize) -> Vec2 {
    let (low, high) = (index.min(other), index.max(other));
    let angle = ((low as f32) * 0.618_034 + (high as f32) * 0.414_214) * TAU;
    let direction = vec2(angle.cos(), angle.sin()) * COINCIDENT_NUDGE;
    if index < other { direction } else { -direction }
}

fn charge_between(
    positions: &[Vec2],
    index: usize,
    other: usize,
    strength: f32,
) -> Vec2 {
    let mut delta = positions[other] - positions[index];
    if delta.length_sq() < COINCIDENT_EPSILON_SQ {
        delta = coincident_offset(index, other);
    }
    delta * (strength / delta.length_sq().max(MIN_DISTANCE_SQ))
}

fn accumulate_charge(
    cell: &Cell,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    theta: f32,
    velocity: &mut Vec2,
) {
    if cell.mass <= 0.0 {
        return;
    }

    if cell.is_leaf() {
        for &other in &cell.points {
            if other != index {
                *velocity += charge_between(positions, index, other, strength);
            }
        }
        return;
    }

    let point = positions[index];
    let delta = cell.center_of_mass - point;
    let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
    let far_enough =
        !cell.bounds.contains(point) && cell.bounds.side() / distance_sq.sqrt() < theta;

    if far_enough {
        *velocity += delta * (strength * cell.mass / distance_sq);
        return;
    }

    for child in cell.children() {
        accumulate_charge(child, index, positions, strength, theta, velocity);
    }
}

/// Many-body charge. A negative `strength` repels; magnitude falls off with
/// the inverse of distance. Every node emits, pinned or not.
pub(super) fn apply_charge(
    positions: &[Vec2],
    velocities: &mut [Vec2],
    strength: f32,
    theta: f32,
) {
    let Some(root) = Cell::build(positions) else {
        return;
    };

    for (index, velocity) in velocities.iter_mut().enumerate() {
        accumulate_charge(&root, index, positions, strength, theta, velocity);
    }
}

/// Spring toward `distance` along every link. Each link's pull is split
/// between its ends by degree so hubs move less than leaves.
pub(super) fn apply_springs(
    links: &[LinkSpring],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    distance: f32,
    alpha: f32,
) {
    for link in links {
        if link.source == link.target {
            continue;
        }

        let mut delta = (positions[link.target] + velocities[link.target])
            - (positions[link.source] + velocities[link.source]);
        if delta.length_sq() < COINCIDENT_EPSILON_SQ {
            delta = coincident_offset(link.source, link.target);
        }

        let length = delta.length();
        let stretch = (length - distance) / length * alpha * link.strength;
        let correction = delta * stretch;

        velocities[link.target] -= correction * link.bias;
        velocities[link.source] += correction * (1.0 - link.bias);
    }
}

/// Independent pull toward zero on each axis.
pub(super) fn apply_centering(positions: &[Vec2], velocities: &mut [Vec2], strength: f32) {
    for (position, velocity) in positions.iter().zip(velocities.iter_mut()) {
        *velocity -= *position * strength;
    }
}
