//! Free/pinned state machine driven by pointer gestures on graph nodes.
//!
//! Pin state itself lives in the [`Simulation`]; the controller decides the
//! transitions and reports selection separately.

use std::collections::VecDeque;

use eframe::egui::Vec2;
use tracing::debug;

use crate::graph::Node;
use crate::physics::Simulation;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinState {
    Free,
    Pinned,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SelectionEvent {
    Selected(Node),
    Cleared,
}

#[derive(Clone, Debug)]
struct Gesture {
    node_id: String,
    was_pinned: bool,
    dragged: bool,
}

#[derive(Debug, Default)]
pub struct PinController {
    gesture: Option<Gesture>,
    events: VecDeque<SelectionEvent>,
}

impl PinController {
    pub fn state(&self, simulation: &Simulation, id: &str) -> PinState {
        if simulation.pin_of(id).is_some() {
            PinState::Pinned
        } else {
            PinState::Free
        }
    }

    /// Pins the node where it currently sits and selects it. The pin is
    /// provisional until the gesture turns out to be a drag.
    pub fn pointer_down(&mut self, simulation: &mut Simulation, id: &str) -> bool {
        let Some(position) = simulation.position_of(id) else {
            return false;
        };

        let was_pinned = simulation.pin_of(id).is_some();
        simulation.pin(id, position);
        self.gesture = Some(Gesture {
            node_id: id.to_owned(),
            was_pinned,
            dragged: false,
        });
        self.emit_selected(simulation, id);
        true
    }

    /// Moves the pin of a pinned node and wakes the layout. Free nodes
    /// ignore movement.
    pub fn pointer_move(&mut self, simulation: &mut Simulation, id: &str, position: Vec2) -> bool {
        if simulation.pin_of(id).is_none() {
            return false;
        }

        if let Some(gesture) = self.gesture.as_mut().filter(|g| g.node_id == id) {
            gesture.dragged = true;
        }
        simulation.pin(id, position);
        simulation.restart();
        true
    }

    /// Ends the gesture. Without intervening movement this is a click;
    /// after a drag the node stays pinned where it was dropped.
    pub fn pointer_up(&mut self, simulation: &mut Simulation, id: &str) {
        let dragged = self
            .gesture
            .as_ref()
            .is_some_and(|gesture| gesture.node_id == id && gesture.dragged);

        if dragged {
            self.gesture = None;
            debug!(id, "node pinned by drag");
        } else {
            self.click(simulation, id);
        }
    }

    /// Selects the node and leaves it free. A node pinned before the gesture
    /// is released; the provisional pin of a free node is rolled back.
    pub fn click(&mut self, simulation: &mut Simulation, id: &str) {
        let gesture = self.gesture.take().filter(|gesture| gesture.node_id == id);
        let was_pinned = gesture.as_ref().map_or_else(
            || simulation.pin_of(id).is_some(),
            |gesture| gesture.was_pinned,
        );

        if simulation.unpin(id) && was_pinned {
            simulation.restart();
            debug!(id, "node released");
        }
        self.emit_selected(simulation, id);
    }

    /// Drops an in-flight gesture, e.g. when the pointer leaves the canvas.
    /// A drag in progress keeps its pin.
    pub fn cancel_gesture(&mut self, simulation: &mut Simulation) {
        if let Some(gesture) = self.gesture.take()
            && !gesture.dragged
            && !gesture.was_pinned
        {
            simulation.unpin(&gesture.node_id);
        }
    }

    /// Call after a snapshot swap: forgets gestures on vanished nodes and
    /// clears the selection.
    pub fn reset(&mut self, simulation: &Simulation) {
        if self
            .gesture
            .as_ref()
            .is_some_and(|gesture| !simulation.contains(&gesture.node_id))
        {
            self.gesture = None;
        }
        self.events.push_back(SelectionEvent::Cleared);
    }

    pub fn dragging(&self) -> Option<&str> {
        self.gesture
            .as_ref()
            .filter(|gesture| gesture.dragged)
            .map(|gesture| gesture.node_id.as_str())
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = SelectionEvent> + '_ {
        self.events.drain(..)
    }

    fn emit_selected(&mut self, simulation: &Simulation, id: &str) {
        if let Some(node) = simulation.node_record(id) {
            self.events.push_back(SelectionEvent::Selected(node));
        }
    }
}
