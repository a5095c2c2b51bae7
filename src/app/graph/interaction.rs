use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::{NodeDrag, ViewModel};

const MIN_HIT_RADIUS: f32 = 6.0;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.viewport.zoom_at(rect, pointer, zoom_factor);
    }

    /// Topmost node under `pointer`, using the last rendered frame.
    pub(in crate::app) fn node_at(&self, rect: Rect, pointer: Pos2) -> Option<String> {
        let frame = self.latest_frame.borrow();
        frame
            .nodes
            .iter()
            .filter_map(|node| {
                let center = self.viewport.world_to_screen(rect, node.position);
                let distance = center.distance(pointer);
                let hit_radius = (node.radius * self.viewport.zoom).max(MIN_HIT_RADIUS);
                (distance <= hit_radius).then_some((node, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(node, _)| node.id.clone())
    }

    /// Routes raw pointer input into the pin controller or the viewport.
    /// Returns true when a pin was added, moved or removed.
    pub(in crate::app) fn handle_graph_pointer(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) -> bool {
        let (pressed, released, primary_down, pointer) = ui.input(|input| {
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.pointer.primary_down(),
                input.pointer.interact_pos(),
            )
        });
        let mut pins_changed = false;

        if pressed
            && response.hovered()
            && let Some(pointer) = pointer
            && let Some(id) = self.node_at(rect, pointer)
            && self.controller.pointer_down(&mut self.simulation, &id)
        {
            let world = self.viewport.screen_to_world(rect, pointer);
            let node_position = self.simulation.position_of(&id).unwrap_or(world);
            self.node_drag = Some(NodeDrag {
                id,
                grab_offset: node_position - world,
            });
            pins_changed = true;
        }

        match self.node_drag.clone() {
            Some(drag) => {
                if response.dragged_by(egui::PointerButton::Primary)
                    && let Some(pointer) = pointer
                {
                    let target = self.viewport.screen_to_world(rect, pointer) + drag.grab_offset;
                    pins_changed |= self.controller.pointer_move(&mut self.simulation, &drag.id, target);
                }

                if released {
                    self.controller.pointer_up(&mut self.simulation, &drag.id);
                    self.node_drag = None;
                    pins_changed = true;
                } else if !primary_down && !pressed {
                    self.controller.cancel_gesture(&mut self.simulation);
                    self.node_drag = None;
                    pins_changed = true;
                }
            }
            None => {
                if response.dragged_by(egui::PointerButton::Primary)
                    || response.dragged_by(egui::PointerButton::Secondary)
                    || response.dragged_by(egui::PointerButton::Middle)
                {
                    self.viewport.pan_by(response.drag_delta());
                }
            }
        }

        pins_changed
    }
}
