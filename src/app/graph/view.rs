use std::rc::Rc;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};

use crate::palette::{blend_color, group_color};

use super::super::ViewModel;
use super::super::render_utils::{circle_visible, draw_background, segment_visible};

const LINK_COLOR: Color32 = Color32::from_rgba_premultiplied(59, 64, 74, 102);
const LINK_LABEL_COLOR: Color32 = Color32::from_rgb(148, 163, 184);
const NODE_LABEL_COLOR: Color32 = Color32::from_rgb(226, 232, 240);
const NODE_OUTLINE: Color32 = Color32::from_rgba_premultiplied(204, 204, 204, 204);
const PIN_OUTLINE: Color32 = Color32::from_rgb(244, 63, 94);
const SELECTION_HALO: Color32 = Color32::from_rgb(250, 204, 21);
const LINK_LABEL_SIZE: f32 = 10.0;
const MIN_READABLE_FONT: f32 = 6.0;

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, &self.viewport);

        // Gestures land before the next step so a tick never runs on a half-applied pin.
        self.handle_graph_zoom(ui, rect, &response);
        let pins_changed = self.handle_graph_pointer(ui, rect, &response);
        self.apply_selection_events();

        let ticked = self.simulation.step();
        if !ticked && pins_changed {
            *self.latest_frame.borrow_mut() = self.simulation.frame();
        }
        if ticked || self.node_drag.is_some() {
            ui.ctx().request_repaint();
        }

        let latest_frame = Rc::clone(&self.latest_frame);
        let frame = latest_frame.borrow();
        if frame.nodes.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No nodes to display",
                FontId::proportional(16.0),
                LINK_LABEL_COLOR,
            );
            return;
        }

        let hovered = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer))
            .and_then(|pointer| self.node_at(rect, pointer));
        let selected_id = self.selected.as_ref().map(|node| node.id.as_str());
        let zoom = self.viewport.zoom;

        let link_width = (1.5 * zoom).clamp(0.6, 3.0);
        let link_font = LINK_LABEL_SIZE * zoom;
        let focused = hovered.as_deref().or(selected_id);
        for link in &frame.links {
            let start = self.viewport.world_to_screen(rect, link.from);
            let end = self.viewport.world_to_screen(rect, link.to);
            if !segment_visible(rect, start, end, 2.0) {
                continue;
            }

            let touches_focus = focused.is_some_and(|id| {
                frame.nodes[link.source].id == id || frame.nodes[link.target].id == id
            });
            let stroke = if touches_focus {
                Stroke::new(link_width * 1.8, LINK_LABEL_COLOR)
            } else {
                Stroke::new(link_width, LINK_COLOR)
            };
            painter.line_segment([start, end], stroke);

            if link_font >= MIN_READABLE_FONT
                && let Some(label) = &link.label
            {
                painter.text(
                    start + ((end - start) * 0.5),
                    Align2::CENTER_CENTER,
                    label,
                    FontId::proportional(link_font),
                    LINK_LABEL_COLOR,
                );
            }
        }

        for node in &frame.nodes {
            let center = self.viewport.world_to_screen(rect, node.position);
            let radius = node.radius * zoom;
            if !circle_visible(rect, center, radius + 4.0) {
                continue;
            }

            let is_hovered = hovered.as_deref() == Some(node.id.as_str());
            let is_selected = selected_id == Some(node.id.as_str());
            let mut fill = group_color(&node.group);
            if is_hovered {
                fill = blend_color(fill, Color32::WHITE, 0.25);
            }

            if is_selected {
                painter.circle_filled(
                    center,
                    radius + (6.0 * zoom).max(3.0),
                    SELECTION_HALO.gamma_multiply(0.35),
                );
            }
            painter.circle_filled(center, radius, fill);

            let outline = if node.pinned {
                Stroke::new((3.0 * zoom).max(1.5), PIN_OUTLINE)
            } else {
                Stroke::new((2.0 * zoom).max(1.0), NODE_OUTLINE)
            };
            painter.circle_stroke(center, radius, outline);

            let font_size = (node.radius / 1.5).max(12.0) * zoom;
            let label_size = if font_size >= MIN_READABLE_FONT {
                font_size
            } else if is_hovered || is_selected {
                11.0
            } else {
                continue;
            };
            painter.text(
                center + vec2((node.radius + 8.0) * zoom, 4.0 * zoom),
                Align2::LEFT_CENTER,
                &node.id,
                FontId::proportional(label_size),
                NODE_LABEL_COLOR,
            );
        }

        if self.controller.dragging().is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        } else if let Some(id) = &hovered {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
            let pinned = frame
                .nodes
                .iter()
                .any(|node| node.pinned && &node.id == id);
            let hint = if pinned {
                format!("{id}  (pinned, click to release)")
            } else {
                format!("{id}  (drag to pin)")
            };
            painter.text(
                rect.left_top() + vec2(12.0, 12.0),
                Align2::LEFT_TOP,
                hint,
                FontId::proportional(13.0),
                NODE_LABEL_COLOR,
            );
        }
    }
}
