use eframe::egui::{self, Color32, RichText, Sense, Ui, vec2};

use crate::interaction::PinState;
use crate::palette::group_color;

use super::super::{Explanation, ViewModel};

const FAILURE_TEXT: Color32 = Color32::from_rgb(251, 113, 133);

fn color_swatch(ui: &mut Ui, color: Color32) {
    let (rect, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
    ui.painter().circle_filled(rect.center(), 5.5, color);
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.draw_selection(ui);
                ui.separator();
                self.draw_legend(ui);
            });
    }

    fn draw_selection(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Selection").strong());

        let Some(node) = self.selected.clone() else {
            ui.weak("Click a node to see its details. Drag a node to pin it in place.");
            return;
        };

        ui.horizontal(|ui| {
            color_swatch(ui, group_color(&node.group));
            ui.label(RichText::new(&node.id).size(17.0).strong());
        });
        if !node.group.is_empty() {
            ui.label(format!("group: {}", node.group));
        }

        let pinned = self.controller.state(&self.simulation, &node.id) == PinState::Pinned;
        ui.horizontal(|ui| {
            if pinned {
                ui.label("pinned");
                if ui.button("Release").clicked() {
                    self.controller.click(&mut self.simulation, &node.id);
                }
            } else {
                ui.weak("free");
            }
        });

        ui.add_space(6.0);
        match &self.explanation {
            Explanation::Idle => {}
            Explanation::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Fetching explanation...");
                });
            }
            Explanation::Ready(text) => {
                ui.label(text.as_str());
            }
            Explanation::Failed(message) => {
                ui.colored_label(FAILURE_TEXT, message.as_str());
            }
        }
    }

    fn draw_legend(&self, ui: &mut Ui) {
        ui.label(RichText::new("Groups").strong());
        if self.groups.is_empty() {
            ui.weak("No groups in this graph");
            return;
        }

        for group in &self.groups {
            ui.horizontal(|ui| {
                color_swatch(ui, group_color(group));
                if group.is_empty() {
                    ui.weak("ungrouped");
                } else {
                    ui.label(group.as_str());
                }
            });
        }
    }
}
