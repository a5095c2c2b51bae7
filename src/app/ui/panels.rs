use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use eframe::egui::{self, Align, Align2, Color32, Context, Layout, vec2};

use crate::interaction::PinController;
use crate::physics::{Simulation, TickFrame};
use crate::viewport::Viewport;

use super::super::{AppConfig, Explanation, ViewModel};

const ERROR_FILL: Color32 = Color32::from_rgb(159, 18, 57);

impl ViewModel {
    pub(in crate::app) fn new(config: AppConfig) -> Self {
        let mut simulation = Simulation::new(config.physics);
        let latest_frame = Rc::new(RefCell::new(TickFrame::default()));
        let sink = Rc::clone(&latest_frame);
        simulation.on_tick(move |frame| sink.borrow_mut().clone_from(frame));

        let api_key = config.key_store.initial_key();

        Self {
            catalog: config.catalog,
            producer: config.producer,
            key_store: config.key_store,
            simulation,
            controller: PinController::default(),
            latest_frame,
            viewport: Viewport::default(),
            node_drag: None,
            groups: Vec::new(),
            topic: String::new(),
            topic_input: String::new(),
            search: String::new(),
            selected: None,
            explanation: Explanation::Idle,
            api_key_draft: api_key.clone(),
            api_key,
            error: None,
            generation_rx: None,
            explanation_rx: None,
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        self.poll_workers();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Sticky Graph");
                    ui.separator();
                    ui.label(format!("topic: {}", self.topic));
                    ui.label(format!("nodes: {}", self.simulation.node_count()));
                    if ui.button("Reset view").clicked() {
                        self.viewport.reset();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if self.simulation.is_settled() {
                            ui.label("settled");
                        } else {
                            ui.label(format!("alpha: {:.3}", self.simulation.alpha()));
                        }
                        ui.label(format!("zoom: {:.2}", self.viewport.zoom));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));

        self.draw_error_toast(ctx);

        if self.workers_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn draw_error_toast(&mut self, ctx: &Context) {
        let Some(message) = self.error.clone() else {
            return;
        };

        let mut dismissed = false;
        egui::Area::new(egui::Id::new("error_toast"))
            .anchor(Align2::CENTER_TOP, vec2(0.0, 48.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .fill(ERROR_FILL)
                    .show(ui, |ui| {
                        ui.set_max_width(520.0);
                        ui.horizontal(|ui| {
                            ui.colored_label(Color32::WHITE, message);
                            if ui.button("Dismiss").clicked() {
                                dismissed = true;
                            }
                        });
                    });
            });

        if dismissed {
            self.error = None;
        }
    }
}
