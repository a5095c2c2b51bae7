use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use eframe::egui::{Context, Vec2};
use tracing::warn;

use crate::curriculum::Catalog;
use crate::graph::{GraphSnapshot, Node, sample_snapshot};
use crate::interaction::PinController;
use crate::keystore::KeyStore;
use crate::physics::{Simulation, SimulationConfig, TickFrame};
use crate::producer::ContentProducer;
use crate::viewport::Viewport;

mod graph;
mod render_utils;
mod session;
mod ui;

const SAMPLE_TOPIC: &str = "Glycolysis";

pub struct AppConfig {
    pub catalog: Catalog,
    pub producer: Arc<dyn ContentProducer>,
    pub key_store: KeyStore,
    pub physics: SimulationConfig,
    pub initial_chapter: Option<String>,
}

pub struct StickyGraphApp {
    model: ViewModel,
}

struct ViewModel {
    catalog: Catalog,
    producer: Arc<dyn ContentProducer>,
    key_store: KeyStore,
    simulation: Simulation,
    controller: PinController,
    latest_frame: Rc<RefCell<TickFrame>>,
    viewport: Viewport,
    node_drag: Option<NodeDrag>,
    groups: Vec<String>,
    topic: String,
    topic_input: String,
    search: String,
    selected: Option<Node>,
    explanation: Explanation,
    api_key: String,
    api_key_draft: String,
    error: Option<String>,
    generation_rx: Option<Receiver<Result<(String, GraphSnapshot), String>>>,
    explanation_rx: Option<Receiver<ExplanationReply>>,
}

#[derive(Clone)]
struct NodeDrag {
    id: String,
    grab_offset: Vec2,
}

enum Explanation {
    Idle,
    Loading,
    Ready(String),
    Failed(String),
}

struct ExplanationReply {
    node_id: String,
    result: Result<String, String>,
}

impl StickyGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let initial_chapter = config.initial_chapter.clone();
        let mut model = ViewModel::new(config);

        let initial = initial_chapter.map(|title| model.chapter_snapshot(&title));
        match initial {
            Some(Ok((snapshot, topic))) => model.replace_snapshot(snapshot, topic),
            Some(Err(error)) => {
                warn!("{error:#}");
                model.replace_snapshot(sample_snapshot(), SAMPLE_TOPIC.to_owned());
                model.error = Some(format!("{error:#}"));
            }
            None => model.replace_snapshot(sample_snapshot(), SAMPLE_TOPIC.to_owned()),
        }

        Self { model }
    }
}

impl eframe::App for StickyGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.model.show(ctx);
    }
}

impl Drop for StickyGraphApp {
    fn drop(&mut self) {
        self.model.simulation.stop();
    }
}
