use std::sync::Arc;
use std::sync::mpsc::{self, TryRecvError};
use std::thread;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::curriculum::transform_chapter;
use crate::graph::{GraphSnapshot, Node};
use crate::interaction::SelectionEvent;

use super::{Explanation, ExplanationReply, ViewModel};

impl ViewModel {
    pub(in crate::app) fn chapter_snapshot(&self, title: &str) -> Result<(GraphSnapshot, String)> {
        let chapter = self.catalog.find(title)?;
        let snapshot = transform_chapter(chapter)
            .with_context(|| format!("chapter {title:?} has a malformed concept tree"))?;
        Ok((snapshot, chapter.title.clone()))
    }

    /// Swaps the displayed graph. Pins of surviving node ids carry over.
    pub(in crate::app) fn replace_snapshot(&mut self, snapshot: GraphSnapshot, topic: String) {
        self.simulation.ingest(&snapshot);
        self.controller.reset(&self.simulation);
        *self.latest_frame.borrow_mut() = self.simulation.frame();
        self.node_drag = None;
        self.viewport.reset();
        self.groups = snapshot.groups();
        self.topic = topic;
        self.set_selected(None);
    }

    pub(in crate::app) fn open_chapter(&mut self, title: &str) {
        match self.chapter_snapshot(title) {
            Ok((snapshot, topic)) => {
                info!(chapter = %topic, nodes = snapshot.nodes.len(), "opened chapter");
                self.error = None;
                self.replace_snapshot(snapshot, topic);
            }
            Err(error) => {
                warn!("{error:#}");
                self.error = Some(format!("{error:#}"));
            }
        }
    }

    pub(in crate::app) fn start_generation(&mut self) {
        let topic = self.topic_input.trim().to_owned();
        if topic.is_empty() || self.generation_rx.is_some() {
            return;
        }
        if self.api_key.is_empty() {
            self.error = Some("Please configure your API key in settings first.".to_owned());
            return;
        }

        self.error = None;
        let producer = Arc::clone(&self.producer);
        let api_key = self.api_key.clone();
        let (tx, rx) = mpsc::channel();

        info!(%topic, "requesting generated graph");
        thread::spawn(move || {
            let result = producer
                .generate(&topic, &api_key)
                .map(|snapshot| (topic, snapshot))
                .map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });
        self.generation_rx = Some(rx);
    }

    fn request_explanation(&mut self, node_id: String) {
        if self.api_key.is_empty() {
            self.explanation =
                Explanation::Failed("Add an API key in settings to fetch explanations.".to_owned());
            return;
        }

        let producer = Arc::clone(&self.producer);
        let api_key = self.api_key.clone();
        let topic = self.topic.clone();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = producer
                .explain(&node_id, &topic, &api_key)
                .map_err(|error| format!("{error:#}"));
            let _ = tx.send(ExplanationReply { node_id, result });
        });
        self.explanation = Explanation::Loading;
        self.explanation_rx = Some(rx);
    }

    pub(in crate::app) fn poll_workers(&mut self) {
        if let Some(rx) = self.generation_rx.take() {
            match rx.try_recv() {
                Ok(Ok((topic, snapshot))) => {
                    info!(%topic, nodes = snapshot.nodes.len(), "generated graph received");
                    self.replace_snapshot(snapshot, topic);
                }
                Ok(Err(error)) => {
                    warn!(%error, "graph generation failed");
                    self.error = Some(format!(
                        "Failed to generate graph. Check your API key or try a different topic. ({error})"
                    ));
                }
                Err(TryRecvError::Empty) => self.generation_rx = Some(rx),
                Err(TryRecvError::Disconnected) => {
                    self.error = Some("Graph generation worker disconnected".to_owned());
                }
            }
        }

        if let Some(rx) = self.explanation_rx.take() {
            match rx.try_recv() {
                Ok(reply) => {
                    let current = self.selected.as_ref().map(|node| node.id.as_str());
                    if current == Some(reply.node_id.as_str()) {
                        self.explanation = match reply.result {
                            Ok(text) => Explanation::Ready(text),
                            Err(error) => {
                                warn!(node = %reply.node_id, %error, "explanation failed");
                                Explanation::Failed(format!("Could not load an explanation: {error}"))
                            }
                        };
                    }
                }
                Err(TryRecvError::Empty) => self.explanation_rx = Some(rx),
                Err(TryRecvError::Disconnected) => {
                    self.explanation = Explanation::Failed("Explanation worker disconnected".to_owned());
                }
            }
        }
    }

    pub(in crate::app) fn workers_busy(&self) -> bool {
        self.generation_rx.is_some() || self.explanation_rx.is_some()
    }

    pub(in crate::app) fn set_selected(&mut self, node: Option<Node>) {
        let same_node = self.selected.as_ref().map(|n| n.id.as_str())
            == node.as_ref().map(|n| n.id.as_str());
        self.selected = node;
        if same_node {
            return;
        }

        self.explanation = Explanation::Idle;
        self.explanation_rx = None;
        let Some(node) = &self.selected else {
            return;
        };
        let node_id = node.id.clone();

        match node.description.clone() {
            Some(description) => self.explanation = Explanation::Ready(description),
            None => self.request_explanation(node_id),
        }
    }

    pub(in crate::app) fn select_node(&mut self, id: &str) {
        let node = self.simulation.node_record(id);
        self.set_selected(node);
    }

    pub(in crate::app) fn apply_selection_events(&mut self) {
        let events = self.controller.drain_events().collect::<Vec<_>>();
        for event in events {
            match event {
                SelectionEvent::Selected(node) => self.set_selected(Some(node)),
                SelectionEvent::Cleared => self.set_selected(None),
            }
        }
    }

    pub(in crate::app) fn save_api_key(&mut self) {
        self.api_key = self.api_key_draft.clone();
        if let Err(error) = self.key_store.save(&self.api_key) {
            warn!("{error:#}");
            self.error = Some(format!("{error:#}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use anyhow::anyhow;

    use super::*;
    use crate::app::AppConfig;
    use crate::curriculum::Catalog;
    use crate::graph::sample_snapshot;
    use crate::keystore::KeyStore;
    use crate::physics::SimulationConfig;
    use crate::producer::ContentProducer;

    #[derive(Default)]
    struct StubProducer {
        snapshot: Option<GraphSnapshot>,
        generate_calls: AtomicUsize,
        explain_calls: AtomicUsize,
    }

    impl ContentProducer for StubProducer {
        fn generate(&self, _topic: &str, _api_key: &str) -> Result<GraphSnapshot> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            self.snapshot.clone().ok_or_else(|| anyhow!("boom"))
        }

        fn explain(&self, node_id: &str, _topic: &str, _api_key: &str) -> Result<String> {
            self.explain_calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("about {node_id}"))
        }
    }

    fn model_with(producer: Arc<StubProducer>) -> (tempfile::TempDir, ViewModel) {
        let dir = tempfile::tempdir().unwrap();
        let mut model = ViewModel::new(AppConfig {
            catalog: Catalog::bundled().unwrap(),
            producer,
            key_store: KeyStore::at(dir.path().join("api_key")),
            physics: SimulationConfig::default(),
            initial_chapter: None,
        });
        model.replace_snapshot(sample_snapshot(), "Glycolysis".to_owned());
        model.api_key = "secret".to_owned();
        (dir, model)
    }

    fn wait_for_workers(model: &mut ViewModel) {
        for _ in 0..500 {
            model.poll_workers();
            if !model.workers_busy() {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("workers did not finish");
    }

    fn two_node_snapshot() -> GraphSnapshot {
        GraphSnapshot::from_json(
            r#"{"nodes": [{"id": "Light", "group": "Input"}, {"id": "Leaf", "group": "Organ"}],
                "links": [{"source": "Light", "target": "Leaf", "label": "hits"}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn failed_generation_keeps_previous_graph() {
        let producer = Arc::new(StubProducer::default());
        let (_dir, mut model) = model_with(Arc::clone(&producer));
        model.topic_input = "Photosynthesis".to_owned();

        model.start_generation();
        wait_for_workers(&mut model);

        assert_eq!(producer.generate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(model.simulation.node_count(), 12);
        assert_eq!(model.topic, "Glycolysis");
        let error = model.error.clone().unwrap();
        assert!(error.starts_with("Failed to generate graph"), "{error}");
        assert!(error.contains("boom"), "{error}");
    }

    #[test]
    fn missing_key_never_reaches_producer() {
        let producer = Arc::new(StubProducer {
            snapshot: Some(two_node_snapshot()),
            ..StubProducer::default()
        });
        let (_dir, mut model) = model_with(Arc::clone(&producer));
        model.api_key.clear();
        model.topic_input = "Photosynthesis".to_owned();

        model.start_generation();

        assert!(model.generation_rx.is_none());
        assert_eq!(producer.generate_calls.load(Ordering::SeqCst), 0);
        assert!(model.error.as_deref().unwrap().contains("configure your API key"));
        assert_eq!(model.simulation.node_count(), 12);
    }

    #[test]
    fn successful_generation_replaces_graph_and_clears_selection() {
        let producer = Arc::new(StubProducer {
            snapshot: Some(two_node_snapshot()),
            ..StubProducer::default()
        });
        let (_dir, mut model) = model_with(Arc::clone(&producer));
        model.select_node("Glucose");
        assert!(model.selected.is_some());
        model.topic_input = "  Photosynthesis ".to_owned();

        model.start_generation();
        wait_for_workers(&mut model);

        assert_eq!(model.simulation.node_count(), 2);
        assert_eq!(model.topic, "Photosynthesis");
        assert!(model.selected.is_none());
        assert!(matches!(model.explanation, Explanation::Idle));
        assert_eq!(model.groups, vec!["Input", "Organ"]);
        assert!(model.error.is_none());
    }

    #[test]
    fn picking_a_chapter_swaps_graph_and_topic() {
        let (_dir, mut model) = model_with(Arc::new(StubProducer::default()));
        model.select_node("ATP");

        model.open_chapter("Chemistry of Life");

        assert_eq!(model.topic, "Chemistry of Life");
        assert!(model.selected.is_none());
        assert_eq!(model.groups, vec!["Chapter 2"]);
        assert!(model.simulation.contains("Biomolecules"));
        assert!(!model.simulation.contains("Hexokinase"));
    }

    #[test]
    fn unknown_chapter_reports_error_and_keeps_graph() {
        let (_dir, mut model) = model_with(Arc::new(StubProducer::default()));

        model.open_chapter("Astrophysics");

        assert!(model.error.as_deref().unwrap().contains("Astrophysics"));
        assert_eq!(model.topic, "Glycolysis");
        assert_eq!(model.simulation.node_count(), 12);
    }

    #[test]
    fn described_node_is_shown_without_asking_producer() {
        let producer = Arc::new(StubProducer::default());
        let (_dir, mut model) = model_with(Arc::clone(&producer));
        model.open_chapter("Chemistry of Life");
        let described = model
            .simulation
            .frame()
            .nodes
            .iter()
            .filter_map(|node| model.simulation.node_record(&node.id))
            .find(|node| node.description.is_some())
            .unwrap();

        model.select_node(&described.id);

        assert!(
            matches!(&model.explanation, Explanation::Ready(text) if Some(text) == described.description.as_ref())
        );
        assert_eq!(producer.explain_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn explanation_follows_latest_selection() {
        let producer = Arc::new(StubProducer::default());
        let (_dir, mut model) = model_with(Arc::clone(&producer));

        model.select_node("Glucose");
        model.select_node("ATP");
        wait_for_workers(&mut model);

        assert!(matches!(&model.explanation, Explanation::Ready(text) if text == "about ATP"));
    }

    #[test]
    fn late_reply_for_previous_node_is_ignored() {
        let (_dir, mut model) = model_with(Arc::new(StubProducer::default()));
        model.select_node("ATP");
        wait_for_workers(&mut model);

        let (tx, rx) = mpsc::channel();
        tx.send(ExplanationReply {
            node_id: "Glucose".to_owned(),
            result: Ok("about Glucose".to_owned()),
        })
        .unwrap();
        model.explanation_rx = Some(rx);
        model.poll_workers();

        assert!(matches!(&model.explanation, Explanation::Ready(text) if text == "about ATP"));
    }

    #[test]
    fn explanation_without_key_fails_locally() {
        let producer = Arc::new(StubProducer::default());
        let (_dir, mut model) = model_with(Arc::clone(&producer));
        model.api_key.clear();

        model.select_node("Hexokinase");

        assert!(matches!(model.explanation, Explanation::Failed(_)));
        assert_eq!(producer.explain_calls.load(Ordering::SeqCst), 0);
    }
}
