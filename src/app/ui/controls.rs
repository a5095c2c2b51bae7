use eframe::egui::{self, Key, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::super::ViewModel;

const MAX_SEARCH_RESULTS: usize = 10;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.draw_chapter_picker(ui);
                ui.separator();
                self.draw_topic_generator(ui);
                ui.separator();
                self.draw_node_search(ui);
                ui.separator();
                self.draw_settings(ui);
            });
    }

    fn draw_chapter_picker(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Curriculum").strong());

        let mut picked = None;
        egui::ComboBox::from_id_salt("chapter_picker")
            .selected_text("Select a chapter")
            .width(ui.available_width())
            .show_ui(ui, |ui| {
                for chapter in self.catalog.chapters() {
                    let text = format!("{}: {}", chapter.chapter, chapter.title);
                    if ui
                        .selectable_label(self.topic == chapter.title, text)
                        .clicked()
                    {
                        picked = Some(chapter.title.clone());
                    }
                }
            });

        if let Some(title) = picked {
            self.open_chapter(&title);
        }
    }

    fn draw_topic_generator(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Generate from topic").strong());

        let generating = self.generation_rx.is_some();
        let input = ui.add_enabled(
            !generating,
            egui::TextEdit::singleline(&mut self.topic_input)
                .hint_text("e.g. Photosynthesis")
                .desired_width(f32::INFINITY),
        );
        let submitted = input.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));

        ui.horizontal(|ui| {
            let can_generate = !generating && !self.topic_input.trim().is_empty();
            let clicked = ui
                .add_enabled(can_generate, egui::Button::new("Generate"))
                .clicked();
            if clicked || (submitted && can_generate) {
                self.start_generation();
            }
            if generating {
                ui.spinner();
                ui.label("Generating...");
            }
        });
    }

    fn draw_node_search(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Find node").strong());
        ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("Search node ids")
                .desired_width(f32::INFINITY),
        );

        let query = self.search.trim();
        if query.is_empty() {
            return;
        }

        let matcher = SkimMatcherV2::default();
        let mut matches = self
            .latest_frame
            .borrow()
            .nodes
            .iter()
            .filter_map(|node| {
                fuzzy_match_score(&matcher, &node.id, query).map(|score| (score, node.id.clone()))
            })
            .collect::<Vec<_>>();
        matches.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        matches.truncate(MAX_SEARCH_RESULTS);

        if matches.is_empty() {
            ui.weak("No matching nodes");
            return;
        }

        let mut chosen = None;
        for (_, id) in &matches {
            if ui.link(id.as_str()).clicked() {
                chosen = Some(id.clone());
            }
        }
        if let Some(id) = chosen {
            self.select_node(&id);
        }
    }

    fn draw_settings(&mut self, ui: &mut Ui) {
        egui::CollapsingHeader::new("Settings")
            .default_open(self.api_key.is_empty())
            .show(ui, |ui| {
                ui.label("API key");
                ui.add(
                    egui::TextEdit::singleline(&mut self.api_key_draft)
                        .password(true)
                        .desired_width(f32::INFINITY),
                );
                ui.horizontal(|ui| {
                    let changed = self.api_key_draft != self.api_key;
                    if ui.add_enabled(changed, egui::Button::new("Save")).clicked() {
                        self.save_api_key();
                    }
                    if !self.api_key.is_empty() {
                        ui.weak("key configured");
                    }
                });
                match self.key_store.path() {
                    Some(path) => ui.small(format!("Stored at {}", path.display())),
                    None => ui.small("Kept in memory for this session only"),
                };
            });
    }
}
