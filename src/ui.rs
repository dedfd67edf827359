use crate::config::Settings;
use crate::fetch::{HttpSheetSource, RefreshTask};
use crate::loader::parse;
use crate::model::{Column, ItemColor, QueryState, Record, SortDirection};
use crate::query::{bonus_names, evaluate};
use crate::stats::{summarize, ViewSummary};
use eframe::egui;
use egui::{Color32, Context, FontFamily, FontId, Margin, RichText, Stroke, Visuals};
use egui_extras::{Column as TableColumn, TableBuilder};
use std::sync::mpsc::{self, Receiver};
use tracing::{info, warn};

const ACCENT: Color32 = Color32::from_rgb(210, 190, 140);
const MUTED: Color32 = Color32::from_rgb(150, 140, 120);

pub fn set_custom_style(ctx: &Context) {
    let mut visuals = Visuals::dark();

    visuals.panel_fill = Color32::from_rgb(24, 22, 20);
    visuals.window_fill = Color32::from_rgb(30, 28, 25);
    visuals.extreme_bg_color = Color32::from_rgb(38, 35, 31);
    visuals.faint_bg_color = Color32::from_rgb(33, 30, 27);

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(48, 44, 38);
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, Color32::from_rgb(85, 78, 64));

    visuals.widgets.hovered.bg_fill = Color32::from_rgb(66, 60, 50);
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.5, ACCENT);

    visuals.widgets.active.bg_fill = Color32::from_rgb(84, 76, 62);
    visuals.widgets.active.bg_stroke = Stroke::new(2.0, Color32::from_rgb(240, 215, 150));

    visuals.selection.bg_fill = Color32::from_rgb(96, 84, 60);
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.window_margin = Margin::same(10);
    style.spacing.button_padding = egui::vec2(10.0, 6.0);
    style.text_styles.insert(
        egui::TextStyle::Body,
        FontId::new(14.0, FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Heading,
        FontId::new(20.0, FontFamily::Proportional),
    );
    ctx.set_style(style);
}

/// Pasted text, loaded records and the derived view. Every change to
/// `records` or `query` goes through `refresh_view`.
#[derive(Debug, Default)]
struct Session {
    raw: String,
    records: Vec<Record>,
    view: Vec<Record>,
    summary: ViewSummary,
    bonus_options: Vec<String>,
    query: QueryState,
}

impl Session {
    fn set_records(&mut self, records: Vec<Record>) {
        self.bonus_options = bonus_names(&records);
        self.records = records;
        self.refresh_view();
    }

    fn refresh_view(&mut self) {
        self.view = evaluate(&self.records, &self.query);
        self.summary = summarize(&self.view);
    }

    fn load_pasted(&mut self) {
        let records = parse(&self.raw);
        info!(rows = records.len(), "loaded pasted data");
        self.set_records(records);
    }

    fn reset(&mut self) {
        self.raw.clear();
        self.query = QueryState::default();
        self.set_records(vec![]);
    }
}

pub struct SheetApp {
    session: Session,
    updates: Receiver<Vec<Record>>,
    refresh_minutes: Option<u64>,
    _refresh: Option<RefreshTask>,
}

impl SheetApp {
    pub fn new(ctx: &Context, settings: &Settings) -> Self {
        let (tx, rx) = mpsc::channel();

        let refresh = match HttpSheetSource::new(&settings.source.url, settings.source.timeout()) {
            Ok(source) => {
                let ctx = ctx.clone();
                Some(RefreshTask::start(
                    source,
                    settings.source.refresh_interval(),
                    tx,
                    move || ctx.request_repaint(),
                ))
            }
            Err(e) => {
                warn!("sheet refresh disabled: {e}");
                None
            }
        };

        Self {
            session: Session::default(),
            updates: rx,
            refresh_minutes: refresh.as_ref().map(|_| settings.source.refresh_interval().as_secs() / 60),
            _refresh: refresh,
        }
    }

    fn drain_updates(&mut self) {
        if let Some(batch) = self.updates.try_iter().last() {
            info!(rows = batch.len(), "replacing records with fetched sheet");
            self.session.set_records(batch);
        }
    }

    fn filter_bar(&mut self, ui: &mut egui::Ui) -> bool {
        let mut changed = false;

        ui.horizontal_wrapped(|ui| {
            changed |= ui
                .add(
                    egui::TextEdit::singleline(&mut self.session.query.name_filter)
                        .hint_text("Search ItemName (a, b)")
                        .desired_width(200.0),
                )
                .changed();

            for (value, hint) in [
                (&mut self.session.query.min_quality, "Min Quality"),
                (&mut self.session.query.min_accuracy, "Min Accuracy"),
                (&mut self.session.query.min_damage, "Min Damage"),
                (&mut self.session.query.min_defense, "Min Defense"),
            ] {
                changed |= ui
                    .add(egui::TextEdit::singleline(&mut *value).hint_text(hint).desired_width(100.0))
                    .changed();
            }
        });

        ui.horizontal_wrapped(|ui| {
            let slots = [
                ("bonus1", &mut self.session.query.bonus1_filter, &mut self.session.query.bonus1_min),
                ("bonus2", &mut self.session.query.bonus2_filter, &mut self.session.query.bonus2_min),
            ];
            for (id, terms, min) in slots {
                changed |= ui
                    .add(
                        egui::TextEdit::singleline(&mut *terms)
                            .hint_text(format!("{id} names (a, b)"))
                            .desired_width(170.0),
                    )
                    .changed();

                egui::ComboBox::from_id_salt(id)
                    .selected_text("+")
                    .width(30.0)
                    .show_ui(ui, |ui| {
                        for name in &self.session.bonus_options {
                            if ui.selectable_label(false, name.as_str()).clicked() {
                                append_term(terms, name);
                                changed = true;
                            }
                        }
                    });

                changed |= ui
                    .add(
                        egui::TextEdit::singleline(&mut *min)
                            .hint_text(format!("{id} min"))
                            .desired_width(80.0),
                    )
                    .changed();

                ui.separator();
            }

            for color in ItemColor::KNOWN {
                let mut on = self.session.query.color_enabled(&color);
                let label = RichText::new(color.as_str()).color(color_tint(&color));
                if ui.checkbox(&mut on, label).changed() {
                    self.session.query.set_color_enabled(color, on);
                    changed = true;
                }
            }
        });

        changed
    }

    fn table(&mut self, ui: &mut egui::Ui) {
        let mut clicked = None;
        let sort = self.session.query.sort;

        let mut builder = TableBuilder::new(ui)
            .striped(true)
            .vscroll(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(TableColumn::initial(200.0).at_least(120.0).clip(true));
        for _ in 1..Column::ALL.len() {
            builder = builder.column(TableColumn::auto().at_least(64.0));
        }
        builder = builder.column(TableColumn::exact(40.0));

        builder
            .header(28.0, |mut header| {
                for column in Column::ALL {
                    header.col(|ui| {
                        let arrow = match (sort.key == Some(column), sort.direction) {
                            (false, _) => "",
                            (true, SortDirection::Ascending) => " ↑",
                            (true, SortDirection::Descending) => " ↓",
                        };
                        let text = RichText::new(format!("{}{arrow}", column.header()))
                            .color(ACCENT)
                            .strong();
                        if ui.add(egui::Button::new(text).frame(false)).clicked() {
                            clicked = Some(column);
                        }
                    });
                }
                header.col(|ui| {
                    ui.label(RichText::new("📋").color(ACCENT));
                });
            })
            .body(|body| {
                body.rows(24.0, self.session.view.len(), |mut row| {
                    let r = &self.session.view[row.index()];

                    row.col(|ui| {
                        ui.label(r.item_name.as_str());
                    });
                    row.col(|ui| {
                        ui.label(RichText::new(format_price(r.item_price)).color(Color32::from_rgb(150, 220, 150)));
                    });
                    for value in [r.quality, r.accuracy, r.damage, r.defense] {
                        row.col(|ui| {
                            ui.label(value.to_string());
                        });
                    }
                    row.col(|ui| {
                        ui.label(r.bonus1_name.as_str());
                    });
                    row.col(|ui| {
                        ui.label(r.bonus1_value.to_string());
                    });
                    row.col(|ui| {
                        ui.label(r.bonus2_name.as_str());
                    });
                    row.col(|ui| {
                        ui.label(r.bonus2_value.to_string());
                    });
                    row.col(|ui| {
                        ui.label(RichText::new(r.color.as_str()).color(color_tint(&r.color)));
                    });
                    row.col(|ui| {
                        ui.label(r.auction_ends.as_str());
                    });
                    row.col(|ui| {
                        if ui.button("📋").on_hover_text("Copy row as JSON").clicked() {
                            match serde_json::to_string_pretty(r) {
                                Ok(json) => ui.ctx().copy_text(json),
                                Err(e) => warn!("could not serialize row: {e}"),
                            }
                        }
                    });
                });
            });

        if let Some(column) = clicked {
            self.session.query.sort.toggle(column);
            self.session.refresh_view();
        }
    }
}

impl eframe::App for SheetApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.drain_updates();

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.heading(RichText::new("⚔ Weapons Sheet").color(ACCENT).strong());
            ui.add_space(4.0);

            ui.horizontal(|ui| {
                let width = ui.available_width() - 140.0;
                ui.add(
                    egui::TextEdit::multiline(&mut self.session.raw)
                        .hint_text("Paste CSV here. Header line required.")
                        .desired_rows(6)
                        .desired_width(width),
                );
                ui.vertical(|ui| {
                    if ui.add_sized([120.0, 32.0], egui::Button::new("Load data")).clicked() {
                        self.session.load_pasted();
                    }
                    if ui
                        .add_sized(
                            [120.0, 32.0],
                            egui::Button::new(RichText::new("Reset").color(Color32::from_rgb(255, 150, 150))),
                        )
                        .clicked()
                    {
                        self.session.reset();
                    }
                });
            });

            ui.separator();
            if self.filter_bar(ui) {
                self.session.refresh_view();
            }
            ui.add_space(2.0);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(format!(
                        "Showing {} of {} items",
                        self.session.summary.rows,
                        self.session.records.len()
                    ))
                    .color(MUTED),
                );
                if self.session.summary.rows > 0 {
                    ui.separator();
                    ui.label(
                        RichText::new(format!(
                            "mean {} · median {} · best quality {}",
                            format_price(self.session.summary.mean_price),
                            format_price(self.session.summary.median_price),
                            self.session.summary.max_quality
                        ))
                        .color(MUTED),
                    );
                }
                ui.separator();
                let note = match self.refresh_minutes {
                    Some(m) => format!("Auto-fetch every {m} min"),
                    None => "Auto-fetch disabled".to_string(),
                };
                ui.label(RichText::new(note).color(MUTED).small());
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.session.records.is_empty() {
                empty_state(ui, "No data loaded", "Paste CSV above or wait for the sheet to fetch");
                return;
            }
            if self.session.view.is_empty() {
                empty_state(ui, "No items match your filters", "Try adjusting your search or filter settings");
                return;
            }
            self.table(ui);
        });
    }
}

fn empty_state(ui: &mut egui::Ui, title: &str, hint: &str) {
    ui.vertical_centered(|ui| {
        ui.add_space(80.0);
        ui.label(RichText::new(title).size(20.0).color(ACCENT));
        ui.add_space(6.0);
        ui.label(RichText::new(hint).color(MUTED));
    });
}

fn color_tint(color: &ItemColor) -> Color32 {
    match color {
        ItemColor::Yellow => Color32::from_rgb(235, 205, 70),
        ItemColor::Orange => Color32::from_rgb(235, 145, 50),
        ItemColor::Red => Color32::from_rgb(225, 80, 70),
        ItemColor::Other(_) => Color32::LIGHT_GRAY,
    }
}

fn append_term(terms: &mut String, name: &str) {
    if terms.trim().is_empty() {
        *terms = name.to_string();
    } else {
        terms.push_str(", ");
        terms.push_str(name);
    }
}

/// Abbreviated price: b/m/k with up to four decimals, otherwise the raw number.
pub fn format_price(price: f64) -> String {
    for (scale, suffix) in [(1e9, "b"), (1e6, "m"), (1e3, "k")] {
        if price >= scale {
            // round half away from zero before formatting, like toFixed
            let rounded = (price / scale * 1e4).round() / 1e4;
            let fixed = format!("{rounded:.4}");
            let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
            return format!("{trimmed}{suffix}");
        }
    }
    price.to_string()
}
