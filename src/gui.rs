//! Native itinerary viewer using egui
//!
//! Side panel: day navigation with scroll-spy highlighting. Top panel:
//! global item-category filter. Central panel: scrollable day cards with
//! per-day slippy maps (walkers).

use eframe::egui;
use egui::{Align, Color32, RichText};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tracing::info;
use walkers::{lat_lon, HttpTiles, Map};

use crate::config::Config;
use crate::filter::FilterState;
use crate::links;
use crate::map::{DayMapPlugin, MapSession, MapSessions, ProviderSource, DEFAULT_CENTER};
use crate::schedule::{Category, Day};
use crate::spy;
use crate::view::{self, DayCard};

const MAP_HEIGHT: f32 = 320.0;

/// Run the native viewer over an already-loaded day list
pub fn run_viewer(config: Config, days: Vec<Day>) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Tripboard"),
        ..Default::default()
    };

    eframe::run_native(
        "Tripboard",
        options,
        Box::new(|cc| Ok(Box::new(TripApp::new(cc, config, days)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))
}

/// Every user interaction decodes into one of these and goes through a
/// single dispatch point.
#[derive(Debug, Clone)]
enum Action {
    ToggleMap(String),
    FitRoute(String),
    ToggleCategory(String, Category),
    SelectDay(String),
    ToggleFilter(Category),
    OpenUrl(String),
}

struct TripApp {
    config: Config,
    days: Vec<Day>,
    doc: view::Document,
    sessions: MapSessions,
    filter: FilterState,
    /// Shared tile fetcher, lazily created on first map reveal
    tiles: Option<HttpTiles>,
    /// Currently highlighted navigation entry
    active_day: Option<String>,
    /// One-shot smooth-scroll target set by a navigation click
    scroll_target: Option<String>,
}

impl TripApp {
    fn new(cc: &eframe::CreationContext<'_>, config: Config, days: Vec<Day>) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        // "Today" is decided once at render time, not re-evaluated
        let today = chrono::Local::now().date_naive().to_string();
        let doc = view::build(&days, &today);
        info!("Viewer ready: {} days", doc.days.len());

        let active_day = doc.days.first().map(|c| c.id.clone());
        Self {
            config,
            days,
            doc,
            sessions: MapSessions::default(),
            filter: FilterState::default(),
            tiles: None,
            active_day,
            scroll_target: None,
        }
    }

    fn dispatch(&mut self, ctx: &egui::Context, action: Action) {
        match action {
            Action::SelectDay(id) => {
                self.active_day = Some(id.clone());
                self.scroll_target = Some(id);
            }
            Action::ToggleFilter(cat) => self.filter.toggle(cat),
            Action::OpenUrl(url) => ctx.open_url(egui::OpenUrl::new_tab(url)),
            Action::ToggleMap(id) => {
                if let Some(session) = self.sessions.get_mut(&id) {
                    session.open = !session.open;
                } else if let Some(day) = self.find_day(&id) {
                    self.sessions.get_or_create(&day, true);
                }
            }
            Action::FitRoute(id) => {
                // Reveal first if hidden, initialize if needed, then fit
                if let Some(day) = self.find_day(&id) {
                    let session = self.sessions.get_or_create(&day, true);
                    session.open = true;
                    session.request_fit();
                }
            }
            Action::ToggleCategory(id, cat) => {
                // Initializes the session if needed, without revealing it
                if let Some(day) = self.find_day(&id) {
                    self.sessions.get_or_create(&day, false).toggle_category(cat);
                }
            }
        }
    }

    fn find_day(&self, id: &str) -> Option<Day> {
        self.days.iter().find(|d| d.id == id).cloned()
    }
}

impl eframe::App for TripApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut actions: Vec<Action> = Vec::new();

        let Self {
            config,
            doc,
            sessions,
            filter,
            tiles,
            active_day,
            scroll_target,
            ..
        } = self;

        // Top panel - title + global item filter
        egui::TopBottomPanel::top("filter_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Tripboard");
                ui.separator();
                ui.label("Show:");
                for cat in Category::ALL {
                    let mut on = filter.is_enabled(cat);
                    if ui.checkbox(&mut on, links::category_label(cat)).changed() {
                        actions.push(Action::ToggleFilter(cat));
                    }
                }
            });
        });

        // Left panel - day navigation index
        egui::SidePanel::left("nav_panel").min_width(200.0).show(ctx, |ui| {
            ui.heading("Days");
            ui.separator();
            egui::ScrollArea::vertical().id_salt("nav_scroll").show(ui, |ui| {
                for entry in &doc.nav {
                    let is_active = active_day.as_deref() == Some(entry.day_id.as_str());
                    let chip = if entry.is_transit { "Transit" } else { "Day" };
                    ui.horizontal(|ui| {
                        let text = format!("{} {}", entry.date_main, entry.date_sub);
                        if ui.selectable_label(is_active, text.trim()).clicked() {
                            actions.push(Action::SelectDay(entry.day_id.clone()));
                        }
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.weak(chip);
                        });
                    });
                }
            });
        });

        // Central panel - day cards
        let mut tops: Vec<f32> = Vec::new();
        let mut scroll_y = 0.0;
        let mut viewport_h = 0.0;
        let mut content_h = 0.0;

        egui::CentralPanel::default().show(ctx, |ui| {
            if doc.days.is_empty() {
                ui.vertical_centered(|ui| {
                    ui.add_space(60.0);
                    ui.weak("No itinerary loaded");
                });
                return;
            }

            let output = egui::ScrollArea::vertical().id_salt("days_scroll").show(ui, |ui| {
                let origin = ui.cursor().top();
                for card in &doc.days {
                    tops.push(ui.cursor().top() - origin);

                    let response = ui
                        .vertical(|ui| {
                            render_day_card(ui, config, card, sessions, filter, tiles, &mut actions);
                        })
                        .response;

                    if scroll_target.as_deref() == Some(card.id.as_str()) {
                        response.scroll_to_me(Some(Align::TOP));
                        *scroll_target = None;
                    }

                    ui.add_space(16.0);
                }
            });

            scroll_y = output.state.offset.y;
            viewport_h = output.inner_rect.height();
            content_h = output.content_size.y;
        });

        // Scroll-spy: once per frame, skipped while a click-scroll is pending
        if scroll_target.is_none() {
            if let Some(i) =
                spy::active_section(&tops, scroll_y, viewport_h, content_h, config.header_offset)
            {
                *active_day = doc.days.get(i).map(|c| c.id.clone());
            }
        }

        for action in actions {
            self.dispatch(ctx, action);
        }
    }
}

fn render_day_card(
    ui: &mut egui::Ui,
    config: &Config,
    card: &DayCard,
    sessions: &mut MapSessions,
    filter: &FilterState,
    tiles: &mut Option<HttpTiles>,
    actions: &mut Vec<Action>,
) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());

        // Header
        ui.horizontal(|ui| {
            ui.heading(&card.date);
            ui.label(RichText::new(&card.title).strong());
            if card.is_today {
                ui.colored_label(Color32::from_rgb(0x10, 0xb9, 0x81), "● Today");
            }
        });
        ui.separator();

        // Item rows, hidden when their category is filtered out
        for row in &card.items {
            if !filter.is_visible(row.category) {
                continue;
            }
            ui.horizontal(|ui| {
                ui.monospace(RichText::new(format!("{:<5}", row.time)).weak());
                ui.label(&row.text);
                if let Some(url) = &row.map_url {
                    if ui.small_button("📍 Map").clicked() {
                        actions.push(Action::OpenUrl(url.clone()));
                    }
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(row.label);
                });
            });
        }

        // Notes
        if let Some(point) = &card.point {
            ui.add_space(4.0);
            ui.label(RichText::new(format!("✨ {}", point)).italics());
        }
        if let Some(prep) = &card.prep {
            ui.label(RichText::new(format!("🔖 {}", prep)).italics());
        }

        // Map toolbar, only for days with geolocated points
        if let Some(toolbar) = &card.toolbar {
            ui.add_space(6.0);
            let open = sessions.get(&card.id).map(|s| s.open).unwrap_or(false);

            ui.horizontal_wrapped(|ui| {
                let label = if open { "🗺 Hide map" } else { "🗺 Show map" };
                if ui.button(label).clicked() {
                    actions.push(Action::ToggleMap(card.id.clone()));
                }
                if let Some(url) = &toolbar.route_url {
                    ui.hyperlink_to("🧭 Day route", url);
                }
                if ui.button("🔎 Fit route").clicked() {
                    actions.push(Action::FitRoute(card.id.clone()));
                }
                ui.separator();
                for &cat in &toolbar.categories {
                    let attached = sessions
                        .get(&card.id)
                        .map(|s| s.is_attached(cat))
                        .unwrap_or(true);
                    let text = links::category_label(cat);
                    let text = if attached {
                        RichText::new(text)
                    } else {
                        RichText::new(text).weak()
                    };
                    if ui.selectable_label(attached, text).clicked() {
                        actions.push(Action::ToggleCategory(card.id.clone(), cat));
                    }
                }
            });

            if open {
                if let Some(session) = sessions.get_mut(&card.id) {
                    render_day_map(ui, config, tiles, session, actions);
                }
            }
        }
    });
}

fn render_day_map(
    ui: &mut egui::Ui,
    config: &Config,
    tiles: &mut Option<HttpTiles>,
    session: &mut MapSession,
    actions: &mut Vec<Action>,
) {
    if tiles.is_none() {
        let source =
            ProviderSource::new(config.provider_name.clone(), config.provider_url.clone());
        *tiles = Some(HttpTiles::new(source, ui.ctx().clone()));
    }

    let width = ui.available_width();
    ui.allocate_ui(egui::vec2(width, MAP_HEIGHT), |ui| {
        let map_rect = egui::Rect::from_min_size(
            ui.next_widget_position(),
            egui::vec2(width, MAP_HEIGHT),
        );

        // The surface may have been created while hidden; the fit waits
        // until this point, where the rect is known
        if session.pending_fit {
            session.apply_fit(map_rect.width() as f64, map_rect.height() as f64);
        }

        let clicked = Arc::new(AtomicI32::new(-1));
        let plugin = DayMapPlugin {
            markers: session
                .visible_markers()
                .map(|(i, m)| (m.position, m.cat, i))
                .collect(),
            route: session.route.clone(),
            selected: session.selected,
            clicked: clicked.clone(),
            map_rect,
        };

        let fallback = session
            .bounds
            .map(|b| {
                let (lat, lng) = b.center();
                lat_lon(lat, lng)
            })
            .unwrap_or_else(|| lat_lon(DEFAULT_CENTER.0, DEFAULT_CENTER.1));

        if let Some(tiles) = tiles.as_mut() {
            let map = Map::new(Some(tiles), &mut session.memory, fallback).with_plugin(plugin);
            ui.add_sized(egui::vec2(width, MAP_HEIGHT), map);
        }

        // Tile attribution, bottom right
        ui.painter().text(
            map_rect.max - egui::vec2(5.0, 5.0),
            egui::Align2::RIGHT_BOTTOM,
            format!("© {}", config.provider_name),
            egui::FontId::proportional(10.0),
            Color32::from_black_alpha(150),
        );

        let idx = clicked.load(Ordering::Relaxed);
        if idx >= 0 {
            session.selected = Some(idx as usize);
        }
    });

    // Marker popup
    if let Some(sel) = session.selected {
        let marker = session.markers.get(sel).cloned();
        if let Some(marker) = marker {
            ui.horizontal(|ui| {
                let (r, g, b) = links::category_color(marker.cat);
                ui.colored_label(Color32::from_rgb(r, g, b), "●");
                ui.label(RichText::new(&marker.name).strong());
                ui.weak(marker.cat.as_str().to_uppercase());
                if !marker.g.is_empty()
                    && ui.small_button("📍 Open in Google Maps").clicked()
                {
                    actions.push(Action::OpenUrl(links::search_url(&marker.g)));
                }
                if ui.small_button("✕").clicked() {
                    session.selected = None;
                }
            });
        }
    }
}
