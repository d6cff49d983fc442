//! Per-day interactive map sessions
//!
//! Each day gets at most one map session, created lazily on first reveal
//! and cached for the lifetime of the app. A session owns the walkers
//! viewport state, the category marker layers, the route polyline, and
//! the bounding box of the day's valid points.

use crate::links;
use crate::schedule::{Category, Day};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tracing::debug;
use walkers::sources::{Attribution, TileSource};
use walkers::{lat_lon, MapMemory, Plugin, Position, Projector, TileId};

/// Fallback viewport when a day has no valid points
pub const DEFAULT_CENTER: (f64, f64) = (10.775, 106.7);
pub const DEFAULT_ZOOM: f64 = 12.0;

/// One rendered map point
#[derive(Debug, Clone)]
pub struct Marker {
    pub position: Position,
    pub name: String,
    pub g: String,
    pub cat: Category,
}

/// Bounding box over a day's valid coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    pub fn from_coords(coords: &[(f64, f64)]) -> Option<Self> {
        let first = coords.first()?;
        let mut b = Bounds {
            min_lat: first.0,
            max_lat: first.0,
            min_lng: first.1,
            max_lng: first.1,
        };
        for &(lat, lng) in &coords[1..] {
            b.min_lat = b.min_lat.min(lat);
            b.max_lat = b.max_lat.max(lat);
            b.min_lng = b.min_lng.min(lng);
            b.max_lng = b.max_lng.max(lng);
        }
        Some(b)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// Live map state for one day
pub struct MapSession {
    pub memory: MapMemory,
    /// Map surface currently shown
    pub open: bool,
    pub markers: Vec<Marker>,
    /// Attached (visible) category layers; all attached at creation
    attached: BTreeSet<Category>,
    /// Route polyline through valid points in list order, when two or more
    pub route: Vec<Position>,
    pub bounds: Option<Bounds>,
    /// Viewport fit requested but not yet applied; the surface may still
    /// be unmeasured, so the fit runs on the next frame with a known rect
    pub pending_fit: bool,
    /// Marker index whose popup is showing
    pub selected: Option<usize>,
}

impl MapSession {
    fn new(day: &Day, open: bool) -> Self {
        let markers: Vec<Marker> = day
            .valid_points()
            .map(|p| {
                let (lat, lng) = p.coords().unwrap_or_default();
                Marker {
                    position: lat_lon(lat, lng),
                    name: p.name.clone(),
                    g: p.g.clone(),
                    cat: p.cat,
                }
            })
            .collect();

        let coords: Vec<(f64, f64)> = day.valid_points().filter_map(|p| p.coords()).collect();
        let route = if markers.len() >= 2 {
            markers.iter().map(|m| m.position).collect()
        } else {
            Vec::new()
        };

        MapSession {
            memory: MapMemory::default(),
            open,
            markers,
            attached: Category::ALL.into_iter().collect(),
            route,
            bounds: Bounds::from_coords(&coords),
            pending_fit: true,
            selected: None,
        }
    }

    pub fn is_attached(&self, cat: Category) -> bool {
        self.attached.contains(&cat)
    }

    /// Attach or detach one category layer; other categories and other
    /// days are untouched.
    pub fn toggle_category(&mut self, cat: Category) {
        if !self.attached.remove(&cat) {
            self.attached.insert(cat);
        }
    }

    /// Request a viewport fit; applied once the surface is measured.
    pub fn request_fit(&mut self) {
        self.pending_fit = true;
    }

    /// Apply the pending fit for a surface of the given pixel size.
    pub fn apply_fit(&mut self, width_px: f64, height_px: f64) {
        self.pending_fit = false;
        match self.bounds {
            Some(b) => {
                let (lat, lng) = b.center();
                self.memory.center_at(lat_lon(lat, lng));
                let _ = self.memory.set_zoom(zoom_for_bounds(&b, width_px, height_px));
            }
            None => {
                self.memory
                    .center_at(lat_lon(DEFAULT_CENTER.0, DEFAULT_CENTER.1));
                let _ = self.memory.set_zoom(DEFAULT_ZOOM);
            }
        }
    }

    /// Markers on currently attached layers, with their original index
    pub fn visible_markers(&self) -> impl Iterator<Item = (usize, &Marker)> {
        self.markers
            .iter()
            .enumerate()
            .filter(|(_, m)| self.attached.contains(&m.cat))
    }
}

/// Keyed session store owned by the map controller.
///
/// Append-only: a session is created once per day id and reused; nothing
/// ever tears one down.
#[derive(Default)]
pub struct MapSessions {
    sessions: HashMap<String, MapSession>,
}

impl MapSessions {
    /// Create-or-fetch the session for a day. `open` only applies on
    /// first creation: layer toggles initialize the session without
    /// revealing the surface, map toggle and fit reveal it.
    pub fn get_or_create(&mut self, day: &Day, open: bool) -> &mut MapSession {
        self.sessions.entry(day.id.clone()).or_insert_with(|| {
            debug!("Creating map session for day '{}'", day.id);
            MapSession::new(day, open)
        })
    }

    pub fn get(&self, day_id: &str) -> Option<&MapSession> {
        self.sessions.get(day_id)
    }

    pub fn get_mut(&mut self, day_id: &str) -> Option<&mut MapSession> {
        self.sessions.get_mut(day_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Web-mercator zoom level at which the bounds fit a surface of the
/// given pixel size, with padding
pub fn zoom_for_bounds(b: &Bounds, width_px: f64, height_px: f64) -> f64 {
    const TILE: f64 = 256.0;
    const PADDING: f64 = 20.0;

    let w = (width_px - 2.0 * PADDING).max(64.0);
    let h = (height_px - 2.0 * PADDING).max(64.0);

    let lng_frac = ((b.max_lng - b.min_lng).abs() / 360.0).max(1e-9);
    let lat_frac = ((mercator_y(b.max_lat) - mercator_y(b.min_lat)).abs()
        / (2.0 * std::f64::consts::PI))
        .max(1e-9);

    let zoom_x = (w / (TILE * lng_frac)).log2();
    let zoom_y = (h / (TILE * lat_frac)).log2();
    zoom_x.min(zoom_y).clamp(1.0, 16.0)
}

fn mercator_y(lat_deg: f64) -> f64 {
    let lat = lat_deg.clamp(-85.0511, 85.0511).to_radians();
    (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln()
}

/// Tile source built from a configured URL template
#[derive(Debug, Clone)]
pub struct ProviderSource {
    name: String,
    url_pattern: String,
}

impl ProviderSource {
    pub fn new(name: String, url_pattern: String) -> Self {
        Self { name, url_pattern }
    }
}

impl TileSource for ProviderSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        self.url_pattern
            .replace("{z}", &tile_id.zoom.to_string())
            .replace("{x}", &tile_id.x.to_string())
            .replace("{y}", &tile_id.y.to_string())
    }

    fn attribution(&self) -> Attribution {
        // Attribution requires 'static lifetime, so we leak the string.
        // Acceptable since the provider is configured once per run.
        let text: &'static str = Box::leak(self.name.clone().into_boxed_str());
        Attribution {
            text,
            url: "",
            logo_light: None,
            logo_dark: None,
        }
    }
}

/// Plugin drawing one day's markers and route onto the walkers map
pub struct DayMapPlugin {
    /// (position, category, original marker index), attached layers only
    pub markers: Vec<(Position, Category, usize)>,
    pub route: Vec<Position>,
    pub selected: Option<usize>,
    /// -1 = no click this frame, >= 0 = clicked marker index
    pub clicked: Arc<AtomicI32>,
    pub map_rect: egui::Rect,
}

impl Plugin for DayMapPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
    ) {
        let painter = ui.painter().with_clip_rect(self.map_rect);

        // Route polyline, dashed
        if self.route.len() >= 2 {
            let screen: Vec<egui::Pos2> = self
                .route
                .iter()
                .map(|pos| {
                    let v = projector.project(*pos);
                    egui::pos2(v.x, v.y)
                })
                .collect();
            let stroke = egui::Stroke::new(
                3.0,
                egui::Color32::from_rgba_unmultiplied(0x8b, 0x5c, 0xf6, 180),
            );
            for pair in screen.windows(2) {
                painter.extend(egui::Shape::dashed_line(pair, stroke, 6.0, 8.0));
            }
        }

        // Markers, styled by category, with magnetic click selection
        let click_pos = if response.clicked() {
            response.interact_pointer_pos()
        } else {
            None
        };
        let mut closest_dist = f32::MAX;
        let mut closest_idx = -1;

        for (pos, cat, idx) in &self.markers {
            let v = projector.project(*pos);
            let screen_pos = egui::pos2(v.x, v.y);
            if !self.map_rect.expand(16.0).contains(screen_pos) {
                continue;
            }

            let (r, g, b) = links::category_color(*cat);
            let radius = if self.selected == Some(*idx) { 10.0 } else { 8.0 };
            painter.circle_filled(screen_pos, radius, egui::Color32::from_rgb(r, g, b));
            painter.circle_stroke(
                screen_pos,
                radius,
                egui::Stroke::new(1.0, egui::Color32::from_rgb(0x11, 0x11, 0x11)),
            );

            if let Some(c) = click_pos {
                let dist = screen_pos.distance(c);
                if dist < closest_dist {
                    closest_dist = dist;
                    closest_idx = *idx as i32;
                }
            }
        }

        if closest_idx >= 0 && closest_dist < 30.0 {
            self.clicked.store(closest_idx, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::MapPoint;

    fn day(id: &str, coords: &[(f64, f64)]) -> Day {
        Day {
            id: id.to_string(),
            map: coords
                .iter()
                .enumerate()
                .map(|(i, &(lat, lng))| MapPoint {
                    name: format!("p{}", i),
                    g: format!("p{}", i),
                    lat: Some(lat),
                    lng: Some(lng),
                    cat: Category::Sight,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_session_created_exactly_once() {
        let d = day("d1", &[(10.0, 106.0), (10.5, 106.5)]);
        let mut sessions = MapSessions::default();

        sessions.get_or_create(&d, true).toggle_category(Category::Food);
        assert_eq!(sessions.len(), 1);

        // Re-triggering operates on the cached session
        let again = sessions.get_or_create(&d, true);
        assert_eq!(again.markers.len(), 2);
        assert!(!again.is_attached(Category::Food));
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_all_layers_attached_at_creation() {
        let d = day("d1", &[(10.0, 106.0)]);
        let mut sessions = MapSessions::default();
        let s = sessions.get_or_create(&d, true);
        for cat in Category::ALL {
            assert!(s.is_attached(cat));
        }
    }

    #[test]
    fn test_category_toggle_pairs_are_idempotent() {
        let d = day("d1", &[(10.0, 106.0)]);
        let mut sessions = MapSessions::default();
        let s = sessions.get_or_create(&d, true);

        s.toggle_category(Category::Sight);
        assert!(!s.is_attached(Category::Sight));
        s.toggle_category(Category::Sight);
        assert!(s.is_attached(Category::Sight));
        // Other categories untouched throughout
        assert!(s.is_attached(Category::Food));
    }

    #[test]
    fn test_detached_layer_hides_its_markers() {
        let mut d = day("d1", &[(10.0, 106.0), (10.5, 106.5)]);
        d.map[1].cat = Category::Food;
        let mut sessions = MapSessions::default();
        let s = sessions.get_or_create(&d, true);

        s.toggle_category(Category::Food);
        let visible: Vec<usize> = s.visible_markers().map(|(i, _)| i).collect();
        assert_eq!(visible, [0]);
    }

    #[test]
    fn test_layer_toggle_initializes_without_revealing() {
        let d = day("d1", &[(10.0, 106.0)]);
        let mut sessions = MapSessions::default();

        // A category click on a never-shown day sets up the session but
        // keeps the surface hidden
        let s = sessions.get_or_create(&d, false);
        s.toggle_category(Category::Food);
        assert!(!s.open);
        assert!(!s.is_attached(Category::Food));

        // The open flag is a creation-time property only; the cached
        // session keeps whatever state it has
        let again = sessions.get_or_create(&d, true);
        assert!(!again.open);
    }

    #[test]
    fn test_route_needs_two_points() {
        let mut sessions = MapSessions::default();
        let single = sessions.get_or_create(&day("one", &[(10.0, 106.0)]), true);
        assert!(single.route.is_empty());
        let pair = sessions.get_or_create(&day("two", &[(10.0, 106.0), (10.5, 106.5)]), true);
        assert_eq!(pair.route.len(), 2);
    }

    #[test]
    fn test_fit_without_points_uses_default_viewport() {
        let d = day("empty", &[]);
        let mut sessions = MapSessions::default();
        let s = sessions.get_or_create(&d, true);
        assert!(s.bounds.is_none());
        assert!(s.pending_fit);
        s.apply_fit(800.0, 400.0);
        assert!(!s.pending_fit);
    }

    #[test]
    fn test_bounds_cover_all_coords() {
        let b = Bounds::from_coords(&[(10.0, 106.0), (10.8, 105.5), (10.4, 106.9)]).unwrap();
        assert_eq!(b.min_lat, 10.0);
        assert_eq!(b.max_lat, 10.8);
        assert_eq!(b.min_lng, 105.5);
        assert_eq!(b.max_lng, 106.9);
        let (lat, lng) = b.center();
        assert!((lat - 10.4).abs() < 1e-9);
        assert!((lng - 106.2).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_shrinks_as_bounds_grow() {
        let small = Bounds::from_coords(&[(10.0, 106.0), (10.05, 106.05)]).unwrap();
        let large = Bounds::from_coords(&[(10.0, 106.0), (15.0, 111.0)]).unwrap();
        let z_small = zoom_for_bounds(&small, 800.0, 400.0);
        let z_large = zoom_for_bounds(&large, 800.0, 400.0);
        assert!(z_small > z_large);
        assert!((1.0..=16.0).contains(&z_small));
        assert!((1.0..=16.0).contains(&z_large));
    }
}
