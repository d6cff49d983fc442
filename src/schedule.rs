//! Itinerary document loader and data model
//!
//! The schedule is a JSON document: either a bare array of days or an
//! object wrapping it under a `days` field. Loading never fails hard —
//! any I/O or parse problem degrades to an empty day list so the viewer
//! still boots.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Activity kind, shared by item rows and map points.
///
/// Unrecognized or absent categories fall into the `Free` bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Move,
    Stay,
    Food,
    Sight,
    #[serde(other)]
    Free,
}

impl Default for Category {
    fn default() -> Self {
        Category::Free
    }
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 5] = [
        Category::Sight,
        Category::Food,
        Category::Stay,
        Category::Move,
        Category::Free,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Move => "move",
            Category::Stay => "stay",
            Category::Food => "food",
            Category::Sight => "sight",
            Category::Free => "free",
        }
    }
}

/// A single scheduled activity within a day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub time: String,
    #[serde(rename = "type", default)]
    pub category: Category,
    #[serde(alias = "title", default)]
    pub text: String,
    #[serde(default)]
    pub poi: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub cost: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(rename = "mapLink", default)]
    pub map_link: Option<String>,
}

/// A geolocated, categorized place associated with a day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapPoint {
    #[serde(default)]
    pub name: String,
    /// Geocodable query string for external map links
    #[serde(default)]
    pub g: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub cat: Category,
}

impl MapPoint {
    /// A point is renderable only when both coordinates are finite.
    pub fn coords(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some((lat, lng)),
            _ => None,
        }
    }
}

/// One itinerary unit: a dated, titled, ordered list of items plus
/// optional map points
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Day {
    pub id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub point: Option<String>,
    #[serde(default)]
    pub prep: Option<String>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub map: Vec<MapPoint>,
}

impl Day {
    /// Map points with finite coordinates, in document order.
    pub fn valid_points(&self) -> impl Iterator<Item = &MapPoint> {
        self.map.iter().filter(|p| p.coords().is_some())
    }

    pub fn has_valid_points(&self) -> bool {
        self.valid_points().next().is_some()
    }
}

/// Document shape: bare array or `{ "days": [...] }`
#[derive(Deserialize)]
#[serde(untagged)]
enum ScheduleDoc {
    Days(Vec<Day>),
    Wrapped { days: Vec<Day> },
}

impl ScheduleDoc {
    fn into_days(self) -> Vec<Day> {
        match self {
            ScheduleDoc::Days(days) => days,
            ScheduleDoc::Wrapped { days } => days,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("failed to read schedule: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse schedule: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to fetch schedule: {0}")]
    Http(#[from] reqwest::Error),
    #[error("schedule endpoint returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Parse a schedule document and sort each day's items by time.
pub fn parse(json: &str) -> Result<Vec<Day>, ScheduleError> {
    let doc: ScheduleDoc = serde_json::from_str(json)?;
    let mut days = doc.into_days();
    normalize(&mut days);
    Ok(days)
}

/// Load a schedule from disk, degrading to an empty plan on failure.
pub fn load_file<P: AsRef<Path>>(path: P) -> Vec<Day> {
    let path = path.as_ref();
    match try_load_file(path) {
        Ok(days) => {
            tracing::info!("Loaded {} days from {:?}", days.len(), path);
            days
        }
        Err(e) => {
            tracing::warn!("Schedule load failed ({}), continuing with empty plan", e);
            Vec::new()
        }
    }
}

fn try_load_file(path: &Path) -> Result<Vec<Day>, ScheduleError> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Fetch a schedule over HTTP, degrading to an empty plan on failure.
///
/// The request is bounded by a 10 second timeout so a dead endpoint can
/// never hang the viewer.
pub async fn fetch(url: &str) -> Vec<Day> {
    match try_fetch(url).await {
        Ok(days) => {
            tracing::info!("Fetched {} days from {}", days.len(), url);
            days
        }
        Err(e) => {
            tracing::warn!("Schedule fetch failed ({}), continuing with empty plan", e);
            Vec::new()
        }
    }
}

async fn try_fetch(url: &str) -> Result<Vec<Day>, ScheduleError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let response = client
        .get(url)
        .header("User-Agent", "Tripboard/0.1")
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(ScheduleError::Status(response.status()));
    }
    let body = response.text().await?;
    parse(&body)
}

/// Sort each day's items ascending by lexical time string.
///
/// The sort is stable; items with equal or empty time keep their input
/// order, and empty time sorts first.
pub fn normalize(days: &mut [Day]) {
    for day in days {
        day.items.sort_by(|a, b| a.time.cmp(&b.time));
    }
}
