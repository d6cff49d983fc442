//! Itinerary-to-view projection
//!
//! Turns the loaded day list into display-ready day cards plus the
//! navigation index. Pure data transformation; all interaction state
//! lives in the controllers.

use crate::links;
use crate::schedule::{Category, Day, Item};

/// Everything the viewer renders, derived once from the day list
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub days: Vec<DayCard>,
    pub nav: Vec<NavEntry>,
}

/// One self-contained day section
#[derive(Debug, Clone)]
pub struct DayCard {
    pub id: String,
    pub date: String,
    pub title: String,
    pub is_today: bool,
    pub point: Option<String>,
    pub prep: Option<String>,
    pub items: Vec<ItemRow>,
    /// Present only when the day has at least one geolocated point
    pub toolbar: Option<MapToolbar>,
}

/// A single rendered activity row
#[derive(Debug, Clone)]
pub struct ItemRow {
    pub time: String,
    pub text: String,
    pub category: Category,
    pub label: &'static str,
    /// "Open in map" action, when a query could be resolved
    pub map_url: Option<String>,
}

/// Per-day map controls
#[derive(Debug, Clone)]
pub struct MapToolbar {
    /// External multi-stop route link; absent when no point has a query
    pub route_url: Option<String>,
    /// Categories present among the day's valid points, in display order
    pub categories: Vec<Category>,
}

/// One navigation index entry
#[derive(Debug, Clone)]
pub struct NavEntry {
    pub day_id: String,
    pub date_main: String,
    pub date_sub: String,
    /// Title contains a directional separator ("A → B")
    pub is_transit: bool,
}

/// Project the day list into the full document.
///
/// `today` is the caller's notion of the current date, compared once
/// against each day's declared date string.
pub fn build(days: &[Day], today: &str) -> Document {
    let cards = days.iter().map(|d| build_card(d, today)).collect();
    let nav = days.iter().map(build_nav_entry).collect();
    Document { days: cards, nav }
}

fn build_card(day: &Day, today: &str) -> DayCard {
    let items = day
        .items
        .iter()
        .map(|it| ItemRow {
            time: it.time.clone(),
            text: it.text.clone(),
            category: it.category,
            label: links::category_label(it.category),
            map_url: resolve_map_query(it, day).map(|q| links::search_url(&q)),
        })
        .collect();

    let toolbar = if day.has_valid_points() {
        // The external route only ever visits renderable points
        let points: Vec<_> = day.valid_points().cloned().collect();
        Some(MapToolbar {
            route_url: links::route_url(&points),
            categories: present_categories(day),
        })
    } else {
        None
    };

    DayCard {
        id: day.id.clone(),
        date: day.date.clone(),
        title: day.title.clone(),
        is_today: !day.date.is_empty() && day.date == today,
        point: day.point.clone(),
        prep: day.prep.clone(),
        items,
        toolbar,
    }
}

fn build_nav_entry(day: &Day) -> NavEntry {
    let mut parts = day.date.splitn(2, ' ');
    let date_main = parts.next().unwrap_or("").to_string();
    let date_sub = parts.next().unwrap_or("").to_string();
    NavEntry {
        day_id: day.id.clone(),
        date_main,
        date_sub,
        is_transit: day.title.contains('→'),
    }
}

/// Categories with at least one valid point, in fixed display order
fn present_categories(day: &Day) -> Vec<Category> {
    Category::ALL
        .into_iter()
        .filter(|c| day.valid_points().any(|p| p.cat == *c))
        .collect()
}

/// Resolve the map query for an item, first match wins:
/// 1. the item's explicit `poi` field,
/// 2. the first parenthesized substring of the item text,
/// 3. case-insensitive containment of any day point's name or query
///    inside the item text, first point in the day's list wins.
///
/// The containment step is a fuzzy, order-dependent heuristic; content
/// relies on its current matches, so the priority must stay as-is.
fn resolve_map_query(item: &Item, day: &Day) -> Option<String> {
    if let Some(poi) = item.poi.as_deref() {
        if !poi.is_empty() {
            return Some(poi.to_string());
        }
    }

    if let Some(inner) = parenthesized(&item.text) {
        return Some(inner.to_string());
    }

    let text = item.text.to_lowercase();
    for p in &day.map {
        let name = p.name.to_lowercase();
        let g = p.g.to_lowercase();
        if (!name.is_empty() && text.contains(&name)) || (!g.is_empty() && text.contains(&g)) {
            let q = if p.g.is_empty() { &p.name } else { &p.g };
            return Some(q.clone());
        }
    }

    None
}

/// First non-empty `(...)` substring of the text, if any; empty pairs
/// are skipped, not terminal
fn parenthesized(text: &str) -> Option<&str> {
    let mut rest = text;
    while let Some(start) = rest.find('(') {
        let tail = &rest[start + 1..];
        let end = tail.find(')')?;
        if end > 0 {
            return Some(&tail[..end]);
        }
        rest = &tail[end + 1..];
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{parse, MapPoint};

    fn day_with_points(points: Vec<MapPoint>) -> Day {
        Day {
            id: "d1".to_string(),
            map: points,
            ..Default::default()
        }
    }

    fn valid_point(name: &str, g: &str, cat: Category) -> MapPoint {
        MapPoint {
            name: name.to_string(),
            g: g.to_string(),
            lat: Some(10.0),
            lng: Some(106.0),
            cat,
        }
    }

    #[test]
    fn test_no_toolbar_without_valid_points() {
        let mut day = day_with_points(vec![MapPoint {
            name: "no coords".to_string(),
            g: "no coords".to_string(),
            ..Default::default()
        }]);
        day.date = "2025-10-04".to_string();
        let doc = build(&[day], "2025-10-05");
        assert!(doc.days[0].toolbar.is_none());
        assert!(!doc.days[0].is_today);
    }

    #[test]
    fn test_toolbar_lists_present_categories_in_order() {
        let day = day_with_points(vec![
            valid_point("a", "a", Category::Food),
            valid_point("b", "b", Category::Sight),
            valid_point("c", "c", Category::Food),
        ]);
        let doc = build(&[day], "");
        let toolbar = doc.days[0].toolbar.as_ref().unwrap();
        assert_eq!(toolbar.categories, vec![Category::Sight, Category::Food]);
        assert!(toolbar.route_url.is_some());
    }

    #[test]
    fn test_route_link_skips_invalid_points() {
        let mut points = vec![
            valid_point("A", "A", Category::Sight),
            valid_point("B", "B", Category::Sight),
        ];
        points.insert(
            1,
            MapPoint {
                name: "ghost".to_string(),
                g: "ghost".to_string(),
                ..Default::default()
            },
        );
        let day = day_with_points(points);
        let doc = build(&[day], "");
        let url = doc.days[0].toolbar.as_ref().unwrap().route_url.as_ref().unwrap();
        assert!(url.contains("origin=A"));
        assert!(url.contains("destination=B"));
        assert!(!url.contains("ghost"));
    }

    #[test]
    fn test_poi_takes_priority_over_parentheses() {
        let mut day = day_with_points(vec![valid_point("Palace", "Palace", Category::Sight)]);
        day.items.push(Item {
            time: "09:00".to_string(),
            text: "Morning walk (Old Town)".to_string(),
            poi: Some("Central Market".to_string()),
            ..Default::default()
        });
        let doc = build(&[day], "");
        let url = doc.days[0].items[0].map_url.as_ref().unwrap();
        assert!(url.contains("Central%20Market"));
    }

    #[test]
    fn test_parenthesized_text_beats_point_matching() {
        let mut day = day_with_points(vec![valid_point("Palace", "Palace", Category::Sight)]);
        day.items.push(Item {
            time: "09:00".to_string(),
            text: "Visit the Palace (West Gate)".to_string(),
            ..Default::default()
        });
        let doc = build(&[day], "");
        let url = doc.days[0].items[0].map_url.as_ref().unwrap();
        assert!(url.contains("West%20Gate"));
    }

    #[test]
    fn test_empty_parentheses_skipped_for_later_group() {
        let mut day = day_with_points(vec![valid_point("Walk", "Walk Street", Category::Sight)]);
        day.items.push(Item {
            time: "19:00".to_string(),
            text: "Walk () then dinner (Bistro Y)".to_string(),
            ..Default::default()
        });
        let doc = build(&[day], "");
        let url = doc.days[0].items[0].map_url.as_ref().unwrap();
        assert!(url.contains("Bistro%20Y"));
    }

    #[test]
    fn test_point_name_containment_first_match_wins() {
        let mut day = day_with_points(vec![
            valid_point("River Cruise", "River Cruise Pier 3", Category::Sight),
            valid_point("Cruise", "Cruise Terminal", Category::Move),
        ]);
        day.items.push(Item {
            time: "18:00".to_string(),
            text: "Evening river cruise with dinner".to_string(),
            ..Default::default()
        });
        let doc = build(&[day], "");
        let url = doc.days[0].items[0].map_url.as_ref().unwrap();
        // First point in the day's list matches via its name
        assert!(url.contains("River%20Cruise%20Pier%203"));
    }

    #[test]
    fn test_no_match_means_no_action() {
        let mut day = day_with_points(vec![valid_point("Palace", "Palace", Category::Sight)]);
        day.items.push(Item {
            time: "12:00".to_string(),
            text: "Lunch somewhere".to_string(),
            ..Default::default()
        });
        let doc = build(&[day], "");
        assert!(doc.days[0].items[0].map_url.is_none());
    }

    #[test]
    fn test_nav_entry_transit_detection_and_date_split() {
        let mut a = Day {
            id: "a".to_string(),
            date: "10/4 (Sat)".to_string(),
            title: "Hanoi → Ha Long".to_string(),
            ..Default::default()
        };
        let b = Day {
            id: "b".to_string(),
            date: "10/5".to_string(),
            title: "Ha Long Bay".to_string(),
            ..Default::default()
        };
        a.items.clear();
        let doc = build(&[a, b], "");
        assert!(doc.nav[0].is_transit);
        assert_eq!(doc.nav[0].date_main, "10/4");
        assert_eq!(doc.nav[0].date_sub, "(Sat)");
        assert!(!doc.nav[1].is_transit);
        assert_eq!(doc.nav[1].date_sub, "");
    }

    #[test]
    fn test_today_highlight_is_plain_date_equality() {
        let day = Day {
            id: "d".to_string(),
            date: "2025-10-04".to_string(),
            ..Default::default()
        };
        let doc = build(&[day.clone()], "2025-10-04");
        assert!(doc.days[0].is_today);
        let doc = build(&[day], "2025-10-05");
        assert!(!doc.days[0].is_today);
    }

    #[test]
    fn test_full_day_projection() {
        let days = parse(
            r#"{"days":[{"id":"d1","date":"2025-10-04","title":"A",
                "items":[{"time":"09:00","type":"sight","text":"Visit X (Landmark X)"}],
                "map":[{"name":"Landmark X","g":"Landmark X","lat":10.0,"lng":106.0,"cat":"sight"}]}]}"#,
        )
        .unwrap();
        let doc = build(&days, "2025-10-04");

        assert_eq!(doc.days.len(), 1);
        let card = &doc.days[0];
        assert!(card.is_today);
        assert_eq!(card.items.len(), 1);
        let url = card.items[0].map_url.as_ref().unwrap();
        assert!(url.contains("Landmark%20X"));
        let toolbar = card.toolbar.as_ref().unwrap();
        assert_eq!(toolbar.categories, vec![Category::Sight]);
    }
}
