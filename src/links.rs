//! Category display mapping and external map-service URLs

use crate::schedule::{Category, MapPoint};

/// Display label for an activity category
pub fn category_label(cat: Category) -> &'static str {
    match cat {
        Category::Move => "🚐 Transit",
        Category::Stay => "🏨 Stay",
        Category::Food => "🍴 Food",
        Category::Sight => "📍 Sights",
        Category::Free => "🧭 Free",
    }
}

/// Marker color for a category, as (r, g, b)
pub fn category_color(cat: Category) -> (u8, u8, u8) {
    match cat {
        Category::Move => (0x60, 0xa5, 0xfa),
        Category::Stay => (0xf5, 0x9e, 0x0b),
        Category::Food => (0xef, 0x44, 0x44),
        Category::Sight => (0x10, 0xb9, 0x81),
        Category::Free => (0xa7, 0x8b, 0xfa),
    }
}

/// Single-place search link for a free-text or coordinate query
pub fn search_url(query: &str) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={}",
        urlencoding::encode(query)
    )
}

/// Multi-stop driving route through the day's points, in list order.
///
/// Uses each point's geocodable query; points without one are skipped.
/// Zero usable points yields no link, one yields a plain search link,
/// two or more yield a directions link with intermediate stops as
/// `%7C`-separated waypoints.
pub fn route_url(points: &[MapPoint]) -> Option<String> {
    let queries: Vec<&str> = points
        .iter()
        .map(|p| p.g.as_str())
        .filter(|g| !g.is_empty())
        .collect();

    match queries.len() {
        0 => None,
        1 => Some(search_url(queries[0])),
        _ => {
            let origin = urlencoding::encode(queries[0]).into_owned();
            let destination = urlencoding::encode(queries[queries.len() - 1]).into_owned();
            let waypoints = queries[1..queries.len() - 1]
                .iter()
                .map(|q| urlencoding::encode(q).into_owned())
                .collect::<Vec<_>>()
                .join("%7C");
            let base = format!(
                "https://www.google.com/maps/dir/?api=1&origin={}&destination={}",
                origin, destination
            );
            if waypoints.is_empty() {
                Some(format!("{}&travelmode=driving", base))
            } else {
                Some(format!("{}&waypoints={}&travelmode=driving", base, waypoints))
            }
        }
    }
}
