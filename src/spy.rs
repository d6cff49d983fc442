//! Scroll-spy: derive the "current" day from scroll position
//!
//! Evaluated once per rendering frame over the section top offsets
//! recorded during layout.

/// Tolerance for treating the viewport as having reached the bottom
const BOTTOM_EPSILON: f32 = 2.0;

/// Fraction of the viewport height added below the header when picking
/// the anchor line
const ANCHOR_FRACTION: f32 = 0.30;

/// Index of the active section.
///
/// At the document bottom the last section wins unconditionally.
/// Otherwise the anchor sits `header_offset + 30% of the viewport`
/// below the scroll position, and the last section whose top lies at or
/// above it is selected, defaulting to the first.
pub fn active_section(
    tops: &[f32],
    scroll_y: f32,
    viewport_h: f32,
    content_h: f32,
    header_offset: f32,
) -> Option<usize> {
    if tops.is_empty() {
        return None;
    }

    if scroll_y + viewport_h >= content_h - BOTTOM_EPSILON {
        return Some(tops.len() - 1);
    }

    let anchor = scroll_y + header_offset + viewport_h * ANCHOR_FRACTION;
    let mut current = 0;
    for (i, &top) in tops.iter().enumerate() {
        if top <= anchor {
            current = i;
        } else {
            break;
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPS: [f32; 3] = [0.0, 500.0, 1200.0];
    const VIEWPORT: f32 = 800.0;
    const HEADER: f32 = 84.0;
    const CONTENT: f32 = 3000.0;

    #[test]
    fn test_top_of_document_selects_first() {
        assert_eq!(active_section(&TOPS, 0.0, VIEWPORT, CONTENT, HEADER), Some(0));
    }

    #[test]
    fn test_mid_scroll_selects_matching_section() {
        // anchor = 1300 + 84 + 240 = 1624 >= 1200
        assert_eq!(active_section(&TOPS, 1300.0, VIEWPORT, CONTENT, HEADER), Some(2));
        // anchor = 200 + 84 + 240 = 524 >= 500 but < 1200
        assert_eq!(active_section(&TOPS, 200.0, VIEWPORT, CONTENT, HEADER), Some(1));
    }

    #[test]
    fn test_document_bottom_always_selects_last() {
        // Short content: even with the anchor inside section 1 the last wins
        assert_eq!(active_section(&TOPS, 500.0, VIEWPORT, 1300.0, HEADER), Some(2));
        // Exactly at the tolerance boundary
        assert_eq!(active_section(&TOPS, 498.0, VIEWPORT, 1300.0, HEADER), Some(2));
    }

    #[test]
    fn test_anchor_before_all_sections_defaults_to_first() {
        let tops = [100.0, 500.0];
        assert_eq!(active_section(&tops, 0.0, 10.0, 10_000.0, 0.0), Some(0));
    }

    #[test]
    fn test_empty_sections() {
        assert_eq!(active_section(&[], 0.0, VIEWPORT, CONTENT, HEADER), None);
    }
}
