//! Global item-category filter
//!
//! One enabled-set across the whole document; independent of per-day map
//! layer toggles.

use crate::schedule::Category;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct FilterState {
    enabled: BTreeSet<Category>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            enabled: Category::ALL.into_iter().collect(),
        }
    }
}

impl FilterState {
    pub fn is_enabled(&self, cat: Category) -> bool {
        self.enabled.contains(&cat)
    }

    pub fn set_enabled(&mut self, cat: Category, on: bool) {
        if on {
            self.enabled.insert(cat);
        } else {
            self.enabled.remove(&cat);
        }
    }

    pub fn toggle(&mut self, cat: Category) {
        let on = self.is_enabled(cat);
        self.set_enabled(cat, !on);
    }

    /// Visibility rule for a rendered item row
    pub fn is_visible(&self, cat: Category) -> bool {
        self.is_enabled(cat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_enabled_initially() {
        let f = FilterState::default();
        for cat in Category::ALL {
            assert!(f.is_visible(cat));
        }
    }

    #[test]
    fn test_disable_hides_exactly_that_category() {
        let mut f = FilterState::default();
        f.set_enabled(Category::Food, false);
        assert!(!f.is_visible(Category::Food));
        for cat in Category::ALL {
            if cat != Category::Food {
                assert!(f.is_visible(cat));
            }
        }
    }

    #[test]
    fn test_reenable_restores() {
        let mut f = FilterState::default();
        f.set_enabled(Category::Move, false);
        f.set_enabled(Category::Move, true);
        assert!(f.is_visible(Category::Move));
    }

    #[test]
    fn test_toggle_pairs_are_idempotent() {
        let mut f = FilterState::default();
        f.toggle(Category::Sight);
        f.toggle(Category::Sight);
        assert!(f.is_visible(Category::Sight));
    }
}
