use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Gameplay settings consumed by the session engine.
///
/// Filter sets hold canonical slugs; an empty set means "no filter".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Questions per session; the engine clamps this to at least 1.
    pub question_count: u32,
    pub timer_mode: bool,
    pub categories_selected: BTreeSet<String>,
    pub sub_categories_selected: BTreeSet<String>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            question_count: 10,
            timer_mode: false,
            categories_selected: BTreeSet::new(),
            sub_categories_selected: BTreeSet::new(),
        }
    }
}

impl GameSettings {
    /// True when no category or subcategory filter is active.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.categories_selected.is_empty() && self.sub_categories_selected.is_empty()
    }
}
