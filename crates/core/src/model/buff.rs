use serde::{Deserialize, Serialize};

/// Purchased gameplay modifiers applied while a session runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Buff {
    pub coin_multiplier: f64,
    pub correct_multiplier: f64,
    pub skip_cost_multiplier: f64,
    pub extra_life: bool,
    /// Identifier of the currently active buff, 0 when none.
    pub id: u32,
}

impl Default for Buff {
    fn default() -> Self {
        Self {
            coin_multiplier: 1.0,
            correct_multiplier: 1.0,
            skip_cost_multiplier: 1.0,
            extra_life: false,
            id: 0,
        }
    }
}

/// Encode a multiplier for persistence as an integer (`1.25` becomes `125`).
#[must_use]
pub fn to_stored_multiplier(multiplier: f64) -> i64 {
    (multiplier * 100.0).round() as i64
}

/// Decode a persisted multiplier integer.
///
/// Any stored value `<= 1` means "no multiplier" and decodes to `1.0`; this
/// guards against legacy rows that stored zero or the raw factor.
#[must_use]
pub fn from_stored_multiplier(stored: i64) -> f64 {
    if stored <= 1 {
        1.0
    } else {
        stored as f64 / 100.0
    }
}
