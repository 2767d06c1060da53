//! Achievement definitions and the single-pass unlock check.

use crate::model::Profile;

/// One achievement: a stable id, a display description, and an unlock
/// predicate over the profile.
#[derive(Clone, Copy)]
pub struct AchievementDef {
    pub id: &'static str,
    pub description: &'static str,
    pub condition: fn(&Profile) -> bool,
}

/// The fixed, ordered achievement table. Evaluation follows this order.
pub static ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "correct_5",
        description: "Answer 5 questions correctly",
        condition: |p| p.correct_count >= 5,
    },
    AchievementDef {
        id: "correct_20",
        description: "Answer 20 questions correctly",
        condition: |p| p.correct_count >= 20,
    },
    AchievementDef {
        id: "correct_100",
        description: "Answer 100 questions correctly",
        condition: |p| p.correct_count >= 100,
    },
    AchievementDef {
        id: "streak_5",
        description: "Earn a 5 answer streak",
        condition: |p| p.best_streak >= 5,
    },
    AchievementDef {
        id: "streak_10",
        description: "Earn a 10 answer streak",
        condition: |p| p.best_streak >= 10,
    },
    AchievementDef {
        id: "coins_500",
        description: "Collect 500 coins",
        condition: |p| p.coins >= 500,
    },
];

/// Evaluate every not-yet-unlocked achievement against the current profile.
///
/// Marks newly satisfied ones in `profile.achievements` and returns their
/// ids in definition order. Single pass: an unlock during the call never
/// re-triggers evaluation of earlier definitions. The caller persists.
pub fn check(profile: &mut Profile) -> Vec<&'static str> {
    let mut unlocked = Vec::new();
    for def in ACHIEVEMENTS {
        let already = profile.achievements.get(def.id).copied().unwrap_or(false);
        if !already && (def.condition)(profile) {
            profile.achievements.insert(def.id.to_string(), true);
            unlocked.push(def.id);
        }
    }
    unlocked
}

/// Look up an achievement definition by id.
#[must_use]
pub fn definition(id: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|def| def.id == id)
}
