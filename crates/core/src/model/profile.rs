use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Buff;

/// Correct-answer-count thresholds used for progress display.
pub const MILESTONES: [u32; 9] = [5, 15, 30, 50, 80, 120, 170, 230, 300];

/// The durable, cross-session player record.
///
/// Mutated throughout a session and on finalization; persisted at session
/// end and whenever settings or purchases change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub coins: i64,
    pub streak: u32,
    pub lives: u32,
    pub buffs: Buff,
    pub idol_level: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub achievements: HashMap<String, bool>,
    pub level: u32,
    pub milestones: Vec<u32>,
    pub milestone_progress: u32,
    pub owned_avatars: BTreeSet<u32>,
    pub owned_schemes: BTreeSet<u32>,
    pub owned_buffs: BTreeSet<u32>,
    pub best_streak: u32,
    pub max_streak: u32,
    pub has_seen_lives_tutorial: bool,
    pub has_seen_question_mark_tutorial: bool,
    pub has_seen_category_tutorial: bool,
    pub total_questions_answered: u32,
    pub total_sessions_played: u32,
    pub highest_game_score: u32,
    pub average_game_score: f64,
    pub average_answer_time_ms: Option<u32>,
    pub fastest_answer_time_ms: Option<u32>,
    pub slowest_answer_time_ms: Option<u32>,
    pub first_played_at: Option<DateTime<Utc>>,
    pub last_played_at: Option<DateTime<Utc>>,
    pub coins_spent_store: i64,
    pub coins_spent_game: i64,
    pub category_correct_counts: HashMap<String, u32>,
    pub category_wrong_counts: HashMap<String, u32>,
    pub subcategory_correct_counts: HashMap<String, u32>,
    pub subcategory_wrong_counts: HashMap<String, u32>,
    pub buff_usage_counts: HashMap<String, u32>,
    /// Per-slug accuracy in `[0, 1]`, derived; recomputed from the count
    /// maps at save time rather than updated incrementally.
    pub ratio_scores: HashMap<String, f64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            coins: 0,
            streak: 0,
            lives: 5,
            buffs: Buff::default(),
            idol_level: 0,
            correct_count: 0,
            incorrect_count: 0,
            achievements: HashMap::new(),
            level: 1,
            milestones: MILESTONES.to_vec(),
            milestone_progress: 0,
            owned_avatars: BTreeSet::from([0]),
            owned_schemes: BTreeSet::from([0]),
            owned_buffs: BTreeSet::new(),
            best_streak: 0,
            max_streak: 0,
            has_seen_lives_tutorial: false,
            has_seen_question_mark_tutorial: false,
            has_seen_category_tutorial: false,
            total_questions_answered: 0,
            total_sessions_played: 0,
            highest_game_score: 0,
            average_game_score: 0.0,
            average_answer_time_ms: None,
            fastest_answer_time_ms: None,
            slowest_answer_time_ms: None,
            first_played_at: None,
            last_played_at: None,
            coins_spent_store: 0,
            coins_spent_game: 0,
            category_correct_counts: HashMap::new(),
            category_wrong_counts: HashMap::new(),
            subcategory_correct_counts: HashMap::new(),
            subcategory_wrong_counts: HashMap::new(),
            buff_usage_counts: HashMap::new(),
            ratio_scores: HashMap::new(),
        }
    }
}

impl Profile {
    /// Fold one measured answer time into the running statistics.
    ///
    /// Expects `total_questions_answered` to already count the answer being
    /// recorded: the running average is
    /// `round((old_avg * (n - 1) + elapsed) / n)` with the post-increment
    /// total as `n`.
    pub fn record_answer_time(&mut self, elapsed_ms: u32) {
        let n = self.total_questions_answered;
        if n == 0 {
            return;
        }

        self.average_answer_time_ms = Some(match self.average_answer_time_ms {
            None => elapsed_ms,
            Some(old_avg) => {
                let updated =
                    (f64::from(old_avg) * f64::from(n - 1) + f64::from(elapsed_ms)) / f64::from(n);
                updated.round() as u32
            }
        });

        if self
            .fastest_answer_time_ms
            .is_none_or(|fastest| elapsed_ms < fastest)
        {
            self.fastest_answer_time_ms = Some(elapsed_ms);
        }
        if self
            .slowest_answer_time_ms
            .is_none_or(|slowest| elapsed_ms > slowest)
        {
            self.slowest_answer_time_ms = Some(elapsed_ms);
        }
    }

    /// Rebuild `ratio_scores` from the category and subcategory count maps.
    ///
    /// Ratios are rounded to four decimals; a slug with only wrong answers
    /// scores `0.0`. Runs on every save rather than incrementally.
    pub fn recalculate_ratio_scores(&mut self) {
        let mut ratios = HashMap::new();
        apply_ratios(
            &self.category_correct_counts,
            &self.category_wrong_counts,
            &mut ratios,
        );
        apply_ratios(
            &self.subcategory_correct_counts,
            &self.subcategory_wrong_counts,
            &mut ratios,
        );
        self.ratio_scores = ratios;
    }
}

fn apply_ratios(
    correct: &HashMap<String, u32>,
    wrong: &HashMap<String, u32>,
    target: &mut HashMap<String, f64>,
) {
    for (slug, &right) in correct {
        let missed = wrong.get(slug).copied().unwrap_or(0);
        let total = right + missed;
        if total > 0 {
            let ratio = f64::from(right) / f64::from(total);
            target.insert(slug.clone(), (ratio * 10_000.0).round() / 10_000.0);
        }
    }

    for (slug, &missed) in wrong {
        if missed > 0 && !correct.contains_key(slug) {
            target.insert(slug.clone(), 0.0);
        }
    }
}

/// Level step function over lifetime correct answers.
#[must_use]
pub fn level_for_correct(correct: u32) -> u32 {
    match correct {
        0..5 => 1,
        5..15 => 2,
        15..30 => 3,
        30..50 => 4,
        50..80 => 5,
        80..120 => 6,
        120..170 => 7,
        170..230 => 8,
        230..300 => 9,
        _ => 10,
    }
}
