use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::model::Question;

/// Session window when timer mode is on.
pub const TIMED_WINDOW_SECS: i64 = 20;
/// Session window when timer mode is off.
pub const UNTIMED_WINDOW_SECS: i64 = 300;

/// One playthrough: a fixed sequence of questions with live scoring state.
///
/// Ephemeral; folded into the [`crate::model::Profile`] at completion and
/// never persisted on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub questions: Vec<Question>,
    pub current_index: usize,
    pub timed_mode: bool,
    pub lives: u32,
    pub start_time: DateTime<Utc>,
    pub target_end_time: DateTime<Utc>,
    pub current_question_start: DateTime<Utc>,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub streak: u32,
    pub max_streak: u32,
    pub is_complete: bool,
    pub coins_earned: i64,
    pub answer_times_ms: Vec<u32>,
    pub category_correct_counts: HashMap<String, u32>,
    pub category_wrong_counts: HashMap<String, u32>,
    pub subcategory_correct_counts: HashMap<String, u32>,
    pub subcategory_wrong_counts: HashMap<String, u32>,
    pub buff_usage_counts: HashMap<String, u32>,
}

impl Session {
    /// Start a session over a non-empty, already shuffled question list.
    #[must_use]
    pub fn new(questions: Vec<Question>, timed_mode: bool, lives: u32, now: DateTime<Utc>) -> Self {
        let window = if timed_mode {
            TIMED_WINDOW_SECS
        } else {
            UNTIMED_WINDOW_SECS
        };
        Self {
            questions,
            current_index: 0,
            timed_mode,
            lives,
            start_time: now,
            target_end_time: now + Duration::seconds(window),
            current_question_start: now,
            correct_count: 0,
            incorrect_count: 0,
            streak: 0,
            max_streak: 0,
            is_complete: false,
            coins_earned: 0,
            answer_times_ms: Vec::new(),
            category_correct_counts: HashMap::new(),
            category_wrong_counts: HashMap::new(),
            subcategory_correct_counts: HashMap::new(),
            subcategory_wrong_counts: HashMap::new(),
            buff_usage_counts: HashMap::new(),
        }
    }

    /// Degenerate zero-question session, already complete.
    ///
    /// Produced when the filters leave nothing to play; consumers must
    /// handle it without a current question.
    #[must_use]
    pub fn empty_complete(now: DateTime<Utc>) -> Self {
        let mut session = Self::new(Vec::new(), false, 0, now);
        session.is_complete = true;
        session
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn current_question_mut(&mut self) -> Option<&mut Question> {
        self.questions.get_mut(self.current_index)
    }

    /// True when the cursor sits on the final question.
    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answer_times_ms.len()
    }
}
