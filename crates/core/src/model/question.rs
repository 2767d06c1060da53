use serde::{Deserialize, Serialize};

/// A single multiple-choice question as loaded from the question file.
///
/// Immutable after load, except that [`crate::catalog::normalize_question`]
/// overwrites `sub_category` with its canonical slug the first time the
/// question's category is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default, alias = "Id")]
    pub id: String,
    #[serde(default, alias = "Category")]
    pub category: String,
    #[serde(default, alias = "SubCategory", alias = "subcategory")]
    pub sub_category: String,
    #[serde(default, alias = "Prompt")]
    pub prompt: String,
    #[serde(default, alias = "Choices")]
    pub choices: Vec<String>,
    #[serde(default, alias = "AnswerIndex")]
    pub answer_index: usize,
}

impl Question {
    /// True when `answer_index` points at one of the choices.
    ///
    /// Loaded questions are expected to satisfy this; the bank drops any
    /// row that does not.
    #[must_use]
    pub fn answer_in_bounds(&self) -> bool {
        self.answer_index < self.choices.len()
    }

    /// True when the submitted choice index matches the answer.
    ///
    /// The submitted index may be any value; only equality counts.
    #[must_use]
    pub fn is_correct(&self, choice_index: usize) -> bool {
        choice_index == self.answer_index
    }
}
