use trivia_core::model::Session;

/// Snapshot of how far a session has gone, for frontends and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn of(session: &Session) -> Self {
        let total = session.questions.len();
        let answered = session.answered_count();
        Self {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: session.is_complete,
        }
    }
}
