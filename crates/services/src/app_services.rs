use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::profile_service::ProfileService;
use crate::question_bank::QuestionBank;
use crate::remote_profile::{RemoteConfig, RemoteProfileStore};
use crate::sessions::GameEngine;

/// Assembles the gameplay services over a chosen storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    question_bank: Arc<QuestionBank>,
    profiles: Arc<ProfileService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// Remote sync is attached when the `TRIVIA_SYNC_*` environment
    /// variables are present.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        question_bank: QuestionBank,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::assemble(storage, clock, question_bank))
    }

    /// Build services over the in-memory repository; used by tests and the
    /// ephemeral play mode.
    #[must_use]
    pub fn in_memory(clock: Clock, question_bank: QuestionBank) -> Self {
        Self::assemble(Storage::in_memory(), clock, question_bank)
    }

    fn assemble(storage: Storage, clock: Clock, question_bank: QuestionBank) -> Self {
        let mut profiles = ProfileService::new(storage.profiles, storage.settings);
        if let Some(config) = RemoteConfig::from_env() {
            tracing::info!(account = %config.account_id, "remote profile sync enabled");
            profiles = profiles.with_remote(Arc::new(RemoteProfileStore::new(config)));
        }

        Self {
            clock,
            question_bank: Arc::new(question_bank),
            profiles: Arc::new(profiles),
        }
    }

    #[must_use]
    pub fn profiles(&self) -> &Arc<ProfileService> {
        &self.profiles
    }

    #[must_use]
    pub fn question_bank(&self) -> &Arc<QuestionBank> {
        &self.question_bank
    }

    /// A fresh engine wired to this service set.
    #[must_use]
    pub fn engine(&self) -> GameEngine {
        GameEngine::new(Arc::clone(&self.question_bank), Arc::clone(&self.profiles))
            .with_clock(self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trivia_core::model::{GameSettings, Profile, Question};
    use trivia_core::time::fixed_clock;

    fn question(id: &str) -> Question {
        Question {
            id: id.into(),
            category: "Science".into(),
            sub_category: String::new(),
            prompt: "?".into(),
            choices: vec!["a".into(), "b".into()],
            answer_index: 0,
        }
    }

    #[tokio::test]
    async fn in_memory_services_play_a_session_end_to_end() {
        let services = AppServices::in_memory(
            fixed_clock(),
            QuestionBank::preloaded(vec![question("q1")]),
        );
        let mut engine = services.engine();
        let mut profile = services.profiles().load().await;

        engine.start_game(&GameSettings::default(), &profile).await;
        engine.submit_answer(&mut profile, 0).unwrap();
        engine.advance(&mut profile).await;

        let stored = services.profiles().load().await;
        assert_eq!(stored.total_sessions_played, 1);
        assert_eq!(stored.correct_count, 1);
    }
}
