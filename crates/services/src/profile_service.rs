use std::sync::Arc;

use storage::repository::{ProfileRepository, SettingsRepository};
use trivia_core::model::{GameSettings, Profile};

use crate::remote_profile::RemoteProfileStore;

/// Durable profile and settings access with gameplay-friendly failure
/// semantics: storage problems are logged, never surfaced to the session.
#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
    settings: Arc<dyn SettingsRepository>,
    remote: Option<Arc<RemoteProfileStore>>,
}

impl ProfileService {
    #[must_use]
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        settings: Arc<dyn SettingsRepository>,
    ) -> Self {
        Self {
            profiles,
            settings,
            remote: None,
        }
    }

    /// Mirror every profile save to a remote store as well.
    #[must_use]
    pub fn with_remote(mut self, remote: Arc<RemoteProfileStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// The stored profile, or a first-run default when nothing is stored
    /// or the store misbehaves.
    pub async fn load(&self) -> Profile {
        match self.profiles.load_profile().await {
            Ok(Some(profile)) => profile,
            Ok(None) => Profile::default(),
            Err(err) => {
                tracing::warn!(error = %err, "profile load failed, starting from defaults");
                Profile::default()
            }
        }
    }

    /// Recompute derived fields and persist the profile.
    ///
    /// Ratio scores are rebuilt from the count maps on every save. Local and
    /// remote failures are logged independently; neither blocks the caller.
    pub async fn save(&self, profile: &mut Profile) {
        profile.recalculate_ratio_scores();

        if let Err(err) = self.profiles.save_profile(profile).await {
            tracing::warn!(error = %err, "profile save failed");
        }

        if let Some(remote) = &self.remote {
            let settings = self.load_settings().await;
            if let Err(err) = remote.upsert(profile, &settings).await {
                tracing::warn!(error = %err, "remote profile upsert failed");
            }
        }
    }

    /// Stored game settings, or defaults when absent or unreadable.
    pub async fn load_settings(&self) -> GameSettings {
        match self.settings.load_settings().await {
            Ok(Some(settings)) => settings,
            Ok(None) => GameSettings::default(),
            Err(err) => {
                tracing::warn!(error = %err, "settings load failed, using defaults");
                GameSettings::default()
            }
        }
    }

    /// Persist game settings; failures are logged and swallowed.
    pub async fn save_settings(&self, settings: &GameSettings) {
        if let Err(err) = self.settings.save_settings(settings).await {
            tracing::warn!(error = %err, "settings save failed");
        }
    }
}
