use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use trivia_core::model::{GameSettings, Profile};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the durable player profile.
///
/// `load_profile` returns `None` on first run; defaulting is the caller's
/// job so every backend stays a dumb blob store.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch the stored profile, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or decoded.
    async fn load_profile(&self) -> Result<Option<Profile>, StorageError>;

    /// Persist the profile, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn save_profile(&self, profile: &Profile) -> Result<(), StorageError>;
}

/// Repository contract for gameplay settings.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Fetch the stored settings, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or decoded.
    async fn load_settings(&self) -> Result<Option<GameSettings>, StorageError>;

    /// Persist the settings, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the settings cannot be stored.
    async fn save_settings(&self, settings: &GameSettings) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    profile: Arc<Mutex<Option<Profile>>>,
    settings: Arc<Mutex<Option<GameSettings>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn load_profile(&self) -> Result<Option<Profile>, StorageError> {
        let guard = self
            .profile
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let mut guard = self
            .profile
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(profile.clone());
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for InMemoryRepository {
    async fn load_settings(&self) -> Result<Option<GameSettings>, StorageError> {
        let guard = self
            .settings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_settings(&self, settings: &GameSettings) -> Result<(), StorageError> {
        let mut guard = self
            .settings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(settings.clone());
        Ok(())
    }
}

/// Aggregates the player-state repositories behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub profiles: Arc<dyn ProfileRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let profiles: Arc<dyn ProfileRepository> = Arc::new(repo.clone());
        let settings: Arc<dyn SettingsRepository> = Arc::new(repo);
        Self { profiles, settings }
    }
}
