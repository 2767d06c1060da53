use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;

use crate::repository::{ProfileRepository, SettingsRepository, StorageError};
use trivia_core::model::{GameSettings, Profile};

use super::SqliteRepository;

const PROFILE_KEY: &str = "profile";
const SETTINGS_KEY: &str = "settings";

impl SqliteRepository {
    async fn get_blob<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let row = sqlx::query("SELECT value FROM player_state WHERE key = ?1")
            .bind(key)
            .fetch_optional(self.pool())
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value: String = row
            .try_get("value")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        serde_json::from_str(&value)
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn put_blob<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(value)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO player_state (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(encoded)
        .bind(Utc::now())
        .execute(self.pool())
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for SqliteRepository {
    async fn load_profile(&self) -> Result<Option<Profile>, StorageError> {
        self.get_blob(PROFILE_KEY).await
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        self.put_blob(PROFILE_KEY, profile).await
    }
}

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn load_settings(&self) -> Result<Option<GameSettings>, StorageError> {
        self.get_blob(SETTINGS_KEY).await
    }

    async fn save_settings(&self, settings: &GameSettings) -> Result<(), StorageError> {
        self.put_blob(SETTINGS_KEY, settings).await
    }
}
