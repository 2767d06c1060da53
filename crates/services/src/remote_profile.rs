use std::collections::{BTreeSet, HashMap};
use std::env;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use trivia_core::model::{
    Buff, GameSettings, Profile, from_stored_multiplier, to_stored_multiplier,
};

use crate::error::RemoteProfileError;

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
    pub account_id: String,
}

impl RemoteConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("TRIVIA_SYNC_URL").ok()?;
        let api_key = env::var("TRIVIA_SYNC_API_KEY").ok()?;
        if base_url.trim().is_empty() || api_key.trim().is_empty() {
            return None;
        }
        let account_id = env::var("TRIVIA_SYNC_ACCOUNT").unwrap_or_else(|_| "local".into());
        Some(Self {
            base_url,
            api_key,
            account_id,
        })
    }
}

/// Pushes the profile to a PostgREST-style table keyed by account id, and
/// pulls it back with the legacy-row fallbacks applied.
pub struct RemoteProfileStore {
    client: Client,
    config: RemoteConfig,
}

impl RemoteProfileStore {
    #[must_use]
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/trivia_profiles",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Insert-or-replace the row for this account.
    ///
    /// # Errors
    ///
    /// Returns `RemoteProfileError` when the request fails or the server
    /// answers with a non-success status.
    pub async fn upsert(
        &self,
        profile: &Profile,
        settings: &GameSettings,
    ) -> Result<(), RemoteProfileError> {
        let row = ProfileRow::from_profile(&self.config.account_id, profile, settings);

        let response = self
            .client
            .post(self.table_url())
            .query(&[("on_conflict", "profile_id")])
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&row)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteProfileError::HttpStatus(response.status()));
        }
        Ok(())
    }

    /// Fetch the stored row for this account, if any.
    ///
    /// # Errors
    ///
    /// Returns `RemoteProfileError` when the request fails or the server
    /// answers with a non-success status.
    pub async fn fetch(&self) -> Result<Option<(Profile, GameSettings)>, RemoteProfileError> {
        let filter = format!("eq.{}", self.config.account_id);
        let response = self
            .client
            .get(self.table_url())
            .query(&[("profile_id", filter.as_str()), ("select", "*")])
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteProfileError::HttpStatus(response.status()));
        }

        let rows: Vec<ProfileRow> = response.json().await?;
        Ok(rows.into_iter().next().map(ProfileRow::into_profile))
    }
}

/// Wire row for the `trivia_profiles` table. Buff multipliers travel as
/// integer percentages; old rows only carry `best_score`, so the decode side
/// falls back to it for the streak and score fields.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ProfileRow {
    profile_id: String,
    total_coins: i64,
    coins_spent_store: i64,
    coins_spent_game: i64,
    buff_coin_multiplier: i64,
    buff_correct_multiplier: i64,
    buff_skip_discount: i64,
    extra_life: bool,
    idol_level: u32,
    streak: u32,
    lives: u32,
    total_correct: u32,
    level: u32,
    milestone_progress: u32,
    best_score: u32,
    achievements: HashMap<String, bool>,
    ratio_scores: HashMap<String, f64>,
    #[serde(rename = "subcat_correct_counts")]
    subcategory_correct_counts: HashMap<String, u32>,
    #[serde(rename = "subcat_wrong_counts")]
    subcategory_wrong_counts: HashMap<String, u32>,
    category_correct_counts: HashMap<String, u32>,
    category_wrong_counts: HashMap<String, u32>,
    selected_categories: BTreeSet<String>,
    selected_subcategories: BTreeSet<String>,
    settings: SettingsEnvelope,
    total_questions_answered: u32,
    total_sessions_played: u32,
    highest_game_score: u32,
    average_game_score: f64,
    max_streak: u32,
    average_answer_time_ms: Option<u32>,
    fastest_answer_time_ms: Option<u32>,
    slowest_answer_time_ms: Option<u32>,
    buff_usage_counts: HashMap<String, u32>,
    first_played_at: Option<DateTime<Utc>>,
    last_played_at: Option<DateTime<Utc>>,
}

/// Nested settings payload; carries the display-adjacent profile fields that
/// historically rode along in the settings column.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SettingsEnvelope {
    timer_mode: bool,
    question_count: u32,
    categories_selected: BTreeSet<String>,
    sub_categories_selected: BTreeSet<String>,
    owned_avatars: BTreeSet<u32>,
    owned_schemes: BTreeSet<u32>,
    owned_buffs: BTreeSet<u32>,
    has_seen_lives_tutorial: bool,
    has_seen_question_mark_tutorial: bool,
    has_seen_category_tutorial: bool,
    incorrect_count: u32,
}

impl ProfileRow {
    fn from_profile(account_id: &str, profile: &Profile, settings: &GameSettings) -> Self {
        let envelope = SettingsEnvelope {
            timer_mode: settings.timer_mode,
            question_count: settings.question_count,
            categories_selected: settings.categories_selected.clone(),
            sub_categories_selected: settings.sub_categories_selected.clone(),
            owned_avatars: profile.owned_avatars.clone(),
            owned_schemes: profile.owned_schemes.clone(),
            owned_buffs: profile.owned_buffs.clone(),
            has_seen_lives_tutorial: profile.has_seen_lives_tutorial,
            has_seen_question_mark_tutorial: profile.has_seen_question_mark_tutorial,
            has_seen_category_tutorial: profile.has_seen_category_tutorial,
            incorrect_count: profile.incorrect_count,
        };

        Self {
            profile_id: account_id.to_string(),
            total_coins: profile.coins,
            coins_spent_store: profile.coins_spent_store,
            coins_spent_game: profile.coins_spent_game,
            buff_coin_multiplier: to_stored_multiplier(profile.buffs.coin_multiplier),
            buff_correct_multiplier: to_stored_multiplier(profile.buffs.correct_multiplier),
            buff_skip_discount: to_stored_multiplier(profile.buffs.skip_cost_multiplier),
            extra_life: profile.buffs.extra_life,
            idol_level: profile.idol_level,
            streak: profile.streak,
            lives: profile.lives,
            total_correct: profile.correct_count,
            level: profile.level,
            milestone_progress: profile.milestone_progress,
            best_score: profile.highest_game_score,
            achievements: profile.achievements.clone(),
            ratio_scores: profile.ratio_scores.clone(),
            subcategory_correct_counts: profile.subcategory_correct_counts.clone(),
            subcategory_wrong_counts: profile.subcategory_wrong_counts.clone(),
            category_correct_counts: profile.category_correct_counts.clone(),
            category_wrong_counts: profile.category_wrong_counts.clone(),
            selected_categories: settings.categories_selected.clone(),
            selected_subcategories: settings.sub_categories_selected.clone(),
            settings: envelope,
            total_questions_answered: profile.total_questions_answered,
            total_sessions_played: profile.total_sessions_played,
            highest_game_score: profile.highest_game_score,
            average_game_score: profile.average_game_score,
            max_streak: profile.max_streak,
            average_answer_time_ms: profile.average_answer_time_ms,
            fastest_answer_time_ms: profile.fastest_answer_time_ms,
            slowest_answer_time_ms: profile.slowest_answer_time_ms,
            buff_usage_counts: profile.buff_usage_counts.clone(),
            first_played_at: profile.first_played_at,
            last_played_at: profile.last_played_at,
        }
    }

    fn into_profile(self) -> (Profile, GameSettings) {
        // Rows written before max_streak and highest_game_score existed
        // carry the value in best_score.
        let streak_fallback = if self.max_streak > 0 {
            self.max_streak
        } else {
            self.best_score
        };
        let highest = if self.highest_game_score > 0 {
            self.highest_game_score
        } else {
            self.best_score
        };

        let envelope = self.settings;
        let settings = GameSettings {
            question_count: if envelope.question_count == 0 {
                GameSettings::default().question_count
            } else {
                envelope.question_count
            },
            timer_mode: envelope.timer_mode,
            categories_selected: envelope.categories_selected,
            sub_categories_selected: envelope.sub_categories_selected,
        };

        let profile = Profile {
            coins: self.total_coins,
            streak: self.streak,
            lives: self.lives,
            buffs: Buff {
                coin_multiplier: from_stored_multiplier(self.buff_coin_multiplier),
                correct_multiplier: from_stored_multiplier(self.buff_correct_multiplier),
                skip_cost_multiplier: from_stored_multiplier(self.buff_skip_discount),
                extra_life: self.extra_life,
                ..Buff::default()
            },
            idol_level: self.idol_level,
            correct_count: self.total_correct,
            incorrect_count: envelope.incorrect_count,
            achievements: self.achievements,
            level: self.level,
            milestone_progress: self.milestone_progress,
            owned_avatars: if envelope.owned_avatars.is_empty() {
                BTreeSet::from([0])
            } else {
                envelope.owned_avatars
            },
            owned_schemes: if envelope.owned_schemes.is_empty() {
                BTreeSet::from([0])
            } else {
                envelope.owned_schemes
            },
            owned_buffs: envelope.owned_buffs,
            best_streak: streak_fallback,
            max_streak: streak_fallback,
            has_seen_lives_tutorial: envelope.has_seen_lives_tutorial,
            has_seen_question_mark_tutorial: envelope.has_seen_question_mark_tutorial,
            has_seen_category_tutorial: envelope.has_seen_category_tutorial,
            total_questions_answered: self.total_questions_answered,
            total_sessions_played: self.total_sessions_played,
            highest_game_score: highest,
            average_game_score: self.average_game_score,
            average_answer_time_ms: self.average_answer_time_ms,
            fastest_answer_time_ms: self.fastest_answer_time_ms,
            slowest_answer_time_ms: self.slowest_answer_time_ms,
            first_played_at: self.first_played_at,
            last_played_at: self.last_played_at,
            coins_spent_store: self.coins_spent_store,
            coins_spent_game: self.coins_spent_game,
            category_correct_counts: self.category_correct_counts,
            category_wrong_counts: self.category_wrong_counts,
            subcategory_correct_counts: self.subcategory_correct_counts,
            subcategory_wrong_counts: self.subcategory_wrong_counts,
            buff_usage_counts: self.buff_usage_counts,
            ratio_scores: self.ratio_scores,
            ..Profile::default()
        };

        (profile, settings)
    }
}
