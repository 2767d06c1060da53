use chrono::Duration;
use trivia_core::model::{GameSettings, Profile};
use trivia_core::time::fixed_now;

use storage::repository::{ProfileRepository, SettingsRepository};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn profile_blob_round_trips() {
    let repo = connect("memdb_profile_roundtrip").await;

    assert!(repo.load_profile().await.unwrap().is_none());

    let mut profile = Profile::default();
    profile.coins = 250;
    profile.correct_count = 17;
    profile.best_streak = 6;
    profile.max_streak = 6;
    profile.achievements.insert("correct_5".into(), true);
    profile
        .category_correct_counts
        .insert("science".into(), 12);
    profile
        .subcategory_wrong_counts
        .insert("science__physics".into(), 3);
    profile.average_answer_time_ms = Some(840);
    profile.first_played_at = Some(fixed_now());
    profile.last_played_at = Some(fixed_now() + Duration::minutes(5));
    profile.recalculate_ratio_scores();

    repo.save_profile(&profile).await.unwrap();

    let loaded = repo.load_profile().await.unwrap().expect("stored profile");
    assert_eq!(loaded, profile);
}

#[tokio::test]
async fn profile_save_is_last_write_wins() {
    let repo = connect("memdb_profile_lww").await;

    let mut profile = Profile::default();
    profile.coins = 10;
    repo.save_profile(&profile).await.unwrap();

    profile.coins = 990;
    profile.total_sessions_played = 3;
    repo.save_profile(&profile).await.unwrap();

    let loaded = repo.load_profile().await.unwrap().unwrap();
    assert_eq!(loaded.coins, 990);
    assert_eq!(loaded.total_sessions_played, 3);
}

#[tokio::test]
async fn settings_blob_round_trips() {
    let repo = connect("memdb_settings_roundtrip").await;

    assert!(repo.load_settings().await.unwrap().is_none());

    let mut settings = GameSettings::default();
    settings.question_count = 15;
    settings.timer_mode = true;
    settings.categories_selected.insert("history".into());
    settings
        .sub_categories_selected
        .insert("history__world".into());

    repo.save_settings(&settings).await.unwrap();

    let loaded = repo.load_settings().await.unwrap().expect("stored settings");
    assert_eq!(loaded, settings);
}

#[tokio::test]
async fn migrate_is_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");

    let profile = Profile::default();
    repo.save_profile(&profile).await.unwrap();
    assert!(repo.load_profile().await.unwrap().is_some());
}
