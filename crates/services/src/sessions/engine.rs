use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use trivia_core::model::{GameSettings, Profile, Question, Session, level_for_correct};
use trivia_core::{Clock, achievements, catalog, time};

use crate::notify::ChangeNotifier;
use crate::profile_service::ProfileService;
use crate::question_bank::{QuestionBank, shuffle_with};
use super::progress::SessionProgress;

/// Result of submitting one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub newly_unlocked: Vec<&'static str>,
}

/// The session state machine: `NotStarted → InProgress → Complete`.
///
/// Drives one session at a time over a shuffled question list, mutating the
/// caller's [`Profile`] on every answer and folding session aggregates into
/// it exactly once at completion. Every entry point except [`start_game`]
/// treats a missing session or question as a benign no-op.
///
/// [`start_game`]: GameEngine::start_game
pub struct GameEngine {
    clock: Clock,
    bank: Arc<QuestionBank>,
    profiles: Arc<ProfileService>,
    rng: StdRng,
    session: Option<Session>,
    hidden_choices: HashSet<usize>,
    notifier: ChangeNotifier,
}

impl GameEngine {
    #[must_use]
    pub fn new(bank: Arc<QuestionBank>, profiles: Arc<ProfileService>) -> Self {
        Self {
            clock: Clock::default(),
            bank,
            profiles,
            rng: StdRng::from_os_rng(),
            session: None,
            hidden_choices: HashSet::new(),
            notifier: ChangeNotifier::new(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Deterministic shuffle and hint selection, for tests.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref().and_then(Session::current_question)
    }

    /// Choice indices the active hint has removed from play.
    #[must_use]
    pub fn hidden_choices(&self) -> &HashSet<usize> {
        &self.hidden_choices
    }

    #[must_use]
    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        self.session.as_ref().map(SessionProgress::of)
    }

    /// Mutable clock access, so tests can advance a fixed clock mid-session.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Begin a new session from the current settings and profile.
    ///
    /// Filters and shuffles the bank, then takes `max(1, question_count)`
    /// questions. When nothing survives the filters the session starts
    /// already complete with zero questions; callers must render that
    /// without a current question.
    pub async fn start_game(&mut self, settings: &GameSettings, profile: &Profile) {
        let now = self.clock.now();
        let filtered = self.bank.filtered(settings).await;
        let mut shuffled = shuffle_with(&mut self.rng, &filtered);
        shuffled.truncate(settings.question_count.max(1) as usize);

        if shuffled.is_empty() {
            tracing::warn!("no questions available after applying filters");
            self.session = Some(Session::empty_complete(now));
            self.hidden_choices.clear();
            self.notifier.notify();
            return;
        }

        tracing::info!(
            questions = shuffled.len(),
            timed = settings.timer_mode,
            "starting new session"
        );
        self.session = Some(Session::new(
            shuffled,
            settings.timer_mode,
            profile.lives.max(1),
            now,
        ));
        self.hidden_choices.clear();
        self.notifier.notify();
    }

    /// Score one answer against the current question.
    ///
    /// Returns `None` when there is no active session, no current question,
    /// or the session is already complete. Otherwise updates both session
    /// and profile counters, runs the achievement pass, and reports
    /// correctness plus any newly unlocked achievement ids.
    pub fn submit_answer(
        &mut self,
        profile: &mut Profile,
        choice_index: usize,
    ) -> Option<AnswerOutcome> {
        let now = self.clock.now();
        let session = self.session.as_mut()?;
        if session.is_complete {
            return None;
        }

        let correct = session.current_question()?.is_correct(choice_index);
        let elapsed_ms = time::clamped_elapsed_ms(session.current_question_start, now);
        session.answer_times_ms.push(elapsed_ms);
        session.current_question_start = now;

        let (category_slug, sub_slug) = session
            .current_question_mut()
            .map(catalog::normalize_question)?;

        if correct {
            session.correct_count += 1;
            session.streak += 1;
            session.max_streak = session.max_streak.max(session.streak);
            profile.correct_count += 1;
            profile.streak += 1;
            profile.best_streak = profile.best_streak.max(profile.streak);
            profile.max_streak = profile.max_streak.max(profile.streak);

            let coins = (10.0 * profile.buffs.coin_multiplier).floor() as i64;
            session.coins_earned += coins;
            profile.coins += coins;

            bump(&mut session.category_correct_counts, &category_slug);
            bump(&mut session.subcategory_correct_counts, &sub_slug);
            bump(&mut profile.category_correct_counts, &category_slug);
            bump(&mut profile.subcategory_correct_counts, &sub_slug);
        } else {
            session.incorrect_count += 1;
            profile.incorrect_count += 1;
            session.streak = 0;
            profile.streak = 0;
            if session.lives > 0 {
                session.lives -= 1;
            }

            bump(&mut session.category_wrong_counts, &category_slug);
            bump(&mut session.subcategory_wrong_counts, &sub_slug);
            bump(&mut profile.category_wrong_counts, &category_slug);
            bump(&mut profile.subcategory_wrong_counts, &sub_slug);
        }

        profile.total_questions_answered += 1;
        profile.record_answer_time(elapsed_ms);

        let newly_unlocked = achievements::check(profile);

        self.hidden_choices.clear();
        self.notifier.notify();
        Some(AnswerOutcome {
            correct,
            newly_unlocked,
        })
    }

    /// Hide two wrong choices on the current question.
    ///
    /// No-op when there is no current question or a hint is already active.
    /// Records "skip" buff usage on both session and profile counters.
    pub fn use_skip(&mut self, profile: &mut Profile) -> bool {
        if !self.hidden_choices.is_empty() {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(question) = session.current_question() else {
            return false;
        };

        let wrong: Vec<usize> = (0..question.choices.len())
            .filter(|&index| index != question.answer_index)
            .collect();
        for &index in wrong.choose_multiple(&mut self.rng, 2) {
            self.hidden_choices.insert(index);
        }

        bump(&mut session.buff_usage_counts, "skip");
        bump(&mut profile.buff_usage_counts, "skip");
        self.notifier.notify();
        true
    }

    /// Move to the next question, or complete the session.
    ///
    /// Past the last question, or with no lives left, the session flips to
    /// complete: the level and lives floor are applied, aggregate stats are
    /// folded into the profile once, and the profile is persisted. A second
    /// call on a complete session is a no-op, so the finalize step never
    /// runs twice.
    pub async fn advance(&mut self, profile: &mut Profile) {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_complete {
            return;
        }

        if session.is_last_question() || session.lives == 0 {
            session.is_complete = true;
            profile.level = level_for_correct(profile.correct_count);
            profile.lives = session.lives.max(1);
            finalize_session_stats(profile, session, now);
            tracing::info!(
                score = session.correct_count,
                coins = session.coins_earned,
                "session complete"
            );
            self.hidden_choices.clear();
            self.profiles.save(profile).await;
            self.notifier.notify();
            return;
        }

        session.current_index += 1;
        session.current_question_start = now;
        self.hidden_choices.clear();
        self.notifier.notify();
    }
}

/// Fold the finished session's aggregates into the profile. Runs exactly
/// once per session, at the Complete transition.
fn finalize_session_stats(
    profile: &mut Profile,
    session: &Session,
    now: chrono::DateTime<chrono::Utc>,
) {
    profile.total_sessions_played += 1;
    if profile.first_played_at.is_none() {
        profile.first_played_at = Some(session.start_time);
    }
    profile.last_played_at = Some(now);

    let score = session.correct_count;
    if score > profile.highest_game_score {
        profile.highest_game_score = score;
    }

    let sessions = profile.total_sessions_played;
    profile.average_game_score =
        (profile.average_game_score * f64::from(sessions - 1) + f64::from(score))
            / f64::from(sessions);

    profile.max_streak = profile.max_streak.max(session.max_streak);
    profile.best_streak = profile.max_streak;
    profile.milestone_progress = profile.correct_count;

    for (key, &count) in &session.buff_usage_counts {
        bump_by(&mut profile.buff_usage_counts, key, count);
    }
}

fn bump(map: &mut HashMap<String, u32>, key: &str) {
    bump_by(map, key, 1);
}

fn bump_by(map: &mut HashMap<String, u32>, key: &str, amount: u32) {
    if key.trim().is_empty() {
        return;
    }
    *map.entry(key.to_string()).or_insert(0) += amount;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use storage::repository::{InMemoryRepository, ProfileRepository, SettingsRepository};
    use trivia_core::time::fixed_clock;

    fn question(id: &str, category: &str) -> Question {
        Question {
            id: id.into(),
            category: category.into(),
            sub_category: String::new(),
            prompt: "?".into(),
            choices: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            answer_index: 0,
        }
    }

    fn services() -> Arc<ProfileService> {
        let repo = Arc::new(InMemoryRepository::new());
        Arc::new(ProfileService::new(
            Arc::clone(&repo) as Arc<dyn ProfileRepository>,
            repo as Arc<dyn SettingsRepository>,
        ))
    }

    fn engine_with(questions: Vec<Question>) -> GameEngine {
        let bank = Arc::new(QuestionBank::preloaded(questions));
        GameEngine::new(bank, services())
            .with_clock(fixed_clock())
            .with_seed(11)
    }

    async fn started(questions: Vec<Question>, profile: &Profile) -> GameEngine {
        let mut engine = engine_with(questions);
        engine.start_game(&GameSettings::default(), profile).await;
        engine
    }

    #[tokio::test]
    async fn correct_streak_earns_coins_and_keeps_lives() {
        let mut profile = Profile::default();
        let questions = vec![
            question("q1", "Science"),
            question("q2", "History"),
            question("q3", "Music"),
        ];
        let mut engine = started(questions, &profile).await;
        let lives_before = engine.session().unwrap().lives;

        for _ in 0..2 {
            assert!(engine.submit_answer(&mut profile, 0).unwrap().correct);
            engine.advance(&mut profile).await;
        }
        assert!(engine.submit_answer(&mut profile, 0).unwrap().correct);

        let session = engine.session().unwrap();
        assert_eq!(session.coins_earned, 30);
        assert_eq!(session.streak, 3);
        assert_eq!(session.max_streak, 3);
        assert_eq!(session.lives, lives_before);
        assert_eq!(profile.coins, 30);
        assert_eq!(profile.streak, 3);
    }

    #[tokio::test]
    async fn coin_award_floors_the_multiplied_value() {
        let mut profile = Profile::default();
        profile.buffs.coin_multiplier = 1.25;
        let mut engine = started(vec![question("q1", "Science")], &profile).await;

        engine.submit_answer(&mut profile, 0).unwrap();
        assert_eq!(engine.session().unwrap().coins_earned, 12);
        assert_eq!(profile.coins, 12);
    }

    #[tokio::test]
    async fn life_loss_completes_on_next_advance() {
        let mut profile = Profile {
            lives: 1,
            ..Profile::default()
        };
        let questions = vec![question("q1", "Science"), question("q2", "History")];
        let mut engine = started(questions, &profile).await;

        let outcome = engine.submit_answer(&mut profile, 1).unwrap();
        assert!(!outcome.correct);
        assert_eq!(engine.session().unwrap().lives, 0);
        assert!(!engine.session().unwrap().is_complete);

        engine.advance(&mut profile).await;
        assert!(engine.session().unwrap().is_complete);
        assert_eq!(profile.lives, 1);
    }

    #[tokio::test]
    async fn achievement_unlocks_at_five_correct() {
        let mut profile = Profile {
            correct_count: 4,
            ..Profile::default()
        };
        let mut engine = started(vec![question("q1", "Science")], &profile).await;

        let outcome = engine.submit_answer(&mut profile, 0).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.newly_unlocked, vec!["correct_5"]);
        assert_eq!(profile.achievements.get("correct_5"), Some(&true));
    }

    #[tokio::test]
    async fn submit_is_a_no_op_without_a_session_or_after_completion() {
        let mut profile = Profile::default();
        let mut engine = engine_with(vec![question("q1", "Science")]);
        assert!(engine.submit_answer(&mut profile, 0).is_none());

        engine.start_game(&GameSettings::default(), &profile).await;
        engine.submit_answer(&mut profile, 0).unwrap();
        engine.advance(&mut profile).await;
        assert!(engine.session().unwrap().is_complete);
        assert!(engine.submit_answer(&mut profile, 0).is_none());
    }

    #[tokio::test]
    async fn empty_filter_result_starts_a_complete_session() {
        let mut settings = GameSettings::default();
        settings.categories_selected.insert("religion".into());
        let profile = Profile::default();
        let mut engine = engine_with(vec![question("q1", "Science")]);

        engine.start_game(&settings, &profile).await;
        let session = engine.session().unwrap();
        assert!(session.is_complete);
        assert!(session.questions.is_empty());
        assert!(engine.current_question().is_none());
    }

    #[tokio::test]
    async fn question_count_is_clamped_to_at_least_one() {
        let settings = GameSettings {
            question_count: 0,
            ..GameSettings::default()
        };
        let profile = Profile::default();
        let mut engine = engine_with(vec![
            question("q1", "Science"),
            question("q2", "History"),
            question("q3", "Music"),
        ]);

        engine.start_game(&settings, &profile).await;
        assert_eq!(engine.session().unwrap().questions.len(), 1);
    }

    #[tokio::test]
    async fn skip_hides_two_wrong_choices_once() {
        let mut profile = Profile::default();
        let mut engine = started(vec![question("q1", "Science")], &profile).await;

        assert!(engine.use_skip(&mut profile));
        let hidden = engine.hidden_choices().clone();
        assert_eq!(hidden.len(), 2);
        assert!(!hidden.contains(&0));

        assert!(!engine.use_skip(&mut profile));
        assert_eq!(engine.session().unwrap().buff_usage_counts.get("skip"), Some(&1));
        assert_eq!(profile.buff_usage_counts.get("skip"), Some(&1));

        engine.submit_answer(&mut profile, 0).unwrap();
        assert!(engine.hidden_choices().is_empty());
    }

    #[tokio::test]
    async fn bare_category_answers_leave_subcategory_counts_empty() {
        let mut profile = Profile::default();
        let questions = vec![question("q1", "Science"), question("q2", "History")];
        let mut engine = started(questions, &profile).await;

        engine.submit_answer(&mut profile, 0).unwrap();
        engine.advance(&mut profile).await;
        engine.submit_answer(&mut profile, 1).unwrap();

        let session = engine.session().unwrap();
        assert_eq!(session.category_correct_counts.len(), 1);
        assert_eq!(session.category_wrong_counts.len(), 1);
        assert!(session.subcategory_correct_counts.is_empty());
        assert!(session.subcategory_wrong_counts.is_empty());
        assert!(profile.subcategory_correct_counts.is_empty());
        assert!(profile.subcategory_wrong_counts.is_empty());
    }

    #[tokio::test]
    async fn answer_times_flow_into_profile_statistics() {
        let mut profile = Profile::default();
        let questions = vec![question("q1", "Science"), question("q2", "History")];
        let mut engine = started(questions, &profile).await;

        engine.clock_mut().advance(Duration::milliseconds(200));
        engine.submit_answer(&mut profile, 0).unwrap();
        engine.advance(&mut profile).await;

        engine.clock_mut().advance(Duration::milliseconds(600));
        engine.submit_answer(&mut profile, 0).unwrap();

        assert_eq!(engine.session().unwrap().answer_times_ms, vec![200, 600]);
        assert_eq!(profile.average_answer_time_ms, Some(400));
        assert_eq!(profile.fastest_answer_time_ms, Some(200));
        assert_eq!(profile.slowest_answer_time_ms, Some(600));
    }

    #[tokio::test]
    async fn finalize_folds_session_stats_into_profile_once() {
        let mut profile = Profile::default();
        let questions = vec![question("q1", "Science"), question("q2", "History")];
        let mut engine = started(questions, &profile).await;

        engine.use_skip(&mut profile);
        engine.submit_answer(&mut profile, 0).unwrap();
        engine.advance(&mut profile).await;
        engine.submit_answer(&mut profile, 2).unwrap();
        engine.advance(&mut profile).await;

        assert!(engine.session().unwrap().is_complete);
        assert_eq!(profile.total_sessions_played, 1);
        assert_eq!(profile.highest_game_score, 1);
        assert!((profile.average_game_score - 1.0).abs() < f64::EPSILON);
        assert!(profile.first_played_at.is_some());
        assert!(profile.last_played_at.is_some());
        assert_eq!(profile.best_streak, profile.max_streak);
        assert_eq!(profile.milestone_progress, profile.correct_count);
        // Skip usage is recorded live and merged again at finalize, matching
        // the persisted totals of the historical data.
        assert_eq!(profile.buff_usage_counts.get("skip"), Some(&2));

        // Re-advancing a complete session changes nothing.
        engine.advance(&mut profile).await;
        assert_eq!(profile.total_sessions_played, 1);
    }

    #[tokio::test]
    async fn completion_persists_the_profile_with_ratios() {
        let repo = Arc::new(InMemoryRepository::new());
        let profiles = Arc::new(ProfileService::new(
            Arc::clone(&repo) as Arc<dyn ProfileRepository>,
            Arc::clone(&repo) as Arc<dyn SettingsRepository>,
        ));
        let bank = Arc::new(QuestionBank::preloaded(vec![question("q1", "Science")]));
        let mut engine = GameEngine::new(bank, Arc::clone(&profiles))
            .with_clock(fixed_clock())
            .with_seed(3);

        let mut profile = Profile::default();
        engine.start_game(&GameSettings::default(), &profile).await;
        engine.submit_answer(&mut profile, 0).unwrap();
        engine.advance(&mut profile).await;

        let stored = repo.load_profile().await.unwrap().unwrap();
        assert_eq!(stored.total_sessions_played, 1);
        assert_eq!(stored.ratio_scores.get("science"), Some(&1.0));
    }

    #[tokio::test]
    async fn index_stays_in_bounds_until_completion() {
        let mut profile = Profile::default();
        let questions = vec![
            question("q1", "Science"),
            question("q2", "History"),
            question("q3", "Music"),
        ];
        let mut engine = started(questions, &profile).await;

        loop {
            let session = engine.session().unwrap();
            if session.is_complete {
                break;
            }
            assert!(session.current_index < session.questions.len());
            engine.submit_answer(&mut profile, 0).unwrap();
            engine.advance(&mut profile).await;
        }
        assert_eq!(engine.progress().unwrap().answered, 3);
    }

    #[tokio::test]
    async fn every_mutating_operation_notifies() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let mut profile = Profile::default();
        let mut engine = engine_with(vec![question("q1", "Science"), question("q2", "History")]);
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = Arc::clone(&hits);
            engine.notifier().subscribe(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        engine.start_game(&GameSettings::default(), &profile).await;
        engine.use_skip(&mut profile);
        engine.submit_answer(&mut profile, 0).unwrap();
        engine.advance(&mut profile).await;
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }
}
