use std::io::{BufRead, Write as _};

use clap::{Parser, Subcommand};

use services::{AppServices, Clock, QuestionBank};
use trivia_core::model::Profile;

#[derive(Parser)]
#[command(name = "trivia")]
#[command(about = "Trivia session runner over a local question bank")]
#[command(version)]
struct Cli {
    /// SQLite database URL for the profile store
    #[arg(long, global = true, default_value = "sqlite:trivia.sqlite3?mode=rwc")]
    db: String,

    /// Question bank location: a JSON file path or an http(s) URL
    #[arg(long, global = true, default_value = "questions.json")]
    questions: String,

    /// Use an in-memory profile store instead of SQLite
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one session interactively on stdin/stdout
    Play {
        /// Questions per session (overrides stored settings)
        #[arg(long)]
        count: Option<u32>,

        /// Play against the 20 second session timer
        #[arg(long)]
        timed: bool,

        /// Restrict to a category slug; repeatable
        #[arg(long = "category")]
        categories: Vec<String>,
    },
    /// Print the stored profile statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let bank = if cli.questions.starts_with("http://") || cli.questions.starts_with("https://") {
        QuestionBank::from_url(&cli.questions)
    } else {
        QuestionBank::from_file(&cli.questions)
    };

    let services = if cli.ephemeral {
        tracing::debug!("using in-memory profile store");
        AppServices::in_memory(Clock::default(), bank)
    } else {
        tracing::debug!(db = %cli.db, "opening profile store");
        AppServices::new_sqlite(&cli.db, Clock::default(), bank).await?
    };

    match cli.command {
        Commands::Play {
            count,
            timed,
            categories,
        } => play(&services, count, timed, categories).await,
        Commands::Stats => stats(&services).await,
    }

    Ok(())
}

async fn play(services: &AppServices, count: Option<u32>, timed: bool, categories: Vec<String>) {
    let mut settings = services.profiles().load_settings().await;
    if let Some(count) = count {
        settings.question_count = count;
    }
    if timed {
        settings.timer_mode = true;
    }
    if !categories.is_empty() {
        settings.categories_selected = categories.into_iter().collect();
    }
    services.profiles().save_settings(&settings).await;

    let mut profile = services.profiles().load().await;
    let mut engine = services.engine();
    engine.start_game(&settings, &profile).await;

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let Some(session) = engine.session() else {
            break;
        };
        if session.is_complete {
            break;
        }
        let Some(question) = engine.current_question() else {
            break;
        };

        println!();
        println!(
            "[{}/{}] {}",
            session.current_index + 1,
            session.questions.len(),
            question.prompt
        );
        for (index, choice) in question.choices.iter().enumerate() {
            if engine.hidden_choices().contains(&index) {
                println!("  {index}) ----");
            } else {
                println!("  {index}) {choice}");
            }
        }
        print!("answer (number), s = skip hint, q = quit> ");
        let _ = std::io::stdout().flush();

        let Some(Ok(line)) = lines.next() else {
            break;
        };
        match line.trim() {
            "q" => break,
            "s" => {
                if !engine.use_skip(&mut profile) {
                    println!("hint unavailable");
                }
            }
            input => {
                let Ok(choice) = input.parse::<usize>() else {
                    println!("enter a choice number");
                    continue;
                };
                let Some(outcome) = engine.submit_answer(&mut profile, choice) else {
                    break;
                };
                println!("{}", if outcome.correct { "correct!" } else { "wrong." });
                for id in outcome.newly_unlocked {
                    println!("achievement unlocked: {id}");
                }
                engine.advance(&mut profile).await;
            }
        }
    }

    if let Some(session) = engine.session() {
        println!();
        println!(
            "session over: {}/{} correct, {} coins earned, best streak {}",
            session.correct_count,
            session.answered_count(),
            session.coins_earned,
            session.max_streak
        );
    }
}

async fn stats(services: &AppServices) {
    let profile = services.profiles().load().await;
    print_profile(&profile);
}

fn print_profile(profile: &Profile) {
    println!("level {} | coins {}", profile.level, profile.coins);
    println!(
        "sessions played: {} | questions answered: {}",
        profile.total_sessions_played, profile.total_questions_answered
    );
    println!(
        "correct: {} | incorrect: {} | best streak: {}",
        profile.correct_count, profile.incorrect_count, profile.best_streak
    );
    println!(
        "highest score: {} | average score: {:.2}",
        profile.highest_game_score, profile.average_game_score
    );
    if let Some(avg) = profile.average_answer_time_ms {
        println!("average answer time: {avg} ms");
    }

    if !profile.ratio_scores.is_empty() {
        println!("accuracy by slug:");
        let mut slugs: Vec<_> = profile.ratio_scores.iter().collect();
        slugs.sort_by(|a, b| a.0.cmp(b.0));
        for (slug, ratio) in slugs {
            println!("  {slug}: {:.0}%", ratio * 100.0);
        }
    }

    let unlocked: Vec<_> = profile
        .achievements
        .iter()
        .filter(|(_, done)| **done)
        .map(|(id, _)| id.clone())
        .collect();
    if !unlocked.is_empty() {
        println!("achievements: {}", unlocked.join(", "));
    }
}
