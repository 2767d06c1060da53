#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod notify;
pub mod profile_service;
pub mod question_bank;
pub mod remote_profile;
pub mod sessions;

pub use trivia_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, QuestionBankError, RemoteProfileError};
pub use notify::ChangeNotifier;
pub use profile_service::ProfileService;
pub use question_bank::QuestionBank;
pub use remote_profile::{RemoteConfig, RemoteProfileStore};
pub use sessions::{AnswerOutcome, GameEngine, SessionProgress};
