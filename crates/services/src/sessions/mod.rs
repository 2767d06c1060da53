mod engine;
mod progress;

// Public API of the session subsystem.
pub use engine::{AnswerOutcome, GameEngine};
pub use progress::SessionProgress;
