mod buff;
mod profile;
mod question;
mod session;
mod settings;

pub use buff::{Buff, from_stored_multiplier, to_stored_multiplier};
pub use profile::{MILESTONES, Profile, level_for_correct};
pub use question::Question;
pub use session::Session;
pub use settings::GameSettings;
