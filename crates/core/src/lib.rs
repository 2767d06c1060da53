#![forbid(unsafe_code)]

pub mod achievements;
pub mod catalog;
pub mod model;
pub mod time;

pub use time::Clock;
