pub mod headless_mode;
pub mod messages;
pub mod runtime;
pub mod setup;

pub use headless_mode::{HeadlessOutcome, run_headless_mode};
pub use setup::{SessionData, setup_session};
