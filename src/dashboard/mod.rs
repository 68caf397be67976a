//! Dashboard controller
//!
//! Split into state, action handlers, completion updaters and the view
//! model derivation.

pub mod commands;
pub mod handlers;
pub mod state;
pub mod updaters;
pub mod view;

pub use commands::{Action, Command, Completion, FetchCommand};
pub use handlers::ActionError;
pub use state::{DashboardController, DashboardSettings, ExportPhase, GraphPhase, GridPhase};
pub use view::{ViewModel, compute_view_model};
