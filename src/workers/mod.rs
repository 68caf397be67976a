//! Background workers for fetches and CSV writes

pub mod core;
pub mod exporter;
pub mod fetcher;

pub use core::CompletionSender;
pub use exporter::spawn_export;
pub use fetcher::spawn_fetch;
