pub mod client;
pub mod error_handler;

pub use client::NetworkClient;
