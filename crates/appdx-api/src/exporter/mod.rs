// Config Exporter client modules

pub mod client;
pub mod models;

pub use client::ExporterClient;
pub use models::{MigrationRequest, RegisteredController};
