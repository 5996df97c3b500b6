// appdx-api: Async HTTP clients for the AppDynamics controller and the Config Exporter

pub mod auth;
pub mod controller;
pub mod error;
pub mod exporter;
pub mod transport;

pub use auth::{AuthOutcome, Credentials};
pub use controller::{ControllerClient, DashboardListing};
pub use error::Error;
pub use exporter::{ExporterClient, MigrationRequest, RegisteredController};
pub use transport::TransportConfig;
