// AppDynamics controller client modules
//
// Authentication (OAuth grant, cookie login) and the UI endpoints the
// dashboard export needs. Everything else goes through the exporter.

pub mod auth;
pub mod client;
pub mod dashboards;

pub use client::{CSRF_TOKEN_NAME, ControllerClient, csrf_from_cookie_header};
pub use dashboards::DashboardListing;
