//! Port API access for the entity exporter
//!
//! This crate contains:
//! - PortConfig: credentials and transport settings
//! - PortClient: authentication and paginated blueprint/entity fetches
//! - Exporter: applies an export selection on top of the client

pub mod client;
pub mod config;
pub mod error;
pub mod exporter;

pub use client::PortClient;
pub use config::PortConfig;
pub use error::{ClientError, Result};
pub use exporter::{strip_calculated, Exporter};
