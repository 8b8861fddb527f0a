//! Prowl Core - Foundation crate for the Prowl launch-collection pipeline.
//!
//! This crate provides the shared record model, error handling and configuration
//! management that every other Prowl crate depends on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared domain types (`Record`, `TimeWindow`, `DiscoveryToken`)
//!
//! # Example
//!
//! ```rust
//! use prowl_core::{AppConfig, TimeWindow};
//!
//! let config = AppConfig::default();
//! let window = TimeWindow::last_years(config.collection.years, chrono::Utc::now());
//! assert!(window.start < window.end);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, CollectionConfig, DiscoveryConfig, EnrichmentConfig, ExportConfig,
    ResolutionConfig,
};
pub use error::{ConfigError, ConfigResult, ProwlError, Result};
pub use types::{DiscoveryToken, Record, TimeWindow, MAX_YEARS};
