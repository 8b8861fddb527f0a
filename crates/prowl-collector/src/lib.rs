//! Prowl Collector - Discovery feed collection.
//!
//! This crate pages through the discovery API, filters each product as it is
//! ingested, and decides after every page whether to continue, pause for a
//! rate limit, or stop.
//!
//! # Features
//!
//! - Pure response classification, testable without a network
//! - Case-insensitive name blacklist and maker-count threshold
//! - Blocking, cancellable rate-limit pauses that retry the same cursor
//! - Stagnation detection after consecutive pages without a match
//! - Hard cap on the number of collected records
//!
//! # Example
//!
//! ```rust,ignore
//! use prowl_collector::{Collector, CollectorConfig, GraphQlClient};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = GraphQlClient::new(&config.discovery, token)?;
//! let collector = Collector::new(client, collector_config, CancellationToken::new())?;
//! let report = collector.run().await;
//! println!("{} products ({})", report.records.len(), report.stop);
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod classify;
pub mod client;
pub mod collector;
pub mod error;
pub mod filter;

// Re-export commonly used types
pub use classify::{classify, PageOutcome, RawItem, RawResponse};
pub use client::{GraphQlClient, PageRequest, PageSource};
pub use collector::{
    CollectionReport, Collector, CollectorConfig, LoopState, SessionState, StopReason,
    CREDENTIAL_HINTS,
};
pub use error::{CollectError, Result};
pub use filter::{Rejection, RecordFilter};
