//! Prowl Browser - Browser automation and link resolution.
//!
//! Provides a Chromium engine behind the [`BrowserActions`] trait, used both
//! for following gated tracking links and for driving enrichment sites, plus
//! a plain HTTP probe for everything else.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod actions;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod probe;
pub mod resolve;

pub use actions::{BrowserActions, Navigation};
pub use engine::{BrowserEngine, EngineSettings};
pub use error::{BrowserError, Result};
pub use fingerprint::FingerprintConfig;
pub use probe::HttpResolver;
pub use resolve::{
    is_accessible_status, resolve_all, retain_accessible, strip_ref_param, BrowserResolver,
    Resolution, ResolutionPlan, UrlResolver,
};
