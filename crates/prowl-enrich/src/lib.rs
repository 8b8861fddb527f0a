//! Prowl Enrich - Organization and funding enrichment.
//!
//! Enrichment is an optional second pass over resolved records: each
//! website is mapped to an organization page, organizations are
//! deduplicated, and the funding figure of each distinct organization is
//! read once.
//!
//! Backends implement [`OrganizationLookup`] and [`FundingSource`]; the
//! batch passes only depend on those traits.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod batch;
pub mod crunchbase;
pub mod error;
pub mod provider;

pub use batch::{dedup_organizations, fetch_funding, lookup_organizations, PassSummary};
pub use crunchbase::{Crunchbase, CrunchbaseSettings};
pub use error::{EnrichError, Result};
pub use provider::{FundingSource, OrganizationLookup};
