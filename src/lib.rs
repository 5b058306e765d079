//! Prospect - geospatial business prospecting
//!
//! Resolves a free-text location, queries the national business registry for
//! nearby establishments, and ranks them by distance. This library holds the
//! pipeline; the `prospect-server` binary exposes it over HTTP.

pub mod config;
pub mod error;
pub mod geocoding;
pub mod models;
pub mod naf;
pub mod pipeline;
pub mod probe;
pub mod ranking;
pub mod registry;
pub mod resilience;
pub mod spatial;
pub mod text;

pub use config::Config;
pub use error::ProspectError;
pub use models::{Candidate, DataSource, SearchCriteria, SearchOutcome};
pub use pipeline::ProspectPipeline;
