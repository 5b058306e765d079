//! Core data models for the prospecting pipeline.

pub mod candidate;
pub mod criteria;
pub mod location;
pub mod record;

pub use candidate::{Candidate, DataSource, SearchOutcome};
pub use criteria::{AgeFilter, CompanySize, CriteriaError, RadiusBucket, SearchCriteria, Sector};
pub use location::{GeoPoint, ResolvedLocation};
pub use record::{LambertPoint, RecordAddress, RegistryRecord};
