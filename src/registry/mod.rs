//! Business registry access: query composition, HTTP client, and the
//! synthetic fallback dataset.

mod client;
mod fallback;
pub mod query;

pub use client::{RegistryClient, RegistryError};
pub use fallback::synthetic_records;
pub use query::{build_query, Clause};
