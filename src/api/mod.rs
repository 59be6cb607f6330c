pub mod client;
pub mod models;

pub use client::{HttpSearchClient, SearchService};
pub use models::{HealthStatus, SearchRequest, SearchResult};
