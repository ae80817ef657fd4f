//! Command implementations.

pub mod enrich;
pub mod scrape;
pub mod sources;
