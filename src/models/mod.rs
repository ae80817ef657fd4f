//! Data models for EventRadar.

mod category;
mod event;

pub use category::Category;
pub use event::{dedupe_by_source_url, CandidateEvent, EventValidationError};
