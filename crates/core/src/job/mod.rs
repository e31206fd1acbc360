//! Job tracking: the record for each download request and where it lives.

mod memory_store;
mod store;
mod types;

pub use memory_store::InMemoryJobStore;
pub use store::{JobError, JobStore};
pub use types::{Job, JobState, JobUpdate};
