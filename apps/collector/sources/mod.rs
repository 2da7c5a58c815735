//! Provider-specific proposal fetchers. All of them are schema-tolerant:
//! records come back as raw JSON for the merger to normalize, a failed or
//! misshapen response yields an empty list, and page order is preserved.

pub mod boardroom;
pub mod discourse;
pub mod snapshot;
pub mod tally;
