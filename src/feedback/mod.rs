//! Feedback ledger
//!
//! Append-only storage of scored agent feedback and anonymized client
//! feedback. The [`FeedbackStore`] trait is the only surface the routing core
//! depends on; [`InMemoryFeedbackStore`] and [`JsonlFeedbackStore`] are the
//! two backends shipped with the crate.

pub mod jsonl;
pub mod memory;
pub mod store;
pub mod types;

pub use jsonl::JsonlFeedbackStore;
pub use memory::InMemoryFeedbackStore;
pub use store::{FeedbackLimits, FeedbackStore};
pub use types::{AnonymizedFeedbackEntry, FeedbackRecord};
