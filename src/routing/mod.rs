//! Quality-based routing
//!
//! ## Controller (controller.rs)
//!
//! `QualityController` scores each candidate's history for a task type and
//! returns the best agent. It also records feedback and exposes client
//! quality standards.
//!
//! ## Selection (selector.rs)
//!
//! Pure tie-break and missing-data policy over scored candidates.
//!
//! ## Continuous improvement (improvement.rs)
//!
//! Read-only hook invoked with per-task-type summaries of an agent's history.

pub mod controller;
pub mod improvement;
pub mod selector;

pub use controller::{QualityController, RoutingPolicy};
pub use improvement::{ImprovementHook, NoopImprovementHook, TaskTypeSummary};
pub use selector::{select_best, CandidateScore, RoutingDecision};
