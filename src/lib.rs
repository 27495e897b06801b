//! Agent Quality - quality-based agent routing and feedback aggregation
//!
//! Decides which of several candidate agents should receive the next task of
//! a given type, based on the feedback each agent has accumulated for that
//! task type, and maintains the feedback ledger that drives the decision.
//!
//! # Overview
//!
//! - [`feedback`] - append-only feedback ledger behind the `FeedbackStore` trait
//! - [`standards`] - per-client quality standards with last-write-wins semantics
//! - [`scoring`] - reduction of a history to a comparable score
//! - [`routing`] - the `QualityController` and its selection policy
//! - [`observability`] - structured logging and metrics
//!
//! # Quick Start
//!
//! ```rust
//! use agent_quality::{QualityConfig, QualityController};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let config = QualityConfig::default();
//! let controller = QualityController::in_memory(&config);
//!
//! controller
//!     .record_anonymized_feedback("task1", "Great job!", 5.0)
//!     .await
//!     .unwrap();
//! controller.set_client_quality_standards(
//!     "client1",
//!     json!({"threshold": 0.8}).as_object().cloned().unwrap(),
//! );
//!
//! // Nobody has feedback yet, so the first candidate is chosen.
//! let agent = controller
//!     .route_task_to_best_agent("summarize", &["agent1", "agent2"])
//!     .await
//!     .unwrap();
//! assert_eq!(agent, "agent1");
//! # });
//! ```

pub mod config;
pub mod error;
pub mod feedback;
pub mod observability;
pub mod routing;
pub mod scoring;
pub mod standards;
pub mod testing;

pub use config::{ConfigError, QualityConfig};
pub use error::{QualityError, QualityResult};
pub use feedback::{
    AnonymizedFeedbackEntry, FeedbackLimits, FeedbackRecord, FeedbackStore, InMemoryFeedbackStore,
    JsonlFeedbackStore,
};
pub use routing::{QualityController, RoutingDecision};
pub use scoring::{AgentScore, ScoringStrategy};
pub use standards::{QualityStandard, QualityStandardsRegistry};
