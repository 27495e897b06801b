//! Testing utilities and mock implementations
//!
//! Provides a controllable [`FeedbackStore`](crate::feedback::FeedbackStore)
//! fake for exercising error propagation and timeouts without a real backend.

pub mod mocks;

pub use mocks::*;
