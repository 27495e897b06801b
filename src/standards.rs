//! Per-client quality standards
//!
//! A standard is an opaque JSON object stored per client. Setting a standard
//! replaces the previous one wholesale. Looking up an unknown client yields
//! `None`, which is distinct from a configured-but-empty standard.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Opaque client standard payload, e.g. `{"threshold": 0.8}`
pub type QualityStandard = Map<String, Value>;

/// Key read by [`QualityStandardsRegistry::threshold_for`]
pub const THRESHOLD_KEY: &str = "threshold";

/// Thread-safe registry of client quality standards
#[derive(Debug, Clone)]
pub struct QualityStandardsRegistry {
    standards: Arc<RwLock<HashMap<String, QualityStandard>>>,
    default_threshold: Option<f64>,
}

impl Default for QualityStandardsRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl QualityStandardsRegistry {
    /// Create an empty registry with an optional system-wide threshold
    pub fn new(default_threshold: Option<f64>) -> Self {
        Self {
            standards: Arc::new(RwLock::new(HashMap::new())),
            default_threshold,
        }
    }

    /// Replace the standard for `client_id`
    pub fn set_standard(&self, client_id: &str, standard: QualityStandard) {
        let mut standards = self
            .standards
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if standards.insert(client_id.to_string(), standard).is_some() {
            debug!("Replaced quality standard for client {}", client_id);
        } else {
            info!("Registered quality standard for client {}", client_id);
        }
    }

    /// Standard for `client_id`, or `None` when the client has none
    pub fn get_standard(&self, client_id: &str) -> Option<QualityStandard> {
        self.standards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(client_id)
            .cloned()
    }

    /// Numeric acceptance threshold for `client_id`
    ///
    /// Reads the `threshold` key of the client's standard. Falls back to the
    /// system-wide default when the client has no standard or the key is not
    /// a number.
    pub fn threshold_for(&self, client_id: &str) -> Option<f64> {
        self.get_standard(client_id)
            .and_then(|standard| standard.get(THRESHOLD_KEY).and_then(Value::as_f64))
            .or(self.default_threshold)
    }

    /// System-wide threshold used when a client has none
    pub fn default_threshold(&self) -> Option<f64> {
        self.default_threshold
    }

    /// Number of clients with a configured standard
    pub fn client_count(&self) -> usize {
        self.standards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
