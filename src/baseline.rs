//! Personal physiological baseline
//!
//! This module manages a rolling baseline for the physiological rate signal.
//! Deviations are interpreted against personal history, not population norms.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default rolling-window size in samples
pub const DEFAULT_PHYSIO_BASELINE_WINDOW: usize = 14;

/// Documented fallback when no personal history exists yet (resting rate, bpm)
pub const DEFAULT_RESTING_RATE: f64 = 70.0;

/// Rolling baseline store for physiological rate readings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysioBaselineStore {
    /// Rolling rate values
    rate_values: VecDeque<f64>,
    /// Maximum window size
    window_size: usize,
}

impl Default for PhysioBaselineStore {
    fn default() -> Self {
        Self::new(DEFAULT_PHYSIO_BASELINE_WINDOW)
    }
}

impl PhysioBaselineStore {
    /// Create a new baseline store with the specified window size
    pub fn new(window_size: usize) -> Self {
        Self {
            rate_values: VecDeque::with_capacity(window_size),
            window_size: window_size.max(1),
        }
    }

    /// Record a new rate observation
    pub fn observe(&mut self, rate: f64) {
        if !rate.is_finite() || rate <= 0.0 {
            return;
        }
        self.rate_values.push_back(rate);
        while self.rate_values.len() > self.window_size {
            self.rate_values.pop_front();
        }
    }

    /// Current personal baseline, if any history exists
    pub fn baseline(&self) -> Option<f64> {
        if self.rate_values.is_empty() {
            return None;
        }
        let sum: f64 = self.rate_values.iter().sum();
        Some(sum / self.rate_values.len() as f64)
    }

    /// Personal baseline, falling back to the documented default
    pub fn baseline_or_default(&self) -> f64 {
        self.baseline().unwrap_or(DEFAULT_RESTING_RATE)
    }

    /// Number of samples currently in the window
    pub fn sample_count(&self) -> usize {
        self.rate_values.len()
    }

    /// Clear all baseline history
    pub fn clear(&mut self) {
        self.rate_values.clear();
    }

    /// Load baseline store from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize baseline store to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
