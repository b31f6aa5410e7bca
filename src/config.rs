//! Engine configuration
//!
//! Every classification threshold, interpretation weight, learning rate, and
//! decay constant lives here as a named field. The defaults carry the
//! empirical constants from the source deployment unchanged; deployments that
//! need different tuning load a config rather than editing rule code.

use serde::{Deserialize, Serialize};

/// Gaze/attention dwell rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwellRule {
    /// Dwell longer than this signals interest (seconds)
    pub interest_min_sec: f64,
    /// Dwell shorter than this signals disinterest (seconds)
    pub disinterest_max_sec: f64,
    /// Confidence = min(duration / divisor, 1.0)
    pub confidence_divisor: f64,
    pub interest_weight: f64,
    pub disinterest_confidence: f64,
    pub disinterest_weight: f64,
    /// Confidence of the extra interpretation for a repeated target
    pub reread_confidence: f64,
    pub reread_weight: f64,
}

impl Default for DwellRule {
    fn default() -> Self {
        Self {
            interest_min_sec: 2.3,
            disinterest_max_sec: 0.5,
            confidence_divisor: 5.0,
            interest_weight: 10.0,
            disinterest_confidence: 0.7,
            disinterest_weight: -1.0,
            reread_confidence: 0.9,
            reread_weight: 10.0,
        }
    }
}

/// Scroll/pan velocity rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityRule {
    /// Faster than this (units/s) signals disinterest
    pub fast_min: f64,
    pub fast_confidence: f64,
    pub fast_weight: f64,
    /// Slower than this (units/s) signals interest
    pub slow_max: f64,
    pub slow_confidence: f64,
    pub slow_weight: f64,
}

impl Default for VelocityRule {
    fn default() -> Self {
        Self {
            fast_min: 2000.0,
            fast_confidence: 0.8,
            fast_weight: -3.0,
            slow_max: 200.0,
            slow_confidence: 0.6,
            slow_weight: 4.0,
        }
    }
}

/// Pre-action hesitation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HesitationRule {
    /// Hesitation longer than this signals interest (seconds)
    pub min_sec: f64,
    /// Hesitation longer than this upgrades the weight (seconds)
    pub strong_min_sec: f64,
    /// Confidence = min(duration / divisor, 1.0)
    pub confidence_divisor: f64,
    pub weight: f64,
    pub strong_weight: f64,
}

impl Default for HesitationRule {
    fn default() -> Self {
        Self {
            min_sec: 1.5,
            strong_min_sec: 2.3,
            confidence_divisor: 4.0,
            weight: 5.0,
            strong_weight: 10.0,
        }
    }
}

/// Typed-input error rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypedInputRule {
    /// Error rate (corrections / keystrokes) above this signals cognitive load
    pub error_rate_min: f64,
    pub cognitive_load_weight: f64,
    /// Error rate above this, combined with slow typing, adds frustration
    pub frustration_error_rate_min: f64,
    /// Typing speed (keystrokes/second) below this counts as slow
    pub slow_speed_max: f64,
    pub frustration_confidence: f64,
    pub frustration_weight: f64,
}

impl Default for TypedInputRule {
    fn default() -> Self {
        Self {
            error_rate_min: 0.3,
            cognitive_load_weight: -8.0,
            frustration_error_rate_min: 0.2,
            slow_speed_max: 1.0,
            frustration_confidence: 0.8,
            frustration_weight: -6.0,
        }
    }
}

/// Physiological deviation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysiologicalRule {
    /// Relative deviation above personal baseline that signals anxiety
    pub anxiety_deviation_min: f64,
    pub anxiety_weight: f64,
    /// Relative deviation below which calm becomes possible
    pub calm_deviation_max: f64,
    /// Variability reading that must accompany a calm interpretation
    pub calm_variability_min: f64,
    pub calm_confidence: f64,
    pub calm_weight: f64,
}

impl Default for PhysiologicalRule {
    fn default() -> Self {
        Self {
            anxiety_deviation_min: 0.3,
            anxiety_weight: -10.0,
            calm_deviation_max: 0.1,
            calm_variability_min: 50.0,
            calm_confidence: 0.7,
            calm_weight: 3.0,
        }
    }
}

/// Context-switch frequency rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSwitchRule {
    /// Rolling window length (seconds)
    pub window_sec: i64,
    /// Switch count above which overwhelm is emitted
    pub overwhelm_count_min: u32,
    /// Confidence = count / divisor (may exceed 1.0; downstream clamp applies)
    pub confidence_divisor: f64,
    /// Weight = -weight_per_switch * count
    pub weight_per_switch: f64,
}

impl Default for ContextSwitchRule {
    fn default() -> Self {
        Self {
            window_sec: 60,
            overwhelm_count_min: 5,
            confidence_divisor: 10.0,
            weight_per_switch: 2.0,
        }
    }
}

/// Repeated-tap burst rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapPatternRule {
    /// Tap count above this within the interval signals frustration
    pub burst_count_min: u32,
    /// Inter-tap interval below this counts as a burst (seconds)
    pub burst_interval_max_sec: f64,
    pub confidence: f64,
    pub weight: f64,
}

impl Default for TapPatternRule {
    fn default() -> Self {
        Self {
            burst_count_min: 3,
            burst_interval_max_sec: 0.3,
            confidence: 0.9,
            weight: -5.0,
        }
    }
}

/// Proximity / social-awareness rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityRule {
    pub confidence: f64,
    pub known_weight: f64,
    pub unknown_weight: f64,
}

impl Default for ProximityRule {
    fn default() -> Self {
        Self {
            confidence: 0.8,
            known_weight: 2.0,
            unknown_weight: 5.0,
        }
    }
}

/// Full threshold classifier rule table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub dwell: DwellRule,
    pub velocity: VelocityRule,
    pub hesitation: HesitationRule,
    pub typed_input: TypedInputRule,
    pub physiological: PhysiologicalRule,
    pub context_switch: ContextSwitchRule,
    pub tap_pattern: TapPatternRule,
    pub proximity: ProximityRule,
}

/// Tiered memory tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Weight strictly below this goes to the permanent tier.
    /// The boundary itself (exactly -8) stays in warning.
    pub permanent_weight_cutoff: f64,
    /// Weight below this (and at or above the permanent cutoff) goes to warning
    pub warning_weight_cutoff: f64,
    /// Warning-tier EMA learning rate
    pub warning_learning_rate: f64,
    /// Baseline-tier EMA learning rate
    pub baseline_learning_rate: f64,
    /// Warning-tier decay constant (days)
    pub warning_decay_days: f64,
    /// Baseline-tier decay constant (days)
    pub baseline_decay_days: f64,
    /// Warning/baseline records below this value are evicted after decay
    pub eviction_epsilon: f64,
    /// Impression value returned for unknown keys
    pub neutral_value: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            permanent_weight_cutoff: -8.0,
            warning_weight_cutoff: 0.0,
            warning_learning_rate: 0.3,
            baseline_learning_rate: 0.1,
            warning_decay_days: 30.0,
            baseline_decay_days: 7.0,
            eviction_epsilon: 0.01,
            neutral_value: 0.5,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenseConfig {
    pub classifier: ClassifierConfig,
    pub memory: MemoryConfig,
    /// Rolling-window size of the personal physiological baseline (samples)
    pub physio_baseline_window: usize,
    /// Minimum interval between decay passes driven by signal ingestion (seconds)
    pub decay_interval_sec: i64,
}

impl Default for SenseConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            memory: MemoryConfig::default(),
            physio_baseline_window: crate::baseline::DEFAULT_PHYSIO_BASELINE_WINDOW,
            decay_interval_sec: crate::decay::DEFAULT_DECAY_INTERVAL_SEC,
        }
    }
}

impl SenseConfig {
    /// Load configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
