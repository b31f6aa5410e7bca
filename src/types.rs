//! Core types for the Synheart Sense engine
//!
//! This module defines the data that flows through the interpretation
//! pipeline: raw signals, behavior categories, weighted interpretations, and
//! the encoded snapshot payload types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Behavior categories produced by the threshold classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorCategory {
    Interest,
    Disinterest,
    Frustration,
    Overwhelm,
    CognitiveLoad,
    Calm,
    Anxiety,
    Fatigue,
    SocialAwareness,
}

impl BehaviorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorCategory::Interest => "interest",
            BehaviorCategory::Disinterest => "disinterest",
            BehaviorCategory::Frustration => "frustration",
            BehaviorCategory::Overwhelm => "overwhelm",
            BehaviorCategory::CognitiveLoad => "cognitive_load",
            BehaviorCategory::Calm => "calm",
            BehaviorCategory::Anxiety => "anxiety",
            BehaviorCategory::Fatigue => "fatigue",
            BehaviorCategory::SocialAwareness => "social_awareness",
        }
    }
}

/// Social context inferred from proximity sensing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialContext {
    Alone,
    WithKnown,
    WithUnknown,
}

impl Default for SocialContext {
    fn default() -> Self {
        SocialContext::Alone
    }
}

/// Preferred response granularity derived from current load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseLength {
    Minimal,
    Brief,
    Normal,
    Detailed,
}

impl Default for ResponseLength {
    fn default() -> Self {
        ResponseLength::Normal
    }
}

/// Kind-specific payload of a raw signal
///
/// The set is closed: the classifier matches exhaustively, so adding a kind
/// is a compile-time event, not a runtime surprise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal_type", rename_all = "snake_case")]
pub enum SignalKind {
    /// Gaze or attention dwell on a target
    Dwell { duration_sec: f64, target_id: String },
    /// Scroll/pan velocity in units per second
    Velocity { velocity: f64 },
    /// Hesitation before an action
    Hesitation { duration_sec: f64 },
    /// A typed-input burst with correction counts
    TypedInput {
        keystroke_count: u32,
        correction_count: u32,
        duration_sec: f64,
    },
    /// Physiological rate reading with optional variability
    Physiological { rate: f64, variability: Option<f64> },
    /// A switch between two contexts (apps, surfaces, tasks)
    ContextSwitch {
        from_id: Option<String>,
        to_id: Option<String>,
    },
    /// Repeated-tap burst
    TapPattern { count: u32, interval_sec: f64 },
    /// Motion state change
    Motion { is_moving: bool, speed: Option<f64> },
    /// Nearby-person count from proximity sensing
    Proximity { count: u32, is_known: bool },
}

/// A raw signal from the acquisition layer
///
/// Signals are ephemeral: consumed once by the classifier and retained only
/// inside its short rolling windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// When the signal was observed
    pub timestamp: DateTime<Utc>,
    /// Kind-specific payload
    #[serde(flatten)]
    pub kind: SignalKind,
}

impl Signal {
    pub fn new(timestamp: DateTime<Utc>, kind: SignalKind) -> Self {
        Self { timestamp, kind }
    }

    /// Whether the payload is well-formed.
    ///
    /// Malformed signals (negative durations or intervals, non-finite or
    /// non-positive rates) are rejected silently upstream; they never produce
    /// an interpretation and never fault.
    pub fn is_valid(&self) -> bool {
        match &self.kind {
            SignalKind::Dwell { duration_sec, .. } => {
                duration_sec.is_finite() && *duration_sec >= 0.0
            }
            SignalKind::Velocity { velocity } => velocity.is_finite() && *velocity >= 0.0,
            SignalKind::Hesitation { duration_sec } => {
                duration_sec.is_finite() && *duration_sec >= 0.0
            }
            SignalKind::TypedInput { duration_sec, .. } => {
                duration_sec.is_finite() && *duration_sec >= 0.0
            }
            SignalKind::Physiological { rate, variability } => {
                rate.is_finite()
                    && *rate > 0.0
                    && variability.map_or(true, |v| v.is_finite() && v >= 0.0)
            }
            SignalKind::ContextSwitch { .. } => true,
            SignalKind::TapPattern { interval_sec, .. } => {
                interval_sec.is_finite() && *interval_sec >= 0.0
            }
            SignalKind::Motion { speed, .. } => {
                speed.map_or(true, |s| s.is_finite() && s >= 0.0)
            }
            SignalKind::Proximity { .. } => true,
        }
    }
}

/// A weighted behavior interpretation produced by the classifier
///
/// Confidence is nominally 0-1; window-scaled scores (overwhelm) may exceed
/// 1.0 and rely on the downstream clamp. Weight carries severity and
/// polarity and drives memory tier selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub category: BehaviorCategory,
    pub confidence: f64,
    pub weight: f64,
    pub observed_at: DateTime<Utc>,
}

impl Interpretation {
    pub fn new(
        category: BehaviorCategory,
        confidence: f64,
        weight: f64,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            category,
            confidence,
            weight,
            observed_at,
        }
    }
}

// ============================================================================
// Snapshot payload types
// ============================================================================

/// Producer metadata embedded in every snapshot payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Snapshot provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotProvenance {
    pub entity_id: String,
    pub computed_at_utc: String,
}

/// One impression in the encoded snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpressionEntry {
    pub entity: String,
    pub category: BehaviorCategory,
    pub value: f64,
    /// Winning tier, absent when the value is the neutral default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<crate::memory::MemoryTier>,
    /// Baseline value carried as supplementary context when warning wins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_context: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_utc: Option<String>,
}

/// Per-tier record counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierCounts {
    pub permanent: usize,
    pub warning: usize,
    pub baseline: usize,
}

/// Complete encoded snapshot of the engine state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPayload {
    pub snapshot_version: String,
    pub producer: SnapshotProducer,
    pub provenance: SnapshotProvenance,
    pub context: crate::context::ContextVector,
    pub impressions: Vec<ImpressionEntry>,
    pub memory: TierCounts,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_behavior_category_serialization() {
        let category = BehaviorCategory::CognitiveLoad;
        let json = serde_json::to_string(&category).unwrap();
        assert_eq!(json, "\"cognitive_load\"");

        let parsed: BehaviorCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, BehaviorCategory::CognitiveLoad);
    }

    #[test]
    fn test_signal_tagged_serialization() {
        let signal = Signal::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap(),
            SignalKind::Dwell {
                duration_sec: 3.0,
                target_id: "article-42".to_string(),
            },
        );

        let json = serde_json::to_string(&signal).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["signal_type"], "dwell");
        assert_eq!(value["duration_sec"], 3.0);
        assert_eq!(value["target_id"], "article-42");
    }

    #[test]
    fn test_signal_deserialization() {
        let json = r#"{
            "timestamp": "2024-01-15T14:00:00Z",
            "signal_type": "typed_input",
            "keystroke_count": 40,
            "correction_count": 14,
            "duration_sec": 60.0
        }"#;

        let signal: Signal = serde_json::from_str(json).unwrap();
        match signal.kind {
            SignalKind::TypedInput {
                keystroke_count,
                correction_count,
                ..
            } => {
                assert_eq!(keystroke_count, 40);
                assert_eq!(correction_count, 14);
            }
            _ => panic!("expected typed_input"),
        }
    }

    #[test]
    fn test_physiological_optional_variability() {
        let json = r#"{
            "timestamp": "2024-01-15T14:00:00Z",
            "signal_type": "physiological",
            "rate": 72.0,
            "variability": null
        }"#;

        let signal: Signal = serde_json::from_str(json).unwrap();
        assert!(signal.is_valid());
        match signal.kind {
            SignalKind::Physiological { rate, variability } => {
                assert_eq!(rate, 72.0);
                assert!(variability.is_none());
            }
            _ => panic!("expected physiological"),
        }
    }

    #[test]
    fn test_negative_duration_is_invalid() {
        let signal = Signal::new(
            Utc::now(),
            SignalKind::Dwell {
                duration_sec: -1.0,
                target_id: "x".to_string(),
            },
        );
        assert!(!signal.is_valid());

        let signal = Signal::new(
            Utc::now(),
            SignalKind::Hesitation { duration_sec: -0.5 },
        );
        assert!(!signal.is_valid());
    }

    #[test]
    fn test_zero_rate_is_invalid() {
        let signal = Signal::new(
            Utc::now(),
            SignalKind::Physiological {
                rate: 0.0,
                variability: None,
            },
        );
        assert!(!signal.is_valid());
    }

    #[test]
    fn test_zero_counts_are_valid() {
        // Zero-count payloads are well-formed; the classifier guards its own
        // ratios and simply emits nothing.
        let signal = Signal::new(
            Utc::now(),
            SignalKind::TypedInput {
                keystroke_count: 0,
                correction_count: 0,
                duration_sec: 0.0,
            },
        );
        assert!(signal.is_valid());

        let signal = Signal::new(
            Utc::now(),
            SignalKind::Proximity {
                count: 0,
                is_known: false,
            },
        );
        assert!(signal.is_valid());
    }
}
