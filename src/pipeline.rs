//! Pipeline orchestration
//!
//! This module provides the public API for the interpretation engine: a
//! stateless one-shot function for batch processing and a stateful processor
//! that keeps context, baselines, and memory across batches.

use crate::baseline::PhysioBaselineStore;
use crate::classifier::ThresholdClassifier;
use crate::config::SenseConfig;
use crate::context::{ContextUpdater, ContextVector};
use crate::decay::DecayScheduler;
use crate::encoder::SnapshotEncoder;
use crate::error::SenseError;
use crate::memory::{Impression, TieredMemoryStore};
use crate::types::{BehaviorCategory, Interpretation, Signal, SignalKind, SnapshotPayload, SocialContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process a JSON array of signals with a fresh engine and return the
/// snapshot JSON (stateless, one-shot).
///
/// # Example
/// ```ignore
/// let snapshot_json = signals_to_snapshot(batch_json, "user-1".to_string())?;
/// ```
pub fn signals_to_snapshot(batch_json: String, entity_id: String) -> Result<String, SenseError> {
    // Stage 1: Parse the signal batch
    let signals: Vec<Signal> = serde_json::from_str(&batch_json)
        .map_err(|e| SenseError::ParseError(format!("Failed to parse signal batch: {e}")))?;

    // Stage 2: Run a fresh processor over the batch
    let mut processor = SenseProcessor::new(entity_id);
    for signal in &signals {
        processor.process(signal);
    }

    // Stage 3: Encode the resulting state
    processor.snapshot_json()
}

/// Persistable engine state (context, baselines, memory)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProcessorState {
    entity_id: String,
    context: ContextVector,
    physio: PhysioBaselineStore,
    memory: TieredMemoryStore,
}

/// Stateful interpretation engine for one tracked entity.
///
/// Owns the classifier windows, personal baselines, context vector, and the
/// tiered memory store. Exclusive `&mut` access is the synchronization
/// boundary: absorption and decay never interleave on a key.
pub struct SenseProcessor {
    entity_id: String,
    classifier: ThresholdClassifier,
    physio: PhysioBaselineStore,
    context: ContextVector,
    memory: TieredMemoryStore,
    scheduler: DecayScheduler,
    encoder: SnapshotEncoder,
}

impl SenseProcessor {
    /// Create a processor with default configuration
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self::with_config(entity_id, SenseConfig::default())
    }

    /// Create a processor with a specific configuration
    pub fn with_config(entity_id: impl Into<String>, config: SenseConfig) -> Self {
        Self {
            entity_id: entity_id.into(),
            classifier: ThresholdClassifier::new(config.classifier),
            physio: PhysioBaselineStore::new(config.physio_baseline_window),
            context: ContextVector::default(),
            memory: TieredMemoryStore::new(config.memory),
            scheduler: DecayScheduler::new(config.decay_interval_sec),
            encoder: SnapshotEncoder::new(),
        }
    }

    /// Process one signal and return the interpretations it produced.
    ///
    /// Malformed signals are dropped silently. Decay runs opportunistically
    /// on event time whenever the configured interval has elapsed.
    pub fn process(&mut self, signal: &Signal) -> Vec<Interpretation> {
        if !signal.is_valid() {
            return Vec::new();
        }

        // Stage 1: Categorical effects (motion and proximity set flags
        // directly on the context vector)
        self.apply_categorical_flags(signal);

        // Stage 2: Threshold classification
        let interpretations = self.classifier.classify(signal, &self.physio);

        // Stage 3: The personal baseline learns after classification, so
        // deviations always compare against prior history
        if let SignalKind::Physiological { rate, .. } = signal.kind {
            self.physio.observe(rate);
        }

        // Stage 4: Fold each interpretation into the context vector and the
        // memory store
        for interpretation in &interpretations {
            self.context = ContextUpdater::update(self.context, interpretation);
            self.memory.absorb(&self.entity_id, interpretation);
        }

        // Stage 5: Event-time decay tick
        self.scheduler.run_if_due(&mut self.memory, signal.timestamp);

        interpretations
    }

    /// Parse and process one signal from JSON
    pub fn process_json(&mut self, signal_json: &str) -> Result<Vec<Interpretation>, SenseError> {
        let signal: Signal = serde_json::from_str(signal_json)
            .map_err(|e| SenseError::ParseError(format!("Failed to parse signal: {e}")))?;
        Ok(self.process(&signal))
    }

    fn apply_categorical_flags(&mut self, signal: &Signal) {
        match &signal.kind {
            SignalKind::Motion { is_moving, .. } => {
                self.context.set_in_transit(*is_moving);
            }
            SignalKind::Proximity { count, is_known } => {
                let social_context = if *count == 0 {
                    SocialContext::Alone
                } else if *is_known {
                    SocialContext::WithKnown
                } else {
                    SocialContext::WithUnknown
                };
                self.context.set_social_context(social_context);
            }
            _ => {}
        }
    }

    /// Read-only view of the current context vector
    pub fn context(&self) -> &ContextVector {
        &self.context
    }

    /// Read-only view of the memory store
    pub fn memory(&self) -> &TieredMemoryStore {
        &self.memory
    }

    /// Impression for this entity and category
    pub fn get_impression(&self, category: BehaviorCategory) -> Impression {
        self.memory.get_impression(&self.entity_id, category)
    }

    /// Run a decay pass now, regardless of cadence
    pub fn apply_decay(&mut self, now: DateTime<Utc>) {
        self.scheduler.run(&mut self.memory, now);
    }

    /// Encode the current state into a snapshot payload
    pub fn snapshot(&self) -> SnapshotPayload {
        self.encoder
            .encode(&self.entity_id, &self.context, &self.memory)
    }

    /// Encode the current state to snapshot JSON
    pub fn snapshot_json(&self) -> Result<String, SenseError> {
        self.encoder
            .encode_to_json(&self.entity_id, &self.context, &self.memory)
    }

    /// Serialize engine state (context, baselines, memory) for persistence.
    ///
    /// The permanent tier must survive restarts; warning/baseline records
    /// keep their timestamps so decay stays correct after a restore.
    pub fn save_state(&self) -> Result<String, SenseError> {
        let state = ProcessorState {
            entity_id: self.entity_id.clone(),
            context: self.context,
            physio: self.physio.clone(),
            memory: self.memory.clone(),
        };
        serde_json::to_string(&state).map_err(SenseError::JsonError)
    }

    /// Restore engine state previously produced by [`save_state`]
    ///
    /// [`save_state`]: Self::save_state
    pub fn load_state(&mut self, json: &str) -> Result<(), SenseError> {
        let state: ProcessorState = serde_json::from_str(json)
            .map_err(|e| SenseError::StateError(format!("Failed to parse engine state: {e}")))?;
        self.entity_id = state.entity_id;
        self.context = state.context;
        self.physio = state.physio;
        self.memory = state.memory;
        Ok(())
    }

    /// The entity this processor tracks
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTier;
    use crate::types::ResponseLength;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap()
    }

    fn signal(offset_sec: i64, kind: SignalKind) -> Signal {
        Signal::new(t0() + Duration::seconds(offset_sec), kind)
    }

    #[test]
    fn test_anxiety_becomes_permanent() {
        let mut processor = SenseProcessor::new("user");

        // Rate 100 against the default baseline of 70: deviation 0.4286.
        let out = processor.process(&signal(
            0,
            SignalKind::Physiological {
                rate: 100.0,
                variability: None,
            },
        ));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, BehaviorCategory::Anxiety);
        assert!((out[0].confidence - 0.42857).abs() < 0.001);
        assert_eq!(out[0].weight, -10.0);

        let impression = processor.get_impression(BehaviorCategory::Anxiety);
        assert_eq!(impression.tier, Some(MemoryTier::Permanent));
        assert!((impression.value - 0.42857).abs() < 0.001);

        // Context vector moved too: stress rose from neutral.
        assert!(processor.context().stress > 0.5);
    }

    #[test]
    fn test_reread_flows_through_pipeline() {
        let mut processor = SenseProcessor::new("user");

        processor.process(&signal(
            0,
            SignalKind::Dwell {
                duration_sec: 3.0,
                target_id: "A".to_string(),
            },
        ));
        let out = processor.process(&signal(
            10,
            SignalKind::Dwell {
                duration_sec: 3.0,
                target_id: "A".to_string(),
            },
        ));

        assert_eq!(out.len(), 2);
        // Three interest absorptions total: 0.1 * 0.6, then the second
        // signal's pair.
        let impression = processor.get_impression(BehaviorCategory::Interest);
        assert_eq!(impression.tier, Some(MemoryTier::Baseline));
        assert!(impression.value > 0.0);
        assert!(processor.context().engagement > 0.5);
    }

    #[test]
    fn test_overwhelm_scenario_end_to_end() {
        let mut processor = SenseProcessor::new("user");

        let mut last = Vec::new();
        for i in 0..6 {
            last = processor.process(&signal(
                i * 5,
                SignalKind::ContextSwitch {
                    from_id: Some(format!("app-{i}")),
                    to_id: Some(format!("app-{}", i + 1)),
                },
            ));
        }

        assert_eq!(last.len(), 1);
        assert_eq!(last[0].category, BehaviorCategory::Overwhelm);
        assert!((last[0].confidence - 0.6).abs() < 0.001);
        assert!((last[0].weight - -12.0).abs() < 0.001);

        // Weight -12 is past the permanent cutoff.
        let impression = processor.get_impression(BehaviorCategory::Overwhelm);
        assert_eq!(impression.tier, Some(MemoryTier::Permanent));

        // Overwhelm also forces minimal responses.
        assert_eq!(processor.context().response_length, ResponseLength::Minimal);
    }

    #[test]
    fn test_motion_and_proximity_set_flags() {
        let mut processor = SenseProcessor::new("user");

        processor.process(&signal(
            0,
            SignalKind::Motion {
                is_moving: true,
                speed: Some(1.2),
            },
        ));
        assert!(processor.context().in_transit);

        let out = processor.process(&signal(
            1,
            SignalKind::Proximity {
                count: 2,
                is_known: false,
            },
        ));
        assert_eq!(processor.context().social_context, SocialContext::WithUnknown);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, BehaviorCategory::SocialAwareness);
        assert!(processor.context().context_sensitivity);

        processor.process(&signal(
            2,
            SignalKind::Proximity {
                count: 0,
                is_known: false,
            },
        ));
        assert_eq!(processor.context().social_context, SocialContext::Alone);
    }

    #[test]
    fn test_malformed_signal_dropped_silently() {
        let mut processor = SenseProcessor::new("user");

        let out = processor.process(&signal(
            0,
            SignalKind::Hesitation { duration_sec: -2.0 },
        ));
        assert!(out.is_empty());
        assert_eq!(*processor.context(), ContextVector::default());
    }

    #[test]
    fn test_process_json() {
        let mut processor = SenseProcessor::new("user");

        let out = processor
            .process_json(
                r#"{
                    "timestamp": "2024-01-15T14:00:00Z",
                    "signal_type": "velocity",
                    "velocity": 2500.0
                }"#,
            )
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, BehaviorCategory::Disinterest);

        let err = processor.process_json("not json");
        assert!(err.is_err());
    }

    #[test]
    fn test_signals_to_snapshot_stateless() {
        let batch = r#"[
            {
                "timestamp": "2024-01-15T14:00:00Z",
                "signal_type": "dwell",
                "duration_sec": 3.0,
                "target_id": "article"
            },
            {
                "timestamp": "2024-01-15T14:00:10Z",
                "signal_type": "physiological",
                "rate": 100.0,
                "variability": null
            }
        ]"#;

        let json = signals_to_snapshot(batch.to_string(), "user-1".to_string()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["snapshot_version"], "1.0.0");
        assert_eq!(payload["producer"]["name"], "synheart-sense");
        assert_eq!(payload["provenance"]["entity_id"], "user-1");
        assert_eq!(payload["memory"]["permanent"], 1);
        assert_eq!(payload["memory"]["baseline"], 1);
        assert!(payload["context"]["engagement"].as_f64().unwrap() > 0.5);
        assert!(payload["context"]["stress"].as_f64().unwrap() > 0.5);
    }

    #[test]
    fn test_signals_to_snapshot_invalid_json() {
        let result = signals_to_snapshot("not valid json".to_string(), "user".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_state_round_trip_preserves_permanent_tier() {
        let mut processor = SenseProcessor::new("user");
        processor.process(&signal(
            0,
            SignalKind::Physiological {
                rate: 100.0,
                variability: None,
            },
        ));

        let saved = processor.save_state().unwrap();

        let mut restored = SenseProcessor::new("placeholder");
        restored.load_state(&saved).unwrap();

        assert_eq!(restored.entity_id(), "user");
        let impression = restored.get_impression(BehaviorCategory::Anxiety);
        assert_eq!(impression.tier, Some(MemoryTier::Permanent));
        assert!((impression.value - 0.42857).abs() < 0.001);
        assert_eq!(restored.context().stress, processor.context().stress);
    }

    #[test]
    fn test_decay_correct_after_restore() {
        let mut processor = SenseProcessor::new("user");
        processor.process(&signal(
            0,
            SignalKind::Dwell {
                duration_sec: 3.0,
                target_id: "A".to_string(),
            },
        ));
        let before = processor.get_impression(BehaviorCategory::Interest).value;

        let saved = processor.save_state().unwrap();
        let mut restored = SenseProcessor::new("user");
        restored.load_state(&saved).unwrap();

        // A week offline: the baseline record decays by one e-fold against
        // its persisted timestamp.
        restored.apply_decay(t0() + Duration::days(7));
        let after = restored.get_impression(BehaviorCategory::Interest).value;
        assert!((after - before * (-1.0_f64).exp()).abs() < 1e-6);
    }

    #[test]
    fn test_load_state_rejects_garbage() {
        let mut processor = SenseProcessor::new("user");
        assert!(processor.load_state("{\"wrong\": true}").is_err());
    }

    #[test]
    fn test_custom_config_flows_through() {
        let mut config = SenseConfig::default();
        config.classifier.dwell.interest_min_sec = 10.0;

        let mut processor = SenseProcessor::with_config("user", config);
        let out = processor.process(&signal(
            0,
            SignalKind::Dwell {
                duration_sec: 3.0,
                target_id: "A".to_string(),
            },
        ));

        // Raised threshold: a 3-second dwell no longer reads as interest.
        assert!(out.is_empty());
    }
}
