//! Tiered impression memory
//!
//! Interpretations accumulate into a three-tier store keyed by
//! (entity, category). Severe negative evidence lands in the permanent tier
//! and never decays; milder negative evidence decays over weeks; positive and
//! neutral evidence decays over days. Promotion to permanent is one-way.

use crate::config::MemoryConfig;
use crate::types::{BehaviorCategory, Interpretation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Seconds per day, for elapsed-time conversion
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Storage tier of a memory record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryTier {
    Permanent,
    Warning,
    Baseline,
}

impl MemoryTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryTier::Permanent => "permanent",
            MemoryTier::Warning => "warning",
            MemoryTier::Baseline => "baseline",
        }
    }
}

/// One stored memory value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Accumulated value (running max for permanent, EMA otherwise)
    pub value: f64,
    /// Last absorb or decay touch; audit-only for permanent records
    pub last_updated: DateTime<Utc>,
    /// Decay constant in days; `None` for the permanent tier
    pub decay_days: Option<f64>,
}

/// Store key: one tracked entity crossed with one behavior category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImpressionKey {
    pub entity: String,
    pub category: BehaviorCategory,
}

impl ImpressionKey {
    pub fn new(entity: &str, category: BehaviorCategory) -> Self {
        Self {
            entity: entity.to_string(),
            category,
        }
    }
}

/// Retrieval result combining tier precedence into one reportable value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impression {
    pub value: f64,
    /// Winning tier; `None` for the neutral default
    pub tier: Option<MemoryTier>,
    /// Current baseline value, carried when the warning tier wins
    pub baseline_context: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Impression {
    fn neutral(value: f64) -> Self {
        Self {
            value,
            tier: None,
            baseline_context: None,
            last_updated: None,
        }
    }
}

/// Three-tier asymmetric memory store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoreState", into = "StoreState")]
pub struct TieredMemoryStore {
    config: MemoryConfig,
    permanent: HashMap<ImpressionKey, MemoryRecord>,
    warning: HashMap<ImpressionKey, MemoryRecord>,
    baseline: HashMap<ImpressionKey, MemoryRecord>,
}

impl Default for TieredMemoryStore {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl TieredMemoryStore {
    /// Create a store with the given tuning
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            permanent: HashMap::new(),
            warning: HashMap::new(),
            baseline: HashMap::new(),
        }
    }

    /// Tier an interpretation weight falls into.
    ///
    /// The permanent cutoff is exclusive: a weight of exactly -8 stays in
    /// warning. This boundary is load-bearing for compatibility.
    pub fn tier_for_weight(&self, weight: f64) -> MemoryTier {
        if weight < self.config.permanent_weight_cutoff {
            MemoryTier::Permanent
        } else if weight < self.config.warning_weight_cutoff {
            MemoryTier::Warning
        } else {
            MemoryTier::Baseline
        }
    }

    /// Absorb one interpretation for an entity and return the tier it landed
    /// in.
    ///
    /// A key that already holds a permanent record is updated there
    /// regardless of the new weight; permanence is sticky.
    pub fn absorb(&mut self, entity: &str, interpretation: &Interpretation) -> MemoryTier {
        let key = ImpressionKey::new(entity, interpretation.category);
        let now = interpretation.observed_at;
        let confidence = interpretation.confidence;

        if let Some(record) = self.permanent.get_mut(&key) {
            record.value = record.value.max(confidence);
            record.last_updated = now;
            return MemoryTier::Permanent;
        }

        let tier = self.tier_for_weight(interpretation.weight);
        match tier {
            MemoryTier::Permanent => {
                // One-way promotion: the decaying tiers stop tracking this key.
                self.warning.remove(&key);
                self.baseline.remove(&key);
                self.permanent.insert(
                    key,
                    MemoryRecord {
                        value: confidence.max(0.0),
                        last_updated: now,
                        decay_days: None,
                    },
                );
            }
            MemoryTier::Warning => {
                let existing = self.warning.get(&key).map_or(0.0, |r| r.value);
                let alpha = self.config.warning_learning_rate;
                self.warning.insert(
                    key,
                    MemoryRecord {
                        value: (1.0 - alpha) * existing + alpha * confidence,
                        last_updated: now,
                        decay_days: Some(self.config.warning_decay_days),
                    },
                );
            }
            MemoryTier::Baseline => {
                let existing = self.baseline.get(&key).map_or(0.0, |r| r.value);
                let alpha = self.config.baseline_learning_rate;
                self.baseline.insert(
                    key,
                    MemoryRecord {
                        value: (1.0 - alpha) * existing + alpha * confidence,
                        last_updated: now,
                        decay_days: Some(self.config.baseline_decay_days),
                    },
                );
            }
        }

        tier
    }

    /// Retrieve the impression for a key.
    ///
    /// Permanent dominates unconditionally, then warning (above zero, with
    /// the current baseline value as supplementary context), then baseline,
    /// else the neutral default.
    pub fn get_impression(&self, entity: &str, category: BehaviorCategory) -> Impression {
        let key = ImpressionKey::new(entity, category);

        if let Some(record) = self.permanent.get(&key) {
            return Impression {
                value: record.value,
                tier: Some(MemoryTier::Permanent),
                baseline_context: None,
                last_updated: Some(record.last_updated),
            };
        }

        if let Some(record) = self.warning.get(&key) {
            if record.value > 0.0 {
                return Impression {
                    value: record.value,
                    tier: Some(MemoryTier::Warning),
                    baseline_context: self.baseline.get(&key).map(|r| r.value),
                    last_updated: Some(record.last_updated),
                };
            }
        }

        if let Some(record) = self.baseline.get(&key) {
            return Impression {
                value: record.value,
                tier: Some(MemoryTier::Baseline),
                baseline_context: None,
                last_updated: Some(record.last_updated),
            };
        }

        Impression::neutral(self.config.neutral_value)
    }

    /// Apply exponential time decay to the warning and baseline tiers and
    /// evict records that have faded below the eviction epsilon.
    ///
    /// `last_updated` advances to `now` on each pass so repeated application
    /// composes exponentially: decaying to t1 and then to t2 equals decaying
    /// straight to t2. A `now` earlier than `last_updated` is a no-op.
    pub fn apply_decay(&mut self, now: DateTime<Utc>) {
        let epsilon = self.config.eviction_epsilon;
        decay_tier(&mut self.warning, now, epsilon);
        decay_tier(&mut self.baseline, now, epsilon);
    }

    pub fn permanent_count(&self) -> usize {
        self.permanent.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warning.len()
    }

    pub fn baseline_count(&self) -> usize {
        self.baseline.len()
    }

    /// All keys currently known to any tier, sorted for stable output
    pub fn known_keys(&self) -> Vec<ImpressionKey> {
        let mut keys: Vec<ImpressionKey> = self
            .permanent
            .keys()
            .chain(self.warning.keys())
            .chain(self.baseline.keys())
            .cloned()
            .collect();
        keys.sort_by(|a, b| {
            (a.entity.as_str(), a.category.as_str()).cmp(&(b.entity.as_str(), b.category.as_str()))
        });
        keys.dedup();
        keys
    }

    /// Clear all tiers
    pub fn clear(&mut self) {
        self.permanent.clear();
        self.warning.clear();
        self.baseline.clear();
    }

    /// Load store from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize store to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn decay_tier(
    records: &mut HashMap<ImpressionKey, MemoryRecord>,
    now: DateTime<Utc>,
    epsilon: f64,
) {
    for record in records.values_mut() {
        let Some(decay_days) = record.decay_days else {
            continue;
        };
        if decay_days <= 0.0 {
            continue;
        }

        let elapsed_sec = (now - record.last_updated).num_milliseconds() as f64 / 1000.0;
        if elapsed_sec <= 0.0 {
            // Zero elapsed time or clock skew: factor would be >= 1, skip.
            continue;
        }

        let days = elapsed_sec / SECONDS_PER_DAY;
        record.value *= (-days / decay_days).exp();
        record.last_updated = now;
    }

    records.retain(|_, record| record.value >= epsilon);
}

/// Flat serialized form of the store (JSON maps need string keys)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreState {
    config: MemoryConfig,
    permanent: Vec<(ImpressionKey, MemoryRecord)>,
    warning: Vec<(ImpressionKey, MemoryRecord)>,
    baseline: Vec<(ImpressionKey, MemoryRecord)>,
}

impl From<StoreState> for TieredMemoryStore {
    fn from(state: StoreState) -> Self {
        Self {
            config: state.config,
            permanent: state.permanent.into_iter().collect(),
            warning: state.warning.into_iter().collect(),
            baseline: state.baseline.into_iter().collect(),
        }
    }
}

impl From<TieredMemoryStore> for StoreState {
    fn from(store: TieredMemoryStore) -> Self {
        fn sorted(map: HashMap<ImpressionKey, MemoryRecord>) -> Vec<(ImpressionKey, MemoryRecord)> {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| {
                (a.entity.as_str(), a.category.as_str())
                    .cmp(&(b.entity.as_str(), b.category.as_str()))
            });
            entries
        }

        Self {
            config: store.config,
            permanent: sorted(store.permanent),
            warning: sorted(store.warning),
            baseline: sorted(store.baseline),
        }
    }
}
