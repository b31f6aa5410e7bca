//! Snapshot encoder
//!
//! Encodes the current engine state (context vector plus impressions) into a
//! versioned JSON payload for reporting collaborators.

use crate::context::ContextVector;
use crate::error::SenseError;
use crate::memory::TieredMemoryStore;
use crate::types::{
    ImpressionEntry, SnapshotPayload, SnapshotProducer, SnapshotProvenance, TierCounts,
};
use crate::{PRODUCER_NAME, SENSE_VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Current snapshot schema version
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Encoder for engine state snapshots
pub struct SnapshotEncoder {
    instance_id: String,
}

impl Default for SnapshotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode the current state into a snapshot payload
    pub fn encode(
        &self,
        entity_id: &str,
        context: &ContextVector,
        memory: &TieredMemoryStore,
    ) -> SnapshotPayload {
        let computed_at = Utc::now();

        let producer = SnapshotProducer {
            name: PRODUCER_NAME.to_string(),
            version: SENSE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = SnapshotProvenance {
            entity_id: entity_id.to_string(),
            computed_at_utc: computed_at.to_rfc3339(),
        };

        let impressions = memory
            .known_keys()
            .into_iter()
            .map(|key| {
                let impression = memory.get_impression(&key.entity, key.category);
                ImpressionEntry {
                    entity: key.entity,
                    category: key.category,
                    value: impression.value,
                    tier: impression.tier,
                    baseline_context: impression.baseline_context,
                    last_updated_utc: impression.last_updated.map(|t| t.to_rfc3339()),
                }
            })
            .collect();

        let memory_counts = TierCounts {
            permanent: memory.permanent_count(),
            warning: memory.warning_count(),
            baseline: memory.baseline_count(),
        };

        SnapshotPayload {
            snapshot_version: SNAPSHOT_VERSION.to_string(),
            producer,
            provenance,
            context: *context,
            impressions,
            memory: memory_counts,
        }
    }

    /// Encode to pretty JSON
    pub fn encode_to_json(
        &self,
        entity_id: &str,
        context: &ContextVector,
        memory: &TieredMemoryStore,
    ) -> Result<String, SenseError> {
        let payload = self.encode(entity_id, context, memory);
        serde_json::to_string_pretty(&payload).map_err(SenseError::JsonError)
    }
}
