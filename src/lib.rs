//! Synheart Sense - On-device behavioral signal interpretation engine
//!
//! Sense converts discrete raw interaction and sensor signals into weighted
//! behavior interpretations through a deterministic pipeline: threshold
//! classification → context-vector update → tiered memory absorption, with
//! time-based decay applied by an independent scheduler.
//!
//! ## Modules
//!
//! - **Classifier**: Map raw signals to weighted behavior interpretations
//! - **Context**: Bounded real-time state vector with clamped scalar fields
//! - **Memory**: Three-tier asymmetric store (permanent / warning / baseline)
//! - **Decay**: Exponential time decay with an injectable clock

pub mod baseline;
pub mod classifier;
pub mod config;
pub mod context;
pub mod decay;
pub mod encoder;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use baseline::PhysioBaselineStore;
pub use classifier::ThresholdClassifier;
pub use config::SenseConfig;
pub use context::{ContextUpdater, ContextVector};
pub use decay::{Clock, DecayScheduler, SystemClock};
pub use error::SenseError;
pub use memory::{Impression, MemoryTier, TieredMemoryStore};
pub use pipeline::{signals_to_snapshot, SenseProcessor};
pub use types::{BehaviorCategory, Interpretation, Signal, SignalKind};

/// Sense version embedded in all snapshot payloads
pub const SENSE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for snapshot payloads
pub const PRODUCER_NAME: &str = "synheart-sense";
