//! Real-time context vector
//!
//! The context vector is the bounded summary of the entity's current inferred
//! state: six scalar fields kept in [0,1] plus categorical flags. Scalars are
//! clamped after every single update, never in batches.

use crate::types::{BehaviorCategory, Interpretation, ResponseLength, SocialContext};
use serde::{Deserialize, Serialize};

/// Neutral midpoint each scalar starts at
pub const NEUTRAL_SCALAR: f64 = 0.5;

/// Engagement delta per unit confidence for interest/disinterest
pub const ENGAGEMENT_DELTA: f64 = 0.1;
/// Frustration delta per unit confidence
pub const FRUSTRATION_DELTA: f64 = 0.2;
/// Overwhelm delta per unit confidence
pub const OVERWHELM_DELTA: f64 = 0.3;
/// Cognitive-load delta per unit confidence
pub const COGNITIVE_LOAD_DELTA: f64 = 0.2;
/// Stress delta per unit confidence for calm (downward)
pub const CALM_STRESS_DELTA: f64 = 0.1;
/// Stress delta per unit confidence for anxiety (upward)
pub const ANXIETY_STRESS_DELTA: f64 = 0.2;
/// Fatigue delta per unit confidence
pub const FATIGUE_DELTA: f64 = 0.15;

/// Bounded real-time state vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextVector {
    /// Current stress level (0-1)
    pub stress: f64,
    /// Current engagement level (0-1)
    pub engagement: f64,
    /// Current frustration level (0-1)
    pub frustration: f64,
    /// Current overwhelm level (0-1)
    pub overwhelm: f64,
    /// Current cognitive load (0-1)
    pub cognitive_load: f64,
    /// Current fatigue level (0-1)
    pub fatigue: f64,
    /// Social context from proximity sensing
    pub social_context: SocialContext,
    /// Whether the entity is currently in transit
    pub in_transit: bool,
    /// Preferred response granularity
    pub response_length: ResponseLength,
    /// Raised when social awareness has been observed
    pub context_sensitivity: bool,
}

impl Default for ContextVector {
    fn default() -> Self {
        Self {
            stress: NEUTRAL_SCALAR,
            engagement: NEUTRAL_SCALAR,
            frustration: NEUTRAL_SCALAR,
            overwhelm: NEUTRAL_SCALAR,
            cognitive_load: NEUTRAL_SCALAR,
            fatigue: NEUTRAL_SCALAR,
            social_context: SocialContext::default(),
            in_transit: false,
            response_length: ResponseLength::default(),
            context_sensitivity: false,
        }
    }
}

impl ContextVector {
    /// Set the in-transit flag from a motion signal
    pub fn set_in_transit(&mut self, in_transit: bool) {
        self.in_transit = in_transit;
    }

    /// Set the social context from a proximity signal
    pub fn set_social_context(&mut self, social_context: SocialContext) {
        self.social_context = social_context;
    }

    /// Clamp every scalar field to [0,1]
    fn clamp_scalars(&mut self) {
        self.stress = self.stress.clamp(0.0, 1.0);
        self.engagement = self.engagement.clamp(0.0, 1.0);
        self.frustration = self.frustration.clamp(0.0, 1.0);
        self.overwhelm = self.overwhelm.clamp(0.0, 1.0);
        self.cognitive_load = self.cognitive_load.clamp(0.0, 1.0);
        self.fatigue = self.fatigue.clamp(0.0, 1.0);
    }
}

/// Updater folding interpretations into the context vector
///
/// The update is functional: it consumes the previous vector and returns the
/// new one, clamped. There are no side effects beyond the returned vector.
pub struct ContextUpdater;

impl ContextUpdater {
    /// Apply one interpretation and return the updated, clamped vector
    pub fn update(vector: ContextVector, interpretation: &Interpretation) -> ContextVector {
        let mut v = vector;
        let confidence = interpretation.confidence;

        match interpretation.category {
            BehaviorCategory::Interest => {
                v.engagement += ENGAGEMENT_DELTA * confidence;
            }
            BehaviorCategory::Disinterest => {
                v.engagement -= ENGAGEMENT_DELTA * confidence;
            }
            BehaviorCategory::Frustration => {
                v.frustration += FRUSTRATION_DELTA * confidence;
            }
            BehaviorCategory::Overwhelm => {
                v.overwhelm += OVERWHELM_DELTA * confidence;
                v.response_length = ResponseLength::Minimal;
            }
            BehaviorCategory::CognitiveLoad => {
                v.cognitive_load += COGNITIVE_LOAD_DELTA * confidence;
                v.response_length = ResponseLength::Brief;
            }
            BehaviorCategory::Calm => {
                v.stress -= CALM_STRESS_DELTA * confidence;
            }
            BehaviorCategory::Anxiety => {
                v.stress += ANXIETY_STRESS_DELTA * confidence;
            }
            BehaviorCategory::Fatigue => {
                v.fatigue += FATIGUE_DELTA * confidence;
            }
            BehaviorCategory::SocialAwareness => {
                v.context_sensitivity = true;
            }
        }

        v.clamp_scalars();
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn interp(category: BehaviorCategory, confidence: f64) -> Interpretation {
        Interpretation::new(category, confidence, 0.0, Utc::now())
    }

    #[test]
    fn test_starts_neutral() {
        let v = ContextVector::default();
        assert_eq!(v.stress, 0.5);
        assert_eq!(v.engagement, 0.5);
        assert_eq!(v.response_length, ResponseLength::Normal);
        assert_eq!(v.social_context, SocialContext::Alone);
        assert!(!v.in_transit);
        assert!(!v.context_sensitivity);
    }

    #[test]
    fn test_interest_raises_engagement() {
        let v = ContextUpdater::update(
            ContextVector::default(),
            &interp(BehaviorCategory::Interest, 1.0),
        );
        assert!((v.engagement - 0.6).abs() < 0.001);
    }

    #[test]
    fn test_disinterest_lowers_engagement() {
        let v = ContextUpdater::update(
            ContextVector::default(),
            &interp(BehaviorCategory::Disinterest, 0.5),
        );
        assert!((v.engagement - 0.45).abs() < 0.001);
    }

    #[test]
    fn test_overwhelm_sets_minimal_response() {
        let v = ContextUpdater::update(
            ContextVector::default(),
            &interp(BehaviorCategory::Overwhelm, 0.6),
        );
        assert!((v.overwhelm - 0.68).abs() < 0.001);
        assert_eq!(v.response_length, ResponseLength::Minimal);
    }

    #[test]
    fn test_cognitive_load_sets_brief_response() {
        let v = ContextUpdater::update(
            ContextVector::default(),
            &interp(BehaviorCategory::CognitiveLoad, 0.5),
        );
        assert!((v.cognitive_load - 0.6).abs() < 0.001);
        assert_eq!(v.response_length, ResponseLength::Brief);
    }

    #[test]
    fn test_calm_and_anxiety_move_stress() {
        let v = ContextUpdater::update(
            ContextVector::default(),
            &interp(BehaviorCategory::Anxiety, 1.0),
        );
        assert!((v.stress - 0.7).abs() < 0.001);

        let v = ContextUpdater::update(v, &interp(BehaviorCategory::Calm, 0.7));
        assert!((v.stress - 0.63).abs() < 0.001);
    }

    #[test]
    fn test_fatigue_delta() {
        let v = ContextUpdater::update(
            ContextVector::default(),
            &interp(BehaviorCategory::Fatigue, 1.0),
        );
        assert!((v.fatigue - 0.65).abs() < 0.001);
    }

    #[test]
    fn test_social_awareness_sets_sensitivity() {
        let v = ContextUpdater::update(
            ContextVector::default(),
            &interp(BehaviorCategory::SocialAwareness, 0.8),
        );
        assert!(v.context_sensitivity);
    }

    #[test]
    fn test_clamp_invariant_upward() {
        // Pile on frustration far past the ceiling; every intermediate
        // vector must stay within bounds.
        let mut v = ContextVector::default();
        for _ in 0..50 {
            v = ContextUpdater::update(v, &interp(BehaviorCategory::Frustration, 1.0));
            assert!(v.frustration >= 0.0 && v.frustration <= 1.0);
        }
        assert_eq!(v.frustration, 1.0);
    }

    #[test]
    fn test_clamp_invariant_downward() {
        let mut v = ContextVector::default();
        for _ in 0..50 {
            v = ContextUpdater::update(v, &interp(BehaviorCategory::Disinterest, 1.0));
            assert!(v.engagement >= 0.0 && v.engagement <= 1.0);
        }
        assert_eq!(v.engagement, 0.0);
    }

    #[test]
    fn test_confidence_above_one_still_clamps() {
        // Overwhelm confidence from the window-scaled rule can exceed 1.0.
        let v = ContextUpdater::update(
            ContextVector::default(),
            &interp(BehaviorCategory::Overwhelm, 2.4),
        );
        assert!(v.overwhelm <= 1.0);
    }

    #[test]
    fn test_categorical_setters() {
        let mut v = ContextVector::default();
        v.set_in_transit(true);
        v.set_social_context(SocialContext::WithUnknown);
        assert!(v.in_transit);
        assert_eq!(v.social_context, SocialContext::WithUnknown);
    }
}
