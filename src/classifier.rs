//! Threshold classifier
//!
//! Maps one raw signal into zero or more weighted behavior interpretations
//! using the configured rule table. The only state the classifier keeps is
//! short rolling windows: context-switch timestamps inside the configured
//! window and the last dwell target for reread detection.

use crate::baseline::PhysioBaselineStore;
use crate::config::{
    ClassifierConfig, HesitationRule, PhysiologicalRule, ProximityRule, TapPatternRule,
    TypedInputRule, VelocityRule,
};
use crate::types::{BehaviorCategory, Interpretation, Signal, SignalKind};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Stateful threshold classifier
#[derive(Debug, Clone)]
pub struct ThresholdClassifier {
    config: ClassifierConfig,
    /// Context-switch timestamps within the rolling window
    switch_times: VecDeque<DateTime<Utc>>,
    /// Target of the previous dwell signal, for reread detection
    last_dwell_target: Option<String>,
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl ThresholdClassifier {
    /// Create a classifier with the given rule table
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            switch_times: VecDeque::new(),
            last_dwell_target: None,
        }
    }

    /// Classify one signal into weighted interpretations.
    ///
    /// Malformed payloads produce no interpretations and no fault. Motion
    /// signals carry no score of their own; their categorical effect is
    /// applied to the context vector by the pipeline.
    pub fn classify(
        &mut self,
        signal: &Signal,
        physio: &PhysioBaselineStore,
    ) -> Vec<Interpretation> {
        if !signal.is_valid() {
            return Vec::new();
        }

        let at = signal.timestamp;
        match &signal.kind {
            SignalKind::Dwell {
                duration_sec,
                target_id,
            } => self.classify_dwell(*duration_sec, target_id, at),
            SignalKind::Velocity { velocity } => {
                classify_velocity(&self.config.velocity, *velocity, at)
            }
            SignalKind::Hesitation { duration_sec } => {
                classify_hesitation(&self.config.hesitation, *duration_sec, at)
            }
            SignalKind::TypedInput {
                keystroke_count,
                correction_count,
                duration_sec,
            } => classify_typed_input(
                &self.config.typed_input,
                *keystroke_count,
                *correction_count,
                *duration_sec,
                at,
            ),
            SignalKind::Physiological { rate, variability } => classify_physiological(
                &self.config.physiological,
                *rate,
                *variability,
                physio.baseline_or_default(),
                at,
            ),
            SignalKind::ContextSwitch { .. } => self.classify_context_switch(at),
            SignalKind::TapPattern {
                count,
                interval_sec,
            } => classify_tap_pattern(&self.config.tap_pattern, *count, *interval_sec, at),
            SignalKind::Motion { .. } => Vec::new(),
            SignalKind::Proximity { count, is_known } => {
                classify_proximity(&self.config.proximity, *count, *is_known, at)
            }
        }
    }

    /// Current count of context switches inside the rolling window
    pub fn switch_window_count(&self) -> usize {
        self.switch_times.len()
    }

    fn classify_dwell(
        &mut self,
        duration_sec: f64,
        target_id: &str,
        at: DateTime<Utc>,
    ) -> Vec<Interpretation> {
        let rule = &self.config.dwell;
        let mut out = Vec::new();

        if duration_sec > rule.interest_min_sec {
            let confidence = (duration_sec / rule.confidence_divisor).min(1.0);
            out.push(Interpretation::new(
                BehaviorCategory::Interest,
                confidence,
                rule.interest_weight,
                at,
            ));
        } else if duration_sec < rule.disinterest_max_sec {
            out.push(Interpretation::new(
                BehaviorCategory::Disinterest,
                rule.disinterest_confidence,
                rule.disinterest_weight,
                at,
            ));
        }

        // Reread bonus: same target as the previous dwell, independent of the
        // duration-based interpretation above.
        if self.last_dwell_target.as_deref() == Some(target_id) {
            out.push(Interpretation::new(
                BehaviorCategory::Interest,
                rule.reread_confidence,
                rule.reread_weight,
                at,
            ));
        }
        self.last_dwell_target = Some(target_id.to_string());

        out
    }

    fn classify_context_switch(&mut self, at: DateTime<Utc>) -> Vec<Interpretation> {
        let rule = &self.config.context_switch;
        let window = Duration::seconds(rule.window_sec);

        self.switch_times.push_back(at);
        while let Some(&oldest) = self.switch_times.front() {
            if at - oldest > window {
                self.switch_times.pop_front();
            } else {
                break;
            }
        }

        let count = self.switch_times.len() as u32;
        if count > rule.overwhelm_count_min {
            let confidence = f64::from(count) / rule.confidence_divisor;
            let weight = -rule.weight_per_switch * f64::from(count);
            vec![Interpretation::new(
                BehaviorCategory::Overwhelm,
                confidence,
                weight,
                at,
            )]
        } else {
            Vec::new()
        }
    }
}

fn classify_velocity(rule: &VelocityRule, velocity: f64, at: DateTime<Utc>) -> Vec<Interpretation> {
    if velocity > rule.fast_min {
        vec![Interpretation::new(
            BehaviorCategory::Disinterest,
            rule.fast_confidence,
            rule.fast_weight,
            at,
        )]
    } else if velocity < rule.slow_max {
        vec![Interpretation::new(
            BehaviorCategory::Interest,
            rule.slow_confidence,
            rule.slow_weight,
            at,
        )]
    } else {
        Vec::new()
    }
}

fn classify_hesitation(
    rule: &HesitationRule,
    duration_sec: f64,
    at: DateTime<Utc>,
) -> Vec<Interpretation> {
    if duration_sec <= rule.min_sec {
        return Vec::new();
    }

    let confidence = (duration_sec / rule.confidence_divisor).min(1.0);
    let weight = if duration_sec > rule.strong_min_sec {
        rule.strong_weight
    } else {
        rule.weight
    };
    vec![Interpretation::new(
        BehaviorCategory::Interest,
        confidence,
        weight,
        at,
    )]
}

fn classify_typed_input(
    rule: &TypedInputRule,
    keystroke_count: u32,
    correction_count: u32,
    duration_sec: f64,
    at: DateTime<Utc>,
) -> Vec<Interpretation> {
    let error_rate = f64::from(correction_count) / f64::from(keystroke_count.max(1));
    let mut out = Vec::new();

    if error_rate > rule.error_rate_min {
        out.push(Interpretation::new(
            BehaviorCategory::CognitiveLoad,
            error_rate.min(1.0),
            rule.cognitive_load_weight,
            at,
        ));
    }

    // Slow, error-prone typing also reads as frustration. Zero-duration
    // bursts yield no speed, so the rule is skipped rather than faulting.
    if duration_sec > 0.0 {
        let speed = f64::from(keystroke_count) / duration_sec;
        if speed < rule.slow_speed_max && error_rate > rule.frustration_error_rate_min {
            out.push(Interpretation::new(
                BehaviorCategory::Frustration,
                rule.frustration_confidence,
                rule.frustration_weight,
                at,
            ));
        }
    }

    out
}

fn classify_physiological(
    rule: &PhysiologicalRule,
    rate: f64,
    variability: Option<f64>,
    baseline: f64,
    at: DateTime<Utc>,
) -> Vec<Interpretation> {
    if baseline <= 0.0 {
        return Vec::new();
    }

    let deviation = (rate - baseline) / baseline;
    if deviation > rule.anxiety_deviation_min {
        return vec![Interpretation::new(
            BehaviorCategory::Anxiety,
            deviation.min(1.0),
            rule.anxiety_weight,
            at,
        )];
    }

    if deviation < rule.calm_deviation_max {
        if let Some(v) = variability {
            if v > rule.calm_variability_min {
                return vec![Interpretation::new(
                    BehaviorCategory::Calm,
                    rule.calm_confidence,
                    rule.calm_weight,
                    at,
                )];
            }
        }
    }

    Vec::new()
}

fn classify_tap_pattern(
    rule: &TapPatternRule,
    count: u32,
    interval_sec: f64,
    at: DateTime<Utc>,
) -> Vec<Interpretation> {
    if count > rule.burst_count_min && interval_sec < rule.burst_interval_max_sec {
        vec![Interpretation::new(
            BehaviorCategory::Frustration,
            rule.confidence,
            rule.weight,
            at,
        )]
    } else {
        Vec::new()
    }
}

fn classify_proximity(
    rule: &ProximityRule,
    count: u32,
    is_known: bool,
    at: DateTime<Utc>,
) -> Vec<Interpretation> {
    if count == 0 {
        return Vec::new();
    }

    let weight = if is_known {
        rule.known_weight
    } else {
        rule.unknown_weight
    };
    vec![Interpretation::new(
        BehaviorCategory::SocialAwareness,
        rule.confidence,
        weight,
        at,
    )]
}
