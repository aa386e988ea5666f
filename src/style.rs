//! Style synthesis — mode selection and profile/decoding-parameter
//! generation.
//!
//! The synthesis pipeline:
//! ```text
//! (weights, affect, context) ── decision list ──▶ Mode
//! Mode ── template ──▶ base decoding params
//!   ├─ trait weights  perturb within the template's envelope
//!   ├─ affect         perturb, each term clamped to max_affect_delta
//!   └─ boundary hints hard-clamp style and decoding dimensions
//! ```
//!
//! Everything here is pure: identical inputs always produce the identical
//! profile. Boundary clamps are applied last and always win over trait and
//! affect perturbation; when two hints cap the same dimension the most
//! restrictive value is taken.

use serde::{Deserialize, Serialize};

use crate::affect::AffectSnapshot;
use crate::boundary::{PolicyHint, RecommendedAction};
use crate::context::{AudienceType, InteractionContext, TaskType, Urgency};
use crate::errors::ConfigurationError;
use crate::kernel::TraitWeights;

// ---------------------------------------------------------------------------
// Profile types
// ---------------------------------------------------------------------------

/// Discrete operating regime attached to a synthesized profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Flow,
    Deep,
    Crisis,
}

/// Sentence-length class for diction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentenceLength {
    Short,
    Medium,
    Long,
}

/// How sensitive topics are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityLevel {
    Normal,
    Soften,
    Hide,
}

/// Tone dimensions a boundary condition may cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneDimension {
    Warmth,
    Formality,
    Humor,
    Flirtation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneProfile {
    pub warmth: f64,
    pub formality: f64,
    pub humor: f64,
    pub flirtation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DictionProfile {
    pub sentence_length: SentenceLength,
    pub metaphor_density: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacingProfile {
    pub expansiveness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StanceProfile {
    pub assertiveness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryFlags {
    pub nsfw_allowed: bool,
    pub sensitivity: SensitivityLevel,
}

/// Decoding parameters handed to the text-generation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecodingParams {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub repetition_penalty: f64,
    pub max_tokens: u32,
}

/// Complete synthesized style for one interaction. Computed fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleProfile {
    pub mode: Mode,
    pub tone: ToneProfile,
    pub diction: DictionProfile,
    pub pacing: PacingProfile,
    pub stance: StanceProfile,
    pub boundaries: BoundaryFlags,
    pub decoding: DecodingParams,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-mode base decoding parameters plus the maximum excursion trait and
/// affect perturbation may apply to each.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeTemplate {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub repetition_penalty: f64,
    pub max_tokens: u32,
    pub max_temperature_delta: f64,
    pub max_top_p_delta: f64,
    pub max_tokens_delta: u32,
}

impl ModeTemplate {
    fn validate(&self, mode: &'static str) -> Result<(), ConfigurationError> {
        let checks = [
            ("temperature", self.temperature, 0.0, 2.0),
            ("top_p", self.top_p, 0.1, 1.0),
            ("repetition_penalty", self.repetition_penalty, 0.5, 2.0),
            ("max_temperature_delta", self.max_temperature_delta, 0.0, 1.0),
            ("max_top_p_delta", self.max_top_p_delta, 0.0, 0.5),
        ];
        for (name, value, lo, hi) in checks {
            if !value.is_finite() || value < lo || value > hi {
                return Err(ConfigurationError::InvalidModeTemplate {
                    mode,
                    reason: format!("{name} = {value} outside [{lo}, {hi}]"),
                });
            }
        }
        if self.top_k == 0 || self.top_k > 100 {
            return Err(ConfigurationError::InvalidModeTemplate {
                mode,
                reason: format!("top_k = {} outside [1, 100]", self.top_k),
            });
        }
        if self.max_tokens < 64 || self.max_tokens > 4000 {
            return Err(ConfigurationError::InvalidModeTemplate {
                mode,
                reason: format!("max_tokens = {} outside [64, 4000]", self.max_tokens),
            });
        }
        Ok(())
    }
}

/// Construction-time tuning for the synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Stress level above which the crisis regime engages.
    pub crisis_stress_threshold: f64,
    /// Cap on any single affect-driven perturbation of a style dimension.
    pub max_affect_delta: f64,
    pub flow: ModeTemplate,
    pub deep: ModeTemplate,
    pub crisis: ModeTemplate,
}

impl StyleConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (name, value) in [
            ("crisis_stress_threshold", self.crisis_stress_threshold),
            ("max_affect_delta", self.max_affect_delta),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::ParameterOutOfRange { name, value });
            }
        }
        self.flow.validate("flow")?;
        self.deep.validate("deep")?;
        self.crisis.validate("crisis")?;
        Ok(())
    }

    pub fn template(&self, mode: Mode) -> &ModeTemplate {
        match mode {
            Mode::Flow => &self.flow,
            Mode::Deep => &self.deep,
            Mode::Crisis => &self.crisis,
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            crisis_stress_threshold: 0.7,
            max_affect_delta: 0.2,
            flow: ModeTemplate {
                temperature: 0.80,
                top_p: 0.90,
                top_k: 50,
                repetition_penalty: 1.10,
                max_tokens: 1200,
                max_temperature_delta: 0.15,
                max_top_p_delta: 0.05,
                max_tokens_delta: 300,
            },
            deep: ModeTemplate {
                temperature: 0.40,
                top_p: 0.85,
                top_k: 40,
                repetition_penalty: 1.05,
                max_tokens: 1600,
                max_temperature_delta: 0.15,
                max_top_p_delta: 0.05,
                max_tokens_delta: 300,
            },
            crisis: ModeTemplate {
                temperature: 0.20,
                top_p: 0.80,
                top_k: 20,
                repetition_penalty: 1.00,
                max_tokens: 400,
                max_temperature_delta: 0.10,
                max_top_p_delta: 0.05,
                max_tokens_delta: 100,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

/// Pure synthesis over resolved weights, the affect snapshot, the context,
/// and the active boundary hints.
#[derive(Debug, Clone)]
pub struct StyleSynthesizer {
    config: StyleConfig,
}

impl StyleSynthesizer {
    pub fn new(config: StyleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    /// Mode selection: a decision list evaluated top-down, first match wins.
    ///
    /// 1. Crisis — urgency at least high, or stress over the threshold.
    /// 2. Deep — analytical task or professional audience, stress below the
    ///    threshold.
    /// 3. Flow — everything else.
    pub fn synthesize_mode(
        &self,
        _weights: &TraitWeights,
        affect: &AffectSnapshot,
        context: &InteractionContext,
    ) -> Mode {
        if context.urgency >= Urgency::High
            || affect.stress > self.config.crisis_stress_threshold
        {
            return Mode::Crisis;
        }
        let analytical = context.task_type == Some(TaskType::Analytical);
        let professional = context.audience == Some(AudienceType::Professional);
        if (analytical || professional) && affect.stress <= self.config.crisis_stress_threshold {
            return Mode::Deep;
        }
        Mode::Flow
    }

    /// Build the full profile for a mode. Pure in all four inputs.
    pub fn synthesize_profile(
        &self,
        mode: Mode,
        weights: &TraitWeights,
        affect: &AffectSnapshot,
        context: &InteractionContext,
        hints: &[PolicyHint],
    ) -> StyleProfile {
        let mad = self.config.max_affect_delta;
        let bounded = |x: f64| x.clamp(-mad, mad);
        let arousal_dev = affect.arousal - 0.5;

        let mut warmth = 0.15 + 0.55 * weights.care + 0.15 * weights.balance
            + bounded(0.30 * affect.valence);
        let mut formality = (1.0 - 0.6 * weights.candor - 0.4 * weights.wit)
            + bounded(0.20 * affect.stress - 0.15 * arousal_dev);
        let mut humor = 0.7 * weights.wit + 0.2 * weights.curiosity
            + bounded(0.25 * affect.valence - 0.25 * affect.stress);
        let mut flirtation = 0.3 * weights.candor + 0.25 * weights.wit
            + bounded(0.20 * affect.valence - 0.30 * affect.stress);
        let assertiveness = (0.7 * weights.candor + 0.2 * weights.balance
            + bounded(0.20 * arousal_dev + 0.15 * affect.valence))
        .clamp(0.0, 1.0);
        let expansiveness = (0.6 * weights.curiosity + 0.3 * weights.candor
            + bounded(0.35 * arousal_dev - 0.25 * affect.stress))
        .clamp(0.0, 1.0);
        let metaphor_density = (0.6 * weights.wit + 0.4 * weights.curiosity
            + bounded(0.10 * affect.valence - 0.30 * affect.stress))
        .clamp(0.0, 1.0);

        warmth = warmth.clamp(0.0, 1.0);
        formality = formality.clamp(0.0, 1.0);
        humor = humor.clamp(0.0, 1.0);
        flirtation = flirtation.clamp(0.0, 1.0);

        let sentence_length = match mode {
            Mode::Crisis => SentenceLength::Short,
            Mode::Deep => SentenceLength::Long,
            Mode::Flow => {
                if affect.stress > 0.6 {
                    SentenceLength::Short
                } else if expansiveness > 0.75 {
                    SentenceLength::Long
                } else {
                    SentenceLength::Medium
                }
            }
        };

        let boundaries = BoundaryFlags {
            nsfw_allowed: context.audience == Some(AudienceType::Intimate),
            sensitivity: if context.audience == Some(AudienceType::Child) {
                SensitivityLevel::Soften
            } else {
                SensitivityLevel::Normal
            },
        };

        let decoding = self.synthesize_decoding(mode, weights, affect, expansiveness);

        let mut profile = StyleProfile {
            mode,
            tone: ToneProfile {
                warmth,
                formality,
                humor,
                flirtation,
            },
            diction: DictionProfile {
                sentence_length,
                metaphor_density,
            },
            pacing: PacingProfile { expansiveness },
            stance: StanceProfile { assertiveness },
            boundaries,
            decoding,
        };
        self.apply_caps(&mut profile, hints);
        profile
    }

    /// Apply boundary hint caps as hard clamps. Runs last in synthesis and
    /// again after any post-hoc adjustment (e.g. drift correction), so caps
    /// always beat trait/affect perturbation. Stacked caps on one dimension
    /// resolve to the tightest value.
    pub fn apply_caps(&self, profile: &mut StyleProfile, hints: &[PolicyHint]) {
        for hint in hints {
            for action in &hint.actions {
                match action {
                    RecommendedAction::CapTone { dimension, max } => match dimension {
                        ToneDimension::Warmth => {
                            profile.tone.warmth = profile.tone.warmth.min(*max)
                        }
                        ToneDimension::Formality => {
                            profile.tone.formality = profile.tone.formality.min(*max)
                        }
                        ToneDimension::Humor => {
                            profile.tone.humor = profile.tone.humor.min(*max)
                        }
                        ToneDimension::Flirtation => {
                            profile.tone.flirtation = profile.tone.flirtation.min(*max)
                        }
                    },
                    RecommendedAction::FloorFormality { min } => {
                        profile.tone.formality = profile.tone.formality.max(*min)
                    }
                    RecommendedAction::CapTemperature { max } => {
                        profile.decoding.temperature = profile.decoding.temperature.min(*max)
                    }
                    RecommendedAction::CapMaxTokens { max } => {
                        profile.decoding.max_tokens = profile.decoding.max_tokens.min(*max)
                    }
                    RecommendedAction::DisallowNsfw => {
                        profile.boundaries.nsfw_allowed = false
                    }
                    RecommendedAction::SoftenSensitive => {
                        if profile.boundaries.sensitivity == SensitivityLevel::Normal {
                            profile.boundaries.sensitivity = SensitivityLevel::Soften;
                        }
                    }
                    _ => {}
                }
            }
        }
        profile.tone.warmth = profile.tone.warmth.clamp(0.0, 1.0);
        profile.tone.formality = profile.tone.formality.clamp(0.0, 1.0);
        profile.tone.humor = profile.tone.humor.clamp(0.0, 1.0);
        profile.tone.flirtation = profile.tone.flirtation.clamp(0.0, 1.0);
    }

    /// Decoding params: the mode template perturbed by weights and affect,
    /// each excursion held inside the template's configured envelope.
    fn synthesize_decoding(
        &self,
        mode: Mode,
        weights: &TraitWeights,
        affect: &AffectSnapshot,
        expansiveness: f64,
    ) -> DecodingParams {
        let t = self.config.template(mode);

        let temperature_pert = (0.20 * (weights.wit - 0.5)
            + 0.10 * (weights.curiosity - 0.5)
            + 0.10 * affect.valence
            - 0.10 * affect.stress)
            .clamp(-t.max_temperature_delta, t.max_temperature_delta);
        let top_p_pert = (0.10 * (weights.curiosity - 0.5) + 0.05 * (weights.candor - 0.5))
            .clamp(-t.max_top_p_delta, t.max_top_p_delta);
        let tokens_range = t.max_tokens_delta as f64;
        let tokens_pert =
            ((expansiveness - 0.5) * 2.0 * tokens_range).clamp(-tokens_range, tokens_range);

        DecodingParams {
            temperature: (t.temperature + temperature_pert).clamp(0.05, 2.0),
            top_p: (t.top_p + top_p_pert).clamp(0.1, 1.0),
            top_k: t.top_k.clamp(1, 100),
            repetition_penalty: t.repetition_penalty.clamp(0.5, 2.0),
            max_tokens: ((t.max_tokens as f64 + tokens_pert).round() as i64)
                .clamp(64, 4000) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affect::{AffectConfig, AffectEngine};
    use crate::boundary::Severity;
    use crate::kernel::TraitKernel;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use std::collections::HashMap;

    fn now() -> DateTime<Utc> {
        "2026-01-15T12:00:00Z".parse().unwrap()
    }

    fn synth() -> StyleSynthesizer {
        StyleSynthesizer::new(StyleConfig::default())
    }

    fn neutral() -> AffectSnapshot {
        AffectEngine::new(AffectConfig::default(), &TraitKernel::balanced()).baseline(now())
    }

    fn weights(curiosity: f64, balance: f64, wit: f64, candor: f64, care: f64) -> TraitWeights {
        TraitWeights {
            curiosity,
            balance,
            wit,
            candor,
            care,
        }
    }

    fn ctx(pairs: &[(&str, serde_json::Value)]) -> InteractionContext {
        let map: HashMap<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        InteractionContext::from_map(&map)
    }

    fn humor_cap_hint(max: f64) -> PolicyHint {
        PolicyHint {
            condition_id: "cap".to_string(),
            reason: "test".to_string(),
            severity: Severity::Caution,
            actions: vec![RecommendedAction::CapTone {
                dimension: ToneDimension::Humor,
                max,
            }],
        }
    }

    #[test]
    fn test_mode_crisis_on_high_urgency() {
        let s = synth();
        let mode = s.synthesize_mode(
            &weights(0.5, 0.5, 0.5, 0.5, 0.5),
            &neutral(),
            &ctx(&[("urgency", json!("high"))]),
        );
        assert_eq!(mode, Mode::Crisis);
    }

    #[test]
    fn test_mode_crisis_on_high_stress() {
        let s = synth();
        let mut affect = neutral();
        affect.stress = 0.85;
        let mode = s.synthesize_mode(
            &weights(0.5, 0.5, 0.5, 0.5, 0.5),
            &affect,
            &InteractionContext::default(),
        );
        assert_eq!(mode, Mode::Crisis);
    }

    #[test]
    fn test_mode_deep_on_analytical_task() {
        let s = synth();
        let mode = s.synthesize_mode(
            &weights(0.5, 0.5, 0.5, 0.5, 0.5),
            &neutral(),
            &ctx(&[("task_type", json!("analytical"))]),
        );
        assert_eq!(mode, Mode::Deep);
    }

    #[test]
    fn test_mode_deep_on_professional_audience() {
        let s = synth();
        let mode = s.synthesize_mode(
            &weights(0.5, 0.5, 0.5, 0.5, 0.5),
            &neutral(),
            &ctx(&[("audience", json!("professional")), ("urgency", json!("normal"))]),
        );
        assert_eq!(mode, Mode::Deep);
    }

    #[test]
    fn test_mode_decision_order_crisis_beats_deep() {
        let s = synth();
        // Analytical task, but urgency wins the list from the top.
        let mode = s.synthesize_mode(
            &weights(0.5, 0.5, 0.5, 0.5, 0.5),
            &neutral(),
            &ctx(&[("task_type", json!("analytical")), ("urgency", json!("critical"))]),
        );
        assert_eq!(mode, Mode::Crisis);
    }

    #[test]
    fn test_mode_flow_is_default() {
        let s = synth();
        let mode = s.synthesize_mode(
            &weights(0.5, 0.5, 0.5, 0.5, 0.5),
            &neutral(),
            &ctx(&[("task_type", json!("creative")), ("urgency", json!("low"))]),
        );
        assert_eq!(mode, Mode::Flow);
    }

    #[test]
    fn test_mode_is_deterministic() {
        let s = synth();
        let w = weights(0.7, 0.6, 0.8, 0.4, 0.9);
        let context = ctx(&[("task_type", json!("analytical"))]);
        for _ in 0..5 {
            assert_eq!(s.synthesize_mode(&w, &neutral(), &context), Mode::Deep);
        }
    }

    #[test]
    fn test_boundary_clamp_dominates_humor() {
        let s = synth();
        // Maximal wit and a glowing mood push humor toward 1.0.
        let w = weights(1.0, 0.5, 1.0, 0.5, 0.5);
        let mut affect = neutral();
        affect.valence = 0.9;
        let hints = vec![humor_cap_hint(0.3)];
        let profile =
            s.synthesize_profile(Mode::Flow, &w, &affect, &InteractionContext::default(), &hints);
        assert!(profile.tone.humor <= 0.3);
    }

    #[test]
    fn test_stacked_caps_most_restrictive_wins() {
        let s = synth();
        let w = weights(1.0, 0.5, 1.0, 0.5, 0.5);
        let hints = vec![humor_cap_hint(0.6), humor_cap_hint(0.2)];
        let profile = s.synthesize_profile(
            Mode::Flow,
            &w,
            &neutral(),
            &InteractionContext::default(),
            &hints,
        );
        assert!(profile.tone.humor <= 0.2);
    }

    #[test]
    fn test_decoding_stays_inside_mode_envelope() {
        let s = synth();
        let extreme = weights(1.0, 1.0, 1.0, 1.0, 1.0);
        let mut affect = neutral();
        affect.valence = 1.0;
        affect.arousal = 1.0;
        for mode in [Mode::Flow, Mode::Deep, Mode::Crisis] {
            let t = s.config().template(mode);
            let p = s.synthesize_profile(mode, &extreme, &affect, &InteractionContext::default(), &[]);
            assert!(
                (p.decoding.temperature - t.temperature).abs() <= t.max_temperature_delta + 1e-9
            );
            assert!((p.decoding.top_p - t.top_p).abs() <= t.max_top_p_delta + 1e-9);
            assert!(
                (p.decoding.max_tokens as i64 - t.max_tokens as i64).unsigned_abs()
                    <= t.max_tokens_delta as u64
            );
        }
    }

    #[test]
    fn test_crisis_temperature_and_tokens() {
        let s = synth();
        let w = weights(0.85, 0.9, 0.7, 0.8, 0.8);
        let mut affect = neutral();
        affect.stress = 0.5;
        affect.valence = -0.2;
        let crisis =
            s.synthesize_profile(Mode::Crisis, &w, &affect, &InteractionContext::default(), &[]);
        let flow =
            s.synthesize_profile(Mode::Flow, &w, &affect, &InteractionContext::default(), &[]);
        assert!(crisis.decoding.temperature <= 0.3);
        assert!(crisis.decoding.max_tokens < flow.decoding.max_tokens);
        assert_eq!(crisis.diction.sentence_length, SentenceLength::Short);
    }

    #[test]
    fn test_valence_raises_warmth() {
        let s = synth();
        let w = weights(0.5, 0.5, 0.5, 0.5, 0.5);
        let mut bright = neutral();
        bright.valence = 0.6;
        let base = s.synthesize_profile(Mode::Flow, &w, &neutral(), &InteractionContext::default(), &[]);
        let warm = s.synthesize_profile(Mode::Flow, &w, &bright, &InteractionContext::default(), &[]);
        assert!(warm.tone.warmth > base.tone.warmth);
    }

    #[test]
    fn test_arousal_raises_expansiveness() {
        let s = synth();
        let w = weights(0.5, 0.5, 0.5, 0.5, 0.5);
        let mut lively = neutral();
        lively.arousal = 0.9;
        let base = s.synthesize_profile(Mode::Flow, &w, &neutral(), &InteractionContext::default(), &[]);
        let fast = s.synthesize_profile(Mode::Flow, &w, &lively, &InteractionContext::default(), &[]);
        assert!(fast.pacing.expansiveness > base.pacing.expansiveness);
        assert!(fast.decoding.max_tokens >= base.decoding.max_tokens);
    }

    #[test]
    fn test_high_wit_raises_humor_and_temperature() {
        let s = synth();
        let dull = weights(0.5, 0.5, 0.2, 0.5, 0.5);
        let witty = weights(0.5, 0.5, 0.9, 0.5, 0.5);
        let a = s.synthesize_profile(Mode::Flow, &dull, &neutral(), &InteractionContext::default(), &[]);
        let b = s.synthesize_profile(Mode::Flow, &witty, &neutral(), &InteractionContext::default(), &[]);
        assert!(b.tone.humor > a.tone.humor);
        assert!(b.decoding.temperature > a.decoding.temperature);
    }

    #[test]
    fn test_flow_sentence_length_responds_to_state() {
        let s = synth();
        let w = weights(0.5, 0.5, 0.5, 0.5, 0.5);
        let mut tense = neutral();
        tense.stress = 0.65;
        let p = s.synthesize_profile(Mode::Flow, &w, &tense, &InteractionContext::default(), &[]);
        assert_eq!(p.diction.sentence_length, SentenceLength::Short);

        let expansive = weights(1.0, 0.5, 0.5, 1.0, 0.5);
        let mut lively = neutral();
        lively.arousal = 0.9;
        let p = s.synthesize_profile(Mode::Flow, &expansive, &lively, &InteractionContext::default(), &[]);
        assert_eq!(p.diction.sentence_length, SentenceLength::Long);
    }

    #[test]
    fn test_nsfw_flag_and_disallow() {
        let s = synth();
        let w = weights(0.5, 0.5, 0.5, 0.5, 0.5);
        let intimate = ctx(&[("audience", json!("intimate"))]);
        let p = s.synthesize_profile(Mode::Flow, &w, &neutral(), &intimate, &[]);
        assert!(p.boundaries.nsfw_allowed);

        let hints = vec![PolicyHint {
            condition_id: "no".to_string(),
            reason: "test".to_string(),
            severity: Severity::Caution,
            actions: vec![RecommendedAction::DisallowNsfw],
        }];
        let p = s.synthesize_profile(Mode::Flow, &w, &neutral(), &intimate, &hints);
        assert!(!p.boundaries.nsfw_allowed);
    }

    #[test]
    fn test_all_scalars_bounded_under_extremes() {
        let s = synth();
        let extreme = weights(1.0, 1.0, 1.0, 1.0, 1.0);
        let mut affect = neutral();
        affect.valence = 1.0;
        affect.arousal = 1.0;
        affect.stress = 1.0;
        let p = s.synthesize_profile(Mode::Flow, &extreme, &affect, &InteractionContext::default(), &[]);
        for v in [
            p.tone.warmth,
            p.tone.formality,
            p.tone.humor,
            p.tone.flirtation,
            p.pacing.expansiveness,
            p.stance.assertiveness,
            p.diction.metaphor_density,
        ] {
            assert!((0.0..=1.0).contains(&v), "{v}");
        }
        assert!((0.05..=2.0).contains(&p.decoding.temperature));
        assert!((0.1..=1.0).contains(&p.decoding.top_p));
        assert!((1..=100).contains(&p.decoding.top_k));
        assert!((0.5..=2.0).contains(&p.decoding.repetition_penalty));
        assert!((64..=4000).contains(&p.decoding.max_tokens));
    }

    #[test]
    fn test_default_config_validates() {
        assert!(StyleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bad_template_rejected() {
        let mut config = StyleConfig::default();
        config.crisis.max_tokens = 10;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidModeTemplate { mode: "crisis", .. })
        ));
    }
}
