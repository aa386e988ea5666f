//! Personality orchestrator — the façade external collaborators talk to.
//!
//! One instance per agent identity, constructed at startup and torn down
//! at shutdown. Sequencing per update:
//!
//! ```text
//! validate event
//!   ▼ (write lock)
//! decay for the elapsed gap ─▶ event impact ─▶ snapshot history
//!   ▼ (unlock)
//! boundary evaluation ─▶ weight resolution ─▶ mode + profile ─▶ drift guard
//!   ▼
//! trace ─▶ TraceSink (outside the critical section)
//! ```
//!
//! Mutation is serialized through a single write lock so decay-then-impact
//! ordering can never interleave; reads clone the current snapshot under a
//! read lock and compute without blocking writers.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::affect::{AffectEngine, AffectSnapshot};
use crate::boundary::{BoundaryCaps, BoundaryManager, PolicyHint};
use crate::config::PersonaConfig;
use crate::context::InteractionContext;
use crate::errors::{ConfigurationError, ValidationError};
use crate::events::Event;
use crate::kernel::{TraitKernel, TraitName, TraitWeights};
use crate::style::{Mode, StyleProfile, StyleSynthesizer};
use crate::trace::{EventDigest, StyleTrace, TraceSink};

/// Mutable state guarded by the orchestrator's lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EngineState {
    snapshot: AffectSnapshot,
    last_profile: StyleProfile,
    history: Vec<AffectSnapshot>,
}

/// State shape used by [`PersonaOrchestrator::export_state`] /
/// [`PersonaOrchestrator::import_state`].
#[derive(Debug, Serialize, Deserialize)]
struct ExportedState {
    kernel: TraitKernel,
    snapshot: AffectSnapshot,
    last_profile: StyleProfile,
    history: Vec<AffectSnapshot>,
    exported_at: DateTime<Utc>,
}

/// The personality state engine for one agent identity.
pub struct PersonaOrchestrator {
    kernel: TraitKernel,
    config: PersonaConfig,
    affect: AffectEngine,
    boundary: BoundaryManager,
    synthesizer: StyleSynthesizer,
    baseline_profile: StyleProfile,
    state: RwLock<EngineState>,
    sink: Arc<dyn TraceSink>,
}

impl PersonaOrchestrator {
    /// Construct and validate. Configuration failures are fatal here and
    /// cannot occur later.
    pub fn new(
        kernel: TraitKernel,
        config: PersonaConfig,
        sink: Arc<dyn TraceSink>,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let affect = AffectEngine::new(config.affect.clone(), &kernel);
        let boundary = BoundaryManager::new(config.conditions.clone());
        let synthesizer = StyleSynthesizer::new(config.style.clone());

        let now = Utc::now();
        let baseline_snapshot = affect.baseline(now);
        let baseline_context = InteractionContext::default();
        let baseline_weights = kernel.resolve_weights(&baseline_context, &config.weight_rules);
        let baseline_mode =
            synthesizer.synthesize_mode(&baseline_weights, &baseline_snapshot, &baseline_context);
        let baseline_profile = synthesizer.synthesize_profile(
            baseline_mode,
            &baseline_weights,
            &baseline_snapshot,
            &baseline_context,
            &[],
        );

        log::info!(
            "persona engine initialized: traits [{:.2} {:.2} {:.2} {:.2} {:.2}]",
            kernel.curiosity(),
            kernel.balance(),
            kernel.wit(),
            kernel.candor(),
            kernel.care()
        );

        Ok(Self {
            kernel,
            affect,
            boundary,
            synthesizer,
            baseline_profile: baseline_profile.clone(),
            state: RwLock::new(EngineState {
                snapshot: baseline_snapshot,
                last_profile: baseline_profile,
                history: Vec::new(),
            }),
            sink,
            config,
        })
    }

    /// Apply one event: decay for the elapsed gap, then the event impact,
    /// then re-derive boundary hints and the style profile, and emit a
    /// trace. Rejects structurally invalid events before touching state.
    pub fn update_state(&self, event: Event) -> Result<StyleTrace, ValidationError> {
        event.validate()?;
        let ts = event.timestamp.unwrap_or_else(Utc::now);
        let ctx = event.interaction_context();

        let trace = {
            let mut state = self.state.write();
            let elapsed =
                (ts - state.snapshot.ts).num_milliseconds().max(0) as f64 / 1000.0;
            let decayed = self.affect.apply_decay(&state.snapshot, elapsed);
            let next = self
                .affect
                .apply_event_impact(&decayed, &event.kind, event.intensity, ts);

            let stability = self.affect.stability_score(&next);
            let hints = self.boundary.get_policy_hints(&next, stability, &ctx, ts);
            let weights = self.kernel.resolve_weights(&ctx, &self.config.weight_rules);
            let mode = self.synthesizer.synthesize_mode(&weights, &next, &ctx);
            let profile = self.guarded_profile(mode, &weights, &next, &ctx, &hints);

            let (style_delta, decoding_delta) =
                StyleTrace::deltas(&state.last_profile, &profile);

            let previous = std::mem::replace(&mut state.snapshot, next.clone());
            state.history.push(previous);
            if state.history.len() > self.config.history_limit {
                let excess = state.history.len() - self.config.history_limit;
                state.history.drain(..excess);
            }
            state.last_profile = profile.clone();

            StyleTrace {
                id: Uuid::new_v4(),
                ts,
                event: EventDigest {
                    kind: event.kind.tag().to_string(),
                    intensity: event.intensity,
                },
                affect: next,
                mode,
                profile,
                hints,
                stability,
                style_delta,
                decoding_delta,
            }
        };

        // Persistence happens outside the critical section.
        let payload = serde_json::to_value(&trace).unwrap_or(Value::Null);
        self.sink.store(&format!("persona:trace:{}", trace.id), payload);

        log::info!(
            "state update {}: mode {:?}, valence {:+.2}, arousal {:.2}, stress {:.2}",
            trace.event.kind,
            trace.mode,
            trace.affect.valence,
            trace.affect.arousal,
            trace.affect.stress
        );
        Ok(trace)
    }

    /// Synthesize the profile for a context against the current snapshot.
    pub fn get_style_profile(&self, ctx: &InteractionContext) -> StyleProfile {
        let snapshot = self.state.read().snapshot.clone();
        let now = Utc::now();
        let stability = self.affect.stability_score(&snapshot);
        let hints = self.boundary.get_policy_hints(&snapshot, stability, ctx, now);
        let weights = self.kernel.resolve_weights(ctx, &self.config.weight_rules);
        let mode = self.synthesizer.synthesize_mode(&weights, &snapshot, ctx);
        self.guarded_profile(mode, &weights, &snapshot, ctx, &hints)
    }

    /// Active policy hints for a context against the current snapshot.
    pub fn get_policy_hints(&self, ctx: &InteractionContext) -> Vec<PolicyHint> {
        let snapshot = self.state.read().snapshot.clone();
        let stability = self.affect.stability_score(&snapshot);
        self.boundary
            .get_policy_hints(&snapshot, stability, ctx, Utc::now())
    }

    /// The fold of all active hints' caps over the configured defaults.
    pub fn get_boundary_caps(&self, ctx: &InteractionContext) -> BoundaryCaps {
        let hints = self.get_policy_hints(ctx);
        self.boundary.fold_caps(&self.config.default_caps, &hints)
    }

    /// The current affect snapshot (the last observed state; decay is
    /// applied when events arrive, not on read).
    pub fn get_affect_snapshot(&self) -> AffectSnapshot {
        self.state.read().snapshot.clone()
    }

    /// Stability diagnostic for the current snapshot.
    pub fn stability_score(&self) -> f64 {
        self.affect.stability_score(&self.state.read().snapshot)
    }

    /// Immutable history of superseded snapshots, oldest first.
    pub fn affect_history(&self) -> Vec<AffectSnapshot> {
        self.state.read().history.clone()
    }

    /// Arm a cooldown for a condition in the scope derived from `ctx`.
    pub fn set_cooldown(&self, condition_id: &str, ctx: &InteractionContext, duration_secs: u64) {
        self.boundary.set_cooldown(
            condition_id,
            ctx,
            Duration::seconds(duration_secs as i64),
            Utc::now(),
        );
    }

    /// In-place state replace: affect back to the exact setpoints, history
    /// cleared. The trait kernel and armed cooldowns are untouched.
    pub fn reset(&self) {
        let mut state = self.state.write();
        state.snapshot = self.affect.baseline(Utc::now());
        state.history.clear();
        state.last_profile = self.baseline_profile.clone();
        log::info!("personality state reset to setpoints");
    }

    pub fn kernel(&self) -> &TraitKernel {
        &self.kernel
    }

    pub fn config(&self) -> &PersonaConfig {
        &self.config
    }

    /// Serialize the mutable state (plus the kernel for verification) for
    /// an external persistence collaborator.
    pub fn export_state(&self) -> Value {
        let state = self.state.read();
        let exported = ExportedState {
            kernel: self.kernel.clone(),
            snapshot: state.snapshot.clone(),
            last_profile: state.last_profile.clone(),
            history: state.history.clone(),
            exported_at: Utc::now(),
        };
        serde_json::to_value(&exported).unwrap_or(Value::Null)
    }

    /// Restore previously exported state. All-or-nothing: the payload is
    /// fully deserialized and validated before anything is swapped in.
    pub fn import_state(&self, value: Value) -> Result<(), ValidationError> {
        let exported: ExportedState =
            serde_json::from_value(value).map_err(|e| ValidationError::InvalidStatePayload {
                reason: e.to_string(),
            })?;
        validate_snapshot(&exported.snapshot)?;
        for snapshot in &exported.history {
            validate_snapshot(snapshot)?;
        }
        let mut state = self.state.write();
        state.snapshot = exported.snapshot;
        state.last_profile = exported.last_profile;
        state.history = exported.history;
        log::info!("personality state imported");
        Ok(())
    }

    /// Compact diagnostic summary of the current personality state.
    pub fn summary(&self) -> Value {
        let state = self.state.read();
        let stability = self.affect.stability_score(&state.snapshot);
        json!({
            "traits": TraitName::ALL
                .iter()
                .map(|name| (name.as_str().to_string(), json!(self.kernel.get(*name))))
                .collect::<serde_json::Map<String, Value>>(),
            "mood": {
                "valence": state.snapshot.valence,
                "arousal": state.snapshot.arousal,
                "stress": state.snapshot.stress,
                "tags": state.snapshot.tags,
                "stability": stability,
            },
            "style": {
                "mode": state.last_profile.mode,
                "warmth": state.last_profile.tone.warmth,
                "formality": state.last_profile.tone.formality,
                "humor": state.last_profile.tone.humor,
                "assertiveness": state.last_profile.stance.assertiveness,
            },
            "decoding": {
                "temperature": state.last_profile.decoding.temperature,
                "top_p": state.last_profile.decoding.top_p,
                "max_tokens": state.last_profile.decoding.max_tokens,
            },
        })
    }

    /// Synthesize, then pull the profile back toward the kernel baseline if
    /// tone/stance drifted past the configured threshold. Caps are
    /// re-applied after the blend so boundary clamps still win.
    fn guarded_profile(
        &self,
        mode: Mode,
        weights: &TraitWeights,
        snapshot: &AffectSnapshot,
        ctx: &InteractionContext,
        hints: &[PolicyHint],
    ) -> StyleProfile {
        let mut profile =
            self.synthesizer
                .synthesize_profile(mode, weights, snapshot, ctx, hints);

        let baseline = &self.baseline_profile;
        let drift = ((profile.tone.warmth - baseline.tone.warmth).abs()
            + (profile.tone.formality - baseline.tone.formality).abs()
            + (profile.tone.humor - baseline.tone.humor).abs()
            + (profile.stance.assertiveness - baseline.stance.assertiveness).abs())
            / 4.0;
        if drift > self.config.drift_threshold {
            let c = self.config.drift_correction;
            log::warn!("style drift {:.2} over threshold, correcting", drift);
            profile.tone.warmth = (1.0 - c) * profile.tone.warmth + c * baseline.tone.warmth;
            profile.tone.formality =
                (1.0 - c) * profile.tone.formality + c * baseline.tone.formality;
            profile.tone.humor = (1.0 - c) * profile.tone.humor + c * baseline.tone.humor;
            profile.stance.assertiveness =
                (1.0 - c) * profile.stance.assertiveness + c * baseline.stance.assertiveness;
            self.synthesizer.apply_caps(&mut profile, hints);
        }
        profile
    }
}

fn validate_snapshot(snapshot: &AffectSnapshot) -> Result<(), ValidationError> {
    let in_range = snapshot.arousal.is_finite()
        && (0.0..=1.0).contains(&snapshot.arousal)
        && snapshot.valence.is_finite()
        && (-1.0..=1.0).contains(&snapshot.valence)
        && snapshot.stress.is_finite()
        && (0.0..=1.0).contains(&snapshot.stress);
    if !in_range {
        return Err(ValidationError::InvalidStatePayload {
            reason: "affect coordinates outside declared ranges".to_string(),
        });
    }
    Ok(())
}
