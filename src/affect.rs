//! Affect engine — the mutable, time-decaying emotional state.
//!
//! State lives in [`AffectSnapshot`]s; the engine never mutates one in
//! place. Two transition operators exist:
//!
//! ```text
//! apply_decay(s, elapsed)            exponential convergence to setpoints
//! apply_event_impact(s, kind, i)     table-driven signed deltas, scaled by
//!                                    intensity and trait sensitivity
//! ```
//!
//! Decay uses `decay_rate^elapsed`, which makes it composable: decaying by
//! t1 then t2 equals decaying by t1 + t2. Stress converges from above only;
//! decay alone never raises it. Event impacts are looked up per kind,
//! scaled, added, coupled (excitement / anxiety / overload feedback), then
//! clamped. Unknown kinds carry a zero delta vector.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::errors::ConfigurationError;
use crate::events::EventKind;
use crate::kernel::TraitKernel;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One immutable observation of the affective state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectSnapshot {
    pub ts: DateTime<Utc>,
    /// Energy / activation, [0, 1].
    pub arousal: f64,
    /// Positive vs negative mood, [-1, 1].
    pub valence: f64,
    /// Strain / fatigue, [0, 1].
    pub stress: f64,
    /// Derived mood tags; empty at the setpoints.
    pub tags: BTreeSet<String>,
    /// Per-second decay rate in effect for this snapshot.
    pub decay_rate: f64,
}

/// Signed deltas one event kind applies to (arousal, valence, stress) at
/// intensity 1.0, before trait sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactVector {
    pub arousal: f64,
    pub valence: f64,
    pub stress: f64,
}

impl ImpactVector {
    pub const NEUTRAL: ImpactVector = ImpactVector {
        arousal: 0.0,
        valence: 0.0,
        stress: 0.0,
    };

    fn new(arousal: f64, valence: f64, stress: f64) -> Self {
        Self {
            arousal,
            valence,
            stress,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Construction-time tuning for the affect engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectConfig {
    /// Per-second decay rate, (0, 1].
    pub decay_rate: f64,
    pub arousal_setpoint: f64,
    pub valence_setpoint: f64,
    pub stress_setpoint: f64,
    /// How strongly the `balance` trait dampens stress impact magnitude.
    pub balance_stress_damping: f64,
    /// How strongly the `balance` trait dampens arousal impact magnitude.
    pub balance_arousal_damping: f64,
    /// Impact table keyed by event tag. Kinds absent here are neutral.
    pub impacts: HashMap<String, ImpactVector>,
}

impl AffectConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.decay_rate.is_finite() || self.decay_rate <= 0.0 || self.decay_rate > 1.0 {
            return Err(ConfigurationError::InvalidDecayRate {
                value: self.decay_rate,
            });
        }
        for (name, value, lo, hi) in [
            ("arousal_setpoint", self.arousal_setpoint, 0.0, 1.0),
            ("valence_setpoint", self.valence_setpoint, -1.0, 1.0),
            ("stress_setpoint", self.stress_setpoint, 0.0, 1.0),
        ] {
            if !value.is_finite() || value < lo || value > hi {
                return Err(ConfigurationError::SetpointOutOfRange { name, value });
            }
        }
        for (name, value) in [
            ("balance_stress_damping", self.balance_stress_damping),
            ("balance_arousal_damping", self.balance_arousal_damping),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::ParameterOutOfRange { name, value });
            }
        }
        Ok(())
    }
}

impl Default for AffectConfig {
    fn default() -> Self {
        Self {
            decay_rate: 0.995,
            arousal_setpoint: 0.5,
            valence_setpoint: 0.0,
            stress_setpoint: 0.2,
            balance_stress_damping: 0.5,
            balance_arousal_damping: 0.3,
            impacts: default_impact_table(),
        }
    }
}

/// Built-in impact table for the first-class taxonomy.
pub fn default_impact_table() -> HashMap<String, ImpactVector> {
    let rows: [(&str, ImpactVector); 15] = [
        ("plan:start", ImpactVector::new(0.15, 0.05, 0.10)),
        ("plan:complete", ImpactVector::new(0.10, 0.35, -0.15)),
        ("plan:fail", ImpactVector::new(0.20, -0.40, 0.30)),
        ("tool:success", ImpactVector::new(0.05, 0.15, -0.05)),
        ("tool:fail", ImpactVector::new(0.15, -0.20, 0.20)),
        ("learning:start", ImpactVector::new(0.20, 0.10, 0.05)),
        ("learning:breakthrough", ImpactVector::new(0.40, 0.50, -0.20)),
        ("learning:frustration", ImpactVector::new(0.25, -0.30, 0.35)),
        ("social:interaction", ImpactVector::new(0.25, 0.20, -0.05)),
        ("social:conflict", ImpactVector::new(0.45, -0.45, 0.40)),
        ("positive_interaction", ImpactVector::new(0.20, 0.30, -0.10)),
        ("negative_interaction", ImpactVector::new(0.30, -0.40, 0.20)),
        ("achievement", ImpactVector::new(0.40, 0.50, -0.20)),
        ("failure", ImpactVector::new(0.20, -0.60, 0.30)),
        ("stress", ImpactVector::new(0.50, -0.30, 0.50)),
    ];
    rows.iter().map(|(tag, v)| (tag.to_string(), *v)).collect()
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Pure snapshot-in / snapshot-out transition engine.
///
/// Trait sensitivity is fixed at construction: a steadier kernel (high
/// `balance`) shrinks the magnitude of stress and arousal impacts.
#[derive(Debug, Clone)]
pub struct AffectEngine {
    config: AffectConfig,
    arousal_gain: f64,
    stress_gain: f64,
}

impl AffectEngine {
    pub fn new(config: AffectConfig, kernel: &TraitKernel) -> Self {
        let arousal_gain = 1.0 - config.balance_arousal_damping * kernel.balance();
        let stress_gain = 1.0 - config.balance_stress_damping * kernel.balance();
        Self {
            config,
            arousal_gain,
            stress_gain,
        }
    }

    pub fn config(&self) -> &AffectConfig {
        &self.config
    }

    /// Snapshot exactly at the configured setpoints.
    pub fn baseline(&self, now: DateTime<Utc>) -> AffectSnapshot {
        AffectSnapshot {
            ts: now,
            arousal: self.config.arousal_setpoint,
            valence: self.config.valence_setpoint,
            stress: self.config.stress_setpoint,
            tags: BTreeSet::new(),
            decay_rate: self.config.decay_rate,
        }
    }

    /// Exponential convergence toward the setpoints over `elapsed_secs`.
    ///
    /// Identity at `elapsed_secs <= 0`. Stress converges from above only.
    pub fn apply_decay(&self, snapshot: &AffectSnapshot, elapsed_secs: f64) -> AffectSnapshot {
        if elapsed_secs <= 0.0 || !elapsed_secs.is_finite() {
            return snapshot.clone();
        }
        let f = snapshot.decay_rate.powf(elapsed_secs);
        let arousal =
            self.config.arousal_setpoint + (snapshot.arousal - self.config.arousal_setpoint) * f;
        let valence =
            self.config.valence_setpoint + (snapshot.valence - self.config.valence_setpoint) * f;
        let stress = if snapshot.stress > self.config.stress_setpoint {
            self.config.stress_setpoint + (snapshot.stress - self.config.stress_setpoint) * f
        } else {
            snapshot.stress
        };
        self.finish(
            snapshot.ts + Duration::milliseconds((elapsed_secs * 1000.0).round() as i64),
            arousal,
            valence,
            stress,
            snapshot.decay_rate,
        )
    }

    /// Apply one event's impact, scaled by intensity and trait sensitivity.
    ///
    /// Out-of-range intensity is clamped here; structural validation happens
    /// upstream before any state is touched.
    pub fn apply_event_impact(
        &self,
        snapshot: &AffectSnapshot,
        kind: &EventKind,
        intensity: f64,
        now: DateTime<Utc>,
    ) -> AffectSnapshot {
        let impact = self.scaled_impact(kind, intensity);
        let mut arousal = snapshot.arousal + impact.arousal;
        let mut valence = snapshot.valence + impact.valence;
        let stress = snapshot.stress + impact.stress;

        // Coupled feedback between dimensions: excitement reinforces good
        // mood, agitation reinforces bad mood, overload drags both.
        if valence > 0.5 && arousal > 0.5 {
            valence += 0.05;
        } else if valence < -0.5 && arousal > 0.5 {
            valence -= 0.05;
        } else if valence > 0.5 && arousal < 0.3 {
            valence += 0.025;
        } else if valence < -0.5 && arousal < 0.3 {
            valence -= 0.025;
        }
        if stress > 0.7 {
            arousal += 0.05;
            valence -= 0.05;
        }

        log::debug!(
            "affect impact {}: arousal {:+.3} valence {:+.3} stress {:+.3}",
            kind,
            impact.arousal,
            impact.valence,
            impact.stress
        );

        self.finish(now, arousal, valence, stress, snapshot.decay_rate)
    }

    /// The raw impact vector for a kind; neutral for unknown kinds.
    pub fn impact_of(&self, kind: &EventKind) -> ImpactVector {
        self.config
            .impacts
            .get(kind.tag())
            .copied()
            .unwrap_or(ImpactVector::NEUTRAL)
    }

    /// The impact vector after intensity and sensitivity scaling.
    pub fn scaled_impact(&self, kind: &EventKind, intensity: f64) -> ImpactVector {
        let intensity = intensity.clamp(0.0, 1.0);
        let base = self.impact_of(kind);
        ImpactVector {
            arousal: base.arousal * intensity * self.arousal_gain,
            valence: base.valence * intensity,
            stress: base.stress * intensity * self.stress_gain,
        }
    }

    /// Diagnostic in [0, 1]: 1 at the setpoints with no mood tags, falling
    /// with distance from the setpoints and with tag count.
    pub fn stability_score(&self, snapshot: &AffectSnapshot) -> f64 {
        let distance = ((snapshot.valence - self.config.valence_setpoint).abs()
            + (snapshot.arousal - self.config.arousal_setpoint).abs()
            + (snapshot.stress - self.config.stress_setpoint).abs())
            / 3.0;
        (1.0 - distance - 0.05 * snapshot.tags.len() as f64).clamp(0.0, 1.0)
    }

    /// Decay-only forward projection: `steps` evenly spaced samples over
    /// `horizon_secs`. Useful for "where will the mood settle" surfaces.
    pub fn project_evolution(
        &self,
        snapshot: &AffectSnapshot,
        horizon_secs: f64,
        steps: usize,
    ) -> Vec<AffectSnapshot> {
        let steps = steps.max(1);
        let step = horizon_secs.max(0.0) / steps as f64;
        let mut trajectory = Vec::with_capacity(steps);
        let mut current = snapshot.clone();
        for _ in 0..steps {
            current = self.apply_decay(&current, step);
            trajectory.push(current.clone());
        }
        trajectory
    }

    fn finish(
        &self,
        ts: DateTime<Utc>,
        arousal: f64,
        valence: f64,
        stress: f64,
        decay_rate: f64,
    ) -> AffectSnapshot {
        let arousal = arousal.clamp(0.0, 1.0);
        let valence = valence.clamp(-1.0, 1.0);
        let stress = stress.clamp(0.0, 1.0);
        AffectSnapshot {
            ts,
            arousal,
            valence,
            stress,
            tags: derive_tags(arousal, valence, stress),
            decay_rate,
        }
    }
}

/// Mood tags from the current coordinates. A snapshot near neutral carries
/// none.
fn derive_tags(arousal: f64, valence: f64, stress: f64) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    if valence > 0.5 {
        tags.insert("positive".to_string());
    } else if valence < -0.5 {
        tags.insert("negative".to_string());
    }
    if arousal > 0.7 {
        tags.insert("excited".to_string());
    } else if arousal < 0.25 {
        tags.insert("calm".to_string());
    }
    if stress > 0.7 {
        tags.insert("stressed".to_string());
    }
    if valence > 0.5 && arousal > 0.6 {
        tags.insert("enthusiastic".to_string());
    } else if valence < -0.5 && arousal > 0.6 {
        tags.insert("anxious".to_string());
    } else if valence > 0.5 && arousal < 0.3 {
        tags.insert("content".to_string());
    } else if valence < -0.5 && arousal < 0.3 {
        tags.insert("downcast".to_string());
    }
    tags
}
