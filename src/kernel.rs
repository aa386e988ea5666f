//! Trait kernel — the immutable baseline personality coordinates and the
//! context-dependent weight resolution over them.
//!
//! Five coordinates in [0, 1]:
//!
//! | trait     | orientation                      |
//! |-----------|----------------------------------|
//! | curiosity | drive to explore and elaborate   |
//! | balance   | emotional steadiness             |
//! | wit       | humor and creative reach         |
//! | candor    | directness, analytical edge      |
//! | care      | empathy and warmth               |
//!
//! The kernel is validated at construction and never mutated afterwards.
//! Weight resolution is pure: the same (kernel, context) pair always yields
//! the same weights — context rules are an ordered table of additive deltas
//! applied over the baseline and clamped.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::context::{AudienceType, ChannelType, InteractionContext, TaskType, Urgency};
use crate::errors::ConfigurationError;

// ---------------------------------------------------------------------------
// TraitKernel
// ---------------------------------------------------------------------------

/// Names of the five baseline coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitName {
    Curiosity,
    Balance,
    Wit,
    Candor,
    Care,
}

impl TraitName {
    pub const ALL: [TraitName; 5] = [
        TraitName::Curiosity,
        TraitName::Balance,
        TraitName::Wit,
        TraitName::Candor,
        TraitName::Care,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TraitName::Curiosity => "curiosity",
            TraitName::Balance => "balance",
            TraitName::Wit => "wit",
            TraitName::Candor => "candor",
            TraitName::Care => "care",
        }
    }
}

/// Immutable baseline personality coordinates.
///
/// Constructed once per agent identity; fields are private so the baseline
/// cannot drift after construction. Deserialization goes through the same
/// validation as [`TraitKernel::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTraitKernel", into = "RawTraitKernel")]
pub struct TraitKernel {
    curiosity: f64,
    balance: f64,
    wit: f64,
    candor: f64,
    care: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTraitKernel {
    curiosity: f64,
    balance: f64,
    wit: f64,
    candor: f64,
    care: f64,
}

impl TryFrom<RawTraitKernel> for TraitKernel {
    type Error = ConfigurationError;

    fn try_from(raw: RawTraitKernel) -> Result<Self, Self::Error> {
        TraitKernel::new(raw.curiosity, raw.balance, raw.wit, raw.candor, raw.care)
    }
}

impl From<TraitKernel> for RawTraitKernel {
    fn from(kernel: TraitKernel) -> Self {
        RawTraitKernel {
            curiosity: kernel.curiosity,
            balance: kernel.balance,
            wit: kernel.wit,
            candor: kernel.candor,
            care: kernel.care,
        }
    }
}

impl TraitKernel {
    /// Build a kernel, rejecting out-of-range or non-finite coordinates.
    pub fn new(
        curiosity: f64,
        balance: f64,
        wit: f64,
        candor: f64,
        care: f64,
    ) -> Result<Self, ConfigurationError> {
        for (name, value) in [
            ("curiosity", curiosity),
            ("balance", balance),
            ("wit", wit),
            ("candor", candor),
            ("care", care),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::TraitOutOfRange { name, value });
            }
        }
        Ok(Self {
            curiosity,
            balance,
            wit,
            candor,
            care,
        })
    }

    /// Neutral midpoint kernel.
    pub fn balanced() -> Self {
        Self {
            curiosity: 0.5,
            balance: 0.5,
            wit: 0.5,
            candor: 0.5,
            care: 0.5,
        }
    }

    pub fn curiosity(&self) -> f64 {
        self.curiosity
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn wit(&self) -> f64 {
        self.wit
    }

    pub fn candor(&self) -> f64 {
        self.candor
    }

    pub fn care(&self) -> f64 {
        self.care
    }

    pub fn get(&self, name: TraitName) -> f64 {
        match name {
            TraitName::Curiosity => self.curiosity,
            TraitName::Balance => self.balance,
            TraitName::Wit => self.wit,
            TraitName::Candor => self.candor,
            TraitName::Care => self.care,
        }
    }

    /// Resolve context-effective weights through an ordered rule table.
    ///
    /// Base weight = baseline coordinate; each matching rule adds its
    /// deltas; the result is clamped to [0, 1]. Deterministic and free of
    /// hidden state.
    pub fn resolve_weights(
        &self,
        context: &InteractionContext,
        rules: &[WeightRule],
    ) -> TraitWeights {
        let mut weights = TraitWeights {
            curiosity: self.curiosity,
            balance: self.balance,
            wit: self.wit,
            candor: self.candor,
            care: self.care,
        };
        for rule in rules {
            if rule.when.matches(context) {
                for effect in &rule.effects {
                    let w = weights.get_mut(effect.trait_name);
                    *w += effect.delta;
                }
            }
        }
        weights.clamp();
        weights
    }

    /// [`resolve_weights`](Self::resolve_weights) against the built-in table.
    pub fn resolve_weights_default(&self, context: &InteractionContext) -> TraitWeights {
        self.resolve_weights(context, &DEFAULT_WEIGHT_RULES)
    }
}

impl Default for TraitKernel {
    fn default() -> Self {
        Self::balanced()
    }
}

// ---------------------------------------------------------------------------
// TraitWeights
// ---------------------------------------------------------------------------

/// Context-effective weights, recomputed per request and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitWeights {
    pub curiosity: f64,
    pub balance: f64,
    pub wit: f64,
    pub candor: f64,
    pub care: f64,
}

impl TraitWeights {
    pub fn get(&self, name: TraitName) -> f64 {
        match name {
            TraitName::Curiosity => self.curiosity,
            TraitName::Balance => self.balance,
            TraitName::Wit => self.wit,
            TraitName::Candor => self.candor,
            TraitName::Care => self.care,
        }
    }

    fn get_mut(&mut self, name: TraitName) -> &mut f64 {
        match name {
            TraitName::Curiosity => &mut self.curiosity,
            TraitName::Balance => &mut self.balance,
            TraitName::Wit => &mut self.wit,
            TraitName::Candor => &mut self.candor,
            TraitName::Care => &mut self.care,
        }
    }

    fn clamp(&mut self) {
        for name in TraitName::ALL {
            let w = self.get_mut(name);
            *w = w.clamp(0.0, 1.0);
        }
    }
}

// ---------------------------------------------------------------------------
// Weight rule table
// ---------------------------------------------------------------------------

/// Context predicate for a weight rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextMatch {
    TaskTypeIs(TaskType),
    AudienceIs(AudienceType),
    ChannelIs(ChannelType),
    UrgencyIs(Urgency),
    UrgencyAtLeast(Urgency),
}

impl ContextMatch {
    pub fn matches(&self, context: &InteractionContext) -> bool {
        match self {
            ContextMatch::TaskTypeIs(t) => context.task_type == Some(*t),
            ContextMatch::AudienceIs(a) => context.audience == Some(*a),
            ContextMatch::ChannelIs(c) => context.channel == Some(*c),
            ContextMatch::UrgencyIs(u) => context.urgency == *u,
            ContextMatch::UrgencyAtLeast(u) => context.urgency >= *u,
        }
    }
}

/// One additive adjustment to a single trait weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEffect {
    #[serde(rename = "trait")]
    pub trait_name: TraitName,
    pub delta: f64,
}

/// One (predicate, effects) row of the resolution table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRule {
    pub when: ContextMatch,
    pub effects: Vec<WeightEffect>,
}

impl WeightRule {
    fn new(when: ContextMatch, effects: &[(TraitName, f64)]) -> Self {
        Self {
            when,
            effects: effects
                .iter()
                .map(|(trait_name, delta)| WeightEffect {
                    trait_name: *trait_name,
                    delta: *delta,
                })
                .collect(),
        }
    }
}

/// The built-in resolution table. Declarative so deployments can replace it
/// wholesale through configuration.
pub fn default_weight_rules() -> Vec<WeightRule> {
    use ContextMatch::*;
    use TraitName::*;
    vec![
        WeightRule::new(TaskTypeIs(TaskType::Creative), &[(Wit, 0.15), (Curiosity, 0.15)]),
        WeightRule::new(
            TaskTypeIs(TaskType::Analytical),
            &[(Candor, 0.15), (Balance, 0.10), (Wit, -0.10)],
        ),
        WeightRule::new(TaskTypeIs(TaskType::Social), &[(Care, 0.15), (Curiosity, 0.10)]),
        WeightRule::new(TaskTypeIs(TaskType::Support), &[(Care, 0.20), (Candor, -0.05)]),
        WeightRule::new(
            AudienceIs(AudienceType::Professional),
            &[(Candor, -0.15), (Balance, 0.15), (Wit, -0.10)],
        ),
        WeightRule::new(AudienceIs(AudienceType::Friend), &[(Care, 0.10), (Wit, 0.10)]),
        WeightRule::new(
            AudienceIs(AudienceType::Child),
            &[(Care, 0.20), (Wit, 0.10), (Curiosity, 0.10), (Candor, -0.15)],
        ),
        WeightRule::new(
            AudienceIs(AudienceType::Intimate),
            &[(Care, 0.15), (Candor, 0.10)],
        ),
        WeightRule::new(ChannelIs(ChannelType::Voice), &[(Wit, 0.05)]),
        WeightRule::new(ChannelIs(ChannelType::Email), &[(Candor, 0.05), (Wit, -0.05)]),
        WeightRule::new(
            UrgencyAtLeast(Urgency::High),
            &[(Balance, 0.15), (Candor, 0.10), (Wit, -0.15), (Curiosity, -0.10)],
        ),
        WeightRule::new(UrgencyIs(Urgency::Low), &[(Wit, 0.10), (Curiosity, 0.10)]),
    ]
}

pub static DEFAULT_WEIGHT_RULES: Lazy<Vec<WeightRule>> = Lazy::new(default_weight_rules);
