//! Boundary manager — guarded policy rules with cooldowns.
//!
//! Conditions are configuration-time data: a declarative trigger over
//! (affect, context), a severity, a human-readable reason, and a set of
//! recommended actions. The only mutable piece is the cooldown state,
//! keyed by (condition id, scope key) so suppression can be global,
//! per-audience, or per-channel. Cooldown expiry is evaluated lazily
//! against the caller-supplied clock; there are no background timers.
//!
//! Every condition is evaluated on every call — activation of one never
//! short-circuits the rest. Conflicting caps are resolved by the style
//! synthesizer taking the most restrictive value, never an average.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::affect::AffectSnapshot;
use crate::context::{AudienceType, ChannelType, InteractionContext, TaskType, Urgency};
use crate::errors::ConfigurationError;
use crate::style::{SensitivityLevel, ToneDimension};

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

/// Declarative predicate over the current affect snapshot and context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    StressAbove(f64),
    ArousalAbove(f64),
    ValenceBelow(f64),
    StabilityBelow(f64),
    UrgencyAtLeast(Urgency),
    /// Strictly below the named urgency.
    UrgencyBelow(Urgency),
    AudienceIs(AudienceType),
    ChannelIs(ChannelType),
    TaskTypeIs(TaskType),
    /// An uninterpreted context key is present with a truthy value.
    ContextFlag { key: String },
    /// An uninterpreted context key equals a string value.
    ContextEquals { key: String, value: String },
    All(Vec<Trigger>),
    Any(Vec<Trigger>),
}

impl Trigger {
    pub fn holds(&self, affect: &AffectSnapshot, stability: f64, ctx: &InteractionContext) -> bool {
        match self {
            Trigger::StressAbove(t) => affect.stress > *t,
            Trigger::ArousalAbove(t) => affect.arousal > *t,
            Trigger::ValenceBelow(t) => affect.valence < *t,
            Trigger::StabilityBelow(t) => stability < *t,
            Trigger::UrgencyAtLeast(u) => ctx.urgency >= *u,
            Trigger::UrgencyBelow(u) => ctx.urgency < *u,
            Trigger::AudienceIs(a) => ctx.audience == Some(*a),
            Trigger::ChannelIs(c) => ctx.channel == Some(*c),
            Trigger::TaskTypeIs(t) => ctx.task_type == Some(*t),
            Trigger::ContextFlag { key } => ctx.flag(key),
            Trigger::ContextEquals { key, value } => ctx.get_str(key) == Some(value.as_str()),
            Trigger::All(inner) => inner.iter().all(|t| t.holds(affect, stability, ctx)),
            Trigger::Any(inner) => inner.iter().any(|t| t.holds(affect, stability, ctx)),
        }
    }
}

// ---------------------------------------------------------------------------
// Actions, severity, scope
// ---------------------------------------------------------------------------

/// What a condition asks the consumer (or the style synthesizer) to do.
///
/// Capping variants are applied by the synthesizer as hard clamps; the
/// advisory variants are contracts for the downstream decision layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    CapTone { dimension: ToneDimension, max: f64 },
    FloorFormality { min: f64 },
    CapTemperature { max: f64 },
    CapMaxTokens { max: u32 },
    DisallowNsfw,
    SoftenSensitive,
    WaitForCooldown,
    GenerateSummaryFirst,
    DeferHighImpactDecisions,
    DeferNonUrgentInterruptions,
    ContinueLearningSession,
    PaceSocialInteractions,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Caution,
    Critical,
}

/// What key space a condition's cooldowns live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownScope {
    #[default]
    Global,
    PerAudience,
    PerChannel,
}

// ---------------------------------------------------------------------------
// Conditions and hints
// ---------------------------------------------------------------------------

/// One guarded policy rule. Pure data; activation state lives in the
/// manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCondition {
    pub id: String,
    pub trigger: Trigger,
    pub severity: Severity,
    pub reason: String,
    pub actions: Vec<RecommendedAction>,
    /// Suggested suppression window once the consumer acknowledges the
    /// condition via `set_cooldown`.
    #[serde(default)]
    pub cooldown_secs: Option<u64>,
    #[serde(default)]
    pub scope: CooldownScope,
}

/// Actionable surface of an active condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyHint {
    pub condition_id: String,
    pub reason: String,
    pub severity: Severity,
    pub actions: Vec<RecommendedAction>,
}

/// Folded caps across all active conditions, most restrictive wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCaps {
    pub max_flirtation: f64,
    pub max_humor: f64,
    pub max_warmth: f64,
    pub min_formality: f64,
    pub max_temperature: f64,
    pub max_tokens: u32,
    pub nsfw_allowed: bool,
    pub sensitivity: SensitivityLevel,
    pub active_conditions: Vec<String>,
}

impl Default for BoundaryCaps {
    fn default() -> Self {
        Self {
            max_flirtation: 0.8,
            max_humor: 0.9,
            max_warmth: 1.0,
            min_formality: 0.1,
            max_temperature: 2.0,
            max_tokens: 4000,
            nsfw_allowed: false,
            sensitivity: SensitivityLevel::Normal,
            active_conditions: Vec::new(),
        }
    }
}

impl BoundaryCaps {
    /// Fold one hint's capping actions in, most restrictive winning.
    fn absorb(&mut self, hint: &PolicyHint) {
        for action in &hint.actions {
            match action {
                RecommendedAction::CapTone { dimension, max } => match dimension {
                    ToneDimension::Flirtation => {
                        self.max_flirtation = self.max_flirtation.min(*max)
                    }
                    ToneDimension::Humor => self.max_humor = self.max_humor.min(*max),
                    ToneDimension::Warmth => self.max_warmth = self.max_warmth.min(*max),
                    // A formality cap is expressed as a floor elsewhere;
                    // capping it down is not a restriction we track.
                    ToneDimension::Formality => {}
                },
                RecommendedAction::FloorFormality { min } => {
                    self.min_formality = self.min_formality.max(*min)
                }
                RecommendedAction::CapTemperature { max } => {
                    self.max_temperature = self.max_temperature.min(*max)
                }
                RecommendedAction::CapMaxTokens { max } => {
                    self.max_tokens = self.max_tokens.min(*max)
                }
                RecommendedAction::DisallowNsfw => self.nsfw_allowed = false,
                RecommendedAction::SoftenSensitive => {
                    if self.sensitivity == SensitivityLevel::Normal {
                        self.sensitivity = SensitivityLevel::Soften;
                    }
                }
                _ => {}
            }
        }
        self.active_conditions.push(hint.condition_id.clone());
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Evaluates the condition table and owns cooldown state.
#[derive(Debug)]
pub struct BoundaryManager {
    conditions: Vec<BoundaryCondition>,
    /// (condition id, scope key) → cooldown expiry.
    cooldowns: DashMap<(String, String), DateTime<Utc>>,
}

impl BoundaryManager {
    pub fn new(conditions: Vec<BoundaryCondition>) -> Self {
        Self {
            conditions,
            cooldowns: DashMap::new(),
        }
    }

    pub fn conditions(&self) -> &[BoundaryCondition] {
        &self.conditions
    }

    /// Validate a condition table at construction time.
    pub fn validate_conditions(
        conditions: &[BoundaryCondition],
    ) -> Result<(), ConfigurationError> {
        let mut seen = std::collections::HashSet::new();
        for (index, condition) in conditions.iter().enumerate() {
            if condition.id.is_empty() {
                return Err(ConfigurationError::EmptyConditionId { index });
            }
            if !seen.insert(condition.id.as_str()) {
                return Err(ConfigurationError::DuplicateConditionId {
                    id: condition.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// All conditions whose trigger holds and which are not suppressed by a
    /// cooldown. Every condition is checked on every call.
    pub fn get_conditions(
        &self,
        affect: &AffectSnapshot,
        stability: f64,
        ctx: &InteractionContext,
        now: DateTime<Utc>,
    ) -> Vec<&BoundaryCondition> {
        self.conditions
            .iter()
            .filter(|c| c.trigger.holds(affect, stability, ctx) && !self.in_cooldown(c, ctx, now))
            .collect()
    }

    /// Active conditions surfaced as actionable hints.
    pub fn get_policy_hints(
        &self,
        affect: &AffectSnapshot,
        stability: f64,
        ctx: &InteractionContext,
        now: DateTime<Utc>,
    ) -> Vec<PolicyHint> {
        self.get_conditions(affect, stability, ctx, now)
            .into_iter()
            .map(|c| PolicyHint {
                condition_id: c.id.clone(),
                reason: reason_for(c),
                severity: c.severity,
                actions: c.actions.clone(),
            })
            .collect()
    }

    /// Record a cooldown start; the condition is suppressed for `duration`
    /// within the scope derived from `ctx`, regardless of predicate state.
    pub fn set_cooldown(
        &self,
        condition_id: &str,
        ctx: &InteractionContext,
        duration: Duration,
        now: DateTime<Utc>,
    ) {
        let Some(condition) = self.conditions.iter().find(|c| c.id == condition_id) else {
            log::warn!("set_cooldown for unknown condition `{condition_id}` ignored");
            return;
        };
        let key = (condition.id.clone(), scope_key(condition.scope, ctx));
        log::debug!(
            "cooldown armed: {} [{}] for {}s",
            key.0,
            key.1,
            duration.num_seconds()
        );
        self.cooldowns.insert(key, now + duration);
    }

    /// Fold all active hints' caps over the configured defaults.
    pub fn fold_caps(&self, defaults: &BoundaryCaps, hints: &[PolicyHint]) -> BoundaryCaps {
        let mut caps = defaults.clone();
        caps.active_conditions.clear();
        for hint in hints {
            caps.absorb(hint);
        }
        caps
    }

    fn in_cooldown(
        &self,
        condition: &BoundaryCondition,
        ctx: &InteractionContext,
        now: DateTime<Utc>,
    ) -> bool {
        let key = (condition.id.clone(), scope_key(condition.scope, ctx));
        match self.cooldowns.get(&key) {
            Some(expiry) => now < *expiry,
            None => false,
        }
    }
}

fn scope_key(scope: CooldownScope, ctx: &InteractionContext) -> String {
    match scope {
        CooldownScope::Global => "global".to_string(),
        CooldownScope::PerAudience => match ctx.audience {
            Some(a) => format!("audience:{}", serde_variant_name(&a)),
            None => "audience:unspecified".to_string(),
        },
        CooldownScope::PerChannel => match ctx.channel {
            Some(c) => format!("channel:{}", serde_variant_name(&c)),
            None => "channel:unspecified".to_string(),
        },
    }
}

fn serde_variant_name<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

fn reason_for(condition: &BoundaryCondition) -> String {
    match condition.cooldown_secs {
        Some(secs) => format!("{}; ease off for the next {}s", condition.reason, secs),
        None => condition.reason.clone(),
    }
}

/// The built-in condition table.
pub fn default_conditions() -> Vec<BoundaryCondition> {
    vec![
        BoundaryCondition {
            id: "high_stress_protection".to_string(),
            trigger: Trigger::Any(vec![
                Trigger::StressAbove(0.75),
                Trigger::ContextEquals {
                    key: "stress_level".to_string(),
                    value: "high".to_string(),
                },
            ]),
            severity: Severity::Critical,
            reason: "Protect against poor decisions during high stress periods".to_string(),
            actions: vec![
                RecommendedAction::DeferHighImpactDecisions,
                RecommendedAction::CapTemperature { max: 0.4 },
                RecommendedAction::CapMaxTokens { max: 600 },
                RecommendedAction::CapTone {
                    dimension: ToneDimension::Humor,
                    max: 0.3,
                },
            ],
            cooldown_secs: Some(600),
            scope: CooldownScope::Global,
        },
        BoundaryCondition {
            id: "external_post_cooldown".to_string(),
            trigger: Trigger::ContextEquals {
                key: "action_type".to_string(),
                value: "external_post".to_string(),
            },
            severity: Severity::Caution,
            reason: "Prevent spam and maintain quality of external communications".to_string(),
            actions: vec![RecommendedAction::WaitForCooldown],
            cooldown_secs: Some(600),
            scope: CooldownScope::PerChannel,
        },
        BoundaryCondition {
            id: "require_summary".to_string(),
            trigger: Trigger::ContextEquals {
                key: "topic_complexity".to_string(),
                value: "high".to_string(),
            },
            severity: Severity::Caution,
            reason: "Ensure complex topics are properly summarized before detailed discussion"
                .to_string(),
            actions: vec![RecommendedAction::GenerateSummaryFirst],
            cooldown_secs: None,
            scope: CooldownScope::Global,
        },
        BoundaryCondition {
            id: "creative_flow_protection".to_string(),
            trigger: Trigger::All(vec![
                Trigger::ContextEquals {
                    key: "creative_flow".to_string(),
                    value: "active".to_string(),
                },
                Trigger::UrgencyBelow(Urgency::High),
            ]),
            severity: Severity::Info,
            reason: "Protect creative flow states from interruption".to_string(),
            actions: vec![RecommendedAction::DeferNonUrgentInterruptions],
            cooldown_secs: Some(900),
            scope: CooldownScope::Global,
        },
        BoundaryCondition {
            id: "learning_mode_protection".to_string(),
            trigger: Trigger::ContextEquals {
                key: "learning_mode".to_string(),
                value: "active".to_string(),
            },
            severity: Severity::Info,
            reason: "Protect learning sessions from interruption".to_string(),
            actions: vec![RecommendedAction::ContinueLearningSession],
            cooldown_secs: Some(900),
            scope: CooldownScope::Global,
        },
        BoundaryCondition {
            id: "social_pacing".to_string(),
            trigger: Trigger::All(vec![
                Trigger::ContextEquals {
                    key: "interaction_type".to_string(),
                    value: "social".to_string(),
                },
                Trigger::ContextEquals {
                    key: "frequency".to_string(),
                    value: "high".to_string(),
                },
            ]),
            severity: Severity::Info,
            reason: "Maintain appropriate social interaction frequency".to_string(),
            actions: vec![RecommendedAction::PaceSocialInteractions],
            cooldown_secs: Some(1800),
            scope: CooldownScope::PerAudience,
        },
        BoundaryCondition {
            id: "professional_decorum".to_string(),
            trigger: Trigger::AudienceIs(AudienceType::Professional),
            severity: Severity::Caution,
            reason: "Keep tone appropriate for a professional audience".to_string(),
            actions: vec![
                RecommendedAction::CapTone {
                    dimension: ToneDimension::Humor,
                    max: 0.4,
                },
                RecommendedAction::CapTone {
                    dimension: ToneDimension::Flirtation,
                    max: 0.1,
                },
                RecommendedAction::FloorFormality { min: 0.5 },
                RecommendedAction::DisallowNsfw,
            ],
            cooldown_secs: None,
            scope: CooldownScope::Global,
        },
        BoundaryCondition {
            id: "overload_guard".to_string(),
            trigger: Trigger::StabilityBelow(0.35),
            severity: Severity::Caution,
            reason: "Reduce load while affect is far from baseline".to_string(),
            actions: vec![
                RecommendedAction::SoftenSensitive,
                RecommendedAction::CapMaxTokens { max: 800 },
            ],
            cooldown_secs: Some(300),
            scope: CooldownScope::Global,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affect::{AffectConfig, AffectEngine};
    use crate::kernel::TraitKernel;
    use serde_json::json;
    use std::collections::HashMap;

    fn now() -> DateTime<Utc> {
        "2026-01-15T12:00:00Z".parse().unwrap()
    }

    fn neutral() -> AffectSnapshot {
        AffectEngine::new(AffectConfig::default(), &TraitKernel::balanced()).baseline(now())
    }

    fn stressed() -> AffectSnapshot {
        let mut s = neutral();
        s.stress = 0.85;
        s.tags.insert("stressed".to_string());
        s
    }

    fn ctx(pairs: &[(&str, serde_json::Value)]) -> InteractionContext {
        let map: HashMap<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        InteractionContext::from_map(&map)
    }

    fn manager() -> BoundaryManager {
        BoundaryManager::new(default_conditions())
    }

    #[test]
    fn test_default_table_validates() {
        assert!(BoundaryManager::validate_conditions(&default_conditions()).is_ok());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut conditions = default_conditions();
        let dup = conditions[0].clone();
        conditions.push(dup);
        assert!(matches!(
            BoundaryManager::validate_conditions(&conditions),
            Err(ConfigurationError::DuplicateConditionId { .. })
        ));
    }

    #[test]
    fn test_high_stress_activates_from_affect() {
        let m = manager();
        let active = m.get_conditions(&stressed(), 0.6, &InteractionContext::default(), now());
        assert!(active.iter().any(|c| c.id == "high_stress_protection"));
    }

    #[test]
    fn test_high_stress_activates_from_context() {
        let m = manager();
        let context = ctx(&[("stress_level", json!("high"))]);
        let active = m.get_conditions(&neutral(), 1.0, &context, now());
        assert!(active.iter().any(|c| c.id == "high_stress_protection"));
    }

    #[test]
    fn test_multiple_conditions_returned_together() {
        let m = manager();
        let context = ctx(&[
            ("stress_level", json!("high")),
            ("topic_complexity", json!("high")),
            ("action_type", json!("external_post")),
        ]);
        let active = m.get_conditions(&neutral(), 1.0, &context, now());
        let ids: Vec<&str> = active.iter().map(|c| c.id.as_str()).collect();
        assert!(ids.contains(&"high_stress_protection"));
        assert!(ids.contains(&"require_summary"));
        assert!(ids.contains(&"external_post_cooldown"));
    }

    #[test]
    fn test_hints_carry_reason_and_actions() {
        let m = manager();
        let hints = m.get_policy_hints(&stressed(), 0.6, &InteractionContext::default(), now());
        let hint = hints
            .iter()
            .find(|h| h.condition_id == "high_stress_protection")
            .unwrap();
        assert!(hint.reason.contains("high stress"));
        assert!(hint.reason.contains("600s"));
        assert_eq!(hint.severity, Severity::Critical);
        assert!(hint
            .actions
            .contains(&RecommendedAction::DeferHighImpactDecisions));
    }

    #[test]
    fn test_cooldown_suppresses_then_expires() {
        let m = manager();
        let context = InteractionContext::default();
        let affect = stressed();

        // Active before the cooldown.
        assert!(m
            .get_conditions(&affect, 0.6, &context, now())
            .iter()
            .any(|c| c.id == "high_stress_protection"));

        m.set_cooldown("high_stress_protection", &context, Duration::seconds(600), now());

        // Suppressed inside the window even though the predicate still holds.
        let inside = now() + Duration::seconds(599);
        assert!(!m
            .get_conditions(&affect, 0.6, &context, inside)
            .iter()
            .any(|c| c.id == "high_stress_protection"));

        // Back once the window has elapsed.
        let after = now() + Duration::seconds(600);
        assert!(m
            .get_conditions(&affect, 0.6, &context, after)
            .iter()
            .any(|c| c.id == "high_stress_protection"));
    }

    #[test]
    fn test_cooldown_scope_isolates_channels() {
        let m = manager();
        let email = ctx(&[("action_type", json!("external_post")), ("channel", json!("email"))]);
        let chat = ctx(&[("action_type", json!("external_post")), ("channel", json!("chat"))]);

        m.set_cooldown("external_post_cooldown", &email, Duration::seconds(600), now());

        let later = now() + Duration::seconds(10);
        // Email is suppressed, chat is not.
        assert!(!m
            .get_conditions(&neutral(), 1.0, &email, later)
            .iter()
            .any(|c| c.id == "external_post_cooldown"));
        assert!(m
            .get_conditions(&neutral(), 1.0, &chat, later)
            .iter()
            .any(|c| c.id == "external_post_cooldown"));
    }

    #[test]
    fn test_unknown_condition_cooldown_is_ignored() {
        let m = manager();
        m.set_cooldown("no_such_condition", &InteractionContext::default(), Duration::seconds(60), now());
        assert!(m.cooldowns.is_empty());
    }

    #[test]
    fn test_fold_caps_most_restrictive_wins() {
        let m = manager();
        let hints = vec![
            PolicyHint {
                condition_id: "a".to_string(),
                reason: "r".to_string(),
                severity: Severity::Caution,
                actions: vec![
                    RecommendedAction::CapTone {
                        dimension: ToneDimension::Humor,
                        max: 0.6,
                    },
                    RecommendedAction::FloorFormality { min: 0.3 },
                ],
            },
            PolicyHint {
                condition_id: "b".to_string(),
                reason: "r".to_string(),
                severity: Severity::Critical,
                actions: vec![
                    RecommendedAction::CapTone {
                        dimension: ToneDimension::Humor,
                        max: 0.2,
                    },
                    RecommendedAction::FloorFormality { min: 0.6 },
                    RecommendedAction::CapMaxTokens { max: 500 },
                ],
            },
        ];
        let caps = m.fold_caps(&BoundaryCaps::default(), &hints);
        assert_eq!(caps.max_humor, 0.2);
        assert_eq!(caps.min_formality, 0.6);
        assert_eq!(caps.max_tokens, 500);
        assert_eq!(caps.active_conditions, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_professional_decorum_caps() {
        let m = manager();
        let context = ctx(&[("audience", json!("professional"))]);
        let hints = m.get_policy_hints(&neutral(), 1.0, &context, now());
        let caps = m.fold_caps(&BoundaryCaps::default(), &hints);
        assert_eq!(caps.max_humor, 0.4);
        assert_eq!(caps.max_flirtation, 0.1);
        assert_eq!(caps.min_formality, 0.5);
        assert!(!caps.nsfw_allowed);
    }

    #[test]
    fn test_creative_flow_yields_to_urgency() {
        let m = manager();
        let flowing = ctx(&[("creative_flow", json!("active"))]);
        let active = m.get_conditions(&neutral(), 1.0, &flowing, now());
        assert!(active.iter().any(|c| c.id == "creative_flow_protection"));

        let urgent = ctx(&[("creative_flow", json!("active")), ("urgency", json!("high"))]);
        let active = m.get_conditions(&neutral(), 1.0, &urgent, now());
        assert!(!active.iter().any(|c| c.id == "creative_flow_protection"));
    }

    #[test]
    fn test_overload_guard_on_low_stability() {
        let m = manager();
        let active = m.get_conditions(&neutral(), 0.2, &InteractionContext::default(), now());
        assert!(active.iter().any(|c| c.id == "overload_guard"));
        let calm = m.get_conditions(&neutral(), 0.9, &InteractionContext::default(), now());
        assert!(!calm.iter().any(|c| c.id == "overload_guard"));
    }

    #[test]
    fn test_condition_table_serde_round_trip() {
        let table = default_conditions();
        let yaml = serde_yaml::to_string(&table).unwrap();
        let back: Vec<BoundaryCondition> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(table, back);
    }
}
