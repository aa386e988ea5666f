//! Event contract — the taxonomy of affective events and their envelope.
//!
//! Event kinds are a closed, first-class taxonomy with a catch-all branch:
//! collaborators may ship novel tags at any time and the engine treats them
//! as neutral rather than failing. Tags use the `family:variant` form on
//! the wire (`plan:start`, `tool:fail`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::context::{AudienceType, ChannelType, InteractionContext};
use crate::errors::ValidationError;

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// The event taxonomy. Known kinds get first-class impact handling;
/// everything else is carried as [`EventKind::Other`] and has no affective
/// impact of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    PlanStart,
    PlanComplete,
    PlanFail,
    ToolSuccess,
    ToolFail,
    LearningStart,
    LearningBreakthrough,
    LearningFrustration,
    SocialInteraction,
    SocialConflict,
    PositiveInteraction,
    NegativeInteraction,
    Achievement,
    Failure,
    Stress,
    /// Unknown tag, preserved verbatim. Applies a neutral impact.
    Other(String),
}

impl EventKind {
    /// All first-class kinds, in taxonomy order.
    pub const KNOWN: [EventKind; 15] = [
        EventKind::PlanStart,
        EventKind::PlanComplete,
        EventKind::PlanFail,
        EventKind::ToolSuccess,
        EventKind::ToolFail,
        EventKind::LearningStart,
        EventKind::LearningBreakthrough,
        EventKind::LearningFrustration,
        EventKind::SocialInteraction,
        EventKind::SocialConflict,
        EventKind::PositiveInteraction,
        EventKind::NegativeInteraction,
        EventKind::Achievement,
        EventKind::Failure,
        EventKind::Stress,
    ];

    /// Wire tag for this kind.
    pub fn tag(&self) -> &str {
        match self {
            EventKind::PlanStart => "plan:start",
            EventKind::PlanComplete => "plan:complete",
            EventKind::PlanFail => "plan:fail",
            EventKind::ToolSuccess => "tool:success",
            EventKind::ToolFail => "tool:fail",
            EventKind::LearningStart => "learning:start",
            EventKind::LearningBreakthrough => "learning:breakthrough",
            EventKind::LearningFrustration => "learning:frustration",
            EventKind::SocialInteraction => "social:interaction",
            EventKind::SocialConflict => "social:conflict",
            EventKind::PositiveInteraction => "positive_interaction",
            EventKind::NegativeInteraction => "negative_interaction",
            EventKind::Achievement => "achievement",
            EventKind::Failure => "failure",
            EventKind::Stress => "stress",
            EventKind::Other(tag) => tag,
        }
    }

    /// Parse a wire tag. Unknown tags become [`EventKind::Other`].
    pub fn from_tag(tag: &str) -> Self {
        for kind in Self::KNOWN {
            if kind.tag() == tag {
                return kind;
            }
        }
        EventKind::Other(tag.to_string())
    }

    /// Whether this kind has first-class impact handling.
    pub fn is_known(&self) -> bool {
        !matches!(self, EventKind::Other(_))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl From<String> for EventKind {
    fn from(tag: String) -> Self {
        EventKind::from_tag(&tag)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.tag().to_string()
    }
}

// ---------------------------------------------------------------------------
// Event envelope
// ---------------------------------------------------------------------------

/// A single affective event, consumed once by the engine and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    /// Strength of the event in [0, 1].
    pub intensity: f64,
    /// Open context mapping; recognized keys are interpreted, the rest kept.
    #[serde(default)]
    pub context: HashMap<String, Value>,
    /// Audience descriptor, overriding any `audience` key in `context`.
    #[serde(default)]
    pub audience: Option<AudienceType>,
    /// Channel descriptor, overriding any `channel` key in `context`.
    #[serde(default)]
    pub channel: Option<ChannelType>,
    /// When the event happened. Defaults to the call time when absent.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(kind: EventKind, intensity: f64) -> Self {
        Self {
            kind,
            intensity,
            context: HashMap::new(),
            audience: None,
            channel: None,
            timestamp: None,
        }
    }

    pub fn with_context(mut self, key: &str, value: Value) -> Self {
        self.context.insert(key.to_string(), value);
        self
    }

    pub fn with_audience(mut self, audience: AudienceType) -> Self {
        self.audience = Some(audience);
        self
    }

    pub fn with_channel(mut self, channel: ChannelType) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn at(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Structural validation, run before any state mutation.
    ///
    /// Semantic overshoot elsewhere is clamped; only structurally broken
    /// input is rejected here.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.intensity.is_finite() {
            return Err(ValidationError::IntensityNotFinite);
        }
        if !(0.0..=1.0).contains(&self.intensity) {
            return Err(ValidationError::IntensityOutOfRange {
                value: self.intensity,
            });
        }
        if let EventKind::Other(tag) = &self.kind {
            if tag.is_empty() {
                return Err(ValidationError::EmptyEventKind);
            }
        }
        Ok(())
    }

    /// The typed context view for this event: the open mapping, with the
    /// explicit audience/channel descriptors taking precedence.
    pub fn interaction_context(&self) -> InteractionContext {
        let mut ctx = InteractionContext::from_map(&self.context);
        if self.audience.is_some() {
            ctx.audience = self.audience;
        }
        if self.channel.is_some() {
            ctx.channel = self.channel;
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tag_round_trip_for_known_kinds() {
        for kind in EventKind::KNOWN {
            assert_eq!(EventKind::from_tag(kind.tag()), kind);
        }
    }

    #[test]
    fn test_unknown_tag_becomes_other() {
        let kind = EventKind::from_tag("cosmic:alignment");
        assert_eq!(kind, EventKind::Other("cosmic:alignment".to_string()));
        assert!(!kind.is_known());
        assert_eq!(kind.tag(), "cosmic:alignment");
    }

    #[test]
    fn test_kind_serde_as_string() {
        let s = serde_json::to_string(&EventKind::PlanStart).unwrap();
        assert_eq!(s, "\"plan:start\"");
        let k: EventKind = serde_json::from_str("\"learning:breakthrough\"").unwrap();
        assert_eq!(k, EventKind::LearningBreakthrough);
    }

    #[test]
    fn test_validate_rejects_out_of_range_intensity() {
        let event = Event::new(EventKind::Stress, 1.2);
        assert!(matches!(
            event.validate(),
            Err(ValidationError::IntensityOutOfRange { .. })
        ));

        let event = Event::new(EventKind::Stress, f64::NAN);
        assert!(matches!(
            event.validate(),
            Err(ValidationError::IntensityNotFinite)
        ));
    }

    #[test]
    fn test_validate_rejects_empty_other_tag() {
        let event = Event::new(EventKind::Other(String::new()), 0.5);
        assert!(matches!(
            event.validate(),
            Err(ValidationError::EmptyEventKind)
        ));
    }

    #[test]
    fn test_validate_accepts_bounds() {
        assert!(Event::new(EventKind::Achievement, 0.0).validate().is_ok());
        assert!(Event::new(EventKind::Achievement, 1.0).validate().is_ok());
    }

    #[test]
    fn test_interaction_context_descriptor_precedence() {
        let event = Event::new(EventKind::SocialInteraction, 0.5)
            .with_context("audience", json!("stranger"))
            .with_context("urgency", json!("low"))
            .with_audience(AudienceType::Friend);
        let ctx = event.interaction_context();
        assert_eq!(ctx.audience, Some(AudienceType::Friend));
        assert_eq!(ctx.urgency, crate::context::Urgency::Low);
    }
}
