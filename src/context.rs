//! Interaction context — the open mapping callers attach to events and
//! read-side requests.
//!
//! The engine recognizes four keys (`task_type`, `audience`, `channel`,
//! `urgency`) and carries everything else opaquely. Unrecognized keys and
//! unrecognized values are never errors; they simply resolve to `None` /
//! defaults so novel collaborators cannot break the core.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Task classification recognized by weight rules and mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Creative,
    Analytical,
    Social,
    Support,
    Casual,
}

/// Who the agent is talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudienceType {
    Friend,
    Family,
    Colleague,
    Stranger,
    Child,
    Professional,
    Intimate,
}

/// Which surface the interaction happens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Chat,
    Email,
    Voice,
    Video,
    Text,
}

/// Caller-declared urgency. Ordered so predicates can express "at least".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Parsed view over an open context mapping.
///
/// Built with [`InteractionContext::from_map`]; the recognized keys are
/// lifted into typed fields, the rest stays in `extra` untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionContext {
    pub task_type: Option<TaskType>,
    pub audience: Option<AudienceType>,
    pub channel: Option<ChannelType>,
    #[serde(default)]
    pub urgency: Urgency,
    /// Everything the engine does not interpret, preserved verbatim.
    #[serde(default)]
    pub extra: HashMap<String, Value>,
}

impl InteractionContext {
    /// Parse an open context mapping. Permissive: unknown keys land in
    /// `extra`, unknown values for recognized keys are ignored.
    pub fn from_map(map: &HashMap<String, Value>) -> Self {
        let mut ctx = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "task_type" => ctx.task_type = parse_variant(value),
                "audience" => ctx.audience = parse_variant(&descriptor_type(value)),
                "channel" => ctx.channel = parse_variant(&descriptor_type(value)),
                "urgency" => {
                    if let Some(u) = parse_variant(value) {
                        ctx.urgency = u;
                    }
                }
                _ => {
                    ctx.extra.insert(key.clone(), value.clone());
                }
            }
        }
        ctx
    }

    /// Whether an uninterpreted key is present with a truthy value
    /// (anything other than `false`, `null`, `0`, or `""`).
    pub fn flag(&self, key: &str) -> bool {
        match self.extra.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    /// String form of an uninterpreted key's value, if any.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

/// Audience and channel descriptors may arrive as a bare string
/// (`"professional"`) or an object (`{"type": "professional", ...}`).
fn descriptor_type(value: &Value) -> Value {
    match value {
        Value::Object(map) => map.get("type").cloned().unwrap_or(Value::Null),
        other => other.clone(),
    }
}

fn parse_variant<T: serde::de::DeserializeOwned>(value: &Value) -> Option<T> {
    serde_json::from_value(value.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_recognized_keys_are_lifted() {
        let ctx = InteractionContext::from_map(&map(&[
            ("task_type", json!("creative")),
            ("audience", json!("professional")),
            ("channel", json!("email")),
            ("urgency", json!("high")),
        ]));
        assert_eq!(ctx.task_type, Some(TaskType::Creative));
        assert_eq!(ctx.audience, Some(AudienceType::Professional));
        assert_eq!(ctx.channel, Some(ChannelType::Email));
        assert_eq!(ctx.urgency, Urgency::High);
        assert!(ctx.extra.is_empty());
    }

    #[test]
    fn test_descriptor_objects_are_accepted() {
        let ctx = InteractionContext::from_map(&map(&[
            ("audience", json!({"type": "child", "name": "Sasha"})),
            ("channel", json!({"type": "voice", "platform": "phone"})),
        ]));
        assert_eq!(ctx.audience, Some(AudienceType::Child));
        assert_eq!(ctx.channel, Some(ChannelType::Voice));
    }

    #[test]
    fn test_unknown_keys_preserved_not_rejected() {
        let ctx = InteractionContext::from_map(&map(&[
            ("topic_complexity", json!("high")),
            ("creative_flow", json!("active")),
            ("retries", json!(3)),
        ]));
        assert_eq!(ctx.get_str("topic_complexity"), Some("high"));
        assert!(ctx.flag("creative_flow"));
        assert!(ctx.flag("retries"));
        assert!(!ctx.flag("missing"));
    }

    #[test]
    fn test_unknown_values_for_recognized_keys_ignored() {
        let ctx = InteractionContext::from_map(&map(&[
            ("task_type", json!("interpretive_dance")),
            ("urgency", json!("apocalyptic")),
        ]));
        assert_eq!(ctx.task_type, None);
        assert_eq!(ctx.urgency, Urgency::Normal);
    }

    #[test]
    fn test_urgency_ordering() {
        assert!(Urgency::Critical > Urgency::High);
        assert!(Urgency::High > Urgency::Normal);
        assert!(Urgency::Normal > Urgency::Low);
    }
}
