//! # persona-matrix
//!
//! A personality state engine for conversational agents. The crate keeps a
//! continuously-evolving affective state per agent identity and derives,
//! from that state, the concrete parameters that steer downstream text
//! generation and policy decisions.
//!
//! ```text
//! TraitKernel (immutable baseline)
//!   ↓  resolve_weights(context)
//! AffectEngine (decay + event impacts)
//!   ↓  snapshot
//! BoundaryManager (conditions, cooldowns) ──▶ policy hints
//!   ↓
//! StyleSynthesizer (mode + profile + decoding params)
//!   ↓
//! PersonaOrchestrator ──▶ StyleTrace ──▶ TraceSink
//! ```
//!
//! The engine never produces text and never blocks on I/O: transport,
//! persistence, and the event bus are external collaborators talking to
//! the [`orchestrator::PersonaOrchestrator`] façade.
//!
//! ```no_run
//! use std::sync::Arc;
//! use persona_matrix::{
//!     Event, EventKind, InteractionContext, NullSink, PersonaConfig,
//!     PersonaOrchestrator, TraitKernel,
//! };
//!
//! let kernel = TraitKernel::new(0.85, 0.9, 0.7, 0.8, 0.8)?;
//! let engine = PersonaOrchestrator::new(kernel, PersonaConfig::default(), Arc::new(NullSink))?;
//!
//! let _trace = engine.update_state(Event::new(EventKind::PositiveInteraction, 0.6))?;
//! let profile = engine.get_style_profile(&InteractionContext::default());
//! println!("mode {:?}, temperature {}", profile.mode, profile.decoding.temperature);
//! # Ok::<(), persona_matrix::PersonaError>(())
//! ```

pub mod affect;
pub mod boundary;
pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod kernel;
pub mod orchestrator;
pub mod style;
pub mod trace;

// Re-exports of the public contract surface.
pub use affect::{AffectConfig, AffectEngine, AffectSnapshot, ImpactVector};
pub use boundary::{
    BoundaryCaps, BoundaryCondition, BoundaryManager, CooldownScope, PolicyHint,
    RecommendedAction, Severity, Trigger,
};
pub use config::PersonaConfig;
pub use context::{AudienceType, ChannelType, InteractionContext, TaskType, Urgency};
pub use errors::{ConfigurationError, PersonaError, ValidationError};
pub use events::{Event, EventKind};
pub use kernel::{TraitKernel, TraitName, TraitWeights, WeightRule};
pub use orchestrator::PersonaOrchestrator;
pub use style::{
    DecodingParams, Mode, ModeTemplate, SentenceLength, SensitivityLevel, StyleConfig,
    StyleProfile, StyleSynthesizer, ToneDimension,
};
pub use trace::{MemorySink, NullSink, StyleTrace, TraceSink};

/// Library version.
pub const VERSION: &str = "0.1.0";
