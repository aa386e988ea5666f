//! Walkthrough of the personality engine: construct an identity, feed it a
//! day's worth of events, and watch the derived style move.
//!
//! Run with `cargo run --example basic_usage`.

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use persona_matrix::{
    Event, EventKind, InteractionContext, MemorySink, PersonaConfig, PersonaOrchestrator,
    TraitKernel,
};

fn main() -> Result<()> {
    env_logger::init();

    // A curious, steady, fairly witty identity.
    let kernel = TraitKernel::new(0.85, 0.9, 0.7, 0.8, 0.8)?;
    let sink = Arc::new(MemorySink::new(64));
    let engine = PersonaOrchestrator::new(kernel, PersonaConfig::default(), sink.clone())?;

    println!("== baseline ==");
    print_profile(&engine, &InteractionContext::default());

    println!("\n== a creative session goes well ==");
    engine.update_state(
        Event::new(EventKind::PlanStart, 0.5).with_context("task_type", json!("creative")),
    )?;
    let trace = engine.update_state(
        Event::new(EventKind::PositiveInteraction, 0.6)
            .with_context("task_type", json!("creative"))
            .with_context("urgency", json!("low")),
    )?;
    println!("mode: {:?}, tags: {:?}", trace.mode, trace.affect.tags);
    print_profile(
        &engine,
        &InteractionContext::from_map(
            &[("task_type".to_string(), json!("creative"))].into_iter().collect(),
        ),
    );

    println!("\n== then everything catches fire ==");
    let trace = engine.update_state(
        Event::new(EventKind::Stress, 0.7).with_context("urgency", json!("high")),
    )?;
    println!(
        "mode: {:?}, temperature: {:.2}, max_tokens: {}",
        trace.mode, trace.profile.decoding.temperature, trace.profile.decoding.max_tokens
    );
    for hint in &trace.hints {
        println!("hint [{:?}] {}: {}", hint.severity, hint.condition_id, hint.reason);
    }

    println!("\n== policy hints under sustained stress ==");
    engine.update_state(Event::new(EventKind::Stress, 0.9))?;
    engine.update_state(Event::new(EventKind::Stress, 0.9))?;
    let ctx = InteractionContext::default();
    for hint in engine.get_policy_hints(&ctx) {
        println!("hint [{:?}] {}: {}", hint.severity, hint.condition_id, hint.reason);
    }
    // Acknowledge the stress protection; it stays quiet for ten minutes.
    engine.set_cooldown("high_stress_protection", &ctx, 600);
    println!("after cooldown: {} hints", engine.get_policy_hints(&ctx).len());

    println!("\n== reset ==");
    engine.reset();
    let snapshot = engine.get_affect_snapshot();
    println!(
        "valence {:+.2}, arousal {:.2}, stress {:.2}, stability {:.2}",
        snapshot.valence,
        snapshot.arousal,
        snapshot.stress,
        engine.stability_score()
    );
    println!("{} traces captured", sink.len());

    Ok(())
}

fn print_profile(engine: &PersonaOrchestrator, ctx: &InteractionContext) {
    let p = engine.get_style_profile(ctx);
    println!(
        "mode {:?} | warmth {:.2} formality {:.2} humor {:.2} | temp {:.2} tokens {}",
        p.mode,
        p.tone.warmth,
        p.tone.formality,
        p.tone.humor,
        p.decoding.temperature,
        p.decoding.max_tokens
    );
}
