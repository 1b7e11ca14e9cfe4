//! # Affiliation Dynamics Simulation
//!
//! Runs best-response dynamics over generated populations for all four utility
//! models, in both update modes, and prints how each run ended.
//!
//! ```text
//! cargo run --example simulation
//! RUST_LOG=affinity_core=debug cargo run --example simulation
//! ```

use affinity_core::{
    AffiliationIndex, Agent, Dynamics, DynamicsConfig, Frame, GeneratorConfig, Outcome, Pattern,
    PopulationGenerator, PopulationStats, Result, RoundEvent, RunState, UpdateMode, UtilityModel,
};

// ── Display helpers ──────────────────────────────────────────────────────────

fn describe(state: RunState) -> String {
    match state {
        RunState::Equilibrium => "equilibrium".to_string(),
        RunState::CycleDetected { first_seen } => format!("cycle (back to round {first_seen})"),
        RunState::RoundLimitExceeded => "round limit".to_string(),
        RunState::Running => "running".to_string(),
    }
}

fn print_frame(frame: &Frame) {
    let rows: Vec<String> = frame
        .affiliations
        .iter()
        .map(|row| row.iter().map(|b| b.to_string()).collect())
        .collect();
    let changes: Vec<String> = frame
        .changes
        .iter()
        .map(|c| {
            let (a, i) = c.labels();
            format!("{a}→{i} {:?}", c.direction)
        })
        .collect();
    println!(
        "  round {:>2}  [{}]  U = {:>6.2}  {}",
        frame.round,
        rows.join(" "),
        frame.total_utility(),
        changes.join(", "),
    );
}

fn print_outcome(label: &str, outcome: &Outcome) {
    let total = outcome.final_frame().map(Frame::total_utility).unwrap_or(0.0);
    println!(
        "  {:<28} {:<26} rounds {:>4}   total U {:>8.2}",
        label,
        describe(outcome.state),
        outcome.rounds,
        total,
    );
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // ── Three agents, linear degree ──────────────────────────────────────────
    println!("▶  Three agents on two ideas (mil1)\n");
    let mut index = AffiliationIndex::from_agents(vec![
        Agent::new(1, vec![1, 0], UtilityModel::LinearDegree)?,
        Agent::new(2, vec![1, 0], UtilityModel::LinearDegree)?,
        Agent::new(3, vec![0, 1], UtilityModel::LinearDegree)?,
    ])?;
    let mut events = Vec::new();
    let outcome = Dynamics::new(&mut index, DynamicsConfig::default())
        .with_observer(|e: &RoundEvent| events.push(*e))
        .run()?;
    for frame in &outcome.frames {
        print_frame(frame);
    }
    println!("  → {} after {} events\n", describe(outcome.state), events.len());

    // ── Every model, both modes ──────────────────────────────────────────────
    println!("▶  20 agents × 8 ideas, random start, seed 42\n");
    for model in UtilityModel::ALL {
        let config = GeneratorConfig::new(20, 8, model).with_seed(42);
        let population = PopulationGenerator::new(config).random()?;
        for mode in [UpdateMode::Sequential, UpdateMode::Simultaneous] {
            let mut index = AffiliationIndex::from_agents(population.clone())?;
            let outcome = Dynamics::new(&mut index, DynamicsConfig::new(mode)).run()?;
            print_outcome(&format!("{model} {mode:?}"), &outcome);
        }
    }
    println!();

    // ── Starting shape matters ───────────────────────────────────────────────
    println!("▶  Congested model (mil10) from structured starts\n");
    let config = GeneratorConfig::new(12, 12, UtilityModel::CongestedDegree).with_seed(7);
    let starts = [
        ("clusters", PopulationGenerator::new(config).structured(Pattern::Clusters)?),
        ("alternating", PopulationGenerator::new(config).structured(Pattern::Alternating)?),
        ("blocks", PopulationGenerator::new(config).structured(Pattern::Blocks)?),
        ("density 0.25", PopulationGenerator::new(config).uniform_density(0.25)?),
        ("beta(2, 5)", PopulationGenerator::new(config).beta_density(2.0, 5.0)?),
    ];
    for (label, population) in starts {
        let before = PopulationStats::from_agents(&population)?;
        let mut index = AffiliationIndex::from_agents(population)?;
        let outcome = Dynamics::new(&mut index, DynamicsConfig::default()).run()?;
        let after = PopulationStats::from_index(&index)?;
        print_outcome(label, &outcome);
        println!(
            "  {:<28} density {:.2} → {:.2}   mean hamming {:.2} → {:.2}",
            "",
            before.avg_density,
            after.avg_density,
            before.avg_hamming,
            after.avg_hamming,
        );
    }

    Ok(())
}
