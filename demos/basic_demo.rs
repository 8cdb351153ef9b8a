//! Basic demonstration of the serpent arena simulation.
//!
//! Run with: cargo run --example basic_demo
//! Set RUST_LOG=serpent_sim=debug to see deaths and respawns as they happen.

use serpent_sim::{snapshot_to_json_pretty, ArenaConfig, ArenaSim, DeathCause};
use tracing_subscriber::EnvFilter;

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    println!("=== Serpent Arena - Simulation Demo ===\n");

    let config = ArenaConfig {
        rng_seed: Some(2024),
        ..Default::default()
    };
    let mut sim = match ArenaSim::with_config(config) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("bad configuration: {err}");
            return;
        }
    };

    println!("Initial state:");
    print_snapshot(&mut sim);

    // Steer the player in a slow circle, boosting now and then
    println!("\nRunning for 600 ticks (10 seconds at 60 ticks/sec)...\n");
    let mut heading = 0.0f32;
    for frame in 0..600 {
        heading += 0.01;
        sim.set_player_intent(Some(heading), frame % 120 < 20);
        sim.step(1.0 / 60.0);

        let events = sim.snapshot().events;
        for death in &events.deaths {
            let cause = match death.cause {
                DeathCause::Boundary => "hit the wall".to_string(),
                DeathCause::SelfCollision => "bit itself".to_string(),
                DeathCause::Rival(rival) => format!("ran into agent {}", rival.0),
            };
            println!("  tick {}: agent {} {} at length {}", sim.current_tick(), death.agent.0, cause, death.length);
        }

        if (frame + 1) % 120 == 0 {
            println!("--- Tick {} (t={:.1}s, difficulty {:.3}) ---", sim.current_tick(), sim.current_time(), sim.difficulty());
            print_snapshot(&mut sim);
        }

        if let Some(score) = sim.final_score() {
            println!("\nGame over, final score {score}");
            break;
        }
    }

    println!("\nScore history: {:?}", sim.scoreboard().scores());

    println!("\n=== Final State (JSON, truncated) ===\n");
    let json = snapshot_to_json_pretty(&sim.snapshot()).unwrap_or_default();
    for line in json.lines().take(40) {
        println!("{line}");
    }
}

fn print_snapshot(sim: &mut ArenaSim) {
    let snapshot = sim.snapshot();

    if let Some(player) = snapshot.player() {
        let head = player.segments.first().copied().unwrap_or_default();
        println!(
            "  Player: head=({:.0}, {:.0}) len={} score={} boost={} [{}]",
            head.x,
            head.y,
            player.segments.len(),
            player.score,
            player.boosting,
            player.skin
        );
    }

    println!("  Leaderboard:");
    for (rank, entry) in snapshot.leaderboard.iter().enumerate() {
        let marker = if entry.is_player { " (you)" } else { "" };
        println!("    {}. agent {} score {}{}", rank + 1, entry.id, entry.score, marker);
    }
    println!(
        "  {} agents alive, {} resources on the field",
        snapshot.agents.iter().filter(|a| a.alive).count(),
        snapshot.resources.len()
    );
}
