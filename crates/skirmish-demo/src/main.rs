//! Demo binary for the Skirmish client engine.
//!
//! Loads `config.ron` (CLI flags override it), plans a movement path around
//! an obstacle, then replays a scripted mid-combat join through the
//! connection manager.
//! Run with `cargo run -p skirmish-demo -- --log-level debug`.

mod encounter;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use skirmish_config::{CliArgs, Config, ConnectionConfig, default_config_dir};
use skirmish_hex::{
    CubeCoord, GridBounds, HexLayout, Occupancy, PathBuilder, PathPlanner, TurnResources,
};
use skirmish_sync::ReconnectConfig;
use tracing::{error, info, warn};

fn reconnect_config(conn: &ConnectionConfig) -> ReconnectConfig {
    ReconnectConfig {
        initial_delay: Duration::from_millis(conn.initial_delay_ms),
        backoff_multiplier: conn.backoff_multiplier,
        max_delay: Duration::from_millis(conn.max_delay_ms),
        max_attempts: conn.max_attempts,
        jitter: conn.jitter,
    }
}

fn demonstrate_path_planning(config: &Config) {
    let layout = HexLayout::new(config.grid.hex_size);
    let start = CubeCoord::ORIGIN;
    let goal = CubeCoord::new(4, -2, -2);

    // A short wall across the straight line.
    let walls: Occupancy = [
        CubeCoord::new(2, -1, -1),
        CubeCoord::new(2, 0, -2),
        CubeCoord::new(2, -2, 0),
    ]
    .into_iter()
    .collect();
    let builder = PathBuilder::new(&walls)
        .with_bounds(GridBounds {
            min_x: -6,
            max_x: 6,
            min_y: -6,
            max_y: 6,
        })
        .with_max_detour(config.grid.max_detour);

    let resources = TurnResources {
        movement_max: 30,
        ..TurnResources::default()
    };
    let mut planner = PathPlanner::new(start);

    match planner.extend_to(CubeCoord::new(1, -1, 0), &builder, &resources) {
        Ok(len) => info!("First click: path is {} steps", len),
        Err(e) => warn!("First click rejected: {}", e),
    }
    match planner.extend_to(goal, &builder, &resources) {
        Ok(len) => info!("Second click: path is {} steps", len),
        Err(e) => warn!("Second click rejected: {}", e),
    }

    let path = planner.path();
    info!(
        "Planned {} -> {} around the wall: {} steps, {} ft of {} ft",
        start,
        planner.origin(),
        path.len(),
        path.cost_feet(),
        resources.remaining_movement()
    );
    for step in path.steps() {
        let pixel = layout.to_pixel(*step);
        info!("  step {} at ({:.1}, {:.1})", step, pixel.x, pixel.y);
    }

    let reachable = planner.legal_destinations(&resources, &walls);
    info!("{} cells still reachable from {}", reachable.len(), planner.origin());

    let executed = planner.take();
    info!("Executing {} steps; planner reset to {}", executed.len(), planner.origin());
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from(".skirmish"));

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    skirmish_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));
    info!("Skirmish client for {}", config.connection.endpoint);

    demonstrate_path_planning(&config);

    let backoff = reconnect_config(&config.connection);
    match encounter::replay_mid_combat_join(&config.connection, backoff).await {
        Ok(view) => info!(
            "Encounter replay finished: round {}, {} events applied",
            view.round(),
            view.applied()
        ),
        Err(e) => error!("Encounter replay failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnect_config_from_defaults() {
        let backoff = reconnect_config(&ConnectionConfig::default());
        assert_eq!(backoff, ReconnectConfig::default());
    }
}
