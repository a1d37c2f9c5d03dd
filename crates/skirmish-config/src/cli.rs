//! Command-line argument parsing for the Skirmish client.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Skirmish client command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "skirmish", about = "Turn-based skirmish client")]
pub struct CliArgs {
    /// Game server endpoint.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Session to join.
    #[arg(long)]
    pub session: Option<String>,

    /// Player id to join as.
    #[arg(long)]
    pub player: Option<String>,

    /// Reconnection attempts before giving up.
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref endpoint) = args.endpoint {
            self.connection.endpoint = endpoint.clone();
        }
        if let Some(ref session) = args.session {
            self.connection.session_id = session.clone();
        }
        if let Some(ref player) = args.player {
            self.connection.player_id = player.clone();
        }
        if let Some(attempts) = args.max_attempts {
            self.connection.max_attempts = attempts;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            session: Some("s-42".to_string()),
            max_attempts: Some(3),
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.connection.session_id, "s-42");
        assert_eq!(config.connection.max_attempts, 3);
        // Non-overridden fields retain defaults
        assert_eq!(config.connection.initial_delay_ms, 1000);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from([
            "skirmish",
            "--endpoint",
            "https://play.example.net",
            "--player",
            "player-2",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.endpoint.as_deref(), Some("https://play.example.net"));
        assert_eq!(args.player.as_deref(), Some("player-2"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.session, None);
        assert_eq!(args.config, None);
    }
}
