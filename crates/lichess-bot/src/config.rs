//! Bot configuration from environment variables

use std::env;

use tracing::info;

use crate::error::BotError;
use crate::strategy::MoveStrategy;

pub const DEFAULT_BASE_URL: &str = "https://lichess.org";

#[derive(Clone, Debug)]
pub struct BotConfig {
    /// Personal API token of the bot account
    pub api_token: String,

    /// Lichess host, overridable for a local lila instance
    pub base_url: String,

    /// How each game session selects its moves
    pub strategy: MoveStrategy,

    /// Accept incoming challenges
    pub accept_challenges: bool,
}

impl BotConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, BotError> {
        let api_token = env::var("LICHESS_API_TOKEN")
            .map_err(|_| BotError::Config("LICHESS_API_TOKEN not set".into()))?;

        let base_url = env::var("LICHESS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let accept_challenges = env::var("ACCEPT_CHALLENGES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);

        let strategy_name = env::var("MOVE_STRATEGY").unwrap_or_else(|_| "minimax".to_string());
        let strategy = match strategy_name.to_ascii_lowercase().as_str() {
            "minimax" => MoveStrategy::Minimax {
                depth: parse_var("SEARCH_DEPTH", 4),
            },
            "stockfish" => MoveStrategy::Stockfish {
                path: env::var("STOCKFISH_PATH")
                    .unwrap_or_else(|_| "/usr/local/bin/stockfish".to_string()),
                skill_level: parse_var("STOCKFISH_SKILL_LEVEL", 3),
                movetime_ms: parse_var("STOCKFISH_MOVETIME_MS", 100),
            },
            "random" => MoveStrategy::Random,
            other => {
                return Err(BotError::Config(format!(
                    "Unknown MOVE_STRATEGY '{other}' (expected minimax, stockfish or random)"
                )))
            }
        };

        info!(base_url = %base_url, ?strategy, accept_challenges, "Bot config loaded");

        Ok(Self {
            api_token,
            base_url,
            strategy,
            accept_challenges,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
