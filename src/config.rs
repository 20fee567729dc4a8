//! Process-level configuration (spec.md §6 environment variables).
//!
//! [`GameConfiguration`] (the singleton `attack_generation_cost` row) is a
//! repository-backed entity — see [`crate::contracts::config`]. Everything
//! else here is a `RuntimeConfig` loaded once from the environment with
//! `dotenvy`-sourced `.env` support, the pattern used for exactly this
//! purpose elsewhere in the corpus.

use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unix seconds, used for `Battle`/`Participant` timestamps and the
/// pending-battle TTL sweep. Clamped to 0 in the unrepresentable case of
/// a clock set before the epoch rather than panicking.
#[must_use]
pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Process-wide numeric constants, loaded once at startup.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub credits_win_vs_human: i64,
    pub credits_win_vs_bot: i64,
    pub credits_loss: i64,
    pub base_starting_hp: i64,
    pub base_momentum: i64,
    pub damage_variance_min: f64,
    pub damage_variance_max: f64,
    pub momentum_cost_modifier_min: f64,
    pub momentum_cost_modifier_max: f64,
    pub momentum_cost_variance_ratio: f64,
    pub stage_min: i32,
    pub stage_max: i32,
    pub script_wall_clock_budget_ms: u64,
    pub script_instruction_budget: u64,
    pub llm_model_name: String,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_profile_model_name: Option<String>,
    pub llm_call_timeout_secs: u64,
    pub pending_battle_ttl_secs: i64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            credits_win_vs_human: 3,
            credits_win_vs_bot: 2,
            credits_loss: 1,
            base_starting_hp: 100,
            base_momentum: 50,
            damage_variance_min: 0.85,
            damage_variance_max: 1.00,
            momentum_cost_modifier_min: 0.5,
            momentum_cost_modifier_max: 1.5,
            momentum_cost_variance_ratio: 0.15,
            stage_min: -6,
            stage_max: 6,
            script_wall_clock_budget_ms: 250,
            script_instruction_budget: 200_000,
            llm_model_name: String::new(),
            llm_api_key: String::new(),
            llm_base_url: "https://api.openai.com/v1".into(),
            llm_profile_model_name: None,
            llm_call_timeout_secs: 30,
            pending_battle_ttl_secs: 600,
        }
    }
}

impl RuntimeConfig {
    /// Load a `.env` file if present (no-op if missing), then read
    /// environment variables over the documented defaults.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();
        Self {
            credits_win_vs_human: env_or("CREDITS_WIN_VS_HUMAN", defaults.credits_win_vs_human),
            credits_win_vs_bot: env_or("CREDITS_WIN_VS_BOT", defaults.credits_win_vs_bot),
            credits_loss: env_or("CREDITS_LOSS", defaults.credits_loss),
            base_starting_hp: env_or("BASE_STARTING_HP", defaults.base_starting_hp),
            base_momentum: env_or("BASE_MOMENTUM", defaults.base_momentum),
            llm_model_name: env::var("LLM_MODEL_NAME").unwrap_or_default(),
            llm_api_key: env::var("LLM_API_KEY").unwrap_or_default(),
            llm_base_url: env::var("LLM_BASE_URL").unwrap_or(defaults.llm_base_url),
            llm_profile_model_name: env::var("LLM_PROFILE_MODEL_NAME").ok(),
            llm_call_timeout_secs: env_or("LLM_CALL_TIMEOUT_SECS", defaults.llm_call_timeout_secs),
            ..defaults
        }
    }
}
