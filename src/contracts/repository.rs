//! Persistence-contract traits (spec.md §4.1, §5).
//!
//! These are the only interface this crate assumes of its storage layer.
//! An implementer may back them with normalized tables or a single JSON
//! blob per row; the only requirement is the atomicity boundary described
//! on [`BattleRepository::save_battle_state`].

use super::attack::Attack;
use super::battle::Battle;
use super::config_entity::GameConfiguration;
use super::ids::{AttackId, BattleId, ParticipantId};
use super::participant::Participant;
use super::stats_entity::AttackUsageStats;

pub trait ParticipantRepository: Send + Sync {
    fn get(&self, id: ParticipantId) -> Option<Participant>;
    fn save(&self, participant: &Participant);
}

pub trait AttackRepository: Send + Sync {
    fn get(&self, id: AttackId) -> Option<Attack>;
    fn save(&self, attack: &Attack);
    fn all(&self) -> Vec<Attack>;
}

pub trait BattleRepository: Send + Sync {
    fn get(&self, id: BattleId) -> Option<Battle>;
    fn insert(&self, battle: &Battle);
    fn delete(&self, id: BattleId);
    fn list_for_participant(&self, participant: ParticipantId) -> Vec<Battle>;
    fn list_all(&self) -> Vec<Battle>;

    /// Writes the mutable fields spec.md §4.1 names
    /// (`hp`, `momentum`, `stat_stages`, `custom_statuses`,
    /// `registered_scripts`, `event_log`, `whose_turn`, `turn_number`,
    /// `status`, `winner`, `attacks_used`) as a single atomic unit: either
    /// every field lands, or — on any failure — none do and the prior
    /// committed snapshot is what callers observe.
    fn save_battle_state(&self, battle: &Battle);
}

pub trait StatsRepository: Send + Sync {
    fn get_or_create(&self, attack_id: AttackId) -> AttackUsageStats;
    fn save(&self, stats: &AttackUsageStats);
    fn all(&self) -> Vec<AttackUsageStats>;
    /// Admin operation (spec.md §9): resets every row to zero.
    fn reset_all(&self);
}

#[derive(Debug)]
pub enum ConfigError {
    AlreadyExists,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyExists => write!(f, "GameConfiguration already exists"),
        }
    }
}

impl std::error::Error for ConfigError {}

pub trait ConfigRepository: Send + Sync {
    fn get(&self) -> Option<GameConfiguration>;
    /// Fails if a row already exists (spec.md §3: "creation of a second
    /// instance must fail").
    fn create(&self, config: GameConfiguration) -> Result<(), ConfigError>;
    fn update(&self, config: GameConfiguration);
}
