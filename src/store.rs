//! In-memory implementations of every [`contracts::repository`] trait.
//!
//! A real deployment backs these with a database; this gives the crate
//! something runnable end to end (and something for [`crate::service`]'s
//! tests to exercise) without pulling in a storage dependency the rest of
//! the corpus doesn't need. Each store is a single `RwLock<HashMap<..>>`
//! guarded the same way — reads take a shared lock, writes take an
//! exclusive one, and lock poisoning (a panic while a writer held the
//! lock) surfaces as [`RepositoryError::Poisoned`] rather than unwinding.
//!
//! [`contracts::repository`]: crate::contracts::repository

use std::collections::HashMap;
use std::sync::RwLock;

use crate::contracts::attack::Attack;
use crate::contracts::battle::Battle;
use crate::contracts::config_entity::GameConfiguration;
use crate::contracts::ids::{AttackId, BattleId, ParticipantId};
use crate::contracts::participant::Participant;
use crate::contracts::repository::{
    AttackRepository, BattleRepository, ConfigError, ConfigRepository, ParticipantRepository, StatsRepository,
};
use crate::contracts::stats_entity::AttackUsageStats;

#[derive(Debug)]
pub enum RepositoryError {
    /// A writer panicked while holding the lock; the store's contents
    /// from that point on cannot be trusted.
    Poisoned(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Poisoned(what) => write!(f, "store lock poisoned: {what}"),
        }
    }
}

impl std::error::Error for RepositoryError {}

#[derive(Default)]
pub struct InMemoryParticipantRepository {
    rows: RwLock<HashMap<ParticipantId, Participant>>,
}

impl ParticipantRepository for InMemoryParticipantRepository {
    fn get(&self, id: ParticipantId) -> Option<Participant> {
        self.rows.read().unwrap_or_else(|e| e.into_inner()).get(&id).cloned()
    }

    fn save(&self, participant: &Participant) {
        self.rows
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(participant.id, participant.clone());
    }
}

#[derive(Default)]
pub struct InMemoryAttackRepository {
    rows: RwLock<HashMap<AttackId, Attack>>,
}

impl AttackRepository for InMemoryAttackRepository {
    fn get(&self, id: AttackId) -> Option<Attack> {
        self.rows.read().unwrap_or_else(|e| e.into_inner()).get(&id).cloned()
    }

    fn save(&self, attack: &Attack) {
        self.rows.write().unwrap_or_else(|e| e.into_inner()).insert(attack.id, attack.clone());
    }

    fn all(&self) -> Vec<Attack> {
        self.rows.read().unwrap_or_else(|e| e.into_inner()).values().cloned().collect()
    }
}

#[derive(Default)]
pub struct InMemoryBattleRepository {
    rows: RwLock<HashMap<BattleId, Battle>>,
}

impl BattleRepository for InMemoryBattleRepository {
    fn get(&self, id: BattleId) -> Option<Battle> {
        self.rows.read().unwrap_or_else(|e| e.into_inner()).get(&id).cloned()
    }

    fn insert(&self, battle: &Battle) {
        self.rows.write().unwrap_or_else(|e| e.into_inner()).insert(battle.id, battle.clone());
    }

    fn delete(&self, id: BattleId) {
        self.rows.write().unwrap_or_else(|e| e.into_inner()).remove(&id);
    }

    fn list_for_participant(&self, participant: ParticipantId) -> Vec<Battle> {
        self.rows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|b| b.player1 == participant || b.player2 == participant)
            .cloned()
            .collect()
    }

    fn list_all(&self) -> Vec<Battle> {
        self.rows.read().unwrap_or_else(|e| e.into_inner()).values().cloned().collect()
    }

    fn save_battle_state(&self, battle: &Battle) {
        // A single `insert` replaces the whole row, so every mutable
        // field named on the trait lands atomically or not at all.
        self.rows.write().unwrap_or_else(|e| e.into_inner()).insert(battle.id, battle.clone());
    }
}

#[derive(Default)]
pub struct InMemoryStatsRepository {
    rows: RwLock<HashMap<AttackId, AttackUsageStats>>,
}

impl StatsRepository for InMemoryStatsRepository {
    fn get_or_create(&self, attack_id: AttackId) -> AttackUsageStats {
        let existing = self.rows.read().unwrap_or_else(|e| e.into_inner()).get(&attack_id).cloned();
        existing.unwrap_or_else(|| AttackUsageStats::new(attack_id))
    }

    fn save(&self, stats: &AttackUsageStats) {
        self.rows
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(stats.attack_id, stats.clone());
    }

    fn all(&self) -> Vec<AttackUsageStats> {
        self.rows.read().unwrap_or_else(|e| e.into_inner()).values().cloned().collect()
    }

    fn reset_all(&self) {
        self.rows.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[derive(Default)]
pub struct InMemoryConfigRepository {
    row: RwLock<Option<GameConfiguration>>,
}

impl ConfigRepository for InMemoryConfigRepository {
    fn get(&self) -> Option<GameConfiguration> {
        *self.row.read().unwrap_or_else(|e| e.into_inner())
    }

    fn create(&self, config: GameConfiguration) -> Result<(), ConfigError> {
        let mut row = self.row.write().unwrap_or_else(|e| e.into_inner());
        if row.is_some() {
            return Err(ConfigError::AlreadyExists);
        }
        *row = Some(config);
        Ok(())
    }

    fn update(&self, config: GameConfiguration) {
        *self.row.write().unwrap_or_else(|e| e.into_inner()) = Some(config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_round_trips_through_save_and_get() {
        let repo = InMemoryParticipantRepository::default();
        let p = Participant {
            id: ParticipantId::new(),
            display_name: "Ada".into(),
            base_stats: crate::contracts::participant::BaseStats { hp: 100, attack: 100, defense: 100, speed: 100 },
            credits: 0,
            allow_bot_challenges: true,
            profile: crate::contracts::participant::ProfileBlob::default(),
            last_seen: 0,
            stats: crate::contracts::participant::ParticipantStats::default(),
            learned_attacks: std::collections::HashSet::new(),
            selected: vec![],
        };
        repo.save(&p);
        assert_eq!(repo.get(p.id).unwrap().display_name, "Ada");
        assert!(repo.get(ParticipantId::new()).is_none());
    }

    #[test]
    fn config_repository_rejects_a_second_create() {
        let repo = InMemoryConfigRepository::default();
        assert!(repo.create(GameConfiguration::default()).is_ok());
        assert!(matches!(repo.create(GameConfiguration::default()), Err(ConfigError::AlreadyExists)));
        assert_eq!(repo.get().unwrap().attack_generation_cost, 1);
    }

    #[test]
    fn stats_repository_get_or_create_seeds_a_zero_row() {
        let repo = InMemoryStatsRepository::default();
        let id = AttackId::new();
        let row = repo.get_or_create(id);
        assert_eq!(row.times_used, 0);
        assert!(repo.all().is_empty());
    }

    #[test]
    fn battle_repository_list_for_participant_filters_correctly() {
        let repo = InMemoryBattleRepository::default();
        let p1 = ParticipantId::new();
        let p2 = ParticipantId::new();
        let stranger = ParticipantId::new();
        let battle = Battle {
            id: BattleId::new(),
            player1: p1,
            player2: p2,
            status: crate::contracts::battle::BattleStatus::Pending,
            winner: None,
            player2_is_ai_controlled: false,
            hp: crate::contracts::role::RoleMap::both(0),
            max_hp: crate::contracts::role::RoleMap::both(0),
            momentum: crate::contracts::role::RoleMap::both(0),
            stat_stages: crate::contracts::role::RoleMap::new(Default::default(), Default::default()),
            custom_statuses: crate::contracts::role::RoleMap::new(Default::default(), Default::default()),
            turn_number: 1,
            whose_turn: crate::contracts::role::Role::Player1,
            battle_attacks: crate::contracts::role::RoleMap::new(vec![], vec![]),
            attacks_used: crate::contracts::role::RoleMap::new(Default::default(), Default::default()),
            registered_scripts: vec![],
            event_log: vec![],
            created_at: 0,
            updated_at: 0,
        };
        repo.insert(&battle);
        assert_eq!(repo.list_for_participant(p1).len(), 1);
        assert_eq!(repo.list_for_participant(p2).len(), 1);
        assert!(repo.list_for_participant(stranger).is_empty());
    }
}
