//! The mutable/immutable split a script execution operates over.
//!
//! [`Snapshot`] is the "working copy" spec.md §4.3 describes: a clone of
//! the battle's mutable fields, mutated in place by capability calls,
//! and merged back by the caller only if the script both succeeds and
//! sets `state_changed`.

use std::collections::HashSet;

use crate::contracts::attack::{TriggerDuration, TriggerWhen, TriggerWho};
use crate::contracts::battle::{Battle, CustomStatuses, RegisteredScript, StatStages};
use crate::contracts::ids::{AttackId, ParticipantId, RegistrationId};
use crate::contracts::log_entry::LogEntry;
use crate::contracts::participant::Participant;
use crate::contracts::role::{Role, RoleMap};

/// Read-only facts about the battle that never change over the course of
/// one script execution: base stats, names, ids, max HP.
#[derive(Debug, Clone)]
pub struct StaticInfo {
    pub participant_id: RoleMap<ParticipantId>,
    pub participant_name: RoleMap<String>,
    pub base_attack: RoleMap<i64>,
    pub base_defense: RoleMap<i64>,
    pub base_speed: RoleMap<i64>,
    pub max_hp: RoleMap<i64>,
}

impl StaticInfo {
    #[must_use]
    pub fn from_battle(
        battle: &Battle,
        p1_name: String,
        p2_name: String,
        p1_atk: i64,
        p1_def: i64,
        p1_spd: i64,
        p2_atk: i64,
        p2_def: i64,
        p2_spd: i64,
    ) -> Self {
        Self {
            participant_id: RoleMap::new(battle.player1, battle.player2),
            participant_name: RoleMap::new(p1_name, p2_name),
            base_attack: RoleMap::new(p1_atk, p2_atk),
            base_defense: RoleMap::new(p1_def, p2_def),
            base_speed: RoleMap::new(p1_spd, p2_spd),
            max_hp: battle.max_hp,
        }
    }

    /// Builds [`StaticInfo`] directly from the two battling participants,
    /// in whichever role order `battle.player1`/`player2` assigns them.
    #[must_use]
    pub fn from_participants(battle: &Battle, p1: &Participant, p2: &Participant) -> Self {
        Self::from_battle(
            battle,
            p1.display_name.clone(),
            p2.display_name.clone(),
            p1.base_stats.attack,
            p1.base_stats.defense,
            p1.base_stats.speed,
            p2.base_stats.attack,
            p2.base_stats.defense,
            p2.base_stats.speed,
        )
    }
}

/// The mutable working copy a single script execution reads and writes.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub hp: RoleMap<i64>,
    pub momentum: RoleMap<i64>,
    pub stat_stages: RoleMap<StatStages>,
    pub custom_statuses: RoleMap<CustomStatuses>,
    pub registered_scripts: Vec<RegisteredScript>,
    pub event_log: Vec<LogEntry>,
}

impl Snapshot {
    #[must_use]
    pub fn from_battle(battle: &Battle) -> Self {
        Self {
            hp: battle.hp,
            momentum: battle.momentum,
            stat_stages: battle.stat_stages.clone(),
            custom_statuses: battle.custom_statuses.clone(),
            registered_scripts: battle.registered_scripts.clone(),
            event_log: Vec::new(),
        }
    }

    /// Writes this snapshot's mutable fields back onto `battle`.
    pub fn apply_to(&self, battle: &mut Battle) {
        battle.hp = self.hp;
        battle.momentum = self.momentum;
        battle.stat_stages = self.stat_stages.clone();
        battle.custom_statuses = self.custom_statuses.clone();
        battle.registered_scripts = self.registered_scripts.clone();
        battle.event_log.extend(self.event_log.iter().cloned());
    }
}

/// Per-execution metadata injected as Lua globals (spec.md §4.3).
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    pub me_role: Role,
    pub enemy_role: Role,
    pub current_actor_role: Role,
    pub current_target_role: Role,
    pub context_role: Role,
    pub original_attacker_role: Role,
    pub original_target_role: Role,
    pub current_registration_id: Option<RegistrationId>,
    pub current_turn: u32,
    pub script_start_turn: u32,
    pub trigger_who: TriggerWho,
    pub trigger_when: TriggerWhen,
    pub trigger_duration: TriggerDuration,
    pub registering_attack_id: Option<AttackId>,
}

/// What a script is allowed to affect this call: used by
/// [`crate::registry`] to build `RunContext` from a trigger match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseActors {
    pub phase_actor: Role,
}

#[must_use]
pub fn all_roles() -> HashSet<Role> {
    [Role::Player1, Role::Player2].into_iter().collect()
}
