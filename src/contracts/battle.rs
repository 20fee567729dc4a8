//! [`Battle`] and the records nested inside it (spec.md §3).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::attack::{TriggerDuration, TriggerWhen, TriggerWho};
use super::ids::{AttackId, BattleId, ParticipantId, RegistrationId, ScriptId};
use super::log_entry::{LogEntry, Stat};
use super::role::{Role, RoleMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleStatus {
    Pending,
    Active,
    Finished,
    Declined,
}

/// A heterogeneous value in `custom_statuses` (spec.md §9 design note).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Int(i64),
    Bool(bool),
    Text(String),
}

/// Per-role integer stage modifiers, clamped to `[-6, 6]`.
pub type StatStages = HashMap<Stat, i32>;

/// Per-role custom status map.
pub type CustomStatuses = HashMap<String, StatusValue>;

/// A live instance of a [`crate::contracts::attack::Script`] attached to
/// a battle (spec.md §3, §9 "arena-like ownership" design note).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredScript {
    pub registration_id: RegistrationId,
    pub script_id: ScriptId,
    pub source_attack_id: AttackId,
    pub trigger_who: TriggerWho,
    pub trigger_when: TriggerWhen,
    pub trigger_duration: TriggerDuration,
    pub original_attacker_role: Role,
    pub original_target_role: Role,
    pub start_turn: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battle {
    pub id: BattleId,
    pub player1: ParticipantId,
    pub player2: ParticipantId,
    pub status: BattleStatus,
    pub winner: Option<Role>,
    pub player2_is_ai_controlled: bool,

    pub hp: RoleMap<i64>,
    pub max_hp: RoleMap<i64>,
    pub momentum: RoleMap<i64>,
    pub stat_stages: RoleMap<StatStages>,
    pub custom_statuses: RoleMap<CustomStatuses>,

    pub turn_number: u32,
    pub whose_turn: Role,

    pub battle_attacks: RoleMap<Vec<AttackId>>,
    pub attacks_used: RoleMap<HashSet<AttackId>>,

    pub registered_scripts: Vec<RegisteredScript>,
    pub event_log: Vec<LogEntry>,

    pub created_at: i64,
    pub updated_at: i64,
}

impl Battle {
    #[must_use]
    pub fn role_of(&self, participant: ParticipantId) -> Option<Role> {
        if participant == self.player1 {
            Some(Role::Player1)
        } else if participant == self.player2 {
            Some(Role::Player2)
        } else {
            None
        }
    }

    #[must_use]
    pub fn participant_id(&self, role: Role) -> ParticipantId {
        match role {
            Role::Player1 => self.player1,
            Role::Player2 => self.player2,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == BattleStatus::Finished
    }
}
