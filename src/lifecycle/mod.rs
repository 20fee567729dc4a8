//! Battle Lifecycle (C6): create/accept/decline/cancel/concede, the
//! active-battle constraints that gate them, and stale-pending reaping
//! (spec.md §4.6).

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};

use crate::config::{self, RuntimeConfig};
use crate::contracts::battle::{Battle, BattleStatus, CustomStatuses, StatStages};
use crate::contracts::ids::{BattleId, ParticipantId};
use crate::contracts::participant::Participant;
use crate::contracts::role::{Role, RoleMap};

#[derive(Debug)]
pub enum LifecycleError {
    /// Challenger or target already has a pending/active battle against
    /// the other party, or against a human elsewhere.
    AlreadyInBattle,
    /// `fight_as_bot` requested but the target has bot challenges disabled.
    BotChallengesDisabled,
    /// The battle is not `pending` where a pending-only transition requires it.
    NotPending,
    /// The battle is not `active` where an active-only transition requires it.
    NotActive,
    /// The acting participant does not hold the role this operation requires.
    NotOwner,
}

impl std::fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyInBattle => write!(f, "a pending or active battle already constrains this pair"),
            Self::BotChallengesDisabled => write!(f, "target does not allow bot challenges"),
            Self::NotPending => write!(f, "battle is not pending"),
            Self::NotActive => write!(f, "battle is not active"),
            Self::NotOwner => write!(f, "acting participant does not hold the required role"),
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Whether any battle in `battles` is `active` and not against a bot —
/// the "active vs human" constraint spec.md §4.6 applies at both
/// challenge-creation and acceptance time.
fn has_active_battle_vs_human(battles: &[Battle]) -> bool {
    battles
        .iter()
        .any(|b| b.status == BattleStatus::Active && !b.player2_is_ai_controlled)
}

/// Whether `battles` already contains a pending or active battle between
/// `a` and `b` specifically.
fn has_pending_or_active_between(battles: &[Battle], a: ParticipantId, b: ParticipantId) -> bool {
    battles.iter().any(|battle| {
        matches!(battle.status, BattleStatus::Pending | BattleStatus::Active)
            && ((battle.player1 == a && battle.player2 == b) || (battle.player1 == b && battle.player2 == a))
    })
}

/// Creates a challenge from `challenger` to `target`. `challenger_battles`
/// and `target_battles` are every battle each participant is currently in
/// (any status); the caller fetches these from the repository.
pub fn create_challenge(
    challenger: &Participant,
    target: &Participant,
    fight_as_bot: bool,
    challenger_battles: &[Battle],
    target_battles: &[Battle],
    config: &RuntimeConfig,
) -> Result<Battle, LifecycleError> {
    if has_pending_or_active_between(challenger_battles, challenger.id, target.id) {
        return Err(LifecycleError::AlreadyInBattle);
    }
    if has_active_battle_vs_human(challenger_battles) {
        return Err(LifecycleError::AlreadyInBattle);
    }
    if has_active_battle_vs_human(target_battles) {
        return Err(LifecycleError::AlreadyInBattle);
    }
    if fight_as_bot && !target.allow_bot_challenges {
        return Err(LifecycleError::BotChallengesDisabled);
    }

    let now = config::now_unix();
    let mut battle = Battle {
        id: BattleId::new(),
        player1: challenger.id,
        player2: target.id,
        status: BattleStatus::Pending,
        winner: None,
        player2_is_ai_controlled: fight_as_bot,
        hp: RoleMap::both(0),
        max_hp: RoleMap::both(0),
        momentum: RoleMap::both(0),
        stat_stages: RoleMap::new(StatStages::new(), StatStages::new()),
        custom_statuses: RoleMap::new(CustomStatuses::new(), CustomStatuses::new()),
        turn_number: 1,
        whose_turn: Role::Player1,
        battle_attacks: RoleMap::new(vec![], vec![]),
        attacks_used: RoleMap::new(HashSet::new(), HashSet::new()),
        registered_scripts: vec![],
        event_log: vec![],
        created_at: now,
        updated_at: now,
    };

    if fight_as_bot {
        initialize_active_state(&mut battle, challenger, target, config);
        battle.status = BattleStatus::Active;
    }

    tracing::info!(battle_id = %battle.id, challenger_id = %challenger.id, target_id = %target.id, fight_as_bot, status = ?battle.status, "battle challenge created");
    Ok(battle)
}

/// Accept (spec.md §4.6 "Activate"). Only `player2` may accept, and only
/// while `pending`. Re-checks the active-vs-human constraint.
pub fn activate(
    battle: &mut Battle,
    acting: ParticipantId,
    player1: &Participant,
    player2: &Participant,
    acting_participant_battles: &[Battle],
    config: &RuntimeConfig,
) -> Result<(), LifecycleError> {
    if battle.status != BattleStatus::Pending {
        return Err(LifecycleError::NotPending);
    }
    if acting != battle.player2 {
        return Err(LifecycleError::NotOwner);
    }
    if has_active_battle_vs_human(acting_participant_battles) {
        return Err(LifecycleError::AlreadyInBattle);
    }

    initialize_active_state(battle, player1, player2, config);
    battle.status = BattleStatus::Active;
    battle.updated_at = config::now_unix();
    tracing::info!(battle_id = %battle.id, "battle activated");
    Ok(())
}

/// Freezes loadouts and resets per-battle mutable state (spec.md §4.6
/// "Initialization on activation").
fn initialize_active_state(battle: &mut Battle, player1: &Participant, player2: &Participant, config: &RuntimeConfig) {
    battle.battle_attacks = RoleMap::new(player1.selected.clone(), player2.selected.clone());
    battle.hp = RoleMap::new(player1.base_stats.hp, player2.base_stats.hp);
    battle.max_hp = RoleMap::new(player1.base_stats.hp, player2.base_stats.hp);
    battle.stat_stages = RoleMap::new(StatStages::new(), StatStages::new());
    battle.custom_statuses = RoleMap::new(CustomStatuses::new(), CustomStatuses::new());
    battle.registered_scripts = vec![];
    battle.event_log = vec![];
    battle.attacks_used = RoleMap::new(HashSet::new(), HashSet::new());
    battle.momentum = RoleMap::both(config.base_momentum);
    battle.turn_number = 1;
    battle.whose_turn = Role::Player1;
}

/// Only `player1`, only while `pending`. Caller deletes the record.
pub fn cancel(battle: &Battle, acting: ParticipantId) -> Result<(), LifecycleError> {
    if battle.status != BattleStatus::Pending {
        return Err(LifecycleError::NotPending);
    }
    if acting != battle.player1 {
        return Err(LifecycleError::NotOwner);
    }
    tracing::info!(battle_id = %battle.id, "battle challenge cancelled");
    Ok(())
}

/// Only `player2`, only while `pending`: status becomes `declined`.
pub fn decline(battle: &mut Battle, acting: ParticipantId) -> Result<(), LifecycleError> {
    if battle.status != BattleStatus::Pending {
        return Err(LifecycleError::NotPending);
    }
    if acting != battle.player2 {
        return Err(LifecycleError::NotOwner);
    }
    battle.status = BattleStatus::Declined;
    battle.updated_at = config::now_unix();
    tracing::info!(battle_id = %battle.id, "battle challenge declined");
    Ok(())
}

/// Only a participant of an `active` battle. Sets `finished`, winner is
/// the opponent, and returns the winning role so the caller can run the
/// §4.9 reward path.
pub fn concede(battle: &mut Battle, acting: ParticipantId) -> Result<Role, LifecycleError> {
    if battle.status != BattleStatus::Active {
        return Err(LifecycleError::NotActive);
    }
    let Some(acting_role) = battle.role_of(acting) else {
        return Err(LifecycleError::NotOwner);
    };
    let winner = acting_role.other();
    battle.status = BattleStatus::Finished;
    battle.winner = Some(winner);
    battle.updated_at = config::now_unix();
    tracing::info!(battle_id = %battle.id, ?winner, "battle conceded");
    Ok(winner)
}

/// Pending battles older than `config.pending_battle_ttl_secs` are stale
/// and should be removed by the caller (djanmongo's pending-expiry sweep,
/// run opportunistically from the "list pending requests" path).
#[must_use]
pub fn reap_stale_pending(battles: &[Battle], config: &RuntimeConfig, now: i64) -> Vec<BattleId> {
    battles
        .iter()
        .filter(|b| b.status == BattleStatus::Pending && now - b.created_at > config.pending_battle_ttl_secs)
        .map(|b| b.id)
        .collect()
}

/// Builds a `participant_id -> involving battles` index once, so callers
/// driving many lifecycle checks don't rescan the full battle list per
/// participant (e.g. reaping, or batch-checking a leaderboard page).
#[must_use]
pub fn index_by_participant(battles: &[Battle]) -> HashMap<ParticipantId, Vec<Battle>> {
    let mut index: HashMap<ParticipantId, Vec<Battle>> = HashMap::new();
    for battle in battles {
        index.entry(battle.player1).or_default().push(battle.clone());
        index.entry(battle.player2).or_default().push(battle.clone());
    }
    index
}
