//! Turn Pipeline (C5): the five-phase state machine (spec.md §4.5), the
//! single entry point that advances a battle one action at a time.

#[cfg(test)]
mod tests;

use crate::config::RuntimeConfig;
use crate::contracts::attack::{Attack, TriggerWhen};
use crate::contracts::battle::{Battle, BattleStatus, RegisteredScript};
use crate::contracts::ids::{AttackId, RegistrationId};
use crate::contracts::log_entry::{EffectDetails, EffectType, LogEntry, LogSource, Stat};
use crate::contracts::role::Role;
use crate::math::{self, Rng};
use crate::registry::{self, PhaseResult};
use crate::scripting::{self, RunContext, Snapshot, StaticInfo};

#[derive(Debug)]
pub enum PipelineError {
    /// Battle is not `active` (spec.md §4.5 validation).
    NotActive,
    /// The submitting role does not hold `whose_turn`.
    WrongTurn,
    /// `attack_id` is not in the actor's frozen `battle_attacks`.
    UnknownAttack,
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotActive => write!(f, "battle is not active"),
            Self::WrongTurn => write!(f, "it is not this participant's turn"),
            Self::UnknownAttack => write!(f, "attack is not in the actor's loadout for this battle"),
        }
    }
}

impl std::error::Error for PipelineError {}

/// Result of one successful `execute_action` call.
pub struct ActionOutcome {
    /// Whether this action brought the battle to `finished`.
    pub finished: bool,
}

/// Runs one full turn-pipeline invocation for `attack_id` submitted by
/// `actor_role`. Mutates `battle` in place on success; on validation
/// failure `battle` is untouched. `attacks` is the full attack catalog
/// (deleted attacks simply absent) used both to resolve the chosen
/// attack's scripts and to back [`registry::ScriptSource`] for phases
/// that run from the registry.
#[allow(clippy::too_many_arguments)]
pub fn execute_action(
    battle: &mut Battle,
    actor_role: Role,
    attack_id: AttackId,
    attacks: &[Attack],
    static_info: &StaticInfo,
    config: &RuntimeConfig,
    mut rng: Box<dyn Rng>,
) -> (Result<ActionOutcome, PipelineError>, Box<dyn Rng>) {
    if battle.status != BattleStatus::Active {
        return (Err(PipelineError::NotActive), rng);
    }
    if battle.whose_turn != actor_role {
        return (Err(PipelineError::WrongTurn), rng);
    }
    if !battle.battle_attacks.get(actor_role).contains(&attack_id) {
        return (Err(PipelineError::UnknownAttack), rng);
    }

    let opposing_role = actor_role.other();
    let turn_number = battle.turn_number;
    let mut snapshot = Snapshot::from_battle(battle);
    let mut newly_used = None;

    tracing::debug!(battle_id = %battle.id, ?actor_role, %attack_id, turn_number, "turn pipeline started");

    macro_rules! run_phase {
        ($when:expr, $phase_actor:expr) => {{
            tracing::debug!(when = ?$when, phase_actor = ?$phase_actor, "running phase");
            let (result, returned_rng) = registry::run_phase(
                &mut snapshot,
                static_info,
                &attacks,
                $when,
                $phase_actor,
                actor_role,
                turn_number,
                config,
                rng,
            );
            rng = returned_rng;
            result
        }};
    }

    macro_rules! finish_if_fainted {
        ($result:expr) => {
            if let PhaseResult::Fainted(fainted) = $result {
                finalize(battle, snapshot, newly_used, actor_role, Some(fainted));
                return (Ok(ActionOutcome { finished: true }), rng);
            }
        };
    }

    let result = run_phase!(TriggerWhen::BeforeTurn, actor_role);
    finish_if_fainted!(result);

    let result = run_phase!(TriggerWhen::BeforeAttack, actor_role);
    finish_if_fainted!(result);

    tracing::debug!(?actor_role, %attack_id, "running on_use phase");
    let (on_use_fainted, returned_rng) = run_on_use_phase(
        &mut snapshot,
        static_info,
        attacks,
        attack_id,
        actor_role,
        opposing_role,
        turn_number,
        config,
        rng,
    );
    rng = returned_rng;
    newly_used = Some(attack_id);
    if let Some(fainted) = on_use_fainted {
        finalize(battle, snapshot, newly_used, actor_role, Some(fainted));
        return (Ok(ActionOutcome { finished: true }), rng);
    }

    let result = run_phase!(TriggerWhen::AfterAttack, actor_role);
    finish_if_fainted!(result);
    let result = run_phase!(TriggerWhen::AfterAttack, opposing_role);
    finish_if_fainted!(result);

    let chosen_attack = attacks.iter().find(|a| a.id == attack_id);
    let momentum_cost = chosen_attack.map_or(1, |a| i64::from(a.momentum_cost));
    let attacker_spd_stage = *snapshot
        .stat_stages
        .get(actor_role)
        .get(&Stat::Speed)
        .unwrap_or(&0);
    let attacker_spd = math::modified_stat(*static_info.base_speed.get(actor_role), attacker_spd_stage, config);
    let (min_cost, max_cost) = math::momentum_cost_range(momentum_cost, attacker_spd, config);
    let actual_cost = math::draw_momentum_cost(min_cost, max_cost, &mut *rng);

    let actor_momentum = *snapshot.momentum.get(actor_role);
    let mut switched = false;
    if actor_momentum >= actual_cost {
        snapshot.momentum.set(actor_role, actor_momentum - actual_cost);
    } else {
        let overflow = actual_cost - actor_momentum;
        snapshot.momentum.set(actor_role, 0);
        let opponent_momentum = *snapshot.momentum.get(opposing_role);
        snapshot.momentum.set(opposing_role, opponent_momentum + overflow);
        switched = true;
    }
    snapshot.event_log.push(
        LogEntry::new(
            LogSource::System,
            EffectType::Momentum,
            format!("{actor_role:?} spent {actual_cost} momentum"),
        )
        .with_details(EffectDetails {
            modifier: Some(i32::try_from(actual_cost).unwrap_or(i32::MAX)),
            ..Default::default()
        }),
    );

    let mut new_turn_number = turn_number;
    let mut new_whose_turn = actor_role;
    if switched {
        new_whose_turn = opposing_role;
        new_turn_number += 1;
        tracing::debug!(battle_id = %battle.id, from = ?actor_role, to = ?opposing_role, new_turn_number, "turn switched");
        snapshot.event_log.push(LogEntry::new(
            LogSource::System,
            EffectType::Turnchange,
            format!("turn passes to {opposing_role:?}"),
        ));
    }

    let result = run_phase!(TriggerWhen::AfterTurn, actor_role);
    finish_if_fainted!(result);
    let result = run_phase!(TriggerWhen::AfterTurn, opposing_role);
    finish_if_fainted!(result);

    battle.whose_turn = new_whose_turn;
    battle.turn_number = new_turn_number;
    finalize(battle, snapshot, newly_used, actor_role, None);

    (Ok(ActionOutcome { finished: false }), rng)
}

/// Executes phase 3 (spec.md §4.5 step 3): `ON_USE` scripts run
/// immediately, everything else is registered. Returns the fainted role,
/// if any, so the caller can short-circuit.
#[allow(clippy::too_many_arguments)]
fn run_on_use_phase(
    snapshot: &mut Snapshot,
    static_info: &StaticInfo,
    attacks: &[Attack],
    attack_id: AttackId,
    actor_role: Role,
    opposing_role: Role,
    turn_number: u32,
    config: &RuntimeConfig,
    mut rng: Box<dyn Rng>,
) -> (Option<Role>, Box<dyn Rng>) {
    let Some(attack) = attacks.iter().find(|a| a.id == attack_id) else {
        snapshot.event_log.push(LogEntry::new(
            LogSource::System,
            EffectType::Error,
            format!("attack {attack_id} used this turn no longer exists; no scripts ran"),
        ));
        return (None, rng);
    };

    snapshot.event_log.push(
        LogEntry::new(LogSource::Script, EffectType::Action, format!("{actor_role:?} used {}", attack.name))
            .with_details(EffectDetails {
                attack_name: Some(attack.name.clone()),
                source_attack_id: Some(attack.id),
                source_role: Some(actor_role),
                ..Default::default()
            }),
    );

    for script in &attack.scripts {
        if script.trigger.when == TriggerWhen::OnUse {
            let run_ctx = RunContext {
                me_role: actor_role,
                enemy_role: opposing_role,
                current_actor_role: actor_role,
                current_target_role: opposing_role,
                context_role: actor_role,
                original_attacker_role: actor_role,
                original_target_role: opposing_role,
                current_registration_id: None,
                current_turn: turn_number,
                script_start_turn: turn_number,
                trigger_who: script.trigger.who,
                trigger_when: script.trigger.when,
                trigger_duration: script.trigger.duration,
                registering_attack_id: Some(attack.id),
            };
            let working_copy = snapshot.clone();
            let (outcome, returned_rng) =
                scripting::execute(static_info, working_copy, rng, run_ctx, config, &script.source);
            rng = returned_rng;
            match outcome {
                Ok(outcome) if outcome.state_changed => *snapshot = outcome.snapshot,
                Ok(_) => {}
                Err(err) => snapshot.event_log.push(LogEntry::new(
                    LogSource::Script,
                    EffectType::Error,
                    format!("on_use script {} failed: {err}", script.id),
                )),
            }
        } else {
            snapshot.registered_scripts.push(RegisteredScript {
                registration_id: RegistrationId::new(),
                script_id: script.id,
                source_attack_id: attack.id,
                trigger_who: script.trigger.who,
                trigger_when: script.trigger.when,
                trigger_duration: script.trigger.duration,
                original_attacker_role: actor_role,
                original_target_role: opposing_role,
                start_turn: turn_number,
            });
        }

        if snapshot.hp.player1 <= 0 {
            return (Some(Role::Player1), rng);
        }
        if snapshot.hp.player2 <= 0 {
            return (Some(Role::Player2), rng);
        }
    }

    (None, rng)
}

/// Commits `snapshot` onto `battle`, applies the attacks-used bookkeeping,
/// and — if a role fainted — transitions the battle to `finished`.
fn finalize(
    battle: &mut Battle,
    mut snapshot: Snapshot,
    newly_used: Option<AttackId>,
    actor_role: Role,
    fainted: Option<Role>,
) {
    if let Some(role) = fainted {
        if battle.status != BattleStatus::Finished {
            let winner = role.other();
            snapshot.event_log.push(
                LogEntry::new(LogSource::System, EffectType::Faint, format!("{role:?} has fainted"))
                    .with_details(EffectDetails::default()),
            );
            battle.status = BattleStatus::Finished;
            battle.winner = Some(winner);
        }
    }

    snapshot.apply_to(battle);
    if let Some(attack_id) = newly_used {
        battle.attacks_used.get_mut(actor_role).insert(attack_id);
    }
    battle.updated_at = crate::config::now_unix();
}
