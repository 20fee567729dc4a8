//! Trigger Matcher & Registry (C4): selects which [`RegisteredScript`]s
//! fire for a given phase and acting role (spec.md §4.4), executes them
//! through [`crate::scripting`], and reconciles the registry afterwards.


use crate::config::RuntimeConfig;
use crate::contracts::attack::{Attack, Script, TriggerDuration, TriggerWhen, TriggerWho};
use crate::contracts::battle::RegisteredScript;
use crate::contracts::ids::{AttackId, RegistrationId, ScriptId};
use crate::contracts::log_entry::{EffectType, LogEntry, LogSource};
use crate::contracts::role::Role;
use crate::math::Rng;
use crate::scripting::{self, RunContext, ScriptError, Snapshot, StaticInfo};

/// Looks a script's Lua source up by `(attack_id, script_id)`. Implemented
/// by the caller (normally backed by [`crate::contracts::repository::AttackRepository`])
/// so this module stays storage-agnostic.
pub trait ScriptSource {
    fn find(&self, attack_id: AttackId, script_id: ScriptId) -> Option<Script>;
}

impl ScriptSource for &[Attack] {
    fn find(&self, attack_id: AttackId, script_id: ScriptId) -> Option<Script> {
        self.iter()
            .find(|a| a.id == attack_id)
            .and_then(|a| a.scripts.iter().find(|s| s.id == script_id).cloned())
    }
}

/// Whether a registration is eligible for phase `when` while the pipeline
/// is running its matching with `phase_actor` as the acting role.
#[must_use]
pub fn matches(reg: &RegisteredScript, when: TriggerWhen, phase_actor: Role) -> bool {
    if reg.trigger_when != when {
        return false;
    }
    match reg.trigger_who {
        TriggerWho::Me => phase_actor == reg.original_attacker_role,
        TriggerWho::Enemy => phase_actor == reg.original_target_role,
        TriggerWho::Any => true,
    }
}

/// The ordered set of registration ids eligible for this phase call,
/// fixed at the moment the phase starts (spec.md §4.4: iteration order is
/// insertion order of `registered_scripts`).
#[must_use]
pub fn select_for_phase(
    registered: &[RegisteredScript],
    when: TriggerWhen,
    phase_actor: Role,
) -> Vec<RegistrationId> {
    registered
        .iter()
        .filter(|r| matches(r, when, phase_actor))
        .map(|r| r.registration_id)
        .collect()
}

/// Outcome of running every script selected for one phase call.
pub enum PhaseResult {
    /// All selected scripts ran (or were skipped/removed) without either
    /// participant's HP crossing zero.
    Completed,
    /// A script execution brought `role`'s HP to zero or below; the
    /// caller must stop running scripts for the remainder of the turn.
    Fainted(Role),
}

/// Runs every script matching `(when, phase_actor)` against `snapshot` in
/// registration order, applying each one's working copy back onto
/// `snapshot` only on success, and stops early the moment a participant
/// faints (spec.md §4.5 Open Question: a mid-phase faint short-circuits
/// the remainder of the phase and every later phase this turn).
#[allow(clippy::too_many_arguments)]
pub fn run_phase(
    snapshot: &mut Snapshot,
    static_info: &StaticInfo,
    scripts: &dyn ScriptSource,
    when: TriggerWhen,
    phase_actor: Role,
    current_actor_role: Role,
    current_turn: u32,
    config: &RuntimeConfig,
    mut rng: Box<dyn Rng>,
) -> (PhaseResult, Box<dyn Rng>) {
    let selected = select_for_phase(&snapshot.registered_scripts, when, phase_actor);
    let mut to_remove_after_phase = Vec::new();

    for registration_id in selected {
        // An earlier script this phase may have unregistered this one
        // (or itself) via `unregister_script` — that mutation is live and
        // visible here immediately.
        let Some(reg) = snapshot
            .registered_scripts
            .iter()
            .find(|r| r.registration_id == registration_id)
            .cloned()
        else {
            continue;
        };

        let Some(script) = scripts.find(reg.source_attack_id, reg.script_id) else {
            tracing::warn!(
                registration_id = %reg.registration_id,
                attack_id = %reg.source_attack_id,
                script_id = %reg.script_id,
                "registered script references a deleted attack/script; unregistering"
            );
            snapshot.event_log.push(LogEntry::new(
                LogSource::System,
                EffectType::Error,
                format!(
                    "registered script {} references a deleted attack/script; unregistering",
                    reg.registration_id
                ),
            ));
            snapshot
                .registered_scripts
                .retain(|r| r.registration_id != registration_id);
            continue;
        };

        let run_ctx = RunContext {
            me_role: reg.original_attacker_role,
            enemy_role: reg.original_target_role,
            current_actor_role,
            current_target_role: current_actor_role.other(),
            context_role: phase_actor,
            original_attacker_role: reg.original_attacker_role,
            original_target_role: reg.original_target_role,
            current_registration_id: Some(reg.registration_id),
            current_turn,
            script_start_turn: reg.start_turn,
            trigger_who: reg.trigger_who,
            trigger_when: reg.trigger_when,
            trigger_duration: reg.trigger_duration,
            registering_attack_id: Some(reg.source_attack_id),
        };

        let working_copy = snapshot.clone();
        let (outcome, returned_rng) =
            scripting::execute(static_info, working_copy, rng, run_ctx, config, &script.source);
        rng = returned_rng;

        match outcome {
            Ok(outcome) if outcome.state_changed => {
                *snapshot = outcome.snapshot;
            }
            Ok(_) => {}
            Err(err) => {
                snapshot.event_log.push(log_script_error(&reg, &err));
            }
        }

        if reg.trigger_duration == TriggerDuration::Once {
            to_remove_after_phase.push(registration_id);
        }

        if snapshot.hp.player1 <= 0 {
            to_remove_after_phase
                .iter()
                .for_each(|id| retain_remove(snapshot, *id));
            return (PhaseResult::Fainted(Role::Player1), rng);
        }
        if snapshot.hp.player2 <= 0 {
            to_remove_after_phase
                .iter()
                .for_each(|id| retain_remove(snapshot, *id));
            return (PhaseResult::Fainted(Role::Player2), rng);
        }
    }

    for id in to_remove_after_phase {
        retain_remove(snapshot, id);
    }

    (PhaseResult::Completed, rng)
}

fn retain_remove(snapshot: &mut Snapshot, registration_id: RegistrationId) {
    snapshot
        .registered_scripts
        .retain(|r| r.registration_id != registration_id);
}

fn log_script_error(reg: &RegisteredScript, err: &ScriptError) -> LogEntry {
    LogEntry::new(
        LogSource::Script,
        EffectType::Error,
        format!("script {} failed: {err}", reg.script_id),
    )
}
