use super::context::{RunContext, Snapshot, StaticInfo};
use super::*;
use crate::config::RuntimeConfig;
use crate::contracts::attack::{TriggerDuration, TriggerWhen, TriggerWho};
use crate::contracts::battle::{Battle, BattleStatus};
use crate::contracts::ids::{AttackId, BattleId, ParticipantId};
use crate::contracts::role::{Role, RoleMap};
use crate::math::rng::ScriptedRng;
use std::collections::{HashMap, HashSet};

fn dummy_battle() -> Battle {
    Battle {
        id: BattleId::new(),
        player1: ParticipantId::new(),
        player2: ParticipantId::new(),
        status: BattleStatus::Active,
        winner: None,
        player2_is_ai_controlled: false,
        hp: RoleMap::new(100, 100),
        max_hp: RoleMap::new(100, 100),
        momentum: RoleMap::new(50, 50),
        stat_stages: RoleMap::new(HashMap::new(), HashMap::new()),
        custom_statuses: RoleMap::new(HashMap::new(), HashMap::new()),
        turn_number: 1,
        whose_turn: Role::Player1,
        battle_attacks: RoleMap::new(vec![], vec![]),
        attacks_used: RoleMap::new(HashSet::new(), HashSet::new()),
        registered_scripts: vec![],
        event_log: vec![],
        created_at: 0,
        updated_at: 0,
    }
}

fn static_info(battle: &Battle) -> StaticInfo {
    StaticInfo::from_battle(
        battle,
        "Alice".into(),
        "Bob".into(),
        100,
        100,
        100,
        100,
        100,
        100,
    )
}

fn run_ctx() -> RunContext {
    RunContext {
        me_role: Role::Player1,
        enemy_role: Role::Player2,
        current_actor_role: Role::Player1,
        current_target_role: Role::Player2,
        context_role: Role::Player1,
        original_attacker_role: Role::Player1,
        original_target_role: Role::Player2,
        current_registration_id: None,
        current_turn: 1,
        script_start_turn: 1,
        trigger_who: TriggerWho::Me,
        trigger_when: TriggerWhen::OnUse,
        trigger_duration: TriggerDuration::Once,
        registering_attack_id: Some(AttackId::new()),
    }
}

fn run(source: &str) -> (Result<ExecutionOutcome, ScriptError>, Battle) {
    let battle = dummy_battle();
    let info = static_info(&battle);
    let snapshot = Snapshot::from_battle(&battle);
    let config = RuntimeConfig::default();
    let rng: Box<dyn Rng> = Box::new(ScriptedRng::constant(1.0));
    let (outcome, _rng) = execute(&info, snapshot, rng, run_ctx(), &config, source);
    (outcome, battle)
}

#[test]
fn plain_damage_script_reduces_enemy_hp() {
    let (outcome, _battle) = run("apply_std_damage(30, ENEMY_ROLE)");
    let outcome = outcome.expect("script should succeed");
    assert!(outcome.state_changed);
    assert!(outcome.snapshot.hp.player2 < 100);
    assert_eq!(outcome.snapshot.event_log.len(), 1);
}

#[test]
fn forbidden_os_call_is_rejected() {
    let (outcome, _battle) = run("os.execute('rm -rf /')");
    assert!(matches!(outcome, Err(ScriptError::ForbiddenToken("os."))));
}

#[test]
fn forbidden_require_is_rejected() {
    let (outcome, _battle) = run("require('socket')");
    assert!(matches!(outcome, Err(ScriptError::ForbiddenToken("require"))));
}

#[test]
fn global_g_is_unreachable_even_without_literal_match() {
    // _G literal is in the forbidden set, but even if it weren't, the
    // sandbox removes the global entirely.
    let (outcome, _battle) = run("return type(_G)");
    // The source-level scan catches the literal "_G" token first.
    assert!(matches!(outcome, Err(ScriptError::ForbiddenToken("_G"))));
}

#[test]
fn runtime_error_does_not_merge_state() {
    let (outcome, _battle) = run("apply_std_damage(30, ENEMY_ROLE); error('boom')");
    assert!(matches!(outcome, Err(ScriptError::Runtime(_))));
}

#[test]
fn set_and_get_custom_status_roundtrip() {
    let (outcome, _battle) = run(
        "set_custom_status(ENEMY_ROLE, 'Poisoned', 3)\n\
         return get_custom_status(ENEMY_ROLE, 'Poisoned')",
    );
    let outcome = outcome.expect("script should succeed");
    assert!(outcome.state_changed);
    assert_eq!(
        outcome.snapshot.custom_statuses.player2.get("Poisoned"),
        Some(&crate::contracts::battle::StatusValue::Int(3))
    );
}

#[test]
fn stat_stage_clamps_at_boundary_and_logs_info() {
    let battle = dummy_battle();
    let info = static_info(&battle);
    let mut snapshot = Snapshot::from_battle(&battle);
    snapshot
        .stat_stages
        .player2
        .insert(crate::contracts::log_entry::Stat::Defense, 6);
    let config = RuntimeConfig::default();
    let rng: Box<dyn Rng> = Box::new(ScriptedRng::constant(1.0));
    let (outcome, _rng) = execute(
        &info,
        snapshot,
        rng,
        run_ctx(),
        &config,
        "apply_std_stat_change('defense', 1, ENEMY_ROLE)",
    );
    let outcome = outcome.unwrap();
    assert_eq!(
        outcome.snapshot.stat_stages.player2[&crate::contracts::log_entry::Stat::Defense],
        6
    );
    assert_eq!(
        outcome.snapshot.event_log[0].effect_type,
        crate::contracts::log_entry::EffectType::Info
    );
}

#[test]
fn unregister_own_registration_during_on_use_is_a_noop_since_none_is_set() {
    // ON_USE scripts are never registered, so CURRENT_REGISTRATION_ID is nil
    // and unregister_script on it simply returns false.
    let (outcome, _battle) = run("return unregister_script(tostring(CURRENT_REGISTRATION_ID))");
    let outcome = outcome.unwrap();
    assert!(!outcome.state_changed);
}

#[test]
fn instruction_budget_terminates_infinite_loop() {
    let (outcome, _battle) = run("local i = 0\nwhile true do i = i + 1 end");
    assert!(matches!(
        outcome,
        Err(ScriptError::InstructionBudgetExceeded) | Err(ScriptError::Timeout)
    ));
}
