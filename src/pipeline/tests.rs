use super::*;
use crate::contracts::attack::{Script, TriggerDescriptor, TriggerDuration, TriggerWho};
use crate::contracts::battle::{CustomStatuses, StatStages};
use crate::contracts::ids::{AttackId, BattleId, ParticipantId, ScriptId};
use crate::contracts::role::RoleMap;
use crate::math::rng::ScriptedRng;
use std::collections::HashSet;

fn dummy_battle(p1_momentum: i64, whose_turn: Role) -> Battle {
    Battle {
        id: BattleId::new(),
        player1: ParticipantId::new(),
        player2: ParticipantId::new(),
        status: BattleStatus::Active,
        winner: None,
        player2_is_ai_controlled: false,
        hp: RoleMap::new(100, 100),
        max_hp: RoleMap::new(100, 100),
        momentum: RoleMap::new(p1_momentum, 50),
        stat_stages: RoleMap::new(StatStages::new(), StatStages::new()),
        custom_statuses: RoleMap::new(CustomStatuses::new(), CustomStatuses::new()),
        turn_number: 1,
        whose_turn,
        battle_attacks: RoleMap::new(vec![], vec![]),
        attacks_used: RoleMap::new(HashSet::new(), HashSet::new()),
        registered_scripts: vec![],
        event_log: vec![],
        created_at: 0,
        updated_at: 0,
    }
}

fn static_info(battle: &Battle) -> StaticInfo {
    StaticInfo::from_battle(battle, "Alice".into(), "Bob".into(), 100, 100, 100, 100, 100, 100)
}

fn attack(momentum_cost: u8, scripts: Vec<Script>) -> Attack {
    Attack {
        id: AttackId::new(),
        name: "Strike".into(),
        description: "test attack".into(),
        icon: '*',
        momentum_cost,
        creator: None,
        scripts,
    }
}

fn on_use_damage_script(power: i64) -> Script {
    Script {
        id: ScriptId::new(),
        name: "hit".into(),
        source: format!("apply_std_damage({power}, ENEMY_ROLE)"),
        tooltip: String::new(),
        trigger: TriggerDescriptor {
            who: TriggerWho::Me,
            when: TriggerWhen::OnUse,
            duration: TriggerDuration::Once,
        },
    }
}

#[test]
fn plain_damage_turn_keeps_control_when_momentum_suffices() {
    let mut battle = dummy_battle(50, Role::Player1);
    let atk = attack(20, vec![on_use_damage_script(30)]);
    battle.battle_attacks.player1 = vec![atk.id];
    let info = static_info(&battle);
    let config = RuntimeConfig::default();
    let rng: Box<dyn Rng> = Box::new(ScriptedRng::constant(1.0));

    let (result, _rng) = execute_action(&mut battle, Role::Player1, atk.id, &[atk], &info, &config, rng);
    let outcome = result.expect("action should succeed");
    assert!(!outcome.finished);
    assert_eq!(battle.whose_turn, Role::Player1);
    assert_eq!(battle.turn_number, 1);
    assert!(battle.hp.player2 < 100);
    assert!(battle.attacks_used.player1.len() == 1);
}

#[test]
fn overflow_momentum_switches_turn() {
    let mut battle = dummy_battle(5, Role::Player1);
    let atk = attack(50, vec![]);
    battle.battle_attacks.player1 = vec![atk.id];
    let info = static_info(&battle);
    let config = RuntimeConfig::default();
    let rng: Box<dyn Rng> = Box::new(ScriptedRng::constant(1.0));

    let (result, _rng) = execute_action(&mut battle, Role::Player1, atk.id, &[atk], &info, &config, rng);
    let outcome = result.expect("action should succeed");
    assert!(!outcome.finished);
    assert_eq!(battle.momentum.player1, 0);
    assert!(battle.momentum.player2 > 50);
    assert_eq!(battle.whose_turn, Role::Player2);
    assert_eq!(battle.turn_number, 2);
    assert!(battle
        .event_log
        .iter()
        .any(|e| e.effect_type == crate::contracts::log_entry::EffectType::Turnchange));
}

#[test]
fn lethal_on_use_script_finishes_the_battle() {
    let mut battle = dummy_battle(50, Role::Player1);
    let atk = attack(10, vec![on_use_damage_script(5000)]);
    battle.battle_attacks.player1 = vec![atk.id];
    let info = static_info(&battle);
    let config = RuntimeConfig::default();
    let rng: Box<dyn Rng> = Box::new(ScriptedRng::constant(1.0));

    let (result, _rng) = execute_action(&mut battle, Role::Player1, atk.id, &[atk], &info, &config, rng);
    let outcome = result.expect("action should succeed");
    assert!(outcome.finished);
    assert_eq!(battle.status, BattleStatus::Finished);
    assert_eq!(battle.winner, Some(Role::Player1));
    assert_eq!(battle.hp.player2, 0);
}

#[test]
fn wrong_turn_is_rejected_without_mutating_battle() {
    let mut battle = dummy_battle(50, Role::Player2);
    let atk = attack(10, vec![]);
    battle.battle_attacks.player1 = vec![atk.id];
    let info = static_info(&battle);
    let config = RuntimeConfig::default();
    let rng: Box<dyn Rng> = Box::new(ScriptedRng::constant(1.0));

    let (result, _rng) = execute_action(&mut battle, Role::Player1, atk.id, &[atk], &info, &config, rng);
    assert!(matches!(result, Err(PipelineError::WrongTurn)));
    assert_eq!(battle.turn_number, 1);
    assert!(battle.event_log.is_empty());
}

#[test]
fn attack_not_in_loadout_is_rejected() {
    let mut battle = dummy_battle(50, Role::Player1);
    let atk = attack(10, vec![]);
    let info = static_info(&battle);
    let config = RuntimeConfig::default();
    let rng: Box<dyn Rng> = Box::new(ScriptedRng::constant(1.0));

    let (result, _rng) = execute_action(&mut battle, Role::Player1, atk.id, &[atk], &info, &config, rng);
    assert!(matches!(result, Err(PipelineError::UnknownAttack)));
}

#[test]
fn non_on_use_script_is_registered_not_executed_immediately() {
    let persistent = Script {
        id: ScriptId::new(),
        name: "burn".into(),
        source: "apply_std_damage(5, ENEMY_ROLE)".into(),
        tooltip: String::new(),
        trigger: TriggerDescriptor {
            who: TriggerWho::Enemy,
            when: TriggerWhen::AfterTurn,
            duration: TriggerDuration::Persistent,
        },
    };
    let mut battle = dummy_battle(50, Role::Player1);
    let atk = attack(10, vec![persistent]);
    battle.battle_attacks.player1 = vec![atk.id];
    let info = static_info(&battle);
    let config = RuntimeConfig::default();
    let rng: Box<dyn Rng> = Box::new(ScriptedRng::constant(1.0));

    let (result, _rng) = execute_action(&mut battle, Role::Player1, atk.id, &[atk], &info, &config, rng);
    let outcome = result.expect("action should succeed");
    assert!(!outcome.finished);
    // AFTER_TURN already ran once this same turn (for both roles), so the
    // registration fires immediately and is consumed... but duration is
    // PERSISTENT, so it must still be present afterwards.
    assert_eq!(battle.registered_scripts.len(), 1);
}
