use super::*;
use crate::contracts::ids::AttackId;
use crate::contracts::participant::{BaseStats, ParticipantStats, ProfileBlob};
use std::collections::HashSet;

fn participant(hp: i64, allow_bot: bool, selected: Vec<AttackId>) -> Participant {
    Participant {
        id: ParticipantId::new(),
        display_name: "p".into(),
        base_stats: BaseStats { hp, attack: 100, defense: 100, speed: 100 },
        credits: 0,
        allow_bot_challenges: allow_bot,
        profile: ProfileBlob::default(),
        last_seen: 0,
        stats: ParticipantStats::default(),
        learned_attacks: selected.iter().copied().collect(),
        selected,
    }
}

fn bare_battle(p1: ParticipantId, p2: ParticipantId, status: BattleStatus, bot: bool, created_at: i64) -> Battle {
    Battle {
        id: BattleId::new(),
        player1: p1,
        player2: p2,
        status,
        winner: None,
        player2_is_ai_controlled: bot,
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
        created_at,
        updated_at: created_at,
    }
}

#[test]
fn create_challenge_succeeds_for_two_free_participants() {
    let challenger = participant(100, true, vec![]);
    let target = participant(100, true, vec![]);
    let config = RuntimeConfig::default();
    let battle = create_challenge(&challenger, &target, false, &[], &[], &config).unwrap();
    assert_eq!(battle.status, BattleStatus::Pending);
    assert_eq!(battle.player1, challenger.id);
    assert_eq!(battle.player2, target.id);
}

#[test]
fn fight_as_bot_creates_directly_active_and_initialized() {
    let challenger = participant(120, true, vec![AttackId::new()]);
    let target = participant(90, true, vec![]);
    let config = RuntimeConfig::default();
    let battle = create_challenge(&challenger, &target, true, &[], &[], &config).unwrap();
    assert_eq!(battle.status, BattleStatus::Active);
    assert!(battle.player2_is_ai_controlled);
    assert_eq!(battle.hp.player1, 120);
    assert_eq!(battle.hp.player2, 90);
    assert_eq!(battle.momentum.player1, config.base_momentum);
    assert_eq!(battle.battle_attacks.player1, challenger.selected);
}

#[test]
fn fight_as_bot_rejected_when_target_disallows() {
    let challenger = participant(100, true, vec![]);
    let target = participant(100, false, vec![]);
    let config = RuntimeConfig::default();
    let result = create_challenge(&challenger, &target, true, &[], &[], &config);
    assert!(matches!(result, Err(LifecycleError::BotChallengesDisabled)));
}

#[test]
fn duplicate_pending_challenge_between_same_pair_is_rejected() {
    let challenger = participant(100, true, vec![]);
    let target = participant(100, true, vec![]);
    let config = RuntimeConfig::default();
    let existing = bare_battle(challenger.id, target.id, BattleStatus::Pending, false, 0);
    let result = create_challenge(&challenger, &target, false, &[existing], &[], &config);
    assert!(matches!(result, Err(LifecycleError::AlreadyInBattle)));
}

#[test]
fn challenger_already_active_against_human_elsewhere_is_rejected() {
    let challenger = participant(100, true, vec![]);
    let target = participant(100, true, vec![]);
    let third = ParticipantId::new();
    let config = RuntimeConfig::default();
    let elsewhere = bare_battle(challenger.id, third, BattleStatus::Active, false, 0);
    let result = create_challenge(&challenger, &target, false, &[elsewhere], &[], &config);
    assert!(matches!(result, Err(LifecycleError::AlreadyInBattle)));
}

#[test]
fn activate_by_player2_initializes_state() {
    let p1 = participant(100, true, vec![AttackId::new()]);
    let p2 = participant(100, true, vec![AttackId::new(), AttackId::new()]);
    let config = RuntimeConfig::default();
    let mut battle = create_challenge(&p1, &p2, false, &[], &[], &config).unwrap();
    activate(&mut battle, p2.id, &p1, &p2, &[], &config).unwrap();
    assert_eq!(battle.status, BattleStatus::Active);
    assert_eq!(battle.hp.player1, 100);
    assert_eq!(battle.momentum.player1, config.base_momentum);
    assert_eq!(battle.battle_attacks.player2.len(), 2);
    assert_eq!(battle.whose_turn, Role::Player1);
}

#[test]
fn activate_by_non_player2_is_rejected() {
    let p1 = participant(100, true, vec![]);
    let p2 = participant(100, true, vec![]);
    let config = RuntimeConfig::default();
    let mut battle = create_challenge(&p1, &p2, false, &[], &[], &config).unwrap();
    let result = activate(&mut battle, p1.id, &p1, &p2, &[], &config);
    assert!(matches!(result, Err(LifecycleError::NotOwner)));
}

#[test]
fn cancel_only_allowed_for_player1_while_pending() {
    let p1 = ParticipantId::new();
    let p2 = ParticipantId::new();
    let battle = bare_battle(p1, p2, BattleStatus::Pending, false, 0);
    assert!(cancel(&battle, p1).is_ok());
    assert!(matches!(cancel(&battle, p2), Err(LifecycleError::NotOwner)));
}

#[test]
fn decline_transitions_to_declined() {
    let p1 = ParticipantId::new();
    let p2 = ParticipantId::new();
    let mut battle = bare_battle(p1, p2, BattleStatus::Pending, false, 0);
    decline(&mut battle, p2).unwrap();
    assert_eq!(battle.status, BattleStatus::Declined);
}

#[test]
fn concede_sets_opponent_as_winner() {
    let p1 = ParticipantId::new();
    let p2 = ParticipantId::new();
    let mut battle = bare_battle(p1, p2, BattleStatus::Active, false, 0);
    let winner = concede(&mut battle, p1).unwrap();
    assert_eq!(winner, Role::Player2);
    assert_eq!(battle.status, BattleStatus::Finished);
    assert_eq!(battle.winner, Some(Role::Player2));
}

#[test]
fn concede_rejects_non_participant() {
    let p1 = ParticipantId::new();
    let p2 = ParticipantId::new();
    let stranger = ParticipantId::new();
    let mut battle = bare_battle(p1, p2, BattleStatus::Active, false, 0);
    assert!(matches!(concede(&mut battle, stranger), Err(LifecycleError::NotOwner)));
}

#[test]
fn reap_stale_pending_finds_only_expired_pending_battles() {
    let p1 = ParticipantId::new();
    let p2 = ParticipantId::new();
    let config = RuntimeConfig::default();
    let now = 10_000;
    let fresh = bare_battle(p1, p2, BattleStatus::Pending, false, now - 10);
    let stale = bare_battle(p1, p2, BattleStatus::Pending, false, now - config.pending_battle_ttl_secs - 1);
    let active_old = bare_battle(p1, p2, BattleStatus::Active, false, 0);
    let expired = reap_stale_pending(&[fresh, stale.clone(), active_old], &config, now);
    assert_eq!(expired, vec![stale.id]);
}
