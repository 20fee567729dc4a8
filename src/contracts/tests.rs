use super::attack::{Attack, AttackValidationError, Script, TriggerDescriptor, TriggerDuration, TriggerWhen, TriggerWho};
use super::ids::{AttackId, ScriptId};
use super::participant::{BaseStats, validate_stat_block};

fn make_script(when: TriggerWhen, who: TriggerWho, duration: TriggerDuration) -> Script {
    Script {
        id: ScriptId::new(),
        name: "s".into(),
        source: "".into(),
        tooltip: "t".into(),
        trigger: TriggerDescriptor { who, when, duration },
    }
}

#[test]
fn on_use_requires_me_and_once() {
    let bad = make_script(TriggerWhen::OnUse, TriggerWho::Enemy, TriggerDuration::Once);
    assert!(matches!(
        bad.validate(),
        Err(AttackValidationError::OnUseTriggerMalformed)
    ));

    let bad2 = make_script(TriggerWhen::OnUse, TriggerWho::Me, TriggerDuration::Persistent);
    assert!(bad2.validate().is_err());

    let good = make_script(TriggerWhen::OnUse, TriggerWho::Me, TriggerDuration::Once);
    assert!(good.validate().is_ok());
}

#[test]
fn non_on_use_triggers_are_unconstrained() {
    let s = make_script(TriggerWhen::AfterTurn, TriggerWho::Enemy, TriggerDuration::Persistent);
    assert!(s.validate().is_ok());
}

fn base_attack() -> Attack {
    Attack {
        id: AttackId::new(),
        name: "Slam".into(),
        description: "A slam".into(),
        icon: '*',
        momentum_cost: 20,
        creator: None,
        scripts: vec![],
    }
}

#[test]
fn attack_name_length_enforced() {
    let mut a = base_attack();
    a.name = "x".repeat(51);
    assert!(matches!(
        a.validate(),
        Err(AttackValidationError::NameTooLong { .. })
    ));
}

#[test]
fn attack_momentum_cost_range_enforced() {
    let mut a = base_attack();
    a.momentum_cost = 0;
    // momentum_cost is u8 so 0 is representable but invalid per [1,100].
    assert!(a.validate().is_err());
}

#[test]
fn stat_block_requires_sum_400_multiples_of_10_min_10() {
    assert!(validate_stat_block(&BaseStats {
        hp: 100,
        attack: 100,
        defense: 100,
        speed: 100
    })
    .is_ok());

    assert!(validate_stat_block(&BaseStats {
        hp: 105,
        attack: 100,
        defense: 100,
        speed: 95
    })
    .is_err());

    assert!(validate_stat_block(&BaseStats {
        hp: 5,
        attack: 135,
        defense: 130,
        speed: 130
    })
    .is_err());

    assert!(validate_stat_block(&BaseStats {
        hp: 100,
        attack: 100,
        defense: 100,
        speed: 90
    })
    .is_err());
}
