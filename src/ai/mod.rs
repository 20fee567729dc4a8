//! AI Driver (C7): plays the bot's turns until control returns to a
//! human (spec.md §4.7).


use crate::config::RuntimeConfig;
use crate::contracts::attack::Attack;
use crate::contracts::battle::{Battle, BattleStatus};
use crate::contracts::log_entry::{EffectType, LogEntry, LogSource};
use crate::contracts::role::Role;
use crate::math::Rng;
use crate::pipeline;
use crate::scripting::StaticInfo;

/// Currently the only AI-controlled role is `player2` when the battle was
/// created `fight_as_bot` (spec.md §4.7 "currently").
#[must_use]
fn is_ai_turn(battle: &Battle) -> bool {
    battle.player2_is_ai_controlled && battle.whose_turn == Role::Player2
}

/// Runs consecutive AI turns after the human's action has already been
/// applied, stopping when the battle ends or control returns to a human.
pub fn run_ai_turns(
    battle: &mut Battle,
    attacks: &[Attack],
    static_info: &StaticInfo,
    config: &RuntimeConfig,
    mut rng: Box<dyn Rng>,
) -> Box<dyn Rng> {
    while battle.status == BattleStatus::Active && is_ai_turn(battle) {
        let acting_role = battle.whose_turn;
        let loadout = battle.battle_attacks.get(acting_role).clone();

        let Some(attack_id) = pick_random_attack(&loadout, &mut *rng) else {
            battle.event_log.push(LogEntry::new(
                LogSource::System,
                EffectType::Info,
                format!("{acting_role:?} has no attacks to use; turn skipped"),
            ));
            force_turn_switch(battle);
            continue;
        };

        let (result, returned_rng) =
            pipeline::execute_action(battle, acting_role, attack_id, attacks, static_info, config, rng);
        rng = returned_rng;

        if let Err(err) = result {
            battle.event_log.push(LogEntry::new(
                LogSource::System,
                EffectType::Error,
                format!("AI turn for {acting_role:?} failed: {err}"),
            ));
            force_turn_switch(battle);
        }
    }
    rng
}

fn pick_random_attack(loadout: &[crate::contracts::ids::AttackId], rng: &mut dyn Rng) -> Option<crate::contracts::ids::AttackId> {
    if loadout.is_empty() {
        return None;
    }
    let index = rng.uniform_range_inclusive(0, loadout.len() as i64 - 1) as usize;
    Some(loadout[index])
}

/// Used when a pipeline call fails validation mid-AI-loop: flips control
/// without running momentum math, since the pipeline never touched state.
fn force_turn_switch(battle: &mut Battle) {
    battle.whose_turn = battle.whose_turn.other();
    battle.turn_number += 1;
}
