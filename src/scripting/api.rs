//! The capability function table (spec.md §4.3) bound into the sandbox's
//! globals. This is the entire surface a script can touch; anything not
//! bound here simply doesn't exist from the script's point of view.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mlua::{Lua, Table, Value};

use crate::config::RuntimeConfig;
use crate::contracts::battle::StatusValue;
use crate::contracts::ids::{AttackId, RegistrationId};
use crate::contracts::log_entry::{EffectDetails, EffectType, LogEntry, LogSource, Stat};
use crate::contracts::role::Role;
use crate::math::{self, Rng};

use super::context::{RunContext, Snapshot, StaticInfo};

fn role_arg(v: Value) -> mlua::Result<Role> {
    match v {
        Value::String(s) => Role::from_str_opt(&s.to_str()?)
            .ok_or_else(|| mlua::Error::RuntimeError(format!("invalid role {:?}", s.to_str()))),
        other => Err(mlua::Error::RuntimeError(format!(
            "expected a role string, got {other:?}"
        ))),
    }
}

fn stat_arg(v: Value) -> mlua::Result<Stat> {
    match v {
        Value::String(s) => Stat::from_str_opt(&s.to_str()?)
            .ok_or_else(|| mlua::Error::RuntimeError(format!("invalid stat {:?}", s.to_str()))),
        other => Err(mlua::Error::RuntimeError(format!(
            "expected a stat string, got {other:?}"
        ))),
    }
}

fn effect_type_from_str(s: &str) -> EffectType {
    match s {
        "damage" => EffectType::Damage,
        "heal" => EffectType::Heal,
        "stat_change" => EffectType::StatChange,
        "status_apply" => EffectType::StatusApply,
        "status_remove" => EffectType::StatusRemove,
        "status_effect" => EffectType::StatusEffect,
        "debug" => EffectType::Debug,
        "error" => EffectType::Error,
        "faint" => EffectType::Faint,
        "momentum" => EffectType::Momentum,
        "turnchange" => EffectType::Turnchange,
        "action" => EffectType::Action,
        _ => EffectType::Info,
    }
}

fn log_source_from_str(s: &str) -> LogSource {
    match s {
        "player1" => LogSource::Player1,
        "player2" => LogSource::Player2,
        "debug" => LogSource::Debug,
        "system" => LogSource::System,
        _ => LogSource::Script,
    }
}

fn status_value_to_lua(lua: &Lua, v: &StatusValue) -> mlua::Result<Value> {
    Ok(match v {
        StatusValue::Int(i) => Value::Integer(*i),
        StatusValue::Bool(b) => Value::Boolean(*b),
        StatusValue::Text(s) => Value::String(lua.create_string(s)?),
    })
}

/// Parses a script-supplied `details?` table into an [`EffectDetails`]
/// (spec.md §3 "`effect_details` is a bag of semantic fields", §4.3
/// `log(text, effect_type?, source?, details?)`). `source_attack_id`/
/// `source_role` come from the running script's own context, not the
/// table, the same attribution every other capability function stamps.
fn details_from_table(table: &Table, source_attack_id: Option<AttackId>, source_role: Option<Role>) -> EffectDetails {
    let stat: Option<String> = table.get("stat").ok();
    EffectDetails {
        attack_name: table.get("attack_name").ok(),
        source_attack_id,
        source_role,
        damage_dealt: table.get("damage_dealt").ok(),
        hp_change: table.get("hp_change").ok(),
        stat: stat.as_deref().and_then(Stat::from_str_opt),
        modifier: table.get("mod").ok(),
        status_name: table.get("status_name").ok(),
        trigger_who: None,
        trigger_when: None,
        trigger_duration: None,
    }
}

fn log_entry_to_lua(lua: &Lua, entry: &LogEntry) -> mlua::Result<Table> {
    let t = lua.create_table()?;
    t.set("source", format!("{:?}", entry.source).to_lowercase())?;
    t.set("text", entry.text.clone())?;
    t.set("effect_type", format!("{:?}", entry.effect_type).to_lowercase())?;
    Ok(t)
}

/// Binds every capability function and injected global onto `lua`'s
/// global table. `snapshot` is mutated in place; `state_changed` flips to
/// `true` the first time any mutating call succeeds.
#[allow(clippy::too_many_lines)]
pub fn bind(
    lua: &Lua,
    static_info: &StaticInfo,
    run_ctx: RunContext,
    snapshot: Rc<RefCell<Snapshot>>,
    rng: Rc<RefCell<Box<dyn Rng>>>,
    config: RuntimeConfig,
    state_changed: Rc<Cell<bool>>,
) -> mlua::Result<()> {
    let globals = lua.globals();

    globals.set("ME_ROLE", run_ctx.original_attacker_role.as_str())?;
    globals.set("ENEMY_ROLE", run_ctx.original_target_role.as_str())?;
    globals.set("CURRENT_ACTOR_ROLE", run_ctx.current_actor_role.as_str())?;
    globals.set("CURRENT_TARGET_ROLE", run_ctx.current_target_role.as_str())?;
    globals.set("CONTEXT_ROLE", run_ctx.context_role.as_str())?;
    globals.set(
        "CURRENT_REGISTRATION_ID",
        run_ctx.current_registration_id.map(|r| r.to_string()),
    )?;
    globals.set("CURRENT_TURN", run_ctx.current_turn)?;
    globals.set("SCRIPT_START_TURN", run_ctx.script_start_turn)?;
    globals.set("ORIGINAL_ATTACKER_ROLE", run_ctx.original_attacker_role.as_str())?;
    globals.set("ORIGINAL_TARGET_ROLE", run_ctx.original_target_role.as_str())?;
    globals.set("CURRENT_TRIGGER_WHO", format!("{:?}", run_ctx.trigger_who).to_uppercase())?;
    globals.set("CURRENT_TRIGGER_WHEN", format!("{:?}", run_ctx.trigger_when).to_uppercase())?;
    globals.set(
        "CURRENT_TRIGGER_DURATION",
        format!("{:?}", run_ctx.trigger_duration).to_uppercase(),
    )?;
    globals.set("P1_HP", snapshot.borrow().hp.player1)?;
    globals.set("P2_HP", snapshot.borrow().hp.player2)?;

    // log(text, effect_type?, source?, details?)
    {
        let snapshot = snapshot.clone();
        let state_changed = state_changed.clone();
        let source_attack_id = run_ctx.registering_attack_id;
        let source_role = run_ctx.original_attacker_role;
        globals.set(
            "log",
            lua.create_function(
                move |_, (text, effect_type, source, details): (String, Option<String>, Option<String>, Option<Table>)| {
                    let mut entry = LogEntry::new(
                        source.map_or(LogSource::Script, |s| log_source_from_str(&s)),
                        effect_type.map_or(EffectType::Info, |e| effect_type_from_str(&e)),
                        text,
                    );
                    if let Some(details) = details {
                        entry = entry.with_details(details_from_table(&details, source_attack_id, Some(source_role)));
                    }
                    snapshot.borrow_mut().event_log.push(entry);
                    state_changed.set(true);
                    Ok(())
                },
            )?,
        )?;
    }

    // apply_std_damage(base_power, target_role) -> damage dealt
    {
        let snapshot = snapshot.clone();
        let rng = rng.clone();
        let config = config.clone();
        let static_info = static_info.clone();
        let state_changed = state_changed.clone();
        let source_attack_id = run_ctx.registering_attack_id;
        let source_role = run_ctx.original_attacker_role;
        globals.set(
            "apply_std_damage",
            lua.create_function(move |_, (base_power, target_role): (i64, Value)| {
                let target = role_arg(target_role)?;
                let attacker = target.other();
                let mut snap = snapshot.borrow_mut();
                let attacker_stage = *snap
                    .stat_stages
                    .get(attacker)
                    .get(&Stat::Attack)
                    .unwrap_or(&0);
                let target_stage = *snap
                    .stat_stages
                    .get(target)
                    .get(&Stat::Defense)
                    .unwrap_or(&0);
                let damage = math::compute_damage(
                    base_power,
                    *static_info.base_attack.get(attacker),
                    attacker_stage,
                    *static_info.base_defense.get(target),
                    target_stage,
                    &mut **rng.borrow_mut(),
                    &config,
                );
                let new_hp = (*snap.hp.get(target) - damage).max(0);
                snap.hp.set(target, new_hp);
                snap.event_log.push(
                    LogEntry::new(LogSource::Script, EffectType::Damage, format!("{damage} damage dealt"))
                        .with_details(EffectDetails {
                            damage_dealt: Some(damage),
                            source_attack_id,
                            source_role: Some(source_role),
                            ..Default::default()
                        }),
                );
                drop(snap);
                state_changed.set(true);
                Ok(damage)
            })?,
        )?;
    }

    // apply_std_hp_change(delta, target_role) -> actual delta applied
    {
        let snapshot = snapshot.clone();
        let static_info = static_info.clone();
        let state_changed = state_changed.clone();
        let source_attack_id = run_ctx.registering_attack_id;
        let source_role = run_ctx.original_attacker_role;
        globals.set(
            "apply_std_hp_change",
            lua.create_function(move |_, (delta, target_role): (i64, Value)| {
                let target = role_arg(target_role)?;
                let mut snap = snapshot.borrow_mut();
                let max_hp = *static_info.max_hp.get(target);
                let before = *snap.hp.get(target);
                let after = (before + delta).clamp(0, max_hp);
                let actual = after - before;
                snap.hp.set(target, after);
                let (effect_type, text) = if actual >= 0 {
                    (EffectType::Heal, format!("{actual} healing applied"))
                } else {
                    (EffectType::Damage, format!("{} damage applied", -actual))
                };
                snap.event_log.push(LogEntry::new(LogSource::Script, effect_type, text).with_details(
                    EffectDetails {
                        hp_change: Some(actual),
                        source_attack_id,
                        source_role: Some(source_role),
                        ..Default::default()
                    },
                ));
                drop(snap);
                state_changed.set(true);
                Ok(actual)
            })?,
        )?;
    }

    // apply_std_stat_change(stat, delta, target_role)
    {
        let snapshot = snapshot.clone();
        let config = config.clone();
        let state_changed = state_changed.clone();
        globals.set(
            "apply_std_stat_change",
            lua.create_function(move |_, (stat, delta, target_role): (Value, i32, Value)| {
                let stat = stat_arg(stat)?;
                let target = role_arg(target_role)?;
                let mut snap = snapshot.borrow_mut();
                let stages = snap.stat_stages.get_mut(target);
                let before = *stages.get(&stat).unwrap_or(&0);
                let after = (before + delta).clamp(config.stage_min, config.stage_max);
                stages.insert(stat, after);
                let entry = if after == before && delta != 0 {
                    LogEntry::new(
                        LogSource::Script,
                        EffectType::Info,
                        format!("{} stage already at limit", stat.as_str()),
                    )
                } else {
                    LogEntry::new(
                        LogSource::Script,
                        EffectType::StatChange,
                        format!("{} stage changed by {delta}", stat.as_str()),
                    )
                    .with_details(EffectDetails {
                        stat: Some(stat),
                        modifier: Some(after - before),
                        ..Default::default()
                    })
                };
                snap.event_log.push(entry);
                drop(snap);
                state_changed.set(true);
                Ok(after)
            })?,
        )?;
    }

    // get_stat_stage(role, stat)
    {
        let snapshot = snapshot.clone();
        globals.set(
            "get_stat_stage",
            lua.create_function(move |_, (role, stat): (Value, Value)| {
                let role = role_arg(role)?;
                let stat = stat_arg(stat)?;
                Ok(*snapshot.borrow().stat_stages.get(role).get(&stat).unwrap_or(&0))
            })?,
        )?;
    }

    // get_momentum(role)
    {
        let snapshot = snapshot.clone();
        globals.set(
            "get_momentum",
            lua.create_function(move |_, role: Value| Ok(*snapshot.borrow().momentum.get(role_arg(role)?)))?,
        )?;
    }

    // get_max_hp(role)
    {
        let static_info = static_info.clone();
        globals.set(
            "get_max_hp",
            lua.create_function(move |_, role: Value| Ok(*static_info.max_hp.get(role_arg(role)?)))?,
        )?;
    }

    // get_player_name(role) / get_player_id(role)
    {
        let static_info = static_info.clone();
        globals.set(
            "get_player_name",
            lua.create_function(move |_, role: Value| {
                Ok(static_info.participant_name.get(role_arg(role)?).clone())
            })?,
        )?;
    }
    {
        let static_info = static_info.clone();
        globals.set(
            "get_player_id",
            lua.create_function(move |_, role: Value| {
                Ok(static_info.participant_id.get(role_arg(role)?).to_string())
            })?,
        )?;
    }

    // has_custom_status / get_custom_status
    {
        let snapshot = snapshot.clone();
        globals.set(
            "has_custom_status",
            lua.create_function(move |_, (role, name): (Value, String)| {
                Ok(snapshot.borrow().custom_statuses.get(role_arg(role)?).contains_key(&name))
            })?,
        )?;
    }
    {
        let snapshot = snapshot.clone();
        globals.set(
            "get_custom_status",
            lua.create_function(move |lua, (role, name): (Value, String)| {
                let snap = snapshot.borrow();
                match snap.custom_statuses.get(role_arg(role)?).get(&name) {
                    Some(v) => status_value_to_lua(lua, v),
                    None => Ok(Value::Nil),
                }
            })?,
        )?;
    }

    // set_custom_status(role, name, value)
    {
        let snapshot = snapshot.clone();
        let state_changed = state_changed.clone();
        globals.set(
            "set_custom_status",
            lua.create_function(move |_, (role, name, value): (Value, String, Value)| {
                let role = role_arg(role)?;
                let status = match value {
                    Value::Integer(i) => StatusValue::Int(i),
                    Value::Number(n) => StatusValue::Int(n as i64),
                    Value::Boolean(b) => StatusValue::Bool(b),
                    Value::String(s) => StatusValue::Text(s.to_str()?.to_string()),
                    other => {
                        return Err(mlua::Error::RuntimeError(format!(
                            "unsupported custom status value: {other:?}"
                        )));
                    }
                };
                snapshot.borrow_mut().custom_statuses.get_mut(role).insert(name.clone(), status);
                snapshot.borrow_mut().event_log.push(
                    LogEntry::new(LogSource::Script, EffectType::StatusApply, format!("status {name} set"))
                        .with_details(EffectDetails {
                            status_name: Some(name),
                            ..Default::default()
                        }),
                );
                state_changed.set(true);
                Ok(())
            })?,
        )?;
    }

    // remove_custom_status(role, name)
    {
        let snapshot = snapshot.clone();
        let state_changed = state_changed.clone();
        globals.set(
            "remove_custom_status",
            lua.create_function(move |_, (role, name): (Value, String)| {
                let role = role_arg(role)?;
                let removed = snapshot.borrow_mut().custom_statuses.get_mut(role).remove(&name).is_some();
                if removed {
                    snapshot.borrow_mut().event_log.push(
                        LogEntry::new(
                            LogSource::Script,
                            EffectType::StatusRemove,
                            format!("status {name} removed"),
                        )
                        .with_details(EffectDetails {
                            status_name: Some(name),
                            ..Default::default()
                        }),
                    );
                    state_changed.set(true);
                }
                Ok(removed)
            })?,
        )?;
    }

    // modify_custom_status(role, name, delta) -> bool success
    {
        let snapshot = snapshot.clone();
        let state_changed = state_changed.clone();
        globals.set(
            "modify_custom_status",
            lua.create_function(move |_, (role, name, delta): (Value, String, i64)| {
                let role = role_arg(role)?;
                let mut snap = snapshot.borrow_mut();
                let statuses = snap.custom_statuses.get_mut(role);
                match statuses.get(&name) {
                    Some(StatusValue::Int(current)) => {
                        let updated = current + delta;
                        statuses.insert(name, StatusValue::Int(updated));
                        drop(snap);
                        state_changed.set(true);
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            })?,
        )?;
    }

    // unregister_script(registration_id) -> bool success
    {
        let snapshot = snapshot.clone();
        let state_changed = state_changed.clone();
        globals.set(
            "unregister_script",
            lua.create_function(move |_, registration_id: String| {
                let Ok(uuid) = uuid::Uuid::parse_str(&registration_id) else {
                    return Ok(false);
                };
                let target = RegistrationId(uuid);
                let mut snap = snapshot.borrow_mut();
                let before = snap.registered_scripts.len();
                snap.registered_scripts.retain(|r| r.registration_id != target);
                let removed = snap.registered_scripts.len() != before;
                drop(snap);
                if removed {
                    state_changed.set(true);
                }
                Ok(removed)
            })?,
        )?;
    }

    // get_log_entries()
    {
        let snapshot = snapshot.clone();
        globals.set(
            "get_log_entries",
            lua.create_function(move |lua, ()| {
                let snap = snapshot.borrow();
                let table = lua.create_table()?;
                for (i, entry) in snap.event_log.iter().enumerate() {
                    table.set(i + 1, log_entry_to_lua(lua, entry)?)?;
                }
                Ok(table)
            })?,
        )?;
    }

    // find_log_entry(filters) -> first matching entry or nil
    {
        let snapshot = snapshot.clone();
        globals.set(
            "find_log_entry",
            lua.create_function(move |lua, filters: Option<Table>| {
                let snap = snapshot.borrow();
                let effect_type_filter: Option<String> =
                    filters.as_ref().and_then(|f| f.get("effect_type").ok());
                let source_filter: Option<String> = filters.as_ref().and_then(|f| f.get("source").ok());
                for entry in &snap.event_log {
                    let et_ok = effect_type_filter
                        .as_ref()
                        .is_none_or(|want| effect_type_from_str(want) == entry.effect_type);
                    let src_ok = source_filter
                        .as_ref()
                        .is_none_or(|want| log_source_from_str(want) == entry.source);
                    if et_ok && src_ok {
                        return Ok(Value::Table(log_entry_to_lua(lua, entry)?));
                    }
                }
                Ok(Value::Nil)
            })?,
        )?;
    }

    // is_script_registered(filters) -> bool
    {
        let snapshot = snapshot.clone();
        globals.set(
            "is_script_registered",
            lua.create_function(move |_, filters: Option<Table>| {
                let snap = snapshot.borrow();
                let who_filter: Option<String> = filters.as_ref().and_then(|f| f.get("who").ok());
                let when_filter: Option<String> = filters.as_ref().and_then(|f| f.get("when").ok());
                let found = snap.registered_scripts.iter().any(|r| {
                    let who_ok = who_filter
                        .as_ref()
                        .is_none_or(|w| format!("{:?}", r.trigger_who).to_uppercase() == *w);
                    let when_ok = when_filter
                        .as_ref()
                        .is_none_or(|w| format!("{:?}", r.trigger_when).to_uppercase() == *w);
                    who_ok && when_ok
                });
                Ok(found)
            })?,
        )?;
    }

    Ok(())
}
