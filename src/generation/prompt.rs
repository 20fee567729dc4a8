//! Deterministic prompt template for attack generation (spec.md §4.8
//! step 4): fixed instructions and API docs plus the caller's concept
//! and favorite attacks, so the same inputs always produce the same
//! prompt text.

use crate::contracts::attack::Attack;

const API_DOCS: &str = r#"You generate battle attacks for a turn-based PvP game. Respond with a
JSON array of exactly 6 attack objects and nothing else (no markdown
fences, no prose). Each object has this shape:

{
  "name": string (<= 50 chars),
  "description": string (<= 150 chars),
  "icon": single character,
  "momentum_cost": integer in [1, 100],
  "scripts": [
    {
      "name": string,
      "trigger_who": "ME" | "ENEMY" | "ANY",
      "trigger_when": "ON_USE" | "BEFORE_TURN" | "AFTER_TURN" | "BEFORE_ATTACK" | "AFTER_ATTACK",
      "trigger_duration": "ONCE" | "PERSISTENT",
      "lua_code": string,
      "tooltip_description": string
    }
  ]
}

An ON_USE script's trigger_who must be ME and trigger_duration must be
ONCE. A non-ON_USE script is not called directly; declaring one with
trigger_when BEFORE_TURN, AFTER_TURN, BEFORE_ATTACK, or AFTER_ATTACK
registers it to fire automatically on that phase, no call needed. Lua
code runs in a sandbox exposing apply_std_damage(base_power,
target_role), apply_std_hp_change(delta, target_role),
apply_std_stat_change(stat, delta, target_role), get_stat_stage,
get_momentum, get_max_hp, get_player_name, get_player_id,
has_custom_status, get_custom_status, set_custom_status,
remove_custom_status, modify_custom_status, unregister_script,
get_log_entries, find_log_entry, is_script_registered, log, ME_ROLE,
ENEMY_ROLE, and the standard table/string/math libraries only. Do not
reference os, io, package, require, _G, loadstring, dofile, or
loadfile."#;

/// Builds the full prompt text. `favorites` are the caller's favorite
/// attacks, already resolved from ids by the service layer.
#[must_use]
pub fn build_prompt(concept: &str, favorites: &[Attack]) -> String {
    let mut prompt = String::new();
    prompt.push_str(API_DOCS);
    prompt.push_str("\n\nConcept: ");
    prompt.push_str(concept);

    if favorites.is_empty() {
        prompt.push_str("\n\nThe caller has no favorite attacks to draw inspiration from.");
    } else {
        prompt.push_str("\n\nDraw inspiration from these favorite attacks:\n");
        for attack in favorites {
            prompt.push_str(&format!("- {}: {}\n", attack.name, attack.description));
        }
    }

    prompt
}
