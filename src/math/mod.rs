//! Momentum/Damage Math (C2): pure functions, deterministic except for
//! the explicitly-injected randomness (spec.md §4.2).

pub mod rng;

use crate::config::RuntimeConfig;
pub use rng::Rng;

/// Stage modifier table from spec.md §4.2, clamping `stage` to
/// `[config.stage_min, config.stage_max]` first.
#[must_use]
pub fn stage_modifier(stage: i32, config: &RuntimeConfig) -> f64 {
    let s = stage.clamp(config.stage_min, config.stage_max);
    match s.cmp(&0) {
        std::cmp::Ordering::Greater => (2.0 + f64::from(s)) / 2.0,
        std::cmp::Ordering::Less => 2.0 / (2.0 + f64::from(-s)),
        std::cmp::Ordering::Equal => 1.0,
    }
}

/// `max(1, floor(base * stage_modifier(stage)))`.
#[must_use]
pub fn modified_stat(base: i64, stage: i32, config: &RuntimeConfig) -> i64 {
    let modified = (base as f64 * stage_modifier(stage, config)).floor() as i64;
    modified.max(1)
}

/// Computes damage for a positive `base_power` using one random draw
/// from `rng` (spec.md §4.2). Callers must not re-roll.
#[must_use]
pub fn compute_damage(
    base_power: i64,
    attacker_atk: i64,
    attacker_atk_stage: i32,
    target_def: i64,
    target_def_stage: i32,
    rng: &mut dyn Rng,
    config: &RuntimeConfig,
) -> i64 {
    let effective_atk = modified_stat(attacker_atk, attacker_atk_stage, config);
    let effective_def = modified_stat(target_def, target_def_stage, config);

    let raw = (22.0 * base_power as f64 * effective_atk as f64 / effective_def as f64) / 50.0 + 2.0;
    let variance = config.damage_variance_min
        + rng.uniform() * (config.damage_variance_max - config.damage_variance_min);
    let final_damage = (raw * variance).floor() as i64;
    final_damage.max(1)
}

/// Inclusive `[min_cost, max_cost]` momentum-cost range for a base cost
/// `c` and a speed-stage-modified attacker SPD (spec.md §4.2).
#[must_use]
pub fn momentum_cost_range(base_cost: i64, attacker_spd_modified: i64, config: &RuntimeConfig) -> (i64, i64) {
    let ratio = attacker_spd_modified as f64 / 100.0;
    let modifier = if ratio <= 0.0 {
        config.momentum_cost_modifier_max
    } else {
        (1.0 / ratio).clamp(
            config.momentum_cost_modifier_min,
            config.momentum_cost_modifier_max,
        )
    };
    let adj = base_cost as f64 * modifier;
    let variance = adj * config.momentum_cost_variance_ratio;

    let min_cost = ((adj - variance).floor() as i64).max(1);
    let max_cost = ((adj + variance).ceil() as i64).max(1);
    if min_cost > max_cost {
        (max_cost, max_cost)
    } else {
        (min_cost, max_cost)
    }
}

/// Draws the actual momentum cost deducted this turn: a uniform integer
/// in `[min_cost, max_cost]`.
#[must_use]
pub fn draw_momentum_cost(min_cost: i64, max_cost: i64, rng: &mut dyn Rng) -> i64 {
    rng.uniform_range_inclusive(min_cost, max_cost)
}

#[cfg(test)]
mod tests;
