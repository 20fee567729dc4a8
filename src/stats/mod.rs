//! Stats Aggregator & Rewards (C9): replays a finished battle's
//! `event_log` into `AttackUsageStats` deltas and computes the credit
//! rewards for both participants (spec.md §4.9). Storage-agnostic like
//! the rest of the core: callers fetch/persist the actual rows.


use std::collections::{HashMap, HashSet};

use crate::config::RuntimeConfig;
use crate::contracts::battle::{Battle, BattleStatus};
use crate::contracts::ids::AttackId;
use crate::contracts::log_entry::EffectType;
use crate::contracts::role::Role;
use crate::contracts::stats_entity::AttackUsageStats;

/// Per-attack deltas produced by replaying one battle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttackStatsDelta {
    pub times_used: u64,
    pub damage_dealt: i64,
    pub healing_done: i64,
    pub wins_vs_human: u64,
    pub losses_vs_human: u64,
    pub wins_vs_bot: u64,
    pub losses_vs_bot: u64,
    pub co_used_with: HashMap<AttackId, u64>,
}

/// Credits owed to one participant after a battle finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantReward {
    pub credits_delta: i64,
    pub won: bool,
}

/// Everything the post-battle hook (or `admin_recompute_all`) needs to
/// persist once a battle reaches `finished`.
#[derive(Debug, Clone, Default)]
pub struct BattleOutcomeDelta {
    pub attack_deltas: HashMap<AttackId, AttackStatsDelta>,
    pub winner: Role,
    pub rewards: HashMap<Role, ParticipantReward>,
    /// Total damage dealt by each role this battle, for
    /// `Participant.stats.total_damage_dealt` (spec.md:178
    /// `damage_dealt_by_role[source_role]`). Tracked independently of
    /// `attack_deltas` since it survives the attack itself being deleted.
    pub damage_dealt_by_role: HashMap<Role, i64>,
}

/// Replays `battle.event_log`, producing the stats deltas from spec.md
/// §4.9. Returns `None` if the battle is not `finished` or has no
/// recorded winner — there is nothing to aggregate yet. `known_attack_ids`
/// is the current attack catalog; a `source_attack_id` not in it means the
/// attack was deleted after the battle (spec.md:67), so that id's
/// attack-level stats are skipped with a warning rather than silently
/// aggregated into a row nobody can look up again.
#[must_use]
pub fn replay_battle(battle: &Battle, config: &RuntimeConfig, known_attack_ids: &HashSet<AttackId>) -> Option<BattleOutcomeDelta> {
    if battle.status != BattleStatus::Finished {
        return None;
    }
    let winner = battle.winner?;
    let loser = winner.other();

    // times_used counts once per (attack, battle): the set of attacks
    // each role has used this battle, built incrementally as `action`
    // entries are encountered (spec.md §9 open question, resolved to
    // "once per (attack, battle)").
    let mut used_by_role: HashMap<Role, HashSet<AttackId>> = HashMap::new();
    let mut deltas: HashMap<AttackId, AttackStatsDelta> = HashMap::new();
    let mut damage_dealt_by_role: HashMap<Role, i64> = HashMap::new();

    for entry in &battle.event_log {
        let Some(details) = &entry.effect_details else { continue };
        match entry.effect_type {
            EffectType::Action => {
                let (Some(id), Some(role)) = (details.source_attack_id, details.source_role) else { continue };
                if !known_attack_ids.contains(&id) {
                    tracing::warn!(attack_id = %id, "stat recalculation: action references a deleted attack; skipping its attack-level stats");
                    continue;
                }
                if used_by_role.entry(role).or_default().insert(id) {
                    deltas.entry(id).or_default().times_used += 1;
                }
            }
            EffectType::Damage => {
                if let (Some(role), Some(dealt)) = (details.source_role, details.damage_dealt.filter(|d| *d > 0)) {
                    *damage_dealt_by_role.entry(role).or_insert(0) += dealt;
                }
                let Some(id) = details.source_attack_id else { continue };
                if !known_attack_ids.contains(&id) {
                    tracing::warn!(attack_id = %id, "stat recalculation: damage entry references a deleted attack; skipping its attack-level stats");
                    continue;
                }
                if let Some(dealt) = details.damage_dealt.filter(|d| *d > 0) {
                    deltas.entry(id).or_default().damage_dealt += dealt;
                }
            }
            EffectType::Heal => {
                let Some(id) = details.source_attack_id else { continue };
                if !known_attack_ids.contains(&id) {
                    tracing::warn!(attack_id = %id, "stat recalculation: heal entry references a deleted attack; skipping its attack-level stats");
                    continue;
                }
                if let Some(change) = details.hp_change.filter(|c| *c > 0) {
                    deltas.entry(id).or_default().healing_done += change;
                }
            }
            _ => {}
        }
    }

    let is_vs_bot = battle.player2_is_ai_controlled;
    for (role, used) in &used_by_role {
        for &id in used {
            let delta = deltas.entry(id).or_default();
            match (*role == winner, is_vs_bot) {
                (true, true) => delta.wins_vs_bot += 1,
                (true, false) => delta.wins_vs_human += 1,
                (false, true) => delta.losses_vs_bot += 1,
                (false, false) => delta.losses_vs_human += 1,
            }
        }
    }

    for used in used_by_role.values() {
        for &id in used {
            for &other in used {
                if other != id {
                    *deltas.entry(id).or_default().co_used_with.entry(other).or_insert(0) += 1;
                }
            }
        }
    }

    let mut rewards = HashMap::new();
    rewards.insert(
        winner,
        ParticipantReward {
            credits_delta: if is_vs_bot { config.credits_win_vs_bot } else { config.credits_win_vs_human },
            won: true,
        },
    );
    rewards.insert(loser, ParticipantReward { credits_delta: config.credits_loss, won: false });

    Some(BattleOutcomeDelta { attack_deltas: deltas, winner, rewards, damage_dealt_by_role })
}

/// Merges one battle's delta onto a row, seeding a fresh
/// `AttackUsageStats` if `existing` is `None`. Pure merge, no I/O.
#[must_use]
pub fn apply_delta(existing: Option<AttackUsageStats>, attack_id: AttackId, delta: &AttackStatsDelta) -> AttackUsageStats {
    let mut stats = existing.unwrap_or_else(|| AttackUsageStats::new(attack_id));
    stats.times_used += delta.times_used;
    stats.wins_vs_human += delta.wins_vs_human;
    stats.losses_vs_human += delta.losses_vs_human;
    stats.wins_vs_bot += delta.wins_vs_bot;
    stats.losses_vs_bot += delta.losses_vs_bot;
    stats.total_damage_dealt += delta.damage_dealt;
    stats.total_healing_done += delta.healing_done;
    for (&other, &count) in &delta.co_used_with {
        *stats.co_used_with_counts.entry(other).or_insert(0) += count;
    }
    stats
}

/// Resets every `AttackUsageStats` row and replays every `finished`
/// battle from scratch (spec.md §9 "an admin operation must be able to
/// reset all AttackUsageStats and replay all finished battles"). Returns
/// the freshly computed rows, keyed by attack id; the caller overwrites
/// its repository wholesale with this map.
#[must_use]
pub fn admin_recompute_all(
    battles: &[Battle],
    config: &RuntimeConfig,
    known_attack_ids: &HashSet<AttackId>,
) -> HashMap<AttackId, AttackUsageStats> {
    let mut rows: HashMap<AttackId, AttackUsageStats> = HashMap::new();
    for battle in battles {
        let Some(outcome) = replay_battle(battle, config, known_attack_ids) else { continue };
        for (id, delta) in outcome.attack_deltas {
            let merged = apply_delta(rows.remove(&id), id, &delta);
            rows.insert(id, merged);
        }
    }
    rows
}

/// Sort key for `GET /leaderboard/attacks` (spec.md §6). Default is
/// `TimesUsed`, matching djanmongo's `order_by('-times_used')`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeaderboardSort {
    #[default]
    TimesUsed,
    Wins,
    Damage,
}

impl LeaderboardSort {
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "used" | "times_used" => Some(Self::TimesUsed),
            "wins" => Some(Self::Wins),
            "damage" => Some(Self::Damage),
            _ => None,
        }
    }

    fn key(self, row: &AttackUsageStats) -> u64 {
        match self {
            Self::TimesUsed => row.times_used,
            Self::Wins => row.wins_vs_human + row.wins_vs_bot,
            Self::Damage => row.total_damage_dealt.max(0) as u64,
        }
    }
}

/// Top `limit` rows by `sort`, descending. Ties keep `rows`' input order
/// (a stable sort), matching the "then by username" tie-break spirit of
/// the original leaderboard view without needing participant data here.
#[must_use]
pub fn leaderboard(rows: &[AttackUsageStats], sort: LeaderboardSort, limit: usize) -> Vec<AttackUsageStats> {
    let mut sorted: Vec<&AttackUsageStats> = rows.iter().collect();
    sorted.sort_by(|a, b| sort.key(b).cmp(&sort.key(a)));
    sorted.into_iter().take(limit).cloned().collect()
}
