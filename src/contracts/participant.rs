//! [`Participant`] entity (spec.md §3).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::ids::{AttackId, ParticipantId};

pub const MAX_SELECTED_ATTACKS: usize = 6;
pub const STAT_POINT_BUY_TOTAL: i64 = 400;
pub const STAT_POINT_BUY_STEP: i64 = 10;
pub const STAT_POINT_BUY_MIN: i64 = 10;

/// Base {HP, ATK, DEF, SPD}, unmodified by in-battle stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: i64,
    pub attack: i64,
    pub defense: i64,
    pub speed: i64,
}

/// `prompt` + generated image bytes for a participant's profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileBlob {
    pub prompt: String,
    pub image: Vec<u8>,
}

/// Lifetime win/loss/damage counters mirrored onto the participant record
/// from [`crate::stats`] after each finished battle (spec.md §4.9).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ParticipantStats {
    pub wins_vs_human: u64,
    pub losses_vs_human: u64,
    pub wins_vs_bot: u64,
    pub losses_vs_bot: u64,
    pub total_damage_dealt: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    pub base_stats: BaseStats,
    pub credits: i64,
    pub allow_bot_challenges: bool,
    pub profile: ProfileBlob,
    /// Unix seconds of last activity.
    pub last_seen: i64,
    pub stats: ParticipantStats,
    pub learned_attacks: HashSet<AttackId>,
    pub selected: Vec<AttackId>,
}

/// Error raised validating a stat-point-buy block.
#[derive(Debug)]
pub enum StatValidationError {
    NotMultipleOfTen(&'static str, i64),
    BelowMinimum(&'static str, i64),
    SumMismatch { expected: i64, got: i64 },
}

impl std::fmt::Display for StatValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotMultipleOfTen(field, v) => {
                write!(f, "{field}={v} is not a multiple of {STAT_POINT_BUY_STEP}")
            }
            Self::BelowMinimum(field, v) => {
                write!(f, "{field}={v} is below the minimum of {STAT_POINT_BUY_MIN}")
            }
            Self::SumMismatch { expected, got } => {
                write!(f, "stat sum {got} does not equal required {expected}")
            }
        }
    }
}

impl std::error::Error for StatValidationError {}

/// Validates the `PATCH /users/me/stats` body: each stat a multiple of
/// 10, each at least 10, summing to exactly 400 (spec.md §6).
pub fn validate_stat_block(stats: &BaseStats) -> Result<(), StatValidationError> {
    for (name, value) in [
        ("hp", stats.hp),
        ("attack", stats.attack),
        ("defense", stats.defense),
        ("speed", stats.speed),
    ] {
        if value % STAT_POINT_BUY_STEP != 0 {
            return Err(StatValidationError::NotMultipleOfTen(name, value));
        }
        if value < STAT_POINT_BUY_MIN {
            return Err(StatValidationError::BelowMinimum(name, value));
        }
    }
    let sum = stats.hp + stats.attack + stats.defense + stats.speed;
    if sum != STAT_POINT_BUY_TOTAL {
        return Err(StatValidationError::SumMismatch {
            expected: STAT_POINT_BUY_TOTAL,
            got: sum,
        });
    }
    Ok(())
}

impl Participant {
    /// Validates a proposed `selected` loadout: at most
    /// [`MAX_SELECTED_ATTACKS`] attacks, all owned by this participant.
    pub fn validate_selection(&self, attack_ids: &[AttackId]) -> Result<(), String> {
        if attack_ids.len() > MAX_SELECTED_ATTACKS {
            return Err(format!(
                "selected attacks must be at most {MAX_SELECTED_ATTACKS}, got {}",
                attack_ids.len()
            ));
        }
        for id in attack_ids {
            if !self.learned_attacks.contains(id) {
                return Err(format!("attack {id} is not owned by participant {}", self.id));
            }
        }
        Ok(())
    }
}
