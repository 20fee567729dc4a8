//! [`AttackUsageStats`] — one-to-one with an [`crate::contracts::attack::Attack`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ids::AttackId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttackUsageStats {
    pub attack_id: AttackId,
    pub times_used: u64,
    pub wins_vs_human: u64,
    pub losses_vs_human: u64,
    pub wins_vs_bot: u64,
    pub losses_vs_bot: u64,
    pub total_damage_dealt: i64,
    pub total_healing_done: i64,
    pub co_used_with_counts: HashMap<AttackId, u64>,
}

impl AttackUsageStats {
    #[must_use]
    pub fn new(attack_id: AttackId) -> Self {
        Self {
            attack_id,
            ..Default::default()
        }
    }
}
