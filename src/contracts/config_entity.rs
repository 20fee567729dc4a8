//! [`GameConfiguration`] — the enforced-singleton configuration row
//! (spec.md §3, §9 "Singleton configuration" design note).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GameConfiguration {
    pub attack_generation_cost: i64,
}

impl Default for GameConfiguration {
    fn default() -> Self {
        Self {
            attack_generation_cost: 1,
        }
    }
}
