//! [`LogEntry`] — the append-only event-log record type (spec.md §3).

use serde::{Deserialize, Serialize};

use super::attack::{TriggerDuration, TriggerWhen, TriggerWho};
use super::ids::AttackId;
use super::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogSource {
    System,
    Script,
    Debug,
    Player1,
    Player2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectType {
    Action,
    Damage,
    Heal,
    StatChange,
    StatusApply,
    StatusRemove,
    StatusEffect,
    Info,
    Debug,
    Error,
    Faint,
    Momentum,
    Turnchange,
}

/// The stat a [`EffectType::StatChange`] entry modifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Attack,
    Defense,
    Speed,
}

impl Stat {
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "attack" => Some(Self::Attack),
            "defense" => Some(Self::Defense),
            "speed" => Some(Self::Speed),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Defense => "defense",
            Self::Speed => "speed",
        }
    }
}

/// Semantic bag of fields attached to a [`LogEntry`]. All fields are
/// optional; which ones are populated depends on `effect_type`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectDetails {
    pub attack_name: Option<String>,
    pub source_attack_id: Option<AttackId>,
    /// The role whose attack caused this effect, used by stats
    /// aggregation (spec.md §4.9) to attribute damage/heals/usage.
    pub source_role: Option<Role>,
    pub damage_dealt: Option<i64>,
    pub hp_change: Option<i64>,
    pub stat: Option<Stat>,
    pub modifier: Option<i32>,
    pub status_name: Option<String>,
    pub trigger_who: Option<TriggerWho>,
    pub trigger_when: Option<TriggerWhen>,
    pub trigger_duration: Option<TriggerDuration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub source: LogSource,
    pub text: String,
    pub effect_type: EffectType,
    pub effect_details: Option<EffectDetails>,
}

impl LogEntry {
    #[must_use]
    pub fn new(source: LogSource, effect_type: EffectType, text: impl Into<String>) -> Self {
        Self {
            source,
            text: text.into(),
            effect_type,
            effect_details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: EffectDetails) -> Self {
        self.effect_details = Some(details);
        self
    }
}
