//! [`Attack`] and [`Script`] entities (spec.md §3).

use serde::{Deserialize, Serialize};

use super::ids::{AttackId, ParticipantId, ScriptId};

/// Who a registered script's trigger is evaluated relative to, taken
/// from the attack that registered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerWho {
    Me,
    Enemy,
    Any,
}

/// The pipeline phase a script fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerWhen {
    OnUse,
    BeforeTurn,
    AfterTurn,
    BeforeAttack,
    AfterAttack,
}

/// Whether a registered script fires once or persists until unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerDuration {
    Once,
    Persistent,
}

/// `(who, when, duration)` — see spec.md §3 and the GLOSSARY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDescriptor {
    pub who: TriggerWho,
    pub when: TriggerWhen,
    pub duration: TriggerDuration,
}

/// Error raised building or validating a [`Script`]/[`Attack`].
#[derive(Debug)]
pub enum AttackValidationError {
    NameTooLong { max: usize, got: usize },
    DescriptionTooLong { max: usize, got: usize },
    MomentumCostOutOfRange(i64),
    OnUseTriggerMalformed,
}

impl std::fmt::Display for AttackValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameTooLong { max, got } => {
                write!(f, "name too long: {got} chars (max {max})")
            }
            Self::DescriptionTooLong { max, got } => {
                write!(f, "description too long: {got} chars (max {max})")
            }
            Self::MomentumCostOutOfRange(v) => write!(f, "momentum_cost {v} not in [1,100]"),
            Self::OnUseTriggerMalformed => {
                write!(f, "ON_USE scripts must have who=ME and duration=ONCE")
            }
        }
    }
}

impl std::error::Error for AttackValidationError {}

pub const ATTACK_NAME_MAX: usize = 50;
pub const ATTACK_DESCRIPTION_MAX: usize = 150;

/// A single sandboxed behavior owned by exactly one [`Attack`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub id: ScriptId,
    pub name: String,
    pub source: String,
    pub tooltip: String,
    pub trigger: TriggerDescriptor,
}

impl Script {
    /// Enforces the invariant from spec.md §3: `ON_USE` implies
    /// `who = ME` and `duration = ONCE`.
    pub fn validate(&self) -> Result<(), AttackValidationError> {
        if self.trigger.when == TriggerWhen::OnUse
            && (self.trigger.who != TriggerWho::Me || self.trigger.duration != TriggerDuration::Once)
        {
            return Err(AttackValidationError::OnUseTriggerMalformed);
        }
        Ok(())
    }
}

/// A named, costed move a [`crate::contracts::participant::Participant`]
/// can learn and use in battle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attack {
    pub id: AttackId,
    pub name: String,
    pub description: String,
    pub icon: char,
    pub momentum_cost: u8,
    /// Weak reference: deletion of the creator nulls this but the attack
    /// itself is preserved (spec.md §3 ownership rules).
    pub creator: Option<ParticipantId>,
    pub scripts: Vec<Script>,
}

impl Attack {
    pub fn validate(&self) -> Result<(), AttackValidationError> {
        if self.name.chars().count() > ATTACK_NAME_MAX {
            return Err(AttackValidationError::NameTooLong {
                max: ATTACK_NAME_MAX,
                got: self.name.chars().count(),
            });
        }
        if self.description.chars().count() > ATTACK_DESCRIPTION_MAX {
            return Err(AttackValidationError::DescriptionTooLong {
                max: ATTACK_DESCRIPTION_MAX,
                got: self.description.chars().count(),
            });
        }
        if !(1..=100).contains(&self.momentum_cost) {
            return Err(AttackValidationError::MomentumCostOutOfRange(
                i64::from(self.momentum_cost),
            ));
        }
        for script in &self.scripts {
            script.validate()?;
        }
        Ok(())
    }
}
