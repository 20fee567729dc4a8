//! Attack Generation (C8): prompt build, LLM call, validation, credit
//! debit/refund, and persistence of the surviving candidates
//! (spec.md §4.8).

pub mod llm;
pub mod prompt;
pub mod validate;

#[cfg(test)]
mod tests;

use std::collections::HashSet;

use crate::contracts::attack::Attack;
use crate::contracts::ids::AttackId;
use crate::contracts::participant::Participant;

pub use llm::{LlmClient, LlmError};

#[derive(Debug)]
pub enum GenerationError {
    /// Caller's credit balance is below `attack_generation_cost`.
    InsufficientCredits { have: i64, need: i64 },
    /// A favorite-attack id the caller supplied is not in their learned set.
    FavoriteNotOwned(AttackId),
    /// The LLM call itself failed (network, timeout, blocked content).
    Llm(LlmError),
    /// The LLM's response was not parseable as the expected candidate shape.
    InvalidResponse(String),
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientCredits { have, need } => {
                write!(f, "insufficient credits: have {have}, need {need}")
            }
            Self::FavoriteNotOwned(id) => write!(f, "favorite attack {id} is not owned by caller"),
            Self::Llm(e) => write!(f, "llm error: {e}"),
            Self::InvalidResponse(msg) => write!(f, "invalid llm response: {msg}"),
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<LlmError> for GenerationError {
    fn from(e: LlmError) -> Self {
        Self::Llm(e)
    }
}

/// Result of a generation call: the attacks that survived validation
/// (possibly empty) plus whether the debited cost was refunded.
pub struct GenerationOutcome {
    pub created: Vec<Attack>,
    pub refunded: bool,
}

/// Runs the full pipeline from spec.md §4.8, steps 1–8. `favorites` are
/// the resolved [`Attack`] records for the ids the caller passed in
/// (the service layer fetches these; this module stays storage-agnostic),
/// already checked to be a subset of `caller.learned_attacks`.
/// `existing_names` is every attack name already in the system (for
/// dedup); `cost` is the current `GameConfiguration.attack_generation_cost`.
/// Debit/persist of that cost happens in the caller before this is
/// invoked (step 3 is "persist immediately", a side effect this function
/// cannot itself commit) — [`should_refund`] tells the caller whether to
/// undo it afterwards.
pub async fn generate_attacks(
    caller: &Participant,
    concept: &str,
    favorites: &[Attack],
    cost: i64,
    existing_names: &HashSet<String>,
    llm: &dyn LlmClient,
) -> Result<GenerationOutcome, GenerationError> {
    // Step 1: credit check.
    if caller.credits < cost {
        return Err(GenerationError::InsufficientCredits { have: caller.credits, need: cost });
    }

    // Step 2: favorites ownership.
    for attack in favorites {
        if !caller.learned_attacks.contains(&attack.id) {
            return Err(GenerationError::FavoriteNotOwned(attack.id));
        }
    }

    let prompt = prompt::build_prompt(concept, favorites);

    let raw = match llm.generate_attacks(&prompt).await {
        Ok(raw) => raw,
        Err(e) => return Err(e.into()),
    };

    let candidates = match validate::parse_candidates(&raw) {
        Ok(c) => c,
        Err(msg) => return Err(GenerationError::InvalidResponse(msg)),
    };

    let created = validate::sanitize_and_build(candidates, caller.id, existing_names);

    Ok(GenerationOutcome { created, refunded: false })
}

#[must_use]
pub fn should_refund(outcome_result: &Result<GenerationOutcome, GenerationError>) -> bool {
    match outcome_result {
        Err(_) => true,
        Ok(outcome) => outcome.created.is_empty(),
    }
}
