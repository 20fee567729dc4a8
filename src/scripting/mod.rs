//! Script Runtime & API (C3): a sandboxed `mlua` interpreter exposing the
//! fixed capability surface from spec.md §4.3 and nothing else.

pub mod api;
pub mod context;
pub mod sandbox;

#[cfg(test)]
mod tests;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

pub use context::{RunContext, Snapshot, StaticInfo};

use crate::config::RuntimeConfig;
use crate::math::Rng;

/// Failure modes for a single script execution (spec.md §4.3, §7).
#[derive(Debug)]
pub enum ScriptError {
    /// The source contains a token from [`sandbox::FORBIDDEN_TOKENS`].
    ForbiddenToken(&'static str),
    /// Exceeded the wall-clock budget (spec.md §5, default 250ms).
    Timeout,
    /// Exceeded the instruction-count budget.
    InstructionBudgetExceeded,
    /// Any other Lua syntax/semantic/API-misuse failure.
    Runtime(String),
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ForbiddenToken(tok) => write!(f, "script_forbidden_token:{tok}"),
            Self::Timeout => write!(f, "script_timeout"),
            Self::InstructionBudgetExceeded => write!(f, "script_instruction_budget_exceeded"),
            Self::Runtime(msg) => write!(f, "script_runtime_error:{msg}"),
        }
    }
}

impl std::error::Error for ScriptError {}

/// Result of a successful script run: the mutated working copy and
/// whether anything in it actually changed (spec.md §4.3 commit
/// semantics — the caller only merges this back if `state_changed`).
pub struct ExecutionOutcome {
    pub snapshot: Snapshot,
    pub state_changed: bool,
}

/// Runs `lua_source` against a fresh working copy cloned from
/// `snapshot_in`. Always returns ownership of the RNG regardless of
/// outcome, since a script that errors out partway still consumed random
/// draws that must not be replayed.
pub fn execute(
    static_info: &StaticInfo,
    snapshot_in: Snapshot,
    rng_in: Box<dyn Rng>,
    run_ctx: RunContext,
    config: &RuntimeConfig,
    lua_source: &str,
) -> (Result<ExecutionOutcome, ScriptError>, Box<dyn Rng>) {
    if let Some(tok) = sandbox::contains_forbidden_token(lua_source) {
        tracing::error!(token = tok, "script rejected: forbidden token");
        return (Err(ScriptError::ForbiddenToken(tok)), rng_in);
    }

    let lua = match sandbox::new_sandboxed_lua(
        Duration::from_millis(config.script_wall_clock_budget_ms),
        config.script_instruction_budget,
    ) {
        Ok(lua) => lua,
        Err(e) => return (Err(ScriptError::Runtime(e.to_string())), rng_in),
    };

    let rc_snapshot = Rc::new(RefCell::new(snapshot_in));
    let rc_rng = Rc::new(RefCell::new(rng_in));
    let state_changed = Rc::new(Cell::new(false));

    if let Err(e) = api::bind(
        &lua,
        static_info,
        run_ctx,
        rc_snapshot.clone(),
        rc_rng.clone(),
        config.clone(),
        state_changed.clone(),
    ) {
        drop(lua);
        let rng = Rc::try_unwrap(rc_rng)
            .unwrap_or_else(|_| unreachable!("api::bind failed; no closures retain the Rc"))
            .into_inner();
        return (Err(ScriptError::Runtime(e.to_string())), rng);
    }

    let exec_result = lua.load(lua_source).set_name("attack_script").exec();
    drop(lua);

    let rng = Rc::try_unwrap(rc_rng)
        .unwrap_or_else(|_| unreachable!("lua dropped; no closures retain the Rc"))
        .into_inner();

    match exec_result {
        Ok(()) => {
            let snapshot = Rc::try_unwrap(rc_snapshot)
                .unwrap_or_else(|_| unreachable!("lua dropped; no closures retain the Rc"))
                .into_inner();
            (
                Ok(ExecutionOutcome {
                    snapshot,
                    state_changed: state_changed.get(),
                }),
                rng,
            )
        }
        Err(e) => {
            let msg = e.to_string();
            let err = if msg.contains("script_timeout") {
                ScriptError::Timeout
            } else if msg.contains("script_instruction_budget_exceeded") {
                ScriptError::InstructionBudgetExceeded
            } else {
                ScriptError::Runtime(msg)
            };
            tracing::error!(error = %err, "script execution failed");
            (Err(err), rng)
        }
    }
}
