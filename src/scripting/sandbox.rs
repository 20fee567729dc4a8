//! Sandbox construction: a restricted `mlua` VM with no filesystem,
//! process, or dynamic-code-loading surface, plus a wall-clock and
//! instruction-count budget enforced through `mlua`'s instrumentation
//! hook (spec.md §5, §9 "Script runtime isolation" design note).

use std::cell::Cell;
use std::time::{Duration, Instant};

use mlua::{HookTriggers, Lua, StdLib, VmState};

use super::ScriptError;

/// Tokens that must never appear in a script source, checked both here
/// (defense in depth) and at generation-validation time (spec.md §4.8
/// step 6).
pub const FORBIDDEN_TOKENS: &[&str] = &[
    "os.",
    "io.",
    "package.",
    "require",
    "_G",
    "loadstring",
    "dofile",
    "loadfile",
];

/// Fast source-level check for the forbidden token set.
#[must_use]
pub fn contains_forbidden_token(source: &str) -> Option<&'static str> {
    FORBIDDEN_TOKENS.iter().find(|tok| source.contains(*tok)).copied()
}

/// Builds a fresh Lua VM with only `table`, `string`, `math`, and `utf8`
/// loaded — no `os`, `io`, `package`, `coroutine`, `debug`, or `ffi` — and
/// removes the handful of base-library globals that would otherwise let a
/// script load or require arbitrary code.
pub fn new_sandboxed_lua(wall_clock_budget: Duration, instruction_budget: u64) -> mlua::Result<Lua> {
    let libs = StdLib::TABLE | StdLib::STRING | StdLib::MATH | StdLib::UTF8;
    let lua = Lua::new_with(libs, mlua::LuaOptions::default())?;

    {
        let globals = lua.globals();
        for forbidden in ["load", "loadstring", "dofile", "loadfile", "require", "collectgarbage"] {
            let _ = globals.raw_remove(forbidden);
        }
        // `_G` self-reference would otherwise let scripts walk back to
        // every global removed above; drop it too.
        let _ = globals.raw_remove("_G");
    }

    let start = Instant::now();
    let steps = Cell::new(0u64);
    let _ = lua.set_hook(
        HookTriggers::new().every_nth_instruction(1000),
        move |_lua, _debug| {
            steps.set(steps.get() + 1000);
            if start.elapsed() > wall_clock_budget {
                return Err(mlua::Error::RuntimeError(ScriptError::Timeout.to_string()));
            }
            if steps.get() > instruction_budget {
                return Err(mlua::Error::RuntimeError(
                    ScriptError::InstructionBudgetExceeded.to_string(),
                ));
            }
            Ok(VmState::Continue)
        },
    );

    Ok(lua)
}
