//! Candidate parsing, sanitization, and per-candidate validation
//! (spec.md §4.8 steps 5–6).

use std::collections::HashSet;

use serde::Deserialize;

use crate::contracts::attack::{
    Attack, Script, TriggerDescriptor, TriggerDuration, TriggerWhen, TriggerWho,
    ATTACK_DESCRIPTION_MAX, ATTACK_NAME_MAX,
};
use crate::contracts::ids::{AttackId, ParticipantId, ScriptId};
use crate::scripting::sandbox::contains_forbidden_token;

const MAX_NAME_DEDUPE_SUFFIX: usize = 10;

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateScript {
    name: String,
    trigger_who: String,
    trigger_when: String,
    trigger_duration: String,
    lua_code: String,
    tooltip_description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateAttack {
    name: String,
    description: String,
    icon: String,
    momentum_cost: i64,
    scripts: Vec<CandidateScript>,
}

/// Strips a leading/trailing ```` ```json ```` (or bare ``` ```) fence,
/// then parses the remainder as a JSON array of candidate attacks.
pub(crate) fn parse_candidates(raw: &str) -> Result<Vec<CandidateAttack>, String> {
    let stripped = strip_markdown_fences(raw);
    serde_json::from_str(&stripped).map_err(|e| e.to_string())
}

fn strip_markdown_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Sanitizes and validates every candidate, dropping any that fail a
/// check entirely rather than persisting a partially-broken attack.
/// `existing_names` seeds the dedup set; names already used by
/// already-built candidates in this same batch count too.
pub(crate) fn sanitize_and_build(
    candidates: Vec<CandidateAttack>,
    creator: ParticipantId,
    existing_names: &HashSet<String>,
) -> Vec<Attack> {
    let mut used_names = existing_names.clone();
    let mut created = Vec::new();

    for candidate in candidates {
        if let Some(attack) = build_one(candidate, creator, &used_names) {
            used_names.insert(attack.name.clone());
            created.push(attack);
        }
    }

    created
}

fn build_one(candidate: CandidateAttack, creator: ParticipantId, used_names: &HashSet<String>) -> Option<Attack> {
    if !(1..=100).contains(&candidate.momentum_cost) {
        return None;
    }

    let mut scripts = Vec::with_capacity(candidate.scripts.len());
    for raw in candidate.scripts {
        scripts.push(build_script(raw)?);
    }

    let name = dedupe_name(sanitize_text(&candidate.name, ATTACK_NAME_MAX), used_names)?;
    let description = sanitize_text(&candidate.description, ATTACK_DESCRIPTION_MAX);
    let icon = candidate.icon.chars().next().unwrap_or('?');

    let attack = Attack {
        id: AttackId::new(),
        name,
        description,
        icon,
        momentum_cost: candidate.momentum_cost as u8,
        creator: Some(creator),
        scripts,
    };

    attack.validate().ok()?;
    Some(attack)
}

fn build_script(raw: CandidateScript) -> Option<Script> {
    if contains_forbidden_token(&raw.lua_code).is_some() {
        return None;
    }

    let who = parse_who(&raw.trigger_who)?;
    let when = parse_when(&raw.trigger_when)?;
    let duration = parse_duration(&raw.trigger_duration)?;

    // auto-correct ON_USE to (ME, ONCE) rather than rejecting the script.
    let (who, duration) = if when == TriggerWhen::OnUse {
        (TriggerWho::Me, TriggerDuration::Once)
    } else {
        (who, duration)
    };

    Some(Script {
        id: ScriptId::new(),
        name: sanitize_text(&raw.name, ATTACK_NAME_MAX),
        source: raw.lua_code,
        tooltip: sanitize_text(&raw.tooltip_description, ATTACK_DESCRIPTION_MAX),
        trigger: TriggerDescriptor { who, when, duration },
    })
}

fn parse_who(s: &str) -> Option<TriggerWho> {
    match s {
        "ME" => Some(TriggerWho::Me),
        "ENEMY" => Some(TriggerWho::Enemy),
        "ANY" => Some(TriggerWho::Any),
        _ => None,
    }
}

fn parse_when(s: &str) -> Option<TriggerWhen> {
    match s {
        "ON_USE" => Some(TriggerWhen::OnUse),
        "BEFORE_TURN" => Some(TriggerWhen::BeforeTurn),
        "AFTER_TURN" => Some(TriggerWhen::AfterTurn),
        "BEFORE_ATTACK" => Some(TriggerWhen::BeforeAttack),
        "AFTER_ATTACK" => Some(TriggerWhen::AfterAttack),
        _ => None,
    }
}

fn parse_duration(s: &str) -> Option<TriggerDuration> {
    match s {
        "ONCE" => Some(TriggerDuration::Once),
        "PERSISTENT" => Some(TriggerDuration::Persistent),
        _ => None,
    }
}

/// Strips `<...>` tag-like spans and truncates to `max` chars.
fn sanitize_text(input: &str, max: usize) -> String {
    let mut out = String::with_capacity(input.len());
    let mut inside_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => inside_tag = true,
            '>' => inside_tag = false,
            _ if !inside_tag => out.push(ch),
            _ => {}
        }
    }
    out.chars().take(max).collect()
}

/// `base`, then `base (2)` through `base (10)`; `None` if all are taken.
fn dedupe_name(base: String, used: &HashSet<String>) -> Option<String> {
    if !used.contains(&base) {
        return Some(base);
    }
    for n in 2..=MAX_NAME_DEDUPE_SUFFIX {
        let candidate = format!("{base} ({n})");
        if !used.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}
