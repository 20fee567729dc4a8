use std::collections::HashSet;

use async_trait::async_trait;

use super::*;
use crate::contracts::ids::ParticipantId;
use crate::contracts::participant::{BaseStats, ParticipantStats, ProfileBlob};

fn caller(credits: i64, learned: Vec<AttackId>) -> Participant {
    Participant {
        id: ParticipantId::new(),
        display_name: "tester".into(),
        base_stats: BaseStats { hp: 100, attack: 100, defense: 100, speed: 100 },
        credits,
        allow_bot_challenges: true,
        profile: ProfileBlob::default(),
        last_seen: 0,
        stats: ParticipantStats::default(),
        learned_attacks: learned.iter().copied().collect(),
        selected: vec![],
    }
}

struct CannedClient(String);

#[async_trait]
impl LlmClient for CannedClient {
    async fn generate_attacks(&self, _prompt: &str) -> Result<String, LlmError> {
        Ok(self.0.clone())
    }
}

struct FailingClient;

#[async_trait]
impl LlmClient for FailingClient {
    async fn generate_attacks(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Timeout)
    }
}

fn one_attack_json(name: &str, lua: &str) -> String {
    format!(
        r#"{{
            "name": "{name}",
            "description": "test attack",
            "icon": "*",
            "momentum_cost": 20,
            "scripts": [{{
                "name": "hit",
                "trigger_who": "ME",
                "trigger_when": "ON_USE",
                "trigger_duration": "ONCE",
                "lua_code": "{lua}",
                "tooltip_description": "deals damage"
            }}]
        }}"#
    )
}

#[tokio::test]
async fn insufficient_credits_fails_before_any_llm_call() {
    let p = caller(5, vec![]);
    let client = FailingClient;
    let result = generate_attacks(&p, "a fire spirit", &[], 50, &HashSet::new(), &client).await;
    assert!(matches!(result, Err(GenerationError::InsufficientCredits { have: 5, need: 50 })));
}

#[tokio::test]
async fn favorite_not_owned_is_rejected() {
    let p = caller(100, vec![]);
    let not_owned = Attack {
        id: AttackId::new(),
        name: "Ghost".into(),
        description: "not owned".into(),
        icon: '?',
        momentum_cost: 10,
        creator: None,
        scripts: vec![],
    };
    let client = FailingClient;
    let result = generate_attacks(&p, "a fire spirit", std::slice::from_ref(&not_owned), 50, &HashSet::new(), &client).await;
    assert!(matches!(result, Err(GenerationError::FavoriteNotOwned(_))));
}

#[tokio::test]
async fn llm_failure_after_debit_is_reported_for_refund() {
    let p = caller(100, vec![]);
    let client = FailingClient;
    let result = generate_attacks(&p, "a fire spirit", &[], 50, &HashSet::new(), &client).await;
    assert!(result.is_err());
    assert!(should_refund(&result));
}

#[tokio::test]
async fn one_sandbox_breach_is_dropped_rest_survive() {
    let p = caller(100, vec![]);
    let mut attacks = Vec::new();
    for i in 0..5 {
        attacks.push(one_attack_json(&format!("Move {i}"), "apply_std_damage(5, ENEMY_ROLE)"));
    }
    attacks.push(one_attack_json("Breach", "os.execute('rm -rf /')"));
    let raw = format!("[{}]", attacks.join(","));

    let client = CannedClient(raw);
    let result = generate_attacks(&p, "a fire spirit", &[], 50, &HashSet::new(), &client).await;
    let outcome = result.unwrap();
    assert_eq!(outcome.created.len(), 5);
    assert!(outcome.created.iter().all(|a| a.name != "Breach"));
    assert!(!should_refund(&Ok::<_, GenerationError>(GenerationOutcome {
        created: outcome.created,
        refunded: outcome.refunded,
    })));
}

#[tokio::test]
async fn zero_survivors_refunds_even_with_enough_credits() {
    let p = caller(100, vec![]);
    let raw = format!("[{}]", one_attack_json("Breach", "os.execute('rm -rf /')"));
    let client = CannedClient(raw);
    let result = generate_attacks(&p, "a fire spirit", &[], 50, &HashSet::new(), &client).await;
    let outcome = result.unwrap();
    assert!(outcome.created.is_empty());
    assert!(should_refund(&Ok::<_, GenerationError>(outcome)));
}

#[tokio::test]
async fn duplicate_names_are_suffixed() {
    let p = caller(100, vec![]);
    let attacks = vec![
        one_attack_json("Fireball", "apply_std_damage(5, ENEMY_ROLE)"),
        one_attack_json("Fireball", "apply_std_damage(6, ENEMY_ROLE)"),
    ];
    let raw = format!("[{}]", attacks.join(","));
    let client = CannedClient(raw);
    let result = generate_attacks(&p, "a fire spirit", &[], 50, &HashSet::new(), &client).await;
    let outcome = result.unwrap();
    assert_eq!(outcome.created.len(), 2);
    assert_eq!(outcome.created[0].name, "Fireball");
    assert_eq!(outcome.created[1].name, "Fireball (2)");
}

#[tokio::test]
async fn malformed_json_is_invalid_response() {
    let p = caller(100, vec![]);
    let client = CannedClient("not json at all".into());
    let result = generate_attacks(&p, "a fire spirit", &[], 50, &HashSet::new(), &client).await;
    assert!(matches!(result, Err(GenerationError::InvalidResponse(_))));
}

#[test]
fn markdown_fences_are_stripped_before_parsing() {
    let fenced = "```json\n[]\n```";
    let parsed = validate::parse_candidates(fenced).unwrap();
    assert!(parsed.is_empty());
}
