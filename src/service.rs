//! Game Service: one method per spec.md §6 HTTP operation, composing
//! every module behind the single entry point an HTTP binary calls.
//! Holds no routing, authentication, or wire-serialization logic of its
//! own — the caller has already authenticated and decoded the request
//! body; this just orchestrates the core.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::RuntimeConfig;
use crate::contracts::attack::Attack;
use crate::contracts::battle::{Battle, BattleStatus};
use crate::contracts::ids::{AttackId, BattleId, ParticipantId};
use crate::contracts::participant::{validate_stat_block, BaseStats, Participant};
use crate::contracts::repository::{AttackRepository, BattleRepository, ConfigRepository, ParticipantRepository, StatsRepository};
use crate::error::CoreError;
use crate::generation::{self, GenerationOutcome, LlmClient};
use crate::math::{Rng, rng::SystemRng};
use crate::scripting::StaticInfo;
use crate::{ai, lifecycle, pipeline, stats};

/// Everything the service needs injected: the five repositories, the LLM
/// boundary, and the process-wide numeric constants.
pub struct GameService {
    participants: Arc<dyn ParticipantRepository>,
    attacks: Arc<dyn AttackRepository>,
    battles: Arc<dyn BattleRepository>,
    attack_stats: Arc<dyn StatsRepository>,
    game_config: Arc<dyn ConfigRepository>,
    llm: Arc<dyn LlmClient>,
    config: RuntimeConfig,
}

impl GameService {
    #[must_use]
    pub fn new(
        participants: Arc<dyn ParticipantRepository>,
        attacks: Arc<dyn AttackRepository>,
        battles: Arc<dyn BattleRepository>,
        attack_stats: Arc<dyn StatsRepository>,
        game_config: Arc<dyn ConfigRepository>,
        llm: Arc<dyn LlmClient>,
        config: RuntimeConfig,
    ) -> Self {
        Self { participants, attacks, battles, attack_stats, game_config, llm, config }
    }

    fn require_participant(&self, id: ParticipantId) -> Result<Participant, CoreError> {
        self.participants
            .get(id)
            .ok_or_else(|| CoreError::NotFound(format!("participant {id}")))
    }

    fn require_battle(&self, id: BattleId) -> Result<Battle, CoreError> {
        self.battles.get(id).ok_or_else(|| CoreError::NotFound(format!("battle {id}")))
    }

    fn static_info_for(&self, battle: &Battle) -> Result<StaticInfo, CoreError> {
        let p1 = self.require_participant(battle.player1)?;
        let p2 = self.require_participant(battle.player2)?;
        Ok(StaticInfo::from_participants(battle, &p1, &p2))
    }

    fn rng(&self) -> Box<dyn Rng> {
        Box::new(SystemRng::default())
    }

    /// `PUT /users/me/selected-attacks`.
    pub fn update_selected_attacks(&self, participant_id: ParticipantId, attack_ids: Vec<AttackId>) -> Result<Participant, CoreError> {
        let mut participant = self.require_participant(participant_id)?;
        participant
            .validate_selection(&attack_ids)
            .map_err(CoreError::Validation)?;
        participant.selected = attack_ids;
        self.participants.save(&participant);
        Ok(participant)
    }

    /// `PATCH /users/me/stats`.
    pub fn update_stat_block(&self, participant_id: ParticipantId, stats: BaseStats) -> Result<Participant, CoreError> {
        let mut participant = self.require_participant(participant_id)?;
        validate_stat_block(&stats).map_err(|e| CoreError::Validation(e.to_string()))?;
        participant.base_stats = stats;
        self.participants.save(&participant);
        Ok(participant)
    }

    /// `POST /battles/initiate`.
    pub fn initiate_battle(
        &self,
        challenger_id: ParticipantId,
        opponent_id: ParticipantId,
        fight_as_bot: bool,
    ) -> Result<Battle, CoreError> {
        let challenger = self.require_participant(challenger_id)?;
        let target = self.require_participant(opponent_id)?;
        let challenger_battles = self.battles.list_for_participant(challenger_id);
        let target_battles = self.battles.list_for_participant(opponent_id);

        let battle = lifecycle::create_challenge(
            &challenger,
            &target,
            fight_as_bot,
            &challenger_battles,
            &target_battles,
            &self.config,
        )?;
        self.battles.insert(&battle);

        if battle.status == BattleStatus::Active {
            self.drive_ai_and_persist(battle.clone())?;
        }
        Ok(battle)
    }

    /// `GET /battles/requests`: pending battles where `participant_id` is
    /// the recipient, after opportunistically reaping stale ones.
    pub fn list_pending_requests(&self, participant_id: ParticipantId) -> Vec<Battle> {
        self.reap_stale_pending();
        self.battles
            .list_for_participant(participant_id)
            .into_iter()
            .filter(|b| b.status == BattleStatus::Pending && b.player2 == participant_id)
            .collect()
    }

    fn reap_stale_pending(&self) {
        let all = self.battles.list_all();
        let now = crate::config::now_unix();
        for id in lifecycle::reap_stale_pending(&all, &self.config, now) {
            self.battles.delete(id);
        }
    }

    /// `POST /battles/{id}/respond`.
    pub fn respond_to_battle(&self, battle_id: BattleId, acting: ParticipantId, accept: bool) -> Result<Battle, CoreError> {
        let mut battle = self.require_battle(battle_id)?;
        if accept {
            let player1 = self.require_participant(battle.player1)?;
            let player2 = self.require_participant(battle.player2)?;
            let acting_battles = self.battles.list_for_participant(acting);
            lifecycle::activate(&mut battle, acting, &player1, &player2, &acting_battles, &self.config)?;
            self.battles.save_battle_state(&battle);
        } else {
            lifecycle::decline(&mut battle, acting)?;
            self.battles.save_battle_state(&battle);
        }
        Ok(battle)
    }

    /// `POST /battles/{id}/cancel`.
    pub fn cancel_battle(&self, battle_id: BattleId, acting: ParticipantId) -> Result<(), CoreError> {
        let battle = self.require_battle(battle_id)?;
        lifecycle::cancel(&battle, acting)?;
        self.battles.delete(battle_id);
        Ok(())
    }

    /// `GET /battles/active`.
    #[must_use]
    pub fn active_battle(&self, participant_id: ParticipantId) -> Option<Battle> {
        self.battles
            .list_for_participant(participant_id)
            .into_iter()
            .find(|b| b.status == BattleStatus::Active)
    }

    /// `GET /battles/{id}`.
    pub fn get_battle(&self, battle_id: BattleId) -> Result<Battle, CoreError> {
        self.require_battle(battle_id)
    }

    /// `POST /battles/{id}/action`. Runs the submitter's turn, then any
    /// consecutive AI turns, persisting the result either way; on a
    /// finishing action, runs the stats/rewards pass from spec.md §4.9.
    pub fn submit_action(&self, battle_id: BattleId, actor: ParticipantId, attack_id: AttackId) -> Result<Battle, CoreError> {
        let mut battle = self.require_battle(battle_id)?;
        let actor_role = battle.role_of(actor).ok_or_else(|| CoreError::Authorization("not a participant".into()))?;

        let static_info = self.static_info_for(&battle)?;
        let attacks = self.attacks.all();

        let (result, _rng) =
            pipeline::execute_action(&mut battle, actor_role, attack_id, &attacks, &static_info, &self.config, self.rng());
        result?;

        self.battles.save_battle_state(&battle);

        if battle.status == BattleStatus::Finished {
            self.finalize_finished_battle(&battle)?;
        } else {
            self.drive_ai_and_persist(battle.clone())?;
        }

        self.require_battle(battle_id)
    }

    /// Runs consecutive AI turns (if any) and persists the result,
    /// finalizing stats if they bring the battle to `finished`.
    fn drive_ai_and_persist(&self, mut battle: Battle) -> Result<(), CoreError> {
        if battle.status != BattleStatus::Active || !battle.player2_is_ai_controlled {
            return Ok(());
        }
        let static_info = self.static_info_for(&battle)?;
        let attacks = self.attacks.all();
        let _rng = ai::run_ai_turns(&mut battle, &attacks, &static_info, &self.config, self.rng());
        self.battles.save_battle_state(&battle);
        if battle.status == BattleStatus::Finished {
            self.finalize_finished_battle(&battle)?;
        }
        Ok(())
    }

    /// `POST /battles/{id}/concede`.
    pub fn concede(&self, battle_id: BattleId, acting: ParticipantId) -> Result<Battle, CoreError> {
        let mut battle = self.require_battle(battle_id)?;
        lifecycle::concede(&mut battle, acting)?;
        self.battles.save_battle_state(&battle);
        self.finalize_finished_battle(&battle)?;
        Ok(battle)
    }

    /// spec.md §4.9: replay the event log, merge `AttackUsageStats`
    /// deltas, and credit both participants. Runs as one logical unit —
    /// on any repository failure here the caller sees the battle as
    /// already `finished` but stats/rewards are simply retried by a
    /// later `admin_recompute_stats` pass (the source of truth is the
    /// log, not these derived rows).
    fn finalize_finished_battle(&self, battle: &Battle) -> Result<(), CoreError> {
        let known_attack_ids: HashSet<AttackId> = self.attacks.all().into_iter().map(|a| a.id).collect();
        let Some(outcome) = stats::replay_battle(battle, &self.config, &known_attack_ids) else {
            return Ok(());
        };

        for (attack_id, delta) in &outcome.attack_deltas {
            let existing = self.attack_stats.get_or_create(*attack_id);
            let merged = stats::apply_delta(Some(existing), *attack_id, delta);
            self.attack_stats.save(&merged);
        }

        for (role, reward) in &outcome.rewards {
            let participant_id = battle.participant_id(*role);
            if let Some(mut participant) = self.participants.get(participant_id) {
                participant.credits += reward.credits_delta;
                let is_vs_bot = battle.player2_is_ai_controlled;
                if reward.won {
                    if is_vs_bot {
                        participant.stats.wins_vs_bot += 1;
                    } else {
                        participant.stats.wins_vs_human += 1;
                    }
                } else if is_vs_bot {
                    participant.stats.losses_vs_bot += 1;
                } else {
                    participant.stats.losses_vs_human += 1;
                }
                participant.stats.total_damage_dealt += outcome.damage_dealt_by_role.get(role).copied().unwrap_or(0);
                self.participants.save(&participant);
            }
        }

        Ok(())
    }

    /// `POST /attacks/generate`.
    pub async fn generate_attacks(
        &self,
        caller_id: ParticipantId,
        concept: &str,
        favorite_attack_ids: &[AttackId],
    ) -> Result<GenerationOutcome, CoreError> {
        let mut caller = self.require_participant(caller_id)?;
        let config_row = self.game_config.get().unwrap_or_default();
        let cost = config_row.attack_generation_cost;

        let favorites: Vec<Attack> = favorite_attack_ids.iter().filter_map(|id| self.attacks.get(*id)).collect();
        let existing_names: HashSet<String> = self.attacks.all().into_iter().map(|a| a.name).collect();

        if caller.credits < cost {
            return Err(CoreError::Generation(generation::GenerationError::InsufficientCredits {
                have: caller.credits,
                need: cost,
            }));
        }
        // Checked and built against the pre-debit balance so the module's
        // own internal credit check (redundant here, load-bearing for its
        // other callers) still sees the true balance.
        let pre_debit_caller = caller.clone();
        caller.credits -= cost;
        self.participants.save(&caller);
        tracing::info!(participant_id = %caller_id, cost, "debited credits for attack generation");

        let result =
            generation::generate_attacks(&pre_debit_caller, concept, &favorites, cost, &existing_names, self.llm.as_ref()).await;

        if generation::should_refund(&result) {
            caller.credits += cost;
            self.participants.save(&caller);
            tracing::info!(participant_id = %caller_id, cost, "refunded attack generation credits");
        }

        let outcome = result?;
        for attack in &outcome.created {
            self.attacks.save(attack);
            caller.learned_attacks.insert(attack.id);
        }
        self.participants.save(&caller);

        Ok(outcome)
    }

    /// `DELETE /attacks/{id}`: unlinks from the caller's collection
    /// without deleting the `Attack` entity itself (spec.md §3 ownership
    /// rules, djanmongo's `AttackDeleteView`).
    pub fn unlink_attack(&self, participant_id: ParticipantId, attack_id: AttackId) -> Result<(), CoreError> {
        let mut participant = self.require_participant(participant_id)?;
        participant.learned_attacks.remove(&attack_id);
        participant.selected.retain(|id| *id != attack_id);
        self.participants.save(&participant);
        Ok(())
    }

    /// `GET /leaderboard/attacks`.
    #[must_use]
    pub fn leaderboard(&self, sort: stats::LeaderboardSort, limit: usize) -> Vec<crate::contracts::stats_entity::AttackUsageStats> {
        let rows = self.attack_stats.all();
        stats::leaderboard(&rows, sort, limit)
    }

    /// Admin operation (spec.md §9): reset and replay every finished
    /// battle's log from scratch.
    pub fn admin_recompute_stats(&self) {
        let battles = self.battles.list_all();
        let known_attack_ids: HashSet<AttackId> = self.attacks.all().into_iter().map(|a| a.id).collect();
        let recomputed = stats::admin_recompute_all(&battles, &self.config, &known_attack_ids);
        self.attack_stats.reset_all();
        for row in recomputed.into_values() {
            self.attack_stats.save(&row);
        }
    }
}
