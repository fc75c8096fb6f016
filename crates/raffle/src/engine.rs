//! Raffle draw engine.
//!
//! A draw picks one redemption uniformly at random from the eligible pool of
//! a reward and persists the winner flag through a single atomic conditional
//! write. The pool excludes everyone who already won in the campaign, by
//! redemption id and by identity key.

use crate::dedup::{dedup, identity_keys, IdentityKey};
use crate::store::RaffleStore;
use crate::types::*;
use campaign_core::config::RaffleConfig;
use campaign_core::{CampaignError, CampaignResult};
use chrono::Utc;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Winners drawn so far in one campaign.
#[derive(Debug, Clone)]
pub struct DrawSession {
    campaign_id: Uuid,
    drawn: HashSet<Uuid>,
    drawn_keys: HashSet<IdentityKey>,
}

impl DrawSession {
    pub fn new(campaign_id: Uuid) -> Self {
        Self {
            campaign_id,
            drawn: HashSet::new(),
            drawn_keys: HashSet::new(),
        }
    }

    pub fn campaign_id(&self) -> Uuid {
        self.campaign_id
    }

    pub fn record(&mut self, winner: &RewardRedemption) {
        self.drawn.insert(winner.id);
        self.drawn_keys.extend(identity_keys(winner));
    }

    /// Whether `redemption` belongs to someone who already won.
    pub fn excludes(&self, redemption: &RewardRedemption) -> bool {
        self.drawn.contains(&redemption.id)
            || identity_keys(redemption).iter().any(|k| self.drawn_keys.contains(k))
    }

    pub fn winners(&self) -> usize {
        self.drawn.len()
    }
}

/// One independent uniform pick.
pub fn pick_uniform<'a, R: Rng + ?Sized>(
    pool: &'a [RewardRedemption],
    rng: &mut R,
) -> Option<&'a RewardRedemption> {
    if pool.is_empty() {
        return None;
    }
    Some(&pool[rng.gen_range(0..pool.len())])
}

pub struct RaffleEngine<S> {
    store: Arc<S>,
    config: RaffleConfig,
}

impl<S: RaffleStore> RaffleEngine<S> {
    pub fn new(store: Arc<S>, config: &RaffleConfig) -> Self {
        info!(reel_length = config.reel_length, "Raffle engine initialized");
        Self {
            store,
            config: config.clone(),
        }
    }

    /// Start a session for `campaign_id`, seeded with its persisted winners.
    pub fn open_session(&self, campaign_id: Uuid) -> CampaignResult<DrawSession> {
        let mut session = DrawSession::new(campaign_id);
        for winner in self
            .store
            .redemptions_for_campaign(campaign_id)?
            .iter()
            .filter(|r| r.is_winner)
        {
            session.record(winner);
        }
        debug!(campaign_id = %campaign_id, winners = session.winners(), "Draw session opened");
        Ok(session)
    }

    /// Deduplicated redemptions of `reward_id` whose owners have not won yet.
    pub fn eligible_pool(
        &self,
        session: &DrawSession,
        reward_id: Uuid,
    ) -> CampaignResult<Vec<RewardRedemption>> {
        let redemptions = self.store.redemptions_for_campaign(session.campaign_id)?;
        Ok(pool_for(session, reward_id, redemptions))
    }

    pub fn draw(&self, session: &mut DrawSession, reward_id: Uuid) -> CampaignResult<DrawOutcome> {
        self.draw_with_rng(session, reward_id, &mut rand::thread_rng())
    }

    pub fn draw_with_rng<R: Rng + ?Sized>(
        &self,
        session: &mut DrawSession,
        reward_id: Uuid,
        rng: &mut R,
    ) -> CampaignResult<DrawOutcome> {
        let campaign_id = session.campaign_id;
        let reward = self
            .store
            .reward(reward_id)?
            .filter(|r| r.campaign_id == campaign_id)
            .ok_or_else(|| CampaignError::NotFound(format!("reward {reward_id}")))?;
        if reward.reward_type != RewardType::Draw {
            return Err(CampaignError::validation("reward.type", "only draw rewards can be drawn"));
        }

        let redemptions = self.store.redemptions_for_campaign(campaign_id)?;
        if redemptions.iter().any(|r| r.reward_id == reward_id && r.is_winner) {
            metrics::counter!("raffle.draws.conflicts").increment(1);
            return Err(CampaignError::ConcurrentWinnerConflict { reward_id });
        }

        let pool = pool_for(session, reward_id, redemptions);
        let Some(winner) = pick_uniform(&pool, rng).cloned() else {
            warn!(campaign_id = %campaign_id, reward_id = %reward_id, "No eligible participants");
            metrics::counter!("raffle.draws.empty_pool").increment(1);
            return Err(CampaignError::EmptyPool { reward_id });
        };

        let drawn_at = Utc::now();
        if let Err(e) = self.store.mark_winner(reward_id, winner.id, drawn_at) {
            if matches!(e, CampaignError::ConcurrentWinnerConflict { .. }) {
                metrics::counter!("raffle.draws.conflicts").increment(1);
            }
            return Err(e);
        }
        session.record(&winner);

        // Presentation only; the winner is already persisted.
        let mut reel: Vec<Uuid> = (0..self.config.reel_length)
            .map(|_| pool[rng.gen_range(0..pool.len())].id)
            .collect();
        reel.push(winner.id);

        metrics::counter!("raffle.draws.won").increment(1);
        info!(
            campaign_id = %campaign_id,
            reward_id = %reward_id,
            redemption_id = %winner.id,
            pool_size = pool.len(),
            "Raffle winner drawn"
        );

        Ok(DrawOutcome {
            reward_id,
            redemption_id: winner.id,
            code: winner.code,
            drawn_at,
            pool_size: pool.len(),
            reel,
        })
    }

    /// Counts before and after deduplication, optionally for one reward.
    pub fn dedup_summary(
        &self,
        campaign_id: Uuid,
        reward_id: Option<Uuid>,
    ) -> CampaignResult<DedupSummary> {
        let redemptions: Vec<RewardRedemption> = self
            .store
            .redemptions_for_campaign(campaign_id)?
            .into_iter()
            .filter(|r| reward_id.map_or(true, |id| r.reward_id == id))
            .collect();
        let outcome = dedup(&redemptions);
        Ok(DedupSummary {
            total: redemptions.len(),
            unique: outcome.unique.len(),
            duplicates: outcome.duplicates,
        })
    }

    /// Read-only lookup of a redemption by its code.
    pub fn lookup_result(&self, code: &str) -> CampaignResult<ResultLookup> {
        let code = code.trim();
        let redemption = self
            .store
            .redemption_by_code(code)?
            .ok_or_else(|| CampaignError::NotFound(format!("redemption code {code}")))?;
        let reward = self
            .store
            .reward(redemption.reward_id)?
            .ok_or_else(|| CampaignError::NotFound(format!("reward {}", redemption.reward_id)))?;
        Ok(ResultLookup {
            code: redemption.code,
            is_winner: redemption.is_winner,
            reward_title: reward.title,
            draw_position: reward.draw_position,
        })
    }
}

fn pool_for(
    session: &DrawSession,
    reward_id: Uuid,
    redemptions: Vec<RewardRedemption>,
) -> Vec<RewardRedemption> {
    let for_reward: Vec<RewardRedemption> = redemptions
        .into_iter()
        .filter(|r| r.reward_id == reward_id)
        .collect();
    dedup(&for_reward)
        .unique
        .into_iter()
        .filter(|r| !session.excludes(r))
        .collect()
}
