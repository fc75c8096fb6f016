//! Persistence boundary consumed by the raffle engine.

use crate::types::{CampaignReward, RewardRedemption};
use campaign_core::CampaignResult;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Record store for rewards and redemptions.
///
/// Implementations surface their own failures as `CampaignError::Store` and
/// must not retry internally.
pub trait RaffleStore: Send + Sync {
    /// All redemptions of a campaign, ordered by creation time.
    fn redemptions_for_campaign(&self, campaign_id: Uuid) -> CampaignResult<Vec<RewardRedemption>>;

    fn reward(&self, reward_id: Uuid) -> CampaignResult<Option<CampaignReward>>;

    fn redemption_by_code(&self, code: &str) -> CampaignResult<Option<RewardRedemption>>;

    /// Atomically flag `redemption_id` as the winner of `reward_id`.
    ///
    /// Succeeds only if the reward has no winner yet; otherwise returns
    /// `CampaignError::ConcurrentWinnerConflict` and changes nothing.
    fn mark_winner(
        &self,
        reward_id: Uuid,
        redemption_id: Uuid,
        drawn_at: DateTime<Utc>,
    ) -> CampaignResult<()>;
}
