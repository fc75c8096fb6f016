//! Reward and redemption records, and draw results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ─── Rewards ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    /// Downloadable document, handed to every participant.
    Pdf,
    /// Raffle prize, awarded by draw.
    Draw,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignReward {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub reward_type: RewardType,
    /// Display label such as "1st prize".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_position: Option<String>,
}

// ─── Redemptions ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardRedemption {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub reward_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub code: String,
    #[serde(default)]
    pub is_winner: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawn_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RewardRedemption {
    pub fn new(campaign_id: Uuid, reward_id: Uuid, code: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            reward_id,
            profile_id: None,
            fingerprint: None,
            email: None,
            phone: None,
            code: code.into(),
            is_winner: false,
            drawn_at: None,
            created_at: Utc::now(),
        }
    }
}

// ─── Draw results ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WinnerFlag {
    pub is_winner: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DrawOutcome {
    pub reward_id: Uuid,
    pub redemption_id: Uuid,
    pub code: String,
    pub drawn_at: DateTime<Utc>,
    pub pool_size: usize,
    /// Decoy entries for a spin animation, ending with the winner. Generated
    /// after the winner was picked.
    pub reel: Vec<Uuid>,
}

impl DrawOutcome {
    /// Result body: redemption id → `{ "is_winner": true }`.
    pub fn winner_flags(&self) -> HashMap<Uuid, WinnerFlag> {
        HashMap::from([(self.redemption_id, WinnerFlag { is_winner: true })])
    }
}

/// Public view of a redemption looked up by its code.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResultLookup {
    pub code: String,
    pub is_winner: bool,
    pub reward_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draw_position: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DedupSummary {
    pub total: usize,
    pub unique: usize,
    pub duplicates: usize,
}
