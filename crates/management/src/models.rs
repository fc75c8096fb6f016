//! Management domain types: campaigns, request bodies, error body.

use campaign_core::{CampaignError, CampaignResult};
use campaign_raffle::RewardType;
use campaign_survey::{Answers, SurveySchema};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Campaign ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub status: CampaignStatus,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub schema: SurveySchema,
    pub goal_responses: Option<u64>,
    pub goal_redemptions: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Whether responses are accepted at `now`: active and inside the window.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == CampaignStatus::Active
            && self.starts_at.map_or(true, |s| s <= now)
            && self.ends_at.map_or(true, |e| now <= e)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Active,
    Ended,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Ended => "ended",
        }
    }

    /// Draft → active → ended; nothing else.
    pub fn transition(self, to: CampaignStatus) -> CampaignResult<CampaignStatus> {
        match (self, to) {
            (CampaignStatus::Draft, CampaignStatus::Active)
            | (CampaignStatus::Active, CampaignStatus::Ended) => Ok(to),
            _ => Err(CampaignError::InvalidTransition {
                from: self.as_str().to_string(),
                to: to.as_str().to_string(),
            }),
        }
    }
}

/// Lowercase ASCII alphanumerics, other runs collapsed to a single `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

pub(crate) fn check_window(
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> CampaignResult<()> {
    match (starts_at, ends_at) {
        (Some(s), Some(e)) if e < s => Err(CampaignError::validation(
            "ends_at",
            "must not be before starts_at",
        )),
        _ => Ok(()),
    }
}

// ─── Requests ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub goal_responses: Option<u64>,
    #[serde(default)]
    pub goal_redemptions: Option<u64>,
    /// Initial survey document; validated as a whole.
    #[serde(default)]
    pub schema: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWindowRequest {
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnlockQuery {
    #[serde(default)]
    pub unlock: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponseRequest {
    pub answers: Answers,
    #[serde(default)]
    pub respondent_role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRewardRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub reward_type: RewardType,
    #[serde(default)]
    pub draw_position: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRedemptionRequest {
    pub reward_id: Uuid,
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

// ─── API Response types ────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
