//! In-memory management store backed by DashMap.
//!
//! Production: replace with PostgreSQL (sqlx) or similar ACID store.
//! This provides the same API surface for development and testing.

use crate::models::*;
use crate::session::AuthoringSession;
use campaign_core::config::SurveyConfig;
use campaign_core::{CampaignError, CampaignResult};
use campaign_raffle::{CampaignReward, RaffleStore, RewardRedemption};
use campaign_survey::aggregate::aggregate_with_limit;
use campaign_survey::{missing_required, ResponseRecord, SchemaValidator, SurveySchema, SurveyStats};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::distributions::Uniform;
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 8;

/// Thread-safe in-memory store for campaigns, responses, rewards and redemptions.
pub struct ManagementStore {
    campaigns: DashMap<Uuid, Campaign>,
    responses: DashMap<Uuid, Vec<ResponseRecord>>,
    rewards: DashMap<Uuid, CampaignReward>,
    /// Redemptions per campaign, in creation order.
    redemptions: DashMap<Uuid, Vec<RewardRedemption>>,
    /// Redemption code → (campaign id, redemption id).
    codes: DashMap<String, (Uuid, Uuid)>,
    /// Reward id → winning redemption id. The entry lock is the draw's
    /// conditional write.
    reward_winners: DashMap<Uuid, Uuid>,
    survey: SurveyConfig,
}

impl ManagementStore {
    pub fn new() -> Self {
        Self::with_config(&SurveyConfig::default())
    }

    pub fn with_config(survey: &SurveyConfig) -> Self {
        info!("Management store initialized (in-memory, development mode)");
        Self {
            campaigns: DashMap::new(),
            responses: DashMap::new(),
            rewards: DashMap::new(),
            redemptions: DashMap::new(),
            codes: DashMap::new(),
            reward_winners: DashMap::new(),
            survey: survey.clone(),
        }
    }

    pub fn validator(&self) -> SchemaValidator {
        SchemaValidator::new(&self.survey)
    }

    // ─── Campaigns ─────────────────────────────────────────────────────────

    pub fn list_campaigns(&self) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> =
            self.campaigns.iter().map(|r| r.value().clone()).collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        campaigns
    }

    pub fn get_campaign(&self, id: Uuid) -> CampaignResult<Campaign> {
        self.campaigns
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| CampaignError::NotFound(format!("campaign {id}")))
    }

    pub fn create_campaign(&self, req: CreateCampaignRequest) -> CampaignResult<Campaign> {
        if req.title.trim().is_empty() {
            return Err(CampaignError::validation("title", "must not be empty"));
        }
        check_window(req.starts_at, req.ends_at)?;
        let schema = match req.schema {
            Some(document) => {
                let schema: SurveySchema = serde_json::from_value(document)
                    .map_err(|e| CampaignError::validation("schema", e.to_string()))?;
                self.validator().validate(&schema)?;
                schema
            }
            None => SurveySchema::default(),
        };
        let slug = req
            .slug
            .map(|s| slugify(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&req.title));

        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            title: req.title.trim().to_string(),
            slug,
            status: CampaignStatus::Draft,
            starts_at: req.starts_at,
            ends_at: req.ends_at,
            schema,
            goal_responses: req.goal_responses,
            goal_redemptions: req.goal_redemptions,
            created_at: now,
            updated_at: now,
        };
        self.campaigns.insert(campaign.id, campaign.clone());
        info!(campaign_id = %campaign.id, slug = %campaign.slug, "Campaign created");
        Ok(campaign)
    }

    pub fn activate_campaign(&self, id: Uuid) -> CampaignResult<Campaign> {
        self.transition(id, CampaignStatus::Active)
    }

    pub fn end_campaign(&self, id: Uuid) -> CampaignResult<Campaign> {
        self.transition(id, CampaignStatus::Ended)
    }

    fn transition(&self, id: Uuid, to: CampaignStatus) -> CampaignResult<Campaign> {
        let mut entry = self
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| CampaignError::NotFound(format!("campaign {id}")))?;
        let campaign = entry.value_mut();
        campaign.status = campaign.status.transition(to)?;
        campaign.updated_at = Utc::now();
        info!(campaign_id = %id, status = to.as_str(), "Campaign status changed");
        Ok(campaign.clone())
    }

    /// Start an authoring session on the stored campaign.
    pub fn open_session(&self, id: Uuid) -> CampaignResult<AuthoringSession> {
        let campaign = self.get_campaign(id)?;
        AuthoringSession::open(&campaign, self.validator())
    }

    /// Persist the session's schema and window as one whole-document write.
    /// Last write wins.
    ///
    /// The schema is validated again and the edit lock is checked against the
    /// stored status, which may have moved on since the session was opened.
    pub fn save_session(&self, session: &AuthoringSession) -> CampaignResult<Campaign> {
        let id = session.campaign_id();
        self.validator().validate(session.schema())?;
        let (starts_at, ends_at) = session.window();
        check_window(starts_at, ends_at)?;

        let mut entry = self
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| CampaignError::NotFound(format!("campaign {id}")))?;
        let campaign = entry.value_mut();
        let locked = match campaign.status {
            CampaignStatus::Draft => false,
            CampaignStatus::Active => !session.is_unlocked(),
            CampaignStatus::Ended => true,
        };
        if locked {
            return Err(CampaignError::EditLocked {
                campaign_id: id,
                status: campaign.status.as_str().to_string(),
            });
        }
        campaign.schema = session.schema().clone();
        campaign.starts_at = starts_at;
        campaign.ends_at = ends_at;
        campaign.updated_at = Utc::now();
        debug!(
            campaign_id = %id,
            questions = campaign.schema.question_count(),
            "Campaign schema saved"
        );
        Ok(campaign.clone())
    }

    // ─── Responses ─────────────────────────────────────────────────────────

    pub fn submit_response(
        &self,
        campaign_id: Uuid,
        req: SubmitResponseRequest,
    ) -> CampaignResult<ResponseRecord> {
        self.submit_response_at(campaign_id, req, Utc::now())
    }

    pub fn submit_response_at(
        &self,
        campaign_id: Uuid,
        req: SubmitResponseRequest,
        now: DateTime<Utc>,
    ) -> CampaignResult<ResponseRecord> {
        let campaign = self.get_campaign(campaign_id)?;
        if !campaign.is_open_at(now) {
            return Err(CampaignError::validation(
                "campaign",
                format!("campaign is {} and not accepting responses", campaign.status.as_str()),
            ));
        }
        if let Some(missing) = missing_required(&campaign.schema, &req.answers).first() {
            return Err(CampaignError::validation(format!("answers.{missing}"), "required"));
        }

        let mut record = ResponseRecord::new(campaign_id, req.answers);
        record.respondent_role = req.respondent_role;
        record.submitted_at = now;
        self.responses.entry(campaign_id).or_default().push(record.clone());
        metrics::counter!("survey.responses.submitted").increment(1);
        debug!(campaign_id = %campaign_id, response_id = %record.id, "Response recorded");
        Ok(record)
    }

    pub fn responses(&self, campaign_id: Uuid) -> Vec<ResponseRecord> {
        self.responses
            .get(&campaign_id)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    pub fn stats(&self, campaign_id: Uuid) -> CampaignResult<SurveyStats> {
        let campaign = self.get_campaign(campaign_id)?;
        let responses = self.responses(campaign_id);
        Ok(aggregate_with_limit(
            &responses,
            &campaign.schema,
            self.survey.scale_bucket_span_limit,
        ))
    }

    // ─── Rewards & redemptions ─────────────────────────────────────────────

    pub fn create_reward(
        &self,
        campaign_id: Uuid,
        req: CreateRewardRequest,
    ) -> CampaignResult<CampaignReward> {
        self.get_campaign(campaign_id)?;
        if req.title.trim().is_empty() {
            return Err(CampaignError::validation("title", "must not be empty"));
        }
        let reward = CampaignReward {
            id: Uuid::new_v4(),
            campaign_id,
            title: req.title.trim().to_string(),
            reward_type: req.reward_type,
            draw_position: req.draw_position,
        };
        self.rewards.insert(reward.id, reward.clone());
        info!(campaign_id = %campaign_id, reward_id = %reward.id, "Reward created");
        Ok(reward)
    }

    pub fn rewards(&self, campaign_id: Uuid) -> Vec<CampaignReward> {
        let mut rewards: Vec<CampaignReward> = self
            .rewards
            .iter()
            .filter(|r| r.campaign_id == campaign_id)
            .map(|r| r.value().clone())
            .collect();
        rewards.sort_by(|a, b| {
            a.draw_position
                .cmp(&b.draw_position)
                .then_with(|| a.title.cmp(&b.title))
        });
        rewards
    }

    pub fn redeem(
        &self,
        campaign_id: Uuid,
        req: CreateRedemptionRequest,
    ) -> CampaignResult<RewardRedemption> {
        let reward_id = req.reward_id;
        self.rewards
            .get(&reward_id)
            .filter(|r| r.campaign_id == campaign_id)
            .ok_or_else(|| CampaignError::NotFound(format!("reward {reward_id}")))?;

        let mut redemption = RewardRedemption::new(campaign_id, reward_id, String::new());
        redemption.profile_id = req.profile_id;
        redemption.fingerprint = req.fingerprint;
        redemption.email = req.email;
        redemption.phone = req.phone;
        redemption.code = self.reserve_code(campaign_id, redemption.id);

        self.redemptions.entry(campaign_id).or_default().push(redemption.clone());
        metrics::counter!("raffle.redemptions.created").increment(1);
        debug!(
            campaign_id = %campaign_id,
            reward_id = %reward_id,
            code = %redemption.code,
            "Reward redeemed"
        );
        Ok(redemption)
    }

    fn reserve_code(&self, campaign_id: Uuid, redemption_id: Uuid) -> String {
        let mut rng = rand::thread_rng();
        let pick = Uniform::from(0..CODE_ALPHABET.len());
        loop {
            let code: String = (0..CODE_LEN)
                .map(|_| CODE_ALPHABET[rng.sample(pick)] as char)
                .collect();
            if let Entry::Vacant(slot) = self.codes.entry(code.clone()) {
                slot.insert((campaign_id, redemption_id));
                return code;
            }
        }
    }

    pub fn winner_of(&self, reward_id: Uuid) -> Option<Uuid> {
        self.reward_winners.get(&reward_id).map(|r| *r.value())
    }
}

impl Default for ManagementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RaffleStore for ManagementStore {
    fn redemptions_for_campaign(&self, campaign_id: Uuid) -> CampaignResult<Vec<RewardRedemption>> {
        Ok(self
            .redemptions
            .get(&campaign_id)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }

    fn reward(&self, reward_id: Uuid) -> CampaignResult<Option<CampaignReward>> {
        Ok(self.rewards.get(&reward_id).map(|r| r.value().clone()))
    }

    fn redemption_by_code(&self, code: &str) -> CampaignResult<Option<RewardRedemption>> {
        let Some((campaign_id, redemption_id)) = self.codes.get(code).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self
            .redemptions
            .get(&campaign_id)
            .and_then(|list| list.iter().find(|r| r.id == redemption_id).cloned()))
    }

    fn mark_winner(
        &self,
        reward_id: Uuid,
        redemption_id: Uuid,
        drawn_at: DateTime<Utc>,
    ) -> CampaignResult<()> {
        let campaign_id = self
            .rewards
            .get(&reward_id)
            .map(|r| r.campaign_id)
            .ok_or_else(|| CampaignError::NotFound(format!("reward {reward_id}")))?;

        // Lock order: reward_winners entry, then the campaign's redemptions.
        match self.reward_winners.entry(reward_id) {
            Entry::Occupied(_) => Err(CampaignError::ConcurrentWinnerConflict { reward_id }),
            Entry::Vacant(slot) => {
                let mut list = self
                    .redemptions
                    .get_mut(&campaign_id)
                    .ok_or_else(|| CampaignError::NotFound(format!("redemption {redemption_id}")))?;
                let redemption = list
                    .iter_mut()
                    .find(|r| r.id == redemption_id && r.reward_id == reward_id)
                    .ok_or_else(|| CampaignError::NotFound(format!("redemption {redemption_id}")))?;
                redemption.is_winner = true;
                redemption.drawn_at = Some(drawn_at);
                slot.insert(redemption_id);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_raffle::RewardType;
    use campaign_survey::{Answer, Answers, QuestionId};
    use serde_json::json;

    fn survey_campaign(store: &ManagementStore) -> Campaign {
        store
            .create_campaign(CreateCampaignRequest {
                title: "Summer Fest".into(),
                slug: None,
                starts_at: None,
                ends_at: None,
                goal_responses: Some(100),
                goal_redemptions: None,
                schema: Some(json!({ "sections": [{ "id": "s1", "title": "Main", "questions": [
                    { "id": "visited", "type": "single_choice", "label": "Visited?",
                      "required": true,
                      "options": [
                          {"label": "Yes", "value": "yes"},
                          {"label": "No", "value": "no"}
                      ] },
                    { "id": "why", "type": "short_text", "label": "Why not?", "required": true,
                      "depends_on": {"target_question_id": "visited", "target_value": "no"} }
                ]}]})),
            })
            .unwrap()
    }

    fn answers(pairs: &[(&str, &str)]) -> Answers {
        pairs
            .iter()
            .map(|(k, v)| (QuestionId::from(*k), Answer::Text(v.to_string())))
            .collect()
    }

    fn submit(
        store: &ManagementStore,
        id: Uuid,
        pairs: &[(&str, &str)],
    ) -> CampaignResult<ResponseRecord> {
        store.submit_response(
            id,
            SubmitResponseRequest {
                answers: answers(pairs),
                respondent_role: None,
            },
        )
    }

    #[test]
    fn test_create_campaign() {
        let store = ManagementStore::new();
        let campaign = survey_campaign(&store);
        assert_eq!(campaign.slug, "summer-fest");
        assert_eq!(campaign.status, CampaignStatus::Draft);
        assert_eq!(campaign.schema.question_count(), 2);
        assert_eq!(store.list_campaigns().len(), 1);
    }

    #[test]
    fn test_create_campaign_rejects_invalid_schema() {
        let store = ManagementStore::new();
        let err = store
            .create_campaign(CreateCampaignRequest {
                title: "Bad".into(),
                slug: None,
                starts_at: None,
                ends_at: None,
                goal_responses: None,
                goal_redemptions: None,
                schema: Some(json!({ "sections": [{ "id": "s1", "title": " " }] })),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            CampaignError::Validation { ref field, .. } if field == "sections[0].title"
        ));
        assert!(store.list_campaigns().is_empty());
    }

    #[test]
    fn test_responses_require_open_campaign() {
        let store = ManagementStore::new();
        let campaign = survey_campaign(&store);
        assert!(submit(&store, campaign.id, &[("visited", "yes")]).is_err());

        store.activate_campaign(campaign.id).unwrap();
        submit(&store, campaign.id, &[("visited", "yes")]).unwrap();

        store.end_campaign(campaign.id).unwrap();
        assert!(submit(&store, campaign.id, &[("visited", "yes")]).is_err());
        assert_eq!(store.responses(campaign.id).len(), 1);
    }

    #[test]
    fn test_missing_visible_required_answer_is_rejected() {
        let store = ManagementStore::new();
        let campaign = survey_campaign(&store);
        store.activate_campaign(campaign.id).unwrap();

        let err = submit(&store, campaign.id, &[("visited", "no")]).unwrap_err();
        assert!(
            matches!(err, CampaignError::Validation { ref field, .. } if field == "answers.why")
        );
        submit(&store, campaign.id, &[("visited", "no"), ("why", "far")]).unwrap();

        let stats = store.stats(campaign.id).unwrap();
        assert_eq!(stats.total_responses, 1);
        let visited = stats.question(&"visited".into()).unwrap();
        assert_eq!(visited.tally("no").unwrap().percentage, 100.0);
    }

    #[test]
    fn test_save_session_round_trip() {
        let store = ManagementStore::new();
        let campaign = survey_campaign(&store);
        let mut session = store.open_session(campaign.id).unwrap();
        session.add_section().unwrap();
        store.save_session(&session).unwrap();
        assert_eq!(store.get_campaign(campaign.id).unwrap().schema.sections.len(), 2);

        store.activate_campaign(campaign.id).unwrap();
        store.end_campaign(campaign.id).unwrap();
        assert!(matches!(
            store.save_session(&session),
            Err(CampaignError::EditLocked { .. })
        ));
    }

    #[test]
    fn test_save_rechecks_lock_after_activation() {
        let store = ManagementStore::new();
        let campaign = survey_campaign(&store);
        let mut session = store.open_session(campaign.id).unwrap();
        store.activate_campaign(campaign.id).unwrap();

        // opened while draft, so the session itself still allows the edit
        session.add_section().unwrap();
        let err = store.save_session(&session).unwrap_err();
        assert!(matches!(err, CampaignError::EditLocked { ref status, .. } if status == "active"));
        assert_eq!(store.get_campaign(campaign.id).unwrap().schema.sections.len(), 1);

        session.unlock();
        let saved = store.save_session(&session).unwrap();
        assert_eq!(saved.schema.sections.len(), 2);
    }

    #[test]
    fn test_saved_schema_stays_within_limits() {
        let store = ManagementStore::with_config(&SurveyConfig {
            max_sections: 2,
            ..SurveyConfig::default()
        });
        let campaign = survey_campaign(&store);
        let mut session = store.open_session(campaign.id).unwrap();
        session.add_section().unwrap();
        let err = session.add_section().unwrap_err();
        assert!(matches!(err, CampaignError::Validation { ref field, .. } if field == "sections"));
        store.save_session(&session).unwrap();
        assert_eq!(store.open_session(campaign.id).unwrap().schema().sections.len(), 2);

        // a session built under looser limits is refused instead of stored
        let mut loose = AuthoringSession::open(
            &store.get_campaign(campaign.id).unwrap(),
            SchemaValidator::default(),
        )
        .unwrap();
        loose.add_section().unwrap();
        let err = store.save_session(&loose).unwrap_err();
        assert!(matches!(err, CampaignError::Validation { ref field, .. } if field == "sections"));
        assert!(store.open_session(campaign.id).is_ok());
    }

    #[test]
    fn test_redemption_codes_are_unique_and_resolvable() {
        let store = ManagementStore::new();
        let campaign = survey_campaign(&store);
        let reward = store
            .create_reward(
                campaign.id,
                CreateRewardRequest {
                    title: "Bike".into(),
                    reward_type: RewardType::Draw,
                    draw_position: Some("1st".into()),
                },
            )
            .unwrap();
        let mut codes = std::collections::HashSet::new();
        for i in 0..50 {
            let r = store
                .redeem(
                    campaign.id,
                    CreateRedemptionRequest {
                        reward_id: reward.id,
                        email: Some(format!("p{i}@example.com")),
                        ..Default::default()
                    },
                )
                .unwrap();
            assert_eq!(r.code.len(), CODE_LEN);
            assert!(codes.insert(r.code.clone()));
            assert_eq!(store.redemption_by_code(&r.code).unwrap().unwrap().id, r.id);
        }
        assert_eq!(store.redemptions_for_campaign(campaign.id).unwrap().len(), 50);
    }

    #[test]
    fn test_redeem_unknown_reward() {
        let store = ManagementStore::new();
        let campaign = survey_campaign(&store);
        let err = store
            .redeem(
                campaign.id,
                CreateRedemptionRequest {
                    reward_id: Uuid::new_v4(),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CampaignError::NotFound(_)));
    }

    #[test]
    fn test_mark_winner_is_conditional() {
        let store = ManagementStore::new();
        let campaign = survey_campaign(&store);
        let reward = store
            .create_reward(
                campaign.id,
                CreateRewardRequest {
                    title: "Bike".into(),
                    reward_type: RewardType::Draw,
                    draw_position: None,
                },
            )
            .unwrap();
        let a = store
            .redeem(
                campaign.id,
                CreateRedemptionRequest {
                    reward_id: reward.id,
                    ..Default::default()
                },
            )
            .unwrap();
        let b = store
            .redeem(
                campaign.id,
                CreateRedemptionRequest {
                    reward_id: reward.id,
                    ..Default::default()
                },
            )
            .unwrap();

        store.mark_winner(reward.id, a.id, Utc::now()).unwrap();
        assert!(matches!(
            store.mark_winner(reward.id, b.id, Utc::now()),
            Err(CampaignError::ConcurrentWinnerConflict { .. })
        ));
        assert_eq!(store.winner_of(reward.id), Some(a.id));
        let winners: Vec<Uuid> = store
            .redemptions_for_campaign(campaign.id)
            .unwrap()
            .into_iter()
            .filter(|r| r.is_winner)
            .map(|r| r.id)
            .collect();
        assert_eq!(winners, vec![a.id]);
    }
}
