//! Authoring session: one editor per campaign being edited.
//!
//! The session gates every schema and date edit on the campaign status and
//! tracks which section is active. The unlock override and the active index
//! live only here and are never persisted.

use crate::models::{check_window, Campaign, CampaignStatus};
use campaign_core::{CampaignError, CampaignResult};
use campaign_survey::{
    remap_active, IndexOp, SchemaEditor, SchemaValidator, Section, SectionId, SurveySchema,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AuthoringSession {
    campaign_id: Uuid,
    status: CampaignStatus,
    editor: SchemaEditor,
    active_section: Option<usize>,
    unlocked: bool,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
}

impl AuthoringSession {
    pub fn open(campaign: &Campaign, validator: SchemaValidator) -> CampaignResult<Self> {
        let editor = SchemaEditor::from_schema(campaign.schema.clone(), validator)?;
        let active_section = if campaign.schema.sections.is_empty() {
            None
        } else {
            Some(0)
        };
        Ok(Self {
            campaign_id: campaign.id,
            status: campaign.status,
            editor,
            active_section,
            unlocked: false,
            starts_at: campaign.starts_at,
            ends_at: campaign.ends_at,
        })
    }

    pub fn campaign_id(&self) -> Uuid {
        self.campaign_id
    }

    pub fn schema(&self) -> &SurveySchema {
        self.editor.schema()
    }

    pub fn editor(&self) -> &SchemaEditor {
        &self.editor
    }

    pub fn window(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        (self.starts_at, self.ends_at)
    }

    pub fn active_section(&self) -> Option<usize> {
        self.active_section
    }

    pub fn select_section(&mut self, index: usize) -> bool {
        if index >= self.editor.schema().sections.len() {
            return false;
        }
        self.active_section = Some(index);
        true
    }

    /// Allow edits on an active campaign for the rest of this session.
    /// Ended campaigns stay read-only.
    pub fn unlock(&mut self) {
        if self.status == CampaignStatus::Active && !self.unlocked {
            warn!(campaign_id = %self.campaign_id, "Edit lock overridden for active campaign");
        }
        self.unlocked = true;
    }

    pub fn lock(&mut self) {
        self.unlocked = false;
    }

    /// Whether the edit lock override was asserted for this session.
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn is_editable(&self) -> bool {
        match self.status {
            CampaignStatus::Draft => true,
            CampaignStatus::Active => self.unlocked,
            CampaignStatus::Ended => false,
        }
    }

    fn ensure_editable(&self) -> CampaignResult<()> {
        if self.is_editable() {
            Ok(())
        } else {
            Err(CampaignError::EditLocked {
                campaign_id: self.campaign_id,
                status: self.status.as_str().to_string(),
            })
        }
    }

    // ─── Structural edits ──────────────────────────────────────────────

    pub fn add_section(&mut self) -> CampaignResult<SectionId> {
        self.ensure_editable()?;
        let id = self.editor.add_section().ok_or_else(|| {
            CampaignError::validation(
                "sections",
                format!(
                    "at most {} sections are allowed",
                    self.editor.validator().max_sections()
                ),
            )
        })?;
        self.active_section.get_or_insert(0);
        Ok(id)
    }

    pub fn remove_section(&mut self, index: usize) -> CampaignResult<Option<Section>> {
        self.ensure_editable()?;
        let len = self.editor.schema().sections.len();
        let removed = self.editor.remove_section(index);
        if removed.is_some() {
            self.active_section = remap_active(self.active_section, IndexOp::Remove { index, len });
        }
        Ok(removed)
    }

    pub fn move_section(&mut self, from: usize, to: usize) -> CampaignResult<bool> {
        self.ensure_editable()?;
        let moved = self.editor.move_section(from, to);
        if moved {
            self.active_section = remap_active(self.active_section, IndexOp::Move { from, to });
        }
        Ok(moved)
    }

    /// Any other edit on the schema: questions, options, dependencies,
    /// section content.
    pub fn edit<T>(&mut self, f: impl FnOnce(&mut SchemaEditor) -> T) -> CampaignResult<T> {
        self.ensure_editable()?;
        Ok(f(&mut self.editor))
    }

    /// Bulk import. The current schema is kept when the document is invalid.
    pub fn import(&mut self, document: serde_json::Value) -> CampaignResult<()> {
        self.ensure_editable()?;
        self.editor.replace_schema(document)?;
        self.active_section = if self.editor.schema().sections.is_empty() {
            None
        } else {
            Some(0)
        };
        info!(
            campaign_id = %self.campaign_id,
            sections = self.editor.schema().sections.len(),
            "Survey schema imported"
        );
        Ok(())
    }

    pub fn set_window(
        &mut self,
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    ) -> CampaignResult<()> {
        self.ensure_editable()?;
        check_window(starts_at, ends_at)?;
        self.starts_at = starts_at;
        self.ends_at = ends_at;
        debug!(campaign_id = %self.campaign_id, "Campaign window updated");
        Ok(())
    }
}
