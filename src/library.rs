use tracing::info;

use crate::error::{CockpitError, Result};
use crate::tags::char_len;
use crate::{Draft, Platform};

/// Saved drafts, kept apart from transient generation results.
#[derive(Debug, Clone, Default)]
pub struct DraftLibrary {
    drafts: Vec<Draft>,
}

impl DraftLibrary {
    pub fn new(drafts: Vec<Draft>) -> Self {
        Self { drafts }
    }

    pub fn drafts(&self) -> &[Draft] {
        &self.drafts
    }

    pub fn into_drafts(self) -> Vec<Draft> {
        self.drafts
    }

    /// Newest first.
    pub fn list(&self) -> Vec<&Draft> {
        let mut drafts: Vec<&Draft> = self.drafts.iter().collect();
        drafts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        drafts
    }

    pub fn get(&self, draft_id: &str) -> Option<&Draft> {
        self.drafts.iter().find(|draft| draft.id == draft_id)
    }

    /// Saving a draft whose id is already present replaces the stored copy.
    pub fn save(&mut self, draft: Draft) {
        info!(draft = %draft.id, "saved draft");
        match self.drafts.iter_mut().find(|stored| stored.id == draft.id) {
            Some(stored) => *stored = draft,
            None => self.drafts.push(draft),
        }
    }

    pub fn update_text(&mut self, draft_id: &str, text: &str, bluesky_max_chars: usize) -> Result<&Draft> {
        let draft = self
            .drafts
            .iter_mut()
            .find(|draft| draft.id == draft_id)
            .ok_or_else(|| CockpitError::DraftNotFound(draft_id.to_string()))?;
        let len = char_len(text);
        if draft.platform == Platform::Bluesky && len > bluesky_max_chars {
            return Err(CockpitError::TextTooLong {
                len,
                max: bluesky_max_chars,
            });
        }
        draft.text = text.to_string();
        Ok(draft)
    }

    pub fn delete(&mut self, draft_id: &str) -> Result<Draft> {
        let index = self
            .drafts
            .iter()
            .position(|draft| draft.id == draft_id)
            .ok_or_else(|| CockpitError::DraftNotFound(draft_id.to_string()))?;
        info!(draft = %draft_id, "deleted draft");
        Ok(self.drafts.remove(index))
    }
}
