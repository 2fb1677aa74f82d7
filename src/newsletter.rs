//! Newsletter issue assembly: blocks of raw input grouped under fixed sections,
//! turned into one model prompt per section, and stitched back together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::assist::strip_code_fences;
use crate::error::{CockpitError, Result};
use crate::stable_id;

pub const DEFAULT_SECTION: &str = "democracy_watch";
pub const TITLE_OPTIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub id: &'static str,
    pub name: &'static str,
    pub rules: &'static str,
}

pub const SECTIONS: [Section; 8] = [
    Section {
        id: "opening",
        name: "Opening",
        rules: "Write a punchy opening paragraph (2-5 sentences). Set context for the issue/topic. No lists unless absolutely needed.",
    },
    Section {
        id: "democracy_watch",
        name: "Democracy Watch",
        rules: "Summarize key developments clearly. Prefer short paragraphs. Use bullets only if it improves clarity. Include only facts present in input.",
    },
    Section {
        id: "important_read_first",
        name: "Important / Read First",
        rules: "Lead with the single most important thing the reader must know. Then 2-5 bullets with the essentials. Keep it direct and actionable.",
    },
    Section {
        id: "community",
        name: "Community",
        rules: "Highlight community updates, mutual aid, local context, wins, needs. Friendly but serious. 1-3 short paragraphs.",
    },
    Section {
        id: "call_to_action",
        name: "Call to Action",
        rules: "Make clear asks. Use bullets. Avoid illegal instructions or calls for violence. Focus on sustainable actions: boycott targets, mutual aid, showing up, calling reps.",
    },
    Section {
        id: "resources_optional",
        name: "Resources (Optional)",
        rules: "List helpful links/resources with 1 short line of context each. Only use links provided in input. Do not invent links.",
    },
    Section {
        id: "upcoming_events_optional",
        name: "Upcoming Events (Optional)",
        rules: "List upcoming events from input. Bullets. If no dates/locations are provided, do not invent them.",
    },
    Section {
        id: "closing_optional",
        name: "Closing (Optional)",
        rules: "Close with a short grounding message and a reminder to stay involved. 1 short paragraph. No slogans unless present in input.",
    },
];

pub fn section(id: &str) -> Option<&'static Section> {
    SECTIONS.iter().find(|section| section.id == id)
}

pub fn section_name(id: &str) -> &str {
    section(id).map(|section| section.name).unwrap_or(id)
}

pub fn tone_guidance(tone: &str) -> &'static str {
    match tone {
        "urgent" => "Tone: urgent, direct, clear. No panic. No exaggeration.",
        "hopeful" => "Tone: hopeful, grounded, practical. Avoid empty optimism.",
        "angry_safe" => "Tone: angry but safe. Channel outrage into constructive, lawful action. No insults, hate, or violence.",
        _ => "Tone: firm, serious, confident, community-minded.",
    }
}

pub fn length_guidance(length: &str) -> &'static str {
    match length {
        "short" => "Length: short. Keep it tight.",
        "long" => "Length: long. Add helpful structure and detail, but stay concise.",
        _ => "Length: medium. Balanced clarity and brevity.",
    }
}

pub fn system_prompt() -> String {
    [
        "You are an assistant helping draft a newsletter.",
        "Output MUST be plain text (no JSON).",
        "Be factual. Don't invent names/dates/places/claims not present in input.",
        "If something is missing, leave it out rather than guessing.",
        "No hate. No calls for violence.",
        "Do not include markdown code fences.",
    ]
    .join(" ")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsletterBlock {
    pub id: String,
    pub section_id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub links: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockPatch {
    pub section_id: Option<String>,
    pub label: Option<String>,
    pub links: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// One prompt ready to send, tagged with the section it fills.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionJob {
    pub section_id: &'static str,
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsletterIssue {
    pub issue: String,
    pub tone: String,
    pub length: String,
    pub blocks: Vec<NewsletterBlock>,
    pub outputs: BTreeMap<String, String>,
    pub title_output: String,
}

impl Default for NewsletterIssue {
    fn default() -> Self {
        Self {
            issue: String::new(),
            tone: "firm".to_string(),
            length: "medium".to_string(),
            blocks: Vec::new(),
            outputs: SECTIONS
                .iter()
                .map(|section| (section.id.to_string(), String::new()))
                .collect(),
            title_output: String::new(),
        }
    }
}

impl NewsletterIssue {
    pub fn add_block(&mut self, section_id: Option<&str>, now: DateTime<Utc>) -> &NewsletterBlock {
        let id = stable_id(
            "block",
            &format!("{}:{}", now.timestamp_millis(), self.blocks.len()),
        );
        let section_id = known_section(section_id.unwrap_or(DEFAULT_SECTION));
        self.blocks.push(NewsletterBlock {
            id,
            section_id,
            label: String::new(),
            links: String::new(),
            notes: String::new(),
        });
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn update_block(&mut self, block_id: &str, patch: BlockPatch) -> Result<&NewsletterBlock> {
        let block = self
            .blocks
            .iter_mut()
            .find(|block| block.id == block_id)
            .ok_or_else(|| CockpitError::BlockNotFound(block_id.to_string()))?;
        if let Some(section_id) = patch.section_id {
            block.section_id = known_section(&section_id);
        }
        if let Some(label) = patch.label {
            block.label = label;
        }
        if let Some(links) = patch.links {
            block.links = links;
        }
        if let Some(notes) = patch.notes {
            block.notes = notes;
        }
        Ok(block)
    }

    pub fn delete_block(&mut self, block_id: &str) -> Result<NewsletterBlock> {
        let index = self.block_index(block_id)?;
        Ok(self.blocks.remove(index))
    }

    /// Moving past either end leaves the order unchanged.
    pub fn move_block(&mut self, block_id: &str, direction: MoveDirection) -> Result<()> {
        let index = self.block_index(block_id)?;
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => Some(index + 1).filter(|next| *next < self.blocks.len()),
        };
        if let Some(target) = target {
            self.blocks.swap(index, target);
        }
        Ok(())
    }

    /// Blocks per section in catalog order; sections without blocks are omitted.
    pub fn blocks_by_section(&self) -> Vec<(&'static Section, Vec<&NewsletterBlock>)> {
        SECTIONS
            .iter()
            .map(|section| {
                let blocks = self
                    .blocks
                    .iter()
                    .filter(|block| known_section(&block.section_id) == section.id)
                    .collect::<Vec<_>>();
                (section, blocks)
            })
            .filter(|(_, blocks)| !blocks.is_empty())
            .collect()
    }

    /// Prompts for every section that has blocks, in the order they should be run.
    pub fn section_jobs(&self) -> Result<Vec<SectionJob>> {
        if self.issue.trim().is_empty() {
            return Err(CockpitError::Newsletter(
                "add an issue/topic first".to_string(),
            ));
        }
        if self.blocks.is_empty() {
            return Err(CockpitError::Newsletter(
                "add at least one block".to_string(),
            ));
        }

        let system = system_prompt();
        Ok(self
            .blocks_by_section()
            .into_iter()
            .map(|(section, blocks)| SectionJob {
                section_id: section.id,
                system: system.clone(),
                user: self.section_prompt(section, &blocks),
            })
            .collect())
    }

    fn section_prompt(&self, section: &Section, blocks: &[&NewsletterBlock]) -> String {
        [
            format!("Issue/Topic: {}", self.issue),
            tone_guidance(&self.tone).to_string(),
            length_guidance(&self.length).to_string(),
            String::new(),
            format!("Section: {} ({})", section.name, section.id),
            format!("Rules: {}", section.rules),
            String::new(),
            "INPUT BLOCKS:".to_string(),
            format_blocks_for_prompt(blocks),
            String::new(),
            "Write the final section copy now.".to_string(),
        ]
        .join("\n")
    }

    pub fn title_prompt(&self) -> Result<(String, String)> {
        let combined = self.combined_outputs();
        if combined.is_empty() {
            return Err(CockpitError::Newsletter(
                "generate section outputs first".to_string(),
            ));
        }
        let issue = if self.issue.trim().is_empty() {
            "(none)"
        } else {
            self.issue.as_str()
        };
        let user = [
            format!("Issue/Topic: {}", issue),
            tone_guidance(&self.tone).to_string(),
            String::new(),
            format!(
                "Using the newsletter content below, generate exactly {} subject/title options.",
                TITLE_OPTIONS
            ),
            format!(
                "Return a numbered list only (1-{}). No extra commentary.",
                TITLE_OPTIONS
            ),
            String::new(),
            "NEWSLETTER CONTENT:".to_string(),
            combined,
        ]
        .join("\n");
        Ok((system_prompt(), user))
    }

    pub fn set_output(&mut self, section_id: &str, raw: &str) {
        if section(section_id).is_none() {
            warn!(section = %section_id, "output for unknown newsletter section");
        }
        self.outputs
            .insert(section_id.to_string(), strip_code_fences(raw));
    }

    pub fn set_title_output(&mut self, raw: &str) {
        self.title_output = strip_code_fences(raw);
    }

    /// Every non-empty section as `Name\ntext`, in catalog order.
    pub fn compose_all(&self) -> String {
        SECTIONS
            .iter()
            .filter_map(|section| {
                let text = self.outputs.get(section.id)?.trim();
                if text.is_empty() {
                    None
                } else {
                    Some(format!("{}\n{}", section.name, text))
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }

    fn combined_outputs(&self) -> String {
        SECTIONS
            .iter()
            .filter_map(|section| self.outputs.get(section.id))
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn block_index(&self, block_id: &str) -> Result<usize> {
        self.blocks
            .iter()
            .position(|block| block.id == block_id)
            .ok_or_else(|| CockpitError::BlockNotFound(block_id.to_string()))
    }
}

pub fn format_blocks_for_prompt(blocks: &[&NewsletterBlock]) -> String {
    blocks
        .iter()
        .enumerate()
        .map(|(idx, block)| {
            let title = block.label.trim();
            let links = block.links.trim();
            let notes = block.notes.trim();
            [
                format!("BLOCK {}:", idx + 1),
                if title.is_empty() {
                    "Title: (none)".to_string()
                } else {
                    format!("Title: {}", title)
                },
                if links.is_empty() {
                    "Links: (none)".to_string()
                } else {
                    format!("Links:\n{}", links)
                },
                if notes.is_empty() {
                    "Notes: (none)".to_string()
                } else {
                    format!("Notes:\n{}", notes)
                },
                String::new(),
            ]
            .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn known_section(section_id: &str) -> String {
    match section(section_id.trim()) {
        Some(section) => section.id.to_string(),
        None => DEFAULT_SECTION.to_string(),
    }
}
