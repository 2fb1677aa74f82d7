use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::calendar::DayZone;
use crate::compose::TemplateKind;
use crate::error::{CockpitError, Result};
use crate::metrics::EngagementWeights;
use crate::variation::PhraseCatalog;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub bluesky_max_chars: usize,
    pub instagram_cta: String,
    pub instagram_tag_style: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            bluesky_max_chars: 300,
            instagram_cta: "Save this post and share it with a friend.".to_string(),
            instagram_tag_style: "inline".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Offset used to decide which calendar day a timestamp falls on.
    /// Unset means the machine's local zone, DST included.
    pub utc_offset_minutes: Option<i32>,
}

impl CalendarConfig {
    pub fn zone(&self) -> DayZone {
        self.utc_offset_minutes
            .and_then(|minutes| FixedOffset::east_opt(minutes * 60))
            .map(DayZone::Fixed)
            .unwrap_or(DayZone::Local)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_base: String,
    pub model: String,
    pub temperature: f64,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:11434/v1".to_string(),
            model: "llama3.1".to_string(),
            temperature: 0.7,
            timeout_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CockpitConfig {
    pub platforms: PlatformConfig,
    pub catalog: PhraseCatalog,
    pub hashtag_packs: BTreeMap<String, Vec<String>>,
    pub templates: BTreeMap<String, String>,
    pub calendar: CalendarConfig,
    pub scoring: EngagementWeights,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
}

impl Default for CockpitConfig {
    fn default() -> Self {
        Self {
            platforms: PlatformConfig::default(),
            catalog: PhraseCatalog::default(),
            hashtag_packs: default_hashtag_packs(),
            templates: TemplateKind::ALL
                .iter()
                .map(|kind| (kind.id().to_string(), kind.display_name().to_string()))
                .collect(),
            calendar: CalendarConfig::default(),
            scoring: EngagementWeights::default(),
            storage: StorageConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl CockpitConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>)> {
        let config_path = path.or_else(default_config_path);
        let mut config = if let Some(path) = config_path.as_ref() {
            if path.exists() {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| CockpitError::Config(format!("failed to read config: {}", err)))?;
                toml::from_str(&contents)
                    .map_err(|err| CockpitError::Config(format!("failed to parse config: {}", err)))?
            } else {
                CockpitConfig::default()
            }
        } else {
            CockpitConfig::default()
        };

        config.apply_env_overrides();
        // A zero ceiling would leave no room for even the fallback draft.
        config.platforms.bluesky_max_chars = config.platforms.bluesky_max_chars.max(1);
        Ok((config, config_path))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| CockpitError::Config(format!("failed to serialize config: {}", err)))?;
        std::fs::write(path, payload)?;
        Ok(())
    }

    pub fn pack_tags(&self, name: &str) -> Option<&[String]> {
        self.hashtag_packs.get(name).map(|tags| tags.as_slice())
    }

    pub fn template_name<'a>(&'a self, template_id: &'a str) -> &'a str {
        self.templates
            .get(template_id)
            .map(|name| name.as_str())
            .unwrap_or(template_id)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var("COCKPIT_DATA_DIR") {
            if !dir.trim().is_empty() {
                self.storage.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(max) = env::var("BLUESKY_MAX_CHARS") {
            if let Ok(value) = max.parse::<usize>() {
                self.platforms.bluesky_max_chars = value;
            }
        }
        if let Ok(style) = env::var("INSTAGRAM_TAG_STYLE") {
            if !style.trim().is_empty() {
                self.platforms.instagram_tag_style = style;
            }
        }
        if let Ok(offset) = env::var("CALENDAR_UTC_OFFSET_MINUTES") {
            if let Ok(value) = offset.parse::<i32>() {
                self.calendar.utc_offset_minutes = Some(value);
            }
        }
        if let Ok(api_base) = env::var("LLM_API_BASE") {
            if !api_base.trim().is_empty() {
                self.llm.api_base = api_base;
            }
        }
        if let Ok(model) = env::var("LLM_MODEL") {
            if !model.trim().is_empty() {
                self.llm.model = model;
            }
        }
    }
}

fn default_hashtag_packs() -> BTreeMap<String, Vec<String>> {
    let packs: [(&str, &[&str]); 4] = [
        ("local", &["organize", "community", "mutualaid"]),
        ("democracy", &["democracy", "votingrights", "civics"]),
        ("rally", &["rally", "showup", "organize"]),
        ("wins", &["communitywin", "organizingworks"]),
    ];
    packs
        .iter()
        .map(|(name, tags)| {
            (
                name.to_string(),
                tags.iter().map(|tag| tag.to_string()).collect(),
            )
        })
        .collect()
}

fn default_config_path() -> Option<PathBuf> {
    env::var("COCKPIT_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/cockpit.toml")))
}
