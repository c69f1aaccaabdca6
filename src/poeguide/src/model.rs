//! Data records shared across the pipelines.
//!
//! These mirror the literal records in the maintained data files:
//! `gems.js` (gem catalog plus quest/vendor reward sections),
//! `guide.js` (zone notes) and `gem_details.js` (tooltip details).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Gem kind as written in the `type:` field of a gems.js entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GemKind {
    Skill,
    Support,
}

impl GemKind {
    pub fn parse(s: &str) -> Self {
        if s == "support" {
            GemKind::Support
        } else {
            GemKind::Skill
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GemKind::Skill => "skill",
            GemKind::Support => "support",
        }
    }
}

impl fmt::Display for GemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gem color attribute, mapped from the `gem_*` CSS class on the wiki.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GemColor {
    Str,
    Dex,
    Int,
}

impl GemColor {
    pub fn parse(s: &str) -> Self {
        match s {
            "str" => GemColor::Str,
            "int" => GemColor::Int,
            _ => GemColor::Dex,
        }
    }

    /// Map a poedb CSS class to a color; unrecognized classes fall back
    /// to `dex`, matching the historical catalog entries.
    pub fn from_css_class(class: &str) -> Self {
        match class {
            "gem_red" => GemColor::Str,
            "gem_green" => GemColor::Dex,
            "gem_blue" => GemColor::Int,
            _ => GemColor::Dex,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GemColor::Str => "str",
            GemColor::Dex => "dex",
            GemColor::Int => "int",
        }
    }
}

impl fmt::Display for GemColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the gems.js gem catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gem {
    pub id: String,
    pub name: String,
    pub kind: GemKind,
    pub color: GemColor,
    pub icon: String,
}

/// A quest row scraped from a rewards table, with per-class gem lists
/// still keyed by the wiki's English gem names.
#[derive(Debug, Clone)]
pub struct RewardRow {
    /// Act number; `None` when it could not be resolved (rendered as 0).
    pub act: Option<u32>,
    /// Localized (Korean) quest name.
    pub quest_name: String,
    /// The wiki's internal English quest slug (e.g. `The_Caged_Brute`).
    pub quest_slug: String,
    /// Class id -> English gem names, only classes that had any.
    pub per_class: BTreeMap<String, Vec<String>>,
    /// Manual choice cap preserved across regenerations.
    pub max_select: Option<u32>,
    /// Page order, used to re-sort after deep-fetched rows are appended.
    pub pos: usize,
}

/// A rewards-table row that carried an item but no per-class gem data.
#[derive(Debug, Clone)]
pub struct ItemOnlyRow {
    pub act: Option<u32>,
    pub quest_name: String,
    pub quest_slug: String,
    pub pos: usize,
}

/// One zone entry of the campaign guide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideEntry {
    pub zone_en: String,
    pub zone_kr: Option<String>,
    pub todo: String,
    pub notes: String,
    pub layout: String,
    pub video: String,
}

/// Tooltip details for one gem, as stored in gem_details.js.
///
/// Optional fields are omitted from the store entirely when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GemDetail {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub mods: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_mod: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eng_name: Option<String>,
}

/// The scraped snapshot file (`poedb_rewards.json`) the validator diffs
/// against.
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "questRewards")]
    pub quest_rewards: Vec<SnapshotQuest>,
    #[serde(rename = "vendorRewards")]
    pub vendor_rewards: Vec<SnapshotQuest>,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotQuest {
    pub act: u32,
    #[serde(rename = "questName")]
    pub quest_name: String,
    #[serde(rename = "questEngName")]
    pub quest_slug: String,
    /// Pairs of `[engName, [classNames...]]`.
    pub gems: Vec<(String, Vec<String>)>,
}
