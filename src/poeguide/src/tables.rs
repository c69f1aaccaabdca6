//! Embedded lookup tables.
//!
//! Hand-maintained mappings between wiki identifiers and the data files'
//! canonical names, embedded at compile time from share/tables/ so they
//! can be extended without touching code.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;

const GEM_RENAMES_JSON: &str = include_str!("../../../share/tables/gem_renames.json");
const NPC_COSTS_JSON: &str = include_str!("../../../share/tables/npc_costs.json");
const ZONE_NAMES_JSON: &str = include_str!("../../../share/tables/zone_names.json");
const QUEST_SLUGS_JSON: &str = include_str!("../../../share/tables/quest_slugs.json");

/// Column order of the per-class reward columns on the Quest page
/// (columns 1-7 after the quest column).
pub const CLASS_COLUMNS: [&str; 7] = [
    "marauder", "witch", "scion", "ranger", "duelist", "shadow", "templar",
];

/// Korean class label -> class id, for individual quest pages.
pub static KR_CLASS_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("머라우더", "marauder"),
        ("위치", "witch"),
        ("사이온", "scion"),
        ("레인저", "ranger"),
        ("듀얼리스트", "duelist"),
        ("쉐도우", "shadow"),
        ("템플러", "templar"),
    ])
});

/// Vendor NPC and currency cost for a quest, keyed by the wiki slug.
#[derive(Debug, Clone, Deserialize)]
pub struct NpcCost {
    pub npc: String,
    pub cost: String,
}

/// Wiki English gem name -> catalog gem ID, for names that don't simply
/// lowercase (legacy renames and support-gem capitalization quirks).
pub static GEM_RENAMES: Lazy<HashMap<String, String>> =
    Lazy::new(|| serde_json::from_str(GEM_RENAMES_JSON).expect("gem_renames.json is valid JSON"));

/// Wiki quest slug -> vendor NPC name and currency cost.
pub static NPC_COSTS: Lazy<HashMap<String, NpcCost>> =
    Lazy::new(|| serde_json::from_str(NPC_COSTS_JSON).expect("npc_costs.json is valid JSON"));

/// English zone name -> Korean zone name (includes known spreadsheet
/// misspellings).
pub static ZONE_NAMES: Lazy<HashMap<String, String>> =
    Lazy::new(|| serde_json::from_str(ZONE_NAMES_JSON).expect("zone_names.json is valid JSON"));

/// Localized quest name (as it has appeared in gems.js over time) ->
/// wiki quest slug.
pub static QUEST_SLUGS: Lazy<HashMap<String, String>> =
    Lazy::new(|| serde_json::from_str(QUEST_SLUGS_JSON).expect("quest_slugs.json is valid JSON"));

/// Class id for a Korean class label, if it is one of the 7 classes.
pub fn class_id_for_kr(label: &str) -> Option<&'static str> {
    KR_CLASS_MAP.get(label).copied()
}
