//! Name/ID reconciliation between wiki identifiers and the gem catalog.

use crate::model::{Gem, GemColor, GemKind};
use crate::tables;
use std::collections::{BTreeMap, HashSet};

/// Convert a wiki English gem name to a catalog gem ID.
///
/// Renamed gems go through the exception table; everything else simply
/// lowercases. Total: unknown names never fail.
pub fn eng_to_gemid(eng_name: &str) -> String {
    match tables::GEM_RENAMES.get(eng_name) {
        Some(id) => id.clone(),
        None => eng_name.to_lowercase(),
    }
}

/// Best-effort inverse of [`eng_to_gemid`]: exception-table hit, else
/// title-case each underscore-separated word.
pub fn gemid_to_eng(gem_id: &str) -> String {
    if let Some((eng, _)) = tables::GEM_RENAMES.iter().find(|(_, id)| id.as_str() == gem_id) {
        return eng.clone();
    }
    gem_id
        .split('_')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join("_")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Gem metadata sighted while scraping, keyed by the wiki English name.
/// First sighting wins; later registrations of the same name are no-ops.
#[derive(Debug, Default)]
pub struct GemRegistry {
    entries: BTreeMap<String, GemSighting>,
}

#[derive(Debug, Clone)]
pub struct GemSighting {
    /// Localized display name from the anchor text.
    pub kr_name: String,
    /// The `gem_*` CSS class carried by the anchor.
    pub css_class: String,
}

impl GemRegistry {
    pub fn record(&mut self, eng_name: &str, kr_name: &str, css_class: &str) {
        self.entries.entry(eng_name.to_string()).or_insert_with(|| GemSighting {
            kr_name: kr_name.to_string(),
            css_class: css_class.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sightings in English-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &GemSighting)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// English names of every sighted gem, in order.
    pub fn eng_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Synthesize catalog entries for registered gems whose reconciled ID is
/// not in the existing catalog. Deduplicates by reconciled ID, so two raw
/// names renaming to the same ID yield one entry.
pub fn build_missing_gems(registry: &GemRegistry, existing: &[Gem]) -> Vec<Gem> {
    let mut known: HashSet<String> = existing.iter().map(|g| g.id.clone()).collect();
    let mut new_entries = Vec::new();

    for (eng_name, sighting) in registry.iter() {
        let id = eng_to_gemid(eng_name);
        if known.contains(&id) {
            continue;
        }

        let kind = if eng_name.contains("_Support") {
            GemKind::Support
        } else {
            GemKind::Skill
        };

        new_entries.push(Gem {
            id: id.clone(),
            name: sighting.kr_name.clone(),
            kind,
            color: GemColor::from_css_class(&sighting.css_class),
            icon: format!("{eng_name}.png"),
        });
        known.insert(id);
    }

    new_entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemid_renames_and_lowercases() {
        assert_eq!(eng_to_gemid("Ground_Slam"), "ground_slam");
        assert_eq!(eng_to_gemid("Old_Arctic_Armour"), "arctic_armour");
        assert_eq!(eng_to_gemid("High-Impact_Mine_Support"), "high-impact_mine_support");
    }

    #[test]
    fn gemid_is_idempotent_on_its_own_output() {
        for name in ["Ground_Slam", "Old_Phase_Run", "Cast_on_Death_Support", "Frostbolt"] {
            let id = eng_to_gemid(name);
            assert_eq!(eng_to_gemid(&id), id);
            assert_eq!(id, id.to_lowercase());
        }
    }

    #[test]
    fn gemid_to_eng_inverts_renames() {
        assert_eq!(gemid_to_eng("arctic_armour"), "Old_Arctic_Armour");
        assert_eq!(gemid_to_eng("molten_strike"), "Molten_Strike");
    }

    #[test]
    fn registry_first_sighting_wins() {
        let mut reg = GemRegistry::default();
        reg.record("Fireball", "화염구", "gem_red");
        reg.record("Fireball", "다른 이름", "gem_blue");
        let (_, sighting) = reg.iter().next().unwrap();
        assert_eq!(sighting.kr_name, "화염구");
        assert_eq!(sighting.css_class, "gem_red");
        assert_eq!(reg.len(), 1);
    }

    fn catalog_gem(id: &str) -> Gem {
        Gem {
            id: id.to_string(),
            name: "이름".to_string(),
            kind: GemKind::Skill,
            color: GemColor::Dex,
            icon: format!("{id}.png"),
        }
    }

    #[test]
    fn missing_gems_skip_known_and_dedupe_renames() {
        let mut reg = GemRegistry::default();
        reg.record("Ground_Slam", "대지 강타", "gem_red");
        reg.record("Old_Phase_Run", "위상 질주", "gem_green");
        // Renames to phase_run as well; must not produce a second entry.
        reg.record("Phase_Run", "위상 질주", "gem_green");

        let existing = vec![catalog_gem("ground_slam")];
        let new_gems = build_missing_gems(&reg, &existing);

        assert_eq!(new_gems.len(), 1);
        assert_eq!(new_gems[0].id, "phase_run");
        assert_eq!(new_gems[0].icon, "Old_Phase_Run.png");
    }

    #[test]
    fn missing_gems_classify_kind_and_color() {
        let mut reg = GemRegistry::default();
        reg.record("Melee_Physical_Damage_Support", "근접 물리 피해 보조", "gem_red");
        reg.record("Frostbolt", "서리화살", "gem_weird");

        let new_gems = build_missing_gems(&reg, &[]);
        let support = new_gems.iter().find(|g| g.id.contains("support")).unwrap();
        let skill = new_gems.iter().find(|g| g.id == "frostbolt").unwrap();

        assert_eq!(support.kind, GemKind::Support);
        assert_eq!(support.color, GemColor::Str);
        assert_eq!(skill.kind, GemKind::Skill);
        // Unrecognized CSS class falls back to dex.
        assert_eq!(skill.color, GemColor::Dex);
    }
}
