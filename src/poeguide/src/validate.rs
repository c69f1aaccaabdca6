//! Diff the quest/vendor reward sections of gems.js against a scraped
//! snapshot (`poedb_rewards.json`).
//!
//! gems.js is parsed leniently with regexes plus string-aware bracket
//! matching, never executed. Two historical reward shapes are accepted:
//! the current per-class map (`rewards: { marauder: ["id"] }`) and the
//! legacy gem list (`rewards: [{ gemId: "id", classes: ["marauder"] }]`).
//! Both normalize to gem ID -> sorted class list before comparing.

use crate::model::SnapshotQuest;
use crate::reconcile::eng_to_gemid;
use crate::sections::matching_bracket;
use crate::tables::QUEST_SLUGS;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

static GEM_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{\s*id:\s*"([^"]+)",\s*name:\s*"([^"]+)""#).expect("gem name regex"));

static QUEST_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{\s*act:\s*(\d+),\s*questName:\s*"([^"]+)""#).expect("quest header regex"));

static REWARDS_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"rewards:\s*([\[{])").expect("rewards open regex"));

static LEGACY_GEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{\s*gemId:\s*"([^"]+)",\s*classes:\s*\[([^\]]*)\]\s*\}"#).expect("legacy gem regex")
});

static CLASS_LIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([a-z_]+)\s*:\s*\[([^\]]*)\]"#).expect("class list regex"));

/// One quest record as written in gems.js, rewards normalized to
/// gem ID -> sorted class list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileQuest {
    pub act: u32,
    pub quest_name: String,
    pub gems: BTreeMap<String, Vec<String>>,
}

/// `id -> name` for every catalog entry in the file text.
pub fn gem_names(text: &str) -> BTreeMap<String, String> {
    GEM_NAME_RE
        .captures_iter(text)
        .map(|m| (m[1].to_string(), m[2].to_string()))
        .collect()
}

fn split_quoted_list(raw: &str) -> Vec<String> {
    let mut items: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().trim_matches('"').to_string())
        .filter(|s| !s.is_empty())
        .collect();
    items.sort();
    items
}

fn parse_rewards_body(body: &str, shape: &str) -> BTreeMap<String, Vec<String>> {
    let mut gems = BTreeMap::new();
    if shape == "[" {
        for m in LEGACY_GEM_RE.captures_iter(body) {
            gems.insert(m[1].to_string(), split_quoted_list(&m[2]));
        }
    } else {
        for m in CLASS_LIST_RE.captures_iter(body) {
            let class = m[1].to_string();
            for id in split_quoted_list(&m[2]) {
                gems.entry(id).or_insert_with(Vec::new).push(class.clone());
            }
        }
        for classes in gems.values_mut() {
            classes.sort();
        }
    }
    gems
}

/// Parse `questRewards` or `vendorRewards` out of the file text. An
/// absent section yields no quests rather than an error, matching the
/// lenient read-side of the splicer.
pub fn parse_rewards_section(text: &str, section_name: &str) -> Vec<FileQuest> {
    let open_re = Regex::new(&format!(r"{section_name}:\s*\[")).expect("section regex");
    let Some(m) = open_re.find(text) else {
        return Vec::new();
    };
    let open = m.end() - 1;
    let Some(close) = matching_bracket(text, open, b'[', b']') else {
        return Vec::new();
    };
    let section = &text[open + 1..close];

    let mut quests = Vec::new();
    for qm in QUEST_HEADER_RE.captures_iter(section) {
        let header = qm.get(0).map(|g| g.start()).unwrap_or(0);
        let rest = &section[header..];
        let Some(rm) = REWARDS_OPEN_RE.captures(rest) else {
            continue;
        };
        let shape = rm.get(1).map(|g| g.as_str()).unwrap_or("[");
        let body_open = header + rm.get(0).map_or(0, |g| g.end()) - 1;
        let (open_ch, close_ch) = if shape == "[" { (b'[', b']') } else { (b'{', b'}') };
        let Some(body_close) = matching_bracket(section, body_open, open_ch, close_ch) else {
            continue;
        };
        let body = &section[body_open + 1..body_close];

        quests.push(FileQuest {
            act: qm[1].parse().unwrap_or(0),
            quest_name: qm[2].to_string(),
            gems: parse_rewards_body(body, shape),
        });
    }
    quests
}

/// A normalized snapshot quest, keyed by the wiki slug.
#[derive(Debug, Clone)]
pub struct PoedbQuest {
    pub quest_name: String,
    pub act: u32,
    pub gems: BTreeMap<String, Vec<String>>,
}

/// Snapshot quests as `(slug, quest)` pairs in snapshot order, gem names
/// reconciled to catalog IDs, classes sorted. A repeated slug replaces
/// the earlier entry.
pub fn build_poedb_quest_map(quests: &[SnapshotQuest]) -> Vec<(String, PoedbQuest)> {
    let mut out: Vec<(String, PoedbQuest)> = Vec::new();
    for q in quests {
        let mut gems = BTreeMap::new();
        for (eng, classes) in &q.gems {
            let mut classes = classes.clone();
            classes.sort();
            gems.insert(eng_to_gemid(eng), classes);
        }
        let quest = PoedbQuest {
            quest_name: q.quest_name.clone(),
            act: q.act,
            gems,
        };
        if let Some(slot) = out.iter_mut().find(|(slug, _)| *slug == q.quest_slug) {
            slot.1 = quest;
        } else {
            out.push((q.quest_slug.clone(), quest));
        }
    }
    out
}

/// One finding from the diff. `UnknownGems` is informational only; the
/// rest count toward the exit status.
#[derive(Debug, Clone)]
pub enum Issue {
    NoMapping {
        quest_name: String,
        act: u32,
    },
    NameMismatch {
        act: u32,
        file_name: String,
        snapshot_name: String,
        slug: String,
    },
    SnapshotMissing {
        section: String,
        slug: String,
        snapshot_name: String,
    },
    MissingGems {
        act: u32,
        quest_name: String,
        gems: Vec<(String, String, Vec<String>)>,
    },
    UnknownGems {
        act: u32,
        quest_name: String,
        gems: Vec<(String, Vec<String>)>,
    },
    ExtraGems {
        act: u32,
        quest_name: String,
        gems: Vec<(String, String, Vec<String>)>,
    },
    ClassDiff {
        act: u32,
        quest_name: String,
        gem_id: String,
        gem_name: String,
        file_classes: Vec<String>,
        snapshot_classes: Vec<String>,
    },
    MissingQuest {
        act: u32,
        quest_name: String,
        slug: String,
        gem_count: usize,
    },
}

impl Issue {
    /// Number of counted findings this issue contributes.
    pub fn counted(&self) -> usize {
        match self {
            Issue::UnknownGems { .. } => 0,
            Issue::MissingGems { gems, .. } | Issue::ExtraGems { gems, .. } => gems.len(),
            _ => 1,
        }
    }
}

fn class_list(classes: &[String]) -> String {
    format!("[{}]", classes.join(", "))
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::NoMapping { quest_name, act } => write!(
                f,
                "[!] gems.js quest '{quest_name}' (Act {act}): NO MAPPING to poedb quest"
            ),
            Issue::NameMismatch {
                act,
                file_name,
                snapshot_name,
                slug,
            } => write!(
                f,
                "[QUEST NAME] Act {act}: '{file_name}' should be '{snapshot_name}' ({slug})"
            ),
            Issue::SnapshotMissing {
                section,
                slug,
                snapshot_name,
            } => write!(f, "[!] poedb has no {section} data for '{slug}' ({snapshot_name})"),
            Issue::MissingGems { act, quest_name, gems } => {
                write!(f, "[MISSING GEMS] Act {act} '{quest_name}' - in poedb but not gems.js:")?;
                for (id, name, classes) in gems {
                    write!(f, "\n  + {id} ({name}) {}", class_list(classes))?;
                }
                Ok(())
            }
            Issue::UnknownGems { act, quest_name, gems } => {
                write!(f, "[UNKNOWN GEMS] Act {act} '{quest_name}' - in poedb, not in gems[] array:")?;
                for (id, classes) in gems {
                    write!(f, "\n  ? {id} {}", class_list(classes))?;
                }
                Ok(())
            }
            Issue::ExtraGems { act, quest_name, gems } => {
                write!(f, "[EXTRA GEMS] Act {act} '{quest_name}' - in gems.js but not poedb:")?;
                for (id, name, classes) in gems {
                    write!(f, "\n  - {id} ({name}) {}", class_list(classes))?;
                }
                Ok(())
            }
            Issue::ClassDiff {
                act,
                quest_name,
                gem_id,
                gem_name,
                file_classes,
                snapshot_classes,
            } => {
                let added: Vec<String> = snapshot_classes
                    .iter()
                    .filter(|c| !file_classes.contains(c))
                    .cloned()
                    .collect();
                let removed: Vec<String> = file_classes
                    .iter()
                    .filter(|c| !snapshot_classes.contains(c))
                    .cloned()
                    .collect();
                let mut parts = Vec::new();
                if !added.is_empty() {
                    parts.push(format!("+{}", class_list(&added)));
                }
                if !removed.is_empty() {
                    parts.push(format!("-{}", class_list(&removed)));
                }
                write!(f, "[CLASS DIFF] Act {act} '{quest_name}' {gem_id} ({gem_name})")?;
                write!(f, "\n  gems.js:  {}", class_list(file_classes))?;
                write!(f, "\n  poedb:    {}", class_list(snapshot_classes))?;
                write!(f, "\n  diff:     {}", parts.join(", "))
            }
            Issue::MissingQuest {
                act,
                quest_name,
                slug,
                gem_count,
            } => write!(
                f,
                "[MISSING QUEST] Act {act} '{quest_name}' ({slug}) exists in poedb but not in gems.js\n  Has {gem_count} gems"
            ),
        }
    }
}

fn name_of(gem_names: &BTreeMap<String, String>, id: &str) -> String {
    gem_names.get(id).cloned().unwrap_or_else(|| "?".to_string())
}

/// Diff one section of gems.js against the matching snapshot list.
pub fn compare_section(
    section_name: &str,
    file_quests: &[FileQuest],
    snapshot_quests: &[SnapshotQuest],
    gem_names: &BTreeMap<String, String>,
    snapshot_names: &BTreeMap<String, String>,
) -> Vec<Issue> {
    let poedb_map = build_poedb_quest_map(snapshot_quests);
    let mut issues = Vec::new();
    let mut matched: HashSet<&str> = HashSet::new();

    for fq in file_quests {
        let Some(slug) = QUEST_SLUGS.get(&fq.quest_name) else {
            issues.push(Issue::NoMapping {
                quest_name: fq.quest_name.clone(),
                act: fq.act,
            });
            continue;
        };
        let canonical = snapshot_names
            .get(slug)
            .cloned()
            .unwrap_or_else(|| "???".to_string());

        if fq.quest_name != canonical {
            issues.push(Issue::NameMismatch {
                act: fq.act,
                file_name: fq.quest_name.clone(),
                snapshot_name: canonical.clone(),
                slug: slug.clone(),
            });
        }

        let Some((slug_key, pq)) = poedb_map.iter().find(|(s, _)| s == slug) else {
            issues.push(Issue::SnapshotMissing {
                section: section_name.to_string(),
                slug: slug.clone(),
                snapshot_name: canonical,
            });
            continue;
        };
        matched.insert(slug_key.as_str());

        let mut known_missing = Vec::new();
        let mut unknown_missing = Vec::new();
        for (id, classes) in &pq.gems {
            if fq.gems.contains_key(id) {
                continue;
            }
            if gem_names.contains_key(id) {
                known_missing.push((id.clone(), name_of(gem_names, id), classes.clone()));
            } else {
                unknown_missing.push((id.clone(), classes.clone()));
            }
        }
        if !known_missing.is_empty() {
            issues.push(Issue::MissingGems {
                act: fq.act,
                quest_name: canonical.clone(),
                gems: known_missing,
            });
        }
        if !unknown_missing.is_empty() {
            issues.push(Issue::UnknownGems {
                act: fq.act,
                quest_name: canonical.clone(),
                gems: unknown_missing,
            });
        }

        let extra: Vec<_> = fq
            .gems
            .iter()
            .filter(|(id, _)| !pq.gems.contains_key(*id))
            .map(|(id, classes)| (id.clone(), name_of(gem_names, id), classes.clone()))
            .collect();
        if !extra.is_empty() {
            issues.push(Issue::ExtraGems {
                act: fq.act,
                quest_name: canonical.clone(),
                gems: extra,
            });
        }

        for (id, file_classes) in &fq.gems {
            let Some(snapshot_classes) = pq.gems.get(id) else {
                continue;
            };
            if file_classes != snapshot_classes {
                issues.push(Issue::ClassDiff {
                    act: fq.act,
                    quest_name: canonical.clone(),
                    gem_id: id.clone(),
                    gem_name: name_of(gem_names, id),
                    file_classes: file_classes.clone(),
                    snapshot_classes: snapshot_classes.clone(),
                });
            }
        }
    }

    for (slug, pq) in &poedb_map {
        if !matched.contains(slug.as_str()) && !pq.gems.is_empty() {
            issues.push(Issue::MissingQuest {
                act: pq.act,
                quest_name: pq.quest_name.clone(),
                slug: slug.clone(),
                gem_count: pq.gems.len(),
            });
        }
    }

    issues
}

/// Canonical localized quest names by slug, pooled from both snapshot
/// sections.
pub fn snapshot_quest_names(
    quest_rewards: &[SnapshotQuest],
    vendor_rewards: &[SnapshotQuest],
) -> BTreeMap<String, String> {
    quest_rewards
        .iter()
        .chain(vendor_rewards.iter())
        .map(|q| (q.quest_slug.clone(), q.quest_name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEMS_JS: &str = r#"
const GEM_DATA = {
  gems: [
    { id: "clarity", name: "명료함", type: "skill", color: "int", icon: "Clarity.png" },
    { id: "fireball", name: "화염구", type: "skill", color: "int", icon: "Fireball.png" },
    { id: "ground_slam", name: "대지 강타", type: "skill", color: "str", icon: "Ground_Slam.png" },
  ],
  questRewards: [
    { act: 1, questName: "눈 앞의 적", rewards: {
      marauder: ["ground_slam"],
      witch: ["fireball"],
    }},
    { act: 1, questName: "감금된 덩치", rewards: [
      { gemId: "clarity", classes: ["witch", "templar"] },
    ]},
  ],
  vendorRewards: [
  ],
};
"#;

    fn snapshot_quest(slug: &str, name: &str, gems: &[(&str, &[&str])]) -> SnapshotQuest {
        SnapshotQuest {
            act: 1,
            quest_name: name.to_string(),
            quest_slug: slug.to_string(),
            gems: gems
                .iter()
                .map(|(g, cls)| {
                    (g.to_string(), cls.iter().map(|c| c.to_string()).collect())
                })
                .collect(),
        }
    }

    #[test]
    fn both_reward_shapes_normalize_to_the_same_form() {
        let quests = parse_rewards_section(GEMS_JS, "questRewards");
        assert_eq!(quests.len(), 2);
        assert_eq!(
            quests[0].gems.get("ground_slam"),
            Some(&vec!["marauder".to_string()])
        );
        assert_eq!(
            quests[1].gems.get("clarity"),
            Some(&vec!["templar".to_string(), "witch".to_string()])
        );
    }

    #[test]
    fn empty_class_list_parses_as_zero_classes() {
        let text = r#"
  questRewards: [
    { act: 3, questName: "눈 앞의 적", rewards: [
      { gemId: "clarity", classes: [] },
    ]},
  ],
"#;
        let quests = parse_rewards_section(text, "questRewards");
        assert_eq!(quests.len(), 1);
        assert_eq!(quests[0].gems.get("clarity"), Some(&Vec::new()));
    }

    #[test]
    fn absent_section_parses_to_no_quests() {
        assert!(parse_rewards_section("const X = 1;", "questRewards").is_empty());
    }

    #[test]
    fn gem_names_map_from_catalog() {
        let names = gem_names(GEMS_JS);
        assert_eq!(names.get("clarity").map(String::as_str), Some("명료함"));
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn matching_data_reports_no_issues() {
        let file = parse_rewards_section(GEMS_JS, "questRewards");
        let snapshot = vec![
            snapshot_quest(
                "Enemy_at_the_Gate",
                "눈 앞의 적",
                &[("Ground_Slam", &["marauder"]), ("Fireball", &["witch"])],
            ),
            snapshot_quest("The_Caged_Brute", "감금된 덩치", &[("Clarity", &["templar", "witch"])]),
        ];
        let names = gem_names(GEMS_JS);
        let canon = snapshot_quest_names(&snapshot, &[]);
        let issues = compare_section("questRewards", &file, &snapshot, &names, &canon);
        assert!(issues.is_empty(), "unexpected: {issues:?}");
    }

    #[test]
    fn unknown_gems_are_informational_only() {
        let file = parse_rewards_section(GEMS_JS, "questRewards");
        let snapshot = vec![
            snapshot_quest(
                "Enemy_at_the_Gate",
                "눈 앞의 적",
                &[
                    ("Ground_Slam", &["marauder"]),
                    ("Fireball", &["witch"]),
                    ("Brand_New_Gem", &["witch"]),
                ],
            ),
            snapshot_quest("The_Caged_Brute", "감금된 덩치", &[("Clarity", &["templar", "witch"])]),
        ];
        let names = gem_names(GEMS_JS);
        let canon = snapshot_quest_names(&snapshot, &[]);
        let issues = compare_section("questRewards", &file, &snapshot, &names, &canon);
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], Issue::UnknownGems { .. }));
        assert_eq!(issues.iter().map(Issue::counted).sum::<usize>(), 0);
    }

    #[test]
    fn class_and_membership_diffs_are_counted() {
        let file = parse_rewards_section(GEMS_JS, "questRewards");
        let snapshot = vec![
            snapshot_quest(
                "Enemy_at_the_Gate",
                "눈 앞의 적",
                &[("Ground_Slam", &["duelist", "marauder"]), ("Clarity", &["witch"])],
            ),
            snapshot_quest("The_Caged_Brute", "감금된 덩치", &[("Clarity", &["templar", "witch"])]),
        ];
        let names = gem_names(GEMS_JS);
        let canon = snapshot_quest_names(&snapshot, &[]);
        let issues = compare_section("questRewards", &file, &snapshot, &names, &canon);

        // clarity missing, fireball extra, ground_slam class diff
        assert_eq!(issues.iter().map(Issue::counted).sum::<usize>(), 3);
        assert!(issues.iter().any(|i| matches!(i, Issue::MissingGems { .. })));
        assert!(issues.iter().any(|i| matches!(i, Issue::ExtraGems { .. })));
        assert!(issues.iter().any(|i| matches!(i, Issue::ClassDiff { .. })));
    }

    #[test]
    fn renamed_quest_maps_but_flags_the_name() {
        let text = GEMS_JS.replace("감금된 덩치", "감금된 덱치");
        let file = parse_rewards_section(&text, "questRewards");
        let snapshot = vec![
            snapshot_quest(
                "Enemy_at_the_Gate",
                "눈 앞의 적",
                &[("Ground_Slam", &["marauder"]), ("Fireball", &["witch"])],
            ),
            snapshot_quest("The_Caged_Brute", "감금된 덩치", &[("Clarity", &["templar", "witch"])]),
        ];
        let names = gem_names(&text);
        let canon = snapshot_quest_names(&snapshot, &[]);
        let issues = compare_section("questRewards", &file, &snapshot, &names, &canon);
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], Issue::NameMismatch { .. }));
    }

    #[test]
    fn unmapped_quest_and_missing_quest_are_flagged() {
        let text = GEMS_JS.replace("감금된 덩치", "정체불명 퀘스트");
        let file = parse_rewards_section(&text, "questRewards");
        let snapshot = vec![
            snapshot_quest(
                "Enemy_at_the_Gate",
                "눈 앞의 적",
                &[("Ground_Slam", &["marauder"]), ("Fireball", &["witch"])],
            ),
            snapshot_quest("The_Caged_Brute", "감금된 덩치", &[("Clarity", &["templar", "witch"])]),
        ];
        let names = gem_names(&text);
        let canon = snapshot_quest_names(&snapshot, &[]);
        let issues = compare_section("questRewards", &file, &snapshot, &names, &canon);
        assert!(issues.iter().any(|i| matches!(i, Issue::NoMapping { .. })));
        assert!(issues.iter().any(|i| matches!(i, Issue::MissingQuest { .. })));
    }
}
