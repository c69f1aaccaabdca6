//! Locating, regenerating and splicing the three managed array literals
//! in gems.js (`gems`, `questRewards`, `vendorRewards`).
//!
//! The file is a hand-maintained artifact; everything outside the three
//! sections must survive a regeneration byte-for-byte. Sections are
//! located by their `  <name>: [` marker and bracket-depth matching that
//! is aware of string literals, so a `[` or `]` inside quoted Korean
//! text cannot derail the scan.

use crate::error::{Error, Result};
use crate::model::{Gem, GemColor, GemKind, RewardRow};
use crate::reconcile::eng_to_gemid;
use crate::tables::{CLASS_COLUMNS, NPC_COSTS};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static GEM_ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\{\s*id:\s*"(?P<id>[^"]+)",\s*name:\s*"(?P<name>[^"]+)",\s*type:\s*"(?P<type>[^"]+)",\s*color:\s*"(?P<color>[^"]+)",\s*icon:\s*"(?P<icon>[^"]+)"\s*\}"#,
    )
    .expect("gem entry regex")
});

static MAX_SELECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"questName:\s*"([^"]+)",\s*maxSelect:\s*(\d+)"#).expect("maxSelect regex")
});

/// Byte span of one managed section, including its marker and one
/// trailing comma when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Index of the delimiter matching the opener at `open`. Quoted strings
/// are skipped, including escaped quotes.
pub fn matching_bracket(text: &str, open: usize, open_ch: u8, close_ch: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'"' && (i == 0 || bytes[i - 1] != b'\\') {
            in_string = !in_string;
        } else if !in_string {
            if b == open_ch {
                depth += 1;
            } else if b == close_ch {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

/// Locate the span of `  <name>: [...]` in the file text.
pub fn section_span(text: &str, name: &str) -> Result<Span> {
    let marker = format!("  {name}: [");
    let start = text
        .find(&marker)
        .ok_or_else(|| Error::SectionMissing(name.to_string()))?;
    let open = start + marker.len() - 1;
    let close = matching_bracket(text, open, b'[', b']')
        .ok_or_else(|| Error::SectionUnbalanced(name.to_string()))?;
    let mut end = close + 1;
    if text.as_bytes().get(end) == Some(&b',') {
        end += 1;
    }
    Ok(Span { start, end })
}

/// The text between a section's brackets (marker and brackets excluded).
pub fn section_body<'a>(text: &'a str, name: &str) -> Result<&'a str> {
    let marker = format!("  {name}: [");
    let start = text
        .find(&marker)
        .ok_or_else(|| Error::SectionMissing(name.to_string()))?;
    let open = start + marker.len() - 1;
    let close = matching_bracket(text, open, b'[', b']')
        .ok_or_else(|| Error::SectionUnbalanced(name.to_string()))?;
    Ok(&text[open + 1..close])
}

/// Replace the three managed sections, leaving every byte outside them
/// untouched (the gaps between sections keep their text verbatim, minus
/// the leading newlines the freshly appended `\n` replaces).
pub fn replace_sections(
    text: &str,
    gems_section: &str,
    quest_section: &str,
    vendor_section: &str,
) -> Result<String> {
    let g = section_span(text, "gems")?;
    let q = section_span(text, "questRewards")?;
    let v = section_span(text, "vendorRewards")?;
    if !(g.end <= q.start && q.end <= v.start) {
        return Err(Error::SectionOrder);
    }

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..g.start]);
    out.push_str(gems_section);
    out.push('\n');
    out.push_str(text[g.end..q.start].trim_start_matches('\n'));
    out.push_str(quest_section);
    out.push('\n');
    out.push_str(text[q.end..v.start].trim_start_matches('\n'));
    out.push_str(vendor_section);
    out.push('\n');
    out.push_str(&text[v.end..]);
    Ok(out)
}

/// Parse the current gem catalog entries out of the `gems` section.
pub fn existing_gems(text: &str) -> Result<Vec<Gem>> {
    let span = section_span(text, "gems")?;
    let section = &text[span.start..span.end];
    Ok(GEM_ENTRY_RE
        .captures_iter(section)
        .map(|m| Gem {
            id: m["id"].to_string(),
            name: m["name"].to_string(),
            kind: GemKind::parse(&m["type"]),
            color: GemColor::parse(&m["color"]),
            icon: m["icon"].to_string(),
        })
        .collect())
}

/// Harvest `maxSelect` values from the current file text, keyed by the
/// localized quest name, so manual caps survive a regeneration.
pub fn max_select_overrides(text: &str) -> HashMap<String, u32> {
    MAX_SELECT_RE
        .captures_iter(text)
        .filter_map(|m| Some((m.get(1)?.as_str().to_string(), m.get(2)?.as_str().parse().ok()?)))
        .collect()
}

/// Render the `gems` section, sorted by gem ID.
pub fn render_gems(gems: &[Gem]) -> String {
    let mut sorted: Vec<&Gem> = gems.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut lines = vec!["  gems: [".to_string()];
    for g in sorted {
        lines.push(format!(
            "    {{ id: \"{}\", name: \"{}\", type: \"{}\", color: \"{}\", icon: \"{}\" }},",
            g.id, g.name, g.kind, g.color, g.icon
        ));
    }
    lines.push("  ],".to_string());
    lines.join("\n")
}

/// Per-class reward lines for one quest, reconciled against the catalog.
/// Gem IDs absent from the catalog are silently dropped; classes left
/// with nothing are omitted.
fn class_lines(row: &RewardRow, catalog: &HashSet<String>) -> Vec<String> {
    CLASS_COLUMNS
        .iter()
        .filter_map(|class| {
            let raw = row.per_class.get(*class)?;
            let ids: Vec<String> = raw
                .iter()
                .map(|eng| eng_to_gemid(eng))
                .filter(|id| catalog.contains(id))
                .collect();
            if ids.is_empty() {
                return None;
            }
            let joined = ids
                .iter()
                .map(|id| format!("\"{id}\""))
                .collect::<Vec<_>>()
                .join(", ");
            Some(format!("      {class}: [{joined}]"))
        })
        .collect()
}

/// Render the `questRewards` section. Quests whose every class list
/// filtered down to nothing are dropped entirely.
pub fn render_quest_rewards(rows: &[RewardRow], catalog: &HashSet<String>) -> String {
    let mut lines = vec!["  questRewards: [".to_string()];
    for row in rows {
        let classes = class_lines(row, catalog);
        if classes.is_empty() {
            continue;
        }
        let act = row.act.unwrap_or(0);
        let extras = row
            .max_select
            .map(|m| format!(", maxSelect: {m}"))
            .unwrap_or_default();
        lines.push(format!(
            "    {{ act: {act}, questName: \"{}\"{extras}, rewards: {{",
            row.quest_name
        ));
        lines.push(format!("{},", classes.join(",\n")));
        lines.push("    }},".to_string());
    }
    lines.push("  ],".to_string());
    lines.join("\n")
}

/// Render the `vendorRewards` section, resolving NPC and currency cost
/// from the embedded table. Unknown quests get `"???"` sentinels and a
/// printed warning; downstream display relies on the sentinel string.
pub fn render_vendor_rewards(rows: &[RewardRow], catalog: &HashSet<String>) -> String {
    let mut lines = vec!["  vendorRewards: [".to_string()];
    for row in rows {
        let classes = class_lines(row, catalog);
        if classes.is_empty() {
            continue;
        }
        let act = row.act.unwrap_or(0);
        let (npc, cost) = match NPC_COSTS.get(&row.quest_slug) {
            Some(entry) => (entry.npc.as_str(), entry.cost.as_str()),
            None => {
                println!(
                    "  WARNING: Unknown NPC/cost for '{}' ({})",
                    row.quest_name, row.quest_slug
                );
                ("???", "???")
            }
        };
        lines.push(format!(
            "    {{ act: {act}, questName: \"{}\", npc: \"{npc}\", cost: \"{cost}\", rewards: {{",
            row.quest_name
        ));
        lines.push(format!("{},", classes.join(",\n")));
        lines.push("    }},".to_string());
    }
    lines.push("  ],".to_string());
    lines.join("\n")
}
