//! Campaign-guide ingestion: the exported spreadsheet arrives as a JSON
//! object mapping `"Act N"` to raw CSV text, one sheet per act. Rows are
//! filtered down to zone entries and rendered into `js/guide.js`.

use crate::error::Result;
use crate::model::GuideEntry;
use crate::tables::ZONE_NAMES;
use csv::ReaderBuilder;
use std::collections::BTreeMap;

/// Korean name for an English zone label. Exact match first, then with a
/// leading `The ` stripped, then case-insensitive ignoring `the `.
pub fn korean_zone(en_zone: &str) -> Option<&'static str> {
    if let Some(kr) = ZONE_NAMES.get(en_zone) {
        return Some(kr.as_str());
    }
    if let Some(stripped) = en_zone.strip_prefix("The ") {
        if let Some(kr) = ZONE_NAMES.get(stripped.trim()) {
            return Some(kr.as_str());
        }
    }
    let wanted = en_zone.to_lowercase().replace("the ", "").trim().to_string();
    for (k, v) in ZONE_NAMES.iter() {
        if k.to_lowercase().replace("the ", "").trim() == wanted {
            return Some(v.as_str());
        }
    }
    None
}

/// Parse one act's CSV sheet into guide entries. Header rows, town-NPC
/// blocks and video-only separators are dropped; data starts after the
/// row whose first cell is `Zone`. Entries with neither notes, layout
/// nor video are omitted.
pub fn guide_entries(csv_text: &str) -> Result<Vec<GuideEntry>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let mut entries = Vec::new();
    let mut in_data = false;
    for record in reader.records() {
        let record = record?;
        if record.len() < 5 {
            continue;
        }
        let cell = |i: usize| record.get(i).unwrap_or("").trim().to_string();
        let zone = cell(0);
        let todo = cell(1);
        if zone.is_empty() || zone == "Zone" || zone == "Town NPCs" || todo == "Function" {
            if zone == "Zone" {
                in_data = true;
            }
            continue;
        }
        if !in_data {
            continue;
        }
        let notes = cell(2);
        let layout = cell(3);
        let video = cell(4);
        if zone.ends_with("Video:") && todo.is_empty() && notes.is_empty() && layout.is_empty() {
            continue;
        }
        if notes.is_empty() && layout.is_empty() && video.is_empty() {
            continue;
        }
        entries.push(GuideEntry {
            zone_kr: korean_zone(&zone).map(str::to_string),
            zone_en: zone,
            todo,
            notes,
            layout,
            video,
        });
    }
    Ok(entries)
}

/// Render `js/guide.js` from per-act entries (keys are act numbers).
pub fn render_guide_js(acts: &BTreeMap<u32, Vec<GuideEntry>>) -> String {
    let mut lines = vec![
        "// Zone guide notes from Cyclon's Advanced Campaign Guide".to_string(),
        "// https://docs.google.com/spreadsheets/d/1VIX2Bdw1RnQCzApBWUSb0vH682087GDUymfQNMXe0_Q"
            .to_string(),
        "const GUIDE_NOTES = {".to_string(),
    ];

    for (act, entries) in acts {
        lines.push(format!("  act{act}: ["));
        for e in entries {
            let mut parts = vec![format!("zone: {}", js_string(&e.zone_en))];
            if let Some(kr) = &e.zone_kr {
                parts.push(format!("kr: {}", js_string(kr)));
            }
            for (key, value) in [
                ("todo", &e.todo),
                ("notes", &e.notes),
                ("layout", &e.layout),
                ("video", &e.video),
            ] {
                if !value.is_empty() {
                    parts.push(format!("{key}: {}", js_string(value)));
                }
            }
            lines.push(format!("    {{ {} }},", parts.join(", ")));
        }
        lines.push("  ],".to_string());
    }

    lines.push("};".to_string());
    lines.push(String::new());
    lines.join("\n")
}

fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
