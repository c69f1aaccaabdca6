//! Build guide.js from the campaign-guide spreadsheet export.

use anyhow::{Context, Result};
use poeguide::guide::{guide_entries, render_guide_js};
use poeguide::model::GuideEntry;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub fn handle(input: &Path, output: &Path) -> Result<()> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let sheets: BTreeMap<String, String> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", input.display()))?;

    let mut acts: BTreeMap<u32, Vec<GuideEntry>> = BTreeMap::new();
    for act in 1..=10u32 {
        let Some(csv_text) = sheets.get(&format!("Act {act}")) else {
            continue;
        };
        let entries = guide_entries(csv_text)
            .with_context(|| format!("parsing Act {act} sheet"))?;
        acts.insert(act, entries);
    }

    let js = render_guide_js(&acts);
    fs::write(output, js).with_context(|| format!("writing {}", output.display()))?;

    for (act, entries) in &acts {
        let unmatched: Vec<_> = entries.iter().filter(|e| e.zone_kr.is_none()).collect();
        println!(
            "act{act}: {} entries, {} unmatched zones",
            entries.len(),
            unmatched.len()
        );
        for e in unmatched {
            println!("  UNMATCHED: \"{}\" - {}", e.zone_en, e.todo);
        }
    }

    println!("\nWritten to {}", output.display());
    Ok(())
}
