//! Diff gems.js against a scraped poedb snapshot and report drift.

use anyhow::{Context, Result};
use poeguide::model::Snapshot;
use poeguide::validate::{
    compare_section, gem_names, parse_rewards_section, snapshot_quest_names, Issue,
};
use std::fs;
use std::path::Path;

/// Returns the number of counted issues; the caller maps nonzero to a
/// failing exit status.
pub fn handle(file: &Path, snapshot_path: &Path) -> Result<usize> {
    let text =
        fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let snapshot_raw = fs::read_to_string(snapshot_path)
        .with_context(|| format!("reading {}", snapshot_path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&snapshot_raw)
        .with_context(|| format!("parsing {}", snapshot_path.display()))?;

    let names = gem_names(&text);
    let canonical = snapshot_quest_names(&snapshot.quest_rewards, &snapshot.vendor_rewards);

    let quest_file = parse_rewards_section(&text, "questRewards");
    let vendor_file = parse_rewards_section(&text, "vendorRewards");

    println!("Loaded {} questRewards from gems.js", quest_file.len());
    println!("Loaded {} vendorRewards from gems.js", vendor_file.len());
    println!("Loaded {} questRewards from poedb", snapshot.quest_rewards.len());
    println!("Loaded {} vendorRewards from poedb", snapshot.vendor_rewards.len());
    println!("Known gem IDs in gems[]: {}", names.len());

    let mut total = 0usize;
    for (section, file_quests, snapshot_quests) in [
        ("questRewards", &quest_file, &snapshot.quest_rewards),
        ("vendorRewards", &vendor_file, &snapshot.vendor_rewards),
    ] {
        println!("\n{}", "=".repeat(70));
        println!("  {section}");
        println!("{}", "=".repeat(70));

        let issues = compare_section(section, file_quests, snapshot_quests, &names, &canonical);
        for issue in &issues {
            println!("\n{issue}");
        }
        let counted: usize = issues.iter().map(Issue::counted).sum();
        println!("\n--- {counted} issue(s) found in {section} ---");
        total += counted;
    }

    println!("\n{}", "=".repeat(70));
    println!("  TOTAL: {total} issue(s)");
    println!("{}", "=".repeat(70));
    Ok(total)
}
