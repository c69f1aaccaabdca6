//! The default pipeline: scrape the poedb Quest page and regenerate the
//! managed sections of gems.js, optionally downloading missing icons.

use anyhow::{Context, Result};
use poeguide::fetch::{Fetcher, QUEST_URL};
use poeguide::model::RewardRow;
use poeguide::reconcile::{build_missing_gems, GemRegistry};
use poeguide::{icons, page, sections};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub fn handle(file: &Path, fetch_icons: bool, icon_dir: &Path) -> Result<()> {
    println!("=== poeguide sync: scraping the poedb Quest page ===\n");

    let fetcher = Fetcher::new();
    let doc = fetcher.document(QUEST_URL)?;

    let mut registry = GemRegistry::default();

    println!("\nParsing #QuestReward...");
    let (mut quest_rewards, item_only) = page::parse_quest_rewards(&doc, &mut registry)?;
    println!(
        "  {} gem quests, {} item-only rows",
        quest_rewards.len(),
        item_only.len()
    );

    // Act lookup for the vendor table, which carries no act markers.
    let mut act_map: HashMap<String, u32> = HashMap::new();
    for q in &quest_rewards {
        if let Some(act) = q.act {
            act_map.insert(q.quest_slug.clone(), act);
        }
    }
    for row in &item_only {
        if let Some(act) = row.act {
            act_map.insert(row.quest_slug.clone(), act);
        }
    }

    println!("\nParsing #QuestVendorRewards...");
    let vendor_rewards = page::parse_vendor_rewards(&doc, &act_map, &mut registry)?;
    println!("  {} vendor quests", vendor_rewards.len());

    // Item-only quests that the vendor table proves have per-class data
    // get their own page fetched.
    let vendor_slugs: HashSet<String> = vendor_rewards
        .iter()
        .map(|v| v.quest_slug.clone())
        .collect();
    let have_gems: HashSet<String> = quest_rewards
        .iter()
        .map(|q| q.quest_slug.clone())
        .collect();
    let deep_fetch: Vec<_> = item_only
        .iter()
        .filter(|row| vendor_slugs.contains(&row.quest_slug) && !have_gems.contains(&row.quest_slug))
        .collect();

    if !deep_fetch.is_empty() {
        println!(
            "\nDeep-fetching {} quest(s) for per-class data:",
            deep_fetch.len()
        );
        for row in deep_fetch {
            println!("  -> {} ({})", row.quest_name, row.quest_slug);
            let quest_doc = fetcher.document(&Fetcher::page_url(&row.quest_slug))?;
            let per_class = page::class_rewards_from_quest_page(&quest_doc, &mut registry);
            if per_class.is_empty() {
                println!("    WARNING: No per-class data found!");
            } else {
                let total: usize = per_class.values().map(Vec::len).sum();
                println!("    Got {} gems across {} classes", total, per_class.len());
                quest_rewards.push(RewardRow {
                    act: row.act,
                    quest_name: row.quest_name.clone(),
                    quest_slug: row.quest_slug.clone(),
                    per_class,
                    max_select: None,
                    pos: row.pos,
                });
            }
        }
        quest_rewards.sort_by_key(|q| q.pos);
    }

    println!(
        "\nGem registry: {} unique gem names collected from poedb",
        registry.len()
    );

    let text =
        fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let existing = sections::existing_gems(&text)?;
    println!("Existing gems[]: {} entries", existing.len());

    let new_gems = build_missing_gems(&registry, &existing);
    if !new_gems.is_empty() {
        println!("Adding {} new gem(s) to gems[]:", new_gems.len());
        for g in &new_gems {
            println!("  + {} ({}, {}, {})", g.id, g.name, g.kind, g.color);
        }
    }
    let mut all_gems = existing;
    all_gems.extend(new_gems.iter().cloned());
    let catalog: HashSet<String> = all_gems.iter().map(|g| g.id.clone()).collect();

    // Manual maxSelect caps survive the regeneration.
    let overrides = sections::max_select_overrides(&text);
    for q in &mut quest_rewards {
        if let Some(max) = overrides.get(&q.quest_name) {
            q.max_select = Some(*max);
        }
    }

    println!("\nGenerating gems[]...");
    let gems_section = sections::render_gems(&all_gems);

    println!("Generating questRewards (perClass)...");
    let quest_section = sections::render_quest_rewards(&quest_rewards, &catalog);

    println!("Generating vendorRewards (perClass)...");
    let vendor_section = sections::render_vendor_rewards(&vendor_rewards, &catalog);

    println!("\nReplacing sections in gems.js...");
    let new_text =
        sections::replace_sections(&text, &gems_section, &quest_section, &vendor_section)?;
    fs::write(file, new_text).with_context(|| format!("writing {}", file.display()))?;

    let q_count = quest_section.lines().filter(|l| l.contains("act:")).count();
    let v_count = vendor_section.lines().filter(|l| l.contains("act:")).count();

    println!("\n{}", "=".repeat(60));
    println!(
        "  gems[]        : {:>3} entries ({} new)",
        all_gems.len(),
        new_gems.len()
    );
    println!("  questRewards  : {q_count:>3} quests");
    println!("  vendorRewards : {v_count:>3} quests");
    println!("{}", "=".repeat(60));

    println!("\nWritten to {}", file.display());

    if fetch_icons {
        download_icons(&fetcher, &registry, icon_dir)?;
    }

    Ok(())
}

/// Download missing icons one by one; per-item failures are collected
/// and enumerated, the batch continues.
fn download_icons(fetcher: &Fetcher, registry: &GemRegistry, icon_dir: &Path) -> Result<()> {
    fs::create_dir_all(icon_dir)
        .with_context(|| format!("creating {}", icon_dir.display()))?;

    let missing = icons::missing_icons(registry, icon_dir);
    if missing.is_empty() {
        println!("\nAll gem icons present in {}", icon_dir.display());
        return Ok(());
    }

    println!(
        "\nDownloading {} missing icon(s) to {}:",
        missing.len(),
        icon_dir.display()
    );
    let mut failures = Vec::new();
    for eng_name in &missing {
        match fetch_one_icon(fetcher, eng_name, icon_dir) {
            Ok(path) => println!("  + {} -> {}", eng_name, path.display()),
            Err(err) => {
                println!("  ! {eng_name}: {err}");
                failures.push(eng_name.clone());
            }
        }
    }

    if !failures.is_empty() {
        println!("\n{} icon(s) failed:", failures.len());
        for name in &failures {
            println!("  - {name}");
        }
    }
    Ok(())
}

fn fetch_one_icon(
    fetcher: &Fetcher,
    eng_name: &str,
    icon_dir: &Path,
) -> poeguide::Result<PathBuf> {
    let doc = fetcher.document(&Fetcher::page_url(eng_name))?;
    let url = icons::icon_url_from_page(&doc)?;
    let bytes = fetcher.bytes(&url)?;
    icons::save_icon(&bytes, eng_name, icon_dir)
}
