//! Resumable per-gem tooltip scrape into gem_details.js.
//!
//! Gems already present in the store are skipped, so an interrupted run
//! picks up where it left off. Progress is checkpointed to disk every
//! 50 newly scraped entries.

use anyhow::{Context, Result};
use poeguide::details::{load_store, parse_gem_detail, render_store};
use poeguide::fetch::Fetcher;
use poeguide::model::GemDetail;
use poeguide::sections;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const CHECKPOINT_EVERY: usize = 50;

pub fn handle(file: &Path, gems_file: &Path) -> Result<()> {
    println!("=== poeguide details: scraping gem tooltips ===\n");

    let gems_text = fs::read_to_string(gems_file)
        .with_context(|| format!("reading {}", gems_file.display()))?;
    let catalog = sections::existing_gems(&gems_text)?;

    let store_text = match fs::read_to_string(file) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => {
            return Err(err).with_context(|| format!("reading {}", file.display()))
        }
    };
    let mut store =
        load_store(&store_text).with_context(|| format!("parsing {}", file.display()))?;

    let pending: Vec<_> = catalog
        .iter()
        .filter(|g| !store.contains_key(&g.id))
        .collect();
    println!(
        "{} gems in catalog, {} already scraped, {} to fetch",
        catalog.len(),
        catalog.len() - pending.len(),
        pending.len()
    );

    let fetcher = Fetcher::new();
    let mut scraped = 0usize;
    let mut failures = Vec::new();

    for gem in pending {
        // The icon filename stem is the wiki page slug.
        let slug = gem.icon.trim_end_matches(".png");
        println!("  -> {} ({slug})", gem.id);
        match scrape_one(&fetcher, &gem.id, slug) {
            Ok(detail) => {
                store.insert(gem.id.clone(), detail);
                scraped += 1;
            }
            Err(err) => {
                println!("    FAILED: {err}");
                failures.push(gem.id.clone());
                continue;
            }
        }
        if scraped % CHECKPOINT_EVERY == 0 {
            write_store(file, &store)?;
            println!("  checkpoint: {} entries written", store.len());
        }
    }

    write_store(file, &store)?;
    println!(
        "\nScraped {scraped} new gem(s), {} total in {}",
        store.len(),
        file.display()
    );

    if !failures.is_empty() {
        println!("\n{} gem(s) failed:", failures.len());
        for id in &failures {
            println!("  - {id}");
        }
    }
    Ok(())
}

fn scrape_one(fetcher: &Fetcher, gem_id: &str, slug: &str) -> poeguide::Result<GemDetail> {
    let doc = fetcher.document(&Fetcher::page_url(slug))?;
    let page_name = slug.replace('_', " ");
    parse_gem_detail(&doc, gem_id, Some(&page_name))
}

fn write_store(file: &Path, store: &BTreeMap<String, GemDetail>) -> Result<()> {
    let rendered = render_store(store)?;
    fs::write(file, rendered).with_context(|| format!("writing {}", file.display()))
}
