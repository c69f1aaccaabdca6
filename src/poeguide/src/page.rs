//! Table extraction from the poedb Quest page DOM.
//!
//! The page groups its reward tables under named anchor elements
//! (`#QuestReward`, `#QuestVendorRewards`). Extraction walks the
//! document in order from an anchor, collecting top-level tables until
//! the stop anchor, then classifies rows by cell count and colspan.

use crate::error::{Error, Result};
use crate::model::{ItemOnlyRow, RewardRow};
use crate::reconcile::GemRegistry;
use crate::tables::{class_id_for_kr, CLASS_COLUMNS};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, HashMap};

static TR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("tr selector"));
static A: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("a selector"));
static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("table selector"));

static ACT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Act\s*(\d+)").expect("act regex"));

/// Collect top-level `<table>` elements appearing after the element with
/// id `start_id`, stopping at the element with id `stop_id`. "Top-level"
/// excludes tables nested inside an already-collected table.
pub fn tables_between<'a>(
    doc: &'a Html,
    start_id: &str,
    stop_id: Option<&str>,
) -> Result<Vec<ElementRef<'a>>> {
    let anchor = element_by_id(doc, start_id)
        .ok_or_else(|| Error::AnchorMissing(start_id.to_string()))?;
    let anchor_id = anchor.id();

    let mut tables = Vec::new();
    let mut table_ids = Vec::new();
    let mut past_anchor = false;

    for node in doc.root_element().descendants() {
        if node.id() == anchor_id {
            past_anchor = true;
            continue;
        }
        if !past_anchor {
            continue;
        }
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        if let Some(stop) = stop_id {
            if el.value().attr("id") == Some(stop) {
                break;
            }
        }
        if el.value().name() != "table" {
            continue;
        }
        if node.ancestors().any(|a| table_ids.contains(&a.id())) {
            continue;
        }
        table_ids.push(node.id());
        tables.push(el);
    }

    Ok(tables)
}

fn element_by_id<'a>(doc: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().attr("id") == Some(id))
}

/// Direct `<td>`/`<th>` children of a row (nested table cells excluded).
fn direct_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .collect()
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// `/kr/Ground_Slam` -> `Ground_Slam`.
fn slug_from_href(href: &str) -> &str {
    href.rsplit('/').next().unwrap_or(href)
}

/// Act number from the quest cell text, e.g. `Act1` or `Act 3`.
fn extract_act(cell: ElementRef<'_>) -> Option<u32> {
    let text = cell.text().collect::<String>();
    ACT_RE
        .captures(&text)
        .and_then(|m| m.get(1))
        .and_then(|g| g.as_str().parse().ok())
}

/// `(Korean name, slug)` from the quest cell's link. Handles both
/// `questitem` (rewards table) and `WorldAreas` (vendor table) links.
fn quest_link(cell: ElementRef<'_>) -> Option<(String, String)> {
    for class in ["questitem", "WorldAreas"] {
        if let Some(a) = cell
            .select(&A)
            .find(|a| a.value().classes().any(|c| c == class))
        {
            let href = a.value().attr("href")?;
            return Some((text_of(a), slug_from_href(href).to_string()));
        }
    }
    None
}

/// Collect gem English names from a cell, registering each gem's display
/// name and color class into the registry on the way.
fn gems_in_cell(cell: ElementRef<'_>, registry: &mut GemRegistry) -> Vec<String> {
    let mut gems = Vec::new();
    for a in cell.select(&A) {
        let Some(css_class) = a.value().classes().find(|c| c.starts_with("gem_")) else {
            continue;
        };
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        if !href.contains("/kr/") {
            continue;
        }
        let eng_name = slug_from_href(href);
        registry.record(eng_name, &text_of(a), css_class);
        gems.push(eng_name.to_string());
    }
    gems
}

/// Parse the `#QuestReward` tables into full reward rows and item-only
/// rows. Also populates the gem registry.
pub fn parse_quest_rewards(
    doc: &Html,
    registry: &mut GemRegistry,
) -> Result<(Vec<RewardRow>, Vec<ItemOnlyRow>)> {
    let tables = tables_between(doc, "QuestReward", Some("QuestVendorRewards"))?;
    println!("  Found {} table(s) under #QuestReward", tables.len());

    let mut rewards = Vec::new();
    let mut item_only = Vec::new();
    let mut pos = 0usize;

    for table in tables {
        for row in table.select(&TR) {
            let cells = direct_cells(row);
            if cells.is_empty() || cells[0].value().name() == "th" {
                continue;
            }

            let has_colspan = cells.len() > 1
                && cells[1..]
                    .iter()
                    .any(|c| c.value().attr("colspan").is_some());

            if cells.len() >= 8 && !has_colspan {
                let Some((quest_name, quest_slug)) = quest_link(cells[0]) else {
                    continue;
                };
                // Quest rows without an act marker are all act 1.
                let act = extract_act(cells[0]).or(Some(1));

                let mut per_class = BTreeMap::new();
                for (i, class) in CLASS_COLUMNS.iter().enumerate() {
                    let gems = gems_in_cell(cells[i + 1], registry);
                    if !gems.is_empty() {
                        per_class.insert((*class).to_string(), gems);
                    }
                }

                rewards.push(RewardRow {
                    act,
                    quest_name,
                    quest_slug,
                    per_class,
                    max_select: None,
                    pos,
                });
                pos += 1;
            } else if has_colspan || cells.len() == 2 {
                if let Some((quest_name, quest_slug)) = quest_link(cells[0]) {
                    let act = extract_act(cells[0]);
                    item_only.push(ItemOnlyRow {
                        act,
                        quest_name,
                        quest_slug,
                        pos,
                    });
                    pos += 1;
                }
            }
        }
    }

    Ok((rewards, item_only))
}

/// Parse the `#QuestVendorRewards` table. Acts are looked up from the
/// rewards-table map; an unresolved act warns and stays `None`.
pub fn parse_vendor_rewards(
    doc: &Html,
    act_map: &HashMap<String, u32>,
    registry: &mut GemRegistry,
) -> Result<Vec<RewardRow>> {
    let tables = tables_between(doc, "QuestVendorRewards", None)?;
    let table = tables
        .first()
        .ok_or_else(|| Error::TableMissing("QuestVendorRewards".to_string()))?;

    let mut results = Vec::new();
    for (pos, row) in table.select(&TR).enumerate() {
        let cells = direct_cells(row);
        if cells.is_empty() || cells[0].value().name() == "th" {
            continue;
        }
        if cells.len() < 8 {
            continue;
        }

        let Some((quest_name, quest_slug)) = quest_link(cells[0]) else {
            continue;
        };

        let act = act_map.get(&quest_slug).copied();
        if act.is_none() {
            println!("  WARNING: No act number for vendor quest '{quest_name}' ({quest_slug})");
        }

        let mut per_class = BTreeMap::new();
        for (i, class) in CLASS_COLUMNS.iter().enumerate() {
            let gems = gems_in_cell(cells[i + 1], registry);
            if !gems.is_empty() {
                per_class.insert((*class).to_string(), gems);
            }
        }

        results.push(RewardRow {
            act,
            quest_name,
            quest_slug,
            per_class,
            max_select: None,
            pos,
        });
    }

    Ok(results)
}

/// Per-class gem rewards from an individual quest's own page: the first
/// table whose rows lead with a Korean class name wins.
pub fn class_rewards_from_quest_page(
    doc: &Html,
    registry: &mut GemRegistry,
) -> BTreeMap<String, Vec<String>> {
    let mut per_class = BTreeMap::new();
    for table in doc.select(&TABLE) {
        let mut found_any = false;
        for row in table.select(&TR) {
            let cells = direct_cells(row);
            if cells.len() < 2 {
                continue;
            }
            let label = text_of(cells[0]);
            let Some(class_id) = class_id_for_kr(&label) else {
                continue;
            };
            found_any = true;
            let gems = gems_in_cell(cells[1], registry);
            if !gems.is_empty() {
                per_class.insert(class_id.to_string(), gems);
            }
        }
        if found_any && !per_class.is_empty() {
            break;
        }
    }
    per_class
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quest_cell(act: u32, kr: &str, slug: &str) -> String {
        format!(r#"<td>Act {act} <a class="questitem" href="/kr/{slug}">{kr}</a></td>"#)
    }

    fn gem_cell(gems: &[(&str, &str, &str)]) -> String {
        let anchors: String = gems
            .iter()
            .map(|(slug, kr, css)| {
                format!(r#"<a class="{css} normal" href="/kr/{slug}">{kr}</a>"#)
            })
            .collect();
        format!("<td>{anchors}</td>")
    }

    fn reward_page() -> Html {
        let full_row = format!(
            "<tr>{}{}{}</tr>",
            quest_cell(1, "눈 앞의 적", "Enemy_at_the_Gate"),
            gem_cell(&[("Heavy_Strike", "묵직한 일격", "gem_red")]),
            "<td></td>".repeat(6),
        );
        let item_row = format!(
            r#"<tr>{}<td colspan="7">목걸이</td></tr>"#,
            quest_cell(2, "대장간에서", "The_Forging"),
        );
        let header_row = "<tr><th>퀘스트</th><th>머라우더</th></tr>";
        let vendor_row = format!(
            "<tr>{}{}{}</tr>",
            r#"<td>Act 1 <a class="WorldAreas" href="/kr/Mercy_Mission">자비로운 임무</a></td>"#,
            gem_cell(&[("Clarity", "명료함", "gem_blue")]),
            "<td></td>".repeat(6),
        );
        let html = format!(
            r#"<html><body>
            <h2 id="QuestReward">Quest Rewards</h2>
            <table>{header_row}{full_row}{item_row}</table>
            <h2 id="QuestVendorRewards">Vendor Rewards</h2>
            <table>{vendor_row}</table>
            </body></html>"#
        );
        Html::parse_document(&html)
    }

    #[test]
    fn missing_anchor_is_an_error() {
        let doc = Html::parse_document("<html><body><table></table></body></html>");
        let err = tables_between(&doc, "QuestReward", None).unwrap_err();
        assert!(matches!(err, Error::AnchorMissing(_)));
    }

    #[test]
    fn tables_stop_at_the_stop_anchor() {
        let doc = reward_page();
        let tables = tables_between(&doc, "QuestReward", Some("QuestVendorRewards")).unwrap();
        assert_eq!(tables.len(), 1);
        let all = tables_between(&doc, "QuestReward", None).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn nested_tables_are_excluded() {
        let html = r#"<html><body>
            <h2 id="Start"></h2>
            <table id="outer"><tr><td><table id="inner"></table></td></tr></table>
            <table id="second"></table>
            </body></html>"#;
        let doc = Html::parse_document(html);
        let tables = tables_between(&doc, "Start", None).unwrap();
        let ids: Vec<_> = tables
            .iter()
            .filter_map(|t| t.value().attr("id"))
            .collect();
        assert_eq!(ids, ["outer", "second"]);
    }

    #[test]
    fn quest_rows_classify_by_cells_and_colspan() {
        let doc = reward_page();
        let mut registry = GemRegistry::default();
        let (rewards, item_only) = parse_quest_rewards(&doc, &mut registry).unwrap();

        assert_eq!(rewards.len(), 1);
        assert_eq!(rewards[0].quest_name, "눈 앞의 적");
        assert_eq!(rewards[0].quest_slug, "Enemy_at_the_Gate");
        assert_eq!(rewards[0].act, Some(1));
        assert_eq!(rewards[0].per_class["marauder"], ["Heavy_Strike"]);

        assert_eq!(item_only.len(), 1);
        assert_eq!(item_only[0].quest_slug, "The_Forging");
        assert_eq!(item_only[0].act, Some(2));
        // Registry picked up the sighted gem.
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn act_defaults_to_one_for_quest_rows() {
        let html = format!(
            r#"<html><body><h2 id="QuestReward"></h2>
            <table><tr><td><a class="questitem" href="/kr/No_Act">액트 없음</a></td>{}</tr></table>
            <h2 id="QuestVendorRewards"></h2><table></table>
            </body></html>"#,
            "<td></td>".repeat(7),
        );
        let doc = Html::parse_document(&html);
        let mut registry = GemRegistry::default();
        let (rewards, _) = parse_quest_rewards(&doc, &mut registry).unwrap();
        assert_eq!(rewards[0].act, Some(1));
    }

    #[test]
    fn vendor_rows_resolve_act_from_map() {
        let doc = reward_page();
        let mut registry = GemRegistry::default();
        let mut act_map = HashMap::new();
        act_map.insert("Mercy_Mission".to_string(), 1);

        let vendors = parse_vendor_rewards(&doc, &act_map, &mut registry).unwrap();
        assert_eq!(vendors.len(), 1);
        assert_eq!(vendors[0].act, Some(1));
        assert_eq!(vendors[0].per_class["marauder"], ["Clarity"]);

        let unmapped = parse_vendor_rewards(&doc, &HashMap::new(), &mut registry).unwrap();
        assert_eq!(unmapped[0].act, None);
    }

    #[test]
    fn quest_page_class_table_parses_first_matching_table() {
        let html = format!(
            r#"<html><body>
            <table><tr><td>아이템</td><td>없음</td></tr></table>
            <table>
              <tr><td>머라우더</td>{}</tr>
              <tr><td>위치</td>{}</tr>
            </table>
            </body></html>"#,
            gem_cell(&[("Heavy_Strike", "묵직한 일격", "gem_red")]),
            gem_cell(&[("Fireball", "화염구", "gem_blue")]),
        );
        let doc = Html::parse_document(&html);
        let mut registry = GemRegistry::default();
        let per_class = class_rewards_from_quest_page(&doc, &mut registry);

        assert_eq!(per_class["marauder"], ["Heavy_Strike"]);
        assert_eq!(per_class["witch"], ["Fireball"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn gem_anchors_require_localized_href_and_gem_class() {
        let html = format!(
            r#"<html><body><h2 id="QuestReward"></h2>
            <table><tr>{}<td>
              <a class="gem_red" href="/us/Wrong_Locale">x</a>
              <a class="item" href="/kr/Not_A_Gem">y</a>
              <a class="gem_green" href="/kr/Ground_Slam">대지 강타</a>
            </td>{}</tr></table>
            <h2 id="QuestVendorRewards"></h2><table></table>
            </body></html>"#,
            quest_cell(1, "눈 앞의 적", "Enemy_at_the_Gate"),
            "<td></td>".repeat(6),
        );
        let doc = Html::parse_document(&html);
        let mut registry = GemRegistry::default();
        let (rewards, _) = parse_quest_rewards(&doc, &mut registry).unwrap();
        assert_eq!(rewards[0].per_class["marauder"], ["Ground_Slam"]);
        assert_eq!(registry.len(), 1);
    }
}
