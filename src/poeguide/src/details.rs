//! The gem detail store (`js/gem_details.js`) and the tooltip parser
//! that fills it from a gem's own wiki page.
//!
//! The store is plain JSON behind a `const GEM_DETAILS =` prefix so the
//! site can load it with a script tag. Keys are gem IDs; entries keep
//! the tooltip structure poedb renders: a tag line, property lines,
//! requirements, description prose, mod lines and the quality pair.

use crate::error::{Error, Result};
use crate::model::GemDetail;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

const STORE_PREFIX: &str = "const GEM_DETAILS =";

static STATS_GROUP: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.itemboxstatsgroup").expect("stats group selector"));

/// Parse an existing store file. An empty or missing file maps to an
/// empty store so a first run starts clean.
pub fn load_store(text: &str) -> Result<BTreeMap<String, GemDetail>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(BTreeMap::new());
    }
    let body = trimmed
        .strip_prefix(STORE_PREFIX)
        .ok_or(Error::DetailStoreShape)?
        .trim()
        .trim_end_matches(';');
    Ok(serde_json::from_str(body)?)
}

/// Serialize the store back to its JS form, keys in ID order.
pub fn render_store(store: &BTreeMap<String, GemDetail>) -> Result<String> {
    let json = serde_json::to_string_pretty(store)?;
    Ok(format!("{STORE_PREFIX} {json};\n"))
}

/// Text lines of one tooltip stat group. `<br>` separates lines; the
/// element's other markup only styles spans inside a line.
fn group_lines(group: ElementRef<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for node in group.descendants() {
        if let Some(text) = node.value().as_text() {
            current.push_str(text);
        } else if let Some(el) = node.value().as_element() {
            if el.name() == "br" {
                lines.push(std::mem::take(&mut current));
            }
        }
    }
    lines.push(current);
    lines
        .into_iter()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect()
}

fn classify_group(lines: &[String], detail: &mut GemDetail) {
    let first = &lines[0];
    let joined = lines.join("\n");
    if first.starts_with("요구 사항") {
        detail.requirements = Some(joined.replace('\n', ", "));
    } else if first.contains("퀄리티") {
        detail.quality_header = Some(first.clone());
        if lines.len() > 1 {
            detail.quality_mod = Some(lines[1..].join("\n"));
        }
    } else if joined.contains("이 젬을") || joined.contains("지원합니다") {
        detail.support_text = Some(joined);
    } else if first.starts_with('(') && first.ends_with(')') && lines.len() == 1 {
        detail.reminder = Some(first.clone());
    } else if detail.description.is_none() && !joined.chars().any(|c| c.is_ascii_digit()) {
        detail.description = Some(joined);
    } else {
        detail.mods.extend(lines.iter().cloned());
    }
}

/// Build a detail record from a gem's wiki page.
///
/// The first stat group carries the tag line and the `label: value`
/// property lines. Later groups are classified by their content:
/// requirements, the quality pair, support-usage text, a reminder in
/// parentheses, description prose, and everything else as mod lines.
pub fn parse_gem_detail(doc: &Html, gem_id: &str, page_eng_name: Option<&str>) -> Result<GemDetail> {
    let mut groups = doc.select(&STATS_GROUP);
    let head = groups.next().ok_or(Error::DetailEmpty)?;

    let mut detail = GemDetail::default();
    let head_lines = group_lines(head);
    if head_lines.is_empty() {
        return Err(Error::DetailEmpty);
    }
    detail.tags = head_lines[0].split(", ").map(str::to_string).collect();
    detail.properties = head_lines[1..].to_vec();

    for group in groups {
        let lines = group_lines(group);
        if lines.is_empty() {
            continue;
        }
        classify_group(&lines, &mut detail);
    }

    if let Some(name) = page_eng_name {
        // Compare against the title-cased ID, which is what the site
        // displays when engName is absent. Renamed gems (phase_run vs
        // "Old Phase Run") must keep their true English name.
        if name != title_cased(gem_id) {
            detail.eng_name = Some(name.to_string());
        }
    }
    Ok(detail)
}

fn title_cased(gem_id: &str) -> String {
    gem_id
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Html {
        Html::parse_document(concat!(
            "<div class=\"itembox\">",
            "<div class=\"itemboxstatsgroup\">주문, 오라<br>소모: 마나 (34-50)<br>시전 속도: 1.20초</div>",
            "<div class=\"itemboxstatsgroup\">요구 사항<br>레벨 24, 58 지능</div>",
            "<div class=\"itemboxstatsgroup\">당신과 주변 아군에게 마나 재생을 부여하는 오라를 시전합니다.</div>",
            "<div class=\"itemboxstatsgroup\">퀄리티 추가 효과<br>오라 효과 (0-10)% 증가</div>",
            "<div class=\"itemboxstatsgroup\">초당 마나 재생 (2.9-24.6)</div>",
            "<div class=\"itemboxstatsgroup\">(오라의 효과는 범위 안의 아군에게 적용됩니다)</div>",
            "</div>",
        ))
    }

    #[test]
    fn stat_groups_are_classified() {
        let detail = parse_gem_detail(&page(), "clarity", None).unwrap();
        assert_eq!(detail.tags, vec!["주문", "오라"]);
        assert_eq!(
            detail.properties,
            vec!["소모: 마나 (34-50)", "시전 속도: 1.20초"]
        );
        assert_eq!(detail.requirements.as_deref(), Some("요구 사항, 레벨 24, 58 지능"));
        assert_eq!(
            detail.description.as_deref(),
            Some("당신과 주변 아군에게 마나 재생을 부여하는 오라를 시전합니다.")
        );
        assert_eq!(detail.quality_header.as_deref(), Some("퀄리티 추가 효과"));
        assert_eq!(detail.quality_mod.as_deref(), Some("오라 효과 (0-10)% 증가"));
        assert_eq!(detail.mods, vec!["초당 마나 재생 (2.9-24.6)"]);
        assert_eq!(
            detail.reminder.as_deref(),
            Some("(오라의 효과는 범위 안의 아군에게 적용됩니다)")
        );
        assert!(detail.support_text.is_none());
    }

    #[test]
    fn support_usage_text_is_split_out() {
        let doc = Html::parse_document(concat!(
            "<div class=\"itemboxstatsgroup\">지원, 발사체</div>",
            "<div class=\"itemboxstatsgroup\">투사체를 사용하는 스킬 젬에 장착하면 이 젬을 지원합니다.</div>",
        ));
        let detail = parse_gem_detail(&doc, "pierce_support", None).unwrap();
        assert!(detail
            .support_text
            .as_deref()
            .unwrap()
            .contains("지원합니다"));
        assert!(detail.description.is_none());
    }

    #[test]
    fn page_without_tooltip_is_an_error() {
        let doc = Html::parse_document("<p>nothing</p>");
        assert!(matches!(
            parse_gem_detail(&doc, "clarity", None),
            Err(Error::DetailEmpty)
        ));
    }

    #[test]
    fn eng_name_recorded_only_when_it_differs() {
        let detail = parse_gem_detail(&page(), "clarity", Some("Clarity")).unwrap();
        assert!(detail.eng_name.is_none());

        // Renamed gems keep their true page name: the tooltip would
        // otherwise title-case the ID and show "Phase Run".
        let detail = parse_gem_detail(&page(), "phase_run", Some("Old Phase Run")).unwrap();
        assert_eq!(detail.eng_name.as_deref(), Some("Old Phase Run"));
        let detail =
            parse_gem_detail(&page(), "arctic_armour", Some("Old Arctic Armour")).unwrap();
        assert_eq!(detail.eng_name.as_deref(), Some("Old Arctic Armour"));
    }

    #[test]
    fn store_round_trips_and_omits_absent_fields() {
        let mut store = BTreeMap::new();
        store.insert(
            "clarity".to_string(),
            parse_gem_detail(&page(), "clarity", None).unwrap(),
        );
        let rendered = render_store(&store).unwrap();
        assert!(rendered.starts_with("const GEM_DETAILS = {"));
        assert!(rendered.trim_end().ends_with(';'));
        assert!(!rendered.contains("supportText"));
        assert!(!rendered.contains("engName"));

        let reloaded = load_store(&rendered).unwrap();
        assert_eq!(reloaded, store);
    }

    #[test]
    fn empty_store_text_loads_clean() {
        assert!(load_store("").unwrap().is_empty());
        assert!(load_store("garbage").is_err());
    }
}
