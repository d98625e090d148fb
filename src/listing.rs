use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::config::Settings;
use crate::record::ReportId;

static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// `avalanches/NNNNN` as an absolute, protocol-relative, root-relative or
/// relative link, not followed by another digit.
static REPORT_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:https?:)?//[^/]+)?/?avalanches/(\d{5})(?:[/?#]|$)").unwrap()
});

/// Distinct report ids linked from one listing page, in first-seen order.
pub fn report_ids(html: &str) -> Vec<ReportId> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for a in doc.select(&LINK_SEL) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let Some(id) = REPORT_HREF_RE
            .captures(href.trim())
            .and_then(|c| ReportId::parse(&c[1]))
        else {
            continue;
        };
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }

    ids
}

/// Page 0 is the bare listing URL; later pages add `?page=N`.
pub fn listing_url(settings: &Settings, page: u32) -> String {
    let base = join(&settings.base_url, &settings.listing_path);
    if page == 0 {
        base
    } else {
        format!("{}?page={}", base, page)
    }
}

pub fn report_url(settings: &Settings, id: &ReportId) -> String {
    format!("{}/{}", join(&settings.base_url, &settings.report_path), id)
}

fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_matches('/')
    )
}

// ── Tests ──
