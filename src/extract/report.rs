//! Report page extraction
//!
//! The report page has three parts:
//! - the data table inside the POST form (load-bearing; failures propagate)
//! - the summary panels in `div.row.tagtopdiv` (best-effort)
//! - the pagination caption in `div#wypage` (best-effort)

use crate::extract::{first_post_form, selector, ExtractError, ExtractResult};
use regex::Regex;
use scraper::Html;
use serde::Serialize;
use std::sync::LazyLock;

static PAGINATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*条记录\s*(\d+)/(\d+)\s*页").expect("pagination pattern is valid")
});

/// Cell texts of one table row, in column order
pub type ReportRow = Vec<String>;

/// Pagination caption of a report page (`42 条记录 3/7 页`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub record_count: u64,
    pub page_number: u64,
    pub total_pages: u64,
}

/// Everything extracted from one report page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportPage {
    pub rows: Vec<ReportRow>,
    /// Summary panel groups; empty when absent or unreadable
    pub summary: Vec<Vec<String>>,
    /// Pagination info; `None` when absent or unreadable
    pub pagination: Option<PageInfo>,
}

/// Parses a report page
///
/// A missing form, table or body fails the whole parse. The summary and pagination
/// sections are isolated: an error in either is logged and that section comes back
/// empty.
pub fn parse_report(html: &str) -> ExtractResult<ReportPage> {
    let document = Html::parse_document(html);

    let rows = extract_rows(&document)?;

    let summary = extract_summary(&document).unwrap_or_else(|e| {
        tracing::warn!("Summary panels unreadable, leaving them empty: {}", e);
        Vec::new()
    });

    let pagination = extract_pagination(&document).unwrap_or_else(|e| {
        tracing::warn!("Pagination unreadable, leaving it empty: {}", e);
        None
    });

    Ok(ReportPage {
        rows,
        summary,
        pagination,
    })
}

/// Extracts the rows of `form[method=post] table.table.table-hover tbody`
///
/// Rows without any `td` (headers, spacers) are skipped. Cell text is the
/// concatenated text of the cell, untrimmed.
pub fn extract_rows(document: &Html) -> ExtractResult<Vec<ReportRow>> {
    let form =
        first_post_form(document)?.ok_or(ExtractError::MissingElement("form[method=post]"))?;

    let table_selector = selector("table.table.table-hover")?;
    let table = form
        .select(&table_selector)
        .next()
        .ok_or(ExtractError::MissingElement("table.table.table-hover"))?;

    let tbody_selector = selector("tbody")?;
    let tbody = table
        .select(&tbody_selector)
        .next()
        .ok_or(ExtractError::MissingElement("tbody"))?;

    let tr_selector = selector("tr")?;
    let td_selector = selector("td")?;

    let rows = tbody
        .select(&tr_selector)
        .map(|tr| {
            tr.select(&td_selector)
                .map(|td| td.text().collect::<String>())
                .collect::<ReportRow>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    Ok(rows)
}

/// Extracts the summary panel groups
///
/// Each `div.panel` inside `div.row.tagtopdiv` yields one group: the trimmed
/// texts of its `h4.pull-left.text-danger` elements. No container means no groups;
/// a panel without a `div.panel-body` is an error.
pub fn extract_summary(document: &Html) -> ExtractResult<Vec<Vec<String>>> {
    let container_selector = selector("div.row.tagtopdiv")?;
    let Some(container) = document.select(&container_selector).next() else {
        return Ok(Vec::new());
    };

    let panel_selector = selector("div.panel")?;
    let body_selector = selector("div.panel-body")?;
    let value_selector = selector("h4.pull-left.text-danger")?;

    let mut groups = Vec::new();
    for panel in container.select(&panel_selector) {
        let body = panel
            .select(&body_selector)
            .next()
            .ok_or(ExtractError::MissingElement("div.panel-body"))?;

        let values = body
            .select(&value_selector)
            .map(|h4| h4.text().collect::<String>().trim().to_string())
            .collect();
        groups.push(values);
    }

    Ok(groups)
}

/// Extracts pagination info from `div#wypage a.number`
///
/// No `div#wypage` means no pagination. A container without the caption, or a
/// caption in another format, is an error.
pub fn extract_pagination(document: &Html) -> ExtractResult<Option<PageInfo>> {
    let container_selector = selector("div#wypage")?;
    let Some(container) = document.select(&container_selector).next() else {
        return Ok(None);
    };

    let caption_selector = selector("a.number")?;
    let caption = container
        .select(&caption_selector)
        .next()
        .ok_or(ExtractError::MissingElement("a.number"))?;

    let text = caption.text().collect::<String>();
    let text = text.trim();
    parse_pagination_caption(text).map(Some)
}

/// Parses a caption like `42 条记录 3/7 页`
///
/// # Example
///
/// ```
/// use easypay_panel::extract::parse_pagination_text;
///
/// let info = parse_pagination_text("42 条记录 3/7 页").unwrap();
/// assert_eq!((info.record_count, info.page_number, info.total_pages), (42, 3, 7));
/// assert!(parse_pagination_text("no pages here").is_none());
/// ```
pub fn parse_pagination_text(text: &str) -> Option<PageInfo> {
    parse_pagination_caption(text).ok()
}

fn parse_pagination_caption(text: &str) -> ExtractResult<PageInfo> {
    let caps = PAGINATION_PATTERN
        .captures(text)
        .ok_or_else(|| ExtractError::PatternMismatch(text.to_string()))?;

    Ok(PageInfo {
        record_count: caps[1].parse()?,
        page_number: caps[2].parse()?,
        total_pages: caps[3].parse()?,
    })
}
