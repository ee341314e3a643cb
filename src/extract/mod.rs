//! HTML extraction for panel pages
//!
//! This module turns panel HTML into plain structures:
//! - the numeric id in the login form's action (`form.rs`)
//! - report table rows, summary panels and pagination info (`report.rs`)

mod form;
mod report;

pub use form::{find_post_form_action, parse_form_id};
pub use report::{
    extract_pagination, extract_rows, extract_summary, parse_pagination_text, parse_report,
    PageInfo, ReportPage, ReportRow,
};

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Errors raised while extracting data from a page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Element not found: {0}")]
    MissingElement(&'static str),

    #[error("Attribute '{attribute}' missing on {element}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Text {0:?} does not match the expected pattern")]
    PatternMismatch(String),

    #[error("Number out of range: {0}")]
    Number(#[from] std::num::ParseIntError),

    #[error("Invalid selector '{0}'")]
    Selector(&'static str),
}

/// Result type for extraction
pub type ExtractResult<T> = Result<T, ExtractError>;

pub(crate) fn selector(css: &'static str) -> ExtractResult<Selector> {
    Selector::parse(css).map_err(|_| ExtractError::Selector(css))
}

/// Finds the first `<form>` whose method is POST (case-insensitive)
pub(crate) fn first_post_form(document: &Html) -> ExtractResult<Option<ElementRef<'_>>> {
    let form_selector = selector("form[method]")?;
    Ok(document.select(&form_selector).find(|form| {
        form.value()
            .attr("method")
            .map(|m| m.trim().eq_ignore_ascii_case("post"))
            .unwrap_or(false)
    }))
}
