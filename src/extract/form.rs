use crate::extract::{first_post_form, ExtractError, ExtractResult};
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

static FORM_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d+)\.html$").expect("form id pattern is valid"));

/// Returns the `action` attribute of the page's POST form
///
/// # Example
///
/// ```
/// use easypay_panel::extract::find_post_form_action;
///
/// let html = r#"<form method="post" action="/Manage/Index/login/1712.html"></form>"#;
/// assert_eq!(find_post_form_action(html).unwrap(), "/Manage/Index/login/1712.html");
/// ```
pub fn find_post_form_action(html: &str) -> ExtractResult<String> {
    let document = Html::parse_document(html);
    let form = first_post_form(&document)?
        .ok_or(ExtractError::MissingElement("form[method=post]"))?;

    form.value()
        .attr("action")
        .map(str::to_string)
        .ok_or(ExtractError::MissingAttribute {
            element: "form",
            attribute: "action",
        })
}

/// Extracts the digits right before a trailing `.html` in a form action
///
/// `/Manage/Index/login/1712.html` yields `1712`; anything else yields `None`.
pub fn parse_form_id(action: &str) -> Option<String> {
    FORM_ID_PATTERN
        .captures(action.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
