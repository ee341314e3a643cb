//! Uniform result envelope
//!
//! Every public operation answers with `{result, message, data}`; the report fetch
//! adds `data_top` and `data_page` on success.

use crate::extract::{PageInfo, ReportPage, ReportRow};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Message carried by every successful envelope
pub const SUCCESS_MESSAGE: &str = "success";

/// Generic failure message for shape and validation failures
pub const FAILED_MESSAGE: &str = "failed";

/// Result envelope returned by the public operations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub result: bool,
    pub message: String,
    pub data: Vec<T>,
    #[serde(flatten)]
    pub extras: Option<ReportExtras>,
}

/// Enrichment fields of a successful report envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportExtras {
    pub data_top: Vec<Vec<String>>,
    pub data_page: DataPage,
}

/// Pagination field; serializes as `{}` when there is none
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataPage(pub Option<PageInfo>);

impl Serialize for DataPage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(info) => info.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

impl<T> Envelope<T> {
    pub fn success(data: Vec<T>) -> Self {
        Self {
            result: true,
            message: SUCCESS_MESSAGE.to_string(),
            data,
            extras: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result: false,
            message: message.into(),
            data: Vec::new(),
            extras: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result
    }
}

impl Envelope<ReportRow> {
    /// Builds the success envelope of a report fetch
    pub fn report(page: ReportPage) -> Self {
        Self {
            extras: Some(ReportExtras {
                data_top: page.summary,
                data_page: DataPage(page.pagination),
            }),
            ..Self::success(page.rows)
        }
    }
}
