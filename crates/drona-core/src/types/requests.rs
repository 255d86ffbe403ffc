//! Request shapes for list, insert and update operations.

use serde::{Deserialize, Serialize};

/// Time-range and size filter for list queries.
///
/// `start_after` is inclusive, `start_before` exclusive; both compare as text
/// against ISO-8601 `start_time` values. A `limit` of zero means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilter {
    pub start_after: Option<String>,
    pub start_before: Option<String>,
    pub limit: Option<usize>,
}

impl ListFilter {
    /// The effective limit, if any. Zero is treated as no limit.
    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|&n| n > 0)
    }
}

/// Behaviour on `drona_id` collision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertMode {
    /// Fail if the id already exists.
    #[default]
    Strict,
    /// Replace the existing row wholesale.
    Upsert,
}

/// Field-level update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub status: Option<String>,
    pub runtime_meta: Option<String>,
    pub start_time: Option<String>,
}

impl RecordUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.runtime_meta.is_none() && self.start_time.is_none()
    }
}
