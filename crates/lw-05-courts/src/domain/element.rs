//! Elements and the combination table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const ELEMENT_PREFIX: &str = "element-";

/// Result id of a combination that is never allowed.
pub const BLOCKED_ELEMENT: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: i64,
    #[serde(default)]
    pub description: String,
    /// Accept this element without checking where it was minted.
    #[serde(default)]
    pub skip_origin_validation: bool,
}

impl Element {
    pub fn name(&self) -> String {
        element_name(self.id)
    }
}

/// `element-<hex id>`, with a leading `-` for negative ids.
pub fn element_name(id: i64) -> String {
    if id < 0 {
        format!("{ELEMENT_PREFIX}-{:x}", id.unsigned_abs())
    } else {
        format!("{ELEMENT_PREFIX}{id:x}")
    }
}

/// Inverse of [`element_name`]. `None` for names that do not parse.
pub fn element_id(name: &str) -> Option<i64> {
    let hex = name.strip_prefix(ELEMENT_PREFIX).unwrap_or(name);
    match i64::from_str_radix(hex, 16) {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(name, error = %e, "[lw-05] Element name is not hex");
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementCombination {
    pub from: Vec<i64>,
    pub to: i64,
}

/// Sorted ingredient list → result id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementCombinationMap(HashMap<String, i64>);

impl ElementCombinationMap {
    pub fn new(combinations: &[ElementCombination]) -> Self {
        let mut map = Self::default();
        for combination in combinations {
            map.0.insert(Self::key(&combination.from), combination.to);
        }
        map
    }

    /// Order independent key, e.g. `[100 200]`.
    pub fn key(ids: &[i64]) -> String {
        let mut sorted = ids.to_vec();
        sorted.sort_unstable();
        let parts: Vec<String> = sorted.iter().map(i64::to_string).collect();
        format!("[{}]", parts.join(" "))
    }

    pub fn find(&self, ids: &[i64]) -> Option<i64> {
        self.0.get(&Self::key(ids)).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
