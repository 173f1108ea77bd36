//! # Field Paths
//!
//! Form fields arrive with bracket names such as `entry[title]`. A [`FieldPath`] is the
//! parsed form of such a name, built once when a rule is configured and reused for every
//! request the rule sees.
//!
//! ```text
//! entry[title]  ==>  ["entry", "title"]
//! a[b][c]       ==>  ["a", "b", "c"]
//! []            ==>  []
//! ```
use std::fmt::{self, Display};

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split(['[', ']'])
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Walks `root` one key per segment. Anything that is not an object along the way,
    /// a missing key, or an empty path gives `None`.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        if self.is_empty() {
            return None;
        }

        self.segments
            .iter()
            .try_fold(root, |value, segment| value.as_object()?.get(segment))
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join(" "))
    }
}
