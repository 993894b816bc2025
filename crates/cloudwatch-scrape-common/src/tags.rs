//! Resource tag filtering and metric tag projection.

use crate::config::ExportedTagsOnMetrics;
use crate::model::{ResourceRecord, Tag};
use regex::Regex;
use serde::Deserialize;

/// A search tag: resources pass when a tag with `key` has a value matching `pattern`
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawTagFilter")]
pub struct TagFilter {
    pub key: String,
    pub pattern: Regex,
}

/// Raw `searchTags` entry as written in configuration
#[derive(Debug, Deserialize)]
struct RawTagFilter {
    key: String,
    value: String,
}

impl TryFrom<RawTagFilter> for TagFilter {
    type Error = regex::Error;

    fn try_from(raw: RawTagFilter) -> Result<Self, Self::Error> {
        TagFilter::new(raw.key, &raw.value)
    }
}

impl TagFilter {
    pub fn new(key: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            key: key.into(),
            pattern: Regex::new(pattern)?,
        })
    }

    fn matches(&self, tag: &Tag) -> bool {
        tag.key == self.key && self.pattern.is_match(&tag.value)
    }
}

/// Whether a resource passes every filter.
///
/// Each filter must be satisfied by at least one resource tag with the same
/// key. An empty filter list passes everything.
pub fn filter_through_tags(resource: &ResourceRecord, filters: &[TagFilter]) -> bool {
    filters
        .iter()
        .all(|filter| resource.tags.iter().any(|tag| filter.matches(tag)))
}

/// Project the exported tag names of the resource's service onto the resource.
///
/// Always returns one tag per configured name, with an empty value when the
/// resource lacks that tag, so every record of a service has the same labels.
pub fn project_metric_tags(resource: &ResourceRecord, exported: &ExportedTagsOnMetrics) -> Vec<Tag> {
    exported
        .get(&resource.service)
        .map(|names| {
            names
                .iter()
                .map(|name| Tag::new(name, resource.tag(name).unwrap_or_default()))
                .collect()
        })
        .unwrap_or_default()
}
