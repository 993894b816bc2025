//! Dimension resolution and metric catalog filtering.
//!
//! Turning a generic metric catalog into the series applicable to one
//! resource is a small pipeline of pure functions:
//!
//! 1. [`resolve_dimensions`]: resource ARN -> the valued dimension CloudWatch
//!    keys the resource by (e.g. `InstanceId=i-0abc`)
//! 2. [`augment_with_static_dimensions`]: append metric-declared fixed dimensions
//! 3. [`reconcile_job_dimensions`]: drop job-declared valueless dimension names
//!    that already carry a concrete value
//! 4. [`filter_catalog`]: keep catalog entries whose dimensions are exactly the
//!    resolved dimensions plus the reconciled names

use crate::model::{Dimension, MetricCatalogEntry};
use crate::services::{DimensionRule, ServiceDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Ordered list of dimensions identifying one metric series.
///
/// Equality ignores order: two sets are equal when the same names map to the
/// same values.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionSet(Vec<Dimension>);

impl DimensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dimension> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Dimension] {
        &self.0
    }

    pub fn push(&mut self, dimension: Dimension) {
        self.0.push(dimension);
    }

    /// Value of the first dimension with the given name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.0.iter().any(|d| d.name == name)
    }

    /// Whether this set holds a dimension with exactly this name and value
    pub fn contains(&self, dimension: &Dimension) -> bool {
        self.0.contains(dimension)
    }

    /// Dimensions in canonical (name, value) order
    pub fn sorted(&self) -> Vec<Dimension> {
        let mut dims = self.0.clone();
        dims.sort();
        dims
    }
}

impl PartialEq for DimensionSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.sorted() == other.sorted()
    }
}

impl From<Vec<Dimension>> for DimensionSet {
    fn from(dims: Vec<Dimension>) -> Self {
        Self(dims)
    }
}

impl FromIterator<Dimension> for DimensionSet {
    fn from_iter<I: IntoIterator<Item = Dimension>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DimensionSet {
    type Item = &'a Dimension;
    type IntoIter = std::slice::Iter<'a, Dimension>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Map a resource identity to the dimension values CloudWatch expects for it.
///
/// Returns `None` when the identity does not carry a value under the
/// service's rule; such a resource cannot be matched to any series.
pub fn resolve_dimensions(
    resource_id: &str,
    service: &ServiceDescriptor,
    catalog: &[MetricCatalogEntry],
) -> Option<DimensionSet> {
    let value = match service.rule {
        DimensionRule::ArnSuffix { marker, .. } => resource_id
            .rsplit_once(marker)
            .map(|(_, v)| v.to_string()),
        DimensionRule::FullArn { .. } => Some(resource_id.to_string()),
        DimensionRule::CatalogSuffix { dimension } => {
            catalog_suffix_value(resource_id, dimension, catalog)
        }
    }
    .filter(|v| !v.is_empty())?;

    Some(DimensionSet::from(vec![Dimension::new(
        service.rule.dimension(),
        value,
    )]))
}

/// Longest catalog value of `dimension` that `resource_id` ends with on an
/// ARN segment boundary.
fn catalog_suffix_value(
    resource_id: &str,
    dimension: &str,
    catalog: &[MetricCatalogEntry],
) -> Option<String> {
    catalog
        .iter()
        .filter_map(|entry| entry.dimensions.get(dimension))
        .filter(|value| !value.is_empty())
        .filter(|value| match resource_id.strip_suffix(*value) {
            Some("") => true,
            Some(head) => head.ends_with(':') || head.ends_with('/'),
            None => false,
        })
        .max_by_key(|value| value.len())
        .map(str::to_string)
}

/// Append job/metric-declared fixed dimensions to a resolved set
pub fn augment_with_static_dimensions(mut set: DimensionSet, extra: &[Dimension]) -> DimensionSet {
    for dimension in extra {
        set.push(dimension.clone());
    }
    set
}

/// Remove job-declared dimension names that already have a value in `resolved`.
///
/// Sending a valueless and a valued dimension with the same name yields no
/// matching series, so the valued one wins.
pub fn reconcile_job_dimensions(job_dimensions: &[String], resolved: &DimensionSet) -> Vec<String> {
    let mut seen = BTreeSet::new();
    job_dimensions
        .iter()
        .filter(|name| !resolved.contains_name(name))
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// Select catalog entries consistent with the resolved dimensions plus the
/// reconciled job dimension names.
///
/// An entry matches only if its dimensions are exactly: every resolved
/// dimension (name and value) and one dimension per reconciled name (any
/// value). Entries with extra, missing or conflicting dimensions are excluded
/// rather than guessed at.
pub fn filter_catalog<'a>(
    resolved: &DimensionSet,
    reconciled_job_dimensions: &[String],
    catalog: &'a [MetricCatalogEntry],
) -> Vec<&'a MetricCatalogEntry> {
    let expected = resolved.len() + reconciled_job_dimensions.len();

    catalog
        .iter()
        .filter(|entry| entry.dimensions.len() == expected)
        .filter(|entry| resolved.iter().all(|d| entry.dimensions.contains(d)))
        .filter(|entry| {
            reconciled_job_dimensions
                .iter()
                .all(|name| entry.dimensions.contains_name(name))
        })
        .filter(|entry| {
            entry.dimensions.iter().all(|d| {
                resolved.contains(d) || reconciled_job_dimensions.iter().any(|n| *n == d.name)
            })
        })
        .collect()
}

/// Distinct values of the service's primary dimension present in the catalog.
///
/// Used to infer resources when tag-based discovery finds none.
pub fn catalog_dimension_values(
    service: &ServiceDescriptor,
    catalog: &[MetricCatalogEntry],
) -> Vec<String> {
    let dimension = service.rule.dimension();
    let mut seen = BTreeSet::new();
    catalog
        .iter()
        .filter_map(|entry| entry.dimensions.get(dimension))
        .filter(|value| !value.is_empty())
        .filter(|value| seen.insert(value.to_string()))
        .map(str::to_string)
        .collect()
}
