//! Evaluator for validated filter criteria.

use super::{FilterSpec, ValueRule};
use crate::element::TagMap;

/// Evaluate a filter spec against one element's tags.
///
/// OR across keys: the tags match if any spec key is present and its rule
/// accepts the tag value. Exact string equality within a key. Pure; the
/// result depends only on the two arguments.
pub fn matches(tags: &TagMap, spec: &FilterSpec) -> bool {
    spec.rules().any(|(key, rule)| match tags.get(key) {
        None => false,
        Some(value) => match rule {
            ValueRule::Any => true,
            ValueRule::AnyOf(allowed) => allowed.iter().any(|v| v == value),
        },
    })
}
