//! Custom filter criteria for OSM tag matching.
//!
//! Callers describe what to keep as an untyped [`RawCriteria`] (tag filter,
//! filter mode, per-kind retention flags, column selection). Validation
//! turns that into a typed [`Criteria`] once, before any element is read;
//! evaluation is then a pure predicate over one element's tags.
//!
//! Filter shape:
//!   {"building": true}                  - key exists, any value
//!   {"building": ["retail", "office"]}  - key exists with a listed value
//!   {"route": [...], "railway": [...]}  - OR across keys

mod eval;
mod validate;

pub use eval::matches;
pub use validate::validate;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A validated value rule for one tag key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueRule {
    /// Match the key regardless of value (the boolean-true sentinel).
    Any,
    /// Match when the tag value equals one of the listed strings. Never
    /// empty; an empty list is rejected during validation.
    AnyOf(Vec<String>),
}

/// The validated tag predicate: tag key to value rule, OR across keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    rules: HashMap<String, ValueRule>,
}

impl FilterSpec {
    pub fn rules(&self) -> impl Iterator<Item = (&String, &ValueRule)> {
        self.rules.iter()
    }

    pub fn rule(&self, key: &str) -> Option<&ValueRule> {
        self.rules.get(key)
    }

    /// Spec keys in sorted order, used as the default primary key list.
    pub fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.rules.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn from_rules(rules: HashMap<String, ValueRule>) -> Self {
        Self { rules }
    }
}

/// How a predicate match translates into retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Keep,
    Exclude,
}

impl FilterMode {
    /// Whether an element with predicate result `matched` survives.
    pub fn retains(&self, matched: bool) -> bool {
        match self {
            FilterMode::Keep => matched,
            FilterMode::Exclude => !matched,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterMode::Keep => "keep",
            FilterMode::Exclude => "exclude",
        }
    }
}

/// Per-kind retention flags. A disabled kind is skipped unconditionally,
/// regardless of tag match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindMask {
    pub nodes: bool,
    pub ways: bool,
    pub relations: bool,
}

impl Default for KindMask {
    fn default() -> Self {
        Self {
            nodes: true,
            ways: true,
            relations: true,
        }
    }
}

/// Untyped caller input, shaped like the keyword surface of the original
/// API. Fields are raw JSON values so that every malformed shape is
/// representable and rejected with a distinct error instead of failing
/// opaquely at deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCriteria {
    /// Tag filter: object mapping tag keys to `true` or a list of strings.
    pub custom_filter: Value,
    /// `"keep"` (default) or `"exclude"`, case-sensitive.
    #[serde(default = "default_filter_type")]
    pub filter_type: Value,
    #[serde(default = "default_kind_flag")]
    pub keep_nodes: Value,
    #[serde(default = "default_kind_flag")]
    pub keep_ways: Value,
    #[serde(default = "default_kind_flag")]
    pub keep_relations: Value,
    /// Tag key(s) promoted to named columns when `tags_as_columns` is not
    /// given: a string or a list of strings.
    #[serde(default)]
    pub osm_keys_to_keep: Option<Value>,
    /// Tag keys materialized as standalone columns.
    #[serde(default)]
    pub tags_as_columns: Option<Value>,
}

fn default_filter_type() -> Value {
    Value::String("keep".to_string())
}

fn default_kind_flag() -> Value {
    Value::Bool(true)
}

impl RawCriteria {
    /// Criteria with defaults: keep mode, all kinds retained, columns
    /// derived from the filter keys.
    pub fn new(custom_filter: Value) -> Self {
        Self {
            custom_filter,
            filter_type: default_filter_type(),
            keep_nodes: default_kind_flag(),
            keep_ways: default_kind_flag(),
            keep_relations: default_kind_flag(),
            osm_keys_to_keep: None,
            tags_as_columns: None,
        }
    }
}

/// Validated, read-only configuration for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    pub spec: FilterSpec,
    pub mode: FilterMode,
    pub kinds: KindMask,
    /// Primary tag keys; defaults to the sorted filter keys.
    pub primary_keys: Vec<String>,
    /// Effective column projection: `tags_as_columns` when given, the
    /// primary keys otherwise.
    pub tag_columns: Vec<String>,
}

/// Validation failures. All are fatal to the invocation and raised before
/// any element is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CriteriaError {
    #[error("custom_filter should be a mapping from tag keys to true or a list of strings")]
    InvalidFilterShape,

    #[error("custom_filter keys should be non-empty strings, got {key:?}")]
    InvalidFilterKey { key: String },

    #[error("custom_filter value for {key:?} should be true or a non-empty list of strings")]
    InvalidFilterValue { key: String },

    #[error("filter_type should be either 'keep' or 'exclude', got {given}")]
    InvalidFilterMode { given: String },

    #[error("'{flag}' should be boolean type: true or false")]
    InvalidKindFlag { flag: &'static str },

    #[error("'osm_keys_to_keep' should be a string or a list of strings")]
    InvalidKeySelector,

    #[error("all tags listed in 'tags_as_columns' should be strings")]
    InvalidColumnProjection,
}
