//! Validator for raw filter criteria.
//!
//! All-or-nothing: either every input is well formed and a [`Criteria`]
//! comes back, or the first violation is reported and nothing of the
//! partially normalized state escapes.

use std::collections::HashMap;

use serde_json::Value;

use super::{Criteria, CriteriaError, FilterMode, FilterSpec, KindMask, RawCriteria, ValueRule};

pub fn validate(raw: &RawCriteria) -> Result<Criteria, CriteriaError> {
    let spec = validate_filter(&raw.custom_filter)?;
    let mode = validate_mode(&raw.filter_type)?;
    let kinds = KindMask {
        nodes: validate_kind_flag(&raw.keep_nodes, "keep_nodes")?,
        ways: validate_kind_flag(&raw.keep_ways, "keep_ways")?,
        relations: validate_kind_flag(&raw.keep_relations, "keep_relations")?,
    };

    let primary_keys = match &raw.osm_keys_to_keep {
        None => spec.sorted_keys(),
        Some(value) => validate_key_selector(value)?,
    };
    let tag_columns = match &raw.tags_as_columns {
        None => primary_keys.clone(),
        Some(value) => validate_column_projection(value)?,
    };

    Ok(Criteria {
        spec,
        mode,
        kinds,
        primary_keys,
        tag_columns,
    })
}

fn validate_filter(value: &Value) -> Result<FilterSpec, CriteriaError> {
    let Value::Object(entries) = value else {
        return Err(CriteriaError::InvalidFilterShape);
    };

    let mut rules = HashMap::with_capacity(entries.len());
    for (key, rule) in entries {
        // JSON object keys are always strings; the remaining key-shape
        // violation is the empty key.
        if key.is_empty() {
            return Err(CriteriaError::InvalidFilterKey { key: key.clone() });
        }

        let rule = match rule {
            Value::Bool(true) => ValueRule::Any,
            Value::Array(items) if !items.is_empty() => {
                let mut allowed = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => allowed.push(s.clone()),
                        _ => {
                            return Err(CriteriaError::InvalidFilterValue { key: key.clone() });
                        }
                    }
                }
                ValueRule::AnyOf(allowed)
            }
            // false, numbers, strings, objects, and the ambiguous empty
            // list are all rejected here.
            _ => return Err(CriteriaError::InvalidFilterValue { key: key.clone() }),
        };
        rules.insert(key.clone(), rule);
    }

    Ok(FilterSpec::from_rules(rules))
}

fn validate_mode(value: &Value) -> Result<FilterMode, CriteriaError> {
    match value {
        Value::String(s) if s == "keep" => Ok(FilterMode::Keep),
        Value::String(s) if s == "exclude" => Ok(FilterMode::Exclude),
        other => Err(CriteriaError::InvalidFilterMode {
            given: other.to_string(),
        }),
    }
}

fn validate_kind_flag(value: &Value, flag: &'static str) -> Result<bool, CriteriaError> {
    match value {
        Value::Bool(b) => Ok(*b),
        _ => Err(CriteriaError::InvalidKindFlag { flag }),
    }
}

fn validate_key_selector(value: &Value) -> Result<Vec<String>, CriteriaError> {
    match value {
        Value::String(key) => Ok(vec![key.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(key) => Ok(key.clone()),
                _ => Err(CriteriaError::InvalidKeySelector),
            })
            .collect(),
        _ => Err(CriteriaError::InvalidKeySelector),
    }
}

fn validate_column_projection(value: &Value) -> Result<Vec<String>, CriteriaError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(key) => Ok(key.clone()),
                _ => Err(CriteriaError::InvalidColumnProjection),
            })
            .collect(),
        _ => Err(CriteriaError::InvalidColumnProjection),
    }
}
