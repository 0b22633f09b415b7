//! Output table assembly: one row per surviving element, a geometry
//! column, fixed metadata columns, projected tag columns, and a catch-all
//! residual tag mapping.

pub mod arrow;

use geo_types::Geometry;

use crate::element::{ElementKind, OsmId, TagMap};
use crate::metadata::ElementMeta;

/// Count of elements dropped during geometry assembly, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounts {
    pub unresolved_way_refs: u64,
    pub unresolved_relation_members: u64,
}

impl DropCounts {
    pub fn total(&self) -> u64 {
        self.unresolved_way_refs + self.unresolved_relation_members
    }
}

#[derive(Debug, Clone)]
pub struct OutputRow {
    pub id: OsmId,
    pub osm_type: ElementKind,
    pub geometry: Geometry<f64>,
    pub version: Option<i64>,
    pub timestamp: Option<String>,
    pub changeset: Option<i64>,
    /// Residual tags: everything not projected into a standalone column.
    pub tags: TagMap,
    /// Values of the projected tag columns, parallel to
    /// [`FilterTable::tag_columns`]. `None` when the element lacks the tag.
    pub tag_values: Vec<Option<String>>,
}

/// The flat result table. Rows appear in kind-then-input order (nodes,
/// ways, relations); every row carries every projected column, so the
/// table is rectangular.
#[derive(Debug, Clone)]
pub struct FilterTable {
    /// CRS identifier passed through from the decoder.
    pub crs: String,
    pub tag_columns: Vec<String>,
    pub rows: Vec<OutputRow>,
    pub dropped: DropCounts,
}

impl FilterTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The full column set: fixed columns plus the projected tag columns.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = ["geometry", "id", "osm_type", "version", "timestamp", "changeset", "tags"]
            .into_iter()
            .map(String::from)
            .collect();
        names.extend(self.tag_columns.iter().cloned());
        names
    }
}

/// Project one surviving element into an output row.
pub fn project_row(
    id: OsmId,
    kind: ElementKind,
    geometry: Geometry<f64>,
    meta: Option<&ElementMeta>,
    tags: &TagMap,
    tag_columns: &[String],
) -> OutputRow {
    let tag_values = tag_columns
        .iter()
        .map(|key| tags.get(key).cloned())
        .collect();
    let residual = tags
        .iter()
        .filter(|(key, _)| !tag_columns.iter().any(|column| column == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let meta = meta.cloned().unwrap_or_default();
    OutputRow {
        id,
        osm_type: kind,
        geometry,
        version: meta.version,
        timestamp: meta.timestamp,
        changeset: meta.changeset,
        tags: residual,
        tag_values,
    }
}
