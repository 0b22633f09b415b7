//! Custom-criteria filtering and geometry assembly for decoded
//! OpenStreetMap primitives.
//!
//! The crate takes an in-memory [`ElementSet`] (nodes, ways, relations, as
//! produced by an external binary-format decoder), a shared [`NodeIndex`]
//! of node coordinates, and caller-supplied [`RawCriteria`]. Criteria are
//! validated once, elements are selected per kind by a tag predicate,
//! geometry is assembled per kind, and the survivors come back as a flat
//! [`FilterTable`] with a geometry column, fixed metadata columns, a
//! catch-all tag column, and optional per-tag columns. The table can be
//! materialized as an Arrow record batch.
//!
//! ```
//! use osmsift::{ElementSet, NodeIndex, RawCriteria, filter_by_criteria};
//! use serde_json::json;
//!
//! let set = ElementSet::new("EPSG:4326", vec![], vec![], vec![]);
//! let nodes = NodeIndex::new();
//! let raw = RawCriteria::new(json!({"building": ["retail"]}));
//!
//! let table = filter_by_criteria(&set, &nodes, &raw)?;
//! assert!(table.is_empty());
//! # Ok::<(), osmsift::CriteriaError>(())
//! ```

pub mod criteria;
pub mod element;
pub mod geometry;
pub mod metadata;
pub mod pipeline;
pub mod storage;
pub mod table;

pub use criteria::{
    Criteria, CriteriaError, FilterMode, FilterSpec, KindMask, RawCriteria, ValueRule,
};
pub use element::{ElementKind, ElementSet, Member, Node, OsmId, Relation, TagMap, Way};
pub use geometry::{Assembler, AssemblyError};
pub use metadata::ElementMeta;
pub use pipeline::{Selection, filter_by_criteria, filter_elements, select};
pub use storage::NodeIndex;
pub use table::{DropCounts, FilterTable, OutputRow};
