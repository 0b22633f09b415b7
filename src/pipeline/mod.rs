//! Element selection and the end-to-end filtering pass.
//!
//! Selection is a single logical pass: each decision depends only on one
//! element's tags and the read-only criteria, so kinds are processed as
//! contiguous parallel chunks and concatenated in chunk order, which keeps
//! the original relative order of survivors.

use rayon::prelude::*;

use crate::criteria::{Criteria, CriteriaError, FilterMode, FilterSpec, RawCriteria, matches, validate};
use crate::element::{ElementKind, ElementSet, Node, OsmId, Relation, TagMap, Way};
use crate::geometry::Assembler;
use crate::storage::NodeIndex;
use crate::table::{DropCounts, FilterTable, project_row};

const SELECT_CHUNK: usize = 4096;

/// The fields selection reads, implemented per element kind.
pub trait Tagged {
    fn id(&self) -> OsmId;
    fn tags(&self) -> &TagMap;
}

impl Tagged for Node {
    fn id(&self) -> OsmId {
        self.id
    }
    fn tags(&self) -> &TagMap {
        &self.tags
    }
}

impl Tagged for Way {
    fn id(&self) -> OsmId {
        self.id
    }
    fn tags(&self) -> &TagMap {
        &self.tags
    }
}

impl Tagged for Relation {
    fn id(&self) -> OsmId {
        self.id
    }
    fn tags(&self) -> &TagMap {
        &self.tags
    }
}

/// Surviving element ids per kind, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub nodes: Vec<OsmId>,
    pub ways: Vec<OsmId>,
    pub relations: Vec<OsmId>,
}

impl Selection {
    pub fn total(&self) -> usize {
        self.nodes.len() + self.ways.len() + self.relations.len()
    }
}

/// Apply the kind mask and the tag predicate to the full element set.
/// Disabled kinds are skipped unconditionally; matching is per element,
/// never through relation membership.
pub fn select(set: &ElementSet, criteria: &Criteria) -> Selection {
    let picked = select_indices(set, criteria);
    Selection {
        nodes: picked.nodes.iter().map(|&i| set.nodes[i].id).collect(),
        ways: picked.ways.iter().map(|&i| set.ways[i].id).collect(),
        relations: picked
            .relations
            .iter()
            .map(|&i| set.relations[i].id)
            .collect(),
    }
}

struct SelectedIndices {
    nodes: Vec<usize>,
    ways: Vec<usize>,
    relations: Vec<usize>,
}

fn select_indices(set: &ElementSet, criteria: &Criteria) -> SelectedIndices {
    SelectedIndices {
        nodes: if criteria.kinds.nodes {
            select_kind(&set.nodes, &criteria.spec, criteria.mode)
        } else {
            Vec::new()
        },
        ways: if criteria.kinds.ways {
            select_kind(&set.ways, &criteria.spec, criteria.mode)
        } else {
            Vec::new()
        },
        relations: if criteria.kinds.relations {
            select_kind(&set.relations, &criteria.spec, criteria.mode)
        } else {
            Vec::new()
        },
    }
}

fn select_kind<T: Tagged + Sync>(items: &[T], spec: &FilterSpec, mode: FilterMode) -> Vec<usize> {
    let chunks: Vec<Vec<usize>> = items
        .par_chunks(SELECT_CHUNK)
        .enumerate()
        .map(|(chunk_no, chunk)| {
            let base = chunk_no * SELECT_CHUNK;
            chunk
                .iter()
                .enumerate()
                .filter(|(_, item)| mode.retains(matches(item.tags(), spec)))
                .map(|(offset, _)| base + offset)
                .collect()
        })
        .collect();
    chunks.into_iter().flatten().collect()
}

/// Validate raw criteria, then filter. The main caller-facing entry point.
pub fn filter_by_criteria(
    set: &ElementSet,
    nodes: &NodeIndex,
    raw: &RawCriteria,
) -> Result<FilterTable, CriteriaError> {
    let criteria = validate(raw)?;
    Ok(filter_elements(set, nodes, &criteria))
}

/// Filter with already-validated criteria: select survivors, assemble
/// geometry per kind, and project rows in kind-then-input order. Geometry
/// failures drop the element and are counted, never fatal.
pub fn filter_elements(set: &ElementSet, nodes: &NodeIndex, criteria: &Criteria) -> FilterTable {
    let picked = select_indices(set, criteria);
    tracing::info!(
        nodes = picked.nodes.len(),
        ways = picked.ways.len(),
        relations = picked.relations.len(),
        mode = criteria.mode.label(),
        "selected elements"
    );

    let assembler = Assembler::new(set, nodes);
    let mut dropped = DropCounts::default();
    let mut rows =
        Vec::with_capacity(picked.nodes.len() + picked.ways.len() + picked.relations.len());

    for &i in &picked.nodes {
        let node = &set.nodes[i];
        rows.push(project_row(
            node.id,
            ElementKind::Node,
            assembler.node_geometry(node),
            node.meta.as_ref(),
            &node.tags,
            &criteria.tag_columns,
        ));
    }

    for &i in &picked.ways {
        let way = &set.ways[i];
        match assembler.way_geometry(way) {
            Ok(geometry) => rows.push(project_row(
                way.id,
                ElementKind::Way,
                geometry,
                way.meta.as_ref(),
                &way.tags,
                &criteria.tag_columns,
            )),
            Err(err) => {
                dropped.unresolved_way_refs += 1;
                tracing::debug!("dropping way: {err}");
            }
        }
    }

    for &i in &picked.relations {
        let rel = &set.relations[i];
        match assembler.relation_geometry(rel) {
            Ok(geometry) => rows.push(project_row(
                rel.id,
                ElementKind::Relation,
                geometry,
                rel.meta.as_ref(),
                &rel.tags,
                &criteria.tag_columns,
            )),
            Err(err) => {
                dropped.unresolved_relation_members += 1;
                tracing::debug!("dropping relation: {err}");
            }
        }
    }

    if dropped.total() > 0 {
        tracing::info!(
            unresolved_way_refs = dropped.unresolved_way_refs,
            unresolved_relation_members = dropped.unresolved_relation_members,
            "dropped elements during geometry assembly"
        );
    }

    FilterTable {
        crs: set.crs.clone(),
        tag_columns: criteria.tag_columns.clone(),
        rows,
        dropped,
    }
}
