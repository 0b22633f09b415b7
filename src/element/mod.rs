//! Decoded OSM primitives as handed over by the binary-format decoder.
//!
//! The engine never mutates these; an [`ElementSet`] is read-only for the
//! lifetime of one filtering invocation.

use std::collections::HashMap;

use crate::metadata::ElementMeta;

pub type OsmId = i64;

/// Tag key/value pairs of a single primitive. Keys are unique.
pub type TagMap = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    /// Label used in the `osm_type` output column.
    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: OsmId,
    pub lat: f64,
    pub lon: f64,
    pub tags: TagMap,
    pub meta: Option<ElementMeta>,
}

#[derive(Debug, Clone)]
pub struct Way {
    pub id: OsmId,
    /// Ordered node references; resolved against the node index at
    /// geometry-assembly time.
    pub refs: Vec<OsmId>,
    pub tags: TagMap,
    pub meta: Option<ElementMeta>,
}

#[derive(Debug, Clone)]
pub struct Member {
    pub kind: ElementKind,
    pub id: OsmId,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct Relation {
    pub id: OsmId,
    /// Ordered typed members. Member order is preserved in assembled
    /// geometry collections.
    pub members: Vec<Member>,
    pub tags: TagMap,
    pub meta: Option<ElementMeta>,
}

/// The full decoded primitive collection for one invocation, plus the CRS
/// identifier the decoder read from the source header.
///
/// Ways and relations are additionally indexed by id so relation members
/// can be resolved without scanning.
#[derive(Debug, Clone)]
pub struct ElementSet {
    pub crs: String,
    pub nodes: Vec<Node>,
    pub ways: Vec<Way>,
    pub relations: Vec<Relation>,
    way_index: HashMap<OsmId, usize>,
    relation_index: HashMap<OsmId, usize>,
}

impl ElementSet {
    pub fn new(
        crs: impl Into<String>,
        nodes: Vec<Node>,
        ways: Vec<Way>,
        relations: Vec<Relation>,
    ) -> Self {
        let way_index = ways.iter().enumerate().map(|(i, w)| (w.id, i)).collect();
        let relation_index = relations
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id, i))
            .collect();
        Self {
            crs: crs.into(),
            nodes,
            ways,
            relations,
            way_index,
            relation_index,
        }
    }

    pub fn way(&self, id: OsmId) -> Option<&Way> {
        self.way_index.get(&id).map(|&i| &self.ways[i])
    }

    pub fn relation(&self, id: OsmId) -> Option<&Relation> {
        self.relation_index.get(&id).map(|&i| &self.relations[i])
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.ways.len() + self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build a tag map from borrowed key/value pairs.
pub fn build_tag_map<'a, I>(tags: I) -> TagMap
where
    I: Iterator<Item = (&'a str, &'a str)>,
{
    tags.map(|(k, v)| (k.to_string(), v.to_string())).collect()
}
