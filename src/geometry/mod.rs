//! Geometry assembly for surviving elements, one rule per element kind.

use std::collections::HashSet;

use geo_types::{Geometry, GeometryCollection, LineString, Point, Polygon};
use thiserror::Error;

use crate::element::{ElementKind, ElementSet, Node, OsmId, Relation, Way};
use crate::storage::NodeIndex;

/// Per-element geometry failures. Non-fatal: the offending element is
/// dropped from the result and the condition is counted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("way {way} references node {node} missing from the node index")]
    UnresolvedNodeReference { way: OsmId, node: OsmId },

    #[error("relation {relation} has no resolvable members")]
    UnresolvedRelationMembers { relation: OsmId },
}

/// Resolves geometry against the element set and the shared node index.
/// Read-only; may be invoked concurrently and repeatedly for the same
/// element.
pub struct Assembler<'a> {
    set: &'a ElementSet,
    nodes: &'a NodeIndex,
}

impl<'a> Assembler<'a> {
    pub fn new(set: &'a ElementSet, nodes: &'a NodeIndex) -> Self {
        Self { set, nodes }
    }

    pub fn node_geometry(&self, node: &Node) -> Geometry<f64> {
        Geometry::Point(Point::new(node.lon, node.lat))
    }

    /// Resolve a way's node references to an ordered coordinate sequence.
    /// A closed sequence of at least 4 points becomes a polygon ring,
    /// anything else a line string.
    pub fn way_geometry(&self, way: &Way) -> Result<Geometry<f64>, AssemblyError> {
        let mut coords = Vec::with_capacity(way.refs.len());
        for &node_id in &way.refs {
            match self.nodes.get(node_id) {
                Some(coord) => coords.push(coord),
                None => {
                    return Err(AssemblyError::UnresolvedNodeReference {
                        way: way.id,
                        node: node_id,
                    });
                }
            }
        }
        Ok(line_or_ring(coords))
    }

    /// Resolve every member via its own kind's rule into a geometry
    /// collection, preserving member order. Unresolvable members are
    /// skipped; a relation with no resolvable members fails. A relation
    /// reached again on the current resolution path aborts the whole
    /// assembly rather than recursing forever.
    pub fn relation_geometry(&self, relation: &Relation) -> Result<Geometry<f64>, AssemblyError> {
        let mut path = HashSet::new();
        match self.relation_parts(relation, &mut path)? {
            Some(geometry) => Ok(geometry),
            None => Err(AssemblyError::UnresolvedRelationMembers {
                relation: relation.id,
            }),
        }
    }

    fn relation_parts(
        &self,
        relation: &Relation,
        path: &mut HashSet<OsmId>,
    ) -> Result<Option<Geometry<f64>>, AssemblyError> {
        if !path.insert(relation.id) {
            return Err(AssemblyError::UnresolvedRelationMembers {
                relation: relation.id,
            });
        }

        let mut parts = Vec::new();
        for member in &relation.members {
            match member.kind {
                ElementKind::Node => match self.nodes.get(member.id) {
                    Some((lon, lat)) => parts.push(Geometry::Point(Point::new(lon, lat))),
                    None => {
                        tracing::debug!(
                            relation = relation.id,
                            node = member.id,
                            "skipping unresolvable node member"
                        );
                    }
                },
                ElementKind::Way => match self.set.way(member.id) {
                    Some(way) => match self.way_geometry(way) {
                        Ok(geometry) => parts.push(geometry),
                        Err(err) => {
                            tracing::debug!(
                                relation = relation.id,
                                way = member.id,
                                "skipping member way: {err}"
                            );
                        }
                    },
                    None => {
                        tracing::debug!(
                            relation = relation.id,
                            way = member.id,
                            "skipping unknown way member"
                        );
                    }
                },
                ElementKind::Relation => match self.set.relation(member.id) {
                    Some(child) => match self.relation_parts(child, path)? {
                        Some(geometry) => parts.push(geometry),
                        None => {
                            tracing::debug!(
                                relation = relation.id,
                                member = member.id,
                                "skipping empty member relation"
                            );
                        }
                    },
                    None => {
                        tracing::debug!(
                            relation = relation.id,
                            member = member.id,
                            "skipping unknown relation member"
                        );
                    }
                },
            }
        }
        path.remove(&relation.id);

        if parts.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Geometry::GeometryCollection(GeometryCollection(
                parts,
            ))))
        }
    }
}

fn line_or_ring(coords: Vec<(f64, f64)>) -> Geometry<f64> {
    let line_string = LineString::from(coords);
    if line_string.0.len() >= 4 && line_string.is_closed() {
        Geometry::Polygon(Polygon::new(line_string, vec![]))
    } else {
        Geometry::LineString(line_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Member, TagMap};

    fn node_index(coords: &[(OsmId, f64, f64)]) -> NodeIndex {
        coords.iter().copied().collect()
    }

    fn way(id: OsmId, refs: Vec<OsmId>) -> Way {
        Way {
            id,
            refs,
            tags: TagMap::new(),
            meta: None,
        }
    }

    fn relation(id: OsmId, members: Vec<Member>) -> Relation {
        Relation {
            id,
            members,
            tags: TagMap::new(),
            meta: None,
        }
    }

    fn member(kind: ElementKind, id: OsmId) -> Member {
        Member {
            kind,
            id,
            role: String::new(),
        }
    }

    #[test]
    fn closed_way_with_four_points_is_polygon() {
        let nodes = node_index(&[(1, 0.0, 0.0), (2, 0.0, 1.0), (3, 1.0, 1.0)]);
        let set = ElementSet::new(
            "EPSG:4326",
            Vec::new(),
            vec![way(10, vec![1, 2, 3, 1])],
            Vec::new(),
        );
        let assembler = Assembler::new(&set, &nodes);

        let geometry = assembler.way_geometry(set.way(10).unwrap()).unwrap();
        assert!(matches!(geometry, Geometry::Polygon(_)));
    }

    #[test]
    fn open_way_is_line_string() {
        let nodes = node_index(&[(1, 0.0, 0.0), (2, 0.0, 1.0), (3, 1.0, 1.0)]);
        let set = ElementSet::new(
            "EPSG:4326",
            Vec::new(),
            vec![way(10, vec![1, 2, 3])],
            Vec::new(),
        );
        let assembler = Assembler::new(&set, &nodes);

        let geometry = assembler.way_geometry(set.way(10).unwrap()).unwrap();
        assert!(matches!(geometry, Geometry::LineString(_)));
    }

    #[test]
    fn closed_triangle_of_three_points_stays_line_string() {
        // First == last but only 3 distinct coordinates: not enough for a ring.
        let nodes = node_index(&[(1, 0.0, 0.0), (2, 0.0, 1.0)]);
        let set = ElementSet::new(
            "EPSG:4326",
            Vec::new(),
            vec![way(10, vec![1, 2, 1])],
            Vec::new(),
        );
        let assembler = Assembler::new(&set, &nodes);

        let geometry = assembler.way_geometry(set.way(10).unwrap()).unwrap();
        assert!(matches!(geometry, Geometry::LineString(_)));
    }

    #[test]
    fn missing_node_reference_fails_the_way() {
        let nodes = node_index(&[(1, 0.0, 0.0)]);
        let set = ElementSet::new(
            "EPSG:4326",
            Vec::new(),
            vec![way(10, vec![1, 99])],
            Vec::new(),
        );
        let assembler = Assembler::new(&set, &nodes);

        let err = assembler.way_geometry(set.way(10).unwrap()).unwrap_err();
        assert_eq!(
            err,
            AssemblyError::UnresolvedNodeReference { way: 10, node: 99 }
        );
    }

    #[test]
    fn relation_collects_members_in_order() {
        let nodes = node_index(&[(1, 0.0, 0.0), (2, 0.0, 1.0), (3, 1.0, 1.0), (4, 2.0, 2.0)]);
        let set = ElementSet::new(
            "EPSG:4326",
            Vec::new(),
            vec![way(10, vec![1, 2, 3])],
            vec![relation(
                20,
                vec![
                    member(ElementKind::Way, 10),
                    member(ElementKind::Node, 4),
                ],
            )],
        );
        let assembler = Assembler::new(&set, &nodes);

        let geometry = assembler
            .relation_geometry(set.relation(20).unwrap())
            .unwrap();
        let Geometry::GeometryCollection(collection) = geometry else {
            panic!("expected a geometry collection");
        };
        assert_eq!(collection.0.len(), 2);
        assert!(matches!(collection.0[0], Geometry::LineString(_)));
        assert!(matches!(collection.0[1], Geometry::Point(_)));
    }

    #[test]
    fn relation_with_empty_member_list_fails() {
        let nodes = NodeIndex::new();
        let set = ElementSet::new(
            "EPSG:4326",
            Vec::new(),
            Vec::new(),
            vec![relation(20, Vec::new())],
        );
        let assembler = Assembler::new(&set, &nodes);

        let err = assembler
            .relation_geometry(set.relation(20).unwrap())
            .unwrap_err();
        assert_eq!(err, AssemblyError::UnresolvedRelationMembers { relation: 20 });
    }

    #[test]
    fn relation_with_no_resolvable_members_fails() {
        let nodes = NodeIndex::new();
        let set = ElementSet::new(
            "EPSG:4326",
            Vec::new(),
            Vec::new(),
            vec![relation(
                20,
                vec![member(ElementKind::Node, 1), member(ElementKind::Way, 2)],
            )],
        );
        let assembler = Assembler::new(&set, &nodes);

        let err = assembler
            .relation_geometry(set.relation(20).unwrap())
            .unwrap_err();
        assert_eq!(err, AssemblyError::UnresolvedRelationMembers { relation: 20 });
    }

    #[test]
    fn relation_survives_partially_resolvable_members() {
        let nodes = node_index(&[(1, 0.5, 0.5)]);
        let set = ElementSet::new(
            "EPSG:4326",
            Vec::new(),
            Vec::new(),
            vec![relation(
                20,
                vec![member(ElementKind::Node, 1), member(ElementKind::Node, 99)],
            )],
        );
        let assembler = Assembler::new(&set, &nodes);

        let geometry = assembler
            .relation_geometry(set.relation(20).unwrap())
            .unwrap();
        let Geometry::GeometryCollection(collection) = geometry else {
            panic!("expected a geometry collection");
        };
        assert_eq!(collection.0.len(), 1);
    }

    #[test]
    fn self_referencing_relation_fails() {
        let nodes = node_index(&[(1, 0.5, 0.5)]);
        let set = ElementSet::new(
            "EPSG:4326",
            Vec::new(),
            Vec::new(),
            vec![relation(
                20,
                vec![member(ElementKind::Node, 1), member(ElementKind::Relation, 20)],
            )],
        );
        let assembler = Assembler::new(&set, &nodes);

        let err = assembler
            .relation_geometry(set.relation(20).unwrap())
            .unwrap_err();
        assert_eq!(err, AssemblyError::UnresolvedRelationMembers { relation: 20 });
    }

    #[test]
    fn indirect_relation_cycle_fails() {
        let nodes = node_index(&[(1, 0.5, 0.5)]);
        let set = ElementSet::new(
            "EPSG:4326",
            Vec::new(),
            Vec::new(),
            vec![
                relation(
                    20,
                    vec![member(ElementKind::Node, 1), member(ElementKind::Relation, 21)],
                ),
                relation(21, vec![member(ElementKind::Relation, 20)]),
            ],
        );
        let assembler = Assembler::new(&set, &nodes);

        assert!(
            assembler
                .relation_geometry(set.relation(20).unwrap())
                .is_err()
        );
        assert!(
            assembler
                .relation_geometry(set.relation(21).unwrap())
                .is_err()
        );
    }

    #[test]
    fn shared_member_without_cycle_is_allowed() {
        // 20 -> {21, 22}, both 21 and 22 -> node 1. A diamond, not a cycle.
        let nodes = node_index(&[(1, 0.5, 0.5)]);
        let set = ElementSet::new(
            "EPSG:4326",
            Vec::new(),
            Vec::new(),
            vec![
                relation(
                    20,
                    vec![
                        member(ElementKind::Relation, 21),
                        member(ElementKind::Relation, 22),
                    ],
                ),
                relation(21, vec![member(ElementKind::Node, 1)]),
                relation(22, vec![member(ElementKind::Node, 1)]),
            ],
        );
        let assembler = Assembler::new(&set, &nodes);

        let geometry = assembler
            .relation_geometry(set.relation(20).unwrap())
            .unwrap();
        let Geometry::GeometryCollection(collection) = geometry else {
            panic!("expected a geometry collection");
        };
        assert_eq!(collection.0.len(), 2);
    }
}
