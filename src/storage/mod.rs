use std::collections::HashMap;

use crate::element::OsmId;

// Coordinates are stored as fixed precision integers (deg * 10^7), the
// native precision of OSM coordinates.
const SCALE_FACTOR: f64 = 10_000_000.0;

/// Shared, read-only node-coordinate lookup.
///
/// Built once by the decoder before filtering begins; the engine only ever
/// calls [`NodeIndex::get`]. Reads are lock-free, so geometry assembly may
/// run concurrently against one index.
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    nodes: HashMap<OsmId, (i32, i32)>,
}

impl NodeIndex {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: HashMap::with_capacity(capacity),
        }
    }

    pub fn put(&mut self, id: OsmId, lat: f64, lon: f64) {
        let lat_fixed = (lat * SCALE_FACTOR) as i32;
        let lon_fixed = (lon * SCALE_FACTOR) as i32;
        self.nodes.insert(id, (lon_fixed, lat_fixed));
    }

    /// Returns `(lon, lat)` for a node id, or `None` for an unknown node.
    pub fn get(&self, id: OsmId) -> Option<(f64, f64)> {
        let (lon_fixed, lat_fixed) = self.nodes.get(&id)?;
        Some((
            *lon_fixed as f64 / SCALE_FACTOR,
            *lat_fixed as f64 / SCALE_FACTOR,
        ))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Index every node of an iterator, convenience for decoders and tests.
impl FromIterator<(OsmId, f64, f64)> for NodeIndex {
    fn from_iter<I: IntoIterator<Item = (OsmId, f64, f64)>>(iter: I) -> Self {
        let mut index = NodeIndex::new();
        for (id, lat, lon) in iter {
            index.put(id, lat, lon);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get_preserves_precision_to_7_decimal_places() {
        let mut index = NodeIndex::new();
        index.put(1, 51.5073509, -0.1277583);
        index.put(2, 40.7127753, -74.0059728);

        let (lon, lat) = index.get(1).unwrap();
        assert!((lat - 51.5073509).abs() < 1e-7);
        assert!((lon - (-0.1277583)).abs() < 1e-7);

        let (lon, lat) = index.get(2).unwrap();
        assert!((lat - 40.7127753).abs() < 1e-7);
        assert!((lon - (-74.0059728)).abs() < 1e-7);
    }

    #[test]
    fn returns_none_for_missing_node() {
        let index = NodeIndex::new();
        assert!(index.get(999).is_none());
    }

    #[test]
    fn overwrites_existing_node() {
        let mut index = NodeIndex::new();
        index.put(1, 51.5, -0.1);
        index.put(1, 40.7, -74.0);

        let (lon, lat) = index.get(1).unwrap();
        assert!((lat - 40.7).abs() < 1e-7);
        assert!((lon - (-74.0)).abs() < 1e-7);
    }

    #[test]
    fn handles_extreme_coordinates() {
        let mut index = NodeIndex::new();
        index.put(1, 90.0, 180.0);
        index.put(2, -90.0, -180.0);

        let (lon, lat) = index.get(1).unwrap();
        assert!((lat - 90.0).abs() < 1e-7);
        assert!((lon - 180.0).abs() < 1e-7);

        let (lon, lat) = index.get(2).unwrap();
        assert!((lat - (-90.0)).abs() < 1e-7);
        assert!((lon - (-180.0)).abs() < 1e-7);
    }

    #[test]
    fn collects_from_iterator() {
        let index: NodeIndex = vec![(1, 0.5, 0.5), (2, 1.5, 1.5)].into_iter().collect();
        assert_eq!(index.len(), 2);
        assert!(index.get(2).is_some());
    }
}
