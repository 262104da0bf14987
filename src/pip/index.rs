//! R-tree accelerated containment queries over one polygon layer.

use geo::{Contains, Point};
use rstar::{RTree, RTreeObject, AABB};
use tracing::debug;

use crate::models::{LayerRow, PolygonLayer};

/// R-tree entry: a row index plus its bounding box.
struct IndexedRow {
    idx: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedRow {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// An immutable polygon layer with a spatial index over its rows.
///
/// Built once per layer; lookups are deterministic: when several polygons
/// contain the point, the row earliest in the layer's order wins (the order
/// returned by the upstream service).
pub struct LayerIndex {
    layer: PolygonLayer,
    tree: RTree<IndexedRow>,
}

impl LayerIndex {
    /// Build the index. Rows with empty geometry are kept in the layer but
    /// never match a lookup.
    pub fn build(layer: PolygonLayer) -> Self {
        let entries: Vec<IndexedRow> = layer
            .rows
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| {
                row.bbox().map(|(min_x, min_y, max_x, max_y)| IndexedRow {
                    idx,
                    envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
                })
            })
            .collect();

        let tree = RTree::bulk_load(entries);
        debug!(
            "Built spatial index for {:?} with {} entries",
            layer.level,
            tree.size()
        );

        Self { layer, tree }
    }

    /// Find the row whose polygon contains the point.
    ///
    /// Envelope candidates from the R-tree are filtered with exact
    /// containment; the earliest matching row wins.
    pub fn lookup(&self, point: Point<f64>) -> Option<&LayerRow> {
        let envelope = AABB::from_point([point.x(), point.y()]);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|entry| self.layer.rows[entry.idx].geometry.contains(&point))
            .map(|entry| entry.idx)
            .min()
            .map(|idx| &self.layer.rows[idx])
    }

    pub fn layer(&self) -> &PolygonLayer {
        &self.layer
    }

    pub fn len(&self) -> usize {
        self.layer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoLevel;
    use crate::pip::fixtures::{layer, row, square};

    #[test]
    fn lookup_finds_containing_polygon() {
        let index = LayerIndex::build(layer(
            GeoLevel::State,
            vec![
                row(1, "Oeste", None, square(-2.0, -2.0, 0.0, 2.0)),
                row(2, "Leste", None, square(0.0, -2.0, 2.0, 2.0)),
            ],
        ));

        let hit = index.lookup(Point::new(1.0, 1.0)).unwrap();
        assert_eq!(hit.name, "Leste");
        assert_eq!(index.lookup(Point::new(-1.0, 1.0)).unwrap().name, "Oeste");
    }

    #[test]
    fn lookup_outside_all_polygons_is_none() {
        let index = LayerIndex::build(layer(
            GeoLevel::State,
            vec![row(1, "Oeste", None, square(-2.0, -2.0, 0.0, 2.0))],
        ));
        assert!(index.lookup(Point::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn overlapping_polygons_resolve_to_earliest_row() {
        let rows = vec![
            row(1, "Primeiro", None, square(0.0, 0.0, 2.0, 2.0)),
            row(2, "Segundo", None, square(1.0, 1.0, 3.0, 3.0)),
        ];
        let index = LayerIndex::build(layer(GeoLevel::Municipality, rows));

        // Inside both squares
        let hit = index.lookup(Point::new(1.5, 1.5)).unwrap();
        assert_eq!(hit.name, "Primeiro");

        // Swapped row order flips the winner
        let swapped = LayerIndex::build(layer(
            GeoLevel::Municipality,
            vec![
                row(2, "Segundo", None, square(1.0, 1.0, 3.0, 3.0)),
                row(1, "Primeiro", None, square(0.0, 0.0, 2.0, 2.0)),
            ],
        ));
        assert_eq!(swapped.lookup(Point::new(1.5, 1.5)).unwrap().name, "Segundo");
    }

    #[test]
    fn repeated_lookups_are_deterministic() {
        let index = LayerIndex::build(layer(
            GeoLevel::Region,
            vec![
                row(1, "A", None, square(0.0, 0.0, 2.0, 2.0)),
                row(2, "B", None, square(1.0, 1.0, 3.0, 3.0)),
            ],
        ));

        let first = index.lookup(Point::new(1.5, 1.5)).map(|r| r.id);
        for _ in 0..10 {
            assert_eq!(index.lookup(Point::new(1.5, 1.5)).map(|r| r.id), first);
        }
    }

    #[test]
    fn empty_layer_never_matches() {
        let index = LayerIndex::build(layer(GeoLevel::Region, vec![]));
        assert!(index.is_empty());
        assert!(index.lookup(Point::new(0.0, 0.0)).is_none());
    }
}
