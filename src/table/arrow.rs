//! Arrow materialization of a [`FilterTable`].

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow_array::{BinaryArray, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use geozero::{CoordDimensions, ToWkb};

use super::FilterTable;

impl FilterTable {
    /// Materialize the table as an Arrow record batch: geometry as WKB,
    /// fixed metadata columns, the catch-all tags as a JSON column, and
    /// one nullable string column per projected tag (sorted by name).
    /// Schema metadata carries the geometry encoding and the CRS.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields = vec![
            Field::new("geometry", DataType::Binary, false),
            Field::new("id", DataType::Int64, false),
            Field::new("osm_type", DataType::Utf8, false),
            Field::new("version", DataType::Int64, true),
            Field::new("timestamp", DataType::Utf8, true),
            Field::new("changeset", DataType::Int64, true),
            Field::new("tags", DataType::Utf8, false),
        ];

        let mut tag_order: Vec<usize> = (0..self.tag_columns.len()).collect();
        tag_order.sort_by(|&a, &b| self.tag_columns[a].cmp(&self.tag_columns[b]));
        for &i in &tag_order {
            fields.push(Field::new(&self.tag_columns[i], DataType::Utf8, true));
        }

        let geo_metadata = serde_json::json!({
            "version": "1.0.0",
            "primary_column": "geometry",
            "columns": {
                "geometry": {
                    "encoding": "WKB",
                    "geometry_types": ["Point", "LineString", "Polygon", "GeometryCollection"],
                    "crs": self.crs,
                }
            }
        })
        .to_string();
        let metadata = HashMap::from([("geo".to_string(), geo_metadata)]);
        let schema = Arc::new(Schema::new_with_metadata(fields, metadata));

        let mut geometry_buf: Vec<Vec<u8>> = Vec::with_capacity(self.rows.len());
        let mut tags_buf: Vec<String> = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let wkb = row
                .geometry
                .to_wkb(CoordDimensions::xy())
                .with_context(|| format!("Table: Failed to encode WKB for {} {}", row.osm_type.label(), row.id))?;
            geometry_buf.push(wkb);
            tags_buf.push(
                serde_json::to_string(&row.tags)
                    .with_context(|| format!("Table: Failed to serialize tags for {}", row.id))?,
            );
        }

        let mut arrays: Vec<Arc<dyn arrow_array::Array>> = vec![
            Arc::new(BinaryArray::from_iter_values(geometry_buf.iter())),
            Arc::new(Int64Array::from_iter_values(self.rows.iter().map(|r| r.id))),
            Arc::new(StringArray::from_iter_values(
                self.rows.iter().map(|r| r.osm_type.label()),
            )),
            Arc::new(Int64Array::from(
                self.rows.iter().map(|r| r.version).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                self.rows
                    .iter()
                    .map(|r| r.timestamp.clone())
                    .collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                self.rows.iter().map(|r| r.changeset).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from_iter_values(tags_buf.iter())),
        ];
        for &i in &tag_order {
            arrays.push(Arc::new(StringArray::from(
                self.rows
                    .iter()
                    .map(|r| r.tag_values[i].clone())
                    .collect::<Vec<_>>(),
            )));
        }

        RecordBatch::try_new(schema, arrays).context("Table: Failed to build record batch")
    }
}
