//! Grid view models.
//!
//! The grid needs an `id` on every row. Rows that lack one get the index of
//! the row within the fetched sequence (0-based). The index is stable for a
//! given fetch only; a refetch with a different row order renumbers rows.

use serde::Serialize;
use utoipa::ToSchema;

use super::row::{CellValue, RowRecord};
use super::schema::ColumnInfo;

/// Name of the row identity field required by the grid.
pub const GRID_ID_FIELD: &str = "id";

/// Column definition for the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct GridColumn {
    /// Row field bound to this column.
    pub field: String,
    /// Header label.
    pub header_name: String,
    /// Base type from the column metadata.
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
    pub editable: bool,
}

impl From<&ColumnInfo> for GridColumn {
    fn from(column: &ColumnInfo) -> Self {
        Self {
            field: column.name.clone(),
            header_name: column.name.clone(),
            data_type: column.data_type.clone(),
            length: column.length,
            primary_key: column.key == "PRI",
            editable: true,
        }
    }
}

/// A row ready for the grid; always carries an `id` field.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct GridRow(RowRecord);

impl GridRow {
    /// Wraps a fetched row, synthesizing `id = index` when the row has no
    /// `id` field.
    pub fn from_fetched(index: usize, mut row: RowRecord) -> Self {
        if !row.contains(GRID_ID_FIELD) {
            let id = i64::try_from(index).unwrap_or(i64::MAX);
            row.push(GRID_ID_FIELD, CellValue::Int(id));
        }
        Self(row)
    }

    /// Converts a whole fetch, numbering rows by their position in it.
    pub fn from_rows(rows: Vec<RowRecord>) -> Vec<Self> {
        rows.into_iter()
            .enumerate()
            .map(|(index, row)| Self::from_fetched(index, row))
            .collect()
    }

    pub fn id(&self) -> &CellValue {
        self.0.get(GRID_ID_FIELD).unwrap_or(&CellValue::Null)
    }

    /// Cell for a grid column; absent cells read as NULL.
    pub fn cell(&self, field: &str) -> &CellValue {
        self.0.get(field).unwrap_or(&CellValue::Null)
    }

    pub fn record(&self) -> &RowRecord {
        &self.0
    }
}

/// Columns and rows bound together for one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct GridData {
    pub columns: Vec<GridColumn>,
    pub rows: Vec<GridRow>,
}

impl GridData {
    pub fn new(columns: &[ColumnInfo], rows: Vec<RowRecord>) -> Self {
        Self {
            columns: columns.iter().map(GridColumn::from).collect(),
            rows: GridRow::from_rows(rows),
        }
    }
}
