//! Schema metadata models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::type_descriptor::TypeDescriptor;

/// A table and its row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TableSummary {
    /// Table name.
    pub name: String,
    /// Number of rows at fetch time.
    pub count: u64,
}

/// One row of `SHOW COLUMNS FROM <table>`, as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawColumn {
    pub field: String,
    pub column_type: String,
    pub null: String,
    pub key: String,
    pub default: Option<String>,
    pub extra: String,
}

/// Column metadata with the native type descriptor split into base type
/// and length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Base type, e.g. `varchar`.
    #[serde(rename = "type")]
    pub data_type: String,
    /// Length from the descriptor, e.g. `255` for `varchar(255)`.
    pub length: Option<u32>,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Index participation (`PRI`, `UNI`, `MUL` or empty).
    pub key: String,
    /// Default value as reported by the server.
    #[serde(rename = "default")]
    pub default_value: Option<String>,
    /// Extra attributes, e.g. `auto_increment`.
    pub extra: String,
}

impl From<RawColumn> for ColumnInfo {
    fn from(raw: RawColumn) -> Self {
        let TypeDescriptor { base, length } = TypeDescriptor::parse(&raw.column_type);
        Self {
            name: raw.field,
            data_type: base,
            length,
            nullable: raw.null == "YES",
            key: raw.key,
            default_value: raw.default,
            extra: raw.extra,
        }
    }
}
