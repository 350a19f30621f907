//! Shared data models.

pub mod connection;
pub mod grid;
pub mod row;
pub mod schema;

// Re-export commonly used types
pub use connection::{
    ConnectionRequest, ConnectionString, RegistrySnapshot, SaveConnectionAck,
    SaveConnectionRequest, SetActiveRequest, TableRequest,
};
pub use grid::{GridColumn, GridData, GridRow};
pub use row::{CellValue, RowRecord};
pub use schema::{ColumnInfo, RawColumn, TableSummary};
