//! 表结构查询
//!
//! Table enumeration, row counts and column metadata over an open session.
//! Failures never propagate: they are logged and the caller gets an empty or
//! partial list.

use common::models::{ColumnInfo, TableSummary};
use common::utils::is_usable_table_name;

use crate::session::DatabaseSession;

/// Table names in server order.
pub async fn list_table_names(session: &mut dyn DatabaseSession) -> Vec<String> {
    match session.show_tables().await {
        Ok(names) => names,
        Err(e) => {
            tracing::warn!(database = %session.database_name(), error = %e, "SHOW TABLES failed");
            Vec::new()
        }
    }
}

/// Tables with their row counts.
///
/// Counts run one table at a time in enumeration order. The first failure
/// stops the walk and the tables counted so far are returned.
pub async fn list_tables_with_counts(session: &mut dyn DatabaseSession) -> Vec<TableSummary> {
    let names = list_table_names(session).await;
    let mut summaries = Vec::with_capacity(names.len());
    for name in names {
        match session.count_rows(&name).await {
            Ok(count) => summaries.push(TableSummary { name, count }),
            Err(e) => {
                tracing::warn!(
                    table = %name,
                    counted = summaries.len(),
                    error = %e,
                    "row count failed, returning partial table list"
                );
                break;
            }
        }
    }
    summaries
}

/// Column metadata for one table; empty when the name is unusable or the
/// query fails.
pub async fn list_columns(session: &mut dyn DatabaseSession, table: &str) -> Vec<ColumnInfo> {
    if !is_usable_table_name(table) {
        return Vec::new();
    }
    match session.show_columns(table).await {
        Ok(columns) => columns.into_iter().map(ColumnInfo::from).collect(),
        Err(e) => {
            tracing::warn!(table = %table, error = %e, "SHOW COLUMNS failed");
            Vec::new()
        }
    }
}
