//! 数据行读取

use common::models::RowRecord;
use common::utils::is_usable_table_name;

use crate::session::DatabaseSession;

/// Every row of a table via `SELECT *`, in whatever order the server
/// returns them. Empty when the name is unusable or the query fails.
pub async fn list_rows(session: &mut dyn DatabaseSession, table: &str) -> Vec<RowRecord> {
    if !is_usable_table_name(table) {
        return Vec::new();
    }
    match session.select_all(table).await {
        Ok(rows) => {
            tracing::debug!(table = %table, rows = rows.len(), "rows fetched");
            rows
        }
        Err(e) => {
            tracing::warn!(table = %table, error = %e, "SELECT * failed");
            Vec::new()
        }
    }
}
