//! Studio page view model.
//!
//! One render probes the connection, lists the tables with their counts and,
//! when a table is selected, loads its grid. Every database failure has
//! already collapsed to an empty value by the time it gets here.

use serde::Serialize;

use common::models::{CellValue, GridColumn, GridData, RegistrySnapshot, TableSummary};
use common::utils::percent_encode;

use crate::service::StudioServiceTrait;
use crate::session::ConnectionSource;

/// Shown in place of the active name when none is set.
pub const NO_ACTIVE_NAME: &str = "None";

/// Connection badge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Probe not finished.
    Checking,
    Connected,
    Disconnected,
    /// No connection string to probe.
    NoActiveConnection,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Checking => "Checking...",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::NoActiveConnection => "No Active Connection",
        }
    }

    pub fn from_probe(alive: bool) -> Self {
        if alive {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub state: ConnectionStatus,
    pub label: &'static str,
}

impl From<ConnectionStatus> for StatusView {
    fn from(state: ConnectionStatus) -> Self {
        Self {
            state,
            label: state.label(),
        }
    }
}

/// Saved connection entry in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedConnectionView {
    pub name: String,
    /// Name encoded for use as a path segment.
    pub encoded: String,
    pub active: bool,
}

/// Table entry in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub name: String,
    /// Name encoded for the `table` query parameter.
    pub encoded: String,
    pub count: u64,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellView {
    pub text: String,
    pub null: bool,
}

impl From<&CellValue> for CellView {
    fn from(value: &CellValue) -> Self {
        Self {
            text: value.to_string(),
            null: value.is_null(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    pub id: String,
    pub cells: Vec<CellView>,
}

/// Everything the studio template needs.
#[derive(Debug, Clone, Serialize)]
pub struct StudioPage {
    pub status: StatusView,
    pub active_name: String,
    pub connections: Vec<SavedConnectionView>,
    pub tables: Vec<TableView>,
    pub search: String,
    pub current_table: Option<String>,
    pub columns: Vec<GridColumn>,
    pub rows: Vec<RowView>,
}

impl StudioPage {
    /// Page shell before any probe has run.
    pub fn new(snapshot: &RegistrySnapshot) -> Self {
        let active = snapshot.active.as_deref();
        Self {
            status: ConnectionStatus::Checking.into(),
            active_name: active.unwrap_or(NO_ACTIVE_NAME).to_string(),
            connections: snapshot
                .connections
                .iter()
                .map(|entry| SavedConnectionView {
                    name: entry.name.clone(),
                    encoded: percent_encode(&entry.name),
                    active: Some(entry.name.as_str()) == active,
                })
                .collect(),
            tables: Vec::new(),
            search: String::new(),
            current_table: None,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: ConnectionStatus) -> Self {
        self.status = status.into();
        self
    }

    /// Sidebar tables, filtered by `search`, with the current one marked.
    pub fn with_tables(mut self, tables: Vec<TableSummary>, search: Option<&str>) -> Self {
        let search = search.map(str::trim).unwrap_or_default();
        let current = self.current_table.as_deref();
        self.tables = filter_tables(tables, search)
            .into_iter()
            .map(|table| TableView {
                selected: Some(table.name.as_str()) == current,
                encoded: percent_encode(&table.name),
                name: table.name,
                count: table.count,
            })
            .collect();
        self.search = search.to_string();
        self
    }

    pub fn with_current_table(mut self, table: Option<&str>) -> Self {
        self.current_table = table.map(str::to_string);
        self
    }

    pub fn with_grid(mut self, grid: GridData) -> Self {
        let fields: Vec<String> = if grid.columns.is_empty() {
            grid.rows
                .first()
                .map(|row| row.record().columns().map(str::to_string).collect())
                .unwrap_or_default()
        } else {
            grid.columns.iter().map(|c| c.field.clone()).collect()
        };
        self.rows = grid
            .rows
            .iter()
            .map(|row| RowView {
                id: row.id().to_string(),
                cells: fields.iter().map(|f| CellView::from(row.cell(f))).collect(),
            })
            .collect();
        self.columns = if grid.columns.is_empty() {
            fields
                .into_iter()
                .map(|field| GridColumn {
                    header_name: field.clone(),
                    field,
                    data_type: String::new(),
                    length: None,
                    primary_key: false,
                    editable: true,
                })
                .collect()
        } else {
            grid.columns
        };
        self
    }
}

/// Case-insensitive substring match on table names. A blank search keeps
/// every table.
pub fn filter_tables(tables: Vec<TableSummary>, search: &str) -> Vec<TableSummary> {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return tables;
    }
    tables
        .into_iter()
        .filter(|table| table.name.to_lowercase().contains(&needle))
        .collect()
}

/// Runs the per-render sequence: probe, table list, then the selected
/// table's grid.
pub async fn load_page(
    service: &dyn StudioServiceTrait,
    snapshot: &RegistrySnapshot,
    source: ConnectionSource<'_>,
    table: Option<&str>,
    search: Option<&str>,
) -> StudioPage {
    let table = table.filter(|t| !t.trim().is_empty());
    let page = StudioPage::new(snapshot).with_current_table(table);

    if source.pick().is_none() {
        return page
            .with_status(ConnectionStatus::NoActiveConnection)
            .with_tables(Vec::new(), search);
    }

    let alive = service.is_connected(source).await;
    let page = page.with_status(ConnectionStatus::from_probe(alive));
    if !alive {
        return page.with_tables(Vec::new(), search);
    }

    let tables = service.list_tables_with_counts(source).await;
    let page = page.with_tables(tables, search);
    match table {
        Some(table) => page.with_grid(service.grid(source, Some(table)).await),
        None => page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use common::models::ConnectionString;

    use crate::service::StudioService;
    use crate::session::SessionResolver;
    use crate::testing::{shop_database, FakeConnector};

    fn service(connector: &FakeConnector) -> StudioService {
        StudioService::new(SessionResolver::new(Arc::new(connector.clone())))
    }

    fn snapshot(active: Option<&str>) -> RegistrySnapshot {
        RegistrySnapshot {
            connections: vec![
                ConnectionString::new("local", "mysql://root@localhost/shop"),
                ConnectionString::new("staging", "mysql://root@staging/shop"),
            ],
            active: active.map(str::to_string),
        }
    }

    fn summary(name: &str, count: u64) -> TableSummary {
        TableSummary {
            name: name.to_string(),
            count,
        }
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(ConnectionStatus::Checking.label(), "Checking...");
        assert_eq!(ConnectionStatus::from_probe(true).label(), "Connected");
        assert_eq!(ConnectionStatus::from_probe(false).label(), "Disconnected");
        assert_eq!(
            ConnectionStatus::NoActiveConnection.label(),
            "No Active Connection"
        );
    }

    #[test]
    fn test_new_page_is_checking_and_marks_active() {
        let page = StudioPage::new(&snapshot(Some("staging")));
        assert_eq!(page.status.state, ConnectionStatus::Checking);
        assert_eq!(page.active_name, "staging");
        assert!(!page.connections[0].active);
        assert!(page.connections[1].active);
    }

    #[test]
    fn test_absent_active_name_reads_none() {
        assert_eq!(StudioPage::new(&snapshot(None)).active_name, "None");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let tables = vec![summary("Customers", 1), summary("orders", 2), summary("order_items", 3)];
        let names: Vec<_> = filter_tables(tables.clone(), "ORDER")
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["orders", "order_items"]);
        assert_eq!(filter_tables(tables, "  ").len(), 3);
    }

    #[test]
    fn test_current_table_is_highlighted() {
        let page = StudioPage::new(&snapshot(None))
            .with_current_table(Some("orders"))
            .with_tables(vec![summary("customers", 1), summary("orders", 2)], None);
        assert!(!page.tables[0].selected);
        assert!(page.tables[1].selected);
    }

    #[tokio::test]
    async fn test_no_source_skips_database() {
        let connector = FakeConnector::new(shop_database());
        let page = load_page(
            &service(&connector),
            &snapshot(None),
            ConnectionSource::default(),
            Some("customers"),
            None,
        )
        .await;
        assert_eq!(page.status.label, "No Active Connection");
        assert!(page.tables.is_empty());
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_host_renders_disconnected() {
        let connector = FakeConnector::unreachable();
        let page = load_page(
            &service(&connector),
            &snapshot(Some("local")),
            ConnectionSource::explicit(Some("mysql://root@nowhere/shop")),
            None,
            None,
        )
        .await;
        assert_eq!(page.status.state, ConnectionStatus::Disconnected);
        assert!(page.tables.is_empty());
    }

    #[tokio::test]
    async fn test_selected_table_loads_grid() {
        let connector = FakeConnector::new(shop_database());
        let page = load_page(
            &service(&connector),
            &snapshot(Some("local")),
            ConnectionSource::explicit(Some("mysql://root@localhost/shop")),
            Some("customers"),
            Some("cust"),
        )
        .await;
        assert_eq!(page.status.state, ConnectionStatus::Connected);
        assert_eq!(page.tables.len(), 1);
        assert!(page.tables[0].selected);
        assert_eq!(page.columns.len(), 2);
        assert_eq!(page.rows[1].id, "2");
        assert_eq!(page.rows[1].cells[1].text, "Linus");
        assert_eq!(connector.opened(), connector.closed());
    }

    #[test]
    fn test_rows_without_metadata_use_record_columns() {
        let grid = GridData::new(
            &[],
            vec![common::models::RowRecord::new().with("name", "x")],
        );
        let page = StudioPage::new(&snapshot(None)).with_grid(grid);
        let fields: Vec<_> = page.columns.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "id"]);
        assert_eq!(page.rows[0].cells[1].text, "0");
    }
}
