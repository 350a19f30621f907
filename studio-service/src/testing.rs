//! In-memory sessions for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use common::errors::{AppError, AppResult};
use common::models::{RawColumn, RowRecord};
use common::utils::database_name_from_uri;

use crate::session::{DatabaseSession, SessionConnector};

/// One table of a fake database.
#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub name: String,
    /// `None` makes `COUNT(*)` fail for this table.
    pub count: Option<u64>,
    pub columns: Vec<RawColumn>,
    pub rows: Vec<RowRecord>,
}

impl FakeTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            count: Some(0),
            ..Default::default()
        }
    }

    pub fn count(mut self, count: Option<u64>) -> Self {
        self.count = count;
        self
    }

    pub fn column(mut self, field: &str, column_type: &str, null: &str, key: &str) -> Self {
        self.columns.push(RawColumn {
            field: field.to_string(),
            column_type: column_type.to_string(),
            null: null.to_string(),
            key: key.to_string(),
            ..Default::default()
        });
        self
    }

    pub fn row(mut self, row: RowRecord) -> Self {
        self.rows.push(row);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeDatabase {
    pub tables: Vec<FakeTable>,
    pub ping_fails: bool,
    pub show_tables_fails: bool,
}

impl FakeDatabase {
    pub fn with_tables(tables: Vec<FakeTable>) -> Self {
        Self {
            tables,
            ..Default::default()
        }
    }

    fn table(&self, name: &str) -> AppResult<&FakeTable> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| AppError::DatabaseQuery(format!("Table '{name}' doesn't exist")))
    }
}

/// Connector counting opened and closed sessions.
#[derive(Clone)]
pub struct FakeConnector {
    database: Arc<FakeDatabase>,
    reachable: bool,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub fn new(database: FakeDatabase) -> Self {
        Self {
            database: Arc::new(database),
            reachable: true,
            opened: Arc::default(),
            closed: Arc::default(),
        }
    }

    /// Every open fails like an unreachable host.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new(FakeDatabase::default())
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionConnector for FakeConnector {
    async fn open(&self, connection_string: &str) -> AppResult<Box<dyn DatabaseSession>> {
        if !self.reachable {
            return Err(AppError::DatabaseConnection("host unreachable".into()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            database: Arc::clone(&self.database),
            name: database_name_from_uri(connection_string).unwrap_or_else(|| "mysql".into()),
            closed: Arc::clone(&self.closed),
            is_closed: false,
        }))
    }
}

pub struct FakeSession {
    database: Arc<FakeDatabase>,
    name: String,
    closed: Arc<AtomicUsize>,
    is_closed: bool,
}

impl FakeSession {
    fn ensure_open(&self) -> AppResult<()> {
        if self.is_closed {
            return Err(AppError::Internal("session already closed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DatabaseSession for FakeSession {
    fn database_name(&self) -> &str {
        &self.name
    }

    async fn ping(&mut self) -> AppResult<()> {
        self.ensure_open()?;
        if self.database.ping_fails {
            return Err(AppError::DatabaseQuery("server has gone away".into()));
        }
        Ok(())
    }

    async fn show_tables(&mut self) -> AppResult<Vec<String>> {
        self.ensure_open()?;
        if self.database.show_tables_fails {
            return Err(AppError::DatabaseQuery("access denied".into()));
        }
        Ok(self.database.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn count_rows(&mut self, table: &str) -> AppResult<u64> {
        self.ensure_open()?;
        self.database
            .table(table)?
            .count
            .ok_or_else(|| AppError::DatabaseQuery(format!("cannot count '{table}'")))
    }

    async fn show_columns(&mut self, table: &str) -> AppResult<Vec<RawColumn>> {
        self.ensure_open()?;
        Ok(self.database.table(table)?.columns.clone())
    }

    async fn select_all(&mut self, table: &str) -> AppResult<Vec<RowRecord>> {
        self.ensure_open()?;
        Ok(self.database.table(table)?.rows.clone())
    }

    async fn close(&mut self) -> AppResult<()> {
        if !self.is_closed {
            self.is_closed = true;
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Sample database used across router tests.
pub fn shop_database() -> FakeDatabase {
    FakeDatabase::with_tables(vec![
        FakeTable::new("customers")
            .count(Some(2))
            .column("id", "int(11)", "NO", "PRI")
            .column("name", "varchar(255)", "YES", "")
            .row(RowRecord::new().with("id", 1i64).with("name", "Ada"))
            .row(RowRecord::new().with("id", 2i64).with("name", "Linus")),
        FakeTable::new("order_items")
            .count(Some(1))
            .column("sku", "varchar(32)", "NO", "")
            .column("qty", "int(10) unsigned", "NO", "")
            .row(RowRecord::new().with("sku", "A-1").with("qty", 3i64)),
    ])
}
