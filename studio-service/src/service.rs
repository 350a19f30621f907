//! 工作台服务模块
//!
//! Each operation resolves its own session, runs its statements and closes
//! the session before returning, whatever the outcome.

use async_trait::async_trait;
use chrono::Utc;

use common::errors::AppResult;
use common::models::{
    ColumnInfo, GridData, RowRecord, SaveConnectionAck, TableSummary,
};
use common::utils::is_usable_table_name;

use crate::fetcher;
use crate::inspector;
use crate::session::{release, ConnectionSource, SessionResolver};

/// 工作台服务 Trait
#[async_trait]
pub trait StudioServiceTrait: Send + Sync {
    /// 检查连接是否可用
    async fn is_connected(&self, source: ConnectionSource<'_>) -> bool;

    /// 列出所有表名
    async fn list_tables(&self, source: ConnectionSource<'_>) -> Vec<String>;

    /// 列出所有表及行数
    async fn list_tables_with_counts(&self, source: ConnectionSource<'_>) -> Vec<TableSummary>;

    /// 查询表的列信息
    async fn list_columns(&self, source: ConnectionSource<'_>, table: Option<&str>) -> Vec<ColumnInfo>;

    /// 查询表的全部数据行
    async fn list_rows(&self, source: ConnectionSource<'_>, table: Option<&str>) -> Vec<RowRecord>;

    /// 在同一会话中读取列信息和数据行
    async fn grid(&self, source: ConnectionSource<'_>, table: Option<&str>) -> GridData;

    /// 确认连接已保存
    fn save_connection(&self, name: &str) -> AppResult<SaveConnectionAck>;
}

/// 数据库浏览服务
pub struct StudioService {
    resolver: SessionResolver,
}

impl StudioService {
    /// 创建新的服务实例
    pub fn new(resolver: SessionResolver) -> Self {
        Self { resolver }
    }
}

fn usable_table(table: Option<&str>) -> Option<&str> {
    table.filter(|t| is_usable_table_name(t))
}

#[async_trait]
impl StudioServiceTrait for StudioService {
    async fn is_connected(&self, source: ConnectionSource<'_>) -> bool {
        let Some(mut session) = self.resolver.resolve(source).await else {
            return false;
        };
        let alive = match session.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(database = %session.database_name(), error = %e, "ping failed");
                false
            }
        };
        release(session).await;
        alive
    }

    async fn list_tables(&self, source: ConnectionSource<'_>) -> Vec<String> {
        let Some(mut session) = self.resolver.resolve(source).await else {
            return Vec::new();
        };
        let names = inspector::list_table_names(session.as_mut()).await;
        release(session).await;
        names
    }

    async fn list_tables_with_counts(&self, source: ConnectionSource<'_>) -> Vec<TableSummary> {
        let Some(mut session) = self.resolver.resolve(source).await else {
            return Vec::new();
        };
        let tables = inspector::list_tables_with_counts(session.as_mut()).await;
        release(session).await;
        tables
    }

    async fn list_columns(&self, source: ConnectionSource<'_>, table: Option<&str>) -> Vec<ColumnInfo> {
        let Some(table) = usable_table(table) else {
            return Vec::new();
        };
        let Some(mut session) = self.resolver.resolve(source).await else {
            return Vec::new();
        };
        let columns = inspector::list_columns(session.as_mut(), table).await;
        release(session).await;
        columns
    }

    async fn list_rows(&self, source: ConnectionSource<'_>, table: Option<&str>) -> Vec<RowRecord> {
        let Some(table) = usable_table(table) else {
            return Vec::new();
        };
        let Some(mut session) = self.resolver.resolve(source).await else {
            return Vec::new();
        };
        let rows = fetcher::list_rows(session.as_mut(), table).await;
        release(session).await;
        rows
    }

    async fn grid(&self, source: ConnectionSource<'_>, table: Option<&str>) -> GridData {
        let Some(table) = usable_table(table) else {
            return GridData::default();
        };
        let Some(mut session) = self.resolver.resolve(source).await else {
            return GridData::default();
        };
        let columns = inspector::list_columns(session.as_mut(), table).await;
        let rows = fetcher::list_rows(session.as_mut(), table).await;
        release(session).await;
        GridData::new(&columns, rows)
    }

    fn save_connection(&self, name: &str) -> AppResult<SaveConnectionAck> {
        tracing::info!(name = %name, "连接已保存");
        Ok(SaveConnectionAck {
            name: name.to_string(),
            saved_at: Utc::now(),
        })
    }
}
