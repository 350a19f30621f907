//! JSON API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use common::errors::AppError;
use common::middleware::RequestId;
use common::models::{
    ColumnInfo, ConnectionRequest, ConnectionString, GridData, RegistrySnapshot, RowRecord,
    SaveConnectionAck, SaveConnectionRequest, SetActiveRequest, TableRequest, TableSummary,
};
use common::response::ApiResponse;

use crate::service::StudioServiceTrait;
use crate::session::ConnectionSource;
use crate::state::AppState;

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

fn respond<T: Serialize>(state: &AppState, request_id: RequestId, data: T) -> ApiResult<T> {
    Ok(Json(
        ApiResponse::ok_with_service(data, state.config.service_name.clone())
            .with_request_id(request_id.0),
    ))
}

/// 检查连接是否可用
#[utoipa::path(
    post,
    path = "/api/studio/is-connected",
    tag = "studio",
    request_body = ConnectionRequest,
    responses(
        (status = 200, description = "连接是否可用", body = ApiResponse<bool>)
    )
)]
pub async fn is_connected(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(req): Json<ConnectionRequest>,
) -> ApiResult<bool> {
    let source = ConnectionSource::explicit(req.connection_string.as_deref());
    let alive = state.service().is_connected(source).await;
    respond(&state, request_id, alive)
}

/// 列出所有表名
#[utoipa::path(
    post,
    path = "/api/studio/tables",
    tag = "studio",
    request_body = ConnectionRequest,
    responses(
        (status = 200, description = "表名列表", body = ApiResponse<Vec<String>>)
    )
)]
pub async fn list_tables(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(req): Json<ConnectionRequest>,
) -> ApiResult<Vec<String>> {
    let source = ConnectionSource::explicit(req.connection_string.as_deref());
    let tables = state.service().list_tables(source).await;
    respond(&state, request_id, tables)
}

/// 列出所有表及行数
#[utoipa::path(
    post,
    path = "/api/studio/tables/counts",
    tag = "studio",
    request_body = ConnectionRequest,
    responses(
        (status = 200, description = "表及行数，统计失败时只返回已完成部分", body = ApiResponse<Vec<TableSummary>>)
    )
)]
pub async fn list_tables_with_counts(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(req): Json<ConnectionRequest>,
) -> ApiResult<Vec<TableSummary>> {
    let source = ConnectionSource::explicit(req.connection_string.as_deref());
    let tables = state.service().list_tables_with_counts(source).await;
    respond(&state, request_id, tables)
}

/// 查询表的列信息
#[utoipa::path(
    post,
    path = "/api/studio/columns",
    tag = "studio",
    request_body = TableRequest,
    responses(
        (status = 200, description = "列信息", body = ApiResponse<Vec<ColumnInfo>>)
    )
)]
pub async fn list_columns(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(req): Json<TableRequest>,
) -> ApiResult<Vec<ColumnInfo>> {
    let source = ConnectionSource::explicit(req.connection_string.as_deref());
    let columns = state
        .service()
        .list_columns(source, req.table_name.as_deref())
        .await;
    respond(&state, request_id, columns)
}

/// 查询表的全部数据行
#[utoipa::path(
    post,
    path = "/api/studio/rows",
    tag = "studio",
    request_body = TableRequest,
    responses(
        (status = 200, description = "数据行", body = ApiResponse<Vec<RowRecord>>)
    )
)]
pub async fn list_rows(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(req): Json<TableRequest>,
) -> ApiResult<Vec<RowRecord>> {
    let source = ConnectionSource::explicit(req.connection_string.as_deref());
    let rows = state
        .service()
        .list_rows(source, req.table_name.as_deref())
        .await;
    respond(&state, request_id, rows)
}

/// 读取表格视图（列定义与带 id 的数据行）
#[utoipa::path(
    post,
    path = "/api/studio/grid",
    tag = "studio",
    request_body = TableRequest,
    responses(
        (status = 200, description = "表格数据", body = ApiResponse<GridData>)
    )
)]
pub async fn grid(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(req): Json<TableRequest>,
) -> ApiResult<GridData> {
    let source = ConnectionSource::explicit(req.connection_string.as_deref());
    let grid = state.service().grid(source, req.table_name.as_deref()).await;
    respond(&state, request_id, grid)
}

/// 确认连接已保存
#[utoipa::path(
    post,
    path = "/api/connections/save",
    tag = "connections",
    request_body = SaveConnectionRequest,
    responses(
        (status = 200, description = "保存确认", body = ApiResponse<SaveConnectionAck>),
        (status = 400, description = "名称不合法")
    )
)]
pub async fn save_connection(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(req): Json<SaveConnectionRequest>,
) -> ApiResult<SaveConnectionAck> {
    req.validate()?;
    let ack = state.service().save_connection(&req.name)?;
    respond(&state, request_id, ack)
}

/// 获取已保存的连接和当前活动连接
#[utoipa::path(
    get,
    path = "/api/registry",
    tag = "connections",
    responses(
        (status = 200, description = "连接注册表", body = ApiResponse<RegistrySnapshot>)
    )
)]
pub async fn get_registry(
    State(state): State<AppState>,
    request_id: RequestId,
) -> ApiResult<RegistrySnapshot> {
    let snapshot = state.registry.read().await.snapshot();
    respond(&state, request_id, snapshot)
}

/// 保存连接并设为活动连接
#[utoipa::path(
    put,
    path = "/api/registry",
    tag = "connections",
    request_body = ConnectionString,
    responses(
        (status = 200, description = "更新后的注册表", body = ApiResponse<RegistrySnapshot>),
        (status = 400, description = "参数不合法")
    )
)]
pub async fn upsert_connection(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(entry): Json<ConnectionString>,
) -> ApiResult<RegistrySnapshot> {
    entry.validate()?;
    let name = entry.name.clone();
    let snapshot = {
        let mut registry = state.registry.write().await;
        registry.upsert(entry);
        registry.set_active(&name);
        registry.snapshot()
    };
    state.service().save_connection(&name)?;
    respond(&state, request_id, snapshot)
}

/// 删除已保存的连接
#[utoipa::path(
    delete,
    path = "/api/registry/{name}",
    tag = "connections",
    params(
        ("name" = String, Path, description = "连接名称")
    ),
    responses(
        (status = 200, description = "更新后的注册表", body = ApiResponse<RegistrySnapshot>),
        (status = 404, description = "连接未找到")
    )
)]
pub async fn delete_connection(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(name): Path<String>,
) -> ApiResult<RegistrySnapshot> {
    let snapshot = {
        let mut registry = state.registry.write().await;
        if !registry.remove(&name) {
            return Err(AppError::NotFound(format!("connection '{name}'")));
        }
        registry.snapshot()
    };
    tracing::info!(name = %name, "连接已删除");
    respond(&state, request_id, snapshot)
}

/// 切换活动连接
#[utoipa::path(
    put,
    path = "/api/registry/active",
    tag = "connections",
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "更新后的注册表", body = ApiResponse<RegistrySnapshot>),
        (status = 404, description = "连接未找到")
    )
)]
pub async fn set_active_connection(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(req): Json<SetActiveRequest>,
) -> ApiResult<RegistrySnapshot> {
    req.validate()?;
    let snapshot = {
        let mut registry = state.registry.write().await;
        if registry.get(&req.name).is_none() {
            return Err(AppError::NotFound(format!("connection '{}'", req.name)));
        }
        registry.set_active(&req.name);
        registry.snapshot()
    };
    tracing::info!(name = %req.name, "活动连接已切换");
    respond(&state, request_id, snapshot)
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        saved_connections: state.registry.read().await.list().len(),
    })
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
    /// 已保存的连接数
    pub saved_connections: usize,
}
