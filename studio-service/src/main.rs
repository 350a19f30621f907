//! MySQL 数据库浏览工作台服务
//!
//! 提供以下功能：
//! - 已保存连接的管理（注册表持久化到本地文件）
//! - 连接状态检测、表列表与行数统计
//! - 列信息与数据行浏览
//! - 服务端渲染的工作台页面

mod fetcher;
mod handlers;
mod inspector;
mod pages;
mod presentation;
mod routes;
mod service;
mod session;
mod state;
mod templates;

#[cfg(test)]
mod testing;

use anyhow::Context;
use common::config::{load_dotenv, AppConfig, LogFormat};
use state::AppState;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "studio-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "工作台服务 API",
        version = "0.1.0",
        description = "MySQL 数据库浏览工作台"
    ),
    paths(
        handlers::is_connected,
        handlers::list_tables,
        handlers::list_tables_with_counts,
        handlers::list_columns,
        handlers::list_rows,
        handlers::grid,
        handlers::save_connection,
        handlers::get_registry,
        handlers::upsert_connection,
        handlers::delete_connection,
        handlers::set_active_connection,
        handlers::health_check,
    ),
    components(schemas(
        common::models::ConnectionString,
        common::models::RegistrySnapshot,
        common::models::ConnectionRequest,
        common::models::TableRequest,
        common::models::SaveConnectionRequest,
        common::models::SaveConnectionAck,
        common::models::SetActiveRequest,
        common::models::TableSummary,
        common::models::ColumnInfo,
        common::models::RowRecord,
        common::models::GridColumn,
        common::models::GridRow,
        common::models::GridData,
        handlers::HealthResponse,
    )),
    tags(
        (name = "studio", description = "表结构与数据浏览端点"),
        (name = "connections", description = "连接管理端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (if present) before anything else
    load_dotenv();

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME);

    // 初始化日志追踪
    init_tracing(config.log_format);

    // 创建应用状态
    let state = AppState::new(config.clone());
    info!(
        registry = %config.registry_path.display(),
        connect_timeout_secs = config.connect_timeout_secs,
        "连接注册表已加载"
    );

    // 创建路由
    let app = routes::create_router(state);

    // 启动服务
    let addr = config.bind_address();
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {addr}"))?;
    axum::serve(listener, app).await.context("服务启动失败")?;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
