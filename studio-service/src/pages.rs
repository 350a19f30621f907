//! Server-rendered studio page and its form endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{header::COOKIE, HeaderMap},
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;
use validator::Validate;

use common::errors::AppError;
use common::models::ConnectionString;
use common::utils::percent_decode;

use crate::presentation::load_page;
use crate::service::StudioServiceTrait;
use crate::session::ConnectionSource;
use crate::state::AppState;
use crate::templates::{render_page, STUDIO_TEMPLATE};

/// Cookie read as a fallback connection string when no saved connection is
/// active.
pub const LEGACY_CONNECTION_COOKIE: &str = "connection_string";

pub const STUDIO_PATH: &str = "/studio";

#[derive(Debug, Default, Deserialize)]
pub struct StudioQuery {
    pub table: Option<String>,
    pub search: Option<String>,
}

/// Reads a cookie from every `Cookie` header; the value is percent-decoded.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| percent_decode(value.trim_matches('"')))
}

pub async fn index() -> Redirect {
    Redirect::to(STUDIO_PATH)
}

pub async fn studio_page(
    State(state): State<AppState>,
    Query(query): Query<StudioQuery>,
    headers: HeaderMap,
) -> Result<Html<String>, AppError> {
    // The active entry is taken from the snapshot the page renders.
    let snapshot = state.registry.read().await.snapshot();
    let active_uri = snapshot
        .active_entry()
        .map(|entry| entry.connection_string.as_str());
    let cookie = cookie_value(&headers, LEGACY_CONNECTION_COOKIE);
    let source = ConnectionSource::explicit(active_uri).with_fallback(cookie.as_deref());

    let service = state.service();
    let page = load_page(
        &service,
        &snapshot,
        source,
        query.table.as_deref(),
        query.search.as_deref(),
    )
    .await;
    Ok(Html(render_page(STUDIO_TEMPLATE, &page)?))
}

/// Saves a connection from the add-connection form and makes it active.
pub async fn add_connection(
    State(state): State<AppState>,
    Form(entry): Form<ConnectionString>,
) -> Result<Redirect, AppError> {
    entry.validate()?;
    let name = entry.name.clone();
    {
        let mut registry = state.registry.write().await;
        registry.upsert(entry);
        registry.set_active(&name);
    }
    state.service().save_connection(&name)?;
    Ok(Redirect::to(STUDIO_PATH))
}

pub async fn select_connection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Redirect {
    let mut registry = state.registry.write().await;
    if registry.get(&name).is_some() {
        registry.set_active(&name);
        tracing::info!(name = %name, "活动连接已切换");
    } else {
        tracing::warn!(name = %name, "ignoring selection of unknown connection");
    }
    Redirect::to(STUDIO_PATH)
}

pub async fn delete_connection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Redirect {
    if state.registry.write().await.remove(&name) {
        tracing::info!(name = %name, "连接已删除");
    }
    Redirect::to(STUDIO_PATH)
}
