use anyhow::{Context as _, Result};
use axum::{extract::State, response::Html};
use data_model::FileRegistry;
use serde::Serialize;
use tera::{Context, Tera};

use super::{RouteState, FILE_SERVER_API_PATH};
use crate::http_objects::ApiError;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

#[derive(Serialize)]
struct IndexRow<'a> {
    name: &'a str,
    os: &'a str,
    mime: &'a str,
    size: String,
}

pub async fn index(State(state): State<RouteState>) -> Result<Html<String>, ApiError> {
    render_index(&state.registry)
        .map(Html)
        .map_err(ApiError::internal_error)
}

/// Renders the download listing. Values are HTML-escaped and links are
/// percent-encoded by the template.
pub fn render_index(registry: &FileRegistry) -> Result<String> {
    let rows: Vec<IndexRow> = registry
        .iter_sorted()
        .into_iter()
        .map(|file| IndexRow {
            name: &file.name,
            os: &file.os,
            mime: &file.mime,
            size: human_size(file.size),
        })
        .collect();

    let mut context = Context::new();
    context.insert("prefix", FILE_SERVER_API_PATH);
    context.insert("files", &rows);
    Tera::one_off(INDEX_TEMPLATE, &context, true).context("error rendering index page")
}

fn human_size(size: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if size < 1024 {
        return format!("{} B", size);
    }
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
