//! Docs search: `GET /api/search?query=…`.

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;

use crate::docs::{DEFAULT_SEARCH_LIMIT, SearchResult};
use crate::state::AppState;

const MAX_SEARCH_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    pub limit: Option<usize>,
}

pub async fn search(State(state): State<AppState>, Query(params): Query<SearchQuery>) -> Json<Vec<SearchResult>> {
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(MAX_SEARCH_LIMIT);
    Json(state.docs.search(&params.query, limit))
}
