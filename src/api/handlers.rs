use axum::{
    extract::{Query, State},
    response::Html,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::RequestId;
use crate::models::{Record, SampleFilters, TableKind};
use crate::services::{distinct_categories, distinct_tags};

use super::AppState;

const INDEX_PAGE: &str = include_str!("../../static/index.html");

// Request/Response types

/// Raw query pairs in request order.
///
/// Read as pairs rather than a struct so a repeated or aliased parameter
/// never fails extraction; [`QueryParams::first`] picks the first value.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(pub Vec<(String, String)>);

impl QueryParams {
    /// First value supplied under any of `names`
    pub fn first(&self, names: &[&str]) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| names.contains(&key.as_str()))
            .map(|(_, value)| value.as_str())
    }

    fn filters(&self) -> SampleFilters {
        SampleFilters::from_params(
            self.first(TYPE_PARAMS).map(str::to_string),
            self.first(GENRE_PARAMS).map(str::to_string),
            self.first(MIN_SCORE_PARAMS),
        )
    }
}

const TYPE_PARAMS: &[&str] = &["type"];
const GENRE_PARAMS: &[&str] = &["genre", "tag"];
const MIN_SCORE_PARAMS: &[&str] = &["min_score", "min_star"];

#[derive(Debug, Serialize, Deserialize)]
pub struct GenresResponse {
    pub genres: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RandomItemResponse {
    pub item_name: String,
    pub record: Record,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RandomBookResponse {
    pub book_name: String,
    pub record: Record,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub kind: TableKind,
    pub values: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub rows: usize,
    pub loaded_at: DateTime<Utc>,
}

// Handlers

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        rows: state.table.len(),
        loaded_at: state.loaded_at,
    })
}

/// Home page
pub async fn index(State(state): State<AppState>) -> AppResult<Html<&'static str>> {
    if state.table.is_empty() {
        return Err(AppError::DataUnavailable(
            "Data loading failed, please try again later.".to_string(),
        ));
    }

    Ok(Html(INDEX_PAGE))
}

/// Values offered on the home page: categories, or tags for tag-only tables
pub async fn get_categories(State(state): State<AppState>) -> AppResult<Json<CategoriesResponse>> {
    let table = state.table.as_ref();

    let values = match table.kind() {
        TableKind::Categorized => distinct_categories(table),
        TableKind::TagOnly => distinct_tags(table, None)?,
    };

    Ok(Json(CategoriesResponse {
        kind: table.kind(),
        values: values.into_iter().map(str::to_string).collect(),
    }))
}

/// Genres available under the selected type
pub async fn get_genres(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<QueryParams>,
) -> AppResult<Json<GenresResponse>> {
    let category = params.first(TYPE_PARAMS);
    let genres = distinct_tags(&state.table, category)?;

    tracing::debug!(
        request_id = %request_id,
        category = ?category,
        genre_count = genres.len(),
        "Listed genres"
    );

    Ok(Json(GenresResponse {
        genres: genres.into_iter().map(str::to_string).collect(),
    }))
}

/// Picks a random item matching the type, genre and minimum score
pub async fn random_item(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<QueryParams>,
) -> AppResult<Json<RandomItemResponse>> {
    let record = pick_record(&state, request_id, &params)?;

    Ok(Json(RandomItemResponse {
        item_name: bracketed(&record),
        record,
    }))
}

/// Same pick as [`random_item`], keyed the way the book front end expects
pub async fn random_book(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<QueryParams>,
) -> AppResult<Json<RandomBookResponse>> {
    let record = pick_record(&state, request_id, &params)?;

    Ok(Json(RandomBookResponse {
        book_name: bracketed(&record),
        record,
    }))
}

fn pick_record(state: &AppState, request_id: RequestId, params: &QueryParams) -> AppResult<Record> {
    let filters = params.filters();

    let Some(record) = state.rng.sample(&state.table, &filters) else {
        tracing::info!(
            request_id = %request_id,
            category = ?filters.category,
            genre = ?filters.tag,
            min_score = filters.min_score,
            "No items match the criteria"
        );
        return Err(AppError::NotFound("No items match the criteria".to_string()));
    };

    tracing::info!(
        request_id = %request_id,
        item = %record.label,
        "Picked random item"
    );

    Ok(record.clone())
}

fn bracketed(record: &Record) -> String {
    format!("《{}》", record.label)
}
