use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{CatalogEntry, Interaction, NewShow, RawShow, ShowCard, ShowId, User, UserId, WatchState, WatchlistId},
    services::{
        catalog::{self, HomePage, ImportReport, ShowPage, NEW_RELEASES_LIMIT},
        reviews, users,
        watchlist::{self, MyList, StatusChange},
    },
};

use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: WatchState,
}

#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    pub rating: u8,
    #[serde(default)]
    pub review: String,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Every show in the catalog
pub async fn list_shows(State(state): State<AppState>) -> AppResult<Json<Vec<ShowCard>>> {
    let shows = catalog::list_shows(state.store.as_ref()).await?;
    Ok(Json(shows))
}

/// Newest shows across movies and series
pub async fn new_releases(State(state): State<AppState>) -> AppResult<Json<Vec<ShowCard>>> {
    let catalog = state.store.fetch_catalog().await?;
    Ok(Json(catalog::new_releases(&catalog, NEW_RELEASES_LIMIT)))
}

/// Shows behind the latest five-star reviews
pub async fn trending(State(state): State<AppState>) -> AppResult<Json<Vec<ShowCard>>> {
    let shows = catalog::trending_shows(state.store.as_ref()).await?;
    Ok(Json(shows))
}

/// Register a user and their watchlist
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = users::create_user(state.store.as_ref(), &request.username).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Home page: new releases, trending and recommendations
pub async fn home(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<HomePage>> {
    tracing::info!(request_id = %request_id, user_id, "Building home page");
    let page = catalog::home(state.store.as_ref(), UserId(user_id)).await?;
    Ok(Json(page))
}

/// Details, similar shows and review statistics for one show
pub async fn show_page(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((user_id, show_id)): Path<(i64, i64)>,
) -> AppResult<Json<ShowPage>> {
    tracing::info!(request_id = %request_id, user_id, show_id, "Building show page");
    let page = catalog::show_page(state.store.as_ref(), UserId(user_id), ShowId(show_id)).await?;
    Ok(Json(page))
}

/// Search by name and return the matching show's page
pub async fn search(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<ShowPage>> {
    let page = catalog::search(state.store.as_ref(), UserId(user_id), &params.q).await?;
    Ok(Json(page))
}

/// The user's watchlist grouped by status
pub async fn my_list(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<MyList>> {
    let list = watchlist::my_list(state.store.as_ref(), UserId(user_id)).await?;
    Ok(Json(list))
}

/// Set the status of a show on a watchlist
pub async fn change_status(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((watchlist_id, show_id)): Path<(i64, i64)>,
    Json(request): Json<ChangeStatusRequest>,
) -> AppResult<Json<StatusChange>> {
    tracing::info!(
        request_id = %request_id,
        watchlist_id,
        show_id,
        status = %request.status,
        "Changing watch status"
    );

    let change = watchlist::change_status(
        state.store.as_ref(),
        WatchlistId(watchlist_id),
        ShowId(show_id),
        request.status,
        today(),
    )
    .await?;
    Ok(Json(change))
}

/// Create or replace the user's review of a show
pub async fn submit_review(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(i64, i64)>,
    Json(request): Json<SubmitReviewRequest>,
) -> AppResult<Json<Interaction>> {
    let interaction = reviews::submit_review(
        state.store.as_ref(),
        UserId(user_id),
        ShowId(show_id),
        request.rating,
        request.review,
        today(),
    )
    .await?;
    Ok(Json(interaction))
}

/// Add a movie or series with structured genres
pub async fn add_show(
    State(state): State<AppState>,
    Json(request): Json<NewShow>,
) -> AppResult<(StatusCode, Json<ShowCard>)> {
    let entry: CatalogEntry = catalog::add_show(state.store.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(entry.card())))
}

/// Bulk import shows whose genres are legacy serialized text
pub async fn import_shows(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<Vec<RawShow>>,
) -> AppResult<Json<ImportReport>> {
    tracing::info!(request_id = %request_id, count = request.len(), "Importing shows");
    let report = catalog::import_shows(state.store.as_ref(), request).await?;
    Ok(Json(report))
}
