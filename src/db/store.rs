use chrono::NaiveDate;

use crate::{
    error::AppResult,
    models::{
        Catalog, CatalogEntry, Interaction, InteractionFilter, NewShow, Rating, ShowId, User,
        UserId, WatchState, WatchStatus, Watchlist, WatchlistId,
    },
};

/// Data access for the catalog, interactions and watchlists
///
/// Implementations own conflict resolution for the two upserts; callers never
/// lock around them.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Every movie followed by every series, each in variant-id order
    async fn fetch_catalog(&self) -> AppResult<Catalog>;

    /// Resolves a unified show id, `None` when it does not exist
    async fn resolve_show(&self, show_id: ShowId) -> AppResult<Option<CatalogEntry>>;

    async fn fetch_interactions(&self, filter: InteractionFilter) -> AppResult<Vec<Interaction>>;

    /// Creates or updates the status of a show on a watchlist.
    ///
    /// A new pair is stamped with `today`; an existing pair keeps its added
    /// date. Returns whether the pair existed before the call.
    async fn upsert_watch_status(
        &self,
        watchlist_id: WatchlistId,
        show_id: ShowId,
        status: WatchState,
        today: NaiveDate,
    ) -> AppResult<bool>;

    /// Creates or replaces a user's review of a show
    async fn upsert_interaction(
        &self,
        user_id: UserId,
        show_id: ShowId,
        rating: Rating,
        review: String,
        review_date: NaiveDate,
    ) -> AppResult<Interaction>;

    /// Creates a user and their watchlist
    async fn create_user(&self, username: String) -> AppResult<User>;

    async fn watchlist_for_user(&self, user_id: UserId) -> AppResult<Option<Watchlist>>;

    async fn watch_status(
        &self,
        watchlist_id: WatchlistId,
        show_id: ShowId,
    ) -> AppResult<Option<WatchStatus>>;

    /// Every show on a watchlist, oldest addition first
    async fn watchlist_entries(&self, watchlist_id: WatchlistId) -> AppResult<Vec<WatchStatus>>;

    /// Number of watchlists holding the show, per status (absent statuses omitted)
    async fn status_counts(&self, show_id: ShowId) -> AppResult<Vec<(WatchState, i64)>>;

    /// Adds a movie or series and its unified id
    async fn insert_show(&self, show: NewShow) -> AppResult<CatalogEntry>;
}
