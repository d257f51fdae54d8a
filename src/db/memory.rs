use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        Catalog, CatalogEntry, Interaction, InteractionFilter, NewShow, Rating, Show, ShowId,
        ShowKind, User, UserId, WatchState, WatchStatus, Watchlist, WatchlistId,
    },
};

/// In-process store backed by plain collections
///
/// Every write takes the single write lock, which gives the upserts their
/// one-writer-wins semantics.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    shows: Vec<CatalogEntry>,
    users: Vec<User>,
    interactions: Vec<Interaction>,
    watch_statuses: Vec<WatchStatus>,
    last_show_id: i64,
    last_movie_id: i64,
    last_series_id: i64,
    last_user_id: i64,
    last_watchlist_id: i64,
}

impl MemoryStoreInner {
    fn show_exists(&self, show_id: ShowId) -> bool {
        self.shows.iter().any(|e| e.show_id == show_id)
    }

    fn require_show(&self, show_id: ShowId) -> AppResult<()> {
        if self.show_exists(show_id) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Show {}", show_id)))
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn fetch_catalog(&self) -> AppResult<Catalog> {
        let inner = self.inner.read().await;
        let mut entries = inner.shows.clone();
        entries.sort_by_key(|e| {
            let kind_rank = match e.show.kind() {
                ShowKind::Movie => 0,
                ShowKind::Series => 1,
            };
            (kind_rank, e.show.variant_id())
        });
        Ok(Catalog::new(entries))
    }

    async fn resolve_show(&self, show_id: ShowId) -> AppResult<Option<CatalogEntry>> {
        let inner = self.inner.read().await;
        Ok(inner.shows.iter().find(|e| e.show_id == show_id).cloned())
    }

    async fn fetch_interactions(&self, filter: InteractionFilter) -> AppResult<Vec<Interaction>> {
        let inner = self.inner.read().await;
        let interactions = match filter {
            InteractionFilter::ByUser(user_id) => inner
                .interactions
                .iter()
                .filter(|i| i.user_id == user_id)
                .cloned()
                .collect(),
            InteractionFilter::ByShow(show_id) => {
                let mut matching: Vec<Interaction> = inner
                    .interactions
                    .iter()
                    .filter(|i| i.show_id == show_id)
                    .cloned()
                    .collect();
                matching.sort_by(|a, b| b.review_date.cmp(&a.review_date));
                matching
            }
            InteractionFilter::TopRated { limit } => {
                let mut matching: Vec<Interaction> = inner
                    .interactions
                    .iter()
                    .filter(|i| i.rating == Rating::MAX)
                    .cloned()
                    .collect();
                matching.sort_by(|a, b| b.review_date.cmp(&a.review_date));
                matching.truncate(limit);
                matching
            }
        };
        Ok(interactions)
    }

    async fn upsert_watch_status(
        &self,
        watchlist_id: WatchlistId,
        show_id: ShowId,
        status: WatchState,
        today: NaiveDate,
    ) -> AppResult<bool> {
        let mut inner = self.inner.write().await;

        if !inner.users.iter().any(|u| u.watchlist_id == watchlist_id) {
            return Err(AppError::NotFound(format!("Watchlist {}", watchlist_id)));
        }
        inner.require_show(show_id)?;

        if let Some(existing) = inner
            .watch_statuses
            .iter_mut()
            .find(|w| w.watchlist_id == watchlist_id && w.show_id == show_id)
        {
            existing.status = status;
            return Ok(true);
        }

        inner.watch_statuses.push(WatchStatus {
            watchlist_id,
            show_id,
            status,
            added_date: today,
        });
        Ok(false)
    }

    async fn upsert_interaction(
        &self,
        user_id: UserId,
        show_id: ShowId,
        rating: Rating,
        review: String,
        review_date: NaiveDate,
    ) -> AppResult<Interaction> {
        let mut inner = self.inner.write().await;

        if !inner.users.iter().any(|u| u.user_id == user_id) {
            return Err(AppError::NotFound(format!("User {}", user_id)));
        }
        inner.require_show(show_id)?;

        let interaction = Interaction {
            user_id,
            show_id,
            rating,
            review,
            review_date,
        };

        let existing = inner
            .interactions
            .iter()
            .position(|i| i.user_id == user_id && i.show_id == show_id);
        match existing {
            Some(index) => inner.interactions[index] = interaction.clone(),
            None => inner.interactions.push(interaction.clone()),
        }

        Ok(interaction)
    }

    async fn create_user(&self, username: String) -> AppResult<User> {
        let mut inner = self.inner.write().await;

        if inner.users.iter().any(|u| u.username == username) {
            return Err(AppError::Conflict(format!("Username {} is taken", username)));
        }

        inner.last_user_id += 1;
        inner.last_watchlist_id += 1;
        let user = User {
            user_id: UserId(inner.last_user_id),
            username,
            watchlist_id: WatchlistId(inner.last_watchlist_id),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn watchlist_for_user(&self, user_id: UserId) -> AppResult<Option<Watchlist>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|u| u.user_id == user_id)
            .map(|u| Watchlist {
                watchlist_id: u.watchlist_id,
                user_id: u.user_id,
            }))
    }

    async fn watch_status(
        &self,
        watchlist_id: WatchlistId,
        show_id: ShowId,
    ) -> AppResult<Option<WatchStatus>> {
        let inner = self.inner.read().await;
        Ok(inner
            .watch_statuses
            .iter()
            .find(|w| w.watchlist_id == watchlist_id && w.show_id == show_id)
            .cloned())
    }

    async fn watchlist_entries(&self, watchlist_id: WatchlistId) -> AppResult<Vec<WatchStatus>> {
        let inner = self.inner.read().await;
        let mut entries: Vec<WatchStatus> = inner
            .watch_statuses
            .iter()
            .filter(|w| w.watchlist_id == watchlist_id)
            .cloned()
            .collect();
        entries.sort_by_key(|w| w.added_date);
        Ok(entries)
    }

    async fn status_counts(&self, show_id: ShowId) -> AppResult<Vec<(WatchState, i64)>> {
        let inner = self.inner.read().await;
        Ok(WatchState::ALL
            .into_iter()
            .map(|state| {
                let count = inner
                    .watch_statuses
                    .iter()
                    .filter(|w| w.show_id == show_id && w.status == state)
                    .count() as i64;
                (state, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect())
    }

    async fn insert_show(&self, new_show: NewShow) -> AppResult<CatalogEntry> {
        let mut inner = self.inner.write().await;

        let show = match new_show.kind {
            ShowKind::Movie => {
                inner.last_movie_id += 1;
                Show::Movie {
                    movie_id: inner.last_movie_id,
                    details: new_show.details,
                }
            }
            ShowKind::Series => {
                inner.last_series_id += 1;
                Show::Series {
                    series_id: inner.last_series_id,
                    details: new_show.details,
                }
            }
        };

        inner.last_show_id += 1;
        let entry = CatalogEntry {
            show_id: ShowId(inner.last_show_id),
            show,
        };
        inner.shows.push(entry.clone());
        Ok(entry)
    }
}
