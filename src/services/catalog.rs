use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        Catalog, CatalogEntry, GenreSet, Interaction, InteractionFilter, NewShow, RawShow, Rating,
        ShowCard, ShowDetails, ShowId, UserId, WatchState, Watchlist, WatchlistId,
    },
    services::recommendations::{
        self, SIMILAR_LIMIT_PER_KIND, SIMILAR_MIN_OVERLAP, TRENDING_TOP_N,
    },
};

/// Number of newest shows on the home page
pub const NEW_RELEASES_LIMIT: usize = 10;
/// Number of reviews shown on a show page
pub const LATEST_REVIEWS_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub user_id: UserId,
    pub new_releases: Vec<ShowCard>,
    pub trending: Vec<ShowCard>,
    pub recommended: Vec<ShowCard>,
}

#[derive(Debug, Serialize)]
pub struct ShowPage {
    pub show: ShowCard,
    /// Genres joined for display, e.g. "Action, Drama"
    pub genre_list: String,
    pub watchlist_id: WatchlistId,
    pub current_status: Option<WatchState>,
    pub similar_shows: Vec<ShowCard>,
    pub review_count: usize,
    pub latest_reviews: Vec<Interaction>,
    pub status_distribution: BTreeMap<WatchState, i64>,
    pub score_distribution: BTreeMap<u8, usize>,
    pub user_review: Option<Interaction>,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: Vec<ShowId>,
    pub skipped: Vec<SkippedShow>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SkippedShow {
    pub name: String,
    pub reason: String,
}

/// Looks up the user's watchlist; every user-facing page needs it
pub(crate) async fn require_watchlist(store: &dyn Store, user_id: UserId) -> AppResult<Watchlist> {
    store
        .watchlist_for_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Watchlist for user {}", user_id)))
}

/// Every show in catalog order
pub async fn list_shows(store: &dyn Store) -> AppResult<Vec<ShowCard>> {
    let catalog = store.fetch_catalog().await?;
    Ok(catalog.iter().map(ShowCard::from).collect())
}

/// Newest shows across both variants
pub fn new_releases(catalog: &Catalog, limit: usize) -> Vec<ShowCard> {
    let mut shows: Vec<ShowCard> = catalog.iter().map(ShowCard::from).collect();
    shows.sort_by(|a, b| b.release_date.cmp(&a.release_date));
    shows.truncate(limit);
    shows
}

pub async fn trending_shows(store: &dyn Store) -> AppResult<Vec<ShowCard>> {
    let catalog = store.fetch_catalog().await?;
    let interactions = store
        .fetch_interactions(InteractionFilter::TopRated {
            limit: TRENDING_TOP_N,
        })
        .await?;
    Ok(recommendations::trending(&interactions, &catalog, TRENDING_TOP_N))
}

/// New releases, trending shows and personal recommendations for one user
pub async fn home(store: &dyn Store, user_id: UserId) -> AppResult<HomePage> {
    require_watchlist(store, user_id).await?;

    let catalog = store.fetch_catalog().await?;
    let top_rated = store
        .fetch_interactions(InteractionFilter::TopRated {
            limit: TRENDING_TOP_N,
        })
        .await?;
    let own = store
        .fetch_interactions(InteractionFilter::ByUser(user_id))
        .await?;

    let page = HomePage {
        user_id,
        new_releases: new_releases(&catalog, NEW_RELEASES_LIMIT),
        trending: recommendations::trending(&top_rated, &catalog, TRENDING_TOP_N),
        recommended: recommendations::recommend_for_user(user_id, &own, &catalog),
    };

    tracing::info!(
        user_id = %user_id,
        new_releases = page.new_releases.len(),
        trending = page.trending.len(),
        recommended = page.recommended.len(),
        "Home page assembled"
    );

    Ok(page)
}

/// Everything shown on a single show's page for the given user
pub async fn show_page(store: &dyn Store, user_id: UserId, show_id: ShowId) -> AppResult<ShowPage> {
    let watchlist = require_watchlist(store, user_id).await?;

    let entry = store
        .resolve_show(show_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Show {}", show_id)))?;

    // the full catalog is only needed for the similar shows list
    let catalog = store.fetch_catalog().await?;
    build_show_page(store, &catalog, &entry, user_id, watchlist).await
}

/// Case-insensitive name search; the first matching movie wins, then series
pub async fn search(store: &dyn Store, user_id: UserId, query: &str) -> AppResult<ShowPage> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Err(AppError::InvalidInput("Search query must not be empty".to_string()));
    }

    let watchlist = require_watchlist(store, user_id).await?;
    let catalog = store.fetch_catalog().await?;

    let matches = |entry: &&CatalogEntry| entry.show.details().name.to_lowercase().contains(&needle);
    let found = catalog
        .movies()
        .find(matches)
        .or_else(|| catalog.series().find(matches));

    let Some(entry) = found else {
        tracing::info!(user_id = %user_id, query = %query, "Search found nothing");
        return Err(AppError::NotFound(
            "No search result, please check again".to_string(),
        ));
    };

    build_show_page(store, &catalog, entry, user_id, watchlist).await
}

async fn build_show_page(
    store: &dyn Store,
    catalog: &Catalog,
    entry: &CatalogEntry,
    user_id: UserId,
    watchlist: Watchlist,
) -> AppResult<ShowPage> {
    let show_id = entry.show_id;
    let genres = &entry.show.details().genres;

    let current_status = store
        .watch_status(watchlist.watchlist_id, show_id)
        .await?
        .map(|w| w.status);

    // the viewed show is not excluded and lists itself when it has enough genres
    let similar_shows = recommendations::similar_shows(
        genres,
        catalog,
        &HashSet::new(),
        SIMILAR_MIN_OVERLAP,
        SIMILAR_LIMIT_PER_KIND,
    );

    // newest first
    let reviews = store
        .fetch_interactions(InteractionFilter::ByShow(show_id))
        .await?;

    let mut status_distribution: BTreeMap<WatchState, i64> =
        WatchState::ALL.into_iter().map(|state| (state, 0)).collect();
    for (state, count) in store.status_counts(show_id).await? {
        status_distribution.insert(state, count);
    }

    let mut score_distribution: BTreeMap<u8, usize> = (Rating::MIN.value()..=Rating::MAX.value())
        .map(|score| (score, 0))
        .collect();
    for review in &reviews {
        *score_distribution.entry(review.rating.value()).or_default() += 1;
    }

    let user_review = reviews.iter().find(|r| r.user_id == user_id).cloned();

    Ok(ShowPage {
        show: ShowCard::from(entry),
        genre_list: genres.to_string(),
        watchlist_id: watchlist.watchlist_id,
        current_status,
        similar_shows,
        review_count: reviews.len(),
        latest_reviews: reviews.iter().take(LATEST_REVIEWS_LIMIT).cloned().collect(),
        status_distribution,
        score_distribution,
        user_review,
    })
}

/// Adds a single show with structured genres
pub async fn add_show(store: &dyn Store, new_show: NewShow) -> AppResult<CatalogEntry> {
    if new_show.details.name.trim().is_empty() {
        return Err(AppError::InvalidInput("Show name must not be empty".to_string()));
    }
    store.insert_show(new_show).await
}

/// Imports shows whose genres are legacy serialized text
///
/// A record with unparseable genres is skipped and logged; the rest of the
/// batch still goes in.
pub async fn import_shows(store: &dyn Store, raw_shows: Vec<RawShow>) -> AppResult<ImportReport> {
    let mut report = ImportReport::default();

    for raw in raw_shows {
        let genres = match GenreSet::parse_serialized(&raw.genre) {
            Ok(genres) => genres,
            Err(e) => {
                tracing::warn!(name = %raw.name, error = %e, "Skipping show with malformed genres");
                report.skipped.push(SkippedShow {
                    name: raw.name,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let entry = add_show(
            store,
            NewShow {
                kind: raw.kind,
                details: ShowDetails {
                    name: raw.name,
                    description: raw.description,
                    genres,
                    release_date: raw.release_date,
                },
            },
        )
        .await?;
        report.imported.push(entry.show_id);
    }

    tracing::info!(
        imported = report.imported.len(),
        skipped = report.skipped.len(),
        "Catalog import finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, MockStore};
    use crate::models::ShowKind;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn show(kind: ShowKind, name: &str, genres: &[&str], released: NaiveDate) -> NewShow {
        NewShow {
            kind,
            details: ShowDetails {
                name: name.to_string(),
                description: String::new(),
                genres: genres.iter().copied().collect(),
                release_date: released,
            },
        }
    }

    async fn seeded_store() -> (MemoryStore, Vec<CatalogEntry>) {
        let store = MemoryStore::new();
        let mut entries = Vec::new();
        for new_show in [
            show(ShowKind::Movie, "Alien", &["Horror", "Sci-Fi"], date(1979, 5, 25)),
            show(ShowKind::Movie, "Aliens", &["Action", "Sci-Fi", "Horror"], date(1986, 7, 18)),
            show(ShowKind::Series, "Stranger Things", &["Horror", "Sci-Fi", "Drama"], date(2016, 7, 15)),
            show(ShowKind::Series, "Friends", &["Comedy"], date(1994, 9, 22)),
        ] {
            entries.push(store.insert_show(new_show).await.unwrap());
        }
        (store, entries)
    }

    #[tokio::test]
    async fn test_new_releases_newest_first_across_kinds() {
        let (store, _) = seeded_store().await;
        let catalog = store.fetch_catalog().await.unwrap();

        let newest = new_releases(&catalog, 2);

        let names: Vec<&str> = newest.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Stranger Things", "Friends"]);
        assert!(new_releases(&Catalog::default(), NEW_RELEASES_LIMIT).is_empty());
    }

    #[tokio::test]
    async fn test_show_page_similar_includes_viewed_show() {
        let (store, entries) = seeded_store().await;
        let user = store.create_user("ripley".to_string()).await.unwrap();

        let page = show_page(&store, user.user_id, entries[0].show_id).await.unwrap();

        assert_eq!(page.show.name, "Alien");
        assert_eq!(page.genre_list, "Horror, Sci-Fi");
        let similar: Vec<&str> = page.similar_shows.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(similar, vec!["Alien", "Aliens", "Stranger Things"]);
        assert_eq!(page.current_status, None);
        assert_eq!(page.review_count, 0);
        assert_eq!(page.status_distribution.len(), 4);
        assert!(page.status_distribution.values().all(|&c| c == 0));
        assert_eq!(page.score_distribution.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_show_page_counts_reviews_and_statuses() {
        let (store, entries) = seeded_store().await;
        let alien = entries[0].show_id;
        let ripley = store.create_user("ripley".to_string()).await.unwrap();
        let hicks = store.create_user("hicks".to_string()).await.unwrap();

        store
            .upsert_interaction(ripley.user_id, alien, Rating::MAX, "classic".to_string(), date(2024, 1, 2))
            .await
            .unwrap();
        store
            .upsert_interaction(hicks.user_id, alien, Rating::new(4).unwrap(), String::new(), date(2024, 1, 1))
            .await
            .unwrap();
        store
            .upsert_watch_status(ripley.watchlist_id, alien, WatchState::Completed, date(2024, 1, 1))
            .await
            .unwrap();

        let page = show_page(&store, ripley.user_id, alien).await.unwrap();

        assert_eq!(page.review_count, 2);
        assert_eq!(page.latest_reviews[0].user_id, ripley.user_id);
        assert_eq!(page.score_distribution[&5], 1);
        assert_eq!(page.score_distribution[&4], 1);
        assert_eq!(page.score_distribution[&1], 0);
        assert_eq!(page.status_distribution[&WatchState::Completed], 1);
        assert_eq!(page.current_status, Some(WatchState::Completed));
        assert_eq!(page.user_review.unwrap().review, "classic");
    }

    #[tokio::test]
    async fn test_show_page_single_genre_show_not_similar_to_itself() {
        let (store, entries) = seeded_store().await;
        let user = store.create_user("ripley".to_string()).await.unwrap();

        let page = show_page(&store, user.user_id, entries[3].show_id).await.unwrap();

        assert_eq!(page.show.name, "Friends");
        assert!(page.similar_shows.is_empty());
    }

    #[tokio::test]
    async fn test_show_page_unknown_show_skips_catalog_load() {
        let mut store = MockStore::new();
        store.expect_watchlist_for_user().returning(|user_id| {
            Ok(Some(Watchlist {
                watchlist_id: WatchlistId(1),
                user_id,
            }))
        });
        store.expect_resolve_show().returning(|_| Ok(None));
        store.expect_fetch_catalog().never();

        let result = show_page(&store, UserId(1), ShowId(404)).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_show_page_unknown_show() {
        let (store, _) = seeded_store().await;
        let user = store.create_user("ripley".to_string()).await.unwrap();

        let result = show_page(&store, user.user_id, ShowId(999)).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_prefers_movies() {
        let (store, _) = seeded_store().await;
        let user = store.create_user("ripley".to_string()).await.unwrap();

        let page = search(&store, user.user_id, "ALIEN").await.unwrap();
        assert_eq!(page.show.name, "Alien");

        let page = search(&store, user.user_id, "friend").await.unwrap();
        assert_eq!(page.show.kind, ShowKind::Series);

        let missing = search(&store, user.user_id, "Predator").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let empty = search(&store, user.user_id, "  ").await;
        assert!(matches!(empty, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_home_combines_lists() {
        let (store, entries) = seeded_store().await;
        let user = store.create_user("ripley".to_string()).await.unwrap();
        store
            .upsert_interaction(user.user_id, entries[0].show_id, Rating::MAX, String::new(), date(2024, 1, 1))
            .await
            .unwrap();

        let page = home(&store, user.user_id).await.unwrap();

        assert_eq!(page.new_releases[0].name, "Stranger Things");
        assert_eq!(page.new_releases.len(), 4);
        assert_eq!(page.trending.len(), 1);
        assert_eq!(page.trending[0].name, "Alien");
        let recommended: Vec<&str> = page.recommended.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(recommended, vec!["Stranger Things", "Aliens"]);
    }

    #[tokio::test]
    async fn test_home_requires_watchlist() {
        let mut store = MockStore::new();
        store.expect_watchlist_for_user().returning(|_| Ok(None));
        store.expect_fetch_catalog().never();

        let result = home(&store, UserId(3)).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_trending_propagates_store_errors() {
        let mut store = MockStore::new();
        store
            .expect_fetch_catalog()
            .returning(|| Err(AppError::Internal("connection reset".to_string())));

        let result = trending_shows(&store).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_import_skips_malformed_genres() {
        let store = MemoryStore::new();
        let raw = vec![
            RawShow {
                kind: ShowKind::Movie,
                name: "Heat".to_string(),
                description: String::new(),
                genre: "['Crime', 'Thriller']".to_string(),
                release_date: date(1995, 12, 15),
            },
            RawShow {
                kind: ShowKind::Series,
                name: "Broken".to_string(),
                description: String::new(),
                genre: "Crime, Drama".to_string(),
                release_date: date(2000, 1, 1),
            },
        ];

        let report = import_shows(&store, raw).await.unwrap();

        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "Broken");

        let catalog = store.fetch_catalog().await.unwrap();
        assert_eq!(catalog.iter().count(), 1);
        let heat = catalog.resolve(report.imported[0]).unwrap();
        assert!(heat.show.details().genres.contains("Thriller"));
    }

    #[tokio::test]
    async fn test_add_show_rejects_blank_name() {
        let store = MemoryStore::new();
        let result = add_show(&store, show(ShowKind::Movie, " ", &[], date(2000, 1, 1))).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
