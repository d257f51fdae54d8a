use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        Catalog, CatalogEntry, GenreSet, Interaction, InteractionFilter, NewShow, Rating, Show,
        ShowDetails, ShowId, ShowKind, User, UserId, WatchState, WatchStatus, Watchlist,
        WatchlistId,
    },
};

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Columns shared by the `movie` and `tv_series` tables, prefixed by the variant id
const MOVIE_COLUMNS: &str = "st.show_id, m.movie_id AS variant_id, m.name, m.description, m.genres, m.release_date";
const SERIES_COLUMNS: &str = "st.show_id, t.tv_series_id AS variant_id, t.name, t.description, t.genres, t.release_date";

const HISTORY_COLUMNS: &str = "user_id, show_id, rating, review, review_date";
const WATCHLIST_SHOW_COLUMNS: &str = "watchlist_id, show_id, status, added_date";

#[derive(Debug, sqlx::FromRow)]
struct ShowRow {
    show_id: i64,
    variant_id: i64,
    name: String,
    description: String,
    genres: Vec<String>,
    release_date: NaiveDate,
}

impl ShowRow {
    fn into_entry(self, kind: ShowKind) -> CatalogEntry {
        let details = ShowDetails {
            name: self.name,
            description: self.description,
            genres: GenreSet::from(self.genres),
            release_date: self.release_date,
        };
        let show = match kind {
            ShowKind::Movie => Show::Movie {
                movie_id: self.variant_id,
                details,
            },
            ShowKind::Series => Show::Series {
                series_id: self.variant_id,
                details,
            },
        };
        CatalogEntry {
            show_id: ShowId(self.show_id),
            show,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ShowRefRow {
    movie_id: Option<i64>,
    tv_series_id: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
struct InteractionRow {
    user_id: i64,
    show_id: i64,
    rating: i16,
    review: String,
    review_date: NaiveDate,
}

impl TryFrom<InteractionRow> for Interaction {
    type Error = AppError;

    fn try_from(row: InteractionRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating)
            .ok()
            .and_then(Rating::new)
            .ok_or_else(|| AppError::Internal(format!("Stored rating out of range: {}", row.rating)))?;

        Ok(Interaction {
            user_id: UserId(row.user_id),
            show_id: ShowId(row.show_id),
            rating,
            review: row.review,
            review_date: row.review_date,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WatchStatusRow {
    watchlist_id: i64,
    show_id: i64,
    status: String,
    added_date: NaiveDate,
}

impl TryFrom<WatchStatusRow> for WatchStatus {
    type Error = AppError;

    fn try_from(row: WatchStatusRow) -> Result<Self, Self::Error> {
        Ok(WatchStatus {
            watchlist_id: WatchlistId(row.watchlist_id),
            show_id: ShowId(row.show_id),
            status: row.status.parse().map_err(AppError::Internal)?,
            added_date: row.added_date,
        })
    }
}

/// Maps a foreign key violation to a not-found error for the referenced record
fn missing_reference(error: sqlx::Error, what: String) -> AppError {
    match &error {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::NotFound(what),
        _ => AppError::Database(error),
    }
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_variant(&self, kind: ShowKind, variant_id: i64) -> AppResult<Option<CatalogEntry>> {
        let query = match kind {
            ShowKind::Movie => format!(
                "SELECT {MOVIE_COLUMNS} FROM movie m \
                 JOIN show_table st ON st.movie_id = m.movie_id \
                 WHERE m.movie_id = $1"
            ),
            ShowKind::Series => format!(
                "SELECT {SERIES_COLUMNS} FROM tv_series t \
                 JOIN show_table st ON st.tv_series_id = t.tv_series_id \
                 WHERE t.tv_series_id = $1"
            ),
        };

        let row = sqlx::query_as::<_, ShowRow>(&query)
            .bind(variant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_entry(kind)))
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn fetch_catalog(&self) -> AppResult<Catalog> {
        let movies = sqlx::query_as::<_, ShowRow>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movie m \
             JOIN show_table st ON st.movie_id = m.movie_id \
             ORDER BY m.movie_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let series = sqlx::query_as::<_, ShowRow>(&format!(
            "SELECT {SERIES_COLUMNS} FROM tv_series t \
             JOIN show_table st ON st.tv_series_id = t.tv_series_id \
             ORDER BY t.tv_series_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(movies = movies.len(), series = series.len(), "Catalog loaded");

        let entries = movies
            .into_iter()
            .map(|row| row.into_entry(ShowKind::Movie))
            .chain(series.into_iter().map(|row| row.into_entry(ShowKind::Series)))
            .collect();

        Ok(Catalog::new(entries))
    }

    async fn resolve_show(&self, show_id: ShowId) -> AppResult<Option<CatalogEntry>> {
        let show_ref = sqlx::query_as::<_, ShowRefRow>(
            "SELECT movie_id, tv_series_id FROM show_table WHERE show_id = $1",
        )
        .bind(show_id.0)
        .fetch_optional(&self.pool)
        .await?;

        match show_ref {
            None => Ok(None),
            Some(ShowRefRow {
                movie_id: Some(movie_id),
                ..
            }) => self.fetch_variant(ShowKind::Movie, movie_id).await,
            Some(ShowRefRow {
                tv_series_id: Some(series_id),
                ..
            }) => self.fetch_variant(ShowKind::Series, series_id).await,
            Some(_) => Err(AppError::Internal(format!(
                "Show {} references neither a movie nor a series",
                show_id
            ))),
        }
    }

    async fn fetch_interactions(&self, filter: InteractionFilter) -> AppResult<Vec<Interaction>> {
        let rows = match filter {
            InteractionFilter::ByUser(user_id) => {
                sqlx::query_as::<_, InteractionRow>(&format!(
                    "SELECT {HISTORY_COLUMNS} FROM history WHERE user_id = $1 ORDER BY history_id"
                ))
                .bind(user_id.0)
                .fetch_all(&self.pool)
                .await?
            }
            InteractionFilter::ByShow(show_id) => {
                sqlx::query_as::<_, InteractionRow>(&format!(
                    "SELECT {HISTORY_COLUMNS} FROM history WHERE show_id = $1 \
                     ORDER BY review_date DESC, history_id"
                ))
                .bind(show_id.0)
                .fetch_all(&self.pool)
                .await?
            }
            InteractionFilter::TopRated { limit } => {
                sqlx::query_as::<_, InteractionRow>(&format!(
                    "SELECT {HISTORY_COLUMNS} FROM history WHERE rating = $1 \
                     ORDER BY review_date DESC, history_id LIMIT $2"
                ))
                .bind(i16::from(Rating::MAX.value()))
                .bind(i64::try_from(limit).unwrap_or(i64::MAX))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(Interaction::try_from).collect()
    }

    async fn upsert_watch_status(
        &self,
        watchlist_id: WatchlistId,
        show_id: ShowId,
        status: WatchState,
        today: NaiveDate,
    ) -> AppResult<bool> {
        // xmax is zero only for a freshly inserted tuple
        let inserted = sqlx::query_scalar::<_, bool>(
            "INSERT INTO watchlist_show (watchlist_id, show_id, status, added_date) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (watchlist_id, show_id) DO UPDATE SET status = EXCLUDED.status \
             RETURNING (xmax = 0) AS inserted",
        )
        .bind(watchlist_id.0)
        .bind(show_id.0)
        .bind(status.as_str())
        .bind(today)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_reference(e, format!("Watchlist {} or show {}", watchlist_id, show_id)))?;

        Ok(!inserted)
    }

    async fn upsert_interaction(
        &self,
        user_id: UserId,
        show_id: ShowId,
        rating: Rating,
        review: String,
        review_date: NaiveDate,
    ) -> AppResult<Interaction> {
        let row = sqlx::query_as::<_, InteractionRow>(&format!(
            "INSERT INTO history (user_id, show_id, rating, review, review_date) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id, show_id) DO UPDATE \
             SET rating = EXCLUDED.rating, review = EXCLUDED.review, review_date = EXCLUDED.review_date \
             RETURNING {HISTORY_COLUMNS}"
        ))
        .bind(user_id.0)
        .bind(show_id.0)
        .bind(i16::from(rating.value()))
        .bind(review)
        .bind(review_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_reference(e, format!("User {} or show {}", user_id, show_id)))?;

        Interaction::try_from(row)
    }

    async fn create_user(&self, username: String) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let user_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO app_user (username) VALUES ($1) RETURNING user_id",
        )
        .bind(&username)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Username {} is taken", username))
            }
            _ => AppError::Database(e),
        })?;

        let watchlist_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO watchlist (user_id) VALUES ($1) RETURNING watchlist_id",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(User {
            user_id: UserId(user_id),
            username,
            watchlist_id: WatchlistId(watchlist_id),
        })
    }

    async fn watchlist_for_user(&self, user_id: UserId) -> AppResult<Option<Watchlist>> {
        let watchlist_id = sqlx::query_scalar::<_, i64>(
            "SELECT watchlist_id FROM watchlist WHERE user_id = $1",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(watchlist_id.map(|id| Watchlist {
            watchlist_id: WatchlistId(id),
            user_id,
        }))
    }

    async fn watch_status(
        &self,
        watchlist_id: WatchlistId,
        show_id: ShowId,
    ) -> AppResult<Option<WatchStatus>> {
        let row = sqlx::query_as::<_, WatchStatusRow>(&format!(
            "SELECT {WATCHLIST_SHOW_COLUMNS} FROM watchlist_show \
             WHERE watchlist_id = $1 AND show_id = $2"
        ))
        .bind(watchlist_id.0)
        .bind(show_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(WatchStatus::try_from).transpose()
    }

    async fn watchlist_entries(&self, watchlist_id: WatchlistId) -> AppResult<Vec<WatchStatus>> {
        let rows = sqlx::query_as::<_, WatchStatusRow>(&format!(
            "SELECT {WATCHLIST_SHOW_COLUMNS} FROM watchlist_show \
             WHERE watchlist_id = $1 ORDER BY added_date, show_id"
        ))
        .bind(watchlist_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WatchStatus::try_from).collect()
    }

    async fn status_counts(&self, show_id: ShowId) -> AppResult<Vec<(WatchState, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM watchlist_show WHERE show_id = $1 GROUP BY status",
        )
        .bind(show_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(status, count)| -> AppResult<(WatchState, i64)> {
                Ok((status.parse().map_err(AppError::Internal)?, count))
            })
            .collect()
    }

    async fn insert_show(&self, new_show: NewShow) -> AppResult<CatalogEntry> {
        let mut tx = self.pool.begin().await?;
        let details = new_show.details;
        let genres: Vec<String> = details.genres.clone().into();

        let (table, id_column) = match new_show.kind {
            ShowKind::Movie => ("movie", "movie_id"),
            ShowKind::Series => ("tv_series", "tv_series_id"),
        };

        let variant_id = sqlx::query_scalar::<_, i64>(&format!(
            "INSERT INTO {table} (name, description, genres, release_date) \
             VALUES ($1, $2, $3, $4) RETURNING {id_column}"
        ))
        .bind(&details.name)
        .bind(&details.description)
        .bind(&genres)
        .bind(details.release_date)
        .fetch_one(&mut *tx)
        .await?;

        let show_id = sqlx::query_scalar::<_, i64>(&format!(
            "INSERT INTO show_table ({id_column}) VALUES ($1) RETURNING show_id"
        ))
        .bind(variant_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(show_id, kind = new_show.kind.as_str(), name = %details.name, "Show added");

        let show = match new_show.kind {
            ShowKind::Movie => Show::Movie {
                movie_id: variant_id,
                details,
            },
            ShowKind::Series => Show::Series {
                series_id: variant_id,
                details,
            },
        };

        Ok(CatalogEntry {
            show_id: ShowId(show_id),
            show,
        })
    }
}
