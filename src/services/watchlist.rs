use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{ShowCard, ShowId, UserId, WatchState, WatchlistId},
    services::catalog::require_watchlist,
};

/// Outcome of a status change
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatusChange {
    pub watchlist_id: WatchlistId,
    pub show_id: ShowId,
    pub status: WatchState,
    /// True when the show was not on the watchlist before
    pub created: bool,
}

#[derive(Debug, Serialize)]
pub struct WatchlistItem {
    #[serde(flatten)]
    pub show: ShowCard,
    pub status: WatchState,
    pub added_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct MyList {
    pub user_id: UserId,
    pub watchlist_id: WatchlistId,
    /// Only statuses with at least one show are present
    pub shows_by_status: BTreeMap<WatchState, Vec<WatchlistItem>>,
}

/// Puts a show on a watchlist or moves it to another status
///
/// Every transition is allowed. Only the first write stamps the added date.
pub async fn change_status(
    store: &dyn Store,
    watchlist_id: WatchlistId,
    show_id: ShowId,
    status: WatchState,
    today: NaiveDate,
) -> AppResult<StatusChange> {
    let existed = store
        .upsert_watch_status(watchlist_id, show_id, status, today)
        .await?;

    tracing::info!(
        watchlist_id = %watchlist_id,
        show_id = %show_id,
        status = %status,
        created = !existed,
        "Watch status updated"
    );

    Ok(StatusChange {
        watchlist_id,
        show_id,
        status,
        created: !existed,
    })
}

/// The user's watchlist grouped by status
pub async fn my_list(store: &dyn Store, user_id: UserId) -> AppResult<MyList> {
    let watchlist = require_watchlist(store, user_id).await?;
    let entries = store.watchlist_entries(watchlist.watchlist_id).await?;
    let catalog = store.fetch_catalog().await?;

    let mut shows_by_status: BTreeMap<WatchState, Vec<WatchlistItem>> = BTreeMap::new();
    for entry in entries {
        let show = catalog
            .resolve(entry.show_id)
            .ok_or_else(|| AppError::NotFound(format!("Show {}", entry.show_id)))?;

        shows_by_status
            .entry(entry.status)
            .or_default()
            .push(WatchlistItem {
                show: ShowCard::from(show),
                status: entry.status,
                added_date: entry.added_date,
            });
    }

    Ok(MyList {
        user_id,
        watchlist_id: watchlist.watchlist_id,
        shows_by_status,
    })
}
