use std::collections::HashSet;

use crate::models::{Catalog, GenreSet, Interaction, Rating, ShowCard, ShowId, ShowKind, UserId};

/// Minimum shared genres for the "similar shows" list on a show page
pub const SIMILAR_MIN_OVERLAP: usize = 2;
/// Per-variant cap for the "similar shows" list
pub const SIMILAR_LIMIT_PER_KIND: usize = 5;
/// Minimum shared genres for personal recommendations
pub const RECOMMEND_MIN_OVERLAP: usize = 1;
/// Per-variant cap for personal recommendations
pub const RECOMMEND_LIMIT_PER_KIND: usize = 5;
/// Total cap for personal recommendations
pub const RECOMMEND_TOTAL: usize = 10;
/// Number of recent maximum-rating reviews considered trending
pub const TRENDING_TOP_N: usize = 10;

/// Finds shows sharing at least `min_overlap` genres with `target_genres`
///
/// Movies and series are filtered separately and each list is cut to the
/// first `limit_per_kind` qualifying shows in catalog order. Truncation
/// happens before the merge, so this is not a global top-K by overlap. The
/// merged list is sorted by release date, oldest first; the sort is stable so
/// equal dates keep movies ahead of series.
pub fn similar_shows(
    target_genres: &GenreSet,
    catalog: &Catalog,
    excluding: &HashSet<ShowId>,
    min_overlap: usize,
    limit_per_kind: usize,
) -> Vec<ShowCard> {
    let qualifying = |kind: ShowKind| {
        first_qualifying(catalog, kind, target_genres, excluding, min_overlap, limit_per_kind)
    };

    let mut shows: Vec<ShowCard> = qualifying(ShowKind::Movie)
        .chain(qualifying(ShowKind::Series))
        .collect();
    shows.sort_by_key(|show| show.release_date);

    tracing::debug!(
        target_genres = %target_genres,
        min_overlap,
        matches = shows.len(),
        "Similar shows computed"
    );

    shows
}

/// First `limit` shows of one variant, in catalog order, that pass the overlap threshold
fn first_qualifying<'a>(
    catalog: &'a Catalog,
    kind: ShowKind,
    target_genres: &'a GenreSet,
    excluding: &'a HashSet<ShowId>,
    min_overlap: usize,
    limit: usize,
) -> impl Iterator<Item = ShowCard> + 'a {
    catalog
        .of_kind(kind)
        .filter(move |entry| !excluding.contains(&entry.show_id))
        .filter(move |entry| entry.show.details().genres.overlap(target_genres) >= min_overlap)
        .take(limit)
        .map(ShowCard::from)
}

/// Shows behind the most recent maximum-rating reviews
///
/// Interactions pointing at shows missing from the catalog are skipped. The
/// same show appears once per qualifying review; no de-duplication happens.
pub fn trending(interactions: &[Interaction], catalog: &Catalog, top_n: usize) -> Vec<ShowCard> {
    let mut top_rated: Vec<&Interaction> = interactions
        .iter()
        .filter(|interaction| interaction.rating == Rating::MAX)
        .collect();
    top_rated.sort_by(|a, b| b.review_date.cmp(&a.review_date));

    top_rated
        .into_iter()
        .take(top_n)
        .filter_map(|interaction| match catalog.resolve(interaction.show_id) {
            Some(entry) => Some(ShowCard::from(entry)),
            None => {
                tracing::debug!(show_id = %interaction.show_id, "Skipping review of unknown show");
                None
            }
        })
        .collect()
}

/// Recommends shows based on the genres of the user's highest-rated show
///
/// Ties on rating go to the first interaction encountered. Every show the
/// user has already reviewed is excluded. Results are newest first, capped at
/// [`RECOMMEND_TOTAL`].
pub fn recommend_for_user(
    user_id: UserId,
    interactions: &[Interaction],
    catalog: &Catalog,
) -> Vec<ShowCard> {
    let own: Vec<&Interaction> = interactions
        .iter()
        .filter(|interaction| interaction.user_id == user_id)
        .collect();

    let favourite = own.iter().copied().fold(None, |best: Option<&Interaction>, candidate| {
        match best {
            Some(current) if current.rating >= candidate.rating => Some(current),
            _ => Some(candidate),
        }
    });

    let Some(favourite) = favourite else {
        return Vec::new();
    };

    let Some(favourite_show) = catalog.resolve(favourite.show_id) else {
        tracing::warn!(
            user_id = %user_id,
            show_id = %favourite.show_id,
            "Highest-rated show is missing from the catalog"
        );
        return Vec::new();
    };

    let reviewed: HashSet<ShowId> = own.iter().map(|interaction| interaction.show_id).collect();

    let mut shows = similar_shows(
        &favourite_show.show.details().genres,
        catalog,
        &reviewed,
        RECOMMEND_MIN_OVERLAP,
        RECOMMEND_LIMIT_PER_KIND,
    );
    shows.sort_by(|a, b| b.release_date.cmp(&a.release_date));
    shows.truncate(RECOMMEND_TOTAL);

    tracing::debug!(
        user_id = %user_id,
        seed_show = %favourite.show_id,
        recommendations = shows.len(),
        "Recommendations computed"
    );

    shows
}
