use chrono::NaiveDate;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{Interaction, Rating, ShowId, UserId},
};

/// Creates or replaces the user's review of a show, dated `today`
pub async fn submit_review(
    store: &dyn Store,
    user_id: UserId,
    show_id: ShowId,
    rating: u8,
    review: String,
    today: NaiveDate,
) -> AppResult<Interaction> {
    let rating = Rating::new(rating).ok_or_else(|| {
        AppError::InvalidInput(format!("Rating must be between 1 and 5, got {}", rating))
    })?;

    let interaction = store
        .upsert_interaction(user_id, show_id, rating, review.trim().to_string(), today)
        .await?;

    tracing::info!(user_id = %user_id, show_id = %show_id, rating = %rating, "Review saved");

    Ok(interaction)
}
