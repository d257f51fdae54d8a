use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::User,
};

pub const MAX_USERNAME_LEN: usize = 150;

/// Registers a user and creates their watchlist
pub async fn create_user(store: &dyn Store, username: &str) -> AppResult<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::InvalidInput("Username must not be empty".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::InvalidInput(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LEN
        )));
    }

    let user = store.create_user(username.to_string()).await?;
    tracing::info!(user_id = %user.user_id, watchlist_id = %user.watchlist_id, "User created");
    Ok(user)
}
