pub mod genre;
pub mod interaction;
pub mod show;
pub mod user;
pub mod watchlist;

pub use genre::GenreSet;
pub use interaction::{Interaction, InteractionFilter, Rating};
pub use show::{Catalog, CatalogEntry, NewShow, RawShow, Show, ShowCard, ShowDetails, ShowId, ShowKind};
pub use user::{User, UserId};
pub use watchlist::{WatchState, WatchStatus, Watchlist, WatchlistId};
