pub mod catalog;
pub mod recommendations;
pub mod reviews;
pub mod users;
pub mod watchlist;
