use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use super::{ShowId, UserId};

/// Identifier of a user's watchlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchlistId(pub i64);

impl Display for WatchlistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tracked progress for a show on a watchlist
///
/// Any state may move to any other; there are no forbidden transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WatchState {
    Planned,
    Watching,
    Completed,
    Dropped,
}

impl WatchState {
    pub const ALL: [WatchState; 4] = [
        WatchState::Planned,
        WatchState::Watching,
        WatchState::Completed,
        WatchState::Dropped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchState::Planned => "Planned",
            WatchState::Watching => "Watching",
            WatchState::Completed => "Completed",
            WatchState::Dropped => "Dropped",
        }
    }
}

impl Display for WatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WatchState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WatchState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("unknown watch status: {}", s))
    }
}

/// A user's watchlist (exactly one per user)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watchlist {
    pub watchlist_id: WatchlistId,
    pub user_id: UserId,
}

/// One show on a watchlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchStatus {
    pub watchlist_id: WatchlistId,
    pub show_id: ShowId,
    pub status: WatchState,
    pub added_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_state_round_trip_through_text() {
        for state in WatchState::ALL {
            assert_eq!(state.as_str().parse::<WatchState>().unwrap(), state);
        }
        assert!("watching".parse::<WatchState>().is_err());
    }

    #[test]
    fn test_watch_state_serialization() {
        assert_eq!(
            serde_json::to_string(&WatchState::Completed).unwrap(),
            "\"Completed\""
        );
        let state: WatchState = serde_json::from_str("\"Dropped\"").unwrap();
        assert_eq!(state, WatchState::Dropped);
    }
}
