use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::{ShowId, UserId};

/// A 1-5 star rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: Rating = Rating(1);
    pub const MAX: Rating = Rating(5);

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN.0..=Self::MAX.0).contains(&value).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value).ok_or_else(|| format!("rating must be between 1 and 5, got {}", value))
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's rating and review of a show (one per user and show)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub show_id: ShowId,
    pub rating: Rating,
    pub review: String,
    pub review_date: NaiveDate,
}

/// Which interactions to load from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionFilter {
    /// Every interaction written by one user
    ByUser(UserId),
    /// Every interaction about one show, most recent first
    ByShow(ShowId),
    /// Maximum-rating interactions, most recent first
    TopRated { limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(0).is_none());
        assert_eq!(Rating::new(1), Some(Rating::MIN));
        assert_eq!(Rating::new(5), Some(Rating::MAX));
        assert!(Rating::new(6).is_none());
    }

    #[test]
    fn test_rating_serde_rejects_out_of_range() {
        let rating: Rating = serde_json::from_str("4").unwrap();
        assert_eq!(rating.value(), 4);
        assert!(serde_json::from_str::<Rating>("9").is_err());
        assert_eq!(serde_json::to_string(&Rating::MAX).unwrap(), "5");
    }
}
