//! Routing labels for preorder queries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label assigned to a visitor query by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Sports,
    #[default]
    General,
    ClubHistory,
    MatchMoments,
    PlayerHistory,
    Chants,
    PlaceOrder,
}

impl Category {
    /// Every label, in the order they are offered to the classifier
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Sports,
        Category::General,
        Category::ClubHistory,
        Category::MatchMoments,
        Category::PlayerHistory,
        Category::Chants,
        Category::PlaceOrder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Sports => "sports",
            Category::General => "general",
            Category::ClubHistory => "club_history",
            Category::MatchMoments => "match_moments",
            Category::PlayerHistory => "player_history",
            Category::Chants => "chants",
            Category::PlaceOrder => "place_order",
        }
    }

    /// Map a raw model reply to a label.
    ///
    /// The reply is trimmed, lowercased and stripped of surrounding quotes
    /// and punctuation. Spaces and hyphens are read as underscores, so
    /// "Club History." resolves to `club_history`. Returns `None` for
    /// anything that is not a known label.
    pub fn from_reply(reply: &str) -> Option<Self> {
        let normalized = reply
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '_')
            .to_lowercase()
            .replace([' ', '-'], "_");

        normalized.parse().ok()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}
