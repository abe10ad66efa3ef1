//! Playing-card ranks and their Hi-Lo values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A playing-card rank. Suits carry no weight in Hi-Lo, so a card is fully
/// described by its rank.
///
/// The enum is closed on purpose: every rank the matcher can confirm has a
/// count value, and adding a rank without one is a compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

/// Error returned when a string does not name a rank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized rank label '{0}'")]
pub struct ParseRankError(pub String);

impl Rank {
    /// All thirteen ranks in ascending order. This is also the order
    /// templates are evaluated in, which keeps tie-breaking stable.
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Hi-Lo increment for this rank: +1 for 2..=6, 0 for 7..=9, -1 for
    /// tens, faces and aces.
    pub const fn hilo_value(self) -> i32 {
        match self {
            Rank::Two | Rank::Three | Rank::Four | Rank::Five | Rank::Six => 1,
            Rank::Seven | Rank::Eight | Rank::Nine => 0,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King | Rank::Ace => -1,
        }
    }

    /// Canonical label, as used in template filenames and display.
    pub const fn label(self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }

    /// Parse a label such as `"10"`, `"k"` or `"A"`. Case-insensitive;
    /// `"T"` is accepted as a shorthand for ten.
    pub fn from_label(label: &str) -> Result<Rank, ParseRankError> {
        match label.trim().to_ascii_uppercase().as_str() {
            "2" => Ok(Rank::Two),
            "3" => Ok(Rank::Three),
            "4" => Ok(Rank::Four),
            "5" => Ok(Rank::Five),
            "6" => Ok(Rank::Six),
            "7" => Ok(Rank::Seven),
            "8" => Ok(Rank::Eight),
            "9" => Ok(Rank::Nine),
            "10" | "T" => Ok(Rank::Ten),
            "J" => Ok(Rank::Jack),
            "Q" => Ok(Rank::Queen),
            "K" => Ok(Rank::King),
            "A" => Ok(Rank::Ace),
            _ => Err(ParseRankError(label.to_string())),
        }
    }
}

impl FromStr for Rank {
    type Err = ParseRankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rank::from_label(s)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Ranks travel through configs and JSON reports as their labels ("K", "10"),
// not as variant names.
impl Serialize for Rank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Rank {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hilo_values_cover_all_ranks() {
        let total: i32 = Rank::ALL.iter().map(|r| r.hilo_value()).sum();
        // 5 low cards, 3 neutral, 5 high: a full rank sweep is balanced.
        assert_eq!(total, 0);
        assert_eq!(Rank::Two.hilo_value(), 1);
        assert_eq!(Rank::Six.hilo_value(), 1);
        assert_eq!(Rank::Seven.hilo_value(), 0);
        assert_eq!(Rank::Nine.hilo_value(), 0);
        assert_eq!(Rank::Ten.hilo_value(), -1);
        assert_eq!(Rank::Ace.hilo_value(), -1);
    }

    #[test]
    fn labels_round_trip() {
        for rank in Rank::ALL {
            assert_eq!(rank.label().parse::<Rank>().unwrap(), rank);
        }
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!("k".parse::<Rank>().unwrap(), Rank::King);
        assert_eq!(" a ".parse::<Rank>().unwrap(), Rank::Ace);
        assert_eq!("t".parse::<Rank>().unwrap(), Rank::Ten);
    }

    #[test]
    fn unknown_labels_are_rejected() {
        assert!("joker".parse::<Rank>().is_err());
        assert!("1".parse::<Rank>().is_err());
        assert!("".parse::<Rank>().is_err());
    }

    #[test]
    fn serializes_as_label() {
        assert_eq!(serde_json::to_string(&Rank::Ten).unwrap(), "\"10\"");
        let back: Rank = serde_json::from_str("\"q\"").unwrap();
        assert_eq!(back, Rank::Queen);
    }
}
