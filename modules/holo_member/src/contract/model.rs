//! Transport-agnostic holo member model.
//!
//! No serde or schema derives live here; REST DTOs and storage entities convert
//! into and out of these types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Generation (branch) a member debuted in. Stored and exchanged as its exact
/// string form, compared case-sensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationType {
    Gen0,
    Gen1,
    Gen2,
    Gen3,
    Gen4,
    Gen5,
    En,
    Id,
    Gamers,
}

impl GenerationType {
    pub const ALL: [GenerationType; 9] = [
        GenerationType::Gen0,
        GenerationType::Gen1,
        GenerationType::Gen2,
        GenerationType::Gen3,
        GenerationType::Gen4,
        GenerationType::Gen5,
        GenerationType::En,
        GenerationType::Id,
        GenerationType::Gamers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GenerationType::Gen0 => "0",
            GenerationType::Gen1 => "1",
            GenerationType::Gen2 => "2",
            GenerationType::Gen3 => "3",
            GenerationType::Gen4 => "4",
            GenerationType::Gen5 => "5",
            GenerationType::En => "EN",
            GenerationType::Id => "ID",
            GenerationType::Gamers => "Gamers",
        }
    }
}

impl fmt::Display for GenerationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGenerationType(pub String);

impl fmt::Display for UnknownGenerationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown generation type '{}'", self.0)
    }
}

impl std::error::Error for UnknownGenerationType {}

impl FromStr for GenerationType {
    type Err = UnknownGenerationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GenerationType::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownGenerationType(s.to_owned()))
    }
}

/// A stored holo member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoloMember {
    pub id: i32,
    pub generation: GenerationType,
    pub name: String,
    pub description: String,
    pub twitter: String,
    pub age: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting a member; id and timestamps are assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHoloMember {
    pub generation: GenerationType,
    pub name: String,
    pub description: String,
    pub twitter: String,
    pub age: Decimal,
}

/// Partial update. The outer `Option` says whether the field was supplied at
/// all, the inner one whether it was supplied as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoloMemberPatch {
    pub generation: Option<Option<GenerationType>>,
    pub name: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub twitter: Option<Option<String>>,
    pub age: Option<Option<Decimal>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_round_trips_through_str() {
        for g in GenerationType::ALL {
            assert_eq!(g.as_str().parse::<GenerationType>(), Ok(g));
        }
    }

    #[test]
    fn generation_parse_is_case_sensitive() {
        assert!("en".parse::<GenerationType>().is_err());
        assert!("gamers".parse::<GenerationType>().is_err());
        assert!("6".parse::<GenerationType>().is_err());
        assert!("".parse::<GenerationType>().is_err());
        assert_eq!("Gamers".parse::<GenerationType>(), Ok(GenerationType::Gamers));
    }
}
