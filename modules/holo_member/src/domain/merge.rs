//! Partial-update merge of a patch over a stored member.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::contract::model::{HoloMember, HoloMemberPatch};

/// Largest magnitude `numeric(10,1)` can hold, exclusive.
const AGE_LIMIT: i64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("generation type must not be empty")]
    EmptyGenerationType,

    /// The column is NOT NULL in storage.
    #[error("field '{0}' cannot be null")]
    NullField(&'static str),

    #[error("{field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Round to one fractional digit, half away from zero, as `numeric(10,1)` does.
/// Returns `None` when the value does not fit the column.
pub fn normalize_age(age: Decimal) -> Option<Decimal> {
    let rounded = age.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    (rounded.abs() < Decimal::from(AGE_LIMIT)).then_some(rounded)
}

/// Overlay the supplied fields of `patch` on `current`.
///
/// The generation type is checked first so clearing it is always reported as
/// such, whatever else the patch carries. `updated_at` becomes `at` but never
/// drops below `created_at`.
pub fn apply_patch(
    current: &HoloMember,
    patch: &HoloMemberPatch,
    at: DateTime<Utc>,
) -> Result<HoloMember, MergeError> {
    let mut merged = current.clone();

    match patch.generation {
        None => {}
        Some(None) => return Err(MergeError::EmptyGenerationType),
        Some(Some(g)) => merged.generation = g,
    }

    match &patch.name {
        None => {}
        Some(None) => return Err(MergeError::NullField("name")),
        Some(Some(name)) if name.trim().is_empty() => {
            return Err(MergeError::Invalid {
                field: "name",
                message: "must not be blank".into(),
            })
        }
        Some(Some(name)) => merged.name = name.clone(),
    }

    if let Some(description) = &patch.description {
        merged.description = description.clone().unwrap_or_default();
    }

    match &patch.twitter {
        None => {}
        Some(None) => return Err(MergeError::NullField("twitter")),
        Some(Some(twitter)) => merged.twitter = twitter.clone(),
    }

    match patch.age {
        None => {}
        Some(None) => return Err(MergeError::NullField("age")),
        Some(Some(age)) => {
            merged.age = normalize_age(age).ok_or_else(|| MergeError::Invalid {
                field: "age",
                message: format!("{age} does not fit numeric(10,1)"),
            })?;
        }
    }

    merged.updated_at = at.max(current.created_at);
    Ok(merged)
}
