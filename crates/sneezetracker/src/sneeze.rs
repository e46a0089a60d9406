//! Core sneeze record types.
//!
//! A [`SneezeRecord`] is the only persisted entity. Records are created once
//! through a validated [`NewSneeze`] and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identifier assigned by the store. Never reused.
pub type SneezeId = i64;

/// Sneeze intensity on a 1 to 5 scale.
///
/// The only way to obtain a value is through [`Intensity::new`] (or
/// deserialization, which goes through it), so every `Intensity` in the
/// program is within range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Intensity(u8);

impl Intensity {
    /// Lowest accepted intensity.
    pub const MIN: u8 = 1;
    /// Highest accepted intensity.
    pub const MAX: u8 = 5;

    const LABELS: [&'static str; 5] = ["Tiny", "Small", "Medium", "Big", "Massive"];
    const EMOJIS: [&'static str; 5] = ["🤧", "😤", "🌬️", "💨", "🌪️"];

    /// Create an intensity, rejecting anything outside 1..=5.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIntensity`] if `value` is out of range.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(ValidationError::InvalidIntensity)
    }

    /// The raw 1..=5 value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Human-readable size label ("Tiny" through "Massive").
    #[must_use]
    pub fn label(self) -> &'static str {
        Self::LABELS[usize::from(self.0 - Self::MIN)]
    }

    /// Emoji shown next to the record in listings.
    #[must_use]
    pub fn emoji(self) -> &'static str {
        Self::EMOJIS[usize::from(self.0 - Self::MIN)]
    }
}

impl TryFrom<i64> for Intensity {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Intensity> for u8 {
    fn from(intensity: Intensity) -> Self {
        intensity.0
    }
}

impl std::fmt::Display for Intensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated sneeze, ready for insertion.
///
/// Produced by [`crate::validation::validate`]. `date` is `None` when the
/// caller did not supply one; the store fills in the insertion time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSneeze {
    /// How strong the sneeze was.
    pub intensity: Intensity,
    /// Where it happened; never an empty string.
    pub location: Option<String>,
    /// Free-form notes; never an empty string.
    pub notes: Option<String>,
    /// When it happened, if the caller said so.
    pub date: Option<DateTime<Utc>>,
}

impl NewSneeze {
    /// Create a sneeze with only an intensity set.
    #[must_use]
    pub fn new(intensity: Intensity) -> Self {
        Self {
            intensity,
            location: None,
            notes: None,
            date: None,
        }
    }

    /// Set the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Set the occurrence time.
    #[must_use]
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }
}

/// A stored sneeze event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SneezeRecord {
    /// Store-assigned identifier.
    pub id: SneezeId,
    /// How strong the sneeze was.
    pub intensity: Intensity,
    /// Where it happened.
    pub location: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When it happened.
    pub date: DateTime<Utc>,
    /// When the store created the record.
    pub created_at: DateTime<Utc>,
    /// When the store last wrote the record. Equal to `created_at`.
    pub updated_at: DateTime<Utc>,
}
