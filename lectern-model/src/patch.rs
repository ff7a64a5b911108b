//! Helpers for patch fields that map to nullable columns.
//!
//! Such fields are `Option<Option<T>>`: `None` leaves the stored value
//! alone, `Some(None)` clears it and `Some(Some(v))` replaces it.

/// Apply a nullable patch field to `target`.
pub(crate) fn apply_nullable<T: Clone>(
    target: &mut Option<T>,
    change: &Option<Option<T>>,
) {
    if let Some(value) = change {
        *target = value.clone();
    }
}

/// Deserialize a present field, `null` included, as `Some(..)`. Combined
/// with `#[serde(default)]` an absent field stays `None`.
#[cfg(feature = "serde")]
pub(crate) fn nullable<'de, D, T>(
    deserializer: D,
) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
