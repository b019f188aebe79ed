//! Tri-state field for partial updates.
//!
//! A JSON key that is missing and a key explicitly set to `null` mean different
//! things on an update: the first leaves the stored value alone, the second clears it.
//! Use with `#[serde(default)]` so missing keys deserialize to [`Patch::Absent`].

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}
