//! Tolerant decoders for fields that other writers of the session record
//! have been seen to get wrong.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

use super::ids::ItemId;

#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

impl Number {
    #[allow(clippy::cast_possible_truncation)]
    fn into_i64(self) -> Option<i64> {
        let float = match self {
            Number::Int(value) => return Some(value),
            Number::Float(value) => value,
            Number::Text(text) => text.trim().parse::<f64>().ok()?,
            Number::Other(_) => return None,
        };
        if !float.is_finite() || float.abs() >= 9.0e18 {
            return None;
        }
        Some(float.trunc() as i64)
    }
}

/// Epoch milliseconds; anything that is not a finite number decodes to `None`.
pub(crate) fn epoch_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Number::deserialize(deserializer)?.into_i64())
}

/// Non-negative whole minutes; anything else decodes to `None`.
pub(crate) fn minutes<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Number::deserialize(deserializer)?
        .into_i64()
        .and_then(|value| u32::try_from(value).ok()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdList {
    Many(Vec<ItemId>),
    One(String),
}

/// Ordered id list. A bare string is one id (empty means none); `null` is none.
pub(crate) fn id_list<'de, D>(deserializer: D) -> Result<Vec<ItemId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<IdList>::deserialize(deserializer)? {
        Some(IdList::Many(ids)) => ids,
        Some(IdList::One(single)) if single.trim().is_empty() => Vec::new(),
        Some(IdList::One(single)) => vec![ItemId::new(single.trim())],
        None => Vec::new(),
    })
}
