// src/common/serde_ext.rs

use serde::{Deserialize, Deserializer};

// Distingue "campo ausente" (None) de "campo = null" (Some(None)) num PATCH.
// Usar junto com #[serde(default, skip_serializing_if = "Option::is_none")].
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// Colunas booleanas com default no banco podem chegar como null
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
