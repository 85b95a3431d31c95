//! `DataValue`: Nested auxiliary data attached to an item
//!
//! Items carry an arbitrarily nested blob of persisted data (maps, lists and
//! scalars). `DataValue` is the erased form of that blob: every source format
//! (JSON, YAML, a host object model) converts into it, and the
//! [flattener](crate::flatten) only ever sees this type.
//!
//! Maps are stored as ordered entry lists. Source iteration order is part of
//! the contract because downstream searches stop at the first hit.

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use std::fmt;

/// A node in an item's nested data.
///
/// # Display
///
/// `Display` is the generic string conversion used when flattening:
///
/// - `Null` renders as the empty string
/// - floats always carry a fractional part (`7.0`, not `7`)
/// - lists render as `[a, b]` and maps as `{k=v, k2=v2}`
///
/// ```
/// use itemmatch::DataValue;
///
/// assert_eq!(DataValue::Null.to_string(), "");
/// assert_eq!(DataValue::Float(7.0).to_string(), "7.0");
/// assert_eq!(
///     DataValue::List(vec!["a".into(), DataValue::Int(1)]).to_string(),
///     "[a, 1]"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DataValue {
    /// Absent value.
    #[default]
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating point scalar.
    Float(f64),
    /// String scalar.
    String(String),
    /// Ordered sequence.
    List(Vec<DataValue>),
    /// Ordered mapping. Keys keep the order the source produced them in.
    Map(Vec<(String, DataValue)>),
}

impl DataValue {
    /// Returns `true` if this is the `Null` variant.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get the value as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to get the value as an integer.
    ///
    /// Floats are not coerced: `7.0` is not an integer here.
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get the value as a list.
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[DataValue]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Try to get the value as an ordered entry list.
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&[(String, DataValue)]> {
        match self {
            Self::Map(entries) => Some(entries.as_slice()),
            _ => None,
        }
    }

    /// Look up a map entry by key. Returns the first entry with that key.
    ///
    /// Returns `None` for non-map values.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.as_map()?
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Returns a string describing the kind of this value.
    ///
    /// Used in configuration diagnostics (`expected integer, found string`).
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Build a map from `(key, value)` pairs, preserving their order.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<DataValue>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Inner rendering: nulls nested inside a container show as `null`.
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            other => fmt::Display::fmt(other, f),
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            // Debug keeps the fractional part for whole numbers.
            Self::Float(x) => write!(f, "{x:?}"),
            Self::String(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}=")?;
                    v.fmt_nested(f)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for DataValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for DataValue {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for DataValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T> From<Vec<T>> for DataValue
where
    T: Into<DataValue>,
{
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T> From<Option<T>> for DataValue
where
    T: Into<DataValue>,
{
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Deserialization (order-preserving)
// ═══════════════════════════════════════════════════════════════════════════════

impl<'de> Deserialize<'de> for DataValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DataValueVisitor)
    }
}

struct DataValueVisitor;

impl<'de> Visitor<'de> for DataValueVisitor {
    type Value = DataValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any scalar, list or map")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<DataValue, E> {
        Ok(DataValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<DataValue, E> {
        Ok(DataValue::Int(v))
    }

    #[allow(clippy::cast_precision_loss)] // only reached above i64::MAX
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<DataValue, E> {
        Ok(i64::try_from(v).map_or(DataValue::Float(v as f64), DataValue::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<DataValue, E> {
        Ok(DataValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<DataValue, E> {
        Ok(DataValue::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<DataValue, E> {
        Ok(DataValue::String(v))
    }

    fn visit_none<E: de::Error>(self) -> Result<DataValue, E> {
        Ok(DataValue::Null)
    }

    fn visit_unit<E: de::Error>(self) -> Result<DataValue, E> {
        Ok(DataValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<DataValue, D::Error> {
        DataValue::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<DataValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(DataValue::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<DataValue, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        // Non-string keys (YAML allows `0:` or `true:`) use their string conversion.
        while let Some((key, value)) = map.next_entry::<DataValue, DataValue>()? {
            entries.push((key.to_string(), value));
        }
        Ok(DataValue::Map(entries))
    }
}
