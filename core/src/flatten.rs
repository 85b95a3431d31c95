//! Flattening: nested item data into a flat, ordered `path → value` index
//!
//! Maps are walked depth-first; each ancestor key joins the path with `.`.
//! Lists are leaves: their elements are rendered with the generic string
//! conversion and joined with `,` (lists are never indexed). Scalars are
//! stored as their string conversion.
//!
//! One path may additionally be singled out as the *fallback blob*: the first
//! path whose lower-cased form ends in [`FALLBACK_SUFFIX`]. Hosts serialize
//! opaque component data there, so it serves as a last-resort search surface
//! when structured lookups fail.

use crate::criteria::EntryPattern;
use crate::{DataValue, Glob, FALLBACK_SUFFIX};
use indexmap::IndexMap;
use std::sync::OnceLock;
use tracing::trace;

/// The flattened form of an item's nested data.
///
/// Paths keep traversal order. A repeated path overwrites its value in place
/// and keeps its first position.
///
/// # Example
///
/// ```
/// use itemmatch::{flatten, DataValue};
///
/// let data = DataValue::map([(
///     "tag",
///     DataValue::map([("level", DataValue::Int(5)), ("lore", vec!["a", "b"].into())]),
/// )]);
///
/// let record = flatten(&data);
/// assert_eq!(record.get("tag.level"), Some("5"));
/// assert_eq!(record.get("tag.lore"), Some("a,b"));
/// assert_eq!(record.fallback(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlatRecord {
    entries: IndexMap<String, String>,
    fallback: Option<usize>,
    /// Lower-cased paths and blob, built on the first tag lookup.
    folded: OnceLock<Folded>,
}

#[derive(Debug, Clone, Default)]
struct Folded {
    paths: Vec<String>,
    fallback: Option<String>,
}

/// Flatten nested data into a [`FlatRecord`].
///
/// Deterministic: the same input always produces the same paths, in the same
/// order, with the same values.
#[must_use]
pub fn flatten(value: &DataValue) -> FlatRecord {
    let mut entries = IndexMap::new();
    visit(&mut entries, String::new(), value);
    let fallback = entries
        .keys()
        .position(|path| path.to_lowercase().ends_with(FALLBACK_SUFFIX));
    FlatRecord {
        entries,
        fallback,
        folded: OnceLock::new(),
    }
}

fn visit(entries: &mut IndexMap<String, String>, path: String, value: &DataValue) {
    match value {
        DataValue::Map(children) => {
            for (key, child) in children {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                visit(entries, child_path, child);
            }
        }
        DataValue::List(items) => {
            let joined = items
                .iter()
                .map(DataValue::to_string)
                .collect::<Vec<_>>()
                .join(",");
            entries.insert(path, joined);
        }
        scalar => {
            entries.insert(path, scalar.to_string());
        }
    }
}

impl FlatRecord {
    /// An empty record: no entries, no fallback blob.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Iterate `(path, value)` pairs in traversal order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    /// Iterate paths in traversal order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate values in traversal order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    /// Look up the value stored at an exact path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// The fallback blob, if any path ends in [`FALLBACK_SUFFIX`].
    #[must_use]
    pub fn fallback(&self) -> Option<&str> {
        self.fallback_entry().map(|(_, blob)| blob)
    }

    /// Path of the fallback blob.
    #[must_use]
    pub fn fallback_path(&self) -> Option<&str> {
        self.fallback_entry().map(|(path, _)| path)
    }

    fn fallback_entry(&self) -> Option<(&str, &str)> {
        let (path, blob) = self.entries.get_index(self.fallback?)?;
        Some((path.as_str(), blob.as_str()))
    }

    /// Number of flattened entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Does `glob` match any flattened value, or failing that, the fallback blob?
    #[must_use]
    pub fn any_value_matches(&self, glob: &Glob) -> bool {
        if self.values().any(|v| glob.matches(v)) {
            return true;
        }
        self.fallback().is_some_and(|blob| glob.matches(blob))
    }

    /// Entry search: a structured `key=value` hit, or a fallback-blob hit.
    ///
    /// 1. The first path matched by the key pattern whose value is matched by
    ///    the value pattern wins.
    /// 2. Otherwise the key pattern, stripped of `*`, is located
    ///    case-insensitively in the fallback blob, and `*<value>*` is tested
    ///    against the blob from that point on.
    #[must_use]
    pub fn contains_entry(&self, pattern: &EntryPattern) -> bool {
        let structured = self
            .entries()
            .filter(|(path, _)| pattern.key.matches(path))
            .any(|(_, value)| pattern.value.matches(value));
        if structured {
            return true;
        }

        let Some(blob) = self.fallback() else {
            return false;
        };
        let Some(start) = find_ignore_case(blob, &pattern.plain_key) else {
            return false;
        };
        let matched = pattern.wrapped_value.matches(&blob[start..]);
        trace!(
            key = %pattern.key,
            value = %pattern.value,
            offset = start,
            matched,
            "entry search fell back to blob"
        );
        matched
    }

    /// Tag presence: does any path, or the fallback blob, contain `needle`?
    ///
    /// `needle` must already be lower-cased. This is a plain substring test,
    /// not a glob.
    #[must_use]
    pub fn has_tag(&self, needle: &str) -> bool {
        let folded = self.folded();
        folded.paths.iter().any(|p| p.contains(needle))
            || folded
                .fallback
                .as_deref()
                .is_some_and(|blob| blob.contains(needle))
    }

    fn folded(&self) -> &Folded {
        self.folded.get_or_init(|| Folded {
            paths: self.paths().map(str::to_lowercase).collect(),
            fallback: self.fallback().map(str::to_lowercase),
        })
    }
}

/// Records compare by entries in order; the lower-cased cache is ignored.
impl PartialEq for FlatRecord {
    fn eq(&self, other: &Self) -> bool {
        self.fallback == other.fallback && self.entries.iter().eq(other.entries.iter())
    }
}

impl Eq for FlatRecord {}

/// Byte offset of the first case-insensitive occurrence of `needle_lower`.
///
/// Offsets are taken on `haystack` itself (not on a lower-cased copy) so the
/// slice that follows is always on a char boundary.
fn find_ignore_case(haystack: &str, needle_lower: &str) -> Option<usize> {
    haystack
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(haystack.len()))
        .find(|&i| starts_with_ignore_case(&haystack[i..], needle_lower))
}

fn starts_with_ignore_case(s: &str, needle_lower: &str) -> bool {
    let mut folded = s.chars().flat_map(char::to_lowercase);
    needle_lower.chars().all(|n| folded.next() == Some(n))
}
