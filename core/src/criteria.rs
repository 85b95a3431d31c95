//! Criteria: the compiled form of a user's match rules
//!
//! Users write criteria as a loosely-typed mapping (usually YAML):
//!
//! ```yaml
//! material: diamond_*
//! name: "*Excalibur*"
//! custom-model-data: 7
//! nbt-value:
//!   "tag.level": "5"
//!   "owner*": "abc*"
//! nbt-tags: [enchant]
//! ```
//!
//! [`Criteria::from_value`] settles every value's type once, producing a
//! closed set of tagged variants. Evaluation never inspects raw config again.
//!
//! | Key | Aliases | Accepted value |
//! |-----|---------|----------------|
//! | `material` | `type` | string (glob) |
//! | `name` | | string (glob) |
//! | `custom-model-data` | | 32-bit integer |
//! | `nbt-value` | `nbt` | string (glob or `key=value`) or mapping |
//! | `nbt-tags` | | non-empty list (feature `nbt-tags`) |

use crate::{CriteriaError, DataValue, Glob};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, warn};

pub(crate) const MATERIAL: &str = "material";
pub(crate) const NAME: &str = "name";
pub(crate) const CUSTOM_MODEL_DATA: &str = "custom-model-data";
pub(crate) const NBT_VALUE: &str = "nbt-value";
#[cfg(feature = "nbt-tags")]
pub(crate) const NBT_TAGS: &str = "nbt-tags";

const MATERIAL_KEYS: &[&str] = &[MATERIAL, "type"];
const NBT_VALUE_KEYS: &[&str] = &[NBT_VALUE, "nbt"];

/// Keys this build understands. Anything else is ignored.
fn is_recognized(key: &str) -> bool {
    #[cfg(feature = "nbt-tags")]
    if key == NBT_TAGS {
        return true;
    }
    MATERIAL_KEYS.contains(&key)
        || NBT_VALUE_KEYS.contains(&key)
        || key == NAME
        || key == CUSTOM_MODEL_DATA
}

/// How malformed criteria are handled at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Drop the malformed criterion, log a warning and keep a diagnostic.
    /// At evaluation time the criterion behaves as if it were never written.
    #[default]
    Lenient,
    /// Fail compilation on the first malformed criterion.
    Strict,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Entry patterns
// ═══════════════════════════════════════════════════════════════════════════════

/// A `key=value` constraint against flattened item data.
///
/// All derived forms used by entry search are prepared up front:
///
/// - `key` / `value`: globs for structured paths and values
/// - `wrapped_value`: `*<value>*`, tested against the fallback blob
/// - `plain_key`: the key with every `*` removed, lower-cased, located in the
///   fallback blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPattern {
    pub(crate) key: Glob,
    pub(crate) value: Glob,
    pub(crate) wrapped_value: Glob,
    pub(crate) plain_key: String,
}

impl EntryPattern {
    /// Compile a key pattern and a value pattern.
    ///
    /// # Errors
    ///
    /// Returns a [`CriteriaError`] if either pattern is too long.
    pub fn new(key: &str, value: &str) -> Result<Self, CriteriaError> {
        Ok(Self {
            key: Glob::new(key)?,
            value: Glob::new(value)?,
            wrapped_value: Glob::wrapped(value)?,
            plain_key: key
                .chars()
                .filter(|&c| c != '*')
                .flat_map(char::to_lowercase)
                .collect(),
        })
    }

    /// The key pattern as written.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// The value pattern as written.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_str()
    }
}

impl fmt::Display for EntryPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// The compiled `nbt-value` criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NbtValue {
    /// A bare glob: matches if any flattened value (or the fallback blob)
    /// matches.
    Value(Glob),
    /// `key=value` constraints; every entry must be found.
    Entries(Vec<EntryPattern>),
}

impl NbtValue {
    /// Compile the string form: `key=value` (split at the first `=`) or a
    /// bare glob.
    ///
    /// # Errors
    ///
    /// Returns a [`CriteriaError`] if a pattern is too long.
    pub fn parse(input: &str) -> Result<Self, CriteriaError> {
        match input.split_once('=') {
            Some((key, value)) => Ok(Self::Entries(vec![EntryPattern::new(key, value)?])),
            None => Ok(Self::Value(Glob::new(input)?)),
        }
    }
}

impl fmt::Display for NbtValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(glob) => write!(f, "{glob}"),
            Self::Entries(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{entry}")?;
                }
                Ok(())
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Criteria
// ═══════════════════════════════════════════════════════════════════════════════

/// A compiled criteria set.
///
/// All fields are optional. Omitted criteria are not counted.
/// Evaluation: see [`Criteria::evaluate`].
///
/// # Example
///
/// ```
/// use itemmatch::{Criteria, DataValue, Strictness};
///
/// let source: DataValue = serde_yaml::from_str("material: stone\ncustom-model-data: 7").unwrap();
/// let criteria = Criteria::from_value(&source, Strictness::Strict).unwrap();
/// assert_eq!(criteria.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "DataValue")]
pub struct Criteria {
    pub(crate) identifier: Option<Glob>,
    pub(crate) name: Option<Glob>,
    pub(crate) custom_model_data: Option<i32>,
    pub(crate) nbt_value: Option<NbtValue>,
    #[cfg(feature = "nbt-tags")]
    pub(crate) nbt_tags: Option<Vec<String>>,
    diagnostics: Vec<CriteriaError>,
}

impl Criteria {
    /// Criteria with nothing in them. Matches every item.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start building criteria programmatically.
    #[must_use]
    pub fn builder() -> CriteriaBuilder {
        CriteriaBuilder::default()
    }

    /// Compile a criteria mapping.
    ///
    /// `Null` is accepted as an empty mapping. For aliased keys the first
    /// present key wins (`material` before `type`, `nbt-value` before `nbt`);
    /// an explicit `null` counts as absent and hides the later aliases.
    ///
    /// # Errors
    ///
    /// - [`CriteriaError::NotAMapping`] if `source` is neither a map nor null,
    ///   regardless of strictness.
    /// - With [`Strictness::Strict`], the first malformed criterion.
    pub fn from_value(source: &DataValue, strictness: Strictness) -> Result<Self, CriteriaError> {
        let entries = match source {
            DataValue::Map(entries) => entries.as_slice(),
            DataValue::Null => &[][..],
            other => {
                return Err(CriteriaError::NotAMapping {
                    found: other.type_name(),
                })
            }
        };

        for (key, _) in entries {
            if !is_recognized(key) {
                debug!(key = %key, "ignoring unrecognized criterion");
            }
        }

        let mut compiler = Compiler {
            entries,
            strictness,
            diagnostics: Vec::new(),
        };

        let identifier = compiler.field(MATERIAL_KEYS, compile_glob)?;
        let name = compiler.field(&[NAME], compile_glob)?;
        let custom_model_data = compiler.field(&[CUSTOM_MODEL_DATA], compile_model_data)?;
        let nbt_value = compiler.field(NBT_VALUE_KEYS, compile_nbt_value)?;
        #[cfg(feature = "nbt-tags")]
        let nbt_tags = compiler.field(&[NBT_TAGS], compile_nbt_tags)?;

        Ok(Self {
            identifier,
            name,
            custom_model_data,
            nbt_value,
            #[cfg(feature = "nbt-tags")]
            nbt_tags,
            diagnostics: compiler.diagnostics,
        })
    }

    /// Problems found while compiling in lenient mode.
    ///
    /// Each diagnostic corresponds to one dropped criterion.
    #[must_use]
    pub fn diagnostics(&self) -> &[CriteriaError] {
        &self.diagnostics
    }

    /// Number of criteria present (the required count for any item).
    #[must_use]
    pub fn len(&self) -> usize {
        let count = usize::from(self.identifier.is_some())
            + usize::from(self.name.is_some())
            + usize::from(self.custom_model_data.is_some())
            + usize::from(self.nbt_value.is_some());
        #[cfg(feature = "nbt-tags")]
        let count = count + usize::from(self.nbt_tags.is_some());
        count
    }

    /// Returns `true` if no criterion is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The identifier glob (`material` / `type`).
    #[must_use]
    pub fn identifier(&self) -> Option<&Glob> {
        self.identifier.as_ref()
    }

    /// The display name glob.
    #[must_use]
    pub fn name(&self) -> Option<&Glob> {
        self.name.as_ref()
    }

    /// The expected custom model data.
    #[must_use]
    pub fn custom_model_data(&self) -> Option<i32> {
        self.custom_model_data
    }

    /// The nested-data value criterion.
    #[must_use]
    pub fn nbt_value(&self) -> Option<&NbtValue> {
        self.nbt_value.as_ref()
    }

    /// The tag-presence needles, lower-cased, blanks removed.
    #[cfg(feature = "nbt-tags")]
    #[must_use]
    pub fn nbt_tags(&self) -> Option<&[String]> {
        self.nbt_tags.as_deref()
    }

    /// Does any criterion need the flattened item data?
    pub(crate) fn needs_record(&self) -> bool {
        #[cfg(feature = "nbt-tags")]
        if self.nbt_tags.is_some() {
            return true;
        }
        self.nbt_value.is_some()
    }
}

impl TryFrom<DataValue> for Criteria {
    type Error = CriteriaError;

    fn try_from(source: DataValue) -> Result<Self, Self::Error> {
        Self::from_value(&source, Strictness::Lenient)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Compilation
// ═══════════════════════════════════════════════════════════════════════════════

struct Compiler<'a> {
    entries: &'a [(String, DataValue)],
    strictness: Strictness,
    diagnostics: Vec<CriteriaError>,
}

impl<'a> Compiler<'a> {
    /// Resolve the first present key among `keys`, even if null, and compile
    /// its value.
    ///
    /// `Ok(None)` means absent, or malformed and dropped (lenient mode).
    fn field<T>(
        &mut self,
        keys: &[&'static str],
        compile: impl FnOnce(&'static str, &DataValue) -> Result<T, CriteriaError>,
    ) -> Result<Option<T>, CriteriaError> {
        let Some((key, value)) = keys
            .iter()
            .find_map(|&key| self.lookup(key).map(|v| (key, v)))
        else {
            return Ok(None);
        };
        // A present null is absent; later aliases are not consulted.
        if value.is_null() {
            return Ok(None);
        }

        match compile(key, value) {
            Ok(compiled) => Ok(Some(compiled)),
            Err(e) if self.strictness == Strictness::Lenient => {
                warn!(criterion = key, error = %e, "dropping malformed criterion");
                self.diagnostics.push(e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn lookup(&self, key: &str) -> Option<&'a DataValue> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }
}

fn wrong_type(criterion: &'static str, expected: &'static str, found: &DataValue) -> CriteriaError {
    CriteriaError::WrongType {
        criterion,
        expected,
        found: found.type_name(),
    }
}

fn compile_glob(key: &'static str, value: &DataValue) -> Result<Glob, CriteriaError> {
    let pattern = value
        .as_str()
        .ok_or_else(|| wrong_type(key, "string", value))?;
    Glob::new(pattern)
}

fn compile_model_data(key: &'static str, value: &DataValue) -> Result<i32, CriteriaError> {
    value
        .as_int()
        .and_then(|i| i32::try_from(i).ok())
        .ok_or_else(|| wrong_type(key, "32-bit integer", value))
}

fn compile_nbt_value(key: &'static str, value: &DataValue) -> Result<NbtValue, CriteriaError> {
    match value {
        DataValue::String(input) => NbtValue::parse(input),
        DataValue::Map(entries) => entries
            .iter()
            .map(|(k, v)| EntryPattern::new(k, &v.to_string()))
            .collect::<Result<Vec<_>, _>>()
            .map(NbtValue::Entries),
        other => Err(wrong_type(key, "string or mapping", other)),
    }
}

#[cfg(feature = "nbt-tags")]
fn compile_nbt_tags(key: &'static str, value: &DataValue) -> Result<Vec<String>, CriteriaError> {
    let items = value
        .as_list()
        .ok_or_else(|| wrong_type(key, "list of strings", value))?;
    if items.is_empty() {
        return Err(CriteriaError::EmptyList { criterion: key });
    }
    // Non-string and blank entries are skipped, not rejected.
    Ok(items
        .iter()
        .filter_map(DataValue::as_str)
        .filter(|tag| !tag.trim().is_empty())
        .map(str::to_lowercase)
        .collect())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Programmatic construction of [`Criteria`].
///
/// Values follow the same rules as the mapping form; patterns are compiled in
/// [`build`](CriteriaBuilder::build).
///
/// ```
/// use itemmatch::Criteria;
///
/// let criteria = Criteria::builder()
///     .material("*_sword")
///     .nbt_entry("owner*", "abc*")
///     .build()
///     .unwrap();
/// assert_eq!(criteria.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CriteriaBuilder {
    material: Option<String>,
    name: Option<String>,
    custom_model_data: Option<i32>,
    nbt_value: Option<String>,
    nbt_entries: Vec<(String, String)>,
    #[cfg(feature = "nbt-tags")]
    nbt_tags: Option<Vec<String>>,
}

impl CriteriaBuilder {
    /// Identifier glob.
    #[must_use]
    pub fn material(mut self, pattern: impl Into<String>) -> Self {
        self.material = Some(pattern.into());
        self
    }

    /// Display name glob.
    #[must_use]
    pub fn name(mut self, pattern: impl Into<String>) -> Self {
        self.name = Some(pattern.into());
        self
    }

    /// Expected custom model data.
    #[must_use]
    pub fn custom_model_data(mut self, value: i32) -> Self {
        self.custom_model_data = Some(value);
        self
    }

    /// String-form `nbt-value`: a bare glob, or `key=value`.
    ///
    /// Replaces any entries added with [`nbt_entry`](Self::nbt_entry).
    #[must_use]
    pub fn nbt_value(mut self, input: impl Into<String>) -> Self {
        self.nbt_value = Some(input.into());
        self.nbt_entries.clear();
        self
    }

    /// Add one mapping-form `nbt-value` entry.
    ///
    /// Replaces a string-form value set with [`nbt_value`](Self::nbt_value).
    #[must_use]
    pub fn nbt_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.nbt_value = None;
        self.nbt_entries.push((key.into(), value.into()));
        self
    }

    /// Tag-presence needles.
    #[cfg(feature = "nbt-tags")]
    #[must_use]
    pub fn nbt_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nbt_tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Compile into [`Criteria`].
    ///
    /// # Errors
    ///
    /// Returns a [`CriteriaError`] if a pattern is too long, or if
    /// `nbt_tags` was given an empty list.
    pub fn build(self) -> Result<Criteria, CriteriaError> {
        let nbt_value = match (self.nbt_value, self.nbt_entries.is_empty()) {
            (Some(input), _) => Some(NbtValue::parse(&input)?),
            (None, false) => Some(NbtValue::Entries(
                self.nbt_entries
                    .iter()
                    .map(|(k, v)| EntryPattern::new(k, v))
                    .collect::<Result<_, _>>()?,
            )),
            (None, true) => None,
        };

        #[cfg(feature = "nbt-tags")]
        let nbt_tags = self
            .nbt_tags
            .map(|tags| compile_nbt_tags(NBT_TAGS, &DataValue::from(tags)))
            .transpose()?;

        Ok(Criteria {
            identifier: self.material.map(Glob::new).transpose()?,
            name: self.name.map(Glob::new).transpose()?,
            custom_model_data: self.custom_model_data,
            nbt_value,
            #[cfg(feature = "nbt-tags")]
            nbt_tags,
            diagnostics: Vec::new(),
        })
    }
}
