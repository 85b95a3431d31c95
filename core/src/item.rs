//! Items: the subject of matching
//!
//! [`ItemView`] is the seam between a host object model and the matcher: it
//! exposes the four fields criteria look at. Fields the host cannot resolve
//! are reported as `None`, never as errors.
//!
//! [`Item`] is the owned implementation, built once per match attempt (or
//! deserialized from a file) and immutable while it is evaluated.

use crate::DataValue;
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt::Debug;

/// Read access to the fields criteria are evaluated against.
///
/// # Example
///
/// ```
/// use std::borrow::Cow;
/// use itemmatch::{DataValue, ItemView};
///
/// #[derive(Debug)]
/// struct Slot { material: &'static str }
///
/// impl ItemView for Slot {
///     fn identifier(&self) -> Option<Cow<'_, str>> { Some(Cow::Borrowed(self.material)) }
///     fn display_name(&self) -> Option<String> { None }
///     fn numeric_tag(&self) -> Option<&[f32]> { None }
///     fn raw_data(&self) -> Option<&DataValue> { None }
/// }
///
/// assert_eq!(Slot { material: "STONE" }.identifier().as_deref(), Some("STONE"));
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `ItemView`",
    label = "this type cannot be matched against criteria",
    note = "implement `ItemView` for your host item type, or build an `itemmatch::Item`"
)]
pub trait ItemView: Debug {
    /// The item's type identifier (e.g. a material name).
    fn identifier(&self) -> Option<Cow<'_, str>>;

    /// The display name rendered to plain text.
    fn display_name(&self) -> Option<String>;

    /// Custom model data floats. Only the first element is compared.
    fn numeric_tag(&self) -> Option<&[f32]>;

    /// All persisted auxiliary data, nested.
    fn raw_data(&self) -> Option<&DataValue>;
}

impl<T: ItemView + ?Sized> ItemView for &T {
    fn identifier(&self) -> Option<Cow<'_, str>> {
        (**self).identifier()
    }

    fn display_name(&self) -> Option<String> {
        (**self).display_name()
    }

    fn numeric_tag(&self) -> Option<&[f32]> {
        (**self).numeric_tag()
    }

    fn raw_data(&self) -> Option<&DataValue> {
        (**self).raw_data()
    }
}

/// Rich text that can be rendered to plain text.
pub trait PlainText {
    /// Render to plain text, dropping all styling.
    fn to_plain_text(&self) -> String;
}

impl PlainText for str {
    fn to_plain_text(&self) -> String {
        self.to_owned()
    }
}

impl PlainText for String {
    fn to_plain_text(&self) -> String {
        self.clone()
    }
}

/// A minimal rich text tree: a text run plus ordered children.
///
/// Renders depth-first by concatenation, the way chat components flatten to
/// plain text. Styling is carried by hosts and never reaches the matcher.
///
/// Deserializes from either a bare string or `{ text, extra }`.
///
/// ```
/// use itemmatch::{PlainText, TextComponent};
///
/// let name = TextComponent::new("Blade of ")
///     .with_child(TextComponent::new("Fire"));
/// assert_eq!(name.to_plain_text(), "Blade of Fire");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "TextSource")]
pub struct TextComponent {
    text: String,
    extra: Vec<TextComponent>,
}

impl TextComponent {
    /// A component with a single text run.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: Vec::new(),
        }
    }

    /// Append a child component (builder pattern).
    #[must_use]
    pub fn with_child(mut self, child: TextComponent) -> Self {
        self.extra.push(child);
        self
    }

    /// Returns `true` if the component renders to an empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.extra.iter().all(TextComponent::is_empty)
    }

    fn render_into(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.extra {
            child.render_into(out);
        }
    }
}

impl PlainText for TextComponent {
    fn to_plain_text(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }
}

impl From<&str> for TextComponent {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for TextComponent {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextSource {
    Plain(String),
    Tree {
        #[serde(default)]
        text: String,
        #[serde(default)]
        extra: Vec<TextComponent>,
    },
}

impl From<TextSource> for TextComponent {
    fn from(source: TextSource) -> Self {
        match source {
            TextSource::Plain(text) => Self::new(text),
            TextSource::Tree { text, extra } => Self { text, extra },
        }
    }
}

/// An owned item snapshot.
///
/// # Example
///
/// ```
/// use itemmatch::{DataValue, Item, ItemView};
///
/// let item = Item::new("DIAMOND_SWORD")
///     .with_display_name("Excalibur")
///     .with_numeric_tag(vec![7.9])
///     .with_raw_data(DataValue::map([("tag", DataValue::map([("level", 5_i64)]))]));
///
/// assert_eq!(item.identifier().as_deref(), Some("DIAMOND_SWORD"));
/// assert_eq!(item.display_name().as_deref(), Some("Excalibur"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Item {
    #[serde(alias = "material", alias = "type")]
    identifier: Option<String>,
    #[serde(alias = "name")]
    display_name: Option<TextComponent>,
    #[serde(alias = "custom-model-data")]
    numeric_tag: Option<Vec<f32>>,
    #[serde(alias = "data", alias = "nbt")]
    raw_data: Option<DataValue>,
}

impl Item {
    /// Create an item with the given identifier and no other fields.
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            ..Self::default()
        }
    }

    /// Create an item whose identifier could not be resolved.
    #[must_use]
    pub fn unidentified() -> Self {
        Self::default()
    }

    /// Set the display name (builder pattern).
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<TextComponent>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the custom model data floats (builder pattern).
    #[must_use]
    pub fn with_numeric_tag(mut self, floats: Vec<f32>) -> Self {
        self.numeric_tag = Some(floats);
        self
    }

    /// Set the nested auxiliary data (builder pattern).
    #[must_use]
    pub fn with_raw_data(mut self, data: DataValue) -> Self {
        self.raw_data = Some(data);
        self
    }
}

impl ItemView for Item {
    fn identifier(&self) -> Option<Cow<'_, str>> {
        self.identifier.as_deref().map(Cow::Borrowed)
    }

    fn display_name(&self) -> Option<String> {
        self.display_name
            .as_ref()
            .filter(|name| !name.is_empty())
            .map(PlainText::to_plain_text)
    }

    fn numeric_tag(&self) -> Option<&[f32]> {
        self.numeric_tag.as_deref()
    }

    fn raw_data(&self) -> Option<&DataValue> {
        self.raw_data.as_ref()
    }
}
