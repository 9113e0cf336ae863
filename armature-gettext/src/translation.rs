//! Translation Strings
//!
//! A [`TranslationString`] names a message to translate: its id, the text
//! to fall back on, its domain and the values to interpolate. It is an
//! immutable value; callers that need its text without translating call
//! [`TranslationString::render`].

use crate::interpolate::interpolate;
use crate::{I18nError, Result};
use std::fmt::Display;

/// Ordered interpolation values, keyed by marker name.
///
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Mapping {
    pairs: Vec<(String, String)>,
}

impl Mapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Display) {
        let key = key.into();
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no names are mapped.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Display> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

impl<K: Into<String>, V: Display, const N: usize> From<[(K, V); N]> for Mapping {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// A message awaiting translation.
///
/// # Example
///
/// ```
/// use armature_gettext::{Mapping, TranslationString};
///
/// let ts = TranslationString::new("add-number")
///     .unwrap()
///     .with_default("Add ${number}")
///     .with_mapping(Mapping::from([("number", 1)]));
///
/// assert_eq!(ts.message_id(), "add-number");
/// assert_eq!(ts.render(), "Add 1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranslationString {
    message_id: String,
    default: Option<String>,
    domain: Option<String>,
    context: Option<String>,
    mapping: Option<Mapping>,
}

impl TranslationString {
    /// Create a translation string; the default text is the message id.
    pub fn new(message_id: impl Into<String>) -> Result<Self> {
        let message_id = message_id.into();
        if message_id.is_empty() {
            return Err(I18nError::InvalidMessageId);
        }
        Ok(Self {
            message_id,
            default: None,
            domain: None,
            context: None,
            mapping: None,
        })
    }

    /// Create a translation string with every optional part given up front.
    pub fn with_parts(
        message_id: impl Into<String>,
        default: Option<String>,
        domain: Option<String>,
        mapping: Option<Mapping>,
    ) -> Result<Self> {
        let mut ts = Self::new(message_id)?;
        ts.default = default;
        ts.domain = domain;
        ts.mapping = mapping;
        Ok(ts)
    }

    /// Set the default text.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the translation domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the message context (`msgctxt`).
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Set the interpolation mapping.
    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Default text, which is the message id unless one was given.
    pub fn default_text(&self) -> &str {
        self.default.as_deref().unwrap_or(&self.message_id)
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn mapping(&self) -> Option<&Mapping> {
        self.mapping.as_ref()
    }

    /// Untranslated text: the default with the mapping applied.
    pub fn render(&self) -> String {
        interpolate(self.default_text(), self.mapping()).into_owned()
    }
}

/// Produces translation strings bound to one domain.
///
/// # Example
///
/// ```
/// use armature_gettext::TranslationStringFactory;
///
/// let shop = TranslationStringFactory::new("shop");
/// let ts = shop.create("cart-title").unwrap();
/// assert_eq!(ts.domain(), Some("shop"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationStringFactory {
    domain: String,
}

impl TranslationStringFactory {
    /// Create a factory for `domain`.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Create a translation string in this factory's domain.
    pub fn create(&self, message_id: impl Into<String>) -> Result<TranslationString> {
        self.create_with(message_id, None, None)
    }

    /// [`TranslationString::with_parts`] with the domain pre-filled.
    pub fn create_with(
        &self,
        message_id: impl Into<String>,
        default: Option<String>,
        mapping: Option<Mapping>,
    ) -> Result<TranslationString> {
        TranslationString::with_parts(message_id, default, Some(self.domain.clone()), mapping)
    }
}
