//! Message Catalogs
//!
//! A [`MessageCatalog`] holds the translations for one (locale, domain)
//! pair. Catalogs loaded for the same pair are merged: entries from the
//! later catalog replace earlier ones with the same key, all others
//! accumulate.

use crate::error::MEMORY_SOURCE;
use crate::mo::{CONTEXT_SEPARATOR, MoFile};
use crate::plural::PluralForms;
use crate::{I18nError, Result};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashMap;

static DEFAULT_PLURAL_FORMS: Lazy<PluralForms> = Lazy::new(PluralForms::germanic);

/// Build the lookup key for a message id with optional context.
pub fn message_key<'a>(context: Option<&str>, message_id: &'a str) -> Cow<'a, str> {
    match context {
        Some(ctx) => Cow::Owned(format!("{}{}{}", ctx, CONTEXT_SEPARATOR, message_id)),
        None => Cow::Borrowed(message_id),
    }
}

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEntry {
    /// A singular translation
    Text(String),
    /// Ordered plural forms, selected by the catalog's plural rule
    Plural(Vec<String>),
}

/// Plural forms for one message together with the rule selecting among them.
#[derive(Debug, Clone, Copy)]
pub struct PluralSet<'a> {
    /// The translated forms, index 0 first
    pub forms: &'a [String],
    /// Rule mapping a count to a form index
    pub rule: &'a PluralForms,
}

impl<'a> PluralSet<'a> {
    /// Select the form for `n`, or `None` when the rule points past the
    /// available forms.
    pub fn select(&self, n: u64) -> Option<&'a str> {
        self.forms.get(self.rule.index(n)).map(String::as_str)
    }
}

/// Translations for one (locale, domain) pair.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    entries: HashMap<String, CatalogEntry>,
    plural_forms: Option<PluralForms>,
}

impl MessageCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a decoded compiled file.
    ///
    /// Fails if the declared charset is not UTF-8 (or its ASCII subset), the
    /// `Plural-Forms` header is malformed, or a plural entry does not carry
    /// exactly `nplurals` forms.
    pub fn from_mo(file: MoFile) -> Result<Self> {
        if let Some(charset) = file.charset().filter(|cs| !is_utf8_charset(cs)) {
            return Err(I18nError::catalog_load(
                MEMORY_SOURCE,
                format!("unsupported charset {:?}, catalogs must be UTF-8", charset),
            ));
        }

        let plural_forms = file.plural_forms()?;
        let nplurals = plural_forms
            .as_ref()
            .unwrap_or(&*DEFAULT_PLURAL_FORMS)
            .nplurals();

        let mut catalog = Self {
            entries: HashMap::with_capacity(file.messages.len()),
            plural_forms,
        };

        for message in file.messages {
            let key = message_key(message.context.as_deref(), &message.id).into_owned();
            let entry = if message.is_plural() {
                if message.translations.len() != nplurals {
                    return Err(I18nError::catalog_load(
                        MEMORY_SOURCE,
                        format!(
                            "message {:?} has {} plural forms, expected {}",
                            message.id,
                            message.translations.len(),
                            nplurals
                        ),
                    ));
                }
                CatalogEntry::Plural(message.translations)
            } else {
                let mut translations = message.translations;
                CatalogEntry::Text(translations.pop().unwrap_or_default())
            };
            catalog.entries.insert(key, entry);
        }

        Ok(catalog)
    }

    /// Decode a compiled catalog from memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_mo(MoFile::parse(data)?)
    }

    /// Add a singular translation.
    pub fn add(&mut self, message_id: impl Into<String>, translation: impl Into<String>) {
        self.entries
            .insert(message_id.into(), CatalogEntry::Text(translation.into()));
    }

    /// Add plural forms for a message id.
    pub fn add_plural(&mut self, message_id: impl Into<String>, forms: Vec<String>) {
        self.entries
            .insert(message_id.into(), CatalogEntry::Plural(forms));
    }

    /// Declare this catalog's plural rule.
    pub fn set_plural_forms(&mut self, forms: PluralForms) {
        self.plural_forms = Some(forms);
    }

    /// Merge `other` into this catalog. Entries in `other` win; a plural
    /// rule declared by `other` replaces this catalog's rule.
    ///
    /// Every plural entry of the merged result must carry exactly as many
    /// forms as the rule in effect afterwards. If one would not, `other` is
    /// rejected and this catalog is left unchanged.
    pub fn merge(&mut self, other: MessageCatalog) -> Result<()> {
        let nplurals = other
            .plural_forms
            .as_ref()
            .or(self.plural_forms.as_ref())
            .unwrap_or(&*DEFAULT_PLURAL_FORMS)
            .nplurals();

        let kept = self
            .entries
            .iter()
            .filter(|(key, _)| !other.entries.contains_key(*key));
        let mismatch = kept.chain(other.entries.iter()).find_map(|(key, entry)| match entry {
            CatalogEntry::Plural(forms) if forms.len() != nplurals => Some((key, forms.len())),
            _ => None,
        });
        if let Some((key, count)) = mismatch {
            return Err(I18nError::catalog_load(
                MEMORY_SOURCE,
                format!(
                    "message {:?} would have {} plural forms after merge, expected {}",
                    key, count, nplurals
                ),
            ));
        }

        self.entries.extend(other.entries);
        if other.plural_forms.is_some() {
            self.plural_forms = other.plural_forms;
        }
        Ok(())
    }

    /// Look up an entry by message id and optional context.
    pub fn get(&self, context: Option<&str>, message_id: &str) -> Option<&CatalogEntry> {
        self.entries.get(message_key(context, message_id).as_ref())
    }

    /// The plural rule in effect (the germanic default when undeclared).
    pub fn plural_forms(&self) -> &PluralForms {
        self.plural_forms.as_ref().unwrap_or(&*DEFAULT_PLURAL_FORMS)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entry keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}

fn is_utf8_charset(charset: &str) -> bool {
    matches!(
        charset.to_ascii_lowercase().as_str(),
        "utf-8" | "utf8" | "ascii" | "us-ascii"
    )
}
