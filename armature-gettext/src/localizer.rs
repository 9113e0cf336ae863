//! Localizers
//!
//! A [`Localizer`] translates and pluralizes for one locale against a
//! shared [`CatalogStore`]. [`I18n`] ties the pieces together: it owns the
//! hot-swappable store, the default locale name and the negotiation
//! strategy, and hands out one cached localizer per locale name.

use crate::catalog::PluralSet;
use crate::config::I18nConfig;
use crate::interpolate::interpolate;
use crate::negotiator::{
    DefaultLocaleNegotiator, FALLBACK_LOCALE_NAME, LocaleNegotiator, RequestContext,
    negotiate_locale_name,
};
use crate::store::{CatalogStore, Lookup, SharedCatalogs};
use crate::translation::{Mapping, TranslationString};
use crate::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Input to [`Localizer::translate`]: plain text or a translation string.
#[derive(Debug, Clone, Copy)]
pub enum Translatable<'a> {
    /// Text that is passed through untranslated
    Text(&'a str),
    /// A message to look up
    String(&'a TranslationString),
}

impl Translatable<'_> {
    /// The catalog key this input stands for.
    fn message_id(&self) -> &str {
        match self {
            Translatable::Text(text) => text,
            Translatable::String(ts) => ts.message_id(),
        }
    }

    /// The text used when no catalog entry exists.
    fn fallback_text(&self) -> &str {
        match self {
            Translatable::Text(text) => text,
            Translatable::String(ts) => ts.default_text(),
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Translatable::Text(_) => None,
            Translatable::String(ts) => ts.context(),
        }
    }
}

impl<'a> From<&'a str> for Translatable<'a> {
    fn from(text: &'a str) -> Self {
        Translatable::Text(text)
    }
}

impl<'a> From<&'a String> for Translatable<'a> {
    fn from(text: &'a String) -> Self {
        Translatable::Text(text)
    }
}

impl<'a> From<&'a TranslationString> for Translatable<'a> {
    fn from(ts: &'a TranslationString) -> Self {
        Translatable::String(ts)
    }
}

/// Locale names consulted for `locale_name`, most specific first:
/// `de_CH` yields `["de_CH", "de"]`.
///
/// A `-` separator is accepted as well, since negotiated names often arrive
/// in BCP 47 form from `Accept-Language` or a query parameter: `de-AT`
/// yields `["de-AT", "de"]`.
pub fn locale_chain(locale_name: &str) -> Vec<String> {
    let mut chain = vec![locale_name.to_string()];
    if let Some((language, _)) = locale_name.split_once(['_', '-']) {
        if !language.is_empty() {
            chain.push(language.to_string());
        }
    }
    chain
}

/// Translation facade for a single locale.
#[derive(Clone)]
pub struct Localizer {
    locale_name: String,
    chain: Vec<String>,
    store: Arc<CatalogStore>,
}

impl fmt::Debug for Localizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Localizer")
            .field("locale_name", &self.locale_name)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

impl Localizer {
    /// Create a localizer for `locale_name` over a shared store.
    pub fn new(locale_name: impl Into<String>, store: Arc<CatalogStore>) -> Self {
        let locale_name = locale_name.into();
        Self {
            chain: locale_chain(&locale_name),
            locale_name,
            store,
        }
    }

    /// The locale this localizer was created for.
    pub fn locale_name(&self) -> &str {
        &self.locale_name
    }

    /// The store this localizer reads from.
    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    fn lookup(&self, domain: Option<&str>, context: Option<&str>, message_id: &str) -> Lookup<'_> {
        self.chain
            .iter()
            .map(|locale| self.store.lookup_in_context(locale, domain, context, message_id))
            .find(Lookup::is_found)
            .unwrap_or(Lookup::NotFound)
    }

    /// Translate plain text or a translation string.
    ///
    /// Plain text is returned unchanged. A translation string is looked up
    /// in its domain; when nothing is found its default text is used. Either
    /// way its mapping is interpolated. Never fails.
    ///
    /// # Example
    ///
    /// ```
    /// use armature_gettext::{CatalogStore, Localizer, Mapping, TranslationString};
    /// use std::sync::Arc;
    ///
    /// let localizer = Localizer::new("de", Arc::new(CatalogStore::new()));
    /// let ts = TranslationString::new("add-number")
    ///     .unwrap()
    ///     .with_default("Add ${number}")
    ///     .with_mapping(Mapping::from([("number", 1)]));
    ///
    /// assert_eq!(localizer.translate(&ts), "Add 1");
    /// assert_eq!(localizer.translate("plain ${x}"), "plain ${x}");
    /// ```
    pub fn translate<'a>(&self, input: impl Into<Translatable<'a>>) -> String {
        let ts = match input.into() {
            Translatable::Text(text) => return text.to_string(),
            Translatable::String(ts) => ts,
        };

        let template = match self.lookup(ts.domain(), ts.context(), ts.message_id()) {
            Lookup::Text(text) => text,
            // a plural entry translated without a count uses its first form
            Lookup::Plural(PluralSet { forms, .. }) if !forms.is_empty() => forms[0].as_str(),
            _ => {
                trace!(
                    locale = %self.locale_name,
                    domain = ts.domain(),
                    message_id = ts.message_id(),
                    "no translation, using default"
                );
                ts.default_text()
            }
        };

        interpolate(template, ts.mapping()).into_owned()
    }

    /// Choose the singular or a plural form for `n`.
    ///
    /// The catalog entry is keyed by the singular's message id. When it has
    /// plural forms, the catalog's plural rule selects one; otherwise
    /// `singular` is used for `n == 1` and `plural` for everything else.
    ///
    /// `domain` and `mapping` are taken from the arguments only: the domain
    /// and mapping of a translation string passed as `singular` are ignored.
    pub fn pluralize<'a, 'b>(
        &self,
        singular: impl Into<Translatable<'a>>,
        plural: impl Into<Translatable<'b>>,
        n: u64,
        domain: Option<&str>,
        mapping: Option<&Mapping>,
    ) -> String {
        let singular = singular.into();
        let plural = plural.into();

        let selected = match self.lookup(domain, singular.context(), singular.message_id()) {
            Lookup::Plural(set) => set.select(n),
            _ => None,
        };

        let template = selected.unwrap_or_else(|| {
            if n == 1 {
                singular.fallback_text()
            } else {
                plural.fallback_text()
            }
        });

        interpolate(template, mapping).into_owned()
    }
}

/// Application-wide i18n state.
///
/// Cheap to clone; clones share the store, the negotiator and the
/// localizer cache.
#[derive(Clone)]
pub struct I18n {
    catalogs: SharedCatalogs,
    default_locale_name: String,
    negotiator: Arc<dyn LocaleNegotiator>,
    localizers: Arc<RwLock<HashMap<String, Arc<Localizer>>>>,
}

impl fmt::Debug for I18n {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("I18n")
            .field("default_locale_name", &self.default_locale_name)
            .field("cached_localizers", &self.localizers.read().len())
            .finish_non_exhaustive()
    }
}

impl I18n {
    /// Create over a built store with the default negotiator and `en`.
    pub fn new(store: CatalogStore) -> Self {
        Self {
            catalogs: SharedCatalogs::new(store),
            default_locale_name: FALLBACK_LOCALE_NAME.to_string(),
            negotiator: Arc::new(DefaultLocaleNegotiator),
            localizers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Load every configured translation directory.
    pub fn from_config(config: &I18nConfig) -> Result<Self> {
        let store = config.build_store()?;
        Ok(Self::new(store).with_default_locale_name(config.default_locale_name.clone()))
    }

    /// Set the locale used when negotiation yields nothing.
    pub fn with_default_locale_name(mut self, locale_name: impl Into<String>) -> Self {
        let locale_name = locale_name.into();
        self.default_locale_name = if locale_name.is_empty() {
            FALLBACK_LOCALE_NAME.to_string()
        } else {
            locale_name
        };
        self
    }

    /// Replace the negotiation strategy.
    pub fn with_negotiator(mut self, negotiator: impl LocaleNegotiator + 'static) -> Self {
        self.negotiator = Arc::new(negotiator);
        self
    }

    /// Locale used when negotiation yields nothing.
    pub fn default_locale_name(&self) -> &str {
        &self.default_locale_name
    }

    /// The active negotiation strategy.
    pub fn negotiator(&self) -> &dyn LocaleNegotiator {
        self.negotiator.as_ref()
    }

    /// Current store snapshot.
    pub fn catalogs(&self) -> Arc<CatalogStore> {
        self.catalogs.snapshot()
    }

    /// Negotiate a locale name for a request, falling back to the default.
    pub fn negotiate_locale_name(&self, request: &dyn RequestContext) -> String {
        negotiate_locale_name(request, self.negotiator.as_ref(), &self.default_locale_name)
    }

    /// Localizer for a locale name.
    ///
    /// Only locales with catalogs somewhere in their chain are cached.
    /// Negotiated names come from request input, so unknown ones get a
    /// fresh localizer each time instead of a cache slot.
    pub fn localizer(&self, locale_name: &str) -> Arc<Localizer> {
        if let Some(localizer) = self.localizers.read().get(locale_name) {
            return Arc::clone(localizer);
        }

        let store = self.catalogs.snapshot();
        if !locale_chain(locale_name).iter().any(|locale| store.has_locale(locale)) {
            trace!(locale = locale_name, "no catalogs for locale, not caching");
            return Arc::new(Localizer::new(locale_name, store));
        }

        let mut localizers = self.localizers.write();
        Arc::clone(localizers.entry(locale_name.to_string()).or_insert_with(|| {
            debug!(locale = locale_name, "creating localizer");
            Arc::new(Localizer::new(locale_name, self.catalogs.snapshot()))
        }))
    }

    /// Number of localizers currently cached.
    pub fn cached_localizer_count(&self) -> usize {
        self.localizers.read().len()
    }

    /// Localizer for the locale negotiated from `request`.
    pub fn localizer_for(&self, request: &dyn RequestContext) -> Arc<Localizer> {
        self.localizer(&self.negotiate_locale_name(request))
    }

    /// Swap in a freshly built store.
    ///
    /// Localizers already handed out keep reading the old store; new
    /// requests get localizers over the new one.
    pub fn reload(&self, store: CatalogStore) {
        let mut localizers = self.localizers.write();
        self.catalogs.replace(store);
        localizers.clear();
        debug!(catalogs = self.catalogs.snapshot().len(), "catalogs reloaded");
    }
}
