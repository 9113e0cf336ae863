//! gettext-based Internationalization for Armature
//!
//! Provides message translation backed by compiled GNU gettext catalogs:
//!
//! - **Catalogs**: Load `<dir>/<locale>/LC_MESSAGES/<domain>.mo` files and
//!   merge them per (locale, domain), last loaded wins
//! - **Translation Strings**: Message ids with default text, domain and
//!   `${name}` interpolation values
//! - **Locale Negotiation**: Pluggable strategies, `_LOCALE_` parameter or
//!   cookie by default
//! - **Pluralization**: Plural-Forms rules evaluated per catalog
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use armature_gettext::prelude::*;
//!
//! let config = I18nConfig::from_file("i18n.toml")?;
//! let i18n = I18n::from_config(&config)?;
//!
//! let request = LocaleRequest::from_parts("_LOCALE_=de", None);
//! let localizer = i18n.localizer_for(&request);
//!
//! let ts = TranslationString::new("add-number")?
//!     .with_default("Add ${number}")
//!     .with_mapping(Mapping::from([("number", 1)]));
//! localizer.translate(&ts);  // "Füge 1 hinzu"
//!
//! localizer.pluralize("${n} file", "${n} files", 3, None, Some(&Mapping::from([("n", 3)])));
//! ```
//!
//! # Domains
//!
//! ```rust,ignore
//! use armature_gettext::TranslationStringFactory;
//!
//! let shop = TranslationStringFactory::new("shop");
//! let ts = shop.create("cart-title")?;  // looked up in shop.mo
//! ```

mod catalog;
mod config;
mod error;
mod interpolate;
mod localizer;
mod mo;
mod negotiator;
mod plural;
mod store;
mod translation;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use catalog::{CatalogEntry, MessageCatalog, PluralSet, message_key};
pub use config::I18nConfig;
pub use error::I18nError;
pub use interpolate::interpolate;
pub use localizer::{I18n, Localizer, Translatable, locale_chain};
pub use mo::{CONTEXT_SEPARATOR, MO_MAGIC, MoFile, MoMessage};
pub use negotiator::{
    AcceptLanguageNegotiator, DefaultLocaleNegotiator, FALLBACK_LOCALE_NAME, LOCALE_KEY,
    LocaleMemo, LocaleNegotiator, LocaleRequest, RequestContext, negotiate_locale_name,
    parse_accept_language,
};
pub use plural::{BinaryOp, PluralExpr, PluralForms};
pub use store::{
    CatalogStore, DEFAULT_DOMAIN, LC_MESSAGES, LoadPolicy, Lookup, MO_EXTENSION, SharedCatalogs,
    catalog_path, resolve_domain,
};
pub use translation::{Mapping, TranslationString, TranslationStringFactory};

/// Result type for i18n operations
pub type Result<T> = std::result::Result<T, I18nError>;

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        CatalogStore, I18n, I18nConfig, I18nError, LocaleNegotiator, LocaleRequest, Localizer,
        Mapping, RequestContext, Result, TranslationString, TranslationStringFactory,
    };
}
