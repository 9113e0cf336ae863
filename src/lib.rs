// Armature L10n - gettext localization for Armature applications
//
// This library bundles the gettext engine with logging setup so an
// application can load its catalogs and translate with one dependency.

pub mod logging;

// Re-export the engine
pub use armature_gettext::*;

pub use logging::{LogFormat, LogSettings, init_logging};

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        AcceptLanguageNegotiator, CatalogStore, I18n, I18nConfig, I18nError, LocaleMemo,
        LocaleNegotiator, LocaleRequest, Localizer, Mapping, RequestContext, Result,
        TranslationString, TranslationStringFactory, init_logging,
    };
}
