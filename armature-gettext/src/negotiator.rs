//! Locale Negotiation
//!
//! A [`LocaleNegotiator`] maps a request to a locale name, or to nothing
//! when the request expresses no preference. The built-in
//! [`DefaultLocaleNegotiator`] checks, in order:
//!
//! 1. an explicit override set on the request,
//! 2. the `_LOCALE_` request parameter,
//! 3. the `_LOCALE_` cookie.
//!
//! Any `Fn(&dyn RequestContext) -> Option<String>` is a negotiator too, so
//! applications can install their own policy.
//!
//! Negotiators never cache. [`LocaleMemo`] memoizes the result for one
//! request and must be invalidated explicitly.

use once_cell::unsync::OnceCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Parameter and cookie name consulted by the default negotiator.
pub const LOCALE_KEY: &str = "_LOCALE_";

/// Locale used when configuration names none.
pub const FALLBACK_LOCALE_NAME: &str = "en";

/// Read-only view of the request fields negotiation may consult.
pub trait RequestContext {
    /// Locale explicitly forced on this request, if any.
    fn locale_override(&self) -> Option<&str>;

    /// A query or form parameter.
    fn param(&self, name: &str) -> Option<&str>;

    /// A cookie value.
    fn cookie(&self, name: &str) -> Option<&str>;

    /// A request header (case-insensitive name).
    fn header(&self, _name: &str) -> Option<&str> {
        None
    }
}

/// Plain request context, for adapters and tests.
#[derive(Debug, Clone, Default)]
pub struct LocaleRequest {
    locale_override: Option<String>,
    params: HashMap<String, String>,
    cookies: HashMap<String, String>,
    headers: HashMap<String, String>,
}

impl LocaleRequest {
    /// An empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a raw query string and an optional `Cookie` header.
    ///
    /// Repeated query keys keep the last value. Malformed query strings
    /// contribute no parameters.
    pub fn from_parts(query: &str, cookie_header: Option<&str>) -> Self {
        let params = serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .unwrap_or_default()
            .into_iter()
            .collect();

        let cookies = cookie_header.map(parse_cookie_header).unwrap_or_default();

        Self {
            params,
            cookies,
            ..Default::default()
        }
    }

    /// Set an explicit locale that wins over every other source.
    pub fn with_override(mut self, locale_name: impl Into<String>) -> Self {
        self.locale_override = Some(locale_name.into());
        self
    }

    /// Add a query parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Add a cookie.
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Add a header. Names are matched case-insensitively.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Set or clear the override.
    pub fn set_override(&mut self, locale_name: Option<String>) {
        self.locale_override = locale_name;
    }

    /// Remove a parameter.
    pub fn remove_param(&mut self, name: &str) -> Option<String> {
        self.params.remove(name)
    }

    /// Remove a cookie.
    pub fn remove_cookie(&mut self, name: &str) -> Option<String> {
        self.cookies.remove(name)
    }
}

impl RequestContext for LocaleRequest {
    fn locale_override(&self) -> Option<&str> {
        self.locale_override.as_deref()
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().trim_matches('"').to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

/// Strategy choosing a locale name for a request.
pub trait LocaleNegotiator: Send + Sync {
    /// The negotiated locale name, or `None` for "no preference".
    fn negotiate(&self, request: &dyn RequestContext) -> Option<String>;
}

impl<F> LocaleNegotiator for F
where
    F: Fn(&dyn RequestContext) -> Option<String> + Send + Sync,
{
    fn negotiate(&self, request: &dyn RequestContext) -> Option<String> {
        self(request)
    }
}

/// Override, then `_LOCALE_` parameter, then `_LOCALE_` cookie.
///
/// Empty values count as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLocaleNegotiator;

impl LocaleNegotiator for DefaultLocaleNegotiator {
    fn negotiate(&self, request: &dyn RequestContext) -> Option<String> {
        present(request.locale_override())
            .or_else(|| present(request.param(LOCALE_KEY)))
            .or_else(|| present(request.cookie(LOCALE_KEY)))
            .map(str::to_string)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Run `negotiator`, substituting `default_locale_name` for no preference.
pub fn negotiate_locale_name(
    request: &dyn RequestContext,
    negotiator: &dyn LocaleNegotiator,
    default_locale_name: &str,
) -> String {
    negotiator
        .negotiate(request)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| default_locale_name.to_string())
}

// ============================================================================
// Accept-Language
// ============================================================================

/// Parse an `Accept-Language` header into tags, highest quality first.
///
/// Wildcards and entries with `q=0` are dropped; equal qualities keep
/// header order.
///
/// # Example
///
/// ```
/// use armature_gettext::parse_accept_language;
///
/// let tags = parse_accept_language("fr;q=0.8, en-US, *;q=0.1, de;q=0");
/// assert_eq!(tags, vec!["en-US", "fr"]);
/// ```
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut entries: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut split = part.trim().splitn(2, ';');
            let tag = split.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }

            let quality = split
                .next()
                .and_then(|q| q.trim().strip_prefix("q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);

            (quality > 0.0).then(|| (tag.to_string(), quality))
        })
        .collect();

    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    entries.into_iter().map(|(tag, _)| tag).collect()
}

fn normalize(tag: &str) -> String {
    tag.replace('-', "_").to_ascii_lowercase()
}

fn language(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// Picks the best of a fixed set of locales from `Accept-Language`.
///
/// For each requested tag, by quality: an exact match wins (`en-US`
/// matches `en_US`), then any available locale of the same language.
#[derive(Debug, Clone)]
pub struct AcceptLanguageNegotiator {
    available: Vec<String>,
}

impl AcceptLanguageNegotiator {
    /// Negotiate among `available` locale names, in preference order.
    pub fn new<I, S>(available: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            available: available.into_iter().map(Into::into).collect(),
        }
    }

    /// Best available locale for a header value.
    pub fn best_match(&self, header: &str) -> Option<&str> {
        for requested in parse_accept_language(header) {
            let wanted = normalize(&requested);
            if let Some(exact) = self.available.iter().find(|a| normalize(a) == wanted) {
                return Some(exact.as_str());
            }

            let lang = language(&requested).to_ascii_lowercase();
            if let Some(partial) = self
                .available
                .iter()
                .find(|a| language(a).eq_ignore_ascii_case(&lang))
            {
                return Some(partial.as_str());
            }
        }
        None
    }
}

impl LocaleNegotiator for AcceptLanguageNegotiator {
    fn negotiate(&self, request: &dyn RequestContext) -> Option<String> {
        request
            .header("Accept-Language")
            .and_then(|header| self.best_match(header))
            .map(str::to_string)
    }
}

// ============================================================================
// Per-request memo
// ============================================================================

/// Memoized locale name for a single request.
///
/// Negotiators are pure and uncached; a request handler that asks for the
/// locale repeatedly keeps one of these next to the request and calls
/// [`invalidate`](LocaleMemo::invalidate) whenever the inputs change.
#[derive(Default)]
pub struct LocaleMemo {
    locale_name: OnceCell<String>,
}

impl fmt::Debug for LocaleMemo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocaleMemo")
            .field("locale_name", &self.locale_name.get())
            .finish()
    }
}

impl LocaleMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// The memoized locale name, negotiating on first use.
    pub fn get_or_negotiate(
        &self,
        request: &dyn RequestContext,
        negotiator: &dyn LocaleNegotiator,
        default_locale_name: &str,
    ) -> &str {
        self.locale_name
            .get_or_init(|| negotiate_locale_name(request, negotiator, default_locale_name))
    }

    /// The memoized value, if negotiation already ran.
    pub fn get(&self) -> Option<&str> {
        self.locale_name.get().map(String::as_str)
    }

    /// Forget the memoized value so the next call negotiates again.
    pub fn invalidate(&mut self) -> Option<String> {
        self.locale_name.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> LocaleRequest {
        LocaleRequest::new()
            .with_override("fr")
            .with_param(LOCALE_KEY, "de")
            .with_cookie(LOCALE_KEY, "es")
    }

    #[test]
    fn test_default_precedence_chain() {
        let negotiator = DefaultLocaleNegotiator;
        let mut request = full_request();
        assert_eq!(negotiator.negotiate(&request).as_deref(), Some("fr"));

        request.set_override(None);
        assert_eq!(negotiator.negotiate(&request).as_deref(), Some("de"));

        request.remove_param(LOCALE_KEY);
        assert_eq!(negotiator.negotiate(&request).as_deref(), Some("es"));

        request.remove_cookie(LOCALE_KEY);
        assert_eq!(negotiator.negotiate(&request), None);
        assert_eq!(
            negotiate_locale_name(&request, &negotiator, FALLBACK_LOCALE_NAME),
            "en"
        );
    }

    #[test]
    fn test_empty_values_are_absent() {
        let request = LocaleRequest::new()
            .with_override("")
            .with_param(LOCALE_KEY, "")
            .with_cookie(LOCALE_KEY, "pt");
        assert_eq!(DefaultLocaleNegotiator.negotiate(&request).as_deref(), Some("pt"));
    }

    #[test]
    fn test_closure_negotiator() {
        let always_german = |_: &dyn RequestContext| Some("de".to_string());
        let request = full_request();
        assert_eq!(negotiate_locale_name(&request, &always_german, "en"), "de");

        let never = |_: &dyn RequestContext| -> Option<String> { None };
        assert_eq!(negotiate_locale_name(&request, &never, "it"), "it");
    }

    #[test]
    fn test_from_parts() {
        let request = LocaleRequest::from_parts(
            "page=2&_LOCALE_=de_CH&_LOCALE_=de",
            Some("session=abc; _LOCALE_=\"es\""),
        );
        assert_eq!(request.param(LOCALE_KEY), Some("de"));
        assert_eq!(request.param("page"), Some("2"));
        assert_eq!(request.cookie(LOCALE_KEY), Some("es"));
        assert_eq!(request.cookie("session"), Some("abc"));
    }

    #[test]
    fn test_from_parts_percent_decoding() {
        let request = LocaleRequest::from_parts("_LOCALE_=pt%5FBR", None);
        assert_eq!(request.param(LOCALE_KEY), Some("pt_BR"));
        assert_eq!(request.cookie(LOCALE_KEY), None);
    }

    #[test]
    fn test_parse_accept_language() {
        let tags = parse_accept_language("en-US,en;q=0.9,fr;q=0.8");
        assert_eq!(tags, vec!["en-US", "en", "fr"]);

        let tags = parse_accept_language("fr-FR,*;q=0.1");
        assert_eq!(tags, vec!["fr-FR"]);

        assert!(parse_accept_language("").is_empty());
    }

    #[test]
    fn test_accept_language_negotiator() {
        let negotiator = AcceptLanguageNegotiator::new(["en", "fr_FR", "de"]);

        assert_eq!(negotiator.best_match("fr-FR, en;q=0.5"), Some("fr_FR"));
        assert_eq!(negotiator.best_match("fr-CA, en;q=0.5"), Some("fr_FR"));
        assert_eq!(negotiator.best_match("es, de;q=0.3"), Some("de"));
        assert_eq!(negotiator.best_match("ja"), None);

        let request = LocaleRequest::new().with_header("accept-language", "de-AT");
        assert_eq!(negotiator.negotiate(&request).as_deref(), Some("de"));
        assert_eq!(negotiator.negotiate(&LocaleRequest::new()), None);
    }

    #[test]
    fn test_memo_caches_until_invalidated() {
        let mut request = full_request();
        let mut memo = LocaleMemo::new();
        assert_eq!(memo.get(), None);

        assert_eq!(memo.get_or_negotiate(&request, &DefaultLocaleNegotiator, "en"), "fr");

        request.set_override(None);
        // still memoized
        assert_eq!(memo.get_or_negotiate(&request, &DefaultLocaleNegotiator, "en"), "fr");

        assert_eq!(memo.invalidate().as_deref(), Some("fr"));
        assert_eq!(memo.get_or_negotiate(&request, &DefaultLocaleNegotiator, "en"), "de");
    }
}
