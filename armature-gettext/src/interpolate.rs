//! `${name}` interpolation.
//!
//! Markers whose name is in the mapping are replaced by the mapped value;
//! every other marker is left exactly as written. There is no escape
//! syntax, so a literal `${name}` cannot be protected from substitution.

use crate::translation::Mapping;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

static MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_-]*)\}").unwrap()
});

/// Substitute `${name}` markers in `template` from `mapping`.
///
/// Borrows the template when nothing is replaced.
///
/// # Example
///
/// ```
/// use armature_gettext::{interpolate, Mapping};
///
/// let mapping = Mapping::new().with("user", "Alice");
/// assert_eq!(interpolate("Hi ${user}, ${missing}", Some(&mapping)), "Hi Alice, ${missing}");
/// assert_eq!(interpolate("Hi ${user}", None), "Hi ${user}");
/// ```
pub fn interpolate<'a>(template: &'a str, mapping: Option<&Mapping>) -> Cow<'a, str> {
    let Some(mapping) = mapping.filter(|m| !m.is_empty()) else {
        return Cow::Borrowed(template);
    };

    MARKER.replace_all(template, |caps: &Captures<'_>| match mapping.get(&caps[1]) {
        Some(value) => value.to_string(),
        None => caps[0].to_string(),
    })
}
