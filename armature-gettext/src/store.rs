//! Catalog Store
//!
//! Registry of message catalogs keyed by (locale name, domain), populated
//! at startup from translation directories laid out as
//! `<root>/<locale>/LC_MESSAGES/<domain>.mo`.
//!
//! The store is mutated only while loading. Once built it is shared as an
//! `Arc<CatalogStore>` and read without locking; [`SharedCatalogs`] swaps
//! in a whole new store when catalogs are reloaded.

use crate::catalog::{CatalogEntry, MessageCatalog, PluralSet};
use crate::mo::MoFile;
use crate::{I18nError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Domain used when a message has none.
pub const DEFAULT_DOMAIN: &str = "messages";

/// Subdirectory holding compiled catalogs inside a locale directory.
pub const LC_MESSAGES: &str = "LC_MESSAGES";

/// Extension of compiled catalog files.
pub const MO_EXTENSION: &str = "mo";

/// Resolve an optional domain to the catalog domain it names.
pub fn resolve_domain(domain: Option<&str>) -> &str {
    domain.unwrap_or(DEFAULT_DOMAIN)
}

/// Path of the compiled catalog for a locale and domain under `root`.
pub fn catalog_path(root: impl AsRef<Path>, locale_name: &str, domain: &str) -> PathBuf {
    root.as_ref()
        .join(locale_name)
        .join(LC_MESSAGES)
        .join(format!("{}.{}", domain, MO_EXTENSION))
}

/// What to do when a catalog file fails to load during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Log a warning and continue with the next file
    #[default]
    Skip,
    /// Stop scanning and return the error
    Abort,
}

/// Result of a catalog lookup.
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    /// A singular translation
    Text(&'a str),
    /// Plural forms with their selection rule
    Plural(PluralSet<'a>),
    /// No catalog or no entry for the message
    NotFound,
}

impl<'a> Lookup<'a> {
    /// Whether the lookup found anything.
    pub fn is_found(&self) -> bool {
        !matches!(self, Lookup::NotFound)
    }
}

/// All loaded catalogs, keyed by (locale name, domain).
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    catalogs: HashMap<(String, String), MessageCatalog>,
}

impl CatalogStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `<directory>/<locale_name>/LC_MESSAGES/<domain>.mo` and merge it.
    ///
    /// The file is decoded completely before anything is merged, so a
    /// malformed file leaves the store untouched.
    pub fn load(&mut self, directory: impl AsRef<Path>, locale_name: &str, domain: &str) -> Result<()> {
        let path = catalog_path(directory, locale_name, domain);
        self.load_file(&path, locale_name, domain)
    }

    /// Load an explicit compiled catalog file under (locale, domain).
    pub fn load_file(&mut self, path: impl AsRef<Path>, locale_name: &str, domain: &str) -> Result<()> {
        let path = path.as_ref();
        let catalog = MoFile::read(path)
            .and_then(MessageCatalog::from_mo)
            .map_err(|e| e.at_path(path))?;

        debug!(
            locale = locale_name,
            domain,
            entries = catalog.len(),
            path = %path.display(),
            "merging catalog"
        );
        self.insert(locale_name, domain, catalog)
            .map_err(|e| e.at_path(path))
    }

    /// Merge an already built catalog under (locale, domain).
    ///
    /// On error nothing is stored, not even an empty catalog for a new key.
    pub fn insert(&mut self, locale_name: &str, domain: &str, catalog: MessageCatalog) -> Result<()> {
        match self.catalogs.entry((locale_name.to_string(), domain.to_string())) {
            Entry::Occupied(mut existing) => existing.get_mut().merge(catalog),
            Entry::Vacant(slot) => {
                let mut fresh = MessageCatalog::new();
                fresh.merge(catalog)?;
                slot.insert(fresh);
                Ok(())
            }
        }
    }

    /// Scan a translation root: every `<locale>/LC_MESSAGES/*.mo` below it
    /// is loaded, locales and domains in lexical order.
    ///
    /// Returns the number of files merged.
    pub fn scan(&mut self, root: impl AsRef<Path>, policy: LoadPolicy) -> Result<usize> {
        let root = root.as_ref();
        let mut loaded = 0;

        for locale_dir in sorted_entries(root)? {
            let messages_dir = locale_dir.join(LC_MESSAGES);
            let Some(locale_name) = file_name(&locale_dir) else {
                continue;
            };
            if !messages_dir.is_dir() {
                continue;
            }

            for file in sorted_entries(&messages_dir)? {
                if file.extension().is_none_or(|ext| ext != MO_EXTENSION) || !file.is_file() {
                    continue;
                }
                let Some(domain) = file.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };

                match self.load_file(&file, &locale_name, domain) {
                    Ok(()) => loaded += 1,
                    Err(e) if policy == LoadPolicy::Skip => {
                        warn!(error = %e, "skipping catalog");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(loaded)
    }

    /// Look up a message id in (locale, domain).
    pub fn lookup(&self, locale_name: &str, domain: Option<&str>, message_id: &str) -> Lookup<'_> {
        self.lookup_in_context(locale_name, domain, None, message_id)
    }

    /// Look up a message id with an optional context in (locale, domain).
    pub fn lookup_in_context(
        &self,
        locale_name: &str,
        domain: Option<&str>,
        context: Option<&str>,
        message_id: &str,
    ) -> Lookup<'_> {
        let Some(catalog) = self.catalog(locale_name, resolve_domain(domain)) else {
            return Lookup::NotFound;
        };

        match catalog.get(context, message_id) {
            Some(CatalogEntry::Text(text)) => Lookup::Text(text),
            Some(CatalogEntry::Plural(forms)) => Lookup::Plural(PluralSet {
                forms,
                rule: catalog.plural_forms(),
            }),
            None => Lookup::NotFound,
        }
    }

    /// The merged catalog for (locale, domain), if any was loaded.
    pub fn catalog(&self, locale_name: &str, domain: &str) -> Option<&MessageCatalog> {
        self.catalogs
            .get(&(locale_name.to_string(), domain.to_string()))
    }

    /// Whether any catalog exists for the locale.
    pub fn has_locale(&self, locale_name: &str) -> bool {
        self.catalogs.keys().any(|(locale, _)| locale == locale_name)
    }

    /// Loaded locale names, sorted and de-duplicated.
    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.catalogs.keys().map(|(l, _)| l.as_str()).collect();
        locales.sort_unstable();
        locales.dedup();
        locales
    }

    /// Domains loaded for a locale, sorted.
    pub fn domains(&self, locale_name: &str) -> Vec<&str> {
        let mut domains: Vec<&str> = self
            .catalogs
            .keys()
            .filter(|(l, _)| l == locale_name)
            .map(|(_, d)| d.as_str())
            .collect();
        domains.sort_unstable();
        domains
    }

    /// Number of (locale, domain) catalogs.
    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    /// Whether nothing has been loaded.
    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .map_err(I18nError::IoError)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

/// Hot-swappable handle to the current store.
///
/// Readers take a [`snapshot`](SharedCatalogs::snapshot) and keep using it
/// for as long as they like; [`replace`](SharedCatalogs::replace) installs a
/// fully built store in one step, so no reader ever sees a partial reload.
#[derive(Debug, Clone, Default)]
pub struct SharedCatalogs {
    current: Arc<RwLock<Arc<CatalogStore>>>,
}

impl SharedCatalogs {
    /// Wrap a built store.
    pub fn new(store: CatalogStore) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(store))),
        }
    }

    /// The store as of now.
    pub fn snapshot(&self) -> Arc<CatalogStore> {
        Arc::clone(&self.current.read())
    }

    /// Install a new store, returning the previous one.
    pub fn replace(&self, store: CatalogStore) -> Arc<CatalogStore> {
        let next = Arc::new(store);
        std::mem::replace(&mut *self.current.write(), next)
    }
}
