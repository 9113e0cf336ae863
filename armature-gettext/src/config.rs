// Configuration for the i18n subsystem

use crate::store::{CatalogStore, LoadPolicy};
use crate::{I18nError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Settings read at startup.
///
/// Every field has a default, so an empty document is a valid config.
///
/// ```
/// use armature_gettext::I18nConfig;
///
/// let config = I18nConfig::from_toml_str(r#"
///     default_locale_name = "de"
///     translation_dirs = ["locale"]
/// "#).unwrap();
///
/// assert_eq!(config.default_locale_name, "de");
/// assert!(!config.strict);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct I18nConfig {
    /// Locale used when negotiation yields nothing
    pub default_locale_name: String,
    /// Roots laid out as `<locale>/LC_MESSAGES/<domain>.mo`, loaded in order
    pub translation_dirs: Vec<PathBuf>,
    /// Fail on the first unreadable catalog instead of skipping it
    pub strict: bool,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_locale_name: "en".to_string(),
            translation_dirs: Vec::new(),
            strict: false,
        }
    }
}

impl I18nConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| I18nError::Config(format!("TOML parse error: {}", e)))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| I18nError::Config(format!("JSON parse error: {}", e)))
    }

    /// Load from a `.toml` or `.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| I18nError::Config("No file extension found".to_string()))?;

        let content = fs::read_to_string(path).map_err(|e| {
            I18nError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        match ext.to_lowercase().as_str() {
            "toml" => Self::from_toml_str(&content),
            "json" => Self::from_json_str(&content),
            other => Err(I18nError::Config(format!("Unsupported format: {}", other))),
        }
    }

    /// Read `<PREFIX>_DEFAULT_LOCALE_NAME`, `<PREFIX>_TRANSLATION_DIRS`
    /// (a platform path list) and `<PREFIX>_STRICT` from the environment.
    pub fn from_env(prefix: &str) -> Result<Self> {
        Self::from_vars(prefix, env::vars())
    }

    /// [`from_env`](Self::from_env) over an explicit set of variables.
    pub fn from_vars<I, K, V>(prefix: &str, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let var = |key: &str| vars.get(&format!("{}_{}", prefix, key));

        let mut config = Self::default();

        if let Some(name) = var("DEFAULT_LOCALE_NAME").filter(|v| !v.is_empty()) {
            config.default_locale_name = name.clone();
        }
        if let Some(dirs) = var("TRANSLATION_DIRS") {
            config.translation_dirs = env::split_paths(dirs)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        if let Some(strict) = var("STRICT") {
            config.strict = parse_bool(strict).ok_or_else(|| {
                I18nError::Config(format!("{}_STRICT: expected a boolean, got {:?}", prefix, strict))
            })?;
        }

        Ok(config)
    }

    pub fn load_policy(&self) -> LoadPolicy {
        if self.strict {
            LoadPolicy::Abort
        } else {
            LoadPolicy::Skip
        }
    }

    /// Scan every translation directory into a new store.
    ///
    /// A missing directory is skipped with a warning unless `strict` is set.
    pub fn build_store(&self) -> Result<CatalogStore> {
        let policy = self.load_policy();
        let mut store = CatalogStore::new();
        let mut files = 0;

        for dir in &self.translation_dirs {
            match store.scan(dir, policy) {
                Ok(count) => files += count,
                Err(e) if policy == LoadPolicy::Skip => {
                    warn!(dir = %dir.display(), error = %e, "skipping translation directory");
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            files,
            catalogs = store.len(),
            locales = store.locales().len(),
            "translation catalogs loaded"
        );
        Ok(store)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MoBuilder;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = I18nConfig::default();
        assert_eq!(config.default_locale_name, "en");
        assert!(config.translation_dirs.is_empty());
        assert_eq!(config.load_policy(), LoadPolicy::Skip);

        assert_eq!(I18nConfig::from_toml_str("").unwrap(), config);
        assert_eq!(I18nConfig::from_json_str("{}").unwrap(), config);
    }

    #[test]
    fn test_from_json() {
        let config = I18nConfig::from_json_str(
            r#"{"default_locale_name": "fr", "translation_dirs": ["a", "b"], "strict": true}"#,
        )
        .unwrap();
        assert_eq!(config.default_locale_name, "fr");
        assert_eq!(config.translation_dirs, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(config.load_policy(), LoadPolicy::Abort);
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            I18nConfig::from_toml_str("strict = \"maybe\""),
            Err(I18nError::Config(_))
        ));
        assert!(matches!(
            I18nConfig::from_json_str("[1, 2"),
            Err(I18nError::Config(_))
        ));
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = TempDir::new().unwrap();

        let toml_path = dir.path().join("i18n.toml");
        fs::write(&toml_path, "default_locale_name = \"ja\"").unwrap();
        assert_eq!(I18nConfig::from_file(&toml_path).unwrap().default_locale_name, "ja");

        let json_path = dir.path().join("i18n.json");
        fs::write(&json_path, r#"{"default_locale_name": "ko"}"#).unwrap();
        assert_eq!(I18nConfig::from_file(&json_path).unwrap().default_locale_name, "ko");

        let yaml_path = dir.path().join("i18n.yaml");
        fs::write(&yaml_path, "default_locale_name: pt").unwrap();
        assert!(I18nConfig::from_file(&yaml_path).is_err());

        assert!(I18nConfig::from_file(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_from_vars() {
        let dirs = env::join_paths(["/srv/locale", "/opt/app/locale"]).unwrap();
        let config = I18nConfig::from_vars(
            "APP_I18N",
            [
                ("APP_I18N_DEFAULT_LOCALE_NAME".to_string(), "nl".to_string()),
                ("APP_I18N_TRANSLATION_DIRS".to_string(), dirs.into_string().unwrap()),
                ("APP_I18N_STRICT".to_string(), "true".to_string()),
                ("OTHER_DEFAULT_LOCALE_NAME".to_string(), "xx".to_string()),
            ],
        )
        .unwrap();

        assert_eq!(config.default_locale_name, "nl");
        assert_eq!(
            config.translation_dirs,
            vec![PathBuf::from("/srv/locale"), PathBuf::from("/opt/app/locale")]
        );
        assert!(config.strict);

        let empty = I18nConfig::from_vars("APP_I18N", Vec::<(String, String)>::new()).unwrap();
        assert_eq!(empty, I18nConfig::default());

        assert!(I18nConfig::from_vars("APP_I18N", [("APP_I18N_STRICT", "perhaps")]).is_err());
    }

    #[test]
    fn test_build_store_skips_missing_dirs() {
        let root = TempDir::new().unwrap();
        MoBuilder::new()
            .message("Hello", "Bonjour")
            .install(root.path(), "fr", "messages")
            .unwrap();

        let config = I18nConfig {
            translation_dirs: vec![root.path().join("nope"), root.path().to_path_buf()],
            ..Default::default()
        };
        let store = config.build_store().unwrap();
        assert!(store.has_locale("fr"));

        let strict = I18nConfig { strict: true, ..config };
        assert!(strict.build_store().is_err());
    }

    #[test]
    fn test_build_store_strict_rejects_corrupt_file() {
        let root = TempDir::new().unwrap();
        let path = crate::store::catalog_path(root.path(), "fr", "messages");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"not a catalog").unwrap();

        let lenient = I18nConfig {
            translation_dirs: vec![root.path().to_path_buf()],
            ..Default::default()
        };
        assert!(lenient.build_store().unwrap().is_empty());

        let strict = I18nConfig { strict: true, ..lenient };
        assert!(strict.build_store().unwrap_err().is_catalog_error());
    }
}
