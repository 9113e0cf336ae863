//! Compiled catalog writer for tests and fixtures.
//!
//! Production catalogs come from `msgfmt`; this writer emits the same
//! layout (sorted originals, no hash table) so tests can build catalogs
//! in memory or drop them into a translation directory.
//!
//! ```
//! use armature_gettext::testing::MoBuilder;
//! use armature_gettext::MoFile;
//!
//! let bytes = MoBuilder::new().message("Hello", "Bonjour").build();
//! let file = MoFile::parse(&bytes).unwrap();
//! assert_eq!(file.messages[0].translations[0], "Bonjour");
//! ```

use crate::mo::{CONTEXT_SEPARATOR, MO_MAGIC};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Builder for compiled catalog bytes.
#[derive(Debug, Clone)]
pub struct MoBuilder {
    metadata: Vec<(String, String)>,
    entries: Vec<(String, String)>,
    big_endian: bool,
}

impl Default for MoBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MoBuilder {
    /// Create a builder with a UTF-8 `Content-Type` header.
    pub fn new() -> Self {
        Self {
            metadata: vec![(
                "Content-Type".to_string(),
                "text/plain; charset=UTF-8".to_string(),
            )],
            entries: Vec::new(),
            big_endian: false,
        }
    }

    /// Create a builder with no metadata at all.
    pub fn without_content_type() -> Self {
        Self {
            metadata: Vec::new(),
            ..Self::new()
        }
    }

    /// Emit a big-endian file.
    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    /// Add a metadata header line.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// Set the `Plural-Forms` header.
    pub fn plural_forms(self, rule: impl Into<String>) -> Self {
        self.header("Plural-Forms", rule)
    }

    /// Add a singular message.
    pub fn message(mut self, id: &str, translation: &str) -> Self {
        self.entries.push((id.to_string(), translation.to_string()));
        self
    }

    /// Add a message with context.
    pub fn context_message(mut self, context: &str, id: &str, translation: &str) -> Self {
        self.entries.push((
            format!("{}{}{}", context, CONTEXT_SEPARATOR, id),
            translation.to_string(),
        ));
        self
    }

    /// Add a plural message.
    pub fn plural(mut self, id: &str, id_plural: &str, forms: &[&str]) -> Self {
        self.entries
            .push((format!("{}\0{}", id, id_plural), forms.join("\0")));
        self
    }

    /// Encode the catalog.
    pub fn build(&self) -> Vec<u8> {
        let header = self
            .metadata
            .iter()
            .map(|(k, v)| format!("{}: {}\n", k, v))
            .collect::<String>();

        let mut entries: Vec<(&str, &str)> = vec![("", header.as_str())];
        entries.extend(self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let count = entries.len() as u32;
        let originals_table = 28u32;
        let translations_table = originals_table + 8 * count;
        let mut string_offset = translations_table + 8 * count;

        let mut tables = Vec::new();
        let mut strings = Vec::new();

        let mut originals = Vec::new();
        let mut translations = Vec::new();
        for (pass, table) in [(0, &mut originals), (1, &mut translations)] {
            for entry in &entries {
                let s = if pass == 0 { entry.0 } else { entry.1 };
                table.push((s.len() as u32, string_offset));
                strings.extend_from_slice(s.as_bytes());
                strings.push(0);
                string_offset += s.len() as u32 + 1;
            }
        }
        tables.extend(originals);
        tables.extend(translations);

        let word = |v: u32| {
            if self.big_endian {
                v.to_be_bytes()
            } else {
                v.to_le_bytes()
            }
        };

        let mut out = Vec::new();
        for v in [MO_MAGIC, 0, count, originals_table, translations_table, 0, 28] {
            out.extend_from_slice(&word(v));
        }
        for (len, offset) in tables {
            out.extend_from_slice(&word(len));
            out.extend_from_slice(&word(offset));
        }
        out.extend_from_slice(&strings);
        out
    }

    /// Write the catalog to `path`, creating parent directories.
    pub fn write_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.build())
    }

    /// Write to `<root>/<locale>/LC_MESSAGES/<domain>.mo`.
    pub fn install(&self, root: impl AsRef<Path>, locale: &str, domain: &str) -> io::Result<PathBuf> {
        let path = root
            .as_ref()
            .join(locale)
            .join("LC_MESSAGES")
            .join(format!("{}.mo", domain));
        self.write_to(&path)?;
        Ok(path)
    }
}
