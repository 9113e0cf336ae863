//! Compiled Catalog Decoding
//!
//! Decodes the binary `.mo` layout produced by GNU `msgfmt`:
//!
//! | offset | field                                   |
//! |--------|-----------------------------------------|
//! | 0      | magic `0x950412de` (either byte order)  |
//! | 4      | file format revision                    |
//! | 8      | number of strings `N`                   |
//! | 12     | offset of original strings table `O`    |
//! | 16     | offset of translated strings table `T`  |
//!
//! Each table holds `N` (length, offset) pairs pointing at NUL-terminated
//! strings. A message context is stored as `context\x04msgid`; plural
//! entries store `singular\0plural` as the id and NUL-separated forms as
//! the translation. The entry with an empty id carries the metadata header.

use crate::error::MEMORY_SOURCE;
use crate::plural::PluralForms;
use crate::{I18nError, Result};
use std::fs;
use std::path::Path;

/// Magic number in the file's native byte order.
pub const MO_MAGIC: u32 = 0x950412de;

/// Separator between message context and message id.
pub const CONTEXT_SEPARATOR: char = '\u{4}';

const HEADER_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

fn fail(reason: impl Into<String>) -> I18nError {
    I18nError::catalog_load(MEMORY_SOURCE, reason)
}

fn read_u32(data: &[u8], offset: usize, endian: Endian) -> Result<u32> {
    let bytes: [u8; 4] = offset
        .checked_add(4)
        .and_then(|end| data.get(offset..end))
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| fail(format!("truncated file at offset {}", offset)))?;
    Ok(match endian {
        Endian::Little => u32::from_le_bytes(bytes),
        Endian::Big => u32::from_be_bytes(bytes),
    })
}

/// One decoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoMessage {
    /// Message context (`msgctxt`)
    pub context: Option<String>,
    /// Message id (singular id for plural entries)
    pub id: String,
    /// Plural message id, present for plural entries
    pub id_plural: Option<String>,
    /// Translated forms; exactly one for non-plural entries
    pub translations: Vec<String>,
}

impl MoMessage {
    /// Whether this entry carries plural forms.
    pub fn is_plural(&self) -> bool {
        self.id_plural.is_some()
    }
}

/// A decoded compiled catalog.
#[derive(Debug, Clone, Default)]
pub struct MoFile {
    /// File format revision
    pub revision: u32,
    /// Header metadata, in file order
    pub metadata: Vec<(String, String)>,
    /// All messages except the metadata header
    pub messages: Vec<MoMessage>,
}

impl MoFile {
    /// Decode a compiled catalog from memory.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(fail(format!("file too short ({} bytes)", data.len())));
        }

        let endian = if read_u32(data, 0, Endian::Little)? == MO_MAGIC {
            Endian::Little
        } else if read_u32(data, 0, Endian::Big)? == MO_MAGIC {
            Endian::Big
        } else {
            return Err(fail("bad magic number"));
        };

        let revision = read_u32(data, 4, endian)?;
        let major = revision >> 16;
        if major > 1 {
            return Err(fail(format!("unsupported revision {}.{}", major, revision & 0xffff)));
        }

        let count = read_u32(data, 8, endian)? as usize;
        let originals = read_u32(data, 12, endian)? as usize;
        let translations = read_u32(data, 16, endian)? as usize;

        for table in [originals, translations] {
            let end = count
                .checked_mul(8)
                .and_then(|len| table.checked_add(len))
                .ok_or_else(|| fail("string table overflows"))?;
            if end > data.len() {
                return Err(fail("string table extends past end of file"));
            }
        }

        let mut file = MoFile {
            revision,
            ..Default::default()
        };

        for i in 0..count {
            let original = read_string(data, originals + i * 8, endian)?;
            let translated = read_string(data, translations + i * 8, endian)?;

            if original.is_empty() {
                file.metadata = parse_metadata(translated);
                continue;
            }

            file.messages.push(decode_message(original, translated));
        }

        Ok(file)
    }

    /// Read and decode a compiled catalog from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| I18nError::catalog_load(path, e.to_string()))?;
        Self::parse(&data).map_err(|e| e.at_path(path))
    }

    /// Look up a metadata header value (case-insensitive key).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Charset declared in `Content-Type`, if any.
    pub fn charset(&self) -> Option<&str> {
        self.header("Content-Type")?
            .split(';')
            .filter_map(|part| part.trim().split_once('='))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("charset"))
            .map(|(_, v)| v.trim())
    }

    /// Plural rule declared in `Plural-Forms`, if any.
    pub fn plural_forms(&self) -> Result<Option<PluralForms>> {
        self.header("Plural-Forms").map(PluralForms::parse).transpose()
    }
}

fn read_string(data: &[u8], entry: usize, endian: Endian) -> Result<&str> {
    let len = read_u32(data, entry, endian)? as usize;
    let offset = read_u32(data, entry + 4, endian)? as usize;

    let end = offset
        .checked_add(len)
        .filter(|end| *end < data.len())
        .ok_or_else(|| fail(format!("string at offset {} extends past end of file", offset)))?;

    if data[end] != 0 {
        return Err(fail(format!("string at offset {} is not NUL-terminated", offset)));
    }

    std::str::from_utf8(&data[offset..end])
        .map_err(|e| fail(format!("string at offset {} is not valid UTF-8: {}", offset, e)))
}

fn decode_message(original: &str, translated: &str) -> MoMessage {
    let (context, id) = match original.split_once(CONTEXT_SEPARATOR) {
        Some((ctx, id)) => (Some(ctx.to_string()), id),
        None => (None, original),
    };

    match id.split_once('\0') {
        Some((singular, plural)) => MoMessage {
            context,
            id: singular.to_string(),
            id_plural: Some(plural.to_string()),
            translations: translated.split('\0').map(str::to_string).collect(),
        },
        None => MoMessage {
            context,
            id: id.to_string(),
            id_plural: None,
            translations: vec![translated.to_string()],
        },
    }
}

fn parse_metadata(header: &str) -> Vec<(String, String)> {
    header
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MoBuilder;

    #[test]
    fn test_parse_simple_catalog() {
        let data = MoBuilder::new()
            .message("Hello", "Hallo")
            .message("Bye", "Tschüss")
            .build();

        let file = MoFile::parse(&data).unwrap();
        assert_eq!(file.messages.len(), 2);

        let hello = file.messages.iter().find(|m| m.id == "Hello").unwrap();
        assert_eq!(hello.translations, vec!["Hallo".to_string()]);
        assert!(!hello.is_plural());
    }

    #[test]
    fn test_parse_big_endian() {
        let data = MoBuilder::new().big_endian().message("Hello", "Hola").build();
        let file = MoFile::parse(&data).unwrap();
        assert_eq!(file.messages[0].translations[0], "Hola");
    }

    #[test]
    fn test_parse_header_metadata() {
        let data = MoBuilder::new()
            .plural_forms("nplurals=3; plural=(n==1 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);")
            .message("Hello", "Cześć")
            .build();

        let file = MoFile::parse(&data).unwrap();
        assert_eq!(file.charset(), Some("UTF-8"));
        assert_eq!(file.plural_forms().unwrap().unwrap().nplurals(), 3);
        // header entry is not a message
        assert_eq!(file.messages.len(), 1);
    }

    #[test]
    fn test_parse_plural_and_context() {
        let data = MoBuilder::new()
            .plural("file", "files", &["Datei", "Dateien"])
            .context_message("menu", "Open", "Öffnen")
            .build();

        let file = MoFile::parse(&data).unwrap();

        let plural = file.messages.iter().find(|m| m.id == "file").unwrap();
        assert_eq!(plural.id_plural.as_deref(), Some("files"));
        assert_eq!(plural.translations, vec!["Datei", "Dateien"]);

        let ctx = file.messages.iter().find(|m| m.id == "Open").unwrap();
        assert_eq!(ctx.context.as_deref(), Some("menu"));
    }

    #[test]
    fn test_reject_bad_magic() {
        let mut data = MoBuilder::new().message("a", "b").build();
        data[0] = 0;
        let err = MoFile::parse(&data).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn test_reject_truncated() {
        let data = MoBuilder::new().message("Hello", "Hallo").build();
        assert!(MoFile::parse(&data[..10]).is_err());
        assert!(MoFile::parse(&data[..data.len() - 3]).is_err());
    }

    #[test]
    fn test_reject_future_revision() {
        let mut data = MoBuilder::new().message("a", "b").build();
        data[4..8].copy_from_slice(&(2u32 << 16).to_le_bytes());
        assert!(MoFile::parse(&data).is_err());
    }

    #[test]
    fn test_reject_invalid_utf8() {
        let mut data = MoBuilder::new().message("a", "b").build();
        let pos = data.len() - 2;
        data[pos] = 0xff;
        assert!(MoFile::parse(&data).is_err());
    }

    #[test]
    fn test_read_missing_file() {
        let err = MoFile::read("/nonexistent/armature/de.mo").unwrap_err();
        match err {
            I18nError::CatalogLoad { path, .. } => assert!(path.ends_with("de.mo")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
