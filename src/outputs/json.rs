//! JSON output of the collected records.
//!
//! The document is a plain array of [`ArticleRecord`] objects indented with
//! four spaces:
//!
//! ```text
//! [
//!     {
//!         "title": "...",
//!         "publication_date": "...",
//!         "author": "...",
//!         "blurb": "..."
//!     }
//! ]
//! ```
//!
//! Non-ASCII characters are written as `\uXXXX` escapes (surrogate pairs
//! outside the BMP), so `Québec` is stored as `Qu\u00e9bec`.

use crate::error::{CollectError, CollectResult};
use crate::models::ArticleRecord;
use crate::utils::ensure_parent_dir;
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use std::io::{self, Write};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Pretty-printing formatter that escapes every non-ASCII character.
///
/// Layout is delegated to [`PrettyFormatter`]; only string contents differ.
struct AsciiPrettyFormatter<'a> {
    inner: PrettyFormatter<'a>,
}

impl<'a> AsciiPrettyFormatter<'a> {
    fn with_indent(indent: &'a [u8]) -> Self {
        Self {
            inner: PrettyFormatter::with_indent(indent),
        }
    }
}

impl Formatter for AsciiPrettyFormatter<'_> {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn end_object_key<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_key(writer)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Serialize `records` as a 4-space indented JSON array with ASCII-only strings.
///
/// # Arguments
///
/// * `records` - The collected articles, in output order
///
/// # Returns
///
/// The JSON document, or an error if serialization fails.
pub fn to_json(records: &[ArticleRecord]) -> CollectResult<String> {
    let mut buf = Vec::new();
    let formatter = AsciiPrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut serializer)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `records` to `path`, replacing any existing file.
///
/// The parent directory is created if it does not exist yet.
///
/// # Arguments
///
/// * `records` - The collected articles, in output order
/// * `path` - Destination JSON file
///
/// # Returns
///
/// `Ok(())` on success, or [`CollectError::Output`] if the directory or file
/// cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_records(records: &[ArticleRecord], path: &Path) -> CollectResult<()> {
    let json = to_json(records)?;
    let output_error = |source| CollectError::Output {
        path: path.to_path_buf(),
        source,
    };

    ensure_parent_dir(path).await.map_err(output_error)?;
    fs::write(path, json).await.map_err(output_error)?;
    info!("Wrote trending articles JSON");
    Ok(())
}
