// ABOUTME: Packages an export document and its source audio into a zip archive
// ABOUTME: Entries: sources/<sourceId> and document.json

use crate::storage::write_atomic;
use crate::{ExportDocument, Result};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::ZipWriter;

pub const DOCUMENT_ENTRY: &str = "document.json";

pub fn source_entry(source_id: &str) -> String {
    format!("sources/{}", source_id)
}

pub fn build_archive(source_id: &str, audio: &[u8], document: &ExportDocument) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();

    zip.start_file(source_entry(source_id), options)?;
    zip.write_all(audio)?;

    zip.start_file(DOCUMENT_ENTRY, options)?;
    zip.write_all(&serde_json::to_vec(document)?)?;

    Ok(zip.finish()?.into_inner())
}

pub fn write_archive(
    path: &Path,
    source_id: &str,
    audio: &[u8],
    document: &ExportDocument,
) -> Result<()> {
    let bytes = build_archive(source_id, audio, document)?;
    write_atomic(path, &bytes)
}
