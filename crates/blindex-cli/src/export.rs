//! JSON-lines document export.
//!
//! One JSON object per line:
//!
//! ```json
//! {"tenant_id":"01HN...","document_id":"01HN...","created_at":"2024-01-29T15:00:00Z","text":"..."}
//! ```
//!
//! `deleted` defaults to false. A line with `"undecryptable": true` stands
//! for a document whose stored text could not be decrypted.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use blindex_index::MemoryDocumentSource;
use blindex_types::{DocumentId, DocumentRecord, TenantId};

#[derive(Debug, Deserialize)]
struct ExportLine {
    tenant_id: TenantId,
    document_id: DocumentId,
    created_at: DateTime<Utc>,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    undecryptable: bool,
}

/// Read an export into an in-memory document source.
///
/// Blank lines are ignored. A later line for the same document replaces an
/// earlier one.
pub fn read_export<R: BufRead>(reader: R) -> Result<MemoryDocumentSource> {
    let source = MemoryDocumentSource::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("Failed to read line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: ExportLine = serde_json::from_str(&line)
            .with_context(|| format!("Invalid document on line {}", line_no))?;

        let text = if entry.undecryptable { None } else { entry.text };
        let record = DocumentRecord {
            tenant_id: entry.tenant_id,
            document_id: entry.document_id,
            created_at: entry.created_at,
            deleted: entry.deleted,
            has_text: text.is_some() || entry.undecryptable,
        };
        source.upsert(record, text)?;
    }
    Ok(source)
}

/// Read an export file.
pub fn load_export(path: &Path) -> Result<MemoryDocumentSource> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    read_export(BufReader::new(file))
}
