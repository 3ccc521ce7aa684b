// src/check/record.rs

use crate::report::ContentDigest;

/// One parsed line of a tracked report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRecord<'a> {
    pub digest: ContentDigest,
    /// Path as written, placeholders not yet expanded.
    pub path: &'a str,
    /// Trailing process-info column, if any. Not used for change detection.
    pub process: Option<&'a str>,
}

/// Split a report line into digest, path and optional process info.
pub fn parse_record(line: &str) -> Result<ReportRecord<'_>, String> {
    let mut fields = line.splitn(3, '\t');

    let digest_field = fields.next().unwrap_or_default();
    let Some(path) = fields.next() else {
        return Err("missing tab delimiter (was the report written without checksums?)".to_string());
    };
    if path.is_empty() {
        return Err("empty path field".to_string());
    }

    let digest = ContentDigest::from_hex(digest_field)
        .map_err(|e| format!("invalid digest {digest_field:?}: {e}"))?;

    Ok(ReportRecord {
        digest,
        path,
        process: fields.next(),
    })
}
