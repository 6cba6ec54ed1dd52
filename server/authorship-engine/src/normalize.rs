//! Normalize inbound commits into canonical internal CommitRecord models.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::EngineError;
use crate::types::*;

/// Outcome of normalizing one commit.
#[derive(Debug)]
pub enum Normalized {
  /// Fully usable record.
  Counted(CommitRecord),
  /// Author and timestamp are valid but the line data is unusable. The record
  /// keeps its place in the session timeline and contributes no lines.
  TimelineOnly(CommitRecord, EngineError),
}

/// Parse and normalize an InboundCommit into a CommitRecord.
///
/// Fails with `MalformedRecord` when the commit cannot be placed on a timeline
/// at all (missing or invalid timestamp, no author identity).
pub fn normalize(raw: &InboundCommit) -> Result<Normalized, EngineError> {
  let sha = raw.sha.trim().to_string();
  let label = if sha.is_empty() { "<no sha>" } else { sha.as_str() };

  let timestamp = match raw.timestamp.as_deref().map(str::trim) {
    Some(ts) if !ts.is_empty() => parse_timestamp(ts)
      .map_err(|e| EngineError::malformed(label, &format!("invalid RFC3339 timestamp: {}", e)))?,
    _ => return Err(EngineError::malformed(label, "missing timestamp")),
  };

  let author = author_identity(raw)
    .ok_or_else(|| EngineError::malformed(label, "missing author identity"))?;

  let files: Vec<FileChange> = raw
    .files
    .as_deref()
    .unwrap_or_default()
    .iter()
    .filter(|f| !f.path.trim().is_empty())
    .map(|f| FileChange {
      path: normalize_path(&f.path),
      additions: f.additions,
      deletions: f.deletions,
      patch: f.patch.clone().unwrap_or_default(),
      is_generated: false,
    })
    .collect();

  let message = raw.message.clone().unwrap_or_default();
  let has_counts = raw.additions.is_some() || raw.deletions.is_some();
  let has_content = !message.trim().is_empty() || !files.is_empty();

  // Reported totals may exceed the per-file sums (providers truncate long file
  // lists) but never fall below them.
  let file_additions: u64 = files.iter().map(|f| f.additions).sum();
  let file_deletions: u64 = files.iter().map(|f| f.deletions).sum();

  let mut record = CommitRecord {
    sha: sha.clone(),
    author,
    timestamp,
    additions: raw.additions.unwrap_or(0).max(file_additions),
    deletions: raw.deletions.unwrap_or(0).max(file_deletions),
    message,
    files,
    countable: true,
    is_bot: false,
  };

  if !has_counts && !has_content {
    let err = EngineError::malformed(label, "no line counts, message or files");
    warn!(sha = %label, "commit kept for timeline only: {}", err);
    record.countable = false;
    record.additions = 0;
    record.deletions = 0;
    return Ok(Normalized::TimelineOnly(record, err));
  }

  Ok(Normalized::Counted(record))
}

/// RFC3339 with offset, normalized to UTC.
pub fn parse_timestamp(ts: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
  Ok(DateTime::parse_from_rfc3339(ts)?.with_timezone(&Utc))
}

/// Login, else name, else email.
fn author_identity(raw: &InboundCommit) -> Option<String> {
  [&raw.author_login, &raw.author_name, &raw.author_email]
    .into_iter()
    .filter_map(|v| v.as_deref())
    .map(str::trim)
    .find(|v| !v.is_empty())
    .map(str::to_string)
}

/// Normalize a file path for stable matching:
/// - backslash -> forward slash
/// - collapse repeated slashes
/// - strip leading ./
fn normalize_path(p: &str) -> String {
  let s = p.trim().replace('\\', "/");
  let mut out = String::with_capacity(s.len());
  let mut prev_slash = false;
  for ch in s.chars() {
    if ch == '/' {
      if !prev_slash {
        out.push('/');
      }
      prev_slash = true;
    } else {
      prev_slash = false;
      out.push(ch);
    }
  }
  out.strip_prefix("./").map(str::to_string).unwrap_or(out)
}
