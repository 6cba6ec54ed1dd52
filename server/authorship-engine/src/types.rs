//! Core types for the authorship engine (JSON contracts + internal models).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract: what the caller sends)
// ---------------------------------------------------------------------------

/// One analysis request read from stdin. Unknown fields are silently ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisRequest {
  #[serde(default)]
  pub repository: Option<InboundRepository>,
  #[serde(default)]
  pub config: Option<Config>,
  #[serde(default)]
  pub commits: Vec<InboundCommit>,
}

/// Repository metadata from the hosting service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundRepository {
  #[serde(default)]
  pub full_name: Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(default)]
  pub default_branch: Option<String>,
}

/// One commit as delivered by the commit history provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundCommit {
  #[serde(default)]
  pub sha: String,
  #[serde(default)]
  pub author_login: Option<String>,
  #[serde(default)]
  pub author_name: Option<String>,
  #[serde(default)]
  pub author_email: Option<String>,
  #[serde(default, alias = "date")]
  pub timestamp: Option<String>,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub additions: Option<u64>,
  #[serde(default)]
  pub deletions: Option<u64>,
  #[serde(default)]
  pub files: Option<Vec<InboundFile>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundFile {
  #[serde(alias = "filename")]
  pub path: String,
  #[serde(default)]
  pub additions: u64,
  #[serde(default)]
  pub deletions: u64,
  /// Absent for binary files.
  #[serde(default)]
  pub patch: Option<String>,
}

// ---------------------------------------------------------------------------
// Internal normalized types
// ---------------------------------------------------------------------------

/// One file touched by a commit.
#[derive(Debug, Clone, PartialEq)]
pub struct FileChange {
  pub path: String,
  pub additions: u64,
  pub deletions: u64,
  /// Unified diff text; empty when the provider sent none.
  pub patch: String,
  /// Set by the content filter.
  pub is_generated: bool,
}

impl FileChange {
  pub fn lines(&self) -> u64 {
    self.additions + self.deletions
  }

  /// Added lines of the patch without their leading `+`; removed lines and
  /// `+++` headers are skipped.
  pub fn added_lines(&self) -> impl Iterator<Item = &str> {
    self
      .patch
      .lines()
      .filter(|l| l.starts_with('+') && !l.starts_with("+++"))
      .map(|l| &l[1..])
  }
}

/// Canonical commit after normalization + filtering.
#[derive(Debug, Clone)]
pub struct CommitRecord {
  pub sha: String,
  pub author: String,
  pub timestamp: DateTime<Utc>,
  pub additions: u64,
  pub deletions: u64,
  pub message: String,
  pub files: Vec<FileChange>,
  /// False when line data was unusable; the commit only keeps its place in the timeline.
  pub countable: bool,
  /// Set by the author filter.
  pub is_bot: bool,
}

impl CommitRecord {
  /// All changed lines, regardless of author or file.
  pub fn total_lines(&self) -> u64 {
    if self.countable {
      self.additions + self.deletions
    } else {
      0
    }
  }

  /// Non-generated files of a non-bot, countable commit.
  pub fn authored_files(&self) -> impl Iterator<Item = &FileChange> {
    let keep = self.countable && !self.is_bot;
    self.files.iter().filter(move |f| keep && !f.is_generated)
  }

  /// Lines counted toward `authored_total`.
  ///
  /// Without per-file data the reported totals are all there is to go on.
  pub fn authored_lines(&self) -> u64 {
    if !self.countable || self.is_bot {
      return 0;
    }
    if self.files.is_empty() {
      return self.additions + self.deletions;
    }
    self.authored_files().map(FileChange::lines).sum()
  }

  /// First line of the message, trimmed.
  pub fn subject(&self) -> &str {
    self.message.lines().next().unwrap_or("").trim()
  }

  pub fn short_sha(&self) -> &str {
    let end = self
      .sha
      .char_indices()
      .nth(8)
      .map(|(i, _)| i)
      .unwrap_or(self.sha.len());
    &self.sha[..end]
  }
}

/// Repository-wide line aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthoredTotals {
  /// All lines, all authors, all files.
  pub total_changes: u64,
  /// Non-bot, non-generated lines only.
  pub authored_total: u64,
  pub bot_lines: u64,
  pub generated_lines: u64,
  /// generated_lines / total_changes; informational only.
  pub generated_ratio: f64,
}

/// Validated repository metadata.
#[derive(Debug, Clone, Default)]
pub struct RepositoryMeta {
  pub full_name: Option<String>,
  pub created_at: Option<DateTime<Utc>>,
  pub default_branch: Option<String>,
}

/// One commit inside a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCommit {
  pub sha: String,
  pub timestamp: DateTime<Utc>,
  pub lines: u64,
  /// False for timeline-only commits: they hold a place but are not work.
  pub countable: bool,
}

/// Maximal run of one author's commits with no gap above the session threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
  pub author: String,
  pub commits: Vec<SessionCommit>,
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
  pub total_lines: u64,
  /// Minutes from start to end, floored.
  pub duration_minutes: f64,
}

impl Session {
  /// Commits that carried usable line data.
  pub fn countable_commits(&self) -> usize {
    self.commits.iter().filter(|c| c.countable).count()
  }

  pub fn lines_per_minute(&self) -> f64 {
    self.total_lines as f64 / self.duration_minutes
  }
}

/// Throughput between two consecutive commits of one author.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VelocitySample {
  pub author: String,
  pub sha_from: String,
  pub sha_to: String,
  #[serde(skip)]
  pub at: DateTime<Utc>,
  pub gap_minutes: f64,
  pub lines: u64,
  pub lines_per_minute: f64,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract: what we emit)
// ---------------------------------------------------------------------------

/// One named, bounded, explainable addition to the score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalContribution {
  pub signal: String,
  pub points: f64,
  pub reason: String,
  pub evidence: serde_json::Value,
}

impl SignalContribution {
  pub fn new(signal: &str, points: f64, reason: impl Into<String>) -> Self {
    Self {
      signal: signal.to_string(),
      points,
      reason: reason.into(),
      evidence: serde_json::Value::Null,
    }
  }

  pub fn with_evidence(mut self, evidence: serde_json::Value) -> Self {
    self.evidence = evidence;
    self
  }
}

/// Net result of one signal, present even when it scored nothing.
#[derive(Debug, Clone, Serialize)]
pub struct SignalSummary {
  pub name: String,
  pub points: f64,
  pub min: f64,
  pub max: f64,
  pub evidence: serde_json::Value,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub skipped: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
  Scored,
  InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  VeryLikelyAgent,
  LikelyAgentAssisted,
  PossiblyAgentAssisted,
  LikelyHuman,
  AlmostCertainlyHuman,
}

impl Verdict {
  pub fn from_score(score: f64) -> Self {
    if score >= 75.0 {
      Self::VeryLikelyAgent
    } else if score >= 50.0 {
      Self::LikelyAgentAssisted
    } else if score >= 30.0 {
      Self::PossiblyAgentAssisted
    } else if score >= 15.0 {
      Self::LikelyHuman
    } else {
      Self::AlmostCertainlyHuman
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::VeryLikelyAgent => "Very likely agent-generated",
      Self::LikelyAgentAssisted => "Likely agent-assisted",
      Self::PossiblyAgentAssisted => "Possibly agent-assisted",
      Self::LikelyHuman => "Likely human-written",
      Self::AlmostCertainlyHuman => "Almost certainly human-written",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorSummary {
  pub author: String,
  pub commits: usize,
  pub authored_lines: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RepositoryStats {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub repository: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default_branch: Option<String>,
  pub commits_received: usize,
  pub commits_analyzed: usize,
  pub commits_skipped: usize,
  pub bot_commits: usize,
  pub authors: usize,
  pub top_authors: Vec<AuthorSummary>,
  pub time_span_days: i64,
  pub sessions: usize,
  pub multi_commit_sessions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedCommit {
  pub sha: String,
  pub reason: String,
}

/// Final engine output. Owns all of its data.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
  pub report_id: String,
  pub status: ReportStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub score: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub verdict: Option<Verdict>,
  pub reasons: Vec<String>,
  pub contributions: Vec<SignalContribution>,
  pub signals: Vec<SignalSummary>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub author_adjustment: Option<SignalContribution>,
  pub totals: AuthoredTotals,
  pub stats: RepositoryStats,
  pub skipped: Vec<SkippedCommit>,
  pub disclaimer: String,
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for unreadable input.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
    }
  }
}
