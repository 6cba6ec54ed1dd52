//! Core engine: runs one analysis request through the pipeline and assembles
//! the report.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::compose::{Composer, Composition};
use crate::config::Config;
use crate::error::EngineError;
use crate::filter;
use crate::normalize::{self, Normalized};
use crate::session;
use crate::signals::AnalysisContext;
use crate::types::*;
use crate::velocity;

pub const DISCLAIMER: &str = "This score is a heuristic estimate built from commit timing, size, \
  message and diff-text patterns. It is not proof of how the code was written; fast, uniform or \
  well-commented histories also come from squashed merges, imports and disciplined humans.";

const TOP_AUTHORS: usize = 5;

/// The authorship engine. Stateless between requests.
pub struct Engine {
  config: Config,
  composer: Composer,
}

impl Engine {
  pub fn new(config: Config) -> Self {
    Self {
      config,
      composer: Composer::standard(),
    }
  }

  pub fn with_defaults() -> Self {
    Self::new(Config::default())
  }

  /// Parse a JSON request and analyze it.
  pub fn analyze_json(&self, input: &str) -> Result<Report, EngineError> {
    let request: AnalysisRequest = serde_json::from_str(input)?;
    Ok(self.analyze(&request))
  }

  /// Analyze one request. A config carried in the request replaces the
  /// engine's own for this run.
  pub fn analyze(&self, request: &AnalysisRequest) -> Report {
    let config = request.config.as_ref().unwrap_or(&self.config);

    let (mut records, skipped) = normalize_all(&request.commits);
    // Stable: identical timestamps keep input order.
    records.sort_by_key(|r| r.timestamp);
    let repository = request.repository.as_ref().map(repository_meta);

    let totals = filter::apply(&mut records, config);
    let sessions = session::build_sessions(&records, config);
    let commits: Vec<&CommitRecord> = records.iter().filter(|r| r.countable && !r.is_bot).collect();
    let samples = velocity::compute_samples(&commits, config);

    let stats = repository_stats(request, &records, &commits, &sessions, &skipped, repository.as_ref());
    let report_id = report_id(&records);

    // Commits that only touched generated or vendored files are not authored work.
    if commits.is_empty() || totals.authored_total == 0 {
      info!(report_id = %report_id, received = request.commits.len(), "no authored lines to score");
      return Report {
        report_id,
        status: ReportStatus::InsufficientData,
        score: None,
        verdict: None,
        reasons: Vec::new(),
        contributions: Vec::new(),
        signals: Vec::new(),
        author_adjustment: None,
        totals,
        stats,
        skipped,
        disclaimer: DISCLAIMER.to_string(),
      };
    }

    let ctx = AnalysisContext {
      config,
      commits: &commits,
      sessions: &sessions,
      samples: &samples,
      totals: &totals,
      repository: repository.as_ref(),
    };
    let composition = self.composer.compose(&ctx);
    let verdict = Verdict::from_score(composition.score);

    info!(
      report_id = %report_id,
      commits = commits.len(),
      sessions = sessions.len(),
      samples = samples.len(),
      score = composition.score,
      verdict = verdict.label(),
      "analysis complete"
    );

    let reasons = composition.reasons();
    let Composition {
      contributions,
      signals,
      author_adjustment,
      score,
      ..
    } = composition;

    Report {
      report_id,
      status: ReportStatus::Scored,
      score: Some(score),
      verdict: Some(verdict),
      reasons,
      contributions,
      signals,
      author_adjustment,
      totals,
      stats,
      skipped,
      disclaimer: DISCLAIMER.to_string(),
    }
  }
}

/// Normalize every inbound commit. Unplaceable commits are dropped and
/// reported; timeline-only commits are kept and also reported.
fn normalize_all(raw: &[InboundCommit]) -> (Vec<CommitRecord>, Vec<SkippedCommit>) {
  let mut records = Vec::with_capacity(raw.len());
  let mut skipped = Vec::new();
  for commit in raw {
    match normalize::normalize(commit) {
      Ok(Normalized::Counted(record)) => records.push(record),
      Ok(Normalized::TimelineOnly(record, err)) => {
        skipped.push(SkippedCommit {
          sha: record.sha.clone(),
          reason: err.to_string(),
        });
        records.push(record);
      }
      Err(err) => {
        warn!("skipping commit: {}", err);
        skipped.push(SkippedCommit {
          sha: commit.sha.trim().to_string(),
          reason: err.to_string(),
        });
      }
    }
  }
  (records, skipped)
}

fn repository_meta(raw: &InboundRepository) -> RepositoryMeta {
  let created_at = raw
    .created_at
    .as_deref()
    .map(str::trim)
    .filter(|ts| !ts.is_empty())
    .and_then(|ts| match normalize::parse_timestamp(ts) {
      Ok(t) => Some(t),
      Err(e) => {
        warn!(created_at = ts, "ignoring repository creation time: {}", e);
        None
      }
    });
  RepositoryMeta {
    full_name: raw.full_name.clone(),
    created_at,
    default_branch: raw.default_branch.clone(),
  }
}

/// Stable report ID: hash of the sorted SHAs of every placed commit.
fn report_id(records: &[CommitRecord]) -> String {
  let mut shas: Vec<&str> = records.iter().map(|r| r.sha.as_str()).collect();
  shas.sort_unstable();
  let mut hasher = blake3::Hasher::new();
  for sha in shas {
    hasher.update(sha.as_bytes());
    hasher.update(b"|");
  }
  let hex = hasher.finalize().to_hex();
  format!("rep-{}", &hex[..16])
}

fn repository_stats(
  request: &AnalysisRequest,
  records: &[CommitRecord],
  commits: &[&CommitRecord],
  sessions: &[Session],
  skipped: &[SkippedCommit],
  repository: Option<&RepositoryMeta>,
) -> RepositoryStats {
  let mut by_author: BTreeMap<&str, AuthorSummary> = BTreeMap::new();
  for c in commits {
    let entry = by_author.entry(c.author.as_str()).or_insert_with(|| AuthorSummary {
      author: c.author.clone(),
      commits: 0,
      authored_lines: 0,
    });
    entry.commits += 1;
    entry.authored_lines += c.authored_lines();
  }
  let authors = by_author.len();
  let mut top_authors: Vec<AuthorSummary> = by_author.into_values().collect();
  // BTreeMap order breaks ties by name.
  top_authors.sort_by(|a, b| b.commits.cmp(&a.commits));
  top_authors.truncate(TOP_AUTHORS);

  // records are sorted by time.
  let time_span_days = match (commits.first(), commits.last()) {
    (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_days(),
    _ => 0,
  };

  RepositoryStats {
    repository: repository.and_then(|r| r.full_name.clone()),
    default_branch: repository.and_then(|r| r.default_branch.clone()),
    commits_received: request.commits.len(),
    commits_analyzed: commits.len(),
    commits_skipped: skipped.len(),
    bot_commits: records.iter().filter(|r| r.is_bot).count(),
    authors,
    top_authors,
    time_span_days,
    sessions: sessions.len(),
    multi_commit_sessions: sessions.iter().filter(|s| s.countable_commits() > 1).count(),
  }
}
