//! Session segmentation: groups each author's commits into coding sessions.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::types::{CommitRecord, Session, SessionCommit};

fn minutes_between(a: &SessionCommit, b: &SessionCommit) -> f64 {
  (b.timestamp - a.timestamp).num_seconds() as f64 / 60.0
}

/// Split one author's commits (sorted by time, ties in input order) into sessions.
///
/// A new session starts on the first commit and whenever the gap to the
/// previous commit exceeds `session_gap_minutes`.
pub fn segment_author(author: &str, commits: &[SessionCommit], config: &Config) -> Vec<Session> {
  let mut sessions = Vec::new();
  let mut current: Vec<SessionCommit> = Vec::new();

  for commit in commits {
    if let Some(prev) = current.last() {
      if minutes_between(prev, commit) > config.session_gap_minutes {
        sessions.push(close(author, std::mem::take(&mut current), config));
      }
    }
    current.push(commit.clone());
  }
  if !current.is_empty() {
    sessions.push(close(author, current, config));
  }
  sessions
}

fn close(author: &str, commits: Vec<SessionCommit>, config: &Config) -> Session {
  let start = commits[0].timestamp;
  let end = commits[commits.len() - 1].timestamp;
  let total_lines = commits.iter().map(|c| c.lines).sum();
  let floor = config.min_session_minutes.max(f64::EPSILON);
  let duration_minutes = ((end - start).num_seconds() as f64 / 60.0).max(floor);
  Session {
    author: author.to_string(),
    commits,
    start,
    end,
    total_lines,
    duration_minutes,
  }
}

/// Sessions for every non-bot author, ordered by author then start time.
///
/// Timeline-only commits keep their place in a session with zero lines.
pub fn build_sessions(records: &[CommitRecord], config: &Config) -> Vec<Session> {
  let mut by_author: BTreeMap<&str, Vec<SessionCommit>> = BTreeMap::new();
  for r in records.iter().filter(|r| !r.is_bot) {
    by_author.entry(r.author.as_str()).or_default().push(SessionCommit {
      sha: r.sha.clone(),
      timestamp: r.timestamp,
      lines: r.authored_lines(),
      countable: r.countable,
    });
  }

  by_author
    .into_iter()
    .flat_map(|(author, mut commits)| {
      // Stable sort keeps input order for identical timestamps.
      commits.sort_by_key(|c| c.timestamp);
      segment_author(author, &commits, config)
    })
    .collect()
}
