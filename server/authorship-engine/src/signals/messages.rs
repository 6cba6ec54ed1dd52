//! Commit message patterns: agent-typical phrasing, scoped conventional
//! commits, verbose bodies and repeated messages. Additive and capped.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use crate::config::{Bounds, Config};
use crate::error::EngineError;
use crate::signals::{round2, AnalysisContext, Evaluation, Signal};
use crate::types::{CommitRecord, SignalContribution};

/// Agent-typical subject lines (case-insensitive, first line only).
static AGENT_SUBJECTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
  compile(&[
    r"^(add|create|implement|update|fix|refactor|improve|enhance)\s",
    r"^update \S+$",
    r"^add \S+$",
  ])
});

/// Agent-typical phrasing and trailers anywhere in the message.
static AGENT_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
  compile(&[
    r"initial commit",
    r"\bcomprehensive\b",
    r"\b(enhance|improve)[sd]? .*\b(functionality|experience|robustness|readability)\b",
    r"\bfor (better|improved) (readability|maintainability|performance)\b",
    r"generated (with|by) ",
    r"co-authored-by: .*(claude|copilot|gpt|cursor|devin|codex|aider)",
    r"🤖",
  ])
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
  patterns
    .iter()
    .filter_map(|p| Regex::new(&format!("(?i){}", p)).ok())
    .collect()
}

/// Conventional-commit subject with a scope, e.g. `feat(api,ui): ...`.
static SCOPED_CONVENTIONAL: LazyLock<Option<Regex>> = LazyLock::new(|| {
  Regex::new(r"(?i)^(feat|fix|docs|style|refactor|perf|test|build|ci|chore|revert)\([^)]+\)!?:\s").ok()
});

fn matches_agent_phrasing(message: &str) -> bool {
  let subject = message.lines().next().unwrap_or("").trim();
  AGENT_SUBJECTS.iter().any(|re| re.is_match(subject))
    || AGENT_PHRASES.iter().any(|re| re.is_match(message))
}

fn is_scoped_conventional(subject: &str) -> bool {
  SCOPED_CONVENTIONAL.as_ref().is_some_and(|re| re.is_match(subject))
}

fn body_lines(message: &str) -> usize {
  message.lines().skip(1).filter(|l| !l.trim().is_empty()).count()
}

/// Agent-typical message phrasing, independent of commit size.
pub struct MessageSignal;

impl MessageSignal {
  fn ratio(count: usize, total: usize) -> f64 {
    count as f64 / total as f64
  }
}

impl Signal for MessageSignal {
  fn name(&self) -> &'static str {
    "message_patterns"
  }

  fn bounds(&self, config: &Config) -> Bounds {
    config.message_bounds
  }

  fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Result<Evaluation, EngineError> {
    let config = ctx.config;
    let messages: Vec<&CommitRecord> = ctx
      .commits
      .iter()
      .copied()
      .filter(|c| !c.subject().is_empty())
      .collect();
    let total = messages.len();
    if total < config.message_min_commits {
      return Err(EngineError::insufficient(self.name(), format!("{} commit messages", total)));
    }

    let flagged: Vec<&str> = messages
      .iter()
      .filter(|c| matches_agent_phrasing(&c.message))
      .map(|c| c.subject())
      .collect();
    let scoped = messages.iter().filter(|c| is_scoped_conventional(c.subject())).count();
    let verbose = messages
      .iter()
      .filter(|c| body_lines(&c.message) >= config.verbose_body_lines)
      .count();
    let mut seen = HashSet::new();
    let duplicates = messages
      .iter()
      .filter(|c| !seen.insert(c.message.trim().to_lowercase()))
      .count();

    let phrasing_ratio = Self::ratio(flagged.len(), total);
    let scoped_ratio = Self::ratio(scoped, total);
    let verbose_ratio = Self::ratio(verbose, total);
    let duplicate_ratio = Self::ratio(duplicates, total);

    let mut eval = Evaluation::new(json!({
      "total": total,
      "pattern_hits": flagged.len(),
      "ratio": round2(phrasing_ratio),
      "scoped_conventional": scoped,
      "verbose": verbose,
      "duplicates": duplicates,
      "sample_flagged": flagged.iter().take(10).collect::<Vec<_>>(),
    }));

    if let Some(&(_, points)) = config
      .phrasing_tiers
      .iter()
      .find(|(limit, _)| phrasing_ratio > *limit)
    {
      eval.push(
        SignalContribution::new(
          self.name(),
          points,
          format!(
            "{:.0}% of commit messages match agent-typical phrasing",
            phrasing_ratio * 100.0
          ),
        )
        .with_evidence(json!({ "pattern_hits": flagged.len(), "total": total })),
      );
    }
    if scoped_ratio > config.conventional_ratio {
      eval.push(
        SignalContribution::new(
          self.name(),
          config.conventional_points,
          format!("{:.0}% of messages use scoped conventional-commit syntax", scoped_ratio * 100.0),
        )
        .with_evidence(json!({ "scoped_conventional": scoped, "total": total })),
      );
    }
    if verbose_ratio > config.verbose_ratio {
      eval.push(
        SignalContribution::new(
          self.name(),
          config.verbose_points,
          format!(
            "{:.0}% of messages carry a body of {}+ lines",
            verbose_ratio * 100.0,
            config.verbose_body_lines
          ),
        )
        .with_evidence(json!({ "verbose": verbose, "total": total })),
      );
    }
    if duplicate_ratio > config.duplicate_ratio {
      eval.push(
        SignalContribution::new(
          self.name(),
          config.duplicate_points,
          format!("{:.0}% of commit messages repeat an earlier message verbatim", duplicate_ratio * 100.0),
        )
        .with_evidence(json!({ "duplicates": duplicates, "total": total })),
      );
    }

    Ok(eval)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::signals::bound_contributions;
  use crate::signals::fixtures::commit;
  use crate::types::AuthoredTotals;

  fn evaluate(messages: &[&str]) -> Result<Evaluation, EngineError> {
    let config = Config::default();
    let records: Vec<CommitRecord> = messages
      .iter()
      .enumerate()
      .map(|(i, m)| commit("alice", i as i64 * 60, 10, m))
      .collect();
    let commits: Vec<&CommitRecord> = records.iter().collect();
    let totals = AuthoredTotals::default();
    let ctx = AnalysisContext {
      config: &config,
      commits: &commits,
      sessions: &[],
      samples: &[],
      totals: &totals,
      repository: None,
    };
    MessageSignal.evaluate(&ctx)
  }

  #[test]
  fn phrasing_patterns() {
    assert!(matches_agent_phrasing("Implement comprehensive error handling"));
    assert!(matches_agent_phrasing("wip\n\nCo-Authored-By: Claude <noreply@anthropic.com>"));
    assert!(matches_agent_phrasing("add README.md"));
    assert!(!matches_agent_phrasing("ugh, the parser broke again on windows paths"));
    assert!(is_scoped_conventional("feat(api,ui): add login"));
    assert!(!is_scoped_conventional("feat: add login"));
  }

  #[test]
  fn agent_style_history_scores() {
    let eval = evaluate(&[
      "feat(auth): implement comprehensive token validation\n\n- add parser\n- add tests\n- update docs",
      "feat(api): add endpoint for users\n\n- add handler\n- add route\n- add tests",
      "fix(core): improve error handling for better readability\n\n- wrap errors\n- add context\n- log",
      "refactor(db): enhance query functionality\n\n- split module\n- rename\n- add index",
    ])
    .unwrap();
    let reasons: Vec<&str> = eval.contributions.iter().map(|c| c.reason.as_str()).collect();
    assert!(reasons.iter().any(|r| r.contains("agent-typical")));
    assert!(reasons.iter().any(|r| r.contains("scoped")));
    assert!(reasons.iter().any(|r| r.contains("body")));
    let bounded = bound_contributions(eval.contributions, Config::default().message_bounds);
    assert!(bounded.iter().map(|c| c.points).sum::<f64>() <= 15.0);
  }

  #[test]
  fn repeated_messages_are_flagged() {
    let eval = evaluate(&["Sync work", "Sync work", "Sync work", "Sync work", "Sync work"]).unwrap();
    assert!(eval.contributions.iter().any(|c| c.reason.contains("repeat")));
  }

  #[test]
  fn natural_messages_score_nothing() {
    let eval = evaluate(&[
      "ugh, windows paths again",
      "revert that, broke CI",
      "typo",
      "make the cache actually expire",
    ])
    .unwrap();
    assert!(eval.contributions.is_empty());
  }

  #[test]
  fn too_few_messages_is_insufficient() {
    assert!(evaluate(&["one", "two"]).is_err());
  }
}
