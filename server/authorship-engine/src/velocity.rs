//! Velocity & burst analysis: lines-per-minute between consecutive commits of
//! one author, plus session-level burst detection.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use crate::config::{Bounds, Config};
use crate::error::EngineError;
use crate::signals::{round2, AnalysisContext, Evaluation, Signal};
use crate::stats;
use crate::types::{CommitRecord, Session, SignalContribution, VelocitySample};

/// Velocity samples for every author with at least two qualifying commits.
///
/// `commits` must be countable, non-bot and sorted by time. The interval is
/// floored at `min_interval_minutes` so same-minute commits stay finite.
pub fn compute_samples(commits: &[&CommitRecord], config: &Config) -> Vec<VelocitySample> {
  let mut by_author: BTreeMap<&str, Vec<&CommitRecord>> = BTreeMap::new();
  for c in commits {
    by_author.entry(c.author.as_str()).or_default().push(c);
  }

  let floor = config.min_interval_minutes.max(f64::EPSILON);
  let mut samples: Vec<VelocitySample> = by_author
    .values()
    .flat_map(|author_commits| author_commits.windows(2))
    .map(|pair| {
      let (prev, next) = (pair[0], pair[1]);
      let gap = (next.timestamp - prev.timestamp).num_seconds() as f64 / 60.0;
      let lines = next.authored_lines();
      VelocitySample {
        author: next.author.clone(),
        sha_from: prev.short_sha().to_string(),
        sha_to: next.short_sha().to_string(),
        at: next.timestamp,
        gap_minutes: round2(gap),
        lines,
        lines_per_minute: lines as f64 / gap.max(floor),
      }
    })
    .collect();
  samples.sort_by_key(|s| s.at);
  samples
}

/// Repo-wide velocity statistics.
#[derive(Debug, Clone, Serialize)]
pub struct VelocityAggregates {
  pub samples: usize,
  pub median: f64,
  pub trimmed_mean: f64,
  pub mean: f64,
  pub max: f64,
  pub suspicious_fraction: f64,
  pub extreme_fraction: f64,
}

pub fn aggregate(samples: &[VelocitySample], config: &Config) -> Result<VelocityAggregates, EngineError> {
  let rates: Vec<f64> = samples.iter().map(|s| s.lines_per_minute).collect();
  let n = rates.len() as f64;
  let fraction_at_least = |limit: f64| rates.iter().filter(|&&r| r >= limit).count() as f64 / n;
  Ok(VelocityAggregates {
    samples: rates.len(),
    median: stats::median(&rates)?,
    trimmed_mean: stats::trimmed_mean(&rates, config.trim_fraction)?,
    mean: stats::mean(&rates)?,
    max: rates.iter().copied().fold(0.0, f64::max),
    suspicious_fraction: fraction_at_least(config.lpm_suspicious),
    extreme_fraction: rates.iter().filter(|&&r| r > config.lpm_extreme).count() as f64 / n,
  })
}

/// Median velocity tiers, heavy-tail boost and extreme-interval boost.
pub struct VelocitySignal;

impl Signal for VelocitySignal {
  fn name(&self) -> &'static str {
    "velocity"
  }

  fn bounds(&self, config: &Config) -> Bounds {
    config.velocity_bounds
  }

  fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Result<Evaluation, EngineError> {
    let config = ctx.config;
    if ctx.samples.is_empty() {
      return Err(EngineError::insufficient(self.name(), "no author has two qualifying commits"));
    }
    let agg = aggregate(ctx.samples, config)?;

    let mut fastest: Vec<&VelocitySample> = ctx.samples.iter().collect();
    fastest.sort_by(|a, b| b.lines_per_minute.total_cmp(&a.lines_per_minute));
    fastest.truncate(5);
    let fastest: Vec<_> = fastest
      .into_iter()
      .map(|s| {
        json!({
          "sha_from": s.sha_from,
          "sha_to": s.sha_to,
          "lines": s.lines,
          "gap_minutes": s.gap_minutes,
          "lines_per_minute": round2(s.lines_per_minute),
        })
      })
      .collect();

    let mut eval = Evaluation::new(json!({
      "samples": agg.samples,
      "median_lpm": round2(agg.median),
      "trimmed_mean_lpm": round2(agg.trimmed_mean),
      "mean_lpm": round2(agg.mean),
      "max_lpm": round2(agg.max),
      "suspicious_fraction": round2(agg.suspicious_fraction),
      "extreme_fraction": round2(agg.extreme_fraction),
      "fastest": fastest,
    }));
    let evidence = json!({ "median_lpm": round2(agg.median), "samples": agg.samples });

    let tier = if agg.median >= config.lpm_very_suspicious {
      Some((config.velocity_points_very_suspicious, "extremely high"))
    } else if agg.median >= config.lpm_suspicious {
      Some((config.velocity_points_suspicious, "suspiciously high"))
    } else if agg.median >= config.lpm_human_typical {
      Some((config.velocity_points_typical, "above typical human rate"))
    } else {
      None
    };
    if let Some((points, label)) = tier {
      eval.push(
        SignalContribution::new(
          self.name(),
          points,
          format!(
            "Median velocity is {} ({:.1} lines/min ≈ {:.0} lines/hr)",
            label,
            agg.median,
            agg.median * 60.0
          ),
        )
        .with_evidence(evidence),
      );
    }

    // A heavy tail only matters once the tail itself is faster than a human types.
    if agg.median > 0.0
      && agg.trimmed_mean >= agg.median * config.tail_ratio
      && agg.trimmed_mean >= config.lpm_human_typical
    {
      eval.push(
        SignalContribution::new(
          self.name(),
          config.tail_boost_points,
          format!(
            "Trimmed mean velocity ({:.1} lines/min) is far above the median ({:.1}): a few extremely fast commits among normal ones",
            agg.trimmed_mean, agg.median
          ),
        )
        .with_evidence(json!({ "trimmed_mean_lpm": round2(agg.trimmed_mean), "median_lpm": round2(agg.median) })),
      );
    }

    if agg.extreme_fraction > config.extreme_fraction_threshold {
      let points = (agg.extreme_fraction * config.extreme_fraction_multiplier).min(config.extreme_points_cap);
      eval.push(
        SignalContribution::new(
          self.name(),
          points,
          format!(
            "{:.0}% of commit intervals exceed {:.0} lines/min",
            agg.extreme_fraction * 100.0,
            config.lpm_extreme
          ),
        )
        .with_evidence(json!({ "extreme_fraction": round2(agg.extreme_fraction) })),
      );
    }

    Ok(eval)
  }
}

/// Largest authored-line total of any `burst_window_minutes` window holding
/// at least `burst_min_commits` countable commits, if it exceeds `burst_min_lines`.
/// Timeline-only commits stay in the window but never count toward its size.
pub fn session_burst(session: &Session, config: &Config) -> Option<u64> {
  let commits = &session.commits;
  let mut best: Option<u64> = None;
  let mut end = 0;
  let mut lines = 0u64;
  let mut counted = 0usize;
  for start in 0..commits.len() {
    if end < start {
      end = start;
      lines = 0;
      counted = 0;
    }
    while end < commits.len() {
      let span = (commits[end].timestamp - commits[start].timestamp).num_seconds() as f64 / 60.0;
      if span > config.burst_window_minutes {
        break;
      }
      lines += commits[end].lines;
      counted += usize::from(commits[end].countable);
      end += 1;
    }
    if counted >= config.burst_min_commits && lines > config.burst_min_lines {
      best = Some(best.map_or(lines, |b| b.max(lines)));
    }
    if end > start {
      lines -= commits[start].lines;
      counted -= usize::from(commits[start].countable);
    }
  }
  best
}

/// Single-session bursts plus repo-wide high-velocity sessions.
pub struct BurstSignal;

impl BurstSignal {
  fn is_high_velocity(session: &Session, config: &Config) -> bool {
    session.countable_commits() >= 2 && session.lines_per_minute() >= config.lpm_suspicious
  }
}

impl Signal for BurstSignal {
  fn name(&self) -> &'static str {
    "burst"
  }

  fn bounds(&self, config: &Config) -> Bounds {
    config.burst_bounds
  }

  fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Result<Evaluation, EngineError> {
    let config = ctx.config;
    let eligible: Vec<&Session> = ctx.sessions.iter().filter(|s| s.countable_commits() >= 2).collect();
    if eligible.is_empty() {
      return Err(EngineError::insufficient(self.name(), "no multi-commit sessions"));
    }

    let bursts: Vec<(&Session, u64)> = eligible
      .iter()
      .filter_map(|s| session_burst(s, config).map(|lines| (*s, lines)))
      .collect();
    let high_velocity: Vec<&Session> = eligible
      .iter()
      .copied()
      .filter(|s| Self::is_high_velocity(s, config))
      .collect();

    let mut eval = Evaluation::new(json!({
      "multi_commit_sessions": eligible.len(),
      "burst_sessions": bursts.len(),
      "high_velocity_sessions": high_velocity.len(),
    }));

    // The session credited here is excluded from the repo-wide count below.
    let credited = bursts.iter().max_by_key(|(_, lines)| *lines).map(|(s, lines)| {
      eval.push(
        SignalContribution::new(
          self.name(),
          config.burst_single_points,
          format!(
            "{} authored lines landed within {:.0} minutes in one session by {}",
            lines, config.burst_window_minutes, s.author
          ),
        )
        .with_evidence(json!({
          "author": s.author,
          "start": s.start.to_rfc3339(),
          "window_lines": lines,
          "burst_sessions": bursts.len(),
        })),
      );
      *s
    });

    if high_velocity.len() >= config.burst_repo_min_sessions {
      let others = high_velocity
        .iter()
        .filter(|s| credited.map_or(true, |c| !std::ptr::eq(**s, c)))
        .count();
      let points = (others as f64 * config.burst_repo_points_per_session).min(config.burst_repo_points_cap);
      if points > 0.0 {
        eval.push(
          SignalContribution::new(
            self.name(),
            points,
            format!(
              "{} sessions sustained at least {:.1} lines/min",
              high_velocity.len(),
              config.lpm_suspicious
            ),
          )
          .with_evidence(json!({ "high_velocity_sessions": high_velocity.len(), "counted": others })),
        );
      }
    }

    Ok(eval)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::session;
  use crate::signals::fixtures::commit;
  use crate::types::AuthoredTotals;

  fn run<S: Signal>(signal: &S, records: &[CommitRecord], config: &Config) -> Result<Evaluation, EngineError> {
    let commits: Vec<&CommitRecord> = records.iter().collect();
    let samples = compute_samples(&commits, config);
    let sessions = session::build_sessions(records, config);
    let totals = AuthoredTotals::default();
    let ctx = AnalysisContext {
      config,
      commits: &commits,
      sessions: &sessions,
      samples: &samples,
      totals: &totals,
      repository: None,
    };
    signal.evaluate(&ctx)
  }

  #[test]
  fn samples_are_per_author() {
    let records = vec![
      commit("alice", 0, 100, "a"),
      commit("bob", 5, 100, "b"),
      commit("alice", 10, 200, "c"),
      commit("bob", 25, 40, "d"),
    ];
    let commits: Vec<&CommitRecord> = records.iter().collect();
    let samples = compute_samples(&commits, &Config::default());
    assert_eq!(samples.len(), 2);
    assert!((samples[0].lines_per_minute - 20.0).abs() < 1e-9);
    assert!((samples[1].lines_per_minute - 2.0).abs() < 1e-9);
  }

  #[test]
  fn same_minute_commits_use_floor() {
    let records = vec![commit("alice", 0, 10, "a"), commit("alice", 0, 30, "b")];
    let commits: Vec<&CommitRecord> = records.iter().collect();
    let samples = compute_samples(&commits, &Config::default());
    assert!((samples[0].lines_per_minute - 30.0).abs() < 1e-9);
  }

  #[test]
  fn velocity_is_scale_consistent() {
    let config = Config::default();
    let median_of = |records: Vec<CommitRecord>| {
      let commits: Vec<&CommitRecord> = records.iter().collect();
      aggregate(&compute_samples(&commits, &config), &config).unwrap().median
    };
    let base = median_of((0..5).map(|i| commit("alice", i * 20, 100, "x")).collect());
    let double_lines = median_of((0..5).map(|i| commit("alice", i * 20, 200, "x")).collect());
    let half_gaps = median_of((0..5).map(|i| commit("alice", i * 10, 100, "x")).collect());
    let both = median_of((0..5).map(|i| commit("alice", i * 10, 200, "x")).collect());
    assert!((double_lines - 2.0 * base).abs() < 1e-9);
    assert!((half_gaps - 2.0 * base).abs() < 1e-9);
    assert!((both - 4.0 * base).abs() < 1e-9);
  }

  #[test]
  fn single_commit_author_contributes_nothing() {
    let records = vec![commit("alice", 0, 5000, "huge")];
    let err = run(&VelocitySignal, &records, &Config::default()).unwrap_err();
    assert!(matches!(err, EngineError::InsufficientData { .. }));
    assert!(run(&BurstSignal, &records, &Config::default()).is_err());
  }

  #[test]
  fn fast_uniform_commits_hit_top_tier() {
    let config = Config::default();
    let records: Vec<CommitRecord> = (0..5).map(|i| commit("alice", i * 10, 600, "x")).collect();
    let eval = run(&VelocitySignal, &records, &config).unwrap();
    assert_eq!(eval.contributions[0].points, config.velocity_points_very_suspicious);
    // 60 lines/min on every interval: all extreme.
    assert!(eval.contributions.iter().any(|c| c.reason.contains("exceed")));
    assert!(config.velocity_bounds.contains(eval.points()));
  }

  #[test]
  fn heavy_tail_adds_boost() {
    let config = Config::default();
    let mut records = Vec::new();
    for i in 0..10 {
      let lines = if i >= 6 { 3000 } else { 20 };
      records.push(commit("alice", i * 10, lines, "x"));
    }
    let eval = run(&VelocitySignal, &records, &config).unwrap();
    assert!(eval.contributions.iter().any(|c| c.reason.contains("Trimmed mean")));
  }

  #[test]
  fn erratic_sizes_over_weeks_get_no_tail_boost() {
    let sizes = [4, 5, 6, 9, 12, 20, 25, 30, 70, 600, 800, 1500];
    let records: Vec<CommitRecord> = sizes
      .iter()
      .enumerate()
      .map(|(i, &lines)| commit("alice", i as i64 * 30 * 1440, lines, "x"))
      .collect();
    let eval = run(&VelocitySignal, &records, &Config::default()).unwrap();
    assert!(eval.contributions.is_empty());
  }

  #[test]
  fn slow_history_scores_zero() {
    let records: Vec<CommitRecord> = (0..5).map(|i| commit("alice", i * 1440, 50, "x")).collect();
    let eval = run(&VelocitySignal, &records, &Config::default()).unwrap();
    assert!(eval.contributions.is_empty());
  }

  #[test]
  fn burst_window_detects_rapid_session() {
    let config = Config::default();
    let records: Vec<CommitRecord> = (0..5).map(|i| commit("alice", i * 10, 600, "x")).collect();
    let sessions = session::build_sessions(&records, &config);
    assert_eq!(session_burst(&sessions[0], &config), Some(2400));
    let eval = run(&BurstSignal, &records, &config).unwrap();
    assert_eq!(eval.contributions.len(), 1);
    assert_eq!(eval.points(), config.burst_single_points);
  }

  #[test]
  fn repo_wide_component_excludes_credited_session() {
    let config = Config::default();
    let mut records = Vec::new();
    // Three separate days, each a fast two-commit session.
    for day in 0..3 {
      let start = day * 1440;
      records.push(commit("alice", start, 400, "x"));
      records.push(commit("alice", start + 10, 400, "x"));
    }
    let eval = run(&BurstSignal, &records, &config).unwrap();
    let repo_wide: Vec<_> = eval.contributions.iter().filter(|c| c.reason.contains("sustained")).collect();
    assert_eq!(repo_wide.len(), 1);
    assert_eq!(repo_wide[0].points, 2.0 * config.burst_repo_points_per_session);
    assert!(config.burst_bounds.contains(eval.points()));
  }

  #[test]
  fn single_large_commit_is_not_a_burst() {
    let config = Config::default();
    let records = vec![commit("alice", 0, 5000, "x"), commit("alice", 100, 10, "y")];
    let sessions = session::build_sessions(&records, &config);
    assert_eq!(session_burst(&sessions[0], &config), None);
  }

  #[test]
  fn timeline_only_commit_does_not_complete_a_burst() {
    let config = Config::default();
    let mut placeholder = commit("ana", 0, 0, "");
    placeholder.countable = false;
    let records = vec![placeholder, commit("ana", 10, 400, "big change")];

    let sessions = session::build_sessions(&records, &config);
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].commits.len(), 2);
    assert_eq!(sessions[0].countable_commits(), 1);
    assert_eq!(session_burst(&sessions[0], &config), None);

    // The run helper passes every record as countable, so build the context by hand.
    let commits: Vec<&CommitRecord> = records.iter().filter(|r| r.countable).collect();
    let totals = AuthoredTotals::default();
    let ctx = AnalysisContext {
      config: &config,
      commits: &commits,
      sessions: &sessions,
      samples: &[],
      totals: &totals,
      repository: None,
    };
    assert!(matches!(BurstSignal.evaluate(&ctx), Err(EngineError::InsufficientData { .. })));
  }
}
