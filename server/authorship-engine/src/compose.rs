//! Score composer: folds every signal's contributions into one bounded score
//! with an ordered list of reasons.

use std::collections::BTreeSet;

use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::signals::comments::CommentDensitySignal;
use crate::signals::entropy::EntropySignal;
use crate::signals::messages::MessageSignal;
use crate::signals::scale::ProjectScaleSignal;
use crate::signals::time_of_day::TimeOfDaySignal;
use crate::signals::uniformity::UniformitySignal;
use crate::signals::{bound_contributions, AnalysisContext, Evaluation, Signal};
use crate::types::{SignalContribution, SignalSummary};
use crate::velocity::{BurstSignal, VelocitySignal};

pub const AUTHOR_SIGNAL: &str = "authors";

/// Everything the composer produced for one run.
#[derive(Debug, Clone)]
pub struct Composition {
  /// Non-zero contributions in signal order.
  pub contributions: Vec<SignalContribution>,
  pub signals: Vec<SignalSummary>,
  pub author_adjustment: Option<SignalContribution>,
  /// Sum of every clamped signal plus the author adjustment, before the overall clamp.
  pub raw_total: f64,
  pub score: f64,
}

impl Composition {
  /// Contribution reasons followed by the author adjustment, with signed points.
  pub fn reasons(&self) -> Vec<String> {
    self
      .contributions
      .iter()
      .chain(self.author_adjustment.iter())
      .map(|c| format!("{} ({:+.1})", c.reason, c.points))
      .collect()
  }
}

/// Ordered collection of signals. Order fixes the order of reasons.
pub struct Composer {
  signals: Vec<Box<dyn Signal>>,
}

impl Default for Composer {
  fn default() -> Self {
    Self::standard()
  }
}

impl Composer {
  pub fn empty() -> Self {
    Self { signals: Vec::new() }
  }

  /// Velocity, bursts, then the distributional extractors, then project scale.
  pub fn standard() -> Self {
    Self::empty()
      .with_signal(VelocitySignal)
      .with_signal(BurstSignal)
      .with_signal(UniformitySignal)
      .with_signal(MessageSignal)
      .with_signal(TimeOfDaySignal)
      .with_signal(CommentDensitySignal)
      .with_signal(EntropySignal)
      .with_signal(ProjectScaleSignal)
  }

  pub fn with_signal(mut self, signal: impl Signal + 'static) -> Self {
    self.signals.push(Box::new(signal));
    self
  }

  pub fn names(&self) -> Vec<&'static str> {
    self.signals.iter().map(|s| s.name()).collect()
  }

  pub fn compose(&self, ctx: &AnalysisContext<'_>) -> Composition {
    let config = ctx.config;
    let mut contributions = Vec::new();
    let mut summaries = Vec::with_capacity(self.signals.len());

    for signal in &self.signals {
      let bounds = signal.bounds(config);
      let (evaluation, skipped) = match signal.evaluate(ctx) {
        Ok(eval) => (eval, None),
        Err(e) => {
          debug!(signal = signal.name(), "no contribution: {}", e);
          (Evaluation::default(), Some(e.to_string()))
        }
      };

      // Signals bound themselves; clamp again in case one did not.
      let bounded = bound_contributions(evaluation.contributions, bounds);
      let points: f64 = bounded.iter().map(|c| c.points).sum();
      debug!(signal = signal.name(), points, "signal evaluated");

      summaries.push(SignalSummary {
        name: signal.name().to_string(),
        points,
        min: bounds.min,
        max: bounds.max,
        evidence: evaluation.evidence,
        skipped,
      });
      contributions.extend(bounded);
    }

    let author_adjustment = author_adjustment(distinct_authors(ctx), config);
    let raw_total = summaries.iter().map(|s| s.points).sum::<f64>()
      + author_adjustment.as_ref().map_or(0.0, |c| c.points);
    let score = config.score_bounds.clamp(raw_total);

    Composition {
      contributions,
      signals: summaries,
      author_adjustment,
      raw_total,
      score,
    }
  }
}

/// Distinct non-bot authors among the analyzed commits.
pub fn distinct_authors(ctx: &AnalysisContext<'_>) -> usize {
  ctx
    .commits
    .iter()
    .filter(|c| !c.is_bot)
    .map(|c| c.author.as_str())
    .collect::<BTreeSet<_>>()
    .len()
}

/// Repo-wide author adjustment, applied once: a solo author earns a small
/// bonus, each author beyond two discounts toward the floor.
pub fn author_adjustment(authors: usize, config: &Config) -> Option<SignalContribution> {
  let (points, reason) = match authors {
    0 | 2 => return None,
    1 => (config.solo_author_bonus, "Single author wrote every analyzed commit".to_string()),
    n => (
      -config.per_author_discount * (n - 2) as f64,
      format!("{} distinct human authors contributed", n),
    ),
  };
  let points = config.author_bounds.clamp(points);
  (points.abs() > 1e-9).then(|| {
    SignalContribution::new(AUTHOR_SIGNAL, points, reason).with_evidence(json!({ "authors": authors }))
  })
}
