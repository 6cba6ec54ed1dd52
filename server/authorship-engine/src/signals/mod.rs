//! Independent scoring signals.
//!
//! Every signal turns the filtered, immutable analysis context into zero or
//! more contributions and bounds its own net points. Signals share no state,
//! so the composer may run them in any order; report ordering comes from the
//! composer's fixed signal list.

pub mod comments;
pub mod entropy;
pub mod messages;
pub mod scale;
pub mod time_of_day;
pub mod uniformity;

use crate::config::{Bounds, Config};
use crate::error::EngineError;
use crate::types::{
  AuthoredTotals, CommitRecord, RepositoryMeta, Session, SignalContribution, VelocitySample,
};

/// Read-only view of one run's filtered data.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
  pub config: &'a Config,
  /// Countable, non-bot commits sorted by time.
  pub commits: &'a [&'a CommitRecord],
  pub sessions: &'a [Session],
  pub samples: &'a [VelocitySample],
  pub totals: &'a AuthoredTotals,
  pub repository: Option<&'a RepositoryMeta>,
}

/// What a signal found: its contributions plus raw evidence for the report.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
  pub contributions: Vec<SignalContribution>,
  pub evidence: serde_json::Value,
}

impl Evaluation {
  pub fn new(evidence: serde_json::Value) -> Self {
    Self {
      contributions: Vec::new(),
      evidence,
    }
  }

  pub fn push(&mut self, contribution: SignalContribution) {
    self.contributions.push(contribution);
  }

  pub fn points(&self) -> f64 {
    self.contributions.iter().map(|c| c.points).sum()
  }
}

/// A unit of evidence: filtered data in, bounded contributions out.
pub trait Signal {
  fn name(&self) -> &'static str;

  /// Documented [min, max] range for this signal's net points.
  fn bounds(&self, config: &Config) -> Bounds;

  /// `InsufficientData` and `DegenerateInput` mean "contributes nothing".
  fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Result<Evaluation, EngineError>;
}

/// Clamp a contribution list so its running total stays inside `bounds`.
///
/// Contributions that would push past a bound are trimmed; ones trimmed to
/// nothing are dropped. The returned points sum to the clamped net.
pub fn bound_contributions(
  contributions: Vec<SignalContribution>,
  bounds: Bounds,
) -> Vec<SignalContribution> {
  let mut running = 0.0;
  contributions
    .into_iter()
    .filter_map(|mut c| {
      let next = bounds.clamp(running + c.points);
      c.points = next - running;
      running = next;
      (c.points.abs() > 1e-9).then_some(c)
    })
    .collect()
}

/// Round for display in reasons and evidence.
pub(crate) fn round2(v: f64) -> f64 {
  (v * 100.0).round() / 100.0
}
