//! Commit-size uniformity: coefficient of variation of per-commit authored lines.

use serde_json::json;

use crate::config::{Bounds, Config};
use crate::error::EngineError;
use crate::signals::{round2, AnalysisContext, Evaluation, Signal};
use crate::stats;
use crate::types::SignalContribution;

/// Low CV on large commits is suspicious; high CV looks human.
pub struct UniformitySignal;

impl Signal for UniformitySignal {
  fn name(&self) -> &'static str {
    "size_uniformity"
  }

  fn bounds(&self, config: &Config) -> Bounds {
    config.uniformity_bounds
  }

  fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Result<Evaluation, EngineError> {
    let config = ctx.config;
    let sizes: Vec<f64> = ctx
      .commits
      .iter()
      .map(|c| c.authored_lines())
      .filter(|&n| n > 0)
      .map(|n| n as f64)
      .collect();
    if sizes.len() < config.uniformity_min_commits {
      return Err(EngineError::insufficient(
        self.name(),
        format!("{} non-empty commits, need {}", sizes.len(), config.uniformity_min_commits),
      ));
    }

    let mean = stats::mean(&sizes)?;
    let cv = stats::coefficient_of_variation(&sizes)?;
    let evidence = json!({ "commits": sizes.len(), "mean_lines": round2(mean), "cv": round2(cv) });
    let mut eval = Evaluation::new(evidence.clone());

    let tier = if cv < config.uniformity_cv_strong && mean > config.uniformity_mean_strong {
      Some((
        config.uniformity_points_strong,
        format!("Commits are uniformly large (mean={:.0}, CV={:.2})", mean, cv),
      ))
    } else if cv < config.uniformity_cv_moderate && mean > config.uniformity_mean_moderate {
      Some((
        config.uniformity_points_moderate,
        format!("Commits are somewhat uniform in size (mean={:.0}, CV={:.2})", mean, cv),
      ))
    } else if cv > config.uniformity_cv_human {
      Some((
        config.uniformity_points_human,
        format!("Commit sizes vary widely, as human work does (CV={:.2})", cv),
      ))
    } else {
      None
    };

    if let Some((points, reason)) = tier {
      eval.push(SignalContribution::new(self.name(), points, reason).with_evidence(evidence));
    }
    Ok(eval)
  }
}
