//! Project-scale plausibility: authored lines per active day since the
//! repository was created. Needs repository metadata; silent without it.

use serde_json::json;

use crate::config::{Bounds, Config};
use crate::error::EngineError;
use crate::signals::{round2, AnalysisContext, Evaluation, Signal};
use crate::types::SignalContribution;

pub struct ProjectScaleSignal;

impl Signal for ProjectScaleSignal {
  fn name(&self) -> &'static str {
    "project_scale"
  }

  fn bounds(&self, config: &Config) -> Bounds {
    config.scale_bounds
  }

  fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Result<Evaluation, EngineError> {
    let config = ctx.config;
    let created_at = ctx
      .repository
      .and_then(|r| r.created_at)
      .ok_or_else(|| EngineError::insufficient(self.name(), "no repository creation timestamp"))?;
    let last = ctx
      .commits
      .iter()
      .map(|c| c.timestamp)
      .max()
      .ok_or_else(|| EngineError::insufficient(self.name(), "no authored commits"))?;

    // Floor to one day so a same-day project cannot divide by zero.
    let active_days = ((last - created_at).num_hours() as f64 / 24.0).max(1.0);
    let per_day = ctx.totals.authored_total as f64 / active_days;
    let evidence = json!({
      "authored_total": ctx.totals.authored_total,
      "active_days": round2(active_days),
      "lines_per_day": round2(per_day),
    });
    let mut eval = Evaluation::new(evidence.clone());

    let points = if per_day > config.scale_lines_per_day_high {
      config.scale_points_high
    } else if per_day > config.scale_lines_per_day_moderate {
      config.scale_points_moderate
    } else {
      0.0
    };
    if points > 0.0 {
      eval.push(
        SignalContribution::new(
          self.name(),
          points,
          format!(
            "{} authored lines over {:.0} active day(s) ({:.0} lines/day)",
            ctx.totals.authored_total, active_days, per_day
          ),
        )
        .with_evidence(evidence),
      );
    }
    Ok(eval)
  }
}
