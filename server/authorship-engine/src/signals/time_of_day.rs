//! Commit time-of-day clustering (UTC hours).
//!
//! Off-hours commits alone never score: the signal needs both a large share
//! of commits in the low-activity window and sustained velocity inside it.

use chrono::Timelike;
use serde_json::json;

use crate::config::{Bounds, Config};
use crate::error::EngineError;
use crate::signals::{round2, AnalysisContext, Evaluation, Signal};
use crate::stats;
use crate::types::SignalContribution;

fn in_window(hour: u32, config: &Config) -> bool {
  if config.night_start_hour <= config.night_end_hour {
    hour >= config.night_start_hour && hour < config.night_end_hour
  } else {
    // Window wraps midnight, e.g. 22:00-05:00.
    hour >= config.night_start_hour || hour < config.night_end_hour
  }
}

/// Hour-of-day histogram of commits.
pub fn hour_histogram<I: IntoIterator<Item = u32>>(hours: I) -> [usize; 24] {
  let mut histogram = [0usize; 24];
  for h in hours {
    histogram[(h % 24) as usize] += 1;
  }
  histogram
}

pub struct TimeOfDaySignal;

impl Signal for TimeOfDaySignal {
  fn name(&self) -> &'static str {
    "time_of_day"
  }

  fn bounds(&self, config: &Config) -> Bounds {
    config.time_of_day_bounds
  }

  fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Result<Evaluation, EngineError> {
    let config = ctx.config;
    let total = ctx.commits.len();
    if total < config.night_min_commits {
      return Err(EngineError::insufficient(self.name(), format!("{} commits", total)));
    }

    let histogram = hour_histogram(ctx.commits.iter().map(|c| c.timestamp.hour()));
    let night: usize = (0..24u32)
      .filter(|h| in_window(*h, config))
      .map(|h| histogram[h as usize])
      .sum();
    let night_fraction = night as f64 / total as f64;

    let night_rates: Vec<f64> = ctx
      .samples
      .iter()
      .filter(|s| in_window(s.at.hour(), config))
      .map(|s| s.lines_per_minute)
      .collect();
    let night_median = stats::median(&night_rates).ok();

    let mut eval = Evaluation::new(json!({
      "histogram": histogram.to_vec(),
      "window": [config.night_start_hour, config.night_end_hour],
      "night_commits": night,
      "night_fraction": round2(night_fraction),
      "night_intervals": night_rates.len(),
      "night_median_lpm": night_median.map(round2),
    }));

    let sustained = night_rates.len() >= config.night_min_intervals
      && night_median.is_some_and(|m| m >= config.lpm_suspicious);
    if night_fraction > config.night_fraction && sustained {
      eval.push(
        SignalContribution::new(
          self.name(),
          config.night_points,
          format!(
            "{:.0}% of commits land between {:02}:00 and {:02}:00 UTC at a sustained {:.1} lines/min",
            night_fraction * 100.0,
            config.night_start_hour,
            config.night_end_hour,
            night_median.unwrap_or_default()
          ),
        )
        .with_evidence(json!({
          "night_fraction": round2(night_fraction),
          "night_median_lpm": night_median.map(round2),
        })),
      );
    }
    Ok(eval)
  }
}
