//! Engine configuration with sane defaults.
//!
//! Every tier boundary, gap threshold, cap and bound used by the engine lives
//! here so tests can move a boundary without touching the logic. A request may
//! carry a partial `config` object; missing fields take the defaults below.

use serde::{Deserialize, Serialize};

/// Inclusive [min, max] range a signal's net points must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
  pub min: f64,
  pub max: f64,
}

impl Bounds {
  pub const fn new(min: f64, max: f64) -> Self {
    Self { min, max }
  }

  pub fn clamp(&self, value: f64) -> f64 {
    value.max(self.min).min(self.max)
  }

  pub fn contains(&self, value: f64) -> bool {
    value >= self.min - 1e-9 && value <= self.max + 1e-9
  }
}

/// Tunable thresholds for authorship scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  // -- filter ---------------------------------------------------------------
  /// Extra author identities (login, name or email, case-insensitive) treated as bots.
  pub bot_deny_list: Vec<String>,

  // -- sessions -------------------------------------------------------------
  /// Gap (minutes) above which two commits of one author start a new session.
  pub session_gap_minutes: f64,
  /// Duration floor (minutes) for sessions, so single-commit sessions never divide by zero.
  pub min_session_minutes: f64,

  // -- velocity -------------------------------------------------------------
  /// Interval floor (minutes) for lines-per-minute between consecutive commits.
  pub min_interval_minutes: f64,
  /// Median lines/min above which a human is still plausible but fast.
  pub lpm_human_typical: f64,
  pub lpm_suspicious: f64,
  pub lpm_very_suspicious: f64,
  /// Single interval rate considered extreme.
  pub lpm_extreme: f64,
  pub velocity_points_typical: f64,
  pub velocity_points_suspicious: f64,
  pub velocity_points_very_suspicious: f64,
  /// Fraction trimmed from each end before averaging.
  pub trim_fraction: f64,
  /// Trimmed mean / median ratio that counts as a heavy right tail.
  pub tail_ratio: f64,
  pub tail_boost_points: f64,
  /// Extreme-interval fraction above which the extreme boost applies.
  pub extreme_fraction_threshold: f64,
  pub extreme_fraction_multiplier: f64,
  pub extreme_points_cap: f64,
  pub velocity_bounds: Bounds,

  // -- bursts ---------------------------------------------------------------
  pub burst_window_minutes: f64,
  pub burst_min_lines: u64,
  pub burst_min_commits: usize,
  pub burst_single_points: f64,
  /// Number of high-velocity sessions repo-wide before the repo-wide component fires.
  pub burst_repo_min_sessions: usize,
  pub burst_repo_points_per_session: f64,
  pub burst_repo_points_cap: f64,
  pub burst_bounds: Bounds,

  // -- commit-size uniformity -----------------------------------------------
  pub uniformity_min_commits: usize,
  pub uniformity_cv_strong: f64,
  pub uniformity_mean_strong: f64,
  pub uniformity_points_strong: f64,
  pub uniformity_cv_moderate: f64,
  pub uniformity_mean_moderate: f64,
  pub uniformity_points_moderate: f64,
  pub uniformity_cv_human: f64,
  pub uniformity_points_human: f64,
  pub uniformity_bounds: Bounds,

  // -- message patterns -----------------------------------------------------
  pub message_min_commits: usize,
  pub phrasing_tiers: Vec<(f64, f64)>,
  pub conventional_ratio: f64,
  pub conventional_points: f64,
  /// Messages with at least this many non-empty body lines count as verbose.
  pub verbose_body_lines: usize,
  pub verbose_ratio: f64,
  pub verbose_points: f64,
  pub duplicate_ratio: f64,
  pub duplicate_points: f64,
  pub message_bounds: Bounds,

  // -- time of day ----------------------------------------------------------
  pub night_start_hour: u32,
  pub night_end_hour: u32,
  pub night_min_commits: usize,
  pub night_fraction: f64,
  pub night_min_intervals: usize,
  pub night_points: f64,
  pub time_of_day_bounds: Bounds,

  // -- comment density ------------------------------------------------------
  pub comment_min_lines: usize,
  /// (ratio floor, points) tiers, highest first.
  pub comment_tiers: Vec<(f64, f64)>,
  pub comment_sparse_ratio: f64,
  pub comment_sparse_points: f64,
  pub comment_bounds: Bounds,

  // -- diff entropy ---------------------------------------------------------
  pub entropy_min_bytes: usize,
  pub entropy_min_commits: usize,
  pub entropy_very_low: f64,
  pub entropy_very_low_points: f64,
  pub entropy_low: f64,
  pub entropy_low_points: f64,
  pub entropy_high: f64,
  pub entropy_high_points: f64,
  pub entropy_very_high: f64,
  pub entropy_very_high_points: f64,
  pub entropy_bounds: Bounds,

  // -- project scale --------------------------------------------------------
  pub scale_lines_per_day_high: f64,
  pub scale_points_high: f64,
  pub scale_lines_per_day_moderate: f64,
  pub scale_points_moderate: f64,
  pub scale_bounds: Bounds,

  // -- authors + overall ----------------------------------------------------
  pub solo_author_bonus: f64,
  pub per_author_discount: f64,
  pub author_bounds: Bounds,
  pub score_bounds: Bounds,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      bot_deny_list: Vec::new(),

      session_gap_minutes: 120.0,
      min_session_minutes: 1.0,

      min_interval_minutes: 1.0,
      lpm_human_typical: 0.5,
      lpm_suspicious: 3.0,
      lpm_very_suspicious: 8.0,
      lpm_extreme: 50.0,
      velocity_points_typical: 8.0,
      velocity_points_suspicious: 22.0,
      velocity_points_very_suspicious: 35.0,
      trim_fraction: 0.1,
      tail_ratio: 2.0,
      tail_boost_points: 5.0,
      extreme_fraction_threshold: 0.3,
      extreme_fraction_multiplier: 15.0,
      extreme_points_cap: 10.0,
      velocity_bounds: Bounds::new(0.0, 50.0),

      burst_window_minutes: 30.0,
      burst_min_lines: 300,
      burst_min_commits: 2,
      burst_single_points: 6.0,
      burst_repo_min_sessions: 3,
      burst_repo_points_per_session: 2.5,
      burst_repo_points_cap: 10.0,
      burst_bounds: Bounds::new(0.0, 16.0),

      uniformity_min_commits: 5,
      uniformity_cv_strong: 0.4,
      uniformity_mean_strong: 100.0,
      uniformity_points_strong: 15.0,
      uniformity_cv_moderate: 0.6,
      uniformity_mean_moderate: 80.0,
      uniformity_points_moderate: 8.0,
      uniformity_cv_human: 1.0,
      uniformity_points_human: -8.0,
      uniformity_bounds: Bounds::new(-8.0, 15.0),

      message_min_commits: 3,
      phrasing_tiers: vec![(0.7, 8.0), (0.4, 5.0), (0.2, 2.0)],
      conventional_ratio: 0.5,
      conventional_points: 2.0,
      verbose_body_lines: 3,
      verbose_ratio: 0.5,
      verbose_points: 3.0,
      duplicate_ratio: 0.5,
      duplicate_points: 4.0,
      message_bounds: Bounds::new(0.0, 15.0),

      night_start_hour: 0,
      night_end_hour: 6,
      night_min_commits: 5,
      night_fraction: 0.3,
      night_min_intervals: 2,
      night_points: 8.0,
      time_of_day_bounds: Bounds::new(0.0, 8.0),

      comment_min_lines: 50,
      comment_tiers: vec![(0.35, 10.0), (0.25, 6.0), (0.15, 3.0)],
      comment_sparse_ratio: 0.05,
      comment_sparse_points: -5.0,
      comment_bounds: Bounds::new(-5.0, 10.0),

      entropy_min_bytes: 64,
      entropy_min_commits: 3,
      entropy_very_low: 3.5,
      entropy_very_low_points: 10.0,
      entropy_low: 4.0,
      entropy_low_points: 5.0,
      entropy_high: 5.5,
      entropy_high_points: -5.0,
      entropy_very_high: 6.5,
      entropy_very_high_points: -8.0,
      entropy_bounds: Bounds::new(-8.0, 10.0),

      scale_lines_per_day_high: 2000.0,
      scale_points_high: 10.0,
      scale_lines_per_day_moderate: 800.0,
      scale_points_moderate: 5.0,
      scale_bounds: Bounds::new(0.0, 10.0),

      solo_author_bonus: 5.0,
      per_author_discount: 3.0,
      author_bounds: Bounds::new(-15.0, 5.0),
      score_bounds: Bounds::new(-50.0, 100.0),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_override_keeps_defaults() {
    let config: Config =
      serde_json::from_str(r#"{"session_gap_minutes": 30.0, "bot_deny_list": ["ci-user"]}"#)
        .unwrap();
    assert!((config.session_gap_minutes - 30.0).abs() < f64::EPSILON);
    assert_eq!(config.bot_deny_list, vec!["ci-user".to_string()]);
    assert_eq!(config.burst_min_lines, 300);
    assert_eq!(config.score_bounds, Bounds::new(-50.0, 100.0));
  }

  #[test]
  fn bounds_clamp() {
    let b = Bounds::new(-8.0, 15.0);
    assert_eq!(b.clamp(20.0), 15.0);
    assert_eq!(b.clamp(-20.0), -8.0);
    assert_eq!(b.clamp(3.0), 3.0);
    assert!(b.contains(15.0));
    assert!(!b.contains(15.5));
  }
}
