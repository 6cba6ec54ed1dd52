//! Diff entropy: Shannon entropy (bits per byte) of each commit's added text.
//!
//! The repo value is the unweighted mean over qualifying commits, so a single
//! very large commit cannot dominate.

use serde_json::json;

use crate::config::{Bounds, Config};
use crate::error::EngineError;
use crate::signals::{round2, AnalysisContext, Evaluation, Signal};
use crate::stats;
use crate::types::{CommitRecord, SignalContribution};

/// Added-line text of a commit's authored files, lines joined by `\n`.
pub fn added_text(commit: &CommitRecord) -> Vec<u8> {
  let mut out = Vec::new();
  for line in commit.authored_files().flat_map(|f| f.added_lines()) {
    out.extend_from_slice(line.as_bytes());
    out.push(b'\n');
  }
  out
}

pub struct EntropySignal;

impl Signal for EntropySignal {
  fn name(&self) -> &'static str {
    "diff_entropy"
  }

  fn bounds(&self, config: &Config) -> Bounds {
    config.entropy_bounds
  }

  fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Result<Evaluation, EngineError> {
    let config = ctx.config;
    let per_commit: Vec<f64> = ctx
      .commits
      .iter()
      .map(|c| added_text(c))
      .filter(|text| text.len() >= config.entropy_min_bytes)
      .map(|text| stats::shannon_entropy(&text))
      .collect();
    if per_commit.len() < config.entropy_min_commits {
      return Err(EngineError::insufficient(
        self.name(),
        format!("{} commits with patch text, need {}", per_commit.len(), config.entropy_min_commits),
      ));
    }

    let mean = stats::mean(&per_commit)?;
    let min = per_commit.iter().copied().fold(f64::INFINITY, f64::min);
    let max = per_commit.iter().copied().fold(0.0, f64::max);
    let evidence = json!({
      "commits": per_commit.len(),
      "mean_bits_per_byte": round2(mean),
      "min_bits_per_byte": round2(min),
      "max_bits_per_byte": round2(max),
      "weighting": "unweighted",
    });
    let mut eval = Evaluation::new(evidence.clone());

    let tier = if mean < config.entropy_very_low {
      Some((config.entropy_very_low_points, "very formulaic"))
    } else if mean < config.entropy_low {
      Some((config.entropy_low_points, "formulaic"))
    } else if mean > config.entropy_very_high {
      Some((config.entropy_very_high_points, "highly varied"))
    } else if mean > config.entropy_high {
      Some((config.entropy_high_points, "varied"))
    } else {
      None
    };
    if let Some((points, label)) = tier {
      eval.push(
        SignalContribution::new(
          self.name(),
          points,
          format!("Added code is {} (mean entropy {:.2} bits/byte)", label, mean),
        )
        .with_evidence(evidence),
      );
    }
    Ok(eval)
  }
}
