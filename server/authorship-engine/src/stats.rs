//! Small numeric helpers: median, trimmed mean, sample stdev, coefficient of
//! variation and Shannon entropy.
//!
//! Degenerate input (empty slices, zero mean) returns `DegenerateInput`
//! instead of NaN so callers can fall back to a neutral contribution.

use crate::error::EngineError;

fn sorted(values: &[f64]) -> Vec<f64> {
  let mut v = values.to_vec();
  v.sort_by(|a, b| a.total_cmp(b));
  v
}

pub fn mean(values: &[f64]) -> Result<f64, EngineError> {
  if values.is_empty() {
    return Err(EngineError::degenerate("mean of empty set"));
  }
  Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median; even-length input averages the two middle values.
pub fn median(values: &[f64]) -> Result<f64, EngineError> {
  if values.is_empty() {
    return Err(EngineError::degenerate("median of empty set"));
  }
  let v = sorted(values);
  let mid = v.len() / 2;
  if v.len() % 2 == 0 {
    Ok((v[mid - 1] + v[mid]) / 2.0)
  } else {
    Ok(v[mid])
  }
}

/// Mean after dropping `floor(n * fraction)` values from each end.
/// Falls back to the plain mean when trimming would leave nothing.
pub fn trimmed_mean(values: &[f64], fraction: f64) -> Result<f64, EngineError> {
  if values.is_empty() {
    return Err(EngineError::degenerate("trimmed mean of empty set"));
  }
  let v = sorted(values);
  let k = (v.len() as f64 * fraction.clamp(0.0, 0.5)).floor() as usize;
  if v.len() <= 2 * k {
    return mean(&v);
  }
  mean(&v[k..v.len() - k])
}

/// Sample standard deviation (n - 1). A single value has zero spread.
pub fn stdev(values: &[f64]) -> Result<f64, EngineError> {
  let m = mean(values)?;
  if values.len() < 2 {
    return Ok(0.0);
  }
  let var = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
  Ok(var.sqrt())
}

/// stdev / mean.
pub fn coefficient_of_variation(values: &[f64]) -> Result<f64, EngineError> {
  let m = mean(values)?;
  if m.abs() < f64::EPSILON {
    return Err(EngineError::degenerate("coefficient of variation with zero mean"));
  }
  Ok(stdev(values)? / m)
}

/// Shannon entropy in bits per byte (0.0 ..= 8.0). Empty input is 0.
pub fn shannon_entropy(bytes: &[u8]) -> f64 {
  if bytes.is_empty() {
    return 0.0;
  }
  let mut counts = [0u64; 256];
  for &b in bytes {
    counts[b as usize] += 1;
  }
  let n = bytes.len() as f64;
  counts
    .iter()
    .filter(|&&c| c > 0)
    .map(|&c| {
      let p = c as f64 / n;
      -p * p.log2()
    })
    .sum()
}
