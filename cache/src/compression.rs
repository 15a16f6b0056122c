//! Storage cost estimation.
//!
//! Nothing is actually compressed here; the estimator predicts how well a
//! serialized payload would compress so that budgets can be enforced on
//! realistic sizes.

/// Lowest ratio the estimator will ever report.
pub const MIN_COMPRESSION_RATIO: f64 = 0.4;
/// Ratio reported for payloads that would not compress at all.
pub const MAX_COMPRESSION_RATIO: f64 = 1.0;

const BASE_RATIO: f64 = 0.7;
const LARGE_PAYLOAD_RATIO: f64 = 0.6;
const MEDIUM_PAYLOAD_RATIO: f64 = 0.65;
const SMALL_PAYLOAD_RATIO: f64 = 0.85;

const LARGE_PAYLOAD_LEN: usize = 10_000;
const MEDIUM_PAYLOAD_LEN: usize = 5_000;
const SMALL_PAYLOAD_LEN: usize = 1_000;

/// Share of structural characters above which a payload compresses better.
const STRUCTURAL_THRESHOLD: f64 = 0.3;
const STRUCTURAL_BONUS: f64 = 0.1;

/// In-memory overhead applied to a serialized payload.
const MEMORY_OVERHEAD_FACTOR: u64 = 2;

#[inline]
fn is_structural(c: char) -> bool {
  matches!(c, '{' | '}' | '[' | ']' | '"' | ':' | ',')
}

/// Estimates the fraction of `payload` that would remain after compression.
///
/// The result is always within
/// [`MIN_COMPRESSION_RATIO`, `MAX_COMPRESSION_RATIO`].
pub fn estimate_compression_ratio(payload: &str) -> f64 {
  let len = payload.len();
  let mut ratio = if len > LARGE_PAYLOAD_LEN {
    LARGE_PAYLOAD_RATIO
  } else if len > MEDIUM_PAYLOAD_LEN {
    MEDIUM_PAYLOAD_RATIO
  } else if len < SMALL_PAYLOAD_LEN {
    SMALL_PAYLOAD_RATIO
  } else {
    BASE_RATIO
  };

  if len > 0 {
    let (chars, structural) = payload.chars().fold((0usize, 0usize), |(n, s), c| {
      (n + 1, s + usize::from(is_structural(c)))
    });
    if structural as f64 / chars as f64 > STRUCTURAL_THRESHOLD {
      ratio -= STRUCTURAL_BONUS;
    }
  }

  ratio.clamp(MIN_COMPRESSION_RATIO, MAX_COMPRESSION_RATIO)
}

/// The estimated footprint of a payload, before and after compression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeEstimate {
  /// Bytes the item occupies without compression.
  pub original: u64,
  /// Bytes the item is charged against the budget.
  pub size: u64,
  /// `size / original`, or exactly 1.0 when compression is disabled.
  pub ratio: f64,
}

/// Estimates how many bytes `payload` costs the cache.
///
/// The serialized length is doubled to account for in-memory overhead and
/// then scaled by the compression ratio when compression is enabled.
pub fn estimate_item_size(payload: &str, compression_enabled: bool) -> SizeEstimate {
  let original = payload.len() as u64 * MEMORY_OVERHEAD_FACTOR;
  if !compression_enabled {
    return SizeEstimate {
      original,
      size: original,
      ratio: MAX_COMPRESSION_RATIO,
    };
  }

  let ratio = estimate_compression_ratio(payload);
  SizeEstimate {
    original,
    size: compressed_size(original, ratio),
    ratio,
  }
}

/// Applies a compression ratio to an uncompressed size.
#[inline]
pub fn compressed_size(original: u64, ratio: f64) -> u64 {
  (original as f64 * ratio).round() as u64
}
