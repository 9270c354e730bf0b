//! Row-ID ranges over the link table and the overlap validator.
//!
//! A range is the contiguous span of insertion-order positions belonging to
//! one bitext or one corpus release. Ranges are recomputed from the store
//! after each bitext finishes, never incrementally patched, so they
//! self-heal from interrupted runs.

use serde::{Deserialize, Serialize};

/// Inclusive span of link-table insertion positions.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct LinkRange {
  pub start: i64,
  pub end:   i64,
}

impl LinkRange {
  /// Build a range from raw `MIN(rowid)`/`MAX(rowid)` bounds. Unset bounds
  /// and a zero start mean "never populated" and yield no range — an absent
  /// scope, not a zero-length interval at position 0.
  pub fn from_bounds(start: Option<i64>, end: Option<i64>) -> Option<Self> {
    match (start, end) {
      (Some(start), Some(end)) if start > 0 && end > 0 => {
        Some(Self { start, end })
      }
      _ => None,
    }
  }

  /// Closed-interval overlap test: holds iff `!(x2 < y1 || x1 > y2)`.
  /// Adjacent ranges such as `(10,50)` and `(51,90)` do not overlap.
  pub fn overlaps(self, other: Self) -> bool {
    !(self.end < other.start || self.start > other.end)
  }
}

/// A range attributed to one scope (a bitext or a corpus release).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedRange {
  /// Human-readable scope identity, e.g. `corpus/version/srclang-trglang`.
  pub scope: String,
  pub range: LinkRange,
}

/// Two distinct scopes whose ranges intersect — a structural-integrity
/// fault (duplicate or misattributed ingestion). Reported, never repaired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeOverlap {
  pub a: ScopedRange,
  pub b: ScopedRange,
}

impl std::fmt::Display for RangeOverlap {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{} and {} overlap! ({},{}) and ({},{})",
      self.a.scope,
      self.b.scope,
      self.a.range.start,
      self.a.range.end,
      self.b.range.start,
      self.b.range.end
    )
  }
}

/// Pairwise overlap scan over one family of scopes. Each unordered pair is
/// reported at most once. Idempotent and repeatable by construction.
pub fn find_overlaps(ranges: &[ScopedRange]) -> Vec<RangeOverlap> {
  let mut overlaps = Vec::new();
  for (i, a) in ranges.iter().enumerate() {
    for b in &ranges[i + 1..] {
      if a.range.overlaps(b.range) {
        overlaps.push(RangeOverlap { a: a.clone(), b: b.clone() });
      }
    }
  }
  overlaps
}

#[cfg(test)]
mod tests {
  use super::*;

  fn scoped(scope: &str, start: i64, end: i64) -> ScopedRange {
    ScopedRange {
      scope: scope.to_owned(),
      range: LinkRange { start, end },
    }
  }

  #[test]
  fn adjacent_ranges_do_not_overlap() {
    let ranges = vec![scoped("a", 10, 50), scoped("b", 51, 90)];
    assert!(find_overlaps(&ranges).is_empty());
  }

  #[test]
  fn intersecting_ranges_reported_once() {
    let ranges = vec![scoped("a", 10, 50), scoped("b", 40, 90)];
    let overlaps = find_overlaps(&ranges);
    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].a.scope, "a");
    assert_eq!(overlaps[0].b.scope, "b");
    assert_eq!(overlaps[0].a.range, LinkRange { start: 10, end: 50 });
    assert_eq!(overlaps[0].b.range, LinkRange { start: 40, end: 90 });
  }

  #[test]
  fn containment_counts_as_overlap() {
    let ranges = vec![scoped("outer", 1, 100), scoped("inner", 20, 30)];
    assert_eq!(find_overlaps(&ranges).len(), 1);
  }

  #[test]
  fn unset_bounds_yield_no_range() {
    assert_eq!(LinkRange::from_bounds(None, None), None);
    assert_eq!(LinkRange::from_bounds(Some(0), Some(0)), None);
    assert_eq!(
      LinkRange::from_bounds(Some(3), Some(7)),
      Some(LinkRange { start: 3, end: 7 })
    );
  }
}
