//! The `"m-n"` alignment-cardinality tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How many source sentences align to how many target sentences in one
/// link, e.g. `2-1` for two source sentences aligned to a single target
/// sentence. Empty alignments (`0-1`, `1-0`) are valid.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct AlignType {
  pub src: u32,
  pub trg: u32,
}

impl AlignType {
  /// Derive the tag from the cardinalities of the two local-ID groups as
  /// given in the raw record.
  pub fn of_groups(src_len: usize, trg_len: usize) -> Self {
    Self { src: src_len as u32, trg: trg_len as u32 }
  }

  /// The tag with its halves exchanged — `2-1` becomes `1-2`. Used when a
  /// link direction is reversed during a merge.
  pub fn swapped(self) -> Self {
    Self { src: self.trg, trg: self.src }
  }
}

impl fmt::Display for AlignType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.src, self.trg)
  }
}

impl FromStr for AlignType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let (src, trg) = s
      .split_once('-')
      .ok_or_else(|| Error::InvalidAlignType(s.to_owned()))?;
    let parse = |half: &str| {
      half
        .parse::<u32>()
        .map_err(|_| Error::InvalidAlignType(s.to_owned()))
    };
    Ok(Self { src: parse(src)?, trg: parse(trg)? })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn derived_from_group_sizes() {
    assert_eq!(AlignType::of_groups(2, 1).to_string(), "2-1");
    assert_eq!(AlignType::of_groups(0, 1).to_string(), "0-1");
  }

  #[test]
  fn swap_exchanges_halves() {
    let t: AlignType = "2-1".parse().unwrap();
    assert_eq!(t.swapped().to_string(), "1-2");
  }

  #[test]
  fn rejects_malformed_tags() {
    assert!("21".parse::<AlignType>().is_err());
    assert!("a-b".parse::<AlignType>().is_err());
    assert!("1-".parse::<AlignType>().is_err());
  }
}
