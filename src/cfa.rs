use std::fmt;

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

pub const CFA_COLOR_R: usize = 0;
pub const CFA_COLOR_G: usize = 1;
pub const CFA_COLOR_B: usize = 2;

/// Bayer mosaic order as encoded in the vendor raw header. Only the four
/// 2x2 RGGB permutations exist.
#[derive(Clone, Copy, Debug, Eq, PartialEq, TryFromPrimitive, Serialize, Deserialize)]
#[repr(u8)]
pub enum BayerOrder {
  Rggb = 0,
  Gbrg = 1,
  Bggr = 2,
  Grbg = 3,
}

impl BayerOrder {
  /// CFA colors for the four quadrants in (row-parity, col-parity) order:
  /// (0,0), (0,1), (1,0), (1,1).
  pub fn pattern(&self) -> [usize; 4] {
    match self {
      Self::Rggb => [0, 1, 1, 2],
      Self::Gbrg => [1, 2, 0, 1],
      Self::Bggr => [2, 1, 1, 0],
      Self::Grbg => [1, 0, 2, 1],
    }
  }

  pub fn cfa(&self) -> CFA {
    CFA::new(self.pattern())
  }
}

/// 2x2 color filter array pattern.
///
/// # Example
/// ```
/// use rpidng::cfa::BayerOrder;
/// let cfa = BayerOrder::Rggb.cfa();
/// assert_eq!(cfa.color_at(0, 0), 0);
/// assert_eq!(cfa.color_at(0, 1), 1);
/// assert_eq!(cfa.color_at(1, 0), 1);
/// assert_eq!(cfa.color_at(1, 1), 2);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CFA {
  pattern: [usize; 4],
}

impl CFA {
  pub fn new(pattern: [usize; 4]) -> Self {
    Self { pattern }
  }

  /// Color index at the given position, determined by row/column parity.
  /// Designed to be callable from inner loops.
  #[inline]
  pub fn color_at(&self, row: usize, col: usize) -> usize {
    self.pattern[(row % 2) * 2 + (col % 2)]
  }

  /// Pattern as written into the CFAPattern tag.
  pub fn flat_pattern(&self) -> [u8; 4] {
    [
      self.pattern[0] as u8,
      self.pattern[1] as u8,
      self.pattern[2] as u8,
      self.pattern[3] as u8,
    ]
  }
}

impl fmt::Display for CFA {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for c in self.pattern {
      f.write_str(match c {
        CFA_COLOR_R => "R",
        CFA_COLOR_G => "G",
        CFA_COLOR_B => "B",
        _ => "U",
      })?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn all_orders_are_rggb_permutations() {
    for order in [BayerOrder::Rggb, BayerOrder::Gbrg, BayerOrder::Bggr, BayerOrder::Grbg] {
      let mut pat = order.pattern();
      pat.sort_unstable();
      assert_eq!(pat, [0, 1, 1, 2]);
    }
  }

  #[test]
  fn bggr_positions() {
    let cfa = BayerOrder::Bggr.cfa();
    assert_eq!(cfa.color_at(0, 0), CFA_COLOR_B);
    assert_eq!(cfa.color_at(1, 1), CFA_COLOR_R);
    assert_eq!(cfa.to_string(), "BGGR");
  }

  #[test]
  fn order_from_header_byte() {
    assert_eq!(BayerOrder::try_from(2_u8).unwrap(), BayerOrder::Bggr);
    assert!(BayerOrder::try_from(7_u8).is_err());
  }
}
