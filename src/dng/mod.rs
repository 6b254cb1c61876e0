// SPDX-License-Identifier: LGPL-2.1

//! DNG output: version constants, the per-camera color calibration block
//! and the document assembly in [`writer`].

use crate::formats::tiff::{Rational, SRational};
use crate::pixarray::PixU16;
use crate::Result;

pub mod writer;

pub const DNG_VERSION_V1_4: [u8; 4] = [1, 4, 0, 0];
pub const DNG_BACKWARD_VERSION_V1_2: [u8; 4] = [1, 2, 0, 0];

/// All calibration fractions share this denominator.
const CALIBRATION_DENOM: u32 = 10_000;

/// Illuminant codes from the Exif LightSource table.
pub const ILLUMINANT_DAYLIGHT: u16 = 1;
pub const ILLUMINANT_STANDARD_A: u16 = 17;
pub const ILLUMINANT_D65: u16 = 21;
pub const ILLUMINANT_D50: u16 = 23;

/// Factory color calibration for one camera generation: two illuminant
/// profiles plus the white balance of the shot conditions they were
/// measured under.
pub struct ColorCalibration {
  pub illuminant1: u16,
  pub illuminant2: u16,
  color_matrix1: [i32; 9],
  color_matrix2: [i32; 9],
  as_shot_neutral: [u32; 3],
}

const CALIBRATION_HQ: ColorCalibration = ColorCalibration {
  illuminant1: ILLUMINANT_STANDARD_A,
  illuminant2: ILLUMINANT_D65,
  color_matrix1: [16804, -9787, -2259, -3295, 13660, -113, -307, 1590, 6367],
  color_matrix2: [6883, -1326, -981, -4557, 13643, 632, -1285, 2585, 4512],
  as_shot_neutral: [3108, 10_000, 6687],
};

const CALIBRATION_LEGACY: ColorCalibration = ColorCalibration {
  illuminant1: ILLUMINANT_DAYLIGHT,
  illuminant2: ILLUMINANT_D50,
  color_matrix1: [19549, -7877, -2582, -5724, 10121, 1917, -1267, -110, 6621],
  color_matrix2: [13244, -5501, -1248, -1508, 9858, 1935, -270, -1083, 4366],
  as_shot_neutral: [10043, 16090, 10_000],
};

impl ColorCalibration {
  pub fn for_model(model: &str) -> &'static Self {
    match model {
      "RP_testc" | "RP_imx477" => &CALIBRATION_HQ,
      _ => &CALIBRATION_LEGACY,
    }
  }

  pub fn color_matrix1(&self) -> [SRational; 9] {
    self.color_matrix1.map(|n| SRational::new(n, CALIBRATION_DENOM as i32))
  }

  pub fn color_matrix2(&self) -> [SRational; 9] {
    self.color_matrix2.map(|n| SRational::new(n, CALIBRATION_DENOM as i32))
  }

  pub fn as_shot_neutral(&self) -> [Rational; 3] {
    self.as_shot_neutral.map(|n| Rational::new(n, CALIBRATION_DENOM))
  }
}

/// Boundary for an external lossless JPEG codec. The converter never
/// entropy-codes itself; a caller wanting Compression=7 tiles plugs an
/// implementation in here.
pub trait LosslessCompressor: Send + Sync {
  /// Encode the grid as one tile of `tile_width` x `tile_length` samples
  /// at `bpp` bits of precision. `max_compress` trades speed for size.
  fn compress(&self, grid: &PixU16, tile_width: usize, tile_length: usize, bpp: u8, max_compress: bool) -> Result<Vec<u8>>;
}
