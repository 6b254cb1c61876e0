// SPDX-License-Identifier: LGPL-2.1

//! Library for converting Raspberry Pi camera raw captures into DNG files.
//!
//! The Pi camera firmware appends the raw sensor readout to every JPEG it
//! writes. This crate locates that container, unpacks the vendor bit
//! packing for the known sensor generations (OV5647, IMX219, IMX477),
//! optionally applies dark-frame and flat-field correction, and serializes
//! a single-IFD DNG with the factory color calibration.
//!
//! ```no_run
//! use rpidng::{ConvertParams, Converter, Metadata, RawInput};
//!
//! fn main() -> rpidng::Result<()> {
//!   let metadata: Metadata = [("Image Model", "RP_imx477")].into_iter().collect();
//!   let input = RawInput::open("capture.jpg")?;
//!   let dng = Converter::new().convert(&input, &metadata, &ConvertParams::default())?;
//!   std::fs::write("capture.dng", dng)?;
//!   Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod bits;
pub mod brcm;
pub mod cfa;
pub mod convert;
pub mod correction;
pub mod dng;
pub mod exif;
pub mod formats;
pub mod packed;
pub mod pixarray;
pub mod sensor;
pub mod tags;

pub use convert::{ConvertParams, Converter, RawInput};
pub use exif::Metadata;
pub use pixarray::PixU16;

#[derive(Debug, Error)]
pub enum Error {
  #[error("Unsupported camera model: {0}")]
  UnsupportedSensor(String),

  #[error("Raw container truncated: need {expected} bytes, got {actual}")]
  TruncatedContainer { expected: usize, actual: usize },

  #[error("Raw container signature mismatch")]
  InvalidSignature,

  #[error("Correction requested without a {0} frame")]
  MissingCorrectionFrame(&'static str),

  #[error("Correction frame is {frame_width}x{frame_height}, image is {width}x{height}")]
  CorrectionFrameMismatch {
    frame_width: usize,
    frame_height: usize,
    width: usize,
    height: usize,
  },

  #[error("Zero shading value at ({row}, {col}) during normalization")]
  DivideByZeroInNormalization { row: usize, col: usize },

  #[error("Invalid input: {0}")]
  InvalidInputKind(String),

  #[error("Unsupported output bit depth: {0}")]
  UnsupportedBitDepth(u8),

  #[error("Compression requested but no codec is configured")]
  CompressorUnavailable,

  #[error("TIFF serialization failed: {0}")]
  Tiff(#[from] formats::tiff::TiffError),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// One-call conversion with default settings: read the camera JPEG at
/// `path` and write `<stem>.dng` next to it.
pub fn convert_file<P: AsRef<Path>>(path: P, metadata: &Metadata, params: &ConvertParams) -> Result<PathBuf> {
  Converter::new().convert_file(path, metadata, params)
}
