// SPDX-License-Identifier: MIT

use thiserror::Error;

pub mod value;
pub mod writer;

pub use value::{Rational, SRational, TiffAscii, Value};
pub use writer::{DeferredValue, DirectoryBuilder, Layout, TiffDocument};

pub const TIFF_MAGIC: u16 = 42;
pub const HEADER_LEN: u32 = 8;

#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionMethod {
  None = 1,
  // "Extended JPEG" or "new JPEG" style, used for lossless tiles
  ModernJPEG = 7,
}

impl From<CompressionMethod> for Value {
  fn from(value: CompressionMethod) -> Self {
    Value::Short(vec![value as u16])
  }
}

#[allow(clippy::upper_case_acronyms)]
pub enum PhotometricInterpretation {
  // Defined by DNG
  CFA = 32803,
}

impl From<PhotometricInterpretation> for Value {
  fn from(value: PhotometricInterpretation) -> Self {
    Value::Short(vec![value as u16])
  }
}

pub enum PreviewColorSpace {
  SRgb = 2,
}

impl From<PreviewColorSpace> for Value {
  fn from(value: PreviewColorSpace) -> Self {
    Value::Long(vec![value as u32])
  }
}

/// Error variants for the binary serializer
#[derive(Debug, Error)]
pub enum TiffError {
  /// Overflow of input, size constraints...
  #[error("Overflow error: {}", _0)]
  Overflow(String),

  #[error("General error: {}", _0)]
  General(String),

  #[error("Tag {tag:#06x} declares {expected} values but {actual} were supplied")]
  TagSizeMismatch { tag: u16, expected: usize, actual: usize },

  /// Error on internal cursor type
  #[error("I/O error: {:?}", _0)]
  Io(#[from] std::io::Error),
}

/// Result type for serializer results
pub type Result<T> = std::result::Result<T, TiffError>;
