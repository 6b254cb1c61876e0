// SPDX-License-Identifier: LGPL-2.1

//! Tag ids for the single raw IFD written into the output file.

/// Baseline TIFF and Exif tags.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u16)]
pub enum TiffTag {
  NewSubfileType = 254,
  ImageWidth = 256,
  ImageLength = 257,
  BitsPerSample = 258,
  Compression = 259,
  PhotometricInt = 262,
  Make = 271,
  Model = 272,
  Orientation = 274,
  SamplesPerPixel = 277,
  Software = 305,
  DateTime = 306,
  TileWidth = 322,
  TileLength = 323,
  TileOffsets = 324,
  TileByteCounts = 325,
  ExposureTime = 0x829a,
  ISOSpeed = 0x8827,
  ShutterSpeedValue = 0x9201,
  ApertureValue = 0x9202,
  FocalLength = 0x920a,
}

impl From<TiffTag> for u16 {
  fn from(value: TiffTag) -> Self {
    value as u16
  }
}

/// DNG extension tags, as defined by the DNG 1.4 specification.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u16)]
pub enum DngTag {
  CFARepeatPatternDim = 33421,
  CFAPattern = 33422,
  DNGVersion = 50706,
  DNGBackwardVersion = 50707,
  UniqueCameraModel = 50708,
  CFAPlaneColor = 50710,
  BlackLevel = 50714,
  WhiteLevel = 50717,
  ColorMatrix1 = 50721,
  ColorMatrix2 = 50722,
  AsShotNeutral = 50728,
  CalibrationIlluminant1 = 50778,
  CalibrationIlluminant2 = 50779,
  PreviewColorSpace = 50970,
}

impl From<DngTag> for u16 {
  fn from(value: DngTag) -> Self {
    value as u16
  }
}

/// Value count fixed by the tag definition, where one exists. Tags with a
/// data-dependent count return `None`.
pub fn expected_count(tag: u16) -> Option<usize> {
  match tag {
    t if t == DngTag::CFARepeatPatternDim as u16 => Some(2),
    t if t == DngTag::CFAPattern as u16 => Some(4),
    t if t == DngTag::CFAPlaneColor as u16 => Some(3),
    t if t == DngTag::DNGVersion as u16 => Some(4),
    t if t == DngTag::DNGBackwardVersion as u16 => Some(4),
    t if t == DngTag::AsShotNeutral as u16 => Some(3),
    t if t == DngTag::ColorMatrix1 as u16 => Some(9),
    t if t == DngTag::ColorMatrix2 as u16 => Some(9),
    _ => None,
  }
}
