// SPDX-License-Identifier: LGPL-2.1

//! Assembly of the raw IFD. Takes the decoded and corrected frame state
//! plus the tile payload and produces the finished DNG byte stream.

use log::debug;

use crate::cfa::CFA;
use crate::dng::{ColorCalibration, DNG_BACKWARD_VERSION_V1_2, DNG_VERSION_V1_4};
use crate::exif::Metadata;
use crate::formats::tiff::{CompressionMethod, DeferredValue, DirectoryBuilder, PhotometricInterpretation, PreviewColorSpace, TiffDocument, Value};
use crate::sensor::SensorProfile;
use crate::tags::{self, DngTag, TiffTag};
use crate::Result;

/// Everything the IFD assembly needs to know about one frame.
pub struct DngFrame<'a> {
  /// Declared image dimensions, which may come from camera metadata.
  pub width: u32,
  pub length: u32,
  /// Actual raster dimensions of the single tile.
  pub tile_width: u32,
  pub tile_length: u32,
  pub bpp: u8,
  pub compression: CompressionMethod,
  pub cfa: &'a CFA,
  pub profile: &'a SensorProfile,
  pub metadata: &'a Metadata,
}

impl DngFrame<'_> {
  pub fn black_level(&self) -> u16 {
    4096_u16 >> (16 - self.bpp as u32)
  }

  pub fn white_level(&self) -> u16 {
    ((1_u32 << self.bpp) - 1) as u16
  }
}

fn add<T: Into<u16>, V: Into<Value>>(ifd: &mut DirectoryBuilder, tag: T, value: V) -> Result<()> {
  let tag = tag.into();
  match tags::expected_count(tag) {
    Some(expected) => ifd.add_tag_checked(tag, expected, value)?,
    None => ifd.add_tag(tag, value),
  }
  Ok(())
}

/// Build and serialize the single-IFD DNG document around one tile.
pub fn render_dng(frame: &DngFrame<'_>, tile: Vec<u8>) -> Result<Vec<u8>> {
  let mut ifd = DirectoryBuilder::new();
  let meta = frame.metadata;

  add(&mut ifd, TiffTag::NewSubfileType, 0_u32)?;
  add(&mut ifd, TiffTag::ImageWidth, frame.width)?;
  add(&mut ifd, TiffTag::ImageLength, frame.length)?;
  add(&mut ifd, TiffTag::BitsPerSample, frame.bpp as u16)?;
  add(&mut ifd, TiffTag::Compression, frame.compression)?;
  add(&mut ifd, TiffTag::PhotometricInt, PhotometricInterpretation::CFA)?;
  add(&mut ifd, TiffTag::Orientation, 1_u16)?;
  add(&mut ifd, TiffTag::SamplesPerPixel, 1_u16)?;
  add(&mut ifd, TiffTag::Software, "rpidng")?;
  add(&mut ifd, TiffTag::TileWidth, frame.tile_width)?;
  add(&mut ifd, TiffTag::TileLength, frame.tile_length)?;
  ifd.add_deferred(TiffTag::TileOffsets, DeferredValue::TileOffsets);
  ifd.add_deferred(TiffTag::TileByteCounts, DeferredValue::TileByteCounts);

  add(&mut ifd, DngTag::CFARepeatPatternDim, [2_u16, 2])?;
  add(&mut ifd, DngTag::CFAPattern, frame.cfa.flat_pattern())?;
  add(&mut ifd, DngTag::CFAPlaneColor, [0_u8, 1, 2])?;
  add(&mut ifd, DngTag::BlackLevel, frame.black_level())?;
  add(&mut ifd, DngTag::WhiteLevel, frame.white_level())?;

  add(&mut ifd, DngTag::DNGVersion, DNG_VERSION_V1_4)?;
  add(&mut ifd, DngTag::DNGBackwardVersion, DNG_BACKWARD_VERSION_V1_2)?;
  add(&mut ifd, DngTag::UniqueCameraModel, frame.profile.description)?;
  add(&mut ifd, DngTag::PreviewColorSpace, PreviewColorSpace::SRgb)?;

  let calibration = ColorCalibration::for_model(frame.profile.model);
  add(&mut ifd, DngTag::ColorMatrix1, calibration.color_matrix1())?;
  add(&mut ifd, DngTag::ColorMatrix2, calibration.color_matrix2())?;
  add(&mut ifd, DngTag::AsShotNeutral, calibration.as_shot_neutral())?;
  add(&mut ifd, DngTag::CalibrationIlluminant1, calibration.illuminant1)?;
  add(&mut ifd, DngTag::CalibrationIlluminant2, calibration.illuminant2)?;

  if let Some(make) = meta.make() {
    add(&mut ifd, TiffTag::Make, make)?;
  }
  if let Some(model) = meta.model() {
    add(&mut ifd, TiffTag::Model, model)?;
  }
  if let Some(datetime) = meta.datetime() {
    add(&mut ifd, TiffTag::DateTime, datetime)?;
  }
  if let Some(exposure) = meta.exposure_time() {
    add(&mut ifd, TiffTag::ExposureTime, exposure)?;
  }
  if let Some(shutter) = meta.shutter_speed() {
    add(&mut ifd, TiffTag::ShutterSpeedValue, shutter)?;
  }
  if let Some(aperture) = meta.aperture() {
    add(&mut ifd, TiffTag::ApertureValue, aperture)?;
  }
  if let Some(focal) = meta.focal_length() {
    add(&mut ifd, TiffTag::FocalLength, focal)?;
  }
  if let Some(iso) = meta.iso() {
    add(&mut ifd, TiffTag::ISOSpeed, iso)?;
  }

  let document = TiffDocument::new(ifd, vec![tile]);
  let layout = document.layout()?;
  debug!("DNG layout: {} directory entries, {} bytes total", document.ifd.entry_count(), layout.total_len);
  Ok(document.serialize()?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bits::{LEu16, LEu32};
  use crate::cfa::BayerOrder;
  use crate::sensor::profile_for;

  fn entry(data: &[u8], tag: u16) -> Option<(u16, u32, u32)> {
    let n = LEu16(data, 8) as usize;
    (0..n).map(|i| 10 + 12 * i).find(|base| LEu16(data, *base) == tag).map(|base| (LEu16(data, base + 2), LEu32(data, base + 4), LEu32(data, base + 8)))
  }

  fn sample_frame<'a>(cfa: &'a CFA, metadata: &'a Metadata) -> DngFrame<'a> {
    DngFrame {
      width: 8,
      length: 2,
      tile_width: 8,
      tile_length: 2,
      bpp: 10,
      compression: CompressionMethod::None,
      cfa,
      profile: profile_for("RP_ov5647").unwrap(),
      metadata,
    }
  }

  #[test]
  fn levels_follow_bit_depth() {
    let cfa = BayerOrder::Bggr.cfa();
    let meta = Metadata::new();
    let mut frame = sample_frame(&cfa, &meta);
    assert_eq!(frame.black_level(), 64);
    assert_eq!(frame.white_level(), 1023);
    frame.bpp = 12;
    assert_eq!(frame.black_level(), 256);
    assert_eq!(frame.white_level(), 4095);
  }

  #[test]
  fn mandatory_tags_are_written() -> anyhow::Result<()> {
    let cfa = BayerOrder::Bggr.cfa();
    let meta = Metadata::new();
    let data = render_dng(&sample_frame(&cfa, &meta), vec![0_u8; 20])?;

    assert_eq!(&data[0..2], b"II");
    assert_eq!(LEu16(&data, 2), 42);
    // (type, count, value) triples
    assert_eq!(entry(&data, 256), Some((4, 1, 8))); // ImageWidth
    assert_eq!(entry(&data, 259), Some((3, 1, 1))); // Compression
    assert_eq!(entry(&data, 262), Some((3, 1, 32803)));
    assert_eq!(entry(&data, 50714), Some((3, 1, 64))); // BlackLevel
    assert_eq!(entry(&data, 50717), Some((3, 1, 1023))); // WhiteLevel
    assert_eq!(entry(&data, 50706), Some((1, 4, u32::from_le_bytes([1, 4, 0, 0]))));
    assert_eq!(entry(&data, 33422), Some((1, 4, u32::from_le_bytes([2, 1, 1, 0]))));
    Ok(())
  }

  #[test]
  fn metadata_tags_appear_when_present() -> anyhow::Result<()> {
    let cfa = BayerOrder::Bggr.cfa();
    let meta: Metadata = [("Image Make", "RaspberryPi"), ("EXIF ISOSpeedRatings", "200"), ("EXIF ExposureTime", "1/30")].into_iter().collect();
    let data = render_dng(&sample_frame(&cfa, &meta), vec![0_u8; 20])?;
    assert_eq!(entry(&data, 271).map(|e| e.0), Some(2)); // Make, ASCII
    assert_eq!(entry(&data, 0x8827), Some((3, 1, 200)));
    let (vtype, count, offset) = entry(&data, 0x829a).unwrap();
    assert_eq!((vtype, count), (5, 1));
    assert_eq!(LEu32(&data, offset as usize), 1);
    assert_eq!(LEu32(&data, offset as usize + 4), 30);
    Ok(())
  }

  #[test]
  fn absent_metadata_leaves_tags_out() -> anyhow::Result<()> {
    let cfa = BayerOrder::Bggr.cfa();
    let meta = Metadata::new();
    let data = render_dng(&sample_frame(&cfa, &meta), vec![0_u8; 20])?;
    assert_eq!(entry(&data, 271), None);
    assert_eq!(entry(&data, 0x829a), None);
    Ok(())
  }
}
