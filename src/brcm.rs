//! Broadcom raw container parsing. The camera firmware appends the raw
//! sensor readout to the JPEG it produces: a fixed-size blob at the end of
//! the file, starting with a `BRCM` signature, a header block and a 32 KiB
//! preamble before the packed sample data.

use log::{debug, warn};

use crate::bits::LEu16;
use crate::cfa::BayerOrder;
use crate::packed::{decode_rpi10, decode_rpi12};
use crate::pixarray::PixU16;
use crate::sensor::{RawPacking, SensorProfile};
use crate::{Error, Result};

const BRCM_MAGIC: &[u8; 4] = b"BRCM";
const HEADER_OFFSET: usize = 176;
const HEADER_LEN: usize = 70;
const DATA_OFFSET: usize = 32768;

/// Decoded fields of the vendor header block.
#[derive(Clone, Debug)]
pub struct RawHeader {
  pub name: String,
  pub width: u16,
  pub height: u16,
  pub padding_right: u16,
  pub padding_down: u16,
  pub transform: u16,
  pub format: u16,
  pub bayer_order: u8,
  pub bayer_format: u8,
}

impl RawHeader {
  pub fn parse(container: &[u8]) -> Result<Self> {
    if container.len() < HEADER_OFFSET + HEADER_LEN {
      return Err(Error::TruncatedContainer {
        expected: HEADER_OFFSET + HEADER_LEN,
        actual: container.len(),
      });
    }
    if &container[0..4] != BRCM_MAGIC {
      return Err(Error::InvalidSignature);
    }
    let block = &container[HEADER_OFFSET..];
    let name_raw = &block[0..32];
    let name_len = name_raw.iter().position(|b| *b == 0).unwrap_or(32);
    let name = String::from_utf8_lossy(&name_raw[..name_len]).into_owned();
    // 24 dummy bytes sit between padding_down and transform
    Ok(Self {
      name,
      width: LEu16(block, 32),
      height: LEu16(block, 34),
      padding_right: LEu16(block, 36),
      padding_down: LEu16(block, 38),
      transform: LEu16(block, 64),
      format: LEu16(block, 66),
      bayer_order: block[68],
      bayer_format: block[69],
    })
  }

  /// Mosaic order from the header byte, falling back to the profile
  /// default when the firmware wrote an out-of-range value.
  pub fn bayer_order_or(&self, fallback: BayerOrder) -> BayerOrder {
    match BayerOrder::try_from(self.bayer_order) {
      Ok(order) => order,
      Err(_) => {
        warn!("invalid bayer order byte {}, assuming {:?}", self.bayer_order, fallback);
        fallback
      }
    }
  }
}

/// Slice the raw container off the end of a camera JPEG.
pub fn extract_container<'a>(file: &'a [u8], profile: &SensorProfile) -> Result<&'a [u8]> {
  if file.len() < profile.raw_offset_from_end {
    return Err(Error::TruncatedContainer {
      expected: profile.raw_offset_from_end,
      actual: file.len(),
    });
  }
  Ok(&file[file.len() - profile.raw_offset_from_end..])
}

/// Decode the packed payload into the unpadded sensor sample grid. The
/// padded readout is `reshape` bytes per row; only the leading `crop`
/// rows and row bytes carry image data.
pub fn decode_sensor_grid(container: &[u8], profile: &SensorProfile) -> Result<PixU16> {
  let (rows, row_bytes) = profile.reshape;
  let needed = DATA_OFFSET + rows * row_bytes;
  if container.len() < needed {
    return Err(Error::TruncatedContainer {
      expected: needed,
      actual: container.len(),
    });
  }
  let data = &container[DATA_OFFSET..needed];

  let (crop_rows, crop_bytes) = profile.crop;
  let width = profile.packing.samples_for_bytes(crop_bytes);
  debug!("raw payload {}x{} bytes, cropped to {}x{} -> {} samples/row", rows, row_bytes, crop_rows, crop_bytes, width);

  let grid = match profile.packing {
    RawPacking::V1 | RawPacking::V2 => decode_rpi10(data, row_bytes, width, crop_rows),
    RawPacking::V3 => decode_rpi12(data, row_bytes, width, crop_rows),
  };
  Ok(grid)
}
