use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Serialize;

use crate::cfa::BayerOrder;
use crate::{Error, Result};

/// Vendor raw packing scheme version.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum RawPacking {
  /// 10-bit samples, 5-byte groups (OV5647 era firmware)
  V1,
  /// 10-bit samples, 5-byte groups (IMX219 era firmware)
  V2,
  /// 12-bit samples, 3-byte groups
  V3,
}

impl RawPacking {
  /// Unpacked samples per packed row byte count.
  pub fn samples_for_bytes(&self, bytes: usize) -> usize {
    match self {
      Self::V1 | Self::V2 => bytes / 5 * 4,
      Self::V3 => bytes / 3 * 2,
    }
  }
}

/// Raw container geometry for one known sensor. Immutable, resolved once
/// per conversion from the camera model string.
#[derive(Clone, Debug, Serialize)]
pub struct SensorProfile {
  pub model: &'static str,
  /// Human readable camera name, written as UniqueCameraModel.
  pub description: &'static str,
  pub packing: RawPacking,
  /// Byte offset of the raw container, counted from end of file.
  pub raw_offset_from_end: usize,
  /// Padded (rows, cols) byte geometry of the sensor readout.
  pub reshape: (usize, usize),
  /// (rows, cols) after stripping trailing structural padding.
  pub crop: (usize, usize),
  pub native_bpp: u8,
  /// Fallback mosaic order when the header carries an invalid value.
  pub bayer_order: BayerOrder,
}

impl SensorProfile {
  pub fn white_level(&self) -> u16 {
    (1_u32 << self.native_bpp) as u16 - 1
  }
}

lazy_static! {
  static ref REGISTRY: HashMap<&'static str, SensorProfile> = {
    let mut map = HashMap::new();
    for profile in [
      SensorProfile {
        model: "RP_ov5647",
        description: "Raspberry Pi Camera V1",
        packing: RawPacking::V1,
        raw_offset_from_end: 6404096,
        reshape: (1952, 3264),
        crop: (1944, 3240),
        native_bpp: 10,
        bayer_order: BayerOrder::Bggr,
      },
      SensorProfile {
        model: "RP_imx219",
        description: "Raspberry Pi Camera V2",
        packing: RawPacking::V2,
        raw_offset_from_end: 10270208,
        reshape: (2480, 4128),
        crop: (2464, 4100),
        native_bpp: 10,
        bayer_order: BayerOrder::Bggr,
      },
      SensorProfile {
        model: "RP_testc",
        description: "Raspberry Pi High Quality Camera",
        packing: RawPacking::V3,
        raw_offset_from_end: 18711040,
        reshape: (3056, 6112),
        crop: (3040, 6084),
        native_bpp: 12,
        bayer_order: BayerOrder::Bggr,
      },
      SensorProfile {
        model: "RP_imx477",
        description: "Raspberry Pi High Quality Camera",
        packing: RawPacking::V3,
        raw_offset_from_end: 18711040,
        reshape: (3056, 6112),
        crop: (3040, 6084),
        native_bpp: 12,
        bayer_order: BayerOrder::Bggr,
      },
    ] {
      map.insert(profile.model, profile);
    }
    map
  };
}

/// Look up the profile for a camera model string. Models outside the
/// registry are a hard error.
pub fn profile_for(model: &str) -> Result<&'static SensorProfile> {
  REGISTRY.get(model).ok_or_else(|| Error::UnsupportedSensor(model.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_models_resolve() -> anyhow::Result<()> {
    let profile = profile_for("RP_ov5647")?;
    assert_eq!(profile.raw_offset_from_end, 6404096);
    assert_eq!(profile.crop, (1944, 3240));
    assert_eq!(profile.white_level(), 1023);

    let hq = profile_for("RP_imx477")?;
    assert_eq!(hq.description, profile_for("RP_testc")?.description);
    assert_eq!(hq.white_level(), 4095);
    Ok(())
  }

  #[test]
  fn unknown_model_is_rejected() {
    assert!(matches!(profile_for("RP_imx999"), Err(Error::UnsupportedSensor(_))));
  }

  #[test]
  fn sample_widths() {
    assert_eq!(RawPacking::V1.samples_for_bytes(3240), 2592);
    assert_eq!(RawPacking::V2.samples_for_bytes(4100), 3280);
    assert_eq!(RawPacking::V3.samples_for_bytes(6084), 4056);
  }
}
