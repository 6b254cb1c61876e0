//! Camera metadata passthrough. The JPEG wrapper's Exif block is consumed
//! as an opaque key/value map (keys in the `"IFD TagName"` form, values in
//! their printable representation); this module provides the typed
//! accessors the DNG writer needs.

use std::collections::BTreeMap;

use crate::formats::tiff::{Rational, SRational};

/// Parse a printable rational, either `"n/d"` or a bare integer.
pub fn parse_rational(s: &str) -> Option<Rational> {
  match s.split_once('/') {
    Some((n, d)) => Some(Rational::new(n.trim().parse().ok()?, d.trim().parse().ok()?)),
    None => Some(Rational::new(s.trim().parse().ok()?, 1)),
  }
}

/// Signed variant of [`parse_rational`].
pub fn parse_srational(s: &str) -> Option<SRational> {
  match s.split_once('/') {
    Some((n, d)) => Some(SRational::new(n.trim().parse().ok()?, d.trim().parse().ok()?)),
    None => Some(SRational::new(s.trim().parse().ok()?, 1)),
  }
}

/// Opaque metadata map with typed accessors for the handful of keys the
/// converter consumes. Unknown keys are carried but ignored.
#[derive(Clone, Debug, Default)]
pub struct Metadata {
  tags: BTreeMap<String, String>,
}

impl Metadata {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
    self.tags.insert(key.into(), value.into());
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.tags.get(key).map(String::as_str)
  }

  /// Camera model string, used for the registry lookup. The only
  /// mandatory key.
  pub fn model(&self) -> Option<&str> {
    self.get("Image Model")
  }

  pub fn make(&self) -> Option<&str> {
    self.get("Image Make")
  }

  pub fn datetime(&self) -> Option<&str> {
    self.get("EXIF DateTimeDigitized")
  }

  pub fn image_width(&self) -> Option<u32> {
    self.get("Image ImageWidth")?.trim().parse().ok()
  }

  pub fn image_length(&self) -> Option<u32> {
    self.get("Image ImageLength")?.trim().parse().ok()
  }

  pub fn iso(&self) -> Option<u16> {
    self.get("EXIF ISOSpeedRatings")?.trim().parse().ok()
  }

  pub fn exposure_time(&self) -> Option<Rational> {
    parse_rational(self.get("EXIF ExposureTime")?)
  }

  pub fn focal_length(&self) -> Option<Rational> {
    parse_rational(self.get("EXIF FocalLength")?)
  }

  pub fn aperture(&self) -> Option<Rational> {
    parse_rational(self.get("EXIF ApertureValue")?)
  }

  pub fn shutter_speed(&self) -> Option<SRational> {
    parse_srational(self.get("EXIF ShutterSpeedValue")?)
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
  fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
    Self {
      tags: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
    }
  }
}
