//! Conversion orchestration: input handling, the decode → correct → pack
//! sequence and DNG assembly.

use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use log::debug;
use memmap2::MmapOptions;

use crate::brcm::{decode_sensor_grid, extract_container, RawHeader};
use crate::correction;
use crate::dng::writer::{render_dng, DngFrame};
use crate::dng::LosslessCompressor;
use crate::exif::Metadata;
use crate::formats::tiff::CompressionMethod;
use crate::packed::{pack10, pack12, pack14, pack16, pack8};
use crate::pixarray::PixU16;
use crate::sensor::{profile_for, SensorProfile};
use crate::{Error, Result};

/// Camera file bytes, either mapped from disk or held in memory.
pub struct RawInput {
  path: PathBuf,
  inner: RawInputImpl,
}

enum RawInputImpl {
  Memmap(memmap2::Mmap),
  Memory(Vec<u8>),
}

impl RawInput {
  /// Map a camera JPEG from disk. The path must name a regular file.
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    if !path.is_file() {
      return Err(Error::InvalidInputKind(format!("{} is not a regular file", path.display())));
    }
    let file = File::open(path)?;
    let mmap = unsafe { MmapOptions::new().map(&file)? };
    #[cfg(unix)]
    mmap.advise(memmap2::Advice::Sequential)?;
    Ok(Self {
      path: path.to_owned(),
      inner: RawInputImpl::Memmap(mmap),
    })
  }

  pub fn from_vec(buf: Vec<u8>) -> Self {
    Self {
      path: PathBuf::default(),
      inner: RawInputImpl::Memory(buf),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn buf(&self) -> &[u8] {
    self.deref()
  }
}

impl Deref for RawInput {
  type Target = [u8];

  fn deref(&self) -> &Self::Target {
    match &self.inner {
      RawInputImpl::Memmap(map) => map,
      RawInputImpl::Memory(buf) => buf,
    }
  }
}

/// Per-conversion settings. The defaults reproduce the camera readout
/// unchanged: native bit depth, no correction, no compression.
#[derive(Debug, Default, Clone)]
pub struct ConvertParams {
  /// Override for the ImageWidth tag. Falls back to camera metadata,
  /// then to the decoded grid width.
  pub width: Option<u32>,
  pub length: Option<u32>,
  /// Apply dark-frame and flat-field correction. Requires both frames
  /// on the [`Converter`].
  pub correct: bool,
  /// Emit lossless-JPEG tiles through the configured codec.
  pub compress: bool,
  pub max_compress: bool,
  /// Output bit depth, one of 8, 10, 12, 14 or 16.
  pub bpp: Option<u8>,
}

/// Reusable converter holding the optional correction frames and codec.
#[derive(Default)]
pub struct Converter {
  dark: Option<RawInput>,
  shade: Option<RawInput>,
  compressor: Option<Box<dyn LosslessCompressor>>,
}

impl Converter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_dark_frame(mut self, frame: RawInput) -> Self {
    self.dark = Some(frame);
    self
  }

  pub fn with_shade_frame(mut self, frame: RawInput) -> Self {
    self.shade = Some(frame);
    self
  }

  pub fn with_compressor(mut self, compressor: Box<dyn LosslessCompressor>) -> Self {
    self.compressor = Some(compressor);
    self
  }

  /// Run the full conversion and return the DNG bytes.
  pub fn convert(&self, input: &RawInput, metadata: &Metadata, params: &ConvertParams) -> Result<Vec<u8>> {
    let model = metadata.model().ok_or_else(|| Error::UnsupportedSensor("(missing Image Model metadata)".into()))?;
    let profile = profile_for(model)?;
    debug!("converting {} capture ({} bytes)", model, input.buf().len());

    let container = extract_container(input.buf(), profile)?;
    let header = RawHeader::parse(container)?;
    debug!("raw header: sensor {:?}, {}x{}", header.name, header.width, header.height);
    let order = header.bayer_order_or(profile.bayer_order);
    let cfa = order.cfa();

    let mut grid = decode_sensor_grid(container, profile)?;
    if params.correct {
      let dark = self.correction_grid(self.dark.as_ref(), "dark", profile)?;
      let shade = self.correction_grid(self.shade.as_ref(), "shade", profile)?;
      correction::apply_frames(&mut grid, &dark, &shade)?;
      let maxima = correction::channel_maxima(&grid, order);
      correction::clip_to_maxima(&mut grid, maxima, profile.white_level());
    }

    let bpp = params.bpp.unwrap_or(profile.native_bpp);
    shift_bit_depth(&mut grid, profile.native_bpp, bpp)?;

    let (tile, compression) = if params.compress {
      let compressor = self.compressor.as_ref().ok_or(Error::CompressorUnavailable)?;
      let tile = compressor.compress(&grid, grid.width, grid.height, bpp, params.max_compress)?;
      (tile, CompressionMethod::ModernJPEG)
    } else {
      (pack_tile(&grid, bpp)?, CompressionMethod::None)
    };

    let frame = DngFrame {
      width: params.width.or_else(|| metadata.image_width()).unwrap_or(grid.width as u32),
      length: params.length.or_else(|| metadata.image_length()).unwrap_or(grid.height as u32),
      tile_width: grid.width as u32,
      tile_length: grid.height as u32,
      bpp,
      compression,
      cfa: &cfa,
      profile,
      metadata,
    };
    render_dng(&frame, tile)
  }

  /// Convert the file at `path` and write the result next to it as
  /// `<stem>.dng`.
  pub fn convert_file<P: AsRef<Path>>(&self, path: P, metadata: &Metadata, params: &ConvertParams) -> Result<PathBuf> {
    let input = RawInput::open(path.as_ref())?;
    let dng = self.convert(&input, metadata, params)?;
    let out = path.as_ref().with_extension("dng");
    std::fs::write(&out, dng)?;
    Ok(out)
  }

  fn correction_grid(&self, frame: Option<&RawInput>, kind: &'static str, profile: &SensorProfile) -> Result<PixU16> {
    let frame = frame.ok_or(Error::MissingCorrectionFrame(kind))?;
    let container = extract_container(frame.buf(), profile)?;
    RawHeader::parse(container)?;
    decode_sensor_grid(container, profile)
  }
}

fn shift_bit_depth(grid: &mut PixU16, native: u8, out: u8) -> Result<()> {
  match out {
    8 | 10 | 12 | 14 | 16 => {}
    other => return Err(Error::UnsupportedBitDepth(other)),
  }
  if out > native {
    let shift = (out - native) as u32;
    grid.for_each(|v| v << shift);
  } else if out < native {
    let shift = (native - out) as u32;
    grid.for_each(|v| v >> shift);
  }
  Ok(())
}

fn pack_tile(grid: &PixU16, bpp: u8) -> Result<Vec<u8>> {
  Ok(match bpp {
    8 => pack8(grid),
    10 => pack10(grid),
    12 => pack12(grid),
    14 => pack14(grid),
    16 => pack16(grid),
    other => return Err(Error::UnsupportedBitDepth(other)),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bit_depth_shifts_both_ways() -> anyhow::Result<()> {
    let mut grid = PixU16::new_with(vec![0x3ff, 0x100], 2, 1);
    shift_bit_depth(&mut grid, 10, 16)?;
    assert_eq!(grid.pixels(), &[0x3ff << 6, 0x100 << 6]);

    let mut grid = PixU16::new_with(vec![0x3ff, 0x100], 2, 1);
    shift_bit_depth(&mut grid, 10, 8)?;
    assert_eq!(grid.pixels(), &[0xff, 0x40]);
    Ok(())
  }

  #[test]
  fn odd_bit_depths_are_rejected() {
    let mut grid = PixU16::new_with(vec![0], 1, 1);
    assert!(matches!(shift_bit_depth(&mut grid, 10, 11), Err(Error::UnsupportedBitDepth(11))));
    assert!(matches!(pack_tile(&grid, 9), Err(Error::UnsupportedBitDepth(9))));
  }

  #[test]
  fn directories_are_not_raw_inputs() {
    assert!(matches!(RawInput::open("/tmp"), Err(Error::InvalidInputKind(_))));
  }

  #[test]
  fn memory_inputs_deref_to_their_buffer() {
    let input = RawInput::from_vec(vec![1, 2, 3]);
    assert_eq!(input.buf(), &[1, 2, 3]);
    assert_eq!(input.path(), Path::new(""));
  }
}
