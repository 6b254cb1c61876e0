// SPDX-License-Identifier: MIT

//! Little-endian TIFF serializer working in two passes: a pure layout pass
//! that assigns every offset, then a write pass into a buffer of exactly
//! the computed size. Tag data is collected up front, so offsets for tile
//! data can be resolved before a single byte is written.

use std::collections::BTreeMap;
use std::io::{Cursor, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use super::{Result, TiffError, Value, HEADER_LEN, TIFF_MAGIC};

/// Placeholder for tag values that depend on the final file layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeferredValue {
  TileOffsets,
  TileByteCounts,
}

#[derive(Clone, Debug)]
enum TagData {
  Value(Value),
  Deferred(DeferredValue),
}

/// Collects IFD entries keyed by tag id. The map keeps tags in ascending
/// order, which TIFF requires for the directory.
#[derive(Default, Debug)]
pub struct DirectoryBuilder {
  entries: BTreeMap<u16, TagData>,
}

impl DirectoryBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_tag<T: Into<u16>, V: Into<Value>>(&mut self, tag: T, value: V) {
    self.entries.insert(tag.into(), TagData::Value(value.into()));
  }

  /// Add a tag whose value count is fixed by its definition.
  pub fn add_tag_checked<T: Into<u16>, V: Into<Value>>(&mut self, tag: T, expected: usize, value: V) -> Result<()> {
    let tag = tag.into();
    let value = value.into();
    if value.count() != expected {
      return Err(TiffError::TagSizeMismatch {
        tag,
        expected,
        actual: value.count(),
      });
    }
    self.entries.insert(tag, TagData::Value(value));
    Ok(())
  }

  pub fn add_deferred<T: Into<u16>>(&mut self, tag: T, value: DeferredValue) {
    self.entries.insert(tag.into(), TagData::Deferred(value));
  }

  pub fn entry_count(&self) -> usize {
    self.entries.len()
  }

  pub fn contains<T: Into<u16>>(&self, tag: T) -> bool {
    self.entries.contains_key(&tag.into())
  }
}

/// Offsets assigned by the layout pass. All offsets are absolute file
/// positions, 4-byte aligned where the data is larger than the inline
/// value field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
  pub ifd_offset: u32,
  pub value_offsets: BTreeMap<u16, u32>,
  pub tile_offsets: Vec<u32>,
  pub total_len: usize,
}

/// A complete single-IFD TIFF file: the directory plus the tile payloads
/// referenced by TileOffsets/TileByteCounts.
pub struct TiffDocument {
  pub ifd: DirectoryBuilder,
  pub tiles: Vec<Vec<u8>>,
}

fn align4(pos: usize) -> usize {
  (pos + 3) & !3
}

impl TiffDocument {
  pub fn new(ifd: DirectoryBuilder, tiles: Vec<Vec<u8>>) -> Self {
    Self { ifd, tiles }
  }

  fn resolve(&self, data: &TagData, layout: Option<&Layout>) -> Value {
    match data {
      TagData::Value(value) => value.clone(),
      TagData::Deferred(DeferredValue::TileOffsets) => match layout {
        Some(layout) => Value::Long(layout.tile_offsets.clone()),
        None => Value::Long(vec![0; self.tiles.len()]),
      },
      TagData::Deferred(DeferredValue::TileByteCounts) => Value::Long(self.tiles.iter().map(|t| t.len() as u32).collect()),
    }
  }

  /// Pass 1: assign every offset without writing anything. Layout is
  /// header | directory | overflow values | tile data.
  pub fn layout(&self) -> Result<Layout> {
    let ifd_offset = HEADER_LEN;
    let dir_len = 2 + 12 * self.ifd.entry_count() + 4;
    let mut pos = ifd_offset as usize + dir_len;

    let mut value_offsets = BTreeMap::new();
    for (tag, data) in &self.ifd.entries {
      let value = self.resolve(data, None);
      if value.byte_size() > 4 {
        pos = align4(pos);
        value_offsets.insert(*tag, pos as u32);
        pos += value.byte_size();
      }
    }

    let mut tile_offsets = Vec::with_capacity(self.tiles.len());
    for tile in &self.tiles {
      pos = align4(pos);
      tile_offsets.push(pos as u32);
      pos += tile.len();
    }

    if pos > u32::MAX as usize {
      return Err(TiffError::Overflow(format!("file size {} exceeds the 32-bit offset space", pos)));
    }
    Ok(Layout {
      ifd_offset,
      value_offsets,
      tile_offsets,
      total_len: pos,
    })
  }

  /// Pass 2: serialize into a buffer of exactly the layed-out size.
  pub fn serialize(&self) -> Result<Vec<u8>> {
    let layout = self.layout()?;
    let mut buf = Cursor::new(vec![0_u8; layout.total_len]);

    buf.write_all(b"II")?;
    buf.write_u16::<LittleEndian>(TIFF_MAGIC)?;
    buf.write_u32::<LittleEndian>(layout.ifd_offset)?;

    debug_assert_eq!(buf.position(), layout.ifd_offset as u64);
    buf.write_u16::<LittleEndian>(self.ifd.entry_count() as u16)?;
    for (tag, data) in &self.ifd.entries {
      let value = self.resolve(data, Some(&layout));
      buf.write_u16::<LittleEndian>(*tag)?;
      buf.write_u16::<LittleEndian>(value.value_type())?;
      buf.write_u32::<LittleEndian>(value.count() as u32)?;
      if value.byte_size() > 4 {
        buf.write_u32::<LittleEndian>(layout.value_offsets[tag])?;
      } else {
        buf.write_u32::<LittleEndian>(value.as_embedded()?)?;
      }
    }
    buf.write_u32::<LittleEndian>(0)?; // no next IFD

    for (tag, data) in &self.ifd.entries {
      if let Some(offset) = layout.value_offsets.get(tag) {
        buf.seek(SeekFrom::Start(*offset as u64))?;
        self.resolve(data, Some(&layout)).write(&mut buf)?;
      }
    }

    for (tile, offset) in self.tiles.iter().zip(&layout.tile_offsets) {
      buf.seek(SeekFrom::Start(*offset as u64))?;
      buf.write_all(tile)?;
    }

    let buf = buf.into_inner();
    assert_eq!(buf.len(), layout.total_len);
    Ok(buf)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bits::{LEu16, LEu32};

  fn sample_document() -> TiffDocument {
    let mut ifd = DirectoryBuilder::new();
    ifd.add_tag(0x0100_u16, 8_u32); // width
    ifd.add_tag(0x0101_u16, 2_u32); // length
    ifd.add_deferred(0x0144_u16, DeferredValue::TileOffsets);
    ifd.add_deferred(0x0145_u16, DeferredValue::TileByteCounts);
    ifd.add_tag(0x0131_u16, "soft");
    TiffDocument::new(ifd, vec![vec![0xaa_u8; 20]])
  }

  #[test]
  fn directory_is_sorted_ascending() -> anyhow::Result<()> {
    let doc = sample_document();
    let data = doc.serialize()?;
    let n = LEu16(&data, 8) as usize;
    let mut prev = 0_u16;
    for i in 0..n {
      let tag = LEu16(&data, 10 + 12 * i);
      assert!(tag > prev);
      prev = tag;
    }
    Ok(())
  }

  #[test]
  fn layout_matches_serialized_size() -> anyhow::Result<()> {
    let doc = sample_document();
    let layout = doc.layout()?;
    let data = doc.serialize()?;
    assert_eq!(data.len(), layout.total_len);
    // header, 5 entries, nul-terminated directory
    assert_eq!(layout.ifd_offset, 8);
    assert_eq!(LEu16(&data, 8), 5);
    Ok(())
  }

  #[test]
  fn deferred_tags_resolve_to_final_positions() -> anyhow::Result<()> {
    let doc = sample_document();
    let layout = doc.layout()?;
    let data = doc.serialize()?;
    let n = LEu16(&data, 8) as usize;
    let mut offsets = None;
    let mut counts = None;
    for i in 0..n {
      let base = 10 + 12 * i;
      match LEu16(&data, base) {
        0x0144 => offsets = Some(LEu32(&data, base + 8)),
        0x0145 => counts = Some(LEu32(&data, base + 8)),
        _ => {}
      }
    }
    // a single tile fits inline in both tags
    assert_eq!(offsets, Some(layout.tile_offsets[0]));
    assert_eq!(counts, Some(20));
    assert_eq!(&data[layout.tile_offsets[0] as usize..layout.tile_offsets[0] as usize + 20], &[0xaa; 20]);
    Ok(())
  }

  #[test]
  fn oversized_values_move_to_aligned_overflow_area() -> anyhow::Result<()> {
    let mut ifd = DirectoryBuilder::new();
    ifd.add_tag(0x0001_u16, "unaligned"); // 10 bytes with nul
    ifd.add_tag(0x0002_u16, [1_u32, 2, 3]);
    let doc = TiffDocument::new(ifd, Vec::new());
    let layout = doc.layout()?;
    for offset in layout.value_offsets.values() {
      assert_eq!(offset % 4, 0);
    }
    let data = doc.serialize()?;
    let off = layout.value_offsets[&0x0002] as usize;
    assert_eq!(LEu32(&data, off), 1);
    assert_eq!(LEu32(&data, off + 8), 3);
    Ok(())
  }

  #[test]
  fn checked_add_rejects_wrong_counts() {
    let mut ifd = DirectoryBuilder::new();
    let err = ifd.add_tag_checked(0x828d_u16, 2, [1_u16, 2, 3]).unwrap_err();
    assert!(matches!(err, TiffError::TagSizeMismatch { tag: 0x828d, expected: 2, actual: 3 }));
    assert!(ifd.add_tag_checked(0x828d_u16, 2, [2_u16, 2]).is_ok());
  }
}
