// SPDX-License-Identifier: LGPL-2.1

use byteorder::{ByteOrder, LittleEndian};

/// Clamp a value into the representable range of `bits`-wide unsigned samples.
#[inline(always)]
pub fn clampbits(val: i64, bits: u32) -> u16 {
  let max = (1_i64 << bits) - 1;
  if val < 0 {
    0
  } else if val > max {
    max as u16
  } else {
    val as u16
  }
}

#[allow(non_snake_case)]
#[inline]
pub fn LEu16(buf: &[u8], pos: usize) -> u16 {
  LittleEndian::read_u16(&buf[pos..pos + 2])
}

#[allow(non_snake_case)]
#[inline]
pub fn LEu32(buf: &[u8], pos: usize) -> u32 {
  LittleEndian::read_u32(&buf[pos..pos + 4])
}
