//! Dark-frame and flat-field correction, applied per Bayer quadrant. Each
//! quadrant is handled independently so the four mosaic channels keep their
//! own black offsets and vignetting profiles.

use log::debug;

use crate::cfa::{BayerOrder, CFA_COLOR_B, CFA_COLOR_G, CFA_COLOR_R};
use crate::pixarray::{PixU16, Subview};
use crate::{Error, Result};

/// Largest corrected value seen in each mosaic color channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelMaxima {
  pub red: u16,
  pub green: u16,
  pub blue: u16,
}

impl ChannelMaxima {
  pub fn min(&self) -> u16 {
    self.red.min(self.green).min(self.blue)
  }

  pub fn all_at_least(&self, level: u16) -> bool {
    self.red >= level && self.green >= level && self.blue >= level
  }
}

fn quadrant_mean(grid: &PixU16, view: Subview) -> f64 {
  let mut sum = 0_u64;
  let mut count = 0_u64;
  for v in grid.subview_values(view) {
    sum += v as u64;
    count += 1;
  }
  if count == 0 {
    0.0
  } else {
    sum as f64 / count as f64
  }
}

fn quadrant_mean_f64(values: &[f64]) -> f64 {
  if values.is_empty() {
    0.0
  } else {
    values.iter().sum::<f64>() / values.len() as f64
  }
}

/// Subtract the scalar dark level and divide out the vignetting profile,
/// one Bayer quadrant at a time. Results are floored at zero and rounded
/// back to integer samples.
pub fn apply_frames(raw: &mut PixU16, dark: &PixU16, shade: &PixU16) -> Result<()> {
  for frame in [dark, shade] {
    if (frame.width, frame.height) != (raw.width, raw.height) {
      return Err(Error::CorrectionFrameMismatch {
        frame_width: frame.width,
        frame_height: frame.height,
        width: raw.width,
        height: raw.height,
      });
    }
  }
  for view in Subview::bayer_quadrants() {
    let dark_mean = quadrant_mean(dark, view);

    let shade_q: Vec<f64> = shade.subview_values(view).map(|v| (v as f64 - dark_mean).max(0.0)).collect();
    let shade_mean = quadrant_mean_f64(&shade_q);
    debug!("quadrant ({},{}) dark mean {:.2}, shade mean {:.2}", view.row_start, view.col_start, dark_mean, shade_mean);

    let mut shade_it = shade_q.iter();
    for row in (view.row_start..raw.height).step_by(view.row_stride) {
      for col in (view.col_start..raw.width).step_by(view.col_stride) {
        let shade_val = *shade_it.next().unwrap_or(&0.0);
        if shade_val == 0.0 {
          return Err(Error::DivideByZeroInNormalization { row, col });
        }
        let gain = shade_mean / shade_val;
        let corrected = ((*raw.at(row, col) as f64 - dark_mean).max(0.0) * gain).round();
        *raw.at_mut(row, col) = corrected.min(u16::MAX as f64) as u16;
      }
    }
  }
  Ok(())
}

/// Per-color maxima of the grid. The two green quadrants are merged by
/// the rounded mean of corresponding positions before taking the max.
pub fn channel_maxima(grid: &PixU16, order: BayerOrder) -> ChannelMaxima {
  let pattern = order.pattern();
  let quadrants = Subview::bayer_quadrants();

  let mut red = 0_u16;
  let mut blue = 0_u16;
  let mut greens = Vec::with_capacity(2);
  for (view, color) in quadrants.into_iter().zip(pattern) {
    match color {
      CFA_COLOR_R => red = grid.subview_values(view).max().unwrap_or(0),
      CFA_COLOR_B => blue = grid.subview_values(view).max().unwrap_or(0),
      CFA_COLOR_G => greens.push(view),
      _ => unreachable!(),
    }
  }
  let green = grid
    .subview_values(greens[0])
    .zip(grid.subview_values(greens[1]))
    .map(|(g1, g2)| ((g1 as u32 + g2 as u32 + 1) >> 1) as u16)
    .max()
    .unwrap_or(0);

  ChannelMaxima { red, green, blue }
}

/// Clip the grid so no channel exceeds the dimmest channel maximum. When
/// every channel already reaches the sensor white level the grid is only
/// clipped to that level.
pub fn clip_to_maxima(grid: &mut PixU16, maxima: ChannelMaxima, white_level: u16) {
  let clip = if maxima.all_at_least(white_level) { white_level } else { maxima.min() };
  debug!("clipping corrected grid to {}", clip);
  grid.for_each(|v| v.min(clip));
}

#[cfg(test)]
mod tests {
  use super::*;

  fn flat(value: u16, width: usize, height: usize) -> PixU16 {
    PixU16::new_with(vec![value; width * height], width, height)
  }

  #[test]
  fn dark_mean_is_subtracted_with_floor() -> anyhow::Result<()> {
    let mut raw = PixU16::new_with(vec![100, 5, 100, 5], 2, 2);
    let dark = flat(10, 2, 2);
    let shade = flat(510, 2, 2); // uniform shade: gain 1 after dark subtraction
    apply_frames(&mut raw, &dark, &shade)?;
    assert_eq!(raw.pixels(), &[90, 0, 90, 0]);
    Ok(())
  }

  #[test]
  fn flat_field_evens_out_vignetting() -> anyhow::Result<()> {
    // each quadrant sees [100, 50] raw under a shade falling to half on
    // the right; both positions normalize to the quadrant mean response
    let mut raw = PixU16::new_with(vec![100, 100, 50, 50, 100, 100, 50, 50], 4, 2);
    let dark = flat(0, 4, 2);
    let shade = PixU16::new_with(vec![200, 200, 100, 100, 200, 200, 100, 100], 4, 2);
    apply_frames(&mut raw, &dark, &shade)?;
    assert_eq!(raw.pixels(), &[75, 75, 75, 75, 75, 75, 75, 75]);
    Ok(())
  }

  #[test]
  fn mismatched_frame_dimensions_are_rejected() {
    let mut raw = flat(100, 4, 2);
    let dark = flat(0, 4, 2);
    let shade = flat(100, 2, 2);
    let err = apply_frames(&mut raw, &dark, &shade).unwrap_err();
    assert!(matches!(
      err,
      Error::CorrectionFrameMismatch {
        frame_width: 2,
        frame_height: 2,
        width: 4,
        height: 2
      }
    ));
  }

  #[test]
  fn zero_shade_value_is_an_error() {
    let mut raw = flat(100, 2, 2);
    let dark = flat(0, 2, 2);
    let mut shade = flat(100, 2, 2);
    *shade.at_mut(1, 0) = 0;
    let err = apply_frames(&mut raw, &dark, &shade).unwrap_err();
    assert!(matches!(err, Error::DivideByZeroInNormalization { row: 1, col: 0 }));
  }

  #[test]
  fn green_maxima_use_rounded_mean() {
    // BGGR: (0,0)=B, (0,1)=G, (1,0)=G, (1,1)=R
    let grid = PixU16::new_with(vec![500, 101, 102, 900], 2, 2);
    let maxima = channel_maxima(&grid, BayerOrder::Bggr);
    assert_eq!(maxima, ChannelMaxima { red: 900, green: 102, blue: 500 });
  }

  #[test]
  fn clip_uses_dimmest_channel() {
    let mut grid = PixU16::new_with(vec![1000, 1020, 1023, 1010], 2, 2);
    let maxima = ChannelMaxima { red: 1020, green: 1023, blue: 1000 };
    clip_to_maxima(&mut grid, maxima, 1023);
    assert_eq!(grid.pixels(), &[1000, 1000, 1000, 1000]);
  }

  #[test]
  fn saturated_channels_keep_white_level() {
    let mut grid = PixU16::new_with(vec![1023, 1023, 1023, 500], 2, 2);
    let maxima = ChannelMaxima { red: 1023, green: 1023, blue: 1023 };
    clip_to_maxima(&mut grid, maxima, 1023);
    assert_eq!(grid.pixels(), &[1023, 1023, 1023, 500]);
  }
}
