use rayon::prelude::*;

/// Row-major 2D sample array. `PixU16` is the canonical intermediate
/// representation passed between the container parser, the correction
/// pipeline and the packers.
#[derive(Clone, Debug, PartialEq)]
pub struct Pix2D<T> {
  pub width: usize,
  pub height: usize,
  pub data: Vec<T>,
}

pub type PixU16 = Pix2D<u16>;

impl<T> Pix2D<T>
where
  T: Copy + Send,
{
  pub fn new_with(data: Vec<T>, width: usize, height: usize) -> Self {
    assert_eq!(data.len(), height * width);
    Self { data, width, height }
  }

  pub fn pixels(&self) -> &[T] {
    &self.data
  }

  pub fn pixels_mut(&mut self) -> &mut [T] {
    &mut self.data
  }

  #[inline(always)]
  pub fn at(&self, row: usize, col: usize) -> &T {
    &self.data[row * self.width + col]
  }

  #[inline(always)]
  pub fn at_mut(&mut self, row: usize, col: usize) -> &mut T {
    &mut self.data[row * self.width + col]
  }

  #[inline(always)]
  pub fn for_each<F>(&mut self, op: F)
  where
    F: Fn(T) -> T + Send + Sync,
  {
    self.data.par_iter_mut().for_each(|v| *v = op(*v));
  }

  /// Positions covered by a strided sub-view, row-major.
  pub fn subview_positions(&self, view: Subview) -> impl Iterator<Item = (usize, usize)> + '_ {
    let width = self.width;
    (view.row_start..self.height)
      .step_by(view.row_stride)
      .flat_map(move |row| (view.col_start..width).step_by(view.col_stride).map(move |col| (row, col)))
  }

  pub fn subview_values(&self, view: Subview) -> impl Iterator<Item = T> + '_ {
    self.subview_positions(view).map(move |(row, col)| *self.at(row, col))
  }
}

/// Strided sub-view descriptor. The four Bayer quadrants are the
/// (row-parity, column-parity) sub-views with stride 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subview {
  pub row_start: usize,
  pub row_stride: usize,
  pub col_start: usize,
  pub col_stride: usize,
}

impl Subview {
  pub const fn quadrant(row_parity: usize, col_parity: usize) -> Self {
    Self {
      row_start: row_parity,
      row_stride: 2,
      col_start: col_parity,
      col_stride: 2,
    }
  }

  /// All four Bayer quadrants in (row-parity, col-parity) order:
  /// (0,0), (0,1), (1,0), (1,1).
  pub const fn bayer_quadrants() -> [Subview; 4] {
    [
      Self::quadrant(0, 0),
      Self::quadrant(0, 1),
      Self::quadrant(1, 0),
      Self::quadrant(1, 1),
    ]
  }
}
