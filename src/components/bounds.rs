use geo::{Coord, Rect};
use shrinkwraprs::Shrinkwrap;
use std::fmt;

/// Pixel bounds of a read window.
///
/// Defined by:
///     - `offset`: (row, col) of the top left pixel of the window,
///         with origin at the top left pixel of the raster.
///     - `shape`: (rows, cols).
///
/// In the underlying rect x runs along columns and y along rows,
/// so `offset` is given by `.min` and `shape` by `(.height, .width)`.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow(Rect<usize>);

impl PixelWindow {
    pub fn new(offset: (usize, usize), shape: (usize, usize)) -> Self {
        let min = Coord {
            x: offset.1,
            y: offset.0,
        };
        let max = min
            + Coord {
                x: shape.1,
                y: shape.0,
            };
        Self(Rect::new(min, max))
    }

    pub fn row(&self) -> usize {
        self.0.min().y
    }

    pub fn col(&self) -> usize {
        self.0.min().x
    }

    pub fn rows(&self) -> usize {
        self.0.height()
    }

    pub fn cols(&self) -> usize {
        self.0.width()
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    pub fn size(&self) -> usize {
        self.rows() * self.cols()
    }

    /// True if the window lies inside a raster of `size` (cols, rows).
    pub fn fits(&self, size: (usize, usize)) -> bool {
        self.0.max().x <= size.0 && self.0.max().y <= size.1
    }

    /// Same pixels in signed coordinates, x along columns.
    pub fn extent(&self) -> Rect<i64> {
        let (min, max) = (self.0.min(), self.0.max());
        Rect::new(
            (min.x as i64, min.y as i64),
            (max.x as i64, max.y as i64),
        )
    }
}

impl fmt::Display for PixelWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows {}..{}, cols {}..{}",
            self.row(),
            self.row() + self.rows(),
            self.col(),
            self.col() + self.cols()
        )
    }
}
