use geo::{Coord, Intersects, Point, Polygon, Rect};
use ndarray::{s, Array2};
use std::path::Path;

use crate::{
    components::{
        backends::RasterInfo,
        bounds::PixelWindow,
        transforms::{PixelOrigin, WorldTransform},
    },
    crs_geo::CrsGeometry,
    errors::{CubeError, Result},
    intersection::Intersection,
    CoordUtils,
};

/// Pixels enclosing a geometry on one raster.
///
/// The extent may reach past the raster edges, `window` is the part of it
/// that can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryWindow {
    extent: Rect<i64>,
    window: PixelWindow,
    shape: (usize, usize),
    inset: (usize, usize),
}

impl GeometryWindow {
    pub fn extent(&self) -> Rect<i64> {
        self.extent
    }

    pub fn window(&self) -> &PixelWindow {
        &self.window
    }

    /// (rows, cols) of the whole extent.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Pixels read from `window` placed within the extent, `fill` elsewhere.
    pub fn pad(&self, data: Array2<f64>, fill: f64) -> Array2<f64> {
        if data.dim() == self.shape {
            return data;
        }
        let (row, col) = self.inset;
        let mut padded = Array2::from_elem(self.shape, fill);
        padded
            .slice_mut(s![row..row + data.nrows(), col..col + data.ncols()])
            .assign(&data);
        padded
    }
}

/// Pixel geometry of spatial requests on one raster.
#[derive(Debug, Clone)]
pub struct RegionResolver {
    filepath: String,
    info: RasterInfo,
    inverse: WorldTransform,
}

impl RegionResolver {
    pub fn new(filepath: &Path, info: RasterInfo) -> Result<Self> {
        let filepath = filepath.display().to_string();
        let inverse = info
            .transform()
            .inverse()
            .ok_or_else(|| CubeError::NotInvertible(filepath.clone()))?;
        Ok(Self {
            filepath,
            info,
            inverse,
        })
    }

    pub fn info(&self) -> &RasterInfo {
        &self.info
    }

    /// Fractional (col, row) of coordinate (x, y) given in `sref`, the raster's system if `None`.
    fn fractional(&self, x: f64, y: f64, sref: Option<&str>) -> Result<Coord<f64>> {
        let point = match sref {
            Some(sref) => CrsGeometry::new(sref, Point::new(x, y)).projected_geometry(self.info.crs())?,
            None => Point::new(x, y),
        };
        Ok(self.inverse.to_pixel(point.0))
    }

    /// (row, col) of the pixel holding (x, y), `None` outside the raster.
    pub fn pixel_of(
        &self,
        x: f64,
        y: f64,
        sref: Option<&str>,
        origin: PixelOrigin,
    ) -> Result<Option<(usize, usize)>> {
        let (col, row) = origin.pixel_of(self.fractional(x, y, sref)?);
        let (cols, rows) = self.info.size();
        let inside = (0..cols as i64).contains(&col) && (0..rows as i64).contains(&row);
        Ok(inside.then_some((row as usize, col as usize)))
    }

    /// Window of `shape` (rows, cols) with its top left pixel at (row, col).
    pub fn window_at(&self, offset: (usize, usize), shape: (usize, usize)) -> Result<PixelWindow> {
        let out_of_bounds = |window: String| CubeError::WindowOutOfBounds {
            filepath: self.filepath.clone(),
            window,
            size: self.info.size(),
        };
        if offset.0.checked_add(shape.0).is_none() || offset.1.checked_add(shape.1).is_none() {
            return Err(out_of_bounds(format!(
                "rows {}+{}, cols {}+{}",
                offset.0, shape.0, offset.1, shape.1
            )));
        }
        let window = PixelWindow::new(offset, shape);
        if window.size() == 0 || !window.fits(self.info.size()) {
            return Err(out_of_bounds(window.to_string()));
        }
        Ok(window)
    }

    /// Smallest pixel extent enclosing `geometry` and its part inside the raster.
    ///
    /// `None` if the geometry does not overlap the raster.
    pub fn window_of(&self, geometry: &Polygon<f64>) -> Result<Option<GeometryWindow>> {
        let mut coords = geometry
            .exterior()
            .coords()
            .map(|coord| self.inverse.to_pixel(*coord));
        let Some(first) = coords.next() else {
            return Ok(None);
        };
        let (min, max) = coords.fold((first, first), |(min, max), coord| {
            (
                min.operate(&coord, f64::min),
                max.operate(&coord, f64::max),
            )
        });
        let min: Coord<i64> = min.map_each(f64::floor).try_cast()?;
        let mut max: Coord<i64> = max.map_each(f64::ceil).try_cast()?;
        // degenerate extents still cover the pixel they fall in
        max = max.operate(&(min + Coord { x: 1, y: 1 }), i64::max);

        let (cols, rows) = self.info.size();
        let raster = Rect::new((0, 0), (cols as i64, rows as i64));
        let extent = Rect::new(min, max);
        let clipped = match extent.intersection(&raster) {
            Ok(clipped) => clipped,
            Err(CubeError::NoIntersection) => return Ok(None),
            Err(err) => return Err(err),
        };
        if clipped.width() == 0 || clipped.height() == 0 {
            return Ok(None);
        }
        let offset: Coord<usize> = clipped.min().try_cast()?;
        let size: Coord<usize> = Coord {
            x: clipped.width(),
            y: clipped.height(),
        }
        .try_cast()?;
        let shape: Coord<usize> = Coord {
            x: extent.width(),
            y: extent.height(),
        }
        .try_cast()?;
        let inset: Coord<usize> = (clipped.min() - extent.min()).try_cast()?;
        Ok(Some(GeometryWindow {
            extent,
            window: PixelWindow::new((offset.y, offset.x), (size.y, size.x)),
            shape: (shape.y, shape.x),
            inset: (inset.y, inset.x),
        }))
    }

    /// True for pixels of the extent outside the raster or whose center lies outside `geometry`.
    pub fn mask_of(&self, geometry: &Polygon<f64>, window: &GeometryWindow) -> Array2<bool> {
        let transform = self.info.transform();
        let (cols, rows) = self.info.size();
        let min = window.extent.min();
        Array2::from_shape_fn(window.shape, |(row, col)| {
            let (col, row) = (min.x + col as i64, min.y + row as i64);
            if !(0..cols as i64).contains(&col) || !(0..rows as i64).contains(&row) {
                return true;
            }
            let center = transform.to_world(col as f64 + 0.5, row as f64 + 0.5);
            !geometry.intersects(&Point::from(center))
        })
    }

    /// (y, x) coordinate labels of the rows and columns of pixel `extent`.
    pub fn labels(&self, extent: Rect<i64>, origin: PixelOrigin) -> (Vec<f64>, Vec<f64>) {
        let transform = self.info.transform();
        let (min, max) = (extent.min(), extent.max());
        let ys = (min.y..max.y)
            .map(|row| {
                let anchor = origin.anchor_of(min.x, row);
                transform.to_world(anchor.x, anchor.y).y
            })
            .collect();
        let xs = (min.x..max.x)
            .map(|col| {
                let anchor = origin.anchor_of(col, min.y);
                transform.to_world(anchor.x, anchor.y).x
            })
            .collect();
        (ys, xs)
    }
}
