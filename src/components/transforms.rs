use geo::{AffineTransform, Coord};
use serde::{Deserialize, Serialize};
use shrinkwraprs::Shrinkwrap;
use std::{fmt, str::FromStr, sync::Arc};

use crate::errors::CubeError;

/// Affine map from (col, row) pixel space to coordinates in `crs`.
#[derive(Shrinkwrap, Debug, Clone, PartialEq)]
pub struct PixelTransform {
    #[shrinkwrap(main_field)]
    transform: AffineTransform,
    crs: Arc<str>,
}

impl PixelTransform {
    pub fn new(transform: AffineTransform, crs: impl Into<Arc<str>>) -> Self {
        Self {
            transform,
            crs: crs.into(),
        }
    }

    /// From a GDAL style geotransform `[xoff, a, b, yoff, d, e]`.
    pub fn from_gdal(gdal_transform: [f64; 6], crs: impl Into<Arc<str>>) -> Self {
        let transform = AffineTransform::new(
            gdal_transform[1],
            gdal_transform[2],
            gdal_transform[0],
            gdal_transform[4],
            gdal_transform[5],
            gdal_transform[3],
        );
        Self::new(transform, crs)
    }

    /// North up raster with square pixels, `origin` being the upper left corner.
    pub fn north_up(origin: (f64, f64), resolution: f64, crs: impl Into<Arc<str>>) -> Self {
        let transform = AffineTransform::new(resolution, 0., origin.0, 0., -resolution, origin.1);
        Self::new(transform, crs)
    }

    pub fn crs(&self) -> &str {
        self.crs.as_ref()
    }

    pub fn shared_crs(&self) -> Arc<str> {
        Arc::clone(&self.crs)
    }

    /// World coordinate of fractional pixel position (col, row).
    pub fn to_world(&self, col: f64, row: f64) -> Coord<f64> {
        self.transform.apply(Coord { x: col, y: row })
    }

    pub fn inverse(&self) -> Option<WorldTransform> {
        self.transform.inverse().map(WorldTransform)
    }
}

/// Inverse of a [PixelTransform], world coordinates to fractional (col, row).
#[derive(Shrinkwrap, Debug, Clone, Copy)]
pub struct WorldTransform(AffineTransform);

impl WorldTransform {
    pub fn to_pixel(&self, coord: Coord<f64>) -> Coord<f64> {
        self.0.apply(coord)
    }
}

/// Pixel anchor a coordinate refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelOrigin {
    Ul,
    #[default]
    Ur,
    Lr,
    Ll,
    C,
}

impl PixelOrigin {
    /// Anchor offset in pixel units as (col, row).
    pub fn anchor(&self) -> (f64, f64) {
        match self {
            PixelOrigin::Ul => (0., 0.),
            PixelOrigin::Ur => (1., 0.),
            PixelOrigin::Lr => (1., 1.),
            PixelOrigin::Ll => (0., 1.),
            PixelOrigin::C => (0.5, 0.5),
        }
    }

    /// Index of the pixel whose anchor is nearest to fractional position (col, row).
    pub fn pixel_of(&self, fractional: Coord<f64>) -> (i64, i64) {
        let (col_anchor, row_anchor) = self.anchor();
        (
            (fractional.x - col_anchor + 0.5).floor() as i64,
            (fractional.y - row_anchor + 0.5).floor() as i64,
        )
    }

    /// Fractional position of the anchor of pixel (col, row).
    pub fn anchor_of(&self, col: i64, row: i64) -> Coord<f64> {
        let (col_anchor, row_anchor) = self.anchor();
        Coord {
            x: col as f64 + col_anchor,
            y: row as f64 + row_anchor,
        }
    }
}

impl fmt::Display for PixelOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelOrigin::Ul => "ul",
            PixelOrigin::Ur => "ur",
            PixelOrigin::Lr => "lr",
            PixelOrigin::Ll => "ll",
            PixelOrigin::C => "c",
        };
        f.write_str(name)
    }
}

impl FromStr for PixelOrigin {
    type Err = CubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ul" => Ok(PixelOrigin::Ul),
            "ur" => Ok(PixelOrigin::Ur),
            "lr" => Ok(PixelOrigin::Lr),
            "ll" => Ok(PixelOrigin::Ll),
            "c" => Ok(PixelOrigin::C),
            _ => Err(CubeError::InvalidOrigin(s.to_string())),
        }
    }
}
