use ambassador::{delegatable_trait, Delegate};
use geo::{Polygon, Rect};
use shrinkwraprs::Shrinkwrap;

use crate::crs_geo::CrsGeometry;

/// Geometries a spatial request can be given as.
#[delegatable_trait]
pub trait ToPolygon {
    fn outline(&self) -> Polygon<f64>;
    /// Reference system carried by the geometry itself, if any.
    fn declared_crs(&self) -> Option<&str>;
}

/// Axis aligned box, (min_x, min_y) to (max_x, max_y).
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct BBox(Rect<f64>);

impl BBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self(Rect::new((min_x, min_y), (max_x, max_y)))
    }
}

impl From<Rect<f64>> for BBox {
    fn from(value: Rect<f64>) -> Self {
        Self(value)
    }
}

impl ToPolygon for BBox {
    fn outline(&self) -> Polygon<f64> {
        self.0.to_polygon()
    }
    fn declared_crs(&self) -> Option<&str> {
        None
    }
}

impl ToPolygon for Polygon<f64> {
    fn outline(&self) -> Polygon<f64> {
        self.clone()
    }
    fn declared_crs(&self) -> Option<&str> {
        None
    }
}

impl ToPolygon for CrsGeometry<Polygon<f64>> {
    fn outline(&self) -> Polygon<f64> {
        self.geometry().clone()
    }
    fn declared_crs(&self) -> Option<&str> {
        Some(self.crs())
    }
}

#[derive(Delegate, Debug, Clone, PartialEq)]
#[delegate(ToPolygon)]
pub enum GeometryInput {
    BBox(BBox),
    Polygon(Polygon<f64>),
    /// Polygon already tagged with its reference system.
    Native(CrsGeometry<Polygon<f64>>),
}

impl GeometryInput {
    /// Polygon tagged with its reference system.
    ///
    /// The geometry's own reference system wins over `sref`, `fallback` is
    /// used when neither is known.
    pub fn normalize(&self, sref: Option<&str>, fallback: &str) -> CrsGeometry<Polygon<f64>> {
        let crs = self.declared_crs().or(sref).unwrap_or(fallback);
        CrsGeometry::new(crs, self.outline())
    }
}

impl From<BBox> for GeometryInput {
    fn from(value: BBox) -> Self {
        GeometryInput::BBox(value)
    }
}

impl From<Rect<f64>> for GeometryInput {
    fn from(value: Rect<f64>) -> Self {
        GeometryInput::BBox(value.into())
    }
}

impl From<Polygon<f64>> for GeometryInput {
    fn from(value: Polygon<f64>) -> Self {
        GeometryInput::Polygon(value)
    }
}

impl From<CrsGeometry<Polygon<f64>>> for GeometryInput {
    fn from(value: CrsGeometry<Polygon<f64>>) -> Self {
        GeometryInput::Native(value)
    }
}
