use geo::{Coord, MapCoords};
use proj::Proj;
use shrinkwraprs::Shrinkwrap;
use std::sync::Arc;

use crate::errors::{CubeError, Result};

/// Geometry tagged with the reference system its coordinates are given in.
#[derive(Shrinkwrap, Debug, Clone, PartialEq)]
pub struct CrsGeometry<G> {
    crs: Arc<str>,
    #[shrinkwrap(main_field)]
    geometry: G,
}

impl<G> CrsGeometry<G> {
    pub fn new(crs: impl Into<Arc<str>>, geometry: G) -> Self {
        Self {
            crs: crs.into(),
            geometry,
        }
    }

    pub fn crs(&self) -> &str {
        self.crs.as_ref()
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    pub fn into_geometry(self) -> G {
        self.geometry
    }

    pub fn same_crs(&self, crs: &str) -> bool {
        self.crs().eq(crs)
    }
}

impl<G: MapCoords<f64, f64, Output = G> + Clone> CrsGeometry<G> {
    pub fn with_crs(mut self, crs: &str) -> Result<Self> {
        if !self.same_crs(crs) {
            self.geometry = reproject(&self.geometry, self.crs(), crs)?;
            self.crs = Arc::from(crs);
        }
        Ok(self)
    }

    /// Clones if crs is same.
    pub fn projected_geometry(&self, crs: &str) -> Result<G> {
        if self.same_crs(crs) {
            Ok(self.geometry.clone())
        } else {
            reproject(&self.geometry, self.crs(), crs)
        }
    }
}

fn reproject<G: MapCoords<f64, f64, Output = G>>(geometry: &G, from: &str, to: &str) -> Result<G> {
    let proj = Proj::new_known_crs(from, to, None).map_err(|source| {
        CubeError::CoordinateSystemMismatch {
            from: from.to_string(),
            to: to.to_string(),
            source: Some(source),
        }
    })?;
    let projected = geometry.try_map_coords(|coord: Coord<f64>| {
        proj.convert((coord.x, coord.y))
            .map(|(x, y)| Coord { x, y })
    })?;
    Ok(projected)
}
