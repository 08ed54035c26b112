use geo::{Intersects, Polygon, Rect};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Debug,
    sync::Arc,
};

use crate::{
    crs_geo::CrsGeometry,
    errors::{CubeError, Result},
    geometry::GeometryInput,
};

/// Tiling of space into named footprints.
pub trait Grid: Send + Sync + Debug {
    /// Native reference system of the grid.
    fn crs(&self) -> &str;
    fn tile_footprint(&self, name: &str) -> Result<CrsGeometry<Polygon<f64>>>;
    /// Names of the tiles `geometry` intersects.
    fn tiles_intersecting(&self, geometry: &CrsGeometry<Polygon<f64>>) -> Result<BTreeSet<String>>;

    fn transform(
        &self,
        geometry: CrsGeometry<Polygon<f64>>,
        to: &str,
    ) -> Result<CrsGeometry<Polygon<f64>>> {
        geometry.with_crs(to)
    }

    fn has_tile(&self, name: &str) -> bool {
        self.tile_footprint(name).is_ok()
    }
}

/// Grid given by an explicit catalog of tile footprints.
#[derive(Debug, Clone)]
pub struct TileGrid {
    crs: Arc<str>,
    tiles: BTreeMap<String, Polygon<f64>>,
}

impl TileGrid {
    pub fn new(crs: impl Into<Arc<str>>) -> Self {
        Self {
            crs: crs.into(),
            tiles: BTreeMap::new(),
        }
    }

    pub fn with_tile(mut self, name: impl Into<String>, footprint: Polygon<f64>) -> Self {
        self.tiles.insert(name.into(), footprint);
        self
    }

    /// Square tiles of `tile_size` covering `extent` row by row from its lower left corner.
    ///
    /// Tile names are given by `name(col, row)`.
    pub fn regular(
        crs: impl Into<Arc<str>>,
        extent: Rect<f64>,
        tile_size: f64,
        name: impl Fn(usize, usize) -> String,
    ) -> Self {
        let cols = (extent.width() / tile_size).ceil() as usize;
        let rows = (extent.height() / tile_size).ceil() as usize;
        let mut grid = Self::new(crs);
        for row in 0..rows {
            for col in 0..cols {
                let min_x = extent.min().x + col as f64 * tile_size;
                let min_y = extent.min().y + row as f64 * tile_size;
                let tile = Rect::new((min_x, min_y), (min_x + tile_size, min_y + tile_size));
                grid.tiles.insert(name(col, row), tile.to_polygon());
            }
        }
        grid
    }

    pub fn tile_names(&self) -> impl Iterator<Item = &str> {
        self.tiles.keys().map(String::as_str)
    }
}

impl Grid for TileGrid {
    fn crs(&self) -> &str {
        self.crs.as_ref()
    }

    fn tile_footprint(&self, name: &str) -> Result<CrsGeometry<Polygon<f64>>> {
        self.tiles
            .get(name)
            .map(|footprint| CrsGeometry::new(Arc::clone(&self.crs), footprint.clone()))
            .ok_or_else(|| CubeError::UnknownTile(name.to_string()))
    }

    fn tiles_intersecting(&self, geometry: &CrsGeometry<Polygon<f64>>) -> Result<BTreeSet<String>> {
        let geometry = self.transform(geometry.clone(), self.crs())?;
        Ok(self
            .tiles
            .iter()
            .filter(|(_, footprint)| footprint.intersects(geometry.geometry()))
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn has_tile(&self, name: &str) -> bool {
        self.tiles.contains_key(name)
    }
}

/// Spatial questions of a data cube, answered by its grid when it has one.
#[derive(Debug, Clone, Default)]
pub struct SpatialResolver {
    grid: Option<Arc<dyn Grid>>,
}

impl SpatialResolver {
    pub fn new(grid: Option<Arc<dyn Grid>>) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> Option<&Arc<dyn Grid>> {
        self.grid.as_ref()
    }

    /// Grid or [CubeError::MissingGrid] naming `operation`.
    pub fn require_grid(&self, operation: &'static str) -> Result<&dyn Grid> {
        self.grid
            .as_deref()
            .ok_or(CubeError::MissingGrid(operation))
    }

    pub fn validate_tiles<S: AsRef<str>>(&self, tilenames: &[S]) -> Result<()> {
        let grid = self.require_grid("tile name validation")?;
        match tilenames.iter().find(|name| !grid.has_tile(name.as_ref())) {
            Some(unknown) => Err(CubeError::UnknownTile(unknown.as_ref().to_string())),
            None => Ok(()),
        }
    }

    pub fn tile_footprint(&self, name: &str) -> Result<CrsGeometry<Polygon<f64>>> {
        self.require_grid("tile footprints")?.tile_footprint(name)
    }

    /// Tiles intersecting `geometry`, given in `sref` or the grid's system.
    pub fn tiles_intersecting(
        &self,
        geometry: &GeometryInput,
        sref: Option<&str>,
    ) -> Result<BTreeSet<String>> {
        let grid = self.require_grid("spatial filtering by tiles")?;
        let geometry = geometry.normalize(sref, grid.crs());
        let geometry = grid.transform(geometry, grid.crs())?;
        grid.tiles_intersecting(&geometry)
    }

    /// `geometry` expressed in `crs`.
    pub fn transform(
        &self,
        geometry: CrsGeometry<Polygon<f64>>,
        crs: &str,
    ) -> Result<CrsGeometry<Polygon<f64>>> {
        match &self.grid {
            Some(grid) => grid.transform(geometry, crs),
            None => geometry.with_crs(crs),
        }
    }

    /// Intersection test after bringing `rhs` into the system of `lhs`.
    pub fn intersects(
        &self,
        lhs: &CrsGeometry<Polygon<f64>>,
        rhs: &CrsGeometry<Polygon<f64>>,
    ) -> Result<bool> {
        let rhs = self.transform(rhs.clone(), lhs.crs())?;
        Ok(lhs.geometry().intersects(rhs.geometry()))
    }
}
