use log::{info, warn};
use std::{path::Path, sync::Arc};

use crate::{
    algebra,
    components::{
        backends::{gdal_backend::GdalBackend, BackendError, StorageBackend},
        filter::{FilterExpression, FilterValue},
        naming::NamingConvention,
        record::{DataCubeRecord, Metadata},
        schema::{DimensionSchema, DimensionType},
        table::{Derivation, MutationMode, RecordTable},
        transforms::PixelOrigin,
        value::DimensionValue,
    },
    config::CubeConfig,
    errors::{CubeError, Result},
    geometry::GeometryInput,
    indexes::Indexes,
    loader::Loader,
    output::{LoadResult, OutputFormat},
    spatial::{Grid, SpatialResolver},
};

/// Logical data cube over raster files, addressed by the dimensions parsed from their names.
#[derive(Debug, Clone)]
pub struct DataCube {
    table: RecordTable,
    spatial: SpatialResolver,
    backend: Arc<dyn StorageBackend>,
    config: CubeConfig,
}

impl DataCube {
    /// Parse every file name of `filepaths` with `naming`.
    ///
    /// Without `dimensions`, the schema holds every field parsed from the first file,
    /// in name order. Parsed fields outside the schema are ignored.
    pub fn new<I, P>(
        filepaths: I,
        naming: &dyn NamingConvention,
        dimensions: Option<DimensionSchema>,
        grid: Option<Arc<dyn Grid>>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let parsed = filepaths
            .into_iter()
            .map(|filepath| {
                let filepath = filepath.as_ref();
                naming
                    .parse(filepath)
                    .map(|dims| (filepath.to_path_buf(), dims))
                    .map_err(|err| {
                        CubeError::Construction(format!("{}: {err}", filepath.display()))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        let Some((_, first)) = parsed.first() else {
            return Err(CubeError::Construction("no filepaths given".to_string()));
        };
        let schema = match dimensions {
            Some(schema) => schema,
            None => DimensionSchema::infer(first)?,
        };
        let records = parsed
            .into_iter()
            .map(|(filepath, mut dims)| {
                dims.retain(|name, _| schema.contains(name));
                DataCubeRecord::new(filepath, dims)
            })
            .collect();
        let table = RecordTable::new(schema, records)?;
        info!(
            "new data cube of {} records along {:?}",
            table.len(),
            table.schema().names().collect::<Vec<_>>()
        );
        Ok(Self::from_records(table, grid))
    }

    /// Cube over an existing record table.
    pub fn from_records(table: RecordTable, grid: Option<Arc<dyn Grid>>) -> Self {
        Self {
            table,
            spatial: SpatialResolver::new(grid),
            backend: Arc::new(GdalBackend),
            config: CubeConfig::default(),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_config(mut self, config: CubeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    pub fn schema(&self) -> &DimensionSchema {
        self.table.schema()
    }

    pub fn config(&self) -> &CubeConfig {
        &self.config
    }

    pub fn grid(&self) -> Option<&Arc<dyn Grid>> {
        self.spatial.grid()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn records(&self) -> &[DataCubeRecord] {
        self.table.records()
    }

    pub fn filepaths(&self) -> Vec<&Path> {
        self.table.filepaths()
    }

    pub fn values(&self, name: &str) -> Result<Vec<&DimensionValue>> {
        self.table.values(name)
    }

    pub fn unique_values(&self, name: &str) -> Result<Vec<DimensionValue>> {
        self.table.unique_values(name)
    }

    /// Cube sharing grid, backend and configuration with `self`.
    fn derive(&self, table: RecordTable) -> Self {
        Self {
            table,
            spatial: self.spatial.clone(),
            backend: Arc::clone(&self.backend),
            config: self.config.clone(),
        }
    }

    fn settle(&mut self, table: RecordTable, mode: MutationMode) -> Derivation<Self> {
        match mode {
            MutationMode::InPlace => {
                self.table = table;
                Derivation::Mutated
            }
            MutationMode::Copy => Derivation::Derived(self.derive(table)),
        }
    }

    pub fn rename_dimension<I, K, V>(&mut self, mapping: I, mode: MutationMode) -> Result<Derivation<Self>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Ok(self
            .table
            .rename_dimension(mapping, mode)?
            .map(|table| self.derive(table)))
    }

    pub fn add_dimension(
        &mut self,
        name: impl Into<String>,
        dimension_type: DimensionType,
        values: Vec<DimensionValue>,
        mode: MutationMode,
    ) -> Result<Derivation<Self>> {
        Ok(self
            .table
            .add_dimension(name, dimension_type, values, mode)?
            .map(|table| self.derive(table)))
    }

    pub fn sort_by_dimension(
        &mut self,
        name: &str,
        ascending: bool,
        mode: MutationMode,
    ) -> Result<Derivation<Self>> {
        Ok(self
            .table
            .sort_by_dimension(name, ascending, mode)?
            .map(|table| self.derive(table)))
    }

    /// Keep records matching any of the conditions built from `values` and `expressions`.
    pub fn filter_by_dimension(
        &mut self,
        values: Vec<FilterValue>,
        expressions: Option<Vec<FilterExpression>>,
        name: &str,
        mode: MutationMode,
    ) -> Result<Derivation<Self>> {
        Ok(self
            .table
            .filter_by_dimension(values, expressions, name, mode)?
            .map(|table| self.derive(table)))
    }

    pub fn filter_by_metadata(&mut self, metadata: &Metadata, mode: MutationMode) -> Derivation<Self> {
        self.table
            .filter_by_metadata(metadata, mode)
            .map(|table| self.derive(table))
    }

    pub fn filter_files_with_pattern(
        &mut self,
        pattern: &str,
        full_path: bool,
        mode: MutationMode,
    ) -> Result<Derivation<Self>> {
        Ok(self
            .table
            .filter_files_with_pattern(pattern, full_path, mode)?
            .map(|table| self.derive(table)))
    }

    pub fn select(&mut self, indexes: impl Into<Indexes>, mode: MutationMode) -> Derivation<Self> {
        self.table
            .select(indexes, mode)
            .map(|table| self.derive(table))
    }

    pub fn split_by_dimension(
        &self,
        values: Vec<FilterValue>,
        expressions: Option<Vec<FilterExpression>>,
        name: &str,
    ) -> Result<Vec<Self>> {
        Ok(self
            .table
            .split_by_dimension(values, expressions, name)?
            .into_iter()
            .map(|table| self.derive(table))
            .collect())
    }

    pub fn split_yearly(&self, name: &str, years: Option<&[i32]>) -> Result<Vec<Self>> {
        Ok(self
            .table
            .split_yearly(name, years)?
            .into_iter()
            .map(|table| self.derive(table))
            .collect())
    }

    pub fn split_monthly(&self, name: &str, months: Option<&[u32]>) -> Result<Vec<Self>> {
        Ok(self
            .table
            .split_monthly(name, months)?
            .into_iter()
            .map(|table| self.derive(table))
            .collect())
    }

    /// Records of both cubes, dimensions missing on one side set to null.
    pub fn unite(&mut self, other: &DataCube, mode: MutationMode) -> Result<Derivation<Self>> {
        let table = algebra::unite(&self.table, &other.table)?;
        Ok(self.settle(table, mode))
    }

    pub fn intersect(
        &mut self,
        other: &DataCube,
        on_dimension: Option<&str>,
        mode: MutationMode,
    ) -> Result<Derivation<Self>> {
        let table = algebra::intersect(&self.table, &other.table, on_dimension)?;
        Ok(self.settle(table, mode))
    }

    /// Reorder records so that dimension `name` follows `other` position for position.
    pub fn align_dimension(
        &mut self,
        other: &DataCube,
        name: &str,
        mode: MutationMode,
    ) -> Result<Derivation<Self>> {
        let table = algebra::align_dimension(&self.table, &other.table, name)?;
        Ok(self.settle(table, mode))
    }

    /// Keep records of the tiles `tilenames`, checked against the grid first with `use_grid`.
    pub fn filter_spatially_by_tilename<S: AsRef<str>>(
        &mut self,
        tilenames: &[S],
        dimension_name: &str,
        use_grid: bool,
        mode: MutationMode,
    ) -> Result<Derivation<Self>> {
        if use_grid {
            self.spatial.validate_tiles(tilenames)?;
        }
        let values = tilenames
            .iter()
            .map(|name| FilterValue::from(name.as_ref()))
            .collect();
        self.filter_by_dimension(values, None, dimension_name, mode)
    }

    /// Keep records intersecting `geometry`, given in `sref` or the system of the grid.
    ///
    /// Without a grid, the records' own footprints decide and records without one are dropped.
    pub fn filter_spatially_by_geom(
        &mut self,
        geometry: impl Into<GeometryInput>,
        sref: Option<&str>,
        dimension_name: &str,
        mode: MutationMode,
    ) -> Result<Derivation<Self>> {
        let geometry = geometry.into();
        if self.spatial.grid().is_some() {
            let tiles: Vec<String> = self
                .spatial
                .tiles_intersecting(&geometry, sref)?
                .into_iter()
                .collect();
            info!("geometry intersects tiles {tiles:?}");
            return self.filter_spatially_by_tilename(&tiles, dimension_name, false, mode);
        }
        if self.records().iter().all(|record| record.geom().is_none()) {
            return Err(CubeError::MissingGrid("spatial filtering by geometry"));
        }
        let mut kept = Vec::new();
        for record in self.records() {
            let Some(footprint) = record.geom() else {
                continue;
            };
            let request = geometry.normalize(sref, footprint.crs());
            if self.spatial.intersects(footprint, &request)? {
                kept.push(record.clone());
            }
        }
        info!("{} of {} footprints intersect the geometry", kept.len(), self.len());
        Ok(self
            .table
            .assign_records(kept, mode)
            .map(|table| self.derive(table)))
    }

    /// Apply `fill` to every record with what the backend reports for its file.
    fn attach<T>(
        &mut self,
        what: &str,
        read: impl Fn(&dyn StorageBackend, &Path) -> std::result::Result<T, BackendError>,
        fill: impl Fn(&mut DataCubeRecord, T),
    ) -> Result<()> {
        let mut records = self.table.records().to_vec();
        for record in records.iter_mut() {
            match read(self.backend.as_ref(), record.filepath()) {
                Ok(value) => fill(record, value),
                Err(source) if self.config.skip_missing => {
                    warn!("no {what} for {}: {source}", record.filepath().display())
                }
                Err(source) => return Err(CubeError::io(record.filepath(), source)),
            }
        }
        let _ = self.table.assign_records(records, MutationMode::InPlace);
        Ok(())
    }

    /// Set the footprint of every record from the georeference of its file.
    pub fn attach_footprints(&mut self) -> Result<()> {
        self.attach(
            "footprint",
            |backend, path| backend.raster_info(path).map(|info| info.footprint()),
            DataCubeRecord::set_geom,
        )
    }

    /// Set the metadata of every record from its file.
    pub fn attach_metadata(&mut self) -> Result<()> {
        self.attach(
            "metadata",
            |backend, path| backend.read_metadata(path),
            DataCubeRecord::set_metadata,
        )
    }

    fn loader(&self) -> Loader<'_> {
        Loader::new(&self.table, self.backend.as_ref(), &self.spatial, &self.config)
    }

    /// Pixels holding the coordinates (`xs[i]`, `ys[i]`) of every record covering them.
    pub fn load_by_coords(
        &self,
        xs: &[f64],
        ys: &[f64],
        band: &str,
        format: OutputFormat,
        origin: PixelOrigin,
        sref: Option<&str>,
    ) -> Result<LoadResult> {
        self.loader()
            .load_by_coords(xs, ys, band, format, origin, sref)
    }

    /// Windows of `row_size` x `col_size` pixels starting at (`rows[i]`, `cols[i]`) of every record.
    #[allow(clippy::too_many_arguments)]
    pub fn load_by_pixels(
        &self,
        rows: &[usize],
        cols: &[usize],
        row_size: usize,
        col_size: usize,
        band: &str,
        format: OutputFormat,
        origin: PixelOrigin,
    ) -> Result<LoadResult> {
        self.loader()
            .load_by_pixels(rows, cols, row_size, col_size, band, format, origin)
    }

    pub fn load_by_geom(
        &self,
        geometry: impl Into<GeometryInput>,
        sref: Option<&str>,
        band: &str,
        apply_mask: bool,
        format: OutputFormat,
        origin: PixelOrigin,
    ) -> Result<LoadResult> {
        self.loader()
            .load_by_geom(geometry.into(), sref, band, apply_mask, format, origin)
    }
}
