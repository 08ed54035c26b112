use geo::Polygon;
use log::{debug, warn};
use ndarray::{Array2, ArrayD, IxDyn};
use rayon::prelude::*;
use std::fmt;

use crate::{
    components::{
        backends::StorageBackend,
        record::DataCubeRecord,
        table::RecordTable,
        transforms::PixelOrigin,
        value::DimensionValue,
    },
    config::CubeConfig,
    errors::{CubeError, Result},
    geometry::{GeometryInput, ToPolygon},
    output::{Coordinate, CubeArray, LoadResult, OutputFormat},
    region::RegionResolver,
    spatial::SpatialResolver,
};

#[derive(Debug, Clone, Copy)]
enum LoadState {
    RequestParsed,
    RecordSelected,
    WindowResolved,
    MaskBuilt,
    DataRead,
    Assembled,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadState::RequestParsed => "REQUEST_PARSED",
            LoadState::RecordSelected => "RECORD_SELECTED",
            LoadState::WindowResolved => "WINDOW_RESOLVED",
            LoadState::MaskBuilt => "MASK_BUILT",
            LoadState::DataRead => "DATA_READ",
            LoadState::Assembled => "ASSEMBLED",
        };
        f.write_str(name)
    }
}

/// Spatial request against a single record.
#[derive(Debug, Clone)]
enum Request {
    Coord { x: f64, y: f64 },
    Pixels { offset: (usize, usize), shape: (usize, usize) },
    Geometry(GeometryInput),
}

/// Pixels read from one record for one request.
#[derive(Debug)]
struct Block {
    record: usize,
    data: Array2<f64>,
    mask: Option<Array2<bool>>,
    ys: Vec<f64>,
    xs: Vec<f64>,
}

/// Options shared by the requests of one load call.
#[derive(Debug, Clone, Copy)]
struct LoadOptions<'o> {
    band: &'o str,
    origin: PixelOrigin,
    sref: Option<&'o str>,
    apply_mask: bool,
}

/// Reads regions of the records of a table into arrays.
#[derive(Debug)]
pub struct Loader<'a> {
    table: &'a RecordTable,
    backend: &'a dyn StorageBackend,
    spatial: &'a SpatialResolver,
    config: &'a CubeConfig,
}

impl<'a> Loader<'a> {
    pub fn new(
        table: &'a RecordTable,
        backend: &'a dyn StorageBackend,
        spatial: &'a SpatialResolver,
        config: &'a CubeConfig,
    ) -> Self {
        Self {
            table,
            backend,
            spatial,
            config,
        }
    }

    /// Single pixels holding the coordinates (`xs[i]`, `ys[i]`), given in `sref` or the rasters' system.
    ///
    /// `origin` is the pixel anchor the coordinates refer to.
    pub fn load_by_coords(
        &self,
        xs: &[f64],
        ys: &[f64],
        band: &str,
        format: OutputFormat,
        origin: PixelOrigin,
        sref: Option<&str>,
    ) -> Result<LoadResult> {
        if xs.len() != ys.len() {
            return Err(CubeError::length_mismatch("y coordinates", xs.len(), ys.len()));
        }
        let requests = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| Request::Coord { x: *x, y: *y })
            .collect();
        let options = LoadOptions {
            band,
            origin,
            sref,
            apply_mask: false,
        };
        self.load(requests, options, format)
    }

    /// Windows of `row_size` x `col_size` pixels with their top left pixel at (`rows[i]`, `cols[i]`).
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
        if rows.len() != cols.len() {
            return Err(CubeError::length_mismatch("pixel columns", rows.len(), cols.len()));
        }
        let requests = rows
            .iter()
            .zip(cols)
            .map(|(row, col)| Request::Pixels {
                offset: (*row, *col),
                shape: (row_size, col_size),
            })
            .collect();
        let options = LoadOptions {
            band,
            origin,
            sref: None,
            apply_mask: false,
        };
        self.load(requests, options, format)
    }

    /// Smallest window enclosing `geometry` together with its pixel center mask.
    pub fn load_by_geom(
        &self,
        geometry: GeometryInput,
        sref: Option<&str>,
        band: &str,
        apply_mask: bool,
        format: OutputFormat,
        origin: PixelOrigin,
    ) -> Result<LoadResult> {
        let options = LoadOptions {
            band,
            origin,
            sref,
            apply_mask,
        };
        self.load(vec![Request::Geometry(geometry)], options, format)
    }

    fn load(
        &self,
        requests: Vec<Request>,
        options: LoadOptions,
        format: OutputFormat,
    ) -> Result<LoadResult> {
        debug!(
            "{}: {} request(s) on band {:?} over {} records",
            LoadState::RequestParsed,
            requests.len(),
            options.band,
            self.table.len()
        );
        let jobs = requests
            .iter()
            .enumerate()
            .map(|(index, request)| -> Result<_> {
                Ok(self
                    .candidates(request, options)?
                    .into_iter()
                    .map(move |record| (index, record)))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<(usize, usize)>>();
        debug!("{}: {} record reads", LoadState::RecordSelected, jobs.len());

        let read = |(request, record): &(usize, usize)| {
            (*request, self.read_record(&requests[*request], *record, options))
        };
        let reads: Vec<(usize, Result<Option<Block>>)> = if self.config.parallel_reads {
            jobs.par_iter().map(read).collect()
        } else {
            jobs.iter().map(read).collect()
        };

        let mut blocks: Vec<Vec<Block>> = requests.iter().map(|_| Vec::new()).collect();
        for (request, read) in reads {
            match read {
                Ok(Some(block)) => blocks[request].push(block),
                Ok(None) => (),
                Err(err @ CubeError::Io { .. }) if self.config.skip_missing => {
                    warn!("skipping record: {err}")
                }
                Err(err) => return Err(err),
            }
        }
        for (request, request_blocks) in requests.iter().zip(&blocks) {
            if request_blocks.is_empty() {
                if let Some(err) = self.out_of_bounds(request) {
                    return Err(err);
                }
            }
        }
        let array = self.assemble(blocks, options)?;
        debug!("{}: shape {:?}", LoadState::Assembled, array.shape());
        array.into_format(format)
    }

    /// Records a request may touch, in table order.
    fn candidates(&self, request: &Request, options: LoadOptions) -> Result<Vec<usize>> {
        let tile_dimension = self.config.tile_dimension.as_str();
        let all = || (0..self.table.len()).collect();
        let Request::Geometry(geometry) = request else {
            return Ok(all());
        };
        if self.spatial.grid().is_none() || !self.table.schema().contains(tile_dimension) {
            return Ok(all());
        }
        let tiles = self.spatial.tiles_intersecting(geometry, options.sref)?;
        Ok(self
            .table
            .records()
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                record
                    .get(tile_dimension)
                    .as_str()
                    .is_some_and(|tile| tiles.contains(tile))
            })
            .map(|(index, _)| index)
            .collect())
    }

    /// Pixels of record `index` covered by `request`, `None` if it does not cover the record.
    fn read_record(
        &self,
        request: &Request,
        index: usize,
        options: LoadOptions,
    ) -> Result<Option<Block>> {
        let record: &DataCubeRecord = &self.table.records()[index];
        let filepath = record.filepath();
        let info = self
            .backend
            .raster_info(filepath)
            .map_err(|source| CubeError::io(filepath, source))?;
        let resolver = RegionResolver::new(filepath, info)?;

        let (window, geometry_window) = match request {
            Request::Coord { x, y } => {
                match resolver.pixel_of(*x, *y, options.sref, options.origin)? {
                    Some(offset) => (resolver.window_at(offset, (1, 1))?, None),
                    None => return Ok(None),
                }
            }
            Request::Pixels { offset, shape } => (resolver.window_at(*offset, *shape)?, None),
            Request::Geometry(geometry) => {
                let crs = resolver.info().crs();
                let polygon: Polygon<f64> = self
                    .spatial
                    .transform(geometry.normalize(options.sref, crs), crs)?
                    .into_geometry();
                let Some(enclosing) = resolver.window_of(&polygon)? else {
                    return Ok(None);
                };
                debug!(
                    "{}: {} of {}, padded to {:?}",
                    LoadState::WindowResolved,
                    enclosing.window(),
                    filepath.display(),
                    enclosing.shape()
                );
                let mask = resolver.mask_of(&polygon, &enclosing);
                debug!(
                    "{}: {} of {} pixels outside the geometry",
                    LoadState::MaskBuilt,
                    mask.iter().filter(|masked| **masked).count(),
                    mask.len()
                );
                (*enclosing.window(), Some((enclosing, mask)))
            }
        };
        if !matches!(request, Request::Geometry(_)) {
            debug!("{}: {} of {}", LoadState::WindowResolved, window, filepath.display());
        }

        let data = self
            .backend
            .read_window(filepath, options.band, &window)
            .map_err(|source| CubeError::io(filepath, source))?;
        if data.dim() != window.shape() {
            return Err(CubeError::length_mismatch(
                format!("pixels read from {}", filepath.display()),
                window.size(),
                data.len(),
            ));
        }
        debug!("{}: {} pixels of {}", LoadState::DataRead, data.len(), filepath.display());
        // pixels of the geometry beyond the raster hold NaN and are masked
        let (data, mask, extent) = match geometry_window {
            Some((enclosing, mask)) => (enclosing.pad(data, f64::NAN), Some(mask), enclosing.extent()),
            None => (data, None, window.extent()),
        };
        let (ys, xs) = resolver.labels(extent, options.origin);
        Ok(Some(Block {
            record: index,
            data,
            mask,
            ys,
            xs,
        }))
    }

    fn out_of_bounds(&self, request: &Request) -> Option<CubeError> {
        let (x, y) = match request {
            Request::Coord { x, y } => (*x, *y),
            Request::Geometry(geometry) => {
                let first = geometry.outline().exterior().0.first().copied()?;
                (first.x, first.y)
            }
            Request::Pixels { .. } => return None,
        };
        Some(CubeError::OutOfBounds {
            x,
            y,
            target: format!("every one of {} candidate records", self.table.len()),
        })
    }

    /// Name of the record axis, after the first dimension of the schema.
    fn record_axis(&self) -> String {
        self.table
            .schema()
            .names()
            .next()
            .unwrap_or("record")
            .to_string()
    }

    fn assemble(&self, blocks: Vec<Vec<Block>>, options: LoadOptions) -> Result<CubeArray> {
        let requests = blocks.len();
        let records = blocks.first().map_or(0, Vec::len);
        if let Some(found) = blocks.iter().map(Vec::len).find(|len| *len != records) {
            return Err(CubeError::length_mismatch("records per request", records, found));
        }
        let shape = blocks
            .iter()
            .flatten()
            .next()
            .map_or((0, 0), |block| block.data.dim());
        if let Some(block) = blocks.iter().flatten().find(|block| block.data.dim() != shape) {
            return Err(CubeError::length_mismatch(
                "pixels per window",
                shape.0 * shape.1,
                block.data.len(),
            ));
        }

        let record_axis = self.record_axis();
        let stacked = requests > 1;
        let leading: Vec<String> = if stacked {
            vec!["request".to_string(), record_axis.clone()]
        } else {
            vec![record_axis.clone()]
        };
        let leading_shape: Vec<usize> = if stacked {
            vec![requests, records]
        } else {
            vec![records]
        };
        let dims: Vec<String> = leading
            .iter()
            .cloned()
            .chain(["y".to_string(), "x".to_string()])
            .collect();
        let full_shape: Vec<usize> = leading_shape.iter().copied().chain([shape.0, shape.1]).collect();
        let flat: Vec<&Block> = blocks.iter().flatten().collect();

        let data = ArrayD::from_shape_vec(
            IxDyn(&full_shape),
            flat.iter().flat_map(|block| block.data.iter().copied()).collect(),
        )?;
        let mask = if flat.iter().any(|block| block.mask.is_some()) {
            let values = flat
                .iter()
                .flat_map(|block| match &block.mask {
                    Some(mask) => mask.iter().copied().collect::<Vec<_>>(),
                    None => vec![false; block.data.len()],
                })
                .collect();
            Some(ArrayD::from_shape_vec(IxDyn(&full_shape), values)?)
        } else {
            None
        };

        let mut coords = Vec::new();
        if stacked {
            let indexes = (0..requests).map(|index| DimensionValue::from(index as i64)).collect();
            coords.push(Coordinate::new(
                "request",
                vec!["request".to_string()],
                ArrayD::from_shape_vec(IxDyn(&[requests]), indexes)?,
            )?);
        }
        let record_values = |value: &dyn Fn(&DataCubeRecord) -> DimensionValue| {
            let values = flat
                .iter()
                .map(|block| value(&self.table.records()[block.record]))
                .collect();
            ArrayD::from_shape_vec(IxDyn(&leading_shape), values)
        };
        for name in self.table.schema().names() {
            let values = record_values(&|record: &DataCubeRecord| record.get(name).clone())?;
            coords.push(Coordinate::new(name, leading.clone(), values)?);
        }
        let filepaths = record_values(&|record: &DataCubeRecord| {
            DimensionValue::from(record.filepath().display().to_string())
        })?;
        coords.push(Coordinate::new("filepath", leading.clone(), filepaths)?);
        coords.push(spatial_labels("y", &flat, &leading, &leading_shape, |block| block.ys.as_slice())?);
        coords.push(spatial_labels("x", &flat, &leading, &leading_shape, |block| block.xs.as_slice())?);

        CubeArray::new(
            options.band,
            dims,
            coords,
            data,
            mask,
            options.apply_mask,
        )
    }
}

/// One dimensional labels when every block shares them, labels per block otherwise.
fn spatial_labels(
    name: &str,
    blocks: &[&Block],
    leading: &[String],
    leading_shape: &[usize],
    labels: fn(&Block) -> &[f64],
) -> Result<Coordinate> {
    let as_values = |labels: &[f64]| -> Vec<DimensionValue> {
        labels.iter().copied().map(DimensionValue::from).collect()
    };
    let first: &[f64] = match blocks.first() {
        Some(block) => labels(*block),
        None => &[],
    };
    if blocks.iter().all(|block| labels(*block) == first) {
        let values = ArrayD::from_shape_vec(IxDyn(&[first.len()]), as_values(first))?;
        return Coordinate::new(name, vec![name.to_string()], values);
    }
    let dims: Vec<String> = leading.iter().cloned().chain([name.to_string()]).collect();
    let shape: Vec<usize> = leading_shape.iter().copied().chain([first.len()]).collect();
    let values = blocks
        .iter()
        .flat_map(|block| as_values(labels(*block)))
        .collect();
    Coordinate::new(name, dims, ArrayD::from_shape_vec(IxDyn(&shape), values)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        components::{backends::memory::MemoryBackend, bounds::PixelWindow},
        fixtures::{backend, day, grid, record, CRS},
        geometry::BBox,
        spatial::{Grid, TileGrid},
        DimensionSchema, DimensionType,
    };
    use geo::polygon;
    use rstest::{fixture, rstest};
    use std::{path::Path, sync::Arc};
    use test_log::test;

    #[fixture]
    fn table() -> RecordTable {
        let schema = DimensionSchema::new([
            ("time", DimensionType::Temporal),
            ("tile", DimensionType::Categorical),
        ])
        .unwrap();
        let records = ["E000N000", "E001N000"]
            .into_iter()
            .flat_map(|tile| {
                [1, 2].map(|time| {
                    record(
                        &format!("/data/VV_202001{time:02}_{tile}.tif"),
                        vec![("time", day(time).into()), ("tile", tile.into())],
                    )
                })
            })
            .collect();
        RecordTable::new(schema, records).unwrap()
    }

    fn loader<'a>(
        table: &'a RecordTable,
        backend: &'a MemoryBackend,
        spatial: &'a SpatialResolver,
        config: &'a CubeConfig,
    ) -> Loader<'a> {
        Loader::new(table, backend, spatial, config)
    }

    #[rstest]
    #[test]
    fn top_left_pixel_matches_backend(table: RecordTable, backend: MemoryBackend) {
        let (spatial, config) = (SpatialResolver::default(), CubeConfig::default());
        let result = loader(&table, &backend, &spatial, &config)
            .load_by_pixels(&[0], &[0], 1, 1, "1", OutputFormat::Numpy, PixelOrigin::Ur)
            .unwrap()
            .into_dense()
            .unwrap();
        assert_eq!(result.data.shape(), [4, 1, 1]);
        let direct = backend
            .read_window(
                Path::new("/data/VV_20200101_E000N000.tif"),
                "1",
                &PixelWindow::new((0, 0), (1, 1)),
            )
            .unwrap();
        assert_eq!(result.data[[0, 0, 0]], direct[[0, 0]]);
    }

    #[rstest]
    #[test]
    fn stacks_pixel_requests(table: RecordTable, backend: MemoryBackend) {
        let (spatial, config) = (SpatialResolver::default(), CubeConfig::default());
        let result = loader(&table, &backend, &spatial, &config)
            .load_by_pixels(&[0, 10], &[0, 20], 2, 3, "1", OutputFormat::Xarray, PixelOrigin::Ul)
            .unwrap()
            .into_labeled()
            .unwrap();
        assert_eq!(result.shape(), [2, 4, 2, 3]);
        assert_eq!(result.dims(), ["request", "time", "y", "x"]);
        assert_eq!(result.data()[[1, 0, 0, 0]], 10_000. + 1020.);
        let x = result.coord("x").unwrap();
        assert_eq!(x.dims(), ["request", "time", "x"]);
        assert_eq!(x.values()[[0, 2, 0]], DimensionValue::from(100.));
    }

    #[rstest]
    #[test]
    fn oversized_windows_fail(table: RecordTable, backend: MemoryBackend) {
        let (spatial, config) = (SpatialResolver::default(), CubeConfig::default());
        let result = loader(&table, &backend, &spatial, &config).load_by_pixels(
            &[99],
            &[0],
            2,
            1,
            "1",
            OutputFormat::Numpy,
            PixelOrigin::Ur,
        );
        assert!(matches!(result, Err(CubeError::WindowOutOfBounds { .. })));
    }

    #[rstest]
    #[test]
    fn reads_coordinates_from_covering_records(table: RecordTable, backend: MemoryBackend) {
        let (spatial, config) = (SpatialResolver::default(), CubeConfig::default());
        let result = loader(&table, &backend, &spatial, &config)
            .load_by_coords(&[150.5], &[99.5], "1", OutputFormat::Xarray, PixelOrigin::C, None)
            .unwrap()
            .into_labeled()
            .unwrap();
        assert_eq!(result.shape(), [2, 1, 1]);
        assert_eq!(result.data()[[0, 0, 0]], 110_000. + 50.);
        assert_eq!(result.data()[[1, 0, 0]], 120_000. + 50.);
        assert_eq!(result.index_of("x", &150.5.into()), Some(0));
        let tiles = result.coord("tile").unwrap().values();
        assert!(tiles.iter().all(|tile| *tile == DimensionValue::from("E001N000")));
    }

    #[rstest]
    #[test]
    fn coordinates_outside_every_record_fail(table: RecordTable, backend: MemoryBackend) {
        let (spatial, config) = (SpatialResolver::default(), CubeConfig::default());
        let result = loader(&table, &backend, &spatial, &config).load_by_coords(
            &[500.],
            &[50.],
            "1",
            OutputFormat::Numpy,
            PixelOrigin::Ur,
            None,
        );
        assert!(matches!(result, Err(CubeError::OutOfBounds { x, .. }) if x == 500.));
    }

    #[rstest]
    #[test]
    fn coordinate_requests_need_same_record_count(table: RecordTable, backend: MemoryBackend) {
        let mut table = table;
        let _ = table.select([0, 1, 2], crate::MutationMode::InPlace);
        let (spatial, config) = (SpatialResolver::default(), CubeConfig::default());
        let result = loader(&table, &backend, &spatial, &config).load_by_coords(
            &[50., 150.],
            &[50., 50.],
            "1",
            OutputFormat::Numpy,
            PixelOrigin::Ur,
            None,
        );
        assert!(matches!(result, Err(CubeError::LengthMismatch { .. })));
    }

    #[rstest]
    #[test]
    fn masks_triangle(table: RecordTable, backend: MemoryBackend, grid: Arc<TileGrid>) {
        let grid: Arc<dyn Grid> = grid;
        let spatial = SpatialResolver::new(Some(grid));
        let config = CubeConfig::default();
        let triangle = polygon![(x: 0., y: 90.), (x: 10., y: 90.), (x: 0., y: 100.)];
        let result = loader(&table, &backend, &spatial, &config)
            .load_by_geom(triangle.into(), None, "1", true, OutputFormat::Numpy, PixelOrigin::Ur)
            .unwrap()
            .into_dense()
            .unwrap();
        assert_eq!(result.data.shape(), [2, 10, 10]);
        let mask = result.mask.as_ref().unwrap();
        for ((_, row, col), masked) in mask
            .view()
            .into_dimensionality::<ndarray::Ix3>()
            .unwrap()
            .indexed_iter()
        {
            assert_eq!(*masked, col > row);
        }
        assert!(result.mask_applied);
        assert!(result.filled(f64::NAN)[[0, 0, 1]].is_nan());
        assert_eq!(result.data[[0, 9, 0]], 10_000. + 900.);
    }

    #[rstest]
    #[test]
    fn unmasked_geometry_keeps_mask_alongside(table: RecordTable, backend: MemoryBackend) {
        let (spatial, config) = (SpatialResolver::default(), CubeConfig::default());
        let bbox = BBox::new(10., 10., 12., 13.);
        let result = loader(&table, &backend, &spatial, &config)
            .load_by_geom(bbox.into(), Some(CRS), "1", false, OutputFormat::Dataframe, PixelOrigin::Ur)
            .unwrap()
            .into_frame()
            .unwrap();
        assert_eq!(result.height(), 2 * 3 * 2);
        assert_eq!(result.column("1").unwrap().null_count(), 0);
    }

    #[rstest]
    #[test]
    fn geometry_outside_rasters_fails(table: RecordTable, backend: MemoryBackend) {
        let (spatial, config) = (SpatialResolver::default(), CubeConfig::default());
        let bbox = BBox::new(500., 500., 510., 510.);
        let result = loader(&table, &backend, &spatial, &config).load_by_geom(
            bbox.into(),
            None,
            "1",
            true,
            OutputFormat::Numpy,
            PixelOrigin::Ur,
        );
        assert!(matches!(result, Err(CubeError::OutOfBounds { x, y, .. }) if x == 500. && y == 500.));
    }

    #[rstest]
    #[test]
    fn geometries_across_tiles_pad_pixels_beyond_each_raster(
        table: RecordTable,
        backend: MemoryBackend,
        grid: Arc<TileGrid>,
    ) {
        let grid: Arc<dyn Grid> = grid;
        let spatial = SpatialResolver::new(Some(grid));
        let config = CubeConfig::default();
        let bbox = BBox::new(95., 10., 110., 13.);
        let result = loader(&table, &backend, &spatial, &config)
            .load_by_geom(bbox.into(), None, "1", true, OutputFormat::Xarray, PixelOrigin::Ul)
            .unwrap()
            .into_labeled()
            .unwrap();
        assert_eq!(result.shape(), [4, 3, 15]);
        let x = result.coord("x").unwrap();
        assert_eq!(x.dims(), ["x"]);
        assert_eq!(x.values()[[0]], DimensionValue::from(95.));
        assert_eq!(x.values()[[14]], DimensionValue::from(109.));

        // west tile holds x 95..100, east tile x 100..110
        assert_eq!(result.data()[[0, 0, 0]], 10_000. + 8700. + 95.);
        assert!(result.data()[[0, 0, 5]].is_nan());
        assert_eq!(result.data()[[2, 0, 5]], 110_000. + 8700.);
        assert!(result.data()[[2, 0, 4]].is_nan());
        let mask = result.mask().unwrap();
        for col in 0..15 {
            assert_eq!(mask[[0, 0, col]], col >= 5, "west col {col}");
            assert_eq!(mask[[2, 0, col]], col < 5, "east col {col}");
        }
    }

    #[rstest]
    #[test]
    fn missing_files_fail_unless_skipped(table: RecordTable, backend: MemoryBackend) {
        let mut table = table;
        let mut records = table.records().to_vec();
        records.push(record("/data/VV_20200103_E000N000.tif", vec![("time", day(3).into())]));
        let _ = table.assign_records(records, crate::MutationMode::InPlace);
        let spatial = SpatialResolver::default();

        let strict = CubeConfig::default();
        let result = loader(&table, &backend, &spatial, &strict).load_by_pixels(
            &[0],
            &[0],
            1,
            1,
            "1",
            OutputFormat::Numpy,
            PixelOrigin::Ur,
        );
        assert!(matches!(
            result,
            Err(CubeError::Io { ref filepath, .. }) if filepath == "/data/VV_20200103_E000N000.tif"
        ));

        let lenient = CubeConfig {
            skip_missing: true,
            parallel_reads: true,
            ..CubeConfig::default()
        };
        let result = loader(&table, &backend, &spatial, &lenient)
            .load_by_pixels(&[0], &[0], 1, 1, "1", OutputFormat::Numpy, PixelOrigin::Ur)
            .unwrap()
            .into_dense()
            .unwrap();
        assert_eq!(result.data.shape(), [4, 1, 1]);
    }

    #[rstest]
    #[test]
    fn parallel_reads_keep_record_order(table: RecordTable, backend: MemoryBackend) {
        let spatial = SpatialResolver::default();
        let sequential = CubeConfig::default();
        let parallel = CubeConfig {
            parallel_reads: true,
            ..CubeConfig::default()
        };
        let load = |config: &CubeConfig| {
            loader(&table, &backend, &spatial, config)
                .load_by_pixels(&[3], &[4], 2, 2, "1", OutputFormat::Numpy, PixelOrigin::Ur)
                .unwrap()
        };
        assert_eq!(load(&sequential), load(&parallel));
    }
}
