use geo::{Coord, LineString, Polygon};
use ndarray::Array2;
use std::{fmt::Debug, path::Path};

use crate::{
    components::{bounds::PixelWindow, record::Metadata, transforms::PixelTransform},
    crs_geo::CrsGeometry,
    tuple_to,
};

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    Gdal(#[from] gdal::errors::GdalError),
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    #[error("file is not available")]
    Missing,
    #[error("band {0:?} does not exist")]
    UnknownBand(String),
    #[error("{0}")]
    Other(String),
}

/// Georeference of a raster file.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    size: (usize, usize),
    transform: PixelTransform,
    bands: Vec<String>,
}

impl RasterInfo {
    pub fn new(size: (usize, usize), transform: PixelTransform, bands: Vec<String>) -> Self {
        Self {
            size,
            transform,
            bands,
        }
    }

    /// (cols, rows)
    pub fn size(&self) -> (usize, usize) {
        self.size
    }

    pub fn transform(&self) -> &PixelTransform {
        &self.transform
    }

    pub fn crs(&self) -> &str {
        self.transform.crs()
    }

    pub fn bands(&self) -> &[String] {
        &self.bands
    }

    /// Outline of the raster in its own reference system.
    pub fn footprint(&self) -> CrsGeometry<Polygon<f64>> {
        let (cols, rows) = (self.size.0 as f64, self.size.1 as f64);
        let corners: Vec<Coord<f64>> = [(0., 0.), (cols, 0.), (cols, rows), (0., rows)]
            .into_iter()
            .map(|(col, row)| self.transform.to_world(col, row))
            .collect();
        CrsGeometry::new(
            self.transform.shared_crs(),
            Polygon::new(LineString::from(corners), vec![]),
        )
    }

    /// Position of `band`, either a 1-based index or a band name.
    pub fn band_index(&self, band: &str) -> BackendResult<usize> {
        if let Ok(index) = band.parse::<usize>() {
            if (1..=self.bands.len()).contains(&index) {
                return Ok(index - 1);
            }
        }
        self.bands
            .iter()
            .position(|name| name == band)
            .ok_or_else(|| BackendError::UnknownBand(band.to_string()))
    }
}

/// Source of raster windows and file metadata.
pub trait StorageBackend: Send + Sync + Debug {
    fn raster_info(&self, path: &Path) -> BackendResult<RasterInfo>;
    /// Pixels of `window` as a (rows, cols) array.
    fn read_window(&self, path: &Path, band: &str, window: &PixelWindow)
        -> BackendResult<Array2<f64>>;
    fn read_metadata(&self, path: &Path) -> BackendResult<Metadata>;
}

/// Implementations for gdal
pub mod gdal_backend {
    use super::*;
    use gdal::{Dataset as GdalDataset, Metadata as GdalMetadata, MetadataEntry as GdalMetadataEntry};

    fn filter_metadata_gdal(metadata: &impl GdalMetadata) -> Metadata {
        GdalMetadata::metadata(metadata)
            .filter_map(|GdalMetadataEntry { domain, key, value }| {
                if domain.eq("") {
                    Some((key, value))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Authority code of the dataset reference system, WKT as fallback.
    fn crs_gdal(dataset: &GdalDataset) -> String {
        dataset
            .spatial_ref()
            .and_then(|spatial_ref| spatial_ref.authority())
            .unwrap_or_else(|_| dataset.projection())
    }

    fn info_gdal(dataset: &GdalDataset) -> BackendResult<RasterInfo> {
        let transform = PixelTransform::from_gdal(dataset.geo_transform()?, crs_gdal(dataset));
        let bands = (1..=dataset.raster_count())
            .map(|index| -> BackendResult<String> {
                Ok(dataset.rasterband(index)?.description()?)
            })
            .collect::<BackendResult<Vec<_>>>()?;
        Ok(RasterInfo::new(dataset.raster_size(), transform, bands))
    }

    /// Reads files through GDAL, opening the dataset once per call.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct GdalBackend;

    impl StorageBackend for GdalBackend {
        fn raster_info(&self, path: &Path) -> BackendResult<RasterInfo> {
            info_gdal(&GdalDataset::open(path)?)
        }

        fn read_window(
            &self,
            path: &Path,
            band: &str,
            window: &PixelWindow,
        ) -> BackendResult<Array2<f64>> {
            let dataset = GdalDataset::open(path)?;
            let info = info_gdal(&dataset)?;
            let rasterband = dataset.rasterband(info.band_index(band)? + 1)?;
            let window_size = (window.cols(), window.rows());
            let buffer = rasterband.read_as::<f64>(
                tuple_to((window.col(), window.row())),
                window_size,
                window_size,
                None,
            )?;
            Ok(Array2::from_shape_vec(window.shape(), buffer.data().to_vec())?)
        }

        fn read_metadata(&self, path: &Path) -> BackendResult<Metadata> {
            let dataset = GdalDataset::open(path)?;
            Ok(filter_metadata_gdal(&dataset))
        }
    }
}

/// In memory rasters, for synthetic data and tests.
pub mod memory {
    use super::*;
    use ndarray::s;
    use std::{collections::HashMap, path::PathBuf};

    #[derive(Debug, Clone)]
    pub struct MemoryRaster {
        transform: PixelTransform,
        bands: Vec<(String, Array2<f64>)>,
        metadata: Metadata,
    }

    impl MemoryRaster {
        pub fn new(transform: PixelTransform) -> Self {
            Self {
                transform,
                bands: Vec::new(),
                metadata: Metadata::new(),
            }
        }

        /// Add a (rows, cols) band, all bands must share one shape.
        pub fn with_band(mut self, name: impl Into<String>, data: Array2<f64>) -> Self {
            self.bands.push((name.into(), data));
            self
        }

        pub fn with_metadata(mut self, metadata: Metadata) -> Self {
            self.metadata = metadata;
            self
        }

        fn info(&self) -> BackendResult<RasterInfo> {
            let (rows, cols) = self
                .bands
                .first()
                .map(|(_, data)| data.dim())
                .ok_or_else(|| BackendError::Other("raster has no bands".to_string()))?;
            if let Some((name, _)) = self.bands.iter().find(|(_, data)| data.dim() != (rows, cols)) {
                return Err(BackendError::Other(format!(
                    "band {name:?} differs in shape from the first band"
                )));
            }
            let bands = self.bands.iter().map(|(name, _)| name.clone()).collect();
            Ok(RasterInfo::new((cols, rows), self.transform.clone(), bands))
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct MemoryBackend {
        rasters: HashMap<PathBuf, MemoryRaster>,
    }

    impl MemoryBackend {
        pub fn with_raster(mut self, path: impl Into<PathBuf>, raster: MemoryRaster) -> Self {
            self.insert(path, raster);
            self
        }

        pub fn insert(&mut self, path: impl Into<PathBuf>, raster: MemoryRaster) {
            self.rasters.insert(path.into(), raster);
        }

        fn raster(&self, path: &Path) -> BackendResult<&MemoryRaster> {
            self.rasters.get(path).ok_or(BackendError::Missing)
        }
    }

    impl StorageBackend for MemoryBackend {
        fn raster_info(&self, path: &Path) -> BackendResult<RasterInfo> {
            self.raster(path)?.info()
        }

        fn read_window(
            &self,
            path: &Path,
            band: &str,
            window: &PixelWindow,
        ) -> BackendResult<Array2<f64>> {
            let raster = self.raster(path)?;
            let info = raster.info()?;
            if !window.fits(info.size()) {
                return Err(BackendError::Other(format!(
                    "window {window} exceeds raster of size {:?}",
                    info.size()
                )));
            }
            let (_, data) = &raster.bands[info.band_index(band)?];
            let rows = window.row()..window.row() + window.rows();
            let cols = window.col()..window.col() + window.cols();
            Ok(data.slice(s![rows, cols]).to_owned())
        }

        fn read_metadata(&self, path: &Path) -> BackendResult<Metadata> {
            Ok(self.raster(path)?.metadata.clone())
        }
    }
}
