use crate::components::{backends::BackendError, schema::DimensionType};

pub type Result<T> = std::result::Result<T, CubeError>;

#[derive(thiserror::Error, Debug)]
pub enum CubeError {
    #[error("could not build data cube: {0}")]
    Construction(String),
    #[error("dimension {0:?} does not exist")]
    UnknownDimension(String),
    #[error("dimension {0:?} already exists")]
    DuplicateDimension(String),
    #[error("{what}: expected length {expected}, got {found}")]
    LengthMismatch {
        what: String,
        expected: usize,
        found: usize,
    },
    #[error("dimension {name:?} is declared as {expected:?} but got {found}")]
    DimensionType {
        name: String,
        expected: DimensionType,
        found: String,
    },
    #[error("tile {0:?} is not part of the grid")]
    UnknownTile(String),
    #[error("no transformation known from {from:?} to {to:?}")]
    CoordinateSystemMismatch {
        from: String,
        to: String,
        #[source]
        source: Option<proj::ProjCreateError>,
    },
    #[error(transparent)]
    Projection(#[from] proj::ProjError),
    #[error("value {value} of dimension {dimension:?} has no counterpart to align with")]
    Alignment { dimension: String, value: String },
    #[error("({x}, {y}) lies outside of {target}")]
    OutOfBounds { x: f64, y: f64, target: String },
    #[error("window {window} exceeds raster of size {size:?} of {filepath}")]
    WindowOutOfBounds {
        filepath: String,
        window: String,
        size: (usize, usize),
    },
    #[error("could not read {filepath}")]
    Io {
        filepath: String,
        #[source]
        source: BackendError,
    },
    #[error("{0} requires a grid or record footprints")]
    MissingGrid(&'static str),
    #[error(transparent)]
    InvalidPattern(#[from] regex::Error),
    #[error("unknown pixel origin {0:?}, expected one of ul, ur, lr, ll, c")]
    InvalidOrigin(String),
    #[error("unknown output type {0:?}, expected one of numpy, xarray, dataframe")]
    InvalidOutput(String),
    #[error("There is no intersection between geometries")]
    NoIntersection,
    #[error("geotransform of {0} is not invertible")]
    NotInvertible(String),
    #[error("Value could not be cast")]
    Uncastable,
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    #[error(transparent)]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Frame(#[from] polars::prelude::PolarsError),
}

impl CubeError {
    pub(crate) fn io(filepath: impl AsRef<std::path::Path>, source: BackendError) -> Self {
        CubeError::Io {
            filepath: filepath.as_ref().display().to_string(),
            source,
        }
    }

    pub(crate) fn length_mismatch(what: impl Into<String>, expected: usize, found: usize) -> Self {
        CubeError::LengthMismatch {
            what: what.into(),
            expected,
            found,
        }
    }
}
