mod algebra;
mod components;
mod config;
mod crs_geo;
mod datacube;
mod errors;
mod geometry;
mod indexes;
mod intersection;
mod loader;
mod output;
mod region;
mod spatial;

#[cfg(test)]
mod fixtures;

pub use algebra::{align_dimension, intersect, unite};
pub use components::{
    backends::{self, BackendError, RasterInfo, StorageBackend},
    bounds::PixelWindow,
    filter::{Comparison, FilterCondition, FilterExpression, FilterValue},
    naming::{self, DelimitedNaming, NamingConvention, ParseError},
    record::{DataCubeRecord, Dimensions, Metadata},
    schema::{DimensionSchema, DimensionType},
    table::{Derivation, MutationMode, RecordTable},
    transforms::{PixelOrigin, PixelTransform},
    value::DimensionValue,
};
pub use config::CubeConfig;
pub use crs_geo::CrsGeometry;
pub use datacube::DataCube;
pub use errors::{CubeError, Result};
pub use geometry::{BBox, GeometryInput, ToPolygon};
pub use indexes::Indexes;
pub use loader::Loader;
pub use output::{Coordinate, CubeArray, DenseArray, LabeledArray, LoadResult, OutputFormat};
pub use polars::prelude::DataFrame;
pub use region::RegionResolver;
pub use spatial::{Grid, SpatialResolver, TileGrid};

use geo::{Coord, CoordNum};
use num::{traits::AsPrimitive, NumCast};

trait CoordUtils<T: CoordNum> {
    /// Combine coordinates axis by axis.
    fn operate(&self, other: &Self, op: impl Fn(T, T) -> T) -> Self;
    fn map_each(&self, op: impl Fn(T) -> T) -> Self;
    fn try_cast<U: CoordNum>(&self) -> Result<Coord<U>>;
}

impl<T: CoordNum> CoordUtils<T> for Coord<T> {
    fn operate(&self, other: &Self, op: impl Fn(T, T) -> T) -> Self {
        Coord {
            x: op(self.x, other.x),
            y: op(self.y, other.y),
        }
    }

    fn map_each(&self, op: impl Fn(T) -> T) -> Self {
        Coord {
            x: op(self.x),
            y: op(self.y),
        }
    }

    fn try_cast<U: CoordNum>(&self) -> Result<Coord<U>> {
        match (<U as NumCast>::from(self.x), <U as NumCast>::from(self.y)) {
            (Some(x), Some(y)) => Ok(Coord { x, y }),
            _ => Err(CubeError::Uncastable),
        }
    }
}

fn tuple_to<TO: Copy + 'static, TI: AsPrimitive<TO>>(tuple: (TI, TI)) -> (TO, TO) {
    (tuple.0.as_(), tuple.1.as_())
}
