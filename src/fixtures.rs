//! Shared test fixtures.
use chrono::{NaiveDate, NaiveDateTime};
use ndarray::Array2;
use rstest::fixture;
use std::{path::Path, sync::Arc};

use crate::{
    components::{
        backends::memory::{MemoryBackend, MemoryRaster},
        naming::{DelimitedNaming, NamingConvention, ParseError},
        record::{DataCubeRecord, Dimensions},
        schema::{DimensionSchema, DimensionType},
        table::RecordTable,
        transforms::PixelTransform,
    },
    spatial::TileGrid,
};

pub const CRS: &str = "EPSG:3035";

pub fn day(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap()
}

pub fn record(filepath: &str, dims: Vec<(&str, crate::DimensionValue)>) -> DataCubeRecord {
    DataCubeRecord::new(
        filepath,
        dims.into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}

pub fn time_pol_schema() -> DimensionSchema {
    DimensionSchema::new([
        ("time", DimensionType::Temporal),
        ("pol", DimensionType::Categorical),
    ])
    .unwrap()
}

/// pol [VV, VV, VH, VH] x time [t1, t2, t1, t2]
#[fixture]
pub fn pol_time_table() -> RecordTable {
    let records = [("VV", 1), ("VV", 2), ("VH", 1), ("VH", 2)]
        .into_iter()
        .map(|(pol, time)| {
            record(
                &format!("/data/{pol}_202001{time:02}_E000N000.tif"),
                vec![("time", day(time).into()), ("pol", pol.into())],
            )
        })
        .collect();
    RecordTable::new(time_pol_schema(), records).unwrap()
}

/// `{pol}_{yyyymmdd}_{tile}` file stems.
pub fn naming() -> DelimitedNaming {
    DelimitedNaming::new('_')
        .categorical("pol")
        .temporal("time", "%Y%m%d")
        .categorical("tile")
}

/// Naming convention reading only the polarisation.
pub fn pol_naming() -> impl NamingConvention {
    |path: &Path| -> Result<Dimensions, ParseError> {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or(ParseError::FileName)?;
        let pol = stem.split('_').next().ok_or(ParseError::FileName)?;
        Ok(Dimensions::from([("pol".to_string(), pol.into())]))
    }
}

/// Two 100 x 100 tiles of 1 m pixels side by side, west to east.
#[fixture]
pub fn grid() -> Arc<TileGrid> {
    Arc::new(TileGrid::regular(
        CRS,
        geo::Rect::new((0., 0.), (200., 100.)),
        100.,
        |col, row| format!("E{col:03}N{row:03}"),
    ))
}

/// Raster whose pixel values are `offset + row * cols + col`.
pub fn ramp(origin: (f64, f64), shape: (usize, usize), offset: f64) -> MemoryRaster {
    MemoryRaster::new(PixelTransform::north_up(origin, 1., CRS)).with_band(
        "1",
        Array2::from_shape_fn(shape, |(row, col)| offset + (row * shape.1 + col) as f64),
    )
}

/// One ramp raster per file in `tiles` x `times`, named after [naming].
///
/// Tile `E000N000` spans x 0..100, `E001N000` x 100..200, both y 0..100.
#[fixture]
pub fn backend() -> MemoryBackend {
    let mut backend = MemoryBackend::default();
    for (tile_index, tile) in ["E000N000", "E001N000"].into_iter().enumerate() {
        for time in [1, 2] {
            let origin = (100. * tile_index as f64, 100.);
            let offset = 100_000. * tile_index as f64 + 10_000. * time as f64;
            backend.insert(
                format!("/data/VV_202001{time:02}_{tile}.tif"),
                ramp(origin, (100, 100), offset),
            );
        }
    }
    backend
}

pub fn backend_paths() -> Vec<String> {
    ["E000N000", "E001N000"]
        .into_iter()
        .flat_map(|tile| [1, 2].map(|time| format!("/data/VV_202001{time:02}_{tile}.tif")))
        .collect()
}
