use ndarray::{ArrayD, IxDyn};
use polars::prelude::*;
use shrinkwraprs::Shrinkwrap;
use std::{fmt, str::FromStr};

use crate::{
    components::{schema::DimensionType, value::DimensionValue},
    errors::{CubeError, Result},
};

/// Labels along one or more axes of a [CubeArray].
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    name: String,
    dims: Vec<String>,
    values: ArrayD<DimensionValue>,
}

impl Coordinate {
    pub fn new(name: impl Into<String>, dims: Vec<String>, values: ArrayD<DimensionValue>) -> Result<Self> {
        let name = name.into();
        if dims.len() != values.ndim() {
            return Err(CubeError::length_mismatch(
                format!("axes of coordinate {name:?}"),
                values.ndim(),
                dims.len(),
            ));
        }
        Ok(Self { name, dims, values })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn values(&self) -> &ArrayD<DimensionValue> {
        &self.values
    }
}

/// Dense result of a load call with labeled axes and an optional mask.
///
/// The mask is `true` where a pixel lies outside the requested geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeArray {
    band: String,
    dims: Vec<String>,
    coords: Vec<Coordinate>,
    data: ArrayD<f64>,
    mask: Option<ArrayD<bool>>,
    mask_applied: bool,
}

impl CubeArray {
    /// Every coordinate must span axes of `dims` with matching lengths.
    pub fn new(
        band: impl Into<String>,
        dims: Vec<String>,
        coords: Vec<Coordinate>,
        data: ArrayD<f64>,
        mask: Option<ArrayD<bool>>,
        mask_applied: bool,
    ) -> Result<Self> {
        if dims.len() != data.ndim() {
            return Err(CubeError::length_mismatch("array axes", data.ndim(), dims.len()));
        }
        if let Some(mask) = &mask {
            if mask.shape() != data.shape() {
                return Err(CubeError::length_mismatch("mask size", data.len(), mask.len()));
            }
        }
        for coord in &coords {
            for (axis, dim) in coord.dims().iter().enumerate() {
                let position = dims
                    .iter()
                    .position(|name| name == dim)
                    .ok_or_else(|| CubeError::UnknownDimension(dim.clone()))?;
                let (expected, found) = (data.shape()[position], coord.values().shape()[axis]);
                if expected != found {
                    return Err(CubeError::length_mismatch(
                        format!("coordinate {:?} along {dim:?}", coord.name()),
                        expected,
                        found,
                    ));
                }
            }
        }
        Ok(Self {
            band: band.into(),
            dims,
            coords,
            data,
            mask,
            mask_applied,
        })
    }

    pub fn band(&self) -> &str {
        &self.band
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn coords(&self) -> &[Coordinate] {
        &self.coords
    }

    pub fn coord(&self, name: &str) -> Option<&Coordinate> {
        self.coords.iter().find(|coord| coord.name() == name)
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    pub fn mask(&self) -> Option<&ArrayD<bool>> {
        self.mask.as_ref()
    }

    pub fn mask_applied(&self) -> bool {
        self.mask_applied
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    fn is_masked(&self, index: &IxDyn) -> bool {
        self.mask_applied
            && self
                .mask
                .as_ref()
                .and_then(|mask| mask.get(index.clone()))
                .copied()
                .unwrap_or(false)
    }

    /// Value of `coord` at array position `index`.
    fn label(&self, coord: &Coordinate, index: &IxDyn) -> DimensionValue {
        let position: Vec<usize> = coord
            .dims()
            .iter()
            .filter_map(|dim| self.dims.iter().position(|name| name == dim))
            .map(|axis| index[axis])
            .collect();
        coord
            .values()
            .get(IxDyn(&position))
            .cloned()
            .unwrap_or(DimensionValue::Null)
    }

    /// One row per element in array order, coordinate columns followed by the band column.
    ///
    /// Masked elements hold null in the band column when the mask is applied.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut labels: Vec<Vec<DimensionValue>> = (0..self.coords.len())
            .map(|_| Vec::with_capacity(self.data.len()))
            .collect();
        let mut values = Vec::with_capacity(self.data.len());
        for (index, value) in self.data.indexed_iter() {
            for (column, coord) in labels.iter_mut().zip(&self.coords) {
                column.push(self.label(coord, &index));
            }
            values.push((!self.is_masked(&index)).then_some(*value));
        }
        let mut columns = self
            .coords
            .iter()
            .zip(&labels)
            .map(|(coord, column)| label_column(coord.name(), column))
            .collect::<PolarsResult<Vec<_>>>()?;
        columns.push(Series::new(self.band.as_str().into(), values).into_column());
        Ok(DataFrame::new(columns)?)
    }

    pub fn into_format(self, format: OutputFormat) -> Result<LoadResult> {
        Ok(match format {
            OutputFormat::Numpy => LoadResult::Dense(self.into()),
            OutputFormat::Xarray => LoadResult::Labeled(LabeledArray(self)),
            OutputFormat::Dataframe => LoadResult::Frame(self.to_frame()?),
        })
    }
}

/// Plain array with its mask.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseArray {
    pub data: ArrayD<f64>,
    pub mask: Option<ArrayD<bool>>,
    pub mask_applied: bool,
}

impl DenseArray {
    /// Data with masked pixels replaced by `fill` when the mask is applied.
    pub fn filled(&self, fill: f64) -> ArrayD<f64> {
        match (&self.mask, self.mask_applied) {
            (Some(mask), true) => {
                let mut filled = self.data.clone();
                filled.zip_mut_with(mask, |value, masked| {
                    if *masked {
                        *value = fill
                    }
                });
                filled
            }
            _ => self.data.clone(),
        }
    }
}

impl From<CubeArray> for DenseArray {
    fn from(value: CubeArray) -> Self {
        Self {
            data: value.data,
            mask: value.mask,
            mask_applied: value.mask_applied,
        }
    }
}

/// Array with named axes and coordinates, its data variable named after the band.
#[derive(Shrinkwrap, Debug, Clone, PartialEq)]
pub struct LabeledArray(CubeArray);

impl LabeledArray {
    pub fn name(&self) -> &str {
        self.0.band()
    }

    /// Position of `value` along the axis named `dim`.
    pub fn index_of(&self, dim: &str, value: &DimensionValue) -> Option<usize> {
        let coord = self
            .0
            .coords()
            .iter()
            .find(|coord| coord.dims() == [dim.to_string()] && coord.name() == dim)?;
        coord.values().iter().position(|label| label == value)
    }

    pub fn into_inner(self) -> CubeArray {
        self.0
    }
}

/// Polars column of `values`, typed after the first non-null label.
///
/// Temporal labels become millisecond datetimes, categorical and geometric labels strings.
fn label_column(name: &str, values: &[DimensionValue]) -> PolarsResult<Column> {
    let name = PlSmallStr::from(name);
    let series = match values.iter().find_map(DimensionValue::kind) {
        Some(DimensionType::Temporal) => {
            let millis: Vec<Option<i64>> = values
                .iter()
                .map(|value| value.as_temporal().map(|time| time.and_utc().timestamp_millis()))
                .collect();
            Series::new(name, millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        }
        Some(DimensionType::Numeric) => {
            let numbers: Vec<Option<f64>> = values.iter().map(DimensionValue::as_f64).collect();
            Series::new(name, numbers)
        }
        Some(_) => {
            let labels: Vec<Option<String>> = values
                .iter()
                .map(|value| (!value.is_null()).then(|| value.to_string()))
                .collect();
            Series::new(name, labels)
        }
        None => Series::new_null(name, values.len()),
    };
    Ok(series.into_column())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Numpy,
    #[default]
    Xarray,
    Dataframe,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Numpy => "numpy",
            OutputFormat::Xarray => "xarray",
            OutputFormat::Dataframe => "dataframe",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = CubeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "numpy" => Ok(OutputFormat::Numpy),
            "xarray" => Ok(OutputFormat::Xarray),
            "dataframe" => Ok(OutputFormat::Dataframe),
            _ => Err(CubeError::InvalidOutput(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadResult {
    Dense(DenseArray),
    Labeled(LabeledArray),
    Frame(DataFrame),
}

impl LoadResult {
    pub fn into_dense(self) -> Option<DenseArray> {
        match self {
            LoadResult::Dense(dense) => Some(dense),
            _ => None,
        }
    }

    pub fn into_labeled(self) -> Option<LabeledArray> {
        match self {
            LoadResult::Labeled(labeled) => Some(labeled),
            _ => None,
        }
    }

    pub fn into_frame(self) -> Option<DataFrame> {
        match self {
            LoadResult::Frame(frame) => Some(frame),
            _ => None,
        }
    }
}
