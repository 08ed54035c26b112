use geo::Polygon;
use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

use crate::{
    components::{schema::DimensionSchema, value::DimensionValue},
    crs_geo::CrsGeometry,
};

/// Dimension values of a record keyed by dimension name.
pub type Dimensions = BTreeMap<String, DimensionValue>;
pub type Metadata = HashMap<String, String>;

static NULL: DimensionValue = DimensionValue::Null;

/// One file of a data cube.
#[derive(Debug, Clone, PartialEq)]
pub struct DataCubeRecord {
    filepath: PathBuf,
    dims: Dimensions,
    geom: Option<CrsGeometry<Polygon<f64>>>,
    metadata: Option<Metadata>,
}

impl DataCubeRecord {
    pub fn new(filepath: impl Into<PathBuf>, dims: Dimensions) -> Self {
        Self {
            filepath: filepath.into(),
            dims,
            geom: None,
            metadata: None,
        }
    }

    pub fn with_geom(mut self, geom: CrsGeometry<Polygon<f64>>) -> Self {
        self.geom = Some(geom);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    pub fn file_name(&self) -> Option<&str> {
        self.filepath.file_name().and_then(|name| name.to_str())
    }

    pub fn dims(&self) -> &Dimensions {
        &self.dims
    }

    /// Value of dimension `name`, [DimensionValue::Null] if undefined.
    pub fn get(&self, name: &str) -> &DimensionValue {
        self.dims.get(name).unwrap_or(&NULL)
    }

    pub fn geom(&self) -> Option<&CrsGeometry<Polygon<f64>>> {
        self.geom.as_ref()
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// True if every pair of `expected` is present in the record metadata.
    pub fn matches_metadata(&self, expected: &Metadata) -> bool {
        self.metadata.as_ref().is_some_and(|metadata| {
            expected
                .iter()
                .all(|(key, value)| metadata.get(key).is_some_and(|found| found == value))
        })
    }

    pub(crate) fn set_geom(&mut self, geom: CrsGeometry<Polygon<f64>>) {
        self.geom = Some(geom);
    }

    pub(crate) fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = Some(metadata);
    }

    pub(crate) fn insert(&mut self, name: String, value: DimensionValue) {
        self.dims.insert(name, value);
    }

    pub(crate) fn rename(&mut self, mapping: &[(String, String)]) {
        let taken: Vec<(String, DimensionValue)> = mapping
            .iter()
            .filter_map(|(old, new)| self.dims.remove(old).map(|value| (new.clone(), value)))
            .collect();
        self.dims.extend(taken);
    }

    /// Copy holding exactly the dimensions of `schema`, missing ones set to null.
    pub(crate) fn project(&self, schema: &DimensionSchema) -> Self {
        let dims = schema
            .names()
            .map(|name| (name.to_string(), self.get(name).clone()))
            .collect();
        Self {
            filepath: self.filepath.clone(),
            dims,
            geom: self.geom.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Same file and same values along the dimensions of `schema`.
    pub(crate) fn same_entry(&self, other: &Self, schema: &DimensionSchema) -> bool {
        self.filepath == other.filepath && self.same_values(other, schema)
    }

    pub(crate) fn same_values(&self, other: &Self, schema: &DimensionSchema) -> bool {
        schema.names().all(|name| self.get(name) == other.get(name))
    }
}
