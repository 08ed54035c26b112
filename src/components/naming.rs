use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{
    components::{
        record::Dimensions,
        schema::{DimensionSchema, DimensionType},
        value::DimensionValue,
    },
    errors::Result,
};

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("file name is missing or not valid unicode")]
    FileName,
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("field {field:?} can not be read as {kind:?} from {value:?}")]
    Value {
        field: String,
        value: String,
        kind: DimensionType,
    },
    #[error("{0}")]
    Other(String),
}

/// Extracts dimension values from a file path.
pub trait NamingConvention: Send + Sync {
    fn parse(&self, path: &Path) -> std::result::Result<Dimensions, ParseError>;
}

impl<F> NamingConvention for F
where
    F: Fn(&Path) -> std::result::Result<Dimensions, ParseError> + Send + Sync,
{
    fn parse(&self, path: &Path) -> std::result::Result<Dimensions, ParseError> {
        self(path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    Categorical,
    Numeric,
    /// chrono format string, date only formats are read as midnight.
    Temporal { format: String },
    /// Field present in the name but not a dimension.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamingField {
    #[serde(default)]
    name: String,
    #[serde(flatten)]
    kind: FieldKind,
}

/// File stems made of delimiter separated fields, e.g. `VV_20200101_E042N012T6`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelimitedNaming {
    delimiter: char,
    fields: Vec<NamingField>,
}

impl Default for DelimitedNaming {
    fn default() -> Self {
        Self::new('_')
    }
}

impl DelimitedNaming {
    pub fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            fields: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(NamingField {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn categorical(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Categorical)
    }

    pub fn numeric(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Numeric)
    }

    pub fn temporal(self, name: impl Into<String>, format: impl Into<String>) -> Self {
        self.field(
            name,
            FieldKind::Temporal {
                format: format.into(),
            },
        )
    }

    pub fn skip(self) -> Self {
        self.field(String::new(), FieldKind::Skip)
    }

    /// Dimensions this convention produces, in field order.
    pub fn schema(&self) -> Result<DimensionSchema> {
        DimensionSchema::new(self.fields.iter().filter_map(|field| {
            let dimension_type = match field.kind {
                FieldKind::Categorical => DimensionType::Categorical,
                FieldKind::Numeric => DimensionType::Numeric,
                FieldKind::Temporal { .. } => DimensionType::Temporal,
                FieldKind::Skip => return None,
            };
            Some((field.name.clone(), dimension_type))
        }))
    }
}

fn parse_field(field: &NamingField, raw: &str) -> std::result::Result<DimensionValue, ParseError> {
    let invalid = |kind| ParseError::Value {
        field: field.name.clone(),
        value: raw.to_string(),
        kind,
    };
    match &field.kind {
        FieldKind::Categorical => Ok(raw.into()),
        FieldKind::Numeric => raw
            .parse::<f64>()
            .map(DimensionValue::from)
            .map_err(|_| invalid(DimensionType::Numeric)),
        FieldKind::Temporal { format } => NaiveDateTime::parse_from_str(raw, format)
            .map(DimensionValue::from)
            .or_else(|_| NaiveDate::parse_from_str(raw, format).map(DimensionValue::from))
            .map_err(|_| invalid(DimensionType::Temporal)),
        FieldKind::Skip => Ok(DimensionValue::Null),
    }
}

impl NamingConvention for DelimitedNaming {
    fn parse(&self, path: &Path) -> std::result::Result<Dimensions, ParseError> {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or(ParseError::FileName)?;
        let raw_fields: Vec<&str> = stem.split(self.delimiter).collect();
        if raw_fields.len() != self.fields.len() {
            return Err(ParseError::FieldCount {
                expected: self.fields.len(),
                found: raw_fields.len(),
            });
        }
        self.fields
            .iter()
            .zip(raw_fields)
            .filter(|(field, _)| field.kind != FieldKind::Skip)
            .map(|(field, raw)| parse_field(field, raw).map(|value| (field.name.clone(), value)))
            .collect()
    }
}
