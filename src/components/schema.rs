use serde::{Deserialize, Serialize};

use crate::{
    components::{record::Dimensions, value::DimensionValue},
    errors::{CubeError, Result},
};

/// Semantic type of a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionType {
    Temporal,
    Categorical,
    Numeric,
    Geometric,
}

/// Ordered set of dimension names and their [DimensionType]s.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DimensionSchema {
    dimensions: Vec<(String, DimensionType)>,
}

impl DimensionSchema {
    pub fn new<I, S>(dimensions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, DimensionType)>,
        S: Into<String>,
    {
        let mut schema = Self::default();
        for (name, dimension_type) in dimensions {
            schema.push(name.into(), dimension_type)?;
        }
        Ok(schema)
    }

    /// Schema with one dimension per parsed value, typed by that value.
    pub fn infer(dimensions: &Dimensions) -> Result<Self> {
        let mut schema = Self::default();
        for (name, value) in dimensions {
            let dimension_type = value.kind().ok_or_else(|| {
                CubeError::Construction(format!("can not infer the type of null dimension {name:?}"))
            })?;
            schema.push(name.clone(), dimension_type)?;
        }
        Ok(schema)
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DimensionType)> {
        self.dimensions
            .iter()
            .map(|(name, dimension_type)| (name.as_str(), *dimension_type))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dimension_type(name).is_some()
    }

    pub fn dimension_type(&self, name: &str) -> Option<DimensionType> {
        self.iter()
            .find(|(dimension, _)| *dimension == name)
            .map(|(_, dimension_type)| dimension_type)
    }

    /// Type of `name` or [CubeError::UnknownDimension].
    pub fn require(&self, name: &str) -> Result<DimensionType> {
        self.dimension_type(name)
            .ok_or_else(|| CubeError::UnknownDimension(name.to_string()))
    }

    /// Check that `value` may be stored in dimension `name`.
    pub fn check(&self, name: &str, value: &DimensionValue) -> Result<()> {
        let expected = self.require(name)?;
        match value.kind() {
            Some(found) if found != expected => Err(CubeError::DimensionType {
                name: name.to_string(),
                expected,
                found: format!("{found:?} value {value}"),
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn push(&mut self, name: String, dimension_type: DimensionType) -> Result<()> {
        if self.contains(&name) {
            return Err(CubeError::DuplicateDimension(name));
        }
        self.dimensions.push((name, dimension_type));
        Ok(())
    }

    /// Rename dimensions, `mapping` holds (old, new) pairs.
    pub(crate) fn rename(&mut self, mapping: &[(String, String)]) -> Result<()> {
        for (old, _) in mapping {
            self.require(old)?;
        }
        for (_, new) in mapping {
            let renamed_away = mapping.iter().any(|(old, _)| old == new);
            if self.contains(new) && !renamed_away {
                return Err(CubeError::DuplicateDimension(new.clone()));
            }
        }
        let mut renamed = Self::default();
        for (name, dimension_type) in &self.dimensions {
            let name = mapping
                .iter()
                .find(|(old, _)| old == name)
                .map_or(name, |(_, new)| new);
            renamed.push(name.clone(), *dimension_type)?;
        }
        *self = renamed;
        Ok(())
    }

    /// Names of `self` followed by the new names of `other`.
    pub fn union(&self, other: &Self) -> Result<Self> {
        let mut union = self.clone();
        for (name, dimension_type) in other.iter() {
            match union.dimension_type(name) {
                None => union.push(name.to_string(), dimension_type)?,
                Some(expected) if expected != dimension_type => {
                    return Err(CubeError::DimensionType {
                        name: name.to_string(),
                        expected,
                        found: format!("{dimension_type:?} dimension"),
                    })
                }
                Some(_) => (),
            }
        }
        Ok(union)
    }

    /// Names present in both schemas, in the order of `self`.
    pub fn common(&self, other: &Self) -> Self {
        Self {
            dimensions: self
                .dimensions
                .iter()
                .filter(|(name, _)| other.contains(name))
                .cloned()
                .collect(),
        }
    }
}
