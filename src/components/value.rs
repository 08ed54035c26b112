use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use geo::{Area, BoundingRect, Polygon};
use std::{cmp::Ordering, fmt};

use crate::components::schema::DimensionType;

/// Value of a single dimension of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionValue {
    Temporal(NaiveDateTime),
    Categorical(String),
    Numeric(f64),
    Geometric(Polygon<f64>),
    /// Placeholder for dimensions a record does not define, e.g. after a union.
    Null,
}

impl DimensionValue {
    pub fn kind(&self) -> Option<DimensionType> {
        match self {
            DimensionValue::Temporal(_) => Some(DimensionType::Temporal),
            DimensionValue::Categorical(_) => Some(DimensionType::Categorical),
            DimensionValue::Numeric(_) => Some(DimensionType::Numeric),
            DimensionValue::Geometric(_) => Some(DimensionType::Geometric),
            DimensionValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DimensionValue::Null)
    }

    pub fn as_temporal(&self) -> Option<&NaiveDateTime> {
        match self {
            DimensionValue::Temporal(timestamp) => Some(timestamp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DimensionValue::Categorical(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DimensionValue::Numeric(value) => Some(*value),
            _ => None,
        }
    }

    /// Calendar (year, month) of a temporal value.
    pub fn year_month(&self) -> Option<(i32, u32)> {
        self.as_temporal()
            .map(|timestamp| (timestamp.year(), timestamp.month()))
    }

    fn rank(&self) -> u8 {
        match self {
            DimensionValue::Temporal(_) => 0,
            DimensionValue::Categorical(_) => 1,
            DimensionValue::Numeric(_) => 2,
            DimensionValue::Geometric(_) => 3,
            DimensionValue::Null => 4,
        }
    }

    /// Total order used for sorting.
    ///
    /// Values of the same kind follow their natural order, geometries by the
    /// lower left corner of their bounding box and then by area.
    /// Different kinds are ordered by kind, [DimensionValue::Null] last.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.comparable_cmp(other)
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }

    /// Ordering between two non null values of the same kind.
    pub fn comparable_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (DimensionValue::Temporal(lhs), DimensionValue::Temporal(rhs)) => Some(lhs.cmp(rhs)),
            (DimensionValue::Categorical(lhs), DimensionValue::Categorical(rhs)) => {
                Some(lhs.cmp(rhs))
            }
            (DimensionValue::Numeric(lhs), DimensionValue::Numeric(rhs)) => Some(lhs.total_cmp(rhs)),
            (DimensionValue::Geometric(lhs), DimensionValue::Geometric(rhs)) => {
                Some(cmp_polygons(lhs, rhs))
            }
            _ => None,
        }
    }
}

fn cmp_polygons(lhs: &Polygon<f64>, rhs: &Polygon<f64>) -> Ordering {
    let corner = |polygon: &Polygon<f64>| {
        polygon
            .bounding_rect()
            .map(|rect| rect.min().x_y())
            .unwrap_or((f64::NAN, f64::NAN))
    };
    let (lhs_x, lhs_y) = corner(lhs);
    let (rhs_x, rhs_y) = corner(rhs);
    lhs_x
        .total_cmp(&rhs_x)
        .then(lhs_y.total_cmp(&rhs_y))
        .then(lhs.unsigned_area().total_cmp(&rhs.unsigned_area()))
}

impl fmt::Display for DimensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionValue::Temporal(timestamp) => {
                write!(f, "{}", timestamp.format("%Y-%m-%dT%H:%M:%S"))
            }
            DimensionValue::Categorical(value) => write!(f, "{value}"),
            DimensionValue::Numeric(value) => write!(f, "{value}"),
            DimensionValue::Geometric(polygon) => {
                write!(f, "POLYGON({} vertices)", polygon.exterior().0.len())
            }
            DimensionValue::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for DimensionValue {
    fn from(value: &str) -> Self {
        DimensionValue::Categorical(value.to_string())
    }
}

impl From<String> for DimensionValue {
    fn from(value: String) -> Self {
        DimensionValue::Categorical(value)
    }
}

impl From<f64> for DimensionValue {
    fn from(value: f64) -> Self {
        DimensionValue::Numeric(value)
    }
}

impl From<i64> for DimensionValue {
    fn from(value: i64) -> Self {
        DimensionValue::Numeric(value as f64)
    }
}

impl From<NaiveDateTime> for DimensionValue {
    fn from(value: NaiveDateTime) -> Self {
        DimensionValue::Temporal(value)
    }
}

impl From<NaiveDate> for DimensionValue {
    fn from(value: NaiveDate) -> Self {
        DimensionValue::Temporal(value.and_time(NaiveTime::MIN))
    }
}

impl From<Polygon<f64>> for DimensionValue {
    fn from(value: Polygon<f64>) -> Self {
        DimensionValue::Geometric(value)
    }
}

impl<T: Into<DimensionValue>> From<Option<T>> for DimensionValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DimensionValue::Null, Into::into)
    }
}
