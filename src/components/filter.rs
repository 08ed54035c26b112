use chrono::{NaiveDate, NaiveDateTime};
use std::{cmp::Ordering, fmt, str::FromStr};

use crate::{
    components::value::DimensionValue,
    errors::{CubeError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Comparison {
    #[default]
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    /// `value <op> reference`.
    ///
    /// Null values and values of different kinds only satisfy [Comparison::Ne].
    pub fn evaluate(&self, value: &DimensionValue, reference: &DimensionValue) -> bool {
        match value.comparable_cmp(reference) {
            None => matches!(self, Comparison::Ne),
            Some(ordering) => match self {
                Comparison::Eq => ordering == Ordering::Equal,
                Comparison::Ne => ordering != Ordering::Equal,
                Comparison::Lt => ordering == Ordering::Less,
                Comparison::Le => ordering != Ordering::Greater,
                Comparison::Gt => ordering == Ordering::Greater,
                Comparison::Ge => ordering != Ordering::Less,
            },
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(thiserror::Error, Debug)]
#[error("unknown comparison {0:?}")]
pub struct UnknownComparison(String);

impl FromStr for Comparison {
    type Err = UnknownComparison;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "==" => Ok(Comparison::Eq),
            "!=" => Ok(Comparison::Ne),
            "<" => Ok(Comparison::Lt),
            "<=" => Ok(Comparison::Le),
            ">" => Ok(Comparison::Gt),
            ">=" => Ok(Comparison::Ge),
            other => Err(UnknownComparison(other.to_string())),
        }
    }
}

/// A value to filter on, or a pair of values bounding an interval.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Single(DimensionValue),
    Pair(DimensionValue, DimensionValue),
}

macro_rules! single_filter_value {
    ($($from:ty),*) => {
        $(impl From<$from> for FilterValue {
            fn from(value: $from) -> Self {
                FilterValue::Single(value.into())
            }
        })*
    };
}

single_filter_value!(DimensionValue, &str, String, f64, i64, NaiveDateTime, NaiveDate);

impl FilterValue {
    pub fn pair(lower: impl Into<DimensionValue>, upper: impl Into<DimensionValue>) -> Self {
        FilterValue::Pair(lower.into(), upper.into())
    }
}

/// Comparison(s) applied to the matching [FilterValue].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterExpression {
    Single(Comparison),
    Pair(Comparison, Comparison),
}

impl From<Comparison> for FilterExpression {
    fn from(value: Comparison) -> Self {
        FilterExpression::Single(value)
    }
}

impl From<(Comparison, Comparison)> for FilterExpression {
    fn from(value: (Comparison, Comparison)) -> Self {
        FilterExpression::Pair(value.0, value.1)
    }
}

impl FilterExpression {
    /// Closed interval `[lower, upper]`.
    pub const BETWEEN: FilterExpression = FilterExpression::Pair(Comparison::Ge, Comparison::Le);

    fn default_for(value: &FilterValue) -> Self {
        match value {
            FilterValue::Single(_) => FilterExpression::Single(Comparison::Eq),
            FilterValue::Pair(..) => FilterExpression::BETWEEN,
        }
    }
}

/// A single condition on a dimension value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    Compare(Comparison, DimensionValue),
    /// Both comparisons must hold.
    Interval((Comparison, DimensionValue), (Comparison, DimensionValue)),
}

impl FilterCondition {
    pub fn equal(value: impl Into<DimensionValue>) -> Self {
        FilterCondition::Compare(Comparison::Eq, value.into())
    }

    pub fn between(lower: impl Into<DimensionValue>, upper: impl Into<DimensionValue>) -> Self {
        FilterCondition::Interval(
            (Comparison::Ge, lower.into()),
            (Comparison::Le, upper.into()),
        )
    }

    /// Reference values the condition compares against.
    pub fn references(&self) -> Vec<&DimensionValue> {
        match self {
            FilterCondition::Compare(_, reference) => vec![reference],
            FilterCondition::Interval((_, lower), (_, upper)) => vec![lower, upper],
        }
    }

    pub fn matches(&self, value: &DimensionValue) -> bool {
        match self {
            FilterCondition::Compare(comparison, reference) => comparison.evaluate(value, reference),
            FilterCondition::Interval((lower_op, lower), (upper_op, upper)) => {
                lower_op.evaluate(value, lower) && upper_op.evaluate(value, upper)
            }
        }
    }

    /// Pair up `values` and `expressions`, one condition per value.
    ///
    /// Missing expressions default to `==` for single values and to the
    /// closed interval for pairs.
    pub fn zip(
        values: Vec<FilterValue>,
        expressions: Option<Vec<FilterExpression>>,
    ) -> Result<Vec<Self>> {
        let expressions = match expressions {
            Some(expressions) if expressions.len() != values.len() => {
                return Err(CubeError::length_mismatch(
                    "filter expressions",
                    values.len(),
                    expressions.len(),
                ))
            }
            Some(expressions) => expressions,
            None => values.iter().map(FilterExpression::default_for).collect(),
        };
        values
            .into_iter()
            .zip(expressions)
            .map(|(value, expression)| match (value, expression) {
                (FilterValue::Single(value), FilterExpression::Single(comparison)) => {
                    Ok(FilterCondition::Compare(comparison, value))
                }
                (FilterValue::Pair(lower, upper), FilterExpression::Pair(lower_op, upper_op)) => {
                    Ok(FilterCondition::Interval((lower_op, lower), (upper_op, upper)))
                }
                (FilterValue::Single(_), FilterExpression::Pair(..)) => {
                    Err(CubeError::length_mismatch("filter value of pair expression", 2, 1))
                }
                (FilterValue::Pair(..), FilterExpression::Single(_)) => {
                    Err(CubeError::length_mismatch("filter value of single expression", 1, 2))
                }
            })
            .collect()
    }
}
