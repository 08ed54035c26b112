use itertools::Itertools;
use log::info;
use regex::Regex;
use std::{collections::BTreeSet, path::Path, sync::Arc};

use crate::{
    components::{
        filter::{FilterCondition, FilterExpression, FilterValue},
        record::{DataCubeRecord, Metadata},
        schema::{DimensionSchema, DimensionType},
        value::DimensionValue,
    },
    errors::{CubeError, Result},
    indexes::Indexes,
};

/// Whether an operation alters its receiver or derives a new instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationMode {
    InPlace,
    #[default]
    Copy,
}

/// Outcome of an operation run with a [MutationMode].
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Derivation<T> {
    /// The receiver was altered.
    Mutated,
    Derived(T),
}

impl<T> Derivation<T> {
    pub fn into_derived(self) -> Option<T> {
        match self {
            Derivation::Mutated => None,
            Derivation::Derived(derived) => Some(derived),
        }
    }

    pub fn is_mutated(&self) -> bool {
        matches!(self, Derivation::Mutated)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Derivation<U> {
        match self {
            Derivation::Mutated => Derivation::Mutated,
            Derivation::Derived(derived) => Derivation::Derived(f(derived)),
        }
    }
}

/// Ordered records sharing one [DimensionSchema].
///
/// Every record holds a value for every dimension of the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    schema: Arc<DimensionSchema>,
    records: Vec<DataCubeRecord>,
}

impl RecordTable {
    /// Fails if a record defines a dimension outside `schema` or a value of the wrong type.
    ///
    /// Dimensions of `schema` a record lacks are set to null.
    pub fn new(schema: DimensionSchema, records: Vec<DataCubeRecord>) -> Result<Self> {
        let schema = Arc::new(schema);
        let records = records
            .into_iter()
            .map(|record| -> Result<DataCubeRecord> {
                for (name, value) in record.dims() {
                    schema.check(name, value)?;
                }
                Ok(record.project(&schema))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { schema, records })
    }

    pub fn empty(schema: DimensionSchema) -> Self {
        Self {
            schema: Arc::new(schema),
            records: Vec::new(),
        }
    }

    /// Records must already be projected onto `schema`.
    pub(crate) fn from_parts(schema: Arc<DimensionSchema>, records: Vec<DataCubeRecord>) -> Self {
        Self { schema, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn schema(&self) -> &DimensionSchema {
        &self.schema
    }

    pub(crate) fn shared_schema(&self) -> Arc<DimensionSchema> {
        Arc::clone(&self.schema)
    }

    pub fn records(&self) -> &[DataCubeRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<DataCubeRecord> {
        self.records
    }

    pub fn filepaths(&self) -> Vec<&Path> {
        self.records.iter().map(DataCubeRecord::filepath).collect()
    }

    /// Values of dimension `name`, one per record.
    pub fn values(&self, name: &str) -> Result<Vec<&DimensionValue>> {
        self.schema.require(name)?;
        Ok(self.records.iter().map(|record| record.get(name)).collect())
    }

    /// Distinct values of dimension `name` in ascending order.
    pub fn unique_values(&self, name: &str) -> Result<Vec<DimensionValue>> {
        let mut values: Vec<DimensionValue> = self.values(name)?.into_iter().cloned().collect();
        values.sort_by(DimensionValue::total_cmp);
        values.dedup();
        Ok(values)
    }

    fn assign(
        &mut self,
        schema: Arc<DimensionSchema>,
        records: Vec<DataCubeRecord>,
        mode: MutationMode,
    ) -> Derivation<Self> {
        match mode {
            MutationMode::InPlace => {
                self.schema = schema;
                self.records = records;
                Derivation::Mutated
            }
            MutationMode::Copy => Derivation::Derived(Self { schema, records }),
        }
    }

    /// Replace the records, keeping the schema.
    pub(crate) fn assign_records(
        &mut self,
        records: Vec<DataCubeRecord>,
        mode: MutationMode,
    ) -> Derivation<Self> {
        self.assign(self.shared_schema(), records, mode)
    }

    /// Keep the records `keep` holds for.
    pub(crate) fn retain(
        &mut self,
        keep: impl Fn(&DataCubeRecord) -> bool,
        mode: MutationMode,
    ) -> Derivation<Self> {
        let kept = self.records.iter().filter(|record| keep(record)).cloned().collect();
        self.assign_records(kept, mode)
    }

    /// Rename dimensions from the first to the second name of each pair.
    pub fn rename_dimension<I, K, V>(&mut self, mapping: I, mode: MutationMode) -> Result<Derivation<Self>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mapping: Vec<(String, String)> = mapping
            .into_iter()
            .map(|(old, new)| (old.into(), new.into()))
            .collect();
        let mut schema = self.shared_schema();
        Arc::make_mut(&mut schema).rename(&mapping)?;
        let records = self
            .records
            .iter()
            .cloned()
            .update(|record| record.rename(&mapping))
            .collect();
        info!("renamed dimensions {mapping:?}");
        Ok(self.assign(schema, records, mode))
    }

    /// Add dimension `name` holding one value per record, in record order.
    pub fn add_dimension(
        &mut self,
        name: impl Into<String>,
        dimension_type: DimensionType,
        values: Vec<DimensionValue>,
        mode: MutationMode,
    ) -> Result<Derivation<Self>> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(CubeError::length_mismatch(
                format!("values of dimension {name:?}"),
                self.len(),
                values.len(),
            ));
        }
        let mut schema = self.shared_schema();
        Arc::make_mut(&mut schema).push(name.clone(), dimension_type)?;
        for value in &values {
            schema.check(&name, value)?;
        }
        let records = self
            .records
            .iter()
            .cloned()
            .zip(values)
            .map(|(mut record, value)| {
                record.insert(name.clone(), value);
                record
            })
            .collect();
        info!("added {dimension_type:?} dimension {name:?}");
        Ok(self.assign(schema, records, mode))
    }

    /// Stable sort along dimension `name`, nulls last when ascending.
    pub fn sort_by_dimension(
        &mut self,
        name: &str,
        ascending: bool,
        mode: MutationMode,
    ) -> Result<Derivation<Self>> {
        self.schema.require(name)?;
        let mut records = self.records.clone();
        if ascending {
            records.sort_by(|lhs, rhs| lhs.get(name).total_cmp(rhs.get(name)));
        } else {
            records.sort_by(|lhs, rhs| rhs.get(name).total_cmp(lhs.get(name)));
        }
        Ok(self.assign_records(records, mode))
    }

    fn conditions(
        &self,
        values: Vec<FilterValue>,
        expressions: Option<Vec<FilterExpression>>,
        name: &str,
    ) -> Result<Vec<FilterCondition>> {
        self.schema.require(name)?;
        let conditions = FilterCondition::zip(values, expressions)?;
        for reference in conditions.iter().flat_map(FilterCondition::references) {
            self.schema.check(name, reference)?;
        }
        Ok(conditions)
    }

    /// Keep records for which any of the conditions built from `values` and `expressions` holds.
    ///
    /// Without `expressions` single values are tested for equality and
    /// pairs as closed intervals.
    pub fn filter_by_dimension(
        &mut self,
        values: Vec<FilterValue>,
        expressions: Option<Vec<FilterExpression>>,
        name: &str,
        mode: MutationMode,
    ) -> Result<Derivation<Self>> {
        let conditions = self.conditions(values, expressions, name)?;
        let total = self.len();
        let derivation = self.retain(
            |record| {
                let value = record.get(name);
                conditions.iter().any(|condition| condition.matches(value))
            },
            mode,
        );
        info!("filtered {total} records by dimension {name:?}");
        Ok(derivation)
    }

    /// Keep records whose metadata holds every pair of `metadata`.
    pub fn filter_by_metadata(&mut self, metadata: &Metadata, mode: MutationMode) -> Derivation<Self> {
        info!("filtering {} records by metadata {metadata:?}", self.len());
        self.retain(|record| record.matches_metadata(metadata), mode)
    }

    /// Keep records whose file name, or full path, matches `pattern` from its start.
    pub fn filter_files_with_pattern(
        &mut self,
        pattern: &str,
        full_path: bool,
        mode: MutationMode,
    ) -> Result<Derivation<Self>> {
        let pattern = Regex::new(pattern)?;
        let matches_start =
            |text: &str| pattern.find(text).is_some_and(|found| found.start() == 0);
        Ok(self.retain(
            |record| {
                if full_path {
                    matches_start(&record.filepath().to_string_lossy())
                } else {
                    record.file_name().is_some_and(matches_start)
                }
            },
            mode,
        ))
    }

    pub fn select(&mut self, indexes: impl Into<Indexes>, mode: MutationMode) -> Derivation<Self> {
        let records = indexes.into().select_from(&self.records);
        self.assign_records(records, mode)
    }

    fn split_by_conditions(&self, conditions: &[FilterCondition], name: &str) -> Vec<Self> {
        conditions
            .iter()
            .map(|condition| {
                let records = self
                    .records
                    .iter()
                    .filter(|record| condition.matches(record.get(name)))
                    .cloned()
                    .collect();
                Self::from_parts(self.shared_schema(), records)
            })
            .collect()
    }

    /// One table per condition, in the given order.
    pub fn split_by_dimension(
        &self,
        values: Vec<FilterValue>,
        expressions: Option<Vec<FilterExpression>>,
        name: &str,
    ) -> Result<Vec<Self>> {
        let conditions = self.conditions(values, expressions, name)?;
        let parts = self.split_by_conditions(&conditions, name);
        info!("split {} records into {} parts along {name:?}", self.len(), parts.len());
        Ok(parts)
    }

    fn require_temporal(&self, name: &str) -> Result<()> {
        match self.schema.require(name)? {
            DimensionType::Temporal => Ok(()),
            found => Err(CubeError::DimensionType {
                name: name.to_string(),
                expected: DimensionType::Temporal,
                found: format!("{found:?} dimension"),
            }),
        }
    }

    fn bucket<K: PartialEq>(&self, name: &str, key: K, key_of: impl Fn(i32, u32) -> K) -> Self {
        let records = self
            .records
            .iter()
            .filter(|record| {
                record
                    .get(name)
                    .year_month()
                    .is_some_and(|(year, month)| key_of(year, month) == key)
            })
            .cloned()
            .collect();
        Self::from_parts(self.shared_schema(), records)
    }

    fn calendar(&self, name: &str) -> BTreeSet<(i32, u32)> {
        self.records
            .iter()
            .filter_map(|record| record.get(name).year_month())
            .collect()
    }

    /// One table per calendar year of temporal dimension `name`.
    ///
    /// Years follow `years` when given, ascending otherwise. Years without
    /// records are omitted.
    pub fn split_yearly(&self, name: &str, years: Option<&[i32]>) -> Result<Vec<Self>> {
        self.require_temporal(name)?;
        let present: BTreeSet<i32> = self.calendar(name).into_iter().map(|(year, _)| year).collect();
        let years: Vec<i32> = match years {
            Some(years) => years
                .iter()
                .copied()
                .unique()
                .filter(|year| present.contains(year))
                .collect(),
            None => present.into_iter().collect(),
        };
        Ok(years
            .into_iter()
            .map(|year| self.bucket(name, year, |year, _| year))
            .collect())
    }

    /// One table per calendar month of temporal dimension `name`, years ascending.
    ///
    /// Within a year, months follow `months` when given, ascending otherwise.
    /// Months without records are omitted.
    pub fn split_monthly(&self, name: &str, months: Option<&[u32]>) -> Result<Vec<Self>> {
        self.require_temporal(name)?;
        let calendar = self.calendar(name);
        let keys: Vec<(i32, u32)> = match months {
            Some(months) => calendar
                .iter()
                .map(|(year, _)| *year)
                .unique()
                .flat_map(|year| months.iter().unique().map(move |month| (year, *month)))
                .filter(|key| calendar.contains(key))
                .collect(),
            None => calendar.into_iter().collect(),
        };
        Ok(keys
            .into_iter()
            .map(|key| self.bucket(name, key, |year, month| (year, month)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, day, pol_time_table, record, time_pol_schema};
    use crate::components::filter::Comparison;
    use rstest::rstest;

    fn times(table: &RecordTable) -> Vec<DimensionValue> {
        table.values("time").unwrap().into_iter().cloned().collect()
    }

    fn temporal_table(timestamps: &[chrono::NaiveDateTime]) -> RecordTable {
        let records = timestamps
            .iter()
            .enumerate()
            .map(|(index, timestamp)| {
                record(
                    &format!("/data/{index}.tif"),
                    vec![("time", (*timestamp).into()), ("pol", "VV".into())],
                )
            })
            .collect();
        RecordTable::new(time_pol_schema(), records).unwrap()
    }

    #[rstest]
    fn fills_missing_dimensions_with_null() {
        let table = RecordTable::new(
            time_pol_schema(),
            vec![record("/data/a.tif", vec![("pol", "VV".into())])],
        )
        .unwrap();
        assert!(table.records()[0].get("time").is_null());
        assert_eq!(table.records()[0].dims().len(), 2);
    }

    #[rstest]
    fn rejects_records_outside_schema() {
        let result = RecordTable::new(
            time_pol_schema(),
            vec![record("/data/a.tif", vec![("tile", "E000N000".into())])],
        );
        assert!(matches!(result, Err(CubeError::UnknownDimension(name)) if name == "tile"));
        let result = RecordTable::new(
            time_pol_schema(),
            vec![record("/data/a.tif", vec![("pol", 1.0.into())])],
        );
        assert!(matches!(result, Err(CubeError::DimensionType { .. })));
    }

    #[rstest]
    fn filters_by_polarisation(mut pol_time_table: RecordTable) {
        let filtered = pol_time_table
            .filter_by_dimension(vec!["VV".into()], None, "pol", MutationMode::Copy)
            .unwrap()
            .into_derived()
            .unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(times(&filtered), [DimensionValue::from(day(1)), day(2).into()]);
    }

    #[rstest]
    fn copy_mode_leaves_source_untouched(mut pol_time_table: RecordTable) {
        let source = pol_time_table.clone();
        let _ = pol_time_table
            .filter_by_dimension(vec!["VH".into()], None, "pol", MutationMode::Copy)
            .unwrap();
        let _ = pol_time_table
            .rename_dimension([("pol", "band")], MutationMode::Copy)
            .unwrap();
        let _ = pol_time_table
            .sort_by_dimension("time", false, MutationMode::Copy)
            .unwrap();
        assert_eq!(pol_time_table, source);
    }

    #[rstest]
    fn in_place_mode_mutates(mut pol_time_table: RecordTable) {
        let derivation = pol_time_table
            .filter_by_dimension(vec!["VH".into()], None, "pol", MutationMode::InPlace)
            .unwrap();
        assert!(derivation.is_mutated());
        assert_eq!(pol_time_table.len(), 2);
    }

    #[rstest]
    fn filtering_is_idempotent(mut pol_time_table: RecordTable) {
        let values = || vec![FilterValue::from(day(1))];
        let mut once = pol_time_table
            .filter_by_dimension(values(), None, "time", MutationMode::Copy)
            .unwrap()
            .into_derived()
            .unwrap();
        let twice = once
            .filter_by_dimension(values(), None, "time", MutationMode::Copy)
            .unwrap()
            .into_derived()
            .unwrap();
        assert_eq!(once, twice);
    }

    #[rstest]
    fn interval_filter_keeps_closed_range() {
        let mut table = temporal_table(&[
            date(2020, 1, 1),
            date(2020, 1, 2),
            date(2020, 1, 3),
            date(2020, 1, 4),
            date(2020, 1, 5),
        ]);
        let filtered = table
            .filter_by_dimension(
                vec![FilterValue::pair(date(2020, 1, 2), date(2020, 1, 4))],
                Some(vec![(Comparison::Ge, Comparison::Le).into()]),
                "time",
                MutationMode::Copy,
            )
            .unwrap()
            .into_derived()
            .unwrap();
        assert_eq!(
            times(&filtered),
            [
                DimensionValue::from(date(2020, 1, 2)),
                date(2020, 1, 3).into(),
                date(2020, 1, 4).into()
            ]
        );
    }

    #[rstest]
    fn any_condition_keeps_record(mut pol_time_table: RecordTable) {
        let filtered = pol_time_table
            .filter_by_dimension(
                vec![day(1).into(), day(2).into()],
                Some(vec![Comparison::Lt.into(), Comparison::Eq.into()]),
                "time",
                MutationMode::Copy,
            )
            .unwrap()
            .into_derived()
            .unwrap();
        assert_eq!(filtered.len(), 2);
    }

    #[rstest]
    fn filter_checks_dimension(mut pol_time_table: RecordTable) {
        let unknown =
            pol_time_table.filter_by_dimension(vec!["VV".into()], None, "band", MutationMode::Copy);
        assert!(matches!(unknown, Err(CubeError::UnknownDimension(_))));
        let mistyped =
            pol_time_table.filter_by_dimension(vec!["VV".into()], None, "time", MutationMode::Copy);
        assert!(matches!(mistyped, Err(CubeError::DimensionType { .. })));
    }

    #[rstest]
    fn splits_in_given_order(pol_time_table: RecordTable) {
        let parts = pol_time_table
            .split_by_dimension(vec!["VH".into(), "HH".into(), "VV".into()], None, "pol")
            .unwrap();
        assert_eq!(parts.iter().map(RecordTable::len).collect::<Vec<_>>(), [2, 0, 2]);
        assert_eq!(parts[0].values("pol").unwrap()[0], &DimensionValue::from("VH"));
    }

    #[rstest]
    fn split_then_unite_restores_records(pol_time_table: RecordTable) {
        let values = pol_time_table
            .unique_values("pol")
            .unwrap()
            .into_iter()
            .map(FilterValue::from)
            .collect();
        let parts = pol_time_table.split_by_dimension(values, None, "pol").unwrap();
        assert_eq!(parts.len(), 2);
        let united = parts[1..]
            .iter()
            .try_fold(parts[0].clone(), |united, part| crate::algebra::unite(&united, part))
            .unwrap();
        assert_eq!(united.schema(), pol_time_table.schema());
        assert_eq!(united.len(), pol_time_table.len());
        let mut restored = united.into_records();
        let mut original = pol_time_table.records().to_vec();
        let key = |record: &DataCubeRecord| record.filepath().to_path_buf();
        restored.sort_by_key(key);
        original.sort_by_key(key);
        assert_eq!(restored, original);
    }

    #[rstest]
    #[case(true, vec!["/data/VV_20200101_E000N000.tif", "/data/VH_20200101_E000N000.tif", "/data/VV_20200102_E000N000.tif", "/data/VH_20200102_E000N000.tif"])]
    #[case(false, vec!["/data/VV_20200102_E000N000.tif", "/data/VH_20200102_E000N000.tif", "/data/VV_20200101_E000N000.tif", "/data/VH_20200101_E000N000.tif"])]
    fn sorts_stably(mut pol_time_table: RecordTable, #[case] ascending: bool, #[case] expected: Vec<&str>) {
        let _ = pol_time_table
            .sort_by_dimension("time", ascending, MutationMode::InPlace)
            .unwrap();
        let paths: Vec<_> = pol_time_table
            .filepaths()
            .iter()
            .map(|path| path.to_string_lossy().to_string())
            .collect();
        assert_eq!(paths, expected);
    }

    #[rstest]
    fn renames_across_schema_and_records(mut pol_time_table: RecordTable) {
        let _ = pol_time_table
            .rename_dimension([("pol", "band")], MutationMode::InPlace)
            .unwrap();
        assert!(pol_time_table.schema().contains("band"));
        assert_eq!(pol_time_table.records()[0].get("band"), &DimensionValue::from("VV"));
        let unknown = pol_time_table.rename_dimension([("pol", "x")], MutationMode::Copy);
        assert!(matches!(unknown, Err(CubeError::UnknownDimension(_))));
    }

    #[rstest]
    fn adds_dimension(mut pol_time_table: RecordTable) {
        let orbits = vec![1.0.into(), 2.0.into(), DimensionValue::Null, 4.0.into()];
        let _ = pol_time_table
            .add_dimension("orbit", DimensionType::Numeric, orbits, MutationMode::InPlace)
            .unwrap();
        assert_eq!(pol_time_table.schema().dimension_type("orbit"), Some(DimensionType::Numeric));
        assert_eq!(pol_time_table.records()[3].get("orbit"), &DimensionValue::from(4.0));
    }

    #[rstest]
    #[case("orbit", vec![1.0.into()], "length")]
    #[case("pol", vec![1.0.into(), 2.0.into(), 3.0.into(), 4.0.into()], "duplicate")]
    #[case("orbit", vec!["a".into(), 2.0.into(), 3.0.into(), 4.0.into()], "type")]
    fn add_dimension_validates(
        mut pol_time_table: RecordTable,
        #[case] name: &str,
        #[case] values: Vec<DimensionValue>,
        #[case] failure: &str,
    ) {
        let result =
            pol_time_table.add_dimension(name, DimensionType::Numeric, values, MutationMode::Copy);
        match failure {
            "length" => assert!(matches!(result, Err(CubeError::LengthMismatch { .. }))),
            "duplicate" => assert!(matches!(result, Err(CubeError::DuplicateDimension(_)))),
            _ => assert!(matches!(result, Err(CubeError::DimensionType { .. }))),
        }
    }

    #[rstest]
    fn filters_metadata_with_and(mut pol_time_table: RecordTable) {
        let metadata = |direction: &str| {
            Metadata::from([
                ("direction".to_string(), direction.to_string()),
                ("sensor".to_string(), "S1A".to_string()),
            ])
        };
        let records = pol_time_table
            .records()
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, record)| match index {
                0 => record.with_metadata(metadata("D")),
                1 => record.with_metadata(metadata("A")),
                _ => record,
            })
            .collect();
        let _ = pol_time_table.assign_records(records, MutationMode::InPlace);
        let filtered = pol_time_table.filter_by_metadata(
            &Metadata::from([
                ("direction".to_string(), "D".to_string()),
                ("sensor".to_string(), "S1A".to_string()),
            ]),
            MutationMode::Copy,
        );
        assert_eq!(filtered.into_derived().unwrap().len(), 1);
    }

    #[rstest]
    #[case("VV_", false, 2)]
    #[case(".*E000N000", false, 4)]
    #[case("20200101", false, 0)]
    #[case("/data/VH", true, 2)]
    #[case("VH", true, 0)]
    fn filters_file_patterns(
        mut pol_time_table: RecordTable,
        #[case] pattern: &str,
        #[case] full_path: bool,
        #[case] expected: usize,
    ) {
        let filtered = pol_time_table
            .filter_files_with_pattern(pattern, full_path, MutationMode::Copy)
            .unwrap()
            .into_derived()
            .unwrap();
        assert_eq!(filtered.len(), expected);
    }

    #[rstest]
    fn invalid_pattern_fails(mut pol_time_table: RecordTable) {
        let result = pol_time_table.filter_files_with_pattern("(", false, MutationMode::Copy);
        assert!(matches!(result, Err(CubeError::InvalidPattern(_))));
    }

    #[rstest]
    fn selects_positions(mut pol_time_table: RecordTable) {
        let selected = pol_time_table
            .select(([0, 3], true), MutationMode::Copy)
            .into_derived()
            .unwrap();
        assert_eq!(
            selected.values("pol").unwrap(),
            [&DimensionValue::from("VV"), &DimensionValue::from("VH")]
        );
    }

    #[rstest]
    fn splits_yearly_and_monthly() {
        let table = temporal_table(&[
            date(2021, 3, 1),
            date(2020, 5, 2),
            date(2020, 1, 3),
            date(2021, 3, 9),
            date(2020, 5, 20),
        ]);
        let yearly = table.split_yearly("time", None).unwrap();
        assert_eq!(yearly.iter().map(RecordTable::len).collect::<Vec<_>>(), [3, 2]);

        let restricted = table.split_yearly("time", Some(&[2021, 2019, 2020])).unwrap();
        assert_eq!(restricted.iter().map(RecordTable::len).collect::<Vec<_>>(), [2, 3]);

        let monthly = table.split_monthly("time", None).unwrap();
        assert_eq!(monthly.iter().map(RecordTable::len).collect::<Vec<_>>(), [1, 2, 2]);
        assert_eq!(times(&monthly[0]), [DimensionValue::from(date(2020, 1, 3))]);

        let monthly = table.split_monthly("time", Some(&[5, 3])).unwrap();
        assert_eq!(monthly.iter().map(RecordTable::len).collect::<Vec<_>>(), [2, 2]);
        assert_eq!(
            times(&monthly[1]),
            [DimensionValue::from(date(2021, 3, 1)), date(2021, 3, 9).into()]
        );
    }

    #[rstest]
    fn calendar_splits_need_temporal_dimension(pol_time_table: RecordTable) {
        assert!(matches!(
            pol_time_table.split_yearly("pol", None),
            Err(CubeError::DimensionType { .. })
        ));
        assert!(matches!(
            pol_time_table.split_monthly("orbit", None),
            Err(CubeError::UnknownDimension(_))
        ));
    }
}
