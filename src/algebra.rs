//! Set operations between two record tables.
use log::info;

use crate::{
    components::{record::DataCubeRecord, schema::DimensionSchema, table::RecordTable, value::DimensionValue},
    errors::{CubeError, Result},
};

/// Records of `a` followed by those of `b` over the union of both schemas.
///
/// Dimensions a record lacks are null, duplicates are kept.
pub fn unite(a: &RecordTable, b: &RecordTable) -> Result<RecordTable> {
    let schema = a.schema().union(b.schema())?;
    let records = a
        .records()
        .iter()
        .chain(b.records())
        .map(|record| record.project(&schema))
        .collect();
    info!("united {} and {} records", a.len(), b.len());
    Ok(RecordTable::from_parts(schema.into(), records))
}

fn push_unique(kept: &mut Vec<DataCubeRecord>, record: DataCubeRecord, schema: &DimensionSchema) {
    if !kept.iter().any(|other| other.same_entry(&record, schema)) {
        kept.push(record);
    }
}

/// Records present in both tables over the dimensions they share.
///
/// Without `on_dimension` a record is kept when another table holds a record
/// with the same values along every shared dimension. With `on_dimension`
/// only that dimension's value has to occur in both tables.
/// Records of `a` come first, then those of `b`, repeated entries dropped.
pub fn intersect(a: &RecordTable, b: &RecordTable, on_dimension: Option<&str>) -> Result<RecordTable> {
    let common = a.schema().common(b.schema());
    let occurs_in = |record: &DataCubeRecord, other: &RecordTable| match on_dimension {
        Some(name) => other
            .records()
            .iter()
            .any(|candidate| candidate.get(name) == record.get(name)),
        None => other
            .records()
            .iter()
            .any(|candidate| candidate.same_values(record, &common)),
    };
    if let Some(name) = on_dimension {
        a.schema().require(name)?;
        b.schema().require(name)?;
    }

    let mut kept = Vec::new();
    for record in a.records().iter().filter(|&record| occurs_in(record, b)) {
        push_unique(&mut kept, record.project(&common), &common);
    }
    for record in b.records().iter().filter(|&record| occurs_in(record, a)) {
        push_unique(&mut kept, record.project(&common), &common);
    }
    info!(
        "intersected {} and {} records into {}",
        a.len(),
        b.len(),
        kept.len()
    );
    Ok(RecordTable::from_parts(common.into(), kept))
}

/// Records of `a` reordered, and repeated where needed, to follow the values of `b` along `name`.
///
/// The k-th occurrence of a value in `b` takes the (k mod n)-th of the n
/// records of `a` holding that value.
pub fn align_dimension(a: &RecordTable, b: &RecordTable, name: &str) -> Result<RecordTable> {
    a.schema().require(name)?;
    b.schema().require(name)?;
    let mut occurrences: Vec<(&DimensionValue, usize)> = Vec::new();
    let mut aligned = Vec::with_capacity(b.len());
    for target in b.records() {
        let value = target.get(name);
        let candidates: Vec<&DataCubeRecord> = a
            .records()
            .iter()
            .filter(|record| record.get(name) == value)
            .collect();
        if candidates.is_empty() {
            return Err(CubeError::Alignment {
                dimension: name.to_string(),
                value: value.to_string(),
            });
        }
        let seen = match occurrences.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => {
                *count += 1;
                *count - 1
            }
            None => {
                occurrences.push((value, 1));
                0
            }
        };
        aligned.push(candidates[seen % candidates.len()].clone());
    }
    info!("aligned {} records to {} along {name:?}", a.len(), b.len());
    Ok(RecordTable::from_parts(a.shared_schema(), aligned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        components::schema::DimensionType,
        fixtures::{day, pol_time_table, record, time_pol_schema},
    };
    use rstest::rstest;

    fn time_tile_table() -> RecordTable {
        let schema = DimensionSchema::new([
            ("time", DimensionType::Temporal),
            ("tile", DimensionType::Categorical),
        ])
        .unwrap();
        let records = vec![
            record("/data/b1.tif", vec![("time", day(1).into()), ("tile", "E000N000".into())]),
            record("/data/b3.tif", vec![("time", day(3).into()), ("tile", "E001N000".into())]),
        ];
        RecordTable::new(schema, records).unwrap()
    }

    #[rstest]
    fn unite_fills_nulls(pol_time_table: RecordTable) {
        let united = unite(&pol_time_table, &time_tile_table()).unwrap();
        assert_eq!(united.schema().names().collect::<Vec<_>>(), ["time", "pol", "tile"]);
        assert_eq!(united.len(), 6);
        assert!(united.records()[0].get("tile").is_null());
        assert!(united.records()[5].get("pol").is_null());
    }

    #[rstest]
    fn unite_keeps_duplicates(pol_time_table: RecordTable) {
        let united = unite(&pol_time_table, &pol_time_table).unwrap();
        assert_eq!(united.len(), 8);
    }

    #[rstest]
    fn intersects_on_common_dimensions(pol_time_table: RecordTable) {
        let intersection = intersect(&pol_time_table, &time_tile_table(), None).unwrap();
        assert_eq!(intersection.schema().names().collect::<Vec<_>>(), ["time"]);
        let paths: Vec<_> = intersection
            .filepaths()
            .iter()
            .map(|path| path.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            paths,
            [
                "/data/VV_20200101_E000N000.tif",
                "/data/VH_20200101_E000N000.tif",
                "/data/b1.tif"
            ]
        );
    }

    #[rstest]
    fn intersection_drops_repeated_entries(pol_time_table: RecordTable) {
        let intersection = intersect(&pol_time_table, &pol_time_table, None).unwrap();
        assert_eq!(intersection.len(), 4);
        assert_eq!(intersection.schema(), &time_pol_schema());
    }

    #[rstest]
    fn intersects_on_dimension(pol_time_table: RecordTable) {
        let intersection = intersect(&pol_time_table, &time_tile_table(), Some("time")).unwrap();
        assert_eq!(intersection.len(), 3);
        let missing = intersect(&pol_time_table, &time_tile_table(), Some("pol"));
        assert!(matches!(missing, Err(CubeError::UnknownDimension(name)) if name == "pol"));
    }

    #[rstest]
    fn aligns_to_other_order(pol_time_table: RecordTable) {
        let target = RecordTable::new(
            time_pol_schema(),
            vec![
                record("/x/1.tif", vec![("time", day(2).into())]),
                record("/x/2.tif", vec![("time", day(1).into())]),
                record("/x/3.tif", vec![("time", day(2).into())]),
                record("/x/4.tif", vec![("time", day(2).into())]),
                record("/x/5.tif", vec![("time", day(1).into())]),
            ],
        )
        .unwrap();
        let aligned = align_dimension(&pol_time_table, &target, "time").unwrap();
        assert_eq!(aligned.len(), target.len());
        assert_eq!(aligned.values("time").unwrap(), target.values("time").unwrap());
        let pols: Vec<_> = aligned.values("pol").unwrap().into_iter().cloned().collect();
        assert_eq!(
            pols,
            ["VV", "VV", "VH", "VV", "VH"].map(DimensionValue::from)
        );
    }

    #[rstest]
    fn alignment_needs_every_value(pol_time_table: RecordTable) {
        let result = align_dimension(&pol_time_table, &time_tile_table(), "time");
        assert!(matches!(result, Err(CubeError::Alignment { .. })));
    }
}
