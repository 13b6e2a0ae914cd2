use super::*;

fn sample() -> Table {
    let mut table = Table::new();
    table.push("RA", vec![10.0f64, 20.0, 30.0]).unwrap();
    table.push("FLUX_R", vec![1.0f32, 2.0, 3.0]).unwrap();
    table.push("NAME", vec!["a".to_string(), "b".to_string(), "c".to_string()]).unwrap();
    table
        .push(
            "DCHISQ",
            Column::Float32List {
                width: 2,
                values: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            },
        )
        .unwrap();
    table
}

#[test]
fn test_push_and_typed_access() {
    let table = sample();
    assert_eq!(table.len(), 3);
    assert_eq!(table.num_columns(), 4);
    assert_eq!(table.f64("RA").unwrap(), &[10.0, 20.0, 30.0]);
    assert_eq!(table.f32("FLUX_R").unwrap()[2], 3.0);
    assert_eq!(table.list("DCHISQ").unwrap().0, 2);
}

#[test]
fn test_type_mismatch() {
    let table = sample();
    let err = table.f32("RA").unwrap_err();
    assert!(matches!(err, TableError::TypeMismatch { .. }));
    assert!(matches!(table.f64("MISSING"), Err(TableError::ColumnNotFound(_))));
}

#[test]
fn test_length_mismatch() {
    let mut table = sample();
    let err = table.push("DEC", vec![1.0f64]).unwrap_err();
    assert!(matches!(err, TableError::LengthMismatch { expected: 3, found: 1, .. }));
}

#[test]
fn test_assign_casts_numeric() {
    let mut table = sample();
    table.assign("FLUX_R", &Column::Float64(vec![5.0, 6.0, 7.0])).unwrap();
    assert_eq!(table.f32("FLUX_R").unwrap(), &[5.0, 6.0, 7.0]);
    let err = table
        .assign("FLUX_R", &Column::Utf8(vec![String::new(); 3]))
        .unwrap_err();
    assert!(matches!(err, TableError::TypeMismatch { .. }));
}

#[test]
fn test_gather_with_duplicates() {
    let table = sample();
    let picked = table.gather(&[2, 0, 2]);
    assert_eq!(picked.len(), 3);
    assert_eq!(picked.f64("RA").unwrap(), &[30.0, 10.0, 30.0]);
    assert_eq!(picked.list("DCHISQ").unwrap().1, &[4.0, 5.0, 0.0, 1.0, 4.0, 5.0]);
}

#[test]
fn test_scatter_reconstructs_partitions() {
    let table = sample();
    let south = [0usize, 2];
    let north = [1usize];
    let mut out = Table::with_rows(3);
    out.push("RA", vec![0.0f64; 3]).unwrap();
    out.push("NAME", vec![String::new(); 3]).unwrap();
    out.scatter(&south, &table.gather(&south)).unwrap();
    out.scatter(&north, &table.gather(&north)).unwrap();
    assert_eq!(out.f64("RA").unwrap(), table.f64("RA").unwrap());
    assert_eq!(out.utf8("NAME").unwrap(), table.utf8("NAME").unwrap());

    // empty partition is a no-op
    out.scatter(&[], &table.gather(&[])).unwrap();
    assert_eq!(out.f64("RA").unwrap(), &[10.0, 20.0, 30.0]);
}

#[test]
fn test_concat() {
    let mut a = sample();
    let b = sample();
    a.concat(&b).unwrap();
    assert_eq!(a.len(), 6);
    assert_eq!(a.f64("RA").unwrap()[3], 10.0);
    assert_eq!(a.list("DCHISQ").unwrap().1.len(), 12);

    let mut empty = Table::new();
    empty.concat(&b).unwrap();
    assert_eq!(empty.len(), 3);
}

#[test]
fn test_fill() {
    let mut table = sample();
    table.fill("FLUX_R", 9.0).unwrap();
    assert_eq!(table.f32("FLUX_R").unwrap(), &[9.0, 9.0, 9.0]);
    table.fill_str("NAME", "PSF").unwrap();
    assert!(table.utf8("NAME").unwrap().iter().all(|s| s == "PSF"));
}

#[test]
fn test_record_batch_conversion() {
    let table = sample();
    let batch = table.to_record_batch().unwrap();
    assert_eq!(batch.num_rows(), 3);
    assert_eq!(batch.num_columns(), 4);
    let back = Table::from_record_batch(&batch).unwrap();
    assert_eq!(back, table);
}

#[test]
fn test_from_record_batch_widens_and_nulls() {
    use arrow::array::{Int8Array, UInt32Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    let schema = Arc::new(Schema::new(vec![
        Field::new("A", DataType::Float32, true),
        Field::new("B", DataType::Int8, false),
        Field::new("C", DataType::UInt32, false),
    ]));
    let batch = arrow::record_batch::RecordBatch::try_new(
        schema,
        vec![
            Arc::new(arrow::array::Float32Array::from(vec![Some(1.0), None])),
            Arc::new(Int8Array::from(vec![1i8, -2])),
            Arc::new(UInt32Array::from(vec![7u32, 8])),
        ],
    )
    .unwrap();
    let table = Table::from_record_batch(&batch).unwrap();
    assert!(table.f32("A").unwrap()[1].is_nan());
    assert_eq!(table.i64("B").unwrap(), &[1, -2]);
    assert_eq!(table.i64("C").unwrap(), &[7, 8]);
}

#[test]
fn test_filter_and_remove() {
    let mut table = sample();
    let kept = table.filter(&[true, false, true]);
    assert_eq!(kept.f64("RA").unwrap(), &[10.0, 30.0]);
    assert!(table.remove("NAME").is_some());
    assert!(!table.contains("NAME"));
}
