use super::*;

#[test]
fn test_targets_defaults() {
    let targets = empty_targets_table(4);
    assert_eq!(targets.len(), 4);
    assert_eq!(targets.num_columns(), TARGETS_COLUMNS.len());
    assert_eq!(targets.i64("REF_ID").unwrap(), &[-1; 4]);
    assert_eq!(targets.f32("PARALLAX_IVAR").unwrap(), &[1.0; 4]);
    assert_eq!(targets.f32("PMDEC_IVAR").unwrap(), &[1.0; 4]);
    assert_eq!(targets.bool("GAIA_DUPLICATED_SOURCE").unwrap(), &[false; 4]);
    assert_eq!(targets.list("DCHISQ").unwrap().0, 5);
    assert_eq!(targets.names()[0], "RELEASE");
    assert_eq!(targets.names().last().map(String::as_str), Some("HPXPIXEL"));
    validate_targets(&targets).unwrap();
}

#[test]
fn test_truth_defaults() {
    let (truth, objtruth) = empty_truth_table(3, "ELG");
    assert_eq!(truth.i32("TEMPLATEID").unwrap(), &[-1; 3]);
    assert_eq!(truth.i64("SEED").unwrap(), &[-1; 3]);
    assert_eq!(objtruth.len(), 3);
    assert!(objtruth.contains("TRUEZ_NORSD"));
    assert!(objtruth.contains("OIIFLUX"));
    validate_truth(&truth).unwrap();
}

#[test]
fn test_objtruth_families() {
    let (_, sky) = empty_truth_table(5, "SKY");
    assert_eq!(sky.num_columns(), 0);
    assert!(sky.is_empty());

    let (_, star) = empty_truth_table(2, "STAR");
    assert_eq!(star.names(), &["TEFF", "LOGG", "FEH"]);
    assert!(!star.contains("TRUEZ_NORSD"));

    let (_, wd) = empty_truth_table(2, "WD");
    assert_eq!(wd.num_columns(), 2);

    let objmeta = empty_objmeta_table(2, "LRG");
    assert!(objmeta.contains("VDISP"));
    assert!(!objmeta.contains("TRUEZ_NORSD"));
}

#[test]
fn test_schema_units() {
    let schema = create_targets_schema();
    let field = schema.field_with_name("FLUX_R").unwrap();
    assert_eq!(field.metadata().get("unit").map(String::as_str), Some("nanomaggies"));
    assert_eq!(unit_of("RA"), Some("degree"));
    assert_eq!(unit_of("TYPE"), None);
    assert_eq!(create_truth_schema().fields().len(), TRUTH_COLUMNS.len());
}

#[test]
fn test_validation_errors() {
    let mut targets = empty_targets_table(1);
    targets.remove("PHOTSYS");
    assert!(matches!(
        validate_targets(&targets),
        Err(SchemaValidationError::MissingColumn(_))
    ));

    let mut targets = empty_targets_table(1);
    targets.push("RA", vec![0.0f32]).unwrap();
    assert!(matches!(
        validate_targets(&targets),
        Err(SchemaValidationError::TypeMismatch { .. })
    ));
}

#[test]
fn test_schema_matches_table_batch() {
    let targets = empty_targets_table(2);
    let batch = targets.to_record_batch().unwrap();
    let schema = create_targets_schema();
    for (a, b) in batch.schema().fields().iter().zip(schema.fields().iter()) {
        assert_eq!(a.name(), b.name());
        assert_eq!(a.data_type(), b.data_type());
    }
}
