use std::collections::HashMap;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaBuilder};

use super::specs::{objtruth_columns, ColumnSpec, META_COLUMNS, TARGETS_COLUMNS, TRUTH_COLUMNS};
use crate::table::{Column, ColumnKind, Table};

fn empty_table(specs: &[ColumnSpec], nobj: usize) -> Table {
    let mut table = Table::with_rows(nobj);
    for spec in specs {
        let column = if spec.default == 0.0 {
            Column::zeros(spec.kind, nobj)
        } else {
            Column::filled(spec.kind, nobj, spec.default)
        };
        // lengths always agree for a freshly sized table
        let _ = table.push(spec.name, column);
    }
    table
}

/// Zero-initialised targets table with `nobj` rows
///
/// REF_ID starts at -1 and the parallax/proper-motion inverse variances at 1.
pub fn empty_targets_table(nobj: usize) -> Table {
    empty_table(TARGETS_COLUMNS, nobj)
}

/// Truth table plus the object-specific truth table for `templatetype`
///
/// The object truth table has no columns (and no rows) for families without
/// extra truth.
pub fn empty_truth_table(nobj: usize, templatetype: &str) -> (Table, Table) {
    let truth = empty_table(TRUTH_COLUMNS, nobj);
    let objspecs = objtruth_columns(templatetype);
    let objtruth = if objspecs.is_empty() {
        Table::new()
    } else {
        empty_table(&objspecs, nobj)
    };
    (truth, objtruth)
}

/// Spectral metadata table as returned by template services
pub fn empty_meta_table(nobj: usize) -> Table {
    empty_table(META_COLUMNS, nobj)
}

/// Object metadata table for `templatetype`, without the truth-only columns
pub fn empty_objmeta_table(nobj: usize, templatetype: &str) -> Table {
    let specs: Vec<ColumnSpec> = objtruth_columns(templatetype)
        .into_iter()
        .filter(|spec| spec.name != super::columns::TRUEZ_NORSD)
        .collect();
    if specs.is_empty() {
        Table::new()
    } else {
        empty_table(&specs, nobj)
    }
}

fn data_type(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::Float64 => DataType::Float64,
        ColumnKind::Float32 => DataType::Float32,
        ColumnKind::Int64 => DataType::Int64,
        ColumnKind::Int32 => DataType::Int32,
        ColumnKind::Int16 => DataType::Int16,
        ColumnKind::Boolean => DataType::Boolean,
        ColumnKind::Utf8 => DataType::Utf8,
        ColumnKind::Float32List(width) => DataType::FixedSizeList(
            Arc::new(Field::new("item", DataType::Float32, true)),
            width as i32,
        ),
    }
}

/// Creates a Field with a unit annotation in its metadata
fn field_with_unit(spec: &ColumnSpec) -> Field {
    let field = Field::new(spec.name, data_type(spec.kind), false);
    match spec.unit {
        Some(unit) => {
            let mut metadata = HashMap::new();
            metadata.insert("unit".to_string(), unit.to_string());
            field.with_metadata(metadata)
        }
        None => field,
    }
}

fn schema_for(specs: &[ColumnSpec]) -> Schema {
    let mut builder = SchemaBuilder::new();
    for spec in specs {
        builder.push(field_with_unit(spec));
    }
    builder.finish()
}

/// Arrow schema of the targets table, with units in field metadata
///
/// # Example
///
/// ```
/// use mocktarget::schema::create_targets_schema;
///
/// let schema = create_targets_schema();
/// assert_eq!(schema.field(0).name(), "RELEASE");
/// ```
pub fn create_targets_schema() -> Schema {
    schema_for(TARGETS_COLUMNS)
}

/// Arrow schema of the truth table
pub fn create_truth_schema() -> Schema {
    schema_for(TRUTH_COLUMNS)
}

/// Arrow schema of the object truth table for a template family
pub fn create_objtruth_schema(templatetype: &str) -> Schema {
    schema_for(&objtruth_columns(templatetype))
}

/// Unit annotation of a targets or truth column, if any
pub fn unit_of(name: &str) -> Option<&'static str> {
    TARGETS_COLUMNS
        .iter()
        .chain(TRUTH_COLUMNS.iter())
        .find(|spec| spec.name == name)
        .and_then(|spec| spec.unit)
}
