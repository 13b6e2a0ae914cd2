use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, BooleanBuilder, FixedSizeListArray, Float32Array,
    Float32Builder, Float64Array, Float64Builder, Int16Array, Int16Builder, Int32Array,
    Int32Builder, Int64Array, Int64Builder, LargeListArray, LargeStringArray, ListArray,
    StringArray, StringBuilder,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use super::{Column, Table, TableError};

fn list_field() -> Arc<Field> {
    Arc::new(Field::new("item", DataType::Float32, true))
}

/// Arrow data type used to store a column of the given kind
pub(crate) fn arrow_type(column: &Column) -> DataType {
    match column {
        Column::Float64(_) => DataType::Float64,
        Column::Float32(_) => DataType::Float32,
        Column::Int64(_) => DataType::Int64,
        Column::Int32(_) => DataType::Int32,
        Column::Int16(_) => DataType::Int16,
        Column::Boolean(_) => DataType::Boolean,
        Column::Utf8(_) => DataType::Utf8,
        Column::Float32List { width, .. } => DataType::FixedSizeList(list_field(), *width as i32),
    }
}

fn to_array(column: &Column) -> Result<ArrayRef, TableError> {
    let array: ArrayRef = match column {
        Column::Float64(v) => {
            let mut builder = Float64Builder::with_capacity(v.len());
            builder.append_slice(v);
            Arc::new(builder.finish())
        }
        Column::Float32(v) => {
            let mut builder = Float32Builder::with_capacity(v.len());
            builder.append_slice(v);
            Arc::new(builder.finish())
        }
        Column::Int64(v) => {
            let mut builder = Int64Builder::with_capacity(v.len());
            builder.append_slice(v);
            Arc::new(builder.finish())
        }
        Column::Int32(v) => {
            let mut builder = Int32Builder::with_capacity(v.len());
            builder.append_slice(v);
            Arc::new(builder.finish())
        }
        Column::Int16(v) => {
            let mut builder = Int16Builder::with_capacity(v.len());
            builder.append_slice(v);
            Arc::new(builder.finish())
        }
        Column::Boolean(v) => {
            let mut builder = BooleanBuilder::with_capacity(v.len());
            builder.append_slice(v);
            Arc::new(builder.finish())
        }
        Column::Utf8(v) => {
            let mut builder = StringBuilder::with_capacity(v.len(), v.len() * 8);
            for s in v {
                builder.append_value(s);
            }
            Arc::new(builder.finish())
        }
        Column::Float32List { width, values } => {
            let list = FixedSizeListArray::try_new(
                list_field(),
                *width as i32,
                Arc::new(Float32Array::from(values.clone())),
                None,
            )?;
            Arc::new(list)
        }
    };
    Ok(array)
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef, name: &str) -> Result<&'a T, TableError> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| TableError::TypeMismatch {
        column: name.to_string(),
        expected: std::any::type_name::<T>().to_string(),
        found: array.data_type().to_string(),
    })
}

fn list_values(values: &ArrayRef, name: &str) -> Result<Vec<f32>, TableError> {
    let floats = cast(values, &DataType::Float32)?;
    let floats = downcast::<Float32Array>(&floats, name)?;
    Ok(floats.iter().map(|v| v.unwrap_or(f32::NAN)).collect())
}

fn ragged_width(name: &str, lengths: impl Iterator<Item = usize>) -> Result<usize, TableError> {
    let mut width = None;
    for len in lengths {
        match width {
            None => width = Some(len),
            Some(w) if w != len => {
                return Err(TableError::Arrow(ArrowError::InvalidArgumentError(format!(
                    "list column {} has rows of differing length ({} and {})",
                    name, w, len
                ))))
            }
            Some(_) => {}
        }
    }
    Ok(width.unwrap_or(0))
}

fn from_array(array: &ArrayRef, name: &str) -> Result<Column, TableError> {
    let column = match array.data_type() {
        DataType::Float64 => {
            let a = downcast::<Float64Array>(array, name)?;
            Column::Float64(a.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
        }
        DataType::Float32 => {
            let a = downcast::<Float32Array>(array, name)?;
            Column::Float32(a.iter().map(|v| v.unwrap_or(f32::NAN)).collect())
        }
        DataType::Int64 => {
            let a = downcast::<Int64Array>(array, name)?;
            Column::Int64(a.iter().map(|v| v.unwrap_or(0)).collect())
        }
        DataType::Int32 => {
            let a = downcast::<Int32Array>(array, name)?;
            Column::Int32(a.iter().map(|v| v.unwrap_or(0)).collect())
        }
        DataType::Int16 => {
            let a = downcast::<Int16Array>(array, name)?;
            Column::Int16(a.iter().map(|v| v.unwrap_or(0)).collect())
        }
        DataType::Boolean => {
            let a = downcast::<BooleanArray>(array, name)?;
            Column::Boolean(a.iter().map(|v| v.unwrap_or(false)).collect())
        }
        DataType::Utf8 => {
            let a = downcast::<StringArray>(array, name)?;
            Column::Utf8(a.iter().map(|v| v.unwrap_or("").to_string()).collect())
        }
        DataType::LargeUtf8 => {
            let a = downcast::<LargeStringArray>(array, name)?;
            Column::Utf8(a.iter().map(|v| v.unwrap_or("").to_string()).collect())
        }
        DataType::FixedSizeList(_, width) => {
            let a = downcast::<FixedSizeListArray>(array, name)?;
            let width = *width as usize;
            let start = a.offset() * width;
            let values = list_values(a.values(), name)?;
            Column::Float32List {
                width,
                values: values[start..start + a.len() * width].to_vec(),
            }
        }
        DataType::List(_) => {
            let a = downcast::<ListArray>(array, name)?;
            let offsets = a.value_offsets();
            let width = ragged_width(name, offsets.windows(2).map(|w| (w[1] - w[0]) as usize))?;
            let values = list_values(a.values(), name)?;
            let start = offsets[0] as usize;
            Column::Float32List {
                width,
                values: values[start..start + a.len() * width].to_vec(),
            }
        }
        DataType::LargeList(_) => {
            let a = downcast::<LargeListArray>(array, name)?;
            let offsets = a.value_offsets();
            let width = ragged_width(name, offsets.windows(2).map(|w| (w[1] - w[0]) as usize))?;
            let values = list_values(a.values(), name)?;
            let start = offsets[0] as usize;
            Column::Float32List {
                width,
                values: values[start..start + a.len() * width].to_vec(),
            }
        }
        DataType::Int8 | DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let wide = cast(array, &DataType::Int64)?;
            let a = downcast::<Int64Array>(&wide, name)?;
            Column::Int64(a.iter().map(|v| v.unwrap_or(0)).collect())
        }
        _ => {
            let wide = cast(array, &DataType::Float64)?;
            let a = downcast::<Float64Array>(&wide, name)?;
            Column::Float64(a.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
        }
    };
    Ok(column)
}

impl Table {
    /// Arrow schema matching [`Table::to_record_batch`]
    pub fn arrow_schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .iter()
            .map(|(name, column)| Field::new(name, arrow_type(column), false))
            .collect();
        Arc::new(Schema::new(fields))
    }

    /// Convert to an Arrow `RecordBatch`
    pub fn to_record_batch(&self) -> Result<RecordBatch, TableError> {
        let arrays = self
            .columns
            .iter()
            .map(to_array)
            .collect::<Result<Vec<_>, _>>()?;
        let batch = if arrays.is_empty() {
            RecordBatch::new_empty(self.arrow_schema())
        } else {
            RecordBatch::try_new(self.arrow_schema(), arrays)?
        };
        Ok(batch)
    }

    /// Build a table from an Arrow `RecordBatch`
    ///
    /// Nulls become NaN for floats, zero for integers, `false` for booleans and
    /// the empty string for text. Unsigned and 8-bit integers widen to Int64;
    /// other numeric types widen to Float64; list columns must have a constant
    /// row width.
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self, TableError> {
        let mut table = Table::with_rows(batch.num_rows());
        let schema = batch.schema();
        for (field, array) in schema.fields().iter().zip(batch.columns()) {
            table.push(field.name().clone(), from_array(array, field.name())?)?;
        }
        Ok(table)
    }

    /// Build one table from a sequence of batches sharing a schema
    pub fn from_record_batches(batches: &[RecordBatch]) -> Result<Self, TableError> {
        let mut table = Table::new();
        for batch in batches {
            let next = Table::from_record_batch(batch)?;
            table.concat(&next)?;
        }
        Ok(table)
    }

    /// Upper-case every column name
    pub fn uppercase_names(&mut self) {
        for name in self.names.iter_mut() {
            *name = name.to_uppercase();
        }
    }
}
