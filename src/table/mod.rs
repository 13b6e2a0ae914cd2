//! # Column Tables
//!
//! Owned, column-oriented tables used for every record set that flows through
//! the pipeline: reader output, targets, truth, object truth and spectral
//! metadata.
//!
//! ## Design Principles
//!
//! 1. **Insertion-ordered columns**: Column order is the order columns were
//!    added, so fixed-schema tables serialize in schema order.
//!
//! 2. **Typed access**: Callers ask for `f64`, `f32`, `i64`, ... slices by name and
//!    get a [`TableError`] instead of a panic when the name or type is wrong.
//!
//! 3. **Arrow at the edges**: Tables convert to and from Arrow `RecordBatch`es for
//!    Parquet I/O; fixed-width list columns map to `FixedSizeList<Float32>`.

mod arrow_io;
mod column;
mod error;

#[cfg(test)]
mod tests;

pub use column::{Column, ColumnKind};
pub use error::TableError;

/// An owned table of equal-length named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    nrows: usize,
}

macro_rules! typed_accessors {
    ($get:ident, $get_mut:ident, $variant:ident, $ty:ty) => {
        /// Borrow a column by name with a fixed element type
        pub fn $get(&self, name: &str) -> Result<&[$ty], TableError> {
            match self.column(name)? {
                Column::$variant(values) => Ok(values),
                other => Err(TableError::TypeMismatch {
                    column: name.to_string(),
                    expected: stringify!($variant).to_string(),
                    found: other.kind().to_string(),
                }),
            }
        }

        /// Mutably borrow a column by name with a fixed element type
        pub fn $get_mut(&mut self, name: &str) -> Result<&mut [$ty], TableError> {
            let idx = self
                .position(name)
                .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))?;
            match &mut self.columns[idx] {
                Column::$variant(values) => Ok(values),
                other => Err(TableError::TypeMismatch {
                    column: name.to_string(),
                    expected: stringify!($variant).to_string(),
                    found: other.kind().to_string(),
                }),
            }
        }
    };
}

impl Table {
    /// Create an empty table with no columns
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with a fixed row count and no columns yet
    pub fn with_rows(nrows: usize) -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            nrows,
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.nrows
    }

    /// True if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.nrows == 0
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names in insertion order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate over `(name, column)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// True if a column with this exact name exists
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Borrow a column by name
    pub fn column(&self, name: &str) -> Result<&Column, TableError> {
        self.position(name)
            .map(|idx| &self.columns[idx])
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    /// Borrow a column by name, if present
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|idx| &self.columns[idx])
    }

    /// Add or replace a column
    ///
    /// The first column added to a column-less table fixes the row count when
    /// the table was created with [`Table::new`].
    pub fn push(&mut self, name: impl Into<String>, column: impl Into<Column>) -> Result<(), TableError> {
        let name = name.into();
        let column = column.into();
        if self.columns.is_empty() && self.nrows == 0 {
            self.nrows = column.len();
        }
        if column.len() != self.nrows {
            return Err(TableError::LengthMismatch {
                column: name,
                expected: self.nrows,
                found: column.len(),
            });
        }
        match self.position(&name) {
            Some(idx) => self.columns[idx] = column,
            None => {
                self.names.push(name);
                self.columns.push(column);
            }
        }
        Ok(())
    }

    /// Remove a column, returning it if it existed
    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let idx = self.position(name)?;
        self.names.remove(idx);
        Some(self.columns.remove(idx))
    }

    /// Overwrite an existing column in place, keeping its declared type
    ///
    /// Numeric values are cast to the existing column's type; anything else
    /// must match exactly.
    pub fn assign(&mut self, name: &str, column: &Column) -> Result<(), TableError> {
        let idx = self
            .position(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))?;
        if column.len() != self.nrows {
            return Err(TableError::LengthMismatch {
                column: name.to_string(),
                expected: self.nrows,
                found: column.len(),
            });
        }
        let kind = self.columns[idx].kind();
        let cast = column.cast(kind).ok_or_else(|| TableError::TypeMismatch {
            column: name.to_string(),
            expected: kind.to_string(),
            found: column.kind().to_string(),
        })?;
        self.columns[idx] = cast;
        Ok(())
    }

    /// Broadcast one numeric value into an existing column
    pub fn fill(&mut self, name: &str, value: f64) -> Result<(), TableError> {
        let idx = self
            .position(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))?;
        let kind = self.columns[idx].kind();
        if kind == ColumnKind::Utf8 {
            return Err(TableError::TypeMismatch {
                column: name.to_string(),
                expected: "numeric".to_string(),
                found: kind.to_string(),
            });
        }
        self.columns[idx] = Column::filled(kind, self.nrows, value);
        Ok(())
    }

    /// Broadcast one string into an existing string column
    pub fn fill_str(&mut self, name: &str, value: &str) -> Result<(), TableError> {
        let nrows = self.nrows;
        let values = self.utf8_mut(name)?;
        debug_assert_eq!(values.len(), nrows);
        for v in values.iter_mut() {
            v.clear();
            v.push_str(value);
        }
        Ok(())
    }

    typed_accessors!(f64, f64_mut, Float64, f64);
    typed_accessors!(f32, f32_mut, Float32, f32);
    typed_accessors!(i64, i64_mut, Int64, i64);
    typed_accessors!(i32, i32_mut, Int32, i32);
    typed_accessors!(i16, i16_mut, Int16, i16);
    typed_accessors!(bool, bool_mut, Boolean, bool);
    typed_accessors!(utf8, utf8_mut, Utf8, String);

    /// Numeric column widened to f64 regardless of its stored type
    pub fn numeric(&self, name: &str) -> Result<Vec<f64>, TableError> {
        let column = self.column(name)?;
        column.to_f64().ok_or_else(|| TableError::TypeMismatch {
            column: name.to_string(),
            expected: "numeric".to_string(),
            found: column.kind().to_string(),
        })
    }

    /// Borrow a fixed-width float list column as `(width, flattened values)`
    pub fn list(&self, name: &str) -> Result<(usize, &[f32]), TableError> {
        match self.column(name)? {
            Column::Float32List { width, values } => Ok((*width, values)),
            other => Err(TableError::TypeMismatch {
                column: name.to_string(),
                expected: "Float32List".to_string(),
                found: other.kind().to_string(),
            }),
        }
    }

    /// Mutable variant of [`Table::list`]
    pub fn list_mut(&mut self, name: &str) -> Result<(usize, &mut [f32]), TableError> {
        let idx = self
            .position(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))?;
        match &mut self.columns[idx] {
            Column::Float32List { width, values } => Ok((*width, values)),
            other => Err(TableError::TypeMismatch {
                column: name.to_string(),
                expected: "Float32List".to_string(),
                found: other.kind().to_string(),
            }),
        }
    }

    /// New table holding the rows at `indices`, in order
    pub fn gather(&self, indices: &[usize]) -> Table {
        Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.gather(indices)).collect(),
            nrows: indices.len(),
        }
    }

    /// New table holding the rows where `mask` is true
    pub fn filter(&self, mask: &[bool]) -> Table {
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        self.gather(&indices)
    }

    /// Write the rows of `src` into this table at `positions`
    ///
    /// Only columns present in both tables are written.
    pub fn scatter(&mut self, positions: &[usize], src: &Table) -> Result<(), TableError> {
        if positions.len() != src.len() {
            return Err(TableError::LengthMismatch {
                column: "<rows>".to_string(),
                expected: positions.len(),
                found: src.len(),
            });
        }
        for (name, column) in src.iter() {
            if let Some(idx) = self.position(name) {
                let dst = &mut self.columns[idx];
                if !dst.scatter(positions, column) {
                    return Err(TableError::TypeMismatch {
                        column: name.to_string(),
                        expected: dst.kind().to_string(),
                        found: column.kind().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Append the rows of `other`; both tables must carry the same columns
    pub fn concat(&mut self, other: &Table) -> Result<(), TableError> {
        if self.columns.is_empty() && self.nrows == 0 {
            *self = other.clone();
            return Ok(());
        }
        for (name, column) in self.names.iter().zip(self.columns.iter_mut()) {
            let src = other
                .get(name)
                .ok_or_else(|| TableError::ColumnNotFound(name.clone()))?;
            if !column.extend(src) {
                return Err(TableError::TypeMismatch {
                    column: name.clone(),
                    expected: column.kind().to_string(),
                    found: src.kind().to_string(),
                });
            }
        }
        self.nrows += other.len();
        Ok(())
    }
}
