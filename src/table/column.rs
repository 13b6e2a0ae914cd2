use std::fmt;

/// Element type of a [`Column`], without data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// 64-bit float
    Float64,
    /// 32-bit float
    Float32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit signed integer
    Int32,
    /// 16-bit signed integer
    Int16,
    /// Boolean flag
    Boolean,
    /// UTF-8 string
    Utf8,
    /// Fixed-width vector of 32-bit floats per row
    Float32List(usize),
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Float64 => write!(f, "Float64"),
            ColumnKind::Float32 => write!(f, "Float32"),
            ColumnKind::Int64 => write!(f, "Int64"),
            ColumnKind::Int32 => write!(f, "Int32"),
            ColumnKind::Int16 => write!(f, "Int16"),
            ColumnKind::Boolean => write!(f, "Boolean"),
            ColumnKind::Utf8 => write!(f, "Utf8"),
            ColumnKind::Float32List(width) => write!(f, "Float32[{}]", width),
        }
    }
}

impl ColumnKind {
    /// True for scalar numeric kinds that can be cast to each other
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnKind::Float64
                | ColumnKind::Float32
                | ColumnKind::Int64
                | ColumnKind::Int32
                | ColumnKind::Int16
        )
    }
}

/// A single typed, owned column of a [`super::Table`]
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// 64-bit float values
    Float64(Vec<f64>),
    /// 32-bit float values
    Float32(Vec<f32>),
    /// 64-bit integer values
    Int64(Vec<i64>),
    /// 32-bit integer values
    Int32(Vec<i32>),
    /// 16-bit integer values
    Int16(Vec<i16>),
    /// Boolean values
    Boolean(Vec<bool>),
    /// String values
    Utf8(Vec<String>),
    /// Row-major fixed-width float vectors (`values.len() == rows * width`)
    Float32List {
        /// Elements per row
        width: usize,
        /// Flattened values
        values: Vec<f32>,
    },
}

impl Column {
    /// Column of `len` default values of the given kind
    pub fn zeros(kind: ColumnKind, len: usize) -> Self {
        match kind {
            ColumnKind::Float64 => Column::Float64(vec![0.0; len]),
            ColumnKind::Float32 => Column::Float32(vec![0.0; len]),
            ColumnKind::Int64 => Column::Int64(vec![0; len]),
            ColumnKind::Int32 => Column::Int32(vec![0; len]),
            ColumnKind::Int16 => Column::Int16(vec![0; len]),
            ColumnKind::Boolean => Column::Boolean(vec![false; len]),
            ColumnKind::Utf8 => Column::Utf8(vec![String::new(); len]),
            ColumnKind::Float32List(width) => Column::Float32List {
                width,
                values: vec![0.0; len * width],
            },
        }
    }

    /// Column of `len` copies of a numeric value, cast to `kind`
    ///
    /// Strings get the value's decimal rendering, booleans `value != 0`.
    pub fn filled(kind: ColumnKind, len: usize, value: f64) -> Self {
        match kind {
            ColumnKind::Float64 => Column::Float64(vec![value; len]),
            ColumnKind::Float32 => Column::Float32(vec![value as f32; len]),
            ColumnKind::Int64 => Column::Int64(vec![value as i64; len]),
            ColumnKind::Int32 => Column::Int32(vec![value as i32; len]),
            ColumnKind::Int16 => Column::Int16(vec![value as i16; len]),
            ColumnKind::Boolean => Column::Boolean(vec![value != 0.0; len]),
            ColumnKind::Utf8 => Column::Utf8(vec![value.to_string(); len]),
            ColumnKind::Float32List(width) => Column::Float32List {
                width,
                values: vec![value as f32; len * width],
            },
        }
    }

    /// Element type of this column
    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Float64(_) => ColumnKind::Float64,
            Column::Float32(_) => ColumnKind::Float32,
            Column::Int64(_) => ColumnKind::Int64,
            Column::Int32(_) => ColumnKind::Int32,
            Column::Int16(_) => ColumnKind::Int16,
            Column::Boolean(_) => ColumnKind::Boolean,
            Column::Utf8(_) => ColumnKind::Utf8,
            Column::Float32List { width, .. } => ColumnKind::Float32List(*width),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        match self {
            Column::Float64(v) => v.len(),
            Column::Float32(v) => v.len(),
            Column::Int64(v) => v.len(),
            Column::Int32(v) => v.len(),
            Column::Int16(v) => v.len(),
            Column::Boolean(v) => v.len(),
            Column::Utf8(v) => v.len(),
            Column::Float32List { width, values } => {
                if *width == 0 {
                    0
                } else {
                    values.len() / width
                }
            }
        }
    }

    /// True when the column has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric values widened to f64, or `None` for non-numeric kinds
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            Column::Float64(v) => Some(v.clone()),
            Column::Float32(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Column::Int64(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Column::Int32(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Column::Int16(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Column::Boolean(v) => Some(v.iter().map(|&x| if x { 1.0 } else { 0.0 }).collect()),
            Column::Utf8(_) | Column::Float32List { .. } => None,
        }
    }

    /// Cast to another kind, if the conversion is meaningful
    ///
    /// Numeric kinds cast freely between each other; everything else only
    /// converts to itself.
    pub fn cast(&self, kind: ColumnKind) -> Option<Column> {
        if self.kind() == kind {
            return Some(self.clone());
        }
        if !(self.kind().is_numeric() || self.kind() == ColumnKind::Boolean) {
            return None;
        }
        let values = self.to_f64()?;
        let cast = match kind {
            ColumnKind::Float64 => Column::Float64(values),
            ColumnKind::Float32 => Column::Float32(values.iter().map(|&x| x as f32).collect()),
            ColumnKind::Int64 => Column::Int64(values.iter().map(|&x| x as i64).collect()),
            ColumnKind::Int32 => Column::Int32(values.iter().map(|&x| x as i32).collect()),
            ColumnKind::Int16 => Column::Int16(values.iter().map(|&x| x as i16).collect()),
            ColumnKind::Boolean => Column::Boolean(values.iter().map(|&x| x != 0.0).collect()),
            ColumnKind::Utf8 | ColumnKind::Float32List(_) => return None,
        };
        Some(cast)
    }

    /// New column holding the rows at `indices`, in order (duplicates allowed)
    pub fn gather(&self, indices: &[usize]) -> Column {
        fn pick<T: Clone>(v: &[T], indices: &[usize]) -> Vec<T> {
            indices.iter().map(|&i| v[i].clone()).collect()
        }
        match self {
            Column::Float64(v) => Column::Float64(pick(v, indices)),
            Column::Float32(v) => Column::Float32(pick(v, indices)),
            Column::Int64(v) => Column::Int64(pick(v, indices)),
            Column::Int32(v) => Column::Int32(pick(v, indices)),
            Column::Int16(v) => Column::Int16(pick(v, indices)),
            Column::Boolean(v) => Column::Boolean(pick(v, indices)),
            Column::Utf8(v) => Column::Utf8(pick(v, indices)),
            Column::Float32List { width, values } => {
                let mut out = Vec::with_capacity(indices.len() * width);
                for &i in indices {
                    out.extend_from_slice(&values[i * width..(i + 1) * width]);
                }
                Column::Float32List {
                    width: *width,
                    values: out,
                }
            }
        }
    }

    /// Write `src` row `k` into row `positions[k]` of this column
    ///
    /// Returns `false` when the kinds are incompatible.
    pub fn scatter(&mut self, positions: &[usize], src: &Column) -> bool {
        let src = match src.cast(self.kind()) {
            Some(src) => src,
            None => return false,
        };
        fn put<T: Clone>(dst: &mut [T], positions: &[usize], src: &[T]) {
            for (k, &p) in positions.iter().enumerate() {
                dst[p] = src[k].clone();
            }
        }
        match (self, &src) {
            (Column::Float64(d), Column::Float64(s)) => put(d, positions, s),
            (Column::Float32(d), Column::Float32(s)) => put(d, positions, s),
            (Column::Int64(d), Column::Int64(s)) => put(d, positions, s),
            (Column::Int32(d), Column::Int32(s)) => put(d, positions, s),
            (Column::Int16(d), Column::Int16(s)) => put(d, positions, s),
            (Column::Boolean(d), Column::Boolean(s)) => put(d, positions, s),
            (Column::Utf8(d), Column::Utf8(s)) => put(d, positions, s),
            (
                Column::Float32List { width, values },
                Column::Float32List { values: s, .. },
            ) => {
                let w = *width;
                for (k, &p) in positions.iter().enumerate() {
                    values[p * w..(p + 1) * w].copy_from_slice(&s[k * w..(k + 1) * w]);
                }
            }
            _ => return false,
        }
        true
    }

    /// Append the rows of `other`, casting numerics; `false` if incompatible
    pub fn extend(&mut self, other: &Column) -> bool {
        let other = match other.cast(self.kind()) {
            Some(other) => other,
            None => return false,
        };
        match (self, other) {
            (Column::Float64(d), Column::Float64(s)) => d.extend(s),
            (Column::Float32(d), Column::Float32(s)) => d.extend(s),
            (Column::Int64(d), Column::Int64(s)) => d.extend(s),
            (Column::Int32(d), Column::Int32(s)) => d.extend(s),
            (Column::Int16(d), Column::Int16(s)) => d.extend(s),
            (Column::Boolean(d), Column::Boolean(s)) => d.extend(s),
            (Column::Utf8(d), Column::Utf8(s)) => d.extend(s),
            (Column::Float32List { values, .. }, Column::Float32List { values: s, .. }) => {
                values.extend(s)
            }
            _ => return false,
        }
        true
    }
}

impl From<Vec<f64>> for Column {
    fn from(v: Vec<f64>) -> Self {
        Column::Float64(v)
    }
}

impl From<Vec<f32>> for Column {
    fn from(v: Vec<f32>) -> Self {
        Column::Float32(v)
    }
}

impl From<Vec<i64>> for Column {
    fn from(v: Vec<i64>) -> Self {
        Column::Int64(v)
    }
}

impl From<Vec<i32>> for Column {
    fn from(v: Vec<i32>) -> Self {
        Column::Int32(v)
    }
}

impl From<Vec<i16>> for Column {
    fn from(v: Vec<i16>) -> Self {
        Column::Int16(v)
    }
}

impl From<Vec<bool>> for Column {
    fn from(v: Vec<bool>) -> Self {
        Column::Boolean(v)
    }
}

impl From<Vec<String>> for Column {
    fn from(v: Vec<String>) -> Self {
        Column::Utf8(v)
    }
}
