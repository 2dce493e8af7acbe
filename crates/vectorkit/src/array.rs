//! Array-like value model
//!
//! Minimal stand-ins for n-dimensional arrays, labelled series and frames.
//! Only what the checks need is modelled: shape, dtype, index and column
//! labels, and the values themselves for equality.

use std::fmt;

use crate::error::{Error, Result};

/// Element type of an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int64,
    /// 64-bit float
    Float64,
    /// Anything else (strings, mixed)
    Object,
}

impl DType {
    /// Common type able to hold values of both `self` and `other`
    pub fn promote(self, other: DType) -> DType {
        use DType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Object, _) | (_, Object) => Object,
            (Float64, _) | (_, Float64) => Float64,
            _ => Int64,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Bool => "bool",
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Object => "object",
        };
        f.write_str(name)
    }
}

/// Single element
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    Str(String),
}

impl Scalar {
    /// Natural dtype of this element
    pub fn dtype(&self) -> DType {
        match self {
            Scalar::Bool(_) => DType::Bool,
            Scalar::Int(_) => DType::Int64,
            Scalar::Float(_) => DType::Float64,
            Scalar::Str(_) => DType::Object,
        }
    }

    fn cast(self, dtype: DType) -> Scalar {
        match (self, dtype) {
            (Scalar::Bool(b), DType::Int64) => Scalar::Int(b as i64),
            (Scalar::Bool(b), DType::Float64) => Scalar::Float(if b { 1.0 } else { 0.0 }),
            (Scalar::Int(i), DType::Float64) => Scalar::Float(i as f64),
            (other, _) => other,
        }
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Scalar {
            fn from(v: $ty) -> Self {
                Scalar::$variant(v.into())
            }
        })*
    };
}

scalar_from!(bool => Bool, i32 => Int, i64 => Int, f64 => Float, String => Str, &str => Str);

/// Index or column label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    /// Integer label
    Int(i64),
    /// String label
    Str(String),
}

impl From<i64> for Label {
    fn from(v: i64) -> Self {
        Label::Int(v)
    }
}

impl From<&str> for Label {
    fn from(v: &str) -> Self {
        Label::Str(v.to_string())
    }
}

impl From<String> for Label {
    fn from(v: String) -> Self {
        Label::Str(v)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(i) => write!(f, "{}", i),
            Label::Str(s) => f.write_str(s),
        }
    }
}

/// Row or column labels, flat or hierarchical
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    levels: Vec<Vec<Label>>,
    names: Vec<Option<String>>,
}

impl Index {
    /// Flat unnamed index
    pub fn new<L: Into<Label>>(labels: impl IntoIterator<Item = L>) -> Self {
        Self {
            levels: vec![labels.into_iter().map(Into::into).collect()],
            names: vec![None],
        }
    }

    /// Default `0..len` index
    pub fn range(len: usize) -> Self {
        Self::new((0..len as i64).map(Label::Int))
    }

    /// Hierarchical index from one label array per level
    pub fn from_arrays(levels: Vec<Vec<Label>>, names: Vec<Option<String>>) -> Result<Self> {
        if levels.is_empty() || levels.len() != names.len() {
            return Err(Error::check("index needs one name per level"));
        }
        let len = levels[0].len();
        if levels.iter().any(|level| level.len() != len) {
            return Err(Error::check("index levels must have the same length"));
        }
        Ok(Self { levels, names })
    }

    /// Name a flat index
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.names = vec![Some(name.into())];
        self.levels.truncate(1);
        self
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of levels
    pub fn nlevels(&self) -> usize {
        self.levels.len()
    }

    /// Level names
    pub fn names(&self) -> &[Option<String>] {
        &self.names
    }

    /// Labels of one level
    pub fn level(&self, i: usize) -> Option<&[Label]> {
        self.levels.get(i).map(Vec::as_slice)
    }

    /// Compare labels, ignoring names
    pub fn equals(&self, other: &Index) -> bool {
        self.levels == other.levels
    }
}

/// N-dimensional array stored in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    dtype: DType,
    data: Vec<Scalar>,
}

impl NdArray {
    /// Array of float zeros
    pub fn zeros(shape: &[usize]) -> Self {
        let size = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            dtype: DType::Float64,
            data: vec![Scalar::Float(0.0); size],
        }
    }

    /// 0-dimensional array
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        let value = value.into();
        Self {
            shape: Vec::new(),
            dtype: value.dtype(),
            data: vec![value],
        }
    }

    /// 1-dimensional array
    pub fn from_vec<S: Into<Scalar>>(data: impl IntoIterator<Item = S>) -> Self {
        let data: Vec<Scalar> = data.into_iter().map(Into::into).collect();
        let shape = vec![data.len()];
        Self::build(shape, data)
    }

    /// Array with an explicit shape
    pub fn from_shape_vec<S: Into<Scalar>>(
        shape: &[usize],
        data: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let data: Vec<Scalar> = data.into_iter().map(Into::into).collect();
        let size: usize = shape.iter().product();
        if size != data.len() {
            return Err(Error::check(format!(
                "cannot reshape {} elements into {:?}",
                data.len(),
                shape
            )));
        }
        Ok(Self::build(shape.to_vec(), data))
    }

    fn build(shape: Vec<usize>, data: Vec<Scalar>) -> Self {
        let dtype = infer_dtype(&data);
        let data = data.into_iter().map(|s| s.cast(dtype)).collect();
        Self { shape, dtype, data }
    }

    /// Dimensions
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Element type
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Elements in row-major order
    pub fn data(&self) -> &[Scalar] {
        &self.data
    }

    /// Same elements under a new shape
    pub fn reshape(&self, shape: &[usize]) -> Result<NdArray> {
        if shape.iter().product::<usize>() != self.data.len() {
            return Err(Error::check(format!(
                "cannot reshape array of shape {:?} into {:?}",
                self.shape, shape
            )));
        }
        Ok(Self {
            shape: shape.to_vec(),
            dtype: self.dtype,
            data: self.data.clone(),
        })
    }

    /// Column `j` of a 2-dimensional array
    pub fn column(&self, j: usize) -> Option<NdArray> {
        match self.shape[..] {
            [rows, cols] if j < cols => {
                let data = (0..rows).map(|i| self.data[i * cols + j].clone()).collect();
                Some(Self {
                    shape: vec![rows],
                    dtype: self.dtype,
                    data,
                })
            }
            _ => None,
        }
    }
}

fn infer_dtype(data: &[Scalar]) -> DType {
    data.iter()
        .map(Scalar::dtype)
        .reduce(DType::promote)
        .unwrap_or(DType::Float64)
}

/// One-dimensional labelled array
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    values: NdArray,
    index: Index,
    name: Option<Label>,
}

impl Series {
    /// Series with a default index
    pub fn new<S: Into<Scalar>>(values: impl IntoIterator<Item = S>) -> Self {
        let values = NdArray::from_vec(values);
        let index = Index::range(values.shape[0]);
        Self {
            values,
            index,
            name: None,
        }
    }

    /// Series from a 1-dimensional array and index
    pub fn from_parts(values: NdArray, index: Index, name: Option<Label>) -> Result<Self> {
        if values.ndim() != 1 || values.shape[0] != index.len() {
            return Err(Error::check(format!(
                "series values of shape {:?} do not match index of length {}",
                values.shape,
                index.len()
            )));
        }
        Ok(Self { values, index, name })
    }

    /// Replace the index
    pub fn with_index(self, index: Index) -> Result<Self> {
        Self::from_parts(self.values, index, self.name)
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<Label>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Values
    pub fn values(&self) -> &NdArray {
        &self.values
    }

    /// Row labels
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Name
    pub fn name(&self) -> Option<&Label> {
        self.name.as_ref()
    }

    /// Element type
    pub fn dtype(&self) -> DType {
        self.values.dtype
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Two-dimensional labelled table stored column by column
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    data: Vec<NdArray>,
    index: Index,
    columns: Index,
}

impl DataFrame {
    /// Frame from rows. All cells share one promoted dtype.
    pub fn from_rows<S: Into<Scalar>>(rows: Vec<Vec<S>>) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != ncols) {
            return Err(Error::check("rows must have the same length"));
        }
        let array = NdArray::from_shape_vec(&[nrows, ncols], rows.into_iter().flatten())?;
        Self::from_array(&array)
    }

    /// Frame from a 2-dimensional array. A 1-dimensional array becomes a
    /// single column.
    pub fn from_array(array: &NdArray) -> Result<Self> {
        let (nrows, ncols, data) = match array.shape[..] {
            [rows] => (rows, 1, vec![array.clone()]),
            [rows, cols] => (rows, cols, (0..cols).filter_map(|j| array.column(j)).collect()),
            _ => {
                return Err(Error::check(format!(
                    "a frame needs 1 or 2 dimensions, not {}",
                    array.ndim()
                )));
            }
        };
        Ok(Self {
            data,
            index: Index::range(nrows),
            columns: Index::range(ncols),
        })
    }

    /// Frame from named columns, each keeping its own dtype
    pub fn from_columns<S: Into<Scalar>>(columns: Vec<(Label, Vec<S>)>) -> Result<Self> {
        let nrows = columns.first().map_or(0, |(_, values)| values.len());
        let mut labels = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());
        for (label, values) in columns {
            if values.len() != nrows {
                return Err(Error::check("columns must have the same length"));
            }
            labels.push(label);
            data.push(NdArray::from_vec(values));
        }
        Ok(Self {
            data,
            index: Index::range(nrows),
            columns: Index::new(labels),
        })
    }

    /// Replace the row labels
    pub fn with_index(mut self, index: Index) -> Result<Self> {
        if index.len() != self.index.len() {
            return Err(Error::check(format!(
                "index of length {} does not match {} rows",
                index.len(),
                self.index.len()
            )));
        }
        self.index = index;
        Ok(self)
    }

    /// Replace the column labels
    pub fn with_columns(mut self, columns: Index) -> Result<Self> {
        if columns.len() != self.data.len() {
            return Err(Error::check(format!(
                "columns of length {} do not match {} columns",
                columns.len(),
                self.data.len()
            )));
        }
        self.columns = columns;
        Ok(self)
    }

    /// Row labels
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Column labels
    pub fn columns(&self) -> &Index {
        &self.columns
    }

    /// Column arrays
    pub fn column_data(&self) -> &[NdArray] {
        &self.data
    }

    /// Per-column dtypes
    pub fn dtypes(&self) -> Vec<DType> {
        self.data.iter().map(NdArray::dtype).collect()
    }

    /// `[rows, columns]`
    pub fn shape(&self) -> [usize; 2] {
        [self.index.len(), self.data.len()]
    }
}

/// Callable marker, either plain or JIT-compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Func {
    name: String,
    jit: bool,
}

impl Func {
    /// Plain callable
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jit: false,
        }
    }

    /// JIT-compiled callable
    pub fn jit(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jit: true,
        }
    }

    /// Name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this callable was JIT-compiled
    pub fn is_jit(&self) -> bool {
        self.jit
    }
}

/// Type tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Missing value
    None,
    /// Boolean scalar
    Bool,
    /// Integer scalar
    Int,
    /// Float scalar
    Float,
    /// String scalar
    Str,
    /// Nested list
    List,
    /// N-dimensional array
    NdArray,
    /// Labelled 1-D array
    Series,
    /// Labelled 2-D table
    DataFrame,
    /// Labels
    Index,
    /// Callable
    Func,
}

/// Any value accepted by the checks
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value
    None,
    /// Single element
    Scalar(Scalar),
    /// Nested list
    List(Vec<Value>),
    /// N-dimensional array
    Array(NdArray),
    /// Labelled 1-D array
    Series(Series),
    /// Labelled 2-D table
    Frame(DataFrame),
    /// Labels
    Index(Index),
    /// Callable
    Func(Func),
}

impl Value {
    /// List of values
    pub fn list<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Type tag
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::None => ValueType::None,
            Value::Scalar(Scalar::Bool(_)) => ValueType::Bool,
            Value::Scalar(Scalar::Int(_)) => ValueType::Int,
            Value::Scalar(Scalar::Float(_)) => ValueType::Float,
            Value::Scalar(Scalar::Str(_)) => ValueType::Str,
            Value::List(_) => ValueType::List,
            Value::Array(_) => ValueType::NdArray,
            Value::Series(_) => ValueType::Series,
            Value::Frame(_) => ValueType::DataFrame,
            Value::Index(_) => ValueType::Index,
            Value::Func(_) => ValueType::Func,
        }
    }

    /// Convert to a plain array the way an array constructor would.
    ///
    /// Missing values and callables have no element representation and fail.
    pub fn to_array(&self) -> Result<NdArray> {
        match self {
            Value::None | Value::Func(_) => Err(Error::check(format!(
                "{:?} cannot be converted to an array",
                self.value_type()
            ))),
            Value::Scalar(s) => Ok(NdArray::scalar(s.clone())),
            Value::Array(a) => Ok(a.clone()),
            Value::Series(s) => Ok(s.values.clone()),
            Value::Frame(f) => {
                let [rows, cols] = f.shape();
                let data = (0..rows)
                    .flat_map(|i| f.data.iter().map(move |col| col.data[i].clone()))
                    .collect();
                Ok(NdArray::build(vec![rows, cols], data))
            }
            Value::Index(index) => {
                let labels = index.levels[0].iter().map(|label| match label {
                    Label::Int(i) => Scalar::Int(*i),
                    Label::Str(s) => Scalar::Str(s.clone()),
                });
                Ok(NdArray::from_vec(labels))
            }
            Value::List(items) => stack(items),
        }
    }

    /// Dimensions
    pub fn shape(&self) -> Result<Vec<usize>> {
        match self {
            Value::Array(a) => Ok(a.shape.clone()),
            Value::Series(s) => Ok(vec![s.len()]),
            Value::Frame(f) => Ok(f.shape().to_vec()),
            Value::Index(i) => Ok(vec![i.len()]),
            Value::None | Value::Func(_) => Ok(Vec::new()),
            other => Ok(other.to_array()?.shape),
        }
    }

    /// Number of dimensions
    pub fn ndim(&self) -> Result<usize> {
        Ok(self.shape()?.len())
    }
}

fn stack(items: &[Value]) -> Result<NdArray> {
    let arrays = items.iter().map(Value::to_array).collect::<Result<Vec<_>>>()?;
    let inner = match arrays.first() {
        Some(first) => first.shape.clone(),
        None => return Ok(NdArray::from_vec(Vec::<Scalar>::new())),
    };
    if arrays.iter().any(|a| a.shape != inner) {
        return Err(Error::check("cannot build an array from a ragged nested list"));
    }
    let mut shape = vec![arrays.len()];
    shape.extend_from_slice(&inner);
    let data = arrays.into_iter().flat_map(|a| a.data).collect();
    Ok(NdArray::build(shape, data))
}

macro_rules! value_from {
    ($($ty:ty => $body:expr),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                $body(v)
            }
        })*
    };
}

value_from!(
    bool => |v: bool| Value::Scalar(v.into()),
    i32 => |v: i32| Value::Scalar(v.into()),
    i64 => |v: i64| Value::Scalar(v.into()),
    f64 => |v: f64| Value::Scalar(v.into()),
    &str => |v: &str| Value::Scalar(v.into()),
    Scalar => Value::Scalar,
    NdArray => Value::Array,
    Series => Value::Series,
    DataFrame => Value::Frame,
    Index => Value::Index,
    Func => Value::Func,
);
