//! Predicates and assertions over array-like values
//!
//! Every `assert_*` function returns `Ok(())` when the property holds and
//! [`Error::Check`] naming the property otherwise. None of them mutate their
//! arguments.

use std::fmt::Debug;

use crate::array::{DType, Index, Scalar, Value, ValueType};
use crate::error::{Error, Result};

/// Class descriptor used for subclass checks
#[derive(Debug)]
pub struct ClassInfo {
    name: &'static str,
    base: Option<&'static ClassInfo>,
}

impl ClassInfo {
    /// Class without a base
    pub const fn new(name: &'static str) -> Self {
        Self { name, base: None }
    }

    /// Class deriving from `base`
    pub const fn derived(name: &'static str, base: &'static ClassInfo) -> Self {
        Self {
            name,
            base: Some(base),
        }
    }

    /// Class name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// True if `self` is `other` or derives from it at any depth
    pub fn is_subclass_of(&self, other: &ClassInfo) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if std::ptr::eq(class, other) {
                return true;
            }
            current = class.base;
        }
        false
    }
}

/// Axis selection for [`assert_same_shape`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Same dimension on both sides
    Both(usize),
    /// Dimension `.0` of the first value against dimension `.1` of the second
    Pair(usize, usize),
}

impl From<usize> for Axis {
    fn from(axis: usize) -> Self {
        Axis::Both(axis)
    }
}

impl From<(usize, usize)> for Axis {
    fn from((a, b): (usize, usize)) -> Self {
        Axis::Pair(a, b)
    }
}

/// Series or frame
pub fn is_pandas(arg: &Value) -> bool {
    matches!(arg, Value::Series(_) | Value::Frame(_))
}

/// Series
pub fn is_series(arg: &Value) -> bool {
    matches!(arg, Value::Series(_))
}

/// Frame
pub fn is_frame(arg: &Value) -> bool {
    matches!(arg, Value::Frame(_))
}

/// Plain array, series or frame
pub fn is_array(arg: &Value) -> bool {
    matches!(arg, Value::Array(_) | Value::Series(_) | Value::Frame(_))
}

/// JIT-compiled callable
pub fn is_numba_func(arg: &Value) -> bool {
    matches!(arg, Value::Func(f) if f.is_jit())
}

/// Whether `arg` can serve as a cache key
pub fn is_hashable(arg: &Value) -> bool {
    matches!(arg, Value::None | Value::Scalar(_) | Value::Func(_))
}

/// Raise if `value` is not one of `options`
pub fn assert_value_in<T: PartialEq + Debug>(value: &T, options: &[T]) -> Result<()> {
    if !options.contains(value) {
        return Err(Error::check(format!(
            "{:?} must be one of {:?}",
            value, options
        )));
    }
    Ok(())
}

/// Raise if `arg` is not a JIT-compiled callable
pub fn assert_numba_func(arg: &Value) -> Result<()> {
    if !is_numba_func(arg) {
        return Err(Error::check(format!(
            "{:?} must be a JIT-compiled function",
            arg.value_type()
        )));
    }
    Ok(())
}

/// Raise if `arg` is missing
pub fn assert_not_none(arg: &Value) -> Result<()> {
    if matches!(arg, Value::None) {
        return Err(Error::check("argument cannot be None"));
    }
    Ok(())
}

/// Raise if the type of `arg` is not one of `types`
pub fn assert_type(arg: &Value, types: &[ValueType]) -> Result<()> {
    let ty = arg.value_type();
    if !types.contains(&ty) {
        return Err(Error::check(format!(
            "type {:?} must be one of {:?}",
            ty, types
        )));
    }
    Ok(())
}

/// Raise if `class` does not derive from `base`
pub fn assert_subclass(class: &ClassInfo, base: &ClassInfo) -> Result<()> {
    if !class.is_subclass_of(base) {
        return Err(Error::check(format!(
            "{} must be a subclass of {}",
            class.name, base.name
        )));
    }
    Ok(())
}

/// Raise if the two values differ in type
pub fn assert_same_type(arg1: &Value, arg2: &Value) -> Result<()> {
    let (ty1, ty2) = (arg1.value_type(), arg2.value_type());
    if ty1 != ty2 {
        return Err(Error::check(format!(
            "types {:?} and {:?} do not match",
            ty1, ty2
        )));
    }
    Ok(())
}

fn dtypes_of(arg: &Value) -> Result<Vec<DType>> {
    match arg {
        Value::Frame(frame) => Ok(frame.dtypes()),
        Value::None | Value::Func(_) => Ok(vec![DType::Object]),
        other => Ok(vec![other.to_array()?.dtype()]),
    }
}

/// Raise if `arg` (every column, for frames) is not of `dtype`
pub fn assert_dtype(arg: &Value, dtype: DType) -> Result<()> {
    for found in dtypes_of(arg)? {
        if found != dtype {
            return Err(Error::check(format!(
                "data type must be {}, not {}",
                dtype, found
            )));
        }
    }
    Ok(())
}

/// Raise if the two values do not share dtypes.
///
/// Column-wise when both sides have the same number of columns, otherwise
/// each side must be uniform and the two uniform dtypes must match.
pub fn assert_same_dtype(arg1: &Value, arg2: &Value) -> Result<()> {
    let dtypes1 = dtypes_of(arg1)?;
    let dtypes2 = dtypes_of(arg2)?;
    let mismatch = || {
        Error::check(format!(
            "data types {:?} and {:?} do not match",
            dtypes1, dtypes2
        ))
    };

    if dtypes1.len() == dtypes2.len() {
        if dtypes1 != dtypes2 {
            return Err(mismatch());
        }
        return Ok(());
    }
    let uniform = |dtypes: &[DType]| dtypes.windows(2).all(|w| w[0] == w[1]);
    if !uniform(&dtypes1[..]) || !uniform(&dtypes2[..]) || dtypes1.first() != dtypes2.first() {
        return Err(mismatch());
    }
    Ok(())
}

/// Raise if the number of dimensions of `arg` is not one of `ndims`
pub fn assert_ndim(arg: &Value, ndims: &[usize]) -> Result<()> {
    let ndim = arg.ndim()?;
    if !ndims.contains(&ndim) {
        return Err(Error::check(format!(
            "number of dimensions must be one of {:?}, not {}",
            ndims, ndim
        )));
    }
    Ok(())
}

fn len_of(arg: &Value) -> Result<usize> {
    match arg {
        Value::List(items) => Ok(items.len()),
        other => other
            .shape()?
            .first()
            .copied()
            .ok_or_else(|| Error::check("a 0-dimensional value has no length")),
    }
}

/// Raise if the two values differ in length along the first axis
pub fn assert_same_len(arg1: &Value, arg2: &Value) -> Result<()> {
    let (len1, len2) = (len_of(arg1)?, len_of(arg2)?);
    if len1 != len2 {
        return Err(Error::check(format!(
            "lengths {} and {} do not match",
            len1, len2
        )));
    }
    Ok(())
}

fn dim(shape: &[usize], axis: usize) -> Result<usize> {
    shape.get(axis).copied().ok_or_else(|| {
        Error::check(format!("axis {} is out of bounds for shape {:?}", axis, shape))
    })
}

/// Raise if the two values differ in shape.
///
/// With `axis`, only the selected dimensions are compared. A pair is
/// ordered: `Axis::Pair(i, j)` compares dimension `i` of `arg1` with
/// dimension `j` of `arg2`.
pub fn assert_same_shape(arg1: &Value, arg2: &Value, axis: Option<Axis>) -> Result<()> {
    let shape1 = arg1.shape()?;
    let shape2 = arg2.shape()?;
    let (a, b) = match axis {
        None => {
            if shape1 != shape2 {
                return Err(Error::check(format!(
                    "shapes {:?} and {:?} do not match",
                    shape1, shape2
                )));
            }
            return Ok(());
        }
        Some(Axis::Both(axis)) => (dim(&shape1, axis)?, dim(&shape2, axis)?),
        Some(Axis::Pair(axis1, axis2)) => (dim(&shape1, axis1)?, dim(&shape2, axis2)?),
    };
    if a != b {
        return Err(Error::check(format!(
            "axis {:?} of shapes {:?} and {:?} does not match",
            axis, shape1, shape2
        )));
    }
    Ok(())
}

fn index_of(arg: &Value) -> Result<&Index> {
    match arg {
        Value::Series(series) => Ok(series.index()),
        Value::Frame(frame) => Ok(frame.index()),
        other => Err(Error::check(format!(
            "{:?} has no index",
            other.value_type()
        ))),
    }
}

fn columns_of(arg: &Value) -> Result<&Index> {
    match arg {
        Value::Frame(frame) => Ok(frame.columns()),
        Value::Index(index) => Ok(index),
        other => Err(Error::check(format!(
            "{:?} has no columns",
            other.value_type()
        ))),
    }
}

/// Raise if the two labelled values have different row labels
pub fn assert_same_index(arg1: &Value, arg2: &Value) -> Result<()> {
    let (index1, index2) = (index_of(arg1)?, index_of(arg2)?);
    if !index1.equals(index2) {
        return Err(Error::check(format!(
            "indices {:?} and {:?} do not match",
            index1, index2
        )));
    }
    Ok(())
}

/// Raise if the two frames have different column labels
pub fn assert_same_columns(arg1: &Value, arg2: &Value) -> Result<()> {
    let (columns1, columns2) = (columns_of(arg1)?, columns_of(arg2)?);
    if !columns1.equals(columns2) {
        return Err(Error::check(format!(
            "columns {:?} and {:?} do not match",
            columns1, columns2
        )));
    }
    Ok(())
}

/// Raise if the two values differ in type, shape, index or columns
pub fn assert_same_meta(arg1: &Value, arg2: &Value) -> Result<()> {
    assert_same_type(arg1, arg2)?;
    assert_same_shape(arg1, arg2, None)?;
    if is_pandas(arg1) {
        assert_same_index(arg1, arg2)?;
        if is_frame(arg1) {
            assert_same_columns(arg1, arg2)?;
        }
    }
    Ok(())
}

fn scalars_equal(a: &Scalar, b: &Scalar, nan_equal: bool) -> bool {
    let as_f64 = |s: &Scalar| match s {
        Scalar::Bool(v) => Some(*v as i64 as f64),
        Scalar::Int(v) => Some(*v as f64),
        Scalar::Float(v) => Some(*v),
        Scalar::Str(_) => None,
    };
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x == y || (nan_equal && x.is_nan() && y.is_nan()),
        _ => a == b,
    }
}

fn arrays_equal(arg1: &Value, arg2: &Value, nan_equal: bool) -> Result<bool> {
    let opaque = |arg: &Value| matches!(arg, Value::None | Value::Func(_));
    if opaque(arg1) || opaque(arg2) {
        return Ok(arg1 == arg2);
    }
    let (a, b) = (arg1.to_array()?, arg2.to_array()?);
    Ok(a.shape() == b.shape()
        && a.data()
            .iter()
            .zip(b.data())
            .all(|(x, y)| scalars_equal(x, y, nan_equal)))
}

/// Raise if the two values are not equal.
///
/// Labelled values must agree in type, labels, dtypes and elements (missing
/// values compare equal); plain values are compared element-wise.
pub fn assert_same(arg1: &Value, arg2: &Value) -> Result<()> {
    let same = if is_pandas(arg1) {
        assert_same_meta(arg1, arg2).is_ok()
            && dtypes_of(arg1)? == dtypes_of(arg2)?
            && arrays_equal(arg1, arg2, true)?
    } else {
        arrays_equal(arg1, arg2, false)?
    };
    if !same {
        return Err(Error::check(format!("{:?} and {:?} do not match", arg1, arg2)));
    }
    Ok(())
}

/// Raise if `level_name` is already a level of the index (or of a frame's
/// columns)
pub fn assert_level_not_exists(arg: &Value, level_name: &str) -> Result<()> {
    let index = columns_of(arg)?;
    if index.names().iter().flatten().any(|name| name == level_name) {
        return Err(Error::check(format!(
            "level {} already exists in {:?}",
            level_name,
            index.names()
        )));
    }
    Ok(())
}
