//! Wrapping raw arrays back into labelled values

use crate::array::{DataFrame, Index, Label, NdArray, Series, Value};
use crate::checks::{self, Axis};
use crate::error::{Error, Result};

/// Index, columns and dimensionality of a labelled value
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayWrapper {
    index: Index,
    columns: Index,
    ndim: usize,
}

impl ArrayWrapper {
    /// Wrapper with explicit metadata
    pub fn new(index: Index, columns: Index, ndim: usize) -> Result<Self> {
        checks::assert_value_in(&ndim, &[1, 2])?;
        Ok(Self {
            index,
            columns,
            ndim,
        })
    }

    /// Derive metadata from a value.
    ///
    /// A series contributes its name (or `0`) as its only column.
    pub fn from_obj(obj: &Value) -> Result<Self> {
        match obj {
            Value::Series(series) => {
                let name = series.name().cloned().unwrap_or(Label::Int(0));
                Self::new(series.index().clone(), Index::new([name]), 1)
            }
            Value::Frame(frame) => Self::new(frame.index().clone(), frame.columns().clone(), 2),
            other => {
                let shape = other.shape()?;
                match shape[..] {
                    [rows] => Self::new(Index::range(rows), Index::range(1), 1),
                    [rows, cols] => Self::new(Index::range(rows), Index::range(cols), 2),
                    _ => Err(Error::check(format!(
                        "cannot derive metadata from shape {:?}",
                        shape
                    ))),
                }
            }
        }
    }

    /// Row labels
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Column labels
    pub fn columns(&self) -> &Index {
        &self.columns
    }

    /// Number of dimensions
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Series name. A `0` column means the series was unnamed.
    pub fn name(&self) -> Option<&Label> {
        if self.ndim != 1 {
            return None;
        }
        self.columns
            .level(0)
            .and_then(|labels| labels.first())
            .filter(|label| **label != Label::Int(0))
    }

    /// Shape of the wrapped value
    pub fn shape(&self) -> Vec<usize> {
        if self.ndim == 1 {
            vec![self.index.len()]
        } else {
            vec![self.index.len(), self.columns.len()]
        }
    }

    /// Wrap a 1- or 2-dimensional array using the stored metadata
    pub fn wrap(&self, a: &Value) -> Result<Value> {
        checks::assert_ndim(a, &[1, 2])?;
        let array = self.soft_broadcast(a.to_array()?)?;
        let wrapped: Value = array.clone().into();

        checks::assert_same_shape(&wrapped, &self.index.clone().into(), Some(Axis::Pair(0, 0)))?;
        if array.ndim() == 1 {
            let series = Series::from_parts(array, self.index.clone(), self.name().cloned())?;
            return Ok(series.into());
        }
        checks::assert_same_shape(&wrapped, &self.columns.clone().into(), Some(Axis::Pair(1, 0)))?;
        let frame = DataFrame::from_array(&array)?
            .with_index(self.index.clone())?
            .with_columns(self.columns.clone())?;
        Ok(frame.into())
    }

    /// Wrap the result of a reduction.
    ///
    /// A 0-dimensional result (or a single value of a series) becomes a
    /// scalar, one value per column becomes a series over the columns, and
    /// one array per column becomes a frame with `index` as row labels.
    /// Missing values and callables are returned unchanged.
    pub fn wrap_reduced(&self, a: &Value, index: Option<Index>) -> Result<Value> {
        if matches!(a, Value::None | Value::Func(_)) {
            return Ok(a.clone());
        }
        let array = a.to_array()?;
        let single = || {
            array
                .data()
                .first()
                .cloned()
                .map(Value::Scalar)
                .ok_or_else(|| Error::check("reduced array is empty"))
        };
        match (array.ndim(), self.ndim) {
            (0, _) => single(),
            (1, 1) if array.shape()[0] == 1 => single(),
            (1, 1) => {
                let index = index.unwrap_or_else(|| Index::range(array.shape()[0]));
                Ok(Series::from_parts(array, index, self.name().cloned())?.into())
            }
            (1, _) => Ok(Series::from_parts(array, self.columns.clone(), None)?.into()),
            (2, 1) => {
                let first = array
                    .column(0)
                    .ok_or_else(|| Error::check("reduced array has no columns"))?;
                let index = index.unwrap_or_else(|| Index::range(first.shape()[0]));
                Ok(Series::from_parts(first, index, self.name().cloned())?.into())
            }
            (2, _) => {
                let rows = array.shape()[0];
                let frame = DataFrame::from_array(&array)?
                    .with_index(index.unwrap_or_else(|| Index::range(rows)))?
                    .with_columns(self.columns.clone())?;
                Ok(frame.into())
            }
            (ndim, _) => Err(Error::check(format!(
                "cannot wrap a reduced array with {} dimensions",
                ndim
            ))),
        }
    }

    fn soft_broadcast(&self, array: NdArray) -> Result<NdArray> {
        let shape = array.shape().to_vec();
        match (&shape[..], self.ndim) {
            ([rows, 1], 1) => array.reshape(&[*rows]),
            ([rows], 2) => array.reshape(&[*rows, 1]),
            _ => Ok(array),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{Func, Scalar};

    fn frame_wrapper() -> ArrayWrapper {
        ArrayWrapper::new(Index::new(["x", "y", "z"]), Index::new(["a", "b"]), 2).unwrap()
    }

    #[test]
    fn test_from_obj_series() {
        let series: Value = Series::new([1, 2, 3]).with_name("s").into();
        let wrapper = ArrayWrapper::from_obj(&series).unwrap();

        assert_eq!(wrapper.ndim(), 1);
        assert_eq!(wrapper.shape(), vec![3]);
        assert_eq!(wrapper.name(), Some(&Label::from("s")));
    }

    #[test]
    fn test_from_obj_unnamed_series() {
        let wrapper = ArrayWrapper::from_obj(&Series::new([1, 2]).into()).unwrap();
        assert_eq!(wrapper.name(), None);
    }

    #[test]
    fn test_from_obj_array() {
        let wrapper = ArrayWrapper::from_obj(&NdArray::zeros(&[4, 2]).into()).unwrap();
        assert_eq!(wrapper.shape(), vec![4, 2]);
        assert!(ArrayWrapper::from_obj(&NdArray::zeros(&[1, 1, 1]).into()).is_err());
    }

    #[test]
    fn test_wrap_frame() {
        let wrapper = frame_wrapper();
        let wrapped = wrapper.wrap(&NdArray::zeros(&[3, 2]).into()).unwrap();

        match wrapped {
            Value::Frame(frame) => {
                assert_eq!(frame.shape(), [3, 2]);
                assert!(frame.columns().equals(&Index::new(["a", "b"])));
            }
            other => panic!("expected a frame, got {:?}", other),
        }
    }

    #[test]
    fn test_wrap_shape_mismatch() {
        let wrapper = frame_wrapper();
        assert!(wrapper.wrap(&NdArray::zeros(&[2, 2]).into()).is_err());
        assert!(wrapper.wrap(&NdArray::zeros(&[3, 3]).into()).is_err());
        assert!(wrapper.wrap(&NdArray::zeros(&[3, 2, 1]).into()).is_err());
    }

    #[test]
    fn test_wrap_series_soft_broadcast() {
        let wrapper = ArrayWrapper::from_obj(&Series::new([1, 2, 3]).with_name("s").into()).unwrap();
        let wrapped = wrapper.wrap(&NdArray::zeros(&[3, 1]).into()).unwrap();

        match wrapped {
            Value::Series(series) => {
                assert_eq!(series.len(), 3);
                assert_eq!(series.name(), Some(&Label::from("s")));
            }
            other => panic!("expected a series, got {:?}", other),
        }
    }

    fn series_wrapper() -> ArrayWrapper {
        ArrayWrapper::from_obj(&Series::new([1, 2, 3]).with_name("s").into()).unwrap()
    }

    #[test]
    fn test_wrap_reduced_to_scalar() {
        let scalar = frame_wrapper().wrap_reduced(&NdArray::scalar(1.5).into(), None).unwrap();
        assert_eq!(scalar, Value::Scalar(Scalar::Float(1.5)));

        let single = series_wrapper().wrap_reduced(&NdArray::from_vec([7]).into(), None).unwrap();
        assert_eq!(single, Value::Scalar(Scalar::Int(7)));
    }

    #[test]
    fn test_wrap_reduced_missing_value() {
        let wrapper = ArrayWrapper::new(Index::new(["x"]), Index::new(["a"]), 2).unwrap();
        assert_eq!(wrapper.wrap_reduced(&Value::None, None).unwrap(), Value::None);

        let func: Value = Func::plain("f").into();
        assert_eq!(series_wrapper().wrap_reduced(&func, None).unwrap(), func);
    }

    #[test]
    fn test_wrap_reduced_empty() {
        let empty = NdArray::from_shape_vec(&[0], Vec::<Scalar>::new()).unwrap();
        let wrapped = series_wrapper().wrap_reduced(&empty.into(), None).unwrap();
        match wrapped {
            Value::Series(series) => assert!(series.is_empty()),
            other => panic!("expected a series, got {:?}", other),
        }
    }

    #[test]
    fn test_wrap_reduced_per_column_series() {
        let wrapped = frame_wrapper().wrap_reduced(&NdArray::from_vec([1, 2]).into(), None).unwrap();
        match wrapped {
            Value::Series(series) => {
                assert!(series.index().equals(&Index::new(["a", "b"])));
                assert_eq!(series.values().shape(), [2]);
                assert_eq!(series.name(), None);
            }
            other => panic!("expected a series, got {:?}", other),
        }
    }

    #[test]
    fn test_wrap_reduced_series_values() {
        let wrapper = series_wrapper();

        let default_index = wrapper.wrap_reduced(&NdArray::from_vec([4, 5]).into(), None).unwrap();
        match default_index {
            Value::Series(series) => {
                assert!(series.index().equals(&Index::range(2)));
                assert_eq!(series.name(), Some(&Label::from("s")));
            }
            other => panic!("expected a series, got {:?}", other),
        }

        let labelled = wrapper
            .wrap_reduced(&NdArray::from_vec([4, 5]).into(), Some(Index::new(["p", "q"])))
            .unwrap();
        match labelled {
            Value::Series(series) => {
                assert!(series.index().equals(&Index::new(["p", "q"])));
                assert_eq!(series.values().data(), [Scalar::Int(4), Scalar::Int(5)]);
            }
            other => panic!("expected a series, got {:?}", other),
        }
    }

    #[test]
    fn test_wrap_reduced_array_for_series() {
        let reduced = NdArray::from_shape_vec(&[2, 1], [8, 9]).unwrap();
        let wrapped = series_wrapper()
            .wrap_reduced(&reduced.into(), Some(Index::new(["lo", "hi"])))
            .unwrap();

        match wrapped {
            Value::Series(series) => {
                assert!(series.index().equals(&Index::new(["lo", "hi"])));
                assert_eq!(series.values().data(), [Scalar::Int(8), Scalar::Int(9)]);
                assert_eq!(series.name(), Some(&Label::from("s")));
            }
            other => panic!("expected a series, got {:?}", other),
        }
    }

    #[test]
    fn test_wrap_reduced_per_column_frame() {
        let wrapper = frame_wrapper();
        let reduced = NdArray::from_shape_vec(&[4, 2], [1, 2, 3, 4, 5, 6, 7, 8]).unwrap();

        let wrapped = wrapper.wrap_reduced(&reduced.clone().into(), None).unwrap();
        match wrapped {
            Value::Frame(frame) => {
                assert_eq!(frame.shape(), [4, 2]);
                assert!(frame.index().equals(&Index::range(4)));
                assert!(frame.columns().equals(&Index::new(["a", "b"])));
                assert_eq!(frame.column_data()[1].data(), [2, 4, 6, 8].map(Scalar::Int));
            }
            other => panic!("expected a frame, got {:?}", other),
        }

        let labelled = wrapper
            .wrap_reduced(&reduced.into(), Some(Index::new(["q1", "q2", "q3", "q4"])))
            .unwrap();
        match labelled {
            Value::Frame(frame) => assert!(frame.index().equals(&Index::new(["q1", "q2", "q3", "q4"]))),
            other => panic!("expected a frame, got {:?}", other),
        }

        let wrong_columns = NdArray::zeros(&[4, 3]);
        assert!(wrapper.wrap_reduced(&wrong_columns.into(), None).is_err());
    }

    #[test]
    fn test_equality() {
        assert_eq!(frame_wrapper(), frame_wrapper());
        let other = ArrayWrapper::new(Index::new(["x", "y", "z"]), Index::new(["a", "c"]), 2).unwrap();
        assert_ne!(frame_wrapper(), other);
    }
}
