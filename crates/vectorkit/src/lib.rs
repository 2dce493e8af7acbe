//! # vectorkit
//!
//! Utility layer for array and tabular data.
//!
//! ## Modules
//! - **config**: Nested key-value container that can be frozen against new keys
//! - **array**: Array, series, frame and index value model
//! - **checks**: Predicates and assertions over shape, dtype and labels
//! - **wrapper**: Wrap raw arrays back into labelled values

#![warn(missing_docs)]

pub mod array;
pub mod checks;
pub mod config;
mod error;
pub mod wrapper;

pub use array::{DType, DataFrame, Func, Index, Label, NdArray, Scalar, Series, Value, ValueType};
pub use config::{merge_kwargs, Config, ConfigValue, Kwargs, NestedMut};
pub use error::{Error, Result};
pub use wrapper::ArrayWrapper;
