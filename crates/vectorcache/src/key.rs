//! Cache keys for method arguments
//!
//! [`CacheArgs::arg_key`] returns `None` for arguments that cannot serve as
//! a key (arrays, frames, ...). Such calls are computed without touching the
//! cache.

use vectorkit::checks::is_hashable;
use vectorkit::{Scalar, Value};

/// Hashable representation of a call's arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgKey {
    /// No arguments or a missing value
    Unit,
    /// Absent optional argument
    None,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
    /// Float bit pattern, with `-0.0` folded into `0.0`
    Float(u64),
    /// String
    Str(String),
    /// Callable, by name
    Func(String),
    /// Ordered group of keys
    Seq(Vec<ArgKey>),
}

impl ArgKey {
    fn float(v: f64) -> Self {
        let v = if v == 0.0 { 0.0 } else { v };
        ArgKey::Float(v.to_bits())
    }
}

/// Arguments that may be used as a cache key
pub trait CacheArgs {
    /// Key for these arguments, or `None` if they are not cacheable
    fn arg_key(&self) -> Option<ArgKey>;
}

impl CacheArgs for () {
    fn arg_key(&self) -> Option<ArgKey> {
        Some(ArgKey::Unit)
    }
}

impl CacheArgs for bool {
    fn arg_key(&self) -> Option<ArgKey> {
        Some(ArgKey::Bool(*self))
    }
}

macro_rules! int_args {
    ($variant:ident as $target:ty: $($ty:ty),*) => {
        $(impl CacheArgs for $ty {
            fn arg_key(&self) -> Option<ArgKey> {
                Some(ArgKey::$variant(*self as $target))
            }
        })*
    };
}

int_args!(Int as i64: i8, i16, i32, i64, isize);
int_args!(UInt as u64: u8, u16, u32, u64, usize);

impl CacheArgs for f32 {
    fn arg_key(&self) -> Option<ArgKey> {
        Some(ArgKey::float(f64::from(*self)))
    }
}

impl CacheArgs for f64 {
    fn arg_key(&self) -> Option<ArgKey> {
        Some(ArgKey::float(*self))
    }
}

impl CacheArgs for str {
    fn arg_key(&self) -> Option<ArgKey> {
        Some(ArgKey::Str(self.to_string()))
    }
}

impl CacheArgs for String {
    fn arg_key(&self) -> Option<ArgKey> {
        self.as_str().arg_key()
    }
}

impl<T: CacheArgs + ?Sized> CacheArgs for &T {
    fn arg_key(&self) -> Option<ArgKey> {
        (**self).arg_key()
    }
}

impl<T: CacheArgs> CacheArgs for Option<T> {
    fn arg_key(&self) -> Option<ArgKey> {
        match self {
            Some(inner) => Some(ArgKey::Seq(vec![inner.arg_key()?])),
            None => Some(ArgKey::None),
        }
    }
}

impl<T: CacheArgs> CacheArgs for [T] {
    fn arg_key(&self) -> Option<ArgKey> {
        self.iter()
            .map(CacheArgs::arg_key)
            .collect::<Option<Vec<_>>>()
            .map(ArgKey::Seq)
    }
}

impl<T: CacheArgs> CacheArgs for Vec<T> {
    fn arg_key(&self) -> Option<ArgKey> {
        self.as_slice().arg_key()
    }
}

macro_rules! tuple_args {
    ($($ty:ident $var:ident),+) => {
        impl<$($ty: CacheArgs),+> CacheArgs for ($($ty,)+) {
            fn arg_key(&self) -> Option<ArgKey> {
                let ($($var,)+) = self;
                Some(ArgKey::Seq(vec![$($var.arg_key()?),+]))
            }
        }
    };
}

tuple_args!(A a);
tuple_args!(A a, B b);
tuple_args!(A a, B b, C c);
tuple_args!(A a, B b, C c, D d);

impl CacheArgs for Scalar {
    fn arg_key(&self) -> Option<ArgKey> {
        match self {
            Scalar::Bool(v) => v.arg_key(),
            Scalar::Int(v) => v.arg_key(),
            Scalar::Float(v) => v.arg_key(),
            Scalar::Str(v) => v.arg_key(),
        }
    }
}

impl CacheArgs for Value {
    fn arg_key(&self) -> Option<ArgKey> {
        if !is_hashable(self) {
            return None;
        }
        match self {
            Value::None => Some(ArgKey::Unit),
            Value::Scalar(scalar) => scalar.arg_key(),
            Value::Func(func) => Some(ArgKey::Func(func.name().to_string())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vectorkit::NdArray;

    #[test]
    fn test_scalar_keys() {
        assert_eq!(10i32.arg_key(), 10i64.arg_key());
        assert_eq!(0.0f64.arg_key(), (-0.0f64).arg_key());
        assert_ne!(1.0f64.arg_key(), 1i64.arg_key());
        assert_eq!("a".arg_key(), Some(ArgKey::Str("a".to_string())));
    }

    #[test]
    fn test_tuple_keys() {
        let key = (1, "x", true).arg_key().unwrap();
        assert_eq!(
            key,
            ArgKey::Seq(vec![ArgKey::Int(1), ArgKey::Str("x".into()), ArgKey::Bool(true)])
        );
        assert_ne!((1, 2).arg_key(), (2, 1).arg_key());
    }

    #[test]
    fn test_value_keys() {
        assert!(Value::from(2).arg_key().is_some());
        assert!(Value::None.arg_key().is_some());
        assert!(Value::from(NdArray::zeros(&[1])).arg_key().is_none());
        assert!(Value::list([1, 2]).arg_key().is_none());
    }

    #[test]
    fn test_option_keys() {
        let none: Option<Option<i64>> = None;
        let some_none: Option<Option<i64>> = Some(None);
        assert_ne!(none.arg_key(), some_none.arg_key());
        assert_ne!(Some(Some(1i64)).arg_key(), Some(1i64).arg_key());
        assert_ne!(Some(Value::None).arg_key(), None::<Value>.arg_key());
        assert_eq!(Some(3i64).arg_key(), Some(3i32).arg_key());
    }

    #[test]
    fn test_uncacheable_member_poisons_group() {
        let array = Value::from(NdArray::zeros(&[1]));
        assert!((1, array.clone()).arg_key().is_none());
        assert!(vec![Value::from(1), array].arg_key().is_none());
        assert!(Some(Value::from(1)).arg_key().is_some());
    }
}
