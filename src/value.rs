//! Column values and conversions to and from Rust types.

use crate::error::{Error, Result};

/// A decoded column value or a bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }
}

fn mismatch<T>(expected: &str, value: &Value) -> Result<T> {
    Err(Error::Decode(format!(
        "cannot decode {} as {}",
        value.kind(),
        expected
    )))
}

/// Trait for decoding column values into Rust types.
pub trait FromValue<'a>: Sized {
    /// Decode from NULL value.
    ///
    /// Default implementation returns an error. Override for types that can
    /// represent NULL (like `Option<T>`).
    fn from_null() -> Result<Self> {
        Err(Error::Decode("unexpected NULL value".into()))
    }

    /// Decode from a non-NULL value.
    fn from_value(value: &'a Value) -> Result<Self>;
}

/// Decode a value, dispatching NULL to [`FromValue::from_null`].
pub fn decode<'a, T: FromValue<'a>>(value: &'a Value) -> Result<T> {
    match value {
        Value::Null => T::from_null(),
        other => T::from_value(other),
    }
}

impl<'a, T: FromValue<'a>> FromValue<'a> for Option<T> {
    fn from_null() -> Result<Self> {
        Ok(None)
    }

    fn from_value(value: &'a Value) -> Result<Self> {
        T::from_value(value).map(Some)
    }
}

impl<'a> FromValue<'a> for Value {
    fn from_null() -> Result<Self> {
        Ok(Value::Null)
    }

    fn from_value(value: &'a Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue<'_> for bool {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => mismatch("bool", other),
        }
    }
}

macro_rules! impl_from_value_int {
    ($($t:ty),+) => {
        $(
            impl FromValue<'_> for $t {
                fn from_value(value: &Value) -> Result<Self> {
                    match value {
                        Value::Int(n) => <$t>::try_from(*n).map_err(|_| {
                            Error::Decode(format!("{} out of range for {}", n, stringify!($t)))
                        }),
                        other => mismatch(stringify!($t), other),
                    }
                }
            }
        )+
    };
}

impl_from_value_int!(i16, i32, i64);

impl FromValue<'_> for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            other => mismatch("f64", other),
        }
    }
}

impl FromValue<'_> for f32 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(*f as f32),
            other => mismatch("f32", other),
        }
    }
}

impl<'a> FromValue<'a> for &'a str {
    fn from_value(value: &'a Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s.as_str()),
            other => mismatch("str", other),
        }
    }
}

impl FromValue<'_> for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => mismatch("String", other),
        }
    }
}

impl<'a> FromValue<'a> for &'a [u8] {
    fn from_value(value: &'a Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b.as_slice()),
            Value::Text(s) => Ok(s.as_bytes()),
            other => mismatch("bytes", other),
        }
    }
}

impl FromValue<'_> for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self> {
        <&[u8]>::from_value(value).map(<[u8]>::to_vec)
    }
}

/// Trait for encoding Rust values as bound parameters.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! impl_to_value_int {
    ($($t:ty),+) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }
            }
        )+
    };
}

impl_to_value_int!(i8, i16, i32, i64, u8, u16, u32);

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for [u8] {
    fn to_value(&self) -> Value {
        Value::Bytes(self.to_vec())
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

/// Trait for encoding a parameter list.
pub trait ToParams {
    /// Number of parameters.
    fn param_count(&self) -> usize;

    /// Encode all parameters in positional order.
    fn to_params(&self) -> Vec<Value>;
}

impl ToParams for () {
    fn param_count(&self) -> usize {
        0
    }

    fn to_params(&self) -> Vec<Value> {
        Vec::new()
    }
}

impl ToParams for [Value] {
    fn param_count(&self) -> usize {
        self.len()
    }

    fn to_params(&self) -> Vec<Value> {
        self.to_vec()
    }
}

impl ToParams for Vec<Value> {
    fn param_count(&self) -> usize {
        self.len()
    }

    fn to_params(&self) -> Vec<Value> {
        self.clone()
    }
}

impl<P: ToParams + ?Sized> ToParams for &P {
    fn param_count(&self) -> usize {
        (**self).param_count()
    }

    fn to_params(&self) -> Vec<Value> {
        (**self).to_params()
    }
}

macro_rules! impl_to_params_tuple {
    ($count:literal: $($idx:tt => $T:ident),+) => {
        impl<$($T: ToValue),+> ToParams for ($($T,)+) {
            fn param_count(&self) -> usize {
                $count
            }

            fn to_params(&self) -> Vec<Value> {
                vec![$(self.$idx.to_value()),+]
            }
        }
    };
}

impl_to_params_tuple!(1: 0 => T1);
impl_to_params_tuple!(2: 0 => T1, 1 => T2);
impl_to_params_tuple!(3: 0 => T1, 1 => T2, 2 => T3);
impl_to_params_tuple!(4: 0 => T1, 1 => T2, 2 => T3, 3 => T4);
impl_to_params_tuple!(5: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5);
impl_to_params_tuple!(6: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6);
impl_to_params_tuple!(7: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6, 6 => T7);
impl_to_params_tuple!(8: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6, 6 => T7, 7 => T8);
impl_to_params_tuple!(9: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6, 6 => T7, 7 => T8, 8 => T9);
impl_to_params_tuple!(10: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6, 6 => T7, 7 => T8, 8 => T9, 9 => T10);
impl_to_params_tuple!(11: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6, 6 => T7, 7 => T8, 8 => T9, 9 => T10, 10 => T11);
impl_to_params_tuple!(12: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6, 6 => T7, 7 => T8, 8 => T9, 9 => T10, 10 => T11, 11 => T12);
