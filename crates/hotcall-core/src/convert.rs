//! Conversion traits between Rust values and tagged values.
//!
//! - [`FromValue`]: extract a Rust value from a [`TaggedValue`]
//! - [`IntoValue`]: encode a Rust value as a [`TaggedValue`]
//!
//! Integer extraction bounds-checks narrowing conversions; `u64` round-trips
//! through bit reinterpretation so the full range survives the widened
//! `i64` storage.

use glam::{Vec2, Vec3};

use crate::error::ConversionError;
use crate::handle::Handle;
use crate::value::{TaggedValue, ValueMap};

/// Extract a value from a tagged value.
pub trait FromValue: Sized {
    /// Returns a `ConversionError` if the value holds an incompatible kind.
    fn from_value(value: &TaggedValue) -> Result<Self, ConversionError>;
}

/// Encode a value as a tagged value.
pub trait IntoValue {
    fn into_value(self) -> TaggedValue;
}

macro_rules! impl_narrowing_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &TaggedValue) -> Result<Self, ConversionError> {
                    let v = value.as_int()?;
                    if v >= Self::MIN as i64 && v <= Self::MAX as i64 {
                        Ok(v as Self)
                    } else {
                        Err(ConversionError::IntegerOverflow {
                            value: v,
                            target: stringify!($ty),
                        })
                    }
                }
            }

            impl IntoValue for $ty {
                fn into_value(self) -> TaggedValue {
                    TaggedValue::Int(self as i64)
                }
            }
        )*
    };
}

impl_narrowing_int!(i8, i16, i32, u8, u16, u32);

impl FromValue for i64 {
    fn from_value(value: &TaggedValue) -> Result<Self, ConversionError> {
        value.as_int()
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> TaggedValue {
        TaggedValue::Int(self)
    }
}

// u64 reinterprets bits so the full range survives i64 storage.
impl FromValue for u64 {
    fn from_value(value: &TaggedValue) -> Result<Self, ConversionError> {
        Ok(value.as_int()? as u64)
    }
}

impl IntoValue for u64 {
    fn into_value(self) -> TaggedValue {
        TaggedValue::Int(self as i64)
    }
}

impl FromValue for f32 {
    fn from_value(value: &TaggedValue) -> Result<Self, ConversionError> {
        Ok(value.as_float()? as f32)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> TaggedValue {
        TaggedValue::Float(self as f64)
    }
}

impl FromValue for f64 {
    fn from_value(value: &TaggedValue) -> Result<Self, ConversionError> {
        value.as_float()
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> TaggedValue {
        TaggedValue::Float(self)
    }
}

impl FromValue for bool {
    fn from_value(value: &TaggedValue) -> Result<Self, ConversionError> {
        value.as_bool()
    }
}

impl IntoValue for bool {
    fn into_value(self) -> TaggedValue {
        TaggedValue::Bool(self)
    }
}

impl FromValue for String {
    fn from_value(value: &TaggedValue) -> Result<Self, ConversionError> {
        value.as_str().map(str::to_owned)
    }
}

impl IntoValue for String {
    fn into_value(self) -> TaggedValue {
        TaggedValue::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> TaggedValue {
        TaggedValue::String(self.to_owned())
    }
}

impl FromValue for Vec2 {
    fn from_value(value: &TaggedValue) -> Result<Self, ConversionError> {
        value.as_vector2()
    }
}

impl IntoValue for Vec2 {
    fn into_value(self) -> TaggedValue {
        TaggedValue::Vector2(self)
    }
}

impl FromValue for Vec3 {
    fn from_value(value: &TaggedValue) -> Result<Self, ConversionError> {
        value.as_vector3()
    }
}

impl IntoValue for Vec3 {
    fn into_value(self) -> TaggedValue {
        TaggedValue::Vector3(self)
    }
}

impl FromValue for Handle {
    fn from_value(value: &TaggedValue) -> Result<Self, ConversionError> {
        value.as_handle()
    }
}

impl IntoValue for Handle {
    fn into_value(self) -> TaggedValue {
        TaggedValue::Handle(self)
    }
}

impl FromValue for () {
    fn from_value(value: &TaggedValue) -> Result<Self, ConversionError> {
        match value {
            TaggedValue::Nil => Ok(()),
            other => Err(ConversionError::TypeMismatch {
                expected: "nil",
                actual: other.type_name(),
            }),
        }
    }
}

impl IntoValue for () {
    fn into_value(self) -> TaggedValue {
        TaggedValue::Nil
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> TaggedValue {
        TaggedValue::Sequence(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &TaggedValue) -> Result<Self, ConversionError> {
        value.as_sequence()?.iter().map(T::from_value).collect()
    }
}

impl IntoValue for ValueMap {
    fn into_value(self) -> TaggedValue {
        TaggedValue::Mapping(Box::new(self))
    }
}

impl FromValue for ValueMap {
    fn from_value(value: &TaggedValue) -> Result<Self, ConversionError> {
        value.as_mapping().cloned()
    }
}

impl IntoValue for TaggedValue {
    fn into_value(self) -> TaggedValue {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_bounds_are_checked() {
        assert_eq!(i8::from_value(&TaggedValue::Int(127)).unwrap(), 127i8);
        assert!(i8::from_value(&TaggedValue::Int(128)).is_err());
        assert!(i8::from_value(&TaggedValue::Int(-129)).is_err());
        assert_eq!(u16::from_value(&TaggedValue::Int(65535)).unwrap(), 65535);
        assert!(u16::from_value(&TaggedValue::Int(-1)).is_err());
        assert!(u32::from_value(&TaggedValue::Int(1 << 40)).is_err());
    }

    #[test]
    fn u64_full_range_roundtrip() {
        let v = u64::MAX.into_value();
        assert!(matches!(v, TaggedValue::Int(-1)));
        assert_eq!(u64::from_value(&v).unwrap(), u64::MAX);
    }

    #[test]
    fn roundtrip_every_kind() {
        assert_eq!(bool::from_value(&true.into_value()).unwrap(), true);
        assert_eq!(i64::from_value(&(-7i64).into_value()).unwrap(), -7);
        assert_eq!(f64::from_value(&2.5f64.into_value()).unwrap(), 2.5);
        assert_eq!(
            Vec2::from_value(&Vec2::new(1.0, 2.0).into_value()).unwrap(),
            Vec2::new(1.0, 2.0)
        );
        assert_eq!(
            Vec3::from_value(&Vec3::new(1.0, 2.0, 3.0).into_value()).unwrap(),
            Vec3::new(1.0, 2.0, 3.0)
        );
        assert_eq!(
            String::from_value(&"ray".into_value()).unwrap(),
            "ray".to_string()
        );
        let h = Handle::new(4, 2);
        assert_eq!(Handle::from_value(&h.into_value()).unwrap(), h);
        assert_eq!(<()>::from_value(&().into_value()).unwrap(), ());
        let seq = vec![1i64, 2, 3];
        assert_eq!(Vec::<i64>::from_value(&seq.clone().into_value()).unwrap(), seq);
    }

    #[test]
    fn kind_mismatch_reports_names() {
        let err = bool::from_value(&TaggedValue::Float(1.0)).unwrap_err();
        assert_eq!(
            err,
            ConversionError::TypeMismatch {
                expected: "bool",
                actual: "float",
            }
        );
    }

    #[test]
    fn float_extraction_widens_ints() {
        assert_eq!(f32::from_value(&TaggedValue::Int(2)).unwrap(), 2.0f32);
        assert_eq!(f64::from_value(&TaggedValue::Int(2)).unwrap(), 2.0f64);
    }
}
