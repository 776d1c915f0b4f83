//! Type-directed conversion from untyped blueprint values.
//!
//! The target type decides how a [`Value`] is read:
//!
//! | Target | Accepted value |
//! |---|---|
//! | integers | whole numbers within the type's range (`3` or `3.0`) |
//! | `f32`, `f64` | any number |
//! | `bool`, `String` | booleans, strings |
//! | `Vec2` | a two-element numeric array `[x, y]` |
//! | `Option<T>` | `null`, or whatever `T` accepts |
//! | `Vec<T>` | an array whose elements `T` accepts |
//! | anything else | serde deserialization, opted into with [`impl_structural_property!`] |
//!
//! Nothing is coerced across kinds: `"3"` is not an integer and `1` is not a
//! boolean.

use serde_json::Value;

use crate::error::ConversionError;
use crate::math::Vec2;

/// Conversion from a blueprint property value.
pub trait FromProperty: Sized {
    fn from_property(value: &Value) -> Result<Self, ConversionError>;
}

/// Short description of a value for error messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(items) => format!("array of {}", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}

fn mismatch(expected: &'static str, value: &Value) -> ConversionError {
    ConversionError::Mismatch {
        expected,
        found: describe(value),
    }
}

/// Read a whole number as `i128` so every primitive integer range fits.
fn whole_number(expected: &'static str, value: &Value) -> Result<i128, ConversionError> {
    let Value::Number(n) = value else {
        return Err(mismatch(expected, value));
    };
    if let Some(i) = n.as_i64() {
        return Ok(i128::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(i128::from(u));
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e38 => Ok(f as i128),
        _ => Err(mismatch(expected, value)),
    }
}

macro_rules! impl_integer_property {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromProperty for $ty {
                fn from_property(value: &Value) -> Result<Self, ConversionError> {
                    let wide = whole_number(stringify!($ty), value)?;
                    <$ty>::try_from(wide).map_err(|_| ConversionError::OutOfRange {
                        expected: stringify!($ty),
                        value: wide.to_string(),
                    })
                }
            }
        )*
    };
}

impl_integer_property!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromProperty for f64 {
    fn from_property(value: &Value) -> Result<Self, ConversionError> {
        value.as_f64().ok_or_else(|| mismatch("f64", value))
    }
}

impl FromProperty for f32 {
    fn from_property(value: &Value) -> Result<Self, ConversionError> {
        value.as_f64().map(|f| f as f32).ok_or_else(|| mismatch("f32", value))
    }
}

impl FromProperty for bool {
    fn from_property(value: &Value) -> Result<Self, ConversionError> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl FromProperty for String {
    fn from_property(value: &Value) -> Result<Self, ConversionError> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| mismatch("string", value))
    }
}

impl FromProperty for Vec2 {
    fn from_property(value: &Value) -> Result<Self, ConversionError> {
        match value.as_array().map(Vec::as_slice) {
            Some([x, y]) => match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => Ok(Vec2::new(x as f32, y as f32)),
                _ => Err(mismatch("[x, y] of numbers", value)),
            },
            _ => Err(mismatch("[x, y]", value)),
        }
    }
}

impl<T: FromProperty> FromProperty for Option<T> {
    fn from_property(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_property(other).map(Some),
        }
    }
}

impl<T: FromProperty> FromProperty for Vec<T> {
    fn from_property(value: &Value) -> Result<Self, ConversionError> {
        let Value::Array(items) = value else {
            return Err(mismatch("array", value));
        };
        items.iter().map(T::from_property).collect()
    }
}

/// Implement [`FromProperty`] through serde for types that derive
/// `Deserialize`.
///
/// ```ignore
/// #[derive(Deserialize)]
/// enum Team { Red, Blue }
/// cairn::impl_structural_property!(Team);
/// ```
#[macro_export]
macro_rules! impl_structural_property {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::blueprint::FromProperty for $ty {
                fn from_property(
                    value: &$crate::__private::serde_json::Value,
                ) -> ::std::result::Result<Self, $crate::error::ConversionError> {
                    $crate::__private::serde_json::from_value(value.clone())
                        .map_err($crate::error::ConversionError::from)
                }
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(rename_all = "snake_case")]
    enum Team {
        Red,
        Blue,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Loot {
        item: String,
        count: u32,
    }

    crate::impl_structural_property!(Team, Loot);

    #[test]
    fn integers_are_strict() {
        assert_eq!(i32::from_property(&json!(-7)).unwrap(), -7);
        assert_eq!(u8::from_property(&json!(3.0)).unwrap(), 3);
        assert!(matches!(i32::from_property(&json!(3.5)), Err(ConversionError::Mismatch { .. })));
        assert!(matches!(i32::from_property(&json!("3")), Err(ConversionError::Mismatch { .. })));
        assert!(matches!(u8::from_property(&json!(300)), Err(ConversionError::OutOfRange { .. })));
        assert!(matches!(u32::from_property(&json!(-1)), Err(ConversionError::OutOfRange { .. })));
    }

    #[test]
    fn floats_bools_strings() {
        assert_eq!(f32::from_property(&json!(2)).unwrap(), 2.0);
        assert_eq!(f64::from_property(&json!(0.25)).unwrap(), 0.25);
        assert!(bool::from_property(&json!(true)).unwrap());
        assert!(bool::from_property(&json!(1)).is_err());
        assert_eq!(String::from_property(&json!("ore")).unwrap(), "ore");
        assert!(String::from_property(&json!(null)).is_err());
    }

    #[test]
    fn vec2_needs_two_numbers() {
        assert_eq!(Vec2::from_property(&json!([1, 0.5])).unwrap(), Vec2::new(1.0, 0.5));
        assert!(Vec2::from_property(&json!([1, 2, 3])).is_err());
        assert!(Vec2::from_property(&json!([1, "y"])).is_err());
        assert!(Vec2::from_property(&json!({ "x": 1, "y": 2 })).is_err());
    }

    #[test]
    fn options_and_lists() {
        assert_eq!(Option::<u32>::from_property(&json!(null)).unwrap(), None);
        assert_eq!(Option::<u32>::from_property(&json!(4)).unwrap(), Some(4));
        assert_eq!(
            Vec::<Vec2>::from_property(&json!([[0, 0], [1, 1]])).unwrap(),
            vec![Vec2::ZERO, Vec2::ONE]
        );
        assert!(Vec::<u32>::from_property(&json!([1, "two"])).is_err());
    }

    #[test]
    fn structural_fallback() {
        assert_eq!(Team::from_property(&json!("blue")).unwrap(), Team::Blue);
        assert_eq!(
            Loot::from_property(&json!({ "item": "gold", "count": 2 })).unwrap(),
            Loot {
                item: "gold".into(),
                count: 2
            }
        );
        let err = Team::from_property(&json!("green"));
        assert!(matches!(err, Err(ConversionError::Structural(_))));
        assert_ne!(Team::from_property(&json!("red")).unwrap(), Team::Blue);
    }

    #[test]
    fn descriptions() {
        assert_eq!(describe(&json!("a")), "string \"a\"");
        assert_eq!(describe(&json!([1, 2])), "array of 2");
        assert_eq!(describe(&json!(null)), "null");
    }
}
