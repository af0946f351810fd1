//! Attribute values.
//!
//! [`Value`] is a closed tagged union over the supported scalar kinds and
//! their arrays. [`ScalarType`] names the element kind without carrying
//! data; together with an array flag it describes a value's shape.

use glam::{DMat4, DVec3, Vec3};
use half::f16;
use std::fmt;

/// Element kind of a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarType {
    Bool,
    Int,
    Int64,
    Half,
    Float,
    Double,
    String,
    Token,
    Asset,
    Float3,
    Double3,
    Matrix4d,
}

impl ScalarType {
    /// All scalar kinds, in declaration order.
    pub const ALL: [ScalarType; 12] = [
        Self::Bool,
        Self::Int,
        Self::Int64,
        Self::Half,
        Self::Float,
        Self::Double,
        Self::String,
        Self::Token,
        Self::Asset,
        Self::Float3,
        Self::Double3,
        Self::Matrix4d,
    ];

    /// Type name as used by the value type catalog (e.g. "Int").
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Int64 => "Int64",
            Self::Half => "Half",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::Token => "Token",
            Self::Asset => "Asset",
            Self::Float3 => "Float3",
            Self::Double3 => "Double3",
            Self::Matrix4d => "Matrix4d",
        }
    }

    /// Type name as written in scene description text (e.g. "int").
    pub const fn scene_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int64 => "int64",
            Self::Half => "half",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Token => "token",
            Self::Asset => "asset",
            Self::Float3 => "float3",
            Self::Double3 => "double3",
            Self::Matrix4d => "matrix4d",
        }
    }

    /// Returns true for kinds that support linear interpolation.
    pub const fn is_interpolatable(self) -> bool {
        matches!(
            self,
            Self::Half | Self::Float | Self::Double | Self::Float3 | Self::Double3
        )
    }

    /// The zero/empty value of this kind.
    pub fn zero_value(self, array: bool) -> Value {
        if array {
            return match self {
                Self::Bool => Value::BoolArray(Vec::new()),
                Self::Int => Value::IntArray(Vec::new()),
                Self::Int64 => Value::Int64Array(Vec::new()),
                Self::Half => Value::HalfArray(Vec::new()),
                Self::Float => Value::FloatArray(Vec::new()),
                Self::Double => Value::DoubleArray(Vec::new()),
                Self::String => Value::StringArray(Vec::new()),
                Self::Token => Value::TokenArray(Vec::new()),
                Self::Asset => Value::AssetArray(Vec::new()),
                Self::Float3 => Value::Float3Array(Vec::new()),
                Self::Double3 => Value::Double3Array(Vec::new()),
                Self::Matrix4d => Value::Matrix4dArray(Vec::new()),
            };
        }
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Int64 => Value::Int64(0),
            Self::Half => Value::Half(f16::ZERO),
            Self::Float => Value::Float(0.0),
            Self::Double => Value::Double(0.0),
            Self::String => Value::String(String::new()),
            Self::Token => Value::Token(String::new()),
            Self::Asset => Value::Asset(AssetPath::default()),
            Self::Float3 => Value::Float3(Vec3::ZERO),
            Self::Double3 => Value::Double3(DVec3::ZERO),
            Self::Matrix4d => Value::Matrix4d(DMat4::IDENTITY),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reference to an external asset (texture, sublayer, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AssetPath(String);

impl AssetPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}@", self.0)
    }
}

/// A typed attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Int64(i64),
    Half(f16),
    Float(f32),
    Double(f64),
    String(String),
    Token(String),
    Asset(AssetPath),
    Float3(Vec3),
    Double3(DVec3),
    Matrix4d(DMat4),

    BoolArray(Vec<bool>),
    IntArray(Vec<i32>),
    Int64Array(Vec<i64>),
    HalfArray(Vec<f16>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
    TokenArray(Vec<String>),
    AssetArray(Vec<AssetPath>),
    Float3Array(Vec<Vec3>),
    Double3Array(Vec<DVec3>),
    Matrix4dArray(Vec<DMat4>),
}

impl Value {
    /// Create a token value.
    pub fn token(s: impl Into<String>) -> Self {
        Self::Token(s.into())
    }

    /// Create a token array value.
    pub fn token_array<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::TokenArray(tokens.into_iter().map(Into::into).collect())
    }

    /// Create an asset path value.
    pub fn asset(path: impl Into<String>) -> Self {
        Self::Asset(AssetPath::new(path))
    }

    /// Element kind of this value.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Self::Bool(_) | Self::BoolArray(_) => ScalarType::Bool,
            Self::Int(_) | Self::IntArray(_) => ScalarType::Int,
            Self::Int64(_) | Self::Int64Array(_) => ScalarType::Int64,
            Self::Half(_) | Self::HalfArray(_) => ScalarType::Half,
            Self::Float(_) | Self::FloatArray(_) => ScalarType::Float,
            Self::Double(_) | Self::DoubleArray(_) => ScalarType::Double,
            Self::String(_) | Self::StringArray(_) => ScalarType::String,
            Self::Token(_) | Self::TokenArray(_) => ScalarType::Token,
            Self::Asset(_) | Self::AssetArray(_) => ScalarType::Asset,
            Self::Float3(_) | Self::Float3Array(_) => ScalarType::Float3,
            Self::Double3(_) | Self::Double3Array(_) => ScalarType::Double3,
            Self::Matrix4d(_) | Self::Matrix4dArray(_) => ScalarType::Matrix4d,
        }
    }

    /// Returns true for array values.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            Self::BoolArray(_)
                | Self::IntArray(_)
                | Self::Int64Array(_)
                | Self::HalfArray(_)
                | Self::FloatArray(_)
                | Self::DoubleArray(_)
                | Self::StringArray(_)
                | Self::TokenArray(_)
                | Self::AssetArray(_)
                | Self::Float3Array(_)
                | Self::Double3Array(_)
                | Self::Matrix4dArray(_)
        )
    }

    /// Number of elements (1 for scalars).
    pub fn len(&self) -> usize {
        match self {
            Self::BoolArray(v) => v.len(),
            Self::IntArray(v) => v.len(),
            Self::Int64Array(v) => v.len(),
            Self::HalfArray(v) => v.len(),
            Self::FloatArray(v) => v.len(),
            Self::DoubleArray(v) => v.len(),
            Self::StringArray(v) => v.len(),
            Self::TokenArray(v) => v.len(),
            Self::AssetArray(v) => v.len(),
            Self::Float3Array(v) => v.len(),
            Self::Double3Array(v) => v.len(),
            Self::Matrix4dArray(v) => v.len(),
            _ => 1,
        }
    }

    /// Returns true for empty arrays.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extract a typed copy of the value.
    pub fn get<T: FromValue>(&self) -> Option<T> {
        T::from_value(self)
    }

    /// Token contents, for `Token` values.
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Self::Token(s) => Some(s),
            _ => None,
        }
    }

    /// Token array contents, for `TokenArray` values.
    pub fn as_token_array(&self) -> Option<&[String]> {
        match self {
            Self::TokenArray(v) => Some(v),
            _ => None,
        }
    }

    /// Linearly interpolate towards `other` by `alpha` in `[0, 1]`.
    ///
    /// Returns `None` when the kinds differ, the kind is not interpolatable,
    /// or array lengths differ.
    pub fn lerp(&self, other: &Value, alpha: f64) -> Option<Value> {
        fn mix(a: f64, b: f64, t: f64) -> f64 {
            a + (b - a) * t
        }
        fn zip_lerp<T: Copy>(a: &[T], b: &[T], f: impl Fn(T, T) -> T) -> Option<Vec<T>> {
            if a.len() != b.len() {
                return None;
            }
            Some(a.iter().zip(b).map(|(x, y)| f(*x, *y)).collect())
        }

        let t32 = alpha as f32;
        match (self, other) {
            (Self::Half(a), Self::Half(b)) => Some(Self::Half(f16::from_f64(mix(
                a.to_f64(),
                b.to_f64(),
                alpha,
            )))),
            (Self::Float(a), Self::Float(b)) => Some(Self::Float(a + (b - a) * t32)),
            (Self::Double(a), Self::Double(b)) => Some(Self::Double(mix(*a, *b, alpha))),
            (Self::Float3(a), Self::Float3(b)) => Some(Self::Float3(a.lerp(*b, t32))),
            (Self::Double3(a), Self::Double3(b)) => Some(Self::Double3(a.lerp(*b, alpha))),
            (Self::HalfArray(a), Self::HalfArray(b)) => zip_lerp(a, b, |x, y| {
                f16::from_f64(mix(x.to_f64(), y.to_f64(), alpha))
            })
            .map(Self::HalfArray),
            (Self::FloatArray(a), Self::FloatArray(b)) => {
                zip_lerp(a, b, |x, y| x + (y - x) * t32).map(Self::FloatArray)
            }
            (Self::DoubleArray(a), Self::DoubleArray(b)) => {
                zip_lerp(a, b, |x, y| mix(x, y, alpha)).map(Self::DoubleArray)
            }
            (Self::Float3Array(a), Self::Float3Array(b)) => {
                zip_lerp(a, b, |x, y| x.lerp(y, t32)).map(Self::Float3Array)
            }
            (Self::Double3Array(a), Self::Double3Array(b)) => {
                zip_lerp(a, b, |x, y| x.lerp(y, alpha)).map(Self::Double3Array)
            }
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// Typed extraction from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_value_conversions {
    ($ty:ty, $scalar:ident, $array:ident) => {
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::$scalar(v)
            }
        }

        impl From<Vec<$ty>> for Value {
            fn from(v: Vec<$ty>) -> Self {
                Self::$array(v)
            }
        }

        impl FromValue for $ty {
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$scalar(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl FromValue for Vec<$ty> {
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$array(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_value_conversions!(bool, Bool, BoolArray);
impl_value_conversions!(i32, Int, IntArray);
impl_value_conversions!(i64, Int64, Int64Array);
impl_value_conversions!(f16, Half, HalfArray);
impl_value_conversions!(f32, Float, FloatArray);
impl_value_conversions!(f64, Double, DoubleArray);
impl_value_conversions!(String, String, StringArray);
impl_value_conversions!(AssetPath, Asset, AssetArray);
impl_value_conversions!(Vec3, Float3, Float3Array);
impl_value_conversions!(DVec3, Double3, Double3Array);
impl_value_conversions!(DMat4, Matrix4d, Matrix4dArray);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape() {
        assert_eq!(Value::Int(3).scalar_type(), ScalarType::Int);
        assert!(!Value::Int(3).is_array());
        assert!(Value::from(vec![1i32, 2]).is_array());
        assert_eq!(Value::from(vec![1i32, 2]).len(), 2);
        assert_eq!(Value::token("a").scalar_type(), ScalarType::Token);
        assert_eq!(Value::from("a").scalar_type(), ScalarType::String);
    }

    #[test]
    fn test_typed_get() {
        assert_eq!(Value::from(7i32).get::<i32>(), Some(7));
        assert_eq!(Value::from(7i32).get::<f32>(), None);
        assert_eq!(
            Value::from(DVec3::new(1.0, 2.0, 3.0)).get::<DVec3>(),
            Some(DVec3::new(1.0, 2.0, 3.0))
        );
        assert_eq!(Value::token("x").as_token(), Some("x"));
        assert_eq!(Value::from("x").as_token(), None);
    }

    #[test]
    fn test_zero_values_match_kind() {
        for scalar in ScalarType::ALL {
            for array in [false, true] {
                let v = scalar.zero_value(array);
                assert_eq!(v.scalar_type(), scalar);
                assert_eq!(v.is_array(), array);
            }
        }
    }

    #[test]
    fn test_lerp() {
        let a = Value::Double(0.0);
        let b = Value::Double(10.0);
        assert_eq!(a.lerp(&b, 0.25), Some(Value::Double(2.5)));

        let a = Value::from(vec![0.0f32, 2.0]);
        let b = Value::from(vec![4.0f32, 2.0]);
        assert_eq!(a.lerp(&b, 0.5), Some(Value::from(vec![2.0f32, 2.0])));

        // Mismatched lengths and non-interpolatable kinds
        assert_eq!(a.lerp(&Value::from(vec![1.0f32]), 0.5), None);
        assert_eq!(Value::Int(0).lerp(&Value::Int(10), 0.5), None);
    }
}
