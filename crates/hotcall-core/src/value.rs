//! Dynamically-typed boundary value.
//!
//! [`TaggedValue`] is the fixed-size tagged union used wherever the caller's
//! language has no static struct concept. Variable-length kinds (string,
//! sequence, mapping) own out-of-line storage released on drop; everything
//! else is stored inline. The discriminant always matches the payload:
//! decoding with the wrong kind fails with a type-mismatch error, never
//! reinterprets memory.
//!
//! Tagged values are confined to the compatibility boundary. The fast path
//! never constructs one.

use std::fmt;
use std::hash::{Hash, Hasher};

use glam::{Vec2, Vec3};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use crate::error::ConversionError;
use crate::handle::Handle;

/// String-keyed mapping payload.
pub type ValueMap = FxHashMap<String, TaggedValue>;

/// Wire-stable discriminant for [`TaggedValue`].
///
/// The numbering is part of the debug/serialization shape and must not be
/// reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ValueKind {
    Nil = 0,
    Bool = 1,
    Int = 2,
    Float = 3,
    Vector2 = 4,
    Vector3 = 5,
    String = 6,
    Handle = 7,
    Sequence = 8,
    Mapping = 9,
}

impl ValueKind {
    /// Human-readable name, used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Nil => "nil",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Vector2 => "vector2",
            ValueKind::Vector3 => "vector3",
            ValueKind::String => "string",
            ValueKind::Handle => "handle",
            ValueKind::Sequence => "sequence",
            ValueKind::Mapping => "mapping",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dynamically-typed value crossing the boundary.
///
/// Equality and hashing are kind-aware: values of different kinds are never
/// equal, and float payloads compare and hash through [`OrderedFloat`] so
/// the `Eq`/`Hash` contract holds for every representable value.
#[derive(Clone)]
pub enum TaggedValue {
    /// Absent/void value.
    Nil,
    /// Boolean.
    Bool(bool),
    /// 64-bit integer (all integer widths are stored widened).
    Int(i64),
    /// 64-bit float (f32 is stored widened).
    Float(f64),
    /// 2D vector.
    Vector2(Vec2),
    /// 3D vector.
    Vector3(Vec3),
    /// Owned string (out-of-line).
    String(String),
    /// Opaque reference to a native-owned object.
    Handle(Handle),
    /// Ordered sequence of values (out-of-line).
    Sequence(Vec<TaggedValue>),
    /// String-keyed mapping (out-of-line, boxed to keep the inline
    /// footprint fixed).
    Mapping(Box<ValueMap>),
}

impl TaggedValue {
    /// The discriminant for this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            TaggedValue::Nil => ValueKind::Nil,
            TaggedValue::Bool(_) => ValueKind::Bool,
            TaggedValue::Int(_) => ValueKind::Int,
            TaggedValue::Float(_) => ValueKind::Float,
            TaggedValue::Vector2(_) => ValueKind::Vector2,
            TaggedValue::Vector3(_) => ValueKind::Vector3,
            TaggedValue::String(_) => ValueKind::String,
            TaggedValue::Handle(_) => ValueKind::Handle,
            TaggedValue::Sequence(_) => ValueKind::Sequence,
            TaggedValue::Mapping(_) => ValueKind::Mapping,
        }
    }

    /// Human-readable name for this value's kind.
    pub fn type_name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Check if this value is nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, TaggedValue::Nil)
    }

    /// Build a mapping value from an iterator of entries.
    pub fn mapping<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, TaggedValue)>,
    {
        TaggedValue::Mapping(Box::new(entries.into_iter().collect()))
    }

    fn mismatch(&self, expected: &'static str) -> ConversionError {
        ConversionError::TypeMismatch {
            expected,
            actual: self.type_name(),
        }
    }

    /// Decode as bool.
    pub fn as_bool(&self) -> Result<bool, ConversionError> {
        match self {
            TaggedValue::Bool(v) => Ok(*v),
            other => Err(other.mismatch("bool")),
        }
    }

    /// Decode as i64.
    pub fn as_int(&self) -> Result<i64, ConversionError> {
        match self {
            TaggedValue::Int(v) => Ok(*v),
            other => Err(other.mismatch("int")),
        }
    }

    /// Decode as f64. Integers widen implicitly, matching the dynamic
    /// caller's numeric model.
    pub fn as_float(&self) -> Result<f64, ConversionError> {
        match self {
            TaggedValue::Float(v) => Ok(*v),
            TaggedValue::Int(v) => Ok(*v as f64),
            other => Err(other.mismatch("float")),
        }
    }

    /// Decode as a 2D vector.
    pub fn as_vector2(&self) -> Result<Vec2, ConversionError> {
        match self {
            TaggedValue::Vector2(v) => Ok(*v),
            other => Err(other.mismatch("vector2")),
        }
    }

    /// Decode as a 3D vector.
    pub fn as_vector3(&self) -> Result<Vec3, ConversionError> {
        match self {
            TaggedValue::Vector3(v) => Ok(*v),
            other => Err(other.mismatch("vector3")),
        }
    }

    /// Decode as a string slice.
    pub fn as_str(&self) -> Result<&str, ConversionError> {
        match self {
            TaggedValue::String(s) => Ok(s.as_str()),
            other => Err(other.mismatch("string")),
        }
    }

    /// Decode as a handle.
    pub fn as_handle(&self) -> Result<Handle, ConversionError> {
        match self {
            TaggedValue::Handle(h) => Ok(*h),
            other => Err(other.mismatch("handle")),
        }
    }

    /// Decode as a sequence.
    pub fn as_sequence(&self) -> Result<&[TaggedValue], ConversionError> {
        match self {
            TaggedValue::Sequence(v) => Ok(v.as_slice()),
            other => Err(other.mismatch("sequence")),
        }
    }

    /// Decode as a mapping.
    pub fn as_mapping(&self) -> Result<&ValueMap, ConversionError> {
        match self {
            TaggedValue::Mapping(m) => Ok(m),
            other => Err(other.mismatch("mapping")),
        }
    }
}

impl Default for TaggedValue {
    fn default() -> Self {
        TaggedValue::Nil
    }
}

impl fmt::Debug for TaggedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaggedValue::Nil => write!(f, "Nil"),
            TaggedValue::Bool(v) => write!(f, "Bool({})", v),
            TaggedValue::Int(v) => write!(f, "Int({})", v),
            TaggedValue::Float(v) => write!(f, "Float({})", v),
            TaggedValue::Vector2(v) => write!(f, "Vector2({}, {})", v.x, v.y),
            TaggedValue::Vector3(v) => write!(f, "Vector3({}, {}, {})", v.x, v.y, v.z),
            TaggedValue::String(s) => write!(f, "String({:?})", s),
            TaggedValue::Handle(h) => write!(f, "Handle({:?})", h),
            TaggedValue::Sequence(v) => f.debug_tuple("Sequence").field(v).finish(),
            TaggedValue::Mapping(m) => {
                write!(f, "Mapping({} entries)", m.len())
            }
        }
    }
}

impl PartialEq for TaggedValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TaggedValue::Nil, TaggedValue::Nil) => true,
            (TaggedValue::Bool(a), TaggedValue::Bool(b)) => a == b,
            (TaggedValue::Int(a), TaggedValue::Int(b)) => a == b,
            (TaggedValue::Float(a), TaggedValue::Float(b)) => {
                OrderedFloat(*a) == OrderedFloat(*b)
            }
            (TaggedValue::Vector2(a), TaggedValue::Vector2(b)) => {
                OrderedFloat(a.x) == OrderedFloat(b.x) && OrderedFloat(a.y) == OrderedFloat(b.y)
            }
            (TaggedValue::Vector3(a), TaggedValue::Vector3(b)) => {
                OrderedFloat(a.x) == OrderedFloat(b.x)
                    && OrderedFloat(a.y) == OrderedFloat(b.y)
                    && OrderedFloat(a.z) == OrderedFloat(b.z)
            }
            (TaggedValue::String(a), TaggedValue::String(b)) => a == b,
            (TaggedValue::Handle(a), TaggedValue::Handle(b)) => a == b,
            (TaggedValue::Sequence(a), TaggedValue::Sequence(b)) => a == b,
            (TaggedValue::Mapping(a), TaggedValue::Mapping(b)) => a == b,
            // Different kinds are never equal.
            _ => false,
        }
    }
}

impl Eq for TaggedValue {}

impl Hash for TaggedValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.kind().into());
        match self {
            TaggedValue::Nil => {}
            TaggedValue::Bool(v) => v.hash(state),
            TaggedValue::Int(v) => v.hash(state),
            TaggedValue::Float(v) => OrderedFloat(*v).hash(state),
            TaggedValue::Vector2(v) => {
                OrderedFloat(v.x).hash(state);
                OrderedFloat(v.y).hash(state);
            }
            TaggedValue::Vector3(v) => {
                OrderedFloat(v.x).hash(state);
                OrderedFloat(v.y).hash(state);
                OrderedFloat(v.z).hash(state);
            }
            TaggedValue::String(s) => s.hash(state),
            TaggedValue::Handle(h) => h.hash(state),
            TaggedValue::Sequence(v) => v.hash(state),
            TaggedValue::Mapping(m) => {
                // Order-independent fold so logically equal maps hash equal.
                state.write_usize(m.len());
                let mut acc: u64 = 0;
                for (k, v) in m.iter() {
                    let mut entry = rustc_hash::FxHasher::default();
                    k.hash(&mut entry);
                    v.hash(&mut entry);
                    acc ^= entry.finish();
                }
                state.write_u64(acc);
            }
        }
    }
}
