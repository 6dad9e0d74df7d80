//! Declared type descriptors.
//!
//! A `TypeDescriptor` describes the shape a body is declared as, including its
//! generic parameters: `list<Zone>` is a different descriptor from `list<any>`.
//! The mapper walks JSON trees alongside the descriptor to find the positions
//! where a registered override applies.
//!
//! Descriptors are usually derived from a Rust type through [`DescribeType`].
//! User types opt in with an empty impl, which describes them as a named type:
//!
//! ```
//! use courier_lib::types::{DescribeType, TypeDescriptor};
//!
//! struct Zone;
//! impl DescribeType for Zone {}
//!
//! let declared = TypeDescriptor::of::<Vec<Zone>>();
//! assert_eq!(declared.to_string(), "list<Zone>");
//! ```
//!
//! A named type that holds other described types lists its fields, keyed by
//! their JSON names, so overrides also reach values nested inside it:
//!
//! ```
//! use courier_lib::types::{DescribeType, TypeDescriptor};
//!
//! struct Zone;
//! impl DescribeType for Zone {}
//!
//! struct Account;
//! impl DescribeType for Account {
//!     fn describe() -> TypeDescriptor {
//!         TypeDescriptor::object::<Self>(|| {
//!             vec![
//!                 ("primary", TypeDescriptor::of::<Zone>()),
//!                 ("zones", TypeDescriptor::of::<Vec<Zone>>()),
//!             ]
//!         })
//!     }
//! }
//!
//! let account = TypeDescriptor::of::<Account>();
//! assert_eq!(account.field("zones"), Some(TypeDescriptor::of::<Vec<Zone>>()));
//! assert_eq!(account, TypeDescriptor::named::<Account>());
//! ```

use std::any::{type_name, TypeId};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

/// Field shape of a named type: JSON field names and their declared types.
///
/// Built on demand so that self-referential types can describe themselves.
pub type FieldsFn = fn() -> Vec<(&'static str, TypeDescriptor)>;

/// Identity of a named (user) type.
///
/// Compared and hashed by `TypeId`; the name is only kept for display and the
/// field shape is not part of the identity.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    fields: Option<FieldsFn>,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: FieldsFn) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Field shape, if the type declared one.
    pub fn fields(&self) -> Option<Vec<(&'static str, TypeDescriptor)>> {
        self.fields.map(|fields| fields())
    }

    /// Declared type of the field serialized as `name`, if the shape is known.
    pub fn field(&self, name: &str) -> Option<TypeDescriptor> {
        self.fields()?
            .into_iter()
            .find_map(|(field, declared)| (field == name).then_some(declared))
    }

    pub fn has_fields(&self) -> bool {
        self.fields.is_some()
    }

    /// Fully qualified type name, as reported by `std::any::type_name`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path (generic arguments are kept).
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Runtime description of a declared body type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// Unknown or dynamic shape (`serde_json::Value`).
    Any,
    Bool,
    Integer,
    Float,
    String,
    /// Raw byte array: an absent body decodes to an empty array rather than
    /// `None`.
    ///
    /// `Bytes` and `BytesMut` describe themselves this way. `Vec<u8>` is a
    /// `list<integer>` like any other vector; declare it with this descriptor
    /// explicitly (`decoder.decode::<Vec<u8>>(&response, &TypeDescriptor::Bytes)`)
    /// to get the byte-array behaviour.
    Bytes,
    Optional(Box<TypeDescriptor>),
    List(Box<TypeDescriptor>),
    /// JSON object with string keys and values of the given type.
    Map(Box<TypeDescriptor>),
    Named(TypeKey),
}

impl TypeDescriptor {
    pub fn of<T: DescribeType + ?Sized>() -> Self {
        T::describe()
    }

    pub fn named<T: ?Sized + 'static>() -> Self {
        Self::Named(TypeKey::of::<T>())
    }

    /// Named type whose fields are walked when looking for overrides.
    pub fn object<T: ?Sized + 'static>(fields: FieldsFn) -> Self {
        Self::Named(TypeKey::of::<T>().with_fields(fields))
    }

    pub fn list(element: TypeDescriptor) -> Self {
        Self::List(Box::new(element))
    }

    pub fn map(value: TypeDescriptor) -> Self {
        Self::Map(Box::new(value))
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self, Self::Bytes)
    }

    /// Declared type of a field of a named type with a known shape.
    pub fn field(&self, name: &str) -> Option<TypeDescriptor> {
        match self {
            Self::Named(key) => key.field(name),
            _ => None,
        }
    }

    /// Element type of a list, value type of a map, inner type of an option.
    pub fn parameter(&self) -> Option<&TypeDescriptor> {
        match self {
            Self::Optional(inner) | Self::List(inner) | Self::Map(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Bool => f.write_str("bool"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::String => f.write_str("string"),
            Self::Bytes => f.write_str("bytes"),
            Self::Optional(inner) => write!(f, "option<{inner}>"),
            Self::List(element) => write!(f, "list<{element}>"),
            Self::Map(value) => write!(f, "map<string, {value}>"),
            Self::Named(key) => f.write_str(key.short_name()),
        }
    }
}

/// Types that can describe their declared JSON shape.
///
/// The default implementation describes `Self` as a named type without a
/// field shape, which is what override modules key on. Override `describe`
/// with [`TypeDescriptor::object`] when fields of `Self` hold described types
/// that overrides must reach.
pub trait DescribeType: 'static {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Named(TypeKey::of::<Self>())
    }
}

macro_rules! describe_as {
    ($descriptor:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl DescribeType for $ty {
                fn describe() -> TypeDescriptor {
                    $descriptor
                }
            }
        )+
    };
}

describe_as!(TypeDescriptor::Bool => bool);
describe_as!(
    TypeDescriptor::Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize
);
describe_as!(TypeDescriptor::Float => f32, f64);
describe_as!(TypeDescriptor::String => String, str, char, Cow<'static, str>);
describe_as!(TypeDescriptor::Bytes => Bytes, BytesMut);
describe_as!(TypeDescriptor::Any => serde_json::Value);
describe_as!(TypeDescriptor::map(TypeDescriptor::Any) => serde_json::Map<String, serde_json::Value>);

impl<T: DescribeType> DescribeType for Option<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::optional(T::describe())
    }
}

macro_rules! describe_list {
    ($($ty:ident),+) => {
        $(
            impl<T: DescribeType> DescribeType for $ty<T> {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::list(T::describe())
                }
            }
        )+
    };
}

describe_list!(Vec, VecDeque, LinkedList, BTreeSet);

impl<T: DescribeType, S: 'static> DescribeType for HashSet<T, S> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::list(T::describe())
    }
}

impl<T: DescribeType> DescribeType for [T] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::list(T::describe())
    }
}

impl<T: DescribeType, const N: usize> DescribeType for [T; N] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::list(T::describe())
    }
}

impl<K: 'static, V: DescribeType, S: 'static> DescribeType for HashMap<K, V, S> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::map(V::describe())
    }
}

impl<K: 'static, V: DescribeType> DescribeType for BTreeMap<K, V> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::map(V::describe())
    }
}

macro_rules! describe_transparent {
    ($($ty:ident),+) => {
        $(
            impl<T: DescribeType + ?Sized> DescribeType for $ty<T> {
                fn describe() -> TypeDescriptor {
                    T::describe()
                }
            }
        )+
    };
}

describe_transparent!(Box, Arc, Rc);
