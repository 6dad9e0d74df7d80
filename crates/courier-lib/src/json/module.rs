//! Extension modules: named bundles of per-type overrides.
//!
//! Overrides work on JSON trees. A serializer receives the default tree
//! produced for a value of its type and returns the tree to emit in its
//! place. A deserializer receives the incoming tree at a position of its type
//! and returns the tree the default deserialization then consumes.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::strip_null_fields;
use crate::types::{DescribeType, TypeDescriptor};

/// Replaces the default output for values of one declared type.
pub trait ValueSerializer: Send + Sync {
    fn serialize(&self, value: Value) -> serde_json::Result<Value>;
}

/// Rewrites incoming JSON for positions of one declared type.
pub trait ValueDeserializer: Send + Sync {
    fn deserialize(&self, value: Value) -> serde_json::Result<Value>;
}

impl<F> ValueSerializer for F
where
    F: Fn(Value) -> serde_json::Result<Value> + Send + Sync,
{
    fn serialize(&self, value: Value) -> serde_json::Result<Value> {
        self(value)
    }
}

impl<F> ValueDeserializer for F
where
    F: Fn(Value) -> serde_json::Result<Value> + Send + Sync,
{
    fn deserialize(&self, value: Value) -> serde_json::Result<Value> {
        self(value)
    }
}

pub(crate) type Rewrite = Arc<dyn Fn(Value) -> serde_json::Result<Value> + Send + Sync>;

/// A named set of serializer and deserializer overrides.
///
/// ```
/// use courier_lib::json::Module;
/// use courier_lib::types::DescribeType;
/// use serde_json::Value;
///
/// struct Zone;
/// impl DescribeType for Zone {}
///
/// let module = Module::new("zones")
///     .add_serializer::<Zone>(|value: Value| -> serde_json::Result<Value> { Ok(value) });
/// assert_eq!(module.name(), "zones");
/// ```
#[derive(Clone)]
pub struct Module {
    name: Cow<'static, str>,
    serializers: Vec<(TypeDescriptor, Rewrite)>,
    deserializers: Vec<(TypeDescriptor, Rewrite)>,
}

impl Module {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            serializers: Vec::new(),
            deserializers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_serializer<T: DescribeType>(
        self,
        serializer: impl ValueSerializer + 'static,
    ) -> Self {
        self.add_serializer_for(T::describe(), serializer)
    }

    pub fn add_serializer_for(
        mut self,
        declared: TypeDescriptor,
        serializer: impl ValueSerializer + 'static,
    ) -> Self {
        let rewrite: Rewrite =
            Arc::new(move |value: Value| ValueSerializer::serialize(&serializer, value));
        self.serializers.push((declared, rewrite));
        self
    }

    pub fn add_deserializer<T: DescribeType>(
        self,
        deserializer: impl ValueDeserializer + 'static,
    ) -> Self {
        self.add_deserializer_for(T::describe(), deserializer)
    }

    pub fn add_deserializer_for(
        mut self,
        declared: TypeDescriptor,
        deserializer: impl ValueDeserializer + 'static,
    ) -> Self {
        let rewrite: Rewrite =
            Arc::new(move |value: Value| ValueDeserializer::deserialize(&deserializer, value));
        self.deserializers.push((declared, rewrite));
        self
    }

    /// Register a serializer that works on the typed value.
    ///
    /// The default tree is first read back into `T`, so `T` must deserialize
    /// from its own default output.
    pub fn serialize_with<T, F>(self, serialize: F) -> Self
    where
        T: DeserializeOwned + DescribeType,
        F: Fn(&T) -> serde_json::Result<Value> + Send + Sync + 'static,
    {
        self.add_serializer::<T>(move |value: Value| {
            let typed: T = serde_json::from_value(value)?;
            serialize(&typed)
        })
    }

    /// Register a deserializer that builds the typed value itself.
    ///
    /// The produced value is turned back into a tree for the default
    /// deserialization of the enclosing type.
    pub fn deserialize_with<T, F>(self, deserialize: F) -> Self
    where
        T: Serialize + DescribeType,
        F: Fn(Value) -> serde_json::Result<T> + Send + Sync + 'static,
    {
        self.add_deserializer::<T>(move |value: Value| serde_json::to_value(deserialize(value)?))
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field(
                "serializers",
                &self.serializers.iter().map(|(k, _)| k.to_string()).collect::<Vec<_>>(),
            )
            .field(
                "deserializers",
                &self.deserializers.iter().map(|(k, _)| k.to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Override table folded from registered modules. Last registration wins.
#[derive(Clone, Default)]
pub(crate) struct Overrides {
    pub(crate) serializers: HashMap<TypeDescriptor, Rewrite>,
    pub(crate) deserializers: HashMap<TypeDescriptor, Rewrite>,
}

impl Overrides {
    pub(crate) fn register(&mut self, module: Module) {
        tracing::debug!(
            module = %module.name,
            serializers = module.serializers.len(),
            deserializers = module.deserializers.len(),
            "registering extension module"
        );
        self.serializers.extend(module.serializers);
        self.deserializers.extend(module.deserializers);
    }
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field(
                "serializers",
                &self.serializers.keys().map(ToString::to_string).collect::<Vec<_>>(),
            )
            .field(
                "deserializers",
                &self.deserializers.keys().map(ToString::to_string).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Rewrite `value` with the overrides in `table`, following `declared` into
/// list elements, map values, options and the fields of named types with a
/// known shape. An override is terminal: the tree it returns is not walked
/// again. `null` never reaches an override.
///
/// With `omit_nulls`, `null` object fields are dropped everywhere except
/// inside override output. Overrides see the tree with its nulls intact.
pub(crate) fn rewrite(
    table: &HashMap<TypeDescriptor, Rewrite>,
    value: Value,
    declared: &TypeDescriptor,
    omit_nulls: bool,
) -> serde_json::Result<Value> {
    if value.is_null() {
        return Ok(value);
    }
    if let Some(apply) = table.get(declared) {
        return apply(value);
    }
    match (declared, value) {
        (TypeDescriptor::Optional(inner), value) => rewrite(table, value, inner, omit_nulls),
        (TypeDescriptor::List(element), Value::Array(items)) => items
            .into_iter()
            .map(|item| rewrite(table, item, element, omit_nulls))
            .collect::<serde_json::Result<Vec<_>>>()
            .map(Value::Array),
        (TypeDescriptor::Map(entry), Value::Object(map)) => {
            rewrite_fields(table, map, omit_nulls, |_| Some(&**entry))
        }
        (TypeDescriptor::Named(key), Value::Object(map)) if key.has_fields() => {
            let fields = key.fields().unwrap_or_default();
            rewrite_fields(table, map, omit_nulls, |name| {
                fields
                    .iter()
                    .find_map(|(field, declared)| (*field == name).then_some(declared))
            })
        }
        (_, value) if omit_nulls => Ok(strip_null_fields(value)),
        (_, value) => Ok(value),
    }
}

fn rewrite_fields<'d>(
    table: &HashMap<TypeDescriptor, Rewrite>,
    map: serde_json::Map<String, Value>,
    omit_nulls: bool,
    declared_of: impl Fn(&str) -> Option<&'d TypeDescriptor>,
) -> serde_json::Result<Value> {
    map.into_iter()
        .filter(|(_, item)| !(omit_nulls && item.is_null()))
        .map(|(key, item)| {
            let item = match declared_of(&key) {
                Some(declared) => rewrite(table, item, declared, omit_nulls)?,
                None if omit_nulls => strip_null_fields(item),
                None => item,
            };
            Ok((key, item))
        })
        .collect::<serde_json::Result<serde_json::Map<_, _>>>()
        .map(Value::Object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde_json::json;

    struct Zone;
    impl DescribeType for Zone {}

    struct Record;
    impl DescribeType for Record {}

    struct Account;
    impl DescribeType for Account {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::object::<Self>(|| {
                vec![
                    ("primary", TypeDescriptor::of::<Zone>()),
                    ("backup", TypeDescriptor::of::<Option<Zone>>()),
                    ("zones", TypeDescriptor::of::<Vec<Zone>>()),
                ]
            })
        }
    }

    fn tag(label: &'static str) -> impl Fn(Value) -> serde_json::Result<Value> + Send + Sync {
        move |_| Ok(Value::String(label.into()))
    }

    fn rewrite_zone(overrides: &Overrides) -> serde_json::Result<Value> {
        rewrite(
            &overrides.serializers,
            json!({}),
            &TypeDescriptor::named::<Zone>(),
            false,
        )
    }

    fn table_of(module: Module) -> Overrides {
        let mut overrides = Overrides::default();
        overrides.register(module);
        overrides
    }

    #[test]
    fn test_rewrite_reaches_list_elements_and_map_values() {
        let overrides = table_of(Module::new("tags").add_serializer::<Zone>(tag("zone")));

        let list = rewrite(
            &overrides.serializers,
            json!([{"a": 1}, null, {"b": 2}]),
            &TypeDescriptor::of::<Vec<Option<Zone>>>(),
            false,
        )
        .unwrap();
        assert_eq!(list, json!(["zone", null, "zone"]));

        let map = rewrite(
            &overrides.serializers,
            json!({"x": {"a": 1}}),
            &TypeDescriptor::of::<std::collections::HashMap<String, Zone>>(),
            false,
        )
        .unwrap();
        assert_eq!(map, json!({"x": "zone"}));
    }

    #[test]
    fn test_rewrite_ignores_untyped_positions() {
        let overrides = table_of(Module::new("tags").add_serializer::<Zone>(tag("zone")));
        let value = json!([{"a": 1}]);
        let out = rewrite(
            &overrides.serializers,
            value.clone(),
            &TypeDescriptor::of::<Vec<Value>>(),
            false,
        )
        .unwrap();
        assert_eq!(out, value);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut overrides = table_of(
            Module::new("first")
                .add_serializer::<Zone>(tag("one"))
                .add_serializer::<Zone>(tag("two")),
        );
        let out = rewrite_zone(&overrides).unwrap();
        assert_eq!(out, json!("two"));

        overrides.register(Module::new("second").add_serializer::<Zone>(tag("three")));
        let out = rewrite_zone(&overrides).unwrap();
        assert_eq!(out, json!("three"));
    }

    #[test]
    fn test_override_error_propagates() {
        let overrides = table_of(Module::new("failing").add_serializer::<Zone>(
            |_: Value| -> serde_json::Result<Value> {
                Err(serde_json::Error::custom("zone refused"))
            },
        ));
        let err = rewrite_zone(&overrides).unwrap_err();
        assert!(err.to_string().contains("zone refused"));
    }

    #[test]
    fn test_descriptor_keyed_override() {
        let overrides = table_of(
            Module::new("strings")
                .add_deserializer_for(
                    TypeDescriptor::String,
                    |value: Value| -> serde_json::Result<Value> {
                        Ok(match value {
                            Value::String(s) => Value::String(s.trim().to_string()),
                            other => other,
                        })
                    },
                ),
        );
        let out = rewrite(
            &overrides.deserializers,
            json!([" a ", "b  "]),
            &TypeDescriptor::of::<Vec<String>>(),
            false,
        )
        .unwrap();
        assert_eq!(out, json!(["a", "b"]));
    }

    #[test]
    fn test_debug_lists_keys() {
        let module = Module::new("zones").add_serializer::<Zone>(tag("zone"));
        let debug = format!("{module:?}");
        assert!(debug.contains("zones"));
        assert!(debug.contains("Zone"));
    }

    #[test]
    fn test_rewrite_reaches_fields_of_shaped_types() {
        let overrides = table_of(Module::new("tags").add_serializer::<Zone>(tag("zone")));
        let out = rewrite(
            &overrides.serializers,
            json!({"owner": {"a": 1}, "primary": {"a": 1}, "backup": {"b": 2}, "zones": [{}]}),
            &TypeDescriptor::of::<Account>(),
            false,
        )
        .unwrap();
        assert_eq!(
            out,
            json!({"owner": {"a": 1}, "primary": "zone", "backup": "zone", "zones": ["zone"]})
        );
    }

    #[test]
    fn test_unshaped_named_type_is_not_walked() {
        let overrides = table_of(Module::new("tags").add_serializer::<Zone>(tag("zone")));
        let value = json!({"primary": {"a": 1}});
        let out = rewrite(
            &overrides.serializers,
            value.clone(),
            &TypeDescriptor::named::<Record>(),
            false,
        )
        .unwrap();
        assert_eq!(out, value);
    }

    #[test]
    fn test_overrides_see_nulls_but_their_output_is_kept() {
        let overrides = table_of(Module::new("echo").add_serializer::<Zone>(
            |value: Value| -> serde_json::Result<Value> {
                assert_eq!(value, json!({"name": "a.", "id": null}));
                Ok(json!({"name": "A.", "id": null}))
            },
        ));
        let out = rewrite(
            &overrides.serializers,
            json!({"primary": {"name": "a.", "id": null}, "backup": null, "note": {"x": null}}),
            &TypeDescriptor::of::<Account>(),
            true,
        )
        .unwrap();
        assert_eq!(out, json!({"primary": {"name": "A.", "id": null}, "note": {}}));
    }

    #[test]
    fn test_omit_nulls_without_matching_override() {
        let overrides = table_of(Module::new("tags").add_serializer::<Zone>(tag("zone")));
        let out = rewrite(
            &overrides.serializers,
            json!([{"a": null, "b": [null, {"c": null}]}]),
            &TypeDescriptor::of::<Vec<Value>>(),
            true,
        )
        .unwrap();
        assert_eq!(out, json!([{"b": [null, {}]}]));
    }
}
