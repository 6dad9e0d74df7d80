//! The mapping engine: `serde_json` configured with output policy and an
//! override table built from extension modules.
//!
//! Default mapping is whatever the type's `Serialize`/`Deserialize` impls
//! produce. On top of that a [`Mapper`] can drop `null` object fields, pretty
//! print, and apply per-type overrides found by walking the JSON tree with the
//! declared [`TypeDescriptor`].
//!
//! A `Mapper` is immutable once built. Clones share the override table.

pub mod module;
pub mod printer;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::MapperConfig;
use crate::types::TypeDescriptor;

pub use module::{Module, ValueDeserializer, ValueSerializer};
pub use printer::SpacedPrettyFormatter;

use module::Overrides;

#[derive(Debug, Clone)]
pub struct Mapper {
    config: MapperConfig,
    overrides: Arc<Overrides>,
}

impl Mapper {
    /// A mapper with [`MapperConfig::default`] and no modules.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> MapperBuilder {
        MapperBuilder::default()
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Serialize `value` into the tree that will be written, with the null
    /// policy and serializer overrides applied.
    ///
    /// Overrides receive the default tree with its nulls intact; `null` fields
    /// are dropped afterwards, outside override output.
    pub fn value_to_tree<T>(
        &self,
        value: &T,
        declared: &TypeDescriptor,
    ) -> serde_json::Result<Value>
    where
        T: Serialize + ?Sized,
    {
        let tree = serde_json::to_value(value)?;
        let omit_nulls = self.config.omit_nulls;
        if self.overrides.serializers.is_empty() {
            return Ok(if omit_nulls {
                strip_null_fields(tree)
            } else {
                tree
            });
        }
        module::rewrite(&self.overrides.serializers, tree, declared, omit_nulls)
    }

    /// Serialize `value` as JSON text.
    ///
    /// Values are written straight to the output unless null fields must be
    /// dropped or serializer overrides are registered; those need an
    /// intermediate `serde_json::Value`, which cannot hold integers outside
    /// the 64-bit range.
    pub fn write_value_as_string<T>(
        &self,
        value: &T,
        declared: &TypeDescriptor,
    ) -> serde_json::Result<String>
    where
        T: Serialize + ?Sized,
    {
        let bytes = self.write_value_as_bytes(value, declared)?;
        String::from_utf8(bytes).map_err(serde::ser::Error::custom)
    }

    pub fn write_value_as_bytes<T>(
        &self,
        value: &T,
        declared: &TypeDescriptor,
    ) -> serde_json::Result<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        if self.writes_directly() {
            return self.render(value);
        }
        let tree = self.value_to_tree(value, declared)?;
        self.render(&tree)
    }

    /// Apply deserializer overrides to `tree`, then deserialize it into `T`.
    pub fn tree_to_value<T>(
        &self,
        tree: Value,
        declared: &TypeDescriptor,
    ) -> serde_json::Result<T>
    where
        T: DeserializeOwned,
    {
        let tree = if self.overrides.deserializers.is_empty() {
            tree
        } else {
            module::rewrite(&self.overrides.deserializers, tree, declared, false)?
        };
        serde_json::from_value(tree)
    }

    pub fn read_value<T>(&self, bytes: &[u8], declared: &TypeDescriptor) -> serde_json::Result<T>
    where
        T: DeserializeOwned,
    {
        if self.overrides.deserializers.is_empty() {
            return serde_json::from_slice(bytes);
        }
        let tree: Value = serde_json::from_slice(bytes)?;
        self.tree_to_value(tree, declared)
    }

    fn writes_directly(&self) -> bool {
        !self.config.omit_nulls && self.overrides.serializers.is_empty()
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> serde_json::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(128);
        if self.config.pretty_print {
            let formatter = SpacedPrettyFormatter::with_indent_width(self.config.indent_width);
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            value.serialize(&mut ser)?;
        } else {
            serde_json::to_writer(&mut buf, value)?;
        }
        Ok(buf)
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects policy and modules before a [`Mapper`] is frozen.
#[derive(Debug, Default)]
pub struct MapperBuilder {
    config: MapperConfig,
    overrides: Overrides,
}

impl MapperBuilder {
    pub fn omit_nulls(mut self, enabled: bool) -> Self {
        self.config.omit_nulls = enabled;
        self
    }

    pub fn pretty_print(mut self, enabled: bool) -> Self {
        self.config.pretty_print = enabled;
        self
    }

    pub fn indent_width(mut self, width: usize) -> Self {
        self.config.indent_width = width;
        self
    }

    pub fn register_module(mut self, module: Module) -> Self {
        self.overrides.register(module);
        self
    }

    /// Register modules in iteration order; later modules win on collisions.
    pub fn register_modules(self, modules: impl IntoIterator<Item = Module>) -> Self {
        modules.into_iter().fold(self, Self::register_module)
    }

    pub fn build(self) -> Mapper {
        Mapper {
            config: self.config,
            overrides: Arc::new(self.overrides),
        }
    }
}

impl From<MapperConfig> for MapperBuilder {
    fn from(config: MapperConfig) -> Self {
        Self {
            config,
            overrides: Overrides::default(),
        }
    }
}

/// Remove `null`-valued fields from every object in the tree. Array elements
/// are left alone.
pub(crate) fn strip_null_fields(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_null_fields(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_null_fields).collect()),
        other => other,
    }
}
