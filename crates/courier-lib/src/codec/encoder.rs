use bytes::Bytes;
use serde::Serialize;

use super::Encoder;
use crate::config::MapperConfig;
use crate::errors::{CourierError, Result};
use crate::json::{Mapper, MapperBuilder, Module};
use crate::message::BodySink;
use crate::types::TypeDescriptor;

/// Writes request bodies as JSON text.
///
/// The default instance omits `null` object fields and pretty prints with two
/// spaces of indentation.
#[derive(Debug, Clone)]
pub struct JsonEncoder {
    mapper: Mapper,
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self::with_modules(std::iter::empty())
    }

    /// Default policy plus `modules`, registered in order.
    pub fn with_modules(modules: impl IntoIterator<Item = Module>) -> Self {
        let mapper = MapperBuilder::from(MapperConfig::codec_defaults())
            .register_modules(modules)
            .build();
        Self::with_mapper(mapper)
    }

    /// Use `mapper` as is; none of the default policy is applied.
    pub fn with_mapper(mapper: Mapper) -> Self {
        Self { mapper }
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }
}

impl Default for JsonEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for JsonEncoder {
    fn encode<T, S>(&self, value: &T, body_type: &TypeDescriptor, sink: &mut S) -> Result<()>
    where
        T: Serialize + ?Sized,
        S: BodySink + ?Sized,
    {
        let body = self
            .mapper
            .write_value_as_string(value, body_type)
            .map_err(CourierError::encode)?;
        tracing::trace!(body_type = %body_type, bytes = body.len(), "encoded request body");
        sink.set_body(Bytes::from(body));
        Ok(())
    }
}
