use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Decoder;
use crate::errors::{CourierError, Result};
use crate::json::{Mapper, Module};
use crate::message::Response;
use crate::types::TypeDescriptor;

/// Reads JSON response bodies into values of the declared type.
///
/// A 404, an absent body and a zero-length body all decode to the empty
/// value of the declared type instead of an error.
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    mapper: Mapper,
}

impl JsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_modules(modules: impl IntoIterator<Item = Module>) -> Self {
        Self::with_mapper(Mapper::builder().register_modules(modules).build())
    }

    pub fn with_mapper(mapper: Mapper) -> Self {
        Self { mapper }
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }
}

impl Decoder for JsonDecoder {
    fn decode<T>(&self, response: &Response, body_type: &TypeDescriptor) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let body = match response.body() {
            Some(body) if !body.is_empty() && response.status() != StatusCode::NOT_FOUND => body,
            _ => {
                tracing::debug!(
                    status = %response.status(),
                    body_type = %body_type,
                    "nothing to decode, returning empty value"
                );
                return empty_value(body_type);
            }
        };

        tracing::trace!(body_type = %body_type, bytes = body.len(), "decoding response body");
        self.mapper
            .read_value(body, body_type)
            .map(Some)
            .map_err(CourierError::decode)
    }
}

/// Empty value for `body_type`: an empty byte array for byte-array targets,
/// `None` for everything else.
fn empty_value<T: DeserializeOwned>(body_type: &TypeDescriptor) -> Result<Option<T>> {
    if !body_type.is_bytes() {
        return Ok(None);
    }
    serde_json::from_value(Value::Array(Vec::new()))
        .map(Some)
        .map_err(CourierError::decode)
}
