//! Body codecs plugged into the HTTP client.
//!
//! An [`Encoder`] turns a value and its declared type into a request body; a
//! [`Decoder`] turns a response back into a value of the declared type. The
//! JSON implementations delegate to a [`Mapper`](crate::json::Mapper).

pub mod decoder;
pub mod encoder;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::Result;
use crate::message::{BodySink, Response};
use crate::types::{DescribeType, TypeDescriptor};

pub use decoder::JsonDecoder;
pub use encoder::JsonEncoder;

pub trait Encoder: Send + Sync {
    /// Serialize `value` as `body_type` and write the result into `sink`.
    ///
    /// On error nothing has been written to `sink`.
    fn encode<T, S>(&self, value: &T, body_type: &TypeDescriptor, sink: &mut S) -> Result<()>
    where
        T: Serialize + ?Sized,
        S: BodySink + ?Sized;

    /// Encode with the declared type taken from `T` itself.
    fn encode_typed<T, S>(&self, value: &T, sink: &mut S) -> Result<()>
    where
        T: Serialize + DescribeType + ?Sized,
        S: BodySink + ?Sized,
    {
        self.encode(value, &T::describe(), sink)
    }
}

pub trait Decoder: Send + Sync {
    /// Deserialize the body of `response` as `body_type`.
    ///
    /// Returns `Ok(None)` (or an empty value, for byte arrays) when there is
    /// nothing to decode.
    fn decode<T>(&self, response: &Response, body_type: &TypeDescriptor) -> Result<Option<T>>
    where
        T: DeserializeOwned;

    /// Decode with the declared type taken from `T` itself.
    fn decode_typed<T>(&self, response: &Response) -> Result<Option<T>>
    where
        T: DeserializeOwned + DescribeType,
    {
        self.decode(response, &T::describe())
    }
}
