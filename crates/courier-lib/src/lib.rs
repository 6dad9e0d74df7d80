// courier-lib: JSON body codec for HTTP clients

pub mod codec;
pub mod config;
pub mod errors;
pub mod http_client;
pub mod json;
pub mod message;
pub mod types;

pub use codec::{Decoder, Encoder, JsonDecoder, JsonEncoder};
pub use errors::{CourierError, Result};
pub use json::{Mapper, MapperBuilder, Module};
pub use message::{BodySink, RequestTemplate, Response};
pub use types::{DescribeType, TypeDescriptor};
