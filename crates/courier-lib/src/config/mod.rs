//! Serializable configuration for the mapping engine and the HTTP client.

pub mod client;
pub mod mapper;

pub use client::ClientConfig;
pub use mapper::MapperConfig;
