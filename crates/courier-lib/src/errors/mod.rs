use thiserror::Error;

/// Boxed cause carried by the codec error variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum CourierError {
    #[error("Encode error: {message}")]
    Encode {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("Decode error: {message}")]
    Decode {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, CourierError>;

impl CourierError {
    /// Wrap a serialization failure, keeping its message and the cause itself.
    pub fn encode<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Encode {
            message: source.to_string(),
            source: Box::new(source),
        }
    }

    /// Wrap a deserialization failure, keeping its message and the cause itself.
    pub fn decode<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Decode {
            message: source.to_string(),
            source: Box::new(source),
        }
    }

    pub fn is_encode(&self) -> bool {
        matches!(self, Self::Encode { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}
