//! Response body decoding.

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::error::BoxError;

/// A response body that could not be turned into the requested type.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DecodeError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        let message = format!("invalid body at line {} column {}", err.line(), err.column());
        DecodeError::new(message).with_source(err)
    }
}

/// Turns raw response bytes into a typed value.
pub trait Decoder: Send + Sync {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecodeError>;
}

/// Decodes bodies as JSON with `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
