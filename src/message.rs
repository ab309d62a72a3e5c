//! The message envelope carried across the invocation engine.

use bytes::Bytes;

use crate::metadata::Metadata;
use crate::status::Status;

/// Envelope for one send or receive event.
///
/// Carries either an opaque payload (produced and consumed by the codec
/// collaborator) or a terminal error, never both. `type_name` declares the
/// wire type the payload serializes as; header metadata is optional and
/// rides alongside. Instances are created per event and not reused.
#[derive(Debug, Clone)]
pub struct Message {
    type_name: String,
    payload: Bytes,
    headers: Metadata,
    error: Option<Status>,
}

impl Message {
    /// Create a data message with the given wire type and payload.
    pub fn data(type_name: impl Into<String>, payload: Bytes) -> Self {
        Self {
            type_name: type_name.into(),
            payload,
            headers: Metadata::new(),
            error: None,
        }
    }

    /// Create a message representing a terminal failure.
    pub fn from_status(status: Status) -> Self {
        Self {
            type_name: String::new(),
            payload: Bytes::new(),
            headers: Metadata::new(),
            error: Some(status),
        }
    }

    /// Attach header metadata.
    pub fn with_headers(mut self, headers: Metadata) -> Self {
        self.headers = headers;
        self
    }

    /// The wire type the payload (de)serializes as.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The opaque payload. Empty for error messages.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Consume the message, returning the payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Header metadata.
    pub fn headers(&self) -> &Metadata {
        &self.headers
    }

    /// Whether this message represents a failure rather than data.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The terminal error, if this is an error message.
    pub fn status(&self) -> Option<&Status> {
        self.error.as_ref()
    }
}
