//! Error taxonomy for the invocation engine.

use crate::descriptor::MethodShape;
use crate::status::Status;

/// Convenience alias for operations that fail with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between a caller and the transport.
///
/// All variants are terminal for the call or session they occur in; the
/// engine never retries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or unresolvable service/type descriptor. Fatal to stub
    /// initialization, never retried.
    #[error("descriptor error: {0}")]
    Descriptor(String),
    /// Method name not present in the resolved service definition.
    #[error("no registered method descriptor for '{0}'")]
    NotFound(String),
    /// The invocation path is incompatible with the resolved method shape.
    /// Surfaced synchronously, before the transport is contacted.
    #[error("method '{method}' has shape {shape}, which this call path does not support")]
    UnsupportedShape {
        /// The method that was invoked.
        method: String,
        /// Its resolved shape.
        shape: MethodShape,
    },
    /// Failure reported by the transport collaborator or the remote peer.
    #[error("transport error: {0}")]
    Transport(Status),
    /// Send/complete/error attempted on an already-closed session side.
    #[error("stream closed: {0}")]
    StreamClosed(String),
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        Error::Transport(status)
    }
}
