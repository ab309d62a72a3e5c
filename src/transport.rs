//! The transport collaborator boundary.

use std::io;
use std::sync::Arc;

use crate::descriptor::MethodDescriptor;
use crate::message::Message;
use crate::metadata::Metadata;
use crate::observer::CallChannel;

/// The multiplexed connection the engine submits calls to.
///
/// Implementations own everything below this seam: connection
/// establishment and pooling, TLS, HTTP/2 framing, flow control, and
/// timeouts. Inbound events are delivered on the transport's own I/O
/// threads through the sink handed over at submission; a caller-side
/// timeout or cancellation surfaces as an ordinary `on_error` delivery.
///
/// A synchronous `Err` from a submit/open call means the exchange never
/// started; the engine maps it onto the pending construct so the caller
/// still observes a resolution.
pub trait Transport: Send + Sync {
    /// Submit a unary exchange: one request out, one terminal event back
    /// through `sink`.
    fn submit_unary(
        &self,
        method: &MethodDescriptor,
        request: Message,
        sink: Arc<dyn CallChannel>,
    ) -> io::Result<()>;

    /// Submit a server-streaming exchange: one request out, any number of
    /// messages followed by one terminal event back through `sink`.
    fn submit_server_streaming(
        &self,
        method: &MethodDescriptor,
        request: Message,
        sink: Arc<dyn CallChannel>,
    ) -> io::Result<()>;

    /// Open a client-streaming exchange. Returns the outbound channel for
    /// request messages; the single reply arrives through `sink`.
    fn open_client_streaming(
        &self,
        method: &MethodDescriptor,
        headers: Metadata,
        sink: Arc<dyn CallChannel>,
    ) -> io::Result<Arc<dyn CallChannel>>;

    /// Open a bidi-streaming exchange. Returns the outbound channel for
    /// request messages; inbound messages arrive through `sink`.
    fn open_bidi_streaming(
        &self,
        method: &MethodDescriptor,
        headers: Metadata,
        sink: Arc<dyn CallChannel>,
    ) -> io::Result<Arc<dyn CallChannel>>;
}
