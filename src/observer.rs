//! Push capabilities crossing the sync/async boundary.

use crate::message::Message;
use crate::status::Status;

/// One direction of event delivery for a call.
///
/// The transport invokes inbound implementations from its own I/O threads;
/// the engine invokes transport-provided outbound implementations from
/// caller threads. Implementations must tolerate concurrent invocation.
///
/// `on_error` and `on_completed` are terminal: a well-behaved peer emits at
/// most one of them, last. Inbound sinks in this crate tolerate a
/// misbehaving peer delivering more.
pub trait CallChannel: Send + Sync {
    /// Deliver one message.
    fn on_next(&self, message: Message);

    /// Terminate the direction with a failure.
    fn on_error(&self, status: Status);

    /// Terminate the direction cleanly.
    fn on_completed(&self);
}

/// Caller-supplied sink for the non-blocking invocation path.
///
/// Invoked from transport delivery threads, never from the calling thread.
/// For a unary call the engine guarantees at most one `on_message` or
/// `on_error`; for a server-streaming call, any number of `on_message`
/// followed by exactly one terminal event.
pub trait ResponseHandler: Send + Sync {
    /// A reply message arrived.
    fn on_message(&self, message: Message);

    /// The call failed.
    fn on_error(&self, status: Status);

    /// The call completed cleanly.
    fn on_complete(&self);
}
