//! Live handles for client-streaming and bidi-streaming calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use crossbeam_channel::Receiver;

use crate::bridge::PendingReply;
use crate::descriptor::MethodShape;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::observer::CallChannel;
use crate::sink::InboundEvent;
use crate::status::{Code, Status};

/// A live streaming exchange.
///
/// The outbound and inbound sides close independently: the caller closes
/// outbound with [`complete`](Self::complete) or
/// [`send_error`](Self::send_error); the transport closes inbound by
/// delivering a terminal event. Sends after outbound closure are rejected
/// with [`Error::StreamClosed`].
///
/// Inbound consumption depends on the session's directionality: a
/// client-streaming session yields its single reply through
/// [`receive`](Self::receive); a bidi session yields its reply stream
/// through [`responses`](Self::responses).
pub struct StreamingSession {
    method: String,
    input_type: String,
    shape: MethodShape,
    outbound: Arc<dyn CallChannel>,
    closed: AtomicBool,
    inbound: InboundSide,
}

enum InboundSide {
    /// Client-streaming: the server sends exactly one reply.
    Single(Mutex<Option<PendingReply>>),
    /// Bidi-streaming: queue of inbound events, drained by the iterator.
    Queue(Mutex<Option<Receiver<InboundEvent>>>),
}

impl StreamingSession {
    pub(crate) fn client_streaming(
        method: impl Into<String>,
        input_type: impl Into<String>,
        outbound: Arc<dyn CallChannel>,
        reply: PendingReply,
    ) -> Self {
        Self {
            method: method.into(),
            input_type: input_type.into(),
            shape: MethodShape::ClientStreaming,
            outbound,
            closed: AtomicBool::new(false),
            inbound: InboundSide::Single(Mutex::new(Some(reply))),
        }
    }

    pub(crate) fn bidi_streaming(
        method: impl Into<String>,
        input_type: impl Into<String>,
        outbound: Arc<dyn CallChannel>,
        inbound: Receiver<InboundEvent>,
    ) -> Self {
        Self {
            method: method.into(),
            input_type: input_type.into(),
            shape: MethodShape::BidiStreaming,
            outbound,
            closed: AtomicBool::new(false),
            inbound: InboundSide::Queue(Mutex::new(Some(inbound))),
        }
    }

    /// Whether this is a bidi-streaming session. Fixed at creation.
    pub fn is_bidirectional(&self) -> bool {
        self.shape == MethodShape::BidiStreaming
    }

    /// Send one request message, typed with the method's input type.
    pub fn send(&self, payload: Bytes) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            tracing::error!(method = %self.method, "send on a closed outbound stream");
            return Err(Error::StreamClosed("outbound side already closed".into()));
        }
        self.outbound
            .on_next(Message::data(self.input_type.as_str(), payload));
        Ok(())
    }

    /// Abort the exchange from the client side with the given status.
    /// Closes the outbound side.
    pub fn send_error(&self, code: Code, description: impl Into<String>) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            tracing::error!(method = %self.method, "error send on a closed outbound stream");
            return Err(Error::StreamClosed("outbound side already closed".into()));
        }
        self.outbound.on_error(Status::new(code, description));
        Ok(())
    }

    /// Signal that the client has finished sending. Closes the outbound
    /// side; a second call fails.
    pub fn complete(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            tracing::error!(method = %self.method, "complete on a closed outbound stream");
            return Err(Error::StreamClosed("outbound side already closed".into()));
        }
        self.outbound.on_completed();
        Ok(())
    }

    /// Block until the single reply of a client-streaming exchange
    /// resolves, and return it.
    ///
    /// Errors on a bidi session (use [`responses`](Self::responses)) and
    /// on a second call (the reply is observed exactly once).
    pub fn receive(&self) -> Result<Message> {
        match &self.inbound {
            InboundSide::Single(slot) => {
                let reply = slot
                    .lock()
                    .unwrap()
                    .take()
                    .ok_or_else(|| Error::StreamClosed("reply already consumed".into()))?;
                reply.wait().map_err(Error::Transport)
            }
            InboundSide::Queue(_) => Err(Error::UnsupportedShape {
                method: self.method.clone(),
                shape: self.shape,
            }),
        }
    }

    /// Take the inbound reply stream of a bidi exchange.
    ///
    /// The stream is lazy and not restartable: a second call errors.
    /// Errors on a client-streaming session (use
    /// [`receive`](Self::receive)).
    pub fn responses(&self) -> Result<InboundStream> {
        match &self.inbound {
            InboundSide::Queue(slot) => {
                let rx = slot
                    .lock()
                    .unwrap()
                    .take()
                    .ok_or_else(|| Error::StreamClosed("response stream already taken".into()))?;
                Ok(InboundStream { rx, done: false })
            }
            InboundSide::Single(_) => Err(Error::UnsupportedShape {
                method: self.method.clone(),
                shape: self.shape,
            }),
        }
    }
}

/// Blocking iterator over a bidi session's inbound messages.
///
/// Each pull blocks until the transport delivers a data message (yielded)
/// or a terminal event (ends the sequence, surfacing an error as the final
/// item). Yields nothing after termination.
pub struct InboundStream {
    rx: Receiver<InboundEvent>,
    done: bool,
}

impl Iterator for InboundStream {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.rx.recv() {
            Ok(InboundEvent::Message(message)) => Some(Ok(message)),
            Ok(InboundEvent::Closed(None)) => {
                self.done = true;
                None
            }
            Ok(InboundEvent::Closed(Some(status))) => {
                self.done = true;
                Some(Err(Error::Transport(status)))
            }
            // Delivery side dropped without a terminal event; surface it
            // instead of leaving the consumer blocked.
            Err(_) => {
                self.done = true;
                Some(Err(Error::Transport(Status::internal(
                    "stream closed without completion",
                ))))
            }
        }
    }
}
