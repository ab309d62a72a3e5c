//! Delivery-sink implementations of [`CallChannel`].
//!
//! Two inbound behaviors cover every invocation path: resolve a
//! single-shot bridge on the first terminal event, or append every event
//! to a FIFO queue with a synthesized terminal marker. The callback
//! adapters layer the non-blocking path's delivery guarantees on top of a
//! caller-supplied [`ResponseHandler`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::bridge::ReplyResolver;
use crate::message::Message;
use crate::observer::{CallChannel, ResponseHandler};
use crate::status::Status;

/// One element of a streaming session's inbound queue.
#[derive(Debug)]
pub(crate) enum InboundEvent {
    /// A data message, delivered in arrival order.
    Message(Message),
    /// Terminal marker: the stream ended, with a failure if `Some`.
    Closed(Option<Status>),
}

/// Resolves a [`PendingReply`](crate::bridge::PendingReply) on the first
/// terminal event and drops everything after it.
///
/// The transport must not deliver more than one terminal event per
/// unary-shaped exchange; this sink tolerates it rather than corrupting
/// the bridge.
pub(crate) struct BridgeSink {
    resolver: ReplyResolver,
}

impl BridgeSink {
    pub(crate) fn new(resolver: ReplyResolver) -> Self {
        Self { resolver }
    }
}

impl CallChannel for BridgeSink {
    fn on_next(&self, message: Message) {
        if !self.resolver.resolve(Ok(message)) {
            tracing::debug!("reply after resolution dropped");
        }
    }

    fn on_error(&self, status: Status) {
        self.resolver.resolve(Err(status));
    }

    fn on_completed(&self) {
        // Completion after the reply is the normal unary shutdown; this
        // only resolves when the stream ends with no reply at all.
        self.resolver
            .resolve(Err(Status::internal("stream completed without a response")));
    }
}

/// Appends every event to the inbound queue in arrival order, synthesizing
/// the terminal marker so the consumer can tell "more data later" from
/// "stream ended".
pub(crate) struct QueueSink {
    tx: Sender<InboundEvent>,
}

impl QueueSink {
    pub(crate) fn new(tx: Sender<InboundEvent>) -> Self {
        Self { tx }
    }
}

impl CallChannel for QueueSink {
    fn on_next(&self, message: Message) {
        let _ = self.tx.send(InboundEvent::Message(message));
    }

    fn on_error(&self, status: Status) {
        let _ = self.tx.send(InboundEvent::Closed(Some(status)));
    }

    fn on_completed(&self) {
        let _ = self.tx.send(InboundEvent::Closed(None));
    }
}

/// Non-blocking unary adapter: at most one `on_message`/`on_error` reaches
/// the handler, and at most one finalization.
///
/// Only one event is ever expected here, but the gate is kept: the
/// delivery thread and a concurrent teardown path must not both finalize
/// the handler, and a misbehaving transport must not reach it twice.
pub(crate) struct UnaryCallbackSink {
    handler: Arc<dyn ResponseHandler>,
    replied: AtomicBool,
    finished: AtomicBool,
}

impl UnaryCallbackSink {
    pub(crate) fn new(handler: Arc<dyn ResponseHandler>) -> Self {
        Self {
            handler,
            replied: AtomicBool::new(false),
            finished: AtomicBool::new(false),
        }
    }
}

impl CallChannel for UnaryCallbackSink {
    fn on_next(&self, message: Message) {
        if self.replied.swap(true, Ordering::AcqRel) {
            tracing::debug!("duplicate unary reply dropped");
            return;
        }
        self.handler.on_message(message);
    }

    fn on_error(&self, status: Status) {
        if self.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        self.replied.store(true, Ordering::Release);
        self.handler.on_error(status);
    }

    fn on_completed(&self) {
        if self.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        self.handler.on_complete();
    }
}

/// Server-streaming adapter: forwards every message in arrival order until
/// one terminal event; nothing reaches the handler afterwards.
pub(crate) struct StreamingCallbackSink {
    handler: Arc<dyn ResponseHandler>,
    finished: AtomicBool,
}

impl StreamingCallbackSink {
    pub(crate) fn new(handler: Arc<dyn ResponseHandler>) -> Self {
        Self {
            handler,
            finished: AtomicBool::new(false),
        }
    }
}

impl CallChannel for StreamingCallbackSink {
    fn on_next(&self, message: Message) {
        if self.finished.load(Ordering::Acquire) {
            tracing::debug!("message after stream termination dropped");
            return;
        }
        self.handler.on_message(message);
    }

    fn on_error(&self, status: Status) {
        if !self.finished.swap(true, Ordering::AcqRel) {
            self.handler.on_error(status);
        }
    }

    fn on_completed(&self) {
        if !self.finished.swap(true, Ordering::AcqRel) {
            self.handler.on_complete();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::pending_reply;
    use bytes::Bytes;
    use crossbeam_channel::unbounded;
    use std::sync::Mutex;

    fn data(payload: &'static [u8]) -> Message {
        Message::data("Reply", Bytes::from_static(payload))
    }

    #[derive(Default)]
    struct RecordingHandler {
        events: Mutex<Vec<String>>,
    }

    impl RecordingHandler {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ResponseHandler for RecordingHandler {
        fn on_message(&self, message: Message) {
            self.events
                .lock()
                .unwrap()
                .push(format!("message:{:?}", message.payload()));
        }

        fn on_error(&self, status: Status) {
            self.events.lock().unwrap().push(format!("error:{status}"));
        }

        fn on_complete(&self) {
            self.events.lock().unwrap().push("complete".to_string());
        }
    }

    #[test]
    fn bridge_sink_resolves_on_data() {
        let (resolver, reply) = pending_reply();
        let sink = BridgeSink::new(resolver);
        sink.on_next(data(b"one"));
        sink.on_completed();
        assert_eq!(reply.wait().unwrap().payload().as_ref(), b"one");
    }

    #[test]
    fn bridge_sink_first_event_wins_on_double_delivery() {
        let (resolver, reply) = pending_reply();
        let sink = BridgeSink::new(resolver);
        sink.on_next(data(b"first"));
        sink.on_error(Status::internal("late error"));
        assert_eq!(reply.wait().unwrap().payload().as_ref(), b"first");
    }

    #[test]
    fn bridge_sink_error_before_data_wins() {
        let (resolver, reply) = pending_reply();
        let sink = BridgeSink::new(resolver);
        sink.on_error(Status::unavailable("reset"));
        sink.on_next(data(b"late"));
        assert!(reply.wait().is_err());
    }

    #[test]
    fn bridge_sink_empty_completion_is_a_failure() {
        let (resolver, reply) = pending_reply();
        let sink = BridgeSink::new(resolver);
        sink.on_completed();
        let status = reply.wait().unwrap_err();
        assert!(status.to_string().contains("without a response"));
    }

    #[test]
    fn queue_sink_appends_in_order_and_terminates() {
        let (tx, rx) = unbounded();
        let sink = QueueSink::new(tx);
        sink.on_next(data(b"m1"));
        sink.on_next(data(b"m2"));
        sink.on_completed();

        assert!(matches!(rx.recv().unwrap(), InboundEvent::Message(ref m) if m.payload().as_ref() == b"m1"));
        assert!(matches!(rx.recv().unwrap(), InboundEvent::Message(ref m) if m.payload().as_ref() == b"m2"));
        assert!(matches!(rx.recv().unwrap(), InboundEvent::Closed(None)));
    }

    #[test]
    fn queue_sink_terminal_error_is_carried() {
        let (tx, rx) = unbounded();
        let sink = QueueSink::new(tx);
        sink.on_error(Status::cancelled("bye"));
        assert!(matches!(rx.recv().unwrap(), InboundEvent::Closed(Some(_))));
    }

    #[test]
    fn unary_callback_normal_flow() {
        let handler = Arc::new(RecordingHandler::default());
        let sink = UnaryCallbackSink::new(handler.clone());
        sink.on_next(data(b"r"));
        sink.on_completed();
        assert_eq!(handler.events(), vec!["message:b\"r\"", "complete"]);
    }

    #[test]
    fn unary_callback_drops_duplicate_reply() {
        let handler = Arc::new(RecordingHandler::default());
        let sink = UnaryCallbackSink::new(handler.clone());
        sink.on_next(data(b"a"));
        sink.on_next(data(b"b"));
        sink.on_completed();
        assert_eq!(handler.events(), vec!["message:b\"a\"", "complete"]);
    }

    #[test]
    fn unary_callback_single_finalization() {
        let handler = Arc::new(RecordingHandler::default());
        let sink = UnaryCallbackSink::new(handler.clone());
        sink.on_error(Status::internal("boom"));
        sink.on_completed();
        assert_eq!(handler.events(), vec!["error:INTERNAL: boom"]);
    }

    #[test]
    fn streaming_callback_forwards_until_terminal() {
        let handler = Arc::new(RecordingHandler::default());
        let sink = StreamingCallbackSink::new(handler.clone());
        sink.on_next(data(b"1"));
        sink.on_next(data(b"2"));
        sink.on_completed();
        sink.on_next(data(b"3"));
        sink.on_error(Status::internal("late"));
        assert_eq!(
            handler.events(),
            vec!["message:b\"1\"", "message:b\"2\"", "complete"]
        );
    }
}
