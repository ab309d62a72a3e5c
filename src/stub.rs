//! Invocation entry points.
//!
//! A stub pairs a [`Transport`] connection handle with the
//! [`ServiceDefinition`] resolved at endpoint initialization. Every entry
//! point resolves the named method, gates the call through the shared
//! shape-dispatch table, and only then touches the transport.

use std::io;
use std::sync::Arc;

use bytes::Bytes;

use crate::bridge::pending_reply;
use crate::descriptor::{InvocationPath, MethodDescriptor, MethodShape, ServiceDefinition};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::metadata::Metadata;
use crate::observer::ResponseHandler;
use crate::session::StreamingSession;
use crate::sink::{BridgeSink, QueueSink, StreamingCallbackSink, UnaryCallbackSink};
use crate::status::Status;
use crate::transport::Transport;

/// Stub for synchronous call-and-wait invocation. Unary methods only.
pub struct BlockingStub {
    transport: Arc<dyn Transport>,
    service: ServiceDefinition,
}

impl BlockingStub {
    /// Create a blocking stub over an established connection.
    pub fn new(transport: Arc<dyn Transport>, service: ServiceDefinition) -> Self {
        Self { transport, service }
    }

    /// Invoke a unary method and block until its reply or failure.
    ///
    /// If submission to the transport fails before any event can be
    /// delivered, the failure still resolves the pending reply, so this
    /// returns rather than hanging.
    pub fn execute(
        &self,
        method_name: &str,
        payload: Bytes,
        headers: Metadata,
    ) -> Result<Message> {
        let method = self.service.resolve(method_name)?;
        check_shape(method, InvocationPath::Blocking)?;
        tracing::debug!(method = method_name, "blocking unary call");

        let request = Message::data(method.input_type(), payload).with_headers(headers);
        let (resolver, reply) = pending_reply();
        let sink = Arc::new(BridgeSink::new(resolver.clone()));

        if let Err(e) = self.transport.submit_unary(method, request, sink) {
            // Resolve before waiting so the bridge is never left dangling.
            resolver.resolve(Err(connector_status(e)));
        }
        reply.wait().map_err(Error::Transport)
    }
}

/// Stub for the non-blocking invocation paths: callback delivery for unary
/// and server-streaming methods, live sessions for client-streaming and
/// bidi-streaming methods.
pub struct Stub {
    transport: Arc<dyn Transport>,
    service: ServiceDefinition,
}

impl Stub {
    /// Create a non-blocking stub over an established connection.
    pub fn new(transport: Arc<dyn Transport>, service: ServiceDefinition) -> Self {
        Self { transport, service }
    }

    /// Invoke a unary or server-streaming method, delivering replies to
    /// `handler` from transport threads. Returns as soon as the request is
    /// submitted.
    pub fn execute(
        &self,
        method_name: &str,
        payload: Bytes,
        headers: Metadata,
        handler: Arc<dyn ResponseHandler>,
    ) -> Result<()> {
        let method = self.service.resolve(method_name)?;
        check_shape(method, InvocationPath::Callback)?;
        tracing::debug!(method = method_name, shape = %method.shape(), "callback call");

        let request = Message::data(method.input_type(), payload).with_headers(headers);
        let submitted = match method.shape() {
            MethodShape::Unary => self.transport.submit_unary(
                method,
                request,
                Arc::new(UnaryCallbackSink::new(handler)),
            ),
            MethodShape::ServerStreaming => self.transport.submit_server_streaming(
                method,
                request,
                Arc::new(StreamingCallbackSink::new(handler)),
            ),
            // check_shape only admits the two shapes above.
            MethodShape::ClientStreaming | MethodShape::BidiStreaming => unreachable!(),
        };
        submitted.map_err(|e| Error::Transport(connector_status(e)))
    }

    /// Open a client-streaming or bidi-streaming session.
    pub fn open_stream(&self, method_name: &str, headers: Metadata) -> Result<StreamingSession> {
        let method = self.service.resolve(method_name)?;
        check_shape(method, InvocationPath::Streaming)?;
        tracing::debug!(method = method_name, shape = %method.shape(), "opening stream");

        match method.shape() {
            MethodShape::ClientStreaming => {
                let (resolver, reply) = pending_reply();
                let sink = Arc::new(BridgeSink::new(resolver));
                let outbound = self
                    .transport
                    .open_client_streaming(method, headers, sink)
                    .map_err(|e| Error::Transport(connector_status(e)))?;
                Ok(StreamingSession::client_streaming(
                    method.name(),
                    method.input_type(),
                    outbound,
                    reply,
                ))
            }
            MethodShape::BidiStreaming => {
                let (tx, rx) = crossbeam_channel::unbounded();
                let sink = Arc::new(QueueSink::new(tx));
                let outbound = self
                    .transport
                    .open_bidi_streaming(method, headers, sink)
                    .map_err(|e| Error::Transport(connector_status(e)))?;
                Ok(StreamingSession::bidi_streaming(
                    method.name(),
                    method.input_type(),
                    outbound,
                    rx,
                ))
            }
            // check_shape only admits the two shapes above.
            MethodShape::Unary | MethodShape::ServerStreaming => unreachable!(),
        }
    }
}

fn check_shape(method: &MethodDescriptor, path: InvocationPath) -> Result<()> {
    if method.shape().supports(path) {
        Ok(())
    } else {
        Err(Error::UnsupportedShape {
            method: method.name().to_owned(),
            shape: method.shape(),
        })
    }
}

fn connector_status(e: io::Error) -> Status {
    Status::internal(format!("client connector error: {e}"))
}
