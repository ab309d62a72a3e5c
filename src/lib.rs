//! stubless - descriptor-driven gRPC client invocation.
//!
//! This crate is the client half of an RPC protocol layered over a
//! multiplexed bidirectional transport (conceptually HTTP/2). Callers
//! invoke a remotely-described method by name; the method's shape and wire
//! types are resolved from an injected service descriptor at call time, so
//! no per-method stub code is generated or compiled.
//!
//! # Architecture
//!
//! - [`ServiceDefinition`] parses a serialized `FileDescriptorProto` (plus
//!   its dependencies) once per endpoint and resolves method names to
//!   [`MethodDescriptor`]s.
//! - [`BlockingStub::execute`] runs unary calls by parking the caller on a
//!   single-assignment bridge that the transport's delivery thread
//!   resolves.
//! - [`Stub::execute`] runs unary and server-streaming calls by
//!   registering a caller-supplied [`ResponseHandler`] and returning
//!   immediately.
//! - [`Stub::open_stream`] runs client-streaming and bidi-streaming calls,
//!   returning a live [`StreamingSession`] whose outbound side the caller
//!   drives and whose inbound side a transport thread fills concurrently.
//!
//! The transport itself (connections, TLS, framing, flow control,
//! timeouts) sits behind the [`Transport`] trait; payloads are opaque
//! [`bytes::Bytes`] produced and consumed by an external codec.

mod bridge;
mod descriptor;
mod error;
mod message;
mod metadata;
mod observer;
mod session;
mod sink;
mod status;
mod stub;
mod transport;

pub mod proto;

pub use bridge::{pending_reply, CallOutcome, PendingReply, ReplyResolver};
pub use descriptor::{InvocationPath, MethodDescriptor, MethodShape, ServiceDefinition};
pub use error::{Error, Result};
pub use message::Message;
pub use metadata::Metadata;
pub use observer::{CallChannel, ResponseHandler};
pub use session::{InboundStream, StreamingSession};
pub use status::{Code, Status};
pub use stub::{BlockingStub, Stub};
pub use transport::Transport;
