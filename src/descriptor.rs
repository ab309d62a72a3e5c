//! Service descriptor parsing and the method registry.
//!
//! A [`ServiceDefinition`] is built once per client endpoint from a root
//! `FileDescriptorProto` plus the serialized descriptors of its transitive
//! dependencies, and is then shared read-only across every call issued
//! through that endpoint. Calls resolve a [`MethodDescriptor`] by simple
//! method name; the descriptor's [`MethodShape`] decides which invocation
//! path is legal for the lifetime of the definition.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{Error, Result};
use crate::proto;

/// Request/response cardinality of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodShape {
    /// One request, one response.
    Unary,
    /// One request, a stream of responses.
    ServerStreaming,
    /// A stream of requests, one response.
    ClientStreaming,
    /// Independent request and response streams.
    BidiStreaming,
}

/// The invocation paths a caller can enter the engine through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationPath {
    /// Synchronous call-and-wait (unary only).
    Blocking,
    /// Callback-sink delivery (unary and server-streaming).
    Callback,
    /// Live session handle (client-streaming and bidi-streaming).
    Streaming,
}

impl MethodShape {
    fn from_flags(client_streaming: bool, server_streaming: bool) -> Self {
        match (client_streaming, server_streaming) {
            (false, false) => MethodShape::Unary,
            (false, true) => MethodShape::ServerStreaming,
            (true, false) => MethodShape::ClientStreaming,
            (true, true) => MethodShape::BidiStreaming,
        }
    }

    /// The shape-dispatch table shared by every invocation entry point:
    /// which paths may execute a method of this shape.
    pub fn supports(self, path: InvocationPath) -> bool {
        match self {
            MethodShape::Unary => {
                matches!(path, InvocationPath::Blocking | InvocationPath::Callback)
            }
            MethodShape::ServerStreaming => matches!(path, InvocationPath::Callback),
            MethodShape::ClientStreaming | MethodShape::BidiStreaming => {
                matches!(path, InvocationPath::Streaming)
            }
        }
    }
}

impl fmt::Display for MethodShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MethodShape::Unary => "UNARY",
            MethodShape::ServerStreaming => "SERVER_STREAMING",
            MethodShape::ClientStreaming => "CLIENT_STREAMING",
            MethodShape::BidiStreaming => "BIDI_STREAMING",
        };
        f.write_str(name)
    }
}

/// One remotely invocable method.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    name: String,
    path: String,
    input_type: String,
    output_type: String,
    shape: MethodShape,
}

impl MethodDescriptor {
    /// Simple method name, unique within the service definition.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full request path, `"/package.Service/Method"`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Simple name of the request wire type.
    pub fn input_type(&self) -> &str {
        &self.input_type
    }

    /// Simple name of the response wire type.
    pub fn output_type(&self) -> &str {
        &self.output_type
    }

    /// Request/response cardinality.
    pub fn shape(&self) -> MethodShape {
        self.shape
    }
}

/// Immutable method-name → descriptor registry for one service endpoint.
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
    methods: HashMap<String, MethodDescriptor>,
}

impl ServiceDefinition {
    /// Build a definition from a serialized root `FileDescriptorProto` and
    /// the serialized descriptors of its dependencies, keyed by file name.
    ///
    /// Every transitive dependency named by the root (or by another
    /// dependency) must be present and parseable; message types referenced
    /// by a method must be declared by one of the parsed files; and simple
    /// method names must be unique across the root file's services.
    pub fn new(root: &[u8], dependencies: &HashMap<String, Vec<u8>>) -> Result<Self> {
        let root_file = FileProto::parse(root)
            .ok_or_else(|| Error::Descriptor("malformed root descriptor".into()))?;

        let mut types = HashSet::new();
        root_file.collect_types(&mut types);

        // Walk the transitive dependency closure.
        let mut pending: Vec<String> = root_file.dependencies.clone();
        let mut visited = HashSet::new();
        while let Some(file_name) = pending.pop() {
            if !visited.insert(file_name.clone()) {
                continue;
            }
            let bytes = dependencies.get(&file_name).ok_or_else(|| {
                Error::Descriptor(format!("missing dependency descriptor '{file_name}'"))
            })?;
            let file = FileProto::parse(bytes).ok_or_else(|| {
                Error::Descriptor(format!("malformed dependency descriptor '{file_name}'"))
            })?;
            file.collect_types(&mut types);
            pending.extend(file.dependencies.iter().cloned());
        }

        let mut methods = HashMap::new();
        for service in &root_file.services {
            for method in &service.methods {
                for type_ref in [&method.input_type, &method.output_type] {
                    if !types.contains(type_ref.as_str()) {
                        return Err(Error::Descriptor(format!(
                            "unresolved type reference '{type_ref}' in method '{}'",
                            method.name
                        )));
                    }
                }
                let descriptor = MethodDescriptor {
                    name: method.name.clone(),
                    path: request_path(&root_file.package, &service.name, &method.name),
                    input_type: simple_name(&method.input_type).to_owned(),
                    output_type: simple_name(&method.output_type).to_owned(),
                    shape: MethodShape::from_flags(
                        method.client_streaming,
                        method.server_streaming,
                    ),
                };
                if methods.insert(method.name.clone(), descriptor).is_some() {
                    return Err(Error::Descriptor(format!(
                        "duplicate method name '{}'",
                        method.name
                    )));
                }
            }
        }

        tracing::debug!(methods = methods.len(), "service definition built");
        Ok(Self { methods })
    }

    /// Look up a method by simple name.
    pub fn resolve(&self, method_name: &str) -> Result<&MethodDescriptor> {
        self.methods
            .get(method_name)
            .ok_or_else(|| Error::NotFound(method_name.to_owned()))
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Check if the definition registered no methods.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

fn request_path(package: &str, service: &str, method: &str) -> String {
    if package.is_empty() {
        format!("/{service}/{method}")
    } else {
        format!("/{package}.{service}/{method}")
    }
}

fn simple_name(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

// ── FileDescriptorProto subset ───────────────────────────────────────────
//
// Field numbers per descriptor.proto: FileDescriptorProto { package = 2,
// dependency = 3, message_type = 4, service = 6 }, DescriptorProto
// { name = 1, nested_type = 3 }, ServiceDescriptorProto { name = 1,
// method = 2 }, MethodDescriptorProto { name = 1, input_type = 2,
// output_type = 3, client_streaming = 5, server_streaming = 6 }.

#[derive(Debug, Default)]
struct FileProto {
    package: String,
    dependencies: Vec<String>,
    messages: Vec<MessageProto>,
    services: Vec<ServiceProto>,
}

#[derive(Debug, Default)]
struct MessageProto {
    name: String,
    nested: Vec<MessageProto>,
}

#[derive(Debug, Default)]
struct ServiceProto {
    name: String,
    methods: Vec<MethodProto>,
}

#[derive(Debug, Default)]
struct MethodProto {
    name: String,
    input_type: String,
    output_type: String,
    client_streaming: bool,
    server_streaming: bool,
}

impl FileProto {
    fn parse(mut buf: &[u8]) -> Option<Self> {
        let mut file = FileProto::default();
        while !buf.is_empty() {
            let (field, wire) = proto::read_tag(&mut buf)?;
            match (field, wire) {
                (2, proto::WIRE_LEN) => file.package = proto::read_string(&mut buf)?,
                (3, proto::WIRE_LEN) => file.dependencies.push(proto::read_string(&mut buf)?),
                (4, proto::WIRE_LEN) => {
                    file.messages
                        .push(parse_message(proto::read_len_delimited(&mut buf)?)?);
                }
                (6, proto::WIRE_LEN) => {
                    file.services
                        .push(parse_service(proto::read_len_delimited(&mut buf)?)?);
                }
                _ => proto::skip_field(wire, &mut buf)?,
            }
        }
        Some(file)
    }

    /// Add every message type declared by this file to `types`, as
    /// fully-qualified leading-dot names (nested messages included).
    fn collect_types(&self, types: &mut HashSet<String>) {
        fn walk(prefix: &str, message: &MessageProto, types: &mut HashSet<String>) {
            let qualified = format!("{prefix}.{}", message.name);
            for nested in &message.nested {
                walk(&qualified, nested, types);
            }
            types.insert(qualified);
        }
        let prefix = if self.package.is_empty() {
            String::new()
        } else {
            format!(".{}", self.package)
        };
        for message in &self.messages {
            walk(&prefix, message, types);
        }
    }
}

fn parse_message(mut buf: &[u8]) -> Option<MessageProto> {
    let mut message = MessageProto::default();
    while !buf.is_empty() {
        let (field, wire) = proto::read_tag(&mut buf)?;
        match (field, wire) {
            (1, proto::WIRE_LEN) => message.name = proto::read_string(&mut buf)?,
            (3, proto::WIRE_LEN) => {
                message
                    .nested
                    .push(parse_message(proto::read_len_delimited(&mut buf)?)?);
            }
            _ => proto::skip_field(wire, &mut buf)?,
        }
    }
    Some(message)
}

fn parse_service(mut buf: &[u8]) -> Option<ServiceProto> {
    let mut service = ServiceProto::default();
    while !buf.is_empty() {
        let (field, wire) = proto::read_tag(&mut buf)?;
        match (field, wire) {
            (1, proto::WIRE_LEN) => service.name = proto::read_string(&mut buf)?,
            (2, proto::WIRE_LEN) => {
                service
                    .methods
                    .push(parse_method(proto::read_len_delimited(&mut buf)?)?);
            }
            _ => proto::skip_field(wire, &mut buf)?,
        }
    }
    Some(service)
}

fn parse_method(mut buf: &[u8]) -> Option<MethodProto> {
    let mut method = MethodProto::default();
    while !buf.is_empty() {
        let (field, wire) = proto::read_tag(&mut buf)?;
        match (field, wire) {
            (1, proto::WIRE_LEN) => method.name = proto::read_string(&mut buf)?,
            (2, proto::WIRE_LEN) => method.input_type = proto::read_string(&mut buf)?,
            (3, proto::WIRE_LEN) => method.output_type = proto::read_string(&mut buf)?,
            (5, proto::WIRE_VARINT) => {
                method.client_streaming = proto::read_varint(&mut buf)? != 0;
            }
            (6, proto::WIRE_VARINT) => {
                method.server_streaming = proto::read_varint(&mut buf)? != 0;
            }
            _ => proto::skip_field(wire, &mut buf)?,
        }
    }
    Some(method)
}
