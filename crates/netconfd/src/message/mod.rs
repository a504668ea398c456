//! Typed NETCONF messages produced by the recognizer.
//!
//! A [`Message`] is built while one framed chunk is scanned, handed to the
//! session's request queue when the chunk's top-level element closes, and
//! dropped once the dispatcher has answered (or suppressed) it.

mod recognizer;

pub use recognizer::{RecognizeError, recognize};

/// Operation name that carries schema lookup parameters.
pub const GET_SCHEMA_OPERATION: &str = "get-schema";

/// Operation name that suppresses further events to its target.
pub const EDIT_CONFIG_OPERATION: &str = "edit-config";

/// Datastore recorded when the request names no `target` or `source`.
pub const DEFAULT_DATASTORE: &str = "NA";

/// Message recognised from a single framed chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Client `<hello>`; answered with the server hello.
    Hello,
    /// Client `<rpc>` request.
    Rpc(RpcRequest),
}

/// Parameters of a `<get-schema>` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDetails {
    /// Schema identifier; absent identifiers make the schema reply a no-op.
    pub identifier: Option<String>,
    /// Requested schema version.
    pub version: Option<String>,
    /// Requested schema format.
    pub format: Option<String>,
}

/// RPC request extracted from an `<rpc>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcRequest {
    /// Value of the `message-id` attribute, echoed in the reply.
    pub message_id: String,
    /// Local name of the first child of `<rpc>`.
    pub operation: String,
    /// Re-serialised operation subtree, attributes included.
    pub raw_content: String,
    /// Local name of the element nested in `<target>` or `<source>`.
    pub datastore: String,
    /// Content of a `<target-name>` element, when present.
    pub target_name: Option<String>,
    /// Present only for `get-schema`.
    pub schema_details: Option<SchemaDetails>,
}

impl RpcRequest {
    /// Creates a request with the default datastore and no optional parts.
    #[must_use]
    pub fn new(message_id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            operation: operation.into(),
            raw_content: String::new(),
            datastore: DEFAULT_DATASTORE.to_owned(),
            target_name: None,
            schema_details: None,
        }
    }

    /// Returns true when the request is a `get-schema`.
    #[must_use]
    pub fn is_get_schema(&self) -> bool {
        self.operation == GET_SCHEMA_OPERATION
    }

    /// Identifier of a `get-schema` request, if one was supplied.
    #[must_use]
    pub fn schema_identifier(&self) -> Option<&str> {
        self.schema_details
            .as_ref()
            .and_then(|details| details.identifier.as_deref())
    }
}
