//! Parser state threaded through the recognizer's event handlers.

use std::mem;

use super::super::{Message, RpcRequest, SchemaDetails};
use super::RecognizeError;

const HELLO: &str = "hello";
const RPC: &str = "rpc";
const MESSAGE_ID: &str = "message-id";
const TARGET: &str = "target";
const SOURCE: &str = "source";
const TARGET_NAME: &str = "target-name";
const IDENTIFIER: &str = "identifier";
const VERSION: &str = "version";
const FORMAT: &str = "format";
const GET_SCHEMA: &str = "get-schema";

/// Attribute as written on a start tag: qualified name and unescaped value.
pub(super) type Attribute = (String, String);

/// Recognizer state for a single chunk.
pub(super) enum ParseState {
    Idle,
    Hello { depth: usize },
    Rpc(Box<RpcScan>),
}

impl ParseState {
    pub(super) const fn new() -> Self {
        Self::Idle
    }

    pub(super) fn on_start(
        &mut self,
        name: &str,
        attributes: &[Attribute],
    ) -> Result<(), RecognizeError> {
        match self {
            Self::Idle => {
                if name.eq_ignore_ascii_case(HELLO) {
                    *self = Self::Hello { depth: 0 };
                } else if name.eq_ignore_ascii_case(RPC) {
                    let message_id = attributes
                        .iter()
                        .find(|(key, _)| key == MESSAGE_ID)
                        .map(|(_, value)| value.clone())
                        .ok_or(RecognizeError::MissingMessageId)?;
                    *self = Self::Rpc(Box::new(RpcScan::new(message_id)));
                }
            }
            Self::Hello { depth } => *depth += 1,
            Self::Rpc(scan) => scan.on_start(name, attributes),
        }
        Ok(())
    }

    pub(super) fn on_text(&mut self, text: &str) {
        if let Self::Rpc(scan) = self {
            scan.on_text(text);
        }
    }

    pub(super) fn on_end(&mut self, name: &str) -> Result<Option<Message>, RecognizeError> {
        match self {
            Self::Idle => Ok(None),
            Self::Hello { depth: 0 } => {
                *self = Self::Idle;
                Ok(Some(Message::Hello))
            }
            Self::Hello { depth } => {
                *depth -= 1;
                Ok(None)
            }
            Self::Rpc(scan) => {
                if scan.depth > 0 {
                    scan.on_end(name);
                    return Ok(None);
                }
                let Self::Rpc(scan) = mem::replace(self, Self::Idle) else {
                    return Ok(None);
                };
                scan.finish().map(|request| Some(Message::Rpc(request)))
            }
        }
    }
}

/// Position of the scanner relative to the operation element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperationScope {
    Pending,
    Open { depth: usize },
    Closed,
}

/// Element whose character content is being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Nothing,
    TargetName,
    Identifier,
    Version,
    Format,
}

/// Accumulated data for an `<rpc>` element.
pub(super) struct RpcScan {
    depth: usize,
    scope: OperationScope,
    request: RpcRequest,
    datastore_nesting: usize,
    capture: Capture,
    text: String,
    schema: Option<SchemaDetails>,
}

impl RpcScan {
    fn new(message_id: String) -> Self {
        Self {
            depth: 0,
            scope: OperationScope::Pending,
            request: RpcRequest::new(message_id, String::new()),
            datastore_nesting: 0,
            capture: Capture::Nothing,
            text: String::new(),
            schema: None,
        }
    }

    fn on_start(&mut self, name: &str, attributes: &[Attribute]) {
        self.depth += 1;
        match self.scope {
            OperationScope::Pending => {
                self.request.operation = name.to_owned();
                self.scope = OperationScope::Open { depth: self.depth };
                if name.eq_ignore_ascii_case(GET_SCHEMA) {
                    self.schema = Some(SchemaDetails::default());
                }
                self.record_start(name, attributes);
            }
            OperationScope::Open { .. } => self.record_start(name, attributes),
            OperationScope::Closed => {}
        }
    }

    fn on_text(&mut self, text: &str) {
        if !matches!(self.scope, OperationScope::Open { .. }) {
            return;
        }
        self.request.raw_content.push_str(text);
        if self.capture != Capture::Nothing {
            self.text.push_str(text);
        }
    }

    fn on_end(&mut self, name: &str) {
        if let OperationScope::Open { depth } = self.scope {
            self.record_end(name);
            if depth == self.depth {
                self.scope = OperationScope::Closed;
                if let Some(schema) = self.schema.take() {
                    self.request.schema_details = Some(schema);
                }
            }
        }
        self.depth -= 1;
    }

    fn record_start(&mut self, name: &str, attributes: &[Attribute]) {
        if self.datastore_nesting > 0 {
            self.request.datastore = name.to_owned();
        }
        if name.eq_ignore_ascii_case(TARGET) || name.eq_ignore_ascii_case(SOURCE) {
            self.datastore_nesting += 1;
        } else if name.eq_ignore_ascii_case(TARGET_NAME) {
            self.begin_capture(Capture::TargetName);
        } else if self.schema.is_some() {
            if name.eq_ignore_ascii_case(IDENTIFIER) {
                self.begin_capture(Capture::Identifier);
            } else if name.eq_ignore_ascii_case(VERSION) {
                self.begin_capture(Capture::Version);
            } else if name.eq_ignore_ascii_case(FORMAT) {
                self.begin_capture(Capture::Format);
            }
        }

        let raw = &mut self.request.raw_content;
        raw.push('<');
        raw.push_str(name);
        for (key, value) in attributes {
            raw.push(' ');
            raw.push_str(key);
            raw.push_str("=\"");
            raw.push_str(value);
            raw.push('"');
        }
        raw.push('>');
    }

    fn record_end(&mut self, name: &str) {
        if name.eq_ignore_ascii_case(TARGET) || name.eq_ignore_ascii_case(SOURCE) {
            self.datastore_nesting = self.datastore_nesting.saturating_sub(1);
        } else if name.eq_ignore_ascii_case(TARGET_NAME) {
            if let Some(value) = self.end_capture(Capture::TargetName) {
                self.request.target_name = Some(value);
            }
        } else if let Some(schema) = self.schema.as_mut() {
            let field = if name.eq_ignore_ascii_case(IDENTIFIER) {
                Some((Capture::Identifier, &mut schema.identifier))
            } else if name.eq_ignore_ascii_case(VERSION) {
                Some((Capture::Version, &mut schema.version))
            } else if name.eq_ignore_ascii_case(FORMAT) {
                Some((Capture::Format, &mut schema.format))
            } else {
                None
            };
            if let Some((capture, slot)) = field
                && self.capture == capture
            {
                *slot = Some(self.text.trim().to_owned());
                self.text.clear();
                self.capture = Capture::Nothing;
            }
        }

        let raw = &mut self.request.raw_content;
        raw.push_str("</");
        raw.push_str(name);
        raw.push('>');
    }

    fn begin_capture(&mut self, capture: Capture) {
        self.capture = capture;
        self.text.clear();
    }

    fn end_capture(&mut self, capture: Capture) -> Option<String> {
        if self.capture != capture {
            return None;
        }
        self.capture = Capture::Nothing;
        let value = self.text.trim().to_owned();
        self.text.clear();
        Some(value)
    }

    fn finish(self) -> Result<RpcRequest, RecognizeError> {
        if self.scope == OperationScope::Pending {
            return Err(RecognizeError::MissingOperation {
                message_id: self.request.message_id,
            });
        }
        Ok(self.request)
    }
}
