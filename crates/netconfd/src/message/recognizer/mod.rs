//! Turns a framed chunk of XML into a [`Message`].
//!
//! The recognizer walks `quick-xml` events and feeds them to an explicit
//! [`ParseState`]. Element names are compared by local name without regard to
//! case, so namespace prefixes on the wire do not matter. Only the first
//! complete `<hello>` or `<rpc>` in a chunk is reported.

mod state;

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use thiserror::Error;

use super::Message;
use state::{Attribute, ParseState};

/// Errors raised while recognizing a chunk.
#[derive(Debug, Error)]
pub enum RecognizeError {
    /// The chunk is not well-formed XML.
    #[error("malformed XML: {message}")]
    Malformed {
        /// Parser diagnostic.
        message: String,
    },
    /// An `<rpc>` element arrived without a `message-id` attribute.
    #[error("received <rpc> message without a message ID")]
    MissingMessageId,
    /// An `<rpc>` element closed without any operation element.
    #[error("rpc {message_id} carries no operation element")]
    MissingOperation {
        /// Identifier of the offending request.
        message_id: String,
    },
    /// The chunk ended before a `<hello>` or `<rpc>` element completed.
    #[error("chunk ended before a hello or rpc element completed")]
    Incomplete,
}

impl RecognizeError {
    fn malformed(error: impl std::fmt::Display) -> Self {
        Self::Malformed {
            message: error.to_string(),
        }
    }
}

/// Recognizes the first `<hello>` or `<rpc>` message in `chunk`.
///
/// # Errors
///
/// Returns [`RecognizeError`] when the XML is malformed, when an `<rpc>`
/// lacks its `message-id` or operation, or when no message completes.
pub fn recognize(chunk: &str) -> Result<Message, RecognizeError> {
    let mut reader = Reader::from_str(chunk);
    let mut state = ParseState::new();
    loop {
        let event = reader.read_event().map_err(RecognizeError::malformed)?;
        let completed = match event {
            Event::Start(tag) => {
                let (name, attributes) = read_tag(&tag)?;
                state.on_start(&name, &attributes)?;
                None
            }
            Event::Empty(tag) => {
                let (name, attributes) = read_tag(&tag)?;
                state.on_start(&name, &attributes)?;
                state.on_end(&name)?
            }
            Event::End(tag) => {
                let name = decode(tag.local_name().into_inner())?;
                state.on_end(&name)?
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(RecognizeError::malformed)?;
                state.on_text(&text);
                None
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                state.on_text(&decode(&bytes)?);
                None
            }
            Event::Eof => return Err(RecognizeError::Incomplete),
            _ => None,
        };
        if let Some(message) = completed {
            return Ok(message);
        }
    }
}

fn read_tag(tag: &BytesStart<'_>) -> Result<(String, Vec<Attribute>), RecognizeError> {
    let name = decode(tag.local_name().into_inner())?.into_owned();
    let mut attributes = Vec::new();
    for attribute in tag.attributes() {
        let attribute = attribute.map_err(RecognizeError::malformed)?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = decode(attribute.key.into_inner())?.into_owned();
        let value = attribute
            .unescape_value()
            .map_err(RecognizeError::malformed)?
            .into_owned();
        attributes.push((key, value));
    }
    Ok((name, attributes))
}

fn decode(bytes: &[u8]) -> Result<Cow<'_, str>, RecognizeError> {
    std::str::from_utf8(bytes)
        .map(Cow::Borrowed)
        .map_err(RecognizeError::malformed)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::message::{RpcRequest, SchemaDetails};

    const DNS_EDIT: &str = concat!(
        "<rpc message-id=\"101\" xmlns=\"urn:ietf:params:xml:ns:netconf:base:1.0\">",
        "<edit-config><target><running/></target>",
        "<target-name>dns1</target-name>",
        "<config><a>x</a></config></edit-config></rpc>\n",
    );

    const TURBO_SCHEMA: &str = concat!(
        "<rpc message-id=\"55\">",
        "<get-schema xmlns=\"urn:ietf:params:xml:ns:yang:ietf-netconf-monitoring\">",
        "<identifier> turbo </identifier><version>2020-01-01</version>",
        "</get-schema></rpc>\n",
    );

    fn rpc(chunk: &str) -> RpcRequest {
        match recognize(chunk) {
            Ok(Message::Rpc(request)) => request,
            other => panic!("expected rpc, got {other:?}"),
        }
    }

    #[test]
    fn recognizes_edit_config_with_target_name() {
        let request = rpc(DNS_EDIT);
        assert_eq!(request.message_id, "101");
        assert_eq!(request.operation, "edit-config");
        assert_eq!(request.datastore, "running");
        assert_eq!(request.target_name.as_deref(), Some("dns1"));
        assert_eq!(
            request.raw_content,
            concat!(
                "<edit-config><target><running></running></target>",
                "<target-name>dns1</target-name>",
                "<config><a>x</a></config></edit-config>",
            )
        );
        assert!(request.schema_details.is_none());
    }

    #[test]
    fn target_name_inside_target_is_also_the_datastore() {
        let request = rpc(
            "<rpc message-id=\"101\"><edit-config><target><target-name>dns1</target-name></target></edit-config></rpc>\n",
        );
        assert_eq!(request.message_id, "101");
        assert_eq!(request.operation, "edit-config");
        assert_eq!(request.datastore, "target-name");
        assert_eq!(request.target_name.as_deref(), Some("dns1"));
    }

    #[test]
    fn recognizes_get_schema_details() {
        let request = rpc(TURBO_SCHEMA);
        assert!(request.is_get_schema());
        assert_eq!(request.schema_identifier(), Some("turbo"));
        assert_eq!(
            request.schema_details,
            Some(SchemaDetails {
                identifier: Some("turbo".to_owned()),
                version: Some("2020-01-01".to_owned()),
                format: None,
            })
        );
    }

    #[rstest]
    #[case("<hello><capabilities/></hello>")]
    #[case("<nc:hello xmlns:nc=\"urn:ietf:params:xml:ns:netconf:base:1.0\"></nc:hello>")]
    #[case("<HELLO/>")]
    fn recognizes_hello(#[case] chunk: &str) {
        assert!(matches!(recognize(chunk), Ok(Message::Hello)));
    }

    #[test]
    fn datastore_defaults_when_absent() {
        let request = rpc("<rpc message-id=\"1\"><get/></rpc>");
        assert_eq!(request.operation, "get");
        assert_eq!(request.datastore, "NA");
        assert!(request.target_name.is_none());
        assert_eq!(request.raw_content, "<get></get>");
    }

    #[test]
    fn source_sets_datastore_and_attributes_are_kept() {
        let request = rpc(concat!(
            "<rpc message-id=\"7\"><get-config><source><candidate/></source>",
            "<filter type=\"subtree\">a &amp; b</filter></get-config></rpc>",
        ));
        assert_eq!(request.datastore, "candidate");
        assert_eq!(
            request.raw_content,
            concat!(
                "<get-config><source><candidate></candidate></source>",
                "<filter type=\"subtree\">a & b</filter></get-config>",
            )
        );
    }

    #[test]
    fn prefixed_elements_match_by_local_name() {
        let request = rpc(concat!(
            "<nc:rpc xmlns:nc=\"urn:ietf:params:xml:ns:netconf:base:1.0\" message-id=\"9\">",
            "<nc:lock><nc:target><nc:candidate/></nc:target></nc:lock></nc:rpc>",
        ));
        assert_eq!(request.message_id, "9");
        assert_eq!(request.operation, "lock");
        assert_eq!(request.datastore, "candidate");
    }

    #[test]
    fn missing_message_id_is_rejected() {
        let result = recognize("<rpc><get/></rpc>");
        assert!(matches!(result, Err(RecognizeError::MissingMessageId)));
    }

    #[test]
    fn missing_operation_is_rejected() {
        let result = recognize("<rpc message-id=\"3\"></rpc>");
        assert!(matches!(
            result,
            Err(RecognizeError::MissingOperation { message_id }) if message_id == "3"
        ));
    }

    #[rstest]
    #[case("<rpc message-id=\"1\"><get>")]
    #[case("")]
    #[case("<other/>")]
    fn unfinished_chunks_are_incomplete(#[case] chunk: &str) {
        assert!(matches!(recognize(chunk), Err(RecognizeError::Incomplete)));
    }

    #[test]
    fn mismatched_tags_are_malformed() {
        let result = recognize("<rpc message-id=\"1\"><get></rpc>");
        assert!(matches!(result, Err(RecognizeError::Malformed { .. })));
    }

    #[test]
    fn only_the_first_message_is_reported() {
        let request = rpc("<rpc message-id=\"1\"><get/></rpc><rpc message-id=\"2\"><lock/></rpc>");
        assert_eq!(request.message_id, "1");
        assert_eq!(request.operation, "get");
    }
}
