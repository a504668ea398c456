//! Framed, placeholder-substituted output to the client.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use super::errors::DispatchError;
use crate::session::END_OF_MESSAGE;

/// Placeholders replaced by the request's message identifier.
pub const MESSAGE_ID_PLACEHOLDERS: [&str; 2] = ["<MID/>", "<MID>"];

/// Replaces every message-id placeholder in `template` with `message_id`.
#[must_use]
pub fn substitute_message_id(template: &str, message_id: &str) -> String {
    MESSAGE_ID_PLACEHOLDERS
        .iter()
        .fold(template.to_owned(), |text, placeholder| {
            text.replace(placeholder, message_id)
        })
}

/// Shared writer that frames each payload with `]]>]]>`.
///
/// Clones write to the same stream; each frame is written and flushed under
/// one lock so frames never interleave.
#[derive(Clone)]
pub struct ResponseWriter {
    output: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl ResponseWriter {
    /// Wraps `output`.
    pub fn new(output: impl Write + Send + 'static) -> Self {
        Self {
            output: Arc::new(Mutex::new(Box::new(output))),
        }
    }

    /// Writes `payload` followed by the end-of-message marker, then flushes.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Io`] when the write or flush fails.
    pub fn write_frame(&self, payload: &str) -> Result<(), DispatchError> {
        let mut output = self
            .output
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        output.write_all(payload.as_bytes())?;
        output.write_all(END_OF_MESSAGE.as_bytes())?;
        output.flush()?;
        Ok(())
    }

    /// Substitutes `message_id` into `template` and writes the frame.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Io`] when the write or flush fails.
    pub fn write_reply(&self, template: &str, message_id: &str) -> Result<(), DispatchError> {
        self.write_frame(&substitute_message_id(template, message_id))
    }
}

impl fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseWriter").finish_non_exhaustive()
    }
}
