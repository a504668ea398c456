//! Shared helpers for unit tests.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::templates::{TemplateError, TemplateStore};

/// In-memory sink whose clones share one buffer.
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8(self.0.lock().expect("buffer lock").clone()).expect("utf8 output")
    }

    pub(crate) fn frames(&self) -> Vec<String> {
        self.contents()
            .split_terminator("]]>]]>")
            .map(str::to_owned)
            .collect()
    }

    /// Polls until at least `count` frames were written or two seconds pass.
    pub(crate) fn wait_for_frames(&self, count: usize) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let frames = self.frames();
            if frames.len() >= count || Instant::now() >= deadline {
                return frames;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Blocking reader fed from a channel; dropping the sender ends the stream.
pub(crate) struct ChannelReader {
    receiver: Receiver<Vec<u8>>,
    pending: Vec<u8>,
}

impl ChannelReader {
    pub(crate) fn new() -> (Sender<Vec<u8>>, Self) {
        let (sender, receiver) = unbounded();
        (
            sender,
            Self {
                receiver,
                pending: Vec::new(),
            },
        )
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.receiver.recv() {
                Ok(bytes) => self.pending = bytes,
                Err(_) => return Ok(0),
            }
        }
        let count = buf.len().min(self.pending.len());
        buf[..count].copy_from_slice(&self.pending[..count]);
        self.pending.drain(..count);
        Ok(count)
    }
}

/// Sink that rejects every write.
pub(crate) struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Template store serving a fixed set of names.
#[derive(Default)]
pub(crate) struct StaticTemplates(HashMap<String, String>);

impl StaticTemplates {
    pub(crate) fn with(mut self, name: &str, text: &str) -> Self {
        self.0.insert(name.to_owned(), text.to_owned());
        self
    }
}

impl TemplateStore for StaticTemplates {
    fn read(&self, name: &str) -> Result<String, TemplateError> {
        self.0
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound {
                path: Utf8PathBuf::from(name),
            })
    }
}
