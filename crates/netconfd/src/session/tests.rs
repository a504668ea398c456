//! Unit tests for the session controller.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;
use rstest::{fixture, rstest};

use super::*;
use crate::action::{ActionError, ActionOutcome, ActionRequest, TemplateActionExecutor};
use crate::test_utils::{ChannelReader, SharedBuffer, StaticTemplates};

const HELLO: &str = "<hello><capabilities/></hello>";

struct Running {
    input: Sender<Vec<u8>>,
    output: SharedBuffer,
    token: CancellationToken,
    handle: JoinHandle<SessionEnd>,
}

impl Running {
    fn send(&self, text: &str) {
        self.input
            .send(text.as_bytes().to_vec())
            .expect("session input open");
    }

    fn finish(self) -> (SessionEnd, Vec<String>) {
        drop(self.input);
        let end = self.handle.join().expect("join session");
        (end, self.output.frames())
    }
}

#[fixture]
fn context() -> SessionContext {
    let templates: Arc<dyn TemplateStore> = Arc::new(
        StaticTemplates::default()
            .with("hello.xml", HELLO)
            .with("get/running/response.xml", "<rpc-reply message-id=\"<MID>\"><data/></rpc-reply>"),
    );
    SessionContext {
        executor: Arc::new(TemplateActionExecutor::new(Arc::clone(&templates))),
        templates,
        resets: ResetMap::new(),
        settings: SessionSettings {
            event_delay: Duration::ZERO,
            join_timeout: Duration::from_secs(1),
        },
    }
}

fn start(context: SessionContext) -> Running {
    let (input, reader) = ChannelReader::new();
    let output = SharedBuffer::default();
    let session = NetconfSession::new(context);
    let token = session.token().clone();
    let io = SessionIo::new(reader, output.clone());
    let handle = thread::spawn(move || session.run(io));
    Running {
        input,
        output,
        token,
        handle,
    }
}

#[rstest]
fn session_greets_and_answers_until_end_of_stream(context: SessionContext) {
    let running = start(context);
    assert_eq!(running.output.wait_for_frames(1), vec![HELLO]);

    running.send("<hello><capabilities/></hello>\n]]>]]>\n");
    running.send("<rpc message-id=\"10\">\n<get><source><running/></source></get>\n</rpc>\n]]>]]>\n");
    running.send("<rpc message-id=\"11\"><lock><target><candidate/></target></lock></rpc>]]>]]>\n");
    let frames = running.output.wait_for_frames(4);
    assert_eq!(frames.len(), 4);
    assert_eq!(frames[1], HELLO);
    assert_eq!(frames[2], "<rpc-reply message-id=\"10\"><data/></rpc-reply>");
    assert!(frames[3].contains("message-id=\"11\""));
    assert!(frames[3].contains("<ok/>"));

    let (end, _) = running.finish();
    assert_eq!(end, SessionEnd::EndOfStream);
}

#[rstest]
fn missing_message_id_ends_the_session_without_reply(context: SessionContext) {
    let running = start(context);
    running.send("<rpc><get/></rpc>\n");
    let end = running.handle.join().expect("join session");
    assert_eq!(end, SessionEnd::Protocol);
    assert_eq!(running.output.frames(), vec![HELLO]);
    assert!(running.token.is_cancelled());
}

#[rstest]
fn external_cancellation_ends_the_session(context: SessionContext) {
    let running = start(context);
    assert_eq!(running.output.wait_for_frames(1).len(), 1);

    let Running {
        input,
        token,
        handle,
        ..
    } = running;
    token.on_cancel(move || drop(input));
    token.cancel();
    assert_eq!(handle.join().expect("join session"), SessionEnd::Cancelled);
}

struct PanickingExecutor;

impl ActionExecutor for PanickingExecutor {
    fn execute(
        &self,
        _request: &ActionRequest,
        _resets: &ResetMap,
        _token: &CancellationToken,
    ) -> Result<ActionOutcome, ActionError> {
        panic!("executor failure");
    }
}

#[rstest]
fn panicking_action_interrupts_the_reader(mut context: SessionContext) {
    context.executor = Arc::new(PanickingExecutor);
    let (input, reader) = ChannelReader::new();
    let input = Arc::new(Mutex::new(Some(input)));
    let closer = Arc::clone(&input);
    let output = SharedBuffer::default();
    let session = NetconfSession::new(context);
    let token = session.token().clone();
    let io = SessionIo::new(reader, output.clone())
        .with_interrupt(move || drop(closer.lock().expect("input lock").take()));
    let handle = thread::spawn(move || session.run(io));

    let sent = input
        .lock()
        .expect("input lock")
        .as_ref()
        .map(|sender| sender.send(b"<rpc message-id=\"1\"><get/></rpc>\n".to_vec()));
    assert!(matches!(sent, Some(Ok(()))));

    assert_eq!(handle.join().expect("join session"), SessionEnd::Cancelled);
    assert!(token.is_cancelled());
    assert_eq!(output.frames(), vec![HELLO]);
}

#[test]
fn settings_follow_configuration() {
    let settings = SessionSettings::default();
    assert_eq!(settings.event_delay, Duration::from_secs(1));
    assert_eq!(settings.join_timeout, Duration::from_secs(2));
}
