//! Actions implemented as shell scripts in the template tree.
//!
//! `<operation>/<datastore>/response.sh` runs under `/bin/sh` with the
//! operation subtree on stdin and the request context in `NETCONF_*`
//! environment variables. Whatever the script prints becomes the response.

use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use camino::Utf8Path;
use crossbeam_channel::select;
use tracing::{debug, warn};

use super::{ACTION_TARGET, ActionError, ActionExecutor, ActionOutcome, ActionRequest};
use crate::reset_map::ResetMap;
use crate::session::CancellationToken;
use crate::templates::{DirectoryTemplateStore, response_template_name};

/// File name of an action script below `<operation>/<datastore>/`.
pub const RESPONSE_SCRIPT: &str = "response.sh";

const SHELL: &str = "/bin/sh";
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Executor that runs `<operation>/<datastore>/response.sh`.
#[derive(Debug, Clone)]
pub struct ScriptActionExecutor {
    templates: DirectoryTemplateStore,
    timeout: Duration,
}

impl ScriptActionExecutor {
    /// Creates an executor resolving scripts through `templates`.
    #[must_use]
    pub const fn new(templates: DirectoryTemplateStore, timeout: Duration) -> Self {
        Self { templates, timeout }
    }

    fn command(
        &self,
        path: &Utf8Path,
        request: &ActionRequest,
        resets: &ResetMap,
    ) -> Command {
        let mut command = Command::new(SHELL);
        command
            .arg(path.as_std_path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("NETCONF_MESSAGE_ID", &request.message_id)
            .env("NETCONF_OPERATION", &request.operation)
            .env("NETCONF_DATASTORE", &request.datastore)
            .env(
                "NETCONF_EVENT_DELAY_MS",
                request.event_delay.as_millis().to_string(),
            );
        if let Some(parent) = path.parent() {
            command.current_dir(parent.as_std_path());
        }
        if let Some(target) = &request.target_name {
            command
                .env("NETCONF_TARGET_NAME", target)
                .env(
                    "NETCONF_TARGET_SUPPRESSED",
                    resets.is_suppressed(target).to_string(),
                );
        }
        command
    }
}

impl ActionExecutor for ScriptActionExecutor {
    fn execute(
        &self,
        request: &ActionRequest,
        resets: &ResetMap,
        token: &CancellationToken,
    ) -> Result<ActionOutcome, ActionError> {
        let name = response_template_name(&request.operation, &request.datastore, RESPONSE_SCRIPT);
        let path = self.templates.resolve(&name)?;
        if !path.is_file() {
            return Err(ActionError::NoHandler {
                operation: request.operation.clone(),
                datastore: request.datastore.clone(),
            });
        }

        debug!(
            target: ACTION_TARGET,
            path = %path,
            message_id = %request.message_id,
            "spawning action script"
        );
        let mut child = self
            .command(&path, request, resets)
            .spawn()
            .map_err(|source| ActionError::Spawn {
                path: path.clone(),
                source,
            })?;

        let writer = child
            .stdin
            .take()
            .map(|stdin| feed_stdin(stdin, request.raw_content.clone()));
        let stdout = child.stdout.take().map(collect);
        let stderr = child.stderr.take().map(collect);

        let status = wait_for_exit(&path, &mut child, self.timeout, token)?;
        if let Some(writer) = writer {
            drop(writer.join());
        }
        let output = join_output(&path, stdout)?;
        let diagnostics = join_output(&path, stderr)?;
        if !diagnostics.is_empty() {
            debug!(
                target: ACTION_TARGET,
                path = %path,
                stderr = %String::from_utf8_lossy(&diagnostics).trim(),
                "action script stderr output"
            );
        }

        if !status.success() {
            return Err(ActionError::NonZeroExit {
                path,
                status: status.code().unwrap_or(-1),
            });
        }
        let text = String::from_utf8(output)
            .map_err(|source| ActionError::InvalidOutput { path, source })?;
        Ok(ActionOutcome::from_text(text))
    }
}

fn feed_stdin(mut stdin: impl Write + Send + 'static, input: String) -> JoinHandle<io::Result<()>> {
    thread::spawn(move || {
        stdin.write_all(input.as_bytes())?;
        stdin.flush()
    })
}

fn collect(mut pipe: impl Read + Send + 'static) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        pipe.read_to_end(&mut buffer)?;
        Ok(buffer)
    })
}

fn join_output(
    path: &Utf8Path,
    handle: Option<JoinHandle<io::Result<Vec<u8>>>>,
) -> Result<Vec<u8>, ActionError> {
    let Some(handle) = handle else {
        return Ok(Vec::new());
    };
    let result = handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("pipe reader panicked")));
    result.map_err(|source| ActionError::Io {
        path: path.to_owned(),
        source,
    })
}

fn wait_for_exit(
    path: &Utf8Path,
    child: &mut Child,
    timeout: Duration,
    token: &CancellationToken,
) -> Result<ExitStatus, ActionError> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(
                    target: ACTION_TARGET,
                    path = %path,
                    ?status,
                    "action script exited"
                );
                return Ok(status);
            }
            Ok(None) => {}
            Err(source) => {
                return Err(ActionError::Io {
                    path: path.to_owned(),
                    source,
                });
            }
        }

        if token.is_cancelled() {
            debug!(target: ACTION_TARGET, path = %path, "session cancelled, killing action script");
            drop(child.kill());
            drop(child.wait());
            return Err(ActionError::Cancelled);
        }
        if start.elapsed() > timeout {
            warn!(
                target: ACTION_TARGET,
                path = %path,
                ?timeout,
                "action script timed out, killing process"
            );
            drop(child.kill());
            drop(child.wait());
            return Err(ActionError::Timeout {
                path: path.to_owned(),
                timeout,
            });
        }

        select! {
            recv(token.signal()) -> _ => {},
            default(POLL_INTERVAL) => {},
        }
    }
}
