// Relay of a running process' stdout as an HTTP body stream

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::{FutureExt, Stream, StreamExt};
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use super::errors::DownloadError;

const STDERR_TAIL_LINES: usize = 20;
const CHUNK_SIZE: usize = 64 * 1024;

/// Next `\n`-terminated line, decoded lossily with the line ending stripped.
/// `None` at EOF.
pub async fn read_line_lossy<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Read stderr to the end so the child never blocks on a full pipe.
/// Resolves to the last few lines for error reporting.
pub fn drain_stderr(stderr: ChildStderr, tool: String) -> JoinHandle<String> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stderr);
        let mut buf = Vec::new();
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

        loop {
            match read_line_lossy(&mut reader, &mut buf).await {
                Ok(Some(line)) => {
                    debug!(tool = %tool, "{}", line);
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(tool = %tool, error = %e, "Failed to read stderr");
                    break;
                }
            }
        }

        Vec::from(tail).join("\n")
    })
}

/// Wait for the child and turn a non-zero exit into `ProcessFailed`
pub async fn wait_for_exit(
    tool: String,
    mut child: Child,
    stderr_tail: Option<JoinHandle<String>>,
) -> Result<(), DownloadError> {
    let status = child.wait().await?;
    let stderr = match stderr_tail {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    };

    if status.success() {
        Ok(())
    } else {
        Err(DownloadError::ProcessFailed {
            tool,
            code: status.code(),
            stderr,
        })
    }
}

enum State {
    Streaming,
    Exiting(BoxFuture<'static, Result<(), DownloadError>>),
    Done,
}

/// Stdout of a spawned process as a `Stream` of byte chunks.
///
/// After stdout closes the exit status is checked; a failure is yielded as a
/// final error so the HTTP body is aborted rather than ending cleanly.
/// Dropping the stream before the process exits kills it.
pub struct ProcessOutputStream {
    tool: String,
    stdout: ReaderStream<ChildStdout>,
    child: Option<Child>,
    stderr_tail: Option<JoinHandle<String>>,
    pending: Option<Bytes>,
    state: State,
    bytes_sent: u64,
}

impl ProcessOutputStream {
    pub fn new(tool: String, mut child: Child) -> Result<Self, DownloadError> {
        let stdout = child.stdout.take().ok_or_else(|| {
            DownloadError::ExecutionError(format!("Failed to capture stdout from {}", tool))
        })?;
        let stderr_tail = child
            .stderr
            .take()
            .map(|stderr| drain_stderr(stderr, tool.clone()));

        Ok(Self {
            tool,
            stdout: ReaderStream::with_capacity(stdout, CHUNK_SIZE),
            child: Some(child),
            stderr_tail,
            pending: None,
            state: State::Streaming,
            bytes_sent: 0,
        })
    }

    /// Wait for the first chunk of output.
    ///
    /// A process that exits without writing anything is reported here, while
    /// the HTTP status can still be chosen.
    pub async fn prime(&mut self) -> Result<(), DownloadError> {
        match self.stdout.next().await {
            Some(Ok(chunk)) => {
                self.pending = Some(chunk);
                Ok(())
            }
            Some(Err(e)) => Err(e.into()),
            None => {
                self.state = State::Done;
                self.exit_future().await?;
                Err(DownloadError::ExecutionError(format!(
                    "{} produced no output",
                    self.tool
                )))
            }
        }
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    fn exit_future(&mut self) -> BoxFuture<'static, Result<(), DownloadError>> {
        let tool = self.tool.clone();
        let child = self.child.take();
        let stderr_tail = self.stderr_tail.take();

        async move {
            match child {
                Some(child) => wait_for_exit(tool, child, stderr_tail).await,
                None => Ok(()),
            }
        }
        .boxed()
    }

    fn emit(&mut self, chunk: Bytes) -> Poll<Option<io::Result<Bytes>>> {
        self.bytes_sent += chunk.len() as u64;
        Poll::Ready(Some(Ok(chunk)))
    }
}

impl Stream for ProcessOutputStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(chunk) = this.pending.take() {
            return this.emit(chunk);
        }

        loop {
            if let State::Exiting(exit) = &mut this.state {
                let result = ready!(exit.as_mut().poll(cx));
                this.state = State::Done;
                return match result {
                    Ok(()) => {
                        info!(tool = %this.tool, bytes = this.bytes_sent, "Stream finished");
                        Poll::Ready(None)
                    }
                    Err(e) => {
                        warn!(tool = %this.tool, bytes = this.bytes_sent, error = %e, "Stream failed");
                        Poll::Ready(Some(Err(io::Error::other(e.to_string()))))
                    }
                };
            }

            if let State::Done = this.state {
                return Poll::Ready(None);
            }

            match ready!(this.stdout.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => return this.emit(chunk),
                Some(Err(e)) => {
                    this.state = State::Done;
                    return Poll::Ready(Some(Err(e)));
                }
                None => this.state = State::Exiting(this.exit_future()),
            }
        }
    }
}

impl Drop for ProcessOutputStream {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            warn!(
                tool = %self.tool,
                bytes = self.bytes_sent,
                "Client went away before the process finished, stopping it"
            );
            let _ = child.start_kill();
        }
        if let Some(handle) = self.stderr_tail.take() {
            handle.abort();
        }
    }
}
