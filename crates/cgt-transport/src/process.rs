//! Child-process transport
//!
//! Spawns the engine with stdin, stdout and stderr piped. Requests travel on
//! stdin, responses on stdout. Stderr is drained in the background so a
//! chatty engine never blocks, and the most recent lines are kept for
//! diagnostics.

use crate::transport::{LineChannel, Transport};
use async_trait::async_trait;
use cgt_core::{CgtError, EngineConfig, Result};
use std::collections::VecDeque;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Transport to an engine running as a child process
pub struct ProcessTransport {
    child: Child,
    channel: LineChannel<ChildStdout, ChildStdin>,
    stderr: StderrTail,
    shutdown_grace: Duration,
    exit_status: Option<ExitStatus>,
    closed: bool,
}

impl ProcessTransport {
    /// Spawn the engine described by `config`
    pub async fn open(config: &EngineConfig) -> Result<Self> {
        let mut child = Command::new(&config.program)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CgtError::Spawn(format!(
                    "Failed to spawn {}: {}",
                    config.program.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CgtError::Spawn("No stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CgtError::Spawn("No stdout".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| CgtError::Spawn("No stderr".into()))?;

        info!(
            "Engine started: {} (pid {:?})",
            config.program.display(),
            child.id()
        );

        Ok(Self {
            child,
            channel: LineChannel::new(stdout, stdin)
                .with_limits(config.read_timeout, config.max_line_bytes),
            stderr: StderrTail::spawn(stderr, config.stderr_tail_lines),
            shutdown_grace: config.shutdown_grace,
            exit_status: None,
            closed: false,
        })
    }

    /// OS process id while the engine is alive
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Most recent lines the engine wrote to stderr, oldest first
    pub fn stderr_tail(&self) -> Vec<String> {
        self.stderr.lines()
    }

    /// Exit status once the engine has exited, polling without blocking
    pub fn try_exit_status(&mut self) -> Option<ExitStatus> {
        if self.exit_status.is_none() {
            if let Ok(Some(status)) = self.child.try_wait() {
                debug!("Engine exited: {}", status);
                self.exit_status = Some(status);
            }
        }
        self.exit_status
    }

    /// Whether `close` has run
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    async fn reap(&mut self) -> Option<ExitStatus> {
        match tokio::time::timeout(self.shutdown_grace, self.child.wait()).await {
            Ok(Ok(status)) => Some(status),
            Ok(Err(e)) => {
                warn!("Failed to wait for engine: {}", e);
                None
            }
            Err(_) => {
                debug!(
                    "Engine still running {:?} after stdin closed, killing",
                    self.shutdown_grace
                );
                if let Err(e) = self.child.kill().await {
                    warn!("Failed to kill engine: {}", e);
                }
                self.child.wait().await.ok()
            }
        }
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    async fn send_line(&mut self, line: &[u8]) -> Result<()> {
        if let Some(status) = self.try_exit_status() {
            return Err(CgtError::Write(format!("engine already exited ({})", status)));
        }
        debug!("Sending: {}", String::from_utf8_lossy(line));
        self.channel.send_line(line).await
    }

    async fn receive_line(&mut self) -> Result<Vec<u8>> {
        let result = self.channel.receive_line().await;
        match &result {
            Ok(line) => debug!("Received: {}", String::from_utf8_lossy(line)),
            Err(CgtError::Read(msg)) => {
                if let Some(status) = self.try_exit_status() {
                    return Err(CgtError::Read(format!("{} ({})", msg, status)));
                }
            }
            Err(_) => {}
        }
        result
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // Closing stdin is the engine's cue to exit
        self.channel.close().await?;
        if self.exit_status.is_none() {
            self.exit_status = self.reap().await;
        }
        info!("Engine stopped: {:?}", self.exit_status);
        Ok(())
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        // Try to kill the child process if still running
        if !self.closed {
            let _ = self.child.start_kill();
        }
    }
}

/// Ring buffer of recent stderr lines, filled by a background task
struct StderrTail {
    lines: Arc<Mutex<VecDeque<String>>>,
    _task: JoinHandle<()>,
}

impl StderrTail {
    fn spawn(stderr: ChildStderr, capacity: usize) -> Self {
        let lines = Arc::new(Mutex::new(VecDeque::with_capacity(capacity)));
        let sink = lines.clone();
        let task = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr).lines();
            loop {
                match reader.next_line().await {
                    Ok(Some(line)) => {
                        debug!(target: "cgt_transport::engine", "{}", line);
                        if capacity == 0 {
                            continue;
                        }
                        let mut buf = sink.lock().unwrap_or_else(PoisonError::into_inner);
                        if buf.len() == capacity {
                            buf.pop_front();
                        }
                        buf.push_back(line);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Engine stderr read failed: {}", e);
                        break;
                    }
                }
            }
        });

        Self { lines, _task: task }
    }

    fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}
