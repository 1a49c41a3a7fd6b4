//! Real subprocess transport: the `UciEngine` implementation that actually
//! spawns an engine binary and talks to it over stdin/stdout.
//!
//! Lifecycle mirrors `engine/process.rs`'s `EngineProcess`: spawn with
//! piped stdio, run the `uci`/`uciok` + `isready`/`readyok` handshake under
//! a hard timeout, drain stderr on a background task, and kill the child
//! on drop if it's still alive.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, trace, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;

use crate::engine_proto::{parse_bestmove_line, parse_info_line, BestMoveReply, UciEngine};
use crate::error::{MatchError, MatchResult};

const INIT_TIMEOUT: Duration = Duration::from_secs(15);
/// Grace period added on top of the clock-derived `go` deadline, covering
/// process scheduling jitter rather than engine "thinking" time.
const GO_GRACE: Duration = Duration::from_millis(250);

pub struct EngineTransport {
    name: String,
    path: PathBuf,
    supports_chess960: bool,
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl EngineTransport {
    pub async fn spawn(
        path: &Path,
        name: Option<&str>,
        options: &[(String, String)],
        supports_chess960: bool,
    ) -> MatchResult<Self> {
        let mut command = Command::new(path);
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            command.current_dir(dir);
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn()?;
        let mut stdin = child.stdin.take().ok_or(MatchError::NoStdin)?;
        let stdout = child.stdout.take().ok_or(MatchError::NoStdout)?;
        let mut lines = BufReader::new(stdout).lines();

        match timeout(INIT_TIMEOUT, handshake(path, &mut stdin, &mut lines)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                let _ = child.kill().await;
                return Err(err);
            }
            Err(_) => {
                let _ = child.kill().await;
                return Err(MatchError::InitTimeout {
                    path: path.to_path_buf(),
                    timeout_ms: INIT_TIMEOUT.as_millis() as u64,
                });
            }
        }

        spawn_stderr_drain(child.stderr.take());

        let mut transport = Self {
            name: name.map(str::to_owned).unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.to_string_lossy().into_owned())
            }),
            path: path.to_path_buf(),
            supports_chess960,
            child,
            stdin,
            lines,
        };

        for (opt_name, value) in options {
            transport.set_option(opt_name, value).await?;
        }

        Ok(transport)
    }

    async fn set_option(&mut self, name: &str, value: &str) -> MatchResult<()> {
        self.write_line(&format!("setoption name {name} value {value}"))
            .await
    }

    async fn write_line(&mut self, line: &str) -> MatchResult<()> {
        trace!("-> {} : {line}", self.name);
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn next_line(&mut self) -> MatchResult<Option<String>> {
        let line = self.lines.next_line().await?;
        if let Some(ref l) = line {
            trace!("<- {} : {l}", self.name);
        }
        Ok(line)
    }

    async fn sync(&mut self) -> MatchResult<()> {
        self.write_line("isready").await?;
        loop {
            let line = self
                .next_line()
                .await?
                .ok_or_else(|| MatchError::EngineDied {
                    path: self.path.clone(),
                })?;
            if line.trim() == "readyok" {
                return Ok(());
            }
        }
    }
}

#[async_trait]
impl UciEngine for EngineTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_chess960(&self) -> bool {
        self.supports_chess960
    }

    async fn set_chess960(&mut self) -> MatchResult<()> {
        self.set_option("UCI_Chess960", "true").await?;
        self.sync().await
    }

    async fn new_game(&mut self) -> MatchResult<()> {
        self.write_line("ucinewgame").await?;
        self.sync().await
    }

    async fn send_position(&mut self, command: &str) -> MatchResult<()> {
        self.write_line(command).await?;
        self.sync().await
    }

    async fn go(&mut self, command: &str, deadline_ms: i64) -> MatchResult<BestMoveReply> {
        self.write_line(command).await?;

        let deadline = Duration::from_millis(deadline_ms.max(0) as u64) + GO_GRACE;
        let start = Instant::now();
        let mut reply = BestMoveReply::default();

        loop {
            let remaining = deadline.saturating_sub(start.elapsed());
            let line = match timeout(remaining, self.next_line()).await {
                Ok(Ok(Some(line))) => line,
                Ok(Ok(None)) => {
                    return Err(MatchError::EngineDied {
                        path: self.path.clone(),
                    })
                }
                Ok(Err(err)) => return Err(err),
                Err(_) => {
                    reply.elapsed_ms = start.elapsed().as_millis() as i64;
                    return Ok(reply);
                }
            };

            if let Some(best) = parse_bestmove_line(&line) {
                reply.best = Some(best);
                reply.elapsed_ms = start.elapsed().as_millis() as i64;
                return Ok(reply);
            }

            if let Some((info, pv)) = parse_info_line(&line, start.elapsed().as_millis() as i64) {
                reply.info = info;
                if pv.is_some() {
                    reply.pv = pv;
                }
            }
        }
    }
}

impl Drop for EngineTransport {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            warn!("killing still-running engine process: {}", self.name);
            let _ = self.child.start_kill();
        }
    }
}

async fn handshake(
    path: &Path,
    stdin: &mut ChildStdin,
    lines: &mut Lines<BufReader<ChildStdout>>,
) -> MatchResult<()> {
    stdin.write_all(b"uci\n").await?;
    stdin.flush().await?;

    while let Some(line) = lines.next_line().await? {
        if line.trim() == "uciok" {
            stdin.write_all(b"isready\n").await?;
            stdin.flush().await?;
            while let Some(line) = lines.next_line().await? {
                if line.trim() == "readyok" {
                    return Ok(());
                }
            }
            break;
        }
    }

    Err(MatchError::EngineDied {
        path: path.to_path_buf(),
    })
}

fn spawn_stderr_drain(stderr: Option<tokio::process::ChildStderr>) {
    if let Some(stderr) = stderr {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("engine stderr: {line}");
            }
        });
    }
}
