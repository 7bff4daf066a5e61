//! UCI protocol client for engine subprocesses.
//!
//! A [`UciClient`] owns one engine subprocess and talks to it over its
//! standard pipes: newline-terminated ASCII commands out, newline-terminated
//! responses in. Only a small set of response prefixes is recognized
//! (`id`, `option`, `uciok`, `readyok`, `bestmove`); everything else is
//! ignored. All reads are bounded - a dedicated reader thread feeds lines
//! through a channel so the client can give up on a hung engine instead of
//! blocking forever.
//!
//! # Lifecycle
//!
//! 1. [`UciClient::spawn`] the subprocess
//! 2. [`init`](UciClient::init) performs the handshake and collects the
//!    declared option set and identity
//! 3. [`configure`](UciClient::configure) applies operator options
//! 4. [`set_position`](UciClient::set_position) then [`go`](UciClient::go)
//!    per move
//! 5. [`shutdown`](UciClient::shutdown), or rely on `Drop`

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::limit::MoveLimit;
use crate::recorder::{EngineOptions, Participant};

/// Errors from spawning or talking to an engine subprocess.
#[derive(Error, Debug)]
pub enum UciError {
    /// The subprocess could not be started.
    #[error("failed to launch engine: {0}")]
    Launch(#[source] std::io::Error),
    /// Writing to the engine's stdin failed.
    #[error("engine I/O failure: {0}")]
    Io(#[from] std::io::Error),
    /// The handshake or response stream violated the protocol.
    #[error("protocol violation: {0}")]
    Protocol(String),
    /// No expected response arrived within the bounded window.
    #[error("engine did not respond within {0:?}")]
    Timeout(Duration),
    /// A response line could not be parsed as a move token.
    #[error("unparsable engine response: {0}")]
    IllegalResponse(String),
    /// The subprocess exited (or closed its pipes) mid-conversation.
    #[error("engine process exited unexpectedly")]
    EngineExit,
    /// An option name the engine never declared during the handshake.
    #[error("option not declared by engine: {0}")]
    UnsupportedOption(String),
}

/// One `option name ... type ...` declaration from the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UciOption {
    /// Option name as declared.
    pub name: String,
    /// Declared type (`check`, `spin`, `combo`, `button`, `string`).
    pub kind: String,
    /// Declared default value, if any.
    pub default: Option<String>,
    /// Declared minimum, for `spin` options.
    pub min: Option<i64>,
    /// Declared maximum, for `spin` options.
    pub max: Option<i64>,
}

impl UciOption {
    /// Parses an `option ...` line. Returns `None` for lines that do not
    /// carry at least a name and a type.
    fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix("option ")?;
        let tokens: Vec<&str> = rest.split_whitespace().collect();

        let mut name_parts: Vec<&str> = Vec::new();
        let mut kind = None;
        let mut default = None;
        let mut min = None;
        let mut max = None;

        let mut i = 0;
        while i < tokens.len() {
            match tokens[i] {
                "name" => {
                    i += 1;
                    // The name runs until the next keyword.
                    while i < tokens.len() && tokens[i] != "type" {
                        name_parts.push(tokens[i]);
                        i += 1;
                    }
                }
                "type" => {
                    i += 1;
                    kind = tokens.get(i).map(|t| t.to_string());
                    i += 1;
                }
                "default" => {
                    i += 1;
                    default = tokens.get(i).map(|t| t.to_string());
                    i += 1;
                }
                "min" => {
                    i += 1;
                    min = tokens.get(i).and_then(|t| t.parse().ok());
                    i += 1;
                }
                "max" => {
                    i += 1;
                    max = tokens.get(i).and_then(|t| t.parse().ok());
                    i += 1;
                }
                _ => i += 1,
            }
        }

        if name_parts.is_empty() {
            return None;
        }
        Some(Self {
            name: name_parts.join(" "),
            kind: kind?,
            default,
            min,
            max,
        })
    }
}

/// Default extra wait beyond a move limit's own time bound.
const DEFAULT_GRACE: Duration = Duration::from_millis(1000);
/// Default response window for depth limits, which carry no time bound.
const DEFAULT_DEPTH_WINDOW: Duration = Duration::from_secs(60);
/// How long `shutdown` waits for the engine to exit after `quit`.
const QUIT_GRACE: Duration = Duration::from_millis(1000);

/// A client owning one UCI engine subprocess.
pub struct UciClient {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<String>,
    reader: Option<JoinHandle<()>>,
    path: PathBuf,
    stopped: bool,
    grace: Duration,
    depth_window: Duration,
    /// Name reported via `id name` during the handshake.
    reported_name: Option<String>,
    /// Author reported via `id author` during the handshake.
    reported_author: Option<String>,
    /// Options declared by the engine during the handshake, by name.
    declared: BTreeMap<String, UciOption>,
    /// Options actually applied through [`configure`](Self::configure).
    applied: BTreeMap<String, String>,
}

impl UciClient {
    /// Spawns the engine subprocess with piped stdin/stdout.
    ///
    /// The reader thread starts immediately; the protocol handshake does
    /// not happen until [`init`](Self::init).
    ///
    /// # Errors
    ///
    /// Returns [`UciError::Launch`] if the executable cannot be started.
    pub fn spawn<P: AsRef<Path>>(path: P) -> Result<Self, UciError> {
        let path = path.as_ref().to_path_buf();
        let mut child = Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(UciError::Launch)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| UciError::Protocol("engine stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| UciError::Protocol("engine stdout unavailable".to_string()))?;

        let (tx, lines) = mpsc::channel();
        let reader = thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(_) => break,
                };
                if tx.send(line.trim().to_string()).is_err() {
                    break;
                }
            }
            // Dropping the sender signals EOF to the client.
        });

        Ok(Self {
            child,
            stdin,
            lines,
            reader: Some(reader),
            path,
            stopped: false,
            grace: DEFAULT_GRACE,
            depth_window: DEFAULT_DEPTH_WINDOW,
            reported_name: None,
            reported_author: None,
            declared: BTreeMap::new(),
            applied: BTreeMap::new(),
        })
    }

    /// Overrides the grace period added to timed move requests.
    #[must_use]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Overrides the response window used for depth-limited requests.
    #[must_use]
    pub fn with_depth_window(mut self, window: Duration) -> Self {
        self.depth_window = window;
        self
    }

    /// Sends one newline-terminated command.
    fn send(&mut self, cmd: &str) -> Result<(), UciError> {
        tracing::trace!(command = cmd, "-> engine");
        writeln!(self.stdin, "{}", cmd).map_err(|_| UciError::EngineExit)?;
        self.stdin.flush().map_err(|_| UciError::EngineExit)?;
        Ok(())
    }

    /// Reads the next line, waiting at most `window`.
    fn read_line(&mut self, window: Duration) -> Result<String, UciError> {
        match self.lines.recv_timeout(window) {
            Ok(line) => {
                tracing::trace!(line = %line, "<- engine");
                Ok(line)
            }
            Err(RecvTimeoutError::Timeout) => Err(UciError::Timeout(window)),
            Err(RecvTimeoutError::Disconnected) => Err(UciError::EngineExit),
        }
    }

    /// Performs the UCI handshake within `timeout`.
    ///
    /// Sends `uci` and reads until `uciok`, collecting `id name`,
    /// `id author` and `option` declarations; unrecognized lines are
    /// ignored. Follows up with `isready`/`readyok` under the same
    /// deadline. A missing sentinel is a [`UciError::Protocol`] failure -
    /// a misbehaving engine must not hang the harness.
    pub fn init(&mut self, timeout: Duration) -> Result<(), UciError> {
        let deadline = Instant::now() + timeout;

        self.send("uci")?;
        loop {
            let line = self.read_bounded(deadline, "uciok")?;
            if let Some(name) = line.strip_prefix("id name ") {
                self.reported_name = Some(name.to_string());
            } else if let Some(author) = line.strip_prefix("id author ") {
                self.reported_author = Some(author.to_string());
            } else if line.starts_with("option ") {
                if let Some(option) = UciOption::parse(&line) {
                    self.declared.insert(option.name.clone(), option);
                }
            } else if line == "uciok" {
                break;
            }
        }

        self.send("isready")?;
        loop {
            if self.read_bounded(deadline, "readyok")? == "readyok" {
                break;
            }
        }

        Ok(())
    }

    /// Reads one line before `deadline`, mapping timeout/EOF to a protocol
    /// failure naming the missing sentinel.
    fn read_bounded(&mut self, deadline: Instant, waiting_for: &str) -> Result<String, UciError> {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .filter(|d| !d.is_zero())
            .ok_or_else(|| {
                UciError::Protocol(format!("engine never sent {waiting_for}"))
            })?;
        match self.read_line(remaining) {
            Err(UciError::Timeout(_)) => Err(UciError::Protocol(format!(
                "engine never sent {waiting_for}"
            ))),
            other => other,
        }
    }

    /// Applies a set of UCI options.
    ///
    /// Every name is checked against the declared option set before any
    /// `setoption` is sent: an unknown name fails the whole batch without
    /// a partial, silent application.
    ///
    /// # Errors
    ///
    /// Returns [`UciError::UnsupportedOption`] naming the first option the
    /// engine never declared.
    pub fn configure(&mut self, options: &BTreeMap<String, String>) -> Result<(), UciError> {
        for name in options.keys() {
            if !self.declared.contains_key(name) {
                return Err(UciError::UnsupportedOption(name.clone()));
            }
        }
        for (name, value) in options {
            self.send(&format!("setoption name {} value {}", name, value))?;
            self.applied.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    /// Sends the position command for the start position plus `moves`.
    ///
    /// The protocol is stateless between requests from the client's side,
    /// so this is resent before every move request.
    pub fn set_position(&mut self, moves: &[String]) -> Result<(), UciError> {
        if moves.is_empty() {
            self.send("position startpos")
        } else {
            self.send(&format!("position startpos moves {}", moves.join(" ")))
        }
    }

    /// Requests one move under `limit` and returns it in coordinate
    /// notation.
    ///
    /// Reads until a `bestmove` line arrives, ignoring `info` chatter.
    ///
    /// # Errors
    ///
    /// - [`UciError::Timeout`] if no `bestmove` arrives within the limit's
    ///   time bound plus the grace period (or the depth window)
    /// - [`UciError::IllegalResponse`] if the `bestmove` token is not a
    ///   coordinate move
    /// - [`UciError::EngineExit`] if the subprocess is gone
    pub fn go(&mut self, limit: &MoveLimit) -> Result<String, UciError> {
        self.send(&limit.go_command())?;

        let window = match limit.time_bound() {
            Some(bound) => bound + self.grace,
            None => self.depth_window,
        };
        let deadline = Instant::now() + window;

        loop {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .filter(|d| !d.is_zero())
                .ok_or(UciError::Timeout(window))?;
            let line = match self.read_line(remaining) {
                Err(UciError::Timeout(_)) => return Err(UciError::Timeout(window)),
                other => other?,
            };
            if let Some(rest) = line.strip_prefix("bestmove") {
                let token = rest
                    .split_whitespace()
                    .next()
                    .ok_or_else(|| UciError::IllegalResponse(line.clone()))?;
                if !is_move_token(token) {
                    return Err(UciError::IllegalResponse(token.to_string()));
                }
                return Ok(token.to_string());
            }
        }
    }

    /// Shuts the engine down: `quit`, bounded wait, then kill.
    ///
    /// Idempotent - calling on an already-stopped client is a no-op.
    pub fn shutdown(&mut self) -> Result<(), UciError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;

        // The engine may already be gone; a failed quit is not an error.
        let _ = writeln!(self.stdin, "quit");
        let _ = self.stdin.flush();

        let deadline = Instant::now() + QUIT_GRACE;
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(10));
                }
                Ok(None) | Err(_) => {
                    let _ = self.child.kill();
                    let _ = self.child.wait();
                    break;
                }
            }
        }

        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        Ok(())
    }

    /// True once [`shutdown`](Self::shutdown) has run.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// The executable path this client was spawned from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identity reported during the handshake, if the engine sent one.
    #[must_use]
    pub fn reported_name(&self) -> Option<&str> {
        self.reported_name.as_deref()
    }

    /// Author reported during the handshake, if the engine sent one.
    #[must_use]
    pub fn reported_author(&self) -> Option<&str> {
        self.reported_author.as_deref()
    }

    /// Option declarations collected during the handshake, by name.
    #[must_use]
    pub fn declared_options(&self) -> &BTreeMap<String, UciOption> {
        &self.declared
    }

    /// Detaches an identity snapshot for result records, so the record
    /// outlives this process handle.
    #[must_use]
    pub fn snapshot(&self, label: &str) -> Participant {
        Participant {
            name: label.to_string(),
            path: self.path.clone(),
            reported_name: self.reported_name.clone().unwrap_or_default(),
            options: EngineOptions(self.applied.clone()),
        }
    }
}

impl Drop for UciClient {
    /// Releases the subprocess on every exit path, error paths included.
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// Whether `token` is a coordinate move: two squares plus an optional
/// promotion piece, e.g. `e2e4` or `e7e8q`.
fn is_move_token(token: &str) -> bool {
    let bytes = token.as_bytes();
    if bytes.len() < 4 || bytes.len() > 5 {
        return false;
    }
    let square = |file: u8, rank: u8| (b'a'..=b'h').contains(&file) && (b'1'..=b'8').contains(&rank);
    if !square(bytes[0], bytes[1]) || !square(bytes[2], bytes[3]) {
        return false;
    }
    bytes.len() == 4 || matches!(bytes[4], b'q' | b'r' | b'b' | b'n')
}
