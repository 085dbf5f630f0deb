//! NDJSON command loop for the fieldstore daemon.
//!
//! This module exposes a small dispatcher that translates newline-delimited
//! JSON requests into commands over the shared [`FieldStore`]. It backs the
//! `fieldstored` daemon and is intentionally conservative: requests are
//! processed strictly sequentially, responses are emitted in request order,
//! and every failure below process-crash becomes a structured error response
//! on the same line.
//!
//! The reply channel is whatever writer the service is constructed with; the
//! daemon hands it standard error, keeping standard output free for
//! human-readable trace lines.

use crate::script::{self, ScriptError};
use crate::store::FieldStore;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Token echoed when no token could be extracted from an input line.
pub const SENTINEL_TOKEN: &str = "?????";

/// How far input lines are echoed into the diagnostic trace.
const TRACE_ECHO_LIMIT: usize = 200;

/// Why the request loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A `quit` command was acknowledged; the caller should exit with 0.
    Quit,
    /// The input stream reached end-of-file; also a clean exit.
    EndOfInput,
}

/// Whether the loop keeps reading after a line has been answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineFlow {
    Continue,
    Quit,
}

/// Service entry point: owns the field store and writes responses to a writer.
pub struct Service<W: Write> {
    store: FieldStore,
    writer: W,
}

impl<W: Write> Service<W> {
    /// Create a service with an empty store around the provided reply writer.
    pub fn new(writer: W) -> Self {
        Self::with_store(FieldStore::new(), writer)
    }

    /// Create a service around an already-populated store.
    pub fn with_store(store: FieldStore, writer: W) -> Self {
        Self { store, writer }
    }

    /// Read-only view of the store, mainly for tests and inspection.
    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    /// Consume requests from the reader until `quit` or end-of-stream.
    ///
    /// Exactly one response is written per non-blank input line. Blank lines
    /// are skipped. The returned [`Outcome`] distinguishes the two clean
    /// termination paths; both map to exit status 0 in the daemon.
    pub fn run<R: BufRead>(&mut self, reader: R) -> io::Result<Outcome> {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            tracing::debug!(input = %truncate_echo(&line, TRACE_ECHO_LIMIT), "request line");

            if self.handle_line(&line)? == LineFlow::Quit {
                return Ok(Outcome::Quit);
            }
        }

        Ok(Outcome::EndOfInput)
    }

    /// Parse, validate, dispatch, and answer a single input line.
    fn handle_line(&mut self, line: &str) -> io::Result<LineFlow> {
        let parsed: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                let error = ServiceError::Parse(err.to_string());
                tracing::debug!(error = %error, "rejected input line");
                self.write_response(ResponseEnvelope::error(SENTINEL_TOKEN, &error))?;
                return Ok(LineFlow::Continue);
            }
        };

        // Token first: once extracted it tags every response this iteration.
        let Some(token) = parsed.get("token").and_then(Value::as_str).map(str::to_owned) else {
            let error = ServiceError::MissingField("token");
            self.write_response(ResponseEnvelope::error(SENTINEL_TOKEN, &error))?;
            return Ok(LineFlow::Continue);
        };
        tracing::debug!(%token, "handling request");

        let Some(command) = parsed.get("command").and_then(Value::as_str) else {
            let error = ServiceError::MissingField("command");
            self.write_response(ResponseEnvelope::error(&token, &error))?;
            return Ok(LineFlow::Continue);
        };

        match self.dispatch(command, &parsed) {
            Ok(reply) => {
                self.write_response(ResponseEnvelope::ok(&token, reply.result))?;
                if reply.shutdown {
                    tracing::info!(%token, "quit acknowledged");
                    return Ok(LineFlow::Quit);
                }
            }
            Err(error) => {
                tracing::debug!(%token, %command, error = %error, "request failed");
                self.write_response(ResponseEnvelope::error(&token, &error))?;
            }
        }

        Ok(LineFlow::Continue)
    }

    fn write_response(&mut self, envelope: ResponseEnvelope) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, &envelope)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    fn dispatch(&mut self, command: &str, request: &Value) -> Result<Reply, ServiceError> {
        tracing::debug!(%command, "dispatching");
        match command {
            "run" => self.cmd_run(request),
            "get" => self.cmd_get(request),
            // quit is argument-blind: whatever else the request carries,
            // acknowledge and shut down
            "quit" => Ok(Reply::shutdown()),
            other => Err(ServiceError::UnknownCommand(other.to_string())),
        }
    }

    fn cmd_run(&mut self, request: &Value) -> Result<Reply, ServiceError> {
        let arguments = request_arguments(request)?;
        let source = expect_one(arguments)?
            .as_str()
            .ok_or_else(|| ServiceError::InvalidArgument("run argument must be a string".into()))?;

        let program = script::parse_program(source)?;
        script::eval_program(&program, &mut self.store)?;
        Ok(Reply::ok())
    }

    fn cmd_get(&mut self, request: &Value) -> Result<Reply, ServiceError> {
        let arguments = request_arguments(request)?;
        let name = expect_one(arguments)?
            .as_str()
            .ok_or_else(|| ServiceError::InvalidArgument("field name must be a string".into()))?;

        let value = self
            .store
            .get(name)
            .cloned()
            .ok_or_else(|| ServiceError::FieldNotFound(name.to_string()))?;
        Ok(Reply::value(value))
    }
}

/// Result of a successfully dispatched command.
struct Reply {
    result: Option<Value>,
    shutdown: bool,
}

impl Reply {
    fn ok() -> Self {
        Self {
            result: None,
            shutdown: false,
        }
    }

    fn value(value: Value) -> Self {
        Self {
            result: Some(value),
            shutdown: false,
        }
    }

    fn shutdown() -> Self {
        Self {
            result: None,
            shutdown: true,
        }
    }
}

fn request_arguments(request: &Value) -> Result<&[Value], ServiceError> {
    match request.get("arguments") {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(ServiceError::InvalidArgument(
            "'arguments' must be an array".into(),
        )),
    }
}

fn expect_one(arguments: &[Value]) -> Result<&Value, ServiceError> {
    match arguments {
        [single] => Ok(single),
        _ => Err(ServiceError::Arity {
            expected: 1,
            found: arguments.len(),
        }),
    }
}

/// Truncate a line for the diagnostic echo, respecting UTF-8 boundaries.
fn truncate_echo(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Per-request failures; the `Display` text is the protocol error message.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The input line was not valid JSON.
    #[error("Failed to parse input as json: {0}")]
    Parse(String),

    /// A required request field was missing (or not a string).
    #[error("No '{0}' field in input")]
    MissingField(&'static str),

    /// The command name is not in the command table.
    #[error("Unexpected command: {0}")]
    UnknownCommand(String),

    /// A handler received the wrong number of arguments.
    #[error("Expected {expected} argument, found {found}")]
    Arity {
        /// Arguments the handler requires.
        expected: usize,
        /// Arguments actually supplied.
        found: usize,
    },

    /// `get` named a field the store does not hold.
    #[error("field '{0}' not found")]
    FieldNotFound(String),

    /// An argument had the wrong shape or type.
    #[error("{0}")]
    InvalidArgument(String),

    /// The `run` script failed to parse or evaluate.
    #[error(transparent)]
    Script(#[from] ScriptError),
}

#[derive(Serialize)]
struct ResponseEnvelope {
    status: &'static str,
    token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl ResponseEnvelope {
    fn ok(token: &str, result: Option<Value>) -> Self {
        Self {
            status: "ok",
            token: token.to_string(),
            result,
            message: None,
        }
    }

    fn error(token: &str, error: &ServiceError) -> Self {
        Self {
            status: "error",
            token: token.to_string(),
            result: None,
            message: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_absent_fields() {
        let rendered =
            serde_json::to_string(&ResponseEnvelope::ok("abc123", None)).expect("serialize");
        assert_eq!(rendered, r#"{"status":"ok","token":"abc123"}"#);
    }

    #[test]
    fn error_envelope_carries_message() {
        let error = ServiceError::UnknownCommand("reboot".into());
        let rendered =
            serde_json::to_string(&ResponseEnvelope::error("t", &error)).expect("serialize");
        assert_eq!(
            rendered,
            r#"{"status":"error","token":"t","message":"Unexpected command: reboot"}"#
        );
    }

    #[test]
    fn truncate_echo_respects_char_boundaries() {
        let text = "é".repeat(120);
        let echoed = truncate_echo(&text, 200);
        assert!(echoed.ends_with("..."));
        assert!(echoed.len() <= 203);
        // 2 bytes per char, so the boundary backs off one byte
        assert_eq!(echoed.chars().filter(|c| *c == 'é').count(), 100);
    }

    #[test]
    fn truncate_echo_passes_short_lines_through() {
        assert_eq!(truncate_echo("short", 200), "short");
    }
}
