//! Diagnostics collected during a bundling phase.
//!
//! Each phase (scan, compile) gets a fresh [`Log`]. Appends may come from any
//! thread; [`Log::join`] drains the messages in append order.

use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use tsbundle_parser::{LineIndex, Span};

/// What went wrong, as a stable machine-readable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MsgCode {
    /// Malformed source text.
    ParseError,
    /// An import specifier (or entry point) that maps to no file.
    ResolveError,
    /// A resolved file that could not be read.
    ReadError,
    /// A statement with no code generation strategy, or an unusable output layout.
    CompileError,
    /// Invalid bundle configuration.
    ConfigError,
}

impl MsgCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParseError => "PARSE_ERROR",
            Self::ResolveError => "RESOLVE_ERROR",
            Self::ReadError => "READ_ERROR",
            Self::CompileError => "COMPILE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

/// Where in a file a message points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub path: String,
    /// 1-based.
    pub line: u32,
    /// 0-based, in bytes.
    pub column: u32,
    /// The source line, when the text was still available.
    pub line_text: String,
}

impl Location {
    /// Location of `span` in `source`, including the line's text.
    #[must_use]
    pub fn from_source(path: &str, source: &str, lines: &LineIndex, span: Span) -> Self {
        let loc = lines.loc(span.start);
        Self {
            path: path.to_string(),
            line: loc.line,
            column: loc.column,
            line_text: lines.line_text(source, span.start).to_string(),
        }
    }

    /// Location of `span` when only the line index survives.
    #[must_use]
    pub fn from_index(path: &str, lines: &LineIndex, span: Span) -> Self {
        let loc = lines.loc(span.start);
        Self {
            path: path.to_string(),
            line: loc.line,
            column: loc.column,
            line_text: String::new(),
        }
    }
}

/// One diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Msg {
    pub code: MsgCode,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Msg {
    #[must_use]
    pub fn error(code: MsgCode, location: Option<Location>, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
            location,
        }
    }
}

impl fmt::Display for Msg {
    /// `path:line:col: error: text`, followed by the source line when known.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => {
                write!(
                    f,
                    "{}:{}:{}: error: {}",
                    loc.path, loc.line, loc.column, self.text
                )?;
                if !loc.line_text.is_empty() {
                    let caret = " ".repeat(loc.column as usize);
                    write!(f, "\n{}\n{caret}^", loc.line_text)?;
                }
                Ok(())
            }
            None => write!(f, "error: {}", self.text),
        }
    }
}

/// Ordered collector of messages for one phase.
#[derive(Debug, Default)]
pub struct Log {
    msgs: Mutex<Vec<Msg>>,
}

impl Log {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, msg: Msg) {
        self.msgs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(msg);
    }

    pub fn add_error(&self, code: MsgCode, location: Option<Location>, text: impl Into<String>) {
        self.append(Msg::error(code, location, text));
    }

    /// Take every message appended so far, in append order.
    pub fn join(&self) -> Vec<Msg> {
        std::mem::take(&mut *self.msgs.lock().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.msgs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
