//! Classified top-level statements.
//!
//! The parser never builds a full syntax tree. Each top-level statement is
//! decided once into one of three shapes and everything downstream matches on
//! that tag.

use crate::span::Span;

/// One parsed top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Code that survives into the output.
    Value(ValueStmt),
    /// Renders as exactly one empty statement marker (`;`).
    ElidedEmpty,
    /// Renders as nothing at all.
    ElidedNone,
}

impl Stmt {
    /// A value statement made of plain text only.
    pub fn text(code: impl Into<String>) -> Self {
        Stmt::Value(ValueStmt::new(Code::Parts(vec![Part::Text(code.into())])))
    }
}

/// A statement that produces output code.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueStmt {
    pub code: Code,
    /// Continuation lines must be emitted exactly as written (a multi-line
    /// string or template literal spans them).
    pub verbatim_lines: bool,
}

impl ValueStmt {
    pub fn new(code: Code) -> Self {
        Self {
            code,
            verbatim_lines: false,
        }
    }
}

/// The generated code of a value statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Code {
    /// Text interleaved with references the linker fills in.
    Parts(Vec<Part>),
    /// A construct with no code generation strategy.
    Unsupported {
        construct: &'static str,
        span: Span,
    },
}

/// A piece of generated code.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// A loader call for the module behind this import record index.
    Require(usize),
    /// The numeric id of the module that owns the statement.
    SelfId,
}

/// How an import record was introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import ... from "m"` or `import "m"`
    Stmt,
    /// `export ... from "m"`
    ReExport,
    /// `require("m")`
    Require,
    /// `import("m")`
    Dynamic,
}

/// A module specifier found in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    pub specifier: String,
    /// Span of the specifier string literal.
    pub span: Span,
    pub kind: ImportKind,
    /// Filled in by the scanner once the specifier resolves.
    pub resolved: Option<usize>,
}

/// Output of parsing one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedModule {
    pub stmts: Vec<Stmt>,
    pub import_records: Vec<ImportRecord>,
}

/// Builder for [`Code::Parts`] that merges adjacent text.
#[derive(Debug, Default)]
pub(crate) struct PartsBuilder {
    parts: Vec<Part>,
}

impl PartsBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn text(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        if let Some(Part::Text(last)) = self.parts.last_mut() {
            last.push_str(text);
        } else {
            self.parts.push(Part::Text(text.to_string()));
        }
        self
    }

    pub(crate) fn require(&mut self, record: usize) -> &mut Self {
        self.parts.push(Part::Require(record));
        self
    }

    pub(crate) fn self_id(&mut self) -> &mut Self {
        self.parts.push(Part::SelfId);
        self
    }

    pub(crate) fn append(&mut self, parts: Vec<Part>) -> &mut Self {
        for part in parts {
            match part {
                Part::Text(text) => {
                    self.text(&text);
                }
                other => self.parts.push(other),
            }
        }
        self
    }

    /// Whether the accumulated code ends with `;` (ignoring trailing space).
    pub(crate) fn ends_with_semicolon(&self) -> bool {
        matches!(self.parts.last(), Some(Part::Text(t)) if t.trim_end().ends_with(';'))
    }

    pub(crate) fn finish(self) -> Vec<Part> {
        self.parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_merges_text() {
        let mut b = PartsBuilder::new();
        b.text("const x = ").require(0).text(";").text("\n");
        b.text("y").self_id();
        assert_eq!(
            b.finish(),
            vec![
                Part::Text("const x = ".into()),
                Part::Require(0),
                Part::Text(";\ny".into()),
                Part::SelfId,
            ]
        );
    }

    #[test]
    fn test_ends_with_semicolon() {
        let mut b = PartsBuilder::new();
        b.text("a;  ");
        assert!(b.ends_with_semicolon());
        b.require(1);
        assert!(!b.ends_with_semicolon());
    }
}
