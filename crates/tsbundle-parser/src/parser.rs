//! Statement-level parser.
//!
//! The source is tokenized up front and split into top-level statements by
//! a bracket-aware boundary scanner that understands automatic semicolon
//! insertion. Each statement is then classified: ambient TypeScript
//! declarations are elided, module syntax is lowered to loader calls when
//! bundling, and everything else is carried through as source text.

use crate::lexer::Lexer;
use crate::span::Span;
use crate::stmt::{
    Code, ImportKind, ImportRecord, ParsedModule, Part, PartsBuilder, Stmt, ValueStmt,
};
use crate::token::{Token, TokenKind};

/// Parser configuration options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    /// Lower `import`/`export`/`require()` to loader calls and record imports.
    pub is_bundling: bool,
    /// Enable TypeScript syntax (`declare`, `enum`, `type`, ...).
    pub typescript: bool,
}

/// Parse error.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

impl std::error::Error for ParseError {}

/// How the boundary scanner treats a statement.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Boundary {
    /// `function`/`class`-like: no ASI before the body, the body ends it.
    pub(crate) declaration: bool,
    /// `import`/`export`: `from`, `as`, `with` continue the statement.
    pub(crate) module_clause: bool,
    /// Type position: `<`/`>` nest, and a newline after the closing `>` of
    /// type arguments can end the statement.
    pub(crate) types: bool,
}

impl Boundary {
    pub(crate) const EXPRESSION: Boundary = Boundary {
        declaration: false,
        module_clause: false,
        types: false,
    };
    pub(crate) const DECLARATION: Boundary = Boundary {
        declaration: true,
        module_clause: false,
        types: false,
    };
    pub(crate) const MODULE: Boundary = Boundary {
        declaration: false,
        module_clause: true,
        types: false,
    };
    /// Ambient `var`/`let`/`const`/`function` and `type` aliases.
    pub(crate) const TYPE: Boundary = Boundary {
        declaration: false,
        module_clause: false,
        types: true,
    };
    /// `export type ...`, which may also be `export type { A } from "m"`.
    pub(crate) const TYPE_EXPORT: Boundary = Boundary {
        declaration: false,
        module_clause: true,
        types: true,
    };
}

/// Where a statement ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StmtEnd {
    /// Index one past the statement's last token.
    pub(crate) end: usize,
    /// The statement ended at the closing brace of its body.
    pub(crate) block_bodied: bool,
}

#[derive(Debug, Clone, Copy)]
struct Open {
    close: Closer,
    body: bool,
    header: bool,
    do_while: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closer {
    Paren,
    Bracket,
    Brace,
}

/// The parser.
pub struct Parser<'a> {
    pub(crate) source: &'a str,
    pub(crate) options: ParserOptions,
    pub(crate) tokens: Vec<Token>,
    /// Index of the next unparsed token.
    pub(crate) pos: usize,
    pub(crate) import_records: Vec<ImportRecord>,
}

impl<'a> Parser<'a> {
    /// Create a new parser.
    pub fn new(source: &'a str, options: ParserOptions) -> Self {
        Self {
            source,
            options,
            tokens: Vec::new(),
            pos: 0,
            import_records: Vec::new(),
        }
    }

    /// Parse the whole file into classified statements.
    pub fn parse(mut self) -> Result<ParsedModule, ParseError> {
        self.tokens = tokenize(self.source)?;

        let mut stmts = Vec::new();
        while !matches!(self.kind(self.pos), TokenKind::Eof) {
            let before = self.pos;
            stmts.push(self.parse_statement()?);
            debug_assert!(self.pos > before, "statement parser made no progress");
        }

        Ok(ParsedModule {
            stmts,
            import_records: self.import_records,
        })
    }

    // =========================================================================
    // Token Handling
    // =========================================================================

    /// Token at `i`; past the end this is the trailing EOF token.
    pub(crate) fn tok(&self, i: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[i.min(last)]
    }

    pub(crate) fn kind(&self, i: usize) -> &TokenKind {
        &self.tok(i).kind
    }

    pub(crate) fn is_word(&self, i: usize, word: &str) -> bool {
        self.tok(i).is_word(word)
    }

    /// A contextual keyword at `i` that applies to the word right after it
    /// (same line, and that word is an identifier or reserved word).
    pub(crate) fn is_modifier(&self, i: usize, word: &str) -> bool {
        self.is_word(i, word)
            && !self.tok(i + 1).had_newline_before
            && self.kind(i + 1).word().is_some()
    }

    pub(crate) fn text(&self, span: Span) -> &'a str {
        self.source
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }

    pub(crate) fn unexpected(&self, i: usize) -> ParseError {
        let token = self.tok(i);
        match token.kind {
            TokenKind::Eof => ParseError::new("Unexpected end of file", token.span),
            _ => ParseError::new(format!("Unexpected \"{}\"", self.text(token.span)), token.span),
        }
    }

    /// Index of the first token at bracket depth zero (relative to `from`)
    /// that satisfies `stop`, or of the first unmatched closer / EOF.
    /// With `angles`, `<`/`>` count as brackets (type position).
    pub(crate) fn skip_to(&self, from: usize, stop: impl Fn(&TokenKind) -> bool, angles: bool) -> usize {
        let mut depth = 0usize;
        let mut i = from;
        loop {
            let kind = self.kind(i);
            if depth == 0 && stop(kind) {
                return i;
            }
            match kind {
                TokenKind::Eof => return i,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::Lt if angles => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    if depth == 0 {
                        return i;
                    }
                    depth -= 1;
                }
                TokenKind::Gt | TokenKind::GtGt | TokenKind::GtGtGt if angles => {
                    let n = match kind {
                        TokenKind::Gt => 1,
                        TokenKind::GtGt => 2,
                        _ => 3,
                    };
                    if depth == 0 {
                        return i;
                    }
                    depth = depth.saturating_sub(n);
                }
                _ => {}
            }
            i += 1;
        }
    }

    /// Index just past the bracket group opening at `open`.
    pub(crate) fn skip_balanced(&self, open: usize) -> usize {
        let close = self.skip_to(open + 1, |_| false, false);
        if matches!(self.kind(close), TokenKind::Eof) {
            close
        } else {
            close + 1
        }
    }

    pub(crate) fn add_record(&mut self, specifier: String, span: Span, kind: ImportKind) -> usize {
        self.import_records.push(ImportRecord {
            specifier,
            span,
            kind,
            resolved: None,
        });
        self.import_records.len() - 1
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.pos;
        match self.kind(start) {
            TokenKind::Semicolon => {
                self.pos += 1;
                Ok(Stmt::ElidedEmpty)
            }
            TokenKind::Import
                if !matches!(self.kind(start + 1), TokenKind::LParen | TokenKind::Dot) =>
            {
                self.parse_import(start)
            }
            TokenKind::Export => self.parse_export(start),
            _ => {
                if self.options.typescript {
                    if let Some(stmt) = self.parse_typescript_statement(start)? {
                        return Ok(stmt);
                    }
                }
                self.parse_plain(start)
            }
        }
    }

    /// An ordinary statement carried through as source text.
    fn parse_plain(&mut self, start: usize) -> Result<Stmt, ParseError> {
        let mode = if self.starts_declaration(start) {
            Boundary::DECLARATION
        } else {
            Boundary::EXPRESSION
        };
        let end = self.find_end(start, mode)?;
        self.pos = end.end;

        // `function f(): void;` is an overload signature
        if mode.declaration && !end.block_bodied && self.options.typescript {
            return Ok(Stmt::ElidedNone);
        }
        Ok(self.value_stmt(start, end))
    }

    /// `function`, `async function`, `class` or a decorated class.
    pub(crate) fn starts_declaration(&self, i: usize) -> bool {
        match self.kind(i) {
            TokenKind::Function | TokenKind::Class | TokenKind::At => true,
            _ => {
                self.is_word(i, "async")
                    && matches!(self.kind(i + 1), TokenKind::Function)
                    && !self.tok(i + 1).had_newline_before
            }
        }
    }

    /// Build a value statement from tokens `start..end.end`.
    pub(crate) fn value_stmt(&mut self, start: usize, end: StmtEnd) -> Stmt {
        let (builder, verbatim) = self.statement_parts(start, end);
        finish_value(builder, verbatim)
    }

    /// Code for tokens `from..end.end`, terminated with `;` unless the
    /// statement ended at its body.
    pub(crate) fn statement_parts(&mut self, from: usize, end: StmtEnd) -> (PartsBuilder, bool) {
        let (parts, verbatim) = self.slice_parts(from, end.end);
        let mut builder = PartsBuilder::new();
        builder.append(parts);
        if !end.block_bodied && !builder.ends_with_semicolon() {
            builder.text(";");
        }
        (builder, verbatim)
    }

    pub(crate) fn unsupported(&self, construct: &'static str, start: usize) -> Stmt {
        Stmt::Value(ValueStmt::new(Code::Unsupported {
            construct,
            span: self.tok(start).span,
        }))
    }

    // =========================================================================
    // Statement Boundaries
    // =========================================================================

    /// Find where the statement starting at token `start` ends.
    pub(crate) fn find_end(&self, start: usize, mode: Boundary) -> Result<StmtEnd, ParseError> {
        let mut stack: Vec<Open> = Vec::new();
        let mut pending_control = false;
        let mut after_header = false;
        let mut do_count = 0usize;
        let mut body_opened = false;
        let mut angles = 0usize;
        let mut closed_angles = false;
        let mut i = start;

        loop {
            let closed_header = std::mem::take(&mut after_header);
            let control = std::mem::take(&mut pending_control);
            let after_type_args = std::mem::take(&mut closed_angles);

            if i > start
                && stack.is_empty()
                && angles == 0
                && self.inserts_semicolon(
                    i,
                    mode,
                    closed_header,
                    body_opened,
                    do_count,
                    after_type_args,
                )
            {
                return Ok(StmtEnd {
                    end: i,
                    block_bodied: false,
                });
            }

            let kind = self.kind(i);
            match kind {
                TokenKind::Eof => {
                    if !stack.is_empty() {
                        return Err(self.unexpected(i));
                    }
                    return Ok(StmtEnd {
                        end: i,
                        block_bodied: false,
                    });
                }
                TokenKind::LParen => {
                    let header = control && stack.is_empty();
                    let do_while = header
                        && do_count > 0
                        && matches!(self.kind(i.saturating_sub(1)), TokenKind::While)
                        && self.is_do_while(i - 1);
                    stack.push(Open {
                        close: Closer::Paren,
                        body: false,
                        header,
                        do_while,
                    });
                }
                TokenKind::LBracket => stack.push(Open {
                    close: Closer::Bracket,
                    body: false,
                    header: false,
                    do_while: false,
                }),
                TokenKind::LBrace => {
                    let body = stack.is_empty()
                        && self.is_body_brace(i, start, mode, closed_header, body_opened);
                    body_opened |= body;
                    stack.push(Open {
                        close: Closer::Brace,
                        body,
                        header: false,
                        do_while: false,
                    });
                }
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    let closer = match kind {
                        TokenKind::RParen => Closer::Paren,
                        TokenKind::RBracket => Closer::Bracket,
                        _ => Closer::Brace,
                    };
                    let open = match stack.pop() {
                        Some(open) if open.close == closer => open,
                        _ => return Err(self.unexpected(i)),
                    };
                    if stack.is_empty() {
                        if open.do_while {
                            do_count -= 1;
                            if do_count == 0 {
                                let mut end = i + 1;
                                if matches!(self.kind(end), TokenKind::Semicolon) {
                                    end += 1;
                                }
                                return Ok(StmtEnd {
                                    end,
                                    block_bodied: false,
                                });
                            }
                        } else if open.header {
                            after_header = true;
                        } else if open.body && !self.continues_clause(i + 1, do_count) {
                            return Ok(StmtEnd {
                                end: i + 1,
                                block_bodied: true,
                            });
                        }
                    }
                }
                TokenKind::Semicolon if stack.is_empty() => {
                    if !self.continues_clause(i + 1, do_count) {
                        return Ok(StmtEnd {
                            end: i + 1,
                            block_bodied: false,
                        });
                    }
                }
                TokenKind::If
                | TokenKind::For
                | TokenKind::While
                | TokenKind::With
                | TokenKind::Switch
                | TokenKind::Catch
                    if stack.is_empty() && !self.follows_dot(i) =>
                {
                    pending_control = true;
                }
                TokenKind::Do if stack.is_empty() && !self.follows_dot(i) => do_count += 1,
                TokenKind::Lt if mode.types && stack.is_empty() => angles += 1,
                TokenKind::Gt | TokenKind::GtGt | TokenKind::GtGtGt
                    if mode.types && stack.is_empty() && angles > 0 =>
                {
                    let n = match kind {
                        TokenKind::Gt => 1,
                        TokenKind::GtGt => 2,
                        _ => 3,
                    };
                    angles = angles.saturating_sub(n);
                    closed_angles = angles == 0;
                }
                TokenKind::Identifier(word) if word == "await" => pending_control = control,
                _ => {}
            }
            i += 1;
        }
    }

    /// Whether the token at `i` is reached through a member access.
    fn follows_dot(&self, i: usize) -> bool {
        i > 0 && matches!(self.kind(i - 1), TokenKind::Dot | TokenKind::QuestionDot)
    }

    /// A `while` that closes a `do` body rather than starting a loop.
    fn is_do_while(&self, while_at: usize) -> bool {
        while_at > 0
            && matches!(
                self.kind(while_at - 1),
                TokenKind::RBrace | TokenKind::Semicolon
            )
    }

    /// `else`, `catch`, `finally` and a pending `do`'s `while` keep a
    /// statement going past a body or semicolon.
    fn continues_clause(&self, next: usize, do_count: usize) -> bool {
        match self.kind(next) {
            TokenKind::Else | TokenKind::Catch | TokenKind::Finally => true,
            TokenKind::While => do_count > 0,
            _ => false,
        }
    }

    fn is_body_brace(
        &self,
        i: usize,
        start: usize,
        mode: Boundary,
        closed_header: bool,
        body_opened: bool,
    ) -> bool {
        if i == start || closed_header {
            return true;
        }
        let prev = self.kind(i - 1);
        if matches!(
            prev,
            TokenKind::Else | TokenKind::Try | TokenKind::Finally | TokenKind::Do | TokenKind::Catch
        ) {
            return true;
        }
        mode.declaration
            && !body_opened
            && !matches!(
                prev,
                TokenKind::Colon
                    | TokenKind::Lt
                    | TokenKind::Pipe
                    | TokenKind::Amp
                    | TokenKind::Comma
                    | TokenKind::LParen
                    | TokenKind::LBracket
                    | TokenKind::Eq
                    | TokenKind::Arrow
                    | TokenKind::Extends
                    | TokenKind::Question
            )
    }

    /// Automatic semicolon insertion before token `i` at depth zero.
    fn inserts_semicolon(
        &self,
        i: usize,
        mode: Boundary,
        closed_header: bool,
        body_opened: bool,
        do_count: usize,
        after_type_args: bool,
    ) -> bool {
        let next = self.tok(i);
        if !next.had_newline_before || matches!(next.kind, TokenKind::Eof) {
            return false;
        }
        if (mode.declaration && !body_opened) || closed_header {
            return false;
        }
        if self.continues_clause(i, do_count) {
            return false;
        }

        let prev = self.kind(i - 1);
        if matches!(
            prev,
            TokenKind::Return | TokenKind::Break | TokenKind::Continue | TokenKind::Throw
        ) || self.is_word(i - 1, "yield")
        {
            return true;
        }
        if matches!(next.kind, TokenKind::PlusPlus | TokenKind::MinusMinus) {
            return self.can_end_statement(i - 1, i);
        }
        if self.continues_expression(&next.kind, mode) {
            return false;
        }
        after_type_args || self.can_end_statement(i - 1, i)
    }

    /// Tokens on a new line that still belong to the previous line's statement.
    fn continues_expression(&self, kind: &TokenKind, mode: Boundary) -> bool {
        match kind {
            TokenKind::Dot
            | TokenKind::QuestionDot
            | TokenKind::Comma
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::Template
            | TokenKind::Arrow => true,
            TokenKind::Identifier(word) => {
                matches!(word.as_str(), "as" | "satisfies")
                    || (mode.module_clause && matches!(word.as_str(), "from" | "assert"))
            }
            TokenKind::With => mode.module_clause,
            other => other.is_binary_operator() || other.is_assignment(),
        }
    }

    fn can_end_statement(&self, prev: usize, next: usize) -> bool {
        match self.kind(prev) {
            TokenKind::Identifier(_)
            | TokenKind::String(_)
            | TokenKind::Number(_)
            | TokenKind::BigInt
            | TokenKind::Regex
            | TokenKind::Template
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace
            | TokenKind::This
            | TokenKind::Super
            | TokenKind::Null
            | TokenKind::True
            | TokenKind::False
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus => true,
            // `: void` and `Array<T>` at the end of a type annotation
            TokenKind::Void => self.options.typescript,
            TokenKind::Gt => self.options.typescript && self.starts_statement(next),
            kind => kind.is_keyword() && self.follows_dot(prev),
        }
    }

    fn starts_statement(&self, i: usize) -> bool {
        match self.kind(i) {
            TokenKind::Var
            | TokenKind::Let
            | TokenKind::Const
            | TokenKind::Function
            | TokenKind::Class
            | TokenKind::If
            | TokenKind::For
            | TokenKind::While
            | TokenKind::Do
            | TokenKind::Return
            | TokenKind::Try
            | TokenKind::Switch
            | TokenKind::Throw
            | TokenKind::Import
            | TokenKind::Export => true,
            TokenKind::Identifier(word) => matches!(
                word.as_str(),
                "type" | "interface" | "declare" | "enum" | "namespace" | "abstract" | "async"
            ),
            _ => false,
        }
    }

    // =========================================================================
    // Code Extraction
    // =========================================================================

    /// Source text of tokens `from..to` with `require()`/`import()` calls
    /// split out into loader parts when bundling. Also reports whether the
    /// range holds a multi-line string or template.
    pub(crate) fn slice_parts(&mut self, from: usize, to: usize) -> (Vec<Part>, bool) {
        let mut builder = PartsBuilder::new();
        if from >= to {
            return (builder.finish(), false);
        }

        let verbatim = (from..to).any(|i| {
            matches!(self.kind(i), TokenKind::String(_) | TokenKind::Template)
                && self.text(self.tok(i).span).contains('\n')
        });
        let base_indent = if verbatim {
            0
        } else {
            self.line_indent(self.tok(from).span.start as usize)
        };

        let mut cursor = self.tok(from).span.start as usize;
        let mut i = from;
        while i < to {
            if self.options.is_bundling {
                if let Some((kind, specifier, span)) = self.match_loader_call(i, to) {
                    let call_start = self.tok(i).span.start as usize;
                    builder.text(&dedent(self.slice(cursor, call_start), base_indent));
                    let record = self.add_record(specifier, span, kind);
                    if kind == ImportKind::Dynamic {
                        builder
                            .text("Promise.resolve().then(() => ")
                            .require(record)
                            .text(")");
                    } else {
                        builder.require(record);
                    }
                    cursor = self.tok(i + 3).span.end as usize;
                    i += 4;
                    continue;
                }
            }
            i += 1;
        }
        let end = self.tok(to - 1).span.end as usize;
        builder.text(&dedent(self.slice(cursor, end), base_indent));

        (builder.finish(), verbatim)
    }

    /// `require("m")` (not a member call) or `import("m")` at `i`.
    fn match_loader_call(&self, i: usize, to: usize) -> Option<(ImportKind, String, Span)> {
        if i + 3 >= to {
            return None;
        }
        let kind = match self.kind(i) {
            TokenKind::Identifier(name) if name == "require" && !self.follows_dot(i) => {
                ImportKind::Require
            }
            TokenKind::Import => ImportKind::Dynamic,
            _ => return None,
        };
        let TokenKind::String(specifier) = self.kind(i + 2) else {
            return None;
        };
        if !matches!(self.kind(i + 1), TokenKind::LParen)
            || !matches!(self.kind(i + 3), TokenKind::RParen)
        {
            return None;
        }
        Some((kind, specifier.clone(), self.tok(i + 2).span))
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        self.source.get(start..end).unwrap_or("")
    }

    /// Width of the leading whitespace on the line containing `offset`.
    fn line_indent(&self, offset: usize) -> usize {
        let line_start = self.source[..offset].rfind('\n').map_or(0, |i| i + 1);
        self.source[line_start..]
            .bytes()
            .take_while(|b| matches!(b, b' ' | b'\t'))
            .count()
    }
}

pub(crate) fn finish_value(builder: PartsBuilder, verbatim_lines: bool) -> Stmt {
    Stmt::Value(ValueStmt {
        code: Code::Parts(builder.finish()),
        verbatim_lines,
    })
}

/// Strip up to `indent` leading blanks from every line after the first.
fn dedent(text: &str, indent: usize) -> String {
    if indent == 0 || !text.contains('\n') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for (n, line) in text.split('\n').enumerate() {
        if n > 0 {
            out.push('\n');
            let blanks = line
                .bytes()
                .take(indent)
                .take_while(|b| matches!(b, b' ' | b'\t'))
                .count();
            out.push_str(&line[blanks..]);
        } else {
            out.push_str(line);
        }
    }
    out
}

/// A double-quoted JavaScript string literal for `value`.
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if u32::from(c) < 0x20 => out.push_str(&format!("\\x{:02x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Run the lexer to completion, failing on the first invalid token.
fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        match token.kind {
            TokenKind::Invalid(message) => return Err(ParseError::new(message, token.span)),
            TokenKind::Eof => {
                tokens.push(token);
                return Ok(tokens);
            }
            _ => tokens.push(token),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn ts() -> ParserOptions {
        ParserOptions {
            is_bundling: true,
            typescript: true,
        }
    }

    pub(crate) fn parse(source: &str, options: ParserOptions) -> ParsedModule {
        Parser::new(source, options).parse().unwrap()
    }

    /// Render plain statements the way the linker would, with ids in place
    /// of loader parts.
    pub(crate) fn render(module: &ParsedModule) -> Vec<String> {
        module
            .stmts
            .iter()
            .map(|stmt| match stmt {
                Stmt::ElidedEmpty => ";".to_string(),
                Stmt::ElidedNone => "<none>".to_string(),
                Stmt::Value(value) => match &value.code {
                    Code::Unsupported { construct, .. } => format!("<unsupported {construct}>"),
                    Code::Parts(parts) => parts
                        .iter()
                        .map(|part| match part {
                            Part::Text(text) => text.clone(),
                            Part::Require(i) => format!("__require({})", module.import_records[*i].specifier),
                            Part::SelfId => "SELF".to_string(),
                        })
                        .collect(),
                },
            })
            .collect()
    }

    #[test]
    fn test_asi_splits_lines() {
        let module = parse("let a = 1\nlet b = a\nfoo()", ParserOptions::default());
        assert_eq!(render(&module), vec!["let a = 1;", "let b = a;", "foo();"]);
    }

    #[test]
    fn test_continuation_lines_stay_together() {
        let source = "const x = a\n  .b()\n  + c\nfoo(\n  1,\n  2\n)";
        let module = parse(source, ParserOptions::default());
        assert_eq!(render(&module), vec!["const x = a\n  .b()\n  + c;", "foo(\n  1,\n  2\n);"]);
    }

    #[test]
    fn test_block_bodied_statements() {
        let source = "function f() {\n  return 1\n}\nif (a) {\n} else if (b) {\n} else {}\ntry {} catch {} finally {}\nclass A extends B {}";
        let module = parse(source, ParserOptions::default());
        assert_eq!(
            render(&module),
            vec![
                "function f() {\n  return 1\n}",
                "if (a) {\n} else if (b) {\n} else {}",
                "try {} catch {} finally {}",
                "class A extends B {}",
            ]
        );
    }

    #[test]
    fn test_control_without_braces() {
        let source = "if (a)\n  b()\nelse\n  c()\nfor (let i = 0; i < 3; i++) x++\ndo x--; while (x)\ny";
        let module = parse(source, ParserOptions::default());
        assert_eq!(
            render(&module),
            vec!["if (a)\n  b()\nelse\n  c();", "for (let i = 0; i < 3; i++) x++;", "do x--; while (x);", "y;"]
        );
    }

    #[test]
    fn test_arrow_body_is_expression() {
        let module = parse("const f = () => {\n}\nf()", ParserOptions::default());
        assert_eq!(render(&module), vec!["const f = () => {\n};", "f();"]);
    }

    #[test]
    fn test_restricted_return() {
        let module = parse("return\nvalue", ParserOptions::default());
        assert_eq!(render(&module), vec!["return;", "value;"]);
    }

    #[test]
    fn test_keyword_property_ends_statement() {
        let module = parse("a.default\nb.if\nc", ParserOptions::default());
        assert_eq!(render(&module), vec!["a.default;", "b.if;", "c;"]);
    }

    #[test]
    fn test_dedent_relative_to_first_line() {
        let module = parse("    foo(\n      1\n    )", ParserOptions::default());
        assert_eq!(render(&module), vec!["foo(\n  1\n);"]);
    }

    #[test]
    fn test_multiline_template_is_verbatim() {
        let module = parse("  x = `a\n    b`", ParserOptions::default());
        let Stmt::Value(value) = &module.stmts[0] else {
            panic!("expected value statement");
        };
        assert!(value.verbatim_lines);
        assert_eq!(render(&module), vec!["x = `a\n    b`;"]);
    }

    #[test]
    fn test_stray_semicolon_is_empty_marker() {
        let module = parse(";;x;", ParserOptions::default());
        assert_eq!(render(&module), vec![";", ";", "x;"]);
    }

    #[test]
    fn test_require_calls_become_records() {
        let module = parse(
            "const a = require(\"./a\"), b = x.require(\"./b\")\nimport(\"./c\")",
            ts(),
        );
        assert_eq!(
            render(&module),
            vec![
                "const a = __require(./a), b = x.require(\"./b\");",
                "Promise.resolve().then(() => __require(./c));",
            ]
        );
        assert_eq!(module.import_records.len(), 2);
        assert_eq!(module.import_records[0].kind, ImportKind::Require);
        assert_eq!(module.import_records[1].kind, ImportKind::Dynamic);
    }

    #[test]
    fn test_require_untouched_without_bundling() {
        let module = parse("require(\"./a\")", ParserOptions::default());
        assert_eq!(render(&module), vec!["require(\"./a\");"]);
        assert!(module.import_records.is_empty());
    }

    #[test]
    fn test_unbalanced_brackets_are_errors() {
        let err = Parser::new("foo(1", ParserOptions::default()).parse().unwrap_err();
        assert_eq!(err.message, "Unexpected end of file");
        let err = Parser::new("a)", ParserOptions::default()).parse().unwrap_err();
        assert_eq!(err.message, "Unexpected \")\"");
    }

    #[test]
    fn test_lexer_errors_surface() {
        let err = Parser::new("let s = 'abc", ParserOptions::default()).parse().unwrap_err();
        assert_eq!(err.message, "Unterminated string literal");
        assert_eq!(err.span.start, 8);
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("a\"b\\c\n"), r#""a\"b\\c\n""#);
        assert_eq!(quote("\u{1}"), r#""\x01""#);
    }

    #[test]
    fn test_dedent_helper() {
        assert_eq!(dedent("a\n    b\n  c", 2), "a\n  b\nc");
        assert_eq!(dedent("a\n\tb", 4), "a\nb");
    }
}
