//! TypeScript-specific statements.
//!
//! All TS handling as `impl<'a> Parser<'a>` methods. Ambient `declare`
//! forms and type-only declarations are elided here, and non-ambient enums
//! are lowered to the usual object-building function.

use rustc_hash::FxHashMap;

use crate::parser::{finish_value, quote, Boundary, ParseError, Parser};
use crate::span::Span;
use crate::stmt::{PartsBuilder, Stmt};
use crate::token::TokenKind;

/// Value of one enum member as far as it can be known at parse time.
#[derive(Debug, Clone, PartialEq)]
enum EnumValue {
    Number(f64),
    String(String),
    /// Arbitrary initializer expression, already rewritten.
    Computed(String),
}

impl<'a> Parser<'a> {
    /// Statements that only exist in TypeScript. Returns `None` for anything
    /// that should be parsed as plain JavaScript.
    pub(crate) fn parse_typescript_statement(&mut self, start: usize) -> Result<Option<Stmt>, ParseError> {
        let next_on_line = !self.tok(start + 1).had_newline_before;
        let next_is_ident = matches!(self.kind(start + 1), TokenKind::Identifier(_));

        let stmt = match self.kind(start) {
            TokenKind::Const if self.is_word(start + 1, "enum") && next_on_line => {
                self.parse_enum(start + 1, false)?
            }
            TokenKind::Identifier(word) => match word.as_str() {
                "declare" if self.is_modifier(start, "declare") => self.parse_declare(start, start)?,
                "type" if next_is_ident && next_on_line => self.skip_type_only(start, Boundary::TYPE)?,
                "interface" if next_is_ident && next_on_line => {
                    self.skip_type_only(start, Boundary::DECLARATION)?
                }
                "enum" if next_is_ident && next_on_line => self.parse_enum(start, false)?,
                "namespace" | "module"
                    if next_on_line
                        && matches!(
                            self.kind(start + 1),
                            TokenKind::Identifier(_) | TokenKind::String(_)
                        ) =>
                {
                    let construct = if word == "namespace" { "namespace" } else { "module" };
                    let end = self.find_end(start, Boundary::DECLARATION)?;
                    self.pos = end.end;
                    self.unsupported(construct, start)
                }
                "abstract" if next_on_line && matches!(self.kind(start + 1), TokenKind::Class) => {
                    let end = self.find_end(start, Boundary::DECLARATION)?;
                    self.pos = end.end;
                    self.value_stmt(start + 1, end)
                }
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };
        Ok(Some(stmt))
    }

    /// Skip a declaration that has no runtime meaning.
    pub(crate) fn skip_type_only(&mut self, start: usize, mode: Boundary) -> Result<Stmt, ParseError> {
        let end = self.find_end(start, mode)?;
        self.pos = end.end;
        Ok(Stmt::ElidedNone)
    }

    /// `declare <decl>` starting at `stmt_start` (which may be an `export`).
    ///
    /// Variables, functions and type-only forms vanish; classes, namespaces
    /// and enums leave a single empty statement behind.
    pub(crate) fn parse_declare(&mut self, stmt_start: usize, declare_at: usize) -> Result<Stmt, ParseError> {
        let word_at = declare_at + 1;
        let word = self.kind(word_at).word().unwrap_or_default();

        let (stmt, mode) = match word {
            "var" | "let" | "function" | "type" => (Stmt::ElidedNone, Boundary::TYPE),
            "const" if self.is_word(word_at + 1, "enum") => (Stmt::ElidedEmpty, Boundary::DECLARATION),
            "const" => (Stmt::ElidedNone, Boundary::TYPE),
            "interface" => (Stmt::ElidedNone, Boundary::DECLARATION),
            "class" | "namespace" | "module" | "global" | "enum" => {
                (Stmt::ElidedEmpty, Boundary::DECLARATION)
            }
            "abstract" if matches!(self.kind(word_at + 1), TokenKind::Class) => {
                (Stmt::ElidedEmpty, Boundary::DECLARATION)
            }
            _ => {
                let token = self.tok(word_at);
                return Err(ParseError::new(
                    format!("Unexpected \"{}\" after \"declare\"", self.text(token.span)),
                    token.span,
                ));
            }
        };

        let end = self.find_end(stmt_start, mode)?;
        self.pos = end.end;
        Ok(stmt)
    }

    // =========================================================================
    // Enums
    // =========================================================================

    /// Lower `enum E { ... }` (the `enum` keyword at `enum_at`).
    pub(crate) fn parse_enum(&mut self, enum_at: usize, exported: bool) -> Result<Stmt, ParseError> {
        let name_at = enum_at + 1;
        let TokenKind::Identifier(name) = self.kind(name_at) else {
            return Err(self.unexpected(name_at));
        };
        let name = name.clone();
        if !matches!(self.kind(name_at + 1), TokenKind::LBrace) {
            return Err(self.unexpected(name_at + 1));
        }

        let mut members: Vec<(String, EnumValue)> = Vec::new();
        let mut known: FxHashMap<String, f64> = FxHashMap::default();
        let mut next_value = Some(0.0);
        let mut c = name_at + 2;

        while !matches!(self.kind(c), TokenKind::RBrace) {
            let member_at = c;
            let member = match self.kind(c) {
                TokenKind::String(s) => s.clone(),
                kind => kind.word().ok_or_else(|| self.unexpected(c))?.to_string(),
            };
            c += 1;

            let value = if matches!(self.kind(c), TokenKind::Eq) {
                let init_start = c + 1;
                let init_end = self.skip_to(init_start, |k| matches!(k, TokenKind::Comma), false);
                if init_end == init_start {
                    return Err(self.unexpected(init_start));
                }
                c = init_end;
                self.enum_initializer(&name, &members, &known, init_start, init_end)
            } else {
                match next_value {
                    Some(value) => EnumValue::Number(value),
                    None => {
                        return Err(ParseError::new(
                            "Enum member must have initializer",
                            self.tok(member_at).span,
                        ))
                    }
                }
            };

            next_value = match value {
                EnumValue::Number(n) => {
                    known.insert(member.clone(), n);
                    Some(n + 1.0)
                }
                _ => None,
            };
            members.push((member, value));

            match self.kind(c) {
                TokenKind::Comma => c += 1,
                TokenKind::RBrace => {}
                _ => return Err(self.unexpected(c)),
            }
        }
        self.pos = c + 1;

        let mut code = String::new();
        if exported && !self.options.is_bundling {
            code.push_str("export ");
        }
        code.push_str(&format!("var {name};\n(function ({name}) {{\n"));
        for (member, value) in &members {
            let key = quote(member);
            let line = match value {
                EnumValue::Number(n) => {
                    format!("  {name}[{name}[{key}] = {}] = {key};\n", format_number(*n))
                }
                EnumValue::String(s) => format!("  {name}[{key}] = {};\n", quote(s)),
                EnumValue::Computed(expr) => format!("  {name}[{name}[{key}] = {expr}] = {key};\n"),
            };
            code.push_str(&line);
        }
        code.push_str(&format!("}})({name} || ({name} = {{}}));"));

        let mut builder = PartsBuilder::new();
        builder.text(&code);
        if exported && self.options.is_bundling {
            builder.text("\n");
            push_export_call(&mut builder, &[(name.clone(), name)]);
        }
        Ok(finish_value(builder, false))
    }

    fn enum_initializer(
        &self,
        enum_name: &str,
        members: &[(String, EnumValue)],
        known: &FxHashMap<String, f64>,
        start: usize,
        end: usize,
    ) -> EnumValue {
        if let (1, TokenKind::String(s)) = (end - start, self.kind(start)) {
            return EnumValue::String(s.clone());
        }
        let mut c = start;
        if let Some(n) = self.fold_binary(known, &mut c, end, 0).filter(|_| c == end) {
            return EnumValue::Number(n);
        }

        // Rewrite references to sibling members as property reads.
        let mut expr = String::new();
        let mut cursor = self.tok(start).span.start as usize;
        for i in start..end {
            let token = self.tok(i);
            if let TokenKind::Identifier(id) = &token.kind {
                let preceded_by_dot = matches!(self.kind(i - 1), TokenKind::Dot | TokenKind::QuestionDot);
                if !preceded_by_dot && members.iter().any(|(m, _)| m == id) {
                    expr.push_str(self.text(Span::new(cursor as u32, token.span.start)));
                    expr.push_str(&format!("{enum_name}[{}]", quote(id)));
                    cursor = token.span.end as usize;
                }
            }
        }
        let last = self.tok(end - 1).span.end;
        expr.push_str(self.text(Span::new(cursor as u32, last)));
        EnumValue::Computed(expr)
    }

    /// Fold a numeric constant expression made of literals and earlier
    /// members, consuming binary operators of at least `min_prec`.
    fn fold_binary(
        &self,
        known: &FxHashMap<String, f64>,
        c: &mut usize,
        end: usize,
        min_prec: u8,
    ) -> Option<f64> {
        let mut left = self.fold_unary(known, c, end)?;
        while *c < end {
            let op = self.kind(*c);
            if matches!(op, TokenKind::RParen) {
                break;
            }
            let prec = binary_precedence(op)?;
            if prec < min_prec {
                break;
            }
            *c += 1;
            // `**` is right-associative
            let next_min = if matches!(op, TokenKind::StarStar) { prec } else { prec + 1 };
            let right = self.fold_binary(known, c, end, next_min)?;
            left = apply_binary(op, left, right);
        }
        Some(left)
    }

    fn fold_unary(&self, known: &FxHashMap<String, f64>, c: &mut usize, end: usize) -> Option<f64> {
        if *c >= end {
            return None;
        }
        let at = *c;
        *c += 1;
        match self.kind(at) {
            TokenKind::Number(n) => Some(*n),
            TokenKind::Identifier(id) => known.get(id).copied(),
            TokenKind::Minus => self.fold_unary(known, c, end).map(|n| -n),
            TokenKind::Plus => self.fold_unary(known, c, end),
            TokenKind::Tilde => self.fold_unary(known, c, end).map(|n| f64::from(!to_int32(n))),
            TokenKind::LParen => {
                let inner = self.fold_binary(known, c, end, 0)?;
                if *c < end && matches!(self.kind(*c), TokenKind::RParen) {
                    *c += 1;
                    Some(inner)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

fn binary_precedence(kind: &TokenKind) -> Option<u8> {
    let prec = match kind {
        TokenKind::Pipe => 1,
        TokenKind::Caret => 2,
        TokenKind::Amp => 3,
        TokenKind::LtLt | TokenKind::GtGt | TokenKind::GtGtGt => 4,
        TokenKind::Plus | TokenKind::Minus => 5,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 6,
        TokenKind::StarStar => 7,
        _ => return None,
    };
    Some(prec)
}

/// Apply a binary operator with JavaScript number semantics.
fn apply_binary(op: &TokenKind, left: f64, right: f64) -> f64 {
    let shift = to_uint32(right) & 31;
    match op {
        TokenKind::Pipe => f64::from(to_int32(left) | to_int32(right)),
        TokenKind::Caret => f64::from(to_int32(left) ^ to_int32(right)),
        TokenKind::Amp => f64::from(to_int32(left) & to_int32(right)),
        TokenKind::LtLt => f64::from(to_int32(left).wrapping_shl(shift)),
        TokenKind::GtGt => f64::from(to_int32(left) >> shift),
        TokenKind::GtGtGt => f64::from(to_uint32(left) >> shift),
        TokenKind::Plus => left + right,
        TokenKind::Minus => left - right,
        TokenKind::Star => left * right,
        TokenKind::Slash => left / right,
        TokenKind::Percent => left % right,
        _ => left.powf(right),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_uint32(value: f64) -> u32 {
    if value.is_finite() {
        value.trunc().rem_euclid(4_294_967_296.0) as u32
    } else {
        0
    }
}

#[allow(clippy::cast_possible_wrap)]
fn to_int32(value: f64) -> i32 {
    to_uint32(value) as i32
}

/// `__export(<self>, { key: () => value, ... });`
pub(crate) fn push_export_call(builder: &mut PartsBuilder, getters: &[(String, String)]) {
    let body = getters
        .iter()
        .map(|(key, value)| format!("{key}: () => {value}"))
        .collect::<Vec<_>>()
        .join(", ");
    builder
        .text("__export(")
        .self_id()
        .text(&format!(", {{ {body} }});"));
}

/// Format a number the way JavaScript prints it for common values.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
