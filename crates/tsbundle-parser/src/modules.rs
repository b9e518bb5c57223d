//! `import` and `export` statements.
//!
//! When bundling, module syntax is lowered onto the loader runtime:
//! imports become destructured `__require` calls and exports become lazy
//! getters registered through `__export`. Without bundling the statements are
//! kept as written, minus any TypeScript `type`-only pieces.

use crate::parser::{finish_value, quote, Boundary, ParseError, Parser, StmtEnd};
use crate::span::Span;
use crate::stmt::{ImportKind, PartsBuilder, Stmt};
use crate::token::TokenKind;
use crate::typescript::push_export_call;

/// An imported or exported name, either a bare word or a string literal.
#[derive(Debug, Clone, PartialEq)]
struct Name {
    text: String,
    quoted: bool,
}

impl Name {
    /// Form usable as an object key or in a specifier list.
    fn key(&self) -> String {
        if self.quoted {
            quote(&self.text)
        } else {
            self.text.clone()
        }
    }

    /// Member access on a module namespace object.
    fn access(&self) -> String {
        if self.quoted {
            format!("[{}]", quote(&self.text))
        } else {
            format!(".{}", self.text)
        }
    }
}

/// One entry of a `{ ... }` specifier list.
#[derive(Debug, Clone)]
struct Specifier {
    name: Name,
    alias: Option<Name>,
    is_type: bool,
}

impl Specifier {
    /// The local binding for imports, the exported name for exports.
    fn renamed(&self) -> &Name {
        self.alias.as_ref().unwrap_or(&self.name)
    }

    fn source_form(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} as {}", self.name.key(), alias.key()),
            None => self.name.key(),
        }
    }
}

#[derive(Debug, Default)]
struct ImportClause {
    default: Option<String>,
    namespace: Option<String>,
    named: Vec<Specifier>,
}

impl<'a> Parser<'a> {
    // =========================================================================
    // Imports
    // =========================================================================

    pub(crate) fn parse_import(&mut self, start: usize) -> Result<Stmt, ParseError> {
        let end = self.find_end(start, Boundary::MODULE)?;
        self.pos = end.end;
        let mut c = start + 1;

        if self.options.typescript && self.is_type_modifier(c) {
            return Ok(Stmt::ElidedNone);
        }
        if matches!(self.kind(c), TokenKind::Identifier(_)) && matches!(self.kind(c + 1), TokenKind::Eq) {
            return self.lower_import_equals(c, end);
        }
        if let TokenKind::String(specifier) = self.kind(c) {
            if !self.options.is_bundling {
                return Ok(self.value_stmt(start, end));
            }
            let specifier = specifier.clone();
            let record = self.add_record(specifier, self.tok(c).span, ImportKind::Stmt);
            let mut builder = PartsBuilder::new();
            builder.require(record).text(";");
            return Ok(finish_value(builder, false));
        }

        let clause = self.parse_import_clause(&mut c)?;
        let (specifier, span) = self.expect_from(&mut c)?;

        let has_type = clause.named.iter().any(|s| s.is_type);
        let values: Vec<&Specifier> = clause.named.iter().filter(|s| !s.is_type).collect();
        if has_type && values.is_empty() && clause.default.is_none() {
            return Ok(Stmt::ElidedNone);
        }

        if !self.options.is_bundling {
            if !has_type {
                return Ok(self.value_stmt(start, end));
            }
            let mut pieces = Vec::new();
            if let Some(default) = &clause.default {
                pieces.push(default.clone());
            }
            pieces.push(format!(
                "{{ {} }}",
                values.iter().map(|s| s.source_form()).collect::<Vec<_>>().join(", ")
            ));
            return Ok(Stmt::text(format!(
                "import {} from {};",
                pieces.join(", "),
                quote(&specifier)
            )));
        }

        let record = self.add_record(specifier, span, ImportKind::Stmt);
        let mut builder = PartsBuilder::new();
        if let Some(namespace) = &clause.namespace {
            builder.text(&format!("const {namespace} = ")).require(record);
            if let Some(default) = &clause.default {
                builder.text(&format!(", {default} = {namespace}.default"));
            }
            builder.text(";");
        } else {
            let mut bindings = Vec::new();
            if let Some(default) = &clause.default {
                bindings.push(format!("default: {default}"));
            }
            for spec in values {
                bindings.push(match &spec.alias {
                    None if !spec.name.quoted => spec.name.text.clone(),
                    _ => format!("{}: {}", spec.name.key(), spec.renamed().text),
                });
            }
            if bindings.is_empty() {
                builder.require(record).text(";");
            } else {
                builder
                    .text(&format!("const {{ {} }} = ", bindings.join(", ")))
                    .require(record)
                    .text(";");
            }
        }
        Ok(finish_value(builder, false))
    }

    /// `import type X ...`: `type` followed by something other than `from`.
    fn is_type_modifier(&self, i: usize) -> bool {
        if !self.is_word(i, "type") {
            return false;
        }
        match self.kind(i + 1) {
            TokenKind::LBrace | TokenKind::Star => true,
            TokenKind::Identifier(word) if word == "from" => self.is_word(i + 2, "from"),
            TokenKind::Identifier(_) => true,
            _ => false,
        }
    }

    /// `import x = require("m")` / `import x = A.B` (name at `name_at`).
    fn lower_import_equals(&mut self, name_at: usize, end: StmtEnd) -> Result<Stmt, ParseError> {
        self.expect_expression(name_at + 2, end)?;
        let name = self.text(self.tok(name_at).span);
        let mut builder = PartsBuilder::new();
        builder.text(&format!("const {name} = "));
        let (rest, verbatim) = self.statement_parts(name_at + 2, end);
        builder.append(rest.finish());
        Ok(finish_value(builder, verbatim))
    }

    /// Fail unless the statement has an expression starting at `at`.
    fn expect_expression(&self, at: usize, end: StmtEnd) -> Result<(), ParseError> {
        if at >= end.end || matches!(self.kind(at), TokenKind::Semicolon | TokenKind::Eof) {
            return Err(self.unexpected(at));
        }
        Ok(())
    }

    fn parse_import_clause(&self, c: &mut usize) -> Result<ImportClause, ParseError> {
        let mut clause = ImportClause::default();

        if let TokenKind::Identifier(name) = self.kind(*c) {
            clause.default = Some(name.clone());
            *c += 1;
            if !matches!(self.kind(*c), TokenKind::Comma) {
                return Ok(clause);
            }
            *c += 1;
        }

        match self.kind(*c) {
            TokenKind::Star => {
                if !self.is_word(*c + 1, "as") {
                    return Err(self.unexpected(*c + 1));
                }
                let TokenKind::Identifier(namespace) = self.kind(*c + 2) else {
                    return Err(self.unexpected(*c + 2));
                };
                clause.namespace = Some(namespace.clone());
                *c += 3;
            }
            TokenKind::LBrace => clause.named = self.parse_specifiers(c)?,
            _ => return Err(self.unexpected(*c)),
        }
        Ok(clause)
    }

    /// `{ a, b as c, type T, "str" as d }` starting at the `{`.
    fn parse_specifiers(&self, c: &mut usize) -> Result<Vec<Specifier>, ParseError> {
        *c += 1;
        let mut specifiers = Vec::new();
        loop {
            if matches!(self.kind(*c), TokenKind::RBrace) {
                *c += 1;
                return Ok(specifiers);
            }

            let mut is_type = false;
            if self.options.typescript && self.is_word(*c, "type") {
                let type_is_name = matches!(self.kind(*c + 1), TokenKind::Comma | TokenKind::RBrace)
                    || (self.is_word(*c + 1, "as")
                        && !matches!(self.kind(*c + 2), TokenKind::Comma | TokenKind::RBrace));
                if !type_is_name {
                    is_type = true;
                    *c += 1;
                }
            }

            let name = self.parse_name(*c)?;
            *c += 1;
            let alias = if self.is_word(*c, "as") {
                let alias = self.parse_name(*c + 1)?;
                *c += 2;
                Some(alias)
            } else {
                None
            };
            specifiers.push(Specifier { name, alias, is_type });

            match self.kind(*c) {
                TokenKind::Comma => *c += 1,
                TokenKind::RBrace => {}
                _ => return Err(self.unexpected(*c)),
            }
        }
    }

    fn parse_name(&self, i: usize) -> Result<Name, ParseError> {
        match self.kind(i) {
            TokenKind::String(text) => Ok(Name {
                text: text.clone(),
                quoted: true,
            }),
            kind => match kind.word() {
                Some(word) => Ok(Name {
                    text: word.to_string(),
                    quoted: false,
                }),
                None => Err(self.unexpected(i)),
            },
        }
    }

    /// `from "specifier"`.
    fn expect_from(&self, c: &mut usize) -> Result<(String, Span), ParseError> {
        if !self.is_word(*c, "from") {
            return Err(ParseError::new("Expected \"from\"", self.tok(*c).span));
        }
        let TokenKind::String(specifier) = self.kind(*c + 1) else {
            return Err(ParseError::new(
                "Expected a module specifier string",
                self.tok(*c + 1).span,
            ));
        };
        let span = self.tok(*c + 1).span;
        *c += 2;
        Ok((specifier.clone(), span))
    }

    // =========================================================================
    // Exports
    // =========================================================================

    pub(crate) fn parse_export(&mut self, start: usize) -> Result<Stmt, ParseError> {
        let c = start + 1;
        let ts = self.options.typescript;

        match self.kind(c) {
            TokenKind::Star => self.export_star(start),
            TokenKind::LBrace => self.export_named(start),
            TokenKind::Default => self.export_default(start),
            TokenKind::Const if ts && self.is_word(c + 1, "enum") => self.parse_enum(c + 1, true),
            TokenKind::Var | TokenKind::Let | TokenKind::Const => self.export_variables(start),
            TokenKind::Function | TokenKind::Class | TokenKind::At => self.export_declaration(start, c),
            TokenKind::Eq if ts => self.export_unsupported("export =", start, Boundary::EXPRESSION),
            TokenKind::Import if ts => self.export_unsupported("export import", start, Boundary::EXPRESSION),
            TokenKind::Identifier(word) if ts || word == "async" => match word.as_str() {
                "async" if self.starts_declaration(c) => self.export_declaration(start, c),
                "type" if matches!(
                    self.kind(c + 1),
                    TokenKind::LBrace | TokenKind::Star | TokenKind::Identifier(_)
                ) =>
                {
                    self.skip_type_only(start, Boundary::TYPE_EXPORT)
                }
                "interface" => self.skip_type_only(start, Boundary::DECLARATION),
                "declare" if self.is_modifier(c, "declare") => self.parse_declare(start, c),
                "enum" => self.parse_enum(c, true),
                "namespace" => self.export_unsupported("namespace", start, Boundary::DECLARATION),
                "module" => self.export_unsupported("module", start, Boundary::DECLARATION),
                "abstract" if matches!(self.kind(c + 1), TokenKind::Class) => {
                    self.export_declaration(start, c + 1)
                }
                "as" if self.is_word(c + 1, "namespace") => self.skip_type_only(start, Boundary::EXPRESSION),
                _ => Err(self.unexpected(c)),
            },
            _ => Err(self.unexpected(c)),
        }
    }

    fn export_unsupported(&mut self, construct: &'static str, start: usize, mode: Boundary) -> Result<Stmt, ParseError> {
        let end = self.find_end(start, mode)?;
        self.pos = end.end;
        Ok(self.unsupported(construct, start))
    }

    /// `export var|let|const ...`
    fn export_variables(&mut self, start: usize) -> Result<Stmt, ParseError> {
        let end = self.find_end(start, Boundary::EXPRESSION)?;
        self.pos = end.end;
        if !self.options.is_bundling {
            return Ok(self.value_stmt(start, end));
        }

        let names = self.declarator_names(start + 2, end.end)?;
        let (mut builder, verbatim) = self.statement_parts(start + 1, end);
        let getters: Vec<(String, String)> = names.into_iter().map(|n| (n.clone(), n)).collect();
        builder.text("\n");
        push_export_call(&mut builder, &getters);
        Ok(finish_value(builder, verbatim))
    }

    /// `export function|class ...`, with the declaration keyword group at `decl_at`.
    fn export_declaration(&mut self, start: usize, decl_at: usize) -> Result<Stmt, ParseError> {
        let end = self.find_end(start, Boundary::DECLARATION)?;
        self.pos = end.end;
        if self.options.typescript && !end.block_bodied {
            return Ok(Stmt::ElidedNone);
        }
        if !self.options.is_bundling {
            if decl_at == start + 1 {
                return Ok(self.value_stmt(start, end));
            }
            let (rest, verbatim) = self.statement_parts(decl_at, end);
            let mut builder = PartsBuilder::new();
            builder.text("export ").append(rest.finish());
            return Ok(finish_value(builder, verbatim));
        }

        let name = self
            .declaration_name(decl_at)
            .ok_or_else(|| self.unexpected(decl_at + 1))?;
        let (mut builder, verbatim) = self.statement_parts(decl_at, end);
        builder.text("\n");
        push_export_call(&mut builder, &[(name.clone(), name)]);
        Ok(finish_value(builder, verbatim))
    }

    fn export_default(&mut self, start: usize) -> Result<Stmt, ParseError> {
        let c = start + 2;
        let ts = self.options.typescript;

        if ts && self.is_word(c, "interface") {
            return self.skip_type_only(start, Boundary::DECLARATION);
        }
        let decl_at = if ts && self.is_word(c, "abstract") && matches!(self.kind(c + 1), TokenKind::Class) {
            Some(c + 1)
        } else if self.starts_declaration(c) {
            Some(c)
        } else {
            None
        };

        let Some(decl_at) = decl_at else {
            let end = self.find_end(start, Boundary::EXPRESSION)?;
            self.expect_expression(c, end)?;
            self.pos = end.end;
            if !self.options.is_bundling {
                return Ok(self.value_stmt(start, end));
            }
            let (value, verbatim) = self.statement_parts(c, end);
            let mut builder = PartsBuilder::new();
            builder.text("const __default = ").append(value.finish()).text("\n");
            push_export_call(&mut builder, &[("default".to_string(), "__default".to_string())]);
            return Ok(finish_value(builder, verbatim));
        };

        let end = self.find_end(start, Boundary::DECLARATION)?;
        self.pos = end.end;
        if ts && !end.block_bodied {
            return Ok(Stmt::ElidedNone);
        }
        if !self.options.is_bundling {
            if decl_at == c {
                return Ok(self.value_stmt(start, end));
            }
            let (rest, verbatim) = self.statement_parts(decl_at, end);
            let mut builder = PartsBuilder::new();
            builder.text("export default ").append(rest.finish());
            return Ok(finish_value(builder, verbatim));
        }

        let (mut builder, verbatim, local) = match self.declaration_name(decl_at) {
            Some(name) => {
                let (builder, verbatim) = self.statement_parts(decl_at, end);
                (builder, verbatim, name)
            }
            None => {
                // Anonymous: give it a name so the getter has something to return.
                let keyword = self.declaration_keyword(decl_at);
                let mut name_slot = keyword + 1;
                if matches!(self.kind(name_slot), TokenKind::Star) {
                    name_slot += 1;
                }
                let filler = if matches!(self.kind(keyword), TokenKind::Class) {
                    " __default "
                } else {
                    " __default"
                };
                let (head, head_verbatim) = self.slice_parts(decl_at, name_slot);
                let (tail, tail_verbatim) = self.statement_parts(name_slot, end);
                let mut builder = PartsBuilder::new();
                builder.append(head).text(filler).append(tail.finish());
                (builder, head_verbatim || tail_verbatim, "__default".to_string())
            }
        };
        builder.text("\n");
        push_export_call(&mut builder, &[("default".to_string(), local)]);
        Ok(finish_value(builder, verbatim))
    }

    /// `export { ... }` and `export { ... } from "m"`.
    fn export_named(&mut self, start: usize) -> Result<Stmt, ParseError> {
        let end = self.find_end(start, Boundary::MODULE)?;
        self.pos = end.end;
        let mut c = start + 1;
        let specifiers = self.parse_specifiers(&mut c)?;
        let from = if self.is_word(c, "from") {
            Some(self.expect_from(&mut c)?)
        } else {
            None
        };

        let has_type = specifiers.iter().any(|s| s.is_type);
        let values: Vec<&Specifier> = specifiers.iter().filter(|s| !s.is_type).collect();
        if has_type && values.is_empty() {
            return Ok(Stmt::ElidedNone);
        }

        if !self.options.is_bundling {
            if !has_type {
                return Ok(self.value_stmt(start, end));
            }
            let list = values.iter().map(|s| s.source_form()).collect::<Vec<_>>().join(", ");
            let tail = from
                .map(|(specifier, _)| format!(" from {}", quote(&specifier)))
                .unwrap_or_default();
            return Ok(Stmt::text(format!("export {{ {list} }}{tail};")));
        }

        let mut builder = PartsBuilder::new();
        match from {
            None => {
                if values.is_empty() {
                    return Ok(Stmt::ElidedNone);
                }
                let getters: Vec<(String, String)> = values
                    .iter()
                    .map(|s| (s.renamed().key(), s.name.text.clone()))
                    .collect();
                push_export_call(&mut builder, &getters);
            }
            Some((specifier, span)) => {
                let record = self.add_record(specifier, span, ImportKind::ReExport);
                builder.require(record).text(";");
                if !values.is_empty() {
                    builder.text("\n__export(").self_id().text(", { ");
                    for (n, spec) in values.iter().enumerate() {
                        if n > 0 {
                            builder.text(", ");
                        }
                        builder
                            .text(&format!("{}: () => ", spec.renamed().key()))
                            .require(record)
                            .text(&spec.name.access());
                    }
                    builder.text(" });");
                }
            }
        }
        Ok(finish_value(builder, false))
    }

    /// `export * from "m"` and `export * as ns from "m"`.
    fn export_star(&mut self, start: usize) -> Result<Stmt, ParseError> {
        let end = self.find_end(start, Boundary::MODULE)?;
        self.pos = end.end;
        let mut c = start + 2;
        let alias = if self.is_word(c, "as") {
            let alias = self.parse_name(c + 1)?;
            c += 2;
            Some(alias)
        } else {
            None
        };
        let (specifier, span) = self.expect_from(&mut c)?;

        if !self.options.is_bundling {
            return Ok(self.value_stmt(start, end));
        }
        let record = self.add_record(specifier, span, ImportKind::ReExport);
        let mut builder = PartsBuilder::new();
        match alias {
            None => {
                builder
                    .text("__exportStar(")
                    .self_id()
                    .text(", ")
                    .require(record)
                    .text(");");
            }
            Some(namespace) => {
                builder
                    .require(record)
                    .text(";\n__export(")
                    .self_id()
                    .text(&format!(", {{ {}: () => ", namespace.key()))
                    .require(record)
                    .text(" });");
            }
        }
        Ok(finish_value(builder, false))
    }

    // =========================================================================
    // Declared Names
    // =========================================================================

    /// Index of the `function`/`class` keyword at or after `decl_at`
    /// (skipping `async` and decorators).
    fn declaration_keyword(&self, decl_at: usize) -> usize {
        let mut i = decl_at;
        while !matches!(
            self.kind(i),
            TokenKind::Function | TokenKind::Class | TokenKind::Eof
        ) {
            i += 1;
        }
        i
    }

    /// Name of a function or class declaration, if it has one.
    fn declaration_name(&self, decl_at: usize) -> Option<String> {
        let mut i = self.declaration_keyword(decl_at) + 1;
        if matches!(self.kind(i), TokenKind::Star) {
            i += 1;
        }
        match self.kind(i) {
            TokenKind::Identifier(name) if name != "implements" => Some(name.clone()),
            _ => None,
        }
    }

    /// Names bound by the declarators of a `var`/`let`/`const` statement,
    /// starting after the keyword.
    pub(crate) fn declarator_names(&self, mut c: usize, end: usize) -> Result<Vec<String>, ParseError> {
        let mut names = Vec::new();
        loop {
            c = self.binding_pattern(c, &mut names)?;
            if matches!(self.kind(c), TokenKind::Bang) {
                c += 1;
            }
            if matches!(self.kind(c), TokenKind::Colon) {
                c = self.skip_to(c + 1, |k| matches!(k, TokenKind::Eq | TokenKind::Comma), true);
            }
            if matches!(self.kind(c), TokenKind::Eq) {
                c = self.skip_to(c + 1, |k| matches!(k, TokenKind::Comma), false);
            }
            if c < end && matches!(self.kind(c), TokenKind::Comma) {
                c += 1;
                continue;
            }
            return Ok(names);
        }
    }

    fn binding_pattern(&self, mut c: usize, names: &mut Vec<String>) -> Result<usize, ParseError> {
        match self.kind(c) {
            TokenKind::Identifier(name) => {
                names.push(name.clone());
                Ok(c + 1)
            }
            TokenKind::LBrace => {
                c += 1;
                loop {
                    match self.kind(c) {
                        TokenKind::RBrace => return Ok(c + 1),
                        TokenKind::Spread => c = self.binding_pattern(c + 1, names)?,
                        kind => {
                            let shorthand = match kind {
                                TokenKind::Identifier(name) => Some(name.clone()),
                                _ => None,
                            };
                            c = match kind {
                                TokenKind::LBracket => self.skip_balanced(c),
                                TokenKind::String(_) | TokenKind::Number(_) => c + 1,
                                other if other.word().is_some() => c + 1,
                                _ => return Err(self.unexpected(c)),
                            };
                            if matches!(self.kind(c), TokenKind::Colon) {
                                c = self.binding_pattern(c + 1, names)?;
                            } else if let Some(name) = shorthand {
                                names.push(name);
                            } else {
                                return Err(self.unexpected(c));
                            }
                            if matches!(self.kind(c), TokenKind::Eq) {
                                c = self.skip_to(c + 1, |k| matches!(k, TokenKind::Comma), false);
                            }
                        }
                    }
                    match self.kind(c) {
                        TokenKind::Comma => c += 1,
                        TokenKind::RBrace => {}
                        _ => return Err(self.unexpected(c)),
                    }
                }
            }
            TokenKind::LBracket => {
                c += 1;
                loop {
                    match self.kind(c) {
                        TokenKind::RBracket => return Ok(c + 1),
                        TokenKind::Comma => {
                            c += 1;
                            continue;
                        }
                        TokenKind::Spread => c = self.binding_pattern(c + 1, names)?,
                        _ => {
                            c = self.binding_pattern(c, names)?;
                            if matches!(self.kind(c), TokenKind::Eq) {
                                c = self.skip_to(c + 1, |k| matches!(k, TokenKind::Comma), false);
                            }
                        }
                    }
                    match self.kind(c) {
                        TokenKind::Comma => c += 1,
                        TokenKind::RBracket => {}
                        _ => return Err(self.unexpected(c)),
                    }
                }
            }
            _ => Err(self.unexpected(c)),
        }
    }
}
