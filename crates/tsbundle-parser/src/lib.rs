//! tsbundle-parser: statement-level JavaScript/TypeScript parser
//!
//! The bundler never needs a full syntax tree. It needs to know where each
//! top-level statement starts and ends, which module specifiers a file
//! references, and which TypeScript statements have no runtime meaning.
//!
//! # Design Principles
//!
//! 1. **Tokenize once, classify statements**
//!    - The whole file is lexed upfront (regex vs division is decided by the
//!      previous token)
//!    - Statement boundaries come from bracket depth plus automatic semicolon
//!      insertion
//!
//! 2. **Three statement shapes**
//!    - `Value`: code that survives, kept as source text
//!    - `ElidedEmpty`: renders as a single `;`
//!    - `ElidedNone`: renders as nothing
//!
//! 3. **Loader parts instead of rewritten text**
//!    - `import`/`require` become [`Part::Require`] referencing an import
//!      record; the linker substitutes module ids later
//!
//! # Example
//!
//! ```
//! use tsbundle_parser::{Parser, ParserOptions, Stmt};
//!
//! let options = ParserOptions { is_bundling: true, typescript: true };
//! let module = Parser::new("declare let x: number;\nlet foo;", options).parse()?;
//! assert_eq!(module.stmts.len(), 2);
//! assert!(matches!(module.stmts[0], Stmt::ElidedNone));
//! # Ok::<(), tsbundle_parser::ParseError>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]

mod lexer;
mod modules;
mod parser;
mod span;
mod stmt;
mod token;
mod typescript;

// Re-exports
pub use lexer::Lexer;
pub use parser::{ParseError, Parser, ParserOptions};
pub use span::{LineIndex, Loc, Span};
pub use stmt::{Code, ImportKind, ImportRecord, ParsedModule, Part, Stmt, ValueStmt};
pub use token::{Token, TokenKind};

/// Parse one file into classified statements and import records.
pub fn parse(source: &str, options: ParserOptions) -> Result<ParsedModule, ParseError> {
    Parser::new(source, options).parse()
}
