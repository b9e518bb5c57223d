//! Lexer (tokenizer) for JavaScript/TypeScript.
//!
//! The lexer is pulled one token at a time. The only context it needs is
//! whether the previous token allows a regular expression, which it tracks
//! itself. Template literals come back as a single token with every
//! `${...}` substitution lexed recursively, so the statement splitter never
//! has to look inside them.

use crate::span::Span;
use crate::token::{keyword_from_str, Token, TokenKind};

/// The lexer state.
pub struct Lexer<'a> {
    /// Source code as text (for slicing).
    text: &'a str,
    /// Source code as bytes (for fast indexing).
    source: &'a [u8],
    /// Current byte position.
    pos: usize,
    /// Whether the previous token allows a regex to follow.
    /// This disambiguates `/regex/` vs `a / b`.
    allow_regex: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Self {
            text: source,
            source: source.as_bytes(),
            pos: 0,
            allow_regex: true,
        };
        if source.starts_with("#!") {
            lexer.skip_line_comment();
        }
        lexer
    }

    /// Get the current byte position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token {
        let had_newline_before = match self.skip_whitespace_and_comments() {
            Ok(newline) => newline,
            Err(message) => {
                let end = self.source.len();
                return Token::new(
                    TokenKind::Invalid(message),
                    Span::new(self.pos as u32, end as u32),
                    false,
                );
            }
        };
        let start = self.pos;

        if self.is_eof() {
            return Token::new(TokenKind::Eof, Span::empty(start as u32), had_newline_before);
        }

        let ch = self.current();
        let kind = match ch {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' | 0x80..=0xff => self.scan_identifier(start),
            b'0'..=b'9' => self.scan_number(start),
            b'"' | b'\'' => self.scan_string(ch),
            b'`' => self.scan_template(),

            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b'[' => self.single(TokenKind::LBracket),
            b']' => self.single(TokenKind::RBracket),
            b';' => self.single(TokenKind::Semicolon),
            b',' => self.single(TokenKind::Comma),
            b':' => self.single(TokenKind::Colon),
            b'@' => self.single(TokenKind::At),
            b'#' => self.single(TokenKind::Hash),
            b'~' => self.single(TokenKind::Tilde),

            b'.' => self.scan_dot(start),
            b'?' => self.scan_question(),
            b'+' => self.scan_plus(),
            b'-' => self.scan_minus(),
            b'*' => self.scan_star(),
            b'/' => self.scan_slash(),
            b'%' => self.scan_with_eq(TokenKind::Percent, TokenKind::PercentEq),
            b'^' => self.scan_with_eq(TokenKind::Caret, TokenKind::CaretEq),
            b'=' => self.scan_equals(),
            b'!' => self.scan_bang(),
            b'<' => self.scan_less_than(),
            b'>' => self.scan_greater_than(),
            b'&' => self.scan_doubled(b'&', TokenKind::Amp, TokenKind::AmpEq, TokenKind::AmpAmp, TokenKind::AmpAmpEq),
            b'|' => self.scan_doubled(b'|', TokenKind::Pipe, TokenKind::PipeEq, TokenKind::PipePipe, TokenKind::PipePipeEq),

            _ => {
                self.advance();
                TokenKind::Invalid("Unexpected character")
            }
        };

        self.allow_regex = kind.allows_regex_after();
        Token::new(kind, Span::new(start as u32, self.pos as u32), had_newline_before)
    }

    // === Helper methods ===

    fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn current(&self) -> u8 {
        self.source.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_char(&self) -> u8 {
        self.source.get(self.pos + 1).copied().unwrap_or(0)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        self.text.get(start..end).unwrap_or("")
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    // === Whitespace and comments ===

    /// Skip trivia, reporting whether a line terminator was crossed.
    fn skip_whitespace_and_comments(&mut self) -> Result<bool, &'static str> {
        let mut newline = false;
        loop {
            match self.current() {
                b'\n' => {
                    newline = true;
                    self.advance();
                }
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => self.advance(),
                // U+FEFF byte order mark and U+00A0 no-break space
                0xef if self.source.get(self.pos..self.pos + 3) == Some(&[0xef, 0xbb, 0xbf]) => {
                    self.advance_n(3);
                }
                0xc2 if self.peek_char() == 0xa0 => self.advance_n(2),
                // U+2028 / U+2029 line terminators
                0xe2 if matches!(
                    self.source.get(self.pos..self.pos + 3),
                    Some(&[0xe2, 0x80, 0xa8 | 0xa9])
                ) =>
                {
                    newline = true;
                    self.advance_n(3);
                }
                b'/' if self.peek_char() == b'/' => self.skip_line_comment(),
                b'/' if self.peek_char() == b'*' => {
                    if self.skip_block_comment()? {
                        newline = true;
                    }
                }
                _ => return Ok(newline),
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while !self.is_eof() && self.current() != b'\n' {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<bool, &'static str> {
        self.advance_n(2); // Skip /*
        let mut newline = false;
        while !self.is_eof() {
            match self.current() {
                b'*' if self.peek_char() == b'/' => {
                    self.advance_n(2);
                    return Ok(newline);
                }
                b'\n' => newline = true,
                _ => {}
            }
            self.advance();
        }
        Err("Unterminated comment")
    }

    // === Token scanning ===

    fn scan_identifier(&mut self, start: usize) -> TokenKind {
        while !self.is_eof() {
            match self.current() {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'$' | 0x80..=0xff => {
                    self.advance();
                }
                _ => break,
            }
        }

        let ident = self.slice(start, self.pos);
        keyword_from_str(ident).unwrap_or_else(|| TokenKind::Identifier(ident.to_string()))
    }

    fn scan_number(&mut self, start: usize) -> TokenKind {
        if self.current() == b'0' {
            let radix = match self.peek_char() {
                b'x' | b'X' => Some(16),
                b'b' | b'B' => Some(2),
                b'o' | b'O' => Some(8),
                _ => None,
            };
            if let Some(radix) = radix {
                return self.scan_radix_number(start, radix);
            }
        }

        self.skip_digits();
        if self.current() == b'.' {
            self.advance();
            self.skip_digits();
        }
        if matches!(self.current(), b'e' | b'E') {
            self.advance();
            if matches!(self.current(), b'+' | b'-') {
                self.advance();
            }
            self.skip_digits();
        }

        if self.current() == b'n' {
            self.advance();
            return TokenKind::BigInt;
        }

        let digits: String = self.slice(start, self.pos).chars().filter(|&c| c != '_').collect();
        TokenKind::Number(digits.parse().unwrap_or(f64::NAN))
    }

    fn skip_digits(&mut self) {
        while self.current().is_ascii_digit() || self.current() == b'_' {
            self.advance();
        }
    }

    fn scan_radix_number(&mut self, start: usize, radix: u32) -> TokenKind {
        self.advance_n(2); // Skip 0x / 0b / 0o
        while (self.current() as char).is_digit(radix) || self.current() == b'_' {
            self.advance();
        }

        if self.current() == b'n' {
            self.advance();
            return TokenKind::BigInt;
        }

        let digits: String = self.slice(start + 2, self.pos).chars().filter(|&c| c != '_').collect();
        #[allow(clippy::cast_precision_loss)]
        let value = u64::from_str_radix(&digits, radix).map_or(f64::NAN, |v| v as f64);
        TokenKind::Number(value)
    }

    fn scan_string(&mut self, quote: u8) -> TokenKind {
        self.advance(); // Skip opening quote

        let mut value = Vec::new();
        loop {
            match self.current() {
                _ if self.is_eof() => return TokenKind::Invalid("Unterminated string literal"),
                b'\n' => return TokenKind::Invalid("Unterminated string literal"),
                b'\\' => {
                    self.advance();
                    self.scan_escape_sequence(&mut value);
                }
                ch if ch == quote => {
                    self.advance();
                    break;
                }
                ch => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        TokenKind::String(String::from_utf8_lossy(&value).into_owned())
    }

    fn scan_escape_sequence(&mut self, out: &mut Vec<u8>) {
        let ch = self.current();
        if self.is_eof() {
            return;
        }
        self.advance();

        let decoded = match ch {
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'v' => '\u{b}',
            b'0' if !self.current().is_ascii_digit() => '\0',
            b'x' => self.scan_hex_escape(2),
            b'u' if self.current() == b'{' => self.scan_unicode_escape_braces(),
            b'u' => self.scan_hex_escape(4),
            // Line continuation
            b'\r' => {
                if self.current() == b'\n' {
                    self.advance();
                }
                return;
            }
            b'\n' => return,
            _ => {
                out.push(ch);
                return;
            }
        };
        let mut buf = [0u8; 4];
        out.extend_from_slice(decoded.encode_utf8(&mut buf).as_bytes());
    }

    fn scan_hex_escape(&mut self, len: usize) -> char {
        let mut value = 0u32;
        for _ in 0..len {
            match (self.current() as char).to_digit(16) {
                Some(digit) => {
                    value = value * 16 + digit;
                    self.advance();
                }
                None => break,
            }
        }
        char::from_u32(value).unwrap_or('\u{FFFD}')
    }

    fn scan_unicode_escape_braces(&mut self) -> char {
        self.advance(); // Skip {
        let mut value = 0u32;
        while let Some(digit) = (self.current() as char).to_digit(16) {
            value = value.saturating_mul(16).saturating_add(digit);
            self.advance();
        }
        if self.current() == b'}' {
            self.advance();
        }
        char::from_u32(value).unwrap_or('\u{FFFD}')
    }

    /// Scan a whole template literal, including nested substitutions.
    fn scan_template(&mut self) -> TokenKind {
        self.advance(); // Skip `
        loop {
            match self.current() {
                _ if self.is_eof() => return TokenKind::Invalid("Unterminated template literal"),
                b'`' => {
                    self.advance();
                    return TokenKind::Template;
                }
                b'\\' => self.advance_n(2),
                b'$' if self.peek_char() == b'{' => {
                    self.advance_n(2);
                    if let Err(message) = self.skip_substitution() {
                        return TokenKind::Invalid(message);
                    }
                }
                _ => self.advance(),
            }
        }
    }

    /// Lex tokens inside `${ ... }` until the matching `}`.
    fn skip_substitution(&mut self) -> Result<(), &'static str> {
        self.allow_regex = true;
        let mut depth = 0usize;
        loop {
            let token = self.next_token();
            match token.kind {
                TokenKind::Eof => return Err("Unterminated template literal"),
                TokenKind::Invalid(message) => return Err(message),
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace if depth == 0 => return Ok(()),
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
        }
    }

    fn scan_regex(&mut self) -> TokenKind {
        let mut in_class = false;
        loop {
            match self.current() {
                _ if self.is_eof() => return TokenKind::Invalid("Unterminated regular expression"),
                b'\n' | b'\r' => return TokenKind::Invalid("Unterminated regular expression"),
                b'/' if !in_class => break,
                b'[' => {
                    in_class = true;
                    self.advance();
                }
                b']' => {
                    in_class = false;
                    self.advance();
                }
                b'\\' => self.advance_n(2),
                _ => self.advance(),
            }
        }
        self.advance(); // Skip closing /

        while self.current().is_ascii_alphabetic() {
            self.advance();
        }
        TokenKind::Regex
    }

    // === Multi-character operators ===

    fn scan_dot(&mut self, start: usize) -> TokenKind {
        if self.peek_char().is_ascii_digit() {
            return self.scan_number(start);
        }
        self.advance();
        if self.current() == b'.' && self.peek_char() == b'.' {
            self.advance_n(2);
            TokenKind::Spread
        } else {
            TokenKind::Dot
        }
    }

    fn scan_question(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'?' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::QuestionQuestionEq
                } else {
                    TokenKind::QuestionQuestion
                }
            }
            b'.' if !self.peek_char().is_ascii_digit() => {
                self.advance();
                TokenKind::QuestionDot
            }
            _ => TokenKind::Question,
        }
    }

    fn scan_plus(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'+' => self.single(TokenKind::PlusPlus),
            b'=' => self.single(TokenKind::PlusEq),
            _ => TokenKind::Plus,
        }
    }

    fn scan_minus(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'-' => self.single(TokenKind::MinusMinus),
            b'=' => self.single(TokenKind::MinusEq),
            _ => TokenKind::Minus,
        }
    }

    fn scan_star(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'*' => {
                self.advance();
                self.scan_with_eq_tail(TokenKind::StarStar, TokenKind::StarStarEq)
            }
            b'=' => self.single(TokenKind::StarEq),
            _ => TokenKind::Star,
        }
    }

    fn scan_slash(&mut self) -> TokenKind {
        self.advance();
        if self.allow_regex {
            return self.scan_regex();
        }
        self.scan_with_eq_tail(TokenKind::Slash, TokenKind::SlashEq)
    }

    /// `op` or `op=` for a single-byte operator.
    fn scan_with_eq(&mut self, plain: TokenKind, with_eq: TokenKind) -> TokenKind {
        self.advance();
        self.scan_with_eq_tail(plain, with_eq)
    }

    fn scan_with_eq_tail(&mut self, plain: TokenKind, with_eq: TokenKind) -> TokenKind {
        if self.current() == b'=' {
            self.advance();
            with_eq
        } else {
            plain
        }
    }

    /// `&`, `&=`, `&&`, `&&=` and the `|` family.
    fn scan_doubled(
        &mut self,
        ch: u8,
        single: TokenKind,
        single_eq: TokenKind,
        double: TokenKind,
        double_eq: TokenKind,
    ) -> TokenKind {
        self.advance();
        if self.current() == ch {
            self.advance();
            self.scan_with_eq_tail(double, double_eq)
        } else {
            self.scan_with_eq_tail(single, single_eq)
        }
    }

    fn scan_equals(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'=' => {
                self.advance();
                self.scan_with_eq_tail(TokenKind::EqEq, TokenKind::EqEqEq)
            }
            b'>' => self.single(TokenKind::Arrow),
            _ => TokenKind::Eq,
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        self.advance();
        if self.current() == b'=' {
            self.advance();
            self.scan_with_eq_tail(TokenKind::BangEq, TokenKind::BangEqEq)
        } else {
            TokenKind::Bang
        }
    }

    fn scan_less_than(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'<' => {
                self.advance();
                self.scan_with_eq_tail(TokenKind::LtLt, TokenKind::LtLtEq)
            }
            b'=' => self.single(TokenKind::LtEq),
            _ => TokenKind::Lt,
        }
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'>' => {
                self.advance();
                match self.current() {
                    b'>' => {
                        self.advance();
                        self.scan_with_eq_tail(TokenKind::GtGtGt, TokenKind::GtGtGtEq)
                    }
                    b'=' => self.single(TokenKind::GtGtEq),
                    _ => TokenKind::GtGt,
                }
            }
            b'=' => self.single(TokenKind::GtEq),
            _ => TokenKind::Gt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            if matches!(token.kind, TokenKind::Eof) {
                break;
            }
            tokens.push(token.kind);
        }
        tokens
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            tokenize("foo bar _baz $qux declare"),
            vec![
                TokenKind::Identifier("foo".into()),
                TokenKind::Identifier("bar".into()),
                TokenKind::Identifier("_baz".into()),
                TokenKind::Identifier("$qux".into()),
                TokenKind::Identifier("declare".into()),
            ]
        );
    }

    #[test]
    fn test_unicode_identifier() {
        assert_eq!(tokenize("café"), vec![TokenKind::Identifier("café".into())]);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            tokenize("const let var function"),
            vec![TokenKind::Const, TokenKind::Let, TokenKind::Var, TokenKind::Function]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokenize("42 3.5 0xff 0b101 0o77 1_000 .5 10n"),
            vec![
                TokenKind::Number(42.0),
                TokenKind::Number(3.5),
                TokenKind::Number(255.0),
                TokenKind::Number(5.0),
                TokenKind::Number(63.0),
                TokenKind::Number(1000.0),
                TokenKind::Number(0.5),
                TokenKind::BigInt,
            ]
        );
    }

    #[test]
    fn test_strings_decode_escapes() {
        assert_eq!(
            tokenize(r#""hello\n" 'w\x6frld' "\u{1F600}""#),
            vec![
                TokenKind::String("hello\n".into()),
                TokenKind::String("world".into()),
                TokenKind::String("\u{1F600}".into()),
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            tokenize("'abc\nx"),
            vec![
                TokenKind::Invalid("Unterminated string literal"),
                TokenKind::Identifier("x".into()),
            ]
        );
    }

    #[test]
    fn test_template_with_substitutions_is_one_token() {
        assert_eq!(
            tokenize("`a ${ {b: `c${d}`}.b } e` f"),
            vec![TokenKind::Template, TokenKind::Identifier("f".into())]
        );
    }

    #[test]
    fn test_unterminated_template() {
        assert_eq!(
            tokenize("`abc ${x"),
            vec![TokenKind::Invalid("Unterminated template literal")]
        );
    }

    #[test]
    fn test_regex_vs_division() {
        assert_eq!(
            tokenize("a / b"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Slash,
                TokenKind::Identifier("b".into()),
            ]
        );
        assert_eq!(
            tokenize("x = /[/]+/g"),
            vec![TokenKind::Identifier("x".into()), TokenKind::Eq, TokenKind::Regex]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokenize("a + b ** c ?? d &&= e >>>= f"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Plus,
                TokenKind::Identifier("b".into()),
                TokenKind::StarStar,
                TokenKind::Identifier("c".into()),
                TokenKind::QuestionQuestion,
                TokenKind::Identifier("d".into()),
                TokenKind::AmpAmpEq,
                TokenKind::Identifier("e".into()),
                TokenKind::GtGtGtEq,
                TokenKind::Identifier("f".into()),
            ]
        );
    }

    #[test]
    fn test_comments_and_newlines() {
        let mut lexer = Lexer::new("a // line comment\nb /* block\n */ c d");
        assert!(!lexer.next_token().had_newline_before);
        assert!(lexer.next_token().had_newline_before);
        assert!(lexer.next_token().had_newline_before);
        assert!(!lexer.next_token().had_newline_before);
    }

    #[test]
    fn test_unterminated_comment() {
        assert_eq!(tokenize("a /* never"), vec![
            TokenKind::Identifier("a".into()),
            TokenKind::Invalid("Unterminated comment"),
        ]);
    }

    #[test]
    fn test_hashbang_is_skipped() {
        assert_eq!(tokenize("#!/usr/bin/env node\nx"), vec![TokenKind::Identifier("x".into())]);
    }
}
