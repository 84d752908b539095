//! AWK Lexer
//!
//! Tokenizes AWK source text into a stream of spanned tokens. Whitespace
//! and comments are emitted as trivia so the concatenation of all token
//! spans reconstructs the input exactly; newlines get their own token
//! because the statement grammar treats them as candidate separators.
//!
//! Every word lexes to a single `Ident` token shape; keyword recognition
//! is positional and belongs to the parser. The one place the lexer peeks
//! at spellings is regex detection: a `/` after an operand-ending token is
//! division, and a keyword spelling never ends an operand.

use super::types::{is_keyword, Diagnostic, Span, Token, TokenType};

// ─── Context-Sensitive Regex Detection ───────────────────────

/// Determines whether a `/` at the current position starts a regex literal
/// (true) or is a division operator (false).
///
/// After a token that can end an operand (Number, String, RParen,
/// RBracket, Increment, Decrement, or an identifier that is not a keyword
/// spelling), `/` means division. After everything else, or at the start
/// of input, `/` starts a regex.
fn can_be_regex(last: Option<(TokenType, bool)>) -> bool {
    match last {
        None => true,
        Some((TokenType::Ident, is_kw)) => is_kw,
        Some((tt, _)) => !matches!(
            tt,
            TokenType::Number
                | TokenType::String
                | TokenType::RParen
                | TokenType::RBracket
                | TokenType::Increment
                | TokenType::Decrement
        ),
    }
}

// ─── Lexer Struct ────────────────────────────────────────────

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    /// Last significant token (type, is-keyword-spelling), for regex
    /// detection. Trivia never updates this.
    last_token: Option<(TokenType, bool)>,
    diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            last_token: None,
            diagnostics: Vec::new(),
        }
    }

    // ── Helpers ──────────────────────────────────────────────

    fn peek(&self, offset: usize) -> char {
        if self.pos + offset < self.chars.len() {
            self.chars[self.pos + offset]
        } else {
            '\0'
        }
    }

    fn advance(&mut self) -> char {
        if self.pos >= self.chars.len() {
            return '\0';
        }
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn make_token(&self, token_type: TokenType, value: String, start: usize, line: usize, column: usize) -> Token {
        Token {
            token_type,
            value,
            span: Span::new(start, self.pos),
            line,
            column,
        }
    }

    fn error(&mut self, message: impl Into<String>, start: usize, line: usize, column: usize) {
        self.diagnostics
            .push(Diagnostic::new(message, Span::new(start, self.pos), line, column));
    }

    // ── Trivia: Whitespace and Comments ──────────────────────

    fn read_whitespace(&mut self) -> Token {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        let mut value = String::new();
        while matches!(self.peek(0), ' ' | '\t' | '\r') {
            value.push(self.advance());
        }
        self.make_token(TokenType::Whitespace, value, start, line, column)
    }

    /// A comment runs to the end of the line. The newline itself is not
    /// part of the comment, so it still separates statements.
    fn read_comment(&mut self) -> Token {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        let mut value = String::new();
        while !self.at_end() && self.peek(0) != '\n' {
            value.push(self.advance());
        }
        self.make_token(TokenType::Comment, value, start, line, column)
    }

    // ── String Reading ───────────────────────────────────────

    /// Reads a string literal, decoding escape sequences. The escape
    /// grammar is `\` followed by one of `[\\abfnrtv]`, `x` plus 1-2 hex
    /// digits, or 1-3 octal digits; anything else is a lexical error and
    /// the character is kept verbatim as recovery. A raw newline or end of
    /// input before the closing quote is an unterminated-string error.
    fn read_string(&mut self) -> Token {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        self.advance(); // opening quote
        let mut value = String::new();
        let mut terminated = false;

        while !self.at_end() {
            match self.peek(0) {
                '"' => {
                    self.advance();
                    terminated = true;
                    break;
                }
                '\n' => break,
                '\\' => {
                    let esc_start = self.pos;
                    self.advance(); // backslash
                    if self.at_end() {
                        break;
                    }
                    let escaped = self.advance();
                    match escaped {
                        '\\' => value.push('\\'),
                        'a' => value.push('\x07'),
                        'b' => value.push('\x08'),
                        'f' => value.push('\x0C'),
                        'n' => value.push('\n'),
                        'r' => value.push('\r'),
                        't' => value.push('\t'),
                        'v' => value.push('\x0B'),
                        'x' => {
                            // Hex escape: \x plus 1-2 hex digits
                            let mut hex = String::new();
                            while hex.len() < 2 && self.peek(0).is_ascii_hexdigit() {
                                hex.push(self.advance());
                            }
                            if hex.is_empty() {
                                self.error(
                                    "invalid escape sequence: \\x expects hex digits",
                                    esc_start,
                                    line,
                                    column,
                                );
                                value.push('x');
                            } else if let Some(c) =
                                u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
                            {
                                value.push(c);
                            }
                        }
                        c @ '0'..='7' => {
                            // Octal escape: 1-3 octal digits
                            let mut octal = String::new();
                            octal.push(c);
                            while octal.len() < 3 && matches!(self.peek(0), '0'..='7') {
                                octal.push(self.advance());
                            }
                            if let Some(c) =
                                u32::from_str_radix(&octal, 8).ok().and_then(char::from_u32)
                            {
                                value.push(c);
                            }
                        }
                        other => {
                            self.error(
                                format!("invalid escape sequence: \\{}", other),
                                esc_start,
                                line,
                                column,
                            );
                            value.push(other);
                        }
                    }
                }
                _ => value.push(self.advance()),
            }
        }

        if !terminated {
            self.error("unterminated string literal", start, line, column);
        }
        self.make_token(TokenType::String, value, start, line, column)
    }

    // ── Regex Reading ────────────────────────────────────────

    /// Reads a regex literal up to the first unescaped `/`. The payload is
    /// opaque to this layer: `\X` pairs pass through verbatim and no
    /// regex-internal structure is interpreted.
    fn read_regex(&mut self) -> Token {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        self.advance(); // opening /
        let mut pattern = String::new();
        let mut terminated = false;

        while !self.at_end() {
            match self.peek(0) {
                '/' => {
                    self.advance();
                    terminated = true;
                    break;
                }
                '\n' => break,
                '\\' => {
                    pattern.push(self.advance());
                    if !self.at_end() && self.peek(0) != '\n' {
                        pattern.push(self.advance());
                    }
                }
                _ => pattern.push(self.advance()),
            }
        }

        if !terminated {
            self.error("unterminated regex literal", start, line, column);
        }
        self.make_token(TokenType::Regex, pattern, start, line, column)
    }

    // ── Number Reading ───────────────────────────────────────

    /// Number literals are a run of decimal digits; the grammar has no
    /// float, exponent, or hex forms.
    fn read_number(&mut self) -> Token {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        let mut num_str = String::new();
        while self.peek(0).is_ascii_digit() {
            num_str.push(self.advance());
        }
        self.make_token(TokenType::Number, num_str, start, line, column)
    }

    // ── Identifier Reading ───────────────────────────────────

    fn read_identifier(&mut self) -> Token {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        let mut name = String::new();
        while self.peek(0).is_ascii_alphanumeric() || self.peek(0) == '_' {
            name.push(self.advance());
        }
        self.make_token(TokenType::Ident, name, start, line, column)
    }

    // ── Operator Reading ─────────────────────────────────────

    /// Longest-match over the operator and punctuation set. Returns None
    /// for characters outside the grammar, after recording a diagnostic.
    fn read_operator(&mut self) -> Option<Token> {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        let ch = self.advance();
        let next = self.peek(0);

        let (token_type, text): (TokenType, &str) = match ch {
            '+' => {
                if next == '+' {
                    self.advance();
                    (TokenType::Increment, "++")
                } else if next == '=' {
                    self.advance();
                    (TokenType::PlusAssign, "+=")
                } else {
                    (TokenType::Plus, "+")
                }
            }
            '-' => {
                if next == '-' {
                    self.advance();
                    (TokenType::Decrement, "--")
                } else if next == '=' {
                    self.advance();
                    (TokenType::MinusAssign, "-=")
                } else {
                    (TokenType::Minus, "-")
                }
            }
            '*' => {
                if next == '*' {
                    self.advance();
                    // ** is an alias spelling for ^
                    (TokenType::Caret, "**")
                } else if next == '=' {
                    self.advance();
                    (TokenType::StarAssign, "*=")
                } else {
                    (TokenType::Star, "*")
                }
            }
            '/' => {
                if next == '=' {
                    self.advance();
                    (TokenType::SlashAssign, "/=")
                } else {
                    (TokenType::Slash, "/")
                }
            }
            '%' => {
                if next == '=' {
                    self.advance();
                    (TokenType::PercentAssign, "%=")
                } else {
                    (TokenType::Percent, "%")
                }
            }
            '^' => {
                if next == '=' {
                    self.advance();
                    (TokenType::CaretAssign, "^=")
                } else {
                    (TokenType::Caret, "^")
                }
            }
            '=' => {
                if next == '=' {
                    self.advance();
                    (TokenType::Eq, "==")
                } else {
                    (TokenType::Assign, "=")
                }
            }
            '!' => {
                if next == '=' {
                    self.advance();
                    (TokenType::Ne, "!=")
                } else if next == '~' {
                    self.advance();
                    (TokenType::NotMatch, "!~")
                } else {
                    (TokenType::Not, "!")
                }
            }
            '<' => {
                if next == '=' {
                    self.advance();
                    (TokenType::Le, "<=")
                } else {
                    (TokenType::Lt, "<")
                }
            }
            '>' => {
                if next == '=' {
                    self.advance();
                    (TokenType::Ge, ">=")
                } else if next == '>' {
                    self.advance();
                    (TokenType::Append, ">>")
                } else {
                    (TokenType::Gt, ">")
                }
            }
            '&' => {
                if next == '&' {
                    self.advance();
                    (TokenType::And, "&&")
                } else {
                    self.error("invalid character '&'", start, line, column);
                    return None;
                }
            }
            '|' => {
                if next == '|' {
                    self.advance();
                    (TokenType::Or, "||")
                } else if next == '&' {
                    self.advance();
                    (TokenType::PipeAmp, "|&")
                } else {
                    (TokenType::Pipe, "|")
                }
            }
            '~' => (TokenType::Match, "~"),
            '?' => (TokenType::Question, "?"),
            ':' => (TokenType::Colon, ":"),
            ',' => (TokenType::Comma, ","),
            ';' => (TokenType::Semicolon, ";"),
            '(' => (TokenType::LParen, "("),
            ')' => (TokenType::RParen, ")"),
            '{' => (TokenType::LBrace, "{"),
            '}' => (TokenType::RBrace, "}"),
            '[' => (TokenType::LBracket, "["),
            ']' => (TokenType::RBracket, "]"),
            '$' => (TokenType::Dollar, "$"),
            _ => {
                self.error(format!("invalid character '{}'", ch), start, line, column);
                return None;
            }
        };

        Some(self.make_token(token_type, text.into(), start, line, column))
    }

    // ── Main Token Dispatch ──────────────────────────────────

    fn next_token(&mut self) -> Option<Token> {
        while !self.at_end() {
            let ch = self.peek(0);

            if matches!(ch, ' ' | '\t' | '\r') {
                return Some(self.read_whitespace());
            }
            if ch == '#' {
                return Some(self.read_comment());
            }
            if ch == '\n' {
                let start = self.pos;
                let (line, column) = (self.line, self.column);
                self.advance();
                return Some(self.make_token(TokenType::Newline, "\n".into(), start, line, column));
            }
            if ch == '"' {
                return Some(self.read_string());
            }
            if ch == '/' && can_be_regex(self.last_token) {
                return Some(self.read_regex());
            }
            if ch.is_ascii_digit() {
                return Some(self.read_number());
            }
            if ch.is_ascii_alphabetic() || ch == '_' {
                return Some(self.read_identifier());
            }
            if let Some(token) = self.read_operator() {
                return Some(token);
            }
            // Invalid character was recorded; keep scanning.
        }
        None
    }
}

// ─── Public API ──────────────────────────────────────────────

/// Tokenize AWK source text.
///
/// Returns the complete token stream (trivia included, ending with an Eof
/// token) together with any lexical diagnostics. The spans of the returned
/// tokens tile the input exactly.
pub fn tokenize(input: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();

    while let Some(token) = lexer.next_token() {
        if !token.token_type.is_trivia() {
            let is_kw = token.token_type == TokenType::Ident && is_keyword(&token.value);
            lexer.last_token = Some((token.token_type, is_kw));
        }
        tokens.push(token);
    }

    tokens.push(Token {
        token_type: TokenType::Eof,
        value: String::new(),
        span: Span::new(lexer.pos, lexer.pos),
        line: lexer.line,
        column: lexer.column,
    });

    (tokens, lexer.diagnostics)
}

// ─── Tests ───────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: collect the significant token types (excluding trivia and Eof).
    fn types(input: &str) -> Vec<TokenType> {
        let (tokens, diagnostics) = tokenize(input);
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
        tokens
            .into_iter()
            .map(|t| t.token_type)
            .filter(|t| !t.is_trivia() && *t != TokenType::Eof)
            .collect()
    }

    /// Helper: collect significant (type, value) pairs.
    fn type_vals(input: &str) -> Vec<(TokenType, String)> {
        let (tokens, _) = tokenize(input);
        tokens
            .into_iter()
            .filter(|t| !t.token_type.is_trivia() && t.token_type != TokenType::Eof)
            .map(|t| (t.token_type, t.value))
            .collect()
    }

    #[test]
    fn test_field_and_braces() {
        // { $1 }
        let toks = types("{ $1 }");
        assert_eq!(
            toks,
            vec![
                TokenType::LBrace,
                TokenType::Dollar,
                TokenType::Number,
                TokenType::RBrace,
            ]
        );
    }

    #[test]
    fn test_keywords_share_ident_shape() {
        // Keyword-hood is the parser's job; the lexer emits plain Ident.
        for word in ["if", "while", "BEGIN", "function", "delete", "print"] {
            let toks = type_vals(word);
            assert_eq!(toks, vec![(TokenType::Ident, word.to_string())]);
        }
    }

    #[test]
    fn test_regex_vs_division() {
        // After an identifier, / is division
        let toks = types("a / b");
        assert_eq!(toks, vec![TokenType::Ident, TokenType::Slash, TokenType::Ident]);

        // At start of input, / is a regex
        let toks = types("/pattern/");
        assert_eq!(toks, vec![TokenType::Regex]);

        // After a closing paren, / is division
        let toks = types("(a) / 2");
        assert!(toks.contains(&TokenType::Slash));

        // After ~, / is a regex
        let (tokens, _) = tokenize("$0 ~ /foo/");
        assert!(tokens.iter().any(|t| t.token_type == TokenType::Regex));
    }

    #[test]
    fn test_regex_after_keyword_word() {
        // `case` is a keyword spelling, so an operand cannot end there and
        // the / opens a regex.
        let toks = type_vals("case /re/");
        assert_eq!(toks[1], (TokenType::Regex, "re".to_string()));
    }

    #[test]
    fn test_regex_escaped_slash() {
        let toks = type_vals(r"/a\/b/");
        assert_eq!(toks, vec![(TokenType::Regex, r"a\/b".to_string())]);
    }

    #[test]
    fn test_string_escapes() {
        let toks = type_vals(r#""hi\tthere\n""#);
        assert_eq!(toks, vec![(TokenType::String, "hi\tthere\n".to_string())]);
    }

    #[test]
    fn test_hex_octal_escapes_agree() {
        // \x41 and \101 both decode to 'A'
        let toks = type_vals(r#""\x41\101""#);
        assert_eq!(toks, vec![(TokenType::String, "AA".to_string())]);
    }

    #[test]
    fn test_invalid_escape_reported() {
        let (tokens, diagnostics) = tokenize(r#""a\qb""#);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("invalid escape"));
        // Recovery keeps the character verbatim
        assert_eq!(tokens[0].value, "aqb");
    }

    #[test]
    fn test_unterminated_string() {
        let (_, diagnostics) = tokenize("\"abc\ndef");
        assert!(diagnostics
            .iter()
            .any(|d| d.message.contains("unterminated string")));
    }

    #[test]
    fn test_unterminated_regex() {
        let (_, diagnostics) = tokenize("/abc\n");
        assert!(diagnostics
            .iter()
            .any(|d| d.message.contains("unterminated regex")));
    }

    #[test]
    fn test_invalid_character() {
        let (tokens, diagnostics) = tokenize("a @ b");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("invalid character"));
        // The offending character is skipped, both identifiers survive
        let idents: Vec<_> = tokens
            .iter()
            .filter(|t| t.token_type == TokenType::Ident)
            .collect();
        assert_eq!(idents.len(), 2);
    }

    #[test]
    fn test_longest_match_operators() {
        let toks = type_vals("** <= |& >> != !~ ++ ^=");
        let expected = vec![
            (TokenType::Caret, "**"),
            (TokenType::Le, "<="),
            (TokenType::PipeAmp, "|&"),
            (TokenType::Append, ">>"),
            (TokenType::Ne, "!="),
            (TokenType::NotMatch, "!~"),
            (TokenType::Increment, "++"),
            (TokenType::CaretAssign, "^="),
        ];
        for (got, (tt, text)) in toks.iter().zip(expected) {
            assert_eq!(got, &(tt, text.to_string()));
        }
    }

    #[test]
    fn test_comment_is_trivia_newline_is_not() {
        let (tokens, _) = tokenize("a # note\nb");
        let kinds: Vec<_> = tokens.iter().map(|t| t.token_type).collect();
        assert!(kinds.contains(&TokenType::Comment));
        // The newline under the comment still appears as a separator
        let significant: Vec<_> = kinds
            .into_iter()
            .filter(|t| !t.is_trivia() && *t != TokenType::Eof)
            .collect();
        assert_eq!(
            significant,
            vec![TokenType::Ident, TokenType::Newline, TokenType::Ident]
        );
    }

    #[test]
    fn test_spans_tile_the_source() {
        let input = "BEGIN { x = 1 }  # set up\n/re/ { print $0 \"\\t\" }\n";
        let (tokens, _) = tokenize(input);
        let chars: Vec<char> = input.chars().collect();
        let mut rebuilt = String::new();
        let mut cursor = 0;
        for token in &tokens {
            assert_eq!(token.span.start, cursor, "gap before {:?}", token);
            rebuilt.extend(&chars[token.span.start..token.span.end]);
            cursor = token.span.end;
        }
        assert_eq!(rebuilt, input);
        assert_eq!(cursor, chars.len());
    }

    #[test]
    fn test_number_is_integer_shaped() {
        // The grammar has no float literals: `1.5` is a number, an invalid
        // character, and another number.
        let (tokens, diagnostics) = tokenize("1.5");
        assert_eq!(diagnostics.len(), 1);
        let nums: Vec<_> = tokens
            .iter()
            .filter(|t| t.token_type == TokenType::Number)
            .map(|t| t.value.clone())
            .collect();
        assert_eq!(nums, vec!["1", "5"]);
    }

    #[test]
    fn test_line_and_column_tracking() {
        let (tokens, _) = tokenize("a\n  b");
        let b = tokens
            .iter()
            .find(|t| t.token_type == TokenType::Ident && t.value == "b")
            .unwrap();
        assert_eq!(b.line, 2);
        assert_eq!(b.column, 3);
    }
}
