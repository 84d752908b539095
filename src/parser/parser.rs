//! AWK Parser
//!
//! Recursive descent parser that builds a spanned syntax tree from tokens.
//! Expressions are parsed by precedence climbing over the grammar's total
//! operator order; statements and the top-level rule/function grammar are
//! classic recursive descent.
//!
//! Errors are collected, not thrown: a failed construct produces a
//! diagnostic and the parser skips to the next statement or rule boundary
//! and resumes, so a single malformed statement does not sink the parse.

use serde::Serialize;

use crate::ast::types::{
    Args, AssignOp, BinaryOp, Block, Expr, ExprKind, FuncDef, Ident, Item, ParamList, Pattern,
    PatternKind, Program, Redirect, RedirectType, Rule, Stmt, StmtKind, SwitchCase, UnaryOp,
    UpdateOp,
};
use super::lexer::tokenize;
use super::types::{Diagnostic, Span, Token, TokenType, MAX_PARSER_DEPTH};

// ─── Public API ──────────────────────────────────────────────

/// The outcome of a parse: a tree plus every diagnostic encountered. The
/// tree is always produced; the caller decides whether diagnostics make it
/// unusable.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse AWK source text into a syntax tree.
///
/// Never fails and never panics: lexical and syntax errors are collected
/// into `diagnostics` and an empty or fully malformed input still yields a
/// (possibly empty) `Program`.
pub fn parse(input: &str) -> ParseResult {
    let (tokens, lex_diagnostics) = tokenize(input);
    let significant: Vec<Token> = tokens
        .into_iter()
        .filter(|t| !t.token_type.is_trivia())
        .collect();

    let mut parser = Parser::new(significant);
    let program = parser.parse_program();

    let mut diagnostics = lex_diagnostics;
    diagnostics.extend(parser.diagnostics);
    ParseResult {
        program,
        diagnostics,
    }
}

/// An edit descriptor for re-parsing: `start..old_end` in the previous
/// source was replaced by `start..new_end` in the new source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edit {
    pub start: usize,
    pub old_end: usize,
    pub new_end: usize,
}

/// Re-parse edited source. The contract is purely functional: the returned
/// tree shares nothing with the old one. This implementation re-parses the
/// whole buffer; reusing unchanged subtrees would be an optimization, not
/// a behavior change.
pub fn reparse(old: &ParseResult, edits: &[Edit], new_source: &str) -> ParseResult {
    if edits.is_empty() {
        return old.clone();
    }
    parse(new_source)
}

// ─── Parser Struct ───────────────────────────────────────────

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// End offset of the most recently consumed token, for closing spans.
    last_end: usize,
    depth: usize,
    diagnostics: Vec<Diagnostic>,
}

/// Brace-shaped statements need no trailing separator before `}` or the
/// next statement; simple statements do.
fn stmt_needs_separator(kind: &StmtKind) -> bool {
    !matches!(
        kind,
        StmtKind::Block(_)
            | StmtKind::If { .. }
            | StmtKind::While { .. }
            | StmtKind::For { .. }
            | StmtKind::ForIn { .. }
            | StmtKind::Switch { .. }
    )
}

fn describe(token: &Token) -> String {
    match token.token_type {
        TokenType::Eof => "end of input".into(),
        TokenType::Newline => "newline".into(),
        _ => format!("'{}'", token.value),
    }
}

fn binary(operator: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.to(right.span);
    Expr {
        kind: ExprKind::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    }
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            last_end: 0,
            depth: 0,
            diagnostics: Vec::new(),
        }
    }

    // ─── Helper Methods ──────────────────────────────────────

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens.last().expect("token stream ends with Eof")
        })
    }

    fn peek(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or_else(|| {
            self.tokens.last().expect("token stream ends with Eof")
        })
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        self.last_end = token.span.end;
        token
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.current().token_type == token_type
    }

    fn eat(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_word(&self, word: &str) -> bool {
        let token = self.current();
        token.token_type == TokenType::Ident && token.value == word
    }

    fn peek_is_word(&self, offset: usize, word: &str) -> bool {
        let token = self.peek(offset);
        token.token_type == TokenType::Ident && token.value == word
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenType::Newline) {
            self.advance();
        }
    }

    /// Consumes any run of `;` and newline separators; consecutive
    /// separators are legal no-ops. Returns whether any were consumed.
    fn skip_terminators(&mut self) -> bool {
        let mut any = false;
        while self.check(TokenType::Newline) || self.check(TokenType::Semicolon) {
            self.advance();
            any = true;
        }
        any
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.last_end)
    }

    fn error_here(&self, message: impl Into<String>) -> Diagnostic {
        let token = self.current();
        Diagnostic::new(message, token.span, token.line, token.column)
    }

    fn expect(&mut self, token_type: TokenType, what: &'static str) -> Result<Token, Diagnostic> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(self
                .error_here(format!(
                    "expected {}, found {}",
                    what,
                    describe(self.current())
                ))
                .expecting(vec![what]))
        }
    }

    fn expect_word(&mut self, word: &'static str) -> Result<Token, Diagnostic> {
        if self.at_word(word) {
            Ok(self.advance())
        } else {
            Err(self
                .error_here(format!(
                    "expected '{}', found {}",
                    word,
                    describe(self.current())
                ))
                .expecting(vec![word]))
        }
    }

    fn parse_ident(&mut self) -> Result<Ident, Diagnostic> {
        let token = self.expect(TokenType::Ident, "identifier")?;
        Ok(Ident {
            name: token.value,
            span: token.span,
        })
    }

    fn enter(&mut self, what: &str) -> Result<(), Diagnostic> {
        if self.depth >= MAX_PARSER_DEPTH {
            return Err(self.error_here(format!("{} nesting too deep", what)));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ─── Error Recovery ──────────────────────────────────────

    /// Skip tokens to the next statement boundary (`;`, newline, or `}`)
    /// so one malformed construct does not sink the rest of the parse.
    /// Inside a block the closing `}` is left for the block to consume; at
    /// top level a stray `}` is swallowed.
    fn recover(&mut self, stop_before_rbrace: bool) {
        loop {
            match self.current().token_type {
                TokenType::Eof => break,
                TokenType::Semicolon | TokenType::Newline => {
                    self.advance();
                    break;
                }
                TokenType::RBrace => {
                    if !stop_before_rbrace {
                        self.advance();
                    }
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn recover_in_switch(&mut self) {
        while !self.at_word("case")
            && !self.at_word("default")
            && !self.check(TokenType::RBrace)
            && !self.check(TokenType::Eof)
        {
            self.advance();
        }
    }

    // ─── Program Parsing ─────────────────────────────────────

    fn parse_program(&mut self) -> Program {
        let end = self.tokens.last().map(|t| t.span.end).unwrap_or(0);
        let mut items = Vec::new();

        self.skip_terminators();
        while !self.check(TokenType::Eof) {
            let result = if self.at_word("function") {
                self.parse_func_def().map(Item::FuncDef)
            } else {
                self.parse_rule().map(Item::Rule)
            };
            match result {
                Ok(item) => items.push(item),
                Err(diagnostic) => {
                    self.diagnostics.push(diagnostic);
                    self.recover(false);
                }
            }
            self.skip_terminators();
        }

        Program {
            items,
            span: Span::new(0, end),
        }
    }

    fn parse_func_def(&mut self) -> Result<FuncDef, Diagnostic> {
        let start = self.current().span.start;
        self.expect_word("function")?;
        let name = self
            .parse_ident()
            .map_err(|d| d.in_production("function definition"))?;
        self.expect(TokenType::LParen, "'('")?;

        let params = if self.check(TokenType::RParen) {
            None
        } else {
            let first = self.parse_ident()?;
            let mut span = first.span;
            let mut names = vec![first];
            while self.eat(TokenType::Comma) {
                self.skip_newlines();
                let param = self.parse_ident()?;
                span = span.to(param.span);
                names.push(param);
            }
            Some(ParamList { names, span })
        };

        self.expect(TokenType::RParen, "')'")?;
        self.skip_newlines();
        let body = self.parse_block()?;

        Ok(FuncDef {
            name,
            params,
            body,
            span: self.span_from(start),
        })
    }

    fn parse_rule(&mut self) -> Result<Rule, Diagnostic> {
        let start = self.current().span.start;

        let pattern = if self.check(TokenType::LBrace) {
            None
        } else {
            Some(self.parse_pattern()?)
        };

        // The action must open on the same logical line; a newline after
        // the pattern ends the rule, leaving a pattern-only rule.
        let action = if self.check(TokenType::LBrace) {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Rule {
            pattern,
            action,
            span: self.span_from(start),
        })
    }

    fn parse_pattern(&mut self) -> Result<Pattern, Diagnostic> {
        // The four special pattern words are keywords only here, in
        // pattern position.
        if self.check(TokenType::Ident) {
            let kind = match self.current().value.as_str() {
                "BEGIN" => Some(PatternKind::Begin),
                "END" => Some(PatternKind::End),
                "BEGINFILE" => Some(PatternKind::BeginFile),
                "ENDFILE" => Some(PatternKind::EndFile),
                _ => None,
            };
            if let Some(kind) = kind {
                let token = self.advance();
                return Ok(Pattern {
                    kind,
                    span: token.span,
                });
            }
        }

        let first = self
            .parse_expression()
            .map_err(|d| d.in_production("rule pattern"))?;

        if self.eat(TokenType::Comma) {
            self.skip_newlines();
            let end = self
                .parse_expression()
                .map_err(|d| d.in_production("range pattern"))?;
            let span = first.span.to(end.span);
            return Ok(Pattern {
                kind: PatternKind::Range {
                    start: Box::new(first),
                    end: Box::new(end),
                },
                span,
            });
        }

        let span = first.span;
        match first.kind {
            ExprKind::Regex(pattern) => Ok(Pattern {
                kind: PatternKind::Regex(pattern),
                span,
            }),
            kind => Ok(Pattern {
                kind: PatternKind::Expr(Expr { kind, span }),
                span,
            }),
        }
    }

    fn parse_block(&mut self) -> Result<Block, Diagnostic> {
        let start = self.current().span.start;
        self.expect(TokenType::LBrace, "'{'")?;
        self.skip_terminators();

        let mut statements = Vec::new();
        while !self.check(TokenType::RBrace) && !self.check(TokenType::Eof) {
            match self.parse_statement() {
                Ok(stmt) => {
                    let needs_sep = stmt_needs_separator(&stmt.kind);
                    statements.push(stmt);
                    let had_sep = self.skip_terminators();
                    if needs_sep
                        && !had_sep
                        && !self.check(TokenType::RBrace)
                        && !self.check(TokenType::Eof)
                    {
                        let diagnostic = self
                            .error_here(format!(
                                "expected ';' or newline after statement, found {}",
                                describe(self.current())
                            ))
                            .expecting(vec![";", "newline"]);
                        self.diagnostics.push(diagnostic);
                        self.recover(true);
                    }
                }
                Err(diagnostic) => {
                    self.diagnostics.push(diagnostic);
                    self.recover(true);
                    self.skip_terminators();
                }
            }
        }

        if !self.eat(TokenType::RBrace) {
            let diagnostic = self.error_here("expected '}' to close block").expecting(vec!["}"]);
            self.diagnostics.push(diagnostic);
        }

        Ok(Block {
            statements,
            span: self.span_from(start),
        })
    }

    // ─── Statement Parsing ───────────────────────────────────

    fn parse_statement(&mut self) -> Result<Stmt, Diagnostic> {
        self.enter("statement")?;
        let result = self.parse_statement_inner();
        self.leave();
        result
    }

    fn parse_statement_inner(&mut self) -> Result<Stmt, Diagnostic> {
        if self.check(TokenType::LBrace) {
            let block = self.parse_block()?;
            return Ok(Stmt {
                span: block.span,
                kind: StmtKind::Block(block),
            });
        }

        // Statement keywords are resolved here, positionally; any other
        // word starts an expression statement.
        if self.check(TokenType::Ident) {
            match self.current().value.as_str() {
                "if" => return self.parse_if(),
                "while" => return self.parse_while(),
                "do" => return self.parse_do_while(),
                "for" => return self.parse_for(),
                "break" => {
                    let token = self.advance();
                    return Ok(Stmt {
                        kind: StmtKind::Break,
                        span: token.span,
                    });
                }
                "continue" => {
                    let token = self.advance();
                    return Ok(Stmt {
                        kind: StmtKind::Continue,
                        span: token.span,
                    });
                }
                "next" => {
                    let token = self.advance();
                    return Ok(Stmt {
                        kind: StmtKind::Next,
                        span: token.span,
                    });
                }
                "nextfile" => {
                    let token = self.advance();
                    return Ok(Stmt {
                        kind: StmtKind::NextFile,
                        span: token.span,
                    });
                }
                "return" => return self.parse_return(),
                "delete" => return self.parse_delete(),
                "exit" => return self.parse_exit(),
                "switch" => return self.parse_switch(),
                "print" => return self.parse_print(),
                "printf" => return self.parse_printf(),
                _ => {}
            }
        }

        let expr = self.parse_expression()?;
        Ok(Stmt {
            span: expr.span,
            kind: StmtKind::Expr(expr),
        })
    }

    /// `( expr )` as used by condition headers; newlines inside the
    /// parentheses are insignificant.
    fn parse_paren_condition(&mut self, what: &'static str) -> Result<Expr, Diagnostic> {
        self.expect(TokenType::LParen, "'('")?;
        self.skip_newlines();
        let condition = self
            .parse_expression()
            .map_err(|d| d.in_production(what))?;
        self.skip_newlines();
        self.expect(TokenType::RParen, "')'")?;
        Ok(condition)
    }

    fn parse_if(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.current().span.start;
        self.advance(); // if
        let condition = self.parse_paren_condition("if condition")?;
        self.skip_newlines();
        let consequence = Box::new(self.parse_statement()?);

        // A separator may sit between the branch and `else`. The else
        // binds to the nearest open if: the innermost if-parse gets here
        // first and claims it.
        self.skip_terminators();
        let alternative = if self.at_word("else") {
            self.advance();
            self.skip_newlines();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt {
            kind: StmtKind::If {
                condition,
                consequence,
                alternative,
            },
            span: self.span_from(start),
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.current().span.start;
        self.advance(); // while
        let condition = self.parse_paren_condition("while condition")?;
        self.skip_newlines();
        let body = self.parse_block()?;

        Ok(Stmt {
            kind: StmtKind::While { condition, body },
            span: self.span_from(start),
        })
    }

    fn parse_do_while(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.current().span.start;
        self.advance(); // do
        self.skip_newlines();
        let body = self.parse_block()?;
        self.skip_newlines();
        self.expect_word("while")?;
        let condition = self.parse_paren_condition("do-while condition")?;

        Ok(Stmt {
            kind: StmtKind::DoWhile { body, condition },
            span: self.span_from(start),
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.current().span.start;
        self.advance(); // for
        self.expect(TokenType::LParen, "'('")?;

        // for (name in array) body
        if self.check(TokenType::Ident) && self.peek_is_word(1, "in") {
            let name = self.parse_ident()?;
            self.advance(); // in
            let array = self.parse_ident()?;
            self.expect(TokenType::RParen, "')'")?;
            self.skip_newlines();
            let body = self.parse_block()?;
            return Ok(Stmt {
                kind: StmtKind::ForIn { name, array, body },
                span: self.span_from(start),
            });
        }

        // for (initializer; condition; advancement) body, every clause
        // independently optional.
        let initializer = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_simple_statement()?))
        };
        self.expect(TokenType::Semicolon, "';'")?;
        self.skip_newlines();

        let condition = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenType::Semicolon, "';'")?;
        self.skip_newlines();

        let advancement = if self.check(TokenType::RParen) {
            None
        } else {
            Some(Box::new(self.parse_simple_statement()?))
        };
        self.expect(TokenType::RParen, "')'")?;
        self.skip_newlines();

        let body = self.parse_block()?;
        Ok(Stmt {
            kind: StmtKind::For {
                initializer,
                condition,
                advancement,
                body,
            },
            span: self.span_from(start),
        })
    }

    /// A for-header clause: an expression statement.
    fn parse_simple_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let expr = self.parse_expression()?;
        Ok(Stmt {
            span: expr.span,
            kind: StmtKind::Expr(expr),
        })
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.current().token_type,
            TokenType::Newline | TokenType::Semicolon | TokenType::RBrace | TokenType::Eof
        )
    }

    fn parse_return(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.current().span.start;
        self.advance(); // return
        let argument = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        Ok(Stmt {
            kind: StmtKind::Return { argument },
            span: self.span_from(start),
        })
    }

    fn parse_exit(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.current().span.start;
        self.advance(); // exit
        let argument = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        Ok(Stmt {
            kind: StmtKind::Exit { argument },
            span: self.span_from(start),
        })
    }

    /// `delete name` removes a whole container, `delete name[expr, ...]`
    /// one element.
    fn parse_delete(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.current().span.start;
        self.advance(); // delete
        let name = self
            .parse_ident()
            .map_err(|d| d.in_production("delete statement"))?;

        let mut subscript = Vec::new();
        if self.eat(TokenType::LBracket) {
            self.skip_newlines();
            subscript.push(self.parse_expression()?);
            while self.eat(TokenType::Comma) {
                self.skip_newlines();
                subscript.push(self.parse_expression()?);
            }
            self.skip_newlines();
            self.expect(TokenType::RBracket, "']'")?;
        }

        Ok(Stmt {
            kind: StmtKind::Delete { name, subscript },
            span: self.span_from(start),
        })
    }

    fn parse_switch(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.current().span.start;
        self.advance(); // switch
        let condition = self.parse_paren_condition("switch condition")?;
        self.skip_newlines();
        self.expect(TokenType::LBrace, "'{'")?;
        self.skip_terminators();

        let mut cases = Vec::new();
        while !self.check(TokenType::RBrace) && !self.check(TokenType::Eof) {
            match self.parse_switch_case() {
                Ok(case) => cases.push(case),
                Err(diagnostic) => {
                    self.diagnostics.push(diagnostic);
                    self.recover_in_switch();
                }
            }
            self.skip_terminators();
        }

        if !self.eat(TokenType::RBrace) {
            let diagnostic = self
                .error_here("expected '}' to close switch body")
                .expecting(vec!["}"]);
            self.diagnostics.push(diagnostic);
        }

        Ok(Stmt {
            kind: StmtKind::Switch { condition, cases },
            span: self.span_from(start),
        })
    }

    fn parse_switch_case(&mut self) -> Result<SwitchCase, Diagnostic> {
        let start = self.current().span.start;

        let value = if self.at_word("case") {
            self.advance();
            Some(self.parse_case_value()?)
        } else if self.at_word("default") {
            self.advance();
            None
        } else {
            return Err(self
                .error_here(format!(
                    "expected 'case' or 'default' in switch body, found {}",
                    describe(self.current())
                ))
                .expecting(vec!["case", "default"]));
        };
        self.expect(TokenType::Colon, "':'")?;
        self.skip_terminators();

        let mut body = Vec::new();
        while !self.at_word("case")
            && !self.at_word("default")
            && !self.check(TokenType::RBrace)
            && !self.check(TokenType::Eof)
        {
            body.push(self.parse_statement()?);
            self.skip_terminators();
        }

        Ok(SwitchCase {
            value,
            body,
            span: self.span_from(start),
        })
    }

    /// A case label is a literal: number (optionally negated), string, or
    /// regex.
    fn parse_case_value(&mut self) -> Result<Expr, Diagnostic> {
        if self.check(TokenType::Minus) {
            let minus = self.advance();
            let number = self.expect(TokenType::Number, "number")?;
            let argument = Expr {
                kind: ExprKind::Number(number.value.parse().unwrap_or(0.0)),
                span: number.span,
            };
            let span = minus.span.to(number.span);
            return Ok(Expr {
                kind: ExprKind::Unary {
                    operator: UnaryOp::Neg,
                    argument: Box::new(argument),
                },
                span,
            });
        }
        match self.current().token_type {
            TokenType::Number | TokenType::String | TokenType::Regex => self.parse_primary(),
            _ => Err(self
                .error_here(format!(
                    "expected case label, found {}",
                    describe(self.current())
                ))
                .expecting(vec!["number", "string", "regex"])),
        }
    }

    // ─── IO Statement Parsing ────────────────────────────────

    fn at_print_end(&self) -> bool {
        matches!(
            self.current().token_type,
            TokenType::Newline
                | TokenType::Semicolon
                | TokenType::RBrace
                | TokenType::Eof
                | TokenType::Gt
                | TokenType::Append
                | TokenType::Pipe
        )
    }

    fn parse_print(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.current().span.start;
        self.advance(); // print

        let mut args = Vec::new();
        if !self.at_print_end() {
            args.push(self.parse_print_arg()?);
            while self.eat(TokenType::Comma) {
                self.skip_newlines();
                args.push(self.parse_print_arg()?);
            }
        }

        let redirect = self.parse_redirect()?;
        Ok(Stmt {
            kind: StmtKind::Print { args, redirect },
            span: self.span_from(start),
        })
    }

    fn parse_printf(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.current().span.start;
        self.advance(); // printf

        // Both forms: `printf fmt, args` and `printf(fmt, args)`.
        let has_parens = self.check(TokenType::LParen);
        if has_parens {
            self.advance();
            self.skip_newlines();
        }

        let format = if has_parens {
            self.parse_expression()?
        } else {
            self.parse_print_arg()?
        };

        let mut args = Vec::new();
        while self.eat(TokenType::Comma) {
            self.skip_newlines();
            args.push(if has_parens {
                self.parse_expression()?
            } else {
                self.parse_print_arg()?
            });
        }

        if has_parens {
            self.skip_newlines();
            self.expect(TokenType::RParen, "')'")?;
        }

        let redirect = self.parse_redirect()?;
        Ok(Stmt {
            kind: StmtKind::Printf {
                format,
                args,
                redirect,
            },
            span: self.span_from(start),
        })
    }

    /// In print argument position a top-level `>` or `|` belongs to the
    /// redirection; parenthesized arguments get the full grammar back.
    fn parse_print_arg(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_expr_with(true)
    }

    fn parse_redirect(&mut self) -> Result<Option<Redirect>, Diagnostic> {
        let redirect_type = match self.current().token_type {
            TokenType::Gt => RedirectType::Write,
            TokenType::Append => RedirectType::Append,
            TokenType::Pipe => RedirectType::Pipe,
            _ => return Ok(None),
        };
        self.advance();
        let target = self.parse_primary()?;
        Ok(Some(Redirect {
            redirect_type,
            target,
        }))
    }

    // ─── Expression Parsing (Precedence Climbing) ────────────
    //
    // One function per tier, loosest first; each defers to the next
    // tighter tier for its operands. `in_print` suppresses top-level `>`
    // and `|` so they stay available as print redirections.

    fn parse_expression(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_expr_with(false)
    }

    fn parse_expr_with(&mut self, in_print: bool) -> Result<Expr, Diagnostic> {
        self.enter("expression")?;
        let result = self.parse_assignment(in_print);
        self.leave();
        result
    }

    /// Assignment layers above the ternary; the right-hand side is a full
    /// expression, so chains associate to the right. The target is
    /// restricted to a plain identifier.
    fn parse_assignment(&mut self, in_print: bool) -> Result<Expr, Diagnostic> {
        let expr = self.parse_ternary(in_print)?;

        let operator = match self.current().token_type {
            TokenType::Assign => AssignOp::Assign,
            TokenType::PlusAssign => AssignOp::AddAssign,
            TokenType::MinusAssign => AssignOp::SubAssign,
            TokenType::StarAssign => AssignOp::MulAssign,
            TokenType::SlashAssign => AssignOp::DivAssign,
            TokenType::PercentAssign => AssignOp::ModAssign,
            TokenType::CaretAssign => AssignOp::PowAssign,
            _ => return Ok(expr),
        };
        let op_token = self.advance();

        let left = match expr.kind {
            ExprKind::Ident(name) => Ident {
                name,
                span: expr.span,
            },
            _ => {
                return Err(Diagnostic::new(
                    "assignment target must be an identifier",
                    expr.span,
                    op_token.line,
                    op_token.column,
                )
                .expecting(vec!["identifier"]))
            }
        };

        let right = self.parse_assignment(in_print)?;
        let span = left.span.to(right.span);
        Ok(Expr {
            kind: ExprKind::Assignment {
                operator,
                left,
                right: Box::new(right),
            },
            span,
        })
    }

    /// `cond ? consequence : alternative`, right-associative: the
    /// alternative re-enters this tier, so `a?b:c?d:e` is `a?b:(c?d:e)`.
    fn parse_ternary(&mut self, in_print: bool) -> Result<Expr, Diagnostic> {
        let condition = self.parse_or(in_print)?;

        if self.eat(TokenType::Question) {
            self.skip_newlines();
            let consequence = self
                .parse_ternary(in_print)
                .map_err(|d| d.in_production("ternary consequence"))?;
            self.expect(TokenType::Colon, "':'")?;
            self.skip_newlines();
            let alternative = self
                .parse_ternary(in_print)
                .map_err(|d| d.in_production("ternary alternative"))?;
            let span = condition.span.to(alternative.span);
            return Ok(Expr {
                kind: ExprKind::Ternary {
                    condition: Box::new(condition),
                    consequence: Box::new(consequence),
                    alternative: Box::new(alternative),
                },
                span,
            });
        }

        Ok(condition)
    }

    fn parse_or(&mut self, in_print: bool) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_and(in_print)?;
        while self.check(TokenType::Or) {
            self.advance();
            self.skip_newlines();
            let right = self.parse_and(in_print)?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self, in_print: bool) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_in(in_print)?;
        while self.check(TokenType::And) {
            self.advance();
            self.skip_newlines();
            let right = self.parse_in(in_print)?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    /// `in` is an ordinary left-associative binary tier; `key in arr` is a
    /// membership test expression.
    fn parse_in(&mut self, in_print: bool) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_match(in_print)?;
        while self.at_word("in") {
            self.advance();
            let right = self.parse_match(in_print)?;
            left = binary(BinaryOp::In, left, right);
        }
        Ok(left)
    }

    fn parse_match(&mut self, in_print: bool) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_relation(in_print)?;
        loop {
            let operator = match self.current().token_type {
                TokenType::Match => BinaryOp::Match,
                TokenType::NotMatch => BinaryOp::NotMatch,
                _ => break,
            };
            self.advance();
            let right = self.parse_relation(in_print)?;
            left = binary(operator, left, right);
        }
        Ok(left)
    }

    fn parse_relation(&mut self, in_print: bool) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_io(in_print)?;
        loop {
            let operator = match self.current().token_type {
                TokenType::Lt => BinaryOp::Lt,
                TokenType::Le => BinaryOp::Le,
                TokenType::Ge => BinaryOp::Ge,
                TokenType::Eq => BinaryOp::Eq,
                TokenType::Ne => BinaryOp::Ne,
                TokenType::Gt if !in_print => BinaryOp::Gt,
                _ => break,
            };
            self.advance();
            let right = self.parse_io(in_print)?;
            left = binary(operator, left, right);
        }
        Ok(left)
    }

    fn parse_io(&mut self, in_print: bool) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_additive(in_print)?;
        loop {
            let operator = match self.current().token_type {
                TokenType::Pipe if !in_print => BinaryOp::Pipe,
                TokenType::PipeAmp => BinaryOp::CoPipe,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive(in_print)?;
            left = binary(operator, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self, in_print: bool) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_multiplicative(in_print)?;
        loop {
            let operator = match self.current().token_type {
                TokenType::Plus => BinaryOp::Add,
                TokenType::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative(in_print)?;
            left = binary(operator, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self, in_print: bool) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_unary(in_print)?;
        loop {
            let operator = match self.current().token_type {
                TokenType::Star => BinaryOp::Mul,
                TokenType::Slash => BinaryOp::Div,
                TokenType::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary(in_print)?;
            left = binary(operator, left, right);
        }
        Ok(left)
    }

    /// Prefix `!`, `+`, `-`. The same `+`/`-` spellings in infix position
    /// belong to the additive tier; position alone decides the role.
    fn parse_unary(&mut self, in_print: bool) -> Result<Expr, Diagnostic> {
        let operator = match self.current().token_type {
            TokenType::Not => Some(UnaryOp::Not),
            TokenType::Plus => Some(UnaryOp::Pos),
            TokenType::Minus => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(operator) = operator {
            self.enter("expression")?;
            let op_token = self.advance();
            let argument = self.parse_unary(in_print);
            self.leave();
            let argument = argument?;
            let span = op_token.span.to(argument.span);
            return Ok(Expr {
                kind: ExprKind::Unary {
                    operator,
                    argument: Box::new(argument),
                },
                span,
            });
        }
        self.parse_power(in_print)
    }

    /// `^` and `**` group to the left: `2^3^2` is `(2^3)^2`.
    fn parse_power(&mut self, in_print: bool) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_update(in_print)?;
        while self.check(TokenType::Caret) {
            self.advance();
            let right = self.parse_update(in_print)?;
            left = binary(BinaryOp::Pow, left, right);
        }
        Ok(left)
    }

    /// Prefix and postfix `++`/`--` share one tier; position decides which
    /// role applies.
    fn parse_update(&mut self, in_print: bool) -> Result<Expr, Diagnostic> {
        let operator = match self.current().token_type {
            TokenType::Increment => Some(UpdateOp::Increment),
            TokenType::Decrement => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(operator) = operator {
            self.enter("expression")?;
            let op_token = self.advance();
            let argument = self.parse_update(in_print);
            self.leave();
            let argument = argument?;
            let span = op_token.span.to(argument.span);
            return Ok(Expr {
                kind: ExprKind::Update {
                    operator,
                    argument: Box::new(argument),
                    prefix: true,
                },
                span,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, Diagnostic> {
        let expr = self.parse_primary()?;
        let operator = match self.current().token_type {
            TokenType::Increment => UpdateOp::Increment,
            TokenType::Decrement => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        let op_token = self.advance();
        let span = expr.span.to(op_token.span);
        Ok(Expr {
            kind: ExprKind::Update {
                operator,
                argument: Box::new(expr),
                prefix: false,
            },
            span,
        })
    }

    /// The operand of `$`: a primary without postfix operators, so `$i++`
    /// is `($i)++` and `$1+1` is `($1)+1`.
    fn parse_field_operand(&mut self) -> Result<Expr, Diagnostic> {
        let operator = match self.current().token_type {
            TokenType::Increment => Some(UpdateOp::Increment),
            TokenType::Decrement => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(operator) = operator {
            self.enter("expression")?;
            let op_token = self.advance();
            let argument = self.parse_field_operand();
            self.leave();
            let argument = argument?;
            let span = op_token.span.to(argument.span);
            return Ok(Expr {
                kind: ExprKind::Update {
                    operator,
                    argument: Box::new(argument),
                    prefix: true,
                },
                span,
            });
        }
        self.parse_primary()
            .map_err(|d| d.in_production("field reference"))
    }

    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        match self.current().token_type {
            TokenType::Number => {
                let token = self.advance();
                Ok(Expr {
                    kind: ExprKind::Number(token.value.parse().unwrap_or(0.0)),
                    span: token.span,
                })
            }
            TokenType::String => {
                let token = self.advance();
                Ok(Expr {
                    kind: ExprKind::Str(token.value),
                    span: token.span,
                })
            }
            TokenType::Regex => {
                let token = self.advance();
                Ok(Expr {
                    kind: ExprKind::Regex(token.value),
                    span: token.span,
                })
            }
            TokenType::Dollar => {
                self.enter("expression")?;
                let dollar = self.advance();
                let argument = self.parse_field_operand();
                self.leave();
                let argument = argument?;
                let span = dollar.span.to(argument.span);
                Ok(Expr {
                    kind: ExprKind::FieldRef {
                        argument: Box::new(argument),
                    },
                    span,
                })
            }
            TokenType::LParen => {
                self.advance();
                self.skip_newlines();
                let expr = self.parse_expression()?;
                self.skip_newlines();
                self.expect(TokenType::RParen, "')'")?;
                Ok(expr)
            }
            TokenType::Ident => {
                let token = self.advance();
                if self.check(TokenType::LParen) {
                    return self.parse_call(token);
                }
                Ok(Expr {
                    span: token.span,
                    kind: ExprKind::Ident(token.value),
                })
            }
            _ => Err(self
                .error_here(format!(
                    "expected expression, found {}",
                    describe(self.current())
                ))
                .expecting(vec!["number", "string", "regex", "identifier", "$", "("])),
        }
    }

    fn parse_call(&mut self, name: Token) -> Result<Expr, Diagnostic> {
        self.advance(); // (
        self.skip_newlines();

        let mut items = Vec::new();
        if !self.check(TokenType::RParen) {
            items.push(self.parse_expression()?);
            while self.eat(TokenType::Comma) {
                self.skip_newlines();
                items.push(self.parse_expression()?);
            }
        }
        self.skip_newlines();
        let rparen = self.expect(TokenType::RParen, "')'")?;

        let args = if items.is_empty() {
            None
        } else {
            let mut span = items[0].span;
            for item in &items {
                span = span.to(item.span);
            }
            Some(Args { items, span })
        };

        let span = name.span.to(rparen.span);
        Ok(Expr {
            kind: ExprKind::Call {
                func_name: Ident {
                    name: name.value,
                    span: name.span,
                },
                args,
            },
            span,
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────
