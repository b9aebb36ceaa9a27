//! Recursive-descent parser.
//!
//! ```text
//! program    := expression* EOF
//! expression := term
//! term       := factor (('+' | '-') factor)*
//! factor     := unary (('*' | '/') unary)*
//! unary      := '-' unary | primary
//! primary    := NUMBER | '(' expression ')'
//! ```

use crate::ast::*;
use crate::lexer::Token;

/// Deepest syntax tree the parser will build, and the deepest run of nested
/// `(` or `-` it will descend into. Every later pass walks the tree recursively.
pub const MAX_DEPTH: usize = 512;

pub struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    nesting: usize,
}

#[derive(Debug, thiserror::Error)]
#[error("Parse error at token {position}: {message}")]
pub struct ParseError {
    pub code: &'static str,
    pub position: usize,
    pub span: Span,
    pub message: String,
}

type Result<T> = std::result::Result<T, ParseError>;

/// A parsed subtree and its depth.
type Node = (Expr, usize);

impl Parser {
    pub fn new(tokens: Vec<(Token, Span)>) -> Self {
        Parser { tokens, pos: 0, nesting: 0 }
    }

    /// Current token; a stream without a trailing `Eof` reads as if it had one.
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map(|(t, _)| t).unwrap_or(&Token::Eof)
    }

    fn peek_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, span)) => *span,
            None => self.tokens.last().map(|(_, s)| Span::new(s.end, s.end)).unwrap_or(Span::UNKNOWN),
        }
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn error(&self, code: &'static str, message: String) -> ParseError {
        ParseError {
            code,
            position: self.pos,
            span: self.peek_span(),
            message,
        }
    }

    fn too_deep(&self) -> ParseError {
        self.error("CALC-P003", format!("expression nests deeper than {MAX_DEPTH} levels"))
    }

    fn check_depth(&self, depth: usize) -> Result<usize> {
        if depth > MAX_DEPTH { Err(self.too_deep()) } else { Ok(depth) }
    }

    /// Called before recursing into a `(` group or a `-` operand.
    fn enter(&mut self) -> Result<()> {
        self.nesting += 1;
        if self.nesting > MAX_DEPTH {
            return Err(self.too_deep());
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    // ---- Top-level parsing ----

    pub fn parse_program(&mut self) -> Result<Program> {
        let mut statements = Vec::new();
        while *self.peek() != Token::Eof {
            let (expr, _) = self.parse_expr()?;
            statements.push(expr);
        }
        Ok(Program::new(statements))
    }

    // ---- Expressions ----

    fn parse_expr(&mut self) -> Result<Node> {
        self.parse_term()
    }

    fn parse_term(&mut self) -> Result<Node> {
        let (mut left, mut depth) = self.parse_factor()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                _ => return Ok((left, depth)),
            };
            self.advance();
            let (right, right_depth) = self.parse_factor()?;
            depth = self.check_depth(1 + depth.max(right_depth))?;
            left = Expr::binary(op, left, right);
        }
    }

    fn parse_factor(&mut self) -> Result<Node> {
        let (mut left, mut depth) = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Asterisk => BinOp::Multiply,
                Token::Slash => BinOp::Divide,
                _ => return Ok((left, depth)),
            };
            self.advance();
            let (right, right_depth) = self.parse_unary()?;
            depth = self.check_depth(1 + depth.max(right_depth))?;
            left = Expr::binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Node> {
        if *self.peek() == Token::Minus {
            self.enter()?;
            self.advance();
            let (operand, depth) = self.parse_unary()?;
            self.leave();
            let depth = self.check_depth(depth + 1)?;
            return Ok((Expr::negate(operand), depth));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node> {
        match self.peek().clone() {
            Token::Number(raw) => {
                let span = self.peek_span();
                self.advance();
                Ok((Expr::Number { raw, span }, 1))
            }
            Token::LParen => {
                let open = self.peek_span();
                self.enter()?;
                self.advance();
                let inner = self.parse_expr()?;
                if *self.peek() != Token::RParen {
                    let mut err = self.error(
                        "CALC-P002",
                        format!("expected ')' to close '(' at byte {}, got {}", open.start, self.peek()),
                    );
                    err.span = err.span.merge(open);
                    return Err(err);
                }
                self.advance();
                self.leave();
                Ok(inner)
            }
            tok => Err(self.error("CALC-P001", format!("expected a number or '(', got {tok}"))),
        }
    }
}

pub fn parse(tokens: Vec<(Token, Span)>) -> Result<Program> {
    Parser::new(tokens).parse_program()
}

/// Parse from bare tokens (no span information, UNKNOWN spans).
#[cfg(test)]
pub fn parse_tokens(tokens: Vec<Token>) -> Result<Program> {
    parse(tokens.into_iter().map(|t| (t, Span::UNKNOWN)).collect())
}
