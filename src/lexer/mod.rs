use logos::Logos;

use crate::ast::Span;

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip(r"#[^\n]*", allow_greedy = true))]
pub enum Token {
    // Literals: digits, `.`, `_` separators and an `e` exponent. Validity is
    // checked when the literal is converted, not here.
    #[regex(r"[0-9.][0-9._e]*", |lex| lex.slice().to_string())]
    Number(String),

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    /// Appended by `lex`, never matched.
    Eof,
}

impl Token {
    /// The source text this token was lexed from.
    pub fn raw(&self) -> &str {
        match self {
            Token::Number(raw) => raw,
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Asterisk => "*",
            Token::Slash => "/",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Eof => "EOF",
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(raw) => write!(f, "number '{raw}'"),
            Token::Eof => write!(f, "end of input"),
            other => write!(f, "'{}'", other.raw()),
        }
    }
}

/// Lex source text into tokens with byte spans, always terminated by `Eof`.
/// The first unrecognised character aborts lexing.
pub fn lex(source: &str) -> Result<Vec<(Token, Span)>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, Span::from(lexer.span()))),
            Err(()) => {
                let position = lexer.span().start;
                let snippet: String = source[position..].chars().take(1).collect();
                return Err(LexError {
                    position,
                    suggestion: suggest_fix(&snippet),
                    snippet,
                });
            }
        }
    }

    tokens.push((Token::Eof, Span::new(source.len(), source.len())));
    Ok(tokens)
}

/// Every lex error comes with a suggested fix.
fn suggest_fix(bad: &str) -> String {
    match bad.chars().next() {
        Some('x' | 'X' | '×') => "Use '*' for multiplication".to_string(),
        Some('÷' | ':') => "Use '/' for division".to_string(),
        Some(',') => "Use '.' as the decimal point".to_string(),
        Some('[' | '{') => "Use '(' and ')' for grouping".to_string(),
        Some(c) if c.is_alphabetic() => {
            "Variables and functions are not supported; only numbers, + - * / and parentheses".to_string()
        }
        _ => format!("Unexpected character(s): '{bad}'. Expected a number, an operator or a parenthesis."),
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Lex error at position {position}: '{snippet}'. {suggestion}")]
pub struct LexError {
    pub position: usize,
    pub snippet: String,
    pub suggestion: String,
}
